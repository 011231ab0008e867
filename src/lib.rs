pub mod arch;
pub mod cache;
pub mod error;
pub mod graph;
pub mod layout;
pub mod pack_state;
pub mod resolver;

pub mod source_location;
pub mod string_interner;

pub mod type_interner;
pub mod types;
