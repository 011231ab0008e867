use crate::string_interner::Symbol;
use crate::type_interner::TypeToken;
use serde::{Deserialize, Serialize};

/// The C primitive kinds the layout engine distinguishes. Width and
/// alignment are not stored here; they come from the architecture
/// descriptor at layout time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
    SizeT,
    PtrdiffT,
}

impl ScalarKind {
    pub fn is_integer(self) -> bool {
        !matches!(
            self,
            ScalarKind::Float | ScalarKind::Double | ScalarKind::LongDouble
        )
    }

}

/// One field of a struct or union. `bit_width` is set for bit-fields;
/// unnamed bit-fields (including the zero-width kind) have no name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub name: Option<Symbol>,
    pub ty: TypeToken,
    pub bit_width: Option<u32>,
}

/// Struct or union body. The tag is kept for diagnostics; identity for
/// caching purposes is the interner token, not the tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Aggregate {
    pub tag: Option<Symbol>,
    pub fields: Vec<Field>,
}

/// A node of the resolved type graph handed over by the upstream parser.
///
/// Children are interner tokens rather than boxed nodes so the graph can
/// reference itself through a `Pointer` without owning a cycle. A struct
/// containing itself as a value field is a parser-level error and never
/// reaches the layout engine through a well-formed graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeNode {
    Scalar(ScalarKind),
    Pointer(TypeToken),
    /// `len: None` marks an incomplete array, which is only valid as a
    /// flexible trailing struct member.
    Array { elem: TypeToken, len: Option<u64> },
    Struct(Aggregate),
    Union(Aggregate),
    /// `underlying: None` means the architecture default (`int`).
    Enum { underlying: Option<ScalarKind> },
    Alias { name: Symbol, target: TypeToken },
    /// Forward-declared tag with no visible definition. Usable behind a
    /// pointer only.
    Opaque { tag: Symbol },
}
