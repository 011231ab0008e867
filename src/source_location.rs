use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a directive or declaration in the preprocessed header stream.
/// Produced by the upstream parser alongside each event so diagnostics can
/// point back at the header text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: u32,
    pub col: u32,
}

impl SourcePos {
    pub fn new(line: u32, col: u32) -> SourcePos {
        SourcePos { line, col }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
