use crate::source_location::SourcePos;
use crate::string_interner::{StringInterner, Symbol};
use crate::type_interner::TypeToken;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LayoutErrorKind {
    /// Requested architecture is not in the supported set. Fatal to the session.
    UnknownTarget,
    /// Pack pop without a matching push, or a push left open at end of stream.
    UnbalancedPackingDirective,
    /// Array with zero or unknown length outside the flexible-member position.
    InvalidArrayLength,
    /// Bit-field wider than its declared storage type.
    BitFieldTooWide,
    /// Opaque/forward-declared type used as a value member.
    IncompleteTypeAsValue,
    /// Value-type cycle that the upstream parser should have rejected.
    CyclicValueType,
}

impl LayoutErrorKind {
    fn describe(self) -> &'static str {
        match self {
            LayoutErrorKind::UnknownTarget => "unknown target architecture",
            LayoutErrorKind::UnbalancedPackingDirective => "unbalanced packing directive",
            LayoutErrorKind::InvalidArrayLength => "invalid array length",
            LayoutErrorKind::BitFieldTooWide => "bit-field wider than its storage type",
            LayoutErrorKind::IncompleteTypeAsValue => "incomplete type used as a value",
            LayoutErrorKind::CyclicValueType => "cyclic value type",
        }
    }
}

impl fmt::Display for LayoutErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ErrorInfo {
    Text(&'static str),
    Name(String),
    Identifier(Symbol),
    Type(TypeToken),
    Width(u64),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutError {
    pub kind: LayoutErrorKind,
    pub pos: Option<SourcePos>,
    pub info: Vec<ErrorInfo>,
}

impl LayoutError {
    pub fn new(kind: LayoutErrorKind) -> LayoutError {
        LayoutError {
            kind,
            pos: None,
            info: Vec::new(),
        }
    }

    pub fn at(mut self, pos: SourcePos) -> LayoutError {
        self.pos = Some(pos);
        self
    }

    pub fn with(mut self, info: ErrorInfo) -> LayoutError {
        self.info.push(info);
        self
    }

    /// Render with identifier names resolved through the interner.
    pub fn render(&self, symbols: &StringInterner) -> String {
        let mut out = String::new();

        if let Some(pos) = self.pos {
            out.push_str(&format!("{}: ", pos));
        }

        out.push_str(self.kind.describe());

        for info in &self.info {
            match info {
                ErrorInfo::Text(text) => out.push_str(&format!(": {}", text)),
                ErrorInfo::Name(name) => out.push_str(&format!(": {}", name)),
                ErrorInfo::Identifier(sym) => {
                    out.push_str(&format!(": `{}`", symbols.resolve(*sym)))
                }
                ErrorInfo::Type(tok) => out.push_str(&format!(": type #{}", tok.index())),
                ErrorInfo::Width(w) => out.push_str(&format!(": {}", w)),
            }
        }

        out
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(pos) = self.pos {
            write!(f, "{}: ", pos)?;
        }
        f.write_str(self.kind.describe())?;

        // Interner-backed payloads need `render`; everything else prints here.
        for info in &self.info {
            match info {
                ErrorInfo::Text(text) => write!(f, ": {}", text)?,
                ErrorInfo::Name(name) => write!(f, ": {}", name)?,
                ErrorInfo::Width(w) => write!(f, ": {}", w)?,
                ErrorInfo::Identifier(_) | ErrorInfo::Type(_) => {}
            }
        }

        Ok(())
    }
}

impl std::error::Error for LayoutError {}
