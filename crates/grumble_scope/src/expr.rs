//! Value expressions handed back to code generation.

use crate::alloc::TempVar;

/// A Go expression produced while generating code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedExpr {
    /// A pooled scratch variable; the caller frees it when done.
    Temp(TempVar),
    /// A function-local slot (already adjusted, e.g. `µcount`).
    Local(String),
    /// Any other expression text.
    Literal(String),
}

impl GeneratedExpr {
    pub fn expr(&self) -> &str {
        match self {
            GeneratedExpr::Temp(v) => &v.name,
            GeneratedExpr::Local(name) => name,
            GeneratedExpr::Literal(text) => text,
        }
    }

    pub fn temp(&self) -> Option<&TempVar> {
        match self {
            GeneratedExpr::Temp(v) => Some(v),
            _ => None,
        }
    }
}
