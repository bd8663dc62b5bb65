//! Variable records produced by classification.

use grumble_core::intern::InternedString;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Where a name lives within one function or class body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Local,
    /// Bound from the incoming argument at `index` (declaration order).
    Param { index: usize },
    /// Declared `global`; lives in the module namespace.
    Global,
}

/// A classified name. Immutable once classification finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Var {
    pub name: InternedString,
    pub kind: VarKind,
}

impl Var {
    pub fn local(name: InternedString) -> Self {
        Self { name, kind: VarKind::Local }
    }

    pub fn param(name: InternedString, index: usize) -> Self {
        Self {
            name,
            kind: VarKind::Param { index },
        }
    }

    pub fn global(name: InternedString) -> Self {
        Self { name, kind: VarKind::Global }
    }

    pub fn is_global(&self) -> bool {
        self.kind == VarKind::Global
    }

    /// Initial value of the slot at scope entry. Globals have no slot.
    pub fn init_expr(&self) -> Option<String> {
        match self.kind {
            VarKind::Local => Some("πg.UnboundLocal".to_string()),
            VarKind::Param { index } => Some(format!("πArgs[{}]", index)),
            VarKind::Global => None,
        }
    }
}

/// Name-to-record map in first-seen order.
pub type VarMap = IndexMap<InternedString, Var, FxBuildHasher>;

/// Go identifier for the local slot holding `name`.
///
/// The prefix keeps source names apart from generated names and Go keywords.
pub fn adjust_local_name(name: &str) -> String {
    format!("µ{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grumble_core::intern::StringInterner;

    #[test]
    fn test_init_expr() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        assert_eq!(Var::local(x).init_expr().as_deref(), Some("πg.UnboundLocal"));
        assert_eq!(Var::param(x, 2).init_expr().as_deref(), Some("πArgs[2]"));
        assert_eq!(Var::global(x).init_expr(), None);
    }

    #[test]
    fn test_adjust_local_name() {
        assert_eq!(adjust_local_name("count"), "µcount");
        assert_eq!(adjust_local_name("type"), "µtype");
    }
}
