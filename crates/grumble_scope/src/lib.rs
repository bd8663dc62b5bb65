//! grumble_scope: Scope classification and code generation support.
//!
//! For every module, class body and function body the driver walks, this
//! crate decides where each name lives and what each generated statement
//! should reuse:
//! - [`classify_function`] / [`classify_class`] build the ordered
//!   name-to-kind map of one body without entering nested functions
//! - [`ScopeTree`] holds one record per scope and implements the
//!   scope-specific bind, delete and resolve operations
//! - [`ResourceAllocator`] pools scratch variables, labels and loop labels
//!   per scope
//! - [`UnitRegistry`] deduplicates package imports and string constants for
//!   the whole unit

mod alloc;
mod classifier;
mod error;
mod expr;
mod registry;
mod scope;
mod var;

pub use alloc::{Loop, ResourceAllocator, TempVar, DEFAULT_TEMP_TYPE};
pub use classifier::{classify_class, classify_function, ClassVars, FunctionVars};
pub use error::ScopeError;
pub use expr::GeneratedExpr;
pub use registry::{Package, UnitRegistry, MAX_INTERN_LEN, RUNTIME_ALIAS};
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use var::{adjust_local_name, Var, VarKind, VarMap};
