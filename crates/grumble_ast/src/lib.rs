//! grumble_ast: Syntax tree for the Python subset handled by grumble.
//!
//! Statements and expressions are closed sum types allocated in a
//! [`CompilerArena`](grumble_core::CompilerArena). Parsing is not part of
//! this workspace; trees are produced by an external front end or built
//! directly with [`AstBuilder`].

pub mod builder;
pub mod node;

pub use builder::AstBuilder;
pub use node::*;
