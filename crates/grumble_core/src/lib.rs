//! grumble_core: Core utilities shared by every grumble crate.
//!
//! Provides identifier interning, the bump arena that owns syntax trees,
//! and source spans used for diagnostics.

pub mod arena;
pub mod intern;
pub mod text;

pub use arena::CompilerArena;
pub use intern::{InternedString, StringInterner};
pub use text::{LineMap, TextSpan};
