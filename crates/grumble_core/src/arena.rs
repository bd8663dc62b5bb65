//! Arena allocation for syntax trees.
//!
//! Statement and expression nodes are allocated from a bump arena and refer
//! to their children by plain references. The whole tree is released at once
//! when the arena is dropped.

use bumpalo::Bump;

/// Owns every node of one compiled unit.
pub struct CompilerArena {
    bump: Bump,
}

impl CompilerArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Create an arena with `capacity` bytes reserved up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    #[inline]
    pub fn alloc<T>(&self, val: T) -> &T {
        self.bump.alloc(val)
    }

    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Move the items of `items` into the arena as one contiguous slice.
    #[inline]
    pub fn alloc_slice<T>(&self, items: Vec<T>) -> &[T] {
        self.bump.alloc_slice_fill_iter(items)
    }

    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for CompilerArena {
    fn default() -> Self {
        Self::new()
    }
}
