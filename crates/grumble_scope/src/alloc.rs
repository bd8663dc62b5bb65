//! Per-scope resource pools: scratch variables, labels and loop labels.
//!
//! Every id and name handed out here depends only on the order of requests,
//! so compiling the same tree twice yields identical output.

use crate::error::ScopeError;
use std::collections::BTreeSet;

/// Type tag of a scratch variable when the caller does not ask for another.
pub const DEFAULT_TEMP_TYPE: &str = "*πg.Object";

/// A compiler-introduced Go variable. Ordered by name first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TempVar {
    pub name: String,
    pub type_: String,
}

impl TempVar {
    /// `var πTemp001 *πg.Object`
    pub fn declaration(&self) -> String {
        format!("var {} {}", self.name, self.type_)
    }
}

/// Jump targets of one loop being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loop {
    /// Target of `continue`.
    pub start_label: u32,
    /// Target of `break`.
    pub end_label: u32,
}

/// Scratch variables, labels and open loops of one scope.
#[derive(Debug, Default)]
pub struct ResourceAllocator {
    free_temps: BTreeSet<TempVar>,
    used_temps: BTreeSet<TempVar>,
    temp_index: u32,
    label_count: u32,
    checkpoints: BTreeSet<u32>,
    loop_stack: Vec<Loop>,
}

impl ResourceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a scratch variable of type `type_`, reusing the free one
    /// with the smallest name when possible.
    pub fn alloc_temp(&mut self, type_: &str) -> TempVar {
        let reusable = self.free_temps.iter().find(|v| v.type_ == type_).cloned();
        let v = match reusable {
            Some(v) => {
                self.free_temps.remove(&v);
                v
            }
            None => {
                self.temp_index += 1;
                TempVar {
                    name: format!("πTemp{:03}", self.temp_index),
                    type_: type_.to_string(),
                }
            }
        };
        tracing::trace!(name = %v.name, type_ = %v.type_, "alloc temp");
        self.used_temps.insert(v.clone());
        v
    }

    /// Return `v` to the free pool.
    pub fn free_temp(&mut self, v: &TempVar) -> Result<(), ScopeError> {
        if !self.used_temps.remove(v) {
            return Err(ScopeError::TempNotInUse { name: v.name.clone() });
        }
        self.free_temps.insert(v.clone());
        Ok(())
    }

    /// True while `v` is allocated and not yet freed.
    pub fn is_temp_in_use(&self, v: &TempVar) -> bool {
        self.used_temps.contains(v)
    }

    /// Every scratch variable ever allocated, in name order.
    pub fn declared_temps(&self) -> Vec<&TempVar> {
        let mut temps: Vec<&TempVar> = self.free_temps.iter().chain(self.used_temps.iter()).collect();
        temps.sort();
        temps
    }

    /// Next label id, starting at 1. Checkpoint labels are resumable
    /// re-entry points of a generator frame.
    pub fn gen_label(&mut self, is_checkpoint: bool) -> u32 {
        self.label_count += 1;
        if is_checkpoint {
            self.checkpoints.insert(self.label_count);
        }
        self.label_count
    }

    /// Checkpoint label ids in ascending order.
    pub fn checkpoints(&self) -> Vec<u32> {
        self.checkpoints.iter().copied().collect()
    }

    /// Allocate start and end labels for a new innermost loop.
    pub fn push_loop(&mut self) -> Loop {
        let start_label = self.gen_label(false);
        let end_label = self.gen_label(false);
        let l = Loop { start_label, end_label };
        self.loop_stack.push(l);
        l
    }

    /// Remove and return the innermost loop.
    pub fn pop_loop(&mut self) -> Option<Loop> {
        self.loop_stack.pop()
    }

    /// Innermost loop, if any loop is being compiled.
    pub fn top_loop(&self) -> Option<Loop> {
        self.loop_stack.last().copied()
    }

    /// Number of loops currently open.
    pub fn loop_depth(&self) -> usize {
        self.loop_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_names_are_sequential() {
        let mut a = ResourceAllocator::new();
        assert_eq!(a.alloc_temp(DEFAULT_TEMP_TYPE).name, "πTemp001");
        assert_eq!(a.alloc_temp(DEFAULT_TEMP_TYPE).name, "πTemp002");
        assert_eq!(a.alloc_temp("bool").name, "πTemp003");
    }

    #[test]
    fn test_free_then_alloc_reuses_same_type_only() {
        let mut a = ResourceAllocator::new();
        let obj = a.alloc_temp(DEFAULT_TEMP_TYPE);
        a.free_temp(&obj).unwrap();

        let flag = a.alloc_temp("bool");
        assert_ne!(flag.name, obj.name);

        let again = a.alloc_temp(DEFAULT_TEMP_TYPE);
        assert_eq!(again, obj);
        assert!(a.is_temp_in_use(&again));
    }

    #[test]
    fn test_reuse_picks_smallest_free_name() {
        let mut a = ResourceAllocator::new();
        let t1 = a.alloc_temp(DEFAULT_TEMP_TYPE);
        let t2 = a.alloc_temp(DEFAULT_TEMP_TYPE);
        let t3 = a.alloc_temp(DEFAULT_TEMP_TYPE);
        a.free_temp(&t3).unwrap();
        a.free_temp(&t1).unwrap();
        assert_eq!(a.alloc_temp(DEFAULT_TEMP_TYPE), t1);
        assert_eq!(a.alloc_temp(DEFAULT_TEMP_TYPE), t3);
        assert!(a.is_temp_in_use(&t2));
    }

    #[test]
    fn test_never_returns_a_used_temp() {
        let mut a = ResourceAllocator::new();
        let mut live = Vec::new();
        for i in 0..20 {
            let v = a.alloc_temp(DEFAULT_TEMP_TYPE);
            assert!(!live.contains(&v));
            live.push(v);
            if i % 3 == 0 {
                let freed = live.remove(0);
                a.free_temp(&freed).unwrap();
            }
        }
    }

    #[test]
    fn test_free_unknown_temp_fails() {
        let mut a = ResourceAllocator::new();
        let v = a.alloc_temp(DEFAULT_TEMP_TYPE);
        a.free_temp(&v).unwrap();
        assert_eq!(
            a.free_temp(&v),
            Err(ScopeError::TempNotInUse { name: "πTemp001".to_string() })
        );
    }

    #[test]
    fn test_declared_temps_cover_free_and_used() {
        let mut a = ResourceAllocator::new();
        let t1 = a.alloc_temp(DEFAULT_TEMP_TYPE);
        let _t2 = a.alloc_temp("bool");
        a.free_temp(&t1).unwrap();
        let decls: Vec<_> = a.declared_temps().iter().map(|v| v.declaration()).collect();
        assert_eq!(decls, vec!["var πTemp001 *πg.Object", "var πTemp002 bool"]);
    }

    #[test]
    fn test_labels_start_at_one_and_increase() {
        let mut a = ResourceAllocator::new();
        assert_eq!(a.gen_label(false), 1);
        assert_eq!(a.gen_label(true), 2);
        assert_eq!(a.gen_label(false), 3);
        assert_eq!(a.gen_label(true), 4);
        assert_eq!(a.checkpoints(), vec![2, 4]);
    }

    #[test]
    fn test_loop_stack() {
        let mut a = ResourceAllocator::new();
        assert_eq!(a.top_loop(), None);
        let outer = a.push_loop();
        let inner = a.push_loop();
        assert_eq!(outer, Loop { start_label: 1, end_label: 2 });
        assert_eq!(inner, Loop { start_label: 3, end_label: 4 });
        assert_eq!(a.loop_depth(), 2);
        assert_eq!(a.top_loop(), Some(inner));
        assert_eq!(a.pop_loop(), Some(inner));
        assert_eq!(a.top_loop(), Some(outer));
        a.pop_loop();
        assert_eq!(a.loop_depth(), 0);
        assert!(a.checkpoints().is_empty());
    }
}
