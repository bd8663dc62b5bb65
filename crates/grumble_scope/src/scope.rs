//! The scope tree and the scope-specific name operations.
//!
//! Scopes live in one arena owned by [`ScopeTree`] and refer to each other by
//! [`ScopeId`]. Slot 0 is always the module scope; every other scope records
//! its parent and the module it belongs to. The unit-wide
//! [`UnitRegistry`] sits next to the arena and is shared by all scopes.
//!
//! Every operation takes the id of the scope that is currently generating
//! code, plus the writer that receives the generated fragments.

use crate::alloc::{Loop, ResourceAllocator, TempVar, DEFAULT_TEMP_TYPE};
use crate::classifier::{ClassVars, FunctionVars};
use crate::error::ScopeError;
use crate::expr::GeneratedExpr;
use crate::registry::{Package, UnitRegistry};
use crate::var::{adjust_local_name, Var, VarMap};
use grumble_core::intern::{InternedString, StringInterner};
use grumble_options::UnitOptions;
use grumble_writer::{go_str, CodeWriter};
use rustc_hash::FxHashSet;

/// Handle of a scope in its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const MODULE: ScopeId = ScopeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub enum ScopeKind {
    Module,
    Class {
        /// Names the class body declared `global`.
        global_vars: FxHashSet<InternedString>,
    },
    Function {
        vars: VarMap,
        is_generator: bool,
    },
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    /// The module scope this scope belongs to.
    pub module: ScopeId,
    pub name: String,
    pub kind: ScopeKind,
    pub resources: ResourceAllocator,
}

impl Scope {
    pub fn is_generator(&self) -> bool {
        matches!(self.kind, ScopeKind::Function { is_generator: true, .. })
    }

    /// The variable map of a function scope.
    pub fn vars(&self) -> Option<&VarMap> {
        match &self.kind {
            ScopeKind::Function { vars, .. } => Some(vars),
            _ => None,
        }
    }

    fn lookup(&self, name: InternedString) -> Option<&Var> {
        self.vars().and_then(|vars| vars.get(&name))
    }
}

enum Target {
    Global,
    Class,
    Slot,
    Unclassified,
}

enum Resolution {
    Global,
    /// Class namespace first; `closure_local` when an enclosing function
    /// holds the name in a local slot.
    Class { closure_local: bool },
    Slot,
}

/// All scopes of one compiled unit plus the unit's shared registry.
pub struct ScopeTree {
    scopes: Vec<Scope>,
    registry: UnitRegistry,
    interner: StringInterner,
}

impl ScopeTree {
    /// Create a tree holding only the module scope.
    pub fn new(options: &UnitOptions, interner: &StringInterner) -> Self {
        let module = Scope {
            id: ScopeId::MODULE,
            parent: None,
            module: ScopeId::MODULE,
            name: "<module>".to_string(),
            kind: ScopeKind::Module,
            resources: ResourceAllocator::new(),
        };
        Self {
            scopes: vec![module],
            registry: UnitRegistry::new(options),
            interner: interner.clone(),
        }
    }

    #[inline]
    pub fn module(&self) -> ScopeId {
        ScopeId::MODULE
    }

    /// The scope record for `id`.
    #[inline]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Mutable access to the scope record for `id`.
    #[inline]
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Number of scopes created so far, the module included.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Unit-wide imports and interned strings.
    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    fn push(&mut self, parent: ScopeId, name: &str, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let module = self.scope(parent).module;
        self.scopes.push(Scope {
            id,
            parent: Some(parent),
            module,
            name: name.to_string(),
            kind,
            resources: ResourceAllocator::new(),
        });
        id
    }

    /// Enter a class body nested in `parent`.
    pub fn push_class(&mut self, parent: ScopeId, name: &str, vars: &ClassVars) -> ScopeId {
        let id = self.push(
            parent,
            name,
            ScopeKind::Class {
                global_vars: vars.global_vars(),
            },
        );
        tracing::debug!(scope = id.0, parent = parent.0, name, "enter class scope");
        id
    }

    /// Enter a function body nested in `parent`, taking ownership of its
    /// classified variables.
    pub fn push_function(&mut self, parent: ScopeId, name: &str, vars: FunctionVars) -> ScopeId {
        let id = self.push(
            parent,
            name,
            ScopeKind::Function {
                vars: vars.vars,
                is_generator: vars.is_generator,
            },
        );
        tracing::debug!(scope = id.0, parent = parent.0, name, "enter function scope");
        id
    }

    /// `id` followed by each of its ancestors up to the module scope.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(Some(self.scope(id)), move |scope| scope.parent.map(|p| self.scope(p)))
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Take a scratch variable of type `type_` from scope `id`.
    pub fn alloc_temp(&mut self, id: ScopeId, type_: &str) -> TempVar {
        self.scope_mut(id).resources.alloc_temp(type_)
    }

    /// Return `v` to the pool of scope `id`.
    pub fn free_temp(&mut self, id: ScopeId, v: &TempVar) -> Result<(), ScopeError> {
        self.scope_mut(id).resources.free_temp(v)
    }

    /// Release the scratch variable behind `expr`, if it is one.
    pub fn free_expr(&mut self, id: ScopeId, expr: &GeneratedExpr) -> Result<(), ScopeError> {
        match expr.temp() {
            Some(v) => self.free_temp(id, v),
            None => Ok(()),
        }
    }

    /// Next label of scope `id`, recorded as a checkpoint when
    /// `is_checkpoint` is set.
    pub fn gen_label(&mut self, id: ScopeId, is_checkpoint: bool) -> u32 {
        self.scope_mut(id).resources.gen_label(is_checkpoint)
    }

    /// Open a loop in scope `id` with fresh start and end labels.
    pub fn push_loop(&mut self, id: ScopeId) -> Loop {
        self.scope_mut(id).resources.push_loop()
    }

    /// Close the innermost loop of scope `id`.
    pub fn pop_loop(&mut self, id: ScopeId) -> Option<Loop> {
        self.scope_mut(id).resources.pop_loop()
    }

    /// Innermost open loop of scope `id`, if any.
    pub fn top_loop(&self, id: ScopeId) -> Option<Loop> {
        self.scope(id).resources.top_loop()
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Register a package under the library root.
    pub fn add_import(&mut self, name: &str) -> Package {
        self.registry.add_import(name)
    }

    /// Register a package by its full import path.
    pub fn add_native_import(&mut self, name: &str) -> Package {
        self.registry.add_native_import(name)
    }

    /// Go expression for the string `s`; see [`UnitRegistry::intern`].
    pub fn intern(&mut self, s: &str) -> String {
        self.registry.intern(s)
    }

    // ========================================================================
    // Name operations
    // ========================================================================

    /// Where a store or delete of `name` in scope `id` lands.
    fn target(&self, id: ScopeId, name: InternedString) -> Target {
        match &self.scope(id).kind {
            ScopeKind::Module => Target::Global,
            ScopeKind::Class { global_vars } if global_vars.contains(&name) => Target::Global,
            ScopeKind::Class { .. } => Target::Class,
            ScopeKind::Function { vars, .. } => match vars.get(&name) {
                None => Target::Unclassified,
                Some(var) if var.is_global() => Target::Global,
                Some(_) => Target::Slot,
            },
        }
    }

    /// Emit code storing `value` into `name` as seen from scope `id`.
    pub fn bind_var<W: CodeWriter + ?Sized>(
        &mut self,
        id: ScopeId,
        w: &mut W,
        name: InternedString,
        value: &str,
    ) -> Result<(), ScopeError> {
        let text = self.interner.resolve(name).to_string();
        tracing::trace!(scope = id.0, name = %text, "bind var");
        match self.target(id, name) {
            Target::Global => self.bind_global(w, &text, value),
            Target::Class => {
                let key = self.intern(&text);
                w.write_checked_call1(&format!("πClass.SetItem(πF, {}.ToObject(), {})", key, value));
            }
            Target::Slot => w.write(&format!("{} = {}", adjust_local_name(&text), value)),
            Target::Unclassified => return Err(ScopeError::UnclassifiedName { name: text, span: None }),
        }
        Ok(())
    }

    /// Emit code unbinding `name` as seen from scope `id`.
    pub fn del_var<W: CodeWriter + ?Sized>(
        &mut self,
        id: ScopeId,
        w: &mut W,
        name: InternedString,
    ) -> Result<(), ScopeError> {
        let text = self.interner.resolve(name).to_string();
        tracing::trace!(scope = id.0, name = %text, "del var");
        match self.target(id, name) {
            Target::Global => {
                let key = self.intern(&text);
                w.write_checked_call1(&format!("πg.DelVar(πF, πGlobals, {})", key));
            }
            Target::Class => {
                let key = self.intern(&text);
                w.write_checked_call1(&format!("πg.DelVar(πF, πClass, {})", key));
            }
            Target::Slot => {
                let slot = adjust_local_name(&text);
                // The slot must be bound before it can be unbound.
                w.write_checked_call1(&format!("πg.CheckLocal(πF, {}, {})", slot, go_str(&text)));
                w.write(&format!("{} = πg.UnboundLocal", slot));
            }
            Target::Unclassified => return Err(ScopeError::DeleteNonexistentLocal { name: text, span: None }),
        }
        Ok(())
    }

    /// Emit code reading `name` as seen from scope `id` and return the
    /// expression holding its value.
    pub fn resolve_name<W: CodeWriter + ?Sized>(
        &mut self,
        id: ScopeId,
        w: &mut W,
        name: InternedString,
    ) -> Result<GeneratedExpr, ScopeError> {
        let text = self.interner.resolve(name).to_string();
        tracing::trace!(scope = id.0, name = %text, "resolve name");
        match self.resolution(id, name) {
            Resolution::Global => Ok(self.resolve_global(id, w, &text)),
            Resolution::Class { closure_local } => {
                let local = if closure_local { adjust_local_name(&text) } else { "nil".to_string() };
                let key = self.intern(&text);
                let result = self.alloc_temp(id, DEFAULT_TEMP_TYPE);
                w.write_checked_call2(
                    &result.name,
                    &format!("πg.ResolveClass(πF, πClass, {}, πGlobals, {})", local, key),
                );
                Ok(GeneratedExpr::Temp(result))
            }
            Resolution::Slot => {
                let slot = adjust_local_name(&text);
                w.write_checked_call1(&format!("πg.CheckLocal(πF, {}, {})", slot, go_str(&text)));
                Ok(GeneratedExpr::Local(slot))
            }
        }
    }

    /// How a read of `name` in scope `id` is satisfied.
    fn resolution(&self, id: ScopeId, name: InternedString) -> Resolution {
        let scope = self.scope(id);
        match &scope.kind {
            ScopeKind::Module => Resolution::Global,
            ScopeKind::Class { global_vars } if global_vars.contains(&name) => Resolution::Global,
            ScopeKind::Class { .. } => Resolution::Class {
                closure_local: self
                    .enclosing_function_var(scope.parent, name)
                    .is_some_and(|var| !var.is_global()),
            },
            ScopeKind::Function { .. } => match self.enclosing_function_var(Some(id), name) {
                Some(var) if !var.is_global() => Resolution::Slot,
                _ => Resolution::Global,
            },
        }
    }

    /// The record for `name` in the nearest function scope, starting at
    /// `from` and walking outward, that classified it. Class scopes are
    /// skipped; the walk stops at the first match whatever its kind.
    fn enclosing_function_var(&self, from: Option<ScopeId>, name: InternedString) -> Option<Var> {
        let start = from?;
        self.ancestors(start)
            .take_while(|scope| !matches!(scope.kind, ScopeKind::Module))
            .find_map(|scope| scope.lookup(name).copied())
    }

    fn bind_global<W: CodeWriter + ?Sized>(&mut self, w: &mut W, name: &str, value: &str) {
        let key = self.intern(name);
        w.write_checked_call1(&format!("πGlobals.SetItem(πF, {}.ToObject(), {})", key, value));
    }

    fn resolve_global<W: CodeWriter + ?Sized>(&mut self, id: ScopeId, w: &mut W, name: &str) -> GeneratedExpr {
        let key = self.intern(name);
        let result = self.alloc_temp(id, DEFAULT_TEMP_TYPE);
        w.write_checked_call2(&result.name, &format!("πg.ResolveGlobal(πF, πGlobals, {})", key));
        GeneratedExpr::Temp(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grumble_writer::{Fragment, RecordingWriter};
    use pretty_assertions::assert_eq;

    fn checked(call: &str) -> Fragment {
        Fragment::CheckedCall { call: call.to_string() }
    }

    fn checked_result(result: &str, call: &str) -> Fragment {
        Fragment::CheckedCallResult {
            result: result.to_string(),
            call: call.to_string(),
        }
    }

    fn function_vars(vars: &[Var], is_generator: bool) -> FunctionVars {
        FunctionVars {
            vars: vars.iter().map(|var| (var.name, *var)).collect(),
            is_generator,
        }
    }

    fn tree() -> (ScopeTree, StringInterner) {
        let interner = StringInterner::new();
        (ScopeTree::new(&UnitOptions::default(), &interner), interner)
    }

    #[test]
    fn test_module_scope_is_root() {
        let (tree, _) = tree();
        let module = tree.scope(tree.module());
        assert!(module.parent.is_none());
        assert_eq!(module.module, ScopeId::MODULE);
        assert!(matches!(module.kind, ScopeKind::Module));
    }

    #[test]
    fn test_children_share_module() {
        let (mut tree, _) = tree();
        let f = tree.push_function(ScopeId::MODULE, "f", function_vars(&[], false));
        let c = tree.push_class(f, "C", &ClassVars { vars: VarMap::default() });
        assert_eq!(tree.scope(c).parent, Some(f));
        assert_eq!(tree.scope(c).module, ScopeId::MODULE);
        let chain: Vec<_> = tree.ancestors(c).map(|s| s.id).collect();
        assert_eq!(chain, vec![c, f, ScopeId::MODULE]);
    }

    #[test]
    fn test_module_bind_and_del() {
        let (mut tree, interner) = tree();
        let x = interner.intern("x");
        let mut w = RecordingWriter::new();
        tree.bind_var(ScopeId::MODULE, &mut w, x, "πTemp001").unwrap();
        tree.del_var(ScopeId::MODULE, &mut w, x).unwrap();
        assert_eq!(
            w.take(),
            vec![
                checked("πGlobals.SetItem(πF, ßx.ToObject(), πTemp001)"),
                checked("πg.DelVar(πF, πGlobals, ßx)"),
            ]
        );
        assert!(tree.registry().is_interned("x"));
    }

    #[test]
    fn test_module_resolve_allocates_temp() {
        let (mut tree, interner) = tree();
        let mut w = RecordingWriter::new();
        let expr = tree.resolve_name(ScopeId::MODULE, &mut w, interner.intern("x")).unwrap();
        assert_eq!(expr.expr(), "πTemp001");
        assert_eq!(
            w.take(),
            vec![checked_result("πTemp001", "πg.ResolveGlobal(πF, πGlobals, ßx)")]
        );
        assert!(tree.scope(ScopeId::MODULE).resources.is_temp_in_use(expr.temp().unwrap()));
    }

    #[test]
    fn test_function_local_bind_del_resolve() {
        let (mut tree, interner) = tree();
        let x = interner.intern("x");
        let f = tree.push_function(ScopeId::MODULE, "f", function_vars(&[Var::local(x)], false));
        let mut w = RecordingWriter::new();

        tree.bind_var(f, &mut w, x, "πTemp001").unwrap();
        let expr = tree.resolve_name(f, &mut w, x).unwrap();
        tree.del_var(f, &mut w, x).unwrap();

        assert_eq!(expr, GeneratedExpr::Local("µx".to_string()));
        assert_eq!(
            w.take(),
            vec![
                Fragment::Raw("µx = πTemp001".to_string()),
                checked("πg.CheckLocal(πF, µx, \"x\")"),
                checked("πg.CheckLocal(πF, µx, \"x\")"),
                Fragment::Raw("µx = πg.UnboundLocal".to_string()),
            ]
        );
        // Local access never touches the string registry.
        assert!(!tree.registry().is_interned("x"));
    }

    #[test]
    fn test_function_global_delegates_to_module() {
        let (mut tree, interner) = tree();
        let g = interner.intern("g");
        let f = tree.push_function(ScopeId::MODULE, "f", function_vars(&[Var::global(g)], false));
        let mut w = RecordingWriter::new();

        tree.bind_var(f, &mut w, g, "v").unwrap();
        let expr = tree.resolve_name(f, &mut w, g).unwrap();
        tree.del_var(f, &mut w, g).unwrap();

        assert_eq!(
            w.take(),
            vec![
                checked("πGlobals.SetItem(πF, ßg.ToObject(), v)"),
                checked_result("πTemp001", "πg.ResolveGlobal(πF, πGlobals, ßg)"),
                checked("πg.DelVar(πF, πGlobals, ßg)"),
            ]
        );
        // The temp belongs to the function, not the module.
        assert!(tree.scope(f).resources.is_temp_in_use(expr.temp().unwrap()));
        assert!(tree.scope(ScopeId::MODULE).resources.declared_temps().is_empty());
    }

    #[test]
    fn test_function_unknown_names() {
        let (mut tree, interner) = tree();
        let f = tree.push_function(ScopeId::MODULE, "f", function_vars(&[], false));
        let y = interner.intern("y");
        let mut w = RecordingWriter::new();

        assert_eq!(
            tree.del_var(f, &mut w, y),
            Err(ScopeError::DeleteNonexistentLocal {
                name: "y".to_string(),
                span: None
            })
        );
        assert_eq!(
            tree.bind_var(f, &mut w, y, "v"),
            Err(ScopeError::UnclassifiedName {
                name: "y".to_string(),
                span: None
            })
        );
        assert!(w.fragments().is_empty());

        let expr = tree.resolve_name(f, &mut w, y).unwrap();
        assert_eq!(expr.expr(), "πTemp001");
        assert_eq!(
            w.take(),
            vec![checked_result("πTemp001", "πg.ResolveGlobal(πF, πGlobals, ßy)")]
        );
    }

    #[test]
    fn test_function_resolves_enclosing_local_through_class() {
        let (mut tree, interner) = tree();
        let x = interner.intern("x");
        let outer = tree.push_function(ScopeId::MODULE, "outer", function_vars(&[Var::param(x, 0)], false));
        let class = tree.push_class(outer, "C", &ClassVars { vars: VarMap::default() });
        let inner = tree.push_function(class, "inner", function_vars(&[], false));
        let mut w = RecordingWriter::new();

        let expr = tree.resolve_name(inner, &mut w, x).unwrap();
        assert_eq!(expr.expr(), "µx");
        assert_eq!(w.take(), vec![checked("πg.CheckLocal(πF, µx, \"x\")")]);
    }

    #[test]
    fn test_nearest_global_shadows_outer_local() {
        let (mut tree, interner) = tree();
        let x = interner.intern("x");
        let outer = tree.push_function(ScopeId::MODULE, "outer", function_vars(&[Var::local(x)], false));
        let inner = tree.push_function(outer, "inner", function_vars(&[Var::global(x)], false));
        let mut w = RecordingWriter::new();

        tree.resolve_name(inner, &mut w, x).unwrap();
        assert_eq!(
            w.take(),
            vec![checked_result("πTemp001", "πg.ResolveGlobal(πF, πGlobals, ßx)")]
        );
    }

    #[test]
    fn test_class_bind_del_resolve() {
        let (mut tree, interner) = tree();
        let a = interner.intern("a");
        let class = tree.push_class(ScopeId::MODULE, "C", &ClassVars { vars: VarMap::default() });
        let mut w = RecordingWriter::new();

        tree.bind_var(class, &mut w, a, "πTemp009").unwrap();
        tree.del_var(class, &mut w, a).unwrap();
        let expr = tree.resolve_name(class, &mut w, a).unwrap();

        assert_eq!(expr.expr(), "πTemp001");
        assert_eq!(
            w.take(),
            vec![
                checked("πClass.SetItem(πF, ßa.ToObject(), πTemp009)"),
                checked("πg.DelVar(πF, πClass, ßa)"),
                checked_result("πTemp001", "πg.ResolveClass(πF, πClass, nil, πGlobals, ßa)"),
            ]
        );
    }

    #[test]
    fn test_class_resolve_captures_closure_local() {
        let (mut tree, interner) = tree();
        let x = interner.intern("x");
        let f = tree.push_function(ScopeId::MODULE, "f", function_vars(&[Var::local(x)], false));
        let class = tree.push_class(f, "C", &ClassVars { vars: VarMap::default() });
        let mut w = RecordingWriter::new();

        tree.resolve_name(class, &mut w, x).unwrap();
        assert_eq!(
            w.take(),
            vec![checked_result("πTemp001", "πg.ResolveClass(πF, πClass, µx, πGlobals, ßx)")]
        );
    }

    #[test]
    fn test_class_resolve_stops_at_enclosing_global() {
        let (mut tree, interner) = tree();
        let x = interner.intern("x");
        let outer = tree.push_function(ScopeId::MODULE, "outer", function_vars(&[Var::local(x)], false));
        let f = tree.push_function(outer, "f", function_vars(&[Var::global(x)], false));
        let class = tree.push_class(f, "C", &ClassVars { vars: VarMap::default() });
        let mut w = RecordingWriter::new();

        tree.resolve_name(class, &mut w, x).unwrap();
        assert_eq!(
            w.take(),
            vec![checked_result("πTemp001", "πg.ResolveClass(πF, πClass, nil, πGlobals, ßx)")]
        );
    }

    #[test]
    fn test_class_global_goes_to_module() {
        let (mut tree, interner) = tree();
        let g = interner.intern("g");
        let mut vars = VarMap::default();
        vars.insert(g, Var::global(g));
        let class = tree.push_class(ScopeId::MODULE, "C", &ClassVars { vars });
        let mut w = RecordingWriter::new();

        tree.bind_var(class, &mut w, g, "v").unwrap();
        tree.resolve_name(class, &mut w, g).unwrap();
        tree.del_var(class, &mut w, g).unwrap();

        assert_eq!(
            w.take(),
            vec![
                checked("πGlobals.SetItem(πF, ßg.ToObject(), v)"),
                checked_result("πTemp001", "πg.ResolveGlobal(πF, πGlobals, ßg)"),
                checked("πg.DelVar(πF, πGlobals, ßg)"),
            ]
        );
    }

    #[test]
    fn test_free_expr_only_releases_temps() {
        let (mut tree, _) = tree();
        let t = tree.alloc_temp(ScopeId::MODULE, DEFAULT_TEMP_TYPE);
        tree.free_expr(ScopeId::MODULE, &GeneratedExpr::Local("µx".to_string())).unwrap();
        assert!(tree.scope(ScopeId::MODULE).resources.is_temp_in_use(&t));
        tree.free_expr(ScopeId::MODULE, &GeneratedExpr::Temp(t.clone())).unwrap();
        assert!(!tree.scope(ScopeId::MODULE).resources.is_temp_in_use(&t));
    }

    #[test]
    fn test_resources_are_per_scope() {
        let (mut tree, _) = tree();
        let f = tree.push_function(ScopeId::MODULE, "f", function_vars(&[], true));
        assert!(tree.scope(f).is_generator());
        assert_eq!(tree.gen_label(ScopeId::MODULE, false), 1);
        assert_eq!(tree.gen_label(f, true), 1);
        let l = tree.push_loop(f);
        assert_eq!(tree.top_loop(f), Some(l));
        assert_eq!(tree.top_loop(ScopeId::MODULE), None);
        assert_eq!(tree.pop_loop(f), Some(l));
    }
}
