//! Statement code generation.
//!
//! Control flow is lowered to labels and `goto` rather than Go blocks, so a
//! `yield` anywhere in a body leaves a resumable label at the top level of
//! the dispatch loop.

use crate::codegen::Codegen;
use crate::error::CompileError;
use crate::expr::inplace_func;
use grumble_ast::node::*;
use grumble_scope::{Loop, ScopeId, ScopeKind, TempVar, DEFAULT_TEMP_TYPE};
use grumble_writer::{go_str, CodeWriter, GoWriter};

/// First component of `from __go__.<path> import <Name>`, naming a Go
/// package instead of a Python module.
const NATIVE_PREFIX: &str = "__go__";

impl Codegen<'_> {
    pub(crate) fn visit_body(&mut self, scope: ScopeId, w: &mut GoWriter, body: &[Stmt<'_>]) -> Result<(), CompileError> {
        for stmt in body {
            self.visit_stmt(scope, w, stmt)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, scope: ScopeId, w: &mut GoWriter, stmt: &Stmt<'_>) -> Result<(), CompileError> {
        if let Some(source) = self.source {
            if !stmt.span.is_empty() {
                let line = source.lines.line_of(stmt.span.start);
                w.write_py_context(line + 1, source.lines.line_text(&source.text, line));
            }
        }
        self.visit_stmt_kind(scope, w, &stmt.kind).map_err(|err| {
            if stmt.span.is_empty() {
                err
            } else {
                err.with_span(stmt.span)
            }
        })
    }

    fn visit_stmt_kind(&mut self, scope: ScopeId, w: &mut GoWriter, kind: &StmtKind<'_>) -> Result<(), CompileError> {
        match kind {
            StmtKind::Assign { targets, value } => {
                let value = self.visit_expr(scope, w, value)?;
                for target in targets.iter() {
                    self.assign_target(scope, w, target, value.expr())?;
                }
                self.tree.free_expr(scope, &value)?;
            }
            StmtKind::AugAssign { target, op, value } => self.visit_aug_assign(scope, w, target, *op, value)?,
            StmtKind::Delete { targets } => {
                for target in targets.iter() {
                    match &target.kind {
                        ExprKind::Name(name) => self.tree.del_var(scope, w, *name)?,
                        _ => return Err(CompileError::unsupported("deleting this target")),
                    }
                }
            }
            // Declarations only affect classification.
            StmtKind::Global { .. } | StmtKind::Pass => {}
            StmtKind::Import { names } => {
                for alias in names.iter() {
                    self.visit_import(scope, w, alias)?;
                }
            }
            StmtKind::ImportFrom { module, names, level } => {
                self.visit_import_from(scope, w, module, names, *level)?
            }
            StmtKind::FunctionDef(def) => self.visit_function_def(scope, w, def)?,
            StmtKind::ClassDef(def) => self.visit_class_def(scope, w, def)?,
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
            } => self.visit_for(scope, w, target, iter, body, orelse)?,
            StmtKind::While { test, body, orelse } => self.visit_while(scope, w, test, body, orelse)?,
            StmtKind::If { test, body, orelse } => self.visit_if(scope, w, test, body, orelse)?,
            StmtKind::With { .. } => return Err(CompileError::unsupported("'with' statement")),
            StmtKind::Try { .. } => return Err(CompileError::unsupported("'try' statement")),
            StmtKind::Return { value } => self.visit_return(scope, w, *value)?,
            StmtKind::Expr { value } => {
                let value = self.visit_expr(scope, w, value)?;
                self.tree.free_expr(scope, &value)?;
            }
            StmtKind::Break => {
                let l = self.enclosing_loop(scope, "break")?;
                w.write(&format!("goto Label{}", l.end_label));
            }
            StmtKind::Continue => {
                let l = self.enclosing_loop(scope, "continue")?;
                w.write(&format!("goto Label{}", l.start_label));
            }
        }
        Ok(())
    }

    fn enclosing_loop(&self, scope: ScopeId, keyword: &'static str) -> Result<Loop, CompileError> {
        self.tree
            .top_loop(scope)
            .ok_or(CompileError::LoopControlOutsideLoop { keyword, span: None })
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    /// Store the Go expression `rhs` into `target`.
    fn assign_target(&mut self, scope: ScopeId, w: &mut GoWriter, target: &Expr<'_>, rhs: &str) -> Result<(), CompileError> {
        match &target.kind {
            ExprKind::Name(name) => self.tree.bind_var(scope, w, *name, rhs)?,
            ExprKind::Attribute { value, attr } => {
                let obj = self.visit_expr(scope, w, value)?;
                let attr = self.intern_ident(*attr);
                w.write_checked_call1(&format!("πg.SetAttr(πF, {}, {}, {})", obj.expr(), attr, rhs));
                self.tree.free_expr(scope, &obj)?;
            }
            ExprKind::Tuple(elts) | ExprKind::List(elts) => self.unpack(scope, w, elts, rhs)?,
            _ => return Err(CompileError::unsupported("assignment to this target")),
        }
        Ok(())
    }

    /// Destructure `rhs` into `elts`, element by element.
    fn unpack(&mut self, scope: ScopeId, w: &mut GoWriter, elts: &[Expr<'_>], rhs: &str) -> Result<(), CompileError> {
        let items = self.tree.alloc_temp(scope, "[]*πg.Object");
        w.write(&format!("{} = make([]*πg.Object, {})", items.name, elts.len()));
        let targets: Vec<String> = (0..elts.len())
            .map(|i| format!("{{Target: &{}[{}]}}", items.name, i))
            .collect();
        w.write_checked_call1(&format!(
            "πg.Tie(πF, πg.TieTarget{{Children: []πg.TieTarget{{{}}}}}, {})",
            targets.join(", "),
            rhs
        ));
        for (i, elt) in elts.iter().enumerate() {
            self.assign_target(scope, w, elt, &format!("{}[{}]", items.name, i))?;
        }
        self.tree.free_temp(scope, &items)?;
        Ok(())
    }

    fn visit_aug_assign(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        target: &Expr<'_>,
        op: BinOp,
        value: &Expr<'_>,
    ) -> Result<(), CompileError> {
        let ExprKind::Name(name) = &target.kind else {
            return Err(CompileError::unsupported("augmented assignment to this target"));
        };
        let lhs = self.tree.resolve_name(scope, w, *name)?;
        let rhs = self.visit_expr(scope, w, value)?;
        let result = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
        w.write_checked_call2(
            &result.name,
            &format!("{}(πF, {}, {})", inplace_func(op), lhs.expr(), rhs.expr()),
        );
        self.tree.free_expr(scope, &lhs)?;
        self.tree.free_expr(scope, &rhs)?;
        self.tree.bind_var(scope, w, *name, &result.name)?;
        self.tree.free_temp(scope, &result)?;
        Ok(())
    }

    fn visit_return(&mut self, scope: ScopeId, w: &mut GoWriter, value: Option<&Expr<'_>>) -> Result<(), CompileError> {
        let is_generator = match self.tree.scope(scope).kind {
            ScopeKind::Function { is_generator, .. } => is_generator,
            _ => return Err(CompileError::ReturnOutsideFunction { span: None }),
        };
        match (value, is_generator) {
            (None, true) => w.write("return nil, nil"),
            (Some(_), true) => return Err(CompileError::unsupported("'return' with a value inside a generator")),
            (None, false) => w.write("return πg.None, nil"),
            (Some(value), false) => {
                let value = self.visit_expr(scope, w, value)?;
                w.write(&format!("return {}, nil", value.expr()));
                self.tree.free_expr(scope, &value)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    /// Evaluate `test` and jump to `false_label` unless it is truthy.
    fn write_test(&mut self, scope: ScopeId, w: &mut GoWriter, test: &Expr<'_>, false_label: u32) -> Result<(), CompileError> {
        let value = self.visit_expr(scope, w, test)?;
        let cond = self.tree.alloc_temp(scope, "bool");
        w.write_checked_call2(&cond.name, &format!("πg.IsTrue(πF, {})", value.expr()));
        w.write(&format!("if !{} {{\n\tgoto Label{}\n}}", cond.name, false_label));
        self.tree.free_expr(scope, &value)?;
        self.tree.free_temp(scope, &cond)?;
        Ok(())
    }

    fn visit_if(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        test: &Expr<'_>,
        body: &[Stmt<'_>],
        orelse: &[Stmt<'_>],
    ) -> Result<(), CompileError> {
        let else_label = (!orelse.is_empty()).then(|| self.tree.gen_label(scope, false));
        let end_label = self.tree.gen_label(scope, false);
        self.write_test(scope, w, test, else_label.unwrap_or(end_label))?;
        self.visit_body(scope, w, body)?;
        if let Some(else_label) = else_label {
            w.write(&format!("goto Label{}", end_label));
            w.write_label(else_label);
            self.visit_body(scope, w, orelse)?;
        }
        w.write_label(end_label);
        Ok(())
    }

    fn visit_while(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        test: &Expr<'_>,
        body: &[Stmt<'_>],
        orelse: &[Stmt<'_>],
    ) -> Result<(), CompileError> {
        let l = self.tree.push_loop(scope);
        let else_label = (!orelse.is_empty()).then(|| self.tree.gen_label(scope, false));
        w.write_label(l.start_label);
        self.write_test(scope, w, test, else_label.unwrap_or(l.end_label))?;
        self.visit_body(scope, w, body)?;
        w.write(&format!("goto Label{}", l.start_label));
        self.tree.pop_loop(scope);
        self.write_loop_else(scope, w, l, else_label, orelse)
    }

    fn visit_for(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        target: &Expr<'_>,
        iter: &Expr<'_>,
        body: &[Stmt<'_>],
        orelse: &[Stmt<'_>],
    ) -> Result<(), CompileError> {
        let iterable = self.visit_expr(scope, w, iter)?;
        let iterator = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
        w.write_checked_call2(&iterator.name, &format!("πg.Iter(πF, {})", iterable.expr()));
        self.tree.free_expr(scope, &iterable)?;

        let l = self.tree.push_loop(scope);
        let else_label = (!orelse.is_empty()).then(|| self.tree.gen_label(scope, false));
        w.write_label(l.start_label);
        let item = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
        // StopIteration ends the loop; any other failure propagates.
        w.write(&format!(
            "if {}, πE = πg.Next(πF, {}); πE != nil {{\n\tif πE.Type() != πg.StopIterationType {{\n\t\tcontinue\n\t}}\n\tπE = nil\n\tπF.RestoreExc(nil, nil)\n\tgoto Label{}\n}}",
            item.name,
            iterator.name,
            else_label.unwrap_or(l.end_label)
        ));
        self.assign_target(scope, w, target, &item.name)?;
        self.tree.free_temp(scope, &item)?;
        self.visit_body(scope, w, body)?;
        w.write(&format!("goto Label{}", l.start_label));
        self.tree.pop_loop(scope);
        self.write_loop_else(scope, w, l, else_label, orelse)?;
        self.tree.free_temp(scope, &iterator)?;
        Ok(())
    }

    /// The `else` clause of a loop, run on normal exhaustion, and the exit
    /// label `break` jumps to.
    fn write_loop_else(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        l: Loop,
        else_label: Option<u32>,
        orelse: &[Stmt<'_>],
    ) -> Result<(), CompileError> {
        if let Some(else_label) = else_label {
            w.write_label(else_label);
            self.visit_body(scope, w, orelse)?;
            w.write(&format!("goto Label{}", l.end_label));
        }
        w.write_label(l.end_label);
        Ok(())
    }

    // ========================================================================
    // Imports
    // ========================================================================

    /// Load `module` and every package above it. The result holds one module
    /// object per path component.
    fn import_module(&mut self, scope: ScopeId, w: &mut GoWriter, module: &DottedName<'_>) -> Result<TempVar, CompileError> {
        if module.parts.is_empty() {
            return Err(CompileError::unsupported("import of an empty module path"));
        }
        let mut codes = Vec::with_capacity(module.parts.len());
        for depth in 1..=module.parts.len() {
            let path: Vec<&str> = module.parts[..depth]
                .iter()
                .map(|part| self.interner.resolve(part.name))
                .collect();
            let package = self.tree.add_import(&path.join("/"));
            codes.push(format!("{}.Code", package.alias));
        }
        let mods = self.tree.alloc_temp(scope, "[]*πg.Object");
        w.write_checked_call2(
            &mods.name,
            &format!(
                "πg.ImportModule(πF, {}, []*πg.Code{{{}}})",
                go_str(&module.join(&self.interner, ".")),
                codes.join(", ")
            ),
        );
        Ok(mods)
    }

    /// `import a.b` binds `a`; `import a.b as c` binds `c` to `a.b`.
    fn visit_import(&mut self, scope: ScopeId, w: &mut GoWriter, alias: &Alias<'_>) -> Result<(), CompileError> {
        let mods = self.import_module(scope, w, &alias.name)?;
        let (bound, index) = match (alias.asname, alias.name.first()) {
            (Some(asname), _) => (asname, alias.name.parts.len() - 1),
            (None, Some(first)) => (first, 0),
            (None, None) => return Err(CompileError::unsupported("import of an empty module path")),
        };
        self.tree
            .bind_var(scope, w, bound.name, &format!("{}[{}]", mods.name, index))?;
        self.tree.free_temp(scope, &mods)?;
        Ok(())
    }

    fn visit_import_from(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        module: &DottedName<'_>,
        names: &[Alias<'_>],
        level: u32,
    ) -> Result<(), CompileError> {
        if level > 0 {
            return Err(CompileError::unsupported("relative import"));
        }
        let is_native = module
            .first()
            .is_some_and(|first| self.interner.resolve(first.name) == NATIVE_PREFIX);
        if is_native {
            return self.visit_native_import(scope, w, module, names);
        }

        let mods = self.import_module(scope, w, module)?;
        let leaf = format!("{}[{}]", mods.name, module.parts.len() - 1);
        for alias in names {
            let Some(name) = alias.name.last() else { continue };
            let attr = self.intern_ident(name);
            let member = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
            w.write_checked_call2(&member.name, &format!("πg.GetAttr(πF, {}, {}, nil)", leaf, attr));
            self.tree
                .bind_var(scope, w, alias.asname.unwrap_or(name).name, &member.name)?;
            self.tree.free_temp(scope, &member)?;
        }
        self.tree.free_temp(scope, &mods)?;
        Ok(())
    }

    /// `from __go__.path.pkg import Name` wraps a Go package member.
    fn visit_native_import(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        module: &DottedName<'_>,
        names: &[Alias<'_>],
    ) -> Result<(), CompileError> {
        let path: Vec<&str> = module.parts[1..]
            .iter()
            .map(|part| self.interner.resolve(part.name))
            .collect();
        if path.is_empty() {
            return Err(CompileError::unsupported(format!("import from bare '{}'", NATIVE_PREFIX)));
        }
        let package = self.tree.add_native_import(&path.join("/"));
        let reflect = self.tree.add_native_import("reflect");
        for alias in names {
            let Some(name) = alias.name.last() else { continue };
            let member = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
            w.write_checked_call2(
                &member.name,
                &format!(
                    "πg.WrapNative(πF, {}.ValueOf({}.{}))",
                    reflect.alias,
                    package.alias,
                    self.interner.resolve(name.name)
                ),
            );
            self.tree
                .bind_var(scope, w, alias.asname.unwrap_or(name).name, &member.name)?;
            self.tree.free_temp(scope, &member)?;
        }
        Ok(())
    }
}
