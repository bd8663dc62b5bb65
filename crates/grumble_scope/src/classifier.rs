//! Scope classification.
//!
//! Walks the statements owned by one function or class body and records,
//! in source order, every name the body binds or declares `global`. The walk
//! enters nested control flow (loops, conditionals, `with`, `try`) but never
//! the body of a nested function or class: those names belong to their own
//! scope, and only the defined name is bound here.
//!
//! Binding rules:
//! - assignment and loop targets, `with ... as` names, `except ... as`
//!   names, imported names and nested definitions register a Local unless
//!   the name is already known
//! - `global x` registers a Global, failing if `x` is a parameter or was
//!   already bound as a Local earlier in the body
//! - parameters are registered before the body, in declaration order

use crate::error::ScopeError;
use crate::var::{Var, VarKind, VarMap};
use grumble_ast::node::*;
use grumble_core::intern::{InternedString, StringInterner};
use grumble_core::text::TextSpan;
use rustc_hash::FxHashSet;

/// Classification result for a function body.
#[derive(Debug, Clone)]
pub struct FunctionVars {
    pub vars: VarMap,
    /// Whether a `yield` appears among the directly owned statements.
    pub is_generator: bool,
}

/// Classification result for a class body.
#[derive(Debug, Clone)]
pub struct ClassVars {
    pub vars: VarMap,
}

impl ClassVars {
    /// Names the class body declared `global`.
    pub fn global_vars(&self) -> FxHashSet<InternedString> {
        self.vars
            .values()
            .filter(|var| var.is_global())
            .map(|var| var.name)
            .collect()
    }
}

/// Classify a function definition: parameters first, then the body.
#[tracing::instrument(level = "debug", skip_all, fields(name = %interner.resolve(def.name.name)))]
pub fn classify_function(def: &FunctionDef<'_>, interner: &StringInterner) -> Result<FunctionVars, ScopeError> {
    let mut visitor = BlockVisitor::new(interner);
    for (index, param) in def.args.iter().enumerate() {
        if visitor.vars.contains_key(&param.name) {
            return Err(ScopeError::DuplicateArgument {
                name: interner.resolve(param.name).to_string(),
                span: Some(param.span),
            });
        }
        visitor.vars.insert(param.name, Var::param(param.name, index));
    }
    visitor.visit_body(def.body)?;
    tracing::debug!(vars = visitor.vars.len(), is_generator = visitor.is_generator, "classified function");
    Ok(FunctionVars {
        vars: visitor.vars,
        is_generator: visitor.is_generator,
    })
}

/// Classify a class body.
#[tracing::instrument(level = "debug", skip_all, fields(name = %interner.resolve(def.name.name)))]
pub fn classify_class(def: &ClassDef<'_>, interner: &StringInterner) -> Result<ClassVars, ScopeError> {
    let mut visitor = BlockVisitor::new(interner);
    visitor.visit_body(def.body)?;
    tracing::debug!(vars = visitor.vars.len(), "classified class");
    Ok(ClassVars { vars: visitor.vars })
}

struct BlockVisitor<'i> {
    vars: VarMap,
    is_generator: bool,
    interner: &'i StringInterner,
}

impl<'i> BlockVisitor<'i> {
    fn new(interner: &'i StringInterner) -> Self {
        Self {
            vars: VarMap::default(),
            is_generator: false,
            interner,
        }
    }

    fn visit_body(&mut self, stmts: &[Stmt<'_>]) -> Result<(), ScopeError> {
        for stmt in stmts {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt<'_>) -> Result<(), ScopeError> {
        match &stmt.kind {
            StmtKind::Assign { targets, value } => {
                for target in targets.iter() {
                    self.assign_target(target);
                }
                self.visit_expr(value);
            }
            StmtKind::AugAssign { target, value, .. } => {
                self.assign_target(target);
                self.visit_expr(value);
            }
            StmtKind::Delete { targets } => {
                for target in targets.iter() {
                    self.visit_expr(target);
                }
            }
            StmtKind::Global { names } => {
                for name in names.iter() {
                    self.register_global(name.name, stmt.span)?;
                }
            }
            StmtKind::Import { names } => {
                for alias in names.iter() {
                    if let Some(bound) = alias.asname.or_else(|| alias.name.first()) {
                        self.register_local(bound.name);
                    }
                }
            }
            StmtKind::ImportFrom { names, .. } => {
                for alias in names.iter() {
                    if let Some(bound) = alias.asname.or_else(|| alias.name.last()) {
                        self.register_local(bound.name);
                    }
                }
            }
            // Only the defined name; the body is a separate scope.
            StmtKind::FunctionDef(def) => self.register_local(def.name.name),
            StmtKind::ClassDef(def) => self.register_local(def.name.name),
            StmtKind::For { target, iter, body, orelse } => {
                self.assign_target(target);
                self.visit_expr(iter);
                self.visit_body(body)?;
                self.visit_body(orelse)?;
            }
            StmtKind::While { test, body, orelse } | StmtKind::If { test, body, orelse } => {
                self.visit_expr(test);
                self.visit_body(body)?;
                self.visit_body(orelse)?;
            }
            StmtKind::With { items, body } => {
                for item in items.iter() {
                    if let Some(ref vars) = item.optional_vars {
                        self.assign_target(vars);
                    }
                    self.visit_expr(&item.context_expr);
                }
                self.visit_body(body)?;
            }
            StmtKind::Try { body, handlers, orelse, finalbody } => {
                self.visit_body(body)?;
                for handler in handlers.iter() {
                    if let Some(name) = handler.name {
                        self.register_local(name.name);
                    }
                    if let Some(ref type_) = handler.type_ {
                        self.visit_expr(type_);
                    }
                    self.visit_body(handler.body)?;
                }
                self.visit_body(orelse)?;
                self.visit_body(finalbody)?;
            }
            StmtKind::Return { value } => {
                if let Some(value) = value {
                    self.visit_expr(value);
                }
            }
            StmtKind::Expr { value } => self.visit_expr(value),
            StmtKind::Break | StmtKind::Continue | StmtKind::Pass => {}
        }
        Ok(())
    }

    /// Only looks for `yield`; reading a name does not classify it.
    fn visit_expr(&mut self, expr: &Expr<'_>) {
        match &expr.kind {
            ExprKind::Yield(value) => {
                self.is_generator = true;
                if let Some(value) = value {
                    self.visit_expr(value);
                }
            }
            ExprKind::Tuple(elts) | ExprKind::List(elts) => {
                for elt in elts.iter() {
                    self.visit_expr(elt);
                }
            }
            ExprKind::Attribute { value, .. } => self.visit_expr(value),
            ExprKind::Call { func, args } => {
                self.visit_expr(func);
                for arg in args.iter() {
                    self.visit_expr(arg);
                }
            }
            ExprKind::BinOp { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            ExprKind::Name(_) | ExprKind::Str(_) | ExprKind::Int(_) => {}
        }
    }

    fn assign_target(&mut self, target: &Expr<'_>) {
        match &target.kind {
            ExprKind::Name(name) => self.register_local(*name),
            ExprKind::Tuple(elts) | ExprKind::List(elts) => {
                for elt in elts.iter() {
                    self.assign_target(elt);
                }
            }
            _ => {}
        }
    }

    fn register_global(&mut self, name: InternedString, span: TextSpan) -> Result<(), ScopeError> {
        match self.vars.get(&name).map(|var| var.kind) {
            Some(VarKind::Param { .. }) => Err(ScopeError::ParameterAndGlobal {
                name: self.interner.resolve(name).to_string(),
                span: Some(span),
            }),
            Some(VarKind::Local) => Err(ScopeError::UsedPriorToGlobal {
                name: self.interner.resolve(name).to_string(),
                span: Some(span),
            }),
            Some(VarKind::Global) => Ok(()),
            None => {
                self.vars.insert(name, Var::global(name));
                Ok(())
            }
        }
    }

    fn register_local(&mut self, name: InternedString) {
        self.vars.entry(name).or_insert_with(|| Var::local(name));
    }
}
