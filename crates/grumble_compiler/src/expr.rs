//! Expression code generation.
//!
//! Every visit returns a [`GeneratedExpr`]; the caller frees it once the
//! value has been consumed.

use crate::codegen::Codegen;
use crate::error::CompileError;
use grumble_ast::node::{BinOp, Expr, ExprKind};
use grumble_scope::{GeneratedExpr, ScopeId, DEFAULT_TEMP_TYPE};
use grumble_writer::{CodeWriter, GoWriter};

/// Runtime function implementing `op`.
pub(crate) fn binop_func(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "πg.Add",
        BinOp::Sub => "πg.Sub",
        BinOp::Mult => "πg.Mul",
    }
}

/// Runtime function implementing the in-place form of `op`.
pub(crate) fn inplace_func(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "πg.IAdd",
        BinOp::Sub => "πg.ISub",
        BinOp::Mult => "πg.IMul",
    }
}

pub(crate) fn join_exprs(exprs: &[GeneratedExpr]) -> String {
    exprs.iter().map(GeneratedExpr::expr).collect::<Vec<_>>().join(", ")
}

impl Codegen<'_> {
    pub(crate) fn visit_expr(&mut self, scope: ScopeId, w: &mut GoWriter, expr: &Expr<'_>) -> Result<GeneratedExpr, CompileError> {
        match &expr.kind {
            ExprKind::Name(name) => Ok(self.tree.resolve_name(scope, w, *name)?),
            ExprKind::Str(value) => Ok(GeneratedExpr::Literal(format!("{}.ToObject()", self.tree.intern(value)))),
            ExprKind::Int(value) => Ok(GeneratedExpr::Literal(format!("πg.NewInt({}).ToObject()", value))),
            ExprKind::Tuple(elts) => self.visit_sequence(scope, w, elts, "πg.NewTuple"),
            ExprKind::List(elts) => self.visit_sequence(scope, w, elts, "πg.NewList"),
            ExprKind::Attribute { value, attr } => {
                let obj = self.visit_expr(scope, w, value)?;
                let attr = self.intern_ident(*attr);
                let result = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
                w.write_checked_call2(&result.name, &format!("πg.GetAttr(πF, {}, {}, nil)", obj.expr(), attr));
                self.tree.free_expr(scope, &obj)?;
                Ok(GeneratedExpr::Temp(result))
            }
            ExprKind::Call { func, args } => {
                let func = self.visit_expr(scope, w, func)?;
                let args = self.visit_all(scope, w, args)?;
                let result = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
                w.write_checked_call2(
                    &result.name,
                    &format!("{}.Call(πF, πg.Args{{{}}}, nil)", func.expr(), join_exprs(&args)),
                );
                self.tree.free_expr(scope, &func)?;
                self.free_all(scope, &args)?;
                Ok(GeneratedExpr::Temp(result))
            }
            ExprKind::BinOp { left, op, right } => {
                let lhs = self.visit_expr(scope, w, left)?;
                let rhs = self.visit_expr(scope, w, right)?;
                let result = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
                w.write_checked_call2(
                    &result.name,
                    &format!("{}(πF, {}, {})", binop_func(*op), lhs.expr(), rhs.expr()),
                );
                self.tree.free_expr(scope, &lhs)?;
                self.tree.free_expr(scope, &rhs)?;
                Ok(GeneratedExpr::Temp(result))
            }
            ExprKind::Yield(value) => self.visit_yield(scope, w, *value),
        }
    }

    fn visit_all(&mut self, scope: ScopeId, w: &mut GoWriter, exprs: &[Expr<'_>]) -> Result<Vec<GeneratedExpr>, CompileError> {
        exprs.iter().map(|expr| self.visit_expr(scope, w, expr)).collect()
    }

    fn free_all(&mut self, scope: ScopeId, exprs: &[GeneratedExpr]) -> Result<(), CompileError> {
        for expr in exprs {
            self.tree.free_expr(scope, expr)?;
        }
        Ok(())
    }

    fn visit_sequence(
        &mut self,
        scope: ScopeId,
        w: &mut GoWriter,
        elts: &[Expr<'_>],
        constructor: &str,
    ) -> Result<GeneratedExpr, CompileError> {
        let elts = self.visit_all(scope, w, elts)?;
        let result = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
        w.write(&format!("{} = {}({}).ToObject()", result.name, constructor, join_exprs(&elts)));
        self.free_all(scope, &elts)?;
        Ok(GeneratedExpr::Temp(result))
    }

    /// Suspend the generator with `value` and resume with the sent value.
    fn visit_yield(&mut self, scope: ScopeId, w: &mut GoWriter, value: Option<&Expr<'_>>) -> Result<GeneratedExpr, CompileError> {
        if !self.tree.scope(scope).is_generator() {
            return Err(CompileError::unsupported("'yield' outside function"));
        }
        let value = value.map(|value| self.visit_expr(scope, w, value)).transpose()?;
        let resume = self.tree.gen_label(scope, true);
        w.write(&format!("πF.PushCheckpoint({})", resume));
        w.write(&format!(
            "return {}, nil",
            value.as_ref().map_or("πg.None", GeneratedExpr::expr)
        ));
        w.write_label(resume);
        if let Some(value) = &value {
            self.tree.free_expr(scope, value)?;
        }
        let result = self.tree.alloc_temp(scope, DEFAULT_TEMP_TYPE);
        w.write(&format!("{} = πSent", result.name));
        Ok(GeneratedExpr::Temp(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_functions() {
        assert_eq!(binop_func(BinOp::Mult), "πg.Mul");
        assert_eq!(inplace_func(BinOp::Sub), "πg.ISub");
    }

    #[test]
    fn test_join_exprs() {
        let exprs = vec![
            GeneratedExpr::Local("µa".to_string()),
            GeneratedExpr::Literal("πg.None".to_string()),
        ];
        assert_eq!(join_exprs(&exprs), "µa, πg.None");
        assert_eq!(join_exprs(&[]), "");
    }
}
