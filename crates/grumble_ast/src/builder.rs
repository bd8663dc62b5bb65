//! Arena-backed construction of syntax trees.
//!
//! The builder is the hand-off point between a front end (or a test) and
//! the rest of the pipeline: it interns identifiers and moves nodes into the
//! arena. Nodes are created with empty spans; use [`AstBuilder::at`] to
//! attach a source location.

use crate::node::*;
use grumble_core::arena::CompilerArena;
use grumble_core::intern::StringInterner;
use grumble_core::text::TextSpan;

pub struct AstBuilder<'a> {
    arena: &'a CompilerArena,
    interner: StringInterner,
}

impl<'a> AstBuilder<'a> {
    pub fn new(arena: &'a CompilerArena, interner: &StringInterner) -> Self {
        Self {
            arena,
            interner: interner.clone(),
        }
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    fn alloc<T>(&self, value: T) -> &'a T {
        let arena: &'a CompilerArena = self.arena;
        arena.alloc(value)
    }

    fn list<T>(&self, items: Vec<T>) -> NodeList<'a, T> {
        let arena: &'a CompilerArena = self.arena;
        arena.alloc_slice(items)
    }

    fn stmt(&self, kind: StmtKind<'a>) -> Stmt<'a> {
        Stmt {
            kind,
            span: TextSpan::default(),
        }
    }

    fn expr(&self, kind: ExprKind<'a>) -> Expr<'a> {
        Expr {
            kind,
            span: TextSpan::default(),
        }
    }

    /// Give `stmt` the source location `span`.
    pub fn at(&self, stmt: Stmt<'a>, span: TextSpan) -> Stmt<'a> {
        Stmt { span, ..stmt }
    }

    pub fn module(&self, body: Vec<Stmt<'a>>) -> Module<'a> {
        Module {
            body: self.list(body),
        }
    }

    // ========================================================================
    // Names
    // ========================================================================

    pub fn ident(&self, name: &str) -> Identifier {
        Identifier {
            name: self.interner.intern(name),
            span: TextSpan::default(),
        }
    }

    pub fn dotted(&self, path: &str) -> DottedName<'a> {
        let parts = path.split('.').map(|part| self.ident(part)).collect();
        DottedName {
            parts: self.list(parts),
        }
    }

    pub fn alias(&self, path: &str, asname: Option<&str>) -> Alias<'a> {
        Alias {
            name: self.dotted(path),
            asname: asname.map(|name| self.ident(name)),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn name(&self, name: &str) -> Expr<'a> {
        self.expr(ExprKind::Name(self.interner.intern(name)))
    }

    pub fn str_lit(&self, value: &str) -> Expr<'a> {
        let arena: &'a CompilerArena = self.arena;
        self.expr(ExprKind::Str(arena.alloc_str(value)))
    }

    pub fn int(&self, value: i64) -> Expr<'a> {
        self.expr(ExprKind::Int(value))
    }

    pub fn tuple(&self, elts: Vec<Expr<'a>>) -> Expr<'a> {
        self.expr(ExprKind::Tuple(self.list(elts)))
    }

    pub fn list_expr(&self, elts: Vec<Expr<'a>>) -> Expr<'a> {
        self.expr(ExprKind::List(self.list(elts)))
    }

    pub fn attr(&self, value: Expr<'a>, attr: &str) -> Expr<'a> {
        self.expr(ExprKind::Attribute {
            value: self.alloc(value),
            attr: self.ident(attr),
        })
    }

    pub fn call(&self, func: Expr<'a>, args: Vec<Expr<'a>>) -> Expr<'a> {
        self.expr(ExprKind::Call {
            func: self.alloc(func),
            args: self.list(args),
        })
    }

    pub fn binop(&self, left: Expr<'a>, op: BinOp, right: Expr<'a>) -> Expr<'a> {
        self.expr(ExprKind::BinOp {
            left: self.alloc(left),
            op,
            right: self.alloc(right),
        })
    }

    pub fn yield_expr(&self, value: Option<Expr<'a>>) -> Expr<'a> {
        self.expr(ExprKind::Yield(value.map(|v| self.alloc(v))))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn assign(&self, targets: Vec<Expr<'a>>, value: Expr<'a>) -> Stmt<'a> {
        self.stmt(StmtKind::Assign {
            targets: self.list(targets),
            value: self.alloc(value),
        })
    }

    /// `name = value`
    pub fn assign_name(&self, name: &str, value: Expr<'a>) -> Stmt<'a> {
        self.assign(vec![self.name(name)], value)
    }

    pub fn aug_assign(&self, target: Expr<'a>, op: BinOp, value: Expr<'a>) -> Stmt<'a> {
        self.stmt(StmtKind::AugAssign {
            target: self.alloc(target),
            op,
            value: self.alloc(value),
        })
    }

    pub fn delete(&self, targets: Vec<Expr<'a>>) -> Stmt<'a> {
        self.stmt(StmtKind::Delete {
            targets: self.list(targets),
        })
    }

    pub fn global(&self, names: &[&str]) -> Stmt<'a> {
        let names = names.iter().map(|name| self.ident(name)).collect();
        self.stmt(StmtKind::Global {
            names: self.list(names),
        })
    }

    /// `import a.b as c, d`
    pub fn import(&self, names: &[(&str, Option<&str>)]) -> Stmt<'a> {
        let names = names
            .iter()
            .map(|(path, asname)| self.alias(path, *asname))
            .collect();
        self.stmt(StmtKind::Import {
            names: self.list(names),
        })
    }

    /// `from module import a as b, c`
    pub fn import_from(&self, module: &str, names: &[(&str, Option<&str>)]) -> Stmt<'a> {
        let names = names
            .iter()
            .map(|(name, asname)| self.alias(name, *asname))
            .collect();
        self.stmt(StmtKind::ImportFrom {
            module: self.dotted(module),
            names: self.list(names),
            level: 0,
        })
    }

    pub fn arguments(&self, args: &[&str], vararg: Option<&str>, kwarg: Option<&str>) -> Arguments<'a> {
        let args = args.iter().map(|name| self.ident(name)).collect();
        Arguments {
            args: self.list(args),
            vararg: vararg.map(|name| self.ident(name)),
            kwarg: kwarg.map(|name| self.ident(name)),
        }
    }

    pub fn function_def(&self, name: &str, args: Arguments<'a>, body: Vec<Stmt<'a>>) -> Stmt<'a> {
        let def = FunctionDef {
            name: self.ident(name),
            args,
            body: self.list(body),
            span: TextSpan::default(),
        };
        self.stmt(StmtKind::FunctionDef(self.alloc(def)))
    }

    pub fn class_def(&self, name: &str, bases: Vec<Expr<'a>>, body: Vec<Stmt<'a>>) -> Stmt<'a> {
        let def = ClassDef {
            name: self.ident(name),
            bases: self.list(bases),
            body: self.list(body),
            span: TextSpan::default(),
        };
        self.stmt(StmtKind::ClassDef(self.alloc(def)))
    }

    pub fn for_loop(
        &self,
        target: Expr<'a>,
        iter: Expr<'a>,
        body: Vec<Stmt<'a>>,
        orelse: Vec<Stmt<'a>>,
    ) -> Stmt<'a> {
        self.stmt(StmtKind::For {
            target: self.alloc(target),
            iter: self.alloc(iter),
            body: self.list(body),
            orelse: self.list(orelse),
        })
    }

    pub fn while_loop(&self, test: Expr<'a>, body: Vec<Stmt<'a>>, orelse: Vec<Stmt<'a>>) -> Stmt<'a> {
        self.stmt(StmtKind::While {
            test: self.alloc(test),
            body: self.list(body),
            orelse: self.list(orelse),
        })
    }

    pub fn if_stmt(&self, test: Expr<'a>, body: Vec<Stmt<'a>>, orelse: Vec<Stmt<'a>>) -> Stmt<'a> {
        self.stmt(StmtKind::If {
            test: self.alloc(test),
            body: self.list(body),
            orelse: self.list(orelse),
        })
    }

    pub fn with_stmt(&self, items: Vec<(Expr<'a>, Option<Expr<'a>>)>, body: Vec<Stmt<'a>>) -> Stmt<'a> {
        let items = items
            .into_iter()
            .map(|(context_expr, optional_vars)| WithItem {
                context_expr,
                optional_vars,
            })
            .collect();
        self.stmt(StmtKind::With {
            items: self.list(items),
            body: self.list(body),
        })
    }

    pub fn handler(&self, type_: Option<Expr<'a>>, name: Option<&str>, body: Vec<Stmt<'a>>) -> ExceptHandler<'a> {
        ExceptHandler {
            type_,
            name: name.map(|name| self.ident(name)),
            body: self.list(body),
            span: TextSpan::default(),
        }
    }

    pub fn try_stmt(
        &self,
        body: Vec<Stmt<'a>>,
        handlers: Vec<ExceptHandler<'a>>,
        orelse: Vec<Stmt<'a>>,
        finalbody: Vec<Stmt<'a>>,
    ) -> Stmt<'a> {
        self.stmt(StmtKind::Try {
            body: self.list(body),
            handlers: self.list(handlers),
            orelse: self.list(orelse),
            finalbody: self.list(finalbody),
        })
    }

    pub fn ret(&self, value: Option<Expr<'a>>) -> Stmt<'a> {
        self.stmt(StmtKind::Return {
            value: value.map(|v| self.alloc(v)),
        })
    }

    pub fn expr_stmt(&self, value: Expr<'a>) -> Stmt<'a> {
        self.stmt(StmtKind::Expr {
            value: self.alloc(value),
        })
    }

    pub fn break_stmt(&self) -> Stmt<'a> {
        self.stmt(StmtKind::Break)
    }

    pub fn continue_stmt(&self) -> Stmt<'a> {
        self.stmt(StmtKind::Continue)
    }

    pub fn pass(&self) -> Stmt<'a> {
        self.stmt(StmtKind::Pass)
    }
}
