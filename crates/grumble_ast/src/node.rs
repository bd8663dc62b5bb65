//! AST node definitions.
//!
//! Children are referenced through arena-allocated references and slices,
//! so a whole tree borrows from one arena with lifetime `'a`.

use grumble_core::intern::{InternedString, StringInterner};
use grumble_core::text::TextSpan;

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

// ============================================================================
// Identifiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier {
    pub name: InternedString,
    pub span: TextSpan,
}

/// A dotted module path such as `os.path`.
#[derive(Debug, Clone, Copy)]
pub struct DottedName<'a> {
    pub parts: NodeList<'a, Identifier>,
}

impl<'a> DottedName<'a> {
    /// The first component, which `import a.b.c` binds in the importing scope.
    pub fn first(&self) -> Option<Identifier> {
        self.parts.first().copied()
    }

    pub fn last(&self) -> Option<Identifier> {
        self.parts.last().copied()
    }

    /// Join the components with `sep`.
    pub fn join(&self, interner: &StringInterner, sep: &str) -> String {
        self.parts
            .iter()
            .map(|part| interner.resolve(part.name))
            .collect::<Vec<_>>()
            .join(sep)
    }
}

/// One `name [as asname]` clause of an import statement.
#[derive(Debug, Clone, Copy)]
pub struct Alias<'a> {
    pub name: DottedName<'a>,
    pub asname: Option<Identifier>,
}

// ============================================================================
// Module
// ============================================================================

#[derive(Debug)]
pub struct Module<'a> {
    pub body: NodeList<'a, Stmt<'a>>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug)]
pub struct Stmt<'a> {
    pub kind: StmtKind<'a>,
    pub span: TextSpan,
}

#[derive(Debug)]
pub enum StmtKind<'a> {
    /// `a = b = value`; each target may be a name, tuple, list or attribute.
    Assign {
        targets: NodeList<'a, Expr<'a>>,
        value: &'a Expr<'a>,
    },
    AugAssign {
        target: &'a Expr<'a>,
        op: BinOp,
        value: &'a Expr<'a>,
    },
    Delete {
        targets: NodeList<'a, Expr<'a>>,
    },
    Global {
        names: NodeList<'a, Identifier>,
    },
    Import {
        names: NodeList<'a, Alias<'a>>,
    },
    ImportFrom {
        module: DottedName<'a>,
        names: NodeList<'a, Alias<'a>>,
        level: u32,
    },
    FunctionDef(&'a FunctionDef<'a>),
    ClassDef(&'a ClassDef<'a>),
    For {
        target: &'a Expr<'a>,
        iter: &'a Expr<'a>,
        body: NodeList<'a, Stmt<'a>>,
        orelse: NodeList<'a, Stmt<'a>>,
    },
    While {
        test: &'a Expr<'a>,
        body: NodeList<'a, Stmt<'a>>,
        orelse: NodeList<'a, Stmt<'a>>,
    },
    If {
        test: &'a Expr<'a>,
        body: NodeList<'a, Stmt<'a>>,
        orelse: NodeList<'a, Stmt<'a>>,
    },
    With {
        items: NodeList<'a, WithItem<'a>>,
        body: NodeList<'a, Stmt<'a>>,
    },
    Try {
        body: NodeList<'a, Stmt<'a>>,
        handlers: NodeList<'a, ExceptHandler<'a>>,
        orelse: NodeList<'a, Stmt<'a>>,
        finalbody: NodeList<'a, Stmt<'a>>,
    },
    Return {
        value: Option<&'a Expr<'a>>,
    },
    Expr {
        value: &'a Expr<'a>,
    },
    Break,
    Continue,
    Pass,
}

#[derive(Debug)]
pub struct FunctionDef<'a> {
    pub name: Identifier,
    pub args: Arguments<'a>,
    pub body: NodeList<'a, Stmt<'a>>,
    pub span: TextSpan,
}

/// Parameters in declaration order: positional, then `*args`, then `**kwargs`.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    pub args: NodeList<'a, Identifier>,
    pub vararg: Option<Identifier>,
    pub kwarg: Option<Identifier>,
}

impl<'a> Arguments<'a> {
    /// All parameter names in the order they are bound.
    pub fn iter(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.args
            .iter()
            .copied()
            .chain(self.vararg)
            .chain(self.kwarg)
    }
}

#[derive(Debug)]
pub struct ClassDef<'a> {
    pub name: Identifier,
    pub bases: NodeList<'a, Expr<'a>>,
    pub body: NodeList<'a, Stmt<'a>>,
    pub span: TextSpan,
}

#[derive(Debug)]
pub struct WithItem<'a> {
    pub context_expr: Expr<'a>,
    pub optional_vars: Option<Expr<'a>>,
}

#[derive(Debug)]
pub struct ExceptHandler<'a> {
    pub type_: Option<Expr<'a>>,
    pub name: Option<Identifier>,
    pub body: NodeList<'a, Stmt<'a>>,
    pub span: TextSpan,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug)]
pub struct Expr<'a> {
    pub kind: ExprKind<'a>,
    pub span: TextSpan,
}

#[derive(Debug)]
pub enum ExprKind<'a> {
    Name(InternedString),
    Str(&'a str),
    Int(i64),
    Tuple(NodeList<'a, Expr<'a>>),
    List(NodeList<'a, Expr<'a>>),
    Attribute {
        value: &'a Expr<'a>,
        attr: Identifier,
    },
    Call {
        func: &'a Expr<'a>,
        args: NodeList<'a, Expr<'a>>,
    },
    BinOp {
        left: &'a Expr<'a>,
        op: BinOp,
        right: &'a Expr<'a>,
    },
    Yield(Option<&'a Expr<'a>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
}
