//! Statement nodes.

use tscpp_common::Span;

use crate::decl::VarDecl;
use crate::expr::Expr;
use crate::Metadata;

/// A statement node: a kind tag (immutable after construction), an optional
/// source span, and open metadata.
#[derive(Debug, Clone)]
pub struct Stmt {
    kind: StmtKind,
    pub span: Option<Span>,
    pub meta: Metadata,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Stmt {
        Stmt {
            kind,
            span: None,
            meta: Metadata::new(),
        }
    }

    pub fn kind(&self) -> &StmtKind {
        &self.kind
    }

    pub fn with_span(mut self, span: Span) -> Stmt {
        self.span = Some(span);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Stmt {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn expr(expr: Expr) -> Stmt {
        Stmt::new(StmtKind::Expr(expr))
    }

    pub fn ret(value: Option<Expr>) -> Stmt {
        Stmt::new(StmtKind::Return(value))
    }

    pub fn block(stmts: Vec<Stmt>) -> Stmt {
        Stmt::new(StmtKind::Block(stmts))
    }
}

/// The statement kind taxonomy.
#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    /// A local `let`/`const` declaration.
    VarDecl(VarDecl),
    Expr(Expr),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    Switch {
        disc: Expr,
        cases: Vec<SwitchCase>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        binding: String,
        object: Expr,
        body: Box<Stmt>,
    },
    ForOf {
        binding: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Try {
        block: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
    Throw(Expr),
    Empty,
    /// A construct the transformer could not express; rendered as an inert
    /// placeholder with a warning.
    Unsupported {
        construct: String,
    },
}

/// One `case`/`default` arm of a switch. `test` is absent for `default`.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// The catch clause of a try statement.
#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<String>,
    pub body: Vec<Stmt>,
}
