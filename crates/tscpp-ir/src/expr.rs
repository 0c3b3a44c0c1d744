//! Expression nodes.

use tscpp_common::Span;
use tscpp_types::TypeExpr;

use crate::decl::Param;
use crate::stmt::Stmt;
use crate::Metadata;

/// An expression node: a kind tag (immutable after construction), an optional
/// source span, and open metadata.
#[derive(Debug, Clone)]
pub struct Expr {
    kind: ExprKind,
    pub span: Option<Span>,
    pub meta: Metadata,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Expr {
        Expr {
            kind,
            span: None,
            meta: Metadata::new(),
        }
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn with_span(mut self, span: Span) -> Expr {
        self.span = Some(span);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Expr {
        self.meta.insert(key.into(), value);
        self
    }

    // ── Constructors used throughout the generators and tests ────────────

    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::new(ExprKind::Ident(name.into()))
    }

    pub fn number(value: f64) -> Expr {
        Expr::new(ExprKind::NumberLit(value))
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::new(ExprKind::StringLit(value.into()))
    }

    pub fn boolean(value: bool) -> Expr {
        Expr::new(ExprKind::BoolLit(value))
    }

    pub fn this() -> Expr {
        Expr::new(ExprKind::This)
    }

    pub fn member(object: Expr, property: impl Into<String>) -> Expr {
        Expr::new(ExprKind::Member {
            object: Box::new(object),
            property: property.into(),
        })
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::new(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    pub fn new_object(class_name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::new(ExprKind::New {
            callee: class_name.into(),
            args,
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Expr {
        Expr::new(ExprKind::Assign {
            op: AssignOp::Assign,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn object(props: Vec<(&str, Expr)>) -> Expr {
        Expr::new(ExprKind::ObjectLit(
            props
                .into_iter()
                .map(|(k, v)| ObjectProp::Entry {
                    key: k.to_string(),
                    value: v,
                })
                .collect(),
        ))
    }

    pub fn array(elems: Vec<Expr>) -> Expr {
        Expr::new(ExprKind::ArrayLit(elems))
    }
}

/// The expression kind taxonomy.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Ident(String),
    NumberLit(f64),
    StringLit(String),
    BoolLit(bool),
    NullLit,
    UndefinedLit,
    This,
    /// `super`, only meaningful as a call target inside a constructor or as
    /// a member-access base inside a method.
    Super,
    ArrayLit(Vec<Expr>),
    ObjectLit(Vec<ObjectProp>),
    /// A function or arrow literal.
    FunctionLit {
        params: Vec<Param>,
        ret: Option<TypeExpr>,
        body: Vec<Stmt>,
        is_arrow: bool,
        is_async: bool,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        callee: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Template(Vec<TemplatePart>),
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
    Spread(Box<Expr>),
    /// A construct the transformer (or a plugin) could not express; the
    /// generators render it as a commented placeholder with a warning.
    Unsupported {
        construct: String,
    },
}

/// One property of an object literal.
#[derive(Debug, Clone)]
pub enum ObjectProp {
    Entry { key: String, value: Expr },
    Spread(Expr),
}

/// One piece of a template string.
#[derive(Debug, Clone)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Delete,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// `**`, rewritten to a power-function call.
    Pow,
    /// Loose equality, passed through unchanged.
    Eq,
    Neq,
    /// Strict equality, rewritten to ordinary value equality.
    StrictEq,
    StrictNeq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    /// `??`, rewritten to a has-value-else-fallback conditional.
    NullishCoalesce,
    In,
    InstanceOf,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_fixed_at_construction() {
        let e = Expr::number(42.0).with_span(Span::new(0, 2));
        assert!(matches!(e.kind(), ExprKind::NumberLit(n) if *n == 42.0));
        assert_eq!(e.span, Some(Span::new(0, 2)));
    }

    #[test]
    fn metadata_is_ordered() {
        let e = Expr::ident("x")
            .with_meta("zeta", serde_json::json!(1))
            .with_meta("alpha", serde_json::json!(2));
        let keys: Vec<&str> = e.meta.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }
}
