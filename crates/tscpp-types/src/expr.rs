//! Source-side type expressions.
//!
//! [`TypeExpr`] is the tscpp view of a TypeScript type annotation as handed
//! over by the front end: named types with optional arguments, array
//! suffixes, unions, intersections, function types, tuples, and literal
//! types. The mapper consumes this tree; it never consults source text.

use std::fmt;

/// A source-language type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A named type, possibly with type arguments: `string`, `Promise<T>`,
    /// `Record<string, number>`, or a user-defined class/interface name.
    Name { name: String, args: Vec<TypeExpr> },
    /// Array-suffix syntax: `T[]`.
    Array(Box<TypeExpr>),
    /// A union: `A | B | C`. Members in declaration order.
    Union(Vec<TypeExpr>),
    /// An intersection: `A & B`.
    Intersection(Vec<TypeExpr>),
    /// A function type: `(a: T, b) => R`.
    Function {
        params: Vec<FunctionParam>,
        ret: Box<TypeExpr>,
    },
    /// A tuple: `[A, B?, ...C[]]`.
    Tuple(Vec<TupleElem>),
    /// A string literal type: `"ok"`.
    StringLiteral(String),
    /// A number literal type, stored as written: `42`, `1.5`.
    NumberLiteral(String),
    /// A boolean literal type: `true` / `false`.
    BooleanLiteral(bool),
}

/// One parameter of a function type. An absent type means "untyped" and maps
/// to the dynamic any type.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParam {
    pub name: Option<String>,
    pub ty: Option<TypeExpr>,
}

/// One element of a tuple type.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleElem {
    pub ty: TypeExpr,
    /// `[string, number?]` — optional elements become optional-wrapped.
    pub optional: bool,
    /// `[string, ...number[]]` — rest elements become the variadic tail.
    pub rest: bool,
}

impl TypeExpr {
    /// A named type with no arguments.
    pub fn name(name: impl Into<String>) -> TypeExpr {
        TypeExpr::Name {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A named type with arguments.
    pub fn generic(name: impl Into<String>, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::Name {
            name: name.into(),
            args,
        }
    }

    /// An array of `elem`.
    pub fn array(elem: TypeExpr) -> TypeExpr {
        TypeExpr::Array(Box::new(elem))
    }

    /// A union over `members`.
    pub fn union(members: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::Union(members)
    }

    /// A function type.
    pub fn function(params: Vec<FunctionParam>, ret: TypeExpr) -> TypeExpr {
        TypeExpr::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// Whether this expression is the `null` or `undefined` type.
    pub fn is_nullish(&self) -> bool {
        matches!(
            self,
            TypeExpr::Name { name, args } if args.is_empty() && (name == "null" || name == "undefined")
        )
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeExpr::Array(elem) => {
                // Unions and functions need parentheses under the suffix.
                match **elem {
                    TypeExpr::Union(_) | TypeExpr::Intersection(_) | TypeExpr::Function { .. } => {
                        write!(f, "({elem})[]")
                    }
                    _ => write!(f, "{elem}[]"),
                }
            }
            TypeExpr::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            TypeExpr::Intersection(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            TypeExpr::Function { params, ret } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match (&p.name, &p.ty) {
                        (Some(n), Some(t)) => write!(f, "{n}: {t}")?,
                        (Some(n), None) => write!(f, "{n}")?,
                        (None, Some(t)) => write!(f, "{t}")?,
                        (None, None) => write!(f, "_")?,
                    }
                }
                write!(f, ") => {ret}")
            }
            TypeExpr::Tuple(elems) => {
                write!(f, "[")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if e.rest {
                        write!(f, "...{}", e.ty)?;
                    } else if e.optional {
                        write!(f, "{}?", e.ty)?;
                    } else {
                        write!(f, "{}", e.ty)?;
                    }
                }
                write!(f, "]")
            }
            TypeExpr::StringLiteral(s) => write!(f, "{s:?}"),
            TypeExpr::NumberLiteral(n) => write!(f, "{n}"),
            TypeExpr::BooleanLiteral(b) => write!(f, "{b}"),
        }
    }
}
