//! Declaration nodes.
//!
//! Declarations are the only nodes rendered twice: once for the declaration
//! unit (signature) and once for the definition unit (body). Doc-comment
//! lines ride along on every declaration so the ownership-annotation scanner
//! can find explicit `@weak`/`@unique`/`@shared` tags ahead of a property or
//! parameter.

use tscpp_common::Span;
use tscpp_types::TypeExpr;

use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::Metadata;

/// A declaration node: a kind tag (immutable after construction), an optional
/// source span, and open metadata.
#[derive(Debug, Clone)]
pub struct Decl {
    kind: DeclKind,
    pub span: Option<Span>,
    pub meta: Metadata,
}

impl Decl {
    pub fn new(kind: DeclKind) -> Decl {
        Decl {
            kind,
            span: None,
            meta: Metadata::new(),
        }
    }

    pub fn kind(&self) -> &DeclKind {
        &self.kind
    }

    pub fn with_span(mut self, span: Span) -> Decl {
        self.span = Some(span);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Decl {
        self.meta.insert(key.into(), value);
        self
    }

    /// The declared name, if this kind has one.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            DeclKind::Var(v) => Some(&v.name),
            DeclKind::Function(f) => Some(&f.name),
            DeclKind::Class(c) => Some(&c.name),
            DeclKind::Interface(i) => Some(&i.name),
            DeclKind::Enum(e) => Some(&e.name),
            DeclKind::Namespace(n) => Some(&n.name),
            DeclKind::TypeAlias(t) => Some(&t.name),
            DeclKind::Unsupported { .. } => None,
        }
    }
}

/// The declaration kind taxonomy.
#[derive(Debug, Clone)]
pub enum DeclKind {
    Var(VarDecl),
    Function(FunctionDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
    Namespace(NamespaceDecl),
    TypeAlias(TypeAliasDecl),
    /// A declaration kind the transformer could not express.
    Unsupported { construct: String },
}

/// A variable declaration, at module scope or (via [`crate::StmtKind::VarDecl`])
/// local scope.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub is_const: bool,
    pub doc: Vec<String>,
}

impl VarDecl {
    pub fn new(name: impl Into<String>) -> VarDecl {
        VarDecl {
            name: name.into(),
            ty: None,
            init: None,
            is_const: false,
            doc: Vec::new(),
        }
    }

    pub fn constant(name: impl Into<String>, ty: Option<TypeExpr>, init: Expr) -> VarDecl {
        VarDecl {
            name: name.into(),
            ty,
            init: Some(init),
            is_const: true,
            doc: Vec::new(),
        }
    }

    pub fn with_type(mut self, ty: TypeExpr) -> VarDecl {
        self.ty = Some(ty);
        self
    }

    pub fn with_init(mut self, init: Expr) -> VarDecl {
        self.init = Some(init);
        self
    }
}

/// One function or method parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub default: Option<Expr>,
    pub rest: bool,
    pub doc: Vec<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Option<TypeExpr>) -> Param {
        Param {
            name: name.into(),
            ty,
            default: None,
            rest: false,
            doc: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: Expr) -> Param {
        self.default = Some(default);
        self
    }
}

/// A free function declaration. A `None` body marks an ambient (declared-only)
/// function with no definition-unit entry.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Option<Vec<Stmt>>,
    pub is_async: bool,
    pub doc: Vec<String>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> FunctionDecl {
        FunctionDecl {
            name: name.into(),
            type_params: Vec::new(),
            params: Vec::new(),
            ret: None,
            body: Some(Vec::new()),
            is_async: false,
            doc: Vec::new(),
        }
    }
}

/// Member access level. Emission partitions members into one contiguous block
/// per level, public first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
    Private,
}

/// A class declaration.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub is_abstract: bool,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub type_params: Vec<String>,
    pub members: Vec<ClassMember>,
    pub doc: Vec<String>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> ClassDecl {
        ClassDecl {
            name: name.into(),
            is_abstract: false,
            extends: None,
            implements: Vec::new(),
            type_params: Vec::new(),
            members: Vec::new(),
            doc: Vec::new(),
        }
    }

    pub fn with_extends(mut self, base: impl Into<String>) -> ClassDecl {
        self.extends = Some(base.into());
        self
    }

    pub fn with_member(mut self, member: ClassMember) -> ClassDecl {
        self.members.push(member);
        self
    }
}

/// A class member.
#[derive(Debug, Clone)]
pub enum ClassMember {
    Property(PropertyMember),
    Method(MethodMember),
    Constructor(ConstructorMember),
    Accessor(AccessorMember),
}

impl ClassMember {
    pub fn access(&self) -> Access {
        match self {
            ClassMember::Property(p) => p.access,
            ClassMember::Method(m) => m.access,
            ClassMember::Constructor(c) => c.access,
            ClassMember::Accessor(a) => a.access,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyMember {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub access: Access,
    pub is_static: bool,
    pub is_readonly: bool,
    pub doc: Vec<String>,
}

impl PropertyMember {
    pub fn new(name: impl Into<String>, ty: Option<TypeExpr>) -> PropertyMember {
        PropertyMember {
            name: name.into(),
            ty,
            init: None,
            access: Access::Public,
            is_static: false,
            is_readonly: false,
            doc: Vec::new(),
        }
    }

    pub fn with_access(mut self, access: Access) -> PropertyMember {
        self.access = access;
        self
    }

    pub fn with_doc(mut self, line: impl Into<String>) -> PropertyMember {
        self.doc.push(line.into());
        self
    }
}

/// A method. The abstract/virtual/override triple follows the source
/// declaration; an abstract method has no body and no definition-unit entry,
/// an override requires a same-named virtual member on the declared base.
#[derive(Debug, Clone)]
pub struct MethodMember {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Option<Vec<Stmt>>,
    pub access: Access,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_async: bool,
    pub doc: Vec<String>,
}

impl MethodMember {
    pub fn new(name: impl Into<String>) -> MethodMember {
        MethodMember {
            name: name.into(),
            params: Vec::new(),
            ret: None,
            body: Some(Vec::new()),
            access: Access::Public,
            is_static: false,
            is_abstract: false,
            is_virtual: false,
            is_override: false,
            is_async: false,
            doc: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorMember {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub access: Access,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Getter,
    Setter,
}

#[derive(Debug, Clone)]
pub struct AccessorMember {
    pub name: String,
    pub kind: AccessorKind,
    /// The setter's single parameter; absent for getters.
    pub param: Option<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub access: Access,
    pub is_static: bool,
    pub doc: Vec<String>,
}

/// A structural interface, lowered to an abstract base with pure-virtual
/// members.
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<String>,
    pub members: Vec<InterfaceMember>,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum InterfaceMember {
    Property {
        name: String,
        ty: Option<TypeExpr>,
        optional: bool,
    },
    Method {
        name: String,
        params: Vec<Param>,
        ret: Option<TypeExpr>,
    },
}

/// An enum declaration. Numeric enums lower to `enum class`; string-valued
/// enums lower to a namespace of string constants.
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub name: String,
    pub decls: Vec<Decl>,
    pub doc: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub doc: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decl_name_lookup() {
        let d = Decl::new(DeclKind::Class(ClassDecl::new("Animal")));
        assert_eq!(d.name(), Some("Animal"));
        let u = Decl::new(DeclKind::Unsupported {
            construct: "decorator".into(),
        });
        assert_eq!(u.name(), None);
    }

    #[test]
    fn member_access_partition_key() {
        let prop = ClassMember::Property(
            PropertyMember::new("name", None).with_access(Access::Private),
        );
        assert_eq!(prop.access(), Access::Private);
    }
}
