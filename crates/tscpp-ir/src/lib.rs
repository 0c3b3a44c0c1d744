//! The tscpp intermediate representation.
//!
//! The IR is a plain owned tree built once per compilation unit by the
//! transformer, consumed immutably by the generators, and discarded after the
//! two output units are produced. Each node is a kind enum wrapped in a
//! struct carrying an optional source span (for diagnostics and the position
//! map) and an open, ordered metadata map (the plugin extension point).
//!
//! The kind tag is private and set only at construction, so a node's kind can
//! never change after it is built; which fields exist for a given kind is
//! enforced by the variant payloads themselves.

pub mod decl;
pub mod expr;
pub mod stmt;

use std::collections::BTreeMap;

pub use decl::{
    Access, AccessorKind, AccessorMember, ClassDecl, ClassMember, ConstructorMember, Decl,
    DeclKind, EnumDecl, EnumMember, FunctionDecl, InterfaceDecl, InterfaceMember, MethodMember,
    NamespaceDecl, Param, PropertyMember, TypeAliasDecl, VarDecl,
};
pub use expr::{
    AssignOp, BinaryOp, Expr, ExprKind, ObjectProp, TemplatePart, UnaryOp, UpdateOp,
};
pub use stmt::{CatchClause, Stmt, StmtKind, SwitchCase};

/// Open metadata attached to every IR node.
///
/// Ordered so that nothing a plugin stores here can perturb output
/// determinism.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// One compilation unit: a module with its declarations and top-level
/// statements. Top-level statements have no C++ equivalent and are collected
/// into a synthesized entry point by the assembler.
#[derive(Debug, Clone)]
pub struct Module {
    /// Unit name; drives the include-guard and the `#include` in the
    /// definition unit.
    pub name: String,
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Module {
        Module {
            name: name.into(),
            decls: Vec::new(),
            stmts: Vec::new(),
        }
    }

    pub fn with_decl(mut self, decl: Decl) -> Module {
        self.decls.push(decl);
        self
    }

    pub fn with_stmt(mut self, stmt: Stmt) -> Module {
        self.stmts.push(stmt);
        self
    }
}

/// A whole program: one module per independently compiled unit.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub modules: Vec<Module>,
}
