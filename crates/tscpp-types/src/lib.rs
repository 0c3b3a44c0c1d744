//! Type mapping and ownership resolution for the tscpp translation core.
//!
//! This crate owns the source-side type expression model ([`TypeExpr`]) with
//! a small textual parser, the resolved target-type representation
//! ([`ResolvedType`]), the type mapper that lowers source types to C++ type
//! spellings, the ownership resolver that decides the pointer category for
//! each binding, and the doc-comment scanner for explicit ownership tags.

pub mod annot;
pub mod expr;
pub mod mapper;
pub mod ownership;
pub mod parse;
pub mod resolved;

pub use annot::scan_ownership_annotation;
pub use expr::{FunctionParam, TupleElem, TypeExpr};
pub use mapper::{TypeMapper, TypeRule};
pub use ownership::{resolve_ownership, DeclContext, Ownership};
pub use resolved::{CallSignature, ResolvedType, TypeFlags};
