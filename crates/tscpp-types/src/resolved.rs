//! Resolved target types.
//!
//! A [`ResolvedType`] is the output of the type mapper: the original source
//! spelling, the target C++ type expression, and the flags the ownership
//! resolver and generators need. Structural equality on the whole record is
//! what union members are deduplicated by.

use serde::Serialize;

use crate::ownership::Ownership;

/// Classification flags for a resolved type.
///
/// `is_primitive` covers value-semantics types in the target: true primitives
/// (`js::number`, `bool`) and the runtime value containers (`js::string`,
/// `js::any`, `std::optional`, `std::tuple`, ...). The invariant
/// `needs_heap_allocation == !is_primitive` is enforced by the constructors
/// on [`ResolvedType`]; the two fields exist separately because they answer
/// different questions (representation vs. allocation) even though one
/// currently determines the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeFlags {
    pub is_primitive: bool,
    pub is_object: bool,
    pub is_array: bool,
    pub is_function: bool,
    pub is_generic: bool,
    pub is_nullable: bool,
    pub is_union: bool,
    pub is_intersection: bool,
    pub is_literal: bool,
    pub needs_heap_allocation: bool,
}

impl TypeFlags {
    /// Flags for a value-semantics type.
    pub fn value() -> TypeFlags {
        TypeFlags {
            is_primitive: true,
            needs_heap_allocation: false,
            ..TypeFlags::default()
        }
    }

    /// Flags for a heap-allocated type.
    pub fn heap() -> TypeFlags {
        TypeFlags {
            is_primitive: false,
            needs_heap_allocation: true,
            ..TypeFlags::default()
        }
    }
}

/// One call signature of a function-typed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSignature {
    pub params: Vec<ResolvedType>,
    pub ret: Box<ResolvedType>,
}

/// The mapper's output for one source type expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedType {
    /// The source spelling this type was mapped from, in source syntax.
    pub source_name: String,
    /// The target C++ type expression, without any ownership wrapper.
    pub target: String,
    pub flags: TypeFlags,
    /// A category suggested by a mapping rule (or a plugin rule); the
    /// ownership resolver honors it after explicit annotations.
    pub ownership_hint: Option<Ownership>,
    /// Mapped type arguments, for generic targets.
    pub type_args: Vec<ResolvedType>,
    /// Named members, populated for object-shaped types when known.
    pub members: Vec<(String, ResolvedType)>,
    /// Call signatures, populated for function types.
    pub call_signatures: Vec<CallSignature>,
}

impl ResolvedType {
    /// A value-semantics type (primitive or runtime value container).
    pub fn primitive(source_name: impl Into<String>, target: impl Into<String>) -> ResolvedType {
        ResolvedType {
            source_name: source_name.into(),
            target: target.into(),
            flags: TypeFlags::value(),
            ownership_hint: None,
            type_args: Vec::new(),
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }

    /// A heap-allocated object/class type.
    pub fn object(source_name: impl Into<String>, target: impl Into<String>) -> ResolvedType {
        ResolvedType {
            source_name: source_name.into(),
            target: target.into(),
            flags: TypeFlags {
                is_object: true,
                ..TypeFlags::heap()
            },
            ownership_hint: None,
            type_args: Vec::new(),
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }

    /// The dynamic any type, the mapper's degradation target.
    pub fn any() -> ResolvedType {
        ResolvedType::primitive("any", "js::any")
    }

    pub fn with_flags(mut self, flags: TypeFlags) -> ResolvedType {
        debug_assert_eq!(
            flags.needs_heap_allocation, !flags.is_primitive,
            "needs_heap_allocation must be the negation of is_primitive"
        );
        self.flags = flags;
        self
    }

    pub fn with_args(mut self, type_args: Vec<ResolvedType>) -> ResolvedType {
        self.type_args = type_args;
        self
    }

    pub fn with_hint(mut self, hint: Ownership) -> ResolvedType {
        self.ownership_hint = Some(hint);
        self
    }

    /// The target spelling of this type in a binding position under the
    /// given ownership category.
    pub fn binding_target(&self, ownership: Ownership) -> String {
        ownership.wrap(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_flags_invariant() {
        let t = ResolvedType::primitive("number", "js::number");
        assert!(t.flags.is_primitive);
        assert!(!t.flags.needs_heap_allocation);
    }

    #[test]
    fn object_flags_invariant() {
        let t = ResolvedType::object("Animal", "Animal");
        assert!(!t.flags.is_primitive);
        assert!(t.flags.needs_heap_allocation);
        assert!(t.flags.is_object);
    }

    #[test]
    fn binding_target_wraps_heap_types() {
        let t = ResolvedType::object("Dog", "Dog");
        assert_eq!(t.binding_target(Ownership::Shared), "std::shared_ptr<Dog>");
        let n = ResolvedType::primitive("number", "js::number");
        assert_eq!(n.binding_target(Ownership::Value), "js::number");
    }

    #[test]
    fn structural_equality() {
        let a = ResolvedType::primitive("string", "js::string");
        let b = ResolvedType::primitive("string", "js::string");
        assert_eq!(a, b);
    }
}
