//! Ownership category resolution.
//!
//! The source language has unrestricted aliasing and a garbage collector; the
//! target has neither. Rather than whole-program alias analysis, every
//! heap-allocated binding defaults to shared ownership, with opt-in `weak` /
//! `unique` annotations and a best-effort heuristic that weakens likely
//! back-references to break reference cycles. This never produces a dangling
//! reference; it may over-allocate relative to hand-written C++.

use std::fmt;

use serde::Serialize;

use tscpp_common::{DiagnosticSink, Span};

use crate::resolved::ResolvedType;

/// The chosen indirection/lifetime strategy for a binding.
///
/// `Auto` exists only between transformation passes; it is always resolved to
/// one of the concrete categories before any generator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ownership {
    Shared,
    Unique,
    Weak,
    Raw,
    Value,
    Auto,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ownership::Shared => write!(f, "shared"),
            Ownership::Unique => write!(f, "unique"),
            Ownership::Weak => write!(f, "weak"),
            Ownership::Raw => write!(f, "raw"),
            Ownership::Value => write!(f, "value"),
            Ownership::Auto => write!(f, "auto"),
        }
    }
}

impl Ownership {
    /// Render a target type under this category.
    ///
    /// `Value` and value-typed bindings never get an indirection wrapper;
    /// wrapping a value type is a modeling error rejected during resolution.
    pub fn wrap(&self, target: &str) -> String {
        match self {
            Ownership::Shared => format!("std::shared_ptr<{target}>"),
            Ownership::Unique => format!("std::unique_ptr<{target}>"),
            Ownership::Weak => format!("std::weak_ptr<{target}>"),
            Ownership::Raw => format!("{target}*"),
            Ownership::Value | Ownership::Auto => target.to_string(),
        }
    }

    /// Render the expression that allocates a new `target` under this
    /// category, given already-rendered constructor arguments.
    pub fn make(&self, target: &str, args: &str) -> String {
        match self {
            Ownership::Shared => format!("std::make_shared<{target}>({args})"),
            Ownership::Unique => format!("std::make_unique<{target}>({args})"),
            Ownership::Weak | Ownership::Raw => format!("new {target}({args})"),
            Ownership::Value | Ownership::Auto => format!("{target}({args})"),
        }
    }
}

/// Where a binding is declared. The resolver's back-reference heuristic only
/// applies to class properties.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclContext<'a> {
    /// A local `let`/`const` inside a function body.
    Local,
    /// A module-scope variable.
    ModuleVar,
    /// A function or method parameter.
    Param,
    /// A function return position.
    Return,
    /// A class property. `ancestors` lists the base-class chain of the
    /// declaring class, nearest first.
    Property {
        class_name: &'a str,
        property_name: &'a str,
        ancestors: &'a [String],
    },
}

/// Property-name fragments that suggest a reference back to an ancestor
/// object. Matching is case-insensitive substring. Best-effort only: this can
/// both over-trigger and under-trigger; a full escape analysis is future work.
const BACK_REFERENCE_PATTERNS: &[&str] = &[
    "parent", "owner", "outer", "back", "prev", "container", "host",
];

/// Decide the pointer category for a binding.
///
/// Policy, in order:
/// 1. value types are `Value` regardless of annotation; a `weak`/`unique`/
///    `shared` annotation on one is an ownership conflict, recorded as a
///    warning and ignored;
/// 2. an explicit annotation is honored verbatim;
/// 3. a hint carried on the resolved type (set by type-mapping rules or a
///    plugin rule) is honored;
/// 4. an unannotated class property that looks like a back-reference
///    defaults to `Weak`;
/// 5. everything else heap-allocated defaults to `Shared`.
///
/// Never returns `Auto`.
pub fn resolve_ownership(
    resolved: &ResolvedType,
    annotation: Option<Ownership>,
    context: &DeclContext<'_>,
    span: Option<Span>,
    sink: &mut DiagnosticSink,
) -> Ownership {
    if !resolved.flags.needs_heap_allocation {
        if let Some(requested) = annotation {
            if requested != Ownership::Value {
                sink.warning(
                    "W0005",
                    format!(
                        "`{requested}` annotation on value type `{}` ignored; \
                         value types never take an indirection wrapper",
                        resolved.source_name
                    ),
                    span,
                );
            }
        }
        return Ownership::Value;
    }

    if let Some(requested) = annotation {
        if requested == Ownership::Auto {
            // "infer" spelled explicitly; fall through to the defaults.
        } else {
            return requested;
        }
    }

    if let Some(hint) = resolved.ownership_hint {
        if hint != Ownership::Auto {
            return hint;
        }
    }

    if let DeclContext::Property {
        class_name,
        property_name,
        ancestors,
    } = context
    {
        if is_back_reference(property_name, &resolved.source_name, class_name, ancestors) {
            return Ownership::Weak;
        }
    }

    Ownership::Shared
}

/// Heuristic back-reference test: the property name contains a known
/// back-pointer fragment, or the property's type names the declaring class or
/// one of its ancestors.
fn is_back_reference(
    property_name: &str,
    type_source_name: &str,
    class_name: &str,
    ancestors: &[String],
) -> bool {
    let lowered = property_name.to_ascii_lowercase();
    if BACK_REFERENCE_PATTERNS.iter().any(|p| lowered.contains(p)) {
        return true;
    }
    type_source_name == class_name || ancestors.iter().any(|a| a == type_source_name)
}
