//! Source type → target type mapping.
//!
//! [`TypeMapper::map`] is total: unresolvable or unrecognized inputs degrade
//! to the dynamic `js::any` type with a recorded warning, so generation can
//! always proceed. Rules apply in priority order, first match wins:
//!
//! 1. primitive/built-in table,
//! 2. array syntax (`T[]`, `Array<T>`),
//! 3. known generic containers (`Promise`, `Record`, `Map`, `Set`),
//! 4. unions (optional normalization, string|number wrapper, tagged variant),
//! 5. intersections (first member, recorded approximation),
//! 6. function types,
//! 7. tuples,
//! 8. utility types (`Partial`, `Readonly`, ...),
//! 9. fallback: a user-defined type name, forward-referenced if undeclared.
//!
//! Plugin-supplied [`TypeRule`]s run before all built-in rules.

use rustc_hash::FxHashSet;

use tscpp_common::DiagnosticSink;

use crate::expr::{TupleElem, TypeExpr};
use crate::ownership::Ownership;
use crate::resolved::{CallSignature, ResolvedType, TypeFlags};

/// A plugin-supplied mapping rule, tried before the built-in table.
/// Returning `None` passes the type on to the next rule.
pub trait TypeRule {
    fn try_map(
        &self,
        expr: &TypeExpr,
        mapper: &TypeMapper,
        sink: &mut DiagnosticSink,
    ) -> Option<ResolvedType>;
}

/// The type mapper. Holds the set of user-declared type names (classes,
/// interfaces, enums, aliases) and any plugin rules. Mapping itself is
/// side-effect-free apart from the explicitly threaded diagnostics sink.
#[derive(Default)]
pub struct TypeMapper {
    known: FxHashSet<String>,
    rules: Vec<Box<dyn TypeRule>>,
}

impl TypeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user-declared type name; rule 9 consults this to decide
    /// whether a name is forward-referenced.
    pub fn declare(&mut self, name: impl Into<String>) {
        self.known.insert(name.into());
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Install a plugin rule, tried before the built-in table.
    pub fn add_rule(&mut self, rule: Box<dyn TypeRule>) {
        self.rules.push(rule);
    }

    /// Map a textual type expression; a parse failure degrades to `js::any`
    /// with a warning.
    pub fn map_text(&self, text: &str, sink: &mut DiagnosticSink) -> ResolvedType {
        match TypeExpr::parse(text) {
            Ok(expr) => self.map(&expr, sink),
            Err(err) => {
                sink.warning(
                    "W0001",
                    format!("cannot resolve type `{text}` ({err}); using any"),
                    None,
                );
                ResolvedType {
                    source_name: text.to_string(),
                    ..ResolvedType::any()
                }
            }
        }
    }

    /// Map a type expression to its target representation.
    pub fn map(&self, expr: &TypeExpr, sink: &mut DiagnosticSink) -> ResolvedType {
        for rule in &self.rules {
            if let Some(mapped) = rule.try_map(expr, self, sink) {
                return mapped;
            }
        }

        match expr {
            TypeExpr::Name { name, args } if args.is_empty() => {
                if let Some(mapped) = builtin(name) {
                    return mapped;
                }
                self.map_user_type(name, &[], sink)
            }
            TypeExpr::Array(elem) => self.map_array(expr, elem, sink),
            TypeExpr::Name { name, args } if name == "Array" && args.len() == 1 => {
                self.map_array(expr, &args[0], sink)
            }
            TypeExpr::Name { name, args } => match (name.as_str(), args.len()) {
                ("Promise", 1) => self.map_promise(expr, &args[0], sink),
                ("Record", 2) | ("Map", 2) => self.map_map(expr, &args[0], &args[1], sink),
                ("Set", 1) => self.map_set(expr, &args[0], sink),
                ("Partial", 1) | ("Required", 1) | ("NonNullable", 1) => {
                    let inner = self.map(&args[0], sink);
                    ResolvedType {
                        source_name: expr.to_string(),
                        ..inner
                    }
                }
                ("Readonly", 1) => {
                    let inner = self.map(&args[0], sink);
                    ResolvedType {
                        source_name: expr.to_string(),
                        target: format!("const {}", inner.target),
                        ..inner
                    }
                }
                ("Pick", _) | ("Omit", _) | ("Exclude", _) | ("Extract", _)
                | ("ReturnType", _) | ("Parameters", _) => {
                    sink.warning(
                        "W0002",
                        format!("unsupported utility type `{expr}`; using any"),
                        None,
                    );
                    ResolvedType {
                        source_name: expr.to_string(),
                        ..ResolvedType::any()
                    }
                }
                _ => self.map_user_type(name, args, sink),
            },
            TypeExpr::Union(members) => self.map_union(expr, members, sink),
            TypeExpr::Intersection(members) => self.map_intersection(expr, members, sink),
            TypeExpr::Function { params, ret } => self.map_function(expr, params, ret, sink),
            TypeExpr::Tuple(elems) => self.map_tuple(expr, elems, sink),
            TypeExpr::StringLiteral(_) => literal(expr, "js::string"),
            TypeExpr::NumberLiteral(_) => literal(expr, "js::number"),
            TypeExpr::BooleanLiteral(_) => literal(expr, "bool"),
        }
    }

    /// The spelling of a type when embedded inside another target type
    /// (array element, map value, variant member, parameter): heap types get
    /// their default shared wrapper, value types appear bare.
    pub fn embedded(&self, resolved: &ResolvedType) -> String {
        if resolved.flags.needs_heap_allocation {
            Ownership::Shared.wrap(&resolved.target)
        } else {
            resolved.target.clone()
        }
    }

    fn map_array(
        &self,
        whole: &TypeExpr,
        elem: &TypeExpr,
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        let inner = self.map(elem, sink);
        let target = format!("js::array<{}>", self.embedded(&inner));
        ResolvedType {
            source_name: whole.to_string(),
            target,
            flags: TypeFlags {
                is_array: true,
                ..TypeFlags::heap()
            },
            ownership_hint: None,
            type_args: vec![inner],
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }

    fn map_promise(
        &self,
        whole: &TypeExpr,
        value: &TypeExpr,
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        let inner = self.map(value, sink);
        let target = format!("js::Promise<{}>", self.embedded(&inner));
        ResolvedType {
            source_name: whole.to_string(),
            target,
            flags: TypeFlags {
                is_object: true,
                is_generic: true,
                ..TypeFlags::heap()
            },
            ownership_hint: Some(Ownership::Shared),
            type_args: vec![inner],
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }

    fn map_map(
        &self,
        whole: &TypeExpr,
        key: &TypeExpr,
        value: &TypeExpr,
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        let key_mapped = self.map(key, sink);
        let value_mapped = self.map(value, sink);
        let target = format!(
            "std::map<{}, {}>",
            key_mapped.target,
            self.embedded(&value_mapped)
        );
        ResolvedType {
            source_name: whole.to_string(),
            target,
            flags: TypeFlags {
                is_object: true,
                is_generic: true,
                ..TypeFlags::value()
            },
            ownership_hint: None,
            type_args: vec![key_mapped, value_mapped],
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }

    fn map_set(
        &self,
        whole: &TypeExpr,
        elem: &TypeExpr,
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        let inner = self.map(elem, sink);
        let target = format!("std::set<{}>", self.embedded(&inner));
        ResolvedType {
            source_name: whole.to_string(),
            target,
            flags: TypeFlags {
                is_generic: true,
                ..TypeFlags::value()
            },
            ownership_hint: None,
            type_args: vec![inner],
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }

    fn map_union(
        &self,
        whole: &TypeExpr,
        members: &[TypeExpr],
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        let nullable = members.iter().any(|m| m.is_nullish());
        let mut mapped: Vec<ResolvedType> = Vec::new();
        for member in members.iter().filter(|m| !m.is_nullish()) {
            let m = self.map(member, sink);
            // Duplicates removed by structural equality, declaration order kept.
            if !mapped.contains(&m) {
                mapped.push(m);
            }
        }

        let source_name = whole.to_string();

        if mapped.is_empty() {
            // `null | undefined` on its own: any, known-nullable.
            return ResolvedType {
                source_name,
                target: "js::any".to_string(),
                flags: TypeFlags {
                    is_nullable: true,
                    ..TypeFlags::value()
                },
                ownership_hint: None,
                type_args: Vec::new(),
                members: Vec::new(),
                call_signatures: Vec::new(),
            };
        }

        if mapped.len() == 1 && nullable {
            let inner = mapped.remove(0);
            let target = format!("std::optional<{}>", self.embedded(&inner));
            return ResolvedType {
                source_name,
                target,
                flags: TypeFlags {
                    is_nullable: true,
                    ..TypeFlags::value()
                },
                ownership_hint: None,
                type_args: vec![inner],
                members: Vec::new(),
                call_signatures: Vec::new(),
            };
        }

        if mapped.len() == 1 {
            // A single-member union after deduplication is just the member.
            return ResolvedType {
                source_name,
                ..mapped.remove(0)
            };
        }

        let string_like = mapped.iter().filter(|m| m.target == "js::string").count();
        let number_like = mapped.iter().filter(|m| m.target == "js::number").count();
        if mapped.len() == 2 && string_like == 1 && number_like == 1 {
            let core = "js::typed::StringOrNumber".to_string();
            let target = if nullable {
                format!("std::optional<{core}>")
            } else {
                core
            };
            return ResolvedType {
                source_name,
                target,
                flags: TypeFlags {
                    is_union: true,
                    is_nullable: nullable,
                    ..TypeFlags::value()
                },
                ownership_hint: None,
                type_args: mapped,
                members: Vec::new(),
                call_signatures: Vec::new(),
            };
        }

        let alternatives: Vec<String> = mapped.iter().map(|m| self.embedded(m)).collect();
        let core = format!("std::variant<{}>", alternatives.join(", "));
        let target = if nullable {
            format!("std::optional<{core}>")
        } else {
            core
        };
        ResolvedType {
            source_name,
            target,
            flags: TypeFlags {
                is_union: true,
                is_nullable: nullable,
                ..TypeFlags::value()
            },
            ownership_hint: None,
            type_args: mapped,
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }

    fn map_intersection(
        &self,
        whole: &TypeExpr,
        members: &[TypeExpr],
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        let Some(first) = members.first() else {
            return ResolvedType {
                source_name: whole.to_string(),
                ..ResolvedType::any()
            };
        };
        if members.len() > 1 {
            sink.info(
                "I0001",
                format!(
                    "intersection `{whole}` approximated by its first member `{first}`; \
                     no multiple-inheritance synthesis"
                ),
                None,
            );
        }
        let inner = self.map(first, sink);
        let mut flags = inner.flags;
        flags.is_intersection = true;
        ResolvedType {
            source_name: whole.to_string(),
            flags,
            ..inner
        }
    }

    fn map_function(
        &self,
        whole: &TypeExpr,
        params: &[crate::expr::FunctionParam],
        ret: &TypeExpr,
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        let mapped_params: Vec<ResolvedType> = params
            .iter()
            .map(|p| match &p.ty {
                Some(t) => self.map(t, sink),
                // Untyped parameters map to dynamic any.
                None => ResolvedType::any(),
            })
            .collect();
        let mapped_ret = self.map(ret, sink);
        let param_targets: Vec<String> =
            mapped_params.iter().map(|p| self.embedded(p)).collect();
        let target = format!(
            "std::function<{}({})>",
            self.embedded(&mapped_ret),
            param_targets.join(", ")
        );
        ResolvedType {
            source_name: whole.to_string(),
            target,
            flags: TypeFlags {
                is_function: true,
                ..TypeFlags::value()
            },
            ownership_hint: None,
            type_args: Vec::new(),
            members: Vec::new(),
            call_signatures: vec![CallSignature {
                params: mapped_params,
                ret: Box::new(mapped_ret),
            }],
        }
    }

    fn map_tuple(
        &self,
        whole: &TypeExpr,
        elems: &[TupleElem],
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        let mut targets = Vec::new();
        let mut args = Vec::new();
        for elem in elems {
            let mapped = self.map(&elem.ty, sink);
            let spelled = if elem.rest {
                // The variadic tail collects the remaining elements; a rest
                // annotation is already an array type.
                if mapped.flags.is_array {
                    mapped.target.clone()
                } else {
                    format!("js::array<{}>", self.embedded(&mapped))
                }
            } else if elem.optional {
                format!("std::optional<{}>", self.embedded(&mapped))
            } else {
                self.embedded(&mapped)
            };
            targets.push(spelled);
            args.push(mapped);
        }
        ResolvedType {
            source_name: whole.to_string(),
            target: format!("std::tuple<{}>", targets.join(", ")),
            flags: TypeFlags {
                is_generic: true,
                ..TypeFlags::value()
            },
            ownership_hint: None,
            type_args: args,
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }

    fn map_user_type(
        &self,
        name: &str,
        args: &[TypeExpr],
        sink: &mut DiagnosticSink,
    ) -> ResolvedType {
        if !self.known.contains(name) {
            sink.info(
                "I0002",
                format!("`{name}` is not declared in this unit; treating it as a forward-referenced class"),
                None,
            );
        }
        let mapped_args: Vec<ResolvedType> = args.iter().map(|a| self.map(a, sink)).collect();
        let target = if mapped_args.is_empty() {
            name.to_string()
        } else {
            let arg_targets: Vec<String> =
                mapped_args.iter().map(|a| self.embedded(a)).collect();
            format!("{}<{}>", name, arg_targets.join(", "))
        };
        let source_name = TypeExpr::Name {
            name: name.to_string(),
            args: args.to_vec(),
        }
        .to_string();
        ResolvedType {
            source_name,
            target,
            flags: TypeFlags {
                is_object: true,
                is_generic: !mapped_args.is_empty(),
                ..TypeFlags::heap()
            },
            ownership_hint: None,
            type_args: mapped_args,
            members: Vec::new(),
            call_signatures: Vec::new(),
        }
    }
}

/// Rule 1: the primitive/built-in table.
fn builtin(name: &str) -> Option<ResolvedType> {
    let mapped = match name {
        "string" => ResolvedType::primitive("string", "js::string"),
        "number" => ResolvedType::primitive("number", "js::number"),
        "boolean" => ResolvedType::primitive("boolean", "bool"),
        "void" | "never" => ResolvedType::primitive(name, "void"),
        "null" => nullish("null", "js::null_t"),
        "undefined" => nullish("undefined", "js::undefined_t"),
        "any" | "unknown" | "symbol" => ResolvedType {
            source_name: name.to_string(),
            ..ResolvedType::any()
        },
        "bigint" => ResolvedType::primitive("bigint", "js::bigint"),
        "object" | "Object" => ResolvedType {
            source_name: name.to_string(),
            target: "js::object".to_string(),
            flags: TypeFlags {
                is_object: true,
                ..TypeFlags::value()
            },
            ownership_hint: None,
            type_args: Vec::new(),
            members: Vec::new(),
            call_signatures: Vec::new(),
        },
        "String" => ResolvedType::primitive("String", "js::string"),
        "Number" => ResolvedType::primitive("Number", "js::number"),
        "Boolean" => ResolvedType::primitive("Boolean", "bool"),
        "Date" => ResolvedType::primitive("Date", "js::Date"),
        "RegExp" => ResolvedType::primitive("RegExp", "js::RegExp"),
        "Error" => ResolvedType::primitive("Error", "js::Error"),
        "Int8Array" | "Uint8Array" | "Int16Array" | "Uint16Array" | "Int32Array"
        | "Uint32Array" | "Float32Array" | "Float64Array" => {
            ResolvedType::primitive(name, format!("js::{name}"))
        }
        _ => return None,
    };
    Some(mapped)
}

fn nullish(name: &str, target: &str) -> ResolvedType {
    let mut t = ResolvedType::primitive(name, target);
    t.flags.is_nullable = true;
    t
}

fn literal(expr: &TypeExpr, target: &str) -> ResolvedType {
    let mut t = ResolvedType::primitive(expr.to_string(), target);
    t.flags.is_literal = true;
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(text: &str) -> ResolvedType {
        let mut sink = DiagnosticSink::new();
        TypeMapper::new().map_text(text, &mut sink)
    }

    fn map_with_sink(text: &str) -> (ResolvedType, DiagnosticSink) {
        let mut sink = DiagnosticSink::new();
        let mapped = TypeMapper::new().map_text(text, &mut sink);
        (mapped, sink)
    }

    #[test]
    fn primitives() {
        assert_eq!(map("string").target, "js::string");
        assert_eq!(map("number").target, "js::number");
        assert_eq!(map("boolean").target, "bool");
        assert_eq!(map("void").target, "void");
        assert_eq!(map("any").target, "js::any");
        assert!(map("number").flags.is_primitive);
        assert!(!map("number").flags.needs_heap_allocation);
    }

    #[test]
    fn arrays() {
        let arr = map("number[]");
        assert_eq!(arr.target, "js::array<js::number>");
        assert!(arr.flags.is_array);
        assert!(arr.flags.needs_heap_allocation);
        // Array<T> generic syntax maps identically.
        assert_eq!(map("Array<number>").target, "js::array<js::number>");
        // Heap element types get their shared wrapper.
        assert_eq!(map("Animal[]").target, "js::array<std::shared_ptr<Animal>>");
    }

    #[test]
    fn generic_containers() {
        assert_eq!(map("Promise<number>").target, "js::Promise<js::number>");
        assert_eq!(
            map("Promise<number>").ownership_hint,
            Some(Ownership::Shared)
        );
        assert_eq!(
            map("Record<string, number>").target,
            "std::map<js::string, js::number>"
        );
        assert_eq!(map("Set<string>").target, "std::set<js::string>");
    }

    #[test]
    fn union_normalizes_to_optional() {
        let a = map("string | null");
        let b = map("string | undefined");
        let c = map("string | null | undefined");
        assert_eq!(a.target, "std::optional<js::string>");
        assert_eq!(a.target, b.target);
        assert_eq!(a.target, c.target);
        assert_eq!(a.flags, b.flags);
        assert_eq!(a.flags, c.flags);
        assert!(a.flags.is_nullable);
        assert!(!a.flags.is_union);
    }

    #[test]
    fn union_string_or_number_wrapper() {
        let t = map("string | number");
        assert_eq!(t.target, "js::typed::StringOrNumber");
        assert!(t.flags.is_union);
        // With a nullish member the wrapper itself becomes optional.
        assert_eq!(
            map("string | number | null").target,
            "std::optional<js::typed::StringOrNumber>"
        );
    }

    #[test]
    fn union_general_variant_dedupes() {
        let t = map("string | boolean | string");
        assert_eq!(t.target, "std::variant<js::string, bool>");
        assert!(t.flags.is_union);
    }

    #[test]
    fn union_members_in_declaration_order() {
        assert_eq!(
            map("boolean | string | Animal").target,
            "std::variant<bool, js::string, std::shared_ptr<Animal>>"
        );
    }

    #[test]
    fn intersection_takes_first_member() {
        let (t, sink) = map_with_sink("Animal & Serializable");
        assert_eq!(t.target, "Animal");
        assert!(t.flags.is_intersection);
        assert_eq!(sink.records()[0].code, "I0001");
    }

    #[test]
    fn function_types() {
        let t = map("(x: number, y) => string");
        assert_eq!(t.target, "std::function<js::string(js::number, js::any)>");
        assert!(t.flags.is_function);
        assert_eq!(t.call_signatures.len(), 1);
        assert_eq!(t.call_signatures[0].params[1].target, "js::any");
    }

    #[test]
    fn tuples() {
        assert_eq!(
            map("[number, number]").target,
            "std::tuple<js::number, js::number>"
        );
        assert_eq!(
            map("[string, number?]").target,
            "std::tuple<js::string, std::optional<js::number>>"
        );
        assert_eq!(
            map("[string, ...number[]]").target,
            "std::tuple<js::string, js::array<js::number>>"
        );
    }

    #[test]
    fn utility_types() {
        assert_eq!(map("Partial<Animal>").target, "Animal");
        assert_eq!(map("Readonly<string>").target, "const js::string");
        let (t, sink) = map_with_sink("Pick<Animal, \"name\">");
        assert_eq!(t.target, "js::any");
        assert_eq!(sink.records()[0].code, "W0002");
    }

    #[test]
    fn fallback_user_type() {
        let t = map("Animal");
        assert_eq!(t.target, "Animal");
        assert!(t.flags.is_object);
        assert!(t.flags.needs_heap_allocation);
        let g = map("Container<number>");
        assert_eq!(g.target, "Container<js::number>");
        assert!(g.flags.is_generic);
    }

    #[test]
    fn undeclared_user_types_note_the_forward_reference() {
        let mut sink = DiagnosticSink::new();
        let mut mapper = TypeMapper::new();
        mapper.declare("Animal");
        mapper.map_text("Animal", &mut sink);
        assert!(sink.is_empty());
        mapper.map_text("Stranger", &mut sink);
        assert_eq!(sink.records()[0].code, "I0002");
        assert_eq!(sink.records()[0].severity, tscpp_common::Severity::Info);
    }

    #[test]
    fn unparsable_degrades_to_any() {
        let (t, sink) = map_with_sink("string |");
        assert_eq!(t.target, "js::any");
        assert_eq!(sink.records()[0].code, "W0001");
    }

    #[test]
    fn mapping_is_idempotent_on_source_name() {
        let mapper = TypeMapper::new();
        for text in [
            "string",
            "number",
            "number[]",
            "Promise<string>",
            "string | null",
            "Record<string, number>",
            "[number, number]",
        ] {
            let mut sink = DiagnosticSink::new();
            let first = mapper.map_text(text, &mut sink);
            let second = mapper.map_text(&first.source_name, &mut sink);
            assert_eq!(first, second, "idempotence failed for {text}");
        }
    }

    #[test]
    fn plugin_rule_tried_first() {
        struct OpaqueHandles;
        impl TypeRule for OpaqueHandles {
            fn try_map(
                &self,
                expr: &TypeExpr,
                _mapper: &TypeMapper,
                _sink: &mut DiagnosticSink,
            ) -> Option<ResolvedType> {
                match expr {
                    TypeExpr::Name { name, .. } if name == "Handle" => {
                        Some(ResolvedType::primitive("Handle", "std::uintptr_t"))
                    }
                    _ => None,
                }
            }
        }
        let mut mapper = TypeMapper::new();
        mapper.add_rule(Box::new(OpaqueHandles));
        let mut sink = DiagnosticSink::new();
        assert_eq!(mapper.map_text("Handle", &mut sink).target, "std::uintptr_t");
        // Built-ins still apply when the rule declines.
        assert_eq!(mapper.map_text("number", &mut sink).target, "js::number");
    }
}
