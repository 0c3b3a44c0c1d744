//! Identifier hygiene and global-name rewriting.
//!
//! Source identifiers that collide with a target reserved word get a single
//! trailing underscore, deterministically. A small table maps well-known
//! global objects to their runtime equivalents.

/// Reserved words of the target language that are legal identifiers in the
/// source language. Source keywords shared by both languages cannot reach the
/// generator as identifiers and are not listed.
const RESERVED: &[&str] = &[
    "alignas",
    "alignof",
    "and",
    "and_eq",
    "asm",
    "auto",
    "bitand",
    "bitor",
    "bool",
    "char",
    "char16_t",
    "char32_t",
    "char8_t",
    "co_await",
    "co_return",
    "co_yield",
    "compl",
    "concept",
    "const_cast",
    "consteval",
    "constexpr",
    "constinit",
    "decltype",
    "double",
    "dynamic_cast",
    "explicit",
    "extern",
    "float",
    "friend",
    "goto",
    "inline",
    "int",
    "long",
    "main",
    "mutable",
    "namespace",
    "noexcept",
    "not",
    "not_eq",
    "nullptr",
    "operator",
    "or",
    "or_eq",
    "register",
    "reinterpret_cast",
    "requires",
    "short",
    "signed",
    "sizeof",
    "static_assert",
    "static_cast",
    "struct",
    "template",
    "typedef",
    "typeid",
    "typename",
    "union",
    "unsigned",
    "using",
    "virtual",
    "volatile",
    "wchar_t",
    "xor",
    "xor_eq",
];

/// Sanitize a source identifier for use in the output. Reserved words get a
/// trailing underscore; everything else passes through unchanged.
pub fn sanitize(name: &str) -> String {
    if RESERVED.binary_search(&name).is_ok() {
        let mut out = String::with_capacity(name.len() + 1);
        out.push_str(name);
        out.push('_');
        out
    } else {
        name.to_string()
    }
}

/// Rewrite a well-known global object to its runtime namespace equivalent.
/// Returns `None` for names that are not globals.
pub fn global(name: &str) -> Option<&'static str> {
    let rewritten = match name {
        "console" => "js::console",
        "Math" => "js::Math",
        "JSON" => "js::JSON",
        "Object" => "js::Object",
        "Number" => "js::Number",
        "String" => "js::String",
        "Boolean" => "js::Boolean",
        "Date" => "js::Date",
        "RegExp" => "js::RegExp",
        "Error" => "js::Error",
        "structuredClone" => "js::structuredClone",
        "Int8Array" => "js::Int8Array",
        "Uint8Array" => "js::Uint8Array",
        "Int16Array" => "js::Int16Array",
        "Uint16Array" => "js::Uint16Array",
        "Int32Array" => "js::Int32Array",
        "Uint32Array" => "js::Uint32Array",
        "Float32Array" => "js::Float32Array",
        "Float64Array" => "js::Float64Array",
        "parseInt" => "js::parseInt",
        "parseFloat" => "js::parseFloat",
        "isNaN" => "js::isNaN",
        "isFinite" => "js::isFinite",
        "NaN" => "std::numeric_limits<js::number>::quiet_NaN()",
        "Infinity" => "std::numeric_limits<js::number>::infinity()",
        "undefined" => "js::undefined",
        "globalThis" => "js::globalThis",
        _ => return None,
    };
    Some(rewritten)
}

/// Turn a module name into an include-guard macro: alphanumerics uppercased,
/// everything else folded to underscores, `_H` suffix.
pub fn include_guard(module_name: &str) -> String {
    let mut guard = String::with_capacity(module_name.len() + 2);
    for ch in module_name.chars() {
        if ch.is_ascii_alphanumeric() {
            guard.push(ch.to_ascii_uppercase());
        } else {
            guard.push('_');
        }
    }
    if guard
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(true)
    {
        guard.insert(0, '_');
    }
    guard.push_str("_H");
    guard
}
