//! Unit assembly.
//!
//! Wraps the rendered declaration body in the include guard, the include
//! block, and the forward-declaration section, and prefixes the definition
//! body with its own-header include. Extra includes are discovered by
//! scanning the rendered text for the target spellings that need them, kept
//! in a sorted set so the block is identical across runs.

use std::collections::BTreeSet;

use crate::names;

/// Every unit starts from the same include block; the runtime umbrella
/// header comes last.
const BASE_INCLUDES: [&str; 8] = [
    "#include <iostream>",
    "#include <string>",
    "#include <memory>",
    "#include <vector>",
    "#include <map>",
    "#include <optional>",
    "#include <initializer_list>",
    "#include \"core.h\"",
];

/// Spelling → header it requires, beyond the base block.
const EXTRA_INCLUDES: [(&str, &str); 8] = [
    ("std::tuple", "<tuple>"),
    ("std::variant", "<variant>"),
    ("std::function", "<functional>"),
    ("std::set", "<set>"),
    ("std::numeric_limits", "<limits>"),
    ("std::pow", "<cmath>"),
    ("co_await", "<coroutine>"),
    ("co_return", "<coroutine>"),
];

fn extra_includes(bodies: &[&str]) -> BTreeSet<&'static str> {
    let mut extras = BTreeSet::new();
    for (needle, include) in EXTRA_INCLUDES {
        if bodies.iter().any(|body| body.contains(needle)) {
            extras.insert(include);
        }
    }
    extras
}

/// Assemble the declaration unit. `source_body` participates in the include
/// scan only: the definition unit includes this header, so everything either
/// unit needs is pulled in here.
pub fn header_unit(
    unit_name: &str,
    forward: &[String],
    header_body: &str,
    source_body: &str,
) -> String {
    let guard = names::include_guard(unit_name);
    let mut out = String::new();
    out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
    for include in BASE_INCLUDES {
        out.push_str(include);
        out.push('\n');
    }
    for include in extra_includes(&[header_body, source_body]) {
        out.push_str(&format!("#include {include}\n"));
    }
    out.push_str("\nusing namespace js;\n");
    if !forward.is_empty() {
        out.push_str("\n// Forward declarations\n");
        for name in forward {
            out.push_str(&format!("class {name};\n"));
        }
    }
    let body = header_body.trim_matches('\n');
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    out.push_str(&format!("\n#endif // {guard}\n"));
    out
}

/// Assemble the definition unit.
pub fn source_unit(unit_name: &str, source_body: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("#include \"{unit_name}.h\"\n\nusing namespace js;\n"));
    let body = source_body.trim_matches('\n');
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    out
}
