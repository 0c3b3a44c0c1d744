//! Target-spelling snapshots for the type mapper.

use insta::assert_snapshot;

use tscpp_common::DiagnosticSink;
use tscpp_types::TypeMapper;

fn target(text: &str) -> String {
    let mut sink = DiagnosticSink::new();
    let mapper = TypeMapper::new();
    mapper.map_text(text, &mut sink).target
}

#[test]
fn primitive_spellings() {
    assert_snapshot!(target("string"), @"js::string");
    assert_snapshot!(target("number"), @"js::number");
    assert_snapshot!(target("boolean"), @"bool");
    assert_snapshot!(target("void"), @"void");
    assert_snapshot!(target("any"), @"js::any");
}

#[test]
fn container_spellings() {
    assert_snapshot!(target("number[]"), @"js::array<js::number>");
    assert_snapshot!(target("Array<Dog>"), @"js::array<std::shared_ptr<Dog>>");
    assert_snapshot!(target("Record<string, number>"), @"std::map<js::string, js::number>");
    assert_snapshot!(target("Set<string>"), @"std::set<js::string>");
    assert_snapshot!(target("Promise<string>"), @"js::Promise<js::string>");
}

#[test]
fn union_spellings() {
    assert_snapshot!(target("string | null"), @"std::optional<js::string>");
    assert_snapshot!(target("string | number"), @"js::typed::StringOrNumber");
    assert_snapshot!(
        target("string | number | undefined"),
        @"std::optional<js::typed::StringOrNumber>"
    );
    assert_snapshot!(
        target("Cat | Dog"),
        @"std::variant<std::shared_ptr<Cat>, std::shared_ptr<Dog>>"
    );
    assert_snapshot!(target("string | string"), @"js::string");
}

#[test]
fn structured_spellings() {
    assert_snapshot!(
        target("(x: number) => string"),
        @"std::function<js::string(js::number)>"
    );
    assert_snapshot!(
        target("[string, number?]"),
        @"std::tuple<js::string, std::optional<js::number>>"
    );
    assert_snapshot!(
        target("[string, ...number[]]"),
        @"std::tuple<js::string, js::array<js::number>>"
    );
}

#[test]
fn degraded_spellings_warn() {
    let mut sink = DiagnosticSink::new();
    let mapper = TypeMapper::new();
    let mapped = mapper.map_text("Pick<Person, \"name\">", &mut sink);
    assert_snapshot!(mapped.target, @"js::any");
    assert_eq!(sink.records()[0].code, "W0002");
}
