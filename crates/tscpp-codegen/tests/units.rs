//! End-to-end generation over hand-built IR modules.

use tscpp_codegen::{Codegen, GenOptions, UnitOutput};
use tscpp_ir::{
    Access, BinaryOp, ClassDecl, ClassMember, ConstructorMember, Decl, DeclKind, Expr, ExprKind,
    FunctionDecl, MethodMember, Module, Param, PropertyMember, Stmt, StmtKind, VarDecl,
};
use tscpp_types::{TypeExpr, TypeMapper};

fn generate(module: &Module) -> UnitOutput {
    Codegen::new(TypeMapper::new(), &GenOptions::new(module.name.clone()))
        .generate(module)
        .expect("generation succeeds")
}

fn console_log(arg: Expr) -> Stmt {
    Stmt::expr(Expr::call(
        Expr::member(Expr::ident("console"), "log"),
        vec![arg],
    ))
}

/// A class hierarchy with a virtual/override pair, a module-level instance,
/// and a top-level call.
fn inheritance_module() -> Module {
    let animal = ClassDecl::new("Animal")
        .with_member(ClassMember::Property(PropertyMember::new(
            "name",
            Some(TypeExpr::name("string")),
        )))
        .with_member(ClassMember::Constructor(ConstructorMember {
            params: vec![Param::new("name", Some(TypeExpr::name("string")))],
            body: vec![Stmt::expr(Expr::assign(
                Expr::member(Expr::this(), "name"),
                Expr::ident("name"),
            ))],
            access: Access::Public,
            doc: Vec::new(),
        }))
        .with_member(ClassMember::Method({
            let mut m = MethodMember::new("speak");
            m.is_virtual = true;
            m.body = Some(vec![console_log(Expr::binary(
                BinaryOp::Add,
                Expr::member(Expr::this(), "name"),
                Expr::string(" makes a sound"),
            ))]);
            m
        }));

    let dog = ClassDecl::new("Dog")
        .with_extends("Animal")
        .with_member(ClassMember::Constructor(ConstructorMember {
            params: vec![Param::new("name", Some(TypeExpr::name("string")))],
            body: vec![Stmt::expr(Expr::call(
                Expr::new(ExprKind::Super),
                vec![Expr::ident("name")],
            ))],
            access: Access::Public,
            doc: Vec::new(),
        }))
        .with_member(ClassMember::Method({
            let mut m = MethodMember::new("speak");
            m.is_override = true;
            m.body = Some(vec![console_log(Expr::binary(
                BinaryOp::Add,
                Expr::member(Expr::this(), "name"),
                Expr::string(" barks"),
            ))]);
            m
        }));

    Module::new("class-inheritance")
        .with_decl(Decl::new(DeclKind::Class(animal)))
        .with_decl(Decl::new(DeclKind::Class(dog)))
        .with_decl(Decl::new(DeclKind::Var(VarDecl::constant(
            "dog",
            Some(TypeExpr::name("Dog")),
            Expr::new_object("Dog", vec![Expr::string("Rex")]),
        ))))
        .with_stmt(Stmt::expr(Expr::call(
            Expr::member(Expr::ident("dog"), "speak"),
            vec![],
        )))
}

#[test]
fn inheritance_header_is_exact() {
    let out = generate(&inheritance_module());
    let expected = "\
#ifndef CLASS_INHERITANCE_H
#define CLASS_INHERITANCE_H

#include <iostream>
#include <string>
#include <memory>
#include <vector>
#include <map>
#include <optional>
#include <initializer_list>
#include \"core.h\"

using namespace js;

// Forward declarations
class Animal;
class Dog;

class Animal {
public:
    js::string name;
    Animal(js::string name);
    virtual void speak();
};
class Dog : public Animal {
public:
    Dog(js::string name);
    void speak() override;
};
extern const std::shared_ptr<Dog> dog;

void Main();

#endif // CLASS_INHERITANCE_H
";
    assert_eq!(out.header, expected);
}

#[test]
fn inheritance_source_is_exact() {
    let out = generate(&inheritance_module());
    let expected = "\
#include \"class-inheritance.h\"

using namespace js;

Animal::Animal(js::string name) {
    this->name = name;
}

void Animal::speak() {
    js::console.log((this->name + \" makes a sound\"_S));
}

Dog::Dog(js::string name) : Animal(name) {
}

void Dog::speak() {
    js::console.log((this->name + \" barks\"_S));
}

const std::shared_ptr<Dog> dog = std::make_shared<Dog>(\"Rex\"_S);

// Entry point
void Main() {
    dog->speak();
}

int main(int /*argc*/, char** /*argv*/) {
    Main();
    return 0;
}
";
    assert_eq!(out.source, expected);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn generation_is_deterministic() {
    let module = inheritance_module();
    let first = generate(&module);
    let second = generate(&module);
    assert_eq!(first.header, second.header);
    assert_eq!(first.source, second.source);
    let first_codes: Vec<&str> = first.diagnostics.iter().map(|d| d.code).collect();
    let second_codes: Vec<&str> = second.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(first_codes, second_codes);
}

#[test]
fn unsupported_nodes_degrade_without_aborting() {
    let mut func = FunctionDecl::new("f");
    func.body = Some(vec![
        Stmt::new(StmtKind::Unsupported {
            construct: "labeled statement".into(),
        }),
        Stmt::expr(Expr::new(ExprKind::Unsupported {
            construct: "tagged template".into(),
        })),
    ]);
    let module = Module::new("app")
        .with_decl(Decl::new(DeclKind::Unsupported {
            construct: "decorator".into(),
        }))
        .with_decl(Decl::new(DeclKind::Function(func)));

    let out = generate(&module);
    assert!(out.header.contains("/* unsupported: decorator */"));
    assert!(out.source.contains("/* unsupported: labeled statement */;"));
    assert!(out.source.contains("js::any() /* tagged template */;"));
    let w0003 = out.diagnostics.iter().filter(|d| d.code == "W0003").count();
    assert_eq!(w0003, 3);
}

#[test]
fn ownership_annotations_are_total_across_bindings() {
    // One property per category: annotated weak and unique, heuristic weak,
    // default shared, and a value type.
    let node = ClassDecl::new("Node")
        .with_member(ClassMember::Property(
            PropertyMember::new("owner", Some(TypeExpr::name("Registry")))
                .with_doc("Owning registry. @weak"),
        ))
        .with_member(ClassMember::Property(
            PropertyMember::new("buffer", Some(TypeExpr::name("Buffer")))
                .with_doc("@unique"),
        ))
        .with_member(ClassMember::Property(PropertyMember::new(
            "next",
            Some(TypeExpr::name("Node")),
        )))
        .with_member(ClassMember::Property(PropertyMember::new(
            "payload",
            Some(TypeExpr::name("Payload")),
        )))
        .with_member(ClassMember::Property(PropertyMember::new(
            "count",
            Some(TypeExpr::name("number")),
        )));
    let module = Module::new("app").with_decl(Decl::new(DeclKind::Class(node)));
    let out = generate(&module);
    assert!(out.header.contains("std::weak_ptr<Registry> owner;"));
    assert!(out.header.contains("std::unique_ptr<Buffer> buffer;"));
    assert!(out.header.contains("std::weak_ptr<Node> next;"));
    assert!(out.header.contains("std::shared_ptr<Payload> payload;"));
    assert!(out.header.contains("js::number count;"));
}

#[test]
fn weak_annotation_on_value_type_conflicts() {
    let class = ClassDecl::new("Box").with_member(ClassMember::Property(
        PropertyMember::new("label", Some(TypeExpr::name("string"))).with_doc("@weak"),
    ));
    let module = Module::new("app").with_decl(Decl::new(DeclKind::Class(class)));
    let out = generate(&module);
    assert!(out.header.contains("js::string label;"));
    assert!(out.diagnostics.iter().any(|d| d.code == "W0005"));
}

#[test]
fn unresolvable_types_degrade_to_any() {
    let var = VarDecl::constant(
        "x",
        Some(TypeExpr::generic("Pick", vec![
            TypeExpr::name("Person"),
            TypeExpr::name("string"),
        ])),
        Expr::number(0.0),
    );
    let module = Module::new("app").with_decl(Decl::new(DeclKind::Var(var)));
    let out = generate(&module);
    assert!(out.header.contains("extern const js::any x;"));
    assert!(out.diagnostics.iter().any(|d| d.code == "W0002"));
}

#[test]
fn reserved_identifiers_stay_hygienic_end_to_end() {
    let mut func = FunctionDecl::new("template");
    func.params.push(Param::new("union", Some(TypeExpr::name("number"))));
    func.ret = Some(TypeExpr::name("number"));
    func.body = Some(vec![Stmt::ret(Some(Expr::ident("union")))]);
    let module = Module::new("app").with_decl(Decl::new(DeclKind::Function(func)));
    let out = generate(&module);
    assert!(out.header.contains("js::number template_(js::number union_);"));
    assert!(out.source.contains("return union_;"));
}

#[test]
fn weak_property_access_upgrades_before_use() {
    let registry = ClassDecl::new("Registry");
    let mut func = FunctionDecl::new("poke");
    func.params.push({
        let mut p = Param::new("owner", Some(TypeExpr::name("Registry")));
        p.doc.push("@weak".to_string());
        p
    });
    func.body = Some(vec![Stmt::expr(Expr::call(
        Expr::member(Expr::ident("owner"), "touch"),
        vec![],
    ))]);
    let module = Module::new("app")
        .with_decl(Decl::new(DeclKind::Class(registry)))
        .with_decl(Decl::new(DeclKind::Function(func)));
    let out = generate(&module);
    assert!(out.header.contains("void poke(std::weak_ptr<Registry> owner);"));
    assert!(out.source.contains("owner.lock()->touch();"));
}

#[test]
fn position_map_records_spanned_statements() {
    let source_text = "dog.speak();\n";
    let module = Module::new("app").with_stmt(
        Stmt::expr(Expr::call(
            Expr::member(Expr::ident("dog"), "speak"),
            vec![],
        ))
        .with_span(tscpp_common::Span::new(0, 12)),
    );
    let out = Codegen::new(
        TypeMapper::new(),
        &GenOptions::new("app").with_source(source_text),
    )
    .generate(&module)
    .expect("generation succeeds");
    assert_eq!(out.source_map.len(), 1);
    let entry = out.source_map.entries()[0];
    assert_eq!((entry.src_line, entry.src_col), (1, 1));
}

#[test]
fn date_allocation_constructs_the_runtime_value() {
    let module = Module::new("app").with_decl(Decl::new(DeclKind::Var(VarDecl::constant(
        "created",
        Some(TypeExpr::name("Date")),
        Expr::new_object("Date", vec![]),
    ))));
    let out = generate(&module);
    assert!(out.header.contains("extern const js::Date created;"));
    assert!(out.source.contains("const js::Date created = js::Date();"));
}

#[test]
fn nullable_alias_flows_into_parameter_types() {
    let alias = tscpp_ir::TypeAliasDecl {
        name: "Name".into(),
        ty: TypeExpr::union(vec![TypeExpr::name("string"), TypeExpr::name("null")]),
        doc: Vec::new(),
    };
    let mut func = FunctionDecl::new("greet");
    func.params.push(Param::new("who", Some(TypeExpr::name("Name"))));
    let module = Module::new("app")
        .with_decl(Decl::new(DeclKind::TypeAlias(alias)))
        .with_decl(Decl::new(DeclKind::Function(func)));
    let out = generate(&module);
    assert!(out.header.contains("void greet(std::optional<js::string> who);"));
}

#[test]
fn module_without_top_level_statements_has_no_entry_point() {
    let module = Module::new("app").with_decl(Decl::new(DeclKind::Class(ClassDecl::new("A"))));
    let out = generate(&module);
    assert!(!out.header.contains("void Main();"));
    assert!(!out.source.contains("int main("));
}
