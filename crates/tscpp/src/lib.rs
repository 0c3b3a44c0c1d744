//! TypeScript-to-C++ translation core.
//!
//! The facade crate ties the pipeline together: an IR [`Module`] goes in,
//! rewrite passes run over it, and the code generator produces the header
//! and source units with their diagnostics and position maps.
//!
//! ```
//! use tscpp::{compile_unit, GenOptions};
//! use tscpp::ir::{Expr, Module, Stmt};
//!
//! let module = Module::new("hello").with_stmt(Stmt::expr(Expr::call(
//!     Expr::member(Expr::ident("console"), "log"),
//!     vec![Expr::string("hello")],
//! )));
//! let out = compile_unit(&module, GenOptions::new("hello")).unwrap();
//! assert!(out.source.contains("js::console.log(\"hello\"_S);"));
//! ```
//!
//! Plugins hook in at three seams: [`TypeRule`] for type mapping,
//! [`RewritePass`] for IR-to-IR transforms, and [`DeclEmitter`] for custom
//! declaration rendering.

pub use tscpp_codegen::{Codegen, DeclEmitter, GenOptions, UnitOutput};
pub use tscpp_common::{
    Diagnostic, DiagnosticSink, FatalError, LineIndex, PositionMap, PositionMapping, Severity,
    Span,
};
pub use tscpp_ir as ir;
pub use tscpp_types::{
    resolve_ownership, DeclContext, Ownership, ResolvedType, TypeExpr, TypeFlags, TypeMapper,
    TypeRule,
};

pub use tscpp_common::render::{render_all, render_diagnostic};

use ir::Module;

/// An IR-to-IR transform, run in installation order before generation.
pub trait RewritePass {
    fn name(&self) -> &str;
    fn rewrite(&self, module: Module) -> Module;
}

/// A configured compilation pipeline. Each [`compile`](Pipeline::compile)
/// call builds a fresh generator, so one pipeline can compile many modules
/// independently.
#[derive(Default)]
pub struct Pipeline {
    type_rules: Vec<Box<dyn Fn() -> Box<dyn TypeRule>>>,
    passes: Vec<Box<dyn RewritePass>>,
    emitters: Vec<Box<dyn Fn() -> Box<dyn DeclEmitter>>>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    /// Install a type-mapping rule. The factory is invoked once per
    /// compiled module, keeping compilations independent.
    pub fn with_type_rule(
        mut self,
        factory: impl Fn() -> Box<dyn TypeRule> + 'static,
    ) -> Pipeline {
        self.type_rules.push(Box::new(factory));
        self
    }

    pub fn with_pass(mut self, pass: Box<dyn RewritePass>) -> Pipeline {
        self.passes.push(pass);
        self
    }

    pub fn with_decl_emitter(
        mut self,
        factory: impl Fn() -> Box<dyn DeclEmitter> + 'static,
    ) -> Pipeline {
        self.emitters.push(Box::new(factory));
        self
    }

    /// Run the rewrite passes and generate both units.
    pub fn compile(&self, module: &Module, options: GenOptions) -> Result<UnitOutput, FatalError> {
        let mut module = module.clone();
        for pass in &self.passes {
            module = pass.rewrite(module);
        }
        let mut mapper = TypeMapper::new();
        for factory in &self.type_rules {
            mapper.add_rule(factory());
        }
        let mut codegen = Codegen::new(mapper, &options);
        for factory in &self.emitters {
            codegen.add_decl_emitter(factory());
        }
        codegen.generate(&module)
    }
}

/// Compile one module with no plugins installed.
pub fn compile_unit(module: &Module, options: GenOptions) -> Result<UnitOutput, FatalError> {
    Pipeline::new().compile(module, options)
}
