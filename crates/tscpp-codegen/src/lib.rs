//! C++ code generation for the tscpp translation core.
//!
//! [`Codegen`] consumes one IR [`Module`] and produces the two output units:
//! a declaration unit (header) with signatures and a definition unit (source)
//! with bodies plus the synthesized entry point. Generation is immutable over
//! the IR and deterministic: the same module yields byte-identical units and
//! the same diagnostics in the same order.
//!
//! Recoverable problems (unsupported constructs, unresolvable types,
//! ownership conflicts) accumulate in the diagnostics sink and degrade the
//! output locally; fatal problems (malformed nodes, an unresolved ownership
//! category surviving into generation) abort the unit with a [`FatalError`]
//! and produce no output.

pub mod assemble;
pub mod context;
pub mod emitter;
pub mod names;

mod declgen;
mod exprgen;
mod stmtgen;

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use tscpp_common::{DiagnosticSink, FatalError, LineIndex, PositionMap, Span};
use tscpp_ir::{ClassMember, Decl, DeclKind, Expr, ExprKind, InterfaceMember, Module};
use tscpp_types::{Ownership, ResolvedType, TypeExpr, TypeMapper};

pub use context::{Ctx, Phase, UnitKind};
pub use emitter::Emitter;

/// Options for generating one unit.
pub struct GenOptions {
    /// Unit name; drives the output file pair, the include guard, and the
    /// `#include` at the top of the definition unit.
    pub unit_name: String,
    /// Original source text, when available. Enables position-map entries
    /// and line/column rendering for spanned diagnostics.
    pub source: Option<String>,
    /// Spaces per indent level in the output.
    pub indent_size: usize,
}

impl GenOptions {
    pub fn new(unit_name: impl Into<String>) -> GenOptions {
        GenOptions {
            unit_name: unit_name.into(),
            source: None,
            indent_size: 4,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> GenOptions {
        self.source = Some(source.into());
        self
    }
}

/// The two rendered units for one module, with their position maps and the
/// diagnostics accumulated while producing them.
#[derive(Debug)]
pub struct UnitOutput {
    pub header: String,
    pub source: String,
    pub header_map: PositionMap,
    pub source_map: PositionMap,
    pub diagnostics: DiagnosticSink,
}

/// A plugin hook over declaration rendering, tried before the built-in
/// dispatch. Returning `None` hands the declaration back to the default
/// renderer; returned text is emitted line by line at the current indent.
pub trait DeclEmitter {
    fn emit_header(&self, decl: &Decl) -> Option<String>;
    fn emit_source(&self, decl: &Decl) -> Option<String>;
}

/// What the pre-pass learned about one class or interface, for base-chain
/// walks and override validation.
pub(crate) struct ClassInfo {
    pub(crate) extends: Option<String>,
    /// Method name → declared virtual (interfaces report every member
    /// virtual).
    pub(crate) virtual_methods: FxHashSet<String>,
}

/// The generator. Owns the type mapper for the duration of a unit so the
/// pre-pass can register declared names, and threads one diagnostics sink
/// through mapping, ownership resolution, and emission.
pub struct Codegen {
    pub(crate) mapper: TypeMapper,
    pub(crate) sink: DiagnosticSink,
    pub(crate) classes: FxHashMap<String, ClassInfo>,
    pub(crate) enums: FxHashSet<String>,
    /// Type aliases resolved up front; alias references resolve to the
    /// aliased type, not to an opaque user type.
    pub(crate) aliases: FxHashMap<String, ResolvedType>,
    /// Lexical binding scopes, innermost last. Records the ownership
    /// category of each heap binding so member access can pick between
    /// `->`, `.`, and a weak-pointer upgrade.
    pub(crate) scopes: Vec<FxHashMap<String, Ownership>>,
    /// Class whose members are currently being emitted; resolves `super`.
    pub(crate) current_class: Option<String>,
    /// Inside an async body, `return` renders as `co_return`.
    pub(crate) in_async: bool,
    pub(crate) obj_temp: usize,
    pub(crate) line_index: Option<LineIndex>,
    pub(crate) indent_size: usize,
    pub(crate) decl_emitters: Vec<Box<dyn DeclEmitter>>,
    phase: Phase,
}

impl Codegen {
    pub fn new(mapper: TypeMapper, options: &GenOptions) -> Codegen {
        Codegen {
            mapper,
            sink: DiagnosticSink::new(),
            classes: FxHashMap::default(),
            enums: FxHashSet::default(),
            aliases: FxHashMap::default(),
            scopes: vec![FxHashMap::default()],
            current_class: None,
            in_async: false,
            obj_temp: 0,
            line_index: options.source.as_deref().map(LineIndex::new),
            indent_size: options.indent_size,
            decl_emitters: Vec::new(),
            phase: Phase::Idle,
        }
    }

    /// Install a plugin declaration emitter, tried before the built-in
    /// dispatch in installation order.
    pub fn add_decl_emitter(&mut self, emitter: Box<dyn DeclEmitter>) {
        self.decl_emitters.push(emitter);
    }

    /// Generate both units for `module`.
    pub fn generate(mut self, module: &Module) -> Result<UnitOutput, FatalError> {
        if module.name.trim().is_empty() {
            return Err(FatalError::InvalidInput {
                detail: "module has no name".into(),
            });
        }

        self.advance(Phase::EmittingDeclarationUnit)?;
        self.survey(module);

        let mut header = Emitter::new(self.indent_size);
        for decl in &module.decls {
            self.gen_decl_header(&mut header, Ctx::declaration(), decl)?;
        }
        if !module.stmts.is_empty() {
            header.blank();
            header.line(0, "void Main();");
        }

        self.advance(Phase::EmittingDefinitionUnit)?;
        let mut source = Emitter::new(self.indent_size);
        let mut first = true;
        for decl in &module.decls {
            let before = source.current_line();
            if !first {
                source.blank();
            }
            self.gen_decl_source(&mut source, Ctx::definition(), decl)?;
            if source.current_line() != before {
                first = false;
            }
        }
        if !module.stmts.is_empty() {
            source.blank();
            self.gen_entry_point(&mut source, &module.stmts)?;
        }

        self.advance(Phase::Done)?;

        let (header_body, header_map) = header.finish();
        let (source_body, source_map) = source.finish();
        let forward = forward_declarations(module);
        let header_text =
            assemble::header_unit(&module.name, &forward, &header_body, &source_body);
        let source_text = assemble::source_unit(&module.name, &source_body);

        Ok(UnitOutput {
            header: header_text,
            source: source_text,
            header_map,
            source_map,
            diagnostics: self.sink,
        })
    }

    fn advance(&mut self, next: Phase) -> Result<(), FatalError> {
        if !self.phase.can_advance_to(next) {
            return Err(FatalError::InvalidInput {
                detail: format!("phase {:?} cannot advance to {next:?}", self.phase),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Pre-pass over the module's declarations: register every declared type
    /// name with the mapper, collect class shapes for override validation,
    /// and resolve type aliases.
    fn survey(&mut self, module: &Module) {
        for decl in &module.decls {
            if let Some(name) = decl.name() {
                self.mapper.declare(name);
            }
            match decl.kind() {
                DeclKind::Class(class) => {
                    let mut virtual_methods = FxHashSet::default();
                    for member in &class.members {
                        if let ClassMember::Method(m) = member {
                            if m.is_virtual || m.is_abstract {
                                virtual_methods.insert(m.name.clone());
                            }
                        }
                    }
                    self.classes.insert(
                        class.name.clone(),
                        ClassInfo {
                            extends: class.extends.clone(),
                            virtual_methods,
                        },
                    );
                }
                DeclKind::Interface(iface) => {
                    // Interfaces lower to abstract bases; every member is
                    // virtual for override purposes.
                    let mut virtual_methods = FxHashSet::default();
                    for member in &iface.members {
                        match member {
                            InterfaceMember::Method { name, .. } => {
                                virtual_methods.insert(name.clone());
                            }
                            InterfaceMember::Property { name, .. } => {
                                virtual_methods.insert(format!("get_{name}"));
                                virtual_methods.insert(format!("set_{name}"));
                            }
                        }
                    }
                    self.classes.insert(
                        iface.name.clone(),
                        ClassInfo {
                            extends: iface.extends.first().cloned(),
                            virtual_methods,
                        },
                    );
                }
                DeclKind::Enum(e) => {
                    self.enums.insert(e.name.clone());
                }
                DeclKind::TypeAlias(alias) => {
                    let resolved = self.mapper.map(&alias.ty, &mut self.sink);
                    self.aliases.insert(alias.name.clone(), resolved);
                }
                _ => {}
            }
        }
    }

    /// Resolve an optional type annotation to a target type. `None` and
    /// alias/enum references are handled here so every caller sees a final
    /// [`ResolvedType`].
    pub(crate) fn resolve_ty(&mut self, ty: Option<&TypeExpr>) -> ResolvedType {
        let Some(ty) = ty else {
            return ResolvedType::any();
        };
        if let TypeExpr::Name { name, args } = ty {
            if args.is_empty() {
                if let Some(alias) = self.aliases.get(name) {
                    return alias.clone();
                }
                if self.enums.contains(name) {
                    // `enum class` values have value semantics.
                    return ResolvedType::primitive(name.clone(), name.clone());
                }
            }
        }
        self.mapper.map(ty, &mut self.sink)
    }

    /// Ancestor chain of `class_name`, nearest base first.
    pub(crate) fn ancestors_of(&self, class_name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = self.classes.get(class_name).and_then(|c| c.extends.clone());
        while let Some(base) = cursor {
            if chain.contains(&base) {
                break; // inheritance cycle in malformed input
            }
            cursor = self.classes.get(&base).and_then(|c| c.extends.clone());
            chain.push(base);
        }
        chain
    }

    /// Whether some class in the base chain of `class_name` declares a
    /// virtual method `method`.
    pub(crate) fn base_declares_virtual(&self, class_name: &str, method: &str) -> bool {
        self.ancestors_of(class_name).iter().any(|base| {
            self.classes
                .get(base)
                .is_some_and(|info| info.virtual_methods.contains(method))
        })
    }

    // ── Binding scopes ───────────────────────────────────────────────────

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn bind(&mut self, name: &str, ownership: Ownership) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ownership);
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Ownership> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// The already-resolved ownership category a transformer pass stored in
    /// node metadata, if any. An `auto` surviving to this point is a defect
    /// in the resolution pass and aborts the unit.
    pub(crate) fn meta_ownership(
        &self,
        meta: &BTreeMap<String, serde_json::Value>,
        binding: &str,
    ) -> Result<Option<Ownership>, FatalError> {
        let Some(value) = meta.get("ownership").and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        match value {
            "shared" => Ok(Some(Ownership::Shared)),
            "unique" => Ok(Some(Ownership::Unique)),
            "weak" => Ok(Some(Ownership::Weak)),
            "raw" => Ok(Some(Ownership::Raw)),
            "value" => Ok(Some(Ownership::Value)),
            "auto" => Err(FatalError::UnresolvedAuto {
                binding: binding.to_string(),
            }),
            other => Err(FatalError::MalformedNode {
                construct: "ownership metadata".into(),
                detail: format!("unknown category `{other}` on `{binding}`"),
            }),
        }
    }

    /// A weak binding cannot keep its own allocation alive: `std::weak_ptr`
    /// has no raw-pointer constructor and would drop the object immediately
    /// anyway. Such bindings fall back to shared ownership. `report` is false
    /// on the second rendering pass over the same binding.
    pub(crate) fn allocation_ownership(
        &mut self,
        ownership: Ownership,
        init: Option<&Expr>,
        name: &str,
        span: Option<Span>,
        report: bool,
    ) -> Ownership {
        if ownership == Ownership::Weak
            && init.is_some_and(|i| matches!(i.kind(), ExprKind::New { .. }))
        {
            if report {
                self.sink.warning(
                    "W0005",
                    format!("weak binding `{name}` cannot own its allocation; using shared"),
                    span,
                );
            }
            return Ownership::Shared;
        }
        ownership
    }

    pub(crate) fn next_obj_temp(&mut self) -> String {
        let name = format!("obj_temp_{}", self.obj_temp);
        self.obj_temp += 1;
        name
    }
}

/// Class and interface names in declaration order, for the forward-declaration
/// block of the header.
fn forward_declarations(module: &Module) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut names = Vec::new();
    for decl in &module.decls {
        let name = match decl.kind() {
            DeclKind::Class(c) => &c.name,
            DeclKind::Interface(i) => &i.name,
            _ => continue,
        };
        if seen.insert(name.clone()) {
            names.push(name.clone());
        }
    }
    names
}
