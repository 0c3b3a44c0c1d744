//! Declaration rendering.
//!
//! Every declaration renders twice: a signature into the declaration unit and
//! a body into the definition unit. Classes partition their members into one
//! access block per level (public first); constructors pull a leading
//! `super(...)` call out of the body into the base-initializer list;
//! interfaces lower to abstract bases with pure-virtual members and a virtual
//! default destructor.

use tscpp_common::FatalError;
use tscpp_ir::{
    Access, AccessorKind, AccessorMember, ClassDecl, ClassMember, ConstructorMember, Decl,
    DeclKind, EnumDecl, Expr, ExprKind, FunctionDecl, InterfaceDecl, InterfaceMember,
    NamespaceDecl, Param, PropertyMember, Stmt, StmtKind, VarDecl,
};
use tscpp_types::{
    resolve_ownership, scan_ownership_annotation, DeclContext, Ownership, TypeExpr,
};

use crate::context::Ctx;
use crate::emitter::Emitter;
use crate::names;
use crate::Codegen;

const ACCESS_ORDER: [Access; 3] = [Access::Public, Access::Protected, Access::Private];

fn access_label(access: Access) -> &'static str {
    match access {
        Access::Public => "public:",
        Access::Protected => "protected:",
        Access::Private => "private:",
    }
}

impl Codegen {
    // ── Declaration unit ─────────────────────────────────────────────────

    pub(crate) fn gen_decl_header(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        decl: &Decl,
    ) -> Result<(), FatalError> {
        em.mark(decl.span, self.line_index.as_ref());
        if let Some(text) = self
            .decl_emitters
            .iter()
            .find_map(|plugin| plugin.emit_header(decl))
        {
            for line in text.lines() {
                em.line(ctx.indent, line);
            }
            return Ok(());
        }
        match decl.kind() {
            DeclKind::Var(var) => self.gen_var_header(em, ctx, decl, var),
            DeclKind::Function(func) => self.gen_function_header(em, ctx, func),
            DeclKind::Class(class) => self.gen_class_header(em, ctx, class),
            DeclKind::Interface(iface) => self.gen_interface_header(em, ctx, iface),
            DeclKind::Enum(decl) => self.gen_enum_header(em, ctx, decl),
            DeclKind::Namespace(ns) => self.gen_namespace(em, ctx, ns, true),
            DeclKind::TypeAlias(alias) => {
                let spelled = match self.aliases.get(&alias.name) {
                    Some(resolved) => self.mapper.embedded(resolved),
                    None => "js::any".to_string(),
                };
                em.line(
                    ctx.indent,
                    &format!("using {} = {spelled};", names::sanitize(&alias.name)),
                );
                Ok(())
            }
            DeclKind::Unsupported { construct } => {
                self.sink.warning(
                    "W0003",
                    format!("unsupported declaration `{construct}`; skipped"),
                    decl.span,
                );
                em.line(ctx.indent, &format!("/* unsupported: {construct} */"));
                Ok(())
            }
        }
    }

    fn gen_var_header(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        decl: &Decl,
        var: &VarDecl,
    ) -> Result<(), FatalError> {
        let resolved = self.resolve_binding_type(var);
        let ownership = match self.meta_ownership(&decl.meta, &var.name)? {
            Some(ownership) => ownership,
            None => resolve_ownership(
                &resolved,
                scan_ownership_annotation(&var.doc),
                &DeclContext::ModuleVar,
                decl.span,
                &mut self.sink,
            ),
        };
        let ownership =
            self.allocation_ownership(ownership, var.init.as_ref(), &var.name, decl.span, true);
        let name = names::sanitize(&var.name);
        self.bind(&name, ownership);
        let prefix = if var.is_const { "const " } else { "" };
        em.line(
            ctx.indent,
            &format!("extern {prefix}{} {name};", resolved.binding_target(ownership)),
        );
        Ok(())
    }

    fn gen_function_header(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        func: &FunctionDecl,
    ) -> Result<(), FatalError> {
        if !func.type_params.is_empty() {
            em.line(
                ctx.indent,
                &format!("template <typename {}>", func.type_params.join(", typename ")),
            );
        }
        let ret = self.return_spelling(func.ret.as_ref(), func.is_async);
        let params = self.render_params(&func.params, true)?;
        em.line(
            ctx.indent,
            &format!("{ret} {}({params});", names::sanitize(&func.name)),
        );
        Ok(())
    }

    fn gen_class_header(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        class: &ClassDecl,
    ) -> Result<(), FatalError> {
        let mut heading = format!("class {}", names::sanitize(&class.name));
        let mut bases: Vec<String> = Vec::new();
        if let Some(base) = &class.extends {
            bases.push(format!("public {}", names::sanitize(base)));
        }
        for iface in &class.implements {
            bases.push(format!("public {}", names::sanitize(iface)));
        }
        if !bases.is_empty() {
            heading.push_str(" : ");
            heading.push_str(&bases.join(", "));
        }
        heading.push_str(" {");
        em.line(ctx.indent, &heading);

        let previous_class = self.current_class.replace(class.name.clone());
        for access in ACCESS_ORDER {
            let members: Vec<&ClassMember> = class
                .members
                .iter()
                .filter(|m| m.access() == access)
                .collect();
            if members.is_empty() {
                continue;
            }
            em.line(ctx.indent, access_label(access));
            for member in members {
                self.gen_member_header(em, ctx.nested(), class, member)?;
            }
        }
        self.current_class = previous_class;
        em.line(ctx.indent, "};");
        Ok(())
    }

    fn gen_member_header(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        class: &ClassDecl,
        member: &ClassMember,
    ) -> Result<(), FatalError> {
        match member {
            ClassMember::Property(prop) => self.gen_property_header(em, ctx, class, prop),
            ClassMember::Method(method) => {
                let mut line = String::new();
                if method.is_static {
                    line.push_str("static ");
                }
                if (method.is_virtual || method.is_abstract) && !method.is_static {
                    line.push_str("virtual ");
                }
                let ret = self.return_spelling(method.ret.as_ref(), method.is_async);
                let params = self.render_params(&method.params, true)?;
                line.push_str(&format!(
                    "{ret} {}({params})",
                    names::sanitize(&method.name)
                ));
                if method.is_override {
                    if !self.base_declares_virtual(&class.name, &method.name) {
                        self.sink.warning(
                            "W0004",
                            format!(
                                "`{}::{}` is marked override but no base of `{}` declares a \
                                 virtual `{}`",
                                class.name, method.name, class.name, method.name
                            ),
                            None,
                        );
                    }
                    line.push_str(" override");
                }
                if method.is_abstract {
                    line.push_str(" = 0");
                }
                line.push(';');
                em.line(ctx.indent, &line);
                Ok(())
            }
            ClassMember::Constructor(ctor) => {
                let params = self.render_params(&ctor.params, true)?;
                em.line(
                    ctx.indent,
                    &format!("{}({params});", names::sanitize(&class.name)),
                );
                Ok(())
            }
            ClassMember::Accessor(accessor) => {
                let mut line = String::new();
                if accessor.is_static {
                    line.push_str("static ");
                }
                line.push_str(&self.accessor_signature(accessor)?);
                line.push(';');
                em.line(ctx.indent, &line);
                Ok(())
            }
        }
    }

    fn gen_property_header(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        class: &ClassDecl,
        prop: &PropertyMember,
    ) -> Result<(), FatalError> {
        let resolved = self.resolve_ty(prop.ty.as_ref());
        let ancestors = self.ancestors_of(&class.name);
        let context = DeclContext::Property {
            class_name: &class.name,
            property_name: &prop.name,
            ancestors: &ancestors,
        };
        let ownership = resolve_ownership(
            &resolved,
            scan_ownership_annotation(&prop.doc),
            &context,
            None,
            &mut self.sink,
        );
        let ownership =
            self.allocation_ownership(ownership, prop.init.as_ref(), &prop.name, None, true);
        let mut line = String::new();
        if prop.is_static {
            line.push_str("static ");
        }
        line.push_str(&resolved.binding_target(ownership));
        line.push(' ');
        line.push_str(&names::sanitize(&prop.name));
        // Non-static initializers live in the header; statics are defined in
        // the definition unit.
        if !prop.is_static {
            if let Some(init) = &prop.init {
                let rendered = self.render_initializer(ctx, init, &resolved, ownership)?;
                line.push_str(&format!(" = {rendered}"));
            }
        }
        line.push(';');
        em.line(ctx.indent, &line);
        Ok(())
    }

    fn gen_interface_header(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        iface: &InterfaceDecl,
    ) -> Result<(), FatalError> {
        let name = names::sanitize(&iface.name);
        let mut heading = format!("class {name}");
        if !iface.extends.is_empty() {
            let bases: Vec<String> = iface
                .extends
                .iter()
                .map(|base| format!("public {}", names::sanitize(base)))
                .collect();
            heading.push_str(" : ");
            heading.push_str(&bases.join(", "));
        }
        heading.push_str(" {");
        em.line(ctx.indent, &heading);
        em.line(ctx.indent, "public:");
        let inner = ctx.nested();
        em.line(inner.indent, &format!("virtual ~{name}() = default;"));
        for member in &iface.members {
            match member {
                InterfaceMember::Property { name, ty, optional } => {
                    let resolved = self.resolve_ty(ty.as_ref());
                    let mut spelled = self.mapper.embedded(&resolved);
                    if *optional && !spelled.starts_with("std::optional<") {
                        spelled = format!("std::optional<{spelled}>");
                    }
                    let prop = names::sanitize(name);
                    em.line(inner.indent, &format!("virtual {spelled} get_{prop}() = 0;"));
                    em.line(
                        inner.indent,
                        &format!("virtual void set_{prop}({spelled} value) = 0;"),
                    );
                }
                InterfaceMember::Method { name, params, ret } => {
                    let ret = self.return_spelling(ret.as_ref(), false);
                    let params = self.render_params(params, true)?;
                    em.line(
                        inner.indent,
                        &format!("virtual {ret} {}({params}) = 0;", names::sanitize(name)),
                    );
                }
            }
        }
        em.line(ctx.indent, "};");
        Ok(())
    }

    /// Numeric enums become `enum class`; an enum with any non-numeric
    /// initializer becomes a namespace of string constants, which loses
    /// exhaustiveness checking in the target.
    fn gen_enum_header(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        decl: &EnumDecl,
    ) -> Result<(), FatalError> {
        let numeric = decl.members.iter().all(|m| {
            m.init
                .as_ref()
                .map(|init| matches!(init.kind(), ExprKind::NumberLit(_)))
                .unwrap_or(true)
        });
        let name = names::sanitize(&decl.name);

        if numeric {
            em.line(ctx.indent, &format!("enum class {name} {{"));
            let inner = ctx.nested();
            let mut next = 0i64;
            for (i, member) in decl.members.iter().enumerate() {
                if let Some(init) = &member.init {
                    if let ExprKind::NumberLit(value) = init.kind() {
                        next = *value as i64;
                    }
                }
                let comma = if i + 1 == decl.members.len() { "" } else { "," };
                em.line(
                    inner.indent,
                    &format!("{} = {next}{comma}", names::sanitize(&member.name)),
                );
                next += 1;
            }
            em.line(ctx.indent, "};");
        } else {
            self.sink.warning(
                "W0007",
                format!(
                    "string-valued enum `{}` lowered to a namespace of constants",
                    decl.name
                ),
                None,
            );
            em.line(ctx.indent, &format!("namespace {name} {{"));
            let inner = ctx.nested();
            for member in &decl.members {
                let value = match &member.init {
                    Some(init) => self.gen_expr(inner, init)?,
                    None => crate::exprgen::string_literal(&member.name),
                };
                em.line(
                    inner.indent,
                    &format!("const js::string {} = {value};", names::sanitize(&member.name)),
                );
            }
            em.line(ctx.indent, "}");
        }
        Ok(())
    }

    fn gen_namespace(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        ns: &NamespaceDecl,
        header: bool,
    ) -> Result<(), FatalError> {
        em.line(ctx.indent, &format!("namespace {} {{", names::sanitize(&ns.name)));
        for decl in &ns.decls {
            if header {
                self.gen_decl_header(em, ctx.nested(), decl)?;
            } else {
                self.gen_decl_source(em, ctx.nested(), decl)?;
            }
        }
        em.line(ctx.indent, "}");
        Ok(())
    }

    // ── Definition unit ──────────────────────────────────────────────────

    pub(crate) fn gen_decl_source(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        decl: &Decl,
    ) -> Result<(), FatalError> {
        em.mark(decl.span, self.line_index.as_ref());
        if let Some(text) = self
            .decl_emitters
            .iter()
            .find_map(|plugin| plugin.emit_source(decl))
        {
            for line in text.lines() {
                em.line(ctx.indent, line);
            }
            return Ok(());
        }
        match decl.kind() {
            DeclKind::Var(var) => {
                let name = names::sanitize(&var.name);
                // Ownership was decided during the declaration pass and is
                // still bound in the module scope.
                let ownership = self.lookup(&name).unwrap_or(Ownership::Shared);
                let resolved = self.resolve_binding_type(var);
                let prefix = if var.is_const { "const " } else { "" };
                let spelled = resolved.binding_target(ownership);
                match &var.init {
                    Some(init) => {
                        let rendered = self.render_initializer(ctx, init, &resolved, ownership)?;
                        em.line(ctx.indent, &format!("{prefix}{spelled} {name} = {rendered};"));
                    }
                    None => em.line(ctx.indent, &format!("{prefix}{spelled} {name};")),
                }
                Ok(())
            }
            DeclKind::Function(func) => {
                let Some(body) = &func.body else {
                    return Ok(()); // ambient, declaration only
                };
                let ret = self.return_spelling(func.ret.as_ref(), func.is_async);
                let params = self.render_params(&func.params, false)?;
                em.line(
                    ctx.indent,
                    &format!("{ret} {}({params}) {{", names::sanitize(&func.name)),
                );
                self.gen_function_body(em, ctx, &func.params, body, func.is_async)?;
                em.line(ctx.indent, "}");
                Ok(())
            }
            DeclKind::Class(class) => self.gen_class_source(em, ctx, class),
            DeclKind::Namespace(ns) => self.gen_namespace(em, ctx, ns, false),
            DeclKind::Interface(_)
            | DeclKind::Enum(_)
            | DeclKind::TypeAlias(_)
            | DeclKind::Unsupported { .. } => Ok(()),
        }
    }

    fn gen_function_body(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        params: &[Param],
        body: &[Stmt],
        is_async: bool,
    ) -> Result<(), FatalError> {
        self.push_scope();
        self.bind_params(params);
        let was_async = self.in_async;
        self.in_async = is_async;
        for stmt in body {
            self.gen_stmt(em, ctx.nested(), stmt)?;
        }
        self.in_async = was_async;
        self.pop_scope();
        Ok(())
    }

    fn gen_class_source(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        class: &ClassDecl,
    ) -> Result<(), FatalError> {
        let previous_class = self.current_class.replace(class.name.clone());
        let class_name = names::sanitize(&class.name);
        let mut first = true;
        let mut sep = |em: &mut Emitter, first: &mut bool| {
            if !*first {
                em.blank();
            }
            *first = false;
        };

        for member in &class.members {
            match member {
                ClassMember::Property(prop) if prop.is_static => {
                    let resolved = self.resolve_ty(prop.ty.as_ref());
                    let ancestors = self.ancestors_of(&class.name);
                    let context = DeclContext::Property {
                        class_name: &class.name,
                        property_name: &prop.name,
                        ancestors: &ancestors,
                    };
                    let ownership = resolve_ownership(
                        &resolved,
                        scan_ownership_annotation(&prop.doc),
                        &context,
                        None,
                        &mut self.sink,
                    );
                    let ownership = self.allocation_ownership(
                        ownership,
                        prop.init.as_ref(),
                        &prop.name,
                        None,
                        false,
                    );
                    sep(em, &mut first);
                    let spelled = resolved.binding_target(ownership);
                    let name = names::sanitize(&prop.name);
                    match &prop.init {
                        Some(init) => {
                            let rendered =
                                self.render_initializer(ctx, init, &resolved, ownership)?;
                            em.line(
                                ctx.indent,
                                &format!("{spelled} {class_name}::{name} = {rendered};"),
                            );
                        }
                        None => {
                            em.line(ctx.indent, &format!("{spelled} {class_name}::{name};"));
                        }
                    }
                }
                ClassMember::Property(_) => {}
                ClassMember::Constructor(ctor) => {
                    sep(em, &mut first);
                    self.gen_constructor_source(em, ctx, class, &class_name, ctor)?;
                }
                ClassMember::Method(method) => {
                    let Some(body) = &method.body else { continue };
                    if method.is_abstract {
                        continue;
                    }
                    sep(em, &mut first);
                    let ret = self.return_spelling(method.ret.as_ref(), method.is_async);
                    let params = self.render_params(&method.params, false)?;
                    em.line(
                        ctx.indent,
                        &format!(
                            "{ret} {class_name}::{}({params}) {{",
                            names::sanitize(&method.name)
                        ),
                    );
                    self.gen_function_body(em, ctx, &method.params, body, method.is_async)?;
                    em.line(ctx.indent, "}");
                }
                ClassMember::Accessor(accessor) => {
                    sep(em, &mut first);
                    let signature = self.accessor_signature(accessor)?;
                    // Qualify the member name inside the rendered signature.
                    let qualified = signature.replacen(
                        &format!(" {}", accessor_name(accessor)),
                        &format!(" {class_name}::{}", accessor_name(accessor)),
                        1,
                    );
                    em.line(ctx.indent, &format!("{qualified} {{"));
                    let params: Vec<Param> = accessor.param.clone().into_iter().collect();
                    self.gen_function_body(em, ctx, &params, &accessor.body, false)?;
                    em.line(ctx.indent, "}");
                }
            }
        }

        self.current_class = previous_class;
        Ok(())
    }

    /// A leading `super(...)` call becomes the base-initializer; the rest of
    /// the body renders normally.
    fn gen_constructor_source(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        class: &ClassDecl,
        class_name: &str,
        ctor: &ConstructorMember,
    ) -> Result<(), FatalError> {
        let params = self.render_params(&ctor.params, false)?;
        let (base_init, body) = split_super_call(&ctor.body);

        let mut heading = format!("{class_name}::{class_name}({params})");
        if let Some(args) = base_init {
            let base = class.extends.as_deref().ok_or_else(|| FatalError::MalformedNode {
                construct: "constructor".into(),
                detail: format!("`super(...)` in `{}` which has no base class", class.name),
            })?;
            self.push_scope();
            self.bind_params(&ctor.params);
            let args = self.gen_args(ctx, args)?;
            self.pop_scope();
            heading.push_str(&format!(" : {}({args})", names::sanitize(base)));
        }
        heading.push_str(" {");
        em.line(ctx.indent, &heading);

        self.push_scope();
        self.bind_params(&ctor.params);
        for stmt in body {
            self.gen_stmt(em, ctx.nested(), stmt)?;
        }
        self.pop_scope();
        em.line(ctx.indent, "}");
        Ok(())
    }

    // ── Shared helpers ───────────────────────────────────────────────────

    /// Render a parameter list. Defaults are spelled only in the declaration
    /// unit; a rest parameter must come last and is received as an array.
    pub(crate) fn render_params(
        &mut self,
        params: &[Param],
        with_defaults: bool,
    ) -> Result<String, FatalError> {
        let mut rendered = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            if param.rest && i + 1 != params.len() {
                return Err(FatalError::MalformedNode {
                    construct: "parameter list".into(),
                    detail: format!("rest parameter `{}` is not last", param.name),
                });
            }
            let spelled = self.param_spelling(param);
            let mut piece = format!("{spelled} {}", names::sanitize(&param.name));
            if with_defaults {
                if let Some(default) = &param.default {
                    let value = self.gen_expr(Ctx::declaration(), default)?;
                    piece.push_str(&format!(" = {value}"));
                }
            }
            rendered.push(piece);
        }
        Ok(rendered.join(", "))
    }

    fn param_spelling(&mut self, param: &Param) -> String {
        let resolved = self.resolve_ty(param.ty.as_ref());
        if param.rest {
            // Rest parameters arrive as an array of the element type; an
            // annotation that is already an array is taken as that array.
            if resolved.flags.is_array {
                return resolved.target;
            }
            return format!("js::array<{}>", self.mapper.embedded(&resolved));
        }
        let ownership = resolve_ownership(
            &resolved,
            scan_ownership_annotation(&param.doc),
            &DeclContext::Param,
            None,
            &mut self.sink,
        );
        resolved.binding_target(ownership)
    }

    /// Bind parameter names in the current scope so member access inside the
    /// body picks the right join token.
    pub(crate) fn bind_params(&mut self, params: &[Param]) {
        for param in params {
            let resolved = self.resolve_ty(param.ty.as_ref());
            let ownership = if param.rest {
                Ownership::Value
            } else {
                resolve_ownership(
                    &resolved,
                    scan_ownership_annotation(&param.doc),
                    &DeclContext::Param,
                    None,
                    &mut self.sink,
                )
            };
            self.bind(&names::sanitize(&param.name), ownership);
        }
    }

    /// The return-type spelling. Async callables return a promise handle
    /// regardless of the annotated type.
    pub(crate) fn return_spelling(&mut self, ret: Option<&TypeExpr>, is_async: bool) -> String {
        if is_async {
            let inner = match ret {
                Some(TypeExpr::Name { name, args }) if name == "Promise" && args.len() == 1 => {
                    let resolved = self.resolve_ty(Some(&args[0]));
                    self.mapper.embedded(&resolved)
                }
                Some(other) => {
                    let resolved = self.resolve_ty(Some(other));
                    self.mapper.embedded(&resolved)
                }
                None => "void".to_string(),
            };
            return format!("std::shared_ptr<js::Promise<{inner}>>", inner = inner);
        }
        match ret {
            Some(ty) => {
                let resolved = self.resolve_ty(Some(ty));
                if resolved.flags.needs_heap_allocation {
                    let ownership = resolved.ownership_hint.unwrap_or(Ownership::Shared);
                    resolved.binding_target(ownership)
                } else {
                    resolved.target
                }
            }
            None => "void".to_string(),
        }
    }

    fn accessor_signature(&mut self, accessor: &AccessorMember) -> Result<String, FatalError> {
        match accessor.kind {
            AccessorKind::Getter => {
                let ret = self.return_spelling(accessor.ret.as_ref(), false);
                Ok(format!("{ret} {}()", accessor_name(accessor)))
            }
            AccessorKind::Setter => {
                let params: Vec<Param> = accessor.param.clone().into_iter().collect();
                let params = self.render_params(&params, false)?;
                Ok(format!("void {}({params})", accessor_name(accessor)))
            }
        }
    }
}

fn accessor_name(accessor: &AccessorMember) -> String {
    let prefix = match accessor.kind {
        AccessorKind::Getter => "get",
        AccessorKind::Setter => "set",
    };
    format!("{prefix}_{}", names::sanitize(&accessor.name))
}

/// If the constructor body starts with a `super(...)` call, split it off.
fn split_super_call(body: &[Stmt]) -> (Option<&[Expr]>, &[Stmt]) {
    if let Some(first) = body.first() {
        if let StmtKind::Expr(expr) = first.kind() {
            if let ExprKind::Call { callee, args } = expr.kind() {
                if matches!(callee.kind(), ExprKind::Super) {
                    return (Some(args.as_slice()), &body[1..]);
                }
            }
        }
    }
    (None, body)
}
