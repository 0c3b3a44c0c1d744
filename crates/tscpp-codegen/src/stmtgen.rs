//! Statement rendering.

use tscpp_common::FatalError;
use tscpp_ir::{ExprKind, Stmt, StmtKind, SwitchCase, VarDecl};
use tscpp_types::{
    resolve_ownership, scan_ownership_annotation, DeclContext, Ownership, ResolvedType, TypeExpr,
};

use crate::context::Ctx;
use crate::emitter::Emitter;
use crate::names;
use crate::Codegen;

impl Codegen {
    pub(crate) fn gen_stmt(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        stmt: &Stmt,
    ) -> Result<(), FatalError> {
        em.mark(stmt.span, self.line_index.as_ref());
        match stmt.kind() {
            StmtKind::Block(stmts) => {
                em.line(ctx.indent, "{");
                self.push_scope();
                for inner in stmts {
                    self.gen_stmt(em, ctx.nested(), inner)?;
                }
                self.pop_scope();
                em.line(ctx.indent, "}");
            }
            StmtKind::VarDecl(var) => {
                let meta = self.meta_ownership(&stmt.meta, &var.name)?;
                let rendered = self.render_local_var(ctx, var, meta)?;
                em.line(ctx.indent, &format!("{rendered};"));
            }
            StmtKind::Expr(expr) => {
                let rendered = self.gen_expr(ctx, expr)?;
                em.line(ctx.indent, &format!("{rendered};"));
            }
            StmtKind::If { cond, then, otherwise } => {
                let cond = self.gen_expr(ctx, cond)?;
                em.write(ctx.indent, &format!("if ({cond}) "));
                self.gen_braced(em, ctx, then)?;
                let mut tail = otherwise;
                while let Some(stmt) = tail {
                    match stmt.kind() {
                        StmtKind::If { cond, then, otherwise } => {
                            let cond = self.gen_expr(ctx, cond)?;
                            em.write(ctx.indent, &format!("else if ({cond}) "));
                            self.gen_braced(em, ctx, then)?;
                            tail = otherwise;
                        }
                        _ => {
                            em.write(ctx.indent, "else ");
                            self.gen_braced(em, ctx, stmt)?;
                            break;
                        }
                    }
                }
            }
            StmtKind::Switch { disc, cases } => self.gen_switch(em, ctx, disc, cases)?,
            StmtKind::While { cond, body } => {
                let cond = self.gen_expr(ctx, cond)?;
                em.write(ctx.indent, &format!("while ({cond}) "));
                self.gen_braced(em, ctx, body)?;
            }
            StmtKind::For { init, cond, update, body } => {
                let init = match init {
                    Some(init) => self.render_for_init(ctx, init)?,
                    None => String::new(),
                };
                let cond = match cond {
                    Some(cond) => self.gen_expr(ctx, cond)?,
                    None => String::new(),
                };
                let update = match update {
                    Some(update) => self.gen_expr(ctx, update)?,
                    None => String::new(),
                };
                em.write(ctx.indent, &format!("for ({init}; {cond}; {update}) "));
                self.gen_braced(em, ctx, body)?;
            }
            StmtKind::ForIn { binding, object, body } => {
                let object = self.gen_expr(ctx, object)?;
                let binding = names::sanitize(binding);
                em.write(
                    ctx.indent,
                    &format!("for (const auto& {binding} : js::keys({object})) "),
                );
                self.push_scope();
                self.bind(&binding, Ownership::Value);
                self.gen_braced(em, ctx, body)?;
                self.pop_scope();
            }
            StmtKind::ForOf { binding, iterable, body } => {
                let iterable = self.gen_expr(ctx, iterable)?;
                let binding = names::sanitize(binding);
                em.write(ctx.indent, &format!("for (const auto& {binding} : {iterable}) "));
                self.push_scope();
                self.bind(&binding, Ownership::Value);
                self.gen_braced(em, ctx, body)?;
                self.pop_scope();
            }
            StmtKind::Return(value) => {
                let keyword = if self.in_async { "co_return" } else { "return" };
                match value {
                    Some(value) => {
                        let rendered = self.gen_expr(ctx, value)?;
                        em.line(ctx.indent, &format!("{keyword} {rendered};"));
                    }
                    None => em.line(ctx.indent, &format!("{keyword};")),
                }
            }
            StmtKind::Break => em.line(ctx.indent, "break;"),
            StmtKind::Continue => em.line(ctx.indent, "continue;"),
            StmtKind::Try { block, catch, finally } => {
                self.gen_try(em, ctx, stmt, block, catch.as_ref(), finally.as_deref())?;
            }
            StmtKind::Throw(expr) => {
                let rendered = self.gen_expr(ctx, expr)?;
                em.line(ctx.indent, &format!("throw js::any({rendered});"));
            }
            StmtKind::Empty => em.line(ctx.indent, ";"),
            StmtKind::Unsupported { construct } => {
                self.sink.warning(
                    "W0003",
                    format!("unsupported statement `{construct}`; emitting a placeholder"),
                    stmt.span,
                );
                em.line(ctx.indent, &format!("/* unsupported: {construct} */;"));
            }
        }
        Ok(())
    }

    /// Render `stmt` as a braced body following a control-flow head that has
    /// already been written (without its newline).
    fn gen_braced(&mut self, em: &mut Emitter, ctx: Ctx, stmt: &Stmt) -> Result<(), FatalError> {
        em.line(ctx.indent, "{");
        self.push_scope();
        match stmt.kind() {
            StmtKind::Block(stmts) => {
                for inner in stmts {
                    self.gen_stmt(em, ctx.nested(), inner)?;
                }
            }
            _ => self.gen_stmt(em, ctx.nested(), stmt)?,
        }
        self.pop_scope();
        em.line(ctx.indent, "}");
        Ok(())
    }

    /// A local binding, rendered without the trailing semicolon so the same
    /// path serves both declaration statements and for-loop initializers.
    pub(crate) fn render_local_var(
        &mut self,
        ctx: Ctx,
        var: &VarDecl,
        meta_ownership: Option<Ownership>,
    ) -> Result<String, FatalError> {
        if var.name.is_empty() {
            return Err(FatalError::MalformedNode {
                construct: "variable declaration".into(),
                detail: "empty binding name".into(),
            });
        }

        let resolved = self.resolve_binding_type(var);
        let ownership = match meta_ownership {
            Some(ownership) => ownership,
            None => {
                let annotation = scan_ownership_annotation(&var.doc);
                resolve_ownership(&resolved, annotation, &DeclContext::Local, None, &mut self.sink)
            }
        };
        let ownership =
            self.allocation_ownership(ownership, var.init.as_ref(), &var.name, None, true);
        let name = names::sanitize(&var.name);
        self.bind(&name, ownership);

        let spelled = resolved.binding_target(ownership);
        let prefix = if var.is_const { "const " } else { "" };
        match &var.init {
            Some(init) => {
                let rendered = self.render_initializer(ctx, init, &resolved, ownership)?;
                Ok(format!("{prefix}{spelled} {name} = {rendered}"))
            }
            None => Ok(format!("{prefix}{spelled} {name}")),
        }
    }

    /// The binding type: the annotation when present, otherwise inferred from
    /// an allocation initializer, otherwise the dynamic type.
    pub(crate) fn resolve_binding_type(&mut self, var: &VarDecl) -> ResolvedType {
        if var.ty.is_some() {
            return self.resolve_ty(var.ty.as_ref());
        }
        if let Some(init) = &var.init {
            if let ExprKind::New { callee, .. } = init.kind() {
                if !callee.is_empty() {
                    let resolved =
                        self.resolve_ty(Some(&TypeExpr::name(callee.clone())));
                    if !resolved.flags.needs_heap_allocation {
                        return resolved;
                    }
                    return ResolvedType::object(callee.clone(), names::sanitize(callee));
                }
            }
        }
        ResolvedType::any()
    }

    /// Render an initializer under the binding's resolved type and ownership:
    /// allocations use the matching make-function, array literals pick up the
    /// annotated element type.
    pub(crate) fn render_initializer(
        &mut self,
        ctx: Ctx,
        init: &tscpp_ir::Expr,
        resolved: &ResolvedType,
        ownership: Ownership,
    ) -> Result<String, FatalError> {
        match init.kind() {
            ExprKind::New { callee, args } => {
                self.gen_new(ctx, init, callee, args, ownership)
            }
            ExprKind::ArrayLit(_) if resolved.flags.is_array => {
                let elem = resolved.type_args.first().map(|t| self.mapper.embedded(t));
                self.gen_expr_with(ctx, init, elem.as_deref())
            }
            _ => self.gen_expr(ctx, init),
        }
    }

    fn render_for_init(&mut self, ctx: Ctx, init: &Stmt) -> Result<String, FatalError> {
        match init.kind() {
            StmtKind::VarDecl(var) => {
                let meta = self.meta_ownership(&init.meta, &var.name)?;
                self.render_local_var(ctx, var, meta)
            }
            StmtKind::Expr(expr) => self.gen_expr(ctx, expr),
            _ => Err(FatalError::MalformedNode {
                construct: "for initializer".into(),
                detail: "expected a variable declaration or expression".into(),
            }),
        }
    }

    /// Switches over integral literals render as real switches; anything else
    /// lowers to an if/else chain over a once-evaluated discriminant, since
    /// the target cannot switch over runtime values.
    fn gen_switch(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        disc: &tscpp_ir::Expr,
        cases: &[SwitchCase],
    ) -> Result<(), FatalError> {
        let integral = cases.iter().all(|case| match &case.test {
            Some(test) => {
                matches!(test.kind(), ExprKind::NumberLit(n) if n.fract() == 0.0)
            }
            None => true,
        });

        if integral {
            let disc = self.gen_expr(ctx, disc)?;
            em.line(ctx.indent, &format!("switch (static_cast<int>({disc})) {{"));
            for case in cases {
                match &case.test {
                    Some(test) => {
                        if let ExprKind::NumberLit(n) = test.kind() {
                            em.line(ctx.nested().indent, &format!("case {}: {{", *n as i64));
                        }
                    }
                    None => em.line(ctx.nested().indent, "default: {"),
                }
                self.push_scope();
                for stmt in &case.body {
                    self.gen_stmt(em, ctx.nested().nested(), stmt)?;
                }
                self.pop_scope();
                em.line(ctx.nested().indent, "}");
            }
            em.line(ctx.indent, "}");
            return Ok(());
        }

        let disc_rendered = self.gen_expr(ctx, disc)?;
        let temp = self.next_obj_temp();
        em.line(ctx.indent, "{");
        let inner = ctx.nested();
        em.line(inner.indent, &format!("const auto {temp} = {disc_rendered};"));
        let mut first = true;
        let mut default_case = None;
        for case in cases {
            let Some(test) = &case.test else {
                default_case = Some(case);
                continue;
            };
            let test = self.gen_expr(inner, test)?;
            let keyword = if first { "if" } else { "else if" };
            first = false;
            em.line(inner.indent, &format!("{keyword} ({temp} == {test}) {{"));
            self.push_scope();
            for stmt in &case.body {
                if matches!(stmt.kind(), StmtKind::Break) {
                    continue; // arm boundaries replace breaks
                }
                self.gen_stmt(em, inner.nested(), stmt)?;
            }
            self.pop_scope();
            em.line(inner.indent, "}");
        }
        if let Some(case) = default_case {
            em.line(inner.indent, if first { "{" } else { "else {" });
            self.push_scope();
            for stmt in &case.body {
                if matches!(stmt.kind(), StmtKind::Break) {
                    continue;
                }
                self.gen_stmt(em, inner.nested(), stmt)?;
            }
            self.pop_scope();
            em.line(inner.indent, "}");
        }
        em.line(ctx.indent, "}");
        Ok(())
    }

    /// `finally` has no direct equivalent; its statements are duplicated at
    /// the end of the protected block and of every handler, which diverges
    /// from source semantics when the protected block returns early.
    fn gen_try(
        &mut self,
        em: &mut Emitter,
        ctx: Ctx,
        stmt: &Stmt,
        block: &[Stmt],
        catch: Option<&tscpp_ir::CatchClause>,
        finally: Option<&[Stmt]>,
    ) -> Result<(), FatalError> {
        if finally.is_some() {
            self.sink.warning(
                "W0006",
                "`finally` is approximated by duplicating its statements; \
                 early returns in the protected block bypass it",
                stmt.span,
            );
        }

        em.line(ctx.indent, "try {");
        self.push_scope();
        for inner in block {
            self.gen_stmt(em, ctx.nested(), inner)?;
        }
        if let Some(finally) = finally {
            for inner in finally {
                self.gen_stmt(em, ctx.nested(), inner)?;
            }
        }
        self.pop_scope();

        match catch {
            Some(clause) => {
                let param = clause
                    .param
                    .as_deref()
                    .map(names::sanitize)
                    .unwrap_or_else(|| "_err".to_string());
                em.line(ctx.indent, &format!("}} catch (const js::any& {param}) {{"));
                self.push_scope();
                self.bind(&param, Ownership::Value);
                for inner in &clause.body {
                    self.gen_stmt(em, ctx.nested(), inner)?;
                }
                if let Some(finally) = finally {
                    for inner in finally {
                        self.gen_stmt(em, ctx.nested(), inner)?;
                    }
                }
                self.pop_scope();
                em.line(ctx.indent, "}");
            }
            None => {
                if let Some(finally) = finally {
                    em.line(ctx.indent, "} catch (...) {");
                    self.push_scope();
                    for inner in finally {
                        self.gen_stmt(em, ctx.nested(), inner)?;
                    }
                    self.pop_scope();
                    em.line(ctx.nested().indent, "throw;");
                    em.line(ctx.indent, "}");
                } else {
                    em.line(ctx.indent, "} catch (...) {");
                    em.line(ctx.indent, "}");
                }
            }
        }
        Ok(())
    }

    /// Top-level statements collect into the synthesized entry point.
    pub(crate) fn gen_entry_point(
        &mut self,
        em: &mut Emitter,
        stmts: &[Stmt],
    ) -> Result<(), FatalError> {
        em.line(0, "// Entry point");
        em.line(0, "void Main() {");
        self.push_scope();
        let ctx = Ctx::definition().nested();
        for stmt in stmts {
            self.gen_stmt(em, ctx, stmt)?;
        }
        self.pop_scope();
        em.line(0, "}");
        em.blank();
        em.line(0, "int main(int /*argc*/, char** /*argv*/) {");
        em.line(1, "Main();");
        em.line(1, "return 0;");
        em.line(0, "}");
        Ok(())
    }
}
