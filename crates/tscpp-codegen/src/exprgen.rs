//! Expression rendering.
//!
//! Expressions render to strings; multi-line constructs (object-literal
//! wrappers, lambdas) indent their continuation lines to the statement
//! context they appear in. Operator rewrites happen here: strict equality
//! becomes ordinary value equality, exponentiation becomes a power-function
//! call, nullish coalescing becomes a has-value conditional, and the
//! dynamic operators (`typeof`, `in`, `instanceof`, `delete`) become runtime
//! calls.

use tscpp_common::FatalError;
use tscpp_ir::{
    AssignOp, BinaryOp, Expr, ExprKind, ObjectProp, Param, Stmt, TemplatePart, UnaryOp, UpdateOp,
};
use tscpp_types::{Ownership, TypeExpr};

use crate::context::Ctx;
use crate::emitter::Emitter;
use crate::names;
use crate::Codegen;

impl Codegen {
    pub(crate) fn gen_expr(&mut self, ctx: Ctx, expr: &Expr) -> Result<String, FatalError> {
        self.gen_expr_with(ctx, expr, None)
    }

    /// Render an expression. `expected` carries the element spelling an
    /// enclosing annotated binding provides, so array literals can be typed
    /// tighter than `js::any`.
    pub(crate) fn gen_expr_with(
        &mut self,
        ctx: Ctx,
        expr: &Expr,
        expected: Option<&str>,
    ) -> Result<String, FatalError> {
        match expr.kind() {
            ExprKind::Ident(name) => Ok(self.render_ident(name)),
            ExprKind::NumberLit(value) => Ok(number_literal(*value)),
            ExprKind::StringLit(value) => Ok(string_literal(value)),
            ExprKind::BoolLit(value) => Ok(if *value { "true" } else { "false" }.to_string()),
            ExprKind::NullLit => Ok("js::null".to_string()),
            ExprKind::UndefinedLit => Ok("js::undefined".to_string()),
            ExprKind::This => Ok("this".to_string()),
            ExprKind::Super => self.render_super(expr),
            ExprKind::ArrayLit(elems) => self.gen_array_lit(ctx, expr, elems, expected),
            ExprKind::ObjectLit(props) => self.gen_object_lit(ctx, expr, props),
            ExprKind::FunctionLit { params, ret, body, .. } => {
                self.gen_lambda(ctx, params, ret.as_ref(), body)
            }
            ExprKind::Member { object, property } => {
                let (base, join) = self.member_base(ctx, object)?;
                Ok(format!("{base}{join}{}", names::sanitize(property)))
            }
            ExprKind::Index { object, index } => {
                let obj = self.gen_expr(ctx, object)?;
                let idx = self.gen_expr(ctx, index)?;
                Ok(format!("{obj}[{idx}]"))
            }
            ExprKind::Call { callee, args } => {
                let callee = self.gen_expr(ctx, callee)?;
                let args = self.gen_args(ctx, args)?;
                Ok(format!("{callee}({args})"))
            }
            ExprKind::New { callee, args } => {
                self.gen_new(ctx, expr, callee, args, Ownership::Shared)
            }
            ExprKind::Unary { op, operand } => {
                let inner = self.gen_expr(ctx, operand)?;
                Ok(match op {
                    UnaryOp::Neg => format!("(-{inner})"),
                    UnaryOp::Plus => format!("(+{inner})"),
                    UnaryOp::Not => format!("(!{inner})"),
                    UnaryOp::BitNot => format!("(~{inner})"),
                    UnaryOp::TypeOf => format!("js::typeof_op({inner})"),
                    UnaryOp::Delete => format!("js::delete_op({inner})"),
                    UnaryOp::Void => format!("js::void_op({inner})"),
                })
            }
            ExprKind::Update { op, prefix, operand } => {
                let inner = self.gen_expr(ctx, operand)?;
                let token = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                Ok(if *prefix {
                    format!("({token}{inner})")
                } else {
                    format!("({inner}{token})")
                })
            }
            ExprKind::Binary { op, left, right } => self.gen_binary(ctx, *op, left, right),
            ExprKind::Conditional { cond, then, otherwise } => {
                let c = self.gen_expr(ctx, cond)?;
                let t = self.gen_expr(ctx, then)?;
                let o = self.gen_expr(ctx, otherwise)?;
                Ok(format!("({c} ? {t} : {o})"))
            }
            ExprKind::Assign { op, target, value } => {
                let t = self.gen_expr(ctx, target)?;
                let v = self.gen_expr(ctx, value)?;
                let token = match op {
                    AssignOp::Assign => "=",
                    AssignOp::AddAssign => "+=",
                    AssignOp::SubAssign => "-=",
                    AssignOp::MulAssign => "*=",
                    AssignOp::DivAssign => "/=",
                    AssignOp::ModAssign => "%=",
                };
                Ok(format!("{t} {token} {v}"))
            }
            ExprKind::Template(parts) => self.gen_template(ctx, parts),
            ExprKind::Await(inner) => {
                let inner = self.gen_expr(ctx, inner)?;
                Ok(format!("(co_await {inner})"))
            }
            ExprKind::Yield(inner) => match inner {
                Some(inner) => {
                    let inner = self.gen_expr(ctx, inner)?;
                    Ok(format!("(co_yield {inner})"))
                }
                None => Ok("(co_yield js::undefined)".to_string()),
            },
            ExprKind::Spread(inner) => {
                self.sink.warning(
                    "W0003",
                    "spread is not supported; passing the inner expression through",
                    expr.span,
                );
                let inner = self.gen_expr(ctx, inner)?;
                Ok(format!("{inner} /* spread */"))
            }
            ExprKind::Unsupported { construct } => {
                self.sink.warning(
                    "W0003",
                    format!("unsupported construct `{construct}`; emitting a placeholder"),
                    expr.span,
                );
                Ok(format!("js::any() /* {construct} */"))
            }
        }
    }

    fn render_ident(&self, name: &str) -> String {
        if let Some(global) = names::global(name) {
            return global.to_string();
        }
        names::sanitize(name)
    }

    fn render_super(&self, expr: &Expr) -> Result<String, FatalError> {
        let base = self
            .current_class
            .as_deref()
            .and_then(|class| self.classes.get(class))
            .and_then(|info| info.extends.clone());
        base.ok_or_else(|| FatalError::MalformedNode {
            construct: "super".into(),
            detail: match expr.span {
                Some(span) => format!("no base class in scope at {}..{}", span.start, span.end),
                None => "no base class in scope".into(),
            },
        })
    }

    /// Render the base of a member access together with the joining token.
    /// Heap bindings join with `->`, weak bindings are upgraded first, value
    /// bindings and unknown expressions join with `.`.
    fn member_base(&mut self, ctx: Ctx, object: &Expr) -> Result<(String, &'static str), FatalError> {
        match object.kind() {
            ExprKind::This => Ok(("this".to_string(), "->")),
            ExprKind::Super => Ok((self.render_super(object)?, "::")),
            ExprKind::Ident(name) => {
                if let Some(global) = names::global(name) {
                    return Ok((global.to_string(), "."));
                }
                let rendered = names::sanitize(name);
                match self.lookup(name) {
                    Some(Ownership::Shared) | Some(Ownership::Unique) | Some(Ownership::Raw) => {
                        Ok((rendered, "->"))
                    }
                    Some(Ownership::Weak) => Ok((format!("{rendered}.lock()"), "->")),
                    _ => Ok((rendered, ".")),
                }
            }
            ExprKind::New { .. } => Ok((self.gen_expr(ctx, object)?, "->")),
            _ => Ok((self.gen_expr(ctx, object)?, ".")),
        }
    }

    pub(crate) fn gen_args(&mut self, ctx: Ctx, args: &[Expr]) -> Result<String, FatalError> {
        let mut rendered = Vec::with_capacity(args.len());
        for arg in args {
            rendered.push(self.gen_expr(ctx, arg)?);
        }
        Ok(rendered.join(", "))
    }

    /// Render an allocation under the given ownership category. The binding
    /// context passes `Unique` for `@unique` bindings; bare expression
    /// positions default to shared.
    pub(crate) fn gen_new(
        &mut self,
        ctx: Ctx,
        expr: &Expr,
        callee: &str,
        args: &[Expr],
        ownership: Ownership,
    ) -> Result<String, FatalError> {
        if callee.is_empty() {
            return Err(FatalError::MalformedNode {
                construct: "new".into(),
                detail: match expr.span {
                    Some(span) => format!("empty class name at {}..{}", span.start, span.end),
                    None => "empty class name".into(),
                },
            });
        }
        let args = self.gen_args(ctx, args)?;
        // Runtime built-ins (Date, RegExp, the typed arrays) have value
        // semantics and construct under their js:: spelling; only real heap
        // classes go through a make-function.
        let resolved = self.resolve_ty(Some(&TypeExpr::name(callee)));
        if !resolved.flags.needs_heap_allocation {
            return Ok(format!("{}({args})", resolved.target));
        }
        Ok(ownership.make(&names::sanitize(callee), &args))
    }

    fn gen_array_lit(
        &mut self,
        ctx: Ctx,
        expr: &Expr,
        elems: &[Expr],
        expected: Option<&str>,
    ) -> Result<String, FatalError> {
        let elem_ty = expected.unwrap_or("js::any");
        let mut rendered = Vec::with_capacity(elems.len());
        for elem in elems {
            if matches!(elem.kind(), ExprKind::Spread(_)) {
                self.sink.warning(
                    "W0003",
                    "spread element in array literal is not supported; element skipped",
                    elem.span.or(expr.span),
                );
                continue;
            }
            rendered.push(self.gen_expr(ctx, elem)?);
        }
        Ok(format!("js::array<{elem_ty}>{{{}}}", rendered.join(", ")))
    }

    /// Object literals lower to an immediately-invoked lambda that fills a
    /// fresh runtime object property by property, in source order. The
    /// lambda captures by reference; it never escapes the expression.
    fn gen_object_lit(
        &mut self,
        ctx: Ctx,
        expr: &Expr,
        props: &[ObjectProp],
    ) -> Result<String, FatalError> {
        let temp = self.next_obj_temp();
        let outer = self.pad(ctx.indent);
        let inner = self.pad(ctx.indent + 1);
        let mut out = String::new();
        out.push_str("[&]() {\n");
        out.push_str(&format!("{inner}js::object {temp};\n"));
        for prop in props {
            match prop {
                ObjectProp::Entry { key, value } => {
                    let value = self.gen_expr_with(ctx.nested(), value, None)?;
                    out.push_str(&format!("{inner}{temp}.set(\"{}\", {value});\n", escape(key)));
                }
                ObjectProp::Spread(spread) => {
                    self.sink.warning(
                        "W0003",
                        "object spread is not supported; property skipped",
                        spread.span.or(expr.span),
                    );
                }
            }
        }
        out.push_str(&format!("{inner}return js::any({temp});\n"));
        out.push_str(&format!("{outer}}}()"));
        Ok(out)
    }

    fn gen_lambda(
        &mut self,
        ctx: Ctx,
        params: &[Param],
        ret: Option<&TypeExpr>,
        body: &[Stmt],
    ) -> Result<String, FatalError> {
        let rendered_params = self.render_params(params, true)?;
        let ret_spelling = match ret {
            Some(ret) => {
                let resolved = self.resolve_ty(Some(ret));
                format!(" -> {}", self.mapper.embedded(&resolved))
            }
            None => String::new(),
        };

        self.push_scope();
        self.bind_params(params);
        let mut sub = Emitter::new(self.indent_size);
        for stmt in body {
            self.gen_stmt(&mut sub, ctx.nested(), stmt)?;
        }
        self.pop_scope();
        let (body_text, _) = sub.finish();

        let outer = self.pad(ctx.indent);
        Ok(format!(
            "[=]({rendered_params}){ret_spelling} {{\n{body_text}{outer}}}"
        ))
    }

    fn gen_binary(
        &mut self,
        ctx: Ctx,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<String, FatalError> {
        let l = self.gen_expr(ctx, left)?;
        let r = self.gen_expr(ctx, right)?;
        let token = match op {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => return Ok(format!("std::pow({l}, {r})")),
            // Strict equality is the only equality the target has.
            BinaryOp::Eq | BinaryOp::StrictEq => "==",
            BinaryOp::Neq | BinaryOp::StrictNeq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::NullishCoalesce => {
                return Ok(format!("(({l}).has_value() ? ({l}).value() : ({r}))"));
            }
            BinaryOp::In => return Ok(format!("js::in_op({l}, {r})")),
            BinaryOp::InstanceOf => return Ok(format!("js::instanceof_op({l}, {r})")),
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => return Ok(format!("js::ushr({l}, {r})")),
        };
        Ok(format!("({l} {token} {r})"))
    }

    fn gen_template(&mut self, ctx: Ctx, parts: &[TemplatePart]) -> Result<String, FatalError> {
        if parts.is_empty() {
            return Ok("\"\"_S".to_string());
        }
        let mut rendered = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(text) => rendered.push(string_literal(text)),
                TemplatePart::Expr(expr) => {
                    let inner = self.gen_expr(ctx, expr)?;
                    rendered.push(format!("js::toString({inner})"));
                }
            }
        }
        if rendered.len() == 1 {
            Ok(rendered.pop().unwrap_or_default())
        } else {
            Ok(format!("({})", rendered.join(" + ")))
        }
    }

    pub(crate) fn pad(&self, indent: usize) -> String {
        " ".repeat(indent * self.indent_size)
    }
}

/// Spell a numeric literal. Integral values print without a fractional part;
/// the non-finite values spell out their runtime constants.
pub(crate) fn number_literal(value: f64) -> String {
    if value.is_nan() {
        return "std::numeric_limits<js::number>::quiet_NaN()".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            "std::numeric_limits<js::number>::infinity()".to_string()
        } else {
            "(-std::numeric_limits<js::number>::infinity())".to_string()
        };
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("js::number({})", value as i64)
    } else {
        format!("js::number({value})")
    }
}

pub(crate) fn string_literal(value: &str) -> String {
    format!("\"{}\"_S", escape(value))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenOptions;
    use tscpp_ir::Expr;
    use tscpp_types::TypeMapper;

    fn gen() -> Codegen {
        Codegen::new(TypeMapper::new(), &GenOptions::new("unit"))
    }

    fn render(expr: Expr) -> String {
        gen().gen_expr(Ctx::definition(), &expr).unwrap()
    }

    #[test]
    fn literals() {
        assert_eq!(render(Expr::number(5.0)), "js::number(5)");
        assert_eq!(render(Expr::number(2.5)), "js::number(2.5)");
        assert_eq!(render(Expr::string("Rex")), "\"Rex\"_S");
        assert_eq!(render(Expr::string("say \"hi\"")), "\"say \\\"hi\\\"\"_S");
        assert_eq!(render(Expr::boolean(true)), "true");
    }

    #[test]
    fn non_finite_numbers_spell_runtime_constants() {
        assert_eq!(
            render(Expr::number(f64::NAN)),
            "std::numeric_limits<js::number>::quiet_NaN()"
        );
        assert_eq!(
            render(Expr::number(f64::INFINITY)),
            "std::numeric_limits<js::number>::infinity()"
        );
    }

    #[test]
    fn strict_equality_becomes_value_equality() {
        let e = Expr::binary(BinaryOp::StrictEq, Expr::ident("a"), Expr::ident("b"));
        assert_eq!(render(e), "(a == b)");
        let e = Expr::binary(BinaryOp::StrictNeq, Expr::ident("a"), Expr::ident("b"));
        assert_eq!(render(e), "(a != b)");
    }

    #[test]
    fn pow_and_nullish_rewrites() {
        let e = Expr::binary(BinaryOp::Pow, Expr::ident("x"), Expr::number(2.0));
        assert_eq!(render(e), "std::pow(x, js::number(2))");
        let e = Expr::binary(BinaryOp::NullishCoalesce, Expr::ident("x"), Expr::number(0.0));
        assert_eq!(render(e), "((x).has_value() ? (x).value() : (js::number(0)))");
    }

    #[test]
    fn dynamic_operators_become_runtime_calls() {
        let e = Expr::unary(UnaryOp::TypeOf, Expr::ident("x"));
        assert_eq!(render(e), "js::typeof_op(x)");
        let e = Expr::binary(BinaryOp::In, Expr::string("name"), Expr::ident("dog"));
        assert_eq!(render(e), "js::in_op(\"name\"_S, dog)");
        let e = Expr::binary(BinaryOp::InstanceOf, Expr::ident("d"), Expr::ident("Dog"));
        assert_eq!(render(e), "js::instanceof_op(d, Dog)");
    }

    #[test]
    fn member_access_follows_binding_ownership() {
        let mut g = gen();
        g.bind("dog", Ownership::Shared);
        g.bind("name", Ownership::Value);
        g.bind("owner", Ownership::Weak);
        let ctx = Ctx::definition();

        let e = Expr::member(Expr::ident("dog"), "speak");
        assert_eq!(g.gen_expr(ctx, &e).unwrap(), "dog->speak");
        let e = Expr::member(Expr::ident("name"), "length");
        assert_eq!(g.gen_expr(ctx, &e).unwrap(), "name.length");
        let e = Expr::member(Expr::ident("owner"), "feed");
        assert_eq!(g.gen_expr(ctx, &e).unwrap(), "owner.lock()->feed");
        let e = Expr::member(Expr::this(), "name");
        assert_eq!(g.gen_expr(ctx, &e).unwrap(), "this->name");
    }

    #[test]
    fn globals_rewrite_to_runtime_namespace() {
        let e = Expr::call(
            Expr::member(Expr::ident("console"), "log"),
            vec![Expr::string("hi")],
        );
        assert_eq!(render(e), "js::console.log(\"hi\"_S)");
        let e = Expr::call(Expr::member(Expr::ident("Math"), "floor"), vec![Expr::ident("x")]);
        assert_eq!(render(e), "js::Math.floor(x)");
    }

    #[test]
    fn new_defaults_to_make_shared() {
        let e = Expr::new_object("Dog", vec![Expr::string("Rex")]);
        assert_eq!(render(e), "std::make_shared<Dog>(\"Rex\"_S)");
    }

    #[test]
    fn new_runtime_builtin_constructs_by_value() {
        let e = Expr::new_object("Date", vec![]);
        assert_eq!(render(e), "js::Date()");
        let e = Expr::new_object("RegExp", vec![Expr::string("a+")]);
        assert_eq!(render(e), "js::RegExp(\"a+\"_S)");
    }

    #[test]
    fn call_spread_keeps_the_inner_expression() {
        let mut g = gen();
        let e = Expr::call(
            Expr::ident("f"),
            vec![Expr::new(ExprKind::Spread(Box::new(Expr::ident("xs"))))],
        );
        let out = g.gen_expr(Ctx::definition(), &e).unwrap();
        assert_eq!(out, "f(xs /* spread */)");
        assert_eq!(g.sink.records()[0].code, "W0003");
    }

    #[test]
    fn empty_new_callee_is_malformed() {
        let e = Expr::new_object("", vec![]);
        let err = gen().gen_expr(Ctx::definition(), &e).unwrap_err();
        assert!(matches!(err, FatalError::MalformedNode { .. }));
    }

    #[test]
    fn reserved_identifiers_get_suffixed() {
        assert_eq!(render(Expr::ident("template")), "template_");
        let e = Expr::member(Expr::this(), "operator");
        assert_eq!(render(e), "this->operator_");
    }

    #[test]
    fn array_literal_uses_expected_element_type() {
        let e = Expr::array(vec![Expr::string("red"), Expr::string("green")]);
        let out = gen()
            .gen_expr_with(Ctx::definition(), &e, Some("js::string"))
            .unwrap();
        assert_eq!(out, "js::array<js::string>{\"red\"_S, \"green\"_S}");
        let e = Expr::array(vec![Expr::number(1.0)]);
        assert_eq!(render(e), "js::array<js::any>{js::number(1)}");
    }

    #[test]
    fn object_literal_lowers_to_capturing_iife() {
        let e = Expr::object(vec![("name", Expr::string("Rex")), ("age", Expr::number(3.0))]);
        let out = render(e);
        assert!(out.starts_with("[&]() {"));
        assert!(out.contains("js::object obj_temp_0;"));
        assert!(out.contains("obj_temp_0.set(\"name\", \"Rex\"_S);"));
        assert!(out.contains("obj_temp_0.set(\"age\", js::number(3));"));
        assert!(out.contains("return js::any(obj_temp_0);"));
        assert!(out.ends_with("}()"));
    }

    #[test]
    fn nested_object_literals_get_distinct_temps() {
        let inner = Expr::object(vec![("x", Expr::number(1.0))]);
        let e = Expr::object(vec![("point", inner)]);
        let out = render(e);
        assert!(out.contains("obj_temp_0"));
        assert!(out.contains("obj_temp_1"));
    }

    #[test]
    fn template_string_folds_to_concatenation() {
        let e = Expr::new(ExprKind::Template(vec![
            TemplatePart::Text("Hello ".into()),
            TemplatePart::Expr(Expr::ident("who")),
            TemplatePart::Text("!".into()),
        ]));
        assert_eq!(render(e), "(\"Hello \"_S + js::toString(who) + \"!\"_S)");
    }

    #[test]
    fn unsupported_construct_degrades_with_warning() {
        let mut g = gen();
        let e = Expr::new(ExprKind::Unsupported {
            construct: "tagged template".into(),
        });
        let out = g.gen_expr(Ctx::definition(), &e).unwrap();
        assert_eq!(out, "js::any() /* tagged template */");
        assert_eq!(g.sink.warning_count(), 1);
        assert_eq!(g.sink.records()[0].code, "W0003");
    }
}
