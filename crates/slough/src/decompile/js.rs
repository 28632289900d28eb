//! JavaScript-flavored rendering, in two versions.
//!
//! [`Js::V1`] lowers blocks to braces, `print` to `console.log`,
//! comprehensions to immediately-invoked functions that accumulate into a
//! result variable, and `try`/`finally` to catch-rethrow followed by the
//! finally body re-executed inline (which duplicates its side effects; that
//! is the documented lowering, not a bug to paper over). Everything the
//! target cannot express — classes, imports, decorators, `with`, slicing,
//! keyword or spread arguments, variadic parameters — fails the render.
//!
//! [`Js::V2`] refines V1: the `None`/`True`/`False` sentinels become
//! `null`/`true`/`false`, single-argument calls to the conversion builtins
//! map to target-native names, and floor division renders as a truncating
//! `parseInt` wrapper instead of borrowing `/`.

use crate::ast::{
    BinOp, BoolOp, CmpOp, Comprehension, Expr, ExprLoc, Literal, Loc, NameCtx, Param, Params, Slice,
    Stmt, StmtLoc, UnaryOp,
};
use crate::value::float_repr;

use super::{Dialect, EmitError, INDENT, Output};

pub(super) enum Js {
    V1,
    V2,
}

impl Dialect for Js {
    fn name(&self) -> &'static str {
        match self {
            Self::V1 => "js",
            Self::V2 => "js2",
        }
    }

    fn expr(&self, expr: &ExprLoc) -> Result<String, EmitError> {
        self.expr_text(expr)
    }

    fn stmt(&self, out: &mut Output, stmt: &StmtLoc, indent: u32) -> Result<(), EmitError> {
        self.emit_stmt(out, stmt, indent)
    }
}

impl Js {
    fn unsupported(&self, construct: &'static str, position: Loc) -> EmitError {
        EmitError::unsupported(self.name(), construct, position)
    }

    fn emit_stmt(&self, out: &mut Output, stmt: &StmtLoc, indent: u32) -> Result<(), EmitError> {
        let position = stmt.position;
        match &stmt.stmt {
            Stmt::Expr(value) => out.line(indent, &format!("{};", self.expr_text(value)?)),
            Stmt::Assign { targets, value } => {
                let mut parts: Vec<String> =
                    targets.iter().map(|t| self.expr_text(t)).collect::<Result<_, _>>()?;
                parts.push(self.expr_text(value)?);
                out.line(indent, &format!("{};", parts.join(" = ")));
            }
            Stmt::AugAssign { target, op, value } => {
                let line = format!(
                    "{} {}= {};",
                    self.expr_text(target)?,
                    bin_op(*op),
                    self.expr_text(value)?
                );
                out.line(indent, &line);
            }
            Stmt::Return(value) => match value {
                Some(value) => out.line(indent, &format!("return {};", self.expr_text(value)?)),
                None => out.line(indent, "return;"),
            },
            // There is no deletion; clearing the binding is the closest fit.
            Stmt::Delete(targets) => {
                for target in targets {
                    out.line(indent, &format!("{} = undefined;", self.expr_text(target)?));
                }
            }
            Stmt::Print { dest, values, newline } => {
                if dest.is_some() {
                    return Err(self.unsupported("print destination", position));
                }
                if !newline {
                    return Err(self.unsupported("print without newline", position));
                }
                out.line(indent, &format!("console.log({});", self.join(values)?));
            }
            Stmt::For { target, iter, body, orelse } => {
                if !orelse.is_empty() {
                    return Err(self.unsupported("for-else", position));
                }
                let target = self.expr_text(target)?;
                let iter = self.expr_text(iter)?;
                out.line(
                    indent,
                    &format!("{{ var __iter = {iter} ; for (var {target} in __iter) {{ {target} = __iter[{target}];"),
                );
                self.emit_block(out, body, indent + INDENT)?;
                out.line(indent, "}}");
            }
            Stmt::While { test, body, orelse } => {
                if !orelse.is_empty() {
                    return Err(self.unsupported("while-else", position));
                }
                out.line(indent, &format!("while ({}) {{", self.expr_text(test)?));
                self.emit_block(out, body, indent + INDENT)?;
                out.line(indent, "}");
            }
            Stmt::If { test, body, orelse } => {
                out.line(indent, &format!("if ({}) {{", self.expr_text(test)?));
                self.emit_block(out, body, indent + INDENT)?;
                // Chained else-if arms share one brace ladder.
                let mut rest = orelse.as_slice();
                loop {
                    match rest {
                        [] => break,
                        [StmtLoc {
                            stmt: Stmt::If { test, body, orelse },
                            ..
                        }] => {
                            out.line(indent, &format!("}} else if ({}) {{", self.expr_text(test)?));
                            self.emit_block(out, body, indent + INDENT)?;
                            rest = orelse.as_slice();
                        }
                        _ => {
                            out.line(indent, "} else {");
                            self.emit_block(out, rest, indent + INDENT)?;
                            break;
                        }
                    }
                }
                out.line(indent, "}");
            }
            Stmt::With { .. } => return Err(self.unsupported("with statements", position)),
            Stmt::Raise { exc_type, inst, tback } => {
                if tback.is_some() {
                    return Err(self.unsupported("raise with a traceback", position));
                }
                if let Some(inst) = inst {
                    out.line(indent, &format!("throw {};", self.expr_text(inst)?));
                } else if let Some(exc_type) = exc_type {
                    out.line(indent, &format!("throw {}();", self.expr_text(exc_type)?));
                } else {
                    return Err(self.unsupported("bare raise", position));
                }
            }
            Stmt::TryExcept { body, handlers, orelse } => {
                if !orelse.is_empty() {
                    return Err(self.unsupported("try-else", position));
                }
                if handlers.len() > 1 {
                    return Err(self.unsupported("multiple except handlers", position));
                }
                out.line(indent, "try {");
                self.emit_block(out, body, indent + INDENT)?;
                for handler in handlers {
                    // The handler's exception type has no catch-site filter;
                    // only the bound name survives.
                    let name = match &handler.name {
                        Some(name) => self.expr_text(name)?,
                        None => "_unused".to_owned(),
                    };
                    out.line(indent, &format!("}} catch ({name}) {{"));
                    self.emit_block(out, &handler.body, indent + INDENT)?;
                }
                out.line(indent, "}");
            }
            Stmt::TryFinally { body, finalbody } => {
                // catch-rethrow covers the exceptional path; the inline copy
                // after the block covers normal completion.
                out.line(indent, "try {");
                self.emit_block(out, body, indent + INDENT)?;
                out.line(indent, "} catch (_err) {");
                self.emit_block(out, finalbody, indent + INDENT)?;
                out.line(indent + INDENT, "throw _err;");
                out.line(indent, "}");
                self.emit_block(out, finalbody, indent)?;
            }
            Stmt::Assert { test, msg } => {
                let msg = match msg {
                    Some(msg) => self.expr_text(msg)?,
                    None => "\"AssertionError\"".to_owned(),
                };
                out.line(indent, &format!("if (!({})) {{ throw {msg}; }}", self.expr_text(test)?));
            }
            Stmt::Import(_) | Stmt::ImportFrom { .. } => {
                return Err(self.unsupported("imports", position));
            }
            Stmt::FunctionDef(def) => {
                if !def.decorators.is_empty() {
                    return Err(self.unsupported("decorators", position));
                }
                let params = self.params_text(&def.params, position)?;
                out.line(indent, &format!("function {}({params}) {{", def.name));
                self.emit_block(out, &def.body, indent + INDENT)?;
                out.line(indent, "}");
            }
            Stmt::ClassDef(_) => return Err(self.unsupported("class definitions", position)),
            // Scoping declarations have no counterpart and no effect.
            Stmt::Global(_) | Stmt::Pass => {}
            Stmt::Break => out.line(indent, "break;"),
            Stmt::Continue => out.line(indent, "continue;"),
        }
        Ok(())
    }

    fn emit_block(&self, out: &mut Output, body: &[StmtLoc], indent: u32) -> Result<(), EmitError> {
        for stmt in body {
            self.emit_stmt(out, stmt, indent)?;
        }
        Ok(())
    }

    fn expr_text(&self, expr: &ExprLoc) -> Result<String, EmitError> {
        let position = expr.position;
        Ok(match &expr.expr {
            Expr::Literal(lit) => self.literal(lit),
            Expr::Name { id, .. } => id.clone(),
            Expr::Repr(value) => format!("JSON.stringify({})", self.expr_text(value)?),
            Expr::Tuple(elts) | Expr::List(elts) => format!("[{}]", self.join(elts)?),
            Expr::Set(elts) => {
                let parts: Vec<String> = elts
                    .iter()
                    .map(|elt| Ok(format!("{}:true", self.expr_text(elt)?)))
                    .collect::<Result<_, EmitError>>()?;
                format!("{{{}}}", parts.join(", "))
            }
            Expr::Dict(pairs) => {
                let parts: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| {
                        Ok(format!("{} : {}", self.expr_text(key)?, self.expr_text(value)?))
                    })
                    .collect::<Result<_, EmitError>>()?;
                format!("{{{}}}", parts.join(", "))
            }
            Expr::BoolOp { op, values } => {
                let sep = match op {
                    BoolOp::And => " && ",
                    BoolOp::Or => " || ",
                };
                let parts: Vec<String> =
                    values.iter().map(|v| self.expr_text(v)).collect::<Result<_, _>>()?;
                format!("({})", parts.join(sep))
            }
            Expr::BinOp { left, op, right } => {
                let left = self.expr_text(left)?;
                let right = self.expr_text(right)?;
                match (self, op) {
                    (Self::V2, BinOp::FloorDiv) => format!("(parseInt({left} / {right}))"),
                    _ => format!("({left} {} {right})", bin_op(*op)),
                }
            }
            Expr::UnaryOp { op, operand } => {
                format!("({}({}))", unary_op(*op), self.expr_text(operand)?)
            }
            Expr::Compare { left, comparisons } => {
                // A chain becomes pairwise links joined with `&&`.
                let mut links = Vec::with_capacity(comparisons.len());
                let mut running = self.expr_text(left)?;
                for (op, right) in comparisons {
                    let right = self.expr_text(right)?;
                    links.push(match op {
                        CmpOp::NotIn => format!("(!({running} in {right}))"),
                        _ => format!("({running} {} {right})", cmp_op(*op)),
                    });
                    running = right;
                }
                format!("({})", links.join(" && "))
            }
            Expr::IfExp { test, body, orelse } => format!(
                "(({})?({}):({}))",
                self.expr_text(test)?,
                self.expr_text(body)?,
                self.expr_text(orelse)?
            ),
            Expr::Lambda { params, body } => format!(
                "(function({}){{ return {}; }})",
                self.params_text(params, position)?,
                self.expr_text(body)?
            ),
            Expr::Call { func, args, keywords, starargs, kwargs } => {
                if !keywords.is_empty() {
                    return Err(self.unsupported("keyword arguments", position));
                }
                if starargs.is_some() || kwargs.is_some() {
                    return Err(self.unsupported("spread arguments", position));
                }
                if let Some(mapped) = self.mapped_builtin(func, args) {
                    return Ok(format!("{mapped}({})", self.expr_text(&args[0])?));
                }
                format!("{}({})", self.expr_text(func)?, self.join(args)?)
            }
            Expr::Attribute { value, attr } => format!("{}.{attr}", self.expr_text(value)?),
            Expr::Subscript { value, slice } => match &**slice {
                Slice::Index(index) => {
                    format!("{}[{}]", self.expr_text(value)?, self.expr_text(index)?)
                }
                Slice::Range { .. } | Slice::Extended(_) => {
                    return Err(self.unsupported("slicing", position));
                }
            },
            Expr::ListComp { elt, generators } => {
                let push = format!("rv.push({});", self.expr_text(elt)?);
                self.comp_text(generators, "[]", push)?
            }
            Expr::SetComp { elt, generators } => {
                let insert = format!("rv[{}] = true;", self.expr_text(elt)?);
                self.comp_text(generators, "{}", insert)?
            }
            Expr::DictComp { key, value, generators } => {
                let insert = format!("rv[{}] = {};", self.expr_text(key)?, self.expr_text(value)?);
                self.comp_text(generators, "{}", insert)?
            }
        })
    }

    fn literal(&self, lit: &Literal) -> String {
        match (self, lit) {
            // V1 carries the source spellings through as bare identifiers.
            (Self::V1, Literal::None) => "None".to_owned(),
            (Self::V1, Literal::Bool(b)) => if *b { "True" } else { "False" }.to_owned(),
            (Self::V2, Literal::None) => "null".to_owned(),
            (Self::V2, Literal::Bool(b)) => if *b { "true" } else { "false" }.to_owned(),
            (_, Literal::Int(n)) => n.to_string(),
            (_, Literal::Float(f)) => float_repr(*f),
            (_, Literal::Str(s)) => serde_json::Value::from(s.as_str()).to_string(),
        }
    }

    /// V2 maps single-argument conversion-builtin calls to native names.
    fn mapped_builtin(&self, func: &ExprLoc, args: &[ExprLoc]) -> Option<&'static str> {
        if !matches!(self, Self::V2) || args.len() != 1 {
            return None;
        }
        let Expr::Name { id, ctx: NameCtx::Load } = &func.expr else {
            return None;
        };
        match id.as_str() {
            "int" => Some("parseInt"),
            "float" => Some("parseFloat"),
            "str" => Some("String"),
            "repr" => Some("JSON.stringify"),
            _ => None,
        }
    }

    /// Lowers a comprehension to an immediately-invoked accumulator
    /// function: one scope block per `for` clause, filters inverted into
    /// `continue`, and the seed container returned at the end.
    fn comp_text(
        &self,
        generators: &[Comprehension],
        seed: &str,
        insert: String,
    ) -> Result<String, EmitError> {
        let mut parts = vec![format!("(function(){{ var rv = {seed};")];
        for comp in generators {
            parts.push(self.generator_text(comp)?);
        }
        parts.push(insert);
        parts.push("}}".repeat(generators.len()));
        parts.push("return rv; })()".to_owned());
        Ok(parts.join(" "))
    }

    fn generator_text(&self, comp: &Comprehension) -> Result<String, EmitError> {
        let target = self.expr_text(&comp.target)?;
        let iter = self.expr_text(&comp.iter)?;
        let mut text =
            format!("{{ var __iter = {iter}; for (var {target} in __iter) {{ {target} = __iter[{target}];");
        if !comp.ifs.is_empty() {
            let conds: Vec<String> = comp
                .ifs
                .iter()
                .map(|cond| Ok(format!("({})", self.expr_text(cond)?)))
                .collect::<Result<_, EmitError>>()?;
            text.push_str(&format!(" if (!({})) continue;", conds.join(" && ")));
        }
        Ok(text)
    }

    fn params_text(&self, params: &Params, position: Loc) -> Result<String, EmitError> {
        if !params.defaults.is_empty() {
            return Err(self.unsupported("parameter defaults", position));
        }
        if params.vararg.is_some() || params.kwarg.is_some() {
            return Err(self.unsupported("variadic parameters", position));
        }
        let names: Vec<&str> = params
            .params
            .iter()
            .map(|param| match param {
                Param::Name(name) => Ok(name.as_str()),
                Param::Tuple(_) => Err(self.unsupported("tuple parameters", position)),
            })
            .collect::<Result<_, _>>()?;
        Ok(names.join(", "))
    }

    fn join(&self, elts: &[ExprLoc]) -> Result<String, EmitError> {
        let parts: Vec<String> = elts.iter().map(|e| self.expr_text(e)).collect::<Result<_, _>>()?;
        Ok(parts.join(", "))
    }
}

fn bin_op(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mult => "*",
        // V1 borrows `/` for floor division; V2 overrides it at render time.
        BinOp::Div | BinOp::FloorDiv => "/",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
        BinOp::LShift => "<<",
        BinOp::RShift => ">>",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::BitAnd => "&",
    }
}

fn unary_op(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Invert => "~",
        UnaryOp::Not => "!",
        UnaryOp::UAdd => "+",
        UnaryOp::USub => "-",
    }
}

fn cmp_op(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "==",
        CmpOp::NotEq => "!=",
        CmpOp::Lt => "<",
        CmpOp::LtE => "<=",
        CmpOp::Gt => ">",
        CmpOp::GtE => ">=",
        CmpOp::Is => "===",
        CmpOp::IsNot => "!==",
        // NotIn never reaches here; the chain renderer wraps it in `!(..)`.
        CmpOp::In | CmpOp::NotIn => "in",
    }
}
