//! Native-syntax rendering.
//!
//! The output is canonical rather than byte-faithful to the input, but it
//! always re-parses to a tree deep-equal (modulo locations) to the one that
//! was rendered: one-element tuples keep their trailing comma, chained
//! assignments join targets with `=`, `elif` ladders re-flatten, and
//! backtick repr stays backtick repr.

use std::fmt::Write as _;

use crate::ast::{
    Alias, BinOp, BoolOp, CmpOp, Comprehension, Expr, ExprLoc, Literal, Param, Params, Slice, Stmt,
    StmtLoc, UnaryOp,
};
use crate::value::float_repr;

use super::{Dialect, EmitError, INDENT, Output};

pub(super) struct Python;

impl Dialect for Python {
    fn name(&self) -> &'static str {
        "python"
    }

    fn expr(&self, expr: &ExprLoc) -> Result<String, EmitError> {
        Ok(expr_text(expr))
    }

    fn stmt(&self, out: &mut Output, stmt: &StmtLoc, indent: u32) -> Result<(), EmitError> {
        emit_stmt(out, stmt, indent);
        Ok(())
    }
}

fn emit_stmt(out: &mut Output, stmt: &StmtLoc, indent: u32) {
    match &stmt.stmt {
        Stmt::Expr(value) => out.line(indent, &expr_text(value)),
        Stmt::Assign { targets, value } => {
            let mut parts: Vec<String> = targets.iter().map(expr_text).collect();
            parts.push(expr_text(value));
            out.line(indent, &parts.join(" = "));
        }
        Stmt::AugAssign { target, op, value } => {
            out.line(indent, &format!("{} {}= {}", expr_text(target), bin_op(*op), expr_text(value)));
        }
        Stmt::Return(value) => match value {
            Some(value) => out.line(indent, &format!("return {}", expr_text(value))),
            None => out.line(indent, "return"),
        },
        Stmt::Delete(targets) => out.line(indent, &format!("del {}", join(targets))),
        Stmt::Print { dest, values, newline } => {
            let mut parts = Vec::new();
            if let Some(dest) = dest {
                parts.push(format!(">>{}", expr_text(dest)));
            }
            parts.extend(values.iter().map(expr_text));
            if !newline {
                // The trailing comma that suppresses the newline.
                parts.push(String::new());
            }
            out.line(indent, format!("print {}", parts.join(", ")).trim_end());
        }
        Stmt::For { target, iter, body, orelse } => {
            out.line(indent, &format!("for {} in {}:", expr_text(target), expr_text(iter)));
            emit_block(out, body, indent + INDENT);
            if !orelse.is_empty() {
                out.line(indent, "else:");
                emit_block(out, orelse, indent + INDENT);
            }
        }
        Stmt::While { test, body, orelse } => {
            out.line(indent, &format!("while {}:", expr_text(test)));
            emit_block(out, body, indent + INDENT);
            if !orelse.is_empty() {
                out.line(indent, "else:");
                emit_block(out, orelse, indent + INDENT);
            }
        }
        Stmt::If { test, body, orelse } => {
            out.line(indent, &format!("if {}:", expr_text(test)));
            emit_block(out, body, indent + INDENT);
            // A sole nested If in the else branch prints as an elif arm.
            let mut rest = orelse.as_slice();
            loop {
                match rest {
                    [] => break,
                    [StmtLoc {
                        stmt: Stmt::If { test, body, orelse },
                        ..
                    }] => {
                        out.line(indent, &format!("elif {}:", expr_text(test)));
                        emit_block(out, body, indent + INDENT);
                        rest = orelse.as_slice();
                    }
                    _ => {
                        out.line(indent, "else:");
                        emit_block(out, rest, indent + INDENT);
                        break;
                    }
                }
            }
        }
        Stmt::With { context, target, body } => {
            match target {
                Some(target) => {
                    out.line(indent, &format!("with {} as {}:", expr_text(context), expr_text(target)));
                }
                None => out.line(indent, &format!("with {}:", expr_text(context))),
            }
            emit_block(out, body, indent + INDENT);
        }
        Stmt::Raise { exc_type, inst, tback } => {
            let parts: Vec<String> =
                [exc_type, inst, tback].into_iter().flatten().map(expr_text).collect();
            if parts.is_empty() {
                out.line(indent, "raise");
            } else {
                out.line(indent, &format!("raise {}", parts.join(", ")));
            }
        }
        Stmt::TryExcept { body, handlers, orelse } => {
            out.line(indent, "try:");
            emit_block(out, body, indent + INDENT);
            for handler in handlers {
                let header = match (&handler.exc_type, &handler.name) {
                    (Some(exc_type), Some(name)) => {
                        format!("except {} as {}:", expr_text(exc_type), expr_text(name))
                    }
                    (Some(exc_type), None) => format!("except {}:", expr_text(exc_type)),
                    (None, _) => "except:".to_owned(),
                };
                out.line(indent, &header);
                emit_block(out, &handler.body, indent + INDENT);
            }
            if !orelse.is_empty() {
                out.line(indent, "else:");
                emit_block(out, orelse, indent + INDENT);
            }
        }
        Stmt::TryFinally { body, finalbody } => {
            out.line(indent, "try:");
            emit_block(out, body, indent + INDENT);
            out.line(indent, "finally:");
            emit_block(out, finalbody, indent + INDENT);
        }
        Stmt::Assert { test, msg } => match msg {
            Some(msg) => out.line(indent, &format!("assert {},{}", expr_text(test), expr_text(msg))),
            None => out.line(indent, &format!("assert {}", expr_text(test))),
        },
        Stmt::Import(aliases) => out.line(indent, &format!("import {}", alias_list(aliases))),
        Stmt::ImportFrom { module, names, level } => {
            let dots = ".".repeat(*level as usize);
            out.line(indent, &format!("from {dots}{module} import {}", alias_list(names)));
        }
        Stmt::FunctionDef(def) => {
            for decorator in &def.decorators {
                out.line(indent, &format!("@{}", expr_text(decorator)));
            }
            out.line(indent, &format!("def {}({}):", def.name, params_text(&def.params)));
            emit_block(out, &def.body, indent + INDENT);
        }
        Stmt::ClassDef(def) => {
            for decorator in &def.decorators {
                out.line(indent, &format!("@{}", expr_text(decorator)));
            }
            let bases = if def.bases.is_empty() {
                String::new()
            } else {
                format!("({})", join(&def.bases))
            };
            out.line(indent, &format!("class {}{bases}:", def.name));
            emit_block(out, &def.body, indent + INDENT);
        }
        Stmt::Global(names) => out.line(indent, &format!("global {}", names.join(", "))),
        Stmt::Pass => out.line(indent, "pass"),
        Stmt::Break => out.line(indent, "break"),
        Stmt::Continue => out.line(indent, "continue"),
    }
}

fn emit_block(out: &mut Output, body: &[StmtLoc], indent: u32) {
    for stmt in body {
        emit_stmt(out, stmt, indent);
    }
}

pub(crate) fn expr_text(expr: &ExprLoc) -> String {
    match &expr.expr {
        Expr::Literal(lit) => literal(lit),
        Expr::Name { id, .. } => id.clone(),
        Expr::Repr(value) => format!("`{}`", expr_text(value)),
        Expr::Tuple(elts) => match elts.as_slice() {
            [single] => format!("({},)", expr_text(single)),
            _ => format!("({})", join(elts)),
        },
        Expr::List(elts) => format!("[{}]", join(elts)),
        Expr::Set(elts) => format!("{{{}}}", join(elts)),
        Expr::Dict(pairs) => {
            let pairs: Vec<String> = pairs
                .iter()
                .map(|(key, value)| format!("{} : {}", expr_text(key), expr_text(value)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
        Expr::BoolOp { op, values } => {
            let sep = match op {
                BoolOp::And => " and ",
                BoolOp::Or => " or ",
            };
            let parts: Vec<String> = values.iter().map(expr_text).collect();
            format!("({})", parts.join(sep))
        }
        Expr::BinOp { left, op, right } => {
            format!("({} {} {})", expr_text(left), bin_op(*op), expr_text(right))
        }
        Expr::UnaryOp { op, operand } => format!("({}({}))", unary_op(*op), expr_text(operand)),
        Expr::Compare { left, comparisons } => {
            let mut parts = vec![expr_text(left)];
            for (op, right) in comparisons {
                parts.push(cmp_op(*op).to_owned());
                parts.push(expr_text(right));
            }
            format!("({})", parts.join(" "))
        }
        Expr::IfExp { test, body, orelse } => {
            format!("({} if {} else {})", expr_text(body), expr_text(test), expr_text(orelse))
        }
        Expr::Lambda { params, body } => {
            format!("(lambda {}:{})", params_text(params), expr_text(body))
        }
        Expr::Call { func, args, keywords, starargs, kwargs } => {
            let mut parts: Vec<String> = args.iter().map(expr_text).collect();
            parts.extend(keywords.iter().map(|kw| format!("{}={}", kw.name, expr_text(&kw.value))));
            if let Some(starargs) = starargs {
                parts.push(format!("*{}", expr_text(starargs)));
            }
            if let Some(kwargs) = kwargs {
                parts.push(format!("**{}", expr_text(kwargs)));
            }
            format!("{}({})", expr_text(func), parts.join(", "))
        }
        Expr::Attribute { value, attr } => format!("{}.{attr}", expr_text(value)),
        Expr::Subscript { value, slice } => format!("{}[{}]", expr_text(value), slice_text(slice)),
        Expr::ListComp { elt, generators } => {
            format!("[{} {}]", expr_text(elt), generators_text(generators))
        }
        Expr::SetComp { elt, generators } => {
            format!("{{{} {}}}", expr_text(elt), generators_text(generators))
        }
        Expr::DictComp { key, value, generators } => {
            format!("{{{}:{} {}}}", expr_text(key), expr_text(value), generators_text(generators))
        }
    }
}

fn literal(lit: &Literal) -> String {
    match lit {
        Literal::None => "None".to_owned(),
        Literal::Bool(true) => "True".to_owned(),
        Literal::Bool(false) => "False".to_owned(),
        Literal::Int(n) => n.to_string(),
        Literal::Float(f) => float_repr(*f),
        Literal::Str(s) => quote(s),
    }
}

/// Quotes a string literal. Single quotes by default; double quotes when
/// the content holds a single quote but no double quote.
fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

fn join(elts: &[ExprLoc]) -> String {
    let parts: Vec<String> = elts.iter().map(expr_text).collect();
    parts.join(", ")
}

fn slice_text(slice: &Slice) -> String {
    match slice {
        Slice::Index(index) => expr_text(index),
        Slice::Range { lower, upper, step } => {
            let bound = |value: &Option<ExprLoc>| value.as_ref().map(expr_text).unwrap_or_default();
            let mut text = format!("{}:{}", bound(lower), bound(upper));
            if let Some(step) = step {
                let _ = write!(text, ":{}", expr_text(step));
            }
            text
        }
        Slice::Extended(dims) => {
            let parts: Vec<String> = dims.iter().map(slice_text).collect();
            parts.join(", ")
        }
    }
}

fn generators_text(generators: &[Comprehension]) -> String {
    let clauses: Vec<String> = generators
        .iter()
        .map(|comp| {
            let mut clause = format!("for {} in {}", expr_text(&comp.target), expr_text(&comp.iter));
            for cond in &comp.ifs {
                let _ = write!(clause, " if {}", expr_text(cond));
            }
            clause
        })
        .collect();
    clauses.join(" ")
}

fn params_text(params: &Params) -> String {
    let mut parts = Vec::new();
    let plain = params.params.len().saturating_sub(params.defaults.len());
    for (index, param) in params.params.iter().enumerate() {
        let name = param_text(param);
        if index < plain {
            parts.push(name);
        } else {
            parts.push(format!("{name}={}", expr_text(&params.defaults[index - plain])));
        }
    }
    if let Some(vararg) = &params.vararg {
        parts.push(format!("*{vararg}"));
    }
    if let Some(kwarg) = &params.kwarg {
        parts.push(format!("**{kwarg}"));
    }
    parts.join(", ")
}

pub(crate) fn param_text(param: &Param) -> String {
    match param {
        Param::Name(name) => name.clone(),
        Param::Tuple(inner) => match inner.as_slice() {
            [single] => format!("({},)", param_text(single)),
            _ => {
                let parts: Vec<String> = inner.iter().map(param_text).collect();
                format!("({})", parts.join(", "))
            }
        },
    }
}

fn alias_list(aliases: &[Alias]) -> String {
    let parts: Vec<String> = aliases
        .iter()
        .map(|alias| match &alias.asname {
            Some(asname) => format!("{} as {}", alias.name, asname),
            None => alias.name.clone(),
        })
        .collect();
    parts.join(", ")
}

fn bin_op(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mult => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
        BinOp::LShift => "<<",
        BinOp::RShift => ">>",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::BitAnd => "&",
        BinOp::FloorDiv => "//",
    }
}

fn unary_op(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Invert => "~",
        UnaryOp::Not => "not ",
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
        CmpOp::Is => "is",
        CmpOp::IsNot => "is not",
        CmpOp::In => "in",
        CmpOp::NotIn => "not in",
    }
}
