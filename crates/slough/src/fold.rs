//! Constant-folding pass.
//!
//! Replaces provably-constant subtrees with their literal result: operator
//! applications over constant operands, boolean chains over constant values,
//! comparison chains, conditional expressions with a constant test, and
//! calls to the conversion builtins `str`/`int`/`float`/`bool`.
//!
//! The pass is infallible. Evaluation that would raise at runtime (division
//! by zero, overflow, an unsupported operand mix) leaves the expression
//! unfolded instead of failing the pass, so the program keeps its original
//! runtime behavior.

use crate::ast::{BoolOp, Expr, ExprLoc, Keyword, Literal, Loc, Module, NameCtx};
use crate::rewrite::{self, Rewrite, RewriteError};
use crate::value::{self, Const};

/// Folds every constant subtree in the module.
#[must_use]
pub fn fold_module(module: Module) -> Module {
    match ConstFold.rewrite_module(module) {
        Ok(folded) => folded,
        Err(RewriteError::Recursion { .. }) => {
            unreachable!("folding never substitutes, so it cannot recurse")
        }
    }
}

/// Folds a single expression tree. Handy for tools working below the
/// statement level.
#[must_use]
pub fn fold_expr(expr: ExprLoc) -> ExprLoc {
    match ConstFold.rewrite_expr(expr) {
        Ok(folded) => folded,
        Err(RewriteError::Recursion { .. }) => {
            unreachable!("folding never substitutes, so it cannot recurse")
        }
    }
}

struct ConstFold;

impl Rewrite for ConstFold {
    fn rewrite_expr(&mut self, expr: ExprLoc) -> Result<ExprLoc, RewriteError> {
        // Children first, so nested constant subtrees collapse bottom-up.
        let expr = rewrite::walk_expr(self, expr)?;
        Ok(try_fold(expr))
    }
}

fn try_fold(expr: ExprLoc) -> ExprLoc {
    match folded(&expr) {
        Some(replacement) => replacement,
        None => expr,
    }
}

/// Attempts to fold one already-walked expression; `None` leaves it alone.
fn folded(expr: &ExprLoc) -> Option<ExprLoc> {
    let position = expr.position;
    match &expr.expr {
        Expr::UnaryOp { op, operand } => {
            let operand = as_const(operand)?;
            let result = value::unary(*op, &operand).ok()?;
            Some(const_expr(result, position))
        }
        Expr::BinOp { left, op, right } => {
            let left = as_const(left)?;
            let right = as_const(right)?;
            let result = value::binary(*op, &left, &right).ok()?;
            Some(const_expr(result, position))
        }
        Expr::BoolOp { op, values } => {
            // `and`/`or` return an operand value, not a boolean: the result
            // is the first falsy (resp. truthy) value, or the last one.
            let mut consts: Vec<Const> = values.iter().map(as_const).collect::<Option<_>>()?;
            let chosen = match op {
                BoolOp::And => consts.iter().position(|v| !v.truthy()),
                BoolOp::Or => consts.iter().position(Const::truthy),
            };
            let index = chosen.unwrap_or(consts.len().checked_sub(1)?);
            Some(const_expr(consts.swap_remove(index), position))
        }
        Expr::Compare { left, comparisons } => {
            // Every operand must be constant, but evaluation still
            // short-circuits: links after the first false one never run,
            // so they cannot veto the fold.
            let mut running = as_const(left)?;
            let rights: Vec<Const> =
                comparisons.iter().map(|(_, right)| as_const(right)).collect::<Option<_>>()?;
            let mut result = true;
            for ((op, _), right) in comparisons.iter().zip(rights) {
                if value::compare(*op, &running, &right).ok()? {
                    running = right;
                } else {
                    result = false;
                    break;
                }
            }
            Some(const_expr(Const::Bool(result), position))
        }
        Expr::IfExp { test, body, orelse } => {
            // A constant test selects a branch; the branch itself does not
            // have to be constant.
            let test = as_const(test)?;
            let branch = if test.truthy() { body } else { orelse };
            Some((**branch).clone())
        }
        Expr::Call { func, args, keywords, starargs, kwargs } => {
            fold_call(func, args, keywords, starargs.as_deref(), kwargs.as_deref(), position)
        }
        _ => None,
    }
}

/// Folds `str`/`int`/`float`/`bool` calls over constant arguments.
fn fold_call(
    func: &ExprLoc,
    args: &[ExprLoc],
    keywords: &[Keyword],
    starargs: Option<&ExprLoc>,
    kwargs: Option<&ExprLoc>,
    position: Loc,
) -> Option<ExprLoc> {
    let Expr::Name { id, ctx: NameCtx::Load } = &func.expr else {
        return None;
    };
    if kwargs.is_some() {
        return None;
    }
    let mut values: Vec<Const> = args.iter().map(as_const).collect::<Option<_>>()?;
    if let Some(spread) = starargs {
        // A constant `*seq` spread contributes its elements positionally.
        match as_const(spread)? {
            Const::Tuple(elts) | Const::List(elts) => values.extend(elts),
            _ => return None,
        }
    }
    // Keyword argument VALUES must be constant for the call to fold; the
    // only keyword any of these builtins accepts is `int`'s `base`.
    let mut base = None;
    for keyword in keywords {
        let kw_value = as_const(&keyword.value)?;
        match (id.as_str(), keyword.name.as_str()) {
            ("int", "base") if base.is_none() => base = Some(kw_value),
            _ => return None,
        }
    }
    let result = match (id.as_str(), values.as_slice()) {
        ("str", []) => Const::Str(String::new()),
        ("str", [v]) => value::str_of(v).ok()?,
        ("int", []) if base.is_none() => Const::Int(0),
        ("int", [v]) => value::int_of(v, base.as_ref()).ok()?,
        ("int", [v, b]) if base.is_none() => value::int_of(v, Some(b)).ok()?,
        ("float", []) => Const::Float(0.0),
        ("float", [v]) => value::float_of(v).ok()?,
        ("bool", []) => Const::Bool(false),
        ("bool", [v]) => value::bool_of(v),
        _ => return None,
    };
    Some(const_expr(result, position))
}

/// Extracts the constant value of an expression, if it has one.
///
/// Literals are constant; tuples, lists and sets are constant when every
/// element is. Dict displays are never treated as constant, and neither is
/// anything that names a variable or performs an operation.
fn as_const(expr: &ExprLoc) -> Option<Const> {
    match &expr.expr {
        Expr::Literal(lit) => Some(match lit {
            Literal::None => Const::None,
            Literal::Bool(b) => Const::Bool(*b),
            Literal::Int(n) => Const::Int(*n),
            Literal::Float(f) => Const::Float(*f),
            Literal::Str(s) => Const::Str(s.clone()),
        }),
        Expr::Tuple(elts) => consts(elts).map(Const::Tuple),
        Expr::List(elts) => consts(elts).map(Const::List),
        Expr::Set(elts) => consts(elts).map(Const::set_of),
        _ => None,
    }
}

fn consts(elts: &[ExprLoc]) -> Option<Vec<Const>> {
    elts.iter().map(as_const).collect()
}

/// Builds the expression node for a computed constant, placed at the
/// position of the expression it replaces.
fn const_expr(value: Const, position: Loc) -> ExprLoc {
    let expr = match value {
        Const::None => Expr::Literal(Literal::None),
        Const::Bool(b) => Expr::Literal(Literal::Bool(b)),
        Const::Int(n) => Expr::Literal(Literal::Int(n)),
        Const::Float(f) => Expr::Literal(Literal::Float(f)),
        Const::Str(s) => Expr::Literal(Literal::Str(s)),
        Const::List(elts) => Expr::List(const_exprs(elts, position)),
        Const::Tuple(elts) => Expr::Tuple(const_exprs(elts, position)),
        Const::Set(elts) => Expr::Set(const_exprs(elts, position)),
    };
    ExprLoc::new(position, expr)
}

fn const_exprs(elts: Vec<Const>, position: Loc) -> Vec<ExprLoc> {
    elts.into_iter().map(|elt| const_expr(elt, position)).collect()
}
