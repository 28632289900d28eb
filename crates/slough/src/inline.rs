//! Call-inlining pass.
//!
//! Replaces a call to a single-`return` function (or a directly-called
//! lambda) with the callee's body expression, substituting each argument
//! node for its parameter. The pass is best-effort: an ineligible call is
//! left untouched, never reported.
//!
//! A read-only scan runs first and counts definitions per name; a name
//! defined more than once anywhere in the module never inlines, no matter
//! where its calls sit relative to the definitions. The rewrite traversal
//! then records each surviving definition as it passes it, so a call can
//! only be inlined once its definition has been visited; forward references
//! stay as calls.
//!
//! Substituted bodies are rewritten again so chains of helpers collapse in
//! one pass. That re-entry is bounded by [`INLINE_DEPTH_LIMIT`]; blowing
//! through it (a self-recursive single-`return` function) fails the whole
//! pass with [`RewriteError::Recursion`] instead of overflowing the stack.

use ahash::{AHashMap, AHashSet};

use crate::ast::{Expr, ExprLoc, FunctionDef, Module, NameCtx, Param, Params, Stmt, StmtLoc};
use crate::rewrite::{self, Rewrite, RewriteError};
use crate::visit::{self, Visit};

/// Ceiling on nested substitutions while rewriting one expression.
pub const INLINE_DEPTH_LIMIT: u32 = 32;

/// Inlines every eligible call in the module.
pub fn inline_module(module: Module) -> Result<Module, RewriteError> {
    let mut scan = DefScan::default();
    scan.visit_module(&module);
    Inliner {
        duplicates: scan.duplicates,
        defs: AHashMap::new(),
        depth: 0,
    }
    .rewrite_module(module)
}

/// Collects the names defined more than once, across every scope. Nested
/// and method definitions count against the same flat namespace.
#[derive(Default)]
struct DefScan {
    seen: AHashSet<String>,
    duplicates: AHashSet<String>,
}

impl Visit for DefScan {
    fn visit_stmt(&mut self, stmt: &StmtLoc) {
        if let Stmt::FunctionDef(def) = &stmt.stmt {
            if !self.seen.insert(def.name.clone()) {
                self.duplicates.insert(def.name.clone());
            }
        }
        visit::walk_stmt(self, stmt);
    }
}

/// The inlinable core of a recorded definition: its parameter list and the
/// expression its single `return` yields.
struct InlineDef {
    params: Params,
    body: ExprLoc,
}

enum Recorded {
    /// The name's one definition, with an inlinable shape.
    Inlinable(InlineDef),
    /// The name's one definition is not a single-`return` body.
    Opaque,
    /// Defined more than once; calls to this name are never inlined.
    Shadowed,
}

struct Inliner {
    duplicates: AHashSet<String>,
    defs: AHashMap<String, Recorded>,
    depth: u32,
}

impl Inliner {
    /// Records a definition under its name. Nested and method definitions
    /// land in the same flat map.
    fn record(&mut self, def: &FunctionDef) {
        let recorded = if self.duplicates.contains(&def.name) {
            Recorded::Shadowed
        } else {
            inlinable(def).map_or(Recorded::Opaque, Recorded::Inlinable)
        };
        self.defs.insert(def.name.clone(), recorded);
    }

    /// Builds the substituted body for an inlineable call, or `None` to
    /// leave the call as-is.
    fn substituted(&self, expr: &ExprLoc) -> Option<ExprLoc> {
        let Expr::Call {
            func,
            args,
            // Keyword arguments are not matched against parameters; they
            // simply do not survive inlining.
            keywords: _,
            starargs,
            kwargs,
        } = &expr.expr
        else {
            return None;
        };
        if starargs.is_some() || kwargs.is_some() {
            return None;
        }
        let (params, body) = match &func.expr {
            Expr::Lambda { params, body } => (params, &**body),
            Expr::Name { id, ctx: NameCtx::Load } => match self.defs.get(id) {
                Some(Recorded::Inlinable(def)) => (&def.params, &def.body),
                _ => return None,
            },
            _ => return None,
        };
        if !params.all_simple() || params.params.len() != args.len() {
            return None;
        }
        let mut context: AHashMap<&str, &ExprLoc> = params
            .params
            .iter()
            .filter_map(|param| match param {
                Param::Name(name) => Some(name.as_str()),
                Param::Tuple(_) => None,
            })
            .zip(args)
            .collect();
        // Declared variadics receive empty containers: nothing can have
        // been spread into them.
        let empty_list = ExprLoc::new(expr.position, Expr::List(Vec::new()));
        if let Some(vararg) = &params.vararg {
            context.insert(vararg, &empty_list);
        }
        let empty_dict = ExprLoc::new(expr.position, Expr::Dict(Vec::new()));
        if let Some(kwarg) = &params.kwarg {
            context.insert(kwarg, &empty_dict);
        }
        let substituted = Substitute { context: &context }.rewrite_expr(body.clone());
        match substituted {
            Ok(substituted) => Some(substituted),
            Err(RewriteError::Recursion { .. }) => {
                unreachable!("substitution never re-enters the inliner")
            }
        }
    }
}

impl Rewrite for Inliner {
    fn rewrite_stmt(&mut self, stmt: StmtLoc) -> Result<StmtLoc, RewriteError> {
        // Record before walking the body, so self-calls resolve and a
        // definition is visible to everything after it.
        if let Stmt::FunctionDef(def) = &stmt.stmt {
            self.record(def);
        }
        rewrite::walk_stmt(self, stmt)
    }

    fn rewrite_expr(&mut self, expr: ExprLoc) -> Result<ExprLoc, RewriteError> {
        let expr = rewrite::walk_expr(self, expr)?;
        let Some(substituted) = self.substituted(&expr) else {
            return Ok(expr);
        };
        if self.depth >= INLINE_DEPTH_LIMIT {
            return Err(RewriteError::Recursion {
                limit: INLINE_DEPTH_LIMIT,
                depth: self.depth + 1,
            });
        }
        // Rewrite the substituted body too: the callee may itself call
        // something inlineable.
        self.depth += 1;
        let result = self.rewrite_expr(substituted);
        self.depth -= 1;
        result
    }
}

/// Checks a definition for the inlinable shape: a body that is exactly one
/// `return` with a value, and simple-name parameters only.
fn inlinable(def: &FunctionDef) -> Option<InlineDef> {
    let [StmtLoc {
        stmt: Stmt::Return(Some(body)),
        ..
    }] = def.body.as_slice()
    else {
        return None;
    };
    if !def.params.all_simple() {
        return None;
    }
    Some(InlineDef {
        params: def.params.clone(),
        body: body.clone(),
    })
}

/// Replaces parameter reads with the caller's argument nodes.
///
/// Only load-context names are replaced; assignment and deletion targets
/// (a comprehension target inside the body, say) keep their identifiers.
struct Substitute<'a> {
    context: &'a AHashMap<&'a str, &'a ExprLoc>,
}

impl Rewrite for Substitute<'_> {
    fn rewrite_expr(&mut self, expr: ExprLoc) -> Result<ExprLoc, RewriteError> {
        if let Expr::Name { id, ctx: NameCtx::Load } = &expr.expr {
            if let Some(arg) = self.context.get(id.as_str()) {
                return Ok((*arg).clone());
            }
        }
        rewrite::walk_expr(self, expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, Loc};

    fn int(n: i64) -> ExprLoc {
        ExprLoc::new(Loc::default(), Expr::Literal(Literal::Int(n)))
    }

    fn name(id: &str) -> ExprLoc {
        ExprLoc::new(Loc::default(), Expr::load(id))
    }

    fn call(func: ExprLoc, args: Vec<ExprLoc>) -> ExprLoc {
        ExprLoc::new(
            Loc::default(),
            Expr::Call {
                func: Box::new(func),
                args,
                keywords: Vec::new(),
                starargs: None,
                kwargs: None,
            },
        )
    }

    #[test]
    fn lambda_call_substitutes_the_argument() {
        let lambda = ExprLoc::new(
            Loc::default(),
            Expr::Lambda {
                params: Params {
                    params: vec![Param::Name("x".to_owned())],
                    ..Params::default()
                },
                body: Box::new(ExprLoc::new(
                    Loc::default(),
                    Expr::BinOp {
                        left: Box::new(name("x")),
                        op: crate::ast::BinOp::Mult,
                        right: Box::new(int(2)),
                    },
                )),
            },
        );
        let module = Module {
            body: vec![StmtLoc::new(Loc::default(), Stmt::Expr(call(lambda, vec![int(5)])))],
        };
        let inlined = inline_module(module).unwrap();
        let expect = ExprLoc::new(
            Loc::default(),
            Expr::BinOp {
                left: Box::new(int(5)),
                op: crate::ast::BinOp::Mult,
                right: Box::new(int(2)),
            },
        );
        assert_eq!(inlined.body[0].stmt, Stmt::Expr(expect));
    }

    #[test]
    fn arity_mismatch_leaves_the_call_alone() {
        let lambda = ExprLoc::new(
            Loc::default(),
            Expr::Lambda {
                params: Params {
                    params: vec![Param::Name("x".to_owned())],
                    ..Params::default()
                },
                body: Box::new(name("x")),
            },
        );
        let before = call(lambda, vec![int(1), int(2)]);
        let module = Module {
            body: vec![StmtLoc::new(Loc::default(), Stmt::Expr(before.clone()))],
        };
        let inlined = inline_module(module).unwrap();
        assert_eq!(inlined.body[0].stmt, Stmt::Expr(before));
    }
}
