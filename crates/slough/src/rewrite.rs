//! Owning tree-to-tree transformation.
//!
//! [`Rewrite`] is the contract every transform pass implements: each hook
//! consumes a node and returns a replacement of the same category, so a pass
//! can never leave an expression where a statement belongs. Hooks default to
//! the matching `walk_*` function, which rebuilds the node with rewritten
//! children; an override that wants the default recursion beneath it calls
//! that same `walk_*` itself.

use std::fmt;

use crate::ast::{
    ClassDef, Comprehension, ExceptHandler, Expr, ExprLoc, FunctionDef, Keyword, Module, Params, Slice, Stmt, StmtLoc,
};

/// Error returned when a rewrite pass exceeds a resource bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteError {
    /// Maximum substitution depth exceeded while inlining.
    Recursion { limit: u32, depth: u32 },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recursion { limit, depth } => {
                write!(f, "maximum inline substitution depth exceeded: {depth} > {limit}")
            }
        }
    }
}

impl std::error::Error for RewriteError {}

/// An owning transform over modules, statements and expressions.
pub trait Rewrite {
    fn rewrite_module(&mut self, module: Module) -> Result<Module, RewriteError> {
        walk_module(self, module)
    }

    fn rewrite_stmt(&mut self, stmt: StmtLoc) -> Result<StmtLoc, RewriteError> {
        walk_stmt(self, stmt)
    }

    fn rewrite_expr(&mut self, expr: ExprLoc) -> Result<ExprLoc, RewriteError> {
        walk_expr(self, expr)
    }
}

/// Rewrites every statement in the module body.
pub fn walk_module<R: Rewrite + ?Sized>(r: &mut R, module: Module) -> Result<Module, RewriteError> {
    Ok(Module {
        body: walk_body(r, module.body)?,
    })
}

/// Rewrites a statement list in order.
pub fn walk_body<R: Rewrite + ?Sized>(r: &mut R, body: Vec<StmtLoc>) -> Result<Vec<StmtLoc>, RewriteError> {
    body.into_iter().map(|stmt| r.rewrite_stmt(stmt)).collect()
}

/// Rebuilds a statement with every child rewritten.
pub fn walk_stmt<R: Rewrite + ?Sized>(r: &mut R, stmt: StmtLoc) -> Result<StmtLoc, RewriteError> {
    let StmtLoc { position, stmt } = stmt;
    let stmt = match stmt {
        Stmt::Expr(value) => Stmt::Expr(r.rewrite_expr(value)?),
        Stmt::Assign { targets, value } => Stmt::Assign {
            targets: exprs(r, targets)?,
            value: r.rewrite_expr(value)?,
        },
        Stmt::AugAssign { target, op, value } => Stmt::AugAssign {
            target: r.rewrite_expr(target)?,
            op,
            value: r.rewrite_expr(value)?,
        },
        Stmt::Return(value) => Stmt::Return(opt(r, value)?),
        Stmt::Delete(targets) => Stmt::Delete(exprs(r, targets)?),
        Stmt::Print { dest, values, newline } => Stmt::Print {
            dest: opt(r, dest)?,
            values: exprs(r, values)?,
            newline,
        },
        Stmt::For {
            target,
            iter,
            body,
            orelse,
        } => Stmt::For {
            target: r.rewrite_expr(target)?,
            iter: r.rewrite_expr(iter)?,
            body: walk_body(r, body)?,
            orelse: walk_body(r, orelse)?,
        },
        Stmt::While { test, body, orelse } => Stmt::While {
            test: r.rewrite_expr(test)?,
            body: walk_body(r, body)?,
            orelse: walk_body(r, orelse)?,
        },
        Stmt::If { test, body, orelse } => Stmt::If {
            test: r.rewrite_expr(test)?,
            body: walk_body(r, body)?,
            orelse: walk_body(r, orelse)?,
        },
        Stmt::With { context, target, body } => Stmt::With {
            context: r.rewrite_expr(context)?,
            target: opt(r, target)?,
            body: walk_body(r, body)?,
        },
        Stmt::Raise { exc_type, inst, tback } => Stmt::Raise {
            exc_type: opt(r, exc_type)?,
            inst: opt(r, inst)?,
            tback: opt(r, tback)?,
        },
        Stmt::TryExcept { body, handlers, orelse } => Stmt::TryExcept {
            body: walk_body(r, body)?,
            handlers: handlers
                .into_iter()
                .map(|handler| {
                    Ok(ExceptHandler {
                        position: handler.position,
                        exc_type: opt(r, handler.exc_type)?,
                        name: opt(r, handler.name)?,
                        body: walk_body(r, handler.body)?,
                    })
                })
                .collect::<Result<_, RewriteError>>()?,
            orelse: walk_body(r, orelse)?,
        },
        Stmt::TryFinally { body, finalbody } => Stmt::TryFinally {
            body: walk_body(r, body)?,
            finalbody: walk_body(r, finalbody)?,
        },
        Stmt::Assert { test, msg } => Stmt::Assert {
            test: r.rewrite_expr(test)?,
            msg: opt(r, msg)?,
        },
        Stmt::FunctionDef(def) => Stmt::FunctionDef(FunctionDef {
            name: def.name,
            params: walk_params(r, def.params)?,
            decorators: exprs(r, def.decorators)?,
            body: walk_body(r, def.body)?,
        }),
        Stmt::ClassDef(def) => Stmt::ClassDef(ClassDef {
            name: def.name,
            bases: exprs(r, def.bases)?,
            decorators: exprs(r, def.decorators)?,
            body: walk_body(r, def.body)?,
        }),
        passthrough @ (Stmt::Import(_)
        | Stmt::ImportFrom { .. }
        | Stmt::Global(_)
        | Stmt::Pass
        | Stmt::Break
        | Stmt::Continue) => passthrough,
    };
    Ok(StmtLoc { position, stmt })
}

/// Rebuilds an expression with every child rewritten.
pub fn walk_expr<R: Rewrite + ?Sized>(r: &mut R, expr: ExprLoc) -> Result<ExprLoc, RewriteError> {
    let ExprLoc { position, expr } = expr;
    let expr = match expr {
        leaf @ (Expr::Literal(_) | Expr::Name { .. }) => leaf,
        Expr::Repr(value) => Expr::Repr(boxed(r, value)?),
        Expr::Tuple(elts) => Expr::Tuple(exprs(r, elts)?),
        Expr::List(elts) => Expr::List(exprs(r, elts)?),
        Expr::Set(elts) => Expr::Set(exprs(r, elts)?),
        Expr::Dict(pairs) => Expr::Dict(
            pairs
                .into_iter()
                .map(|(key, value)| Ok((r.rewrite_expr(key)?, r.rewrite_expr(value)?)))
                .collect::<Result<_, RewriteError>>()?,
        ),
        Expr::BoolOp { op, values } => Expr::BoolOp {
            op,
            values: exprs(r, values)?,
        },
        Expr::BinOp { left, op, right } => Expr::BinOp {
            left: boxed(r, left)?,
            op,
            right: boxed(r, right)?,
        },
        Expr::UnaryOp { op, operand } => Expr::UnaryOp {
            op,
            operand: boxed(r, operand)?,
        },
        Expr::Compare { left, comparisons } => Expr::Compare {
            left: boxed(r, left)?,
            comparisons: comparisons
                .into_iter()
                .map(|(op, comparator)| Ok((op, r.rewrite_expr(comparator)?)))
                .collect::<Result<_, RewriteError>>()?,
        },
        Expr::IfExp { test, body, orelse } => Expr::IfExp {
            test: boxed(r, test)?,
            body: boxed(r, body)?,
            orelse: boxed(r, orelse)?,
        },
        Expr::Lambda { params, body } => Expr::Lambda {
            params: walk_params(r, params)?,
            body: boxed(r, body)?,
        },
        Expr::Call {
            func,
            args,
            keywords,
            starargs,
            kwargs,
        } => Expr::Call {
            func: boxed(r, func)?,
            args: exprs(r, args)?,
            keywords: keywords
                .into_iter()
                .map(|keyword| {
                    Ok(Keyword {
                        name: keyword.name,
                        value: r.rewrite_expr(keyword.value)?,
                    })
                })
                .collect::<Result<_, RewriteError>>()?,
            starargs: opt_boxed(r, starargs)?,
            kwargs: opt_boxed(r, kwargs)?,
        },
        Expr::Attribute { value, attr } => Expr::Attribute {
            value: boxed(r, value)?,
            attr,
        },
        Expr::Subscript { value, slice } => Expr::Subscript {
            value: boxed(r, value)?,
            slice: Box::new(walk_slice(r, *slice)?),
        },
        Expr::ListComp { elt, generators } => Expr::ListComp {
            elt: boxed(r, elt)?,
            generators: walk_generators(r, generators)?,
        },
        Expr::SetComp { elt, generators } => Expr::SetComp {
            elt: boxed(r, elt)?,
            generators: walk_generators(r, generators)?,
        },
        Expr::DictComp {
            key,
            value,
            generators,
        } => Expr::DictComp {
            key: boxed(r, key)?,
            value: boxed(r, value)?,
            generators: walk_generators(r, generators)?,
        },
    };
    Ok(ExprLoc { position, expr })
}

/// Rebuilds a subscript index with rewritten bound expressions.
pub fn walk_slice<R: Rewrite + ?Sized>(r: &mut R, slice: Slice) -> Result<Slice, RewriteError> {
    Ok(match slice {
        Slice::Index(index) => Slice::Index(r.rewrite_expr(index)?),
        Slice::Range { lower, upper, step } => Slice::Range {
            lower: opt(r, lower)?,
            upper: opt(r, upper)?,
            step: opt(r, step)?,
        },
        Slice::Extended(dims) => Slice::Extended(
            dims.into_iter()
                .map(|dim| walk_slice(r, dim))
                .collect::<Result<_, _>>()?,
        ),
    })
}

fn walk_params<R: Rewrite + ?Sized>(r: &mut R, params: Params) -> Result<Params, RewriteError> {
    Ok(Params {
        params: params.params,
        defaults: exprs(r, params.defaults)?,
        vararg: params.vararg,
        kwarg: params.kwarg,
    })
}

fn walk_generators<R: Rewrite + ?Sized>(
    r: &mut R,
    generators: Vec<Comprehension>,
) -> Result<Vec<Comprehension>, RewriteError> {
    generators
        .into_iter()
        .map(|clause| {
            Ok(Comprehension {
                target: r.rewrite_expr(clause.target)?,
                iter: r.rewrite_expr(clause.iter)?,
                ifs: exprs(r, clause.ifs)?,
            })
        })
        .collect()
}

fn exprs<R: Rewrite + ?Sized>(r: &mut R, list: Vec<ExprLoc>) -> Result<Vec<ExprLoc>, RewriteError> {
    list.into_iter().map(|expr| r.rewrite_expr(expr)).collect()
}

fn opt<R: Rewrite + ?Sized>(r: &mut R, value: Option<ExprLoc>) -> Result<Option<ExprLoc>, RewriteError> {
    value.map(|expr| r.rewrite_expr(expr)).transpose()
}

fn boxed<R: Rewrite + ?Sized>(r: &mut R, value: Box<ExprLoc>) -> Result<Box<ExprLoc>, RewriteError> {
    Ok(Box::new(r.rewrite_expr(*value)?))
}

fn opt_boxed<R: Rewrite + ?Sized>(
    r: &mut R,
    value: Option<Box<ExprLoc>>,
) -> Result<Option<Box<ExprLoc>>, RewriteError> {
    value.map(|expr| boxed(r, expr)).transpose()
}
