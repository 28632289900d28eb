//! Read-only traversal over the tree.
//!
//! Implement [`Visit`] and override only the methods you care about; every
//! hook defaults to the matching `walk_*` function, which recurses into all
//! children. Call that `walk_*` function from inside an override to continue
//! the default recursion beneath the node you intercepted.

use crate::ast::{Expr, ExprLoc, Module, Params, Slice, Stmt, StmtLoc};

/// A read-only visitor over modules, statements and expressions.
pub trait Visit {
    fn visit_module(&mut self, module: &Module) {
        walk_module(self, module);
    }

    fn visit_stmt(&mut self, stmt: &StmtLoc) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &ExprLoc) {
        walk_expr(self, expr);
    }
}

/// Visits every statement in the module body.
pub fn walk_module<V: Visit + ?Sized>(v: &mut V, module: &Module) {
    for stmt in &module.body {
        v.visit_stmt(stmt);
    }
}

/// Visits every child of a statement, dispatching on its variant.
pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &StmtLoc) {
    match &stmt.stmt {
        Stmt::Expr(value) => v.visit_expr(value),
        Stmt::Assign { targets, value } => {
            for target in targets {
                v.visit_expr(target);
            }
            v.visit_expr(value);
        }
        Stmt::AugAssign { target, op: _, value } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        Stmt::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::Delete(targets) => {
            for target in targets {
                v.visit_expr(target);
            }
        }
        Stmt::Print { dest, values, newline: _ } => {
            if let Some(dest) = dest {
                v.visit_expr(dest);
            }
            for value in values {
                v.visit_expr(value);
            }
        }
        Stmt::For {
            target,
            iter,
            body,
            orelse,
        } => {
            v.visit_expr(target);
            v.visit_expr(iter);
            walk_body(v, body);
            walk_body(v, orelse);
        }
        Stmt::While { test, body, orelse } | Stmt::If { test, body, orelse } => {
            v.visit_expr(test);
            walk_body(v, body);
            walk_body(v, orelse);
        }
        Stmt::With { context, target, body } => {
            v.visit_expr(context);
            if let Some(target) = target {
                v.visit_expr(target);
            }
            walk_body(v, body);
        }
        Stmt::Raise { exc_type, inst, tback } => {
            for part in [exc_type, inst, tback].into_iter().flatten() {
                v.visit_expr(part);
            }
        }
        Stmt::TryExcept { body, handlers, orelse } => {
            walk_body(v, body);
            for handler in handlers {
                if let Some(exc_type) = &handler.exc_type {
                    v.visit_expr(exc_type);
                }
                if let Some(name) = &handler.name {
                    v.visit_expr(name);
                }
                walk_body(v, &handler.body);
            }
            walk_body(v, orelse);
        }
        Stmt::TryFinally { body, finalbody } => {
            walk_body(v, body);
            walk_body(v, finalbody);
        }
        Stmt::Assert { test, msg } => {
            v.visit_expr(test);
            if let Some(msg) = msg {
                v.visit_expr(msg);
            }
        }
        Stmt::FunctionDef(def) => {
            for decorator in &def.decorators {
                v.visit_expr(decorator);
            }
            walk_params(v, &def.params);
            walk_body(v, &def.body);
        }
        Stmt::ClassDef(def) => {
            for decorator in &def.decorators {
                v.visit_expr(decorator);
            }
            for base in &def.bases {
                v.visit_expr(base);
            }
            walk_body(v, &def.body);
        }
        Stmt::Import(_)
        | Stmt::ImportFrom { .. }
        | Stmt::Global(_)
        | Stmt::Pass
        | Stmt::Break
        | Stmt::Continue => {}
    }
}

/// Visits every child of an expression, dispatching on its variant.
pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &ExprLoc) {
    match &expr.expr {
        Expr::Literal(_) | Expr::Name { .. } => {}
        Expr::Repr(value) | Expr::Attribute { value, .. } => v.visit_expr(value),
        Expr::Tuple(elts) | Expr::List(elts) | Expr::Set(elts) => {
            for elt in elts {
                v.visit_expr(elt);
            }
        }
        Expr::Dict(pairs) => {
            for (key, value) in pairs {
                v.visit_expr(key);
                v.visit_expr(value);
            }
        }
        Expr::BoolOp { op: _, values } => {
            for value in values {
                v.visit_expr(value);
            }
        }
        Expr::BinOp { left, op: _, right } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        Expr::UnaryOp { op: _, operand } => v.visit_expr(operand),
        Expr::Compare { left, comparisons } => {
            v.visit_expr(left);
            for (_, comparator) in comparisons {
                v.visit_expr(comparator);
            }
        }
        Expr::IfExp { test, body, orelse } => {
            v.visit_expr(test);
            v.visit_expr(body);
            v.visit_expr(orelse);
        }
        Expr::Lambda { params, body } => {
            walk_params(v, params);
            v.visit_expr(body);
        }
        Expr::Call {
            func,
            args,
            keywords,
            starargs,
            kwargs,
        } => {
            v.visit_expr(func);
            for arg in args {
                v.visit_expr(arg);
            }
            for keyword in keywords {
                v.visit_expr(&keyword.value);
            }
            if let Some(starargs) = starargs {
                v.visit_expr(starargs);
            }
            if let Some(kwargs) = kwargs {
                v.visit_expr(kwargs);
            }
        }
        Expr::Subscript { value, slice } => {
            v.visit_expr(value);
            walk_slice(v, slice);
        }
        Expr::ListComp { elt, generators } | Expr::SetComp { elt, generators } => {
            v.visit_expr(elt);
            walk_generators(v, generators);
        }
        Expr::DictComp {
            key,
            value,
            generators,
        } => {
            v.visit_expr(key);
            v.visit_expr(value);
            walk_generators(v, generators);
        }
    }
}

/// Visits the expressions inside a subscript index.
pub fn walk_slice<V: Visit + ?Sized>(v: &mut V, slice: &Slice) {
    match slice {
        Slice::Index(index) => v.visit_expr(index),
        Slice::Range { lower, upper, step } => {
            for bound in [lower, upper, step].into_iter().flatten() {
                v.visit_expr(bound);
            }
        }
        Slice::Extended(dims) => {
            for dim in dims {
                walk_slice(v, dim);
            }
        }
    }
}

fn walk_body<V: Visit + ?Sized>(v: &mut V, body: &[StmtLoc]) {
    for stmt in body {
        v.visit_stmt(stmt);
    }
}

fn walk_params<V: Visit + ?Sized>(v: &mut V, params: &Params) {
    for default in &params.defaults {
        v.visit_expr(default);
    }
}

fn walk_generators<V: Visit + ?Sized>(v: &mut V, generators: &[crate::ast::Comprehension]) {
    for clause in generators {
        v.visit_expr(&clause.target);
        v.visit_expr(&clause.iter);
        for cond in &clause.ifs {
            v.visit_expr(cond);
        }
    }
}
