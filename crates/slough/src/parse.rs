//! Recursive-descent parser producing the [`crate::ast`] tree.
//!
//! The grammar is the statement/expression subset described in the crate
//! docs. Constructs the toolkit deliberately does not model (generator
//! expressions, `yield`, `exec`, triple-quoted strings, arbitrary-precision
//! integers) parse to a [`ParseError::NotSupported`] rather than a lossy
//! approximation.

use std::borrow::Cow;
use std::fmt;

use ahash::AHashSet;

use crate::ast::{
    Alias, BinOp, BoolOp, ClassDef, CmpOp, Comprehension, ExceptHandler, Expr, ExprLoc,
    FunctionDef, Keyword, Literal, Loc, Module, NameCtx, Param, Params, Slice, Stmt, StmtLoc,
    UnaryOp,
};
use crate::lexer::{Token, lex};

/// Remaining nesting budget for recursive grammar productions. Decremented
/// on expression and statement descent so pathological inputs fail with an
/// error instead of exhausting the stack.
#[cfg(not(debug_assertions))]
const MAX_NESTING_DEPTH: u16 = 200;
/// Smaller budget in debug builds, where stack frames are fatter.
#[cfg(debug_assertions)]
const MAX_NESTING_DEPTH: u16 = 35;

/// Errors reported while tokenizing or parsing source text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Malformed input.
    Syntax {
        msg: Cow<'static, str>,
        position: Loc,
        /// Source label supplied to [`parse`]; empty until attached.
        label: String,
    },
    /// Valid source using a construct outside the modeled language.
    NotSupported {
        msg: Cow<'static, str>,
        position: Loc,
        label: String,
    },
}

impl ParseError {
    pub(crate) fn syntax(msg: impl Into<Cow<'static, str>>, position: Loc) -> Self {
        Self::Syntax {
            msg: msg.into(),
            position,
            label: String::new(),
        }
    }

    pub(crate) fn not_supported(msg: impl Into<Cow<'static, str>>, position: Loc) -> Self {
        Self::NotSupported {
            msg: msg.into(),
            position,
            label: String::new(),
        }
    }

    fn with_label(mut self, name: &str) -> Self {
        let (Self::Syntax { label, .. } | Self::NotSupported { label, .. }) = &mut self;
        name.clone_into(label);
        self
    }

    /// Where in the source the error was detected.
    #[must_use]
    pub fn position(&self) -> Loc {
        let (Self::Syntax { position, .. } | Self::NotSupported { position, .. }) = self;
        *position
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, msg, position, label) = match self {
            Self::Syntax { msg, position, label } => ("syntax error", msg, position, label),
            Self::NotSupported { msg, position, label } => ("not supported", msg, position, label),
        };
        if label.is_empty() {
            write!(f, "{position}: {kind}: {msg}")
        } else {
            write!(f, "{label}:{position}: {kind}: {msg}")
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses a source unit into a [`Module`].
///
/// `label` names the input (typically a file path) and is carried on any
/// resulting error; it does not affect parsing.
pub fn parse(source: &str, label: &str) -> Result<Module, ParseError> {
    parse_bare(source).map_err(|e| e.with_label(label))
}

fn parse_bare(source: &str) -> Result<Module, ParseError> {
    let tokens = lex(source)?;
    Parser::new(tokens).parse_module()
}

struct Parser {
    tokens: Vec<(Token, Loc)>,
    index: usize,
    /// Remaining depth budget; see [`MAX_NESTING_DEPTH`].
    depth_remaining: u16,
    /// Number of enclosing function bodies, for `return` placement checks.
    function_depth: usize,
    /// Number of enclosing loop bodies within the current function, for
    /// `break`/`continue` placement checks.
    loop_depth: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, Loc)>) -> Self {
        Self {
            tokens,
            index: 0,
            depth_remaining: MAX_NESTING_DEPTH,
            function_depth: 0,
            loop_depth: 0,
        }
    }

    // ---- token access ----

    fn peek(&self) -> &Token {
        &self.tokens[self.index].0
    }

    fn loc(&self) -> Loc {
        self.tokens[self.index].1
    }

    fn bump(&mut self) {
        // The stream ends with Eof, which is never consumed.
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<Loc, ParseError> {
        if self.peek() == token {
            let at = self.loc();
            self.bump();
            Ok(at)
        } else {
            let found = self.peek();
            Err(ParseError::syntax(
                format!("expected {token}, found {found}"),
                self.loc(),
            ))
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        if let Token::Name(name) = self.peek() {
            let name = name.clone();
            self.bump();
            Ok(name)
        } else {
            let found = self.peek();
            Err(ParseError::syntax(
                format!("expected a name, found {found}"),
                self.loc(),
            ))
        }
    }

    /// Charges one level of the nesting budget.
    fn descend(&mut self) -> Result<(), ParseError> {
        match self.depth_remaining.checked_sub(1) {
            Some(left) => {
                self.depth_remaining = left;
                Ok(())
            }
            None => Err(ParseError::syntax("too many nested structures", self.loc())),
        }
    }

    fn ascend(&mut self) {
        self.depth_remaining += 1;
    }

    // ---- statements ----

    fn parse_module(mut self) -> Result<Module, ParseError> {
        let mut body = Vec::new();
        while !matches!(self.peek(), Token::Eof) {
            if matches!(self.peek(), Token::Indent) {
                return Err(ParseError::syntax("unexpected indent", self.loc()));
            }
            self.parse_line_into(&mut body)?;
        }
        Ok(Module { body })
    }

    /// Parses one source line into `out`: a compound statement, or a run of
    /// semicolon-separated simple statements ending at a newline.
    fn parse_line_into(&mut self, out: &mut Vec<StmtLoc>) -> Result<(), ParseError> {
        if matches!(
            self.peek(),
            Token::KwIf
                | Token::KwWhile
                | Token::KwFor
                | Token::KwTry
                | Token::KwWith
                | Token::KwDef
                | Token::KwClass
                | Token::At
        ) {
            out.push(self.parse_compound()?);
            return Ok(());
        }
        loop {
            out.push(self.parse_simple()?);
            if !self.eat(&Token::Semicolon) || matches!(self.peek(), Token::Newline | Token::Eof) {
                break;
            }
        }
        self.expect(&Token::Newline)?;
        Ok(())
    }

    /// The statements of an indented block, up to its dedent.
    fn parse_block(&mut self) -> Result<Vec<StmtLoc>, ParseError> {
        self.expect(&Token::Indent)?;
        let mut body = Vec::new();
        while !matches!(self.peek(), Token::Dedent | Token::Eof) {
            self.parse_line_into(&mut body)?;
        }
        self.expect(&Token::Dedent)?;
        Ok(body)
    }

    /// A suite after a colon: either an indented block or simple statements
    /// on the same line.
    fn parse_suite(&mut self) -> Result<Vec<StmtLoc>, ParseError> {
        self.descend()?;
        let body = if self.eat(&Token::Newline) {
            self.parse_block()
        } else {
            let mut body = Vec::new();
            loop {
                body.push(self.parse_simple()?);
                if !self.eat(&Token::Semicolon) || matches!(self.peek(), Token::Newline | Token::Eof)
                {
                    break;
                }
            }
            self.expect(&Token::Newline)?;
            Ok(body)
        };
        self.ascend();
        body
    }

    fn parse_compound(&mut self) -> Result<StmtLoc, ParseError> {
        let at = self.loc();
        match self.peek() {
            Token::KwIf => self.parse_if(),
            Token::KwWhile => self.parse_while(),
            Token::KwFor => self.parse_for(),
            Token::KwTry => self.parse_try(),
            Token::KwWith => self.parse_with(),
            Token::KwDef => self.parse_def(Vec::new()),
            Token::KwClass => self.parse_class(Vec::new()),
            Token::At => self.parse_decorated(),
            _ => unreachable!("caller checked for a compound statement keyword"),
        }
        .map(|stmt| StmtLoc::new(at, stmt))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let if_at = self.loc();
        self.bump();
        // Collect the if/elif clauses flat, then fold them into nested If
        // statements from the back.
        let mut clauses = Vec::new();
        let test = self.parse_test()?;
        self.expect(&Token::Colon)?;
        clauses.push((if_at, test, self.parse_suite()?));
        loop {
            let at = self.loc();
            if !self.eat(&Token::KwElif) {
                break;
            }
            let test = self.parse_test()?;
            self.expect(&Token::Colon)?;
            clauses.push((at, test, self.parse_suite()?));
        }
        let mut tail = if self.eat(&Token::KwElse) {
            self.expect(&Token::Colon)?;
            self.parse_suite()?
        } else {
            Vec::new()
        };
        while let Some((at, test, body)) = clauses.pop() {
            let nested = Stmt::If {
                test,
                body,
                orelse: tail,
            };
            tail = vec![StmtLoc::new(at, nested)];
        }
        let Some(StmtLoc { stmt, .. }) = tail.pop() else {
            unreachable!("at least one clause was collected");
        };
        Ok(stmt)
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let test = self.parse_test()?;
        self.expect(&Token::Colon)?;
        self.loop_depth += 1;
        let body = self.parse_suite();
        self.loop_depth -= 1;
        let body = body?;
        let orelse = self.parse_loop_else()?;
        Ok(Stmt::While { test, body, orelse })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let target = self.parse_target_list()?;
        self.expect(&Token::KwIn)?;
        let iter = self.parse_testlist()?;
        self.expect(&Token::Colon)?;
        self.loop_depth += 1;
        let body = self.parse_suite();
        self.loop_depth -= 1;
        let body = body?;
        let orelse = self.parse_loop_else()?;
        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
        })
    }

    fn parse_loop_else(&mut self) -> Result<Vec<StmtLoc>, ParseError> {
        if self.eat(&Token::KwElse) {
            self.expect(&Token::Colon)?;
            self.parse_suite()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let try_at = self.loc();
        self.bump();
        self.expect(&Token::Colon)?;
        let body = self.parse_suite()?;

        let mut handlers = Vec::new();
        while matches!(self.peek(), Token::KwExcept) {
            let position = self.loc();
            self.bump();
            let mut exc_type = None;
            let mut name = None;
            if !matches!(self.peek(), Token::Colon) {
                exc_type = Some(self.parse_test()?);
                // `as name` or the legacy `, name` spelling.
                if self.eat(&Token::KwAs) || self.eat(&Token::Comma) {
                    let bound = self.parse_or_expr()?;
                    name = Some(into_target(bound, NameCtx::Store)?);
                }
            }
            self.expect(&Token::Colon)?;
            handlers.push(ExceptHandler {
                position,
                exc_type,
                name,
                body: self.parse_suite()?,
            });
        }

        let orelse = if !handlers.is_empty() && self.eat(&Token::KwElse) {
            self.expect(&Token::Colon)?;
            self.parse_suite()?
        } else {
            Vec::new()
        };

        let finalbody = if self.eat(&Token::KwFinally) {
            self.expect(&Token::Colon)?;
            Some(self.parse_suite()?)
        } else {
            None
        };

        match finalbody {
            None if handlers.is_empty() => Err(ParseError::syntax(
                "expected an 'except' or 'finally' clause",
                try_at,
            )),
            None => Ok(Stmt::TryExcept {
                body,
                handlers,
                orelse,
            }),
            Some(finalbody) if handlers.is_empty() => Ok(Stmt::TryFinally { body, finalbody }),
            Some(finalbody) => {
                // except and finally on one statement nest: the finally
                // wraps the whole try/except.
                let inner = Stmt::TryExcept {
                    body,
                    handlers,
                    orelse,
                };
                Ok(Stmt::TryFinally {
                    body: vec![StmtLoc::new(try_at, inner)],
                    finalbody,
                })
            }
        }
    }

    fn parse_with(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            let context = self.parse_test()?;
            let target = if self.eat(&Token::KwAs) {
                let bound = self.parse_or_expr()?;
                Some(into_target(bound, NameCtx::Store)?)
            } else {
                None
            };
            items.push((context, target));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::Colon)?;
        let suite = self.parse_suite()?;
        // Multiple context managers nest, innermost holding the suite.
        let Some((context, target)) = items.pop() else {
            unreachable!("the loop above always collects at least one item");
        };
        let mut inner_at = context.position;
        let mut stmt = Stmt::With {
            context,
            target,
            body: suite,
        };
        while let Some((context, target)) = items.pop() {
            let wrapped = vec![StmtLoc::new(inner_at, stmt)];
            inner_at = context.position;
            stmt = Stmt::With {
                context,
                target,
                body: wrapped,
            };
        }
        Ok(stmt)
    }

    fn parse_decorated(&mut self) -> Result<Stmt, ParseError> {
        let mut decorators = Vec::new();
        while self.eat(&Token::At) {
            decorators.push(self.parse_test()?);
            self.expect(&Token::Newline)?;
        }
        match self.peek() {
            Token::KwDef => self.parse_def(decorators),
            Token::KwClass => self.parse_class(decorators),
            _ => Err(ParseError::syntax(
                "decorators must precede a function or class definition",
                self.loc(),
            )),
        }
    }

    fn parse_def(&mut self, decorators: Vec<ExprLoc>) -> Result<Stmt, ParseError> {
        self.bump();
        let header_at = self.loc();
        let name = self.expect_name()?;
        self.expect(&Token::LParen)?;
        let params = self.parse_params(&Token::RParen)?;
        self.expect(&Token::RParen)?;
        check_duplicate_params(&params, header_at)?;
        self.expect(&Token::Colon)?;
        self.function_depth += 1;
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.parse_suite();
        self.loop_depth = saved_loops;
        self.function_depth -= 1;
        Ok(Stmt::FunctionDef(FunctionDef {
            name,
            params,
            decorators,
            body: body?,
        }))
    }

    fn parse_class(&mut self, decorators: Vec<ExprLoc>) -> Result<Stmt, ParseError> {
        self.bump();
        let name = self.expect_name()?;
        let mut bases = Vec::new();
        if self.eat(&Token::LParen) {
            while !matches!(self.peek(), Token::RParen) {
                bases.push(self.parse_test()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RParen)?;
        }
        self.expect(&Token::Colon)?;
        let body = self.parse_suite()?;
        Ok(Stmt::ClassDef(ClassDef {
            name,
            bases,
            decorators,
            body,
        }))
    }

    fn parse_simple(&mut self) -> Result<StmtLoc, ParseError> {
        let at = self.loc();
        let stmt = match self.peek() {
            Token::KwPass => {
                self.bump();
                Ok(Stmt::Pass)
            }
            Token::KwBreak => {
                self.bump();
                if self.loop_depth == 0 {
                    return Err(ParseError::syntax("'break' outside loop", at));
                }
                Ok(Stmt::Break)
            }
            Token::KwContinue => {
                self.bump();
                if self.loop_depth == 0 {
                    return Err(ParseError::syntax("'continue' not properly in loop", at));
                }
                Ok(Stmt::Continue)
            }
            Token::KwReturn => {
                self.bump();
                if self.function_depth == 0 {
                    return Err(ParseError::syntax("'return' outside function", at));
                }
                let value = if starts_expression(self.peek()) {
                    Some(self.parse_testlist()?)
                } else {
                    None
                };
                Ok(Stmt::Return(value))
            }
            Token::KwDel => self.parse_delete(),
            Token::KwPrint => self.parse_print(),
            Token::KwRaise => self.parse_raise(),
            Token::KwGlobal => self.parse_global(),
            Token::KwAssert => self.parse_assert(),
            Token::KwImport => self.parse_import(),
            Token::KwFrom => self.parse_import_from(),
            Token::KwExec => Err(ParseError::not_supported("the exec statement", at)),
            _ => self.parse_expr_stmt(),
        }?;
        Ok(StmtLoc::new(at, stmt))
    }

    fn parse_delete(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let mut targets = Vec::new();
        loop {
            let target = self.parse_or_expr()?;
            targets.push(into_target(target, NameCtx::Del)?);
            if !self.eat(&Token::Comma) || !starts_expression(self.peek()) {
                break;
            }
        }
        Ok(Stmt::Delete(targets))
    }

    fn parse_print(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let mut dest = None;
        let mut values = Vec::new();
        let mut newline = true;
        if self.eat(&Token::RShift) {
            dest = Some(self.parse_test()?);
            if !self.eat(&Token::Comma) {
                return Ok(Stmt::Print {
                    dest,
                    values,
                    newline,
                });
            }
        }
        while starts_expression(self.peek()) {
            values.push(self.parse_test()?);
            if !self.eat(&Token::Comma) {
                break;
            }
            if !starts_expression(self.peek()) {
                // Trailing comma suppresses the newline.
                newline = false;
                break;
            }
        }
        Ok(Stmt::Print {
            dest,
            values,
            newline,
        })
    }

    fn parse_raise(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let mut exc_type = None;
        let mut inst = None;
        let mut tback = None;
        if starts_expression(self.peek()) {
            exc_type = Some(self.parse_test()?);
            if self.eat(&Token::Comma) {
                inst = Some(self.parse_test()?);
                if self.eat(&Token::Comma) {
                    tback = Some(self.parse_test()?);
                }
            }
        }
        Ok(Stmt::Raise {
            exc_type,
            inst,
            tback,
        })
    }

    fn parse_global(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let mut names = vec![self.expect_name()?];
        while self.eat(&Token::Comma) {
            names.push(self.expect_name()?);
        }
        Ok(Stmt::Global(names))
    }

    fn parse_assert(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let test = self.parse_test()?;
        let msg = if self.eat(&Token::Comma) {
            Some(self.parse_test()?)
        } else {
            None
        };
        Ok(Stmt::Assert { test, msg })
    }

    fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        self.bump();
        let mut names = Vec::new();
        loop {
            names.push(self.parse_dotted_alias()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(Stmt::Import(names))
    }

    fn parse_dotted_alias(&mut self) -> Result<Alias, ParseError> {
        let mut name = self.expect_name()?;
        while self.eat(&Token::Dot) {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        let asname = if self.eat(&Token::KwAs) {
            Some(self.expect_name()?)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    fn parse_import_from(&mut self) -> Result<Stmt, ParseError> {
        let at = self.loc();
        self.bump();
        let mut level: u32 = 0;
        while self.eat(&Token::Dot) {
            level += 1;
        }
        let module = if matches!(self.peek(), Token::Name(_)) {
            let mut name = self.expect_name()?;
            while self.eat(&Token::Dot) {
                name.push('.');
                name.push_str(&self.expect_name()?);
            }
            name
        } else if level > 0 {
            String::new()
        } else {
            return Err(ParseError::syntax("expected a module name", self.loc()));
        };
        self.expect(&Token::KwImport)?;

        let names = if self.eat(&Token::Star) {
            vec![Alias {
                name: "*".to_owned(),
                asname: None,
            }]
        } else if self.eat(&Token::LParen) {
            let mut names = Vec::new();
            while !matches!(self.peek(), Token::RParen) {
                names.push(self.parse_plain_alias()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RParen)?;
            names
        } else {
            let mut names = vec![self.parse_plain_alias()?];
            while self.eat(&Token::Comma) {
                names.push(self.parse_plain_alias()?);
            }
            names
        };
        if names.is_empty() {
            return Err(ParseError::syntax("expected names to import", at));
        }
        Ok(Stmt::ImportFrom {
            module,
            names,
            level,
        })
    }

    fn parse_plain_alias(&mut self) -> Result<Alias, ParseError> {
        let name = self.expect_name()?;
        let asname = if self.eat(&Token::KwAs) {
            Some(self.expect_name()?)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    /// Expression statement, assignment, or augmented assignment.
    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let first = self.parse_testlist()?;
        if let Some(op) = aug_op(self.peek()) {
            self.bump();
            let target = into_target(first, NameCtx::Store)?;
            if !matches!(
                target.expr,
                Expr::Name { .. } | Expr::Attribute { .. } | Expr::Subscript { .. }
            ) {
                return Err(ParseError::syntax(
                    "illegal expression for augmented assignment",
                    target.position,
                ));
            }
            let value = self.parse_testlist()?;
            return Ok(Stmt::AugAssign { target, op, value });
        }
        if !matches!(self.peek(), Token::Assign) {
            return Ok(Stmt::Expr(first));
        }
        let mut parts = vec![first];
        while self.eat(&Token::Assign) {
            parts.push(self.parse_testlist()?);
        }
        let Some(value) = parts.pop() else {
            unreachable!("parts always holds the first expression");
        };
        let targets = parts
            .into_iter()
            .map(|part| into_target(part, NameCtx::Store))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Stmt::Assign { targets, value })
    }

    // ---- expressions ----

    /// A comma-separated expression list; two or more elements (or a
    /// trailing comma) make a tuple.
    fn parse_testlist(&mut self) -> Result<ExprLoc, ParseError> {
        let first = self.parse_test()?;
        if !matches!(self.peek(), Token::Comma) {
            return Ok(first);
        }
        let position = first.position;
        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if !starts_expression(self.peek()) {
                break;
            }
            elements.push(self.parse_test()?);
        }
        Ok(ExprLoc::new(position, Expr::Tuple(elements)))
    }

    /// An assignment-target list at `or_expr` precedence, so `in` stays
    /// available as a keyword (`for x in xs`).
    fn parse_target_list(&mut self) -> Result<ExprLoc, ParseError> {
        let first = self.parse_or_expr()?;
        let expr = if matches!(self.peek(), Token::Comma) {
            let position = first.position;
            let mut elements = vec![first];
            while self.eat(&Token::Comma) {
                if !starts_expression(self.peek()) {
                    break;
                }
                elements.push(self.parse_or_expr()?);
            }
            ExprLoc::new(position, Expr::Tuple(elements))
        } else {
            first
        };
        into_target(expr, NameCtx::Store)
    }

    /// Full expression: conditional or lambda.
    fn parse_test(&mut self) -> Result<ExprLoc, ParseError> {
        self.descend()?;
        let result = self.parse_test_inner();
        self.ascend();
        result
    }

    fn parse_test_inner(&mut self) -> Result<ExprLoc, ParseError> {
        if matches!(self.peek(), Token::KwLambda) {
            return self.parse_lambda();
        }
        let body = self.parse_or_test()?;
        if !self.eat(&Token::KwIf) {
            return Ok(body);
        }
        let test = self.parse_or_test()?;
        self.expect(&Token::KwElse)?;
        let orelse = self.parse_test()?;
        let position = body.position;
        Ok(ExprLoc::new(
            position,
            Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
        ))
    }

    fn parse_lambda(&mut self) -> Result<ExprLoc, ParseError> {
        let at = self.loc();
        self.bump();
        let params = self.parse_params(&Token::Colon)?;
        check_duplicate_params(&params, at)?;
        self.expect(&Token::Colon)?;
        let body = self.parse_test()?;
        Ok(ExprLoc::new(
            at,
            Expr::Lambda {
                params,
                body: Box::new(body),
            },
        ))
    }

    fn parse_or_test(&mut self) -> Result<ExprLoc, ParseError> {
        let first = self.parse_and_test()?;
        if !matches!(self.peek(), Token::KwOr) {
            return Ok(first);
        }
        let position = first.position;
        let mut values = vec![first];
        while self.eat(&Token::KwOr) {
            values.push(self.parse_and_test()?);
        }
        Ok(ExprLoc::new(
            position,
            Expr::BoolOp {
                op: BoolOp::Or,
                values,
            },
        ))
    }

    fn parse_and_test(&mut self) -> Result<ExprLoc, ParseError> {
        let first = self.parse_not_test()?;
        if !matches!(self.peek(), Token::KwAnd) {
            return Ok(first);
        }
        let position = first.position;
        let mut values = vec![first];
        while self.eat(&Token::KwAnd) {
            values.push(self.parse_not_test()?);
        }
        Ok(ExprLoc::new(
            position,
            Expr::BoolOp {
                op: BoolOp::And,
                values,
            },
        ))
    }

    fn parse_not_test(&mut self) -> Result<ExprLoc, ParseError> {
        let at = self.loc();
        if self.eat(&Token::KwNot) {
            self.descend()?;
            let operand = self.parse_not_test();
            self.ascend();
            return Ok(ExprLoc::new(
                at,
                Expr::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand?),
                },
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<ExprLoc, ParseError> {
        let left = self.parse_or_expr()?;
        let mut comparisons = Vec::new();
        while let Some(op) = self.eat_cmp_op()? {
            comparisons.push((op, self.parse_or_expr()?));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        let position = left.position;
        Ok(ExprLoc::new(
            position,
            Expr::Compare {
                left: Box::new(left),
                comparisons,
            },
        ))
    }

    fn eat_cmp_op(&mut self) -> Result<Option<CmpOp>, ParseError> {
        let op = match self.peek() {
            Token::Lt => CmpOp::Lt,
            Token::Gt => CmpOp::Gt,
            Token::LtE => CmpOp::LtE,
            Token::GtE => CmpOp::GtE,
            Token::EqEq => CmpOp::Eq,
            Token::NotEq => CmpOp::NotEq,
            Token::KwIn => CmpOp::In,
            Token::KwIs => {
                self.bump();
                let op = if self.eat(&Token::KwNot) {
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                };
                return Ok(Some(op));
            }
            Token::KwNot => {
                self.bump();
                self.expect(&Token::KwIn)?;
                return Ok(Some(CmpOp::NotIn));
            }
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(op))
    }

    fn parse_or_expr(&mut self) -> Result<ExprLoc, ParseError> {
        let mut left = self.parse_xor_expr()?;
        while self.eat(&Token::Pipe) {
            left = binary(left, BinOp::BitOr, self.parse_xor_expr()?);
        }
        Ok(left)
    }

    fn parse_xor_expr(&mut self) -> Result<ExprLoc, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.eat(&Token::Caret) {
            left = binary(left, BinOp::BitXor, self.parse_and_expr()?);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<ExprLoc, ParseError> {
        let mut left = self.parse_shift_expr()?;
        while self.eat(&Token::Amp) {
            left = binary(left, BinOp::BitAnd, self.parse_shift_expr()?);
        }
        Ok(left)
    }

    fn parse_shift_expr(&mut self) -> Result<ExprLoc, ParseError> {
        let mut left = self.parse_arith_expr()?;
        loop {
            let op = match self.peek() {
                Token::LShift => BinOp::LShift,
                Token::RShift => BinOp::RShift,
                _ => break,
            };
            self.bump();
            left = binary(left, op, self.parse_arith_expr()?);
        }
        Ok(left)
    }

    fn parse_arith_expr(&mut self) -> Result<ExprLoc, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            left = binary(left, op, self.parse_term()?);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<ExprLoc, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mult,
                Token::Slash => BinOp::Div,
                Token::DoubleSlash => BinOp::FloorDiv,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump();
            left = binary(left, op, self.parse_factor()?);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<ExprLoc, ParseError> {
        let at = self.loc();
        let op = match self.peek() {
            Token::Plus => UnaryOp::UAdd,
            Token::Minus => UnaryOp::USub,
            Token::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.bump();
        self.descend()?;
        let operand = self.parse_factor();
        self.ascend();
        Ok(ExprLoc::new(
            at,
            Expr::UnaryOp {
                op,
                operand: Box::new(operand?),
            },
        ))
    }

    fn parse_power(&mut self) -> Result<ExprLoc, ParseError> {
        let base = self.parse_atom_trailers()?;
        if !self.eat(&Token::DoubleStar) {
            return Ok(base);
        }
        // Right-associative, and the exponent may carry a leading sign.
        let exponent = self.parse_factor()?;
        Ok(binary(base, BinOp::Pow, exponent))
    }

    fn parse_atom_trailers(&mut self) -> Result<ExprLoc, ParseError> {
        let mut value = self.parse_atom()?;
        loop {
            match self.peek() {
                Token::LParen => {
                    value = self.parse_call(value)?;
                }
                Token::LBracket => {
                    self.bump();
                    let slice = self.parse_subscript_list()?;
                    self.expect(&Token::RBracket)?;
                    let position = value.position;
                    value = ExprLoc::new(
                        position,
                        Expr::Subscript {
                            value: Box::new(value),
                            slice: Box::new(slice),
                        },
                    );
                }
                Token::Dot => {
                    self.bump();
                    let attr = self.expect_name()?;
                    let position = value.position;
                    value = ExprLoc::new(
                        position,
                        Expr::Attribute {
                            value: Box::new(value),
                            attr,
                        },
                    );
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_call(&mut self, func: ExprLoc) -> Result<ExprLoc, ParseError> {
        self.bump();
        let mut args = Vec::new();
        let mut keywords: Vec<Keyword> = Vec::new();
        let mut starargs = None;
        let mut kwargs = None;
        while !matches!(self.peek(), Token::RParen) {
            let at = self.loc();
            if self.eat(&Token::DoubleStar) {
                kwargs = Some(Box::new(self.parse_test()?));
                break;
            }
            if self.eat(&Token::Star) {
                if starargs.is_some() {
                    return Err(ParseError::syntax("duplicate *expression in call", at));
                }
                starargs = Some(Box::new(self.parse_test()?));
            } else {
                let value = self.parse_test()?;
                if matches!(self.peek(), Token::KwFor) {
                    return Err(ParseError::not_supported("generator expressions", at));
                }
                if self.eat(&Token::Assign) {
                    let Expr::Name { id, .. } = value.expr else {
                        return Err(ParseError::syntax(
                            "keyword argument must be a plain name",
                            value.position,
                        ));
                    };
                    if keywords.iter().any(|k| k.name == id) {
                        return Err(ParseError::syntax(
                            format!("keyword argument repeated: {id}"),
                            at,
                        ));
                    }
                    keywords.push(Keyword {
                        name: id,
                        value: self.parse_test()?,
                    });
                } else {
                    if !keywords.is_empty() {
                        return Err(ParseError::syntax(
                            "non-keyword argument after keyword argument",
                            at,
                        ));
                    }
                    if starargs.is_some() {
                        return Err(ParseError::syntax(
                            "only named arguments may follow *expression",
                            at,
                        ));
                    }
                    args.push(value);
                }
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        let position = func.position;
        Ok(ExprLoc::new(
            position,
            Expr::Call {
                func: Box::new(func),
                args,
                keywords,
                starargs,
                kwargs,
            },
        ))
    }

    fn parse_subscript_list(&mut self) -> Result<Slice, ParseError> {
        let mut slices = vec![self.parse_subscript()?];
        let mut had_comma = false;
        while self.eat(&Token::Comma) {
            had_comma = true;
            if matches!(self.peek(), Token::RBracket) {
                break;
            }
            slices.push(self.parse_subscript()?);
        }
        if !had_comma {
            let Some(only) = slices.pop() else {
                unreachable!("one subscript was parsed above");
            };
            return Ok(only);
        }
        // A comma-joined list of plain indexes is a tuple index; any range
        // in the list makes it a multi-dimension subscript.
        if slices.iter().all(|s| matches!(s, Slice::Index(_))) {
            let elements: Vec<ExprLoc> = slices
                .into_iter()
                .map(|s| match s {
                    Slice::Index(expr) => expr,
                    Slice::Range { .. } | Slice::Extended(_) => {
                        unreachable!("checked to be plain indexes")
                    }
                })
                .collect();
            let position = elements
                .first()
                .map_or_else(Loc::default, |e| e.position);
            Ok(Slice::Index(ExprLoc::new(position, Expr::Tuple(elements))))
        } else {
            Ok(Slice::Extended(slices))
        }
    }

    fn parse_subscript(&mut self) -> Result<Slice, ParseError> {
        let lower = if matches!(self.peek(), Token::Colon) {
            None
        } else {
            Some(self.parse_test()?)
        };
        if !self.eat(&Token::Colon) {
            let Some(index) = lower else {
                let found = self.peek();
                return Err(ParseError::syntax(
                    format!("expected a subscript, found {found}"),
                    self.loc(),
                ));
            };
            return Ok(Slice::Index(index));
        }
        let upper = if matches!(self.peek(), Token::Colon | Token::Comma | Token::RBracket) {
            None
        } else {
            Some(self.parse_test()?)
        };
        let step = if self.eat(&Token::Colon)
            && !matches!(self.peek(), Token::Comma | Token::RBracket)
        {
            Some(self.parse_test()?)
        } else {
            None
        };
        Ok(Slice::Range { lower, upper, step })
    }

    fn parse_atom(&mut self) -> Result<ExprLoc, ParseError> {
        let at = self.loc();
        match self.peek().clone() {
            Token::Name(name) => {
                self.bump();
                Ok(ExprLoc::new(at, Expr::load(name)))
            }
            Token::Int(value) => {
                self.bump();
                Ok(ExprLoc::new(at, Expr::Literal(Literal::Int(value))))
            }
            Token::Float(value) => {
                self.bump();
                Ok(ExprLoc::new(at, Expr::Literal(Literal::Float(value))))
            }
            Token::Str(value) => {
                self.bump();
                // Adjacent string literals concatenate.
                let mut text = value;
                while let Token::Str(next) = self.peek() {
                    text.push_str(next);
                    self.bump();
                }
                Ok(ExprLoc::new(at, Expr::Literal(Literal::Str(text))))
            }
            Token::KwNone => {
                self.bump();
                Ok(ExprLoc::new(at, Expr::Literal(Literal::None)))
            }
            Token::KwTrue => {
                self.bump();
                Ok(ExprLoc::new(at, Expr::Literal(Literal::Bool(true))))
            }
            Token::KwFalse => {
                self.bump();
                Ok(ExprLoc::new(at, Expr::Literal(Literal::Bool(false))))
            }
            Token::LParen => self.parse_paren(),
            Token::LBracket => self.parse_bracket(),
            Token::LBrace => self.parse_brace(),
            Token::Backtick => {
                self.bump();
                let value = self.parse_testlist()?;
                self.expect(&Token::Backtick)?;
                Ok(ExprLoc::new(at, Expr::Repr(Box::new(value))))
            }
            Token::KwYield => Err(ParseError::not_supported("yield expressions", at)),
            found => Err(ParseError::syntax(format!("unexpected {found}"), at)),
        }
    }

    fn parse_paren(&mut self) -> Result<ExprLoc, ParseError> {
        let at = self.loc();
        self.bump();
        if self.eat(&Token::RParen) {
            return Ok(ExprLoc::new(at, Expr::Tuple(Vec::new())));
        }
        let first = self.parse_test()?;
        if matches!(self.peek(), Token::KwFor) {
            return Err(ParseError::not_supported("generator expressions", at));
        }
        if matches!(self.peek(), Token::Comma) {
            let mut elements = vec![first];
            while self.eat(&Token::Comma) {
                if matches!(self.peek(), Token::RParen) {
                    break;
                }
                elements.push(self.parse_test()?);
            }
            self.expect(&Token::RParen)?;
            return Ok(ExprLoc::new(at, Expr::Tuple(elements)));
        }
        self.expect(&Token::RParen)?;
        // Plain grouping; the inner expression keeps its own position.
        Ok(first)
    }

    fn parse_bracket(&mut self) -> Result<ExprLoc, ParseError> {
        let at = self.loc();
        self.bump();
        if self.eat(&Token::RBracket) {
            return Ok(ExprLoc::new(at, Expr::List(Vec::new())));
        }
        let first = self.parse_test()?;
        if matches!(self.peek(), Token::KwFor) {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&Token::RBracket)?;
            return Ok(ExprLoc::new(
                at,
                Expr::ListComp {
                    elt: Box::new(first),
                    generators,
                },
            ));
        }
        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if matches!(self.peek(), Token::RBracket) {
                break;
            }
            elements.push(self.parse_test()?);
        }
        self.expect(&Token::RBracket)?;
        Ok(ExprLoc::new(at, Expr::List(elements)))
    }

    fn parse_brace(&mut self) -> Result<ExprLoc, ParseError> {
        let at = self.loc();
        self.bump();
        // `{}` is always an empty dict.
        if self.eat(&Token::RBrace) {
            return Ok(ExprLoc::new(at, Expr::Dict(Vec::new())));
        }
        let first = self.parse_test()?;
        if self.eat(&Token::Colon) {
            let value = self.parse_test()?;
            if matches!(self.peek(), Token::KwFor) {
                let generators = self.parse_comprehension_clauses()?;
                self.expect(&Token::RBrace)?;
                return Ok(ExprLoc::new(
                    at,
                    Expr::DictComp {
                        key: Box::new(first),
                        value: Box::new(value),
                        generators,
                    },
                ));
            }
            let mut entries = vec![(first, value)];
            while self.eat(&Token::Comma) {
                if matches!(self.peek(), Token::RBrace) {
                    break;
                }
                let key = self.parse_test()?;
                self.expect(&Token::Colon)?;
                entries.push((key, self.parse_test()?));
            }
            self.expect(&Token::RBrace)?;
            return Ok(ExprLoc::new(at, Expr::Dict(entries)));
        }
        if matches!(self.peek(), Token::KwFor) {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&Token::RBrace)?;
            return Ok(ExprLoc::new(
                at,
                Expr::SetComp {
                    elt: Box::new(first),
                    generators,
                },
            ));
        }
        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if matches!(self.peek(), Token::RBrace) {
                break;
            }
            elements.push(self.parse_test()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(ExprLoc::new(at, Expr::Set(elements)))
    }

    /// One or more `for target in iter [if cond]...` clauses.
    fn parse_comprehension_clauses(&mut self) -> Result<Vec<Comprehension>, ParseError> {
        let mut generators = Vec::new();
        while self.eat(&Token::KwFor) {
            let target = self.parse_target_list()?;
            self.expect(&Token::KwIn)?;
            // The iterable sits below the conditional level so a bare `if`
            // always starts a filter clause.
            let iter = self.parse_comprehension_iter()?;
            let mut ifs = Vec::new();
            while self.eat(&Token::KwIf) {
                ifs.push(self.parse_or_test()?);
            }
            generators.push(Comprehension { target, iter, ifs });
        }
        Ok(generators)
    }

    fn parse_comprehension_iter(&mut self) -> Result<ExprLoc, ParseError> {
        let first = self.parse_or_test()?;
        if !matches!(self.peek(), Token::Comma) {
            return Ok(first);
        }
        let position = first.position;
        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            elements.push(self.parse_or_test()?);
        }
        Ok(ExprLoc::new(position, Expr::Tuple(elements)))
    }

    /// A parameter list, for `def` (terminated by `)`) or `lambda`
    /// (terminated by `:`).
    fn parse_params(&mut self, terminator: &Token) -> Result<Params, ParseError> {
        let mut params = Params::default();
        loop {
            if self.peek() == terminator {
                break;
            }
            let at = self.loc();
            if self.eat(&Token::DoubleStar) {
                params.kwarg = Some(self.expect_name()?);
                break;
            }
            if self.eat(&Token::Star) {
                params.vararg = Some(self.expect_name()?);
                if self.eat(&Token::Comma) {
                    let kw_at = self.loc();
                    if self.eat(&Token::DoubleStar) {
                        params.kwarg = Some(self.expect_name()?);
                    } else {
                        return Err(ParseError::syntax(
                            "expected '**' after '*name,' in parameter list",
                            kw_at,
                        ));
                    }
                }
                break;
            }
            let param = self.parse_param()?;
            if self.eat(&Token::Assign) {
                params.defaults.push(self.parse_test()?);
            } else if !params.defaults.is_empty() {
                return Err(ParseError::syntax(
                    "non-default argument follows default argument",
                    at,
                ));
            }
            params.params.push(param);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        if self.eat(&Token::LParen) {
            let mut parts = Vec::new();
            let mut saw_comma = false;
            loop {
                parts.push(self.parse_param()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
                saw_comma = true;
                if matches!(self.peek(), Token::RParen) {
                    break;
                }
            }
            self.expect(&Token::RParen)?;
            // A lone parenthesized name is grouping, not a one-element
            // tuple pattern: that needs the trailing comma.
            if parts.len() == 1 && !saw_comma {
                Ok(parts.remove(0))
            } else {
                Ok(Param::Tuple(parts))
            }
        } else {
            Ok(Param::Name(self.expect_name()?))
        }
    }
}

/// Joins two operands into a [`Expr::BinOp`] node carrying the left
/// operand's position.
fn binary(left: ExprLoc, op: BinOp, right: ExprLoc) -> ExprLoc {
    let position = left.position;
    ExprLoc::new(
        position,
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
    )
}

fn aug_op(token: &Token) -> Option<BinOp> {
    Some(match token {
        Token::PlusEq => BinOp::Add,
        Token::MinusEq => BinOp::Sub,
        Token::StarEq => BinOp::Mult,
        Token::SlashEq => BinOp::Div,
        Token::DoubleSlashEq => BinOp::FloorDiv,
        Token::PercentEq => BinOp::Mod,
        Token::DoubleStarEq => BinOp::Pow,
        Token::LShiftEq => BinOp::LShift,
        Token::RShiftEq => BinOp::RShift,
        Token::AmpEq => BinOp::BitAnd,
        Token::PipeEq => BinOp::BitOr,
        Token::CaretEq => BinOp::BitXor,
        _ => return None,
    })
}

/// True when `token` can begin an expression. Used to decide whether an
/// optional expression (a `return` value, print arguments, a trailing
/// comma's successor) is present.
fn starts_expression(token: &Token) -> bool {
    matches!(
        token,
        Token::Name(_)
            | Token::Int(_)
            | Token::Float(_)
            | Token::Str(_)
            | Token::KwNone
            | Token::KwTrue
            | Token::KwFalse
            | Token::KwNot
            | Token::KwLambda
            | Token::KwYield
            | Token::Plus
            | Token::Minus
            | Token::Tilde
            | Token::LParen
            | Token::LBracket
            | Token::LBrace
            | Token::Backtick
    )
}

/// Rebuilds an expression as an assignment or deletion target, tagging
/// names with `ctx` and rejecting shapes that cannot be bound.
fn into_target(expr: ExprLoc, ctx: NameCtx) -> Result<ExprLoc, ParseError> {
    let ExprLoc { position, expr } = expr;
    let verb = match ctx {
        NameCtx::Del => "delete",
        NameCtx::Load | NameCtx::Store => "assign to",
    };
    let converted = match expr {
        Expr::Name { id, .. } => Expr::Name { id, ctx },
        Expr::Tuple(elements) => Expr::Tuple(
            elements
                .into_iter()
                .map(|e| into_target(e, ctx))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Expr::List(elements) => Expr::List(
            elements
                .into_iter()
                .map(|e| into_target(e, ctx))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        keep @ (Expr::Attribute { .. } | Expr::Subscript { .. }) => keep,
        Expr::Literal(Literal::None) => {
            return Err(ParseError::syntax(format!("cannot {verb} None"), position));
        }
        Expr::Literal(Literal::Bool(value)) => {
            let spelled = if value { "True" } else { "False" };
            return Err(ParseError::syntax(
                format!("cannot {verb} {spelled}"),
                position,
            ));
        }
        other => {
            let what = describe_expr(&other);
            return Err(ParseError::syntax(
                format!("cannot {verb} {what}"),
                position,
            ));
        }
    };
    Ok(ExprLoc::new(position, converted))
}

fn describe_expr(expr: &Expr) -> &'static str {
    match expr {
        Expr::Literal(_) => "a literal",
        Expr::Call { .. } => "a function call",
        Expr::Lambda { .. } => "a lambda",
        Expr::Repr(_) => "a repr expression",
        Expr::Dict(_) | Expr::DictComp { .. } => "a dict display",
        Expr::Set(_) | Expr::SetComp { .. } => "a set display",
        Expr::ListComp { .. } => "a list comprehension",
        Expr::Name { .. }
        | Expr::Tuple(_)
        | Expr::List(_)
        | Expr::Attribute { .. }
        | Expr::Subscript { .. }
        | Expr::BoolOp { .. }
        | Expr::BinOp { .. }
        | Expr::UnaryOp { .. }
        | Expr::Compare { .. }
        | Expr::IfExp { .. } => "an expression",
    }
}

/// Rejects parameter lists that bind the same name twice.
fn check_duplicate_params(params: &Params, at: Loc) -> Result<(), ParseError> {
    fn collect<'p>(param: &'p Param, names: &mut Vec<&'p str>) {
        match param {
            Param::Name(name) => names.push(name),
            Param::Tuple(parts) => {
                for part in parts {
                    collect(part, names);
                }
            }
        }
    }
    let mut names: Vec<&str> = Vec::new();
    for param in &params.params {
        collect(param, &mut names);
    }
    if let Some(name) = &params.vararg {
        names.push(name);
    }
    if let Some(name) = &params.kwarg {
        names.push(name);
    }
    let mut seen = AHashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name) {
            return Err(ParseError::syntax(
                format!("duplicate argument '{name}' in function definition"),
                at,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Stmt {
        let module = parse(source, "test").unwrap();
        assert_eq!(module.body.len(), 1, "expected one statement");
        module.body.into_iter().next().unwrap().stmt
    }

    fn parse_expr(source: &str) -> Expr {
        match parse_one(source) {
            Stmt::Expr(expr) => expr.expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn chained_assignment_collects_targets() {
        let Stmt::Assign { targets, value } = parse_one("a = b = 3\n") else {
            panic!("expected an assignment");
        };
        assert_eq!(targets.len(), 2);
        assert!(matches!(
            targets[0].expr,
            Expr::Name {
                ctx: NameCtx::Store,
                ..
            }
        ));
        assert_eq!(value.expr, Expr::Literal(Literal::Int(3)));
    }

    #[test]
    fn tuple_unpacking_target() {
        let Stmt::Assign { targets, .. } = parse_one("a, b = pair\n") else {
            panic!("expected an assignment");
        };
        assert_eq!(targets.len(), 1);
        let Expr::Tuple(elements) = &targets[0].expr else {
            panic!("expected a tuple target");
        };
        assert!(elements
            .iter()
            .all(|e| matches!(e.expr, Expr::Name { ctx: NameCtx::Store, .. })));
    }

    #[test]
    fn elif_chain_nests_in_orelse() {
        let source = "if a:\n    x\nelif b:\n    y\nelse:\n    z\n";
        let Stmt::If { orelse, .. } = parse_one(source) else {
            panic!("expected an if statement");
        };
        assert_eq!(orelse.len(), 1);
        let Stmt::If {
            orelse: ref inner, ..
        } = orelse[0].stmt
        else {
            panic!("expected the elif to nest as an if");
        };
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn except_and_finally_nest() {
        let source = "try:\n    a\nexcept E, err:\n    b\nfinally:\n    c\n";
        let Stmt::TryFinally { body, finalbody } = parse_one(source) else {
            panic!("expected try/finally at the top");
        };
        assert_eq!(finalbody.len(), 1);
        let Stmt::TryExcept { ref handlers, .. } = body[0].stmt else {
            panic!("expected a nested try/except");
        };
        assert_eq!(handlers.len(), 1);
        assert!(handlers[0].name.is_some());
    }

    #[test]
    fn print_trailing_comma_suppresses_newline() {
        let Stmt::Print {
            dest,
            values,
            newline,
        } = parse_one("print a, b,\n")
        else {
            panic!("expected a print statement");
        };
        assert!(dest.is_none());
        assert_eq!(values.len(), 2);
        assert!(!newline);
    }

    #[test]
    fn print_with_destination() {
        let Stmt::Print { dest, values, .. } = parse_one("print >>log, x\n") else {
            panic!("expected a print statement");
        };
        assert!(dest.is_some());
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn comparison_chain_stays_flat() {
        let Expr::Compare { comparisons, .. } = parse_expr("1 < x <= 10\n") else {
            panic!("expected a comparison");
        };
        assert_eq!(
            comparisons.iter().map(|(op, _)| *op).collect::<Vec<_>>(),
            vec![CmpOp::Lt, CmpOp::LtE]
        );
    }

    #[test]
    fn boolean_chain_stays_flat() {
        let Expr::BoolOp { op, values } = parse_expr("a or b or c\n") else {
            panic!("expected a boolean chain");
        };
        assert_eq!(op, BoolOp::Or);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn power_is_right_associative() {
        let Expr::BinOp { op, right, .. } = parse_expr("2 ** 3 ** 2\n") else {
            panic!("expected a power expression");
        };
        assert_eq!(op, BinOp::Pow);
        assert!(matches!(
            right.expr,
            Expr::BinOp {
                op: BinOp::Pow,
                ..
            }
        ));
    }

    #[test]
    fn one_tuple_requires_trailing_comma() {
        assert!(matches!(parse_expr("(x,)\n"), Expr::Tuple(ref e) if e.len() == 1));
        assert!(matches!(parse_expr("(x)\n"), Expr::Name { .. }));
        assert!(matches!(parse_expr("x,\n"), Expr::Tuple(ref e) if e.len() == 1));
    }

    #[test]
    fn empty_braces_are_a_dict() {
        assert_eq!(parse_expr("{}\n"), Expr::Dict(Vec::new()));
        assert!(matches!(parse_expr("{1}\n"), Expr::Set(ref e) if e.len() == 1));
    }

    #[test]
    fn adjacent_strings_concatenate() {
        assert_eq!(
            parse_expr("'ab' 'cd'\n"),
            Expr::Literal(Literal::Str("abcd".to_owned()))
        );
    }

    #[test]
    fn backtick_repr() {
        assert!(matches!(parse_expr("`x`\n"), Expr::Repr(_)));
    }

    #[test]
    fn tuple_index_versus_extended_slice() {
        let Expr::Subscript { slice, .. } = parse_expr("a[1, 2]\n") else {
            panic!("expected a subscript");
        };
        assert!(matches!(*slice, Slice::Index(ExprLoc {
            expr: Expr::Tuple(_),
            ..
        })));
        let Expr::Subscript { slice, .. } = parse_expr("a[1:2, 3]\n") else {
            panic!("expected a subscript");
        };
        assert!(matches!(*slice, Slice::Extended(ref parts) if parts.len() == 2));
    }

    #[test]
    fn call_argument_order_is_enforced() {
        let err = parse("f(a=1, b)\n", "test").unwrap_err();
        assert!(err.to_string().contains("non-keyword argument"));
        let err = parse("f(*a, b)\n", "test").unwrap_err();
        assert!(err.to_string().contains("named arguments"));
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let err = parse("def f(a, a):\n    pass\n", "test").unwrap_err();
        assert!(err.to_string().contains("duplicate argument 'a'"));
        let err = parse("lambda x, (y, x): y\n", "test").unwrap_err();
        assert!(err.to_string().contains("duplicate argument 'x'"));
    }

    #[test]
    fn parenthesized_parameter_forms() {
        let Stmt::FunctionDef(def) = parse_one("def f((a, b), (c), (d,)):\n    pass\n") else {
            panic!("expected a function definition");
        };
        assert_eq!(
            def.params.params,
            vec![
                Param::Tuple(vec![
                    Param::Name("a".to_owned()),
                    Param::Name("b".to_owned()),
                ]),
                Param::Name("c".to_owned()),
                Param::Tuple(vec![Param::Name("d".to_owned())]),
            ]
        );
    }

    #[test]
    fn reserved_words_cannot_be_targets() {
        let err = parse("None = 1\n", "test").unwrap_err();
        assert!(err.to_string().contains("cannot assign to None"));
        let err = parse("True = 1\n", "test").unwrap_err();
        assert!(err.to_string().contains("cannot assign to True"));
        let err = parse("del 1\n", "test").unwrap_err();
        assert!(err.to_string().contains("cannot delete a literal"));
    }

    #[test]
    fn unsupported_constructs_fail_fast() {
        for (source, needle) in [
            ("x = (i for i in y)\n", "generator expressions"),
            ("f(i for i in y)\n", "generator expressions"),
            ("exec 'code'\n", "exec statement"),
            ("x = yield 1\n", "yield"),
            ("s = '''doc'''\n", "triple-quoted"),
            ("s = u'text'\n", "string prefixes"),
            ("n = 1j\n", "imaginary"),
            ("n = 10L\n", "long integer"),
            ("n = 99999999999999999999\n", "64 bits"),
        ] {
            let err = parse(source, "test").unwrap_err();
            assert!(
                matches!(err, ParseError::NotSupported { .. }),
                "{source:?} should be a not-supported error, got {err:?}"
            );
            assert!(
                err.to_string().contains(needle),
                "{source:?}: message {err} should mention {needle:?}"
            );
        }
    }

    #[test]
    fn statement_placement_checks() {
        assert!(parse("return 1\n", "test").is_err());
        assert!(parse("break\n", "test").is_err());
        assert!(parse("def f():\n    break\n", "test").is_err());
        assert!(parse("while x:\n    break\n", "test").is_ok());
        assert!(parse("def f():\n    return 1\n", "test").is_ok());
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let depth = usize::from(MAX_NESTING_DEPTH) + 5;
        let source = format!("x = {}y{}\n", "(".repeat(depth), ")".repeat(depth));
        let err = parse(&source, "test").unwrap_err();
        assert!(err.to_string().contains("too many nested"));
    }

    #[test]
    fn error_display_carries_the_label() {
        let err = parse("x = )\n", "bad.py").unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("bad.py:1:"), "got {text}");
    }

    #[test]
    fn semicolons_separate_simple_statements() {
        let module = parse("a = 1; b = 2; c = 3\n", "test").unwrap();
        assert_eq!(module.body.len(), 3);
    }

    #[test]
    fn with_statement_forms() {
        let Stmt::With { target, .. } = parse_one("with open(p) as f:\n    pass\n") else {
            panic!("expected a with statement");
        };
        assert!(target.is_some());
        // Two managers nest.
        let Stmt::With { body, .. } = parse_one("with a, b:\n    pass\n") else {
            panic!("expected a with statement");
        };
        assert_eq!(body.len(), 1);
        assert!(matches!(body[0].stmt, Stmt::With { .. }));
    }

    #[test]
    fn relative_import_levels() {
        let Stmt::ImportFrom { module, level, .. } = parse_one("from ..pkg import name\n")
        else {
            panic!("expected an import");
        };
        assert_eq!(module, "pkg");
        assert_eq!(level, 2);
        let Stmt::ImportFrom { module, level, .. } = parse_one("from . import name\n") else {
            panic!("expected an import");
        };
        assert_eq!(module, "");
        assert_eq!(level, 1);
    }

    #[test]
    fn lambda_body_stops_before_comma() {
        // The comma belongs to the enclosing tuple, not the lambda body.
        let Expr::Tuple(elements) = parse_expr("(lambda x: x, 1)\n") else {
            panic!("expected a tuple");
        };
        assert_eq!(elements.len(), 2);
        assert!(matches!(elements[0].expr, Expr::Lambda { .. }));
    }
}
