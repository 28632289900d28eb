//! Rendering trees back to surface text.
//!
//! Three dialects share one driver. [`Target::Python`] re-renders the native
//! syntax and round-trips through the parser; [`Target::Js`] translates to a
//! JavaScript-flavored surface; [`Target::JsV2`] refines that translation
//! with literal sentinels, a builtin-name mapping, and a truncating
//! floor-division wrapper.
//!
//! A construct the selected dialect cannot express aborts the whole render
//! with [`EmitError::Unsupported`]. No dialect silently drops or
//! mis-renders a node; either the full program renders or nothing does.

mod js;
pub(crate) mod python;

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use strum::{Display, EnumString};

use crate::ast::{ExprLoc, Loc, Module, StmtLoc};

use self::js::Js;
use self::python::Python;

/// Spaces added per block level.
const INDENT: u32 = 4;

/// Output dialect selector.
///
/// Parses from and displays as the selector tokens the command-line driver
/// accepts: `py`, `js`, `js2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Target {
    /// Native syntax re-rendering.
    #[strum(serialize = "py")]
    Python,
    /// JavaScript-flavored translation.
    #[strum(serialize = "js")]
    Js,
    /// JavaScript translation with literal sentinels, builtin mapping, and
    /// truncating floor division.
    #[strum(serialize = "js2")]
    JsV2,
}

impl Target {
    fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Python => &Python,
            Self::Js => &Js::V1,
            Self::JsV2 => &Js::V2,
        }
    }
}

/// Fatal rendering failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The selected dialect has no valid rendering for a construct.
    Unsupported {
        construct: Cow<'static, str>,
        dialect: &'static str,
        line: u32,
    },
}

impl EmitError {
    fn unsupported(dialect: &'static str, construct: impl Into<Cow<'static, str>>, position: Loc) -> Self {
        Self::Unsupported {
            construct: construct.into(),
            dialect,
            line: position.line,
        }
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { construct, dialect, line } => {
                write!(f, "line {line}: {construct} cannot be expressed in the {dialect} dialect")
            }
        }
    }
}

impl Error for EmitError {}

/// One output dialect: an expression renderer plus a statement renderer
/// that threads an explicit indent through nested blocks.
trait Dialect {
    /// Label used in error messages.
    fn name(&self) -> &'static str;

    fn expr(&self, expr: &ExprLoc) -> Result<String, EmitError>;

    fn stmt(&self, out: &mut Output, stmt: &StmtLoc, indent: u32) -> Result<(), EmitError>;
}

/// Accumulates emitted lines, each prefixed by its indent in spaces.
#[derive(Default)]
struct Output {
    text: String,
}

impl Output {
    fn line(&mut self, indent: u32, content: &str) {
        for _ in 0..indent {
            self.text.push(' ');
        }
        self.text.push_str(content);
        self.text.push('\n');
    }
}

/// Renders a full module in the given dialect.
pub fn decompile(module: &Module, target: Target) -> Result<String, EmitError> {
    let dialect = target.dialect();
    let mut out = Output::default();
    for stmt in &module.body {
        dialect.stmt(&mut out, stmt, 0)?;
    }
    Ok(out.text)
}

/// Renders a single expression in the given dialect. Used by tooling that
/// needs inline snippets rather than whole programs.
pub fn decompile_expr(expr: &ExprLoc, target: Target) -> Result<String, EmitError> {
    target.dialect().expr(expr)
}
