use std::fmt;

/// A line/column pair identifying where a node came from in the source.
///
/// Lines and columns are 1-based. Every node in the tree carries one so that
/// reporting tools (and decompile errors) can point back at the input even
/// after rewrite passes have replaced the node's children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Loc {
    pub line: u32,
    pub column: u32,
}

impl Loc {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A literal constant value.
///
/// The source spellings `True`, `False` and `None` are canonicalized to
/// `Bool`/`None` variants at parse time rather than being carried around as
/// plain identifiers, so passes can match on them without string comparison.
/// They are reserved: using them as an assignment target is a syntax error.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    /// Always finite; the parser rejects literals that overflow to infinity.
    Float(f64),
    Str(String),
}

/// How a name is being used at its occurrence site.
///
/// Assignment targets and `del` targets are tagged at parse time so that
/// passes can tell a read from a binding without re-deriving it from the
/// surrounding statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCtx {
    Load,
    Store,
    Del,
}

/// Unary operators: `~x`, `not x`, `+x`, `-x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Invert,
    Not,
    UAdd,
    USub,
}

/// Binary operators, including floor division and power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

/// Short-circuiting boolean operators.
///
/// `and`/`or` return operand values, not booleans: `0 or "x"` evaluates to
/// `"x"`. The folding pass honors this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operators usable in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

/// An expression with its source location.
#[derive(Debug, Clone)]
pub struct ExprLoc {
    pub position: Loc,
    pub expr: Expr,
}

impl ExprLoc {
    #[must_use]
    pub fn new(position: Loc, expr: Expr) -> Self {
        Self { position, expr }
    }
}

/// Structural equality, ignoring source locations.
///
/// Rewrite passes allocate replacement nodes carrying the original location,
/// and reparsing printed output assigns fresh locations; comparing trees
/// "deep-equal modulo location metadata" is the useful notion everywhere.
impl PartialEq for ExprLoc {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

/// An expression in the AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name {
        id: String,
        ctx: NameCtx,
    },
    /// Backtick repr expression: `` `x` ``.
    Repr(Box<ExprLoc>),
    Tuple(Vec<ExprLoc>),
    List(Vec<ExprLoc>),
    /// Set literal. Insertion order is preserved; `{}` is always a dict.
    Set(Vec<ExprLoc>),
    Dict(Vec<(ExprLoc, ExprLoc)>),
    /// Boolean chain: `a and b and c` / `a or b or c`.
    ///
    /// Kept n-ary rather than nested binary so the folding pass can apply
    /// the short-circuit value rule across the whole chain at once.
    BoolOp {
        op: BoolOp,
        values: Vec<ExprLoc>,
    },
    BinOp {
        left: Box<ExprLoc>,
        op: BinOp,
        right: Box<ExprLoc>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<ExprLoc>,
    },
    /// Comparison chain: `a < b < c`.
    ///
    /// Each link compares against the running left value and the chain
    /// short-circuits on the first false link, so `a < b < c` means
    /// `a < b and b < c`, never `(a < b) < c`.
    Compare {
        left: Box<ExprLoc>,
        comparisons: Vec<(CmpOp, ExprLoc)>,
    },
    /// Conditional expression: `body if test else orelse`.
    IfExp {
        test: Box<ExprLoc>,
        body: Box<ExprLoc>,
        orelse: Box<ExprLoc>,
    },
    Lambda {
        params: Params,
        body: Box<ExprLoc>,
    },
    Call {
        func: Box<ExprLoc>,
        args: Vec<ExprLoc>,
        keywords: Vec<Keyword>,
        /// Variadic-positional spread at the call site: `f(*xs)`.
        starargs: Option<Box<ExprLoc>>,
        /// Variadic-keyword spread at the call site: `f(**kw)`.
        kwargs: Option<Box<ExprLoc>>,
    },
    Attribute {
        value: Box<ExprLoc>,
        attr: String,
    },
    Subscript {
        value: Box<ExprLoc>,
        slice: Box<Slice>,
    },
    ListComp {
        elt: Box<ExprLoc>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: Box<ExprLoc>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<ExprLoc>,
        value: Box<ExprLoc>,
        generators: Vec<Comprehension>,
    },
}

impl Expr {
    /// Builds a load-context name reference.
    #[must_use]
    pub fn load(id: impl Into<String>) -> Self {
        Self::Name {
            id: id.into(),
            ctx: NameCtx::Load,
        }
    }
}

/// The index part of a subscript expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Slice {
    /// Plain index: `a[i]`.
    Index(ExprLoc),
    /// Range slice: `a[lo:hi]` or `a[lo:hi:step]`, each bound optional.
    Range {
        lower: Option<ExprLoc>,
        upper: Option<ExprLoc>,
        step: Option<ExprLoc>,
    },
    /// Multi-dimension subscript: `a[i:j, k]`.
    Extended(Vec<Slice>),
}

/// A named argument at a call site: `f(name=value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: ExprLoc,
}

/// One `for` clause of a comprehension with its filters:
/// `for target in iter [if cond]...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: ExprLoc,
    pub iter: ExprLoc,
    pub ifs: Vec<ExprLoc>,
}

/// A formal parameter: a simple name or a nested tuple pattern
/// (`def f(a, (b, c)):`).
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Name(String),
    Tuple(Vec<Param>),
}

/// The parameter list of a function or lambda.
///
/// `defaults` align with the tail of `params`: with three parameters and two
/// defaults, the defaults belong to the second and third parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Params {
    pub params: Vec<Param>,
    pub defaults: Vec<ExprLoc>,
    pub vararg: Option<String>,
    pub kwarg: Option<String>,
}

impl Params {
    /// True when every positional parameter is a simple name (no tuple
    /// destructuring). The inliner only substitutes into such lists.
    #[must_use]
    pub fn all_simple(&self) -> bool {
        self.params.iter().all(|p| matches!(p, Param::Name(_)))
    }
}

/// An aliased name in an import: `name` or `name as asname`.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

/// One `except` clause of a try/except statement.
///
/// `exc_type` is absent for a bare `except:`; `name` is the bound target of
/// `except E as x` (or the legacy `except E, x` spelling).
#[derive(Debug, Clone)]
pub struct ExceptHandler {
    pub position: Loc,
    pub exc_type: Option<ExprLoc>,
    pub name: Option<ExprLoc>,
    pub body: Vec<StmtLoc>,
}

impl PartialEq for ExceptHandler {
    fn eq(&self, other: &Self) -> bool {
        self.exc_type == other.exc_type && self.name == other.name && self.body == other.body
    }
}

/// A function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Params,
    pub decorators: Vec<ExprLoc>,
    pub body: Vec<StmtLoc>,
}

/// A class definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<ExprLoc>,
    pub decorators: Vec<ExprLoc>,
    pub body: Vec<StmtLoc>,
}

/// A statement with its source location.
#[derive(Debug, Clone)]
pub struct StmtLoc {
    pub position: Loc,
    pub stmt: Stmt,
}

impl StmtLoc {
    #[must_use]
    pub fn new(position: Loc, stmt: Stmt) -> Self {
        Self { position, stmt }
    }
}

/// Structural equality, ignoring source locations (see [`ExprLoc`]).
impl PartialEq for StmtLoc {
    fn eq(&self, other: &Self) -> bool {
        self.stmt == other.stmt
    }
}

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(ExprLoc),
    /// Assignment with one or more targets: `a = b = value`.
    ///
    /// A tuple-unpacking assignment (`a, b = value`) has a single Tuple
    /// target; chained assignment has several targets sharing one value.
    Assign {
        targets: Vec<ExprLoc>,
        value: ExprLoc,
    },
    AugAssign {
        target: ExprLoc,
        op: BinOp,
        value: ExprLoc,
    },
    Return(Option<ExprLoc>),
    Delete(Vec<ExprLoc>),
    /// Print statement: `print >>dest, a, b,`.
    ///
    /// A trailing comma in the source suppresses the newline.
    Print {
        dest: Option<ExprLoc>,
        values: Vec<ExprLoc>,
        newline: bool,
    },
    For {
        target: ExprLoc,
        iter: ExprLoc,
        body: Vec<StmtLoc>,
        /// Runs when the loop completes without `break`.
        orelse: Vec<StmtLoc>,
    },
    While {
        test: ExprLoc,
        body: Vec<StmtLoc>,
        orelse: Vec<StmtLoc>,
    },
    /// Conditional. `elif` chains are nested: each `elif` is a single `If`
    /// statement in the previous branch's `orelse`.
    If {
        test: ExprLoc,
        body: Vec<StmtLoc>,
        orelse: Vec<StmtLoc>,
    },
    With {
        context: ExprLoc,
        target: Option<ExprLoc>,
        body: Vec<StmtLoc>,
    },
    /// Raise statement: bare `raise`, `raise exc`, or the long form
    /// `raise type, instance, traceback`.
    Raise {
        exc_type: Option<ExprLoc>,
        inst: Option<ExprLoc>,
        tback: Option<ExprLoc>,
    },
    TryExcept {
        body: Vec<StmtLoc>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<StmtLoc>,
    },
    /// `try`/`finally`. Source combining `except` and `finally` clauses
    /// parses as a TryFinally wrapping a TryExcept.
    TryFinally {
        body: Vec<StmtLoc>,
        finalbody: Vec<StmtLoc>,
    },
    Assert {
        test: ExprLoc,
        msg: Option<ExprLoc>,
    },
    Import(Vec<Alias>),
    ImportFrom {
        /// Dotted module path; empty for `from . import x`.
        module: String,
        names: Vec<Alias>,
        /// Number of leading relative-import dots.
        level: u32,
    },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Global(Vec<String>),
    Pass,
    Break,
    Continue,
}

/// A parsed program: the root of the tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub body: Vec<StmtLoc>,
}
