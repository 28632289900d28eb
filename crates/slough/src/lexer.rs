//! Tokenizer for the source language.
//!
//! logos handles the within-line tokens; this module layers the line
//! structure on top: logical `Newline` tokens, `Indent`/`Dedent` pairs
//! driven by an indentation stack, suppression of all three inside
//! brackets, backslash line joining, and comment/blank-line elision.
//!
//! Indentation is spaces-only; a tab in leading whitespace is an error
//! rather than a guess at a tab width.

use logos::Logos;

use crate::ast::Loc;
use crate::parse::ParseError;

/// A token with everything the parser needs resolved: keywords separated
/// from names, literal values decoded, and line structure made explicit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Newline,
    Indent,
    Dedent,
    Eof,

    Name(String),
    Int(i64),
    Float(f64),
    Str(String),

    KwAnd,
    KwAs,
    KwAssert,
    KwBreak,
    KwClass,
    KwContinue,
    KwDef,
    KwDel,
    KwElif,
    KwElse,
    KwExcept,
    KwExec,
    KwFalse,
    KwFinally,
    KwFor,
    KwFrom,
    KwGlobal,
    KwIf,
    KwImport,
    KwIn,
    KwIs,
    KwLambda,
    KwNone,
    KwNot,
    KwOr,
    KwPass,
    KwPrint,
    KwRaise,
    KwReturn,
    KwTrue,
    KwTry,
    KwWhile,
    KwWith,
    KwYield,

    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LShift,
    RShift,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Lt,
    Gt,
    LtE,
    GtE,
    EqEq,
    NotEq,
    Assign,
    PlusEq,
    MinusEq,
    StarEq,
    DoubleStarEq,
    SlashEq,
    DoubleSlashEq,
    PercentEq,
    LShiftEq,
    RShiftEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Semicolon,
    At,
    Backtick,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Newline => "end of line",
            Self::Indent => "indent",
            Self::Dedent => "dedent",
            Self::Eof => "end of file",
            Self::Name(name) => return write!(f, "name '{name}'"),
            Self::Int(_) | Self::Float(_) => "number",
            Self::Str(_) => "string",
            Self::KwAnd => "'and'",
            Self::KwAs => "'as'",
            Self::KwAssert => "'assert'",
            Self::KwBreak => "'break'",
            Self::KwClass => "'class'",
            Self::KwContinue => "'continue'",
            Self::KwDef => "'def'",
            Self::KwDel => "'del'",
            Self::KwElif => "'elif'",
            Self::KwElse => "'else'",
            Self::KwExcept => "'except'",
            Self::KwExec => "'exec'",
            Self::KwFalse => "'False'",
            Self::KwFinally => "'finally'",
            Self::KwFor => "'for'",
            Self::KwFrom => "'from'",
            Self::KwGlobal => "'global'",
            Self::KwIf => "'if'",
            Self::KwImport => "'import'",
            Self::KwIn => "'in'",
            Self::KwIs => "'is'",
            Self::KwLambda => "'lambda'",
            Self::KwNone => "'None'",
            Self::KwNot => "'not'",
            Self::KwOr => "'or'",
            Self::KwPass => "'pass'",
            Self::KwPrint => "'print'",
            Self::KwRaise => "'raise'",
            Self::KwReturn => "'return'",
            Self::KwTrue => "'True'",
            Self::KwTry => "'try'",
            Self::KwWhile => "'while'",
            Self::KwWith => "'with'",
            Self::KwYield => "'yield'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::DoubleStar => "'**'",
            Self::Slash => "'/'",
            Self::DoubleSlash => "'//'",
            Self::Percent => "'%'",
            Self::LShift => "'<<'",
            Self::RShift => "'>>'",
            Self::Amp => "'&'",
            Self::Pipe => "'|'",
            Self::Caret => "'^'",
            Self::Tilde => "'~'",
            Self::Lt => "'<'",
            Self::Gt => "'>'",
            Self::LtE => "'<='",
            Self::GtE => "'>='",
            Self::EqEq => "'=='",
            Self::NotEq => "'!='",
            Self::Assign => "'='",
            Self::PlusEq => "'+='",
            Self::MinusEq => "'-='",
            Self::StarEq => "'*='",
            Self::DoubleStarEq => "'**='",
            Self::SlashEq => "'/='",
            Self::DoubleSlashEq => "'//='",
            Self::PercentEq => "'%='",
            Self::LShiftEq => "'<<='",
            Self::RShiftEq => "'>>='",
            Self::AmpEq => "'&='",
            Self::PipeEq => "'|='",
            Self::CaretEq => "'^='",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Comma => "','",
            Self::Colon => "':'",
            Self::Dot => "'.'",
            Self::Semicolon => "';'",
            Self::At => "'@'",
            Self::Backtick => "'`'",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum LexFault {
    #[default]
    Unexpected,
    IntOutOfRange,
    BadOctal,
    FloatOutOfRange,
    BadEscape,
}

/// Raw lexical shapes. Line structure and keyword resolution happen in the
/// conversion pass over this stream.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexFault)]
enum Raw {
    /// A newline together with the next line's leading whitespace.
    #[regex(r"\r?\n[ \t]*")]
    Newline,

    /// Escaped newline: explicit line joining, indentation insignificant.
    #[regex(r"\\\r?\n[ \t]*", logos::skip)]
    Continuation,

    #[regex(r"[ \t]+", logos::skip)]
    Space,

    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[regex(r"'([^'\\\r\n]|\\[^\r\n])*'", unescape)]
    #[regex(r#""([^"\\\r\n]|\\[^\r\n])*""#, unescape)]
    Str(String),

    #[regex(r#"'''|""""#)]
    TripleQuote,

    #[regex(r#"[rRuUbB]['"]"#)]
    StringPrefix,

    #[regex(r"0[xX][0-9a-fA-F]+", |lex| radix_int(&lex.slice()[2..], 16))]
    #[regex(r"0[oO][0-7]+", |lex| radix_int(&lex.slice()[2..], 8))]
    #[regex(r"0[bB][01]+", |lex| radix_int(&lex.slice()[2..], 2))]
    #[regex(r"[0-9]+", decimal_int)]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", float_literal)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", float_literal)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", float_literal)]
    Float(f64),

    #[regex(r"([0-9]+\.?[0-9]*([eE][+-]?[0-9]+)?|\.[0-9]+([eE][+-]?[0-9]+)?)[jJ]")]
    Imaginary,

    #[regex(r"[0-9]+[lL]")]
    LongSuffix,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,
    #[token("/")]
    Slash,
    #[token("//")]
    DoubleSlash,
    #[token("%")]
    Percent,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtE,
    #[token(">=")]
    GtE,
    #[token("==")]
    EqEq,
    #[token("!=")]
    #[token("<>")]
    NotEq,
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("**=")]
    DoubleStarEq,
    #[token("/=")]
    SlashEq,
    #[token("//=")]
    DoubleSlashEq,
    #[token("%=")]
    PercentEq,
    #[token("<<=")]
    LShiftEq,
    #[token(">>=")]
    RShiftEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token("@")]
    At,
    #[token("`")]
    Backtick,
}

fn radix_int(digits: &str, radix: u32) -> Result<i64, LexFault> {
    i64::from_str_radix(digits, radix).map_err(|_| LexFault::IntOutOfRange)
}

fn decimal_int(lex: &mut logos::Lexer<'_, Raw>) -> Result<i64, LexFault> {
    let digits = lex.slice();
    if digits.len() > 1 && digits.starts_with('0') {
        // Legacy octal spelling: a leading zero changes the base.
        i64::from_str_radix(&digits[1..], 8).map_err(|_| LexFault::BadOctal)
    } else {
        digits.parse().map_err(|_| LexFault::IntOutOfRange)
    }
}

fn float_literal(lex: &mut logos::Lexer<'_, Raw>) -> Result<f64, LexFault> {
    // str::parse maps out-of-range literals to infinity; the value model
    // only admits finite floats.
    match lex.slice().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LexFault::FloatOutOfRange),
    }
}

fn unescape(lex: &mut logos::Lexer<'_, Raw>) -> Result<String, LexFault> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            // The regex guarantees a character after every backslash.
            return Err(LexFault::BadEscape);
        };
        match escape {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'x' => {
                let mut value = 0u32;
                for _ in 0..2 {
                    let digit = chars.next().and_then(|d| d.to_digit(16)).ok_or(LexFault::BadEscape)?;
                    value = value * 16 + digit;
                }
                out.push(char::from_u32(value).ok_or(LexFault::BadEscape)?);
            }
            '0'..='7' => {
                // Up to three octal digits.
                let mut value = u32::from(escape) - u32::from('0');
                for _ in 0..2 {
                    let Some(digit) = chars.peek().and_then(|d| d.to_digit(8)) else {
                        break;
                    };
                    value = value * 8 + digit;
                    chars.next();
                }
                out.push(char::from_u32(value).ok_or(LexFault::BadEscape)?);
            }
            // Unknown escapes keep the backslash, as the source language
            // does.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn keyword(ident: &str) -> Option<Token> {
    Some(match ident {
        "and" => Token::KwAnd,
        "as" => Token::KwAs,
        "assert" => Token::KwAssert,
        "break" => Token::KwBreak,
        "class" => Token::KwClass,
        "continue" => Token::KwContinue,
        "def" => Token::KwDef,
        "del" => Token::KwDel,
        "elif" => Token::KwElif,
        "else" => Token::KwElse,
        "except" => Token::KwExcept,
        "exec" => Token::KwExec,
        "False" => Token::KwFalse,
        "finally" => Token::KwFinally,
        "for" => Token::KwFor,
        "from" => Token::KwFrom,
        "global" => Token::KwGlobal,
        "if" => Token::KwIf,
        "import" => Token::KwImport,
        "in" => Token::KwIn,
        "is" => Token::KwIs,
        "lambda" => Token::KwLambda,
        "None" => Token::KwNone,
        "not" => Token::KwNot,
        "or" => Token::KwOr,
        "pass" => Token::KwPass,
        "print" => Token::KwPrint,
        "raise" => Token::KwRaise,
        "return" => Token::KwReturn,
        "True" => Token::KwTrue,
        "try" => Token::KwTry,
        "while" => Token::KwWhile,
        "with" => Token::KwWith,
        "yield" => Token::KwYield,
        _ => return None,
    })
}

/// Tokenizes a whole source unit, resolving line structure.
pub(crate) fn lex(source: &str) -> Result<Vec<(Token, Loc)>, ParseError> {
    // Leading whitespace matters only when the first line carries code;
    // blank and comment-only first lines take no indentation level.
    let first = source.lines().next().unwrap_or("");
    let first_code = first.trim_start_matches([' ', '\t']);
    if first_code.len() != first.len() && !first_code.is_empty() && !first_code.starts_with('#') {
        return Err(ParseError::syntax("unexpected indent", Loc::new(1, 1)));
    }
    let mut tokens: Vec<(Token, Loc)> = Vec::new();
    let mut indents: Vec<u32> = vec![0];
    // Open brackets suppress newlines and indentation entirely.
    let mut depth: u32 = 0;
    let mut pending_indent: Option<u32> = None;
    let mut produced_on_line = false;

    let mut lexer = Raw::lexer(source);
    let mut line: u32 = 1;
    let mut column: u32 = 1;
    let mut last_end: usize = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        advance(&source[last_end..span.start], &mut line, &mut column);
        let at = Loc::new(line, column);

        match result {
            Err(fault) => return Err(fault_error(&fault, &source[span.start..span.end], at)),
            Ok(Raw::Newline) => {
                if depth == 0 {
                    let trail = lexer.slice().trim_start_matches(['\r', '\n']);
                    if trail.contains('\t') {
                        return Err(ParseError::syntax(
                            "tabs are not allowed in indentation",
                            Loc::new(line + 1, 1),
                        ));
                    }
                    if produced_on_line {
                        tokens.push((Token::Newline, at));
                        produced_on_line = false;
                    }
                    pending_indent = Some(u32::try_from(trail.len()).unwrap_or(u32::MAX));
                }
            }
            Ok(raw) => {
                if depth == 0 {
                    if let Some(width) = pending_indent.take() {
                        reindent(&mut tokens, &mut indents, width, at)?;
                    }
                }
                match raw {
                    Raw::LParen | Raw::LBracket | Raw::LBrace => depth += 1,
                    Raw::RParen | Raw::RBracket | Raw::RBrace => depth = depth.saturating_sub(1),
                    _ => {}
                }
                tokens.push((convert(raw, at)?, at));
                produced_on_line = true;
            }
        }

        advance(&source[span.start..span.end], &mut line, &mut column);
        last_end = span.end;
    }

    let end = Loc::new(line, column);
    if produced_on_line {
        tokens.push((Token::Newline, end));
    }
    while indents.len() > 1 {
        indents.pop();
        tokens.push((Token::Dedent, end));
    }
    tokens.push((Token::Eof, end));
    Ok(tokens)
}

fn advance(text: &str, line: &mut u32, column: &mut u32) {
    for c in text.chars() {
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

/// Compares the new line's indent width against the stack, emitting
/// `Indent`/`Dedent` tokens as needed.
fn reindent(
    tokens: &mut Vec<(Token, Loc)>,
    indents: &mut Vec<u32>,
    width: u32,
    at: Loc,
) -> Result<(), ParseError> {
    let current = indents.last().copied().unwrap_or(0);
    if width > current {
        indents.push(width);
        tokens.push((Token::Indent, at));
        return Ok(());
    }
    while width < indents.last().copied().unwrap_or(0) {
        indents.pop();
        tokens.push((Token::Dedent, at));
    }
    if width == indents.last().copied().unwrap_or(0) {
        Ok(())
    } else {
        Err(ParseError::syntax(
            "unindent does not match any outer indentation level",
            at,
        ))
    }
}

fn convert(raw: Raw, at: Loc) -> Result<Token, ParseError> {
    Ok(match raw {
        Raw::Newline | Raw::Continuation | Raw::Space | Raw::Comment => {
            unreachable!("handled before conversion")
        }
        Raw::Ident(name) => keyword(&name).unwrap_or(Token::Name(name)),
        Raw::Str(value) => Token::Str(value),
        Raw::Int(value) => Token::Int(value),
        Raw::Float(value) => Token::Float(value),
        Raw::TripleQuote => {
            return Err(ParseError::not_supported("triple-quoted strings", at));
        }
        Raw::StringPrefix => {
            return Err(ParseError::not_supported("string prefixes", at));
        }
        Raw::Imaginary => {
            return Err(ParseError::not_supported("imaginary literals", at));
        }
        Raw::LongSuffix => {
            return Err(ParseError::not_supported("long integer literals", at));
        }
        Raw::Plus => Token::Plus,
        Raw::Minus => Token::Minus,
        Raw::Star => Token::Star,
        Raw::DoubleStar => Token::DoubleStar,
        Raw::Slash => Token::Slash,
        Raw::DoubleSlash => Token::DoubleSlash,
        Raw::Percent => Token::Percent,
        Raw::LShift => Token::LShift,
        Raw::RShift => Token::RShift,
        Raw::Amp => Token::Amp,
        Raw::Pipe => Token::Pipe,
        Raw::Caret => Token::Caret,
        Raw::Tilde => Token::Tilde,
        Raw::Lt => Token::Lt,
        Raw::Gt => Token::Gt,
        Raw::LtE => Token::LtE,
        Raw::GtE => Token::GtE,
        Raw::EqEq => Token::EqEq,
        Raw::NotEq => Token::NotEq,
        Raw::Assign => Token::Assign,
        Raw::PlusEq => Token::PlusEq,
        Raw::MinusEq => Token::MinusEq,
        Raw::StarEq => Token::StarEq,
        Raw::DoubleStarEq => Token::DoubleStarEq,
        Raw::SlashEq => Token::SlashEq,
        Raw::DoubleSlashEq => Token::DoubleSlashEq,
        Raw::PercentEq => Token::PercentEq,
        Raw::LShiftEq => Token::LShiftEq,
        Raw::RShiftEq => Token::RShiftEq,
        Raw::AmpEq => Token::AmpEq,
        Raw::PipeEq => Token::PipeEq,
        Raw::CaretEq => Token::CaretEq,
        Raw::LParen => Token::LParen,
        Raw::RParen => Token::RParen,
        Raw::LBracket => Token::LBracket,
        Raw::RBracket => Token::RBracket,
        Raw::LBrace => Token::LBrace,
        Raw::RBrace => Token::RBrace,
        Raw::Comma => Token::Comma,
        Raw::Colon => Token::Colon,
        Raw::Dot => Token::Dot,
        Raw::Semicolon => Token::Semicolon,
        Raw::At => Token::At,
        Raw::Backtick => Token::Backtick,
    })
}

fn fault_error(fault: &LexFault, text: &str, at: Loc) -> ParseError {
    match fault {
        LexFault::Unexpected => {
            if text.starts_with('\'') || text.starts_with('"') {
                ParseError::syntax("unterminated string literal", at)
            } else {
                let found = text.chars().next().unwrap_or('\0');
                ParseError::syntax(format!("unexpected character '{found}'"), at)
            }
        }
        LexFault::IntOutOfRange => ParseError::not_supported("integer literals beyond 64 bits", at),
        LexFault::BadOctal => ParseError::syntax("invalid octal literal", at),
        LexFault::FloatOutOfRange => ParseError::syntax("float literal out of range", at),
        LexFault::BadEscape => ParseError::syntax("invalid string escape", at),
    }
}
