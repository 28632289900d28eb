//! Constant values and the operator semantics used by the folding pass.
//!
//! Evaluation follows the source language: `/` on two integers floors, `%`
//! takes the sign of the divisor, booleans participate in arithmetic as 0/1,
//! and `1 == 1.0` is true. Anything the evaluator cannot prove safe raises
//! an [`EvalError`], which the folding pass turns into "leave the expression
//! unfolded" rather than a user-visible failure.

#![expect(clippy::float_cmp, reason = "value semantics require exact float comparison")]

use std::cmp::Ordering;

use crate::ast::{BinOp, CmpOp, UnaryOp};

/// Folding never materializes repeated sequences longer than this; larger
/// repetitions are left to runtime.
pub(crate) const MAX_FOLDED_LEN: usize = 4096;

/// A value extracted from a provably-constant subtree.
///
/// Containers hold constant elements recursively. Sets are deduplicated at
/// construction, preserving first-occurrence order. Floats are always
/// finite; evaluation rejects any result that is not.
#[derive(Debug, Clone)]
pub(crate) enum Const {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Const>),
    Tuple(Vec<Const>),
    Set(Vec<Const>),
}

/// Why evaluation of an operator over constants was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EvalError {
    DivisionByZero,
    /// Result does not fit the value model (integer overflow, non-finite
    /// float, oversized sequence).
    Overflow,
    /// A conversion builtin rejected its argument.
    Conversion,
    /// Operand combination the evaluator does not model.
    Unsupported,
}

impl Const {
    /// Builds a set value, deduplicating with value equality while keeping
    /// first-occurrence order.
    pub(crate) fn set_of(elts: Vec<Self>) -> Self {
        let mut unique: Vec<Self> = Vec::with_capacity(elts.len());
        for elt in elts {
            if !unique.iter().any(|seen| seen.py_eq(&elt)) {
                unique.push(elt);
            }
        }
        Self::Set(unique)
    }

    /// Truthiness: `None`, zero, and empty strings/containers are false.
    pub(crate) fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(elts) | Self::Tuple(elts) | Self::Set(elts) => !elts.is_empty(),
        }
    }

    /// Value equality with numeric coercion: `1 == 1.0 == True`.
    /// Values of different non-numeric kinds are unequal, never an error.
    pub(crate) fn py_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Str(l), Self::Str(r)) => l == r,
            (Self::List(l), Self::List(r)) | (Self::Tuple(l), Self::Tuple(r)) => {
                l.len() == r.len() && l.iter().zip(r).all(|(a, b)| a.py_eq(b))
            }
            (Self::Set(l), Self::Set(r)) => {
                // Both sides are deduplicated, so subset + equal length
                // suffices.
                l.len() == r.len() && l.iter().all(|elt| r.iter().any(|other| other.py_eq(elt)))
            }
            _ => match (self.as_num(), other.as_num()) {
                (Some(l), Some(r)) => l.eq(r),
                _ => false,
            },
        }
    }

    /// Numeric view of the value, coercing booleans to 0/1.
    fn as_num(&self) -> Option<Num> {
        match self {
            Self::Bool(b) => Some(Num::Int(i64::from(*b))),
            Self::Int(n) => Some(Num::Int(*n)),
            Self::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    /// Integer view, coercing booleans. Floats do not silently narrow.
    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn eq(self, other: Self) -> bool {
        match (self, other) {
            (Self::Int(l), Self::Int(r)) => l == r,
            (Self::Float(l), Self::Float(r)) => l == r,
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => (i as f64) == f,
        }
    }

    fn cmp(self, other: Self) -> Ordering {
        let (l, r) = match (self, other) {
            (Self::Int(l), Self::Int(r)) => return l.cmp(&r),
            (Self::Float(l), Self::Float(r)) => (l, r),
            (Self::Int(i), Self::Float(f)) => (i as f64, f),
            (Self::Float(f), Self::Int(i)) => (f, i as f64),
        };
        // Operands are finite by construction, so partial_cmp cannot fail.
        l.partial_cmp(&r).unwrap_or(Ordering::Equal)
    }
}

/// Wraps a float result, rejecting overflow to infinity and NaN.
fn finite(value: f64) -> Result<Const, EvalError> {
    if value.is_finite() {
        Ok(Const::Float(value))
    } else {
        Err(EvalError::Overflow)
    }
}

fn checked(value: Option<i64>) -> Result<Const, EvalError> {
    value.map(Const::Int).ok_or(EvalError::Overflow)
}

/// Floor division on integers: `7 / -2 == -4`.
fn floor_div(l: i64, r: i64) -> Result<Const, EvalError> {
    if r == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let Some(q) = l.checked_div(r) else {
        return Err(EvalError::Overflow);
    };
    if l % r != 0 && (l < 0) != (r < 0) {
        checked(q.checked_sub(1))
    } else {
        Ok(Const::Int(q))
    }
}

/// Floored modulo on integers: the result takes the divisor's sign.
fn floor_mod(l: i64, r: i64) -> Result<Const, EvalError> {
    if r == 0 {
        return Err(EvalError::DivisionByZero);
    }
    // i64::MIN % -1 would overflow checked_rem; the true result is 0.
    let m = l.checked_rem(r).unwrap_or(0);
    if m != 0 && (m < 0) != (r < 0) {
        Ok(Const::Int(m + r))
    } else {
        Ok(Const::Int(m))
    }
}

fn float_mod(l: f64, r: f64) -> Result<Const, EvalError> {
    if r == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let m = l % r;
    if m != 0.0 && (m < 0.0) != (r < 0.0) {
        finite(m + r)
    } else {
        finite(m)
    }
}

fn repeat(elts: &[Const], count: &Const) -> Result<Vec<Const>, EvalError> {
    let count = count.as_int().ok_or(EvalError::Unsupported)?;
    let count = usize::try_from(count.max(0)).map_err(|_| EvalError::Overflow)?;
    let total = elts.len().checked_mul(count).ok_or(EvalError::Overflow)?;
    if total > MAX_FOLDED_LEN {
        return Err(EvalError::Overflow);
    }
    let mut out = Vec::with_capacity(total);
    for _ in 0..count {
        out.extend(elts.iter().cloned());
    }
    Ok(out)
}

fn repeat_str(s: &str, count: &Const) -> Result<Const, EvalError> {
    let count = count.as_int().ok_or(EvalError::Unsupported)?;
    let count = usize::try_from(count.max(0)).map_err(|_| EvalError::Overflow)?;
    let total = s.len().checked_mul(count).ok_or(EvalError::Overflow)?;
    if total > MAX_FOLDED_LEN {
        return Err(EvalError::Overflow);
    }
    Ok(Const::Str(s.repeat(count)))
}

fn is_subset(l: &[Const], r: &[Const]) -> bool {
    l.iter().all(|elt| r.iter().any(|other| other.py_eq(elt)))
}

/// Evaluates a binary operator over two constant values.
pub(crate) fn binary(op: BinOp, left: &Const, right: &Const) -> Result<Const, EvalError> {
    use Const as C;
    match op {
        BinOp::Add => match (left, right) {
            (C::Str(l), C::Str(r)) => Ok(C::Str(format!("{l}{r}"))),
            (C::List(l), C::List(r)) => Ok(C::List(l.iter().chain(r).cloned().collect())),
            (C::Tuple(l), C::Tuple(r)) => Ok(C::Tuple(l.iter().chain(r).cloned().collect())),
            _ => match (left.as_num(), right.as_num()) {
                (Some(Num::Int(l)), Some(Num::Int(r))) => checked(l.checked_add(r)),
                (Some(l), Some(r)) => finite(as_f64(l) + as_f64(r)),
                _ => Err(EvalError::Unsupported),
            },
        },
        BinOp::Sub => match (left, right) {
            (C::Set(l), C::Set(r)) => Ok(C::Set(
                l.iter().filter(|elt| !r.iter().any(|o| o.py_eq(elt))).cloned().collect(),
            )),
            _ => match (left.as_num(), right.as_num()) {
                (Some(Num::Int(l)), Some(Num::Int(r))) => checked(l.checked_sub(r)),
                (Some(l), Some(r)) => finite(as_f64(l) - as_f64(r)),
                _ => Err(EvalError::Unsupported),
            },
        },
        BinOp::Mult => match (left, right) {
            (C::Str(s), count) | (count, C::Str(s)) if !matches!(count, C::Str(_)) => repeat_str(s, count),
            (C::List(elts), count) | (count, C::List(elts)) if count.as_int().is_some() => {
                Ok(C::List(repeat(elts, count)?))
            }
            (C::Tuple(elts), count) | (count, C::Tuple(elts)) if count.as_int().is_some() => {
                Ok(C::Tuple(repeat(elts, count)?))
            }
            _ => match (left.as_num(), right.as_num()) {
                (Some(Num::Int(l)), Some(Num::Int(r))) => checked(l.checked_mul(r)),
                (Some(l), Some(r)) => finite(as_f64(l) * as_f64(r)),
                _ => Err(EvalError::Unsupported),
            },
        },
        // Integer division floors; mixed operands divide as floats.
        BinOp::Div | BinOp::FloorDiv => match (left.as_num(), right.as_num()) {
            (Some(Num::Int(l)), Some(Num::Int(r))) => floor_div(l, r),
            (Some(l), Some(r)) => {
                let (l, r) = (as_f64(l), as_f64(r));
                if r == 0.0 {
                    Err(EvalError::DivisionByZero)
                } else if op == BinOp::FloorDiv {
                    finite((l / r).floor())
                } else {
                    finite(l / r)
                }
            }
            _ => Err(EvalError::Unsupported),
        },
        BinOp::Mod => match (left.as_num(), right.as_num()) {
            (Some(Num::Int(l)), Some(Num::Int(r))) => floor_mod(l, r),
            (Some(l), Some(r)) => float_mod(as_f64(l), as_f64(r)),
            _ => Err(EvalError::Unsupported),
        },
        BinOp::Pow => match (left.as_num(), right.as_num()) {
            (Some(Num::Int(l)), Some(Num::Int(r))) => {
                if r < 0 {
                    if l == 0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        finite((l as f64).powf(r as f64))
                    }
                } else {
                    let exp = u32::try_from(r).map_err(|_| EvalError::Overflow)?;
                    checked(l.checked_pow(exp))
                }
            }
            (Some(l), Some(r)) => {
                let (l, r) = (as_f64(l), as_f64(r));
                if l == 0.0 && r < 0.0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    finite(l.powf(r))
                }
            }
            _ => Err(EvalError::Unsupported),
        },
        BinOp::LShift => {
            let (l, r) = int_pair(left, right)?;
            if r < 0 {
                return Err(EvalError::Unsupported);
            }
            if r > 63 {
                return Err(EvalError::Overflow);
            }
            let shifted = l << r;
            if shifted >> r == l {
                Ok(C::Int(shifted))
            } else {
                Err(EvalError::Overflow)
            }
        }
        BinOp::RShift => {
            let (l, r) = int_pair(left, right)?;
            if r < 0 {
                return Err(EvalError::Unsupported);
            }
            if r > 63 {
                // Arithmetic shift saturates toward the sign.
                Ok(C::Int(if l < 0 { -1 } else { 0 }))
            } else {
                Ok(C::Int(l >> r))
            }
        }
        BinOp::BitOr => bitwise(left, right, |l, r| l | r, |l, r| {
            Const::set_of(l.iter().chain(r).cloned().collect())
        }),
        BinOp::BitXor => bitwise(left, right, |l, r| l ^ r, |l, r| {
            let mut out: Vec<Const> = l.iter().filter(|e| !r.iter().any(|o| o.py_eq(e))).cloned().collect();
            out.extend(r.iter().filter(|e| !l.iter().any(|o| o.py_eq(e))).cloned());
            Const::Set(out)
        }),
        BinOp::BitAnd => bitwise(left, right, |l, r| l & r, |l, r| {
            Const::Set(l.iter().filter(|e| r.iter().any(|o| o.py_eq(e))).cloned().collect())
        }),
    }
}

/// Shared shape of `| ^ &`: bool pairs stay bool, integers mix to integers,
/// sets use the set-algebra interpretation.
fn bitwise(
    left: &Const,
    right: &Const,
    ints: impl Fn(i64, i64) -> i64,
    sets: impl Fn(&[Const], &[Const]) -> Const,
) -> Result<Const, EvalError> {
    match (left, right) {
        (Const::Bool(l), Const::Bool(r)) => Ok(Const::Bool(ints(i64::from(*l), i64::from(*r)) != 0)),
        (Const::Set(l), Const::Set(r)) => Ok(sets(l, r)),
        _ => {
            let (l, r) = int_pair(left, right)?;
            Ok(Const::Int(ints(l, r)))
        }
    }
}

fn int_pair(left: &Const, right: &Const) -> Result<(i64, i64), EvalError> {
    match (left.as_int(), right.as_int()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(EvalError::Unsupported),
    }
}

fn as_f64(num: Num) -> f64 {
    match num {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

/// Evaluates a unary operator over a constant value.
pub(crate) fn unary(op: UnaryOp, value: &Const) -> Result<Const, EvalError> {
    match op {
        UnaryOp::Not => Ok(Const::Bool(!value.truthy())),
        UnaryOp::Invert => value.as_int().map(|n| Const::Int(!n)).ok_or(EvalError::Unsupported),
        UnaryOp::UAdd => match value.as_num() {
            Some(Num::Int(n)) => Ok(Const::Int(n)),
            Some(Num::Float(f)) => Ok(Const::Float(f)),
            None => Err(EvalError::Unsupported),
        },
        UnaryOp::USub => match value.as_num() {
            Some(Num::Int(n)) => checked(n.checked_neg()),
            Some(Num::Float(f)) => Ok(Const::Float(-f)),
            None => Err(EvalError::Unsupported),
        },
    }
}

/// Evaluates one comparison link. Chains call this once per link against the
/// running left value.
pub(crate) fn compare(op: CmpOp, left: &Const, right: &Const) -> Result<bool, EvalError> {
    use Const as C;
    match op {
        CmpOp::Eq => Ok(left.py_eq(right)),
        CmpOp::NotEq => Ok(!left.py_eq(right)),
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => {
            if let (C::Set(l), C::Set(r)) = (left, right) {
                // Ordering on sets is the subset relation.
                return Ok(match op {
                    CmpOp::Lt => l.len() < r.len() && is_subset(l, r),
                    CmpOp::LtE => is_subset(l, r),
                    CmpOp::Gt => r.len() < l.len() && is_subset(r, l),
                    _ => is_subset(r, l),
                });
            }
            let ordering = py_cmp(left, right)?;
            Ok(match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::LtE => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
        CmpOp::Is | CmpOp::IsNot => {
            let identical = match (left, right) {
                (C::None, C::None) => true,
                (C::Bool(l), C::Bool(r)) => l == r,
                (C::None | C::Bool(_), _) | (_, C::None | C::Bool(_)) => false,
                // Identity of interned ints/strings is not a value
                // property; leave it to runtime.
                _ => return Err(EvalError::Unsupported),
            };
            Ok(if op == CmpOp::Is { identical } else { !identical })
        }
        CmpOp::In | CmpOp::NotIn => {
            let found = match (left, right) {
                (C::Str(l), C::Str(r)) => r.contains(l.as_str()),
                (elt, C::List(elts) | C::Tuple(elts) | C::Set(elts)) => elts.iter().any(|e| e.py_eq(elt)),
                _ => return Err(EvalError::Unsupported),
            };
            Ok(if op == CmpOp::In { found } else { !found })
        }
    }
}

/// Total order used by `< <= > >=`: numeric pairs, strings, and
/// like-kinded sequences compare; anything else is unsupported.
fn py_cmp(left: &Const, right: &Const) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Const::Str(l), Const::Str(r)) => Ok(l.cmp(r)),
        (Const::List(l), Const::List(r)) | (Const::Tuple(l), Const::Tuple(r)) => {
            for (a, b) in l.iter().zip(r) {
                match py_cmp(a, b)? {
                    Ordering::Equal => {}
                    unequal => return Ok(unequal),
                }
            }
            Ok(l.len().cmp(&r.len()))
        }
        _ => match (left.as_num(), right.as_num()) {
            (Some(l), Some(r)) => Ok(l.cmp(r)),
            _ => Err(EvalError::Unsupported),
        },
    }
}

/// Renders a float the way every dialect prints it: shortest decimal form
/// that round-trips, always with either a fraction or an exponent.
pub(crate) fn float_repr(value: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format(value).to_owned()
}

/// `str()` of a scalar constant. Containers are left to runtime.
pub(crate) fn str_of(value: &Const) -> Result<Const, EvalError> {
    match value {
        Const::None => Ok(Const::Str("None".to_owned())),
        Const::Bool(b) => Ok(Const::Str(if *b { "True" } else { "False" }.to_owned())),
        Const::Int(n) => Ok(Const::Str(n.to_string())),
        Const::Float(f) => Ok(Const::Str(float_repr(*f))),
        Const::Str(s) => Ok(Const::Str(s.clone())),
        Const::List(_) | Const::Tuple(_) | Const::Set(_) => Err(EvalError::Unsupported),
    }
}

/// `int()` of a constant, with an optional explicit base for strings.
pub(crate) fn int_of(value: &Const, base: Option<&Const>) -> Result<Const, EvalError> {
    if let Some(base) = base {
        let base = base.as_int().ok_or(EvalError::Conversion)?;
        let Const::Str(s) = value else {
            return Err(EvalError::Conversion);
        };
        return parse_int_radix(s, base).map(Const::Int).ok_or(EvalError::Conversion);
    }
    match value {
        Const::Bool(b) => Ok(Const::Int(i64::from(*b))),
        Const::Int(n) => Ok(Const::Int(*n)),
        Const::Float(f) => {
            let truncated = f.trunc();
            if truncated >= -(2f64.powi(63)) && truncated < 2f64.powi(63) {
                #[expect(clippy::cast_possible_truncation, reason = "range-checked above")]
                let narrowed = truncated as i64;
                Ok(Const::Int(narrowed))
            } else {
                Err(EvalError::Overflow)
            }
        }
        Const::Str(s) => s.trim().parse::<i64>().map(Const::Int).map_err(|_| EvalError::Conversion),
        _ => Err(EvalError::Conversion),
    }
}

/// Parses a string in the given base (0 detects a prefix), accepting an
/// optional matching `0x`/`0o`/`0b` prefix and a leading sign.
fn parse_int_radix(s: &str, base: i64) -> Option<i64> {
    if base != 0 && !(2..=36).contains(&base) {
        return None;
    }
    let trimmed = s.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let lower = rest.to_ascii_lowercase();
    let (radix, digits) = if let Some(digits) = lower.strip_prefix("0x") {
        if base != 16 && base != 0 {
            return None;
        }
        (16, digits)
    } else if let Some(digits) = lower.strip_prefix("0o") {
        if base != 8 && base != 0 {
            return None;
        }
        (8, digits)
    } else if let Some(digits) = lower.strip_prefix("0b") {
        if base != 2 && base != 0 {
            return None;
        }
        (2, digits)
    } else {
        (if base == 0 { 10 } else { base }, lower.as_str())
    };
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "radix is within 2..=36")]
    let radix = radix as u32;
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    if negative { magnitude.checked_neg() } else { Some(magnitude) }
}

/// `float()` of a constant.
pub(crate) fn float_of(value: &Const) -> Result<Const, EvalError> {
    match value {
        Const::Bool(b) => Ok(Const::Float(if *b { 1.0 } else { 0.0 })),
        Const::Int(n) => Ok(Const::Float(*n as f64)),
        Const::Float(f) => Ok(Const::Float(*f)),
        Const::Str(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Const::Float(f)),
            _ => Err(EvalError::Conversion),
        },
        _ => Err(EvalError::Conversion),
    }
}

/// `bool()` of a constant; defined for every value, containers included.
pub(crate) fn bool_of(value: &Const) -> Const {
    Const::Bool(value.truthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_division_floors_toward_negative_infinity() {
        for (l, r, expect) in [(7, 2, 3), (-7, 2, -4), (7, -2, -4), (-7, -2, 3), (6, 3, 2)] {
            let Ok(Const::Int(q)) = binary(BinOp::Div, &Const::Int(l), &Const::Int(r)) else {
                panic!("{l} / {r} should fold to an int");
            };
            assert_eq!(q, expect, "{l} / {r}");
        }
    }

    #[test]
    fn modulo_takes_the_divisor_sign() {
        for (l, r, expect) in [(7, 3, 1), (-7, 3, 2), (7, -3, -2), (-7, -3, -1)] {
            let Ok(Const::Int(m)) = binary(BinOp::Mod, &Const::Int(l), &Const::Int(r)) else {
                panic!("{l} % {r} should fold to an int");
            };
            assert_eq!(m, expect, "{l} % {r}");
        }
    }

    #[test]
    fn division_by_zero_is_an_eval_error() {
        assert_eq!(
            binary(BinOp::Div, &Const::Int(1), &Const::Int(0)).unwrap_err(),
            EvalError::DivisionByZero
        );
        assert_eq!(
            binary(BinOp::Mod, &Const::Float(1.5), &Const::Float(0.0)).unwrap_err(),
            EvalError::DivisionByZero
        );
    }

    #[test]
    fn integer_overflow_is_an_eval_error() {
        assert_eq!(
            binary(BinOp::Add, &Const::Int(i64::MAX), &Const::Int(1)).unwrap_err(),
            EvalError::Overflow
        );
        assert_eq!(
            binary(BinOp::LShift, &Const::Int(1), &Const::Int(70)).unwrap_err(),
            EvalError::Overflow
        );
        assert_eq!(unary(UnaryOp::USub, &Const::Int(i64::MIN)).unwrap_err(), EvalError::Overflow);
    }

    #[test]
    fn negative_exponent_produces_a_float() {
        let Ok(Const::Float(half)) = binary(BinOp::Pow, &Const::Int(2), &Const::Int(-1)) else {
            panic!("2 ** -1 should fold to a float");
        };
        assert_eq!(half, 0.5);
    }

    #[test]
    fn booleans_participate_in_arithmetic_as_integers() {
        let Ok(Const::Int(two)) = binary(BinOp::Add, &Const::Bool(true), &Const::Bool(true)) else {
            panic!("True + True should fold to an int");
        };
        assert_eq!(two, 2);
        // But | & ^ keep bool typing when both sides are bool.
        let Ok(Const::Bool(t)) = binary(BinOp::BitOr, &Const::Bool(true), &Const::Bool(false)) else {
            panic!("True | False should stay bool");
        };
        assert!(t);
    }

    #[test]
    fn numeric_equality_crosses_int_float_and_bool() {
        assert!(Const::Int(1).py_eq(&Const::Float(1.0)));
        assert!(Const::Bool(true).py_eq(&Const::Int(1)));
        assert!(!Const::Int(1).py_eq(&Const::Str("1".to_owned())));
    }

    #[test]
    fn substring_and_membership_checks() {
        let hay = Const::Str("hello".to_owned());
        let needle = Const::Str("ell".to_owned());
        assert_eq!(compare(CmpOp::In, &needle, &hay), Ok(true));
        let list = Const::List(vec![Const::Int(1), Const::Int(2)]);
        assert_eq!(compare(CmpOp::NotIn, &Const::Int(3), &list), Ok(true));
    }

    #[test]
    fn identity_folds_only_for_none_and_bool() {
        assert_eq!(compare(CmpOp::Is, &Const::None, &Const::None), Ok(true));
        assert_eq!(compare(CmpOp::Is, &Const::Int(5), &Const::None), Ok(false));
        assert_eq!(
            compare(CmpOp::Is, &Const::Int(5), &Const::Int(5)),
            Err(EvalError::Unsupported)
        );
    }

    #[test]
    fn string_repetition_is_capped() {
        let s = Const::Str("ab".to_owned());
        let Ok(Const::Str(repeated)) = binary(BinOp::Mult, &s, &Const::Int(3)) else {
            panic!("'ab' * 3 should fold");
        };
        assert_eq!(repeated, "ababab");
        assert_eq!(
            binary(BinOp::Mult, &s, &Const::Int(1_000_000)).unwrap_err(),
            EvalError::Overflow
        );
    }

    #[test]
    fn int_conversion_accepts_an_explicit_base() {
        let Ok(Const::Int(n)) = int_of(&Const::Str("ff".to_owned()), Some(&Const::Int(16))) else {
            panic!("int('ff', 16) should fold");
        };
        assert_eq!(n, 255);
        let Ok(Const::Int(n)) = int_of(&Const::Str("0x1a".to_owned()), Some(&Const::Int(16))) else {
            panic!("int('0x1a', 16) should accept the prefix");
        };
        assert_eq!(n, 26);
        assert_eq!(
            int_of(&Const::Str("12".to_owned()), Some(&Const::Int(1))).unwrap_err(),
            EvalError::Conversion
        );
    }

    #[test]
    fn set_values_deduplicate_on_construction() {
        let Const::Set(elts) = Const::set_of(vec![Const::Int(1), Const::Int(1), Const::Int(2)]) else {
            unreachable!()
        };
        assert_eq!(elts.len(), 2);
    }
}
