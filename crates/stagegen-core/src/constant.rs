//! Compile-time constant values and folding.
//!
//! Constants are untyped until they meet a typed operand or a declaration,
//! so integers are held at `i128` and narrowed with
//! [`ConstValue::representable`]. Floats use `OrderedFloat` so a constant can
//! be hashed and compared like any other value.

use std::fmt;

use ordered_float::OrderedFloat;

use crate::ops::{BinaryOp, UnaryOp};
use crate::types::BasicKind;
use crate::{BuildError, Span};

/// A constant value attached to an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(OrderedFloat<f64>),
    String(String),
}

impl ConstValue {
    /// Float constant helper.
    pub fn float(v: f64) -> Self {
        ConstValue::Float(OrderedFloat(v))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value; integral floats convert exactly.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Float(f) if f.0.fract() == 0.0 && f.0.abs() < 1e38 => Some(f.0 as i128),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConstValue::Int(v) => Some(*v as f64),
            ConstValue::Float(f) => Some(f.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is a numeric zero.
    pub fn is_zero(&self) -> bool {
        match self {
            ConstValue::Int(v) => *v == 0,
            ConstValue::Float(f) => f.0 == 0.0,
            _ => false,
        }
    }

    /// Converts the value to one representable by `kind`, if it fits.
    ///
    /// Integer targets accept integral floats; float targets accept any
    /// integer.
    pub fn representable(&self, kind: BasicKind) -> Option<ConstValue> {
        let info = kind.info();
        if info.is_boolean() {
            return self.as_bool().map(ConstValue::Bool);
        }
        if info.is_string() {
            return self.as_str().map(|s| ConstValue::String(s.to_owned()));
        }
        if info.is_integer() {
            let v = self.as_int()?;
            let (min, max) = kind.int_range()?;
            return (min..=max).contains(&v).then_some(ConstValue::Int(v));
        }
        if info.is_float() {
            let v = self.as_float()?;
            if kind == BasicKind::Float32 && v.is_finite() && v.abs() > f32::MAX as f64 {
                return None;
            }
            return Some(ConstValue::float(v));
        }
        None
    }

    /// Folds `self op other`.
    ///
    /// Returns `Ok(None)` when the operator does not apply to these constants;
    /// the caller reports that with the operand types in hand.
    pub fn fold_binary(
        &self,
        op: BinaryOp,
        other: &ConstValue,
        span: Span,
    ) -> Result<Option<ConstValue>, BuildError> {
        use ConstValue::*;

        if op.is_shift() {
            let (Some(x), Some(s)) = (self.as_int(), other.as_int()) else {
                return Ok(None);
            };
            if !(0..128).contains(&s) {
                return Err(overflow(x, span));
            }
            let v = match op {
                BinaryOp::Shl => x.checked_shl(s as u32).filter(|v| v >> s == x),
                _ => Some(x >> s),
            };
            return v.map(|v| Some(Int(v))).ok_or_else(|| overflow(x, span));
        }

        let folded = match (self, other) {
            (Bool(x), Bool(y)) => match op {
                BinaryOp::LogicalAnd => Some(Bool(*x && *y)),
                BinaryOp::LogicalOr => Some(Bool(*x || *y)),
                BinaryOp::Equal => Some(Bool(x == y)),
                BinaryOp::NotEqual => Some(Bool(x != y)),
                _ => None,
            },
            (String(x), String(y)) => match op {
                BinaryOp::Add => Some(String(format!("{x}{y}"))),
                _ if op.is_comparison() => Some(Bool(compare(op, x.cmp(y)))),
                _ => None,
            },
            (Int(x), Int(y)) => return fold_int(op, *x, *y, span),
            (Int(_) | Float(_), Int(_) | Float(_)) => {
                let (Some(x), Some(y)) = (self.as_float(), other.as_float()) else {
                    return Ok(None);
                };
                fold_float(op, x, y, span)?
            }
            _ => None,
        };
        Ok(folded)
    }

    /// Folds `op self`.
    pub fn fold_unary(&self, op: UnaryOp) -> Option<ConstValue> {
        match (op, self) {
            (UnaryOp::Plus, ConstValue::Int(_) | ConstValue::Float(_)) => Some(self.clone()),
            (UnaryOp::Neg, ConstValue::Int(v)) => v.checked_neg().map(ConstValue::Int),
            (UnaryOp::Neg, ConstValue::Float(f)) => Some(ConstValue::float(-f.0)),
            (UnaryOp::Not, ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
            (UnaryOp::BitNot, ConstValue::Int(v)) => Some(ConstValue::Int(!v)),
            _ => None,
        }
    }
}

fn overflow(v: impl fmt::Display, span: Span) -> BuildError {
    BuildError::ConstantOverflow {
        value: v.to_string(),
        typ: "untyped int".into(),
        span,
    }
}

fn compare(op: BinaryOp, ord: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        BinaryOp::Equal => ord == Equal,
        BinaryOp::NotEqual => ord != Equal,
        BinaryOp::Less => ord == Less,
        BinaryOp::LessEqual => ord != Greater,
        BinaryOp::Greater => ord == Greater,
        BinaryOp::GreaterEqual => ord != Less,
        _ => false,
    }
}

fn fold_int(op: BinaryOp, x: i128, y: i128, span: Span) -> Result<Option<ConstValue>, BuildError> {
    use BinaryOp::*;
    if matches!(op, Div | Rem) && y == 0 {
        return Err(BuildError::DivisionByZero { span });
    }
    if op.is_comparison() {
        return Ok(Some(ConstValue::Bool(compare(op, x.cmp(&y)))));
    }
    let v = match op {
        Add => x.checked_add(y),
        Sub => x.checked_sub(y),
        Mul => x.checked_mul(y),
        Div => x.checked_div(y),
        Rem => x.checked_rem(y),
        BitOr => Some(x | y),
        BitXor => Some(x ^ y),
        BitAnd => Some(x & y),
        AndNot => Some(x & !y),
        _ => return Ok(None),
    };
    v.map(|v| Some(ConstValue::Int(v)))
        .ok_or_else(|| overflow(format!("{x} {op} {y}"), span))
}

fn fold_float(op: BinaryOp, x: f64, y: f64, span: Span) -> Result<Option<ConstValue>, BuildError> {
    use BinaryOp::*;
    if op.is_comparison() {
        let ord = OrderedFloat(x).cmp(&OrderedFloat(y));
        return Ok(Some(ConstValue::Bool(compare(op, ord))));
    }
    let v = match op {
        Add => x + y,
        Sub => x - y,
        Mul => x * y,
        Div if y == 0.0 => return Err(BuildError::DivisionByZero { span }),
        Div => x / y,
        _ => return Ok(None),
    };
    Ok(Some(ConstValue::float(v)))
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Float(v) if v.0.is_finite() && v.0.fract() == 0.0 => {
                write!(f, "{:.1}", v.0)
            }
            ConstValue::Float(v) => write!(f, "{}", v.0),
            ConstValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_int_arithmetic() {
        let v = ConstValue::Int(7)
            .fold_binary(BinaryOp::Mul, &ConstValue::Int(6), Span::NONE)
            .unwrap();
        assert_eq!(v, Some(ConstValue::Int(42)));
    }

    #[test]
    fn fold_mixed_promotes_to_float() {
        let v = ConstValue::Int(1)
            .fold_binary(BinaryOp::Add, &ConstValue::float(0.5), Span::NONE)
            .unwrap();
        assert_eq!(v, Some(ConstValue::float(1.5)));
    }

    #[test]
    fn fold_comparison_yields_bool() {
        let v = ConstValue::Int(10)
            .fold_binary(BinaryOp::Less, &ConstValue::Int(50), Span::NONE)
            .unwrap();
        assert_eq!(v, Some(ConstValue::Bool(true)));
    }

    #[test]
    fn division_by_zero() {
        let at = Span::point(3, 7);
        let err = ConstValue::Int(1)
            .fold_binary(BinaryOp::Div, &ConstValue::Int(0), at)
            .unwrap_err();
        assert_eq!(err, BuildError::DivisionByZero { span: at });
    }

    #[test]
    fn string_concat() {
        let v = ConstValue::String("ab".into())
            .fold_binary(BinaryOp::Add, &ConstValue::String("cd".into()), Span::NONE)
            .unwrap();
        assert_eq!(v, Some(ConstValue::String("abcd".into())));
    }

    #[test]
    fn mismatched_kinds_do_not_fold() {
        let v = ConstValue::String("a".into())
            .fold_binary(BinaryOp::Add, &ConstValue::Int(1), Span::NONE)
            .unwrap();
        assert_eq!(v, None);
    }

    #[test]
    fn representable_ranges() {
        use BasicKind::{Float64, Int, String, Uint8};
        let (int, float) = (ConstValue::Int, ConstValue::float);
        assert_eq!(int(255).representable(Uint8), Some(int(255)));
        assert_eq!(int(256).representable(Uint8), None);
        assert_eq!(float(2.0).representable(Int), Some(int(2)));
        assert_eq!(float(2.5).representable(Int), None);
        assert_eq!(int(3).representable(Float64), Some(float(3.0)));
        assert_eq!(int(3).representable(String), None);
    }

    #[test]
    fn display_keeps_float_point() {
        assert_eq!(ConstValue::float(2.0).to_string(), "2.0");
        assert_eq!(ConstValue::String("hi\n".into()).to_string(), "\"hi\\n\"");
    }
}
