//! Symbolic values and their operator table.

use crate::eval::{EE, EvalResult};
use kiln_ast::ast::{BinOpKind, LitKind, Lrc, PrimTy, UnOpKind, double_to_string, float_to_string};
use std::{cmp::Ordering, fmt};

/// A symbolic value: either a concrete constant or [`Unknown`](Self::Unknown).
///
/// `Unknown` is absorbing: every operator applied to an unknown operand yields `Unknown`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// A value that cannot be determined at compile time.
    #[default]
    Unknown,
    Null,
    Bool(bool),
    /// A UTF-16 code unit.
    Char(u16),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Lrc<str>),
}

/// The kind of a concrete [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

/// A numeric value after numeric promotion.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Num {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Num {
    fn rank(self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Long(_) => 1,
            Self::Float(_) => 2,
            Self::Double(_) => 3,
        }
    }

    /// Widens `self` to the representation of rank `rank`.
    fn widen(self, rank: u8) -> Self {
        match (self, rank) {
            (Self::Int(i), 1) => Self::Long(i as i64),
            (Self::Int(i), 2) => Self::Float(i as f32),
            (Self::Int(i), 3) => Self::Double(i as f64),
            (Self::Long(l), 2) => Self::Float(l as f32),
            (Self::Long(l), 3) => Self::Double(l as f64),
            (Self::Float(f), 3) => Self::Double(f as f64),
            (n, _) => n,
        }
    }

    /// Binary numeric promotion: both operands take the wider of the two representations.
    fn promote(a: Self, b: Self) -> (Self, Self) {
        let rank = a.rank().max(b.rank());
        (a.widen(rank), b.widen(rank))
    }

    fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Long(l) => Value::Long(l),
            Self::Float(f) => Value::Float(f),
            Self::Double(d) => Value::Double(d),
        }
    }

    fn partial_cmp(a: Self, b: Self) -> Option<Ordering> {
        match Self::promote(a, b) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (Self::Long(a), Self::Long(b)) => Some(a.cmp(&b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(&b),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }
}

impl Value {
    /// Creates a value from a literal.
    pub fn from_lit(lit: &LitKind) -> Self {
        match *lit {
            LitKind::Null => Self::Null,
            LitKind::Bool(b) => Self::Bool(b),
            LitKind::Char(c) => Self::Char(c),
            LitKind::Byte(b) => Self::Byte(b),
            LitKind::Short(s) => Self::Short(s),
            LitKind::Int(i) => Self::Int(i),
            LitKind::Long(l) => Self::Long(l),
            LitKind::Float(f) => Self::Float(f),
            LitKind::Double(d) => Self::Double(d),
            LitKind::Str(ref s) => Self::Str(s.clone()),
        }
    }

    /// Converts a concrete value back into a literal. Returns `None` for `Unknown`.
    pub fn to_lit(&self) -> Option<LitKind> {
        Some(match *self {
            Self::Unknown => return None,
            Self::Null => LitKind::Null,
            Self::Bool(b) => LitKind::Bool(b),
            Self::Char(c) => LitKind::Char(c),
            Self::Byte(b) => LitKind::Byte(b),
            Self::Short(s) => LitKind::Short(s),
            Self::Int(i) => LitKind::Int(i),
            Self::Long(l) => LitKind::Long(l),
            Self::Float(f) => LitKind::Float(f),
            Self::Double(d) => LitKind::Double(d),
            Self::Str(ref s) => LitKind::Str(s.clone()),
        })
    }

    /// Returns the kind of the value. `None` for `Unknown`.
    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Self::Unknown => return None,
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Boolean,
            Self::Char(_) => ValueKind::Char,
            Self::Byte(_) => ValueKind::Byte,
            Self::Short(_) => ValueKind::Short,
            Self::Int(_) => ValueKind::Int,
            Self::Long(_) => ValueKind::Long,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Str(_) => ValueKind::String,
        })
    }

    /// Returns `true` if the value is not `Unknown`.
    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns the boolean value, if this is one.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same constant, comparing floating point values by
    /// their bits. `Unknown` is never identical to anything.
    pub fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unknown, _) | (_, Self::Unknown) => false,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }

    /// Merges the values of two control flow paths.
    pub fn join(self, other: &Self) -> Self {
        if self.identical(other) { self } else { Self::Unknown }
    }

    /// Kind-aware equality, as performed by `==`.
    ///
    /// Numeric values are compared after numeric promotion, `null == null`, and values of
    /// differing kinds are never equal. Strings are compared by identity, which is never known at
    /// compile time to hold, so two strings are never equal. Returns `None` if either value is
    /// unknown.
    pub fn logical_eq(&self, other: &Self) -> Option<bool> {
        Some(match (self, other) {
            (Self::Unknown, _) | (_, Self::Unknown) => return None,
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(_), Self::Str(_)) => false,
            (a, b) => match (a.as_num(), b.as_num()) {
                (Some(a), Some(b)) => Num::partial_cmp(a, b) == Some(Ordering::Equal),
                _ => false,
            },
        })
    }

    /// Unary numeric promotion.
    fn as_num(&self) -> Option<Num> {
        Some(match *self {
            Self::Char(c) => Num::Int(c as i32),
            Self::Byte(b) => Num::Int(b as i32),
            Self::Short(s) => Num::Int(s as i32),
            Self::Int(i) => Num::Int(i),
            Self::Long(l) => Num::Long(l),
            Self::Float(f) => Num::Float(f),
            Self::Double(d) => Num::Double(d),
            _ => return None,
        })
    }

    /// Returns `true` if the value is a number or a `char`.
    pub fn is_numeric(&self) -> bool {
        self.as_num().is_some()
    }

    fn is_integral(&self) -> bool {
        matches!(self, Self::Char(_) | Self::Byte(_) | Self::Short(_) | Self::Int(_) | Self::Long(_))
    }

    /// Applies a unary operator.
    ///
    /// Increment and decrement mutate a variable and are not defined on values.
    pub fn unary(op: UnOpKind, operand: &Self) -> EvalResult<Self> {
        if !operand.is_known() && !op.has_side_effects() {
            return Ok(Self::Unknown);
        }
        let mismatch = || EE::UnaryMismatch { op, operand: operand.kind() }.into();
        Ok(match op {
            UnOpKind::Not => Self::Bool(!operand.as_bool().ok_or_else(mismatch)?),
            UnOpKind::Plus => operand.as_num().ok_or_else(mismatch)?.into_value(),
            UnOpKind::Neg => match operand.as_num().ok_or_else(mismatch)? {
                Num::Int(i) => Self::Int(i.wrapping_neg()),
                Num::Long(l) => Self::Long(l.wrapping_neg()),
                Num::Float(f) => Self::Float(-f),
                Num::Double(d) => Self::Double(-d),
            },
            UnOpKind::BitNot => match operand.as_num() {
                Some(Num::Int(i)) => Self::Int(!i),
                Some(Num::Long(l)) => Self::Long(!l),
                _ => return Err(mismatch()),
            },
            UnOpKind::PreInc | UnOpKind::PreDec | UnOpKind::PostInc | UnOpKind::PostDec => {
                return Err(EE::MutatedValue(op).into());
            }
        })
    }

    /// Applies a binary operator.
    ///
    /// Both operands are always considered evaluated: short-circuiting is the caller's concern.
    pub fn binary(op: BinOpKind, lhs: &Self, rhs: &Self) -> EvalResult<Self> {
        if !lhs.is_known() || !rhs.is_known() {
            return Ok(Self::Unknown);
        }
        let mismatch = || EE::BinaryMismatch { op, lhs: lhs.kind(), rhs: rhs.kind() }.into();
        Ok(match op {
            BinOpKind::Add if matches!(lhs, Self::Str(_)) || matches!(rhs, Self::Str(_)) => {
                let mut s = lhs.to_host_string();
                s.push_str(&rhs.to_host_string());
                Self::Str(s.into())
            }
            BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mul | BinOpKind::Div | BinOpKind::Rem => {
                let (Some(a), Some(b)) = (lhs.as_num(), rhs.as_num()) else {
                    return Err(mismatch());
                };
                arith(op, a, b)?
            }
            BinOpKind::Shl | BinOpKind::Shr | BinOpKind::Ushr => {
                if !lhs.is_integral() || !rhs.is_integral() {
                    return Err(mismatch());
                }
                let (Some(a), Some(b)) = (lhs.as_num(), rhs.as_num()) else {
                    return Err(mismatch());
                };
                shift(op, a, b)
            }
            BinOpKind::BitAnd | BinOpKind::BitOr | BinOpKind::BitXor => match (lhs, rhs) {
                (&Self::Bool(a), &Self::Bool(b)) => Self::Bool(match op {
                    BinOpKind::BitAnd => a & b,
                    BinOpKind::BitOr => a | b,
                    _ => a ^ b,
                }),
                _ if lhs.is_integral() && rhs.is_integral() => {
                    let (Some(a), Some(b)) = (lhs.as_num(), rhs.as_num()) else {
                        return Err(mismatch());
                    };
                    bitwise(op, a, b)
                }
                _ => return Err(mismatch()),
            },
            BinOpKind::And | BinOpKind::Or => match (lhs, rhs) {
                (&Self::Bool(a), &Self::Bool(b)) => {
                    Self::Bool(if op == BinOpKind::And { a && b } else { a || b })
                }
                _ => return Err(mismatch()),
            },
            BinOpKind::Eq | BinOpKind::Ne => {
                let eq = lhs.logical_eq(rhs).ok_or_else(mismatch)?;
                Self::Bool(eq == (op == BinOpKind::Eq))
            }
            BinOpKind::Lt | BinOpKind::Le | BinOpKind::Gt | BinOpKind::Ge => {
                let (Some(a), Some(b)) = (lhs.as_num(), rhs.as_num()) else {
                    return Err(mismatch());
                };
                let ord = Num::partial_cmp(a, b);
                Self::Bool(match op {
                    BinOpKind::Lt => ord == Some(Ordering::Less),
                    BinOpKind::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                    BinOpKind::Gt => ord == Some(Ordering::Greater),
                    _ => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
                })
            }
        })
    }

    /// Converts the value to the given primitive type, as done by assignment and compound
    /// assignment to a variable of that type.
    ///
    /// Returns `Unknown` if the value cannot be converted.
    pub fn convert(&self, ty: PrimTy) -> Self {
        if let (PrimTy::Boolean, Self::Bool(_)) = (ty, self) {
            return self.clone();
        }
        let Some(n) = self.as_num() else { return Self::Unknown };
        match ty {
            PrimTy::Boolean => Self::Unknown,
            PrimTy::Int => Self::Int(n.to_i32()),
            PrimTy::Char => Self::Char(n.to_i32() as u16),
            PrimTy::Byte => Self::Byte(n.to_i32() as i8),
            PrimTy::Short => Self::Short(n.to_i32() as i16),
            PrimTy::Long => Self::Long(match n {
                Num::Int(i) => i as i64,
                Num::Long(l) => l,
                Num::Float(f) => f as i64,
                Num::Double(d) => d as i64,
            }),
            PrimTy::Float => Self::Float(match n {
                Num::Int(i) => i as f32,
                Num::Long(l) => l as f32,
                Num::Float(f) => f,
                Num::Double(d) => d as f32,
            }),
            PrimTy::Double => Self::Double(match n {
                Num::Int(i) => i as f64,
                Num::Long(l) => l as f64,
                Num::Float(f) => f as f64,
                Num::Double(d) => d,
            }),
        }
    }

    /// Formats the value the way string concatenation does.
    pub fn to_host_string(&self) -> String {
        match self {
            Self::Unknown => "<unknown>".into(),
            Self::Null => "null".into(),
            Self::Bool(b) => b.to_string(),
            Self::Char(c) => String::from_utf16_lossy(&[*c]),
            Self::Byte(b) => b.to_string(),
            Self::Short(s) => s.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Long(l) => l.to_string(),
            Self::Float(f) => float_to_string(*f),
            Self::Double(d) => double_to_string(*d),
            Self::Str(s) => s.to_string(),
        }
    }
}

impl Num {
    /// Narrowing to `int`. Floating point values saturate and `NaN` becomes zero.
    fn to_i32(self) -> i32 {
        match self {
            Self::Int(i) => i,
            Self::Long(l) => l as i32,
            Self::Float(f) => f as i32,
            Self::Double(d) => d as i32,
        }
    }
}

/// Formats the value as a literal.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_lit() {
            Some(lit) => lit.fmt(f),
            None => f.write_str("<unknown>"),
        }
    }
}

fn arith(op: BinOpKind, a: Num, b: Num) -> EvalResult<Value> {
    Ok(match Num::promote(a, b) {
        (Num::Int(a), Num::Int(b)) => Value::Int(match op {
            BinOpKind::Add => a.wrapping_add(b),
            BinOpKind::Sub => a.wrapping_sub(b),
            BinOpKind::Mul => a.wrapping_mul(b),
            _ if b == 0 => return Err(EE::DivisionByZero.into()),
            BinOpKind::Div => a.wrapping_div(b),
            _ => a.wrapping_rem(b),
        }),
        (Num::Long(a), Num::Long(b)) => Value::Long(match op {
            BinOpKind::Add => a.wrapping_add(b),
            BinOpKind::Sub => a.wrapping_sub(b),
            BinOpKind::Mul => a.wrapping_mul(b),
            _ if b == 0 => return Err(EE::DivisionByZero.into()),
            BinOpKind::Div => a.wrapping_div(b),
            _ => a.wrapping_rem(b),
        }),
        (Num::Float(a), Num::Float(b)) => Value::Float(match op {
            BinOpKind::Add => a + b,
            BinOpKind::Sub => a - b,
            BinOpKind::Mul => a * b,
            BinOpKind::Div => a / b,
            _ => a % b,
        }),
        (Num::Double(a), Num::Double(b)) => Value::Double(match op {
            BinOpKind::Add => a + b,
            BinOpKind::Sub => a - b,
            BinOpKind::Mul => a * b,
            BinOpKind::Div => a / b,
            _ => a % b,
        }),
        _ => unreachable!("operands are promoted to the same representation"),
    })
}

/// Shifts use unary promotion of each operand; the distance is masked to the width of the
/// promoted left operand.
fn shift(op: BinOpKind, a: Num, b: Num) -> Value {
    let dist = match b {
        Num::Int(i) => i as u32,
        Num::Long(l) => l as u32,
        Num::Float(_) | Num::Double(_) => 0,
    };
    match a {
        Num::Int(a) => Value::Int(match op {
            BinOpKind::Shl => a.wrapping_shl(dist),
            BinOpKind::Shr => a.wrapping_shr(dist),
            _ => (a as u32).wrapping_shr(dist) as i32,
        }),
        Num::Long(a) => Value::Long(match op {
            BinOpKind::Shl => a.wrapping_shl(dist),
            BinOpKind::Shr => a.wrapping_shr(dist),
            _ => (a as u64).wrapping_shr(dist) as i64,
        }),
        Num::Float(_) | Num::Double(_) => Value::Unknown,
    }
}

fn bitwise(op: BinOpKind, a: Num, b: Num) -> Value {
    let apply = |a: i64, b: i64| match op {
        BinOpKind::BitAnd => a & b,
        BinOpKind::BitOr => a | b,
        _ => a ^ b,
    };
    match Num::promote(a, b) {
        (Num::Int(a), Num::Int(b)) => Value::Int(apply(a as i64, b as i64) as i32),
        (Num::Long(a), Num::Long(b)) => Value::Long(apply(a, b)),
        _ => Value::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvalErrorKind;

    const ALL_BINOPS: [BinOpKind; 19] = [
        BinOpKind::Lt,
        BinOpKind::Le,
        BinOpKind::Gt,
        BinOpKind::Ge,
        BinOpKind::Eq,
        BinOpKind::Ne,
        BinOpKind::Or,
        BinOpKind::And,
        BinOpKind::Shr,
        BinOpKind::Shl,
        BinOpKind::Ushr,
        BinOpKind::BitAnd,
        BinOpKind::BitOr,
        BinOpKind::BitXor,
        BinOpKind::Add,
        BinOpKind::Sub,
        BinOpKind::Mul,
        BinOpKind::Div,
        BinOpKind::Rem,
    ];

    fn bin(op: BinOpKind, a: Value, b: Value) -> Value {
        Value::binary(op, &a, &b).unwrap()
    }

    #[test]
    fn unknown_is_absorbing() {
        let samples = [
            Value::Null,
            Value::Bool(true),
            Value::Int(0),
            Value::Double(1.5),
            Value::Str("s".into()),
        ];
        for op in ALL_BINOPS {
            for v in &samples {
                assert_eq!(bin(op, Value::Unknown, v.clone()), Value::Unknown, "{op}");
                assert_eq!(bin(op, v.clone(), Value::Unknown), Value::Unknown, "{op}");
            }
        }
        for op in [UnOpKind::Not, UnOpKind::Neg, UnOpKind::Plus, UnOpKind::BitNot] {
            assert_eq!(Value::unary(op, &Value::Unknown).unwrap(), Value::Unknown);
        }
    }

    #[test]
    fn numeric_promotion() {
        assert_eq!(bin(BinOpKind::Add, Value::Int(2), Value::Long(3)), Value::Long(5));
        assert_eq!(bin(BinOpKind::Add, Value::Char(b'a' as u16), Value::Int(1)), Value::Int(98));
        assert_eq!(bin(BinOpKind::Mul, Value::Byte(3), Value::Short(4)), Value::Int(12));
        assert_eq!(bin(BinOpKind::Add, Value::Long(1), Value::Float(0.5)), Value::Float(1.5));
        assert_eq!(bin(BinOpKind::Div, Value::Float(1.0), Value::Double(4.0)), Value::Double(0.25));
        assert_eq!(bin(BinOpKind::Div, Value::Int(7), Value::Int(-2)), Value::Int(-3));
        assert_eq!(bin(BinOpKind::Rem, Value::Int(-7), Value::Int(2)), Value::Int(-1));
        assert_eq!(bin(BinOpKind::Add, Value::Int(i32::MAX), Value::Int(1)), Value::Int(i32::MIN));
        assert_eq!(bin(BinOpKind::Div, Value::Int(i32::MIN), Value::Int(-1)), Value::Int(i32::MIN));
        assert_eq!(
            bin(BinOpKind::Div, Value::Double(1.0), Value::Double(0.0)),
            Value::Double(f64::INFINITY)
        );
    }

    #[test]
    fn shifts_and_bits() {
        assert_eq!(bin(BinOpKind::Shl, Value::Int(1), Value::Long(33)), Value::Int(2));
        assert_eq!(bin(BinOpKind::Shl, Value::Long(1), Value::Int(33)), Value::Long(1 << 33));
        assert_eq!(bin(BinOpKind::Shr, Value::Int(-8), Value::Int(1)), Value::Int(-4));
        assert_eq!(bin(BinOpKind::Ushr, Value::Int(-1), Value::Int(28)), Value::Int(15));
        assert_eq!(bin(BinOpKind::BitXor, Value::Bool(true), Value::Bool(true)), Value::Bool(false));
        assert_eq!(bin(BinOpKind::BitAnd, Value::Int(6), Value::Long(3)), Value::Long(2));
        assert_eq!(Value::unary(UnOpKind::BitNot, &Value::Byte(0)).unwrap(), Value::Int(-1));
        assert!(Value::binary(BinOpKind::Shl, &Value::Double(1.0), &Value::Int(1)).is_err());
    }

    #[test]
    fn equality_special_cases() {
        assert_eq!(Value::Null.logical_eq(&Value::Null), Some(true));
        assert_eq!(Value::Bool(true).logical_eq(&Value::Int(1)), Some(false));
        assert_eq!(Value::Null.logical_eq(&Value::Str("a".into())), Some(false));
        assert_eq!(Value::Str("a".into()).logical_eq(&Value::Str("a".into())), Some(false));
        assert_eq!(Value::Int(3).logical_eq(&Value::Long(3)), Some(true));
        assert_eq!(Value::Double(f64::NAN).logical_eq(&Value::Double(f64::NAN)), Some(false));
        assert_eq!(Value::Unknown.logical_eq(&Value::Null), None);
        assert_eq!(bin(BinOpKind::Ne, Value::Str("a".into()), Value::Str("a".into())), Value::Bool(true));
    }

    #[test]
    fn string_concatenation() {
        let s = |s: &str| Value::Str(s.into());
        assert_eq!(bin(BinOpKind::Add, s("a"), Value::Int(1)), s("a1"));
        assert_eq!(bin(BinOpKind::Add, Value::Char(b'c' as u16), s("d")), s("cd"));
        assert_eq!(bin(BinOpKind::Add, Value::Null, s("!")), s("null!"));
        assert_eq!(bin(BinOpKind::Add, s("x="), Value::Double(1e10)), s("x=1.0E10"));
        assert_eq!(bin(BinOpKind::Add, s(""), Value::Float(2.0)), s("2.0"));
    }

    #[test]
    fn modeling_errors() {
        let err = |r: EvalResult<Value>| r.unwrap_err().kind;
        assert!(matches!(
            err(Value::binary(BinOpKind::Div, &Value::Long(1), &Value::Long(0))),
            EvalErrorKind::DivisionByZero
        ));
        assert!(matches!(
            err(Value::binary(BinOpKind::Rem, &Value::Int(1), &Value::Char(0))),
            EvalErrorKind::DivisionByZero
        ));
        assert!(matches!(
            err(Value::binary(BinOpKind::Sub, &Value::Bool(true), &Value::Int(1))),
            EvalErrorKind::BinaryMismatch { op: BinOpKind::Sub, lhs: Some(ValueKind::Boolean), .. }
        ));
        assert!(matches!(
            err(Value::binary(BinOpKind::Lt, &Value::Str("a".into()), &Value::Str("b".into()))),
            EvalErrorKind::BinaryMismatch { .. }
        ));
        assert!(matches!(
            err(Value::unary(UnOpKind::PostInc, &Value::Int(1))),
            EvalErrorKind::MutatedValue(UnOpKind::PostInc)
        ));
        assert!(matches!(
            err(Value::unary(UnOpKind::Not, &Value::Int(1))),
            EvalErrorKind::UnaryMismatch { .. }
        ));
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::Int(300).convert(PrimTy::Byte), Value::Byte(44));
        assert_eq!(Value::Double(3.9).convert(PrimTy::Int), Value::Int(3));
        assert_eq!(Value::Double(1e20).convert(PrimTy::Long), Value::Long(i64::MAX));
        assert_eq!(Value::Double(f64::NAN).convert(PrimTy::Int), Value::Int(0));
        assert_eq!(Value::Int(65).convert(PrimTy::Char), Value::Char(65));
        assert_eq!(Value::Char(65).convert(PrimTy::Double), Value::Double(65.0));
        assert_eq!(Value::Str("a".into()).convert(PrimTy::Int), Value::Unknown);
        assert_eq!(Value::Bool(true).convert(PrimTy::Boolean), Value::Bool(true));
    }

    #[test]
    fn joins() {
        assert_eq!(Value::Int(1).join(&Value::Int(1)), Value::Int(1));
        assert_eq!(Value::Int(1).join(&Value::Long(1)), Value::Unknown);
        assert_eq!(Value::Double(f64::NAN).join(&Value::Double(f64::NAN)).kind(), Some(ValueKind::Double));
        assert_eq!(Value::Unknown.join(&Value::Unknown), Value::Unknown);
    }
}
