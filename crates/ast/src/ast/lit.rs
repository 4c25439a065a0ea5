use super::{Lrc, PrimTy, TypeName};
use std::{
    fmt::{self, Write},
    hash::{Hash, Hasher},
};

/// A literal value: `42`, `3L`, `'c'`, `"str"`, `null`.
///
/// `byte` and `short` have no literal syntax in source code, but are produced by folding and
/// printed as casts of an `int` literal.
#[derive(Clone, Debug, PartialEq)]
pub enum LitKind {
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

impl LitKind {
    /// Returns the static type of the literal. `None` for `null`.
    pub fn ty(&self) -> Option<TypeName> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => TypeName::Prim(PrimTy::Boolean),
            Self::Char(_) => TypeName::Prim(PrimTy::Char),
            Self::Byte(_) => TypeName::Prim(PrimTy::Byte),
            Self::Short(_) => TypeName::Prim(PrimTy::Short),
            Self::Int(_) => TypeName::Prim(PrimTy::Int),
            Self::Long(_) => TypeName::Prim(PrimTy::Long),
            Self::Float(_) => TypeName::Prim(PrimTy::Float),
            Self::Double(_) => TypeName::Prim(PrimTy::Double),
            Self::Str(_) => TypeName::string(),
        })
    }

    /// Structural equality: floating point values are compared by their bits, so `NaN` equals
    /// itself and `0.0` differs from `-0.0`.
    pub fn bit_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }

    /// Hashes the literal consistently with [`bit_eq`](Self::bit_eq).
    pub fn bit_hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Char(c) => c.hash(state),
            Self::Byte(b) => b.hash(state),
            Self::Short(s) => s.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Long(l) => l.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Double(d) => d.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
        }
    }
}

/// Formats the literal as source code.
impl fmt::Display for LitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Char(c) => {
                f.write_char('\'')?;
                write_escaped(f, *c, '\'')?;
                f.write_char('\'')
            }
            Self::Byte(b) => write!(f, "(byte) {b}"),
            Self::Short(s) => write!(f, "(short) {s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Long(l) => write!(f, "{l}L"),
            Self::Float(x) if x.is_nan() => f.write_str("Float.NaN"),
            Self::Float(x) if x.is_infinite() => {
                let sign = if x.is_sign_negative() { "NEGATIVE" } else { "POSITIVE" };
                write!(f, "Float.{sign}_INFINITY")
            }
            Self::Float(x) => write!(f, "{}f", float_to_string(*x)),
            Self::Double(x) if x.is_nan() => f.write_str("Double.NaN"),
            Self::Double(x) if x.is_infinite() => {
                let sign = if x.is_sign_negative() { "NEGATIVE" } else { "POSITIVE" };
                write!(f, "Double.{sign}_INFINITY")
            }
            Self::Double(x) => f.write_str(&double_to_string(*x)),
            Self::Str(s) => {
                f.write_char('"')?;
                for unit in s.encode_utf16() {
                    write_escaped(f, unit, '"')?;
                }
                f.write_char('"')
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, unit: u16, quote: char) -> fmt::Result {
    match char::from_u32(unit as u32) {
        Some('\n') => f.write_str("\\n"),
        Some('\t') => f.write_str("\\t"),
        Some('\r') => f.write_str("\\r"),
        Some('\\') => f.write_str("\\\\"),
        Some(c) if c == quote => write!(f, "\\{c}"),
        Some(c) if !c.is_control() => f.write_char(c),
        _ => write!(f, "\\u{unit:04x}"),
    }
}

/// Converts a `double` to a string the way `Double.toString` does.
///
/// Magnitudes in `[1e-3, 1e7)` use plain decimal notation with at least one fractional digit,
/// everything else uses `d.dddE±n` notation.
pub fn double_to_string(x: f64) -> String {
    if x.is_nan() {
        return "NaN".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0" } else { "0.0" }.into();
    }
    let abs = x.abs();
    if (1e-3..1e7).contains(&abs) { plain(format!("{x}")) } else { scientific(format!("{x:e}")) }
}

/// Converts a `float` to a string the way `Float.toString` does.
pub fn float_to_string(x: f32) -> String {
    if x.is_nan() {
        return "NaN".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0" } else { "0.0" }.into();
    }
    let abs = x.abs();
    if (1e-3..1e7).contains(&abs) { plain(format!("{x}")) } else { scientific(format!("{x:e}")) }
}

fn plain(mut s: String) -> String {
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

fn scientific(s: String) -> String {
    let Some((mantissa, exp)) = s.split_once('e') else { return s };
    let mut out = String::with_capacity(s.len() + 3);
    out.push_str(mantissa);
    if !mantissa.contains('.') {
        out.push_str(".0");
    }
    out.push('E');
    out.push_str(exp);
    out
}
