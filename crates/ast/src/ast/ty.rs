use super::Lrc;
use std::fmt;

/// A primitive type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimTy {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimTy {
    /// Returns the keyword of the type.
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Returns `true` for every primitive type except `boolean`.
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Boolean)
    }

    /// Returns `true` for the integral types, including `char`.
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Char | Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    /// Unary numeric promotion: `byte`, `short` and `char` widen to `int`.
    pub const fn unary_promoted(self) -> Self {
        match self {
            Self::Char | Self::Byte | Self::Short => Self::Int,
            p => p,
        }
    }

    /// Binary numeric promotion: the wider of the two unary-promoted types.
    ///
    /// Returns `None` if either type is not numeric.
    pub fn binary_promoted(self, other: Self) -> Option<Self> {
        if !self.is_numeric() || !other.is_numeric() {
            return None;
        }
        Some(self.unary_promoted().max(other.unary_promoted()))
    }
}

impl fmt::Display for PrimTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A type as written in a declaration or expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeName {
    /// A primitive type: `int`.
    Prim(PrimTy),
    /// A class or interface type, by name: `String`, `java.util.List`.
    Class(Lrc<str>),
    /// An array type: `int[]`.
    Array(Box<TypeName>),
}

impl TypeName {
    pub const BOOLEAN: Self = Self::Prim(PrimTy::Boolean);
    pub const CHAR: Self = Self::Prim(PrimTy::Char);
    pub const BYTE: Self = Self::Prim(PrimTy::Byte);
    pub const SHORT: Self = Self::Prim(PrimTy::Short);
    pub const INT: Self = Self::Prim(PrimTy::Int);
    pub const LONG: Self = Self::Prim(PrimTy::Long);
    pub const FLOAT: Self = Self::Prim(PrimTy::Float);
    pub const DOUBLE: Self = Self::Prim(PrimTy::Double);

    /// Returns the `String` class type.
    pub fn string() -> Self {
        Self::Class("String".into())
    }

    /// Creates a class type.
    pub fn class(name: impl Into<Lrc<str>>) -> Self {
        Self::Class(name.into())
    }

    /// Creates an array type of `self`.
    pub fn array_of(self) -> Self {
        Self::Array(Box::new(self))
    }

    /// Returns the primitive type, if this is one.
    pub fn as_prim(&self) -> Option<PrimTy> {
        match *self {
            Self::Prim(p) => Some(p),
            _ => None,
        }
    }

    /// Returns `true` if values of this type are references.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Prim(_))
    }

    /// Returns `true` if this is `String` or `java.lang.String`.
    pub fn is_string(&self) -> bool {
        matches!(self, Self::Class(name) if matches!(&**name, "String" | "java.lang.String"))
    }

    /// Returns the name of the class or array type that declares the methods of values of this
    /// type.
    pub fn owner_name(&self) -> Lrc<str> {
        match self {
            Self::Class(name) => name.clone(),
            _ => self.to_string().into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prim(p) => p.fmt(f),
            Self::Class(name) => f.write_str(name),
            Self::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(TypeName::INT.array_of().array_of().to_string(), "int[][]");
        assert!(TypeName::string().is_string() && TypeName::string().is_reference());
        assert!(!TypeName::LONG.is_reference());
        assert!(PrimTy::Char.is_integral() && !PrimTy::Double.is_integral());
    }
}
