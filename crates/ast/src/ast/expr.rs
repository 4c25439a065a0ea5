use super::{ExprId, LitKind, Lrc, TypeName, VarId};
use kiln_data_structures::smallvec::{SmallVec, smallvec};
use kiln_interface::Span;
use std::fmt;

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

/// A kind of expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// A literal: `42`, `"foo"`, `null`.
    Lit(LitKind),

    /// A read of a local variable or parameter: `foo`.
    Ident(VarId),

    /// Access of a field: `obj.f`, `Foo.CONST`, or an implicit `this.f`.
    ///
    /// Fields are global (heap) storage.
    Field {
        /// The object the field is read from. `None` for static fields and implicit `this`.
        receiver: Option<ExprId>,
        name: Lrc<str>,
        is_static: bool,
    },

    /// An assignment: `a = b`, `a += b`.
    Assign(ExprId, Option<BinOpKind>, ExprId),

    /// A binary operation: `a + b`, `a >>> b`.
    Binary(ExprId, BinOpKind, ExprId),

    /// A unary operation: `!x`, `-x`, `x++`.
    Unary(UnOpKind, ExprId),

    /// A parenthesized expression: `(a)`.
    Paren(ExprId),

    /// A ternary (AKA conditional) expression: `foo ? bar : baz`.
    Ternary(ExprId, ExprId, ExprId),

    /// A method call: `recv.foo(1, 2)`.
    Call {
        receiver: Option<ExprId>,
        callee: Callee,
        args: Vec<ExprId>,
    },

    /// An instance creation expression: `new Foo(a, b)`.
    New { ty: TypeName, args: Vec<ExprId> },

    /// An array element access: `array[index]`.
    Index(ExprId, ExprId),

    /// A cast: `(int) x`.
    Cast(TypeName, ExprId),

    /// An `instanceof` test: `x instanceof Foo`.
    InstanceOf(ExprId, TypeName),

    /// An erroneous expression that the producer of the tree could not represent.
    Err,
}

impl ExprKind {
    /// Returns the direct children of this expression in evaluation order.
    pub fn children(&self) -> SmallVec<[ExprId; 4]> {
        match *self {
            Self::Lit(_) | Self::Ident(_) | Self::Err => SmallVec::new(),
            Self::Field { receiver, .. } => receiver.into_iter().collect(),
            Self::Assign(lhs, _, rhs) | Self::Binary(lhs, _, rhs) | Self::Index(lhs, rhs) => {
                smallvec![lhs, rhs]
            }
            Self::Unary(_, e) | Self::Paren(e) | Self::Cast(_, e) | Self::InstanceOf(e, _) => {
                smallvec![e]
            }
            Self::Ternary(c, t, f) => smallvec![c, t, f],
            Self::Call { receiver, ref args, .. } => {
                receiver.into_iter().chain(args.iter().copied()).collect()
            }
            Self::New { ref args, .. } => args.iter().copied().collect(),
        }
    }

    /// Replaces the child slot holding `old` with `new`.
    ///
    /// Returns `false` if `old` is not a direct child.
    pub fn replace_child(&mut self, old: ExprId, new: ExprId) -> bool {
        fn swap(slot: &mut ExprId, old: ExprId, new: ExprId) -> bool {
            if *slot == old {
                *slot = new;
                true
            } else {
                false
            }
        }

        match self {
            Self::Lit(_) | Self::Ident(_) | Self::Err => false,
            Self::Field { receiver, .. } => receiver.as_mut().is_some_and(|r| swap(r, old, new)),
            Self::Assign(lhs, _, rhs) | Self::Binary(lhs, _, rhs) | Self::Index(lhs, rhs) => {
                swap(lhs, old, new) || swap(rhs, old, new)
            }
            Self::Unary(_, e) | Self::Paren(e) | Self::Cast(_, e) | Self::InstanceOf(e, _) => {
                swap(e, old, new)
            }
            Self::Ternary(c, t, f) => swap(c, old, new) || swap(t, old, new) || swap(f, old, new),
            Self::Call { receiver, args, .. } => {
                receiver.as_mut().is_some_and(|r| swap(r, old, new))
                    || args.iter_mut().any(|a| swap(a, old, new))
            }
            Self::New { args, .. } => args.iter_mut().any(|a| swap(a, old, new)),
        }
    }

    /// Returns `true` if this is a literal.
    #[inline]
    pub fn is_lit(&self) -> bool {
        matches!(self, Self::Lit(_))
    }

    /// Returns the literal if this is one.
    #[inline]
    pub fn as_lit(&self) -> Option<&LitKind> {
        match self {
            Self::Lit(lit) => Some(lit),
            _ => None,
        }
    }

    /// Returns a short description of the expression kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Lit(_) => "literal",
            Self::Ident(_) => "variable",
            Self::Field { .. } => "field access",
            Self::Assign(_, None, _) => "assignment",
            Self::Assign(_, Some(_), _) => "compound assignment",
            Self::Binary(..) => "binary operation",
            Self::Unary(..) => "unary operation",
            Self::Paren(_) => "parenthesized expression",
            Self::Ternary(..) => "conditional expression",
            Self::Call { .. } => "method call",
            Self::New { .. } => "instance creation",
            Self::Index(..) => "array access",
            Self::Cast(..) => "cast",
            Self::InstanceOf(..) => "`instanceof` test",
            Self::Err => "erroneous expression",
        }
    }
}

/// A called method, identified by its declaring type, name and number of parameters.
///
/// This is the key under which the effect signatures of analyzed methods are stored.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Callee {
    pub owner: Lrc<str>,
    pub name: Lrc<str>,
    pub arity: u32,
}

impl Callee {
    /// The name used for constructors.
    pub const CONSTRUCTOR: &'static str = "<init>";

    /// Creates a new callee.
    pub fn new(owner: impl Into<Lrc<str>>, name: impl Into<Lrc<str>>, arity: u32) -> Self {
        Self { owner: owner.into(), name: name.into(), arity }
    }

    /// Creates a new constructor callee of the given class.
    pub fn constructor(owner: impl Into<Lrc<str>>, arity: u32) -> Self {
        Self::new(owner, Self::CONSTRUCTOR, arity)
    }

    /// Returns `true` if this is a constructor.
    pub fn is_constructor(&self) -> bool {
        &*self.name == Self::CONSTRUCTOR
    }
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", self.owner, self.name, self.arity)
    }
}

/// A kind of binary operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOpKind {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `||`
    Or,
    /// `&&`
    And,

    /// `>>`
    Shr,
    /// `<<`
    Shl,
    /// `>>>`
    Ushr,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,

    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl BinOpKind {
    /// Returns the string representation of the operator.
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Or => "||",
            Self::And => "&&",
            Self::Ushr => ">>>",
            Self::Shr => ">>",
            Self::Shl => "<<",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// Returns `true` if the operator can be combined with `=` in a compound assignment.
    pub const fn assignable(self) -> bool {
        match self {
            Self::BitOr
            | Self::BitXor
            | Self::BitAnd
            | Self::Shl
            | Self::Shr
            | Self::Ushr
            | Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::Rem => true,

            Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq | Self::Ne | Self::Or | Self::And => {
                false
            }
        }
    }

    /// Returns `true` if the right operand is only evaluated depending on the left one.
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns `true` if the operator is a comparison.
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq | Self::Ne)
    }

    /// Returns `true` if the operator is a shift.
    pub const fn is_shift(self) -> bool {
        matches!(self, Self::Shl | Self::Shr | Self::Ushr)
    }

    /// Returns the binding power used when printing: higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 3,
            Self::And => 4,
            Self::BitOr => 5,
            Self::BitXor => 6,
            Self::BitAnd => 7,
            Self::Eq | Self::Ne => 8,
            Self::Lt | Self::Le | Self::Gt | Self::Ge => 9,
            Self::Shl | Self::Shr | Self::Ushr => 10,
            Self::Add | Self::Sub => 11,
            Self::Mul | Self::Div | Self::Rem => 12,
        }
    }
}

/// A kind of unary operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnOpKind {
    /// `++x`
    PreInc,
    /// `--x`
    PreDec,
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `~`
    BitNot,

    /// `x++`
    PostInc,
    /// `x--`
    PostDec,
}

impl fmt::Display for UnOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl UnOpKind {
    /// Returns the string representation of the operator.
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::PreInc => "++",
            Self::PreDec => "--",
            Self::Not => "!",
            Self::Neg => "-",
            Self::Plus => "+",
            Self::BitNot => "~",
            Self::PostInc => "++",
            Self::PostDec => "--",
        }
    }

    /// Returns `true` if the operator is a prefix operator.
    pub const fn is_prefix(self) -> bool {
        match self {
            Self::PreInc | Self::PreDec | Self::Not | Self::Neg | Self::Plus | Self::BitNot => true,
            Self::PostInc | Self::PostDec => false,
        }
    }

    /// Returns `true` if the operator is a postfix operator.
    pub const fn is_postfix(self) -> bool {
        !self.is_prefix()
    }

    /// Returns `true` if the operator writes back to its operand.
    pub const fn has_side_effects(self) -> bool {
        matches!(self, Self::PreInc | Self::PreDec | Self::PostInc | Self::PostDec)
    }

    /// Returns `true` if the operator increments its operand.
    pub const fn is_increment(self) -> bool {
        matches!(self, Self::PreInc | Self::PostInc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_match_slots() {
        let ids: Vec<ExprId> = (0..4).map(ExprId::from_usize).collect();
        let mut kind = ExprKind::Call {
            receiver: Some(ids[0]),
            callee: Callee::new("Foo", "bar", 2),
            args: vec![ids[1], ids[2]],
        };
        assert_eq!(kind.children().as_slice(), &ids[..3]);
        assert!(kind.replace_child(ids[2], ids[3]));
        assert_eq!(kind.children().as_slice(), &[ids[0], ids[1], ids[3]]);
        assert!(!kind.replace_child(ids[2], ids[3]));

        let mut kind = ExprKind::Field { receiver: None, name: "f".into(), is_static: true };
        assert!(kind.children().is_empty());
        assert!(!kind.replace_child(ids[0], ids[1]));
    }

    #[test]
    fn operators() {
        assert!(BinOpKind::Ushr.assignable());
        assert!(!BinOpKind::And.assignable());
        assert!(BinOpKind::Mul.precedence() > BinOpKind::Add.precedence());
        assert_eq!(UnOpKind::PostDec.to_str(), "--");
        assert!(UnOpKind::PostDec.is_postfix() && UnOpKind::PostDec.has_side_effects());
        assert!(!UnOpKind::BitNot.has_side_effects());
        assert_eq!(Callee::constructor("Foo", 0).to_string(), "Foo.<init>/0");
    }
}
