//! Static types of expressions, as far as the tree determines them.

use super::{BinOpKind, Body, ExprId, ExprKind, PrimTy, TypeName, UnOpKind};

impl Body {
    /// Returns the static type of an expression.
    ///
    /// Returns `None` when the type depends on declarations outside the body, like the types of
    /// fields and method results, and for `null`.
    pub fn static_ty(&self, id: ExprId) -> Option<TypeName> {
        match self.exprs[id].kind {
            ExprKind::Lit(ref lit) => lit.ty(),
            ExprKind::Ident(var) => Some(self.vars[var].ty.clone()),
            ExprKind::Paren(inner) => self.static_ty(inner),
            ExprKind::Assign(lhs, ..) => self.static_ty(lhs),
            ExprKind::Cast(ref ty, _) | ExprKind::New { ref ty, .. } => Some(ty.clone()),
            ExprKind::InstanceOf(..) => Some(TypeName::BOOLEAN),
            ExprKind::Index(array, _) => match self.static_ty(array)? {
                TypeName::Array(elem) => Some(*elem),
                _ => None,
            },
            ExprKind::Unary(op, operand) => match op {
                UnOpKind::Not => Some(TypeName::BOOLEAN),
                _ if op.has_side_effects() => self.static_ty(operand),
                _ => Some(TypeName::Prim(self.prim_ty(operand)?.unary_promoted())),
            },
            ExprKind::Binary(lhs, op, rhs) => self.binary_ty(lhs, op, rhs),
            ExprKind::Ternary(_, then, els) => self.conditional_ty(then, els),
            ExprKind::Field { .. } | ExprKind::Call { .. } | ExprKind::Err => None,
        }
    }

    /// Returns the static type of an expression if it is primitive.
    pub fn prim_ty(&self, id: ExprId) -> Option<PrimTy> {
        self.static_ty(id)?.as_prim()
    }

    fn binary_ty(&self, lhs: ExprId, op: BinOpKind, rhs: ExprId) -> Option<TypeName> {
        if op.is_comparison() || op.is_short_circuit() {
            return Some(TypeName::BOOLEAN);
        }
        if op == BinOpKind::Add
            && [lhs, rhs].iter().any(|&e| self.static_ty(e).is_some_and(|ty| ty.is_string()))
        {
            return Some(TypeName::string());
        }
        let (l, r) = (self.prim_ty(lhs)?, self.prim_ty(rhs)?);
        let ty = match op {
            _ if op.is_shift() => l.unary_promoted(),
            BinOpKind::BitAnd | BinOpKind::BitOr | BinOpKind::BitXor
                if (l, r) == (PrimTy::Boolean, PrimTy::Boolean) =>
            {
                PrimTy::Boolean
            }
            _ => l.binary_promoted(r)?,
        };
        Some(TypeName::Prim(ty))
    }

    /// The type of `c ? then : els`.
    ///
    /// Mixed `byte`, `short` and `char` arms take a type that depends on the value of constant
    /// arms, so those are `None`.
    fn conditional_ty(&self, then: ExprId, els: ExprId) -> Option<TypeName> {
        let (t, f) = (self.static_ty(then)?, self.static_ty(els)?);
        if t == f {
            return Some(t);
        }
        let (t, f) = (t.as_prim()?, f.as_prim()?);
        let narrow = |p: PrimTy| p.unary_promoted() != p;
        if narrow(t) || narrow(f) {
            return None;
        }
        Some(TypeName::Prim(t.binary_promoted(f)?))
    }
}

#[cfg(test)]
mod tests {
    use crate::{BodyBuilder, ast::*};

    #[test]
    fn promotion() {
        let mut b = BodyBuilder::new("f");
        let s = b.local("s", TypeName::SHORT);
        let (one, two) = (b.int(1), b.double(2.0));
        let c = b.bool(true);
        let mixed = b.ternary(c, one, two);
        let rs = b.ident(s);
        let neg = b.unary(UnOpKind::Neg, rs);
        let (rs, one) = (b.ident(s), b.int(1));
        let mixed_narrow = {
            let c = b.bool(true);
            b.ternary(c, rs, one)
        };
        let (l, r) = (b.long(1), b.int(2));
        let shift = b.binary(r, BinOpKind::Shl, l);
        let (x, y) = (b.str("a"), b.int(1));
        let concat = b.binary(x, BinOpKind::Add, y);
        let body = b.finish();

        assert_eq!(body.prim_ty(mixed), Some(PrimTy::Double));
        assert_eq!(body.prim_ty(neg), Some(PrimTy::Int));
        assert_eq!(body.static_ty(mixed_narrow), None);
        assert_eq!(body.prim_ty(shift), Some(PrimTy::Int));
        assert_eq!(body.static_ty(concat), Some(TypeName::string()));
    }

    #[test]
    fn references() {
        let mut b = BodyBuilder::new("f");
        let a = b.param("a", TypeName::INT.array_of().array_of());
        let list = b.param("list", TypeName::class("List"));
        let (ra, zero) = (b.ident(a), b.int(0));
        let row = b.index(ra, zero);
        let rl = b.ident(list);
        let field = b.field(Some(rl), "size");
        let body = b.finish();

        assert_eq!(body.static_ty(row), Some(TypeName::INT.array_of()));
        assert_eq!(body.static_ty(field), None);
    }
}
