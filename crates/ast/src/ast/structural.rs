//! Deep structural equality and hashing of expressions.

use super::{Body, ExprId, ExprKind};
use kiln_data_structures::map::rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

impl Body {
    /// Returns `true` if the two expressions are structurally equal.
    ///
    /// Spans are ignored, variables are compared by identity and literals by
    /// [`bit_eq`](super::LitKind::bit_eq).
    pub fn expr_eq(&self, a: ExprId, b: ExprId) -> bool {
        if a == b {
            return true;
        }
        let (a, b) = (&self.exprs[a].kind, &self.exprs[b].kind);
        let all_eq = |xs: &[ExprId], ys: &[ExprId]| {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(&x, &y)| self.expr_eq(x, y))
        };
        let opt_eq = |x: Option<ExprId>, y: Option<ExprId>| match (x, y) {
            (Some(x), Some(y)) => self.expr_eq(x, y),
            (None, None) => true,
            _ => false,
        };
        match (a, b) {
            (ExprKind::Lit(x), ExprKind::Lit(y)) => x.bit_eq(y),
            (ExprKind::Ident(x), ExprKind::Ident(y)) => x == y,
            (
                ExprKind::Field { receiver: r1, name: n1, is_static: s1 },
                ExprKind::Field { receiver: r2, name: n2, is_static: s2 },
            ) => n1 == n2 && s1 == s2 && opt_eq(*r1, *r2),
            (ExprKind::Assign(l1, op1, r1), ExprKind::Assign(l2, op2, r2)) => {
                op1 == op2 && self.expr_eq(*l1, *l2) && self.expr_eq(*r1, *r2)
            }
            (ExprKind::Binary(l1, op1, r1), ExprKind::Binary(l2, op2, r2)) => {
                op1 == op2 && self.expr_eq(*l1, *l2) && self.expr_eq(*r1, *r2)
            }
            (ExprKind::Unary(op1, e1), ExprKind::Unary(op2, e2)) => {
                op1 == op2 && self.expr_eq(*e1, *e2)
            }
            (ExprKind::Paren(e1), ExprKind::Paren(e2)) => self.expr_eq(*e1, *e2),
            (ExprKind::Ternary(c1, t1, f1), ExprKind::Ternary(c2, t2, f2)) => {
                self.expr_eq(*c1, *c2) && self.expr_eq(*t1, *t2) && self.expr_eq(*f1, *f2)
            }
            (
                ExprKind::Call { receiver: r1, callee: c1, args: a1 },
                ExprKind::Call { receiver: r2, callee: c2, args: a2 },
            ) => c1 == c2 && opt_eq(*r1, *r2) && all_eq(a1, a2),
            (ExprKind::New { ty: t1, args: a1 }, ExprKind::New { ty: t2, args: a2 }) => {
                t1 == t2 && all_eq(a1, a2)
            }
            (ExprKind::Index(a1, i1), ExprKind::Index(a2, i2)) => {
                self.expr_eq(*a1, *a2) && self.expr_eq(*i1, *i2)
            }
            (ExprKind::Cast(t1, e1), ExprKind::Cast(t2, e2))
            | (ExprKind::InstanceOf(e1, t1), ExprKind::InstanceOf(e2, t2)) => {
                t1 == t2 && self.expr_eq(*e1, *e2)
            }
            // Erroneous expressions are never interchangeable.
            _ => false,
        }
    }

    /// Returns a structural hash of the expression, consistent with [`expr_eq`](Self::expr_eq).
    pub fn expr_hash(&self, id: ExprId) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash_expr_into(id, &mut hasher);
        hasher.finish()
    }

    fn hash_expr_into<H: Hasher>(&self, id: ExprId, state: &mut H) {
        let kind = &self.exprs[id].kind;
        std::mem::discriminant(kind).hash(state);
        match kind {
            ExprKind::Lit(lit) => lit.bit_hash(state),
            ExprKind::Ident(var) => var.hash(state),
            ExprKind::Field { name, is_static, .. } => {
                name.hash(state);
                is_static.hash(state);
            }
            ExprKind::Assign(_, op, _) => op.hash(state),
            ExprKind::Binary(_, op, _) => op.hash(state),
            ExprKind::Unary(op, _) => op.hash(state),
            ExprKind::Call { callee, args, .. } => {
                callee.hash(state);
                args.len().hash(state);
            }
            ExprKind::New { ty, args } => {
                ty.hash(state);
                args.len().hash(state);
            }
            ExprKind::Cast(ty, _) | ExprKind::InstanceOf(_, ty) => ty.hash(state),
            ExprKind::Paren(_) | ExprKind::Ternary(..) | ExprKind::Index(..) | ExprKind::Err => {}
        }
        if let ExprKind::Field { receiver, .. } | ExprKind::Call { receiver, .. } = kind {
            receiver.is_some().hash(state);
        }
        for child in kind.children() {
            self.hash_expr_into(child, state);
        }
    }
}
