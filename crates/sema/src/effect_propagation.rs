//! Computes the effect set of every node of a body.

use crate::effects::{CalleeEffects, EffectSet};
use kiln_ast::ast::{
    BinOpKind, Body, Callee, ExprId, ExprKind, LitKind, StmtId, StmtKind, TypeName,
};
use kiln_data_structures::index::IndexVec;

/// The effect sets of a body's nodes.
///
/// Computed from scratch by [`Effects::compute`]; recompute after rewriting the body. Nodes that
/// are not reachable from the body's block have no effects.
#[derive(Clone, Debug)]
pub struct Effects {
    exprs: IndexVec<ExprId, EffectSet>,
    stmts: IndexVec<StmtId, EffectSet>,
    body: EffectSet,
}

impl Effects {
    /// Computes the effects of every node of `body`, looking up called methods in `callees`.
    #[instrument(name = "effects", level = "debug", skip_all, fields(body = %body.name))]
    pub fn compute(body: &Body, callees: &dyn CalleeEffects) -> Self {
        let mut p = EffectPropagator {
            body,
            callees,
            effects: Self {
                exprs: IndexVec::from_vec(vec![EffectSet::NONE; body.exprs.len()]),
                stmts: IndexVec::from_vec(vec![EffectSet::NONE; body.stmts.len()]),
                body: EffectSet::NONE,
            },
        };
        p.effects.body = p.block(&body.block);
        debug!(effects = %p.effects.body, "computed effects");
        p.effects
    }

    /// Returns the effects of an expression, including its operands.
    #[inline]
    pub fn expr(&self, id: ExprId) -> EffectSet {
        self.exprs[id]
    }

    /// Returns the effects of a statement, including nested nodes.
    #[inline]
    pub fn stmt(&self, id: StmtId) -> EffectSet {
        self.stmts[id]
    }

    /// Returns the effects of the whole body.
    #[inline]
    pub fn body(&self) -> EffectSet {
        self.body
    }

    /// Returns the effects of calling the analyzed method, for use as its signature.
    #[inline]
    pub fn summary(&self) -> EffectSet {
        self.body.callee_visible()
    }
}

struct EffectPropagator<'a> {
    body: &'a Body,
    callees: &'a dyn CalleeEffects,
    effects: Effects,
}

impl EffectPropagator<'_> {
    fn callee(&self, callee: &Callee) -> EffectSet {
        match self.callees.effects_of(callee) {
            Some(effects) => effects.callee_visible(),
            None => {
                trace!(%callee, "unknown callee");
                EffectSet::ALL
            }
        }
    }

    /// Returns the effects of stepping through `iterable` in a for-each loop.
    ///
    /// Arrays are read element by element. Anything else is iterated by calling `iterator()` on it
    /// and `hasNext()` and `next()` on the returned `Iterator`.
    fn iteration(&self, iterable: ExprId) -> EffectSet {
        match self.body.static_ty(iterable) {
            Some(TypeName::Array(_)) => EffectSet::READ_GLOBAL,
            Some(ty) => {
                self.callee(&Callee::new(ty.owner_name(), "iterator", 0))
                    | self.callee(&Callee::new("Iterator", "hasNext", 0))
                    | self.callee(&Callee::new("Iterator", "next", 0))
            }
            None => {
                trace!("iterable of unknown type");
                EffectSet::ALL
            }
        }
    }

    fn block(&mut self, stmts: &[StmtId]) -> EffectSet {
        stmts.iter().fold(EffectSet::NONE, |acc, &s| acc | self.stmt(s))
    }

    fn stmt(&mut self, id: StmtId) -> EffectSet {
        let body = self.body;
        let kind = &body.stmt(id).kind;
        let intrinsic = match kind {
            StmtKind::Decl(_, Some(_)) => EffectSet::WRITE_LOCAL,
            StmtKind::ForEach { iterable, .. } => {
                EffectSet::WRITE_LOCAL | self.iteration(*iterable)
            }
            StmtKind::Throw(_) | StmtKind::Assert(..) => EffectSet::EXCEPTION,
            StmtKind::Err => EffectSet::ALL,
            StmtKind::Try(try_) => {
                let mut effects = EffectSet::NONE;
                if !try_.catches.is_empty() {
                    effects |= EffectSet::WRITE_LOCAL;
                }
                // Resources are closed on exit.
                for &res in &try_.resources {
                    if let StmtKind::Decl(var, _) = body.stmt(res).kind {
                        let owner = body.var(var).ty.owner_name();
                        effects |= self.callee(&Callee::new(owner, "close", 0));
                    }
                }
                effects
            }
            _ => EffectSet::NONE,
        };
        let mut effects = intrinsic;
        for e in kind.expr_children() {
            effects |= self.expr(e);
        }
        for s in kind.stmt_children() {
            effects |= self.stmt(s);
        }
        self.effects.stmts[id] = effects;
        effects
    }

    fn expr(&mut self, id: ExprId) -> EffectSet {
        let body = self.body;
        let effects = match body.expr(id).kind {
            ExprKind::Lit(_) => EffectSet::NONE,
            ExprKind::Ident(_) => EffectSet::READ_LOCAL,
            ExprKind::Field { receiver, .. } => {
                EffectSet::READ_GLOBAL | receiver.map_or(EffectSet::NONE, |r| self.expr(r))
            }
            ExprKind::Assign(lhs, op, rhs) => {
                let mut effects = self.target(lhs, op.is_some()) | self.expr(rhs);
                if op.is_some_and(|op| matches!(op, BinOpKind::Div | BinOpKind::Rem))
                    && self.may_be_zero(rhs)
                {
                    effects |= EffectSet::EXCEPTION;
                }
                effects
            }
            ExprKind::Unary(op, operand) if op.has_side_effects() => self.target(operand, true),
            ExprKind::Binary(lhs, op, rhs) => {
                let mut effects = self.expr(lhs) | self.expr(rhs);
                if matches!(op, BinOpKind::Div | BinOpKind::Rem) && self.may_be_zero(rhs) {
                    effects |= EffectSet::EXCEPTION;
                }
                effects
            }
            ExprKind::Call { ref callee, .. } => self.children(id) | self.callee(callee),
            ExprKind::New { ref ty, ref args } => {
                let ctor = Callee::constructor(ty.owner_name(), args.len() as u32);
                self.children(id) | self.callee(&ctor)
            }
            ExprKind::Index(..) => EffectSet::READ_GLOBAL | self.children(id),
            ExprKind::Cast(ref ty, operand) => {
                let effects = self.expr(operand);
                if ty.is_reference() { effects | EffectSet::EXCEPTION } else { effects }
            }
            ExprKind::Unary(..)
            | ExprKind::Paren(_)
            | ExprKind::Ternary(..)
            | ExprKind::InstanceOf(..) => self.children(id),
            ExprKind::Err => {
                // Visit the children anyway so that every node gets a set.
                self.children(id);
                EffectSet::ALL
            }
        };
        self.effects.exprs[id] = effects;
        effects
    }

    fn children(&mut self, id: ExprId) -> EffectSet {
        let body = self.body;
        body.expr(id).kind.children().into_iter().fold(EffectSet::NONE, |acc, c| acc | self.expr(c))
    }

    /// Returns the effects of writing to `target`, which is also read if `read` is set.
    fn target(&mut self, target: ExprId, read: bool) -> EffectSet {
        let body = self.body;
        let effects = match body.expr(target).kind {
            ExprKind::Ident(_) => {
                if read {
                    EffectSet::READ_LOCAL | EffectSet::WRITE_LOCAL
                } else {
                    EffectSet::WRITE_LOCAL
                }
            }
            ExprKind::Paren(inner) => self.target(inner, read),
            ExprKind::Field { receiver, .. } => {
                let operand = receiver.map_or(EffectSet::NONE, |r| self.expr(r));
                operand | global_access(read)
            }
            ExprKind::Index(array, index) => {
                self.expr(array) | self.expr(index) | global_access(read)
            }
            // Not an lvalue.
            _ => EffectSet::ALL | self.children(target),
        };
        self.effects.exprs[target] = effects;
        effects
    }

    /// Returns `false` only for a nonzero numeric literal divisor.
    fn may_be_zero(&self, divisor: ExprId) -> bool {
        let divisor = self.body.peel_parens(divisor);
        match self.body.expr(divisor).kind {
            ExprKind::Lit(LitKind::Int(i)) => i == 0,
            ExprKind::Lit(LitKind::Long(l)) => l == 0,
            ExprKind::Lit(LitKind::Float(_) | LitKind::Double(_)) => false,
            _ => true,
        }
    }
}

fn global_access(read: bool) -> EffectSet {
    if read { EffectSet::READ_GLOBAL | EffectSet::WRITE_GLOBAL } else { EffectSet::WRITE_GLOBAL }
}
