//! Tree-level constant folding.

use crate::{
    effect_propagation::Effects,
    effects::CalleeEffects,
    eval::ConstantEvaluator,
    value::Value,
};
use kiln_ast::ast::{Body, ExprId, ExprKind, LitKind, NodeId, StmtId};
use kiln_data_structures::map::FxHashMap;
use kiln_interface::{Result, diagnostics::DiagCtxt};

/// Statistics of [`ConstantFolder::fold_to_fixpoint`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FoldStats {
    /// The number of folding rounds that ran, including the final one that changed nothing.
    pub iterations: usize,
    /// The total number of replaced expressions.
    pub rewrites: usize,
    /// Whether the last round made no change.
    pub reached_fixpoint: bool,
}

/// Rewrites expressions with a known value into literals.
///
/// Only expressions without side effects other than reading locals are replaced, and assignment
/// targets are left alone. Besides folding, a round unwraps parenthesized literals and replaces
/// conditional expressions whose condition is a literal with the selected arm.
pub struct ConstantFolder<'a> {
    dcx: &'a DiagCtxt,
    callees: &'a dyn CalleeEffects,
}

enum Rewrite {
    Lit(LitKind),
    Child(ExprId),
}

impl<'a> ConstantFolder<'a> {
    pub fn new(dcx: &'a DiagCtxt, callees: &'a dyn CalleeEffects) -> Self {
        Self { dcx, callees }
    }

    /// Runs one folding round. Returns `true` if the body changed.
    pub fn fold_body(&self, body: &mut Body) -> Result<bool> {
        self.round(body).map(|n| n > 0)
    }

    /// Folds until a round makes no change or `max_iterations` rounds ran.
    #[instrument(name = "fold", level = "debug", skip_all, fields(body = %body.name))]
    pub fn fold_to_fixpoint(&self, body: &mut Body, max_iterations: usize) -> Result<FoldStats> {
        let mut stats = FoldStats::default();
        while stats.iterations < max_iterations {
            stats.iterations += 1;
            let rewrites = self.round(body)?;
            trace!(iteration = stats.iterations, rewrites);
            if rewrites == 0 {
                stats.reached_fixpoint = true;
                break;
            }
            stats.rewrites += rewrites;
        }
        if !stats.reached_fixpoint {
            debug!(max_iterations, "folding did not reach a fixed point");
        }
        Ok(stats)
    }

    fn round(&self, body: &mut Body) -> Result<usize> {
        let effects = Effects::compute(body, self.callees);
        let values = {
            let mut evaluator = ConstantEvaluator::new(body, self.dcx);
            evaluator.record_values();
            evaluator.eval_block(&body.block)?;
            evaluator.take_values()
        };

        let mut collector =
            RewriteCollector { body, effects: &effects, values: &values, rewrites: Vec::new() };
        for &stmt in &body.block {
            body.walk_stmts(stmt, &mut |s| collector.stmt(s));
        }
        let rewrites = collector.rewrites;

        let n = rewrites.len();
        for (parent, old, rewrite) in rewrites {
            let new = match rewrite {
                Rewrite::Lit(lit) => {
                    let span = body.expr(old).span;
                    body.alloc_expr(span, ExprKind::Lit(lit))
                }
                Rewrite::Child(child) => child,
            };
            let replaced = body.replace_expr_in(parent, old, new);
            debug_assert!(replaced, "{old} is not a child of {parent}");
        }
        Ok(n)
    }
}

struct RewriteCollector<'a> {
    body: &'a Body,
    effects: &'a Effects,
    values: &'a FxHashMap<ExprId, Value>,
    rewrites: Vec<(NodeId, ExprId, Rewrite)>,
}

impl RewriteCollector<'_> {
    fn stmt(&mut self, id: StmtId) {
        for expr in self.body.stmt(id).kind.expr_children() {
            self.expr(id.into(), expr);
        }
    }

    fn expr(&mut self, parent: NodeId, id: ExprId) {
        if let Some(rewrite) = self.rewrite(id) {
            self.rewrites.push((parent, id, rewrite));
            return;
        }
        match self.body.expr(id).kind {
            ExprKind::Assign(lhs, _, rhs) => {
                self.place(id, lhs);
                self.expr(id.into(), rhs);
            }
            ExprKind::Unary(op, operand) if op.has_side_effects() => self.place(id, operand),
            ref kind => {
                for child in kind.children() {
                    self.expr(id.into(), child);
                }
            }
        }
    }

    /// Visits the operands of an assignment target, but not the target itself.
    fn place(&mut self, parent: ExprId, id: ExprId) {
        match self.body.expr(id).kind {
            ExprKind::Paren(inner) => self.place(id, inner),
            ExprKind::Field { receiver: Some(receiver), .. } => self.expr(id.into(), receiver),
            ExprKind::Index(array, index) => {
                self.expr(id.into(), array);
                self.expr(id.into(), index);
            }
            ExprKind::Field { receiver: None, .. } | ExprKind::Ident(_) => {}
            _ => self.expr(parent.into(), id),
        }
    }

    fn rewrite(&self, id: ExprId) -> Option<Rewrite> {
        let kind = &self.body.expr(id).kind;
        if kind.is_lit() {
            return None;
        }
        if self.effects.expr(id).is_pure()
            && let Some(lit) = self.values.get(&id).and_then(Value::to_lit)
        {
            return Some(Rewrite::Lit(lit));
        }
        match *kind {
            ExprKind::Paren(inner) if self.body.expr(inner).kind.is_lit() => {
                Some(Rewrite::Child(inner))
            }
            ExprKind::Ternary(cond, then, els) => match self.body.expr(cond).kind {
                // The selected arm must have the type of the whole expression.
                ExprKind::Lit(LitKind::Bool(b)) => {
                    let arm = if b { then } else { els };
                    let ty = self.body.static_ty(id);
                    (ty.is_some() && self.body.static_ty(arm) == ty).then_some(Rewrite::Child(arm))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::NoSignatures;
    use kiln_ast::{BodyBuilder, ast::*, pretty::body_to_string};

    fn fold(body: &mut Body) -> FoldStats {
        let dcx = DiagCtxt::with_silent_emitter();
        let stats = ConstantFolder::new(&dcx, &NoSignatures).fold_to_fixpoint(body, 16).unwrap();
        assert!(dcx.has_errors().is_ok());
        assert!(body.check_single_parent().is_ok());
        stats
    }

    #[test]
    fn folds_and_propagates() {
        // int x = (1 + 2) * 3; int y = x - 1; return y > 5 ? y : x;
        let mut b = BodyBuilder::new("f");
        let x = b.local("x", TypeName::INT);
        let y = b.local("y", TypeName::INT);
        let (one, two) = (b.int(1), b.int(2));
        let sum = b.binary(one, BinOpKind::Add, two);
        let paren = b.paren(sum);
        let three = b.int(3);
        let prod = b.binary(paren, BinOpKind::Mul, three);
        b.decl(x, Some(prod));
        let (rx, one) = (b.ident(x), b.int(1));
        let diff = b.binary(rx, BinOpKind::Sub, one);
        b.decl(y, Some(diff));
        let (ry, five) = (b.ident(y), b.int(5));
        let cond = b.binary(ry, BinOpKind::Gt, five);
        let (ry, rx) = (b.ident(y), b.ident(x));
        let ternary = b.ternary(cond, ry, rx);
        b.return_stmt(Some(ternary));
        let mut body = b.finish();

        let stats = fold(&mut body);
        assert!(stats.reached_fixpoint && stats.rewrites > 0);
        assert_eq!(body_to_string(&body), "{\n    int x = 9;\n    int y = 8;\n    return 8;\n}");
    }

    #[test]
    fn keeps_effects_and_targets() {
        // int i = 0; i = i + 1; o.f = i * 2; g(i); while (c) { i++; }
        let mut b = BodyBuilder::new("f");
        let c = b.param("c", TypeName::BOOLEAN);
        let o = b.param("o", TypeName::class("O"));
        let i = b.local("i", TypeName::INT);
        let zero = b.int(0);
        b.decl(i, Some(zero));
        let (t, ri, one) = (b.ident(i), b.ident(i), b.int(1));
        let sum = b.binary(ri, BinOpKind::Add, one);
        let assign = b.assign(t, sum);
        b.expr_stmt(assign);
        let recv = b.ident(o);
        let field = b.field(Some(recv), "f");
        let (ri, two) = (b.ident(i), b.int(2));
        let prod = b.binary(ri, BinOpKind::Mul, two);
        let assign = b.assign(field, prod);
        b.expr_stmt(assign);
        let ri = b.ident(i);
        let call = b.call(None, Callee::new("T", "g", 1), vec![ri]);
        b.expr_stmt(call);
        let rc = b.ident(c);
        let stmt = b.block(|b| {
            let t = b.ident(i);
            let inc = b.unary(UnOpKind::PostInc, t);
            b.expr_stmt(inc);
        });
        b.while_stmt(rc, stmt);
        let mut body = b.finish();

        fold(&mut body);
        assert_eq!(
            body_to_string(&body),
            "{\n    int i = 0;\n    i = 1;\n    o.f = 2;\n    g(1);\n    while (c) {\n        i++;\n    }\n}"
        );
    }

    #[test]
    fn folding_is_idempotent() {
        let mut b = BodyBuilder::new("f");
        let x = b.local("x", TypeName::LONG);
        let (one, two) = (b.int(1), b.long(2));
        let sum = b.binary(one, BinOpKind::Add, two);
        b.decl(x, Some(sum));
        let mut body = b.finish();

        let dcx = DiagCtxt::with_silent_emitter();
        let folder = ConstantFolder::new(&dcx, &NoSignatures);
        assert!(folder.fold_body(&mut body).unwrap());
        let folded = body_to_string(&body);
        assert!(!folder.fold_body(&mut body).unwrap());
        assert!(!folder.fold_body(&mut body).unwrap());
        assert_eq!(body_to_string(&body), folded);
        assert_eq!(folded, "{\n    long x = 3L;\n}");
    }

    #[test]
    fn literal_conditions_select_arms() {
        // return c ? (1) : 2; return true ? a : (k = 3); return true ? a : h(c);
        let mut b = BodyBuilder::new("f");
        let c = b.param("c", TypeName::BOOLEAN);
        let a = b.param("a", TypeName::INT);
        let k = b.local("k", TypeName::INT);
        let rc = b.ident(c);
        let one = b.int(1);
        let paren = b.paren(one);
        let two = b.int(2);
        let t1 = b.ternary(rc, paren, two);
        b.return_stmt(Some(t1));
        let cond = b.bool(true);
        let (ra, rk, three) = (b.ident(a), b.ident(k), b.int(3));
        let assign = b.assign(rk, three);
        let paren = b.paren(assign);
        let t2 = b.ternary(cond, ra, paren);
        b.return_stmt(Some(t2));
        // The type of a call is not known, so neither is the type of the conditional.
        let cond = b.bool(true);
        let (ra, rc) = (b.ident(a), b.ident(c));
        let call = b.call(None, Callee::new("T", "h", 1), vec![rc]);
        let t3 = b.ternary(cond, ra, call);
        b.return_stmt(Some(t3));
        let mut body = b.finish();

        fold(&mut body);
        assert_eq!(
            body_to_string(&body),
            "{\n    return c ? 1 : 2;\n    return a;\n    return true ? a : h(c);\n}"
        );
    }

    #[test]
    fn conditional_arms_are_promoted() {
        // double r = (true ? 1 : 2.0) / 2; return true ? a : 2.0;
        let mut b = BodyBuilder::new("f");
        let a = b.param("a", TypeName::INT);
        let r = b.local("r", TypeName::DOUBLE);
        let (cond, one, two) = (b.bool(true), b.int(1), b.double(2.0));
        let ternary = b.ternary(cond, one, two);
        let paren = b.paren(ternary);
        let two = b.int(2);
        let div = b.binary(paren, BinOpKind::Div, two);
        b.decl(r, Some(div));
        let (cond, ra, two) = (b.bool(true), b.ident(a), b.double(2.0));
        let ternary = b.ternary(cond, ra, two);
        b.return_stmt(Some(ternary));
        let mut body = b.finish();

        fold(&mut body);
        assert_eq!(
            body_to_string(&body),
            "{\n    double r = 0.5;\n    return true ? a : 2.0;\n}"
        );
    }

    #[test]
    fn values_skipped_by_continue_are_kept() {
        // int k = 0; for (int i = 0; i < 10; i = k) { if (c) continue; k = 5; }
        let mut b = BodyBuilder::new("f");
        let c = b.param("c", TypeName::BOOLEAN);
        let k = b.local("k", TypeName::INT);
        let i = b.local("i", TypeName::INT);
        let zero = b.int(0);
        b.decl(k, Some(zero));
        let init = b.stmts(|b| {
            let zero = b.int(0);
            b.decl(i, Some(zero));
        });
        let (ri, ten) = (b.ident(i), b.int(10));
        let cond = b.binary(ri, BinOpKind::Lt, ten);
        let (t, rk) = (b.ident(i), b.ident(k));
        let update = b.assign(t, rk);
        let stmt = b.block(|b| {
            let rc = b.ident(c);
            let cont = b.detached(StmtKind::Continue);
            b.if_stmt(rc, cont, None);
            let (t, five) = (b.ident(k), b.int(5));
            let a = b.assign(t, five);
            b.expr_stmt(a);
        });
        b.for_stmt(init, Some(cond), vec![update], stmt);
        let mut body = b.finish();

        let stats = fold(&mut body);
        assert_eq!(stats.rewrites, 0);
        assert!(body_to_string(&body).contains("for (int i = 0; i < 10; i = k)"));
    }

    #[test]
    fn bounded_rounds() {
        let mut b = BodyBuilder::new("f");
        let (one, two) = (b.int(1), b.int(2));
        let sum = b.binary(one, BinOpKind::Add, two);
        let paren = b.paren(sum);
        b.return_stmt(Some(paren));
        let mut body = b.finish();

        let dcx = DiagCtxt::with_silent_emitter();
        let stats = ConstantFolder::new(&dcx, &NoSignatures).fold_to_fixpoint(&mut body, 1).unwrap();
        assert_eq!(stats, FoldStats { iterations: 1, rewrites: 1, reached_fixpoint: false });
    }

    #[test]
    fn errors_abort_the_round() {
        // int x = 1 / 0;
        let mut b = BodyBuilder::new("f");
        let x = b.local("x", TypeName::INT);
        let (one, zero) = (b.int(1), b.int(0));
        let div = b.binary(one, BinOpKind::Div, zero);
        b.decl(x, Some(div));
        let mut body = b.finish();

        let dcx = DiagCtxt::with_silent_emitter();
        assert!(ConstantFolder::new(&dcx, &NoSignatures).fold_body(&mut body).is_err());
        assert_eq!(dcx.err_count(), 1);
    }
}
