//! Loop-invariant expression discovery.

use crate::{
    effect_propagation::Effects,
    effects::EffectSet,
    liveness::{LiveSet, LivenessInfo},
    writes::written_locals,
};
use kiln_ast::ast::{Body, ExprId, ExprKind, StmtId, StmtKind};
use kiln_data_structures::map::FxHashMap;

/// Structurally equal invariant expressions of one loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantCandidate {
    /// The first occurrence in program order.
    pub representative: ExprId,
    /// Every occurrence, including the representative, in program order.
    pub occurrences: Vec<ExprId>,
}

/// The invariant expressions of one loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopInvariants {
    pub loop_stmt: StmtId,
    pub candidates: Vec<InvariantCandidate>,
}

/// Finds expressions inside loops whose value does not change across iterations.
///
/// An expression is invariant in a loop if:
/// - it is not a literal, variable or parenthesized expression;
/// - it neither writes nor throws;
/// - every local it reads is live into the loop and not written by it;
/// - it reads heap state only if the loop writes none, which also covers array elements;
/// - it creates no object.
///
/// Only maximal invariant expressions are reported. Expressions of the loop's initializer and the
/// iterable of a for-each loop run once and are not considered.
pub struct InvariantFinder<'a> {
    body: &'a Body,
    effects: &'a Effects,
    liveness: &'a LivenessInfo,
}

impl<'a> InvariantFinder<'a> {
    pub fn new(body: &'a Body, effects: &'a Effects, liveness: &'a LivenessInfo) -> Self {
        Self { body, effects, liveness }
    }

    /// Returns the invariants of every loop of the body, nested loops included, in pre-order.
    #[instrument(name = "invariants", level = "debug", skip_all, fields(body = %body.name))]
    pub fn find(body: &Body, effects: &Effects, liveness: &LivenessInfo) -> Vec<LoopInvariants> {
        let finder = InvariantFinder::new(body, effects, liveness);
        let mut loops = Vec::new();
        for &stmt in &body.block {
            body.walk_stmts(stmt, &mut |s| {
                if body.stmt(s).kind.is_loop() {
                    loops.push(finder.loop_invariants(s));
                }
            });
        }
        loops
    }

    /// Returns the invariants of a single loop.
    pub fn loop_invariants(&self, loop_stmt: StmtId) -> LoopInvariants {
        let body = self.body;
        let mut scan = LoopScan {
            body,
            effects: self.effects,
            live: self.liveness.live_in(loop_stmt),
            writes: written_locals(body, loop_stmt),
            writes_global: self.effects.stmt(loop_stmt).contains(EffectSet::WRITE_GLOBAL),
            found: Vec::new(),
        };

        const NONE: &[ExprId] = &[];
        // Expressions evaluated on every iteration, in program order.
        let (head, stmt, tail) = match &body.stmt(loop_stmt).kind {
            StmtKind::While(cond, stmt) => (std::slice::from_ref(cond), Some(*stmt), NONE),
            StmtKind::DoWhile(stmt, cond) => (NONE, Some(*stmt), std::slice::from_ref(cond)),
            StmtKind::For { cond, update, body: stmt, .. } => {
                (cond.as_slice(), Some(*stmt), update.as_slice())
            }
            StmtKind::ForEach { body: stmt, .. } => (NONE, Some(*stmt), NONE),
            _ => (NONE, None, NONE),
        };
        for &e in head {
            scan.expr(e);
        }
        if let Some(stmt) = stmt {
            body.walk_stmts(stmt, &mut |s| {
                for e in body.stmt(s).kind.expr_children() {
                    scan.expr(e);
                }
            });
        }
        for &e in tail {
            scan.expr(e);
        }

        let candidates = dedup(body, scan.found);
        trace!(%loop_stmt, candidates = candidates.len());
        LoopInvariants { loop_stmt, candidates }
    }
}

struct LoopScan<'a> {
    body: &'a Body,
    effects: &'a Effects,
    live: &'a LiveSet,
    writes: LiveSet,
    writes_global: bool,
    found: Vec<ExprId>,
}

impl LoopScan<'_> {
    fn expr(&mut self, id: ExprId) {
        if self.is_invariant(id) {
            self.found.push(id);
            return;
        }
        let body = self.body;
        match body.expr(id).kind {
            ExprKind::Assign(lhs, _, rhs) => {
                self.place(lhs);
                self.expr(rhs);
            }
            ExprKind::Unary(op, operand) if op.has_side_effects() => self.place(operand),
            ref kind => {
                for child in kind.children() {
                    self.expr(child);
                }
            }
        }
    }

    /// Visits the operands of an assignment target.
    fn place(&mut self, id: ExprId) {
        match self.body.expr(id).kind {
            ExprKind::Paren(inner) => self.place(inner),
            ExprKind::Field { receiver, .. } => {
                if let Some(receiver) = receiver {
                    self.expr(receiver);
                }
            }
            ExprKind::Index(array, index) => {
                self.expr(array);
                self.expr(index);
            }
            _ => {}
        }
    }

    fn is_invariant(&self, id: ExprId) -> bool {
        if matches!(
            self.body.expr(id).kind,
            ExprKind::Lit(_) | ExprKind::Ident(_) | ExprKind::Paren(_) | ExprKind::Err
        ) {
            return false;
        }
        let effects = self.effects.expr(id);
        if effects.intersects(EffectSet::WRITE_LOCAL | EffectSet::WRITE_GLOBAL | EffectSet::EXCEPTION)
            || (self.writes_global && effects.contains(EffectSet::READ_GLOBAL))
        {
            return false;
        }
        let mut stable = true;
        self.body.walk_exprs(id, &mut |e| match self.body.expr(e).kind {
            ExprKind::Ident(var) => {
                stable &= self.live.contains(var) && !self.writes.contains(var);
            }
            ExprKind::New { .. } | ExprKind::Err => stable = false,
            _ => {}
        });
        stable
    }
}

/// Groups structurally equal expressions, keeping program order.
fn dedup(body: &Body, found: Vec<ExprId>) -> Vec<InvariantCandidate> {
    let mut candidates: Vec<InvariantCandidate> = Vec::new();
    let mut buckets: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
    for id in found {
        let bucket = buckets.entry(body.expr_hash(id)).or_default();
        let existing =
            bucket.iter().copied().find(|&i| body.expr_eq(candidates[i].representative, id));
        match existing {
            Some(i) => candidates[i].occurrences.push(id),
            None => {
                bucket.push(candidates.len());
                candidates.push(InvariantCandidate { representative: id, occurrences: vec![id] });
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{effects::SignatureTable, liveness::Liveness};
    use kiln_ast::{BodyBuilder, ast::*};

    fn find(body: &Body, callees: &SignatureTable) -> Vec<LoopInvariants> {
        let effects = Effects::compute(body, callees);
        let liveness = Liveness::compute(body);
        InvariantFinder::find(body, &effects, &liveness)
    }

    #[test]
    fn dedups_structurally_equal() {
        // while (a < n) { d = b + c; f = b + c; g = a * b; a++; }
        let mut b = BodyBuilder::new("f");
        let [a, n, bb, c, d, f, g] =
            ["a", "n", "b", "c", "d", "f", "g"].map(|name| b.param(name, TypeName::INT));
        let (ra, rn) = (b.ident(a), b.ident(n));
        let cond = b.binary(ra, BinOpKind::Lt, rn);
        let mut sums = Vec::new();
        let stmt = b.block(|b| {
            for target in [d, f] {
                let (t, rb, rc) = (b.ident(target), b.ident(bb), b.ident(c));
                let sum = b.binary(rb, BinOpKind::Add, rc);
                sums.push(sum);
                let e = b.assign(t, sum);
                b.expr_stmt(e);
            }
            let (t, ra, rb) = (b.ident(g), b.ident(a), b.ident(bb));
            let prod = b.binary(ra, BinOpKind::Mul, rb);
            let e = b.assign(t, prod);
            b.expr_stmt(e);
            let t = b.ident(a);
            let inc = b.unary(UnOpKind::PostInc, t);
            b.expr_stmt(inc);
        });
        let loop_ = b.while_stmt(cond, stmt);
        let body = b.finish();

        let loops = find(&body, &SignatureTable::new());
        assert_eq!(
            loops,
            [LoopInvariants {
                loop_stmt: loop_,
                candidates: vec![InvariantCandidate {
                    representative: sums[0],
                    occurrences: sums.clone()
                }],
            }]
        );
    }

    #[test]
    fn global_reads_need_a_loop_without_global_writes() {
        // for (int i = 0; i < n; i++) { s += o.len * 2; a[i] = arr[k]; }
        let build = |store: bool| {
            let mut b = BodyBuilder::new("f");
            let n = b.param("n", TypeName::INT);
            let s = b.param("s", TypeName::INT);
            let o = b.param("o", TypeName::class("O"));
            let arr = b.param("arr", TypeName::INT.array_of());
            let k = b.param("k", TypeName::INT);
            let i = b.local("i", TypeName::INT);
            let init = b.stmts(|b| {
                let zero = b.int(0);
                b.decl(i, Some(zero));
            });
            let (ri, rn) = (b.ident(i), b.ident(n));
            let cond = b.binary(ri, BinOpKind::Lt, rn);
            let ri = b.ident(i);
            let update = b.unary(UnOpKind::PostInc, ri);
            let mut found = Vec::new();
            let stmt = b.block(|b| {
                let (t, recv) = (b.ident(s), b.ident(o));
                let len = b.field(Some(recv), "len");
                let two = b.int(2);
                let prod = b.binary(len, BinOpKind::Mul, two);
                found.push(prod);
                let e = b.assign_op(t, BinOpKind::Add, prod);
                b.expr_stmt(e);
                if store {
                    let (ra, ri) = (b.ident(arr), b.ident(i));
                    let elem = b.index(ra, ri);
                    let (rarr, rk) = (b.ident(arr), b.ident(k));
                    let read = b.index(rarr, rk);
                    let e = b.assign(elem, read);
                    b.expr_stmt(e);
                } else {
                    let (t, rarr, rk) = (b.ident(s), b.ident(arr), b.ident(k));
                    let read = b.index(rarr, rk);
                    found.push(read);
                    let e = b.assign(t, read);
                    b.expr_stmt(e);
                }
            });
            b.for_stmt(init, Some(cond), vec![update], stmt);
            (b.finish(), found)
        };

        let (body, found) = build(false);
        let loops = find(&body, &SignatureTable::new());
        let reps: Vec<_> = loops[0].candidates.iter().map(|c| c.representative).collect();
        assert_eq!(reps, found);

        let (body, _) = build(true);
        let loops = find(&body, &SignatureTable::new());
        assert!(loops[0].candidates.is_empty());
    }

    #[test]
    fn iterator_calls_may_write_globals() {
        // for (String e : list) { s = o.len * 2; }
        let mut b = BodyBuilder::new("f");
        let list = b.param("list", TypeName::class("List"));
        let o = b.param("o", TypeName::class("O"));
        let s = b.param("s", TypeName::INT);
        let e = b.local("e", TypeName::string());
        let mut prod = None;
        let stmt = b.block(|b| {
            let (t, recv, two) = (b.ident(s), b.ident(o), b.int(2));
            let len = b.field(Some(recv), "len");
            let p = b.binary(len, BinOpKind::Mul, two);
            prod = Some(p);
            let a = b.assign(t, p);
            b.expr_stmt(a);
        });
        let rl = b.ident(list);
        b.for_each(e, rl, stmt);
        let body = b.finish();

        let loops = find(&body, &SignatureTable::new());
        assert!(loops[0].candidates.is_empty());

        let pure_iteration = SignatureTable::from_iter([
            (Callee::new("List", "iterator", 0), EffectSet::READ_GLOBAL),
            (Callee::new("Iterator", "hasNext", 0), EffectSet::READ_GLOBAL),
            (Callee::new("Iterator", "next", 0), EffectSet::READ_GLOBAL),
        ]);
        let loops = find(&body, &pure_iteration);
        let reps: Vec<_> = loops[0].candidates.iter().map(|c| c.representative).collect();
        assert_eq!(reps, [prod.unwrap()]);
    }

    #[test]
    fn nested_loops_and_calls() {
        // while (p) { while (q) { x = Math.max(m, 1); y = h(m); q = x > y; } }
        let mut b = BodyBuilder::new("f");
        let [p, q] = ["p", "q"].map(|name| b.param(name, TypeName::BOOLEAN));
        let [m, x, y] = ["m", "x", "y"].map(|name| b.param(name, TypeName::INT));
        let max = Callee::new("Math", "max", 2);
        let mut call = None;
        let inner_body = b.block(|b| {
            let (t, rm, one) = (b.ident(x), b.ident(m), b.int(1));
            let c = b.call(None, max.clone(), vec![rm, one]);
            call = Some(c);
            let e = b.assign(t, c);
            b.expr_stmt(e);
            let (t, rm) = (b.ident(y), b.ident(m));
            let c = b.call(None, Callee::new("T", "h", 1), vec![rm]);
            let e = b.assign(t, c);
            b.expr_stmt(e);
            let (t, rx, ry) = (b.ident(q), b.ident(x), b.ident(y));
            let cmp = b.binary(rx, BinOpKind::Gt, ry);
            let e = b.assign(t, cmp);
            b.expr_stmt(e);
        });
        let mut inner = None;
        let outer_body = b.block(|b| {
            let rq = b.ident(q);
            inner = Some(b.while_stmt(rq, inner_body));
        });
        let rp = b.ident(p);
        let outer = b.while_stmt(rp, outer_body);
        let body = b.finish();

        let table: SignatureTable = [(max, EffectSet::NONE)].into_iter().collect();
        let loops = find(&body, &table);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].loop_stmt, outer);
        assert_eq!(loops[1].loop_stmt, inner.unwrap());
        for l in &loops {
            let reps: Vec<_> = l.candidates.iter().map(|c| c.representative).collect();
            assert_eq!(reps, [call.unwrap()]);
        }
    }
}
