//! Live-variable analysis over method bodies.
//!
//! A variable is live at a point if its current value may be read later without an intervening
//! overwrite. The analysis walks the tree backward once; loop bodies are walked twice, seeding the
//! second walk with the loop head computed by the first. Every transfer function has the gen/kill
//! form `gen ∪ (out - kill)`, so the second walk already reaches the fixed point.
//!
//! Besides per-node live sets the analysis computes, for each statement, the variables it
//! definitely overwrites on every path that completes it normally (its "kills"). Kills of
//! branches are merged by intersection; a switch only contributes kills when it has a `default`
//! case.
//!
//! The sets use dense bitsets indexed by [`VarId`].

use kiln_ast::ast::{Body, ExprId, ExprKind, StmtId, StmtKind, StmtTry, SwitchCase, VarId};
use kiln_data_structures::index::IndexVec;
use std::fmt;

/// A dense bitset of variables.
#[derive(Clone, Default)]
pub struct LiveSet {
    /// Bit vector where bit i indicates whether variable i is in the set.
    bits: Vec<u64>,
}

impl PartialEq for LiveSet {
    fn eq(&self, other: &Self) -> bool {
        let (short, long) = if self.bits.len() <= other.bits.len() {
            (&self.bits, &other.bits)
        } else {
            (&other.bits, &self.bits)
        };
        long[..short.len()] == short[..] && long[short.len()..].iter().all(|&w| w == 0)
    }
}

impl Eq for LiveSet {}

impl fmt::Debug for LiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<VarId> for LiveSet {
    fn from_iter<I: IntoIterator<Item = VarId>>(iter: I) -> Self {
        let mut set = Self::new();
        for var in iter {
            set.insert(var);
        }
        set
    }
}

impl LiveSet {
    /// Creates a new empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Creates a new empty set with capacity for `n` variables.
    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self { bits: vec![0; n.div_ceil(64)] }
    }

    /// Returns true if the variable is in the set.
    #[must_use]
    pub fn contains(&self, var: VarId) -> bool {
        let (word, mask) = Self::locate(var);
        self.bits.get(word).is_some_and(|&w| w & mask != 0)
    }

    /// Adds a variable to the set. Returns true if the variable was not already present.
    pub fn insert(&mut self, var: VarId) -> bool {
        let (word, mask) = Self::locate(var);
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        let was_absent = self.bits[word] & mask == 0;
        self.bits[word] |= mask;
        was_absent
    }

    /// Removes a variable from the set. Returns true if the variable was present.
    pub fn remove(&mut self, var: VarId) -> bool {
        let (word, mask) = Self::locate(var);
        match self.bits.get_mut(word) {
            Some(w) => {
                let was_present = *w & mask != 0;
                *w &= !mask;
                was_present
            }
            None => false,
        }
    }

    /// Unions this set with another, returning true if this set changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        if self.bits.len() < other.bits.len() {
            self.bits.resize(other.bits.len(), 0);
        }
        let mut changed = false;
        for (a, &b) in self.bits.iter_mut().zip(&other.bits) {
            let old = *a;
            *a |= b;
            changed |= *a != old;
        }
        changed
    }

    /// Intersects this set with another.
    pub fn intersect_with(&mut self, other: &Self) {
        for (i, a) in self.bits.iter_mut().enumerate() {
            *a &= other.bits.get(i).copied().unwrap_or(0);
        }
    }

    /// Removes every variable of `other` from this set.
    pub fn subtract(&mut self, other: &Self) {
        for (a, &b) in self.bits.iter_mut().zip(&other.bits) {
            *a &= !b;
        }
    }

    /// Returns true if every variable of this set is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.bits
            .iter()
            .enumerate()
            .all(|(i, &a)| a & !other.bits.get(i).copied().unwrap_or(0) == 0)
    }

    /// Returns true if the two sets have no variable in common.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.bits.iter().zip(&other.bits).all(|(&a, &b)| a & b == 0)
    }

    /// Returns an iterator over all variables in the set, in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = VarId> + '_ {
        self.bits.iter().enumerate().flat_map(|(word_idx, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| VarId::from_usize(word_idx * 64 + bit))
        })
    }

    /// Returns the number of variables in the set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Clears the set.
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    fn locate(var: VarId) -> (usize, u64) {
        let idx = var.index();
        (idx / 64, 1u64 << (idx % 64))
    }
}

/// Liveness analysis results for a body.
///
/// Nodes that are not reachable from the body's block have empty sets.
#[derive(Clone, Debug)]
pub struct LivenessInfo {
    stmt_in: IndexVec<StmtId, LiveSet>,
    stmt_out: IndexVec<StmtId, LiveSet>,
    expr_in: IndexVec<ExprId, LiveSet>,
    kills: IndexVec<StmtId, LiveSet>,
    ever_live: LiveSet,
    entry: LiveSet,
}

impl LivenessInfo {
    /// Returns the variables live before the statement.
    #[must_use]
    pub fn live_in(&self, stmt: StmtId) -> &LiveSet {
        &self.stmt_in[stmt]
    }

    /// Returns the variables live after the statement completes normally.
    #[must_use]
    pub fn live_out(&self, stmt: StmtId) -> &LiveSet {
        &self.stmt_out[stmt]
    }

    /// Returns the variables live before the expression is evaluated.
    #[must_use]
    pub fn live_in_expr(&self, expr: ExprId) -> &LiveSet {
        &self.expr_in[expr]
    }

    /// Returns the variables the statement overwrites on every path that completes it.
    #[must_use]
    pub fn kills(&self, stmt: StmtId) -> &LiveSet {
        &self.kills[stmt]
    }

    /// Returns every variable whose value is read somewhere in the body.
    #[must_use]
    pub fn ever_live(&self) -> &LiveSet {
        &self.ever_live
    }

    /// Returns the variables live at method entry.
    #[must_use]
    pub fn entry(&self) -> &LiveSet {
        &self.entry
    }
}

/// Where control goes on a jump.
#[derive(Clone, Default)]
struct Targets {
    /// Live after the innermost loop or switch.
    brk: LiveSet,
    /// Live at the continue target of the innermost loop.
    cont: LiveSet,
    /// Live on `return`.
    ret: LiveSet,
    /// Live at the handlers of the enclosing `try` statements; kept alive at every point inside
    /// a protected block.
    protect: LiveSet,
}

impl Targets {
    fn breakable(&self, brk: &LiveSet, cont: &LiveSet) -> Self {
        Self { brk: brk.clone(), cont: cont.clone(), ..self.clone() }
    }

    /// Returns the targets inside a `try` block, where every jump out also needs `extra`.
    fn through(&self, extra: &LiveSet) -> Self {
        let mut t = self.clone();
        for set in [&mut t.brk, &mut t.cont, &mut t.ret, &mut t.protect] {
            set.union_with(extra);
        }
        t
    }
}

/// Backward live-variable analysis.
pub struct Liveness<'a> {
    body: &'a Body,
    info: LivenessInfo,
}

impl<'a> Liveness<'a> {
    /// Computes liveness for a body.
    #[instrument(name = "liveness", level = "debug", skip_all, fields(body = %body.name))]
    pub fn compute(body: &'a Body) -> LivenessInfo {
        let empty = LiveSet::with_capacity(body.var_count());
        let info = LivenessInfo {
            stmt_in: IndexVec::from_vec(vec![empty.clone(); body.stmts.len()]),
            stmt_out: IndexVec::from_vec(vec![empty.clone(); body.stmts.len()]),
            expr_in: IndexVec::from_vec(vec![empty.clone(); body.exprs.len()]),
            kills: IndexVec::from_vec(vec![empty.clone(); body.stmts.len()]),
            ever_live: empty.clone(),
            entry: empty.clone(),
        };
        let mut this = Self { body, info };
        let (entry, _) = this.block(&body.block, &empty, &Targets::default());
        this.info.entry = entry;
        debug!(ever_live = this.info.ever_live.count(), entry = ?this.info.entry, "computed liveness");
        this.info
    }

    /// Returns `(live_in, kills)` of a statement list.
    fn block(&mut self, stmts: &[StmtId], out: &LiveSet, t: &Targets) -> (LiveSet, LiveSet) {
        let mut live = out.clone();
        for &stmt in stmts.iter().rev() {
            live = self.stmt(stmt, &live, t).0;
        }
        (live, self.path_kills(stmts).0)
    }

    /// Returns `(live_in, kills)` of a statement.
    fn stmt(&mut self, id: StmtId, out: &LiveSet, t: &Targets) -> (LiveSet, LiveSet) {
        let body = self.body;
        let (mut live, kills) = match &body.stmt(id).kind {
            &StmtKind::Decl(var, init) => {
                let mut after = out.clone();
                after.remove(var);
                let (live, mut kills) = match init {
                    Some(init) => (self.expr(init, after, t), self.expr_kills(init)),
                    None => (after, LiveSet::new()),
                };
                kills.insert(var);
                (live, kills)
            }
            &StmtKind::Expr(expr) => (self.expr(expr, out.clone(), t), self.expr_kills(expr)),
            StmtKind::Block(block) => self.block(block, out, t),
            &StmtKind::If(cond, then, els) => {
                let (mut live, mut kills) = self.stmt(then, out, t);
                match els {
                    Some(els) => {
                        let (els_live, els_kills) = self.stmt(els, out, t);
                        live.union_with(&els_live);
                        kills.intersect_with(&els_kills);
                    }
                    None => {
                        live.union_with(out);
                        kills.clear();
                    }
                }
                kills.union_with(&self.expr_kills(cond));
                (self.expr(cond, live, t), kills)
            }
            &StmtKind::While(cond, stmt) => {
                let mut head = self.expr(cond, out.clone(), t);
                for _ in 0..2 {
                    let body_in = self.stmt(stmt, &head, &t.breakable(out, &head)).0;
                    let mut cond_out = out.clone();
                    cond_out.union_with(&body_in);
                    head = self.expr(cond, cond_out, t);
                }
                (head, self.expr_kills(cond))
            }
            &StmtKind::DoWhile(stmt, cond) => {
                let mut cond_in = self.expr(cond, out.clone(), t);
                let mut body_in = LiveSet::new();
                for _ in 0..2 {
                    body_in = self.stmt(stmt, &cond_in, &t.breakable(out, &cond_in)).0;
                    let mut cond_out = out.clone();
                    cond_out.union_with(&body_in);
                    cond_in = self.expr(cond, cond_out, t);
                }
                // The body may break out before any of its writes.
                (body_in, LiveSet::new())
            }
            StmtKind::For { init, cond, update, body: stmt } => {
                let head_of = |this: &mut Self, body_in: &LiveSet| match *cond {
                    Some(cond) => {
                        let mut cond_out = out.clone();
                        cond_out.union_with(body_in);
                        this.expr(cond, cond_out, t)
                    }
                    None => body_in.clone(),
                };
                let mut head = head_of(self, &LiveSet::new());
                for _ in 0..2 {
                    let update_in = self.exprs(update, head, t);
                    let body_in = self.stmt(*stmt, &update_in, &t.breakable(out, &update_in)).0;
                    head = head_of(self, &body_in);
                }
                let (live, mut kills) = self.block(init, &head, t);
                if let Some(cond) = *cond {
                    kills.union_with(&self.expr_kills(cond));
                }
                (live, kills)
            }
            &StmtKind::ForEach { var, iterable, body: stmt } => {
                let mut head = out.clone();
                for _ in 0..2 {
                    let mut body_in = self.stmt(stmt, &head, &t.breakable(out, &head)).0;
                    body_in.remove(var);
                    head = out.clone();
                    head.union_with(&body_in);
                }
                (self.expr(iterable, head, t), self.expr_kills(iterable))
            }
            &StmtKind::Switch { selector, ref cases } => self.switch(selector, cases, out, t),
            StmtKind::Try(try_) => self.try_(try_, out, t),
            &StmtKind::Throw(expr) => (self.expr(expr, t.protect.clone(), t), self.expr_kills(expr)),
            &StmtKind::Assert(cond, msg) => {
                let mut failed = t.protect.clone();
                if let Some(msg) = msg {
                    failed = self.expr(msg, failed, t);
                }
                failed.union_with(out);
                // Assertions may be disabled, so nothing is killed and `out` stays live.
                let mut live = self.expr(cond, failed, t);
                live.union_with(out);
                (live, LiveSet::new())
            }
            &StmtKind::Return(expr) => match expr {
                Some(expr) => (self.expr(expr, t.ret.clone(), t), self.expr_kills(expr)),
                None => (t.ret.clone(), LiveSet::new()),
            },
            StmtKind::Break => (t.brk.clone(), LiveSet::new()),
            StmtKind::Continue => (t.cont.clone(), LiveSet::new()),
            StmtKind::Empty => (out.clone(), LiveSet::new()),
            StmtKind::Err => {
                let all: LiveSet = body.vars.indices().collect();
                (all, LiveSet::new())
            }
        };

        live.union_with(&t.protect);
        let mut live_out = out.clone();
        live_out.union_with(&t.protect);
        self.info.stmt_in[id] = live.clone();
        self.info.stmt_out[id] = live_out;
        self.info.kills[id] = kills.clone();
        (live, kills)
    }

    fn switch(
        &mut self,
        selector: ExprId,
        cases: &[SwitchCase],
        out: &LiveSet,
        t: &Targets,
    ) -> (LiveSet, LiveSet) {
        let inner = t.breakable(out, &t.cont);

        // Cases fall through into the next one.
        let mut next = out.clone();
        let mut entry = LiveSet::new();
        for case in cases.iter().rev() {
            next = self.block(&case.body, &next, &inner).0;
            entry.union_with(&next);
        }
        let has_default = cases.iter().any(SwitchCase::is_default);
        if !has_default {
            entry.union_with(out);
        }
        for case in cases.iter().rev() {
            entry = self.exprs(&case.labels, entry, t);
        }

        let mut kills = if has_default { self.switch_kills(cases) } else { LiveSet::new() };
        kills.union_with(&self.expr_kills(selector));
        (self.expr(selector, entry, t), kills)
    }

    /// Intersects the kills of every path from a case label to the end of the switch.
    fn switch_kills(&self, cases: &[SwitchCase]) -> LiveSet {
        let mut result: Option<LiveSet> = None;
        let mut fallthrough = LiveSet::new();
        for case in cases.iter().rev() {
            let (mut kills, breaks) = self.path_kills(&case.body);
            if !breaks {
                kills.union_with(&fallthrough);
            }
            match &mut result {
                Some(result) => result.intersect_with(&kills),
                None => result = Some(kills.clone()),
            }
            fallthrough = kills;
        }
        result.unwrap_or_default()
    }

    fn try_(&mut self, try_: &StmtTry, out: &LiveSet, t: &Targets) -> (LiveSet, LiveSet) {
        let StmtTry { resources, block, catches, finally } = try_;

        // The finalizer runs on every way out, so it continues to any of them.
        let (fin_in, fin_kills) = match finally {
            Some(finally) => {
                let mut fin_out = out.clone();
                for set in [&t.brk, &t.cont, &t.ret, &t.protect] {
                    fin_out.union_with(set);
                }
                self.block(finally, &fin_out, t)
            }
            None => (LiveSet::new(), LiveSet::new()),
        };
        let normal_out = if finally.is_some() { &fin_in } else { out };

        let in_catch = t.through(&fin_in);
        let mut handlers = fin_in.clone();
        let mut catch_kills: Option<LiveSet> = None;
        for catch in catches {
            let (mut live, mut kills) = self.block(&catch.block, normal_out, &in_catch);
            live.remove(catch.param);
            kills.insert(catch.param);
            handlers.union_with(&live);
            match &mut catch_kills {
                Some(k) => k.intersect_with(&kills),
                None => catch_kills = Some(kills),
            }
        }

        // Resources are closed on every way out of the block.
        let res: LiveSet = resources
            .iter()
            .filter_map(|&r| decl_var(self.body, r))
            .collect();
        for var in res.iter() {
            self.info.ever_live.insert(var);
        }
        let mut protected = res.clone();
        protected.union_with(&handlers);
        let in_block = t.through(&protected);
        let mut block_out = normal_out.clone();
        block_out.union_with(&res);
        let (block_in, block_kills) = self.block(block, &block_out, &in_block);

        let in_resources = t.through(&handlers);
        let (live, mut kills) = self.block(resources, &block_in, &in_resources);
        kills.union_with(&block_kills);
        if let Some(catch_kills) = catch_kills {
            kills.intersect_with(&catch_kills);
        }
        kills.union_with(&fin_kills);
        (live, kills)
    }

    /// Returns the live set before a sequence of expressions evaluated left to right.
    fn exprs(&mut self, exprs: &[ExprId], out: LiveSet, t: &Targets) -> LiveSet {
        exprs.iter().rev().fold(out, |live, &e| self.expr(e, live, t))
    }

    /// Returns the live set before an expression.
    fn expr(&mut self, id: ExprId, out: LiveSet, t: &Targets) -> LiveSet {
        let body = self.body;
        let mut live = match body.expr(id).kind {
            ExprKind::Ident(var) => {
                self.info.ever_live.insert(var);
                let mut live = out;
                live.insert(var);
                live
            }
            ExprKind::Assign(lhs, op, rhs) => match body.local_target(lhs) {
                Some(var) => {
                    let mut after = out;
                    after.remove(var);
                    let mut live = self.expr(rhs, after, t);
                    if op.is_some() {
                        self.info.ever_live.insert(var);
                        live.insert(var);
                    }
                    self.record_target(lhs, &live, t);
                    live
                }
                None => {
                    let live = self.expr(rhs, out, t);
                    self.place(lhs, live, t)
                }
            },
            ExprKind::Unary(op, operand) if op.has_side_effects() => {
                match body.local_target(operand) {
                    Some(var) => {
                        self.info.ever_live.insert(var);
                        let mut live = out;
                        live.insert(var);
                        self.record_target(operand, &live, t);
                        live
                    }
                    None => self.place(operand, out, t),
                }
            }
            ExprKind::Binary(lhs, op, rhs) if op.is_short_circuit() => {
                let rhs_in = self.expr(rhs, out.clone(), t);
                let mut mid = out;
                mid.union_with(&rhs_in);
                self.expr(lhs, mid, t)
            }
            ExprKind::Ternary(cond, then, els) => {
                let mut arms = self.expr(then, out.clone(), t);
                arms.union_with(&self.expr(els, out, t));
                self.expr(cond, arms, t)
            }
            ref kind => self.exprs(&kind.children(), out, t),
        };
        live.union_with(&t.protect);
        self.info.expr_in[id] = live.clone();
        live
    }

    /// Walks the operands of a field or array element being written.
    fn place(&mut self, id: ExprId, out: LiveSet, t: &Targets) -> LiveSet {
        let live = match self.body.expr(id).kind {
            ExprKind::Paren(inner) => self.place(inner, out, t),
            ExprKind::Field { receiver, .. } => match receiver {
                Some(receiver) => self.expr(receiver, out, t),
                None => out,
            },
            ExprKind::Index(array, index) => {
                let live = self.expr(index, out, t);
                self.expr(array, live, t)
            }
            ref kind => self.exprs(&kind.children(), out, t),
        };
        let mut recorded = live.clone();
        recorded.union_with(&t.protect);
        self.info.expr_in[id] = recorded;
        live
    }

    /// Records the live set at an assignment target, which is not itself a read.
    fn record_target(&mut self, mut id: ExprId, live: &LiveSet, t: &Targets) {
        let mut recorded = live.clone();
        recorded.union_with(&t.protect);
        loop {
            self.info.expr_in[id] = recorded.clone();
            match self.body.expr(id).kind {
                ExprKind::Paren(inner) => id = inner,
                _ => break,
            }
        }
    }

    /// Returns the locals an expression overwrites on every evaluation.
    fn expr_kills(&self, id: ExprId) -> LiveSet {
        match self.body.expr(id).kind {
            ExprKind::Binary(lhs, op, _) if op.is_short_circuit() => self.expr_kills(lhs),
            ExprKind::Ternary(cond, then, els) => {
                let mut kills = self.expr_kills(then);
                kills.intersect_with(&self.expr_kills(els));
                kills.union_with(&self.expr_kills(cond));
                kills
            }
            ref kind => {
                let mut kills = LiveSet::new();
                for child in kind.children() {
                    kills.union_with(&self.expr_kills(child));
                }
                if let ExprKind::Assign(lhs, None, _) = *kind
                    && let Some(var) = self.body.local_target(lhs)
                {
                    kills.insert(var);
                }
                kills
            }
        }
    }

    /// Returns the union of the kills of `stmts` up to and including the first statement that may
    /// break out of them, and whether such a statement was found.
    fn path_kills(&self, stmts: &[StmtId]) -> (LiveSet, bool) {
        let mut kills = LiveSet::new();
        for &stmt in stmts {
            kills.union_with(&self.info.kills[stmt]);
            if self.may_break(stmt) {
                return (kills, true);
            }
        }
        (kills, false)
    }

    /// Returns `true` if the statement contains a `break` that leaves it.
    fn may_break(&self, stmt: StmtId) -> bool {
        match &self.body.stmt(stmt).kind {
            StmtKind::Break => true,
            kind if kind.is_breakable() => false,
            kind => kind.stmt_children().into_iter().any(|s| self.may_break(s)),
        }
    }
}

fn decl_var(body: &Body, stmt: StmtId) -> Option<VarId> {
    match body.stmt(stmt).kind {
        StmtKind::Decl(var, _) => Some(var),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ast::{BodyBuilder, ast::*};

    fn set(vars: &[VarId]) -> LiveSet {
        vars.iter().copied().collect()
    }

    #[test]
    fn liveset_basic() {
        let mut set = LiveSet::with_capacity(100);
        let v0 = VarId::from_usize(0);
        let v42 = VarId::from_usize(42);
        let v99 = VarId::from_usize(99);

        assert!(!set.contains(v0));
        assert!(set.insert(v0));
        assert!(!set.insert(v0));
        assert!(set.insert(v42));
        assert!(set.insert(v99));
        assert_eq!(set.count(), 3);

        assert!(set.remove(v42));
        assert!(!set.contains(v42));
        assert_eq!(set.iter().collect::<Vec<_>>(), [v0, v99]);
    }

    #[test]
    fn liveset_algebra() {
        let [a, b, c] = [1, 3, 70].map(VarId::from_usize);
        let mut ab = set(&[a, b]);
        let bc = set(&[b, c]);

        assert!(ab.union_with(&bc));
        assert!(!ab.union_with(&bc));
        assert_eq!(ab, set(&[a, b, c]));

        let mut x = set(&[a, b]);
        x.intersect_with(&bc);
        assert_eq!(x, set(&[b]));
        assert!(x.is_subset(&bc) && !bc.is_subset(&x));

        let mut y = set(&[a, b, c]);
        y.subtract(&bc);
        assert_eq!(y, set(&[a]));
        assert!(y.is_disjoint(&bc));

        // Trailing zero words don't matter.
        assert_eq!(LiveSet::with_capacity(200), LiveSet::new());
        assert!(LiveSet::with_capacity(200).is_empty());
    }

    #[test]
    fn kill_and_gen() {
        // int x = 3; x = 7; int z = x + x;
        let mut b = BodyBuilder::new("f");
        let x = b.local("x", TypeName::INT);
        let z = b.local("z", TypeName::INT);
        let three = b.int(3);
        let s1 = b.decl(x, Some(three));
        let (target, seven) = (b.ident(x), b.int(7));
        let assign = b.assign(target, seven);
        let s2 = b.expr_stmt(assign);
        let (l, r) = (b.ident(x), b.ident(x));
        let sum = b.binary(l, BinOpKind::Add, r);
        let s3 = b.decl(z, Some(sum));
        let body = b.finish();

        let info = Liveness::compute(&body);
        assert!(!info.live_in(s1).contains(x));
        assert!(!info.live_in(s2).contains(x));
        assert!(info.live_in(s3).contains(x));
        assert!(info.live_out(s3).is_empty());
        assert_eq!(info.kills(s2), &set(&[x]));
        assert_eq!(info.ever_live(), &set(&[x]));
    }

    #[test]
    fn if_kills_intersect() {
        // if (y > 4) { x = 7; } else { x = 8; y = 9; }
        let mut b = BodyBuilder::new("f");
        let x = b.param("x", TypeName::INT);
        let y = b.param("y", TypeName::INT);
        let (read, four) = (b.ident(y), b.int(4));
        let cond = b.binary(read, BinOpKind::Gt, four);
        let then = b.block(|b| {
            let (t, v) = (b.ident(x), b.int(7));
            let e = b.assign(t, v);
            b.expr_stmt(e);
        });
        let els = b.block(|b| {
            let (t, v) = (b.ident(x), b.int(8));
            let e = b.assign(t, v);
            b.expr_stmt(e);
            let (t, v) = (b.ident(y), b.int(9));
            let e = b.assign(t, v);
            b.expr_stmt(e);
        });
        let if_ = b.if_stmt(cond, then, Some(els));
        let body = b.finish();

        let info = Liveness::compute(&body);
        assert_eq!(info.kills(if_), &set(&[x]));
        assert_eq!(info.kills(els), &set(&[x, y]));
        assert_eq!(info.live_in(if_), &set(&[y]));
    }

    #[test]
    fn loops_keep_carried_values_live() {
        // int s = 0; while (s < n) { s += i; i = i + 1; } return s;
        let mut b = BodyBuilder::new("f");
        let n = b.param("n", TypeName::INT);
        let i = b.param("i", TypeName::INT);
        let s = b.local("s", TypeName::INT);
        let zero = b.int(0);
        b.decl(s, Some(zero));
        let (rs, rn) = (b.ident(s), b.ident(n));
        let cond = b.binary(rs, BinOpKind::Lt, rn);
        let mut inc = None;
        let stmt = b.block(|b| {
            let (t, ri) = (b.ident(s), b.ident(i));
            let e = b.assign_op(t, BinOpKind::Add, ri);
            b.expr_stmt(e);
            let (t, ri, one) = (b.ident(i), b.ident(i), b.int(1));
            let sum = b.binary(ri, BinOpKind::Add, one);
            let e = b.assign(t, sum);
            inc = Some(b.expr_stmt(e));
        });
        let loop_ = b.while_stmt(cond, stmt);
        let rs = b.ident(s);
        b.return_stmt(Some(rs));
        let body = b.finish();

        let info = Liveness::compute(&body);
        // `i` is read in the next iteration, so it stays live after its own update.
        assert!(info.live_out(inc.unwrap()).contains(i));
        assert_eq!(info.live_in(loop_), &set(&[n, i, s]));
        assert_eq!(info.live_out(loop_), &set(&[s]));
        assert_eq!(info.entry(), &set(&[n, i]));
    }

    #[test]
    fn break_and_continue_targets() {
        // for (;;) { if (c) break; x = 1; continue; } return x;
        let mut b = BodyBuilder::new("f");
        let c = b.param("c", TypeName::BOOLEAN);
        let x = b.param("x", TypeName::INT);
        let stmt = b.block(|b| {
            let cond = b.ident(c);
            let brk = b.detached(StmtKind::Break);
            b.if_stmt(cond, brk, None);
            let (t, one) = (b.ident(x), b.int(1));
            let e = b.assign(t, one);
            b.expr_stmt(e);
            b.continue_stmt();
        });
        let loop_ = b.for_stmt(Vec::new(), None, Vec::new(), stmt);
        let rx = b.ident(x);
        b.return_stmt(Some(rx));
        let body = b.finish();

        let info = Liveness::compute(&body);
        // `x` reaches the return through the break, before any assignment.
        assert_eq!(info.live_in(loop_), &set(&[c, x]));
        assert!(info.kills(loop_).is_empty());
    }

    #[test]
    fn switch_kills_need_default() {
        // switch (s) { case 1: x = 1; break; default: x = 2; }
        let build = |with_default: bool| {
            let mut b = BodyBuilder::new("f");
            let s = b.param("s", TypeName::INT);
            let x = b.param("x", TypeName::INT);
            let selector = b.ident(s);
            let one = b.int(1);
            let mut cases = vec![b.case(vec![one], |b| {
                let (t, v) = (b.ident(x), b.int(1));
                let e = b.assign(t, v);
                b.expr_stmt(e);
                b.break_stmt();
            })];
            let label = b.int(2);
            let labels = if with_default { vec![] } else { vec![label] };
            cases.push(b.case(labels, |b| {
                let (t, v) = (b.ident(x), b.int(2));
                let e = b.assign(t, v);
                b.expr_stmt(e);
            }));
            let switch = b.switch(selector, cases);
            let rx = b.ident(x);
            b.return_stmt(Some(rx));
            (b.finish(), switch, s, x)
        };

        let (body, switch, s, x) = build(true);
        let info = Liveness::compute(&body);
        assert_eq!(info.kills(switch), &set(&[x]));
        assert_eq!(info.live_in(switch), &set(&[s]));

        let (body, switch, s, x) = build(false);
        let info = Liveness::compute(&body);
        assert!(info.kills(switch).is_empty());
        assert_eq!(info.live_in(switch), &set(&[s, x]));
    }

    #[test]
    fn do_while_runs_its_body_first() {
        // int y; do { y = p; } while (y > 0);
        let mut b = BodyBuilder::new("f");
        let p = b.param("p", TypeName::INT);
        let y = b.local("y", TypeName::INT);
        b.decl(y, None);
        let stmt = b.block(|b| {
            let (t, rp) = (b.ident(y), b.ident(p));
            let e = b.assign(t, rp);
            b.expr_stmt(e);
        });
        let (ry, zero) = (b.ident(y), b.int(0));
        let cond = b.binary(ry, BinOpKind::Gt, zero);
        let loop_ = b.do_while(stmt, cond);
        let body = b.finish();

        let info = Liveness::compute(&body);
        assert_eq!(info.live_in(loop_), &set(&[p]));
        assert_eq!(info.live_in(stmt), &set(&[p]));
        assert_eq!(info.live_out(stmt), &set(&[p, y]));
        assert!(info.kills(loop_).is_empty());
    }

    #[test]
    fn for_each_variable_is_written_by_the_loop() {
        // int s = 0; for (int e : a) { s = s + e; } return s;
        let mut b = BodyBuilder::new("f");
        let a = b.param("a", TypeName::INT.array_of());
        let s = b.local("s", TypeName::INT);
        let e = b.local("e", TypeName::INT);
        let zero = b.int(0);
        b.decl(s, Some(zero));
        let stmt = b.block(|b| {
            let (t, rs, re) = (b.ident(s), b.ident(s), b.ident(e));
            let sum = b.binary(rs, BinOpKind::Add, re);
            let a = b.assign(t, sum);
            b.expr_stmt(a);
        });
        let ra = b.ident(a);
        let loop_ = b.for_each(e, ra, stmt);
        let rs = b.ident(s);
        b.return_stmt(Some(rs));
        let body = b.finish();

        let info = Liveness::compute(&body);
        assert_eq!(info.live_in(loop_), &set(&[a, s]));
        assert_eq!(info.live_in(stmt), &set(&[s, e]));
        assert_eq!(info.live_out(stmt), &set(&[s]));
        assert!(info.kills(loop_).is_empty());
        assert_eq!(info.entry(), &set(&[a]));
    }

    #[test]
    fn finally_runs_on_every_exit() {
        // int x = 0; try { x = 1; if (c) return; } finally { y = x; } return y;
        let mut b = BodyBuilder::new("f");
        let c = b.param("c", TypeName::BOOLEAN);
        let x = b.local("x", TypeName::INT);
        let y = b.param("y", TypeName::INT);
        let zero = b.int(0);
        let decl = b.decl(x, Some(zero));
        let mut write = None;
        let block = b.stmts(|b| {
            let (t, one) = (b.ident(x), b.int(1));
            let a = b.assign(t, one);
            write = Some(b.expr_stmt(a));
            let (rc, ret) = (b.ident(c), b.detached(StmtKind::Return(None)));
            b.if_stmt(rc, ret, None);
        });
        let mut read = None;
        let finally = b.stmts(|b| {
            let (t, rx) = (b.ident(y), b.ident(x));
            let a = b.assign(t, rx);
            read = Some(b.expr_stmt(a));
        });
        let try_ = b.try_stmt(Vec::new(), block, Vec::new(), Some(finally));
        let ry = b.ident(y);
        b.return_stmt(Some(ry));
        let body = b.finish();

        let info = Liveness::compute(&body);
        assert_eq!(info.live_in(read.unwrap()), &set(&[x]));
        // The finalizer may run before the assignment completes.
        assert_eq!(info.live_in(write.unwrap()), &set(&[c, x]));
        assert_eq!(info.live_in(try_), &set(&[c, x]));
        assert_eq!(info.live_in(decl), &set(&[c]));
        assert!(info.kills(try_).contains(y));
    }

    #[test]
    fn switch_kills_follow_fallthrough() {
        // switch (s) { case 1: a = 1; case 2: b = 2; break; default: a = 3; b = 3; } return a + b;
        let mut b = BodyBuilder::new("f");
        let s = b.param("s", TypeName::INT);
        let a = b.param("a", TypeName::INT);
        let bv = b.param("b", TypeName::INT);
        let selector = b.ident(s);
        let assign = |b: &mut BodyBuilder, var: VarId, value: i32| {
            let (t, v) = (b.ident(var), b.int(value));
            let e = b.assign(t, v);
            b.expr_stmt(e);
        };
        let one = b.int(1);
        let case1 = b.case(vec![one], |b| assign(b, a, 1));
        let two = b.int(2);
        let case2 = b.case(vec![two], |b| {
            assign(b, bv, 2);
            b.break_stmt();
        });
        let default = b.case(vec![], |b| {
            assign(b, a, 3);
            assign(b, bv, 3);
        });
        let switch = b.switch(selector, vec![case1, case2, default]);
        let (ra, rb) = (b.ident(a), b.ident(bv));
        let sum = b.binary(ra, BinOpKind::Add, rb);
        b.return_stmt(Some(sum));
        let body = b.finish();

        let info = Liveness::compute(&body);
        // `case 1` falls into `case 2`, so every path writes `b`.
        assert_eq!(info.kills(switch), &set(&[bv]));
        assert_eq!(info.live_in(switch), &set(&[s, a]));
    }

    #[test]
    fn try_keeps_handler_reads_live() {
        // try { x = f(); y = 1; } catch (E e) { use(x); } return y;
        let mut b = BodyBuilder::new("f");
        let x = b.param("x", TypeName::INT);
        let y = b.param("y", TypeName::INT);
        let e = b.catch_param("e", TypeName::class("E"));
        let mut first = None;
        let block = b.stmts(|b| {
            let (t, call) = (b.ident(x), b.call(None, Callee::new("T", "f", 0), vec![]));
            let a = b.assign(t, call);
            first = Some(b.expr_stmt(a));
            let (t, one) = (b.ident(y), b.int(1));
            let a = b.assign(t, one);
            b.expr_stmt(a);
        });
        let catch = b.catch(e, |b| {
            let rx = b.ident(x);
            let call = b.call(None, Callee::new("T", "use", 1), vec![rx]);
            b.expr_stmt(call);
        });
        let try_ = b.try_stmt(Vec::new(), block, vec![catch], None);
        let ry = b.ident(y);
        b.return_stmt(Some(ry));
        let body = b.finish();

        let info = Liveness::compute(&body);
        // The handler may read `x`, and on that path `y` is not overwritten.
        assert!(info.live_in(try_).contains(x));
        assert!(info.live_in(try_).contains(y));
        assert!(info.live_out(first.unwrap()).contains(x));
        assert!(!info.live_in(try_).contains(e));
        assert_eq!(info.kills(try_), &set(&[]));
    }
}
