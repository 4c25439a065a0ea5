//! Locals written by a statement.

use crate::liveness::LiveSet;
use kiln_ast::{
    ast::{Body, ExprId, ExprKind, StmtId, VarId},
    visit::{Visit, walk_expr},
};
use kiln_data_structures::Never;
use std::ops::ControlFlow;

/// Returns the locals that `stmt` may write, including every variable it declares.
pub fn written_locals(body: &Body, stmt: StmtId) -> LiveSet {
    let mut v = LocalWrites { body, writes: LiveSet::with_capacity(body.var_count()) };
    let ControlFlow::Continue(()) = v.visit_stmt(stmt);
    v.writes
}

struct LocalWrites<'a> {
    body: &'a Body,
    writes: LiveSet,
}

impl<'a> Visit<'a> for LocalWrites<'a> {
    type BreakValue = Never;

    fn body(&self) -> &'a Body {
        self.body
    }

    fn visit_var(&mut self, id: VarId) -> ControlFlow<Never> {
        self.writes.insert(id);
        ControlFlow::Continue(())
    }

    fn visit_expr(&mut self, id: ExprId) -> ControlFlow<Never> {
        let target = match self.body.expr(id).kind {
            ExprKind::Assign(lhs, ..) => Some(lhs),
            ExprKind::Unary(op, operand) if op.has_side_effects() => Some(operand),
            _ => None,
        };
        if let Some(var) = target.and_then(|t| self.body.local_target(t)) {
            self.writes.insert(var);
        }
        walk_expr(self, id)
    }
}
