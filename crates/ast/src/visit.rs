//! Body traversal.

use crate::ast::*;
use std::ops::ControlFlow;

/// Body traversal.
///
/// Every `visit_*` method defaults to walking the node's children in evaluation order. Overriding
/// methods can call the corresponding `walk_*` function to keep walking.
pub trait Visit<'ast> {
    /// The value returned when breaking from the traversal.
    type BreakValue;

    /// Returns the body being traversed.
    fn body(&self) -> &'ast Body;

    /// Visits the top-level block of the body.
    fn visit_body(&mut self) -> ControlFlow<Self::BreakValue> {
        let body = self.body();
        for &param in &body.params {
            self.visit_var(param)?;
        }
        self.visit_block(&body.block)
    }

    fn visit_block(&mut self, block: &'ast [StmtId]) -> ControlFlow<Self::BreakValue> {
        block.iter().try_for_each(|&stmt| self.visit_stmt(stmt))
    }

    fn visit_stmt(&mut self, id: StmtId) -> ControlFlow<Self::BreakValue> {
        walk_stmt(self, id)
    }

    fn visit_expr(&mut self, id: ExprId) -> ControlFlow<Self::BreakValue> {
        walk_expr(self, id)
    }

    /// Visits a variable declaration: a parameter, local, loop variable, catch parameter or
    /// resource.
    fn visit_var(&mut self, id: VarId) -> ControlFlow<Self::BreakValue> {
        let _ = id;
        ControlFlow::Continue(())
    }
}

/// Walks the children of a statement.
pub fn walk_stmt<'ast, V: Visit<'ast> + ?Sized>(
    v: &mut V,
    id: StmtId,
) -> ControlFlow<V::BreakValue> {
    let body = v.body();
    match &body.stmt(id).kind {
        StmtKind::Decl(var, init) => {
            v.visit_var(*var)?;
            if let Some(init) = *init {
                v.visit_expr(init)?;
            }
        }
        StmtKind::Expr(expr) | StmtKind::Throw(expr) => v.visit_expr(*expr)?,
        StmtKind::Block(block) => v.visit_block(block)?,
        StmtKind::If(cond, then, els) => {
            v.visit_expr(*cond)?;
            v.visit_stmt(*then)?;
            if let Some(els) = *els {
                v.visit_stmt(els)?;
            }
        }
        StmtKind::While(cond, stmt) => {
            v.visit_expr(*cond)?;
            v.visit_stmt(*stmt)?;
        }
        StmtKind::DoWhile(stmt, cond) => {
            v.visit_stmt(*stmt)?;
            v.visit_expr(*cond)?;
        }
        StmtKind::For { init, cond, update, body } => {
            v.visit_block(init)?;
            if let Some(cond) = *cond {
                v.visit_expr(cond)?;
            }
            v.visit_stmt(*body)?;
            update.iter().try_for_each(|&e| v.visit_expr(e))?;
        }
        StmtKind::ForEach { var, iterable, body } => {
            v.visit_expr(*iterable)?;
            v.visit_var(*var)?;
            v.visit_stmt(*body)?;
        }
        StmtKind::Switch { selector, cases } => {
            v.visit_expr(*selector)?;
            for case in cases {
                case.labels.iter().try_for_each(|&e| v.visit_expr(e))?;
                v.visit_block(&case.body)?;
            }
        }
        StmtKind::Try(try_) => {
            v.visit_block(&try_.resources)?;
            v.visit_block(&try_.block)?;
            for catch in &try_.catches {
                v.visit_var(catch.param)?;
                v.visit_block(&catch.block)?;
            }
            if let Some(finally) = &try_.finally {
                v.visit_block(finally)?;
            }
        }
        StmtKind::Assert(cond, msg) => {
            v.visit_expr(*cond)?;
            if let Some(msg) = *msg {
                v.visit_expr(msg)?;
            }
        }
        StmtKind::Return(expr) => {
            if let Some(expr) = *expr {
                v.visit_expr(expr)?;
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Empty | StmtKind::Err => {}
    }
    ControlFlow::Continue(())
}

/// Walks the children of an expression.
pub fn walk_expr<'ast, V: Visit<'ast> + ?Sized>(
    v: &mut V,
    id: ExprId,
) -> ControlFlow<V::BreakValue> {
    v.body().expr(id).kind.children().into_iter().try_for_each(|child| v.visit_expr(child))
}
