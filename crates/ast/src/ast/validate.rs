//! Tree shape checks.

use super::{Body, ExprId, ExprKind, NodeId, StmtId, StmtKind};
use kiln_data_structures::index::IndexVec;
use kiln_interface::Span;
use std::fmt;

/// A tree shape that the analyses cannot handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeError {
    pub kind: TreeErrorKind,
    pub span: Span,
}

/// A kind of [`TreeError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeErrorKind {
    /// A node is referenced by more than one child slot.
    MultipleParents(NodeId),
    /// An assignment or increment targets an expression that is not a variable, field or array
    /// element.
    NotAnLvalue(ExprId),
    /// A `break` outside of a loop or switch, or a `continue` outside of a loop.
    JumpOutsideLoop(StmtId),
}

impl TreeErrorKind {
    /// Returns the error message.
    pub fn msg(&self) -> &'static str {
        match self {
            Self::MultipleParents(_) => "tree node has more than one parent",
            Self::NotAnLvalue(_) => "assignment target is not a variable, field or array element",
            Self::JumpOutsideLoop(_) => "jump statement has no enclosing target",
        }
    }
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TreeErrorKind::MultipleParents(node) => write!(f, "{}: {node}", self.kind.msg()),
            _ => f.write_str(self.kind.msg()),
        }
    }
}

impl std::error::Error for TreeError {}

impl Body {
    /// Checks that every node reachable from the root block is referenced by exactly one child
    /// slot.
    ///
    /// Returns the first node found with a second parent.
    pub fn check_single_parent(&self) -> Result<(), NodeId> {
        let mut seen_exprs = IndexVec::<ExprId, bool>::from_vec(vec![false; self.exprs.len()]);
        let mut seen_stmts = IndexVec::<StmtId, bool>::from_vec(vec![false; self.stmts.len()]);
        let mut stack: Vec<NodeId> = self.block.iter().rev().map(|&s| NodeId::Stmt(s)).collect();
        while let Some(node) = stack.pop() {
            match node {
                NodeId::Expr(id) => {
                    if std::mem::replace(&mut seen_exprs[id], true) {
                        return Err(node);
                    }
                    stack.extend(self.exprs[id].kind.children().into_iter().map(NodeId::Expr));
                }
                NodeId::Stmt(id) => {
                    if std::mem::replace(&mut seen_stmts[id], true) {
                        return Err(node);
                    }
                    let kind = &self.stmts[id].kind;
                    stack.extend(kind.expr_children().into_iter().map(NodeId::Expr));
                    stack.extend(kind.stmt_children().into_iter().map(NodeId::Stmt));
                }
            }
        }
        Ok(())
    }

    /// Checks the shape of the whole body: single parents, assignment targets and jump targets.
    pub fn validate(&self) -> Result<(), TreeError> {
        self.check_single_parent().map_err(|node| TreeError {
            kind: TreeErrorKind::MultipleParents(node),
            span: self.node_span(node),
        })?;
        let mut checker = ShapeChecker { body: self, loops: 0, breakables: 0 };
        self.block.iter().try_for_each(|&s| checker.stmt(s))
    }

    /// Returns the span of the given node.
    pub fn node_span(&self, node: NodeId) -> Span {
        match node {
            NodeId::Expr(id) => self.exprs[id].span,
            NodeId::Stmt(id) => self.stmts[id].span,
        }
    }
}

struct ShapeChecker<'a> {
    body: &'a Body,
    loops: usize,
    breakables: usize,
}

impl ShapeChecker<'_> {
    fn stmt(&mut self, id: StmtId) -> Result<(), TreeError> {
        let body = self.body;
        let kind = &body.stmts[id].kind;
        let jump_error =
            || TreeError { kind: TreeErrorKind::JumpOutsideLoop(id), span: body.stmts[id].span };
        match kind {
            StmtKind::Break if self.breakables == 0 => return Err(jump_error()),
            StmtKind::Continue if self.loops == 0 => return Err(jump_error()),
            _ => {}
        }
        for e in kind.expr_children() {
            self.expr(e)?;
        }
        let is_loop = kind.is_loop();
        let is_breakable = kind.is_breakable();
        self.loops += is_loop as usize;
        self.breakables += is_breakable as usize;
        let res = kind.stmt_children().into_iter().try_for_each(|s| self.stmt(s));
        self.loops -= is_loop as usize;
        self.breakables -= is_breakable as usize;
        res
    }

    fn expr(&mut self, id: ExprId) -> Result<(), TreeError> {
        let body = self.body;
        let kind = &body.exprs[id].kind;
        let target = match *kind {
            ExprKind::Assign(lhs, ..) => Some(lhs),
            ExprKind::Unary(op, operand) if op.has_side_effects() => Some(operand),
            _ => None,
        };
        if let Some(target) = target
            && !body.is_lvalue(target)
        {
            return Err(TreeError {
                kind: TreeErrorKind::NotAnLvalue(target),
                span: body.exprs[target].span,
            });
        }
        kind.children().into_iter().try_for_each(|e| self.expr(e))
    }
}

#[cfg(test)]
mod tests {
    use crate::{BodyBuilder, ast::*};

    #[test]
    fn shared_child_is_rejected() {
        let mut b = BodyBuilder::new("f");
        let x = b.local("x", TypeName::INT);
        let one = b.int(1);
        b.decl(x, Some(one));
        let y = b.local("y", TypeName::INT);
        b.decl(y, Some(one));
        let body = b.finish();
        assert_eq!(body.check_single_parent(), Err(NodeId::Expr(one)));
        assert!(matches!(
            body.validate().unwrap_err().kind,
            TreeErrorKind::MultipleParents(NodeId::Expr(_))
        ));
    }

    #[test]
    fn bad_targets_and_jumps() {
        let mut b = BodyBuilder::new("f");
        let one = b.int(1);
        let inc = b.unary(UnOpKind::PostInc, one);
        b.expr_stmt(inc);
        let body = b.finish();
        assert_eq!(body.validate().unwrap_err().kind, TreeErrorKind::NotAnLvalue(one));

        let mut b = BodyBuilder::new("g");
        let brk = b.stmt(StmtKind::Break);
        let body = b.finish();
        assert_eq!(body.validate().unwrap_err().kind, TreeErrorKind::JumpOutsideLoop(brk));
    }
}
