//! Method body trees.

use kiln_data_structures::{index::IndexVec, newtype_index};
use std::fmt;

pub use kiln_data_structures::sync::Lrc;
pub use kiln_interface::Span;

mod expr;
pub use expr::*;

mod lit;
pub use lit::*;

mod stmt;
pub use stmt::*;

mod structural;

mod ty;
pub use ty::*;

mod typing;

mod validate;
pub use validate::{TreeError, TreeErrorKind};

newtype_index! {
    /// A variable declared in a [`Body`]: a parameter, local, catch parameter or resource.
    pub struct VarId;
}

newtype_index! {
    /// An expression in a [`Body`].
    pub struct ExprId;
}

newtype_index! {
    /// A statement in a [`Body`].
    pub struct StmtId;
}

/// A node of a [`Body`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    Expr(ExprId),
    Stmt(StmtId),
}

impl From<ExprId> for NodeId {
    fn from(id: ExprId) -> Self {
        Self::Expr(id)
    }
}

impl From<StmtId> for NodeId {
    fn from(id: StmtId) -> Self {
        Self::Stmt(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(id) => write!(f, "expression #{id}"),
            Self::Stmt(id) => write!(f, "statement #{id}"),
        }
    }
}

/// A block of statements.
pub type Block = Vec<StmtId>;

/// The body of a single method or function.
///
/// All nodes live in the arenas below. Each node reachable from [`block`](Self::block) is
/// referenced by exactly one child slot; nodes that were replaced by a rewrite stay in the arena
/// but are no longer reachable.
#[derive(Clone, Debug, Default)]
pub struct Body {
    /// The name of the method, used in diagnostics and logs.
    pub name: Lrc<str>,
    pub span: Span,
    pub vars: IndexVec<VarId, Variable>,
    pub exprs: IndexVec<ExprId, Expr>,
    pub stmts: IndexVec<StmtId, Stmt>,
    /// The method's parameters, in declaration order.
    pub params: Vec<VarId>,
    /// The top-level statements.
    pub block: Block,
}

/// A variable declaration.
#[derive(Clone, Debug)]
pub struct Variable {
    pub name: Lrc<str>,
    pub ty: TypeName,
    pub kind: VarKind,
    pub span: Span,
}

/// Where a variable is declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// A method parameter.
    Param,
    /// A local variable, including `for` and for-each loop variables.
    Local,
    /// The parameter of a `catch` clause.
    CatchParam,
    /// A resource of a `try`-with-resources statement.
    Resource,
}

impl Body {
    /// Creates a new empty body.
    pub fn new(name: impl Into<Lrc<str>>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Returns the variable with the given id.
    #[inline]
    #[track_caller]
    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id]
    }

    /// Returns the expression with the given id.
    #[inline]
    #[track_caller]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    /// Returns the statement with the given id.
    #[inline]
    #[track_caller]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }

    /// Allocates a new variable.
    pub fn alloc_var(&mut self, var: Variable) -> VarId {
        self.vars.push(var)
    }

    /// Allocates a new expression.
    pub fn alloc_expr(&mut self, span: Span, kind: ExprKind) -> ExprId {
        self.exprs.push(Expr { span, kind })
    }

    /// Allocates a new statement.
    pub fn alloc_stmt(&mut self, span: Span, kind: StmtKind) -> StmtId {
        self.stmts.push(Stmt { span, kind })
    }

    /// Returns the number of variables in the body.
    #[inline]
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Strips any parentheses around the given expression.
    pub fn peel_parens(&self, mut id: ExprId) -> ExprId {
        while let ExprKind::Paren(inner) = self.exprs[id].kind {
            id = inner;
        }
        id
    }

    /// Returns the variable directly written by an assignment or increment targeting `id`, if the
    /// target is a (possibly parenthesized) local.
    pub fn local_target(&self, id: ExprId) -> Option<VarId> {
        match self.exprs[self.peel_parens(id)].kind {
            ExprKind::Ident(var) => Some(var),
            _ => None,
        }
    }

    /// Returns `true` if the expression can be assigned to.
    pub fn is_lvalue(&self, id: ExprId) -> bool {
        matches!(
            self.exprs[self.peel_parens(id)].kind,
            ExprKind::Ident(_) | ExprKind::Field { .. } | ExprKind::Index(..)
        )
    }

    /// Replaces the child `old` of `parent` with `new`.
    ///
    /// Returns `false` if `old` is not a child of `parent`.
    pub fn replace_expr_in(&mut self, parent: NodeId, old: ExprId, new: ExprId) -> bool {
        match parent {
            NodeId::Expr(parent) => self.exprs[parent].kind.replace_child(old, new),
            NodeId::Stmt(parent) => self.stmts[parent].kind.replace_child(old, new),
        }
    }

    /// Calls `f` for every statement reachable from `stmt`, including `stmt` itself, in pre-order.
    pub fn walk_stmts(&self, stmt: StmtId, f: &mut impl FnMut(StmtId)) {
        f(stmt);
        for child in self.stmts[stmt].kind.stmt_children() {
            self.walk_stmts(child, f);
        }
    }

    /// Calls `f` for every expression reachable from `expr`, including `expr` itself, in
    /// pre-order.
    pub fn walk_exprs(&self, expr: ExprId, f: &mut impl FnMut(ExprId)) {
        f(expr);
        for child in self.exprs[expr].kind.children() {
            self.walk_exprs(child, f);
        }
    }

    /// Calls `f` for every expression reachable from `stmt`, including expressions of nested
    /// statements, in pre-order.
    pub fn walk_stmt_exprs(&self, stmt: StmtId, f: &mut impl FnMut(ExprId)) {
        self.walk_stmts(stmt, &mut |s| {
            for e in self.stmts[s].kind.expr_children() {
                self.walk_exprs(e, f);
            }
        });
    }
}
