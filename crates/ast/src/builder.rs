use crate::ast::*;

/// Incrementally builds a [`Body`].
///
/// Expressions are allocated detached and attached by passing their ids to a parent. Statement
/// methods append the new statement to the block currently being built; use
/// [`block`](Self::block) and [`stmts`](Self::stmts) to build nested blocks.
///
/// Every node receives a distinct one-byte span, in allocation order.
///
/// # Examples
///
/// ```
/// use kiln_ast::{BodyBuilder, ast::*};
///
/// // int x = 1 + 2; return x;
/// let mut b = BodyBuilder::new("f");
/// let x = b.local("x", TypeName::INT);
/// let (one, two) = (b.int(1), b.int(2));
/// let sum = b.binary(one, BinOpKind::Add, two);
/// b.decl(x, Some(sum));
/// let read = b.ident(x);
/// b.return_stmt(Some(read));
/// let body = b.finish();
/// assert_eq!(body.block.len(), 2);
/// ```
#[derive(Debug)]
pub struct BodyBuilder {
    body: Body,
    blocks: Vec<Block>,
    pos: u32,
}

impl BodyBuilder {
    /// Creates a new builder for a method with the given name.
    pub fn new(name: impl Into<Lrc<str>>) -> Self {
        Self { body: Body::new(name), blocks: vec![Vec::new()], pos: 0 }
    }

    /// Finishes the body.
    ///
    /// # Panics
    ///
    /// Panics if called while a nested block is still being built.
    pub fn finish(mut self) -> Body {
        assert_eq!(self.blocks.len(), 1, "unfinished nested block");
        self.body.block = self.blocks.pop().unwrap_or_default();
        self.body.span = Span::from_range(0..self.pos);
        self.body
    }

    /// Returns the body built so far.
    pub fn body(&self) -> &Body {
        &self.body
    }

    fn next_span(&mut self) -> Span {
        let lo = self.pos;
        self.pos += 1;
        Span::from_range(lo..self.pos)
    }

    fn var(&mut self, name: &str, ty: TypeName, kind: VarKind) -> VarId {
        let span = self.next_span();
        self.body.alloc_var(Variable { name: name.into(), ty, kind, span })
    }

    /// Declares a new method parameter.
    pub fn param(&mut self, name: &str, ty: TypeName) -> VarId {
        let id = self.var(name, ty, VarKind::Param);
        self.body.params.push(id);
        id
    }

    /// Declares a new local variable. Its declaration statement is added separately.
    pub fn local(&mut self, name: &str, ty: TypeName) -> VarId {
        self.var(name, ty, VarKind::Local)
    }

    /// Declares a new catch clause parameter.
    pub fn catch_param(&mut self, name: &str, ty: TypeName) -> VarId {
        self.var(name, ty, VarKind::CatchParam)
    }

    /// Declares a new try-with-resources resource variable.
    pub fn resource(&mut self, name: &str, ty: TypeName) -> VarId {
        self.var(name, ty, VarKind::Resource)
    }

    // Expressions.

    /// Allocates a detached expression.
    pub fn expr(&mut self, kind: ExprKind) -> ExprId {
        let span = self.next_span();
        self.body.alloc_expr(span, kind)
    }

    pub fn lit(&mut self, lit: LitKind) -> ExprId {
        self.expr(ExprKind::Lit(lit))
    }

    pub fn null(&mut self) -> ExprId {
        self.lit(LitKind::Null)
    }

    pub fn bool(&mut self, b: bool) -> ExprId {
        self.lit(LitKind::Bool(b))
    }

    pub fn char(&mut self, c: char) -> ExprId {
        let mut units = [0; 2];
        self.lit(LitKind::Char(c.encode_utf16(&mut units)[0]))
    }

    pub fn int(&mut self, i: i32) -> ExprId {
        self.lit(LitKind::Int(i))
    }

    pub fn long(&mut self, l: i64) -> ExprId {
        self.lit(LitKind::Long(l))
    }

    pub fn float(&mut self, x: f32) -> ExprId {
        self.lit(LitKind::Float(x))
    }

    pub fn double(&mut self, x: f64) -> ExprId {
        self.lit(LitKind::Double(x))
    }

    pub fn str(&mut self, s: &str) -> ExprId {
        self.lit(LitKind::Str(s.into()))
    }

    pub fn ident(&mut self, var: VarId) -> ExprId {
        self.expr(ExprKind::Ident(var))
    }

    /// `receiver.name`, or an implicit `this.name` if `receiver` is `None`.
    pub fn field(&mut self, receiver: Option<ExprId>, name: &str) -> ExprId {
        self.expr(ExprKind::Field { receiver, name: name.into(), is_static: false })
    }

    /// A static field: `Owner.NAME`.
    pub fn static_field(&mut self, name: &str) -> ExprId {
        self.expr(ExprKind::Field { receiver: None, name: name.into(), is_static: true })
    }

    /// `lhs = rhs`
    pub fn assign(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.expr(ExprKind::Assign(lhs, None, rhs))
    }

    /// `lhs op= rhs`
    pub fn assign_op(&mut self, lhs: ExprId, op: BinOpKind, rhs: ExprId) -> ExprId {
        debug_assert!(op.assignable(), "`{op}=` is not an assignment operator");
        self.expr(ExprKind::Assign(lhs, Some(op), rhs))
    }

    pub fn binary(&mut self, lhs: ExprId, op: BinOpKind, rhs: ExprId) -> ExprId {
        self.expr(ExprKind::Binary(lhs, op, rhs))
    }

    pub fn unary(&mut self, op: UnOpKind, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary(op, operand))
    }

    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        self.expr(ExprKind::Paren(inner))
    }

    pub fn ternary(&mut self, cond: ExprId, then: ExprId, els: ExprId) -> ExprId {
        self.expr(ExprKind::Ternary(cond, then, els))
    }

    pub fn call(&mut self, receiver: Option<ExprId>, callee: Callee, args: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Call { receiver, callee, args })
    }

    pub fn new_instance(&mut self, ty: TypeName, args: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::New { ty, args })
    }

    pub fn index(&mut self, array: ExprId, index: ExprId) -> ExprId {
        self.expr(ExprKind::Index(array, index))
    }

    pub fn cast(&mut self, ty: TypeName, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Cast(ty, operand))
    }

    pub fn instance_of(&mut self, operand: ExprId, ty: TypeName) -> ExprId {
        self.expr(ExprKind::InstanceOf(operand, ty))
    }

    // Statements.

    /// Allocates a statement and appends it to the current block.
    pub fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let id = self.detached(kind);
        self.append(id);
        id
    }

    /// Allocates a statement without appending it anywhere.
    pub fn detached(&mut self, kind: StmtKind) -> StmtId {
        let span = self.next_span();
        self.body.alloc_stmt(span, kind)
    }

    /// Appends an already allocated statement to the current block.
    pub fn append(&mut self, stmt: StmtId) {
        if let Some(block) = self.blocks.last_mut() {
            block.push(stmt);
        }
    }

    /// Builds a list of statements with `f`, without appending them to the current block.
    pub fn stmts(&mut self, f: impl FnOnce(&mut Self)) -> Block {
        self.blocks.push(Vec::new());
        f(self);
        self.blocks.pop().unwrap_or_default()
    }

    /// Builds a detached block statement with `f`, for use as a branch or loop body.
    pub fn block(&mut self, f: impl FnOnce(&mut Self)) -> StmtId {
        let stmts = self.stmts(f);
        self.detached(StmtKind::Block(stmts))
    }

    pub fn decl(&mut self, var: VarId, init: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Decl(var, init))
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn if_stmt(&mut self, cond: ExprId, then: StmtId, els: Option<StmtId>) -> StmtId {
        self.stmt(StmtKind::If(cond, then, els))
    }

    pub fn while_stmt(&mut self, cond: ExprId, body: StmtId) -> StmtId {
        self.stmt(StmtKind::While(cond, body))
    }

    pub fn do_while(&mut self, body: StmtId, cond: ExprId) -> StmtId {
        self.stmt(StmtKind::DoWhile(body, cond))
    }

    pub fn for_stmt(
        &mut self,
        init: Block,
        cond: Option<ExprId>,
        update: Vec<ExprId>,
        body: StmtId,
    ) -> StmtId {
        self.stmt(StmtKind::For { init, cond, update, body })
    }

    pub fn for_each(&mut self, var: VarId, iterable: ExprId, body: StmtId) -> StmtId {
        self.stmt(StmtKind::ForEach { var, iterable, body })
    }

    /// Builds a `case` group. Empty `labels` make a `default` group.
    pub fn case(&mut self, labels: Vec<ExprId>, f: impl FnOnce(&mut Self)) -> SwitchCase {
        let body = self.stmts(f);
        SwitchCase { span: self.next_span(), labels, body }
    }

    pub fn switch(&mut self, selector: ExprId, cases: Vec<SwitchCase>) -> StmtId {
        self.stmt(StmtKind::Switch { selector, cases })
    }

    /// Builds a catch clause.
    pub fn catch(&mut self, param: VarId, f: impl FnOnce(&mut Self)) -> CatchClause {
        let block = self.stmts(f);
        CatchClause { span: self.next_span(), param, block }
    }

    pub fn try_stmt(
        &mut self,
        resources: Block,
        block: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    ) -> StmtId {
        self.stmt(StmtKind::Try(StmtTry { resources, block, catches, finally }))
    }

    pub fn throw(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Throw(expr))
    }

    pub fn assert(&mut self, cond: ExprId, msg: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Assert(cond, msg))
    }

    pub fn return_stmt(&mut self, expr: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return(expr))
    }

    pub fn break_stmt(&mut self) -> StmtId {
        self.stmt(StmtKind::Break)
    }

    pub fn continue_stmt(&mut self) -> StmtId {
        self.stmt(StmtKind::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks() {
        // while (c) { x = 1; }  return;
        let mut b = BodyBuilder::new("f");
        let c = b.param("c", TypeName::BOOLEAN);
        let x = b.local("x", TypeName::INT);
        let cond = b.ident(c);
        let body = b.block(|b| {
            let lhs = b.ident(x);
            let one = b.int(1);
            let assign = b.assign(lhs, one);
            b.expr_stmt(assign);
        });
        let w = b.while_stmt(cond, body);
        let ret = b.return_stmt(None);
        let f = b.finish();

        assert_eq!(f.params, [c]);
        assert_eq!(f.block, [w, ret]);
        let StmtKind::Block(inner) = &f.stmt(body).kind else { panic!() };
        assert_eq!(inner.len(), 1);
        assert!(f.validate().is_ok());
        assert_ne!(f.expr(cond).span, f.stmt(w).span);
    }
}
