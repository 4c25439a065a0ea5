use crate::{
    value::{Value, ValueKind},
    writes::written_locals,
};
use derive_more::Deref;
use kiln_ast::ast::{
    BinOpKind, Body, ExprId, ExprKind, NodeId, StmtId, StmtKind, TypeName, UnOpKind, VarId,
};
use kiln_data_structures::map::FxHashMap;
use kiln_interface::{
    Span,
    diagnostics::{DiagCtxt, ErrorGuaranteed},
    error_code,
};
use std::fmt;

const RECURSION_LIMIT: usize = 64;

/// The abstract machine state at one program point: the known values of local variables.
///
/// Variables without a binding are [`Unknown`](Value::Unknown).
#[derive(Clone, Debug, Default, Deref)]
pub struct EvalContext {
    bindings: FxHashMap<VarId, Value>,
}

impl EvalContext {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value of the variable.
    pub fn get(&self, var: VarId) -> Value {
        self.bindings.get(&var).cloned().unwrap_or_default()
    }

    /// Binds the variable to a new value.
    pub fn bind(&mut self, var: VarId, value: Value) {
        if value.is_known() {
            self.bindings.insert(var, value);
        } else {
            self.bindings.remove(&var);
        }
    }

    /// Forgets the values of the given variables.
    pub fn invalidate(&mut self, vars: impl IntoIterator<Item = VarId>) {
        for var in vars {
            self.bindings.remove(&var);
        }
    }

    /// Merges the state of another control flow path into this one.
    ///
    /// Variables bound to different values on the two paths become unknown.
    pub fn join(&mut self, other: &Self) {
        self.bindings.retain(|var, value| other.bindings.get(var).is_some_and(|o| value.identical(o)));
    }
}

/// Evaluates expressions and statements of a method body against an [`EvalContext`].
///
/// This is a best-effort folder, not an interpreter: anything that is not a local variable,
/// literal or operator evaluates to [`Unknown`](Value::Unknown). Control flow that may run a
/// statement any number of times forgets every local that the statement writes.
pub struct ConstantEvaluator<'a> {
    pub body: &'a Body,
    pub dcx: &'a DiagCtxt,
    cx: EvalContext,
    depth: usize,
    observed: Option<FxHashMap<ExprId, Value>>,
    /// The joined contexts at the `continue` statements of each enclosing loop, innermost last.
    continues: Vec<Option<EvalContext>>,
}

pub type EvalResult<T> = Result<T, EvalError>;

impl<'a> ConstantEvaluator<'a> {
    /// Creates a new constant evaluator with an empty context.
    pub fn new(body: &'a Body, dcx: &'a DiagCtxt) -> Self {
        Self { body, dcx, cx: EvalContext::new(), depth: 0, observed: None, continues: Vec::new() }
    }

    /// Returns the current context.
    pub fn context(&self) -> &EvalContext {
        &self.cx
    }

    /// Returns the current context mutably.
    pub fn context_mut(&mut self) -> &mut EvalContext {
        &mut self.cx
    }

    /// Replaces the current context, returning the previous one.
    pub fn replace_context(&mut self, cx: EvalContext) -> EvalContext {
        std::mem::replace(&mut self.cx, cx)
    }

    /// Starts recording the value of every evaluated expression.
    pub fn record_values(&mut self) {
        self.observed = Some(FxHashMap::default());
    }

    /// Returns the recorded values and stops recording.
    ///
    /// An expression evaluated more than once maps to the join of its values, so a known value
    /// holds on every evaluation.
    pub fn take_values(&mut self) -> FxHashMap<ExprId, Value> {
        self.observed.take().unwrap_or_default()
    }

    /// Evaluates the given expression, emitting an error diagnostic if it fails.
    pub fn eval_expr(&mut self, id: ExprId) -> Result<Value, ErrorGuaranteed> {
        self.try_eval_expr(id).map_err(|err| self.emit_eval_error(id.into(), err))
    }

    /// Evaluates the given statement, emitting an error diagnostic if it fails.
    pub fn eval_stmt(&mut self, id: StmtId) -> Result<(), ErrorGuaranteed> {
        self.try_eval_stmt(id).map_err(|err| self.emit_eval_error(id.into(), err))
    }

    /// Evaluates the given statements in order, emitting an error diagnostic if one fails.
    pub fn eval_block(&mut self, block: &[StmtId]) -> Result<(), ErrorGuaranteed> {
        block.iter().try_for_each(|&stmt| self.eval_stmt(stmt))
    }

    /// Evaluates the given expression, returning an error if it fails.
    pub fn try_eval_expr(&mut self, id: ExprId) -> EvalResult<Value> {
        let span = self.body.expr(id).span;
        self.depth += 1;
        if self.depth > RECURSION_LIMIT {
            self.depth -= 1;
            return Err(EE::RecursionLimitReached.spanned(span));
        }
        let mut res = self.eval_expr_kind(id);
        self.depth -= 1;
        match &mut res {
            Ok(value) => {
                if let Some(observed) = &mut self.observed {
                    observed
                        .entry(id)
                        .and_modify(|old| *old = std::mem::take(old).join(value))
                        .or_insert_with(|| value.clone());
                }
            }
            Err(e) if e.span.is_dummy() => e.span = span,
            Err(_) => {}
        }
        res
    }

    /// Evaluates the given statement, returning an error if it fails.
    pub fn try_eval_stmt(&mut self, id: StmtId) -> EvalResult<()> {
        let mut res = self.eval_stmt_kind(id);
        if let Err(e) = &mut res
            && e.span.is_dummy()
        {
            e.span = self.body.stmt(id).span;
        }
        res
    }

    /// Evaluates the given statements in order, returning an error if one fails.
    pub fn try_eval_block(&mut self, block: &[StmtId]) -> EvalResult<()> {
        block.iter().try_for_each(|&stmt| self.try_eval_stmt(stmt))
    }

    /// Emits a diagnostic for the given evaluation error.
    pub fn emit_eval_error(&self, node: NodeId, err: EvalError) -> ErrorGuaranteed {
        let msg = format!("failed to evaluate constant: {}", err.kind);
        let label = "evaluation of constant value failed here";
        self.dcx
            .err(msg)
            .code(error_code!(E0201))
            .span(self.body.node_span(node))
            .span_label(err.span, label)
            .emit()
    }

    fn eval_expr_kind(&mut self, id: ExprId) -> EvalResult<Value> {
        let body = self.body;
        let expr = body.expr(id);
        match expr.kind {
            ExprKind::Lit(ref lit) => Ok(Value::from_lit(lit)),
            ExprKind::Ident(var) => Ok(self.cx.get(var)),
            ExprKind::Paren(inner) => self.try_eval_expr(inner),
            ExprKind::Assign(lhs, op, rhs) => self.eval_assign(lhs, op, rhs),
            ExprKind::Binary(lhs, op, rhs) if op.is_short_circuit() => {
                let l = self.try_eval_expr(lhs)?;
                match (op, l.as_bool()) {
                    (BinOpKind::And, Some(false)) | (BinOpKind::Or, Some(true)) => Ok(l),
                    (_, Some(_)) => {
                        let r = self.try_eval_expr(rhs)?;
                        Value::binary(op, &l, &r)
                    }
                    (_, None) if l.is_known() => {
                        let r = self.try_eval_expr(rhs)?;
                        Value::binary(op, &l, &r)
                    }
                    // The right operand may or may not run.
                    (_, None) => {
                        let skipped = self.cx.clone();
                        self.try_eval_expr(rhs)?;
                        self.cx.join(&skipped);
                        Ok(Value::Unknown)
                    }
                }
            }
            ExprKind::Binary(lhs, op, rhs) => {
                let l = self.try_eval_expr(lhs)?;
                let r = self.try_eval_expr(rhs)?;
                if matches!(op, BinOpKind::Eq | BinOpKind::Ne)
                    && matches!((&l, &r), (Value::Str(_), Value::Str(_)))
                {
                    self.dcx
                        .warn(format!("comparing strings with `{op}` compares their identity"))
                        .span(expr.span)
                        .help("use `equals` to compare the contents of strings")
                        .emit();
                }
                Value::binary(op, &l, &r)
            }
            ExprKind::Unary(op, operand) if op.has_side_effects() => self.eval_inc_dec(op, operand),
            ExprKind::Unary(op, operand) => {
                let v = self.try_eval_expr(operand)?;
                Value::unary(op, &v)
            }
            ExprKind::Ternary(cond, then, els) => {
                let value = match self.try_eval_expr(cond)? {
                    Value::Bool(true) => self.try_eval_expr(then)?,
                    Value::Bool(false) => self.try_eval_expr(els)?,
                    Value::Unknown => {
                        let entry = self.cx.clone();
                        let t = self.try_eval_expr(then)?;
                        let after_then = self.replace_context(entry);
                        let f = self.try_eval_expr(els)?;
                        self.cx.join(&after_then);
                        t.join(&f)
                    }
                    c => return Err(EE::NonBooleanCondition(c.kind()).into()),
                };
                // Numeric arms are promoted to a common type.
                Ok(match body.static_ty(id) {
                    Some(TypeName::Prim(ty)) if ty.is_numeric() => value.convert(ty),
                    Some(_) => value,
                    None if value.is_numeric() => Value::Unknown,
                    None => value,
                })
            }
            ExprKind::Field { .. }
            | ExprKind::Call { .. }
            | ExprKind::New { .. }
            | ExprKind::Index(..)
            | ExprKind::Cast(..)
            | ExprKind::InstanceOf(..) => {
                for child in expr.kind.children() {
                    self.try_eval_expr(child)?;
                }
                Ok(Value::Unknown)
            }
            ExprKind::Err => Ok(Value::Unknown),
        }
    }

    fn eval_assign(&mut self, lhs: ExprId, op: Option<BinOpKind>, rhs: ExprId) -> EvalResult<Value> {
        let Some(var) = self.body.local_target(lhs) else {
            self.eval_place(lhs)?;
            self.try_eval_expr(rhs)?;
            return Ok(Value::Unknown);
        };
        let value = match op {
            None => self.try_eval_expr(rhs)?,
            Some(op) => {
                let old = self.cx.get(var);
                let r = self.try_eval_expr(rhs)?;
                Value::binary(op, &old, &r)?
            }
        };
        Ok(self.assign_local(var, value))
    }

    fn eval_inc_dec(&mut self, op: UnOpKind, operand: ExprId) -> EvalResult<Value> {
        let Some(var) = self.body.local_target(operand) else {
            self.eval_place(operand)?;
            return Ok(Value::Unknown);
        };
        let old = self.cx.get(var);
        if old.is_known() && !old.is_numeric() {
            return Err(EE::UnaryMismatch { op, operand: old.kind() }.into());
        }
        let bin_op = if op.is_increment() { BinOpKind::Add } else { BinOpKind::Sub };
        let new = Value::binary(bin_op, &old, &Value::Int(1))?;
        let new = self.assign_local(var, new);
        Ok(if op.is_prefix() { new } else { old })
    }

    /// Evaluates the operands of a field or array element assignment target.
    fn eval_place(&mut self, place: ExprId) -> EvalResult<()> {
        let place = self.body.peel_parens(place);
        match self.body.expr(place).kind {
            ExprKind::Field { receiver, .. } => {
                if let Some(receiver) = receiver {
                    self.try_eval_expr(receiver)?;
                }
                Ok(())
            }
            ExprKind::Index(array, index) => {
                self.try_eval_expr(array)?;
                self.try_eval_expr(index)?;
                Ok(())
            }
            _ => Err(EE::NotAnLvalue.into()),
        }
    }

    /// Binds a local to a value converted to the local's declared type.
    fn assign_local(&mut self, var: VarId, value: Value) -> Value {
        let value = match self.body.var(var).ty.as_prim() {
            Some(prim) => value.convert(prim),
            None => value,
        };
        self.cx.bind(var, value.clone());
        value
    }

    fn eval_stmt_kind(&mut self, id: StmtId) -> EvalResult<()> {
        let body = self.body;
        match &body.stmt(id).kind {
            &StmtKind::Decl(var, init) => {
                let value = match init {
                    Some(init) => self.try_eval_expr(init)?,
                    None => Value::Unknown,
                };
                self.assign_local(var, value);
            }
            &StmtKind::Expr(expr) | &StmtKind::Throw(expr) => {
                self.try_eval_expr(expr)?;
            }
            StmtKind::Return(expr) => {
                if let Some(expr) = *expr {
                    self.try_eval_expr(expr)?;
                }
            }
            StmtKind::Block(block) => self.try_eval_block(block)?,
            &StmtKind::If(cond, then, els) => match self.try_eval_expr(cond)? {
                Value::Bool(true) => self.try_eval_stmt(then)?,
                Value::Bool(false) => {
                    if let Some(els) = els {
                        self.try_eval_stmt(els)?;
                    }
                }
                Value::Unknown => {
                    let entry = self.cx.clone();
                    self.try_eval_stmt(then)?;
                    let after_then = self.replace_context(entry);
                    if let Some(els) = els {
                        self.try_eval_stmt(els)?;
                    }
                    self.cx.join(&after_then);
                }
                c => return Err(EE::NonBooleanCondition(c.kind()).into()),
            },
            // Assertions may be disabled, and the message only runs when one fails.
            StmtKind::Assert(cond, msg) => {
                let entry = self.cx.clone();
                self.try_eval_expr(*cond)?;
                if let Some(msg) = *msg {
                    let passed = self.cx.clone();
                    self.try_eval_expr(msg)?;
                    self.cx = passed;
                }
                self.cx.join(&entry);
            }
            StmtKind::While(..)
            | StmtKind::DoWhile(..)
            | StmtKind::For { .. }
            | StmtKind::ForEach { .. } => self.eval_loop(id)?,
            StmtKind::Switch { selector, cases } => {
                self.try_eval_expr(*selector)?;
                let writes = written_locals(body, id);
                self.cx.invalidate(writes.iter());
                let entry = self.cx.clone();
                for case in cases {
                    for &label in &case.labels {
                        self.try_eval_expr(label)?;
                    }
                    self.cx = entry.clone();
                    self.try_eval_block(&case.body)?;
                }
                self.cx = entry;
            }
            StmtKind::Try(try_) => {
                let writes = written_locals(body, id);
                self.cx.invalidate(writes.iter());
                let entry = self.cx.clone();
                self.try_eval_block(&try_.resources)?;
                self.try_eval_block(&try_.block)?;
                for catch in &try_.catches {
                    self.cx = entry.clone();
                    self.try_eval_block(&catch.block)?;
                }
                if let Some(finally) = &try_.finally {
                    self.cx = entry.clone();
                    self.try_eval_block(finally)?;
                }
                self.cx = entry;
            }
            StmtKind::Continue => {
                if let Some(continued) = self.continues.last_mut() {
                    match continued {
                        Some(cx) => cx.join(&self.cx),
                        None => *continued = Some(self.cx.clone()),
                    }
                }
            }
            StmtKind::Break | StmtKind::Empty | StmtKind::Err => {}
        }
        Ok(())
    }

    /// Evaluates one iteration of a loop in a context that forgets everything the loop writes.
    ///
    /// Breaking out of the loop needs no tracking: the context after the loop forgets the loop's
    /// writes, and the other locals are the same on every path.
    fn eval_loop(&mut self, id: StmtId) -> EvalResult<()> {
        let body = self.body;
        let writes = written_locals(body, id);
        match &body.stmt(id).kind {
            StmtKind::For { init, cond, update, body: stmt } => {
                self.try_eval_block(init)?;
                self.cx.invalidate(writes.iter());
                if let Some(cond) = *cond {
                    self.try_eval_expr(cond)?;
                }
                self.eval_loop_body(*stmt)?;
                for &update in update {
                    self.try_eval_expr(update)?;
                }
            }
            &StmtKind::ForEach { iterable, body: stmt, .. } => {
                self.try_eval_expr(iterable)?;
                self.cx.invalidate(writes.iter());
                self.eval_loop_body(stmt)?;
            }
            &StmtKind::While(cond, stmt) => {
                self.cx.invalidate(writes.iter());
                self.try_eval_expr(cond)?;
                self.eval_loop_body(stmt)?;
            }
            &StmtKind::DoWhile(stmt, cond) => {
                self.cx.invalidate(writes.iter());
                self.eval_loop_body(stmt)?;
                self.try_eval_expr(cond)?;
            }
            _ => {}
        }
        self.cx.invalidate(writes.iter());
        Ok(())
    }

    /// Evaluates the body of a loop, ending in the join of the contexts that reach the next
    /// iteration: the end of the body and every `continue`.
    fn eval_loop_body(&mut self, stmt: StmtId) -> EvalResult<()> {
        self.continues.push(None);
        let res = self.try_eval_stmt(stmt);
        let continued = self.continues.pop().flatten();
        res?;
        if let Some(continued) = continued {
            self.cx.join(&continued);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum EvalErrorKind {
    RecursionLimitReached,
    DivisionByZero,
    UnaryMismatch { op: UnOpKind, operand: Option<ValueKind> },
    BinaryMismatch { op: BinOpKind, lhs: Option<ValueKind>, rhs: Option<ValueKind> },
    NonBooleanCondition(Option<ValueKind>),
    MutatedValue(UnOpKind),
    NotAnLvalue,
}
pub(crate) use EvalErrorKind as EE;

impl EvalErrorKind {
    pub fn spanned(self, span: Span) -> EvalError {
        EvalError { kind: self, span }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn kind(k: &Option<ValueKind>) -> &'static str {
            k.map_or("unknown", Into::into)
        }

        match self {
            Self::RecursionLimitReached => f.write_str("recursion limit reached"),
            Self::DivisionByZero => f.write_str("attempted to divide by zero"),
            Self::UnaryMismatch { op, operand } => {
                write!(f, "unsupported unary operation `{op}` on {}", kind(operand))
            }
            Self::BinaryMismatch { op, lhs, rhs } => {
                write!(f, "unsupported binary operation {} `{op}` {}", kind(lhs), kind(rhs))
            }
            Self::NonBooleanCondition(k) => write!(f, "condition is {}, not boolean", kind(k)),
            Self::MutatedValue(op) => write!(f, "cannot apply `{op}` to a value"),
            Self::NotAnLvalue => f.write_str("assignment target is not a variable"),
        }
    }
}

#[derive(Debug)]
pub struct EvalError {
    pub span: Span,
    pub kind: EvalErrorKind,
}

impl From<EE> for EvalError {
    fn from(value: EE) -> Self {
        Self { kind: value, span: Span::DUMMY }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for EvalError {}
