use super::{Block, ExprId, StmtId, VarId};
use kiln_data_structures::smallvec::{SmallVec, smallvec};
use kiln_interface::Span;

/// A statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

/// A kind of statement.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// A single local variable declaration: `int foo = 42;`.
    Decl(VarId, Option<ExprId>),

    /// An expression with a trailing semicolon.
    Expr(ExprId),

    /// A blocked scope: `{ ... }`.
    Block(Block),

    /// An `if` statement with an optional `else` branch: `if (expr) { ... } else { ... }`.
    If(ExprId, StmtId, Option<StmtId>),

    /// A while statement: `while (i < 42) { ... }`.
    While(ExprId, StmtId),

    /// A do-while statement: `do { ... } while (condition);`.
    DoWhile(StmtId, ExprId),

    /// A for statement: `for (int i = 0; i < 42; ++i) { ... }`.
    For {
        init: Vec<StmtId>,
        cond: Option<ExprId>,
        update: Vec<ExprId>,
        body: StmtId,
    },

    /// An enhanced for statement: `for (T x : iterable) { ... }`.
    ForEach { var: VarId, iterable: ExprId, body: StmtId },

    /// A switch statement. Cases fall through into the next one unless they jump.
    Switch { selector: ExprId, cases: Vec<SwitchCase> },

    /// A try statement: `try (resources) { ... } catch (E e) { ... } finally { ... }`.
    Try(StmtTry),

    /// A throw statement: `throw e;`.
    Throw(ExprId),

    /// An assert statement: `assert cond : message;`.
    Assert(ExprId, Option<ExprId>),

    /// A return statement: `return 42;`.
    Return(Option<ExprId>),

    /// A break statement: `break;`.
    Break,

    /// A continue statement: `continue;`.
    Continue,

    /// An empty statement: `;`.
    Empty,

    /// An erroneous statement that the producer of the tree could not represent.
    Err,
}

/// A `case` or `default` group of a switch statement.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    pub span: Span,
    /// The case labels. Empty for `default`.
    pub labels: Vec<ExprId>,
    pub body: Block,
}

impl SwitchCase {
    /// Returns `true` if this is the `default` case.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A try statement.
#[derive(Clone, Debug, PartialEq)]
pub struct StmtTry {
    /// Resource declarations of a try-with-resources statement, in order.
    pub resources: Vec<StmtId>,
    /// The protected block.
    pub block: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
}

/// A catch clause: `catch (E e) { ... }`.
#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    pub span: Span,
    pub param: VarId,
    pub block: Block,
}

impl StmtKind {
    /// Returns the expressions directly owned by this statement, in evaluation order.
    ///
    /// Switch case labels are included after the selector.
    pub fn expr_children(&self) -> SmallVec<[ExprId; 4]> {
        match *self {
            Self::Decl(_, init) => init.into_iter().collect(),
            Self::Expr(e) | Self::While(e, _) | Self::DoWhile(_, e) | Self::Throw(e) => {
                smallvec![e]
            }
            Self::If(cond, ..) => smallvec![cond],
            Self::For { cond, ref update, .. } => {
                cond.into_iter().chain(update.iter().copied()).collect()
            }
            Self::ForEach { iterable, .. } => smallvec![iterable],
            Self::Switch { selector, ref cases } => std::iter::once(selector)
                .chain(cases.iter().flat_map(|case| case.labels.iter().copied()))
                .collect(),
            Self::Assert(cond, msg) => std::iter::once(cond).chain(msg).collect(),
            Self::Return(e) => e.into_iter().collect(),
            Self::Block(_)
            | Self::Try(_)
            | Self::Break
            | Self::Continue
            | Self::Empty
            | Self::Err => SmallVec::new(),
        }
    }

    /// Returns the statements directly nested in this statement, in program order.
    pub fn stmt_children(&self) -> SmallVec<[StmtId; 4]> {
        match self {
            Self::Block(block) => block.iter().copied().collect(),
            Self::If(_, then, els) => std::iter::once(*then).chain(*els).collect(),
            Self::While(_, body) | Self::DoWhile(body, _) | Self::ForEach { body, .. } => {
                smallvec![*body]
            }
            Self::For { init, body, .. } => init.iter().copied().chain([*body]).collect(),
            Self::Switch { cases, .. } => {
                cases.iter().flat_map(|case| case.body.iter().copied()).collect()
            }
            Self::Try(t) => t
                .resources
                .iter()
                .chain(&t.block)
                .chain(t.catches.iter().flat_map(|c| &c.block))
                .chain(t.finally.iter().flatten())
                .copied()
                .collect(),
            Self::Decl(..)
            | Self::Expr(_)
            | Self::Throw(_)
            | Self::Assert(..)
            | Self::Return(_)
            | Self::Break
            | Self::Continue
            | Self::Empty
            | Self::Err => SmallVec::new(),
        }
    }

    /// Replaces the expression slot holding `old` with `new`.
    ///
    /// Returns `false` if `old` is not directly owned by this statement.
    pub fn replace_child(&mut self, old: ExprId, new: ExprId) -> bool {
        fn swap(slot: &mut ExprId, old: ExprId, new: ExprId) -> bool {
            if *slot == old {
                *slot = new;
                true
            } else {
                false
            }
        }

        match self {
            Self::Decl(_, init) | Self::Return(init) => {
                init.as_mut().is_some_and(|e| swap(e, old, new))
            }
            Self::Expr(e)
            | Self::If(e, ..)
            | Self::While(e, _)
            | Self::DoWhile(_, e)
            | Self::Throw(e)
            | Self::ForEach { iterable: e, .. } => swap(e, old, new),
            Self::For { cond, update, .. } => {
                cond.as_mut().is_some_and(|e| swap(e, old, new))
                    || update.iter_mut().any(|e| swap(e, old, new))
            }
            Self::Switch { selector, cases } => {
                swap(selector, old, new)
                    || cases.iter_mut().flat_map(|c| &mut c.labels).any(|e| swap(e, old, new))
            }
            Self::Assert(cond, msg) => {
                swap(cond, old, new) || msg.as_mut().is_some_and(|e| swap(e, old, new))
            }
            Self::Block(_)
            | Self::Try(_)
            | Self::Break
            | Self::Continue
            | Self::Empty
            | Self::Err => false,
        }
    }

    /// Returns `true` if this is a loop statement.
    pub fn is_loop(&self) -> bool {
        matches!(self, Self::While(..) | Self::DoWhile(..) | Self::For { .. } | Self::ForEach { .. })
    }

    /// Returns `true` if a `break` directly inside this statement's body targets it.
    pub fn is_breakable(&self) -> bool {
        self.is_loop() || matches!(self, Self::Switch { .. })
    }

    /// Returns a short description of the statement kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Decl(..) => "variable declaration",
            Self::Expr(_) => "expression statement",
            Self::Block(_) => "block",
            Self::If(..) => "`if` statement",
            Self::While(..) => "`while` loop",
            Self::DoWhile(..) => "`do` loop",
            Self::For { .. } => "`for` loop",
            Self::ForEach { .. } => "for-each loop",
            Self::Switch { .. } => "`switch` statement",
            Self::Try(_) => "`try` statement",
            Self::Throw(_) => "`throw` statement",
            Self::Assert(..) => "`assert` statement",
            Self::Return(_) => "`return` statement",
            Self::Break => "`break` statement",
            Self::Continue => "`continue` statement",
            Self::Empty => "empty statement",
            Self::Err => "erroneous statement",
        }
    }
}
