//! Body pretty-printing.

use crate::ast::*;
use std::fmt::{self, Write};

/// Formats the whole body as source code.
pub fn body_to_string(body: &Body) -> String {
    let mut s = String::new();
    let _ = Printer::new(&mut s, body).print_body();
    s
}

/// Formats a single expression as source code.
pub fn expr_to_string(body: &Body, id: ExprId) -> String {
    let mut s = String::new();
    let _ = Printer::new(&mut s, body).print_expr(id);
    s
}

/// Formats a single statement as source code.
pub fn stmt_to_string(body: &Body, id: StmtId) -> String {
    let mut s = String::new();
    let _ = Printer::new(&mut s, body).print_stmt(id);
    s
}

const PREC_ASSIGN: u8 = 1;
const PREC_TERNARY: u8 = 2;
const PREC_INSTANCEOF: u8 = 9;
const PREC_PREFIX: u8 = 13;
const PREC_POSTFIX: u8 = 14;
const PREC_PRIMARY: u8 = 15;

/// Body pretty-printer.
///
/// Prints Java-like source code. Parentheses are inserted where the tree shape requires them,
/// in addition to the explicit [`Paren`](ExprKind::Paren) nodes.
#[derive(Debug)]
pub struct Printer<'a, W> {
    writer: W,
    body: &'a Body,
    indent: usize,
}

impl<'a, W> Printer<'a, W> {
    /// Creates a new printer with the given writer.
    pub fn new(writer: W, body: &'a Body) -> Self {
        Self { writer, body, indent: 0 }
    }
}

impl<W: Write> Printer<'_, W> {
    /// Prints the method body as a block.
    pub fn print_body(&mut self) -> fmt::Result {
        let body = self.body;
        self.print_block(&body.block)
    }

    /// Prints `{`, the statements on their own lines, and `}`.
    pub fn print_block(&mut self, block: &[StmtId]) -> fmt::Result {
        if block.is_empty() {
            return self.writer.write_str("{}");
        }
        self.writer.write_char('{')?;
        self.indent += 1;
        for &stmt in block {
            self.newline()?;
            self.print_stmt(stmt)?;
        }
        self.indent -= 1;
        self.newline()?;
        self.writer.write_char('}')
    }

    /// Prints a single statement.
    pub fn print_stmt(&mut self, id: StmtId) -> fmt::Result {
        let body = self.body;
        match &body.stmt(id).kind {
            StmtKind::Decl(..) => {
                self.print_decl(id)?;
                self.writer.write_char(';')
            }
            StmtKind::Expr(expr) => {
                self.print_expr(*expr)?;
                self.writer.write_char(';')
            }
            StmtKind::Block(block) => self.print_block(block),
            StmtKind::If(cond, then, els) => {
                self.writer.write_str("if (")?;
                self.print_expr(*cond)?;
                self.writer.write_char(')')?;
                self.print_nested(*then)?;
                if let Some(els) = *els {
                    if matches!(body.stmt(*then).kind, StmtKind::Block(_)) {
                        self.writer.write_char(' ')?;
                    } else {
                        self.newline()?;
                    }
                    self.writer.write_str("else")?;
                    if matches!(body.stmt(els).kind, StmtKind::If(..)) {
                        self.writer.write_char(' ')?;
                        self.print_stmt(els)?;
                    } else {
                        self.print_nested(els)?;
                    }
                }
                Ok(())
            }
            StmtKind::While(cond, stmt) => {
                self.writer.write_str("while (")?;
                self.print_expr(*cond)?;
                self.writer.write_char(')')?;
                self.print_nested(*stmt)
            }
            StmtKind::DoWhile(stmt, cond) => {
                self.writer.write_str("do")?;
                self.print_nested(*stmt)?;
                if matches!(body.stmt(*stmt).kind, StmtKind::Block(_)) {
                    self.writer.write_char(' ')?;
                } else {
                    self.newline()?;
                }
                self.writer.write_str("while (")?;
                self.print_expr(*cond)?;
                self.writer.write_str(");")
            }
            StmtKind::For { init, cond, update, body: stmt } => {
                self.writer.write_str("for (")?;
                self.print_comma_separated(init, |this, &s| match this.body.stmt(s).kind {
                    StmtKind::Decl(..) => this.print_decl(s),
                    StmtKind::Expr(e) => this.print_expr(e),
                    _ => this.print_stmt(s),
                })?;
                self.writer.write_char(';')?;
                if let Some(cond) = *cond {
                    self.writer.write_char(' ')?;
                    self.print_expr(cond)?;
                }
                self.writer.write_char(';')?;
                if !update.is_empty() {
                    self.writer.write_char(' ')?;
                    self.print_comma_separated(update, |this, &e| this.print_expr(e))?;
                }
                self.writer.write_char(')')?;
                self.print_nested(*stmt)
            }
            StmtKind::ForEach { var, iterable, body: stmt } => {
                let var = body.var(*var);
                write!(self.writer, "for ({} {} : ", var.ty, var.name)?;
                self.print_expr(*iterable)?;
                self.writer.write_char(')')?;
                self.print_nested(*stmt)
            }
            StmtKind::Switch { selector, cases } => {
                self.writer.write_str("switch (")?;
                self.print_expr(*selector)?;
                self.writer.write_str(") {")?;
                for case in cases {
                    self.newline()?;
                    if case.is_default() {
                        self.writer.write_str("default:")?;
                    } else {
                        self.writer.write_str("case ")?;
                        self.print_comma_separated(&case.labels, |this, &e| this.print_expr(e))?;
                        self.writer.write_char(':')?;
                    }
                    self.indent += 1;
                    for &stmt in &case.body {
                        self.newline()?;
                        self.print_stmt(stmt)?;
                    }
                    self.indent -= 1;
                }
                self.newline()?;
                self.writer.write_char('}')
            }
            StmtKind::Try(try_) => {
                self.writer.write_str("try ")?;
                if !try_.resources.is_empty() {
                    self.writer.write_char('(')?;
                    for (i, &res) in try_.resources.iter().enumerate() {
                        if i > 0 {
                            self.writer.write_str("; ")?;
                        }
                        self.print_decl(res)?;
                    }
                    self.writer.write_str(") ")?;
                }
                self.print_block(&try_.block)?;
                for catch in &try_.catches {
                    let param = body.var(catch.param);
                    write!(self.writer, " catch ({} {}) ", param.ty, param.name)?;
                    self.print_block(&catch.block)?;
                }
                if let Some(finally) = &try_.finally {
                    self.writer.write_str(" finally ")?;
                    self.print_block(finally)?;
                }
                Ok(())
            }
            StmtKind::Throw(expr) => {
                self.writer.write_str("throw ")?;
                self.print_expr(*expr)?;
                self.writer.write_char(';')
            }
            StmtKind::Assert(cond, msg) => {
                self.writer.write_str("assert ")?;
                self.print_expr(*cond)?;
                if let Some(msg) = *msg {
                    self.writer.write_str(" : ")?;
                    self.print_expr(msg)?;
                }
                self.writer.write_char(';')
            }
            StmtKind::Return(expr) => {
                self.writer.write_str("return")?;
                if let Some(expr) = *expr {
                    self.writer.write_char(' ')?;
                    self.print_expr(expr)?;
                }
                self.writer.write_char(';')
            }
            StmtKind::Break => self.writer.write_str("break;"),
            StmtKind::Continue => self.writer.write_str("continue;"),
            StmtKind::Empty => self.writer.write_char(';'),
            StmtKind::Err => self.writer.write_str("/* error */;"),
        }
    }

    /// Prints a single expression.
    pub fn print_expr(&mut self, id: ExprId) -> fmt::Result {
        self.print_expr_prec(id, 0)
    }

    fn print_expr_prec(&mut self, id: ExprId, min_prec: u8) -> fmt::Result {
        let paren = self.precedence(id) < min_prec;
        if paren {
            self.writer.write_char('(')?;
        }
        self.print_expr_kind(id)?;
        if paren {
            self.writer.write_char(')')?;
        }
        Ok(())
    }

    fn print_expr_kind(&mut self, id: ExprId) -> fmt::Result {
        let body = self.body;
        match &body.expr(id).kind {
            ExprKind::Lit(lit) => write!(self.writer, "{lit}"),
            ExprKind::Ident(var) => self.writer.write_str(&body.var(*var).name),
            ExprKind::Field { receiver, name, is_static } => {
                match *receiver {
                    Some(receiver) => {
                        self.print_expr_prec(receiver, PREC_PRIMARY)?;
                        self.writer.write_char('.')?;
                    }
                    None if !is_static => self.writer.write_str("this.")?,
                    None => {}
                }
                self.writer.write_str(name)
            }
            ExprKind::Assign(lhs, op, rhs) => {
                self.print_expr_prec(*lhs, PREC_PREFIX)?;
                self.writer.write_char(' ')?;
                if let Some(op) = op {
                    self.writer.write_str(op.to_str())?;
                }
                self.writer.write_str("= ")?;
                self.print_expr_prec(*rhs, PREC_ASSIGN)
            }
            ExprKind::Binary(lhs, op, rhs) => {
                let prec = op.precedence();
                self.print_expr_prec(*lhs, prec)?;
                write!(self.writer, " {op} ")?;
                self.print_expr_prec(*rhs, prec + 1)
            }
            ExprKind::Unary(op, operand) => {
                if op.is_postfix() {
                    self.print_expr_prec(*operand, PREC_POSTFIX)?;
                    return self.writer.write_str(op.to_str());
                }
                self.writer.write_str(op.to_str())?;
                if self.starts_with_sign(*operand, op.to_str()) {
                    self.writer.write_char(' ')?;
                }
                self.print_expr_prec(*operand, PREC_PREFIX)
            }
            ExprKind::Paren(inner) => {
                self.writer.write_char('(')?;
                self.print_expr(*inner)?;
                self.writer.write_char(')')
            }
            ExprKind::Ternary(cond, then, els) => {
                self.print_expr_prec(*cond, PREC_TERNARY + 1)?;
                self.writer.write_str(" ? ")?;
                self.print_expr_prec(*then, PREC_ASSIGN)?;
                self.writer.write_str(" : ")?;
                self.print_expr_prec(*els, PREC_TERNARY)
            }
            ExprKind::Call { receiver, callee, args } => {
                if let Some(receiver) = *receiver {
                    self.print_expr_prec(receiver, PREC_PRIMARY)?;
                    self.writer.write_char('.')?;
                }
                self.writer.write_str(&callee.name)?;
                self.print_args(args)
            }
            ExprKind::New { ty, args } => {
                write!(self.writer, "new {ty}")?;
                self.print_args(args)
            }
            ExprKind::Index(array, index) => {
                self.print_expr_prec(*array, PREC_PRIMARY)?;
                self.writer.write_char('[')?;
                self.print_expr(*index)?;
                self.writer.write_char(']')
            }
            ExprKind::Cast(ty, operand) => {
                write!(self.writer, "({ty}) ")?;
                self.print_expr_prec(*operand, PREC_PREFIX)
            }
            ExprKind::InstanceOf(operand, ty) => {
                self.print_expr_prec(*operand, PREC_INSTANCEOF)?;
                write!(self.writer, " instanceof {ty}")
            }
            ExprKind::Err => self.writer.write_str("/* error */"),
        }
    }

    fn precedence(&self, id: ExprId) -> u8 {
        match &self.body.expr(id).kind {
            ExprKind::Assign(..) => PREC_ASSIGN,
            ExprKind::Ternary(..) => PREC_TERNARY,
            ExprKind::Binary(_, op, _) => op.precedence(),
            ExprKind::InstanceOf(..) => PREC_INSTANCEOF,
            ExprKind::Unary(op, _) if op.is_postfix() => PREC_POSTFIX,
            ExprKind::Unary(..) | ExprKind::Cast(..) => PREC_PREFIX,
            ExprKind::Lit(LitKind::Byte(_) | LitKind::Short(_)) => PREC_PREFIX,
            ExprKind::Lit(lit) if lit.to_string().starts_with('-') => PREC_PREFIX,
            _ => PREC_PRIMARY,
        }
    }

    /// Returns `true` if printing `id` right after `sign` would merge into a different token.
    fn starts_with_sign(&self, id: ExprId, sign: &str) -> bool {
        let Some(c) = sign.chars().next().filter(|c| matches!(c, '+' | '-')) else {
            return false;
        };
        match &self.body.expr(id).kind {
            ExprKind::Unary(op, _) => op.is_prefix() && op.to_str().starts_with(c),
            ExprKind::Lit(lit) => lit.to_string().starts_with(c),
            _ => false,
        }
    }

    fn print_decl(&mut self, id: StmtId) -> fmt::Result {
        let body = self.body;
        let StmtKind::Decl(var, init) = body.stmt(id).kind else {
            return self.print_stmt(id);
        };
        let var = body.var(var);
        write!(self.writer, "{} {}", var.ty, var.name)?;
        if let Some(init) = init {
            self.writer.write_str(" = ")?;
            self.print_expr_prec(init, PREC_ASSIGN)?;
        }
        Ok(())
    }

    fn print_args(&mut self, args: &[ExprId]) -> fmt::Result {
        self.writer.write_char('(')?;
        self.print_comma_separated(args, |this, &e| this.print_expr_prec(e, PREC_ASSIGN))?;
        self.writer.write_char(')')
    }

    /// Prints a branch or loop body after its header.
    fn print_nested(&mut self, id: StmtId) -> fmt::Result {
        if matches!(self.body.stmt(id).kind, StmtKind::Block(_)) {
            self.writer.write_char(' ')?;
            return self.print_stmt(id);
        }
        self.indent += 1;
        self.newline()?;
        self.print_stmt(id)?;
        self.indent -= 1;
        Ok(())
    }

    fn print_comma_separated<T>(
        &mut self,
        items: &[T],
        mut print: impl FnMut(&mut Self, &T) -> fmt::Result,
    ) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.writer.write_str(", ")?;
            }
            print(self, item)?;
        }
        Ok(())
    }

    fn newline(&mut self) -> fmt::Result {
        self.writer.write_char('\n')?;
        for _ in 0..self.indent {
            self.writer.write_str("    ")?;
        }
        Ok(())
    }
}
