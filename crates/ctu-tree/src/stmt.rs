// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Typed statement nodes.

use crate::expr::Expr;
use crate::Span;

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Sequence of statements
    Block(Vec<Stmt>),
    Assign {
        dst: Expr,
        src: Expr,
    },
    /// if/else
    Branch {
        cond: Expr,
        then: Box<Stmt>,
        other: Option<Box<Stmt>>,
    },
    /// Condition-controlled loop
    Loop {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    /// Expression evaluated for its effect (calls)
    Expr(Expr),
    /// A node semantic analysis could not resolve
    Error(String),
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            span: Span::DUMMY,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::new(StmtKind::Block(stmts))
    }

    pub fn assign(dst: Expr, src: Expr) -> Self {
        Stmt::new(StmtKind::Assign { dst, src })
    }

    pub fn branch(cond: Expr, then: Stmt, other: Option<Stmt>) -> Self {
        Stmt::new(StmtKind::Branch {
            cond,
            then: Box::new(then),
            other: other.map(Box::new),
        })
    }

    pub fn looping(cond: Expr, body: Stmt) -> Self {
        Stmt::new(StmtKind::Loop {
            cond,
            body: Box::new(body),
        })
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::new(StmtKind::Return(value))
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::new(StmtKind::Expr(expr))
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            StmtKind::Block(_) => "block",
            StmtKind::Assign { .. } => "assign",
            StmtKind::Branch { .. } => "branch",
            StmtKind::Loop { .. } => "loop",
            StmtKind::Return(_) => "return",
            StmtKind::Expr(_) => "expression statement",
            StmtKind::Error(_) => "error",
        }
    }
}
