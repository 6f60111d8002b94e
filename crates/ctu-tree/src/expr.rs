// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Typed expression nodes.

use num_bigint::BigInt;

use crate::{DeclId, Span, Type};

/// An expression together with its resolved type.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub span: Span,
}

/// The kind of expression.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal
    Digit(BigInt),
    /// Boolean literal
    Bool(bool),
    /// String literal
    String(String),
    /// Storage of a global, by identity (not its value)
    Global(DeclId),
    /// A function, by identity
    Function(DeclId),
    /// Storage of a function-local variable
    Local(DeclId),
    /// The n-th parameter of the enclosing function
    Param(usize),
    /// Read the value held by a storage expression
    Load(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Conversion to the node's own type
    Cast(Box<Expr>),
    /// Element of an array
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// Array literal
    Array(Vec<Expr>),
    /// A node semantic analysis could not resolve
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Abs,
    Neg,
    /// Bitwise complement
    Flip,
    /// Logical not
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    BitAnd,
    BitOr,
    Xor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Abs => "abs",
            UnaryOp::Neg => "-",
            UnaryOp::Flip => "~",
            UnaryOp::Not => "!",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

// Constructors used by frontends and fixtures. Spans default to `DUMMY`;
// use `at` to attach a real one.
impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Expr {
            kind,
            ty,
            span: Span::DUMMY,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn digit(value: impl Into<BigInt>, ty: Type) -> Self {
        Expr::new(ExprKind::Digit(value.into()), ty)
    }

    pub fn int(value: i64) -> Self {
        Expr::digit(value, Type::int())
    }

    pub fn bool(value: bool) -> Self {
        Expr::new(ExprKind::Bool(value), Type::Bool)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::String(value.into()), Type::String)
    }

    pub fn global(id: DeclId, ty: Type) -> Self {
        Expr::new(ExprKind::Global(id), ty)
    }

    pub fn function(id: DeclId, ty: Type) -> Self {
        Expr::new(ExprKind::Function(id), ty)
    }

    pub fn local(id: DeclId, ty: Type) -> Self {
        Expr::new(ExprKind::Local(id), ty)
    }

    pub fn param(index: usize, ty: Type) -> Self {
        Expr::new(ExprKind::Param(index), ty)
    }

    /// Load the value of a storage expression; the result has the storage's type.
    pub fn load(storage: Expr) -> Self {
        let ty = storage.ty.clone();
        Expr::new(ExprKind::Load(Box::new(storage)), ty)
    }

    pub fn unary(op: UnaryOp, operand: Expr, ty: Type) -> Self {
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: Type) -> Self {
        Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        )
    }

    pub fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::new(
            ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Type::Bool,
        )
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        let ty = callee.ty.result().cloned().unwrap_or(Type::Void);
        Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            ty,
        )
    }

    pub fn cast(expr: Expr, ty: Type) -> Self {
        Expr::new(ExprKind::Cast(Box::new(expr)), ty)
    }

    pub fn index(array: Expr, index: Expr) -> Self {
        let ty = array.ty.element().cloned().unwrap_or(Type::Void);
        Expr::new(
            ExprKind::Index {
                array: Box::new(array),
                index: Box::new(index),
            },
            ty,
        )
    }

    pub fn array(element: Type, elements: Vec<Expr>) -> Self {
        let ty = Type::array(element, elements.len());
        Expr::new(ExprKind::Array(elements), ty)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Expr::new(ExprKind::Error(message.into()), Type::Void)
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Digit(_) => "digit literal",
            ExprKind::Bool(_) => "bool literal",
            ExprKind::String(_) => "string literal",
            ExprKind::Global(_) => "global",
            ExprKind::Function(_) => "function",
            ExprKind::Local(_) => "local",
            ExprKind::Param(_) => "parameter",
            ExprKind::Load(_) => "load",
            ExprKind::Unary { .. } => "unary",
            ExprKind::Binary { .. } => "binary",
            ExprKind::Compare { .. } => "compare",
            ExprKind::Call { .. } => "call",
            ExprKind::Cast(_) => "cast",
            ExprKind::Index { .. } => "index",
            ExprKind::Array(_) => "array literal",
            ExprKind::Error(_) => "error",
        }
    }
}
