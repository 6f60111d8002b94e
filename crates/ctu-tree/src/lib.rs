// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Typed intermediate representation handed over by semantic analysis.
//!
//! Every node here is already type-checked: expressions carry their resolved
//! type and declarations carry a stable [`DeclId`]. Later stages only read
//! this tree; they never invent a type or rewrite a node.

pub mod span;
pub mod types;
pub mod expr;
pub mod stmt;
pub mod decl;

pub use decl::{Function, Global, Local, Module, Param, TypeDecl, Visibility};
pub use expr::{BinaryOp, CompareOp, Expr, ExprKind, UnaryOp};
pub use span::{LineMap, Span};
pub use stmt::{Stmt, StmtKind};
pub use types::{Digit, Sign, Type};

/// Identity of a declaration (global, function or local).
///
/// Assigned by semantic analysis and unique across all modules of one
/// compilation, so it can key lookup tables that span modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl std::fmt::Display for DeclId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decl#{}", self.0)
    }
}
