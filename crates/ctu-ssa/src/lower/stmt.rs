// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Statement lowering. The cursor names the block new steps go to; control
//! flow statements move it.

use ctu_tree::{Stmt, StmtKind, Type};

use super::{LowerError, Lowerer};
use crate::{BlockId, Operand, StepKind};

impl Lowerer<'_> {
    pub(super) fn stmt(&mut self, stmt: &Stmt, cursor: &mut BlockId) {
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.stmt(stmt, cursor);
                }
            }

            StmtKind::Assign { dst, src } => {
                let dst = self.lvalue(dst, *cursor);
                let src = self.rvalue(src, *cursor);
                self.builder
                    .push(*cursor, StepKind::Store { dst, src }, Type::Void, stmt.span);
            }

            StmtKind::Branch { cond, then, other } => {
                let cond = self.rvalue(cond, *cursor);
                let then_block = self.builder.create_block("then");
                let other_block = other.as_ref().map(|_| self.builder.create_block("other"));
                let tail = self.builder.create_block("tail");

                self.builder.push(
                    *cursor,
                    StepKind::Branch {
                        cond,
                        then: Operand::Block(then_block),
                        other: Operand::Block(other_block.unwrap_or(tail)),
                    },
                    Type::Void,
                    stmt.span,
                );

                self.arm(then, then_block, tail);
                if let (Some(other), Some(other_block)) = (other, other_block) {
                    self.arm(other, other_block, tail);
                }
                *cursor = tail;
            }

            // Post-tested: the condition is checked at the end of the body.
            StmtKind::Loop { cond, body } => {
                let loop_block = self.builder.create_block("loop");
                let tail = self.builder.create_block("tail");

                self.builder.push(
                    *cursor,
                    StepKind::Jump {
                        target: Operand::Block(loop_block),
                    },
                    Type::Void,
                    stmt.span,
                );

                let end = self.nested(body, loop_block);
                let cond = self.rvalue(cond, end);
                self.builder.push(
                    end,
                    StepKind::Branch {
                        cond,
                        then: Operand::Block(loop_block),
                        other: Operand::Block(tail),
                    },
                    Type::Void,
                    stmt.span,
                );
                *cursor = tail;
            }

            StmtKind::Return(value) => {
                let (value, ty) = match value {
                    Some(expr) => (self.rvalue(expr, *cursor), expr.ty.clone()),
                    None => (Operand::Empty, Type::Void),
                };
                self.builder
                    .push(*cursor, StepKind::Return { value }, ty, stmt.span);
            }

            StmtKind::Expr(expr) => {
                self.rvalue(expr, *cursor);
            }

            StmtKind::Error(message) => {
                self.fail(
                    LowerError::Unresolved {
                        message: message.clone(),
                        span: stmt.span,
                    },
                    &Type::Void,
                );
            }
        }
    }

    /// Compile `stmt` starting in `block` with a cursor of its own. The
    /// caller's cursor is untouched; returns the block control ended in.
    fn nested(&mut self, stmt: &Stmt, block: BlockId) -> BlockId {
        let mut cursor = block;
        self.stmt(stmt, &mut cursor);
        cursor
    }

    /// A branch arm: its body, then a jump to the join block.
    fn arm(&mut self, stmt: &Stmt, block: BlockId, join: BlockId) {
        let end = self.nested(stmt, block);
        self.builder.push(
            end,
            StepKind::Jump {
                target: Operand::Block(join),
            },
            Type::Void,
            stmt.span,
        );
    }
}
