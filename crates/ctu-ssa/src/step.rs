// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Steps: the instructions of a block.

use ctu_tree::{BinaryOp, CompareOp, Span, Type, UnaryOp};

use crate::Operand;

/// One instruction. Its position in the block is its register.
#[derive(Debug, Clone)]
pub struct Step {
    pub kind: StepKind,
    /// Type of the produced value; `Void` for steps that produce none.
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StepKind {
    Unary {
        op: UnaryOp,
        operand: Operand,
    },
    Binary {
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },
    Compare {
        op: CompareOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// Read the value held by a storage operand
    Load {
        src: Operand,
    },
    Store {
        dst: Operand,
        src: Operand,
    },
    /// Element storage `index` elements past `array`
    Offset {
        array: Operand,
        index: Operand,
    },
    /// Fresh storage for `count` elements of the step type's element type
    Reserve {
        count: usize,
    },
    Call {
        callee: Operand,
        args: Vec<Operand>,
    },
    /// Convert to the step's type
    Cast {
        operand: Operand,
    },
    Jump {
        target: Operand,
    },
    Branch {
        cond: Operand,
        then: Operand,
        other: Operand,
    },
    Return {
        value: Operand,
    },
    /// Block start; always index 0 of a non-entry block
    Label,
    /// Neutralized step
    Nop,
}

impl StepKind {
    /// Jump, Branch and Return end the straight-line code they appear in.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            StepKind::Jump { .. } | StepKind::Branch { .. } | StepKind::Return { .. }
        )
    }

    /// Every operand read by this step, in evaluation order.
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            StepKind::Unary { operand, .. } | StepKind::Cast { operand } => vec![operand],
            StepKind::Binary { lhs, rhs, .. } | StepKind::Compare { lhs, rhs, .. } => {
                vec![lhs, rhs]
            }
            StepKind::Load { src } => vec![src],
            StepKind::Store { dst, src } => vec![dst, src],
            StepKind::Offset { array, index } => vec![array, index],
            StepKind::Call { callee, args } => std::iter::once(callee).chain(args).collect(),
            StepKind::Jump { target } => vec![target],
            StepKind::Branch { cond, then, other } => vec![cond, then, other],
            StepKind::Return { value } => vec![value],
            StepKind::Reserve { .. } | StepKind::Label | StepKind::Nop => Vec::new(),
        }
    }

    /// Jump and branch destinations.
    pub fn targets(&self) -> Vec<&Operand> {
        match self {
            StepKind::Jump { target } => vec![target],
            StepKind::Branch { then, other, .. } => vec![then, other],
            _ => Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Unary { .. } => "unary",
            StepKind::Binary { .. } => "binary",
            StepKind::Compare { .. } => "compare",
            StepKind::Load { .. } => "load",
            StepKind::Store { .. } => "store",
            StepKind::Offset { .. } => "offset",
            StepKind::Reserve { .. } => "reserve",
            StepKind::Call { .. } => "call",
            StepKind::Cast { .. } => "cast",
            StepKind::Jump { .. } => "jmp",
            StepKind::Branch { .. } => "branch",
            StepKind::Return { .. } => "ret",
            StepKind::Label => "label",
            StepKind::Nop => "nop",
        }
    }
}

impl Step {
    pub fn is_nop(&self) -> bool {
        matches!(self.kind, StepKind::Nop)
    }

    /// Rewrite to a no-op in place. Returns false if it already was one.
    pub fn neutralize(&mut self) -> bool {
        if self.is_nop() {
            return false;
        }
        self.kind = StepKind::Nop;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockId, FlowId};

    #[test]
    fn call_operands_callee_first() {
        let call = StepKind::Call {
            callee: Operand::Function(FlowId(2)),
            args: vec![Operand::Param(0), Operand::Global(FlowId(1))],
        };
        let flows: Vec<_> = call.operands().iter().filter_map(|o| o.flow()).collect();
        assert_eq!(flows, vec![FlowId(2), FlowId(1)]);
        assert!(!call.is_terminator());
    }

    #[test]
    fn terminators_and_targets() {
        let br = StepKind::Branch {
            cond: Operand::Param(0),
            then: Operand::Block(BlockId(1)),
            other: Operand::Block(BlockId(2)),
        };
        assert!(br.is_terminator());
        assert_eq!(br.targets().len(), 2);
        assert!(StepKind::Return { value: Operand::Empty }.is_terminator());
        assert!(!StepKind::Label.is_terminator());
    }

    #[test]
    fn neutralize_once() {
        let mut step = Step {
            kind: StepKind::Label,
            ty: Type::Void,
            span: Span::DUMMY,
        };
        assert!(step.neutralize());
        assert!(!step.neutralize());
    }
}
