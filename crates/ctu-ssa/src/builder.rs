// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! FlowBuilder - appends blocks and steps to a flow during lowering.
//!
//! The builder has no notion of a current block: callers pass the block to
//! append to, so nested compiles can't clobber each other's position.

use ctu_tree::{Span, Type};

use crate::{Block, BlockId, Flow, Operand, Register, Step, StepKind};

pub struct FlowBuilder<'f> {
    flow: &'f mut Flow,
}

impl<'f> FlowBuilder<'f> {
    /// Start building into `flow`, opening its entry block.
    pub fn new(flow: &'f mut Flow) -> Self {
        flow.blocks.clear();
        flow.blocks.push(Block {
            name: "entry".to_string(),
            steps: Vec::new(),
        });
        Self { flow }
    }

    pub fn flow(&self) -> &Flow {
        &*self.flow
    }

    pub fn flow_mut(&mut self) -> &mut Flow {
        &mut *self.flow
    }

    /// Open a new block starting with its label. `hint` prefixes the name,
    /// the block index keeps it unique.
    pub fn create_block(&mut self, hint: &str) -> BlockId {
        let id = BlockId(self.flow.blocks.len() as u32);
        self.flow.blocks.push(Block {
            name: format!("{}{}", hint, id.0),
            steps: vec![Step {
                kind: StepKind::Label,
                ty: Type::Void,
                span: Span::DUMMY,
            }],
        });
        id
    }

    /// Append a step; the returned register names its result.
    pub fn push(&mut self, block: BlockId, kind: StepKind, ty: Type, span: Span) -> Operand {
        let steps = &mut self.flow.blocks[block.index()].steps;
        let index = steps.len() as u32;
        steps.push(Step { kind, ty, span });
        Operand::Reg(Register { block, index })
    }

    pub fn falls_through(&self, block: BlockId) -> bool {
        self.flow.falls_through(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlowKind;
    use ctu_tree::Visibility;

    #[test]
    fn registers_are_positions() {
        let mut flow = Flow::new(FlowKind::Function, "f", Type::Void, Visibility::Private);
        let mut builder = FlowBuilder::new(&mut flow);
        let tail = builder.create_block("tail");
        let r = builder.push(BlockId::ENTRY, StepKind::Reserve { count: 1 }, Type::Void, Span::DUMMY);
        let s = builder.push(tail, StepKind::Nop, Type::Void, Span::DUMMY);
        assert_eq!(r, Operand::Reg(Register { block: BlockId(0), index: 0 }));
        // index 0 of a non-entry block is its label
        assert_eq!(s, Operand::Reg(Register { block: tail, index: 1 }));
        assert!(builder.falls_through(tail));
        assert_eq!(flow.blocks[1].name, "tail1");
    }
}
