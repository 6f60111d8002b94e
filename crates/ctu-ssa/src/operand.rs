// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Step inputs. Operands never own what they point at: registers, blocks and
//! flows are indices into the module.

use crate::Value;

/// Index of a flow in its module. Stable for the module's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(pub u32);

/// Index of a block in its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl FlowId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BlockId {
    pub const ENTRY: BlockId = BlockId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The result of an earlier step: its block and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    pub block: BlockId,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Immediate constant
    Imm(Value),
    Reg(Register),
    /// Local slot of the enclosing function
    Local(usize),
    /// Parameter of the enclosing function
    Param(usize),
    /// A global, by identity
    Global(FlowId),
    /// A function, by identity
    Function(FlowId),
    /// Jump or branch target
    Block(BlockId),
    Empty,
}

impl Operand {
    /// Referenced flow, if any.
    pub fn flow(&self) -> Option<FlowId> {
        match self {
            Operand::Global(id) | Operand::Function(id) => Some(*id),
            _ => None,
        }
    }

    pub fn block(&self) -> Option<BlockId> {
        match self {
            Operand::Block(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_poison(&self) -> bool {
        matches!(self, Operand::Imm(v) if v.is_poison())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Imm(value)
    }
}
