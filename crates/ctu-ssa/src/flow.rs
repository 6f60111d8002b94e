// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Flows and blocks.

use std::cell::OnceCell;

use ctu_tree::{Span, Type, Visibility};

use crate::{BlockId, Step, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// Initializer of a global variable
    Global,
    /// Body of a function
    Function,
}

/// One compiled unit: a global initializer or a function body.
#[derive(Debug, Clone)]
pub struct Flow {
    pub name: String,
    pub kind: FlowKind,
    pub visibility: Visibility,
    /// Variable type for globals, signature for functions.
    pub ty: Type,
    pub span: Span,
    /// Empty for a function without body.
    pub blocks: Vec<Block>,
    /// Local slot types, by declaration order.
    pub locals: Vec<Type>,
    pub params: Vec<Type>,
    /// Set by dead function elimination, recomputed every cycle.
    pub reachable: bool,
    /// Evaluated initializer of a global. Written at most once.
    pub value: OnceCell<Value>,
}

/// An append-only run of steps.
#[derive(Debug, Clone)]
pub struct Block {
    /// Unique within the flow.
    pub name: String,
    pub steps: Vec<Step>,
}

impl Flow {
    pub fn new(kind: FlowKind, name: impl Into<String>, ty: Type, visibility: Visibility) -> Self {
        Flow {
            name: name.into(),
            kind,
            visibility,
            ty,
            span: Span::DUMMY,
            blocks: Vec::new(),
            locals: Vec::new(),
            params: Vec::new(),
            reachable: false,
            value: OnceCell::new(),
        }
    }

    pub fn is_global(&self) -> bool {
        self.kind == FlowKind::Global
    }

    pub fn is_function(&self) -> bool {
        self.kind == FlowKind::Function
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// Cached initializer value, if already evaluated.
    pub fn cached_value(&self) -> Option<&Value> {
        self.value.get()
    }

    /// Steps still doing something.
    pub fn live_steps(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| &b.steps)
            .filter(|s| !s.is_nop())
            .count()
    }

    /// Whether execution can fall off the end of `block`: it has no live
    /// terminator after its last label.
    pub fn falls_through(&self, block: BlockId) -> bool {
        self.block(block)
            .and_then(|b| b.steps.iter().rev().find(|s| !s.is_nop()))
            .map_or(true, |s| !s.kind.is_terminator())
    }
}
