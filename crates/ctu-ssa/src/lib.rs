// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! SSA form - flows of blocks of steps.
//!
//! Every global initializer and every function body becomes a [`Flow`].
//! Flows, blocks and steps live in vectors and refer to each other by index,
//! so a step's position is its register and must never change: passes
//! rewrite steps to [`StepKind::Nop`] instead of removing them.

mod builder;
mod display;
mod flow;
mod module;
mod operand;
mod step;
mod value;

pub mod lower;
pub mod opt;
pub mod validate;

pub use builder::FlowBuilder;
pub use flow::{Block, Flow, FlowKind};
pub use lower::{lower_modules, LowerError};
pub use module::SsaModule;
pub use operand::{BlockId, FlowId, Operand, Register};
pub use opt::{optimize, optimize_bounded, OptStats};
pub use step::{Step, StepKind};
pub use validate::validate_module;
pub use value::{ArrayRef, Value, ValueKind};
