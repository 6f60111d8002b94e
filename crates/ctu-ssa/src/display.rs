// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Textual dump of a module.
//!
//! ```text
//! global @x: int = 9 {
//!   %0.0 = binary int 4 + 5
//!   ret int %0.0
//! }
//! ```
//!
//! Registers print as `%block.index`, block operands as `.name`, flows as
//! `@name`. Neutralized steps are left out.

use std::fmt;

use crate::{Flow, FlowKind, Operand, SsaModule, Step, StepKind};

impl fmt::Display for SsaModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, ty) in &self.types {
            writeln!(f, "type {} = {}", name, ty)?;
        }
        for (i, (_, flow)) in self.live_flows().enumerate() {
            if i > 0 || !self.types.is_empty() {
                writeln!(f)?;
            }
            write_flow(f, self, flow)?;
        }
        Ok(())
    }
}

fn write_flow(f: &mut fmt::Formatter<'_>, module: &SsaModule, flow: &Flow) -> fmt::Result {
    match flow.kind {
        FlowKind::Global => {
            write!(f, "global @{}: {}", flow.name, flow.ty)?;
            if let Some(value) = flow.cached_value() {
                write!(f, " = {}", value)?;
            }
        }
        FlowKind::Function => write!(f, "fn @{}: {}", flow.name, flow.ty)?,
    }
    if flow.blocks.is_empty() {
        return writeln!(f, ";");
    }
    writeln!(f, " {{")?;
    for (b, block) in flow.blocks.iter().enumerate() {
        for (i, step) in block.steps.iter().enumerate() {
            match step.kind {
                StepKind::Nop => {}
                StepKind::Label => writeln!(f, ".{}:", block.name)?,
                _ => {
                    write!(f, "  ")?;
                    if produces_value(step) {
                        write!(f, "%{}.{} = ", b, i)?;
                    }
                    write_step(f, module, flow, step)?;
                    writeln!(f)?;
                }
            }
        }
    }
    writeln!(f, "}}")
}

fn produces_value(step: &Step) -> bool {
    !matches!(
        step.kind,
        StepKind::Store { .. }
            | StepKind::Jump { .. }
            | StepKind::Branch { .. }
            | StepKind::Return { .. }
    )
}

fn write_step(f: &mut fmt::Formatter<'_>, module: &SsaModule, flow: &Flow, step: &Step) -> fmt::Result {
    let op = |operand| OperandDisplay {
        module,
        flow,
        operand,
    };
    match &step.kind {
        StepKind::Unary { op: unary, operand } => {
            write!(f, "unary {} {}{}", step.ty, unary.symbol(), op(operand))
        }
        StepKind::Binary { op: binary, lhs, rhs } => {
            write!(f, "binary {} {} {} {}", step.ty, op(lhs), binary.symbol(), op(rhs))
        }
        StepKind::Compare { op: cmp, lhs, rhs } => {
            write!(f, "compare {} {} {}", op(lhs), cmp.symbol(), op(rhs))
        }
        StepKind::Load { src } => write!(f, "load {} {}", step.ty, op(src)),
        StepKind::Store { dst, src } => write!(f, "store {} {}", op(dst), op(src)),
        StepKind::Offset { array, index } => write!(f, "offset {} {}", op(array), op(index)),
        StepKind::Reserve { count } => write!(f, "reserve {} x{}", step.ty, count),
        StepKind::Call { callee, args } => {
            write!(f, "call {} {}(", step.ty, op(callee))?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", op(arg))?;
            }
            write!(f, ")")
        }
        StepKind::Cast { operand } => write!(f, "cast {} {}", step.ty, op(operand)),
        StepKind::Jump { target } => write!(f, "jmp {}", op(target)),
        StepKind::Branch { cond, then, other } => {
            write!(f, "branch {} {} {}", op(cond), op(then), op(other))
        }
        StepKind::Return { value: Operand::Empty } => write!(f, "ret"),
        StepKind::Return { value } => write!(f, "ret {} {}", step.ty, op(value)),
        StepKind::Label | StepKind::Nop => write!(f, "{}", step.kind.name()),
    }
}

/// An operand printed in the context of its flow and module.
struct OperandDisplay<'a> {
    module: &'a SsaModule,
    flow: &'a Flow,
    operand: &'a Operand,
}

impl fmt::Display for OperandDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::Imm(value) => write!(f, "{}", value),
            Operand::Reg(reg) => write!(f, "%{}.{}", reg.block.0, reg.index),
            Operand::Local(slot) => write!(f, "$local{}", slot),
            Operand::Param(n) => write!(f, "$param{}", n),
            Operand::Global(id) | Operand::Function(id) => match self.module.flow(*id) {
                Some(target) => write!(f, "@{}", target.name),
                None => write!(f, "@<deleted {}>", id.0),
            },
            Operand::Block(id) => match self.flow.block(*id) {
                Some(block) => write!(f, ".{}", block.name),
                None => write!(f, ".<missing {}>", id.0),
            },
            Operand::Empty => write!(f, "empty"),
        }
    }
}
