// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Dead step elimination.
//!
//! A flow's blocks are scanned in layout order as one straight sequence.
//! After a terminator every step is dead until the next surviving label.

use crate::{SsaModule, StepKind};

/// Neutralize steps after terminators. Returns how many were rewritten.
pub fn eliminate_dead_steps(module: &mut SsaModule) -> usize {
    let mut count = 0;
    for flow in module.flows.iter_mut().flatten() {
        let mut dead = false;
        for step in flow.blocks.iter_mut().flat_map(|b| &mut b.steps) {
            match step.kind {
                StepKind::Label => dead = false,
                StepKind::Nop => {}
                _ if dead => {
                    step.neutralize();
                    count += 1;
                }
                _ => dead = step.kind.is_terminator(),
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockId, Flow, FlowBuilder, FlowKind, Operand};
    use ctu_tree::{Span, Type, Visibility};

    #[test]
    fn stops_at_label() {
        let mut flow = Flow::new(FlowKind::Function, "f", Type::Void, Visibility::Public);
        let mut b = FlowBuilder::new(&mut flow);
        let next = b.create_block("next");
        let ret = StepKind::Return { value: Operand::Empty };
        let jump = StepKind::Jump { target: Operand::Block(next) };
        b.push(BlockId::ENTRY, ret.clone(), Type::Void, Span::DUMMY);
        b.push(BlockId::ENTRY, jump, Type::Void, Span::DUMMY);
        b.push(next, ret, Type::Void, Span::DUMMY);

        let mut module = SsaModule::new();
        module.add_flow(flow);
        assert_eq!(eliminate_dead_steps(&mut module), 1);
        assert_eq!(eliminate_dead_steps(&mut module), 0);

        let flow = module.flows[0].as_ref().unwrap();
        assert!(flow.blocks[0].steps[1].is_nop());
        assert!(matches!(flow.blocks[1].steps[0].kind, StepKind::Label));
        assert!(matches!(flow.blocks[1].steps[1].kind, StepKind::Return { .. }));
    }
}
