// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Structural validation of a finished module.
//!
//! Every problem found here is a bug in lowering or optimization, so all of
//! them are internal diagnostics.

use ctu_diagnostics::{codes, Diagnostic, DiagnosticSink};

use crate::{BlockId, Flow, FlowKind, Operand, SsaModule, StepKind};

/// Check every live step of every flow. Returns the number of problems.
pub fn validate_module(module: &SsaModule, sink: &mut dyn DiagnosticSink) -> usize {
    let mut problems = 0;
    for (_, flow) in module.live_flows() {
        let mut report = |message: String, span| {
            problems += 1;
            sink.push(
                Diagnostic::internal(format!("in `{}`: {}", flow.name, message))
                    .with_code(codes::MALFORMED_SSA)
                    .at(Some(span)),
            );
        };

        if flow.kind == FlowKind::Global && flow.blocks.is_empty() {
            report("global has no entry block".to_string(), flow.span);
        }

        for (b, block) in flow.blocks.iter().enumerate() {
            let here = BlockId(b as u32);
            for (i, step) in block.steps.iter().enumerate() {
                if step.is_nop() {
                    continue;
                }
                if matches!(step.kind, StepKind::Label) && (i != 0 || here == BlockId::ENTRY) {
                    report(format!("stray label at {}.{}", b, i), step.span);
                }
                for target in step.kind.targets() {
                    if !matches!(target, Operand::Block(_)) {
                        report(format!("{} at {}.{} has a non-block target", step.kind.name(), b, i), step.span);
                    }
                }
                for operand in step.kind.operands() {
                    if let Some(problem) = check_operand(module, flow, here, i, operand) {
                        report(format!("{} at {}.{}: {}", step.kind.name(), b, i, problem), step.span);
                    }
                }
            }
        }
    }
    problems
}

fn check_operand(
    module: &SsaModule,
    flow: &Flow,
    block: BlockId,
    index: usize,
    operand: &Operand,
) -> Option<String> {
    match operand {
        Operand::Reg(reg) => {
            if reg.block != block {
                Some(format!("register %{}.{} is in another block", reg.block.0, reg.index))
            } else if reg.index as usize >= index {
                Some(format!("register %{}.{} is not defined yet", reg.block.0, reg.index))
            } else {
                None
            }
        }
        Operand::Block(target) if target.index() >= flow.blocks.len() => {
            Some(format!("target block {} does not exist", target.0))
        }
        Operand::Local(slot) if *slot >= flow.locals.len() => {
            Some(format!("local slot {} out of range", slot))
        }
        Operand::Param(n) if *n >= flow.params.len() => {
            Some(format!("parameter {} out of range", n))
        }
        Operand::Global(id) => match module.flow(*id) {
            Some(f) if f.is_global() => None,
            Some(_) => Some(format!("flow {} is not a global", id.0)),
            None => Some(format!("reference to deleted flow {}", id.0)),
        },
        Operand::Function(id) => match module.flow(*id) {
            Some(f) if f.is_function() => None,
            Some(_) => Some(format!("flow {} is not a function", id.0)),
            None => Some(format!("reference to deleted flow {}", id.0)),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Flow, FlowBuilder, Register};
    use ctu_diagnostics::Reports;
    use ctu_tree::{Span, Type, Visibility};

    #[test]
    fn forward_register_is_reported() {
        let mut flow = Flow::new(FlowKind::Global, "g", Type::int(), Visibility::Public);
        let mut b = FlowBuilder::new(&mut flow);
        let forward = Operand::Reg(Register {
            block: BlockId::ENTRY,
            index: 0,
        });
        b.push(BlockId::ENTRY, StepKind::Return { value: forward }, Type::int(), Span::DUMMY);

        let mut module = SsaModule::new();
        module.add_flow(flow);
        let mut reports = Reports::new();
        assert_eq!(validate_module(&module, &mut reports), 1);
        assert!(reports.matching("not defined yet").next().is_some());
    }

    #[test]
    fn deleted_flow_reference_is_reported() {
        let mut module = SsaModule::new();
        let dead = module.add_flow(Flow::new(FlowKind::Function, "dead", Type::Void, Visibility::Private));
        let mut flow = Flow::new(FlowKind::Global, "g", Type::Void, Visibility::Public);
        FlowBuilder::new(&mut flow).push(
            BlockId::ENTRY,
            StepKind::Return {
                value: Operand::Function(dead),
            },
            Type::Void,
            Span::DUMMY,
        );
        module.add_flow(flow);
        module.remove_flow(dead);

        let mut reports = Reports::new();
        assert_eq!(validate_module(&module, &mut reports), 1);
        assert!(reports.matching("deleted flow").next().is_some());
    }
}
