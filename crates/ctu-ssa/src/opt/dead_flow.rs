// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Dead flow elimination.
//!
//! Public and entry-point flows are roots. Every global or function operand
//! of a live step in a reachable flow makes its flow reachable; whatever is
//! left unmarked is deleted.

use crate::{FlowId, SsaModule};

/// Returns how many flows were deleted.
pub fn eliminate_dead_flows(module: &mut SsaModule) -> usize {
    let mut worklist = Vec::new();
    for (i, slot) in module.flows.iter_mut().enumerate() {
        if let Some(flow) = slot {
            flow.reachable = flow.visibility.is_root();
            if flow.reachable {
                worklist.push(FlowId(i as u32));
            }
        }
    }

    while let Some(id) = worklist.pop() {
        let referenced: Vec<FlowId> = match module.flow(id) {
            Some(flow) => flow
                .blocks
                .iter()
                .flat_map(|b| &b.steps)
                .filter(|s| !s.is_nop())
                .flat_map(|s| s.kind.operands())
                .filter_map(|o| o.flow())
                .collect(),
            None => continue,
        };
        for target in referenced {
            if let Some(flow) = module.flow_mut(target) {
                if !flow.reachable {
                    flow.reachable = true;
                    worklist.push(target);
                }
            }
        }
    }

    let dead: Vec<FlowId> = module
        .live_flows()
        .filter(|(_, f)| !f.reachable)
        .map(|(id, _)| id)
        .collect();
    for &id in &dead {
        if let Some(flow) = module.remove_flow(id) {
            log::debug!("[Opt] removed unreachable `{}`", flow.name);
        }
    }
    dead.len()
}
