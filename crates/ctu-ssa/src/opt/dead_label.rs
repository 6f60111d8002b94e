// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Dead label elimination: a label no live jump or branch targets is
//! neutralized, which lets the next dead step pass swallow its block.

use std::collections::HashSet;

use crate::{BlockId, SsaModule, StepKind};

/// Returns how many labels were neutralized.
pub fn eliminate_dead_labels(module: &mut SsaModule) -> usize {
    let mut count = 0;
    for flow in module.flows.iter_mut().flatten() {
        let targets: HashSet<BlockId> = flow
            .blocks
            .iter()
            .flat_map(|b| &b.steps)
            .flat_map(|s| s.kind.targets())
            .filter_map(|o| o.block())
            .collect();

        for (i, block) in flow.blocks.iter_mut().enumerate() {
            if targets.contains(&BlockId(i as u32)) {
                continue;
            }
            for step in &mut block.steps {
                if matches!(step.kind, StepKind::Label) {
                    step.neutralize();
                    count += 1;
                }
            }
        }
    }
    count
}
