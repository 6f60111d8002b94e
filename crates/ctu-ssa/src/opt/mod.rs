// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Dead-code elimination to fixpoint.
//!
//! Each cycle runs dead step, dead label and dead flow elimination in that
//! order; cycles repeat until one changes nothing. Steps are neutralized in
//! place, never removed, so registers stay valid.

mod dead_flow;
mod dead_label;
mod dead_step;

pub use dead_flow::eliminate_dead_flows;
pub use dead_label::eliminate_dead_labels;
pub use dead_step::eliminate_dead_steps;

use ctu_diagnostics::{codes, Diagnostic, DiagnosticSink};

use crate::SsaModule;

/// What one optimizer run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptStats {
    /// Cycles run, including the final one that changed nothing.
    pub cycles: usize,
    pub steps: usize,
    pub labels: usize,
    pub flows: usize,
    /// False if the cycle limit stopped the run early.
    pub converged: bool,
}

impl OptStats {
    pub fn changed(&self) -> bool {
        self.steps + self.labels + self.flows > 0
    }
}

/// Run to fixpoint with no cycle limit.
pub fn optimize(module: &mut SsaModule) -> OptStats {
    let mut stats = OptStats::default();
    while run_cycle(module, &mut stats) {}
    stats.converged = true;
    stats
}

/// Run to fixpoint, but give up after `max_cycles`. Hitting the limit is
/// reported, since every cycle must delete something and the module is
/// finite.
pub fn optimize_bounded(
    module: &mut SsaModule,
    max_cycles: usize,
    sink: &mut dyn DiagnosticSink,
) -> OptStats {
    let mut stats = OptStats::default();
    while stats.cycles < max_cycles {
        if !run_cycle(module, &mut stats) {
            stats.converged = true;
            return stats;
        }
    }
    sink.push(
        Diagnostic::internal(format!(
            "dead code elimination did not settle in {} cycles",
            max_cycles
        ))
        .with_code(codes::CYCLE_LIMIT),
    );
    stats
}

/// One cycle of all three passes. Returns whether anything changed.
fn run_cycle(module: &mut SsaModule, stats: &mut OptStats) -> bool {
    stats.cycles += 1;
    let steps = eliminate_dead_steps(module);
    let labels = eliminate_dead_labels(module);
    let flows = eliminate_dead_flows(module);

    log::debug!(
        "[Opt] cycle {}: {} steps, {} labels, {} flows",
        stats.cycles,
        steps,
        labels,
        flows
    );

    stats.steps += steps;
    stats.labels += labels;
    stats.flows += flows;
    steps + labels + flows > 0
}
