// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compilation pipeline over typed modules.
//!
//! Lowers every module into one SSA module, evaluates global initializers,
//! removes dead code, and checks the result. Stages never stop each other:
//! every stage runs on whatever the previous one produced, and the caller
//! decides from the collected diagnostics whether to go on.

mod config;

pub use config::{Config, ConfigError};

use ctu_diagnostics::formatter::DiagnosticFormatter;
use ctu_diagnostics::json::{to_json_report, DiagnosticReport};
use ctu_diagnostics::{Reports, Severity};
use ctu_ssa::{lower_modules, optimize, optimize_bounded, validate_module, OptStats, SsaModule};
use ctu_tree::Module;

/// Everything one pipeline run produced.
#[derive(Debug)]
pub struct Compilation {
    pub module: SsaModule,
    pub reports: Reports,
    /// Set when the optimizer ran.
    pub stats: Option<OptStats>,
    /// Globals whose initializer evaluated to poison.
    pub poisoned: usize,
}

impl Compilation {
    /// True if any internal or error diagnostic was recorded.
    pub fn should_halt(&self) -> bool {
        self.reports.has_errors()
    }

    /// Diagnostics rendered for a terminal, one block per diagnostic.
    pub fn render(&self, source: &str, file: &str) -> String {
        let formatter = DiagnosticFormatter::new(source).with_file_name(file);
        self.reports
            .diagnostics()
            .iter()
            .map(|d| formatter.format(d))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn json_report(&self, source: &str, file: &str) -> DiagnosticReport {
        to_json_report(self.reports.diagnostics(), source, file)
    }
}

/// Run the pipeline over `modules`.
pub fn compile(modules: &[Module], config: &Config) -> Compilation {
    let mut reports = Reports::new();

    let mut module = lower_modules(modules, &mut reports);
    log::debug!(
        "[Driver] lowered {} modules into {} flows",
        modules.len(),
        module.live_ids().len()
    );

    let poisoned = if config.evaluate_globals {
        ctu_eval::evaluate_all(&module, config.eval_options(), &mut reports)
    } else {
        0
    };

    if config.validate {
        check(&module, "lowering", &mut reports);
    }

    let stats = config.optimize.then(|| match config.max_opt_cycles {
        Some(limit) => optimize_bounded(&mut module, limit, &mut reports),
        None => optimize(&mut module),
    });

    if config.validate && stats.is_some() {
        check(&module, "optimization", &mut reports);
    }

    log::debug!(
        "[Driver] done: {} errors, {} warnings",
        reports.count(Severity::Error) + reports.count(Severity::Internal),
        reports.count(Severity::Warning)
    );

    Compilation {
        module,
        reports,
        stats,
        poisoned,
    }
}

fn check(module: &SsaModule, after: &str, reports: &mut Reports) {
    let problems = validate_module(module, reports);
    if problems > 0 {
        log::debug!("[Driver] {} malformed steps after {}", problems, after);
    }
}
