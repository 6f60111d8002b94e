// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Pipeline configuration, loadable from JSON.

use std::path::Path;

use ctu_eval::EvalOptions;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Which stages run, and the limits they run under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Interpret every global initializer after lowering.
    pub evaluate_globals: bool,
    /// Run dead-code elimination to its fixpoint.
    pub optimize: bool,
    /// Check SSA structure after lowering and after optimization.
    pub validate: bool,
    pub max_eval_depth: usize,
    /// Backward jumps one global may take during evaluation.
    pub branch_quota: usize,
    /// Stop the optimizer after this many cycles. Unbounded if unset.
    pub max_opt_cycles: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        let eval = EvalOptions::default();
        Self {
            evaluate_globals: true,
            optimize: true,
            validate: true,
            max_eval_depth: eval.max_depth,
            branch_quota: eval.branch_quota,
            max_opt_cycles: None,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            max_depth: self.max_eval_depth,
            branch_quota: self.branch_quota,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_eval_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_eval_depth",
                message: "must be at least 1".into(),
            });
        }
        if self.max_opt_cycles == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_opt_cycles",
                message: "must be at least 1 when set".into(),
            });
        }
        Ok(())
    }
}
