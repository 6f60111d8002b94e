// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error code registry.
//!
//! Maps error codes to titles and categories, for display and for the
//! `category` field of JSON reports.

use std::collections::HashMap;

// Lowering (E01xx)
pub const UNEXPECTED_NODE: &str = "E0100";
pub const INVALID_LVALUE: &str = "E0101";
pub const UNDECLARED_FLOW: &str = "E0102";
pub const UNRESOLVED_NODE: &str = "E0103";

// Evaluation (E02xx)
pub const DIVISION_BY_ZERO: &str = "E0200";
pub const OUT_OF_BOUNDS: &str = "E0201";
pub const LITERAL_OUT_OF_RANGE: &str = "E0202";
pub const NON_CONSTANT_CALL: &str = "E0203";
pub const NEGATE_UNSIGNED: &str = "E0204";
pub const INVALID_OPERAND: &str = "E0205";
pub const UNINITIALIZED: &str = "E0206";
pub const CYCLIC_INITIALIZER: &str = "E0207";
pub const EVAL_TOO_DEEP: &str = "E0208";
pub const NO_INITIALIZER: &str = "E0209";
pub const INVALID_SHIFT: &str = "E0210";
pub const UNRESOLVED_TARGET: &str = "E0211";
pub const NON_CONSTANT_READ: &str = "E0212";

// Optimization (E03xx)
pub const CYCLE_LIMIT: &str = "E0300";

// Internal consistency (E09xx)
pub const MALFORMED_SSA: &str = "E0900";

/// Registry of all known error codes.
pub struct ErrorCodeRegistry {
    codes: HashMap<&'static str, ErrorCodeInfo>,
}

/// Information about a single error code.
pub struct ErrorCodeInfo {
    pub code: &'static str,
    pub title: &'static str,
    pub category: ErrorCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lowering,
    Evaluation,
    Optimization,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Lowering => write!(f, "Lowering"),
            ErrorCategory::Evaluation => write!(f, "Evaluation"),
            ErrorCategory::Optimization => write!(f, "Optimization"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

macro_rules! register_codes {
    ($($code:expr => ($title:literal, $cat:expr)),* $(,)?) => {{
        let mut map = HashMap::new();
        $(
            map.insert($code, ErrorCodeInfo {
                code: $code,
                title: $title,
                category: $cat,
            });
        )*
        map
    }};
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        use ErrorCategory::*;

        Self {
            codes: register_codes! {
                UNEXPECTED_NODE => ("unexpected node kind", Lowering),
                INVALID_LVALUE => ("expression is not assignable", Lowering),
                UNDECLARED_FLOW => ("reference to undeclared global or function", Lowering),
                UNRESOLVED_NODE => ("unresolved node reached lowering", Lowering),

                DIVISION_BY_ZERO => ("division by zero", Evaluation),
                OUT_OF_BOUNDS => ("array access out of bounds", Evaluation),
                LITERAL_OUT_OF_RANGE => ("literal out of range", Evaluation),
                NON_CONSTANT_CALL => ("call in constant initializer", Evaluation),
                NEGATE_UNSIGNED => ("negation of unsigned value", Evaluation),
                INVALID_OPERAND => ("operand of wrong kind", Evaluation),
                UNINITIALIZED => ("uninitialized value accessed", Evaluation),
                CYCLIC_INITIALIZER => ("cyclic constant initializer", Evaluation),
                EVAL_TOO_DEEP => ("constant evaluation nested too deeply", Evaluation),
                NO_INITIALIZER => ("global has no initializer", Evaluation),
                INVALID_SHIFT => ("invalid shift amount", Evaluation),
                UNRESOLVED_TARGET => ("unresolved jump target", Evaluation),
                NON_CONSTANT_READ => ("storage cannot be read at compile time", Evaluation),

                CYCLE_LIMIT => ("optimizer cycle limit reached", Optimization),

                MALFORMED_SSA => ("malformed ssa module", Internal),
            },
        }
    }
}

impl ErrorCodeRegistry {
    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }

    pub fn all(&self) -> impl Iterator<Item = &ErrorCodeInfo> {
        self.codes.values()
    }
}
