// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Constant evaluation of global initializers.
//!
//! Each global flow is interpreted as a small program: an instruction
//! pointer walks its blocks and every step writes its result into a register
//! file shaped like the flow. Integers are arbitrary precision. Failures are
//! reported and turn into poison values; evaluation of other globals goes on.
//!
//! Results are cached on the flow, so a global is interpreted at most once
//! no matter how many initializers read it.

mod interp;
mod range;

pub use range::{check_range, digit_range};

use ctu_diagnostics::{codes, Diagnostic, DiagnosticSink, Severity, ToDiagnostic};
use ctu_ssa::{FlowId, SsaModule, Value};
use ctu_tree::Type;
use num_bigint::BigInt;
use thiserror::Error;

// ============================================================================
// Eval Errors
// ============================================================================

/// Errors that can occur during constant evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of bounds (length is {len})")]
    OutOfBounds { index: BigInt, len: usize },

    #[error("`{ty}` literal out of range")]
    LiteralOutOfRange { ty: Type, value: BigInt },

    #[error("can only evaluate constant-qualified flows")]
    NonConstantCall,

    #[error("cannot negate unsigned `{0}` value")]
    NegateUnsigned(Type),

    #[error("invalid {found} operand to {step}")]
    InvalidOperand { step: &'static str, found: String },

    #[error("uninitialized value accessed")]
    Uninitialized,

    #[error("cyclic constant initializer in `{0}`")]
    Cyclic(String),

    #[error("constant evaluation nested too deeply (limit is {0})")]
    TooDeep(usize),

    #[error("global has no initializer")]
    NoInitializer,

    #[error("invalid shift amount {0}")]
    InvalidShift(BigInt),

    #[error("unresolved jump target")]
    UnresolvedTarget,

    #[error("{0} cannot be read at compile time")]
    NonConstantRead(String),

    #[error("register %{block}.{index} read before it was written")]
    UndefinedRegister { block: u32, index: u32 },

    #[error("constant evaluation exceeded backwards branch quota ({0})")]
    BranchQuotaExceeded(usize),

    #[error("flow ended without returning")]
    FellOffEnd,

    #[error("flow {0} does not exist")]
    MissingFlow(u32),
}

impl EvalError {
    pub fn severity(&self) -> Severity {
        match self {
            EvalError::LiteralOutOfRange { .. } | EvalError::NoInitializer => Severity::Warning,
            EvalError::InvalidOperand { .. }
            | EvalError::UnresolvedTarget
            | EvalError::UndefinedRegister { .. }
            | EvalError::FellOffEnd
            | EvalError::MissingFlow(_) => Severity::Internal,
            _ => Severity::Error,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            EvalError::DivisionByZero => codes::DIVISION_BY_ZERO,
            EvalError::OutOfBounds { .. } => codes::OUT_OF_BOUNDS,
            EvalError::LiteralOutOfRange { .. } => codes::LITERAL_OUT_OF_RANGE,
            EvalError::NonConstantCall => codes::NON_CONSTANT_CALL,
            EvalError::NegateUnsigned(_) => codes::NEGATE_UNSIGNED,
            EvalError::InvalidOperand { .. } => codes::INVALID_OPERAND,
            EvalError::Uninitialized => codes::UNINITIALIZED,
            EvalError::Cyclic(_) => codes::CYCLIC_INITIALIZER,
            EvalError::TooDeep(_) | EvalError::BranchQuotaExceeded(_) => codes::EVAL_TOO_DEEP,
            EvalError::NoInitializer => codes::NO_INITIALIZER,
            EvalError::InvalidShift(_) => codes::INVALID_SHIFT,
            EvalError::UnresolvedTarget | EvalError::FellOffEnd => codes::UNRESOLVED_TARGET,
            EvalError::NonConstantRead(_) => codes::NON_CONSTANT_READ,
            EvalError::UndefinedRegister { .. } | EvalError::MissingFlow(_) => codes::MALFORMED_SSA,
        }
    }
}

impl ToDiagnostic for EvalError {
    fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::new(self.severity(), self.to_string()).with_code(self.code());
        match self {
            EvalError::LiteralOutOfRange { value, .. } => {
                diag.with_note(format!("the value is {}", value))
            }
            EvalError::NonConstantCall => {
                diag.with_help("only constant expressions can initialize a global")
            }
            _ => diag,
        }
    }
}

/// Result type for evaluation internals. The error side is always reported
/// and replaced by poison before it leaves the crate.
pub type EvalResult<T> = Result<T, EvalError>;

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// How many global initializers may be under evaluation at once.
    pub max_depth: usize,
    /// Backward jumps allowed per flow before evaluation gives up.
    pub branch_quota: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            branch_quota: 1000,
        }
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluates global flows of one module.
pub struct Evaluator<'m, 's> {
    module: &'m SsaModule,
    sink: &'s mut dyn DiagnosticSink,
    options: EvalOptions,
    /// Globals under evaluation, innermost last.
    active: Vec<FlowId>,
    /// Flows actually interpreted (cache misses).
    runs: usize,
}

impl<'m, 's> Evaluator<'m, 's> {
    pub fn new(module: &'m SsaModule, sink: &'s mut dyn DiagnosticSink) -> Self {
        Self::with_options(module, sink, EvalOptions::default())
    }

    pub fn with_options(
        module: &'m SsaModule,
        sink: &'s mut dyn DiagnosticSink,
        options: EvalOptions,
    ) -> Self {
        Self {
            module,
            sink,
            options,
            active: Vec::new(),
            runs: 0,
        }
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Value of a global flow, from cache if it was evaluated before.
    pub fn evaluate(&mut self, id: FlowId) -> Value {
        let module = self.module;
        let Some(flow) = module.flow(id) else {
            return self.fail(EvalError::MissingFlow(id.0), None, Type::Void);
        };
        if let Some(value) = flow.cached_value() {
            return value.clone();
        }
        if !flow.is_global() {
            return self.fail(EvalError::NonConstantCall, Some(flow.span), flow.ty.clone());
        }
        if self.active.contains(&id) {
            return self.fail(EvalError::Cyclic(flow.name.clone()), Some(flow.span), flow.ty.clone());
        }
        if self.active.len() >= self.options.max_depth {
            return self.fail(
                EvalError::TooDeep(self.options.max_depth),
                Some(flow.span),
                flow.ty.clone(),
            );
        }

        self.active.push(id);
        let value = self.run(flow);
        self.active.pop();
        self.runs += 1;

        log::debug!("[Eval] global `{}` = {}", flow.name, value);
        // Nested evaluation can't have filled this cell: re-entry is a cycle.
        let _ = flow.value.set(value.clone());
        value
    }

    /// Report `error` at `span` and return the poison value replacing the result.
    fn fail(&mut self, error: EvalError, span: Option<ctu_tree::Span>, ty: Type) -> Value {
        let message = error.to_string();
        self.sink.push(error.to_diagnostic().at(span));
        Value::poison(message, ty)
    }
}

/// Evaluate one global, caching the result on its flow.
pub fn evaluate_global(module: &SsaModule, id: FlowId, sink: &mut dyn DiagnosticSink) -> Value {
    Evaluator::new(module, sink).evaluate(id)
}

/// Evaluate every global of the module. Returns how many ended up poisoned.
pub fn evaluate_all(module: &SsaModule, options: EvalOptions, sink: &mut dyn DiagnosticSink) -> usize {
    let mut evaluator = Evaluator::with_options(module, sink, options);
    let ids: Vec<FlowId> = module.globals().map(|(id, _)| id).collect();
    let poisoned = ids
        .into_iter()
        .filter(|&id| evaluator.evaluate(id).is_poison())
        .count();
    log::debug!(
        "[Eval] {} globals interpreted, {} poisoned",
        evaluator.runs(),
        poisoned
    );
    poisoned
}
