// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Diagnostics for the SSA pipeline.
//!
//! Lowering, evaluation and optimization never stop on a bad input: each
//! component converts its error enum into a [`Diagnostic`] through
//! [`ToDiagnostic`], appends it to a [`DiagnosticSink`] and carries on with a
//! poisoned result. Whether to halt is decided afterwards by whoever owns the
//! sink, usually by asking [`Reports::has_errors`].

pub mod codes;
pub mod formatter;
pub mod json;

use ctu_tree::Span;
use serde::Serialize;

// ============================================================================
// Core Types
// ============================================================================

/// A diagnostic with enough context for terminal or JSON display.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

/// A labeled source span within a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub span: Span,
    pub style: LabelStyle,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Where the problem is.
    Primary,
    /// Related location.
    Secondary,
}

/// Ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A bug in an earlier stage or in this pipeline, not in user code.
    Internal,
    Error,
    Warning,
    Note,
}

impl Severity {
    /// Severities that stop a compilation from producing output.
    pub fn is_fatal(self) -> bool {
        matches!(self, Severity::Internal | Severity::Error)
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::Internal => "internal error",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

/// An error code like E0200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub String);

// ============================================================================
// Builder API
// ============================================================================

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Severity::Internal, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(ErrorCode(code.into()));
        self
    }

    pub fn with_label(mut self, span: Span, style: LabelStyle, msg: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            style,
            message: Some(msg.into()),
        });
        self
    }

    pub fn with_primary(self, span: Span, msg: impl Into<String>) -> Self {
        self.with_label(span, LabelStyle::Primary, msg)
    }

    pub fn with_secondary(self, span: Span, msg: impl Into<String>) -> Self {
        self.with_label(span, LabelStyle::Secondary, msg)
    }

    /// Attach a primary span without a label message. Dummy spans are
    /// dropped, compiler-synthesized nodes have nothing to point at.
    pub fn at(mut self, span: Option<Span>) -> Self {
        if let Some(span) = span.filter(|s| !s.is_dummy()) {
            self.labels.push(Label {
                span,
                style: LabelStyle::Primary,
                message: None,
            });
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Returns the primary span (first primary label, or first label).
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.style == LabelStyle::Primary)
            .or(self.labels.first())
            .map(|l| l.span)
    }

    pub fn code_str(&self) -> Option<&str> {
        self.code.as_ref().map(|c| c.0.as_str())
    }
}

// ============================================================================
// Conversion Trait
// ============================================================================

/// Convert a component error into a diagnostic.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}

// ============================================================================
// Sink
// ============================================================================

/// Append-only collector. The pipeline writes to it and never reads back.
pub trait DiagnosticSink {
    fn push(&mut self, diagnostic: Diagnostic);

    fn report(&mut self, severity: Severity, span: Option<Span>, message: &str) {
        self.push(Diagnostic::new(severity, message).at(span));
    }

    fn emit(&mut self, error: &dyn ToDiagnostic) {
        self.push(error.to_diagnostic());
    }
}

/// The standard sink: keeps every diagnostic in order of arrival.
#[derive(Debug, Clone, Default)]
pub struct Reports {
    diagnostics: Vec<Diagnostic>,
}

impl Reports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Any internal error or error recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_fatal())
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Diagnostics whose message contains `needle`. Handy in tests.
    pub fn matching<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.message.contains(needle))
    }
}

impl DiagnosticSink for Reports {
    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn push(&mut self, diagnostic: Diagnostic) {
        Vec::push(self, diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_drops_dummy_span() {
        let mut reports = Reports::new();
        reports.report(Severity::Warning, Some(Span::DUMMY), "nothing to see");
        reports.report(Severity::Error, Some(Span::new(3, 5)), "here");
        assert_eq!(reports.diagnostics()[0].primary_span(), None);
        assert_eq!(reports.diagnostics()[1].primary_span(), Some(Span::new(3, 5)));
    }

    #[test]
    fn severity_counts() {
        let mut reports = Reports::new();
        assert!(!reports.has_errors());
        reports.report(Severity::Warning, None, "w");
        reports.report(Severity::Note, None, "n");
        assert!(!reports.has_errors());
        reports.report(Severity::Internal, None, "bug");
        assert!(reports.has_errors());
        assert_eq!(reports.count(Severity::Warning), 1);
        assert_eq!(reports.count(Severity::Internal), 1);
        assert_eq!(reports.count(Severity::Error), 0);
        assert_eq!(reports.len(), 3);
    }

    #[test]
    fn builder_chain() {
        let diag = Diagnostic::error("division by zero")
            .with_code("E0200")
            .with_primary(Span::new(0, 5), "divisor is zero")
            .with_note("the result is poisoned");
        assert_eq!(diag.code_str(), Some("E0200"));
        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.notes.len(), 1);
    }
}
