// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON diagnostic output for machine consumption.

use serde::Serialize;

use ctu_tree::LineMap;

use crate::{codes::ErrorCodeRegistry, Diagnostic, LabelStyle, Severity};

/// A complete JSON diagnostic report for a compilation run.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub file: String,
    /// No internal error and no error was recorded.
    pub success: bool,
    pub diagnostics: Vec<JsonDiagnostic>,
    pub internal_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Line/column pair (1-based).
#[derive(Debug, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonLabel {
    /// "primary" or "secondary".
    pub role: LabelStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub start: SourceLocation,
    pub end: SourceLocation,
}

/// Convert diagnostics to a structured JSON report.
pub fn to_json_report(diagnostics: &[Diagnostic], source: &str, file: &str) -> DiagnosticReport {
    let registry = ErrorCodeRegistry::default();
    let line_map = LineMap::new(source);
    let count = |severity| diagnostics.iter().filter(|d| d.severity == severity).count();

    let internal_count = count(Severity::Internal);
    let error_count = count(Severity::Error);

    DiagnosticReport {
        version: 1,
        file: file.to_string(),
        success: internal_count == 0 && error_count == 0,
        diagnostics: diagnostics
            .iter()
            .map(|d| to_json_diagnostic(d, &line_map, &registry))
            .collect(),
        internal_count,
        error_count,
        warning_count: count(Severity::Warning),
    }
}

fn to_json_diagnostic(
    diag: &Diagnostic,
    line_map: &LineMap,
    registry: &ErrorCodeRegistry,
) -> JsonDiagnostic {
    let locate = |offset: usize| {
        let (line, column) = line_map.line_col(offset);
        SourceLocation {
            line,
            column,
            byte_offset: offset,
        }
    };

    let code = diag.code_str().map(str::to_string);
    let category = diag
        .code_str()
        .and_then(|c| registry.get(c))
        .map(|info| info.category.to_string());

    JsonDiagnostic {
        severity: diag.severity,
        code,
        category,
        message: diag.message.clone(),
        location: diag.primary_span().map(|s| locate(s.start)),
        labels: diag
            .labels
            .iter()
            .map(|l| JsonLabel {
                role: l.style,
                message: l.message.clone(),
                start: locate(l.span.start),
                end: locate(l.span.end),
            })
            .collect(),
        notes: diag.notes.clone(),
        help: diag.help.clone(),
    }
}

/// Serialize a diagnostic report to pretty JSON.
pub fn to_json_string(report: &DiagnosticReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
