// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatter for diagnostics.
//!
//! ```text
//! error[E0200]: division by zero
//!   --> consts.ct:3:9
//!    |
//!  3 | var y = 7 / 0;
//!    |         ^^^^^ divisor is zero
//!    |
//!    = note: the initializer is poisoned
//! ```
//!
//! Diagnostics without a usable span render as the header line plus notes.

use colored::Colorize;

use ctu_tree::LineMap;

use crate::{Diagnostic, LabelStyle, Severity};

/// Formats diagnostics for terminal output.
pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    line_map: LineMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            file_name: None,
            line_map: LineMap::new(source),
        }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        self.format_header(&mut out, diagnostic);

        let span = diagnostic
            .primary_span()
            .filter(|s| s.start <= self.source.len());
        if let Some(span) = span {
            let (line, col) = self.line_map.line_col(span.start);
            let text = self.line_map.line(self.source, line).unwrap_or("");
            let gutter = line.to_string().len().max(2);
            let file = self.file_name.unwrap_or("<source>");

            out.push_str(&format!("  {} {}:{}:{}\n", "-->".blue(), file, line, col));
            out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
            out.push_str(&format!(
                "{:>width$} {} {}\n",
                line.to_string().blue().bold(),
                "|".blue(),
                text,
                width = gutter + 1,
            ));

            // Multi-line spans are underlined to the end of their first line.
            let line_end = text.len() + 1;
            let (end_line, end_col) = self.line_map.line_col(span.end.min(self.source.len()));
            let end_col = if end_line == line { end_col } else { line_end };
            let width = end_col.saturating_sub(col).max(1);

            for label in &diagnostic.labels {
                if label.span != span {
                    continue;
                }
                let marks = match label.style {
                    LabelStyle::Primary => "^".repeat(width).red().bold(),
                    LabelStyle::Secondary => "-".repeat(width).blue(),
                };
                let msg = label.message.as_deref().unwrap_or("");
                out.push_str(&format!(
                    "{} {} {}{} {}\n",
                    " ".repeat(gutter + 1),
                    "|".blue(),
                    " ".repeat(col - 1),
                    marks,
                    msg.red().bold(),
                ));
                break;
            }

            if !diagnostic.notes.is_empty() || diagnostic.help.is_some() {
                out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
            }
        }

        self.format_footer(&mut out, diagnostic);
        out
    }

    fn format_header(&self, out: &mut String, diagnostic: &Diagnostic) {
        let name = diagnostic.severity.name();
        let severity_str = match diagnostic.severity {
            Severity::Internal => name.magenta().bold(),
            Severity::Error => name.red().bold(),
            Severity::Warning => name.yellow().bold(),
            Severity::Note => name.blue().bold(),
        };

        match diagnostic.code_str() {
            Some(code) => out.push_str(&format!(
                "{}[{}]: {}\n",
                severity_str,
                code.red().bold(),
                diagnostic.message.bold()
            )),
            None => out.push_str(&format!("{}: {}\n", severity_str, diagnostic.message.bold())),
        }
    }

    fn format_footer(&self, out: &mut String, diagnostic: &Diagnostic) {
        for note in &diagnostic.notes {
            out.push_str(&format!("   {} {}: {}\n", "=".cyan(), "note".cyan().bold(), note));
        }
        if let Some(help) = &diagnostic.help {
            out.push_str(&format!("   {} {}: {}\n", "=".cyan(), "help".cyan().bold(), help));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctu_tree::Span;

    #[test]
    fn renders_location_and_underline() {
        colored::control::set_override(false);
        let src = "var x = 1;\nvar y = 7 / 0;\n";
        let diag = Diagnostic::error("division by zero")
            .with_code("E0200")
            .with_primary(Span::new(19, 24), "divisor is zero")
            .with_note("the initializer is poisoned");
        let out = DiagnosticFormatter::new(src)
            .with_file_name("consts.ct")
            .format(&diag);
        assert!(out.starts_with("error[E0200]: division by zero\n"));
        assert!(out.contains("--> consts.ct:2:9"));
        assert!(out.contains("var y = 7 / 0;"));
        assert!(out.contains("        ^^^^^ divisor is zero"));
        assert!(out.contains("= note: the initializer is poisoned"));
    }

    #[test]
    fn spanless_is_header_only() {
        colored::control::set_override(false);
        let diag = Diagnostic::internal("unresolved jump target");
        let out = DiagnosticFormatter::new("").format(&diag);
        assert_eq!(out, "internal error: unresolved jump target\n");
    }
}
