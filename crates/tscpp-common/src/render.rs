//! Ariadne-based rendering of diagnostic records.
//!
//! Converts accumulated [`Diagnostic`] records into formatted, labeled
//! reports against the original source text. Output is colorless so test
//! snapshots stay stable across terminals.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::diag::{Diagnostic, DiagnosticSink, Severity};

/// Render a single diagnostic into a formatted string.
///
/// The diagnostic's span is clamped to the source bounds; a diagnostic with
/// no span is anchored at the start of the source.
pub fn render_diagnostic(diag: &Diagnostic, source: &str) -> String {
    let source_len = source.len();

    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        // Ariadne needs at least a one-character span.
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let range = match diag.span {
        Some(span) => clamp(span.start as usize..span.end as usize),
        None => clamp(0..1),
    };

    let (kind, color) = match diag.severity {
        Severity::Info => (ReportKind::Advice, Color::Blue),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
        Severity::Error => (ReportKind::Error, Color::Red),
    };

    let report = Report::build(kind, range.clone())
        .with_code(diag.code)
        .with_message(&diag.message)
        .with_config(Config::default().with_color(false))
        .with_label(
            Label::new(range)
                .with_message(&diag.message)
                .with_color(color),
        )
        .finish();

    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

/// Render every record in a sink, one report per record, in emission order.
pub fn render_all(sink: &DiagnosticSink, source: &str) -> String {
    let mut out = String::new();
    for diag in sink.iter() {
        out.push_str(&render_diagnostic(diag, source));
    }
    out
}
