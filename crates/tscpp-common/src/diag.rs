use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic record produced during type mapping, ownership
/// resolution, or code generation.
///
/// Recoverable conditions (unsupported constructs, unresolved types,
/// ownership conflicts) accumulate as diagnostics and never stop generation
/// of a unit. Fatal conditions are modeled separately as [`FatalError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable diagnostic code, e.g. `W0001`.
    pub code: &'static str,
    pub message: String,
    pub span: Option<Span>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Accumulating sink for diagnostics, in emission order.
///
/// Emission order is part of the deterministic output contract: two runs over
/// the same IR produce the same diagnostics in the same order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DiagnosticSink {
    records: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, code: &'static str, message: impl Into<String>, span: Option<Span>) {
        self.push(Severity::Info, code, message.into(), span);
    }

    pub fn warning(&mut self, code: &'static str, message: impl Into<String>, span: Option<Span>) {
        self.push(Severity::Warning, code, message.into(), span);
    }

    pub fn error(&mut self, code: &'static str, message: impl Into<String>, span: Option<Span>) {
        self.push(Severity::Error, code, message.into(), span);
    }

    fn push(&mut self, severity: Severity, code: &'static str, message: String, span: Option<Span>) {
        self.records.push(Diagnostic {
            severity,
            code,
            message,
            span,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn warning_count(&self) -> usize {
        self.records
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.records
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    /// Append all records from another sink, preserving order.
    pub fn extend(&mut self, other: DiagnosticSink) {
        self.records.extend(other.records);
    }
}

/// A fatal, unit-aborting failure.
///
/// Fatal errors indicate either malformed input from the front end or a
/// defect in an earlier pass (a structural invariant violation), never a
/// recoverable property of the user's program. A unit that hits one produces
/// no output; independently compiled units are unaffected.
#[derive(Debug, Clone, PartialEq)]
pub enum FatalError {
    /// An `Auto` ownership category survived resolution and reached the
    /// generator. Always a defect in an earlier pass.
    UnresolvedAuto { binding: String },
    /// A node is missing fields its kind requires.
    MalformedNode { construct: String, detail: String },
    /// The front end handed over input the core cannot interpret.
    InvalidInput { detail: String },
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::UnresolvedAuto { binding } => {
                write!(
                    f,
                    "unresolved Auto ownership reached the generator for `{binding}`"
                )
            }
            FatalError::MalformedNode { construct, detail } => {
                write!(f, "malformed {construct} node: {detail}")
            }
            FatalError::InvalidInput { detail } => {
                write!(f, "invalid input from front end: {detail}")
            }
        }
    }
}

impl std::error::Error for FatalError {}
