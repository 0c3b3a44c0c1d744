//! Shared infrastructure for the tscpp translation core.
//!
//! Provides byte-offset spans with on-demand line/column lookup, the
//! diagnostics model (severity, code, message, location) with an accumulating
//! sink, ariadne-based rendering, and the output→input position-mapping table
//! recorded during code generation.

pub mod diag;
pub mod render;
pub mod span;
pub mod srcmap;

pub use diag::{DiagnosticSink, Diagnostic, FatalError, Severity};
pub use span::{LineIndex, Span};
pub use srcmap::{PositionMap, PositionMapping};
