//! Output→input position mapping.
//!
//! While the generators emit target text they record, for every node that
//! carries a source span, the (line, column) pair at which its rendering
//! started in the output unit together with the (line, column) of the span in
//! the input. The table is kept in emission order and is not encoded into any
//! particular on-disk serialization here.

use serde::Serialize;

/// A single output→input position pair. All positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionMapping {
    pub out_line: u32,
    pub out_col: u32,
    pub src_line: u32,
    pub src_col: u32,
}

/// Ordered collection of position mappings for one output unit.
///
/// Backed by a `Vec` in emission order so the table is byte-identical across
/// runs over the same IR.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PositionMap {
    entries: Vec<PositionMapping>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, out_line: u32, out_col: u32, src_line: u32, src_col: u32) {
        self.entries.push(PositionMapping {
            out_line,
            out_col,
            src_line,
            src_col,
        });
    }

    pub fn entries(&self) -> &[PositionMapping] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
