//! Indented text emitter.
//!
//! Tracks the current output line and column so expression generators can
//! record position mappings as they go. Indentation is four spaces per level
//! unless configured otherwise.

use tscpp_common::{LineIndex, PositionMap, Span};

pub struct Emitter {
    buf: String,
    line: u32,
    col: u32,
    at_line_start: bool,
    indent_size: usize,
    map: PositionMap,
}

impl Emitter {
    pub fn new(indent_size: usize) -> Emitter {
        Emitter {
            buf: String::new(),
            line: 0,
            col: 0,
            at_line_start: true,
            indent_size,
            map: PositionMap::new(),
        }
    }

    /// Write raw text at the current position, indenting first if this is the
    /// start of a line. Text containing newlines updates the line counter.
    pub fn write(&mut self, ctx_indent: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            let pad = ctx_indent * self.indent_size;
            for _ in 0..pad {
                self.buf.push(' ');
            }
            self.col = pad as u32;
            self.at_line_start = false;
        }
        for ch in text.chars() {
            self.buf.push(ch);
            if ch == '\n' {
                self.line += 1;
                self.col = 0;
                self.at_line_start = true;
            } else {
                self.col += 1;
            }
        }
    }

    /// Write a full line: indent, text, newline.
    pub fn line(&mut self, ctx_indent: usize, text: &str) {
        self.write(ctx_indent, text);
        self.newline();
    }

    pub fn newline(&mut self) {
        self.buf.push('\n');
        self.line += 1;
        self.col = 0;
        self.at_line_start = true;
    }

    /// A blank separator line, collapsed if the output already ends with one.
    pub fn blank(&mut self) {
        if self.buf.ends_with("\n\n") || self.buf.is_empty() {
            return;
        }
        self.newline();
    }

    /// Record that the text about to be emitted renders the node spanning
    /// `span` in the original source.
    pub fn mark(&mut self, span: Option<Span>, index: Option<&LineIndex>) {
        let (Some(span), Some(index)) = (span, index) else {
            return;
        };
        let (src_line, src_col) = index.line_col(span.start);
        // Internal counters are 0-based; the mapping table is 1-based like
        // the line index.
        self.map.record(self.line + 1, self.col + 1, src_line, src_col);
    }

    pub fn current_line(&self) -> u32 {
        self.line
    }

    pub fn finish(self) -> (String, PositionMap) {
        (self.buf, self.map)
    }
}
