//! Wrapped-row geometry.
//!
//! `line_offset[r]` is the byte offset of the first codepoint on visual
//! row `r`. Row 0 shares its width with the prompt; every other row spans
//! the full terminal width. The vector is rebuilt incrementally from a
//! given row onward after edits, so edits near the end of a long buffer
//! do not re-scan the beginning.

use super::LineEditor;
use crate::unicode::{offset_after_n_chars, visible_width};

impl LineEditor {
    /// Columns available for buffer content on row `row`.
    pub(super) fn row_columns(&self, row: usize) -> usize {
        if row == 0 {
            self.term_cols - self.prompt_len
        } else {
            self.term_cols
        }
    }

    /// Rebuild `line_offset` from row `from_row` onward.
    ///
    /// Rows before `from_row` are untouched; everything after is derived
    /// by consuming full-width runs of codepoints. A trailing run narrower
    /// than the width terminates the layout, so the last row is always
    /// strictly narrower than the terminal.
    pub(super) fn recompute_line_offsets(&mut self, from_row: usize) {
        debug_assert!(from_row < self.line_offset.len());
        debug_assert!(
            self.prompt_len < self.term_cols,
            "prompt must be narrower than the terminal"
        );

        self.line_offset.truncate(from_row + 1);
        let mut o = self.line_offset[from_row];
        let mut avail = self.row_columns(from_row);
        loop {
            let (next, consumed) = offset_after_n_chars(&self.buffer, o, avail);
            if consumed < avail {
                break;
            }
            self.line_offset.push(next);
            o = next;
            avail = self.term_cols;
        }
    }

    /// Unclamped visual column of `offset` within its current row.
    pub(super) fn raw_cursor_column(&self) -> usize {
        let prompt = if self.pos_y == 0 { self.prompt_len } else { 0 };
        prompt + visible_width(&self.buffer[self.line_offset[self.pos_y]..self.offset])
    }

    /// Drop a trailing empty row left behind by a deletion.
    ///
    /// Filling a row to the brim legitimately creates an empty
    /// continuation row (the cursor sits at its start, ready for the next
    /// character). After a deletion that state is pointless; the row is
    /// dropped, and a cursor that sat on it saturates at the last column
    /// of the now-final row.
    pub(super) fn trim_trailing_empty_row(&mut self) {
        let last = self.line_offset.len() - 1;
        if last > 0 && self.line_offset[last] == self.buffer.len() {
            self.line_offset.pop();
            if self.pos_y >= self.line_offset.len() {
                self.pos_y = self.line_offset.len() - 1;
                self.pos_x = self.term_cols - 1;
            }
        }
    }

    /// Derive `pos_x`/`pos_y` from `offset` by walking `line_offset`.
    ///
    /// An offset that sits exactly on a row boundary belongs to the start
    /// of the later row.
    pub(super) fn sync_pos_from_offset(&mut self) {
        while self.line_offset[self.pos_y] > self.offset {
            debug_assert!(self.pos_y > 0);
            self.pos_y -= 1;
        }
        while self.pos_y + 1 < self.line_offset.len()
            && self.offset >= self.line_offset[self.pos_y + 1]
        {
            self.pos_y += 1;
        }
        self.pos_x = visible_width(&self.buffer[self.line_offset[self.pos_y]..self.offset]);
        if self.pos_y == 0 {
            self.pos_x += self.prompt_len;
        }
        // Past the end of an exactly-full final row the cursor saturates
        // at the last column, like the terminal's own cursor does.
        if self.pos_x >= self.term_cols {
            self.pos_x = self.term_cols - 1;
        }
    }
}
