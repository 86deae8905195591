//! The insertion path.
//!
//! Inserting a character is the most involved edit: depending on mode it
//! splices or overwrites bytes, rewraps the rows at and below the cursor,
//! works around the terminal's deferred last-column wrap, scrolls when the
//! edit grows past the bottom of the window, or shifts the horizontal
//! window in single-line mode. Everything a single keystroke causes is
//! emitted as one batched write.

use super::LineEditor;
use crate::ansi::sequences::{CLEAR_LINE_RIGHT, INSERT_LINE, SCROLL_INDICATOR, SCROLL_UP};
use crate::error::Result;
use crate::unicode::{char_at, offset_after_n_chars, prev_char_start, visible_width};

impl LineEditor {
    /// Insert or overwrite one character at the cursor.
    pub(super) fn insert_char(&mut self, c: char) -> Result<()> {
        let mut encoded = [0u8; 4];
        let len = c.encode_utf8(&mut encoded).len();

        if self.buffer.is_empty() && !self.empty_message.is_empty() {
            // The dimmed hint occupies the input area; erase it before the
            // first character lands.
            self.push_str(CLEAR_LINE_RIGHT);
        }

        // Appending while the final row is exactly full: the cursor is
        // saturated at the last column and the new character opens a row.
        let appending_past_full_row = self.multiline
            && self.offset == self.buffer.len()
            && !self.buffer.is_empty()
            && self.raw_cursor_column() == self.term_cols;

        // Whether the emitted bytes left the terminal cursor somewhere
        // other than directly after the inserted character.
        let displaced;

        if self.insert || self.offset == self.buffer.len() {
            self.buffer
                .splice(self.offset..self.offset, encoded[..len].iter().copied());
            self.nchars += 1;

            displaced = if self.multiline {
                self.insert_redraw_multiline(len, appending_past_full_row)
            } else {
                self.insert_redraw_single_line(len)
            };
        } else {
            self.overwrite_at_cursor(&encoded[..len]);
            displaced = false;
        }

        self.offset += len;
        self.pos_x += 1;
        self.requested_pos_x = self.pos_x;

        let mut force_move = false;
        if self.pos_x == self.term_cols {
            if self.pos_y + 1 < self.line_offset.len() {
                self.pos_x = 0;
                self.pos_y += 1;
            } else {
                // No continuation row (overwrite of the final character
                // of an exactly-full row, or a single-line view): the
                // cursor saturates at the last column.
                self.pos_x = self.term_cols - 1;
            }
            // Without an explicit move the cursor stays hanging in the
            // last column after the character is written there.
            force_move = true;
        }

        if displaced || force_move {
            self.move_to(self.pos_x as i32, self.pos_y as i32);
        }
        self.flush()
    }

    /// Redraw after splicing `len` bytes in multiline mode.
    ///
    /// Returns whether the cursor was left away from its natural spot.
    fn insert_redraw_multiline(&mut self, len: usize, past_full_row: bool) -> bool {
        self.recompute_line_offsets(self.pos_y);

        let tail = self.buffer.len() - self.offset;
        let displaced;
        if past_full_row {
            // The cursor is saturated at the end of an exactly-full row.
            // Rewrite that row's last character together with the new one
            // through the last column so the terminal records the line
            // continuation, and un-saturate the model onto the row the
            // rewrap just created.
            self.move_to(self.term_cols as i32, self.pos_y as i32);
            let prev = prev_char_start(&self.buffer, self.offset);
            let end = self.buffer.len();
            self.push_buffer_range(prev, end);
            self.pos_x = 0;
            self.pos_y += 1;
            displaced = false;
        } else if self.pos_x == 0 && self.pos_y > 0 && self.offset + len == self.buffer.len() {
            // Terminal emulators remember whether a line continues past
            // the last column, and only if the continuation was produced
            // by writing through it. Our model already wrapped the cursor;
            // rewrite the previous character together with the new one at
            // the old row's last column so the continuation is recorded.
            self.move_to(self.term_cols as i32, self.pos_y as i32 - 1);
            let prev = prev_char_start(&self.buffer, self.offset);
            let end = self.buffer.len();
            self.push_buffer_range(prev, end);
            displaced = false;
        } else {
            let end = self.buffer.len();
            self.push_buffer_range(self.offset, end);
            displaced = tail > len;
        }

        if self.line_offset.len() > self.max_lines {
            debug_assert_eq!(self.line_offset.len(), self.max_lines + 1);
            self.max_lines = self.line_offset.len();
            if usize::from(self.initial_row) + self.line_offset.len() - 1 + self.cur_frame_lines
                > self.term_rows
            {
                // The new row falls below the window: scroll everything up
                // and open a blank row at the cursor line.
                self.initial_row = self.initial_row.saturating_sub(1);
                self.push_str(SCROLL_UP);
                self.push_str("\r");
                self.push_str(INSERT_LINE);
            } else if self.cur_frame_lines > 0 {
                // Push the bottom frame row down to make room.
                self.push_str("\n");
                self.push_str(INSERT_LINE);
            }
        }

        displaced
    }

    /// Redraw after splicing `len` bytes in single-line scrolling mode.
    fn insert_redraw_single_line(&mut self, len: usize) -> bool {
        let threshold = (self.term_cols * 9 / 10).max(1);
        if self.pos_x + 1 > threshold {
            // Shift the window right by about a tenth of the width.
            let step = (self.term_cols / 10).max(1);
            let (mut first, _) = offset_after_n_chars(&self.buffer, self.line_offset[0], step);
            if first > self.offset {
                first = self.offset;
            }
            self.line_offset[0] = first;

            self.move_to(0, 0);
            self.push_str(SCROLL_INDICATOR);
            self.pos_x = 1 + visible_width(&self.buffer[first..self.offset]);
            let (end, _) = offset_after_n_chars(&self.buffer, first, self.term_cols - 1);
            self.push_buffer_range(first, end);
            true
        } else {
            // Draw the tail out to the right edge of the window.
            let room = self.term_cols - 1 - self.pos_x;
            let (end, _) = offset_after_n_chars(&self.buffer, self.offset, room);
            let displaced = end - self.offset > len;
            self.push_buffer_range(self.offset, end);
            displaced
        }
    }

    /// Replace the codepoint at the cursor with `bytes`.
    ///
    /// When the encoded lengths differ, the buffer is resized at the
    /// cursor and the row offsets below shift by the signed byte delta;
    /// the column layout is unchanged because one codepoint replaces one
    /// codepoint.
    fn overwrite_at_cursor(&mut self, bytes: &[u8]) {
        let (_, old_len) = char_at(&self.buffer, self.offset);
        let new_len = bytes.len();

        if new_len != old_len {
            if new_len > old_len {
                let filler = std::iter::repeat(0u8).take(new_len - old_len);
                self.buffer.splice(self.offset..self.offset, filler);
            } else {
                self.buffer
                    .drain(self.offset..self.offset + (old_len - new_len));
            }
            let delta = new_len as isize - old_len as isize;
            for row_offset in &mut self.line_offset[self.pos_y + 1..] {
                *row_offset = (*row_offset as isize + delta) as usize;
            }
        }

        self.buffer[self.offset..self.offset + new_len].copy_from_slice(bytes);
        let end = self.offset + new_len;
        self.push_buffer_range(self.offset, end);
    }

    /// Queue `buffer[start..end]` for output.
    fn push_buffer_range(&mut self, start: usize, end: usize) {
        // Split borrow: `out` and `buffer` are disjoint fields.
        let Self { out, buffer, .. } = self;
        out.extend_from_slice(&buffer[start..end]);
    }
}
