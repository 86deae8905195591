//! Key bindings and edit actions.
//!
//! The binding table is process-wide constant state: a lookup from
//! `(key code, modifier mask)` to an [`EditAction`]. Unmodified Unicode
//! keys never reach the table; they go straight to the insertion path.
//!
//! Each action mutates the session state and queues the minimal byte
//! sequence that brings the display in line, flushed as one write.

use super::LineEditor;
use crate::ansi::sequences::CLEAR_LINE_RIGHT;
use crate::error::Result;
use crate::input::{KeyCode, KeyModifiers};
use crate::unicode::{
    char_at, is_word_char, offset_after_n_chars, prev_char_start, utf8_step, visible_width,
};

/// An editing command bound to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditAction {
    /// Move to the start of the input.
    BeginningOfLine,
    /// Move past the last character.
    EndOfLine,
    /// Toggle insert/overwrite mode.
    ToggleInsert,
    /// Finish the edit and return the line.
    Commit,
    /// Move one character left.
    BackwardChar,
    /// Move one character right.
    ForwardChar,
    /// Move to the previous visual row.
    PreviousScreenLine,
    /// Move to the next visual row.
    NextScreenLine,
    /// Delete the character before the cursor.
    Backspace,
    /// Delete the character at the cursor.
    Delete,
    /// Move to the start of the previous word.
    BackwardWord,
    /// Move past the end of the next word.
    ForwardWord,
    /// Discard everything before the cursor.
    DiscardToStart,
    /// Discard everything from the cursor on.
    KillToEnd,
}

/// The key binding table.
const BINDINGS: &[(KeyCode, KeyModifiers, EditAction)] = &[
    (KeyCode::Char('a'), KeyModifiers::CTRL, EditAction::BeginningOfLine),
    (KeyCode::Home, KeyModifiers::empty(), EditAction::BeginningOfLine),
    (KeyCode::Char('e'), KeyModifiers::CTRL, EditAction::EndOfLine),
    (KeyCode::End, KeyModifiers::empty(), EditAction::EndOfLine),
    (KeyCode::Insert, KeyModifiers::empty(), EditAction::ToggleInsert),
    (KeyCode::Enter, KeyModifiers::empty(), EditAction::Commit),
    (KeyCode::Left, KeyModifiers::empty(), EditAction::BackwardChar),
    (KeyCode::Right, KeyModifiers::empty(), EditAction::ForwardChar),
    (KeyCode::Up, KeyModifiers::empty(), EditAction::PreviousScreenLine),
    (KeyCode::Down, KeyModifiers::empty(), EditAction::NextScreenLine),
    (KeyCode::Backspace, KeyModifiers::empty(), EditAction::Backspace),
    (KeyCode::Delete, KeyModifiers::empty(), EditAction::Delete),
    (KeyCode::Char('b'), KeyModifiers::ALT, EditAction::BackwardWord),
    (KeyCode::Char('f'), KeyModifiers::ALT, EditAction::ForwardWord),
    (KeyCode::Char('u'), KeyModifiers::CTRL, EditAction::DiscardToStart),
    (KeyCode::Char('k'), KeyModifiers::CTRL, EditAction::KillToEnd),
];

/// Look up the action bound to `(code, mods)`.
///
/// `mods` must already be masked to ALT|SHIFT|CTRL.
pub(super) fn lookup(code: KeyCode, mods: KeyModifiers) -> Option<EditAction> {
    BINDINGS
        .iter()
        .find(|(c, m, _)| *c == code && *m == mods)
        .map(|(_, _, action)| *action)
}

impl LineEditor {
    /// Apply a bound action. Returns true on commit.
    pub(super) fn apply_action(&mut self, action: EditAction) -> Result<bool> {
        match action {
            EditAction::Commit => return Ok(true),
            EditAction::BeginningOfLine => self.beginning_of_line()?,
            EditAction::EndOfLine => self.end_of_line()?,
            EditAction::ToggleInsert => self.insert = !self.insert,
            EditAction::BackwardChar => self.backward_char()?,
            EditAction::ForwardChar => self.forward_char()?,
            EditAction::PreviousScreenLine => self.previous_screen_line()?,
            EditAction::NextScreenLine => self.next_screen_line()?,
            EditAction::Backspace => self.backspace()?,
            EditAction::Delete => self.delete()?,
            EditAction::BackwardWord => self.backward_word()?,
            EditAction::ForwardWord => self.forward_word()?,
            EditAction::DiscardToStart => self.discard_to_start()?,
            EditAction::KillToEnd => self.kill_to_end()?,
        }
        Ok(false)
    }

    fn beginning_of_line(&mut self) -> Result<()> {
        if self.offset != 0 {
            self.offset = 0;
            self.pos_x = self.prompt_len;
            self.pos_y = 0;
            self.move_to(self.pos_x as i32, 0);
            self.flush()?;
        }
        Ok(())
    }

    fn end_of_line(&mut self) -> Result<()> {
        if self.offset != self.buffer.len() {
            self.offset = self.buffer.len();
            self.sync_pos_from_offset();
            self.requested_pos_x = self.pos_x;
            self.move_to(self.pos_x as i32, self.pos_y as i32);
            self.flush()?;
        }
        Ok(())
    }

    /// Move the cursor state one character left without emitting.
    ///
    /// Caller guarantees `offset > 0`. In multiline mode the position is
    /// re-derived from the new offset, which saturates the column crossing
    /// a row boundary; single-line mode only moves the column (the window
    /// does not scroll back).
    fn step_backward_char(&mut self) {
        self.offset = prev_char_start(&self.buffer, self.offset);
        if self.multiline {
            self.sync_pos_from_offset();
        } else if self.pos_x > 0 {
            self.pos_x -= 1;
        }
        self.requested_pos_x = self.pos_x;
    }

    fn backward_char(&mut self) -> Result<()> {
        if self.offset > 0 {
            self.step_backward_char();
            self.move_to(self.pos_x as i32, self.pos_y as i32);
            self.flush()?;
        }
        Ok(())
    }

    fn forward_char(&mut self) -> Result<()> {
        if self.offset < self.buffer.len() {
            self.offset += utf8_step(self.buffer[self.offset]);
            if self.multiline {
                self.sync_pos_from_offset();
            } else if self.pos_x + 1 < self.term_cols {
                self.pos_x += 1;
            }
            self.requested_pos_x = self.pos_x;
            self.move_to(self.pos_x as i32, self.pos_y as i32);
            self.flush()?;
        }
        Ok(())
    }

    fn previous_screen_line(&mut self) -> Result<()> {
        if self.pos_y == 0 {
            return Ok(());
        }
        // Moving onto row 0 with the sticky target left of the prompt is
        // refused; the prompt is not enterable.
        if self.pos_y == 1 && self.requested_pos_x < self.prompt_len {
            return Ok(());
        }
        self.pos_y -= 1;
        let target = self.requested_pos_x
            - if self.pos_y == 0 { self.prompt_len } else { 0 };
        let (offset, consumed) =
            offset_after_n_chars(&self.buffer, self.line_offset[self.pos_y], target);
        self.offset = offset;
        self.pos_x = consumed + if self.pos_y == 0 { self.prompt_len } else { 0 };
        self.move_to(self.pos_x as i32, self.pos_y as i32);
        self.flush()
    }

    fn next_screen_line(&mut self) -> Result<()> {
        if self.pos_y + 1 >= self.line_offset.len() {
            return Ok(());
        }
        self.pos_y += 1;
        let (offset, consumed) = offset_after_n_chars(
            &self.buffer,
            self.line_offset[self.pos_y],
            self.requested_pos_x,
        );
        // Rows past the first carry no prompt, so the consumed count is
        // the column; a short last row leaves the cursor at its end.
        self.offset = offset;
        self.pos_x = consumed;
        self.move_to(self.pos_x as i32, self.pos_y as i32);
        self.flush()
    }

    fn backspace(&mut self) -> Result<()> {
        if self.offset == 0 {
            return Ok(());
        }
        let old_offset = self.offset;
        self.step_backward_char();
        self.move_to(self.pos_x as i32, self.pos_y as i32);
        self.buffer.drain(self.offset..old_offset);
        self.nchars -= 1;
        if self.multiline {
            self.recompute_line_offsets(self.pos_y);
            self.trim_trailing_empty_row();
        }
        self.redraw_deleted_suffix()
    }

    fn delete(&mut self) -> Result<()> {
        if self.offset == self.buffer.len() {
            return Ok(());
        }
        let len = utf8_step(self.buffer[self.offset]);
        self.buffer.drain(self.offset..self.offset + len);
        self.nchars -= 1;
        if self.multiline {
            self.recompute_line_offsets(self.pos_y);
            self.trim_trailing_empty_row();
        }
        self.redraw_deleted_suffix()
    }

    /// Rewrite the buffer from the cursor on, blank the column freed by
    /// the deletion, and park the cursor, all in one write.
    fn redraw_deleted_suffix(&mut self) -> Result<()> {
        self.out.extend_from_slice(&self.buffer[self.offset..]);
        self.out.push(b' ');
        self.requested_pos_x = self.pos_x;
        self.move_to(self.pos_x as i32, self.pos_y as i32);
        self.flush()
    }

    fn backward_word(&mut self) -> Result<()> {
        if self.offset == 0 {
            return Ok(());
        }

        let mut p = prev_char_start(&self.buffer, self.offset);
        let (mut current, _) = char_at(&self.buffer, p);
        while p > 0 {
            let q = prev_char_start(&self.buffer, p);
            let (before, _) = char_at(&self.buffer, q);
            if is_word_char(current) && !is_word_char(before) {
                break;
            }
            p = q;
            current = before;
        }

        self.offset = p;
        self.sync_pos_from_offset();
        self.requested_pos_x = self.pos_x;
        self.move_to(self.pos_x as i32, self.pos_y as i32);
        self.flush()
    }

    fn forward_word(&mut self) -> Result<()> {
        if self.offset == self.buffer.len() {
            return Ok(());
        }

        // Start at the character after the cursor's, then stop after the
        // next word-to-nonword transition (or at the end of the buffer).
        let mut p = self.offset + utf8_step(self.buffer[self.offset]);
        while p < self.buffer.len() {
            let (current, len) = char_at(&self.buffer, p);
            let next_off = p + len;
            if next_off >= self.buffer.len() {
                p = self.buffer.len();
                break;
            }
            let (lookahead, _) = char_at(&self.buffer, next_off);
            p = next_off;
            if is_word_char(current) && !is_word_char(lookahead) {
                break;
            }
        }

        self.offset = p;
        self.sync_pos_from_offset();
        self.requested_pos_x = self.pos_x;
        self.move_to(self.pos_x as i32, self.pos_y as i32);
        self.flush()
    }

    fn discard_to_start(&mut self) -> Result<()> {
        if self.offset == 0 {
            return Ok(());
        }

        self.nchars -= visible_width(&self.buffer[..self.offset]);
        self.buffer.drain(..self.offset);
        self.offset = 0;

        let old_rows = self.line_offset.len();
        self.line_offset.clear();
        self.line_offset.push(0);
        if self.multiline {
            self.recompute_line_offsets(0);
            self.trim_trailing_empty_row();
        }
        let lost_rows = old_rows.saturating_sub(self.line_offset.len());

        self.pos_y = 0;
        self.pos_x = self.prompt_len;
        self.requested_pos_x = self.pos_x;

        // Rewrite the remaining rows with explicit positioning per row; a
        // rewrite that ends exactly in the last column would otherwise
        // leave the cursor hanging there and the following clear would eat
        // the character.
        for row in 0..self.line_offset.len() {
            let x = if row == 0 { self.prompt_len } else { 0 };
            self.move_to(x as i32, row as i32);
            let start = self.line_offset[row];
            let end = if row + 1 < self.line_offset.len() {
                self.line_offset[row + 1]
            } else {
                self.buffer.len()
            };
            let Self { out, buffer, .. } = &mut *self;
            out.extend_from_slice(&buffer[start..end]);
            self.push_str(CLEAR_LINE_RIGHT);
        }
        for _ in 0..lost_rows {
            self.push_str("\n");
            self.push_str(CLEAR_LINE_RIGHT);
        }
        self.move_to(self.prompt_len as i32, 0);
        self.flush()
    }

    fn kill_to_end(&mut self) -> Result<()> {
        if self.offset == self.buffer.len() {
            return Ok(());
        }

        self.nchars -= visible_width(&self.buffer[self.offset..]);
        self.buffer.truncate(self.offset);

        let old_rows = self.line_offset.len();
        if self.multiline {
            self.recompute_line_offsets(self.pos_y);
        } else if self.line_offset[0] > self.buffer.len() {
            // The cursor sat left of the scroll window; the window cannot
            // start past the new end.
            self.line_offset[0] = self.buffer.len();
        }
        let lost_rows = old_rows.saturating_sub(self.line_offset.len());

        self.push_str(CLEAR_LINE_RIGHT);
        for _ in 0..lost_rows {
            self.push_str("\n");
            self.push_str(CLEAR_LINE_RIGHT);
        }
        if lost_rows > 0 {
            self.move_to(self.pos_x as i32, self.pos_y as i32);
        }
        self.flush()
    }
}
