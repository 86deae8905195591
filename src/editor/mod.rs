//! The interactive line-edit session.
//!
//! A [`LineEditor`] binds to a terminal file descriptor and repeatedly
//! produces finished input lines. Between keystrokes it maintains a live
//! rendering of the buffer: cursor motion, insertion, overwrite, deletion,
//! word navigation, line discard, and wrapping inside the terminal width.
//!
//! The session is driven by an event multiplexer. Either the editor owns
//! one ([`LineEditor::new`] plus [`LineEditor::read`]), or the host owns it
//! ([`LineEditor::with_epoll`]), calls [`LineEditor::prepare`] once per
//! edit, and feeds readiness events to [`LineEditor::process`], which lets
//! the host interleave its own I/O sources on the same loop.
//!
//! All mutation is single-threaded; a `process` call consumes one
//! readiness event and greedily drains every key that is decodable from
//! it. Every redraw is assembled in an output buffer and flushed as a
//! single write so the terminal never shows intermediate state.

mod actions;
mod insert;
mod layout;
#[cfg(test)]
mod tests;

pub use actions::EditAction;

use crate::ansi::{self, sequences};
use crate::color::{Rgb, adjust};
use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_log};
use crate::input::{KeyCode, KeyDecoder, KeyEvent, KeyModifiers};
use crate::poll::{self, Epoll, WinchWatch};
use crate::terminal::{self, TermInfo};
use crate::unicode::visible_len_ignoring_csi;
use std::fmt;
use std::os::unix::io::RawFd;

/// How long to wait before a buffered lone `ESC` is taken as the Escape
/// key rather than the start of a sequence.
const ESC_DISAMBIGUATE_MS: i32 = 50;

/// Decoration drawn around the edit area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Frame {
    /// No decoration.
    #[default]
    None,
    /// A horizontal rule above and below the edit area.
    Line,
    /// Half-block bands above and below, with a tinted text background.
    Background,
}

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
    /// Between edits; `prepare` opens the next one.
    Closed,
    /// An edit is in progress.
    Open,
    /// The descriptor turned out not to be a terminal; unusable.
    Invalid,
}

/// Outcome of feeding one readiness event to [`LineEditor::process`].
#[derive(Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A finished line. Empty means cancel (Ctrl-C, or Ctrl-D / EOF on an
    /// empty buffer).
    Line(String),
    /// The event was consumed but no line is finished yet.
    Pending,
    /// The descriptor does not belong to this session; nothing was done.
    UnknownFd,
}

/// The prompt, either a literal or re-evaluated at each `prepare`.
enum Prompt {
    Literal(String),
    Callback(Box<dyn Fn() -> String + Send>),
}

impl Prompt {
    fn render(&self) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::Callback(f) => f(),
        }
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// An interactive line-edit session bound to a terminal descriptor.
#[derive(Debug)]
pub struct LineEditor {
    fd: RawFd,
    frame: Frame,
    info: TermInfo,

    // Edit buffer. Valid UTF-8 at all times; never holds a partial
    // codepoint.
    buffer: Vec<u8>,
    // Codepoint count of `buffer`.
    nchars: usize,
    // Byte offset where each wrapped visual row begins. In single-line
    // mode, the lone entry is the first visible byte of the scroll window.
    line_offset: Vec<usize>,
    // Cursor byte offset into `buffer`; always a codepoint boundary.
    offset: usize,
    // Cursor position relative to the edit area's top-left, in columns
    // and rows.
    pos_x: usize,
    pos_y: usize,
    // Sticky column target for vertical motion.
    requested_pos_x: usize,
    // 1-based terminal coordinates of the edit area's first cell.
    initial_col: u16,
    initial_row: u16,
    term_cols: usize,
    term_rows: usize,
    // Visible width of the rendered prompt, escape-aware.
    prompt_len: usize,
    // High-water mark of `line_offset.len()` during this edit.
    max_lines: usize,
    // Rows reserved below the edit area for the frame (0 or 1).
    cur_frame_lines: usize,

    multiline: bool,
    insert: bool,
    osc133: bool,

    prompt: Prompt,
    empty_message: String,
    /// Frame color; defaults to the terminal's default foreground (which
    /// renders an uncolored frame) and may be assigned before `prepare`.
    pub frame_highlight_fg: Rgb,
    // Foreground/background pair for the text area in background-frame
    // mode.
    text_colors: Option<(Rgb, Rgb)>,

    state: SessionState,
    epoll: Epoll,
    winch: Option<WinchWatch>,
    decoder: KeyDecoder,

    // Batched output; every redraw flushes this in one write.
    out: Vec<u8>,
}

impl LineEditor {
    /// Create a session that owns its event multiplexer.
    ///
    /// # Panics
    /// Panics if the epoll instance cannot be created.
    #[must_use]
    pub fn new(fd: RawFd, frame: Frame) -> Self {
        Self::build(Epoll::create(), fd, frame)
    }

    /// Create a session that registers on a host-owned epoll descriptor.
    ///
    /// The session only adds and removes its own descriptors and never
    /// consumes events addressed to others; see [`Self::process`].
    #[must_use]
    pub fn with_epoll(epfd: RawFd, fd: RawFd, frame: Frame) -> Self {
        Self::build(Epoll::borrowed(epfd), fd, frame)
    }

    fn build(epoll: Epoll, fd: RawFd, frame: Frame) -> Self {
        let info = TermInfo::detect();

        let mut frame_highlight_fg = info.default_foreground;
        let mut text_colors = None;
        if frame == Frame::Background {
            // The band and text area use slightly shifted versions of the
            // default colors.
            let (text_fg, band_bg) =
                adjust(info.default_foreground, info.default_background, 32);
            frame_highlight_fg = band_bg;
            text_colors = Some((text_fg, band_bg));
        }

        let osc133 = info.semantic_prompts;
        let (cols, rows) = terminal::window_size(fd);

        Self {
            fd,
            frame,
            info,
            buffer: Vec::new(),
            nchars: 0,
            line_offset: vec![0],
            offset: 0,
            pos_x: 0,
            pos_y: 0,
            requested_pos_x: 0,
            initial_col: 1,
            initial_row: 1,
            term_cols: usize::from(cols),
            term_rows: usize::from(rows),
            prompt_len: 0,
            max_lines: 1,
            cur_frame_lines: 0,
            multiline: true,
            insert: true,
            osc133,
            prompt: Prompt::Literal(String::new()),
            empty_message: String::new(),
            frame_highlight_fg,
            text_colors,
            state: SessionState::Closed,
            epoll,
            winch: None,
            decoder: KeyDecoder::new(fd),
            out: Vec::with_capacity(1024),
        }
    }

    /// Set a literal prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = Prompt::Literal(prompt.into());
    }

    /// Set a prompt callback, evaluated at each [`Self::prepare`].
    pub fn set_prompt_fn<F>(&mut self, prompt: F)
    where
        F: Fn() -> String + Send + 'static,
    {
        self.prompt = Prompt::Callback(Box::new(prompt));
    }

    /// Set the hint shown dimmed while the buffer is empty.
    pub fn set_empty_message(&mut self, message: impl Into<String>) {
        self.empty_message = message.into();
    }

    /// Wrap onto further rows (default) or scroll within a single row.
    pub fn set_multiline(&mut self, multiline: bool) {
        self.multiline = multiline;
    }

    /// Terminal facts this session was built with.
    #[must_use]
    pub fn term_info(&self) -> &TermInfo {
        &self.info
    }

    /// Open the next edit: install signal plumbing, register descriptors,
    /// print the prompt, and locate the edit area on screen.
    ///
    /// Safe to call repeatedly; only the first call per edit has an
    /// effect.
    ///
    /// # Panics
    /// Panics when the host runtime refuses signal or epoll setup for any
    /// reason other than the descriptor not being pollable, and when the
    /// terminal reports the edit area starting somewhere other than
    /// column 1 (the cursor arithmetic depends on it).
    pub fn prepare(&mut self) -> Result<()> {
        match self.state {
            SessionState::Open => return Ok(()),
            SessionState::Invalid => return Err(Error::NotATerminal),
            SessionState::Closed => {}
        }

        let winch = WinchWatch::install();
        let (cols, rows) = terminal::window_size(self.fd);
        self.term_cols = usize::from(cols);
        self.term_rows = usize::from(rows);

        if self.epoll.add(self.decoder.fd()).is_err() {
            // EPERM: the descriptor is not pollable, so the decoder can
            // never be driven. The winch guard restores the signal mask on
            // drop; nothing else was acquired yet.
            emit_log(
                LogLevel::Warn,
                "descriptor is not pollable; refusing session",
            );
            self.state = SessionState::Invalid;
            return Err(Error::NotATerminal);
        }
        self.epoll
            .add(winch.fd())
            .expect("signalfd descriptors are pollable");
        poll::set_nonblocking(self.fd, true)?;
        self.winch = Some(winch);
        self.state = SessionState::Open;

        // Prologue: fresh line, frame decoration, then locate ourselves.
        self.out.clear();
        if self.osc133 {
            self.push_str(sequences::osc133::FRESH_LINE);
        } else {
            self.push_str("\r");
        }
        self.emit_frame_prologue();
        self.flush()?;

        let (col, row) = terminal::cursor_position(self.fd).unwrap_or((1, 1));
        self.initial_col = col;
        self.initial_row = row;
        assert!(
            self.initial_col == 1,
            "edit area must start at column 1 (terminal reported column {col})"
        );

        self.buffer.clear();
        self.nchars = 0;
        self.offset = 0;
        self.pos_x = 0;
        self.pos_y = 0;
        self.line_offset.clear();
        self.line_offset.push(0);
        self.max_lines = 1;

        let prompt = self.prompt.render();
        self.prompt_len = visible_len_ignoring_csi(&prompt);
        if !prompt.is_empty() {
            if self.osc133 {
                self.push_str(sequences::osc133::PROMPT_START);
            }
            self.push_str(&prompt);
        }
        if self.osc133 {
            self.push_str(sequences::osc133::INPUT_START);
        }
        self.pos_x = self.prompt_len;
        self.requested_pos_x = self.prompt_len;

        // Also fills in the background color, if one is active.
        self.push_str(sequences::CLEAR_LINE_RIGHT);

        if !self.empty_message.is_empty() {
            self.emit_empty_message();
        }
        self.flush()?;

        emit_log(LogLevel::Debug, "session open");
        Ok(())
    }

    /// Feed one readiness event from the multiplexer.
    ///
    /// Returns [`ProcessOutcome::Line`] when an edit finished,
    /// [`ProcessOutcome::Pending`] when the event was consumed without
    /// finishing one, and [`ProcessOutcome::UnknownFd`] (state untouched)
    /// when the descriptor belongs to the host, which may share the epoll
    /// instance with its own I/O sources.
    pub fn process(&mut self, fd: RawFd) -> Result<ProcessOutcome> {
        if self.state != SessionState::Open {
            return Err(Error::ClosedSession);
        }

        if fd == self.decoder.fd() {
            self.decoder.advise_readable()?;
            return self.drain_keys();
        }

        if self.winch.as_ref().map(WinchWatch::fd) == Some(fd) {
            if let Some(winch) = &self.winch {
                winch.drain();
            }
            let (cols, rows) = terminal::window_size(self.fd);
            self.term_cols = usize::from(cols);
            self.term_rows = usize::from(rows);
            emit_log(
                LogLevel::Debug,
                &format!("window resized to {cols}x{rows}"),
            );
            // Re-layout of the existing rendering is deferred; the next
            // edit lays out against the new width.
            return Ok(ProcessOutcome::Pending);
        }

        Ok(ProcessOutcome::UnknownFd)
    }

    /// Obtain the next finished line, driving the event loop internally.
    ///
    /// Equivalent to `prepare` plus a wait/`process` loop. An empty line
    /// means cancel or end of input.
    pub fn read(&mut self) -> Result<String> {
        self.prepare()?;
        loop {
            let timeout = if self.decoder.has_partial() {
                ESC_DISAMBIGUATE_MS
            } else {
                -1
            };
            match self.epoll.wait(timeout)? {
                Some(fd) => match self.process(fd)? {
                    ProcessOutcome::Line(line) => return Ok(line),
                    ProcessOutcome::Pending | ProcessOutcome::UnknownFd => {}
                },
                None => {
                    // Timed out with a buffered partial sequence; resolve
                    // it (a lone ESC becomes the Escape key).
                    if let Some(key) = self.decoder.force_next_key() {
                        if let Some(line) = self.apply_key(key)? {
                            return Ok(line);
                        }
                    }
                }
            }
        }
    }

    /// Drain every key that is currently decodable.
    fn drain_keys(&mut self) -> Result<ProcessOutcome> {
        while let Some(key) = self.decoder.next_key() {
            if let Some(line) = self.apply_key(key)? {
                return Ok(ProcessOutcome::Line(line));
            }
        }

        if self.decoder.is_eof() {
            emit_log(LogLevel::Info, "end of input; committing buffer");
            let line = self.take_line();
            self.finalize_screen()?;
            self.release();
            return Ok(ProcessOutcome::Line(line));
        }

        Ok(ProcessOutcome::Pending)
    }

    /// Apply one key. Returns the finished line when the key ended the
    /// edit.
    fn apply_key(&mut self, key: KeyEvent) -> Result<Option<String>> {
        if key.is_ctrl_c() || (self.buffer.is_empty() && key.is_ctrl_d()) {
            // Cancel: the edit commits with an empty result.
            self.buffer.clear();
            self.nchars = 0;
            let line = self.take_line();
            self.finalize_screen()?;
            self.release();
            return Ok(Some(line));
        }

        if self.handle_key(key)? {
            let line = self.take_line();
            self.finalize_screen()?;
            self.release();
            return Ok(Some(line));
        }

        Ok(None)
    }

    /// Dispatch a key: unmodified Unicode keys go through the insertion
    /// path, everything else through the binding table. Returns true on
    /// commit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if let KeyCode::Char(c) = key.code {
            if !key
                .modifiers
                .intersects(KeyModifiers::ALT | KeyModifiers::CTRL)
            {
                self.insert_char(c)?;
                return Ok(false);
            }
        }

        let mods = key.modifiers
            & (KeyModifiers::ALT | KeyModifiers::SHIFT | KeyModifiers::CTRL);
        match actions::lookup(key.code, mods) {
            Some(action) => self.apply_action(action),
            None => Ok(false),
        }
    }

    /// Take the finished line out of the buffer.
    fn take_line(&mut self) -> String {
        self.nchars = 0;
        String::from_utf8(std::mem::take(&mut self.buffer)).expect("buffer is valid UTF-8")
    }

    /// Emit the end-of-edit screen updates.
    fn finalize_screen(&mut self) -> Result<()> {
        if self.frame == Frame::Line
            && self.frame_highlight_fg != self.info.default_foreground
        {
            // Undo the frame highlighting. The bottom frame sits below the
            // widest the edit ever grew, not below the current last row.
            self.move_to(0, -1);
            for _ in 0..self.term_cols {
                self.push_str(sequences::frame::RULE);
            }
            self.move_to(0, self.max_lines as i32);
            for _ in 0..self.term_cols {
                self.push_str(sequences::frame::RULE);
            }
        }

        self.move_to(
            self.term_cols as i32 - 1,
            (self.max_lines - 1 + self.cur_frame_lines) as i32,
        );
        self.push_str("\n");
        if self.text_colors.is_some() {
            self.push_str(sequences::SGR_RESET);
        }
        if self.osc133 {
            self.push_str(sequences::osc133::INPUT_END);
        }
        self.flush()?;
        Ok(())
    }

    /// Deregister descriptors and restore the signal mask and blocking
    /// mode.
    fn release(&mut self) {
        self.epoll.remove(self.decoder.fd());
        if let Some(winch) = self.winch.take() {
            self.epoll.remove(winch.fd());
            // Dropping the guard restores the prior signal mask.
        }
        let _ = poll::set_nonblocking(self.fd, false);
        self.state = SessionState::Closed;
        emit_log(LogLevel::Debug, "session closed");
    }

    /// Frame rows and text-area colors, drawn around a one-line gap.
    fn emit_frame_prologue(&mut self) {
        if self.frame == Frame::None {
            self.cur_frame_lines = 0;
            return;
        }

        let colored = self.frame_highlight_fg != self.info.default_foreground;
        if colored {
            let color = self.frame_highlight_fg;
            ansi::push_fg_color(&mut self.out, color);
        }
        let (top, bottom) = match self.frame {
            Frame::Line => (sequences::frame::RULE, sequences::frame::RULE),
            _ => (sequences::frame::LOWER_HALF, sequences::frame::UPPER_HALF),
        };
        for _ in 0..self.term_cols {
            self.push_str(top);
        }
        self.push_str("\n\n");
        for _ in 0..self.term_cols {
            self.push_str(bottom);
        }
        if colored {
            self.push_str(sequences::SGR_RESET);
        }
        self.push_str(sequences::CURSOR_PREV_LINE);
        self.cur_frame_lines = 1;

        if let Some((fg, bg)) = self.text_colors {
            ansi::push_fg_bg_color(&mut self.out, fg, bg);
        }
    }

    /// The dimmed hint for an empty buffer, with the cursor left at the
    /// input position.
    fn emit_empty_message(&mut self) {
        let (dim, _) = adjust(
            self.info.default_foreground,
            self.info.default_background,
            48,
        );
        ansi::push_fg_color(&mut self.out, dim);
        let message = std::mem::take(&mut self.empty_message);
        self.push_str(&message);
        self.empty_message = message;
        match self.text_colors {
            Some((fg, bg)) => ansi::push_fg_bg_color(&mut self.out, fg, bg),
            None => self.push_str(sequences::SGR_RESET),
        }
        self.move_to(self.pos_x as i32, self.pos_y as i32);
    }

    // -- output plumbing -------------------------------------------------

    /// Queue a cursor move to edit-area coordinates `(x, y)`.
    ///
    /// `y` may be negative (the row above the edit area holds the top
    /// frame). The terminal clamps columns past the right edge, which the
    /// last-column wrap workaround relies on.
    fn move_to(&mut self, x: i32, y: i32) {
        let row = (i32::from(self.initial_row) + y).max(1) as u32;
        let col = (i32::from(self.initial_col) + x).max(1) as u32;
        ansi::push_cursor_position(&mut self.out, row, col);
    }

    fn push_str(&mut self, s: &str) {
        self.out.extend_from_slice(s.as_bytes());
    }

    /// Write everything queued so far as one batch.
    fn flush(&mut self) -> Result<()> {
        if !self.out.is_empty() {
            poll::write_all(self.fd, &self.out)?;
            self.out.clear();
        }
        Ok(())
    }
}

impl Drop for LineEditor {
    fn drop(&mut self) {
        // A session dropped mid-edit still releases the descriptors and
        // the signal mask.
        if self.state == SessionState::Open {
            self.release();
        }
    }
}
