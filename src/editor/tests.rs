//! Editor behavior tests.
//!
//! Sessions are driven over a pipe: edits write their batched output to
//! the write end, the tests read it back from the read end. A miniature
//! terminal model replays the captured bytes to check that the
//! incremental redraws produce the same screen as a from-scratch render
//! of the final state.

#![allow(unsafe_code)]

use super::*;
use crate::input::{KeyCode, KeyEvent};
use crate::unicode::{is_char_start, visible_len_ignoring_csi, visible_width};

// -- harness -------------------------------------------------------------

struct TestTerm {
    ed: LineEditor,
    rd: RawFd,
    wr: RawFd,
    prompt: String,
}

fn pipe_pair() -> (RawFd, RawFd) {
    let mut fds = [0 as RawFd; 2];
    // SAFETY: fds is valid storage for two descriptors.
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(rc, 0, "pipe failed");
    (fds[0], fds[1])
}

/// An open session with the given geometry, bypassing `prepare` (there is
/// no terminal to query on the other end of the pipe).
fn session(cols: usize, rows: usize, prompt: &str) -> TestTerm {
    session_framed(cols, rows, prompt, Frame::None)
}

fn session_framed(cols: usize, rows: usize, prompt: &str, frame: Frame) -> TestTerm {
    let (rd, wr) = pipe_pair();
    crate::poll::set_nonblocking(rd, true).expect("pipe nonblocking");

    let mut ed = LineEditor::new(wr, frame);
    ed.info = TermInfo::default();
    ed.osc133 = false;
    ed.text_colors = None;
    ed.frame_highlight_fg = ed.info.default_foreground;
    ed.state = SessionState::Open;
    ed.term_cols = cols;
    ed.term_rows = rows;
    ed.initial_col = 1;
    ed.initial_row = 1;
    ed.prompt_len = visible_len_ignoring_csi(prompt);
    ed.pos_x = ed.prompt_len;
    ed.requested_pos_x = ed.prompt_len;
    ed.cur_frame_lines = usize::from(frame != Frame::None);

    TestTerm {
        ed,
        rd,
        wr,
        prompt: prompt.to_string(),
    }
}

impl TestTerm {
    fn key(&mut self, key: KeyEvent) {
        let committed = self.ed.handle_key(key).expect("key handling failed");
        assert!(!committed, "unexpected commit");
    }

    fn type_str(&mut self, s: &str) {
        for c in s.chars() {
            self.key(KeyEvent::char(c));
        }
    }

    /// Apply a key through the full commit/cancel path.
    fn finish(&mut self, key: KeyEvent) -> Option<String> {
        self.ed.apply_key(key).expect("key handling failed")
    }

    /// Drain everything the editor wrote since the last call.
    fn output(&mut self) -> Vec<u8> {
        let mut captured = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            // SAFETY: chunk is valid writable storage.
            let n = unsafe {
                libc::read(
                    self.rd,
                    chunk.as_mut_ptr().cast::<libc::c_void>(),
                    chunk.len(),
                )
            };
            if n <= 0 {
                return captured;
            }
            captured.extend_from_slice(&chunk[..n as usize]);
        }
    }

    fn state(&self) -> (usize, usize, usize) {
        (self.ed.offset, self.ed.pos_x, self.ed.pos_y)
    }
}

impl Drop for TestTerm {
    fn drop(&mut self) {
        // The editor does not own its descriptor; close both ends here.
        // Its own Drop only releases epoll/signal resources.
        // SAFETY: both descriptors came from pipe_pair.
        unsafe {
            libc::close(self.rd);
            libc::close(self.wr);
        }
    }
}

fn left() -> KeyEvent {
    KeyEvent::key(KeyCode::Left)
}
fn right() -> KeyEvent {
    KeyEvent::key(KeyCode::Right)
}
fn up() -> KeyEvent {
    KeyEvent::key(KeyCode::Up)
}
fn down() -> KeyEvent {
    KeyEvent::key(KeyCode::Down)
}
fn home() -> KeyEvent {
    KeyEvent::key(KeyCode::Home)
}
fn end() -> KeyEvent {
    KeyEvent::key(KeyCode::End)
}
fn backspace() -> KeyEvent {
    KeyEvent::key(KeyCode::Backspace)
}
fn delete() -> KeyEvent {
    KeyEvent::key(KeyCode::Delete)
}
fn insert_toggle() -> KeyEvent {
    KeyEvent::key(KeyCode::Insert)
}
fn enter() -> KeyEvent {
    KeyEvent::key(KeyCode::Enter)
}
fn alt_b() -> KeyEvent {
    KeyEvent::with_alt(KeyCode::Char('b'))
}
fn alt_f() -> KeyEvent {
    KeyEvent::with_alt(KeyCode::Char('f'))
}
fn ctrl(c: char) -> KeyEvent {
    KeyEvent::with_ctrl(KeyCode::Char(c))
}

// -- invariants ----------------------------------------------------------

/// The state invariants that must hold after every handled key.
fn check_invariants(ed: &LineEditor) {
    let text = std::str::from_utf8(&ed.buffer).expect("buffer must be valid UTF-8");
    assert_eq!(ed.nchars, text.chars().count(), "nchars tracks the buffer");

    assert!(!ed.line_offset.is_empty());
    assert_eq!(ed.line_offset[0], 0);
    for pair in ed.line_offset.windows(2) {
        assert!(pair[0] < pair[1], "line offsets strictly increasing");
    }
    for &off in &ed.line_offset {
        assert!(off <= ed.buffer.len());
        if off < ed.buffer.len() {
            assert!(is_char_start(ed.buffer[off]), "row starts on a boundary");
        }
    }

    assert!(ed.offset <= ed.buffer.len());
    if ed.offset < ed.buffer.len() {
        assert!(is_char_start(ed.buffer[ed.offset]), "cursor on a boundary");
    }

    // Every row except the last is exactly as wide as the terminal.
    for r in 0..ed.line_offset.len() - 1 {
        let prompt = if r == 0 { ed.prompt_len } else { 0 };
        let w = prompt + visible_width(&ed.buffer[ed.line_offset[r]..ed.line_offset[r + 1]]);
        assert_eq!(w, ed.term_cols, "row {r} must span the terminal");
    }
    let last = ed.line_offset.len() - 1;
    let prompt = if last == 0 { ed.prompt_len } else { 0 };
    let w = prompt + visible_width(&ed.buffer[ed.line_offset[last]..]);
    assert!(w <= ed.term_cols, "last row must fit the terminal");

    assert!(ed.pos_y < ed.line_offset.len());
    assert!(ed.line_offset[ed.pos_y] <= ed.offset);
    if ed.pos_y + 1 < ed.line_offset.len() {
        assert!(ed.offset <= ed.line_offset[ed.pos_y + 1]);
    }
    let expected_x = {
        let prompt = if ed.pos_y == 0 { ed.prompt_len } else { 0 };
        let raw = prompt + visible_width(&ed.buffer[ed.line_offset[ed.pos_y]..ed.offset]);
        raw.min(ed.term_cols - 1)
    };
    assert_eq!(ed.pos_x, expected_x, "pos_x derived from offset");
}

// -- miniature terminal --------------------------------------------------

/// Just enough of a VT to replay the editor's output: printable text,
/// deferred last-column wrap, CR/LF (output post-processing on, so LF
/// implies CR), CUP, EL, IL, SU, and ignored SGR/OSC.
struct Vt {
    cols: usize,
    rows: usize,
    row: usize,
    col: usize,
    pending_wrap: bool,
    grid: Vec<Vec<char>>,
}

impl Vt {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            row: 0,
            col: 0,
            pending_wrap: false,
            grid: vec![vec![' '; cols]; rows],
        }
    }

    fn feed(&mut self, bytes: &[u8]) {
        let text = std::str::from_utf8(bytes).expect("editor output is valid UTF-8");
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\x1b' => match chars.peek() {
                    Some('[') => {
                        chars.next();
                        let mut params = String::new();
                        let mut final_byte = ' ';
                        for c in chars.by_ref() {
                            if ('\x40'..='\x7e').contains(&c) {
                                final_byte = c;
                                break;
                            }
                            params.push(c);
                        }
                        self.csi(&params, final_byte);
                    }
                    Some(']') => {
                        // OSC: skip to BEL.
                        for c in chars.by_ref() {
                            if c == '\x07' {
                                break;
                            }
                        }
                    }
                    _ => {
                        chars.next();
                    }
                },
                '\r' => {
                    self.col = 0;
                    self.pending_wrap = false;
                }
                '\n' => {
                    self.line_feed();
                }
                _ => self.put_char(c),
            }
        }
    }

    fn csi(&mut self, params: &str, final_byte: char) {
        let mut nums = params.split(';').map(|p| p.parse::<usize>().unwrap_or(1));
        match final_byte {
            'H' => {
                let row = nums.next().unwrap_or(1).clamp(1, self.rows);
                let col = nums.next().unwrap_or(1).clamp(1, self.cols);
                self.row = row - 1;
                self.col = col - 1;
                self.pending_wrap = false;
            }
            'K' => {
                for c in &mut self.grid[self.row][self.col..] {
                    *c = ' ';
                }
                self.pending_wrap = false;
            }
            'L' => {
                let n = nums.next().unwrap_or(1);
                for _ in 0..n {
                    self.grid.insert(self.row, vec![' '; self.cols]);
                    self.grid.pop();
                }
                self.pending_wrap = false;
            }
            'S' => {
                let n = nums.next().unwrap_or(1);
                for _ in 0..n {
                    self.grid.remove(0);
                    self.grid.push(vec![' '; self.cols]);
                }
            }
            'F' => {
                let n = nums.next().unwrap_or(1);
                self.row = self.row.saturating_sub(n);
                self.col = 0;
                self.pending_wrap = false;
            }
            // SGR, DSR query, anything else: no visible effect here.
            _ => {}
        }
    }

    fn put_char(&mut self, c: char) {
        if self.pending_wrap {
            self.line_feed();
        }
        self.grid[self.row][self.col] = c;
        if self.col + 1 == self.cols {
            self.pending_wrap = true;
        } else {
            self.col += 1;
        }
    }

    fn line_feed(&mut self) {
        self.pending_wrap = false;
        self.col = 0;
        if self.row + 1 == self.rows {
            self.grid.remove(0);
            self.grid.push(vec![' '; self.cols]);
        } else {
            self.row += 1;
        }
    }

    fn row_text(&self, row: usize) -> String {
        let s: String = self.grid[row].iter().collect();
        s.trim_end().to_string()
    }
}

/// Replaying the captured bytes must reproduce a from-scratch render of
/// the final editor state.
fn assert_screen_matches(vt: &Vt, term: &TestTerm) {
    let ed = &term.ed;
    let top = usize::from(ed.initial_row) - 1;

    for r in 0..ed.line_offset.len() {
        let start = ed.line_offset[r];
        let end = if r + 1 < ed.line_offset.len() {
            ed.line_offset[r + 1]
        } else {
            ed.buffer.len()
        };
        let mut expected = String::new();
        if r == 0 {
            expected.push_str(&term.prompt);
        }
        expected.push_str(std::str::from_utf8(&ed.buffer[start..end]).unwrap());
        assert_eq!(
            vt.row_text(top + r),
            expected.trim_end(),
            "screen row {r} out of sync"
        );
    }
    // Rows the edit grew into and back out of must be blank.
    for r in ed.line_offset.len()..ed.max_lines {
        assert_eq!(vt.row_text(top + r), "", "vacated row {r} not cleared");
    }

    assert_eq!(
        (vt.row, vt.col),
        (top + ed.pos_y, ed.pos_x),
        "terminal cursor out of sync"
    );
}

/// Full replay check for a key sequence typed into a fresh session.
fn check_rendering(cols: usize, rows: usize, prompt: &str, keys: &[KeyEvent]) {
    let mut term = session(cols, rows, prompt);
    let mut vt = Vt::new(cols, rows);
    vt.feed(prompt.as_bytes());
    for &key in keys {
        term.key(key);
        check_invariants(&term.ed);
    }
    vt.feed(&term.output());
    assert_screen_matches(&vt, &term);
}

// -- end-to-end scenarios ------------------------------------------------

#[test]
fn test_plain_input_commit() {
    let mut term = session(20, 25, "> ");
    term.type_str("hello");
    check_invariants(&term.ed);
    assert_eq!(term.state(), (5, 7, 0));
    assert_eq!(term.ed.line_offset, vec![0]);

    let line = term.finish(enter());
    assert_eq!(line.as_deref(), Some("hello"));
}

#[test]
fn test_exact_fill_wraps_and_backspace_unwraps() {
    let mut term = session(20, 25, "> ");
    term.type_str("abcdefghijklmnopqr"); // 18 chars: prompt + 18 == 20
    check_invariants(&term.ed);
    assert_eq!(term.ed.line_offset, vec![0, 18]);
    assert_eq!(term.state(), (18, 0, 1));

    term.key(KeyEvent::char('s'));
    check_invariants(&term.ed);
    assert_eq!(term.ed.line_offset, vec![0, 18]);
    assert_eq!(term.state(), (19, 1, 1));

    term.key(backspace());
    check_invariants(&term.ed);
    assert_eq!(term.ed.buffer, b"abcdefghijklmnopqr");
    assert_eq!(term.ed.line_offset, vec![0]);
    assert_eq!(term.state(), (18, 19, 0));
}

#[test]
fn test_overwrite_multibyte_with_shorter() {
    let mut term = session(20, 25, "> ");
    term.type_str("café");
    assert_eq!(term.ed.buffer.len(), 5);
    assert_eq!(term.ed.nchars, 4);
    assert_eq!(term.ed.offset, 5);

    term.key(left());
    assert_eq!(term.ed.offset, 3);
    term.key(insert_toggle());
    term.key(KeyEvent::char('e'));
    check_invariants(&term.ed);
    assert_eq!(term.ed.buffer, b"cafe");
    assert_eq!(term.ed.nchars, 4);
    assert_eq!(term.ed.offset, 4);
}

#[test]
fn test_overwrite_shorter_with_multibyte() {
    let mut term = session(20, 25, "> ");
    term.type_str("abc");
    term.key(home());
    term.key(insert_toggle());
    term.key(KeyEvent::char('é'));
    check_invariants(&term.ed);
    assert_eq!(term.ed.buffer, "ébc".as_bytes());
    assert_eq!(term.ed.nchars, 3);
    assert_eq!(term.ed.offset, 2);
}

#[test]
fn test_word_motion_and_discard() {
    let mut term = session(40, 25, "> ");
    term.type_str("one two three");

    term.key(alt_b());
    assert_eq!(term.ed.offset, 8);
    term.key(alt_b());
    assert_eq!(term.ed.offset, 4);

    term.key(ctrl('u'));
    check_invariants(&term.ed);
    assert_eq!(term.ed.buffer, b"two three");
    assert_eq!(term.state(), (0, 2, 0));
}

#[test]
fn test_forward_word_stops_after_words() {
    let mut term = session(40, 25, "> ");
    term.type_str("one two three");
    term.key(home());

    term.key(alt_f());
    assert_eq!(term.ed.offset, 3);
    term.key(alt_f());
    assert_eq!(term.ed.offset, 7);
    term.key(alt_f());
    assert_eq!(term.ed.offset, 13);
    // At the end, a further word motion stays put.
    term.key(alt_f());
    assert_eq!(term.ed.offset, 13);
}

#[test]
fn test_ctrl_d_on_empty_cancels() {
    let mut term = session(20, 25, "> ");
    let line = term.finish(ctrl('d'));
    assert_eq!(line.as_deref(), Some(""));
    assert_eq!(term.ed.state, SessionState::Closed);
}

#[test]
fn test_ctrl_c_discards_partial_input() {
    let mut term = session(20, 25, "> ");
    term.type_str("partial");
    let line = term.finish(ctrl('c'));
    assert_eq!(line.as_deref(), Some(""));
}

#[test]
fn test_ctrl_d_with_content_is_not_cancel() {
    let mut term = session(20, 25, "> ");
    term.type_str("x");
    let line = term.finish(ctrl('d'));
    assert_eq!(line, None);
    assert_eq!(term.ed.buffer, b"x");
}

#[test]
fn test_first_insert_erases_empty_hint() {
    let mut term = session(20, 25, "> ");
    term.ed.empty_message = "hint".to_string();
    term.output(); // discard nothing; makes intent explicit
    term.key(KeyEvent::char('a'));
    assert_eq!(term.output(), b"\x1b[Ka");
    assert_eq!(term.state(), (1, 3, 0));
    assert_eq!(term.ed.nchars, 1);
}

#[test]
fn test_plain_append_emits_only_the_byte() {
    let mut term = session(20, 25, "> ");
    term.key(KeyEvent::char('a'));
    assert_eq!(term.output(), b"a");
    term.key(KeyEvent::char('b'));
    assert_eq!(term.output(), b"b");
}

// -- round trips ---------------------------------------------------------

#[test]
fn test_backward_forward_roundtrip() {
    let mut term = session(20, 25, "> ");
    term.type_str("abc déf");
    term.key(left());
    term.key(left());
    let before = term.state();

    term.key(left());
    term.key(right());
    assert_eq!(term.state(), before);
    check_invariants(&term.ed);
}

#[test]
fn test_home_end_roundtrip() {
    let mut term = session(20, 25, "> ");
    term.type_str("some words");
    let before = term.state();

    term.key(home());
    assert_eq!(term.state(), (0, 2, 0));
    term.key(end());
    assert_eq!(term.state(), before);
}

#[test]
fn test_type_then_backspace_to_empty() {
    let mut term = session(20, 25, "> ");
    let input = "wörds åcross rows"; // multi-byte, wraps past row 0
    term.type_str(input);
    check_invariants(&term.ed);

    for _ in 0..input.chars().count() {
        term.key(backspace());
        check_invariants(&term.ed);
    }
    assert!(term.ed.buffer.is_empty());
    assert_eq!(term.ed.nchars, 0);
    assert_eq!(term.ed.line_offset, vec![0]);
    assert_eq!(term.state(), (0, 2, 0));
}

// -- vertical motion -----------------------------------------------------

#[test]
fn test_screen_line_motion_sticky_column() {
    let mut term = session(10, 25, "> ");
    // Rows: "> aaaaaaaa" / "bbbbbbbbbb" / "cccc"
    term.type_str("aaaaaaaabbbbbbbbbbcccc");
    check_invariants(&term.ed);
    assert_eq!(term.ed.line_offset, vec![0, 8, 18]);
    assert_eq!(term.state(), (22, 4, 2));

    term.key(up());
    assert_eq!(term.state(), (12, 4, 1));
    term.key(up());
    assert_eq!(term.state(), (2, 4, 0));

    // The sticky target survives the round trip.
    term.key(down());
    assert_eq!(term.state(), (12, 4, 1));
    term.key(down());
    assert_eq!(term.state(), (22, 4, 2));
}

#[test]
fn test_down_to_short_row_saturates() {
    let mut term = session(10, 25, "> ");
    term.type_str("aaaaaaaabb");
    term.key(home());
    for _ in 0..7 {
        term.key(right());
    }
    assert_eq!(term.state(), (7, 9, 0));
    assert_eq!(term.ed.requested_pos_x, 9);

    // The sticky target points past the short row; the cursor lands at
    // its end.
    term.key(down());
    assert_eq!(term.state(), (10, 2, 1));
}

#[test]
fn test_up_refused_left_of_prompt() {
    let mut term = session(10, 25, "> ");
    term.type_str("aaaaaaaabbb");
    // Walk the cursor to column 0 of row 1 so the sticky target is 0.
    term.key(home());
    for _ in 0..8 {
        term.key(right());
    }
    assert_eq!(term.state(), (8, 0, 1));
    assert_eq!(term.ed.requested_pos_x, 0);

    // The sticky target is left of the prompt; upward motion refused.
    term.key(up());
    assert_eq!(term.state(), (8, 0, 1));
}

#[test]
fn test_up_lands_at_prompt_boundary() {
    let mut term = session(10, 25, "> ");
    term.type_str("aaaaaaaabbb");
    term.key(home());
    for _ in 0..10 {
        term.key(right());
    }
    assert_eq!(term.state(), (10, 2, 1));
    assert_eq!(term.ed.requested_pos_x, 2);

    // A sticky target exactly at the prompt edge is allowed.
    term.key(up());
    assert_eq!(term.state(), (0, 2, 0));
}

// -- boundaries ----------------------------------------------------------

#[test]
fn test_kill_to_end_clears_rows() {
    let mut term = session(10, 25, "> ");
    term.type_str("aaaaaaaabbbbbbbbbbcc");
    term.key(home());
    term.output();

    term.key(ctrl('k'));
    check_invariants(&term.ed);
    assert!(term.ed.buffer.is_empty());
    assert_eq!(term.ed.line_offset, vec![0]);
    assert_eq!(term.state(), (0, 2, 0));

    let out = term.output();
    let text = String::from_utf8(out).unwrap();
    // Clear the cursor row, then each vacated row.
    assert_eq!(text.matches("\x1b[K").count(), 3);
    assert_eq!(text.matches('\n').count(), 2);
}

#[test]
fn test_discard_to_start_from_end_clears_all_rows() {
    let mut term = session(10, 25, "> ");
    term.type_str("aaaaaaaabbbbbbbbbbcc");
    term.output();

    term.key(ctrl('u'));
    check_invariants(&term.ed);
    assert!(term.ed.buffer.is_empty());
    assert_eq!(term.ed.line_offset, vec![0]);
    assert_eq!(term.state(), (0, 2, 0));

    let text = String::from_utf8(term.output()).unwrap();
    assert_eq!(text.matches('\n').count(), 2, "two vacated rows cleared");
}

#[test]
fn test_discard_to_start_keeps_tail() {
    let mut term = session(10, 25, "> ");
    term.type_str("aaaaaaaabbbbbbbbbbcc");
    term.key(home());
    for _ in 0..8 {
        term.key(right());
    }
    assert_eq!(term.state(), (8, 0, 1));

    term.key(ctrl('u'));
    check_invariants(&term.ed);
    assert_eq!(term.ed.buffer, b"bbbbbbbbbbcc");
    assert_eq!(term.ed.line_offset, vec![0, 8]);
    assert_eq!(term.state(), (0, 2, 0));
}

#[test]
fn test_resize_narrower_relayouts_next_insert() {
    let mut term = session(20, 25, "> ");
    term.type_str("abcdefghij");
    check_invariants(&term.ed);
    assert_eq!(term.ed.line_offset, vec![0]);

    // As after a SIGWINCH: only the dimensions change immediately; the
    // next edit lays out against the new width. (Cursor bookkeeping is
    // best-effort until then.)
    term.ed.term_cols = 8;
    term.key(KeyEvent::char('k'));
    assert_eq!(term.ed.line_offset, vec![0, 6]);
}

#[test]
fn test_scroll_when_growing_past_bottom() {
    let mut term = session(10, 3, "> ");
    term.ed.initial_row = 2;
    term.type_str("aaaaaaaabbbbbbbbb"); // row 0 full, row 1 one short
    let text = String::from_utf8(term.output()).unwrap();
    assert!(!text.contains("\x1b[S"), "no scroll while the edit fits");
    assert_eq!(term.ed.initial_row, 2);

    // Filling row 1 opens a third row below the 3-row window: the screen
    // scrolls up and a blank row is inserted at the cursor line.
    term.key(KeyEvent::char('b'));
    check_invariants(&term.ed);
    assert_eq!(term.ed.line_offset, vec![0, 8, 18]);
    assert_eq!(term.ed.initial_row, 1);
    let text = String::from_utf8(term.output()).unwrap();
    assert!(text.contains("\x1b[S\r\x1b[1L"), "scroll sequence: {text:?}");
}

#[test]
fn test_frame_pushed_down_when_growing() {
    let mut term = session_framed(10, 25, "> ", Frame::Line);
    term.output();
    term.type_str("aaaaaaaa"); // exactly fills row 0
    check_invariants(&term.ed);
    assert_eq!(term.ed.line_offset, vec![0, 8]);

    let text = String::from_utf8(term.output()).unwrap();
    assert!(text.contains("\n\x1b[1L"), "frame push sequence: {text:?}");
}

#[test]
fn test_last_column_wrap_workaround() {
    let mut term = session(10, 25, "> ");
    term.type_str("aaaaaaaa"); // fills row 0, cursor wraps to (0, 1)
    assert_eq!(term.state(), (8, 0, 1));
    term.output();

    term.key(KeyEvent::char('b'));
    let text = String::from_utf8(term.output()).unwrap();
    // Reposition into the last column of row 0 (column 11 clamps to 10)
    // and write the previous and new characters together.
    assert!(text.starts_with("\x1b[1;11Hab"), "workaround stream: {text:?}");
    assert_eq!(term.state(), (9, 1, 1));
}

#[test]
fn test_append_after_deletion_saturation() {
    let mut term = session(20, 25, "> ");
    term.type_str("abcdefghijklmnopqrs");
    term.key(backspace());
    assert_eq!(term.state(), (18, 19, 0));
    term.output();

    // Typing from the saturated position re-opens the second row and
    // records the line continuation through the last column.
    term.key(KeyEvent::char('s'));
    check_invariants(&term.ed);
    assert_eq!(term.ed.line_offset, vec![0, 18]);
    assert_eq!(term.state(), (19, 1, 1));
    let text = String::from_utf8(term.output()).unwrap();
    assert!(text.starts_with("\x1b[1;21Hrs"), "workaround stream: {text:?}");
}

// -- single-line mode ----------------------------------------------------

#[test]
fn test_single_line_scrolls_window() {
    let mut term = session(20, 25, "> ");
    term.ed.multiline = false;

    // Threshold is 90% of 20 columns; the window shifts by 2.
    term.type_str("abcdefghijklmnop");
    check_invariants_single_line(&term.ed);
    assert_eq!(term.ed.line_offset, vec![0]);

    term.key(KeyEvent::char('q'));
    assert_eq!(term.ed.line_offset, vec![2]);
    assert_eq!(term.ed.pos_x, 16);

    let text = String::from_utf8(term.output()).unwrap();
    assert!(text.contains('«'), "scroll indicator shown: {text:?}");
}

#[test]
fn test_single_line_never_wraps() {
    let mut term = session(20, 25, "> ");
    term.ed.multiline = false;
    term.type_str("abcdefghijklmnopqrstuvwxyz");
    check_invariants_single_line(&term.ed);
    assert_eq!(term.ed.line_offset.len(), 1);
    assert_eq!(term.ed.pos_y, 0);
    assert!(term.ed.pos_x < term.ed.term_cols);
}

/// Single-line sessions keep a window, not a layout; only the basic
/// buffer invariants apply.
fn check_invariants_single_line(ed: &LineEditor) {
    std::str::from_utf8(&ed.buffer).expect("buffer must be valid UTF-8");
    assert_eq!(ed.line_offset.len(), 1);
    assert!(ed.line_offset[0] <= ed.offset);
    assert!(ed.offset <= ed.buffer.len());
}

// -- render equivalence --------------------------------------------------

#[test]
fn test_render_matches_after_plain_typing() {
    check_rendering(20, 25, "> ", &chars("hello world"));
}

#[test]
fn test_render_matches_after_wrap() {
    check_rendering(10, 25, "> ", &chars("aaaaaaaabbbbbbbbbbcc"));
}

#[test]
fn test_render_matches_after_midline_edit() {
    let mut keys = chars("hello brave world");
    keys.extend([alt_b(), alt_b(), backspace(), backspace(), delete()]);
    keys.extend(chars("iggest"));
    check_rendering(20, 25, "> ", &keys);
}

#[test]
fn test_render_matches_after_row_deletions() {
    let mut keys = chars("aaaaaaaabbbbbbbbbbcc");
    keys.extend([ctrl('u')]);
    keys.extend(chars("fresh"));
    check_rendering(10, 25, "> ", &keys);
}

#[test]
fn test_render_matches_after_overwrite() {
    let mut keys = chars("wide é text");
    keys.extend([home(), insert_toggle()]);
    keys.extend(chars("xy"));
    check_rendering(20, 25, "> ", &keys);
}

#[test]
fn test_render_matches_saturated_backspace_and_retype() {
    let mut keys = chars("abcdefghijklmnopqrs");
    keys.push(backspace());
    keys.extend(chars("st"));
    check_rendering(20, 25, "> ", &keys);
}

fn chars(s: &str) -> Vec<KeyEvent> {
    s.chars().map(KeyEvent::char).collect()
}

// -- property tests ------------------------------------------------------

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Copy, Debug)]
    enum Op {
        Insert(char),
        Left,
        Right,
        Up,
        Down,
        Home,
        End,
        Backspace,
        Delete,
        WordBack,
        WordForward,
        Discard,
        Kill,
        Toggle,
    }

    impl Op {
        fn key(self) -> KeyEvent {
            match self {
                Op::Insert(c) => KeyEvent::char(c),
                Op::Left => left(),
                Op::Right => right(),
                Op::Up => up(),
                Op::Down => down(),
                Op::Home => home(),
                Op::End => end(),
                Op::Backspace => backspace(),
                Op::Delete => delete(),
                Op::WordBack => alt_b(),
                Op::WordForward => alt_f(),
                Op::Discard => ctrl('u'),
                Op::Kill => ctrl('k'),
                Op::Toggle => insert_toggle(),
            }
        }
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            8 => prop_oneof![
                Just('a'), Just('b'), Just('z'), Just('7'), Just(' '),
                Just('é'), Just('ß'), Just('語'),
            ]
            .prop_map(Op::Insert),
            2 => Just(Op::Left),
            2 => Just(Op::Right),
            1 => Just(Op::Up),
            1 => Just(Op::Down),
            1 => Just(Op::Home),
            1 => Just(Op::End),
            2 => Just(Op::Backspace),
            1 => Just(Op::Delete),
            1 => Just(Op::WordBack),
            1 => Just(Op::WordForward),
            1 => Just(Op::Discard),
            1 => Just(Op::Kill),
            1 => Just(Op::Toggle),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(96))]

        #[test]
        fn invariants_hold_for_any_key_sequence(
            ops in proptest::collection::vec(op_strategy(), 0..70)
        ) {
            let mut term = session(20, 50, "> ");
            for op in ops {
                term.key(op.key());
                check_invariants(&term.ed);
            }
        }

        #[test]
        fn rendering_matches_for_any_key_sequence(
            ops in proptest::collection::vec(op_strategy(), 0..50)
        ) {
            let mut term = session(12, 50, "> ");
            let mut vt = Vt::new(12, 50);
            vt.feed(b"> ");
            for op in ops {
                term.key(op.key());
                check_invariants(&term.ed);
            }
            vt.feed(&term.output());
            assert_screen_matches(&vt, &term);
        }

        #[test]
        fn backward_forward_is_identity(
            text in "[a-zéß ]{1,18}",
            steps in 0usize..18,
        ) {
            let mut term = session(40, 25, "> ");
            term.type_str(&text);
            for _ in 0..steps.min(text.chars().count().saturating_sub(1)) {
                term.key(left());
            }
            let before = term.state();
            term.key(left());
            term.key(right());
            prop_assert_eq!(term.state(), before);
        }
    }
}
