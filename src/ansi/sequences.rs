//! Constant ANSI escape sequences.

/// Reset all attributes to default.
pub const SGR_RESET: &str = "\x1b[m";

/// Clear from cursor to end of line.
pub const CLEAR_LINE_RIGHT: &str = "\x1b[K";

/// Scroll the screen up one line.
pub const SCROLL_UP: &str = "\x1b[S";

/// Insert one blank line at the cursor row.
pub const INSERT_LINE: &str = "\x1b[1L";

/// Move to the beginning of the previous line.
pub const CURSOR_PREV_LINE: &str = "\x1b[1F";

/// Cursor position query (DSR); reply is `ESC [ row ; col R`.
pub const CURSOR_POSITION_QUERY: &str = "\x1b[6n";

/// OSC 133 semantic prompt markers.
///
/// Terminals that understand them get clickable prompt regions and
/// scroll-to-prompt navigation; everything else ignores the sequences.
pub mod osc133 {
    /// Fresh-line marker, emitted before the prompt area is set up.
    pub const FRESH_LINE: &str = "\x1b]133;L\x07";
    /// Prompt start.
    pub const PROMPT_START: &str = "\x1b]133;A\x07";
    /// Prompt end / input start.
    pub const INPUT_START: &str = "\x1b]133;B\x07";
    /// Input end / output start.
    pub const INPUT_END: &str = "\x1b]133;C\x07";
}

/// Frame decoration glyphs.
pub mod frame {
    /// Horizontal rule for line frames.
    pub const RULE: &str = "─";
    /// Lower half block, drawn above a background frame.
    pub const LOWER_HALF: &str = "▄";
    /// Upper half block, drawn below a background frame.
    pub const UPPER_HALF: &str = "▀";
}

/// Truncation indicator shown at column 1 of a scrolled single-line view.
pub const SCROLL_INDICATOR: &str = "«";
