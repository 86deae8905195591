//! ANSI sequence parser for terminal key input.
//!
//! Parses raw bytes from the terminal into [`KeyEvent`]s. Supports:
//! - Control characters and DEL
//! - Standard VT sequences (arrows, Home/End, tilde keys)
//! - CSI sequences with modifier parameters
//! - SS3 function keys
//! - Alt-prefixed characters (`ESC <char>`)
//! - UTF-8 multi-byte characters
//!
//! Mouse, focus, and bracketed-paste sequences are not decoded; the editor
//! never enables those reporting modes.

// Parser has many match arms for different terminal sequences
#![allow(clippy::match_same_arms)]
// Self is used for consistency with other methods even when not needed
#![allow(clippy::unused_self)]

use crate::input::keyboard::{KeyCode, KeyEvent, KeyModifiers};

/// Error type for key parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Input buffer is empty.
    Empty,
    /// Incomplete escape sequence (need more bytes).
    Incomplete,
    /// Unrecognized escape sequence; carries the bytes to skip.
    UnrecognizedSequence(Vec<u8>),
    /// Invalid UTF-8 in input.
    InvalidUtf8,
}

/// Result of parsing input: the event and the number of bytes consumed.
pub type ParseResult = Result<(KeyEvent, usize), ParseError>;

/// Stateless byte-stream to key-event parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyParser;

impl KeyParser {
    /// Create a new key parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse the next key event from `input`.
    ///
    /// Returns the event and number of bytes consumed. Call repeatedly with
    /// the unconsumed remainder until `Err(ParseError::Empty)` or
    /// `Err(ParseError::Incomplete)`.
    pub fn parse(&self, input: &[u8]) -> ParseResult {
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let first = input[0];

        match first {
            0x1b => self.parse_escape(input),
            // Enter arrives as CR (or LF with some line disciplines).
            b'\r' | b'\n' => Ok((KeyEvent::key(KeyCode::Enter), 1)),
            b'\t' => Ok((KeyEvent::key(KeyCode::Tab), 1)),
            0x08 | 0x7f => Ok((KeyEvent::key(KeyCode::Backspace), 1)),
            // Ctrl+A through Ctrl+Z, minus the aliases above.
            0x01..=0x1a => {
                let c = (first - 1 + b'a') as char;
                Ok((KeyEvent::with_ctrl(KeyCode::Char(c)), 1))
            }
            // Ctrl+Space / Ctrl+@.
            0x00 => Ok((KeyEvent::with_ctrl(KeyCode::Char(' ')), 1)),
            // Printable ASCII.
            0x20..=0x7e => Ok((KeyEvent::char(first as char), 1)),
            // UTF-8 sequences.
            0x80..=0xff => self.parse_utf8(input),
            _ => Ok((KeyEvent::char(first as char), 1)),
        }
    }

    /// Parse an escape sequence.
    fn parse_escape(&self, input: &[u8]) -> ParseResult {
        if input.len() == 1 {
            // Could be just Escape or the start of a sequence.
            return Err(ParseError::Incomplete);
        }

        match input[1] {
            // CSI sequence: ESC [
            b'[' => self.parse_csi(input),
            // SS3 sequence: ESC O
            b'O' => self.parse_ss3(input),
            // Alt+key: ESC <char> ('[' and 'O' are taken by the arms above)
            0x20..=0x7e => {
                let c = input[1] as char;
                Ok((KeyEvent::with_alt(KeyCode::Char(c)), 2))
            }
            // Double escape.
            0x1b => Ok((KeyEvent::key(KeyCode::Esc), 1)),
            _ => Ok((KeyEvent::key(KeyCode::Esc), 1)),
        }
    }

    /// Parse a CSI sequence (ESC [ ...).
    fn parse_csi(&self, input: &[u8]) -> ParseResult {
        if input.len() < 3 {
            return Err(ParseError::Incomplete);
        }

        // Find the final byte (0x40-0x7e).
        let mut end = 2;
        while end < input.len() {
            if (0x40..=0x7e).contains(&input[end]) {
                break;
            }
            end += 1;
        }

        if end >= input.len() {
            return Err(ParseError::Incomplete);
        }

        let final_byte = input[end];
        let params = &input[2..end];

        match final_byte {
            b'A' => self.parse_modified_key(params, KeyCode::Up, end + 1),
            b'B' => self.parse_modified_key(params, KeyCode::Down, end + 1),
            b'C' => self.parse_modified_key(params, KeyCode::Right, end + 1),
            b'D' => self.parse_modified_key(params, KeyCode::Left, end + 1),
            b'H' => self.parse_modified_key(params, KeyCode::Home, end + 1),
            b'F' => self.parse_modified_key(params, KeyCode::End, end + 1),

            // Tilde sequences: ESC [ <number> ~
            b'~' => self.parse_tilde_key(input, params, end + 1),

            // Shift+Tab.
            b'Z' => Ok((
                KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT),
                end + 1,
            )),

            _ => Err(ParseError::UnrecognizedSequence(input[..=end].to_vec())),
        }
    }

    /// Parse a key with modifiers from CSI params.
    fn parse_modified_key(&self, params: &[u8], base_key: KeyCode, consumed: usize) -> ParseResult {
        let modifiers = if params.is_empty() {
            KeyModifiers::empty()
        } else {
            self.parse_modifiers(params)?
        };
        Ok((KeyEvent::new(base_key, modifiers), consumed))
    }

    /// Parse modifiers from CSI parameter bytes.
    ///
    /// Format is `1;N` where `N - 1` encodes shift (1), alt (2), ctrl (4).
    fn parse_modifiers(&self, params: &[u8]) -> Result<KeyModifiers, ParseError> {
        let s = std::str::from_utf8(params).map_err(|_| ParseError::InvalidUtf8)?;
        let parts: Vec<&str> = s.split(';').collect();
        if parts.len() >= 2 {
            if let Ok(n) = parts[1].parse::<u8>() {
                let n = n.saturating_sub(1);
                let mut mods = KeyModifiers::empty();
                if n & 1 != 0 {
                    mods |= KeyModifiers::SHIFT;
                }
                if n & 2 != 0 {
                    mods |= KeyModifiers::ALT;
                }
                if n & 4 != 0 {
                    mods |= KeyModifiers::CTRL;
                }
                return Ok(mods);
            }
        }
        Ok(KeyModifiers::empty())
    }

    /// Parse tilde key sequences (Insert, Delete, Page Up/Down, F5+).
    ///
    /// An unrecognized number reports the whole sequence so the caller
    /// skips all of it, not just the parameters.
    fn parse_tilde_key(&self, input: &[u8], params: &[u8], consumed: usize) -> ParseResult {
        let s = std::str::from_utf8(params).map_err(|_| ParseError::InvalidUtf8)?;
        let parts: Vec<&str> = s.split(';').collect();
        let num: u8 = parts.first().and_then(|p| p.parse().ok()).unwrap_or(0);

        let modifiers = if parts.len() >= 2 {
            self.parse_modifiers(params)?
        } else {
            KeyModifiers::empty()
        };

        let code = match num {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            11 => KeyCode::F(1),
            12 => KeyCode::F(2),
            13 => KeyCode::F(3),
            14 => KeyCode::F(4),
            15 => KeyCode::F(5),
            17 => KeyCode::F(6),
            18 => KeyCode::F(7),
            19 => KeyCode::F(8),
            20 => KeyCode::F(9),
            21 => KeyCode::F(10),
            23 => KeyCode::F(11),
            24 => KeyCode::F(12),
            _ => return Err(ParseError::UnrecognizedSequence(input[..consumed].to_vec())),
        };

        Ok((KeyEvent::new(code, modifiers), consumed))
    }

    /// Parse SS3 sequences (ESC O ...).
    fn parse_ss3(&self, input: &[u8]) -> ParseResult {
        if input.len() < 3 {
            return Err(ParseError::Incomplete);
        }

        let code = match input[2] {
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'M' => KeyCode::Enter,
            _ => return Err(ParseError::UnrecognizedSequence(input[..3].to_vec())),
        };

        Ok((KeyEvent::key(code), 3))
    }

    /// Parse a UTF-8 character sequence.
    fn parse_utf8(&self, input: &[u8]) -> ParseResult {
        let first = input[0];

        let expected_len = if first & 0b1110_0000 == 0b1100_0000 {
            2
        } else if first & 0b1111_0000 == 0b1110_0000 {
            3
        } else if first & 0b1111_1000 == 0b1111_0000 {
            4
        } else {
            return Err(ParseError::InvalidUtf8);
        };

        if input.len() < expected_len {
            return Err(ParseError::Incomplete);
        }

        let s = std::str::from_utf8(&input[..expected_len]).map_err(|_| ParseError::InvalidUtf8)?;
        let c = s.chars().next().ok_or(ParseError::InvalidUtf8)?;

        Ok((KeyEvent::char(c), expected_len))
    }
}
