//! Terminal information and low-level queries.
//!
//! The editor consumes terminal facts through the read-only [`TermInfo`]
//! struct: default colors (the base the frame and hint colors are derived
//! from) and whether the terminal understands OSC 133 semantic prompt
//! markers. Detection is environment-based; hosts with better knowledge
//! can build a `TermInfo` by hand.
//!
//! # Safety
//! This module uses unsafe code for `ioctl`/`isatty`/`read`/`fcntl` FFI
//! calls.

#![allow(unsafe_code)]

use crate::color::Rgb;
use std::env;
use std::io;
use std::os::unix::io::RawFd;

/// Standard 16-color palette, used to interpret `COLORFGBG`.
const ANSI16: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(205, 0, 0),
    Rgb::new(0, 205, 0),
    Rgb::new(205, 205, 0),
    Rgb::new(0, 0, 238),
    Rgb::new(205, 0, 205),
    Rgb::new(0, 205, 205),
    Rgb::new(229, 229, 229),
    Rgb::new(127, 127, 127),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(92, 92, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

/// Read-only terminal facts consumed by the editor.
#[derive(Clone, Debug)]
pub struct TermInfo {
    /// Default foreground color.
    pub default_foreground: Rgb,
    /// Default background color.
    pub default_background: Rgb,
    /// Terminal understands OSC 133 semantic prompt markers.
    pub semantic_prompts: bool,
}

impl Default for TermInfo {
    fn default() -> Self {
        Self {
            default_foreground: Rgb::new(229, 229, 229),
            default_background: Rgb::BLACK,
            semantic_prompts: false,
        }
    }
}

impl TermInfo {
    /// Detect terminal facts from the environment.
    #[must_use]
    pub fn detect() -> Self {
        let term = env::var("TERM").unwrap_or_default();
        let term_program = env::var("TERM_PROGRAM").unwrap_or_default();
        let colorfgbg = env::var("COLORFGBG").unwrap_or_default();

        let (default_foreground, default_background) = Self::detect_colors(&colorfgbg);
        let semantic_prompts = Self::detect_semantic_prompts(&term, &term_program);

        Self {
            default_foreground,
            default_background,
            semantic_prompts,
        }
    }

    /// Interpret a `COLORFGBG` value like `"15;0"`.
    fn detect_colors(colorfgbg: &str) -> (Rgb, Rgb) {
        let defaults = TermInfo::default();
        let mut parts = colorfgbg.split(';');
        let fg = parts.next().and_then(|s| s.parse::<usize>().ok());
        let bg = parts.next_back().and_then(|s| s.parse::<usize>().ok());
        match (fg, bg) {
            (Some(f), Some(b)) if f < 16 && b < 16 => (ANSI16[f], ANSI16[b]),
            _ => (defaults.default_foreground, defaults.default_background),
        }
    }

    fn detect_semantic_prompts(term: &str, term_program: &str) -> bool {
        term.contains("kitty")
            || term.contains("foot")
            || term.contains("wezterm")
            || term_program.contains("kitty")
            || term_program.contains("WezTerm")
            || term_program.contains("iTerm")
            || term_program.contains("vscode")
    }
}

/// Check if the given file descriptor is a TTY.
#[must_use]
pub fn is_tty(fd: RawFd) -> bool {
    // SAFETY: isatty is safe to call with any fd.
    unsafe { libc::isatty(fd) == 1 }
}

/// Saved terminal mode for restoration.
///
/// The editor itself never touches termios; the host puts the terminal
/// into character-at-a-time mode around its read loop. This guard turns
/// off canonical input, echo, and signal generation while keeping output
/// post-processing on (the editor's newlines rely on NL-to-CRNL
/// translation).
#[derive(Debug)]
pub struct RawModeGuard {
    fd: RawFd,
    original: libc::termios,
}

impl RawModeGuard {
    /// Enter character-at-a-time mode on the given file descriptor.
    ///
    /// Returns a guard that restores the terminal state when dropped.
    pub fn new(fd: RawFd) -> io::Result<Self> {
        let original = get_termios(fd)?;

        let mut raw = original;

        // Input modes: no start/stop control, no CR translation.
        raw.c_iflag &= !(libc::IXON | libc::ICRNL);

        // Local modes: echo off, canonical off, no extended functions,
        // no signal chars (Ctrl-C reaches the editor as a key).
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

        // Deliver single bytes without timeout.
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;

        set_termios(fd, &raw)?;

        Ok(Self { fd, original })
    }

    fn restore(&self) -> io::Result<()> {
        set_termios(self.fd, &self.original)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Get termios attributes.
fn get_termios(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: tcgetattr is safe when passed a valid termios struct.
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(termios)
    }
}

/// Set termios attributes.
fn set_termios(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    // SAFETY: tcsetattr is safe when passed a valid termios struct.
    let result = unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, termios) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Get the window size of the terminal behind `fd` as `(cols, rows)`.
///
/// Falls back to 80x25 when the descriptor is not a terminal; the visual
/// machinery cannot work there anyway and the arithmetic needs something
/// sane.
#[must_use]
pub fn window_size(fd: RawFd) -> (u16, u16) {
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };

    // SAFETY: ioctl with TIOCGWINSZ writes a winsize struct.
    let rc = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };

    if rc == -1 || size.ws_col == 0 || size.ws_row == 0 {
        (80, 25)
    } else {
        (size.ws_col, size.ws_row)
    }
}

/// Query the current cursor position via DSR (`ESC[6n`).
///
/// Returns `(col, row)`, 1-based. The descriptor is switched to blocking
/// for the duration of the read and its flags are restored afterwards.
pub fn cursor_position(fd: RawFd) -> io::Result<(u16, u16)> {
    crate::poll::write_all(fd, crate::ansi::sequences::CURSOR_POSITION_QUERY.as_bytes())?;

    // SAFETY: F_GETFL takes no pointers.
    let old_flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if old_flags == -1 {
        return Err(io::Error::last_os_error());
    }
    if old_flags & libc::O_NONBLOCK != 0 {
        // SAFETY: F_SETFL with integer flags.
        unsafe {
            libc::fcntl(fd, libc::F_SETFL, old_flags & !libc::O_NONBLOCK);
        }
    }

    let result = read_cursor_reply(fd);

    if old_flags & libc::O_NONBLOCK != 0 {
        // SAFETY: F_SETFL with integer flags.
        unsafe {
            libc::fcntl(fd, libc::F_SETFL, old_flags);
        }
    }

    result
}

fn read_cursor_reply(fd: RawFd) -> io::Result<(u16, u16)> {
    let mut buf = Vec::with_capacity(64);
    let mut chunk = [0u8; 256];

    loop {
        // SAFETY: chunk is valid writable storage.
        let n = unsafe {
            libc::read(
                fd,
                chunk.as_mut_ptr().cast::<libc::c_void>(),
                chunk.len(),
            )
        };
        if n <= 0 {
            let err = io::Error::last_os_error();
            if n < 0 && err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(if n == 0 {
                io::Error::new(io::ErrorKind::UnexpectedEof, "no DSR reply")
            } else {
                err
            });
        }
        buf.extend_from_slice(&chunk[..n as usize]);

        if let Some(pos) = parse_dsr_reply(&buf) {
            return Ok(pos);
        }

        // A reply is at most ESC [ nnnn ; nnnn R; anything this long
        // without one means the terminal is not answering.
        if buf.len() > 4096 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "no DSR reply in input",
            ));
        }
    }
}

/// Find the first well-formed `ESC [ <row> ; <col> R` in `input`.
///
/// Returns `(col, row)`. Other bytes (typed-ahead keys, other replies)
/// may precede or surround the reply and are skipped.
#[must_use]
pub fn parse_dsr_reply(input: &[u8]) -> Option<(u16, u16)> {
    let mut i = 0;
    while i + 6 <= input.len() {
        if input[i] == 0x1b && input[i + 1] == b'[' && input[i + 2].is_ascii_digit() {
            let mut p = i + 2;
            let mut row = 0u32;
            while p < input.len() && input[p].is_ascii_digit() {
                row = row * 10 + u32::from(input[p] - b'0');
                p += 1;
            }
            if p + 1 < input.len() && input[p] == b';' && input[p + 1].is_ascii_digit() {
                p += 1;
                let mut col = 0u32;
                while p < input.len() && input[p].is_ascii_digit() {
                    col = col * 10 + u32::from(input[p] - b'0');
                    p += 1;
                }
                if p < input.len() && input[p] == b'R' && row <= 0xffff && col <= 0xffff {
                    return Some((col as u16, row as u16));
                }
            }
        }
        i += 1;
    }
    None
}
