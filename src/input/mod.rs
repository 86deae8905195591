//! Terminal key input: decoding raw bytes into key events.
//!
//! [`KeyDecoder`] is the pull-style decoder the editor drives: the event
//! loop tells it when its descriptor is readable ([`KeyDecoder::advise_readable`]),
//! then pulls decoded keys until none are left ([`KeyDecoder::next_key`]).
//! A lone `ESC` cannot be distinguished from the start of a sequence until
//! more bytes arrive; the loop resolves the ambiguity after a short timeout
//! with [`KeyDecoder::force_next_key`].
//!
//! # Safety
//! Reading the descriptor uses a direct `libc::read` FFI call.

#![allow(unsafe_code)]

pub mod keyboard;
pub mod parser;

pub use keyboard::{KeyCode, KeyEvent, KeyModifiers};
pub use parser::{KeyParser, ParseError, ParseResult};

use crate::event::{LogLevel, emit_log};
use std::io;
use std::os::unix::io::RawFd;

/// Pull-style key decoder bound to a file descriptor.
#[derive(Debug)]
pub struct KeyDecoder {
    fd: RawFd,
    parser: KeyParser,
    pending: Vec<u8>,
    eof: bool,
}

impl KeyDecoder {
    /// Create a decoder reading from `fd`.
    ///
    /// The descriptor is expected to be non-blocking while the decoder is
    /// in use; the session arranges that.
    #[must_use]
    pub fn new(fd: RawFd) -> Self {
        Self {
            fd,
            parser: KeyParser::new(),
            pending: Vec::with_capacity(256),
            eof: false,
        }
    }

    /// The descriptor this decoder reads from.
    #[must_use]
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Whether the descriptor reported end of input.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Whether an undecodable partial sequence is buffered.
    ///
    /// When true, the event loop should wake up after a short timeout and
    /// call [`Self::force_next_key`] rather than block indefinitely.
    #[must_use]
    pub fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain everything currently readable from the descriptor.
    ///
    /// Call when the event loop reports the descriptor readable. Records
    /// EOF when the descriptor reports it.
    pub fn advise_readable(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; 4096];
        loop {
            // SAFETY: chunk is a valid writable buffer of the given length.
            let n = unsafe {
                libc::read(
                    self.fd,
                    chunk.as_mut_ptr().cast::<libc::c_void>(),
                    chunk.len(),
                )
            };
            if n > 0 {
                self.pending.extend_from_slice(&chunk[..n as usize]);
                continue;
            }
            if n == 0 {
                self.eof = true;
                return Ok(());
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::WouldBlock => return Ok(()),
                io::ErrorKind::Interrupted => {}
                _ => return Err(err),
            }
        }
    }

    /// Pull the next decoded key, if one is complete.
    ///
    /// Skips unrecognized escape sequences and invalid bytes. Returns
    /// `None` when the buffer is empty or holds only a partial sequence.
    pub fn next_key(&mut self) -> Option<KeyEvent> {
        loop {
            match self.parser.parse(&self.pending) {
                Ok((event, used)) => {
                    self.pending.drain(..used);
                    return Some(event);
                }
                Err(ParseError::Empty | ParseError::Incomplete) => return None,
                Err(ParseError::UnrecognizedSequence(seq)) => {
                    emit_log(
                        LogLevel::Debug,
                        &format!("skipping unrecognized sequence ({} bytes)", seq.len()),
                    );
                    self.pending.drain(..seq.len());
                }
                Err(ParseError::InvalidUtf8) => {
                    self.pending.drain(..1);
                }
            }
        }
    }

    /// Resolve a buffered partial sequence after a timeout.
    ///
    /// A pending lone `ESC` becomes the Escape key; a stranded partial
    /// UTF-8 sequence is dropped byte-by-byte until something decodes.
    pub fn force_next_key(&mut self) -> Option<KeyEvent> {
        loop {
            if let Some(event) = self.next_key() {
                return Some(event);
            }
            if self.pending.is_empty() {
                return None;
            }
            if self.pending[0] == 0x1b {
                self.pending.drain(..1);
                return Some(KeyEvent::key(KeyCode::Esc));
            }
            self.pending.drain(..1);
        }
    }

    /// Feed bytes directly, bypassing the descriptor.
    ///
    /// Intended for tests and for hosts that do their own reads.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }
}
