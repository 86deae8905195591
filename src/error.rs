//! Error types for termline.

use std::fmt;
use std::io;

/// Result type alias for termline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for editor sessions.
#[derive(Debug)]
pub enum Error {
    /// I/O error from terminal operations.
    Io(io::Error),
    /// The file descriptor cannot be driven by the key decoder.
    ///
    /// Reported when registering the decoder fd on the event loop fails
    /// with `EPERM`, which means the descriptor is not a character device
    /// (a regular file, for instance). The session is left closed and
    /// its resources released.
    NotATerminal,
    /// An operation that needs an open session was called on a closed one.
    ClosedSession,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::NotATerminal => write!(f, "inappropriate I/O control operation"),
            Self::ClosedSession => write!(f, "session is not open"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
