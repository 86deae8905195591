//! `termline` - Interactive line input for Unix terminals
//!
//! termline is a minimal readline-class editor: an application opens a
//! session bound to a terminal file descriptor, sets a prompt, and
//! repeatedly obtains the next finished input line. Between keystrokes the
//! editor keeps the on-screen rendering live through cursor motion,
//! insertion, overwrite, deletion, word navigation, line discard, and
//! window resizes.
//!
//! # How This Crate Fits In
//!
//! This repository is a single-crate system. termline is the edit engine;
//! it does not own your application loop. Drive it blocking with
//! [`LineEditor::read`], or own the event multiplexer yourself, hand the
//! session your epoll descriptor, and feed it readiness events with
//! [`LineEditor::process`] so other I/O sources share the same loop.
//!
//! # Architecture At A Glance
//!
//! - `editor`: The session state machine - lifecycle, dispatch, actions,
//!   wrapping, and incremental redraw
//! - `input`: Pull-style key decoder turning raw terminal bytes into key
//!   events
//! - `ansi`: Escape sequence constants and batched emission helpers
//! - `terminal`: Terminal facts (default colors, OSC 133 support), window
//!   size, DSR cursor query
//! - `poll`: epoll / signalfd / signal-mask plumbing
//! - `color` / `unicode`: Integer color math and UTF-8 width primitives
//! - `event` / `error`: Log callback and error types
//!
//! # Data Flow
//!
//! ```text
//! fd readable -> KeyDecoder -> KeyEvent -> dispatch -> edit action
//!     -> buffer + row layout mutation -> one batched ANSI write to fd
//! ```
//!
//! Control flow is strictly single-threaded and event-driven; the only
//! suspension point is the multiplexer wait.
//!
//! # Width Model
//!
//! Every codepoint counts as one display column. Combining marks and
//! East-Asian wide characters will misalign; the width primitives in
//! [`unicode`] are the seam to replace if that ever matters.

// Crate-level lint configuration
#![warn(unsafe_code)] // Unsafe code needs justification (required for libc FFI)
#![allow(clippy::cast_possible_truncation)] // Intentional coordinate casts
#![allow(clippy::cast_sign_loss)] // Intentional coordinate conversions
#![allow(clippy::cast_possible_wrap)] // Intentional coordinate conversions
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::module_name_repetitions)] // Allow KeyCode in input::keyboard etc
#![allow(clippy::struct_excessive_bools)] // Session state needs multiple flags
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests

pub mod ansi;
pub mod color;
pub mod editor;
pub mod error;
pub mod event;
pub mod input;
pub mod poll;
pub mod terminal;
pub mod unicode;

// Re-export core types at crate root
pub use color::Rgb;
pub use editor::{EditAction, Frame, LineEditor, ProcessOutcome};
pub use error::{Error, Result};
pub use event::{LogLevel, emit_log, set_log_callback};
pub use input::{KeyCode, KeyDecoder, KeyEvent, KeyModifiers};
pub use terminal::{TermInfo, is_tty, window_size};
