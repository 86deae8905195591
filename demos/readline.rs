//! Demo: drive the editor from a host-owned epoll loop.
//!
//! Demonstrates:
//! - Borrowing an external multiplexer with `LineEditor::with_epoll`
//! - Calling `prepare` once per edit and `process` per readiness event
//! - Frame decoration selected by a command-line flag
//!
//! Run with `--frame line`, `--frame background`, or no flag. An empty
//! line (Ctrl-C, or Ctrl-D on an empty buffer) exits.

use std::process::ExitCode;
use termline::poll::Epoll;
use termline::terminal::RawModeGuard;
use termline::{Frame, LineEditor, ProcessOutcome, Rgb};

fn frame_from_args() -> Option<Frame> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Some(Frame::None),
        Some("--frame") => match args.next().as_deref() {
            Some("line") => Some(Frame::Line),
            Some("background") => Some(Frame::Background),
            Some("none") => Some(Frame::None),
            _ => None,
        },
        Some(_) => None,
    }
}

fn main() -> ExitCode {
    let Some(frame) = frame_from_args() else {
        eprintln!("usage: readline [--frame line|background|none]");
        return ExitCode::FAILURE;
    };

    let stdin = libc::STDIN_FILENO;
    let _raw = match RawModeGuard::new(stdin) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("cannot set terminal mode: {err}");
            return ExitCode::FAILURE;
        }
    };

    let epoll = Epoll::create();
    let mut editor = LineEditor::with_epoll(epoll.fd(), stdin, frame);
    if frame == Frame::Line {
        editor.frame_highlight_fg = Rgb::new(255, 215, 0);
    }
    editor.set_prompt("INPUT> ");
    editor.set_empty_message("Type something …");

    loop {
        // Safe to call unconditionally; only the first call per edit has
        // an effect.
        if let Err(err) = editor.prepare() {
            eprintln!("cannot open session: {err}");
            return ExitCode::FAILURE;
        }

        let fd = match epoll.wait(-1) {
            Ok(Some(fd)) => fd,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("wait failed: {err}");
                return ExitCode::FAILURE;
            }
        };

        match editor.process(fd) {
            Ok(ProcessOutcome::Line(line)) => {
                if line.is_empty() {
                    return ExitCode::SUCCESS;
                }
                println!("input = {line}");
            }
            Ok(ProcessOutcome::Pending) => {}
            Ok(ProcessOutcome::UnknownFd) => {
                eprintln!("unhandled file descriptor {fd}");
            }
            Err(err) => {
                eprintln!("process failed: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
}
