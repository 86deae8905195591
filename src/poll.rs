//! Event multiplexing and signal plumbing.
//!
//! Thin wrappers over `epoll`, `signalfd`, and `sigprocmask`. The session
//! either owns its epoll instance or borrows one from the host; in both
//! cases it only ever adds and removes its own two descriptors.
//!
//! Failure policy: `sigprocmask`, `signalfd`, `epoll_create1`, and
//! `epoll_ctl` (other than `EPERM` on add) failing means the runtime is
//! broken, so these helpers panic with a diagnostic instead of returning
//! an error the caller could do nothing sensible with. The `EPERM` add
//! path is the one recoverable case and is surfaced as an `io::Error`.
//!
//! # Safety
//! This module uses unsafe code for FFI calls to libc. The calls are
//! narrow wrappers; each one documents its invariants.

#![allow(unsafe_code)]

use std::io;
use std::os::unix::io::RawFd;

/// An epoll instance, either owned or borrowed from the host.
#[derive(Debug)]
pub struct Epoll {
    fd: RawFd,
    owned: bool,
}

impl Epoll {
    /// Create a new epoll instance.
    ///
    /// # Panics
    /// Panics if `epoll_create1` fails; that indicates a broken runtime.
    #[must_use]
    pub fn create() -> Self {
        // SAFETY: epoll_create1 has no pointer arguments.
        let fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        assert!(
            fd != -1,
            "epoll_create1 failed: {}",
            io::Error::last_os_error()
        );
        Self { fd, owned: true }
    }

    /// Wrap an epoll descriptor owned by the host.
    #[must_use]
    pub fn borrowed(fd: RawFd) -> Self {
        Self { fd, owned: false }
    }

    /// The underlying epoll descriptor.
    #[must_use]
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Whether this instance closes the descriptor on drop.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Register `fd` for level-triggered readability (IN|ERR).
    ///
    /// Returns the raw `epoll_ctl` error so the caller can recognize
    /// `EPERM` (descriptor not pollable).
    ///
    /// # Panics
    /// Panics on failures other than `EPERM`.
    pub fn add(&self, fd: RawFd) -> io::Result<()> {
        let mut event = libc::epoll_event {
            events: (libc::EPOLLIN | libc::EPOLLERR) as u32,
            u64: fd as u64,
        };
        // SAFETY: event points to a valid epoll_event for the duration of
        // the call.
        let rc = unsafe { libc::epoll_ctl(self.fd, libc::EPOLL_CTL_ADD, fd, &mut event) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EPERM) {
            return Err(err);
        }
        panic!("epoll_ctl(ADD, fd {fd}) failed: {err}");
    }

    /// Deregister `fd`. Best-effort; a failure here is ignored.
    pub fn remove(&self, fd: RawFd) {
        // SAFETY: a null event pointer is allowed for EPOLL_CTL_DEL on
        // kernels >= 2.6.9.
        unsafe {
            libc::epoll_ctl(self.fd, libc::EPOLL_CTL_DEL, fd, std::ptr::null_mut());
        }
    }

    /// Wait for one readiness event.
    ///
    /// Returns the ready descriptor, or `None` on timeout. `EINTR` is
    /// retried.
    pub fn wait(&self, timeout_ms: i32) -> io::Result<Option<RawFd>> {
        let mut event = libc::epoll_event { events: 0, u64: 0 };
        loop {
            // SAFETY: event points to writable storage for one epoll_event.
            let n = unsafe { libc::epoll_wait(self.fd, &mut event, 1, timeout_ms) };
            if n > 0 {
                return Ok(Some(event.u64 as RawFd));
            }
            if n == 0 {
                return Ok(None);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

impl Drop for Epoll {
    fn drop(&mut self) {
        if self.owned {
            // SAFETY: fd is an epoll descriptor we created.
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

/// Blocked `SIGWINCH` routed through a signalfd.
///
/// Blocks the signal process-wide on installation and restores the prior
/// mask on drop, so window-resize delivery happens on the event loop
/// instead of interrupting syscalls.
#[derive(Debug)]
pub struct WinchWatch {
    sigfd: RawFd,
    old_mask: libc::sigset_t,
}

impl WinchWatch {
    /// Block `SIGWINCH` and open a non-blocking signalfd for it.
    ///
    /// # Panics
    /// Panics if `sigprocmask` or `signalfd` fails; that indicates a
    /// broken runtime.
    #[must_use]
    pub fn install() -> Self {
        // SAFETY: mask and old_mask are valid sigset_t storage; the
        // sigemptyset/sigaddset/sigprocmask sequence is the documented
        // usage.
        unsafe {
            let mut mask: libc::sigset_t = std::mem::zeroed();
            let mut old_mask: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut mask);
            libc::sigaddset(&mut mask, libc::SIGWINCH);
            let rc = libc::sigprocmask(libc::SIG_BLOCK, &mask, &mut old_mask);
            assert!(rc == 0, "sigprocmask failed: {}", io::Error::last_os_error());

            let sigfd = libc::signalfd(-1, &mask, libc::SFD_NONBLOCK | libc::SFD_CLOEXEC);
            assert!(
                sigfd != -1,
                "signalfd failed: {}",
                io::Error::last_os_error()
            );

            Self { sigfd, old_mask }
        }
    }

    /// The signalfd descriptor to register on the event loop.
    #[must_use]
    pub fn fd(&self) -> RawFd {
        self.sigfd
    }

    /// Consume all pending signal records.
    pub fn drain(&self) {
        let mut info: libc::signalfd_siginfo = unsafe { std::mem::zeroed() };
        loop {
            // SAFETY: info is valid writable storage of the right size.
            let n = unsafe {
                libc::read(
                    self.sigfd,
                    std::ptr::addr_of_mut!(info).cast::<libc::c_void>(),
                    std::mem::size_of::<libc::signalfd_siginfo>(),
                )
            };
            if n <= 0 {
                return;
            }
        }
    }
}

impl Drop for WinchWatch {
    fn drop(&mut self) {
        // SAFETY: sigfd is a signalfd we created; old_mask was filled in
        // by sigprocmask at install time.
        unsafe {
            libc::close(self.sigfd);
            libc::sigprocmask(libc::SIG_SETMASK, &self.old_mask, std::ptr::null_mut());
        }
    }
}

/// Set or clear `O_NONBLOCK` on a descriptor.
pub fn set_nonblocking(fd: RawFd, nonblocking: bool) -> io::Result<()> {
    // SAFETY: F_GETFL/F_SETFL take no pointers.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags == -1 {
            return Err(io::Error::last_os_error());
        }
        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        if libc::fcntl(fd, libc::F_SETFL, flags) == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Write all of `bytes` to `fd`.
///
/// Handles `EINTR` and, since the terminal descriptor is non-blocking
/// while a session is open, waits for writability on `EAGAIN`.
pub fn write_all(fd: RawFd, bytes: &[u8]) -> io::Result<()> {
    let mut off = 0usize;
    while off < bytes.len() {
        // SAFETY: the pointer/length pair describes the unwritten suffix.
        let n = unsafe {
            libc::write(
                fd,
                bytes[off..].as_ptr().cast::<libc::c_void>(),
                bytes.len() - off,
            )
        };
        if n >= 0 {
            off += n as usize;
            continue;
        }
        let err = io::Error::last_os_error();
        match err.kind() {
            io::ErrorKind::Interrupted => {}
            io::ErrorKind::WouldBlock => wait_writable(fd)?,
            _ => return Err(err),
        }
    }
    Ok(())
}

fn wait_writable(fd: RawFd) -> io::Result<()> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        // SAFETY: pfd points to one valid pollfd.
        let n = unsafe { libc::poll(&mut pfd, 1, -1) };
        if n >= 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
