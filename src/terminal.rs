//! Raw terminal mode as a scoped resource.
//!
//! [`RawMode`] switches the terminal to character-at-a-time delivery without echo or
//! signal generation and puts the saved settings back when it is dropped, whichever
//! way the owning scope is left.

use std::fs::File;
use std::io;

#[cfg(unix)]
use std::os::fd::{AsRawFd, RawFd};
#[cfg(unix)]
use termios::{TCSANOW, Termios, cfmakeraw, tcsetattr};

/// Guard holding the terminal in raw mode.
pub struct RawMode {
    #[cfg(unix)]
    fd: RawFd,
    #[cfg(unix)]
    original: Termios,
}

impl RawMode {
    /// Put the terminal behind `tty` into raw mode.
    #[cfg(unix)]
    pub fn enable(tty: &impl AsRawFd) -> io::Result<Self> {
        let fd = tty.as_raw_fd();
        let original = Termios::from_fd(fd)?;
        let mut raw = original;
        cfmakeraw(&mut raw);
        tcsetattr(fd, TCSANOW, &raw)?;
        tracing::debug!(fd, "terminal switched to raw mode");
        Ok(Self { fd, original })
    }

    #[cfg(not(unix))]
    pub fn enable<T>(_tty: &T) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode is only available on unix terminals",
        ))
    }
}

impl Drop for RawMode {
    #[cfg(unix)]
    fn drop(&mut self) {
        match tcsetattr(self.fd, TCSANOW, &self.original) {
            Ok(()) => tracing::debug!(fd = self.fd, "terminal mode restored"),
            Err(e) => tracing::warn!(fd = self.fd, "could not restore terminal mode: {e}"),
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {}
}

/// Standard input as a `File` over a duplicated descriptor.
///
/// Reads go straight to the descriptor, so bytes past the current line stay
/// available to child processes that inherit stdin.
#[cfg(unix)]
pub fn unbuffered_stdin() -> io::Result<File> {
    use std::os::fd::AsFd;
    Ok(File::from(io::stdin().as_fd().try_clone_to_owned()?))
}

#[cfg(windows)]
pub fn unbuffered_stdin() -> io::Result<File> {
    use std::os::windows::io::AsHandle;
    Ok(File::from(io::stdin().as_handle().try_clone_to_owned()?))
}

#[cfg(not(any(unix, windows)))]
pub fn unbuffered_stdin() -> io::Result<File> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "stdin cannot be duplicated on this platform",
    ))
}
