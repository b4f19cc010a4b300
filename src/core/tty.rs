//! Controlling terminal access
//!
//! Error type shared by the core plus the real Unix implementations of the
//! terminal device, the query sink and the reply source.
//!
//! Queries are written to the process's standard input descriptor and replies
//! are read from its standard output descriptor. In an interactive session
//! both resolve to the same terminal device; keeping them separate preserves
//! the tool's behavior under redirection.

use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("{0} is not an interactive terminal")]
    NotATerminal(&'static str),

    #[error("Failed to read terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    #[error("Failed to apply terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),

    #[error("Failed to write query to terminal: {0}")]
    Write(#[source] io::Error),

    #[error("Failed to read reply from terminal: {0}")]
    Read(#[source] io::Error),

    #[error("Terminal closed before a complete reply was received")]
    EndOfStream,

    #[error("No reply byte within {0:?}")]
    ReplyTimeout(Duration),

    #[error("Failed to start reply reader thread: {0}")]
    ReaderThread(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, TerminalError>;

#[cfg(unix)]
pub use self::unix::{FdSink, FdSource, StdinTerminal};

#[cfg(unix)]
mod unix {
    use std::io;
    use std::os::fd::AsFd;

    use crossterm::tty::IsTty;
    use rustix::io::Errno;
    use rustix::termios::{self, OptionalActions, Termios};
    use tracing::debug;

    use super::{Result, TerminalError};
    use crate::core::mode::TerminalDevice;
    use crate::core::probe::{QuerySink, ReplySource};

    /// Line discipline of the terminal attached to standard input
    pub struct StdinTerminal {
        _private: (),
    }

    impl StdinTerminal {
        /// Open the controlling terminal, refusing redirected streams
        pub fn open() -> Result<Self> {
            if !io::stdin().is_tty() {
                return Err(TerminalError::NotATerminal("standard input"));
            }
            if !io::stdout().is_tty() {
                return Err(TerminalError::NotATerminal("standard output"));
            }
            Ok(Self { _private: () })
        }
    }

    impl TerminalDevice for StdinTerminal {
        type Attributes = Termios;

        fn read_attributes(&self) -> Result<Termios> {
            termios::tcgetattr(io::stdin().as_fd())
                .map_err(|e| TerminalError::GetAttributes(io::Error::from(e)))
        }

        fn apply_attributes(&self, attrs: &Termios) -> Result<()> {
            termios::tcsetattr(io::stdin().as_fd(), OptionalActions::Now, attrs)
                .map_err(|e| TerminalError::SetAttributes(io::Error::from(e)))
        }

        fn derive_raw(original: &Termios) -> Termios {
            // cfmakeraw: no echo, no canonical mode, no signals, no translation,
            // VMIN=1 / VTIME=0
            let mut raw = original.clone();
            raw.make_raw();
            raw
        }

        fn signal_restore(&self, original: &Termios) -> Option<Box<dyn Fn() + Send + 'static>> {
            let original = original.clone();
            Some(Box::new(move || {
                let _ = termios::tcsetattr(io::stdin().as_fd(), OptionalActions::Now, &original);
            }))
        }
    }

    /// Writes queries to a descriptor
    #[derive(Debug)]
    pub struct FdSink<F> {
        fd: F,
    }

    impl<F: AsFd> FdSink<F> {
        pub fn new(fd: F) -> Self {
            Self { fd }
        }
    }

    impl FdSink<io::Stdin> {
        /// Queries go to the standard input descriptor
        pub fn stdin() -> Self {
            Self::new(io::stdin())
        }
    }

    impl<F: AsFd> QuerySink for FdSink<F> {
        fn send(&mut self, bytes: &[u8]) -> Result<()> {
            let fd = self.fd.as_fd();
            write_all_with(bytes, |chunk| rustix::io::write(fd, chunk))
        }
    }

    /// Reads reply bytes from a descriptor, one at a time
    #[derive(Debug)]
    pub struct FdSource<F> {
        fd: F,
    }

    impl<F: AsFd> FdSource<F> {
        pub fn new(fd: F) -> Self {
            Self { fd }
        }
    }

    impl FdSource<io::Stdout> {
        /// Replies come from the standard output descriptor
        pub fn stdout() -> Self {
            Self::new(io::stdout())
        }
    }

    impl<F: AsFd> ReplySource for FdSource<F> {
        fn next_byte(&mut self) -> Result<u8> {
            let fd = self.fd.as_fd();
            read_byte_with(|buf| rustix::io::read(fd, buf))
        }
    }

    /// Keep writing until every byte is out; retries EINTR
    fn write_all_with<W>(bytes: &[u8], mut write: W) -> Result<()>
    where
        W: FnMut(&[u8]) -> rustix::io::Result<usize>,
    {
        let mut remaining = bytes;
        while !remaining.is_empty() {
            match write(remaining) {
                Ok(0) => {
                    return Err(TerminalError::Write(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "terminal accepted no bytes",
                    )));
                }
                Ok(written) => {
                    if written < remaining.len() {
                        debug!("Partial query write: {} of {} bytes", written, remaining.len());
                    }
                    remaining = &remaining[written..];
                }
                Err(Errno::INTR) => continue,
                Err(e) => return Err(TerminalError::Write(io::Error::from(e))),
            }
        }
        Ok(())
    }

    /// Read exactly one byte; a zero-byte read is end of stream
    fn read_byte_with<R>(mut read: R) -> Result<u8>
    where
        R: FnMut(&mut [u8]) -> rustix::io::Result<usize>,
    {
        let mut byte = [0u8; 1];
        loop {
            match read(&mut byte[..]) {
                Ok(0) => return Err(TerminalError::EndOfStream),
                Ok(_) => return Ok(byte[0]),
                Err(Errno::INTR) => continue,
                Err(e) => return Err(TerminalError::Read(io::Error::from(e))),
            }
        }
    }

}
