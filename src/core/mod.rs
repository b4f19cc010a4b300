//! Core measurement components.
//!
//! - **tty**: error type, the real terminal and descriptor I/O (`FdSink` on fd 0, `FdSource` on fd 1)
//! - **mode**: raw mode entry with guaranteed restore
//! - **signals**: restore and exit on SIGINT/SIGTERM/SIGHUP/SIGQUIT while raw
//! - **reply**: cursor position report state machine
//! - **probe**: fixed-count query/reply loop
//! - **wait**: optional bounded wait for reply bytes
//! - **session**: one full run from capture to restore
//!
//! # Architecture
//!
//! ```text
//! session::measure
//! ├── ModeController -> RawModeGuard (TerminalDevice)
//! │   └── SignalGuard
//! └── LatencyProbe
//!     ├── QuerySink   (ESC [ 6 n)
//!     ├── ReplySource (blocking, or TimedSource)
//!     └── ReplyParser (ESC [ row ; col R)
//! ```

pub mod mode;
pub mod probe;
pub mod reply;
pub mod session;
#[cfg(unix)]
pub mod signals;
pub mod tty;
pub mod wait;
