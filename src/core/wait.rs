//! Bounded reply wait
//!
//! The default probe blocks on the terminal until every reply byte arrives.
//! `TimedSource` moves the blocking read onto a reader thread and gives up
//! once no byte arrives within the timeout. The reader thread stays parked in
//! its read after a timeout; the process is expected to exit soon after.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::probe::ReplySource;
use super::tty::{Result, TerminalError};

/// Reply bytes buffered between the reader thread and the probe
const CHANNEL_CAPACITY: usize = 64;

/// How the probe waits for reply bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyWait {
    /// Block until the terminal answers
    Blocking,
    /// Fail when no byte arrives within the duration
    Bounded(Duration),
}

impl ReplyWait {
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(d) => ReplyWait::Bounded(d),
            None => ReplyWait::Blocking,
        }
    }
}

/// Reply source with a per-byte timeout
pub struct TimedSource {
    rx: Receiver<Result<u8>>,
    timeout: Duration,
}

impl TimedSource {
    /// Start a reader thread that forwards bytes from `source`
    pub fn spawn<R>(mut source: R, timeout: Duration) -> Result<Self>
    where
        R: ReplySource + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(CHANNEL_CAPACITY);

        thread::Builder::new()
            .name("sst-reply-reader".into())
            .spawn(move || loop {
                let item = source.next_byte();
                let failed = item.is_err();
                if tx.send(item).is_err() || failed {
                    debug!("Reply reader thread exiting");
                    break;
                }
            })
            .map_err(TerminalError::ReaderThread)?;

        Ok(Self { rx, timeout })
    }
}

impl ReplySource for TimedSource {
    fn next_byte(&mut self) -> Result<u8> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) => {
                warn!("Terminal did not answer within {:?}", self.timeout);
                Err(TerminalError::ReplyTimeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(TerminalError::EndOfStream),
        }
    }
}
