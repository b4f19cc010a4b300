//! Latency probe
//!
//! Sends a fixed number of cursor position queries and waits for each reply
//! to be fully consumed. Only the begin and end timestamps are kept.

use tracing::{debug, info};

use super::reply::ReplyParser;
use super::tty::Result;
use crate::timing::{Clock, Interval, Timestamp};

/// Round trips per run
pub const ROUND_COUNT: usize = 100;

/// Device status report request: ESC [ 6 n
pub const CURSOR_POSITION_QUERY: [u8; 4] = [0x1B, b'[', b'6', b'n'];

/// Where queries are written
pub trait QuerySink {
    /// Write the whole buffer
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Where reply bytes come from
pub trait ReplySource {
    /// Wait for the next byte
    fn next_byte(&mut self) -> Result<u8>;
}

impl<T: QuerySink + ?Sized> QuerySink for &mut T {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }
}

impl<T: ReplySource + ?Sized> ReplySource for &mut T {
    fn next_byte(&mut self) -> Result<u8> {
        (**self).next_byte()
    }
}

/// Begin and end of a completed run
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    pub begin: Timestamp,
    pub end: Timestamp,
    pub rounds: usize,
}

impl Measurement {
    pub fn interval(&self) -> Interval {
        Interval::between(self.begin, self.end)
    }
}

/// Query/reply loop settings
#[derive(Debug, Clone)]
pub struct LatencyProbe {
    rounds: usize,
    query: Vec<u8>,
}

impl Default for LatencyProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyProbe {
    pub fn new() -> Self {
        Self {
            rounds: ROUND_COUNT,
            query: CURSOR_POSITION_QUERY.to_vec(),
        }
    }

    #[cfg(test)]
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    #[cfg(test)]
    pub fn with_query(mut self, query: &[u8]) -> Self {
        self.query = query.to_vec();
        self
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Run every round trip and time the whole batch
    pub fn run<S, R, C>(&self, sink: &mut S, source: &mut R, clock: &C) -> Result<Measurement>
    where
        S: QuerySink + ?Sized,
        R: ReplySource + ?Sized,
        C: Clock + ?Sized,
    {
        info!("Probing terminal with {} round trips", self.rounds);
        let mut parser = ReplyParser::new();

        let begin = clock.now();
        for _ in 0..self.rounds {
            sink.send(&self.query)?;
            read_reply(&mut parser, source)?;
        }
        let end = clock.now();

        debug!("Last reply was {} bytes", parser.consumed());
        Ok(Measurement {
            begin,
            end,
            rounds: self.rounds,
        })
    }
}

/// Drive the parser from a fresh state to a complete reply
fn read_reply<R: ReplySource + ?Sized>(parser: &mut ReplyParser, source: &mut R) -> Result<()> {
    parser.reset();
    while !parser.is_complete() {
        let byte = source.next_byte()?;
        parser.feed(byte);
    }
    Ok(())
}
