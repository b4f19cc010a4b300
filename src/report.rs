//! Result line printed after a run

use std::fmt;
use std::io::{self, Write};

use crate::timing::Interval;

const LABEL: &str = "Time elapsed";

/// Total elapsed time of a run
#[derive(Debug, Clone, Copy)]
pub struct Report {
    elapsed: Interval,
}

impl Report {
    pub fn new(elapsed: Interval) -> Self {
        Self { elapsed }
    }

    /// Write the single result line
    pub fn emit<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self)?;
        out.flush()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}ms", LABEL, self.elapsed.whole_millis())
    }
}
