//! sst - shell speed test
//!
//! Measures how quickly the terminal answers. sst puts the terminal into raw
//! mode, sends 100 cursor position queries (`ESC [ 6 n`), waits for each
//! `ESC [ row ; col R` reply and prints the total time:
//!
//! ```text
//! $ sst
//! Time elapsed: 412ms
//! ```
//!
//! A slow total points at a laggy emulator, a multiplexer layer or a
//! high-latency remote link. The terminal's original mode is restored before
//! the result is printed, also when the run fails.
//!
//! Settings live in `~/.sst/config.toml` (see [`config`]). Logging is off
//! unless the file enables it; the log then goes to `~/.sst/sst.log`, never
//! to the terminal.

mod config;
mod core;
mod report;
mod timing;

use std::fs;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    let config = Config::load();
    init_logging(&config);

    info!("sst {} starting...", env!("CARGO_PKG_VERSION"));

    #[cfg(not(unix))]
    {
        eprintln!("sst needs a Unix terminal (termios).");
        std::process::exit(1);
    }

    #[cfg(unix)]
    {
        run(&config)?;
    }

    Ok(())
}

/// Initialize logging to file
fn init_logging(config: &Config) {
    let Some(log_path) = config.log_path() else {
        return;
    };

    // Create log directory if needed
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Measure the controlling terminal and print the result
#[cfg(unix)]
fn run(config: &Config) -> anyhow::Result<()> {
    use std::io;

    use anyhow::Context;

    use crate::core::probe::LatencyProbe;
    use crate::core::session;
    use crate::core::tty::{FdSink, FdSource, StdinTerminal};
    use crate::core::wait::{ReplyWait, TimedSource};
    use crate::report::Report;
    use crate::timing::MonotonicClock;

    let device = StdinTerminal::open().context("sst must run in an interactive terminal")?;
    let probe = LatencyProbe::new();
    let clock = MonotonicClock::new();
    let wait = ReplyWait::from_timeout(config.reply_timeout());
    info!("Rounds: {}, reply wait: {:?}", probe.rounds(), wait);

    let measurement = match wait {
        ReplyWait::Blocking => {
            session::measure(device, &probe, &mut FdSink::stdin(), &mut FdSource::stdout(), &clock)
        }
        ReplyWait::Bounded(timeout) => {
            let mut source = TimedSource::spawn(FdSource::stdout(), timeout)?;
            session::measure(device, &probe, &mut FdSink::stdin(), &mut source, &clock)
        }
    }
    .context("terminal latency measurement failed")?;

    let elapsed = measurement.interval();
    if elapsed.is_negative() {
        tracing::warn!("Clock went backwards: {}us", elapsed.as_micros());
    }

    Report::new(elapsed).emit(&mut io::stdout().lock())?;
    Ok(())
}
