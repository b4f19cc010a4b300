//! Terminal restore on termination signals
//!
//! Raw mode turns off ISIG, so a stuck run can only be ended from outside
//! (`kill`, closing the window). While raw mode is held a watcher thread
//! waits for those signals, puts the original attributes back and exits
//! with `128 + signal`.

use std::io;
use std::thread::{self, JoinHandle};

use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use tracing::warn;

/// Signals that end the process while the terminal is raw
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGHUP, SIGQUIT];

/// Restore action that can run on the watcher thread
pub type RestoreFn = Box<dyn Fn() + Send + 'static>;

/// Watches for signals until dropped
#[derive(Debug)]
pub struct SignalGuard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalGuard {
    /// Restore the terminal and exit when a termination signal arrives
    pub fn restore_on_termination(restore: RestoreFn) -> io::Result<Self> {
        Self::install(&TERMINATION_SIGNALS, move |signal| {
            warn!("Signal {} received, restoring terminal", signal);
            restore();
            std::process::exit(128 + signal);
        })
    }

    /// Run `on_signal` on a watcher thread for each of `signals`
    pub fn install<F>(signals: &[i32], mut on_signal: F) -> io::Result<Self>
    where
        F: FnMut(i32) + Send + 'static,
    {
        let mut signals = Signals::new(signals).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("sst-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    on_signal(signal);
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
