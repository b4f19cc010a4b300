//! Measurement session
//!
//! Ties the pieces together: capture the terminal, enter raw mode, run the
//! probe, restore the terminal. Restoration happens on every path out of
//! `measure`, including errors and panics.

use tracing::{error, info};

use super::mode::{ModeController, TerminalDevice};
use super::probe::{LatencyProbe, Measurement, QuerySink, ReplySource};
use super::tty::Result;
use crate::timing::Clock;

/// Run one full measurement against `device`
pub fn measure<D, S, R, C>(
    device: D,
    probe: &LatencyProbe,
    sink: &mut S,
    source: &mut R,
    clock: &C,
) -> Result<Measurement>
where
    D: TerminalDevice,
    S: QuerySink + ?Sized,
    R: ReplySource + ?Sized,
    C: Clock + ?Sized,
{
    let controller = ModeController::capture_original(device)?;
    let mut guard = controller.enter_raw_mode()?;

    let outcome = probe.run(sink, source, clock);
    let restored = guard.restore();

    match (outcome, restored) {
        (Ok(measurement), Ok(())) => {
            info!(
                "Completed {} round trips in {}us",
                measurement.rounds,
                measurement.interval().as_micros()
            );
            Ok(measurement)
        }
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => {
            error!("Probe failed: {}", e);
            Err(e)
        }
        (Err(probe_err), Err(restore_err)) => {
            error!("Probe failed: {}", probe_err);
            error!("Failed to restore terminal attributes: {}", restore_err);
            eprintln!("sst: failed to restore terminal attributes: {}", restore_err);
            Err(probe_err)
        }
    }
}
