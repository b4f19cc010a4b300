//! Terminal mode control
//!
//! Captures the terminal's line-discipline attributes, switches to raw mode
//! and guarantees the original attributes are put back.
//!
//! ```text
//! ModeController::capture_original(device)
//!     └── enter_raw_mode() -> RawModeGuard
//!             ├── SignalGuard restores and exits on SIGINT/SIGTERM/SIGHUP/SIGQUIT
//!             ├── restore()   explicit, reports failure
//!             └── Drop        restores if restore() was never called
//! ```

use tracing::{debug, error, info};

#[cfg(unix)]
use super::signals::{RestoreFn, SignalGuard};
use super::tty::Result;

/// A terminal whose attribute set can be read and written
pub trait TerminalDevice {
    /// Snapshot of the line-discipline configuration
    type Attributes: Clone;

    fn read_attributes(&self) -> Result<Self::Attributes>;

    /// Apply attributes immediately, without waiting for pending output
    fn apply_attributes(&self, attrs: &Self::Attributes) -> Result<()>;

    /// Derive the raw working configuration from an original snapshot
    fn derive_raw(original: &Self::Attributes) -> Self::Attributes;

    /// Restore action usable from the signal watcher thread.
    ///
    /// `None` means the device cannot be reached from another thread and a
    /// termination signal leaves it as it is.
    fn signal_restore(&self, _original: &Self::Attributes) -> Option<Box<dyn Fn() + Send + 'static>> {
        None
    }
}

/// Holds the original attributes of a terminal between capture and raw mode
pub struct ModeController<D: TerminalDevice> {
    device: D,
    original: D::Attributes,
}

impl<D: TerminalDevice> ModeController<D> {
    /// Read the terminal's current attributes
    pub fn capture_original(device: D) -> Result<Self> {
        let original = device.read_attributes()?;
        debug!("Captured original terminal attributes");
        Ok(Self { device, original })
    }

    #[cfg(test)]
    pub fn original(&self) -> &D::Attributes {
        &self.original
    }

    /// Switch the terminal to raw mode.
    ///
    /// On failure the original attributes are reapplied on a best-effort
    /// basis, since a rejected `tcsetattr` may still have applied part of the
    /// request.
    pub fn enter_raw_mode(self) -> Result<RawModeGuard<D>> {
        let raw = D::derive_raw(&self.original);
        if let Err(e) = self.device.apply_attributes(&raw) {
            error!("Failed to enter raw mode: {}", e);
            let _ = self.device.apply_attributes(&self.original);
            return Err(e);
        }
        info!("Terminal switched to raw mode");
        #[cfg(unix)]
        let signals = self.device.signal_restore(&self.original).and_then(watch_signals);
        Ok(RawModeGuard {
            device: self.device,
            original: self.original,
            restored: false,
            #[cfg(unix)]
            signals,
        })
    }
}

/// Raw mode held for as long as this value lives
pub struct RawModeGuard<D: TerminalDevice> {
    device: D,
    original: D::Attributes,
    restored: bool,
    #[cfg(unix)]
    signals: Option<SignalGuard>,
}

#[cfg(unix)]
fn watch_signals(restore: RestoreFn) -> Option<SignalGuard> {
    match SignalGuard::restore_on_termination(restore) {
        Ok(guard) => Some(guard),
        Err(e) => {
            tracing::warn!("Signal watcher unavailable, terminal is not restored on kill: {}", e);
            None
        }
    }
}

impl<D: TerminalDevice> RawModeGuard<D> {
    /// Whether a termination signal restores the terminal
    #[cfg(all(test, unix))]
    pub fn watches_signals(&self) -> bool {
        self.signals.is_some()
    }

    /// Put the original attributes back.
    ///
    /// Runs at most once; later calls and the drop become no-ops even when
    /// this attempt fails.
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        let applied = self.device.apply_attributes(&self.original);
        // Watcher stays up until the original attributes are back
        #[cfg(unix)]
        drop(self.signals.take());
        applied?;
        info!("Terminal attributes restored");
        Ok(())
    }
}

impl<D: TerminalDevice> Drop for RawModeGuard<D> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.restore() {
            error!("Failed to restore terminal attributes: {}", e);
            eprintln!("sst: failed to restore terminal attributes: {}", e);
            eprintln!("sst: run `stty sane` to recover the terminal");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::tty::TerminalError;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) struct FakeAttrs {
        pub echo: bool,
        pub canonical: bool,
        pub signals: bool,
    }

    impl FakeAttrs {
        pub(crate) fn cooked() -> Self {
            Self { echo: true, canonical: true, signals: true }
        }
    }

    /// In-memory terminal that records every apply
    #[derive(Clone)]
    pub(crate) struct FakeDevice {
        pub current: Rc<RefCell<FakeAttrs>>,
        pub applies: Rc<Cell<usize>>,
        pub fail_applies: Rc<RefCell<Vec<bool>>>,
    }

    impl FakeDevice {
        pub(crate) fn new() -> Self {
            Self {
                current: Rc::new(RefCell::new(FakeAttrs::cooked())),
                applies: Rc::new(Cell::new(0)),
                fail_applies: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// Fail the n-th apply (0-based)
        pub(crate) fn failing_apply(n: usize) -> Self {
            let device = Self::new();
            device.fail_applies.borrow_mut().resize(n + 1, false);
            device.fail_applies.borrow_mut()[n] = true;
            device
        }
    }

    impl TerminalDevice for FakeDevice {
        type Attributes = FakeAttrs;

        fn read_attributes(&self) -> Result<FakeAttrs> {
            Ok(self.current.borrow().clone())
        }

        fn apply_attributes(&self, attrs: &FakeAttrs) -> Result<()> {
            let n = self.applies.get();
            self.applies.set(n + 1);
            if self.fail_applies.borrow().get(n).copied().unwrap_or(false) {
                return Err(TerminalError::SetAttributes(io::Error::new(
                    io::ErrorKind::Other,
                    "simulated failure",
                )));
            }
            *self.current.borrow_mut() = attrs.clone();
            Ok(())
        }

        fn derive_raw(original: &FakeAttrs) -> FakeAttrs {
            let mut raw = original.clone();
            raw.echo = false;
            raw.canonical = false;
            raw.signals = false;
            raw
        }
    }

    #[test]
    fn test_raw_then_explicit_restore() {
        let device = FakeDevice::new();
        let controller = ModeController::capture_original(device.clone()).unwrap();
        assert_eq!(controller.original(), &FakeAttrs::cooked());

        let mut guard = controller.enter_raw_mode().unwrap();
        assert!(!device.current.borrow().echo);
        assert!(!device.current.borrow().canonical);

        guard.restore().unwrap();
        assert_eq!(*device.current.borrow(), FakeAttrs::cooked());

        drop(guard);
        assert_eq!(device.applies.get(), 2);
    }

    #[test]
    fn test_drop_restores() {
        let device = FakeDevice::new();
        {
            let _guard = ModeController::capture_original(device.clone())
                .unwrap()
                .enter_raw_mode()
                .unwrap();
            assert!(!device.current.borrow().signals);
        }
        assert_eq!(*device.current.borrow(), FakeAttrs::cooked());
        assert_eq!(device.applies.get(), 2);
    }

    #[test]
    fn test_restore_runs_once() {
        let device = FakeDevice::failing_apply(1);
        let mut guard = ModeController::capture_original(device.clone())
            .unwrap()
            .enter_raw_mode()
            .unwrap();

        assert!(matches!(guard.restore(), Err(TerminalError::SetAttributes(_))));
        assert!(guard.restore().is_ok());
        drop(guard);
        assert_eq!(device.applies.get(), 2);
    }

    #[test]
    fn test_enter_raw_failure_reapplies_original() {
        let device = FakeDevice::failing_apply(0);
        let controller = ModeController::capture_original(device.clone()).unwrap();

        assert!(controller.enter_raw_mode().is_err());
        assert_eq!(*device.current.borrow(), FakeAttrs::cooked());
        assert_eq!(device.applies.get(), 2);
    }

    #[test]
    fn test_restore_during_panic() {
        let device = FakeDevice::new();
        let inner = device.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = ModeController::capture_original(inner)
                .unwrap()
                .enter_raw_mode()
                .unwrap();
            panic!("measurement blew up");
        }));

        assert!(result.is_err());
        assert_eq!(*device.current.borrow(), FakeAttrs::cooked());
    }

    /// Thread-safe terminal, reachable from the signal watcher
    #[derive(Clone)]
    struct SharedDevice {
        current: Arc<Mutex<FakeAttrs>>,
    }

    impl TerminalDevice for SharedDevice {
        type Attributes = FakeAttrs;

        fn read_attributes(&self) -> Result<FakeAttrs> {
            Ok(self.current.lock().unwrap().clone())
        }

        fn apply_attributes(&self, attrs: &FakeAttrs) -> Result<()> {
            *self.current.lock().unwrap() = attrs.clone();
            Ok(())
        }

        fn derive_raw(original: &FakeAttrs) -> FakeAttrs {
            FakeDevice::derive_raw(original)
        }

        fn signal_restore(&self, original: &FakeAttrs) -> Option<Box<dyn Fn() + Send + 'static>> {
            let current = self.current.clone();
            let original = original.clone();
            Some(Box::new(move || *current.lock().unwrap() = original.clone()))
        }
    }

    #[test]
    fn test_signal_restore_reapplies_original() {
        let device = SharedDevice {
            current: Arc::new(Mutex::new(FakeAttrs::cooked())),
        };
        let controller = ModeController::capture_original(device.clone()).unwrap();
        let restore = device.signal_restore(controller.original()).unwrap();

        let mut guard = controller.enter_raw_mode().unwrap();
        assert!(!device.current.lock().unwrap().echo);
        #[cfg(unix)]
        assert!(guard.watches_signals());

        // What the watcher runs before exiting
        restore();
        assert_eq!(*device.current.lock().unwrap(), FakeAttrs::cooked());

        guard.restore().unwrap();
        #[cfg(unix)]
        assert!(!guard.watches_signals());
    }

    #[test]
    fn test_single_threaded_device_has_no_watcher() {
        let guard = ModeController::capture_original(FakeDevice::new())
            .unwrap()
            .enter_raw_mode()
            .unwrap();
        #[cfg(unix)]
        assert!(!guard.watches_signals());
        drop(guard);
    }
}
