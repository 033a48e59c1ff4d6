//! Shared session lifecycle for both wrapper flavours.
//!
//! A session is open from construction until `close`, and `Closed` is
//! terminal: close is idempotent, a closed session never reopens, and every
//! command on it fails with `SessionClosed`. Close ordering is strict: mark
//! closed, join the step worker, then run the native close exactly once.
//! Commands serialize against each other and against close through one
//! mutex; the step loop runs alongside them, which is the contract the
//! native libraries are built for.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam::channel::Receiver;
use tracing::{debug, info};

use dantelink_core::{DanteError, Result};

use crate::native::driver::{NativeDriver, RawSession};
use crate::native::marshal;
use crate::poller::{StepEvent, StepWorker};

/// Shared slot holding the native handle. Cleared (to null) exactly once,
/// during close, after the step worker has been joined.
pub(crate) struct HandleCell(AtomicPtr<c_void>);

impl HandleCell {
    pub(crate) fn new(session: RawSession) -> Self {
        Self(AtomicPtr::new(session))
    }

    pub(crate) fn load(&self) -> RawSession {
        self.0.load(Ordering::Acquire)
    }

    fn clear(&self) -> RawSession {
        self.0.swap(std::ptr::null_mut(), Ordering::AcqRel)
    }
}

pub(crate) struct SessionCore {
    label: String,
    driver: Arc<dyn NativeDriver>,
    handle: Arc<HandleCell>,
    worker: Mutex<Option<StepWorker>>,
    // serializes commands with each other and with close
    command_gate: Mutex<()>,
    closed: AtomicBool,
}

impl SessionCore {
    /// Open a native session and start its step worker.
    pub(crate) fn open(
        driver: Arc<dyn NativeDriver>,
        argv: &[&str],
        label: &str,
        step_capacity: usize,
    ) -> Result<(Self, Receiver<StepEvent>)> {
        let session = driver.open(argv)?;
        let handle = Arc::new(HandleCell::new(session));
        let (worker, steps) =
            StepWorker::spawn(Arc::clone(&driver), Arc::clone(&handle), label, step_capacity)?;
        info!(label, "session opened");
        Ok((
            Self {
                label: label.to_string(),
                driver,
                handle,
                worker: Mutex::new(Some(worker)),
                command_gate: Mutex::new(()),
                closed: AtomicBool::new(false),
            },
            steps,
        ))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Submit a command whose reply carries no data worth keeping. The reply
    /// buffer is still walked and freed.
    pub(crate) fn command(&self, line: &str) -> Result<()> {
        let raw = self.submit(line)?;
        // SAFETY: reply fresh from this driver, consumed exactly once.
        unsafe { marshal::drain(self.driver.as_ref(), raw) };
        Ok(())
    }

    pub(crate) fn command_strings(&self, line: &str) -> Result<Vec<String>> {
        let raw = self.submit(line)?;
        // SAFETY: reply fresh from this driver, elements are C strings.
        Ok(unsafe { marshal::string_vec(self.driver.as_ref(), raw) })
    }

    pub(crate) fn command_records<R, T>(
        &self,
        line: &str,
        decode: impl Fn(&dyn NativeDriver, &R) -> T,
    ) -> Result<Vec<T>> {
        let raw = self.submit(line)?;
        // SAFETY: reply fresh from this driver, elements are `R` blocks.
        Ok(unsafe { marshal::record_vec(self.driver.as_ref(), raw, decode) })
    }

    fn submit(&self, line: &str) -> Result<crate::native::RawReply> {
        let _gate = self.command_gate.lock().map_err(|_| DanteError::SessionClosed)?;
        if self.is_closed() {
            return Err(DanteError::SessionClosed);
        }
        let session = self.handle.load();
        if session.is_null() {
            return Err(DanteError::NotInitialized);
        }
        debug!(label = %self.label, line, "command");
        // SAFETY: the handle stays live while the gate is held; close clears
        // it only under the same gate.
        unsafe { self.driver.process_line(session, line) }
    }

    /// Close the session. Safe to call any number of times; only the first
    /// call reaches the native library.
    pub(crate) fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // join the worker before the handle goes away
        if let Ok(mut slot) = self.worker.lock() {
            if let Some(mut worker) = slot.take() {
                worker.stop();
            }
        }
        let _gate = self.command_gate.lock();
        let session = self.handle.clear();
        if !session.is_null() {
            // SAFETY: first close, worker joined, commands gated out.
            unsafe { self.driver.close(session) };
        }
        info!(label = %self.label, "session closed");
    }
}

impl Drop for SessionCore {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::fake::FakeDriver;
    use std::time::Duration;

    fn open_routing(driver: &Arc<FakeDriver>) -> (SessionCore, Receiver<StepEvent>) {
        SessionCore::open(
            driver.clone() as Arc<dyn NativeDriver>,
            &["DanteRoutingWrapper", "DESKTOP-VSC"],
            "DESKTOP-VSC",
            8,
        )
        .unwrap()
    }

    #[test]
    fn open_starts_polling() {
        let driver = Arc::new(FakeDriver::routing());
        let (core, steps) = open_routing(&driver);
        assert_eq!(
            steps.recv_timeout(Duration::from_secs(2)).unwrap(),
            StepEvent::Stepped
        );
        core.close();
    }

    #[test]
    fn close_is_idempotent_and_reaches_native_once() {
        let driver = Arc::new(FakeDriver::routing());
        let (core, _steps) = open_routing(&driver);
        core.close();
        core.close();
        drop(core);
        assert_eq!(driver.closes(), 1);
        assert_eq!(driver.live_sessions(), 0);
    }

    #[test]
    fn commands_after_close_are_rejected() {
        let driver = Arc::new(FakeDriver::routing());
        let (core, _steps) = open_routing(&driver);
        core.close();
        assert!(matches!(core.command("r"), Err(DanteError::SessionClosed)));
        assert!(core.is_closed());
    }

    #[test]
    fn close_stops_stepping_before_native_close() {
        let driver = Arc::new(FakeDriver::routing());
        let (core, _steps) = open_routing(&driver);
        core.close();
        let settled = driver.steps();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(driver.steps(), settled);
    }

    #[test]
    fn no_output_command_still_frees_its_reply() {
        let driver = Arc::new(FakeDriver::routing());
        let (core, _steps) = open_routing(&driver);
        core.command("r 3 \"TEST-CHANNEL-NAME\"").unwrap();
        core.close();
    }

    #[test]
    fn two_sessions_are_independent() {
        let driver = Arc::new(FakeDriver::routing());
        let (first, _a) = open_routing(&driver);
        let (second, _b) = open_routing(&driver);
        first.close();
        assert!(second.command("r").is_ok());
        assert_eq!(driver.live_sessions(), 1);
        second.close();
        assert_eq!(driver.closes(), 2);
    }
}
