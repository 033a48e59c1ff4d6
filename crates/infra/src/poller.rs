//! Background step worker.
//!
//! Each open session gets one dedicated thread that calls the native `step`
//! entry point in a tight loop; the native call paces itself, so the loop
//! carries no sleep of its own. Cancellation is cooperative through an
//! `AtomicBool` checked once per iteration, and each completed iteration is
//! reported over a bounded channel with a lossy send so a slow subscriber
//! never stalls polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::{debug, warn};

use dantelink_core::{DanteError, Result};

use crate::native::NativeDriver;
use crate::session::HandleCell;

/// One poll-loop iteration outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// An iteration completed
    Stepped,
    /// The native step failed with this code and the loop stopped
    Failed(i32),
}

/// Owns the step thread of one session.
pub(crate) struct StepWorker {
    label: String,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl StepWorker {
    /// Spawn the worker. `ticks` capacity bounds how far a subscriber may lag
    /// before iterations are dropped on the floor.
    pub(crate) fn spawn(
        driver: Arc<dyn NativeDriver>,
        handle: Arc<HandleCell>,
        label: &str,
        capacity: usize,
    ) -> Result<(Self, Receiver<StepEvent>)> {
        let cancel = Arc::new(AtomicBool::new(false));
        let (ticks, events) = bounded(capacity);
        let thread = std::thread::Builder::new()
            .name(format!("dante-step-{label}"))
            .spawn({
                let cancel = Arc::clone(&cancel);
                move || run(driver, handle, cancel, ticks)
            })
            .map_err(DanteError::Worker)?;
        Ok((
            Self {
                label: label.to_string(),
                cancel,
                thread: Some(thread),
            },
            events,
        ))
    }

    /// Ask the loop to stop and wait for the thread to finish.
    pub(crate) fn stop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(label = %self.label, "step worker panicked");
            }
        }
        debug!(label = %self.label, "step worker stopped");
    }
}

impl Drop for StepWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    driver: Arc<dyn NativeDriver>,
    handle: Arc<HandleCell>,
    cancel: Arc<AtomicBool>,
    ticks: Sender<StepEvent>,
) {
    while !cancel.load(Ordering::SeqCst) {
        let session = handle.load();
        if session.is_null() {
            break;
        }
        // SAFETY: the handle cell stays non-null until after this worker has
        // been joined, and command calls are serialized by the session.
        match unsafe { driver.step(session) } {
            Ok(()) => {
                let _ = ticks.try_send(StepEvent::Stepped);
            }
            Err(err) => {
                let code = match err {
                    DanteError::OperationFailed(code) => code,
                    _ => -1,
                };
                warn!(code, "native step failed, stopping poll loop");
                let _ = ticks.try_send(StepEvent::Failed(code));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::fake::FakeDriver;
    use std::time::Duration;

    #[test]
    fn worker_steps_until_stopped() {
        let driver = Arc::new(FakeDriver::routing());
        let session = driver.open(&["DanteRoutingWrapper", "DESKTOP-VSC"]).unwrap();
        let handle = Arc::new(HandleCell::new(session));
        let (mut worker, events) =
            StepWorker::spawn(driver.clone(), handle, "test", 8).unwrap();
        assert_eq!(
            events.recv_timeout(Duration::from_secs(2)).unwrap(),
            StepEvent::Stepped
        );
        worker.stop();
        let after_stop = driver.steps();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(driver.steps(), after_stop);
        unsafe { driver.close(session) };
    }

    #[test]
    fn null_handle_stops_the_loop_without_an_event() {
        let driver = Arc::new(FakeDriver::routing());
        let handle = Arc::new(HandleCell::new(std::ptr::null_mut()));
        let (mut worker, events) = StepWorker::spawn(driver, handle, "test", 8).unwrap();
        worker.stop();
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn step_failure_ends_the_loop() {
        let driver = Arc::new(FakeDriver::routing());
        // A handle whose id the driver has never seen makes every step fail.
        let bogus = Box::into_raw(Box::new(999u64)) as *mut std::ffi::c_void;
        let handle = Arc::new(HandleCell::new(bogus));
        let (mut worker, events) =
            StepWorker::spawn(driver.clone(), handle, "test", 8).unwrap();
        assert_eq!(
            events.recv_timeout(Duration::from_secs(2)).unwrap(),
            StepEvent::Failed(-1)
        );
        worker.stop();
        assert_eq!(driver.steps(), 0);
        unsafe { drop(Box::from_raw(bogus as *mut u64)) };
    }

    #[test]
    fn slow_subscribers_do_not_stall_polling() {
        let driver = Arc::new(FakeDriver::routing());
        let session = driver.open(&["DanteRoutingWrapper", "DESKTOP-VSC"]).unwrap();
        let handle = Arc::new(HandleCell::new(session));
        let (mut worker, _events) =
            StepWorker::spawn(driver.clone(), handle, "test", 2).unwrap();
        // Nobody drains the channel; the loop must keep going anyway.
        std::thread::sleep(Duration::from_millis(30));
        worker.stop();
        assert!(driver.steps() > 2);
        unsafe { driver.close(session) };
    }
}
