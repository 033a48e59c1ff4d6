//! Network-wide discovery sessions.
//!
//! The browsing library watches the whole Dante network rather than one
//! device: `r d` lists the device names currently visible and `p` returns
//! the SDP session descriptors being advertised. Same lifecycle as a
//! routing device: construct unopened, `open()`, then `close()` for good.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam::channel::Receiver;
use tracing::info;

use dantelink_core::domain::sdp::SdpDescriptorInfo;
use dantelink_core::{BrowsingConfig, DanteError, Result};
#[cfg(windows)]
use dantelink_core::LinkConfig;

use crate::native::records;
use crate::native::NativeDriver;
use crate::poller::StepEvent;
use crate::session::SessionCore;

struct LiveSession {
    core: SessionCore,
    steps: Receiver<StepEvent>,
}

/// A discovery session over the whole network.
pub struct BrowsingSession {
    config: BrowsingConfig,
    driver: Arc<dyn NativeDriver>,
    live: Mutex<Option<LiveSession>>,
    closed: AtomicBool,
}

impl BrowsingSession {
    /// Build an unopened session over an explicit driver.
    pub fn with_driver(driver: Arc<dyn NativeDriver>, config: &BrowsingConfig) -> Self {
        Self {
            config: config.clone(),
            driver,
            live: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Unopened session against the real browsing library with default
    /// configuration.
    #[cfg(windows)]
    pub fn new() -> Self {
        Self::with_config(&LinkConfig::default())
    }

    /// Unopened session against the real browsing library.
    #[cfg(windows)]
    pub fn with_config(config: &LinkConfig) -> Self {
        Self::with_driver(
            Arc::new(crate::native::driver::BrowsingDriver),
            &config.browsing,
        )
    }

    /// Open the native session and start the step worker. No-op when already
    /// open; closed sessions stay closed.
    pub fn open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DanteError::SessionClosed);
        }
        let mut slot = self.live.lock().map_err(|_| DanteError::SessionClosed)?;
        if slot.is_some() {
            return Ok(());
        }
        let mut argv = vec![self.config.wrapper_name.as_str()];
        if self.config.conmon {
            argv.push("-conmon");
        }
        let (core, steps) = SessionCore::open(
            Arc::clone(&self.driver),
            &argv,
            "browse",
            self.config.step_channel_capacity,
        )?;
        *slot = Some(LiveSession { core, steps });
        info!("browsing session ready");
        Ok(())
    }

    /// Poll-loop notifications for the open session.
    pub fn step_events(&self) -> Result<Receiver<StepEvent>> {
        self.with_session(|live| Ok(live.steps.clone()))
    }

    /// List the device names currently visible on the network (`r d`).
    pub fn device_names(&self) -> Result<Vec<String>> {
        self.with_session(|live| live.core.command_strings("r d"))
    }

    /// List the SDP descriptors currently advertised (`p`).
    pub fn sdp_descriptors(&self) -> Result<Vec<SdpDescriptorInfo>> {
        self.with_session(|live| {
            live.core.command_records("p", |driver, raw| {
                // SAFETY: the reply to `p` carries descriptor blocks.
                unsafe { records::decode_sdp_descriptor(driver, raw) }
            })
        })
    }

    /// Close the session. Idempotent and terminal.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut slot) = self.live.lock() {
            if let Some(live) = slot.take() {
                live.core.close();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn with_session<T>(&self, action: impl FnOnce(&LiveSession) -> Result<T>) -> Result<T> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DanteError::SessionClosed);
        }
        let slot = self.live.lock().map_err(|_| DanteError::SessionClosed)?;
        let live = slot.as_ref().ok_or(DanteError::NotInitialized)?;
        action(live)
    }
}

impl Drop for BrowsingSession {
    // explicit close is the primary release path; this is the fallback
    fn drop(&mut self) {
        self.close();
    }
}
