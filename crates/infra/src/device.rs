//! Routing sessions against one named Dante device.
//!
//! A device is constructed unopened, `open()` starts the native session and
//! its poll loop, and `close()` is terminal. Commands are single text lines
//! in the grammar the routing library parses: bare `r`/`t`/`l` list receive
//! channels, transmit channels and labels; `r <n> "<name>"` and
//! `s <n> "<name>"` rename a receive or transmit channel; `l <n> "<name>" +`
//! appends a label. Structured replies come back as record buffers and are
//! decoded through [`crate::native::records`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam::channel::Receiver;
use tracing::info;

use dantelink_core::domain::channel::{RxChannelInfo, TxChannelInfo, TxLabelInfo};
use dantelink_core::{DanteError, Result, RoutingConfig};
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

/// A routing session for one device. Unopened until [`open`](Self::open),
/// then live until [`close`](Self::close); closed devices never reopen.
pub struct RoutingDevice {
    name: String,
    config: RoutingConfig,
    driver: Arc<dyn NativeDriver>,
    live: Mutex<Option<LiveSession>>,
    closed: AtomicBool,
}

impl RoutingDevice {
    /// Build an unopened device over an explicit driver. The name is checked
    /// here so an invalid one never reaches the library.
    pub fn with_driver(
        driver: Arc<dyn NativeDriver>,
        config: &RoutingConfig,
        name: &str,
    ) -> Result<Self> {
        let name = valid_name(name)?;
        Ok(Self {
            name,
            config: config.clone(),
            driver,
            live: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Unopened device against the real routing library with default
    /// configuration.
    #[cfg(windows)]
    pub fn new(name: &str) -> Result<Self> {
        Self::with_config(name, &LinkConfig::default())
    }

    /// Unopened device against the real routing library.
    #[cfg(windows)]
    pub fn with_config(name: &str, config: &LinkConfig) -> Result<Self> {
        Self::with_driver(
            Arc::new(crate::native::driver::RoutingDriver),
            &config.routing,
            name,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open the native session and start the step worker. A second call on
    /// an already-open device is a no-op; a closed device stays closed.
    pub fn open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DanteError::SessionClosed);
        }
        let mut slot = lock(&self.live)?;
        if slot.is_some() {
            return Ok(());
        }
        #[cfg(windows)]
        crate::native::events::install_routing_callbacks();
        let argv = [self.config.wrapper_name.as_str(), self.name.as_str()];
        let (core, steps) = SessionCore::open(
            Arc::clone(&self.driver),
            &argv,
            &self.name,
            self.config.step_channel_capacity,
        )?;
        *slot = Some(LiveSession { core, steps });
        info!(device = %self.name, "routing device ready");
        Ok(())
    }

    /// Poll-loop notifications for the open session.
    pub fn step_events(&self) -> Result<Receiver<StepEvent>> {
        self.with_session(|live| Ok(live.steps.clone()))
    }

    /// List receive channels (`r`).
    pub fn rx_channels(&self) -> Result<Vec<RxChannelInfo>> {
        self.with_session(|live| {
            live.core.command_records("r", |driver, raw| {
                // SAFETY: the reply to `r` carries receive channel blocks.
                unsafe { records::decode_rx_channel(driver, raw) }
            })
        })
    }

    /// List transmit channels (`t`).
    pub fn tx_channels(&self) -> Result<Vec<TxChannelInfo>> {
        self.with_session(|live| {
            live.core.command_records("t", |driver, raw| {
                // SAFETY: the reply to `t` carries transmit channel blocks.
                unsafe { records::decode_tx_channel(driver, raw) }
            })
        })
    }

    /// List transmit labels (`l`).
    pub fn tx_labels(&self) -> Result<Vec<TxLabelInfo>> {
        self.with_session(|live| {
            live.core.command_records("l", |driver, raw| {
                // SAFETY: the reply to `l` carries label blocks.
                unsafe { records::decode_tx_label(driver, raw) }
            })
        })
    }

    /// Rename receive channel `id` (`r <n> "<name>"`).
    pub fn set_rx_channel_name(&self, id: u16, name: &str) -> Result<()> {
        let name = valid_name(name)?;
        self.with_session(|live| live.core.command(&format!("r {id} \"{name}\"")))
    }

    /// Rename transmit channel `id` (`s <n> "<name>"`).
    pub fn set_tx_channel_name(&self, id: u16, name: &str) -> Result<()> {
        let name = valid_name(name)?;
        self.with_session(|live| live.core.command(&format!("s {id} \"{name}\"")))
    }

    /// Attach a label to transmit channel `id` (`l <n> "<name>" +`).
    pub fn add_tx_label(&self, id: u16, label: &str) -> Result<()> {
        let label = valid_name(label)?;
        self.with_session(|live| live.core.command(&format!("l {id} \"{label}\" +")))
    }

    /// Close the session. Idempotent; the instance stays around but every
    /// further call fails with [`DanteError::SessionClosed`].
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
        let slot = lock(&self.live)?;
        let live = slot.as_ref().ok_or(DanteError::NotInitialized)?;
        action(live)
    }
}

impl Drop for RoutingDevice {
    // explicit close is the primary release path; this is the fallback
    fn drop(&mut self) {
        self.close();
    }
}

fn lock<'a, T>(slot: &'a Mutex<T>) -> Result<std::sync::MutexGuard<'a, T>> {
    slot.lock().map_err(|_| DanteError::SessionClosed)
}

/// Names travel inside quoted command arguments, so they must be non-blank
/// and free of quote characters.
pub(crate) fn valid_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains('"') {
        return Err(DanteError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::fake::FakeDriver;
    use dantelink_core::domain::channel::{RxStatus, DBU_UNSET};

    fn open_fake() -> (Arc<FakeDriver>, RoutingDevice) {
        let driver = Arc::new(FakeDriver::routing());
        let device = RoutingDevice::with_driver(
            driver.clone(),
            &RoutingConfig::default(),
            "DESKTOP-VSC",
        )
        .unwrap();
        device.open().unwrap();
        (driver, device)
    }

    #[test]
    fn blank_name_is_rejected_at_construction() {
        let driver = Arc::new(FakeDriver::routing());
        let outcome = RoutingDevice::with_driver(driver.clone(), &RoutingConfig::default(), "  ");
        assert!(matches!(outcome, Err(DanteError::InvalidName(_))));
        assert_eq!(driver.opens(), 0);
    }

    #[test]
    fn commands_before_open_fail_without_a_foreign_call() {
        let driver = Arc::new(FakeDriver::routing());
        let device =
            RoutingDevice::with_driver(driver.clone(), &RoutingConfig::default(), "DESKTOP-VSC")
                .unwrap();
        assert!(matches!(
            device.rx_channels(),
            Err(DanteError::NotInitialized)
        ));
        assert!(matches!(
            device.step_events(),
            Err(DanteError::NotInitialized)
        ));
        assert_eq!(driver.opens(), 0);
    }

    #[test]
    fn open_twice_is_a_single_native_open() {
        let (driver, device) = open_fake();
        device.open().unwrap();
        assert_eq!(driver.opens(), 1);
        device.close();
    }

    #[test]
    fn open_after_close_is_rejected() {
        let (driver, device) = open_fake();
        device.close();
        assert!(matches!(device.open(), Err(DanteError::SessionClosed)));
        assert_eq!(driver.opens(), 1);
    }

    #[test]
    fn quoted_name_is_rejected() {
        let (_driver, device) = open_fake();
        assert!(device.set_rx_channel_name(1, "a\"b").is_err());
        device.close();
    }

    #[test]
    fn rx_listing_decodes_levels_and_subscriptions() {
        let (_driver, device) = open_fake();
        let channels = device.rx_channels().unwrap();
        assert_eq!(channels.len(), 4);
        assert_eq!(channels[0].dbu, DBU_UNSET);
        assert_eq!(channels[1].sub, "02@FOH-CONSOLE");
        assert_eq!(channels[1].status, RxStatus::Resolved);
        device.close();
    }

    #[test]
    fn rx_rename_round_trips_through_a_listing() {
        let (_driver, device) = open_fake();
        device.set_rx_channel_name(3, "TEST-CHANNEL-NAME").unwrap();
        let channels = device.rx_channels().unwrap();
        assert_eq!(channels[2].name, "TEST-CHANNEL-NAME");
        device.close();
    }

    #[test]
    fn tx_rename_round_trips_through_a_listing() {
        let (_driver, device) = open_fake();
        device.set_tx_channel_name(2, "MONITOR-L").unwrap();
        let channels = device.tx_channels().unwrap();
        assert_eq!(channels[1].name, "MONITOR-L");
        device.close();
    }

    #[test]
    fn label_add_round_trips_through_a_listing() {
        let (_driver, device) = open_fake();
        device.add_tx_label(2, "TEST-LABEL").unwrap();
        let labels = device.tx_labels().unwrap();
        assert_eq!(labels[1].labels, vec!["TEST-LABEL".to_string()]);
        device.close();
    }

    #[test]
    fn dropping_the_device_closes_the_session() {
        let (driver, device) = open_fake();
        drop(device);
        assert_eq!(driver.closes(), 1);
    }
}
