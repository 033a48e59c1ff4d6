//! Single-command sessions (`RunDll` path).
//!
//! The libraries also export a combined open/command/close entry point, and
//! the historical static API was built on it: one native call per query or
//! mutation, no session and no poll loop to hold alive. The typed functions
//! here mirror that surface; each `*_with` variant is driver-generic and the
//! plain names bind the real libraries on Windows.

use std::sync::Arc;

use dantelink_core::domain::channel::{RxChannelInfo, TxChannelInfo, TxLabelInfo};
use dantelink_core::domain::sdp::SdpDescriptorInfo;
use dantelink_core::{BrowsingConfig, Result, RoutingConfig};

use crate::device::valid_name;
use crate::native::records::{
    decode_rx_channel, decode_sdp_descriptor, decode_tx_channel, decode_tx_label,
};
use crate::native::{marshal, NativeDriver, RawReply};

fn routing_call(
    driver: &Arc<dyn NativeDriver>,
    config: &RoutingConfig,
    device: &str,
    line: &str,
) -> Result<RawReply> {
    let device = valid_name(device)?;
    let argv = [config.wrapper_name.as_str(), device.as_str()];
    driver.run_once(&argv, line)
}

fn browsing_call(
    driver: &Arc<dyn NativeDriver>,
    config: &BrowsingConfig,
    line: &str,
) -> Result<RawReply> {
    let mut argv = vec![config.wrapper_name.as_str()];
    if config.conmon {
        argv.push("-conmon");
    }
    driver.run_once(&argv, line)
}

/// List receive channels of `device` in one call.
pub fn rx_channels_with(
    driver: Arc<dyn NativeDriver>,
    config: &RoutingConfig,
    device: &str,
) -> Result<Vec<RxChannelInfo>> {
    let raw = routing_call(&driver, config, device, "r")?;
    // SAFETY: reply fresh from this driver; `r` answers with rx blocks.
    Ok(unsafe {
        marshal::record_vec(driver.as_ref(), raw, |driver, block| {
            decode_rx_channel(driver, block)
        })
    })
}

/// List transmit channels of `device` in one call.
pub fn tx_channels_with(
    driver: Arc<dyn NativeDriver>,
    config: &RoutingConfig,
    device: &str,
) -> Result<Vec<TxChannelInfo>> {
    let raw = routing_call(&driver, config, device, "t")?;
    // SAFETY: reply fresh from this driver; `t` answers with tx blocks.
    Ok(unsafe {
        marshal::record_vec(driver.as_ref(), raw, |driver, block| {
            decode_tx_channel(driver, block)
        })
    })
}

/// List transmit labels of `device` in one call.
pub fn tx_labels_with(
    driver: Arc<dyn NativeDriver>,
    config: &RoutingConfig,
    device: &str,
) -> Result<Vec<TxLabelInfo>> {
    let raw = routing_call(&driver, config, device, "l")?;
    // SAFETY: reply fresh from this driver; `l` answers with label blocks.
    Ok(unsafe {
        marshal::record_vec(driver.as_ref(), raw, |driver, block| {
            decode_tx_label(driver, block)
        })
    })
}

/// Rename receive channel `id` of `device` in one call.
pub fn set_rx_channel_name_with(
    driver: Arc<dyn NativeDriver>,
    config: &RoutingConfig,
    device: &str,
    id: u16,
    name: &str,
) -> Result<()> {
    let name = valid_name(name)?;
    let raw = routing_call(&driver, config, device, &format!("r {id} \"{name}\""))?;
    // SAFETY: reply fresh from this driver, consumed exactly once.
    unsafe { marshal::drain(driver.as_ref(), raw) };
    Ok(())
}

/// Rename transmit channel `id` of `device` in one call.
pub fn set_tx_channel_name_with(
    driver: Arc<dyn NativeDriver>,
    config: &RoutingConfig,
    device: &str,
    id: u16,
    name: &str,
) -> Result<()> {
    let name = valid_name(name)?;
    let raw = routing_call(&driver, config, device, &format!("s {id} \"{name}\""))?;
    // SAFETY: reply fresh from this driver, consumed exactly once.
    unsafe { marshal::drain(driver.as_ref(), raw) };
    Ok(())
}

/// Attach a label to transmit channel `id` of `device` in one call.
pub fn add_tx_label_with(
    driver: Arc<dyn NativeDriver>,
    config: &RoutingConfig,
    device: &str,
    id: u16,
    label: &str,
) -> Result<()> {
    let label = valid_name(label)?;
    let raw = routing_call(&driver, config, device, &format!("l {id} \"{label}\" +"))?;
    // SAFETY: reply fresh from this driver, consumed exactly once.
    unsafe { marshal::drain(driver.as_ref(), raw) };
    Ok(())
}

/// List the device names on the network in one call.
pub fn device_names_with(
    driver: Arc<dyn NativeDriver>,
    config: &BrowsingConfig,
) -> Result<Vec<String>> {
    let raw = browsing_call(&driver, config, "r d")?;
    // SAFETY: reply fresh from this driver, elements are C strings.
    Ok(unsafe { marshal::string_vec(driver.as_ref(), raw) })
}

/// List the advertised SDP descriptors in one call.
pub fn sdp_descriptors_with(
    driver: Arc<dyn NativeDriver>,
    config: &BrowsingConfig,
) -> Result<Vec<SdpDescriptorInfo>> {
    let raw = browsing_call(&driver, config, "p")?;
    // SAFETY: reply fresh from this driver; `p` answers with descriptors.
    Ok(unsafe {
        marshal::record_vec(driver.as_ref(), raw, |driver, block| {
            decode_sdp_descriptor(driver, block)
        })
    })
}

#[cfg(windows)]
mod real {
    use super::*;
    use crate::native::driver::{BrowsingDriver, RoutingDriver};

    fn routing_driver() -> Arc<dyn NativeDriver> {
        Arc::new(RoutingDriver)
    }

    fn browsing_driver() -> Arc<dyn NativeDriver> {
        Arc::new(BrowsingDriver)
    }

    pub fn rx_channels(config: &RoutingConfig, device: &str) -> Result<Vec<RxChannelInfo>> {
        rx_channels_with(routing_driver(), config, device)
    }

    pub fn tx_channels(config: &RoutingConfig, device: &str) -> Result<Vec<TxChannelInfo>> {
        tx_channels_with(routing_driver(), config, device)
    }

    pub fn tx_labels(config: &RoutingConfig, device: &str) -> Result<Vec<TxLabelInfo>> {
        tx_labels_with(routing_driver(), config, device)
    }

    pub fn set_rx_channel_name(
        config: &RoutingConfig,
        device: &str,
        id: u16,
        name: &str,
    ) -> Result<()> {
        set_rx_channel_name_with(routing_driver(), config, device, id, name)
    }

    pub fn set_tx_channel_name(
        config: &RoutingConfig,
        device: &str,
        id: u16,
        name: &str,
    ) -> Result<()> {
        set_tx_channel_name_with(routing_driver(), config, device, id, name)
    }

    pub fn add_tx_label(config: &RoutingConfig, device: &str, id: u16, label: &str) -> Result<()> {
        add_tx_label_with(routing_driver(), config, device, id, label)
    }

    pub fn device_names(config: &BrowsingConfig) -> Result<Vec<String>> {
        device_names_with(browsing_driver(), config)
    }

    pub fn sdp_descriptors(config: &BrowsingConfig) -> Result<Vec<SdpDescriptorInfo>> {
        sdp_descriptors_with(browsing_driver(), config)
    }
}

#[cfg(windows)]
pub use real::*;
