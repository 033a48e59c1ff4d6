//! Session lifecycle guarantees across the public surface
//!
//! Closed is terminal: close any number of times, the native library sees
//! exactly one close, polling stops before it, and further commands fail
//! without reaching the foreign side.

use std::time::Duration;

use dantelink_core::DanteError;

use crate::support::routing_device;

// ============================================================================
// CLOSE SEMANTICS
// ============================================================================

#[test]
fn test_close_is_idempotent() {
    let (driver, device) = routing_device();
    device.close();
    device.close();
    device.close();
    assert!(device.is_closed());
    assert_eq!(driver.closes(), 1);
}

#[test]
fn test_drop_after_close_does_not_close_again() {
    let (driver, device) = routing_device();
    device.close();
    drop(device);
    assert_eq!(driver.closes(), 1);
}

#[test]
fn test_drop_alone_closes_the_session() {
    let (driver, device) = routing_device();
    drop(device);
    assert_eq!(driver.closes(), 1);
    assert_eq!(driver.live_sessions(), 0);
}

#[test]
fn test_polling_has_stopped_once_close_returns() {
    let (driver, device) = routing_device();
    device.close();
    let settled = driver.steps();
    std::thread::sleep(Duration::from_millis(25));
    assert_eq!(driver.steps(), settled);
}

#[test]
fn test_commands_after_close_fail_without_a_foreign_call() {
    let (driver, device) = routing_device();
    device.close();
    let live_after_close = driver.live_sessions();
    assert!(matches!(
        device.rx_channels(),
        Err(DanteError::SessionClosed)
    ));
    assert!(matches!(
        device.set_rx_channel_name(1, "NEW"),
        Err(DanteError::SessionClosed)
    ));
    assert_eq!(driver.live_sessions(), live_after_close);
}

// ============================================================================
// SESSION INDEPENDENCE
// ============================================================================

#[test]
fn test_closing_one_device_leaves_another_live() -> anyhow::Result<()> {
    let (driver, first) = routing_device();
    let second = dantelink_infra::RoutingDevice::with_driver(
        driver.clone(),
        &dantelink_core::RoutingConfig::default(),
        "AVIO-INPUT",
    )?;
    second.open()?;

    first.close();
    assert_eq!(driver.live_sessions(), 1);

    // the survivor still answers
    let channels = second.rx_channels()?;
    assert_eq!(channels.len(), 4);

    second.close();
    assert_eq!(driver.closes(), 2);
    assert_eq!(driver.live_sessions(), 0);
    Ok(())
}
