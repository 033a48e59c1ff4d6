//! End-to-end routing scenarios
//!
//! These drive the public [`dantelink_infra::RoutingDevice`] surface through
//! the in-process fake library, so the full path runs: command grammar, raw
//! reply buffers, record marshaling and the dbu/status decode rules.

use std::time::Duration;

use dantelink_core::domain::channel::{RxStatus, DBU_UNSET};
use dantelink_core::RoutingConfig;
use dantelink_infra::oneshot;
use dantelink_infra::StepEvent;

use crate::support::{routing_device, DEVICE};

// ============================================================================
// CHANNEL LISTING
// ============================================================================

#[test]
fn test_rx_listing_decodes_levels_and_status() {
    let (_driver, device) = routing_device();
    assert_eq!(device.name(), DEVICE);

    let channels = device.rx_channels().expect("listing should succeed");
    assert_eq!(channels.len(), 4);

    // channel 1 has never carried signal: the raw sentinel decodes to -1
    assert_eq!(channels[0].dbu, DBU_UNSET);
    assert_eq!(channels[0].status, RxStatus::None);
    assert!(channels[0].sub.is_empty());

    // channel 2 is subscribed and resolved
    assert_eq!(channels[1].sub, "02@FOH-CONSOLE");
    assert_eq!(channels[1].status, RxStatus::Resolved);
    assert!(!channels[1].status.is_error());

    device.close();
}

#[test]
fn test_tx_listing_reports_enabled_channels() {
    let (_driver, device) = routing_device();
    let channels = device.tx_channels().expect("listing should succeed");
    assert_eq!(channels.len(), 4);
    assert!(channels.iter().all(|channel| channel.is_enabled));
    device.close();
}

// ============================================================================
// MUTATION WORKFLOWS
// ============================================================================

#[test]
fn test_rx_rename_then_relist_shows_the_new_name() -> anyhow::Result<()> {
    let (_driver, device) = routing_device();

    device.set_rx_channel_name(3, "TEST-CHANNEL-NAME")?;
    let channels = device.rx_channels()?;
    assert_eq!(channels[2].name, "TEST-CHANNEL-NAME");

    // the other channels keep their seeded names
    assert_eq!(channels[0].name, "01");
    assert_eq!(channels[3].name, "04");

    device.close();
    Ok(())
}

#[test]
fn test_tx_rename_then_relist_shows_the_new_name() -> anyhow::Result<()> {
    let (_driver, device) = routing_device();

    device.set_tx_channel_name(1, "MAIN-L")?;
    let channels = device.tx_channels()?;
    assert_eq!(channels[0].name, "MAIN-L");
    assert_eq!(channels[1].name, "02");

    device.close();
    Ok(())
}

#[test]
fn test_add_label_then_relist_shows_the_alias() -> anyhow::Result<()> {
    let (_driver, device) = routing_device();

    let before = device.tx_labels()?;
    assert!(before[2].labels.is_empty());
    assert!(before[2].is_empty);

    device.add_tx_label(3, "TEST-LABEL")?;
    let after = device.tx_labels()?;
    assert_eq!(after[2].labels, vec!["TEST-LABEL".to_string()]);
    assert!(!after[2].is_empty);

    device.close();
    Ok(())
}

// ============================================================================
// POLLING ALONGSIDE COMMANDS
// ============================================================================

#[test]
fn test_commands_run_while_the_poll_loop_is_live() {
    let (driver, device) = routing_device();

    // wait for the loop to be demonstrably running
    let steps = device.step_events().expect("open session has step events");
    assert_eq!(
        steps.recv_timeout(Duration::from_secs(2)).unwrap(),
        StepEvent::Stepped
    );

    for _ in 0..5 {
        device.rx_channels().expect("listing during polling");
    }
    assert!(driver.steps() >= 1);

    device.close();
}

// ============================================================================
// ONE-SHOT PATH
// ============================================================================

#[test]
fn test_one_shot_listing_leaves_no_session_behind() {
    let (driver, device) = routing_device();
    device.close();

    let channels =
        oneshot::rx_channels_with(driver.clone(), &RoutingConfig::default(), DEVICE)
            .expect("one-shot listing should succeed");
    assert_eq!(channels.len(), 4);
    assert_eq!(channels[0].dbu, DBU_UNSET);

    assert_eq!(driver.live_sessions(), 0);
    assert_eq!(driver.opens(), driver.closes());
}

#[test]
fn test_one_shot_rename_leaves_no_session_behind() {
    let (driver, device) = routing_device();
    device.close();

    oneshot::set_rx_channel_name_with(
        driver.clone(),
        &RoutingConfig::default(),
        DEVICE,
        3,
        "TEST-CHANNEL-NAME",
    )
    .expect("one-shot rename should succeed");

    assert_eq!(driver.live_sessions(), 0);
    assert_eq!(driver.opens(), driver.closes());
}
