//! Shared fixtures for the integration tests

use std::sync::Arc;

use dantelink_core::{BrowsingConfig, RoutingConfig};
use dantelink_infra::native::fake::FakeDriver;
use dantelink_infra::{BrowsingSession, RoutingDevice};

pub const DEVICE: &str = "DESKTOP-VSC";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dantelink_infra=debug")
        .with_test_writer()
        .try_init();
}

pub fn routing_device() -> (Arc<FakeDriver>, RoutingDevice) {
    init_tracing();
    let driver = Arc::new(FakeDriver::routing());
    let device = RoutingDevice::with_driver(driver.clone(), &RoutingConfig::default(), DEVICE)
        .expect("device name should be accepted");
    device.open().expect("fake routing session should open");
    (driver, device)
}

pub fn browsing_session() -> (Arc<FakeDriver>, BrowsingSession) {
    init_tracing();
    let driver = Arc::new(FakeDriver::browsing());
    let session = BrowsingSession::with_driver(driver.clone(), &BrowsingConfig::default());
    session.open().expect("fake browsing session should open");
    (driver, session)
}
