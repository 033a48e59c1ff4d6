//! End-to-end browsing scenarios

use dantelink_core::domain::sdp::SdpStreamDirection;
use dantelink_core::DanteError;

use crate::support::browsing_session;

#[test]
fn test_device_discovery_lists_names() {
    let (_driver, session) = browsing_session();
    let names = session.device_names().expect("discovery should succeed");
    assert_eq!(
        names,
        vec!["DESKTOP-VSC".to_string(), "AVIO-INPUT".to_string()]
    );
    session.close();
}

#[test]
fn test_sdp_descriptors_decode_nested_groups() -> anyhow::Result<()> {
    let (_driver, session) = browsing_session();

    let descriptors = session.sdp_descriptors()?;
    assert_eq!(descriptors.len(), 1);

    let descriptor = &descriptors[0];
    assert!(descriptor.is_dante);
    assert_eq!(descriptor.stream_sample_rate, 48_000);
    assert_eq!(descriptor.stream_num_chans, 2);
    assert_eq!(descriptor.stream_dir, SdpStreamDirection::SendOnly);

    assert_eq!(descriptor.groups.len(), 1);
    assert_eq!(descriptor.groups[0].address, "239.69.10.10");
    assert_eq!(descriptor.groups[0].port, 5004);

    session.close();
    Ok(())
}

#[test]
fn test_closed_browse_rejects_discovery() {
    let (driver, session) = browsing_session();
    session.close();
    assert!(matches!(
        session.device_names(),
        Err(DanteError::SessionClosed)
    ));
    assert_eq!(driver.closes(), 1);
}
