//! Fixed-layout record blocks the library hands back for structured queries.
//!
//! Field order and widths mirror the native structs exactly; every `*const
//! c_char` field is a library-owned string that is copied but never freed.
//! The `labels` and `groups` fields are the exceptions: they point at nested
//! count-prefixed arrays allocated for the caller, which the decoders here
//! consume through [`crate::native::marshal`].

use std::ffi::{c_char, c_void};

use dantelink_core::domain::channel::{
    decode_dbu, RxChannelInfo, RxStatus, TxChannelInfo, TxLabelInfo,
};
use dantelink_core::domain::sdp::{SdpDescriptorInfo, SdpGroupInfo, SdpStreamDirection};

use crate::native::driver::NativeDriver;
use crate::native::marshal::{cstring_at, nested_strings, nested_vec};

#[repr(C)]
pub struct RawRxChannel {
    pub id: u16,
    pub stale: i32,
    pub name: *const c_char,
    pub format: *const c_char,
    pub latency: *const c_char,
    pub muted: i32,
    pub dbu: i16,
    pub subscription: *const c_char,
    pub status: u8,
    pub flow: *const c_char,
}

#[repr(C)]
pub struct RawTxChannel {
    pub id: u16,
    pub stale: i32,
    pub name: *const c_char,
    pub format: *const c_char,
    pub enabled: i32,
    pub muted: i32,
    pub dbu: i16,
}

#[repr(C)]
pub struct RawTxLabel {
    pub id: u16,
    pub is_empty: i32,
    pub name: *const c_char,
    pub label_count: i32,
    pub labels: *mut *mut c_void,
}

#[repr(C)]
pub struct RawSdpGroup {
    pub address: *const c_char,
    pub port: u16,
    pub id: *const c_char,
}

#[repr(C)]
pub struct RawSdpDescriptor {
    pub username: *const c_char,
    pub session_name: *const c_char,
    pub session_id: u64,
    pub originator_address: *const c_char,
    pub is_dante: i32,
    pub media_clock_offset: u32,
    pub stream_payload_type: u8,
    pub groups_count: i32,
    pub groups: *mut *mut c_void,
    pub gmid: *const c_char,
    pub sub_domain: *const c_char,
    pub stream_sample_rate: u32,
    pub stream_encoding: u16,
    pub stream_num_chans: u16,
    pub stream_dir: i32,
}

/// # Safety
/// `raw` must point at a live library-produced receive channel block.
pub unsafe fn decode_rx_channel(_driver: &dyn NativeDriver, raw: &RawRxChannel) -> RxChannelInfo {
    RxChannelInfo {
        id: raw.id,
        is_stale: raw.stale != 0,
        name: cstring_at(raw.name),
        format: cstring_at(raw.format),
        latency: cstring_at(raw.latency),
        is_muted: raw.muted != 0,
        dbu: decode_dbu(raw.dbu),
        sub: cstring_at(raw.subscription),
        status: RxStatus::from_raw(raw.status),
        flow: cstring_at(raw.flow),
    }
}

/// # Safety
/// `raw` must point at a live library-produced transmit channel block.
pub unsafe fn decode_tx_channel(_driver: &dyn NativeDriver, raw: &RawTxChannel) -> TxChannelInfo {
    TxChannelInfo {
        id: raw.id,
        is_stale: raw.stale != 0,
        name: cstring_at(raw.name),
        format: cstring_at(raw.format),
        is_enabled: raw.enabled != 0,
        is_muted: raw.muted != 0,
        dbu: decode_dbu(raw.dbu),
    }
}

/// Decodes a label block, consuming its nested alias array.
///
/// # Safety
/// `raw` must point at a live library-produced label block from `driver`.
pub unsafe fn decode_tx_label(driver: &dyn NativeDriver, raw: &RawTxLabel) -> TxLabelInfo {
    TxLabelInfo {
        id: raw.id,
        is_empty: raw.is_empty != 0,
        name: cstring_at(raw.name),
        labels: nested_strings(driver, raw.labels, raw.label_count),
    }
}

/// # Safety
/// `raw` must point at a live library-produced SDP group block.
pub unsafe fn decode_sdp_group(_driver: &dyn NativeDriver, raw: &RawSdpGroup) -> SdpGroupInfo {
    SdpGroupInfo {
        address: cstring_at(raw.address),
        port: raw.port,
        id: cstring_at(raw.id),
    }
}

/// Decodes a session descriptor, consuming its nested group array.
///
/// # Safety
/// `raw` must point at a live library-produced descriptor block from `driver`.
pub unsafe fn decode_sdp_descriptor(
    driver: &dyn NativeDriver,
    raw: &RawSdpDescriptor,
) -> SdpDescriptorInfo {
    SdpDescriptorInfo {
        username: cstring_at(raw.username),
        session_name: cstring_at(raw.session_name),
        session_id: raw.session_id,
        originator_address: cstring_at(raw.originator_address),
        is_dante: raw.is_dante != 0,
        media_clock_offset: raw.media_clock_offset,
        stream_payload_type: raw.stream_payload_type,
        groups: nested_vec::<RawSdpGroup, SdpGroupInfo>(
            driver,
            raw.groups,
            raw.groups_count,
            // SAFETY: the nested array holds group blocks from the same reply.
            |driver, group| unsafe { decode_sdp_group(driver, group) },
        ),
        gmid: cstring_at(raw.gmid),
        sub_domain: cstring_at(raw.sub_domain),
        stream_sample_rate: raw.stream_sample_rate,
        stream_encoding: raw.stream_encoding,
        stream_num_chans: raw.stream_num_chans,
        stream_dir: SdpStreamDirection::from_raw(raw.stream_dir),
    }
}
