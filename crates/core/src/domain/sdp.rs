//! SDP descriptor value objects
//!
//! Decoded views of the AES67 SAP/SDP descriptors the browsing session
//! discovers on the network.

use serde::{Deserialize, Serialize};

/// Direction of a discovered stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdpStreamDirection {
    Undefined,
    ReceiveOnly,
    SendReceive,
    SendOnly,
}

impl SdpStreamDirection {
    /// Decode the native `stream_dir` tag; unknown values map to `Undefined`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::ReceiveOnly,
            2 => Self::SendReceive,
            3 => Self::SendOnly,
            _ => Self::Undefined,
        }
    }
}

/// One multicast group referenced by an SDP descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdpGroupInfo {
    pub address: String,
    pub port: u16,
    pub id: String,
}

/// Session/stream metadata for one discovered SDP descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdpDescriptorInfo {
    pub username: String,
    pub session_name: String,
    pub session_id: u64,
    pub originator_address: String,
    pub is_dante: bool,
    pub media_clock_offset: u32,
    pub stream_payload_type: u8,
    pub groups: Vec<SdpGroupInfo>,
    /// Grandmaster clock identifier
    pub gmid: String,
    pub sub_domain: String,
    pub stream_sample_rate: u32,
    pub stream_encoding: u16,
    pub stream_num_chans: u16,
    pub stream_dir: SdpStreamDirection,
}
