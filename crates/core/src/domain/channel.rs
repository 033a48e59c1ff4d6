//! Routing channel value objects
//!
//! Decoded views of the native Rx/Tx channel and Tx label records. The raw
//! fixed-layout records live in the `infra` crate; this module holds the pure
//! decode rules (dbu sentinels, flag conversion, status tags) and the owned
//! value types they produce. All values are immutable once built.

use serde::{Deserialize, Serialize};

/// Raw dbu value meaning "no signal reference level has been set"
pub const DBU_RAW_UNSET: i16 = 0x7FFF;
/// Raw dbu value meaning "signal reference level is invalid/uninitialised"
pub const DBU_RAW_INVALID: i16 = 0x7FFE;

/// Decoded signal level for [`DBU_RAW_UNSET`]
pub const DBU_UNSET: i32 = -1;
/// Decoded signal level for [`DBU_RAW_INVALID`]
pub const DBU_INVALID: i32 = -2;

/// Decode a raw 16-bit dbu measurement.
///
/// The native library reserves two magic values: `0x7FFF` ("unset") and
/// `0x7FFE` ("invalid/uninitialised"), mapped to `-1` and `-2` respectively.
/// Every other value passes through unchanged.
pub fn decode_dbu(raw: i16) -> i32 {
    match raw {
        DBU_RAW_UNSET => DBU_UNSET,
        DBU_RAW_INVALID => DBU_INVALID,
        other => i32::from(other),
    }
}

/// Receive channel subscription status
///
/// A closed tag set reported by the native library; the wrapper never derives
/// or transitions these states itself. Discriminants are non-contiguous and
/// preserved verbatim from the routing API headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RxStatus {
    /// Channel is not subscribed or otherwise doing anything interesting
    None,
    /// Name not yet found
    Unresolved,
    /// Name has been found but not yet processed (transient)
    Resolved,
    /// An error occurred while trying to resolve the name
    ResolveFail,
    /// Successfully subscribed to own Tx channels (local loopback)
    SubscribeSelf,
    /// Name explicitly does not exist
    ResolvedNone,
    /// A flow is configured but lacks the information to establish audio
    Idle,
    /// Name found and processed; setting up the flow (transient)
    InProgress,
    /// Active subscription to an automatically configured source flow
    Dynamic,
    /// Active subscription to a manually configured source flow
    Static,
    /// Manual flow configuration bypassing the subscription process
    Manual,
    /// The name was found but the connection process failed
    NoConnection,
    /// Channel formats do not match
    ChannelFormat,
    /// Flow formats do not match
    BundleFormat,
    /// Receiver is out of resources
    NoRx,
    /// Receiver could not set up the flow
    RxFail,
    /// Transmitter is out of resources
    NoTx,
    /// Transmitter could not set up the flow
    TxFail,
    /// Receiver got a QoS failure while setting up the flow
    QosFailRx,
    /// Transmitter got a QoS failure while setting up the flow
    QosFailTx,
    /// Tx rejected the address given by Rx (usually an ARP failure)
    TxRejectedAddr,
    /// Transmitter rejected the bundle request as invalid
    InvalidMsg,
    /// Tx channel latency higher than the maximum supported Rx latency
    ChannelLatency,
    /// Tx and Rx are in different clock subdomains
    ClockDomain,
    /// Attempt to use an unsupported feature
    Unsupported,
    /// All Rx links are down
    RxLinkDown,
    /// All Tx links are down
    TxLinkDown,
    /// No suitable protocol for a dynamic connection
    DynamicProtocol,
    /// Channel does not exist
    InvalidChannel,
    /// Tx scheduler failure
    TxSchedulerFailure,
    /// Subscription to self disallowed by the device
    SubscribeSelfPolicy,
    /// Template and subscription device names do not match
    TemplateMismatchDevice,
    /// Template flow and channel formats do not match
    TemplateMismatchFormat,
    /// The channel is not part of the given multicast flow
    TemplateMissingChannel,
    /// Template configuration prevented the subscription
    TemplateMismatchConfig,
    /// The unicast template is full
    TemplateFull,
    /// Rx device has no supported subscription mode available
    RxUnsupportedSubMode,
    /// Tx device has no supported subscription mode available
    TxUnsupportedSubMode,
    /// Tx access control denied the request
    TxAccessControlDenied,
    /// Tx access control request is in progress
    TxAccessControlPending,
    /// Unexpected system failure
    SystemFail,
    /// Tag not listed in the routing API headers
    Other(u8),
}

impl RxStatus {
    /// Decode a raw status byte.
    ///
    /// The tag set has explicit gaps (e.g. 6, 0x0B..0x0D) that the native
    /// headers skip; anything unlisted decodes to [`RxStatus::Other`].
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::None,
            0x01 => Self::Unresolved,
            0x02 => Self::Resolved,
            0x03 => Self::ResolveFail,
            0x04 => Self::SubscribeSelf,
            0x05 => Self::ResolvedNone,
            0x07 => Self::Idle,
            0x08 => Self::InProgress,
            0x09 => Self::Dynamic,
            0x0A => Self::Static,
            0x0E => Self::Manual,
            0x0F => Self::NoConnection,
            0x10 => Self::ChannelFormat,
            0x11 => Self::BundleFormat,
            0x12 => Self::NoRx,
            0x13 => Self::RxFail,
            0x14 => Self::NoTx,
            0x15 => Self::TxFail,
            0x16 => Self::QosFailRx,
            0x17 => Self::QosFailTx,
            0x18 => Self::TxRejectedAddr,
            0x19 => Self::InvalidMsg,
            0x1A => Self::ChannelLatency,
            0x1B => Self::ClockDomain,
            0x1C => Self::Unsupported,
            0x1D => Self::RxLinkDown,
            0x1E => Self::TxLinkDown,
            0x1F => Self::DynamicProtocol,
            0x20 => Self::InvalidChannel,
            0x21 => Self::TxSchedulerFailure,
            0x22 => Self::SubscribeSelfPolicy,
            0x40 => Self::TemplateMismatchDevice,
            0x41 => Self::TemplateMismatchFormat,
            0x42 => Self::TemplateMissingChannel,
            0x43 => Self::TemplateMismatchConfig,
            0x44 => Self::TemplateFull,
            0x45 => Self::RxUnsupportedSubMode,
            0x46 => Self::TxUnsupportedSubMode,
            0x60 => Self::TxAccessControlDenied,
            0x61 => Self::TxAccessControlPending,
            0xFF => Self::SystemFail,
            other => Self::Other(other),
        }
    }

    /// The raw tag this status decodes from
    pub fn as_raw(&self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::Unresolved => 0x01,
            Self::Resolved => 0x02,
            Self::ResolveFail => 0x03,
            Self::SubscribeSelf => 0x04,
            Self::ResolvedNone => 0x05,
            Self::Idle => 0x07,
            Self::InProgress => 0x08,
            Self::Dynamic => 0x09,
            Self::Static => 0x0A,
            Self::Manual => 0x0E,
            Self::NoConnection => 0x0F,
            Self::ChannelFormat => 0x10,
            Self::BundleFormat => 0x11,
            Self::NoRx => 0x12,
            Self::RxFail => 0x13,
            Self::NoTx => 0x14,
            Self::TxFail => 0x15,
            Self::QosFailRx => 0x16,
            Self::QosFailTx => 0x17,
            Self::TxRejectedAddr => 0x18,
            Self::InvalidMsg => 0x19,
            Self::ChannelLatency => 0x1A,
            Self::ClockDomain => 0x1B,
            Self::Unsupported => 0x1C,
            Self::RxLinkDown => 0x1D,
            Self::TxLinkDown => 0x1E,
            Self::DynamicProtocol => 0x1F,
            Self::InvalidChannel => 0x20,
            Self::TxSchedulerFailure => 0x21,
            Self::SubscribeSelfPolicy => 0x22,
            Self::TemplateMismatchDevice => 0x40,
            Self::TemplateMismatchFormat => 0x41,
            Self::TemplateMissingChannel => 0x42,
            Self::TemplateMismatchConfig => 0x43,
            Self::TemplateFull => 0x44,
            Self::RxUnsupportedSubMode => 0x45,
            Self::TxUnsupportedSubMode => 0x46,
            Self::TxAccessControlDenied => 0x60,
            Self::TxAccessControlPending => 0x61,
            Self::SystemFail => 0xFF,
            Self::Other(raw) => *raw,
        }
    }

    /// Whether this status reports an error condition rather than a
    /// discovery/subscription state
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ResolveFail
                | Self::NoConnection
                | Self::ChannelFormat
                | Self::BundleFormat
                | Self::NoRx
                | Self::RxFail
                | Self::NoTx
                | Self::TxFail
                | Self::QosFailRx
                | Self::QosFailTx
                | Self::TxRejectedAddr
                | Self::InvalidMsg
                | Self::ChannelLatency
                | Self::ClockDomain
                | Self::Unsupported
                | Self::RxLinkDown
                | Self::TxLinkDown
                | Self::DynamicProtocol
                | Self::InvalidChannel
                | Self::TxSchedulerFailure
                | Self::SubscribeSelfPolicy
                | Self::TemplateMismatchDevice
                | Self::TemplateMismatchFormat
                | Self::TemplateMissingChannel
                | Self::TemplateMismatchConfig
                | Self::TemplateFull
                | Self::RxUnsupportedSubMode
                | Self::TxUnsupportedSubMode
                | Self::TxAccessControlDenied
                | Self::SystemFail
        )
    }
}

/// Information about a receive channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxChannelInfo {
    pub id: u16,
    pub is_stale: bool,
    pub name: String,
    pub format: String,
    pub latency: String,
    pub is_muted: bool,
    /// Decoded signal reference level; `-1` unset, `-2` invalid
    pub dbu: i32,
    /// Subscription target (`channel@device`), empty when unsubscribed
    pub sub: String,
    pub status: RxStatus,
    /// Identifier of the flow carrying this subscription
    pub flow: String,
}

/// Information about a transmit channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxChannelInfo {
    pub id: u16,
    pub is_stale: bool,
    pub name: String,
    pub format: String,
    pub is_enabled: bool,
    pub is_muted: bool,
    /// Decoded signal reference level; `-1` unset, `-2` invalid
    pub dbu: i32,
}

/// Labels attached to a transmit channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLabelInfo {
    pub id: u16,
    pub is_empty: bool,
    pub name: String,
    pub labels: Vec<String>,
}
