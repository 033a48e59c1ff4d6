//! Domain entities and decode rules

pub mod channel;
pub mod config;
pub mod error;
pub mod sdp;

// Re-export specific items to avoid ambiguous glob imports
pub use channel::{
    decode_dbu, RxChannelInfo, RxStatus, TxChannelInfo, TxLabelInfo, DBU_INVALID, DBU_RAW_INVALID,
    DBU_RAW_UNSET, DBU_UNSET,
};
pub use config::{BrowsingConfig, ConfigError, LinkConfig, RoutingConfig};
pub use error::{DanteError, Result};
pub use sdp::{SdpDescriptorInfo, SdpGroupInfo, SdpStreamDirection};
