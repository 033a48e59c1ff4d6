//! Core domain model for dantelink
//!
//! Platform-agnostic value types and decode rules for the Dante routing and
//! browsing wrappers. Everything that touches native memory lives in the
//! `infra` crate; this crate only deals in owned Rust data.

pub mod domain;

pub use domain::{
    config::{BrowsingConfig, ConfigError, LinkConfig, RoutingConfig},
    error::{DanteError, Result},
};
