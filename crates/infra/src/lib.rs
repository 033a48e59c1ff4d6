//! Native integration layer for dantelink
//!
//! This crate owns everything that touches the Dante test libraries: the raw
//! bindings, the reply marshaler, the session lifecycle (open → step/command →
//! close-exactly-once) and the background poller that keeps an open handle
//! responsive. Domain value types live in `dantelink-core`.
//!
//! # Threading contract
//!
//! The libraries are built to be stepped from one thread while commands
//! arrive from another, and that is exactly how a session runs here: the
//! poller owns `step` on its dedicated thread, and command submissions are
//! serialized internally against each other and against close. Independent
//! sessions share nothing and may be used concurrently without coordination.

pub mod browse;
pub mod device;
pub mod native;
pub mod oneshot;
pub mod poller;

mod session;

pub use browse::BrowsingSession;
pub use device::RoutingDevice;
pub use native::events::{events, NativeEvent};
pub use poller::StepEvent;
