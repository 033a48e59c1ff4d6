//! Raw bindings, marshaling and the driver seam
//!
//! Layout of this module:
//! - `ffi`: extern declarations against the two test DLLs (Windows only)
//! - `records`: `#[repr(C)]` mirrors of the native reply records
//! - `marshal`: count-prefixed reply buffer → owned Rust collections
//! - `driver`: the [`NativeDriver`] seam plus the real DLL-backed drivers
//! - `events`: re-dispatch of native-originated notifications
//! - `fake`: in-memory driver for tests and off-Windows development

pub mod driver;
pub mod events;
pub mod fake;
pub mod marshal;
pub mod records;

#[cfg(windows)]
pub mod ffi;

pub use driver::{NativeDriver, RawReply, RawSession};
