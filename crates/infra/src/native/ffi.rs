//! Extern declarations for the Dante test libraries
//!
//! Both DLLs export the same entry-point names (`open`, `step`,
//! `process_line`, `close`, `RunDll`), so the blocks use `raw-dylib` linkage
//! to bind each block to its own DLL. Reply buffers and session handle blocks
//! are CoTaskMem allocations and must be released with `CoTaskMemFree`.
//!
//! Cdecl calling convention throughout, matching the DLL exports.

use std::ffi::{c_char, c_int, c_void};

/// Callback for domain-level events: a single text payload.
pub type EventCallback = unsafe extern "C" fn(text: *const c_char);

/// Callback for per-device events: device name plus text payload.
pub type DeviceEventCallback = unsafe extern "C" fn(name: *const c_char, text: *const c_char);

pub mod routing {
    use super::*;

    #[link(name = "dante_routing_test", kind = "raw-dylib")]
    extern "C" {
        pub fn RunDll(
            argc: c_int,
            argv: *mut *mut c_char,
            input: *const c_char,
            array: *mut *mut *mut c_void,
            count: *mut c_int,
        ) -> c_int;

        pub fn open(argc: c_int, argv: *mut *mut c_char, ptr: *mut *mut c_void) -> c_int;

        pub fn step(ptr: *mut *mut c_void) -> c_int;

        pub fn process_line(
            ptr: *mut *mut c_void,
            input: *const c_char,
            array: *mut *mut *mut c_void,
            count: *mut c_int,
        ) -> c_int;

        pub fn close(ptr: *mut *mut c_void);

        pub fn set_event_callback(callback: EventCallback);

        pub fn set_domain_event_callback(callback: EventCallback);

        pub fn set_device_event_callback(callback: DeviceEventCallback);
    }
}

pub mod browsing {
    use super::*;

    #[link(name = "dante_browsing_test", kind = "raw-dylib")]
    extern "C" {
        pub fn RunDll(
            argc: c_int,
            argv: *mut *mut c_char,
            input: *const c_char,
            array: *mut *mut *mut c_void,
            count: *mut c_int,
        ) -> c_int;

        pub fn open(argc: c_int, argv: *mut *mut c_char, ptr: *mut *mut c_void) -> c_int;

        pub fn step(ptr: *mut *mut c_void) -> c_int;

        pub fn process_line(
            ptr: *mut *mut c_void,
            input: *const c_char,
            array: *mut *mut *mut c_void,
            count: *mut c_int,
        ) -> c_int;

        pub fn close(ptr: *mut *mut c_void);
    }
}

#[link(name = "ole32")]
extern "system" {
    pub fn CoTaskMemFree(pv: *mut c_void);
}
