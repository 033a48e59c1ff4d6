//! The seam between the wrapper and the foreign library
//!
//! Sessions and one-shot calls go through [`NativeDriver`] so the lifecycle
//! and marshaling layers never name a DLL directly. The real drivers
//! ([`RoutingDriver`], [`BrowsingDriver`]) are Windows-only; tests and
//! off-Windows development use [`crate::native::fake::FakeDriver`].

use std::ffi::{c_int, c_void};

use dantelink_core::Result;

/// An opaque native session handle. Null means "not open".
pub type RawSession = *mut c_void;

/// A transient count-prefixed reply buffer.
///
/// `array` points at `count` further pointers (native strings or fixed-layout
/// records). The buffer exists only until the marshaler has walked it; every
/// sub-pointer and the buffer itself are released by exactly one marshaling
/// pass and never retained.
#[derive(Debug)]
pub struct RawReply {
    pub array: *mut *mut c_void,
    pub count: c_int,
}

impl RawReply {
    /// Reply of a command that produced no output
    pub fn empty() -> Self {
        Self {
            array: std::ptr::null_mut(),
            count: 0,
        }
    }
}

/// Foreign entry points of one Dante test library.
///
/// Invariant held by callers: `session` arguments must be live handles
/// obtained from `open` on the same driver, with no other foreign call in
/// flight on the same handle.
pub trait NativeDriver: Send + Sync {
    /// Start a session. `argv` carries the wrapper identity plus the target
    /// name or mode flag.
    fn open(&self, argv: &[&str]) -> Result<RawSession>;

    /// Advance one poll iteration. The native call paces itself.
    ///
    /// # Safety
    /// `session` must be live and not concurrently in another foreign call.
    unsafe fn step(&self, session: RawSession) -> Result<()>;

    /// Submit one textual command line and hand back the raw reply.
    ///
    /// # Safety
    /// `session` must be live and not concurrently in another foreign call.
    unsafe fn process_line(&self, session: RawSession, line: &str) -> Result<RawReply>;

    /// Release the session. Called exactly once per handle; the handle block
    /// itself is freed here as well.
    ///
    /// # Safety
    /// `session` must be live; it is invalid once this returns.
    unsafe fn close(&self, session: RawSession);

    /// Combined open + command + implicit close (legacy `RunDll` path).
    fn run_once(&self, argv: &[&str], line: &str) -> Result<RawReply>;

    /// Release one block of a reply buffer.
    ///
    /// # Safety
    /// `block` must originate from a reply produced by this driver and must
    /// not be released twice.
    unsafe fn release(&self, block: *mut c_void);
}

#[cfg(windows)]
pub use windows::{BrowsingDriver, RoutingDriver};

#[cfg(windows)]
mod windows {
    use super::*;
    use crate::native::ffi;
    use dantelink_core::DanteError;
    use std::ffi::{c_char, CString};
    use std::ptr;

    fn check(code: c_int) -> Result<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(DanteError::OperationFailed(code))
        }
    }

    fn to_cstrings(args: &[&str]) -> Result<Vec<CString>> {
        args.iter()
            .map(|arg| {
                CString::new(*arg).map_err(|_| DanteError::InvalidName((*arg).to_string()))
            })
            .collect()
    }

    fn line_cstring(line: &str) -> Result<CString> {
        CString::new(line).map_err(|_| DanteError::InvalidName(line.to_string()))
    }

    macro_rules! dll_driver {
        ($name:ident, $module:ident, $label:literal) => {
            #[doc = concat!("Driver backed by `", $label, ".dll`")]
            #[derive(Debug, Default, Clone, Copy)]
            pub struct $name;

            impl NativeDriver for $name {
                fn open(&self, argv: &[&str]) -> Result<RawSession> {
                    let owned = to_cstrings(argv)?;
                    let mut ptrs: Vec<*mut c_char> =
                        owned.iter().map(|arg| arg.as_ptr() as *mut c_char).collect();
                    let mut session: RawSession = ptr::null_mut();
                    // SAFETY: argv pointers stay alive for the duration of the call.
                    check(unsafe {
                        ffi::$module::open(ptrs.len() as c_int, ptrs.as_mut_ptr(), &mut session)
                    })?;
                    Ok(session)
                }

                unsafe fn step(&self, session: RawSession) -> Result<()> {
                    let mut session = session;
                    check(ffi::$module::step(&mut session))
                }

                unsafe fn process_line(&self, session: RawSession, line: &str) -> Result<RawReply> {
                    let input = line_cstring(line)?;
                    let mut session = session;
                    let mut array: *mut *mut c_void = ptr::null_mut();
                    let mut count: c_int = 0;
                    check(ffi::$module::process_line(
                        &mut session,
                        input.as_ptr(),
                        &mut array,
                        &mut count,
                    ))?;
                    Ok(RawReply { array, count })
                }

                unsafe fn close(&self, session: RawSession) {
                    let mut session = session;
                    ffi::$module::close(&mut session);
                    // The handle block is a CoTaskMem allocation owned by the
                    // wrapper; freeing a pointer the native close nulled is a
                    // no-op.
                    ffi::CoTaskMemFree(session);
                }

                fn run_once(&self, argv: &[&str], line: &str) -> Result<RawReply> {
                    let owned = to_cstrings(argv)?;
                    let input = line_cstring(line)?;
                    let mut ptrs: Vec<*mut c_char> =
                        owned.iter().map(|arg| arg.as_ptr() as *mut c_char).collect();
                    let mut array: *mut *mut c_void = ptr::null_mut();
                    let mut count: c_int = 0;
                    // SAFETY: argv and input stay alive for the duration of the call.
                    check(unsafe {
                        ffi::$module::RunDll(
                            ptrs.len() as c_int,
                            ptrs.as_mut_ptr(),
                            input.as_ptr(),
                            &mut array,
                            &mut count,
                        )
                    })?;
                    Ok(RawReply { array, count })
                }

                unsafe fn release(&self, block: *mut c_void) {
                    ffi::CoTaskMemFree(block);
                }
            }
        };
    }

    dll_driver!(RoutingDriver, routing, "dante_routing_test");
    dll_driver!(BrowsingDriver, browsing, "dante_browsing_test");
}
