//! Walks count-prefixed native reply buffers into owned Rust values.
//!
//! Every reply from the library is a pointer to `count` further pointers.
//! Each element pointer is either a C string or a fixed-layout record; both
//! were allocated by the library for the caller to free. The walk here frees
//! each element block and then the outer buffer, so a reply is consumed by
//! exactly one pass. Plain string fields *inside* a record stay owned by the
//! library and are only copied, never freed; nested variable-length arrays
//! (labels, SDP groups) are caller-owned like top-level elements and get
//! their own freeing pass.

use std::ffi::{c_char, c_void, CStr};

use crate::native::driver::{NativeDriver, RawReply};

/// Copy a native string field. Null or empty both come back as `""`.
///
/// # Safety
/// `ptr` must be null or point at a valid NUL-terminated string.
pub unsafe fn cstring_at(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Consume a reply whose elements are records, decoding each into `T`.
///
/// `decode` runs before the element block is freed, so it may read nested
/// pointers; anything nested it wants freed it must release itself through
/// the driver.
///
/// # Safety
/// `reply` must be a live reply from `driver` whose elements are `R` blocks.
pub unsafe fn record_vec<R, T>(
    driver: &dyn NativeDriver,
    reply: RawReply,
    decode: impl Fn(&dyn NativeDriver, &R) -> T,
) -> Vec<T> {
    consume(driver, reply, |driver, block| {
        // SAFETY: the caller vouches that every element is an `R` block.
        decode(driver, unsafe { &*(block as *const R) })
    })
}

/// Consume a reply whose elements are C strings.
///
/// # Safety
/// `reply` must be a live reply from `driver` whose elements are strings.
pub unsafe fn string_vec(driver: &dyn NativeDriver, reply: RawReply) -> Vec<String> {
    consume(driver, reply, |_, block| {
        // SAFETY: the caller vouches that every element is a C string.
        unsafe { cstring_at(block as *const c_char) }
    })
}

/// Consume a reply without decoding anything. Commands that answer with
/// status text nobody reads still hand back a buffer that must be freed.
///
/// # Safety
/// `reply` must be a live reply from `driver`.
pub unsafe fn drain(driver: &dyn NativeDriver, reply: RawReply) {
    consume(driver, reply, |_, _| ());
}

unsafe fn consume<T>(
    driver: &dyn NativeDriver,
    reply: RawReply,
    decode: impl Fn(&dyn NativeDriver, *mut c_void) -> T,
) -> Vec<T> {
    // A failed or empty call may leave the out-params untouched.
    if reply.array.is_null() || reply.count <= 0 {
        return Vec::new();
    }
    let count = reply.count as usize;
    let mut out = Vec::with_capacity(count);
    for index in 0..count {
        let block = *reply.array.add(index);
        if !block.is_null() {
            out.push(decode(driver, block));
            driver.release(block);
        }
    }
    driver.release(reply.array as *mut c_void);
    out
}

/// Walk a nested count-prefixed array inside a record, freeing it like a
/// top-level reply.
///
/// # Safety
/// `array`/`count` must describe a nested caller-owned array from `driver`.
pub unsafe fn nested_vec<R, T>(
    driver: &dyn NativeDriver,
    array: *mut *mut c_void,
    count: i32,
    decode: impl Fn(&dyn NativeDriver, &R) -> T,
) -> Vec<T> {
    record_vec(driver, RawReply { array, count }, decode)
}

/// Nested array of C strings (transmit label aliases).
///
/// # Safety
/// `array`/`count` must describe a nested caller-owned string array.
pub unsafe fn nested_strings(
    driver: &dyn NativeDriver,
    array: *mut *mut c_void,
    count: i32,
) -> Vec<String> {
    string_vec(driver, RawReply { array, count })
}
