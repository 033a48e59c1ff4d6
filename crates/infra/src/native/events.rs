//! Asynchronous notifications pushed by the library.
//!
//! The library invokes C callbacks from its own internal threads. The
//! trampolines here copy the text immediately and forward an owned
//! [`NativeEvent`] onto a process-wide crossbeam channel, so subscribers
//! never touch library memory and the callback returns promptly.

use std::sync::OnceLock;

use crossbeam::channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// One notification from the native library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    /// Routing event text
    Routing(String),
    /// Domain membership event text
    Domain(String),
    /// Per-device event, tagged with the device name
    Device { name: String, text: String },
}

fn channel() -> &'static (Sender<NativeEvent>, Receiver<NativeEvent>) {
    static CHANNEL: OnceLock<(Sender<NativeEvent>, Receiver<NativeEvent>)> = OnceLock::new();
    CHANNEL.get_or_init(unbounded)
}

/// Subscribe to native notifications. The channel is unbounded and shared by
/// every session in the process.
pub fn events() -> Receiver<NativeEvent> {
    channel().1.clone()
}

pub(crate) fn publish(event: NativeEvent) {
    debug!(?event, "native event");
    // The receiver side of the static channel never closes.
    let _ = channel().0.send(event);
}

#[cfg(windows)]
pub use callbacks::install_routing_callbacks;

#[cfg(windows)]
mod callbacks {
    use super::{publish, NativeEvent};
    use crate::native::ffi;
    use crate::native::marshal::cstring_at;
    use std::ffi::c_char;
    use std::sync::Once;

    unsafe extern "C" fn on_event(text: *const c_char) {
        publish(NativeEvent::Routing(cstring_at(text)));
    }

    unsafe extern "C" fn on_domain_event(text: *const c_char) {
        publish(NativeEvent::Domain(cstring_at(text)));
    }

    unsafe extern "C" fn on_device_event(name: *const c_char, text: *const c_char) {
        publish(NativeEvent::Device {
            name: cstring_at(name),
            text: cstring_at(text),
        });
    }

    /// Register the trampolines with the routing library. Safe to call from
    /// every session open; registration happens once per process.
    pub fn install_routing_callbacks() {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            // SAFETY: the trampolines are static and stay valid for the
            // process lifetime.
            unsafe {
                ffi::routing::set_event_callback(on_event);
                ffi::routing::set_domain_event_callback(on_domain_event);
                ffi::routing::set_device_event_callback(on_device_event);
            }
        });
    }
}
