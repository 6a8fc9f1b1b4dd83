//! Bind routing for secondary backends
//!
//! On the browser path, framebuffer and texture binds are routed through
//! this module before touching the driver, so a secondary backend (a
//! WebGPU mirror, a recording layer) can keep its view of the resource
//! state synchronized. The native path forwards straight to the driver and
//! never notifies.
//!
//! The observer is process-wide and installed at most once, before any
//! draw occurs.

use std::sync::OnceLock;

/// Observer of driver bind operations
pub trait BindObserver: Send + Sync {
    /// A framebuffer was bound (`None` = the default framebuffer)
    fn framebuffer_bound(&self, handle: Option<u64>);

    /// A texture was bound to a unit
    fn texture_bound(&self, handle: u64, unit: u32);
}

static OBSERVER: OnceLock<Box<dyn BindObserver>> = OnceLock::new();

/// Install the process-wide bind observer.
///
/// Only the first installation wins; later calls are logged and dropped.
pub fn set_bind_observer(observer: Box<dyn BindObserver>) {
    if OBSERVER.set(observer).is_err() {
        log::warn!("bind observer already installed; ignoring replacement");
    }
}

/// Notify the observer (if any) of a framebuffer bind
pub(crate) fn notify_framebuffer_bind(handle: Option<u64>) {
    if let Some(observer) = OBSERVER.get() {
        observer.framebuffer_bound(handle);
    }
}

/// Notify the observer (if any) of a texture bind
pub(crate) fn notify_texture_bind(handle: u64, unit: u32) {
    if let Some(observer) = OBSERVER.get() {
        observer.texture_bound(handle, unit);
    }
}
