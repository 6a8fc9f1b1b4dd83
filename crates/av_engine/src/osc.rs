//! OSC stub
//!
//! The runtime exposes no networking stack; messages sent here are logged
//! at debug level and dropped. Hosts that need real OSC bridge it on
//! their side of the boundary.

/// A no-op OSC sender
#[derive(Debug, Default)]
pub struct OscSender {
    _private: (),
}

impl OscSender {
    /// Create a sender (connects to nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and drop a message
    pub fn send(&self, address: &str, args: &[f32]) {
        log::debug!("osc (stubbed): {address} {args:?}");
    }
}
