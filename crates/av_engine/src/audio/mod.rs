//! Audio bridge: quantum cursor, spatial panning, and host adapters
//!
//! The runtime never owns an audio device. A host (the browser's worklet
//! glue, the optional rodio adapter, a test) calls the engine's
//! `process_audio` once per quantum with an interleaved float buffer; the
//! bridge zeroes it, wraps it in an [`AudioIoData`] cursor, and invokes the
//! application's sound callback. Everything downstream mixes with `+=`.

pub mod backend;
pub mod io;
pub mod panner;

pub use io::AudioIoData;
pub use panner::StereoPanner;

use thiserror::Error;

/// Audio configuration handed to the runtime before start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Frames per quantum (128 in browsers; configurable on native)
    pub quantum_frames: u32,
    /// Output channel count; zero disables audio entirely
    pub channels_out: u32,
    /// Input channel count
    pub channels_in: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            quantum_frames: 128,
            channels_out: 2,
            channels_in: 0,
        }
    }
}

impl AudioConfig {
    /// Whether audio processing is enabled at all
    pub fn enabled(&self) -> bool {
        self.channels_out > 0
    }
}

/// Audio-path errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// A quantum buffer did not match the configured frame/channel shape
    #[error("audio buffer shape mismatch: {0}")]
    BufferShape(String),

    /// The host audio device could not be opened
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
}
