//! Rodio audio host adapter
//!
//! Drives the pull-model quantum callback from a real output device via
//! rodio. The adapter owns an infinite raw source that refills an
//! interleaved quantum buffer from the callback whenever it runs dry, so
//! the runtime sees the same fixed-quantum cadence the browser worklet
//! provides.

use rodio::{OutputStream, OutputStreamHandle, Source};

use super::{AudioBackend, QuantumFn};
use crate::audio::{AudioConfig, AudioError};

struct PullSource {
    callback: QuantumFn,
    buffer: Vec<f32>,
    position: usize,
    frames: usize,
    channels: u16,
    sample_rate: u32,
}

impl Iterator for PullSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.position >= self.buffer.len() {
            self.buffer.fill(0.0);
            (self.callback)(&mut self.buffer, self.frames, usize::from(self.channels));
            self.position = 0;
        }
        let sample = self.buffer[self.position];
        self.position += 1;
        Some(sample)
    }
}

impl Source for PullSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}

/// Rodio-based pull-model host
pub struct RodioBackend {
    // The stream must be kept alive for playback to continue.
    _output_stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    initialized: bool,
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioBackend {
    /// Create an adapter with no device open
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            initialized: false,
        }
    }
}

impl AudioBackend for RodioBackend {
    fn initialize(&mut self, config: &AudioConfig, callback: QuantumFn) -> Result<(), AudioError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        let frames = config.quantum_frames as usize;
        let channels = config.channels_out as u16;
        let source = PullSource {
            callback,
            buffer: vec![0.0; frames * usize::from(channels)],
            // Start exhausted so the first sample pulls a fresh quantum.
            position: frames * usize::from(channels),
            frames,
            channels,
            sample_rate: config.sample_rate,
        };

        handle
            .play_raw(source)
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(handle);
        self.initialized = true;
        log::info!(
            "audio device open: {} Hz, {} channels, {} frame quanta",
            config.sample_rate,
            channels,
            frames
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stream_handle = None;
        self._output_stream = None;
        self.initialized = false;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
