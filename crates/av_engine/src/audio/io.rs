//! Per-sample cursor over one audio quantum
//!
//! `AudioIoData` wraps the interleaved output (and optional input) buffer
//! of a single quantum and exposes the per-sample processing style:
//!
//! ```
//! # use av_engine::audio::AudioIoData;
//! # let mut buffer = [0.0f32; 256];
//! # let mut io = AudioIoData::new(&mut buffer, &[], 2, 0, 44_100.0);
//! while io.advance() {
//!     let s = 0.1;
//!     *io.out(0) += s;
//!     *io.out(1) += s;
//! }
//! ```
//!
//! The cursor is a finite sequence over the quantum's frames, consumed
//! exactly once per callback; it does not restart across quanta. The
//! output buffer arrives zeroed, so `+=` mixing is the idiom.

/// Cursor over one quantum of interleaved audio
pub struct AudioIoData<'a> {
    output: &'a mut [f32],
    input: &'a [f32],
    frames: usize,
    channels_out: usize,
    channels_in: usize,
    frames_per_second: f64,
    frame: usize,
    next: usize,
}

impl<'a> AudioIoData<'a> {
    /// Wrap a quantum. `output.len()` must be a multiple of
    /// `channels_out`; the frame count is derived from it.
    pub fn new(
        output: &'a mut [f32],
        input: &'a [f32],
        channels_out: usize,
        channels_in: usize,
        frames_per_second: f64,
    ) -> Self {
        debug_assert!(channels_out > 0);
        debug_assert_eq!(output.len() % channels_out, 0);
        let frames = output.len() / channels_out;
        Self {
            output,
            input,
            frames,
            channels_out,
            channels_in,
            frames_per_second,
            frame: 0,
            next: 0,
        }
    }

    /// Step to the next frame; false once the quantum is exhausted
    pub fn advance(&mut self) -> bool {
        if self.next < self.frames {
            self.frame = self.next;
            self.next += 1;
            true
        } else {
            false
        }
    }

    /// Index of the current frame (valid after a successful `advance`)
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Frames in this quantum
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Output channel count
    pub fn channels_out(&self) -> usize {
        self.channels_out
    }

    /// Input channel count
    pub fn channels_in(&self) -> usize {
        self.channels_in
    }

    /// Sample rate in frames per second
    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    /// Mutable sample of the current frame on an output channel
    pub fn out(&mut self, channel: usize) -> &mut f32 {
        debug_assert!(channel < self.channels_out);
        &mut self.output[self.frame * self.channels_out + channel]
    }

    /// Sample of the current frame on an input channel (0.0 without input)
    pub fn input(&self, channel: usize) -> f32 {
        if channel >= self.channels_in {
            return 0.0;
        }
        self.input
            .get(self.frame * self.channels_in + channel)
            .copied()
            .unwrap_or(0.0)
    }

    /// A fresh cursor over the same buffers, optionally starting at a
    /// frame offset. The voice pool uses this to hand every voice a full
    /// quantum (application cursors are not restartable).
    pub(crate) fn sub_cursor(&mut self, start_frame: usize) -> AudioIoData<'_> {
        AudioIoData {
            output: &mut *self.output,
            input: self.input,
            frames: self.frames,
            channels_out: self.channels_out,
            channels_in: self.channels_in,
            frames_per_second: self.frames_per_second,
            frame: 0,
            next: start_frame.min(self.frames),
        }
    }

    /// Raw access to the interleaved output of the whole quantum
    pub(crate) fn output_mut(&mut self) -> &mut [f32] {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_visits_every_frame_once() {
        let mut buffer = [0.0f32; 8];
        let mut io = AudioIoData::new(&mut buffer, &[], 2, 0, 48_000.0);
        let mut visited = Vec::new();
        while io.advance() {
            visited.push(io.frame());
        }
        assert_eq!(visited, vec![0, 1, 2, 3]);
        assert!(!io.advance());
    }

    #[test]
    fn out_addresses_interleaved_samples() {
        let mut buffer = [0.0f32; 6];
        let mut io = AudioIoData::new(&mut buffer, &[], 2, 0, 44_100.0);
        while io.advance() {
            *io.out(0) += 1.0;
            *io.out(1) += 2.0;
        }
        assert_eq!(buffer, [1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn input_reads_zero_without_channels() {
        let mut buffer = [0.0f32; 4];
        let mut io = AudioIoData::new(&mut buffer, &[], 2, 0, 44_100.0);
        assert!(io.advance());
        assert_eq!(io.input(0), 0.0);
    }

    #[test]
    fn sub_cursor_starts_fresh_at_an_offset() {
        let mut buffer = [0.0f32; 8];
        let mut io = AudioIoData::new(&mut buffer, &[], 1, 0, 44_100.0);
        {
            let mut sub = io.sub_cursor(6);
            let mut frames = Vec::new();
            while sub.advance() {
                frames.push(sub.frame());
            }
            assert_eq!(frames, vec![6, 7]);
        }
        // The parent cursor is untouched by the sub-cursor's stepping.
        assert!(io.advance());
        assert_eq!(io.frame(), 0);
    }
}
