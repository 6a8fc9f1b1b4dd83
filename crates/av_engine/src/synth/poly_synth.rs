//! Polyphonic voice pool
//!
//! `PolySynth` preallocates a fixed number of voices of one concrete type
//! and never allocates afterward. Voices move between an index-based free
//! list and an active list; a held stage in between lets the caller
//! configure a voice before it starts sounding. Trigger ids map to active
//! voices so a later `trigger_off` can find them.
//!
//! Reclamation is deferred: a voice that reports `finished()` during a
//! quantum is moved back to the free list after the whole active list has
//! rendered, never mid-iteration. Triggers performed on the main stream
//! complete every write to the voice before it is appended to the active
//! list, so the next quantum observes a fully published voice.

use std::collections::HashMap;

use crate::audio::AudioIoData;
use crate::graphics::Graphics;
use crate::synth::voice::Voice;

/// Token for a voice popped from the free list but not yet triggered.
///
/// Not copyable: each token is consumed by `trigger_on` (or returned via
/// `cancel`) exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct VoiceSlot(pub(crate) usize);

/// Fixed-capacity polyphonic voice pool
pub struct PolySynth<V: Voice> {
    pub(crate) voices: Vec<V>,
    pub(crate) free: Vec<usize>,
    pub(crate) held: Vec<usize>,
    pub(crate) active: Vec<usize>,
    pub(crate) start_offsets: Vec<usize>,
    pub(crate) ids: HashMap<u64, usize>,
}

impl<V: Voice + Default> PolySynth<V> {
    /// Preallocate a pool of default-constructed voices
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_factory(capacity, |_| V::default())
    }
}

impl<V: Voice> PolySynth<V> {
    /// Preallocate a pool, building each voice with the factory
    pub fn from_factory(capacity: usize, mut factory: impl FnMut(usize) -> V) -> Self {
        let voices: Vec<V> = (0..capacity).map(&mut factory).collect();
        Self {
            voices,
            // Pop order matches slot order: lowest index first.
            free: (0..capacity).rev().collect(),
            held: Vec::with_capacity(capacity),
            active: Vec::with_capacity(capacity),
            start_offsets: vec![0; capacity],
            ids: HashMap::with_capacity(capacity),
        }
    }

    /// Pool capacity fixed at allocation time
    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    /// Number of currently sounding voices
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of voices available for triggering
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Pop a voice from the free list for configuration.
    ///
    /// Returns `None` when the pool is exhausted; the active set is
    /// unchanged in that case.
    pub fn get_voice(&mut self) -> Option<VoiceSlot> {
        let idx = self.free.pop()?;
        self.held.push(idx);
        Some(VoiceSlot(idx))
    }

    /// Access a held voice for configuration before triggering
    pub fn voice_mut(&mut self, slot: &VoiceSlot) -> &mut V {
        &mut self.voices[slot.0]
    }

    /// Return a held voice to the free list without sounding it
    pub fn cancel(&mut self, slot: VoiceSlot) {
        self.held.retain(|&i| i != slot.0);
        self.free.push(slot.0);
    }

    /// Activate a held voice.
    ///
    /// `offset_frames` delays the start within the voice's first quantum.
    /// The id is recorded so `trigger_off` can find the voice later; an id
    /// already in use is retargeted to this voice.
    pub fn trigger_on(&mut self, slot: VoiceSlot, offset_frames: usize, id: u64) {
        let idx = slot.0;
        self.held.retain(|&i| i != idx);
        self.start_offsets[idx] = offset_frames;
        self.voices[idx].on_trigger_on();
        self.ids.insert(id, idx);
        // Publish last: every write above lands before the voice becomes
        // visible to the audio stream's iteration.
        self.active.push(idx);
    }

    /// Release the voice recorded under a trigger id.
    ///
    /// The voice's `on_trigger_off` fires once; the voice keeps sounding
    /// until it reports `finished()`. Unknown ids are ignored.
    pub fn trigger_off(&mut self, id: u64) {
        if let Some(idx) = self.ids.remove(&id) {
            self.voices[idx].on_trigger_off();
        }
    }

    /// Render one quantum: every active voice receives a fresh full-length
    /// cursor over the same output buffer and mixes into it. Finished
    /// voices are reclaimed after the iteration completes.
    pub fn render_audio(&mut self, io: &mut AudioIoData) {
        for i in 0..self.active.len() {
            let idx = self.active[i];
            let offset = std::mem::take(&mut self.start_offsets[idx]);
            let mut cursor = io.sub_cursor(offset);
            self.voices[idx].on_process_audio(&mut cursor);
        }
        self.reclaim_finished();
    }

    /// Draw every active voice
    pub fn render_graphics(&mut self, g: &mut Graphics) {
        for i in 0..self.active.len() {
            let idx = self.active[i];
            self.voices[idx].on_process_graphics(g);
        }
    }

    /// Advance every active voice's non-audio-rate state
    pub fn update(&mut self, dt: f64) {
        for i in 0..self.active.len() {
            let idx = self.active[i];
            self.voices[idx].update(dt);
        }
    }

    /// Release every active and held voice back to the pool immediately
    pub fn reset(&mut self) {
        self.active.clear();
        self.held.clear();
        self.ids.clear();
        self.free = (0..self.voices.len()).rev().collect();
    }

    pub(crate) fn reclaim_finished(&mut self) {
        let voices = &self.voices;
        let free = &mut self.free;
        let ids = &mut self.ids;
        self.active.retain(|&idx| {
            if voices[idx].finished() {
                free.push(idx);
                ids.retain(|_, &mut v| v != idx);
                false
            } else {
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-shot voice with a fixed lifetime in samples
    #[derive(Default)]
    struct DecayVoice {
        remaining: usize,
        trigger_on_count: usize,
        trigger_off_count: usize,
        releasing: bool,
    }

    impl DecayVoice {
        const LIFETIME: usize = 4410; // 100 ms at 44.1 kHz
    }

    impl Voice for DecayVoice {
        fn on_trigger_on(&mut self) {
            self.remaining = Self::LIFETIME;
            self.releasing = false;
            self.trigger_on_count += 1;
        }

        fn on_trigger_off(&mut self) {
            self.trigger_off_count += 1;
            self.releasing = true;
        }

        fn on_process_audio(&mut self, io: &mut AudioIoData) {
            while io.advance() {
                if self.remaining > 0 {
                    *io.out(0) += 0.1;
                    self.remaining -= 1;
                }
            }
        }

        fn finished(&self) -> bool {
            self.remaining == 0
        }
    }

    fn quantum(synth: &mut PolySynth<DecayVoice>, frames: usize) {
        let mut buffer = vec![0.0f32; frames];
        let mut io = AudioIoData::new(&mut buffer, &[], 1, 0, 44_100.0);
        synth.render_audio(&mut io);
    }

    #[test]
    fn pool_invariant_holds_through_the_lifecycle() {
        let mut synth: PolySynth<DecayVoice> = PolySynth::with_capacity(4);
        let check = |s: &PolySynth<DecayVoice>| {
            assert_eq!(s.free.len() + s.held.len() + s.active.len(), 4);
            for idx in &s.active {
                assert!(!s.free.contains(idx), "voice in both free and active");
            }
        };

        check(&synth);
        let slot = synth.get_voice().unwrap();
        check(&synth);
        synth.trigger_on(slot, 0, 1);
        check(&synth);
        quantum(&mut synth, 128);
        check(&synth);
    }

    #[test]
    fn exhausted_pool_returns_none_and_leaves_active_set_unchanged() {
        let mut synth: PolySynth<DecayVoice> = PolySynth::with_capacity(4);
        let mut slots = Vec::new();
        for _ in 0..4 {
            slots.push(synth.get_voice().expect("within capacity"));
        }
        for (i, slot) in slots.into_iter().enumerate() {
            synth.trigger_on(slot, 0, i as u64);
        }
        assert_eq!(synth.active_count(), 4);

        assert!(synth.get_voice().is_none());
        assert_eq!(synth.active_count(), 4);
        assert_eq!(synth.free_count(), 0);
    }

    #[test]
    fn trigger_round_trip_fires_each_hook_once() {
        let mut synth: PolySynth<DecayVoice> = PolySynth::with_capacity(2);
        let slot = synth.get_voice().unwrap();
        let idx = slot.0;
        synth.trigger_on(slot, 0, 7);
        synth.trigger_off(7);

        assert_eq!(synth.voices[idx].trigger_on_count, 1);
        assert_eq!(synth.voices[idx].trigger_off_count, 1);

        // A second release of the same id is ignored.
        synth.trigger_off(7);
        assert_eq!(synth.voices[idx].trigger_off_count, 1);
    }

    #[test]
    fn voice_returns_to_the_pool_after_its_envelope_runs_out() {
        let mut synth: PolySynth<DecayVoice> = PolySynth::with_capacity(3);
        let free_before = synth.free_count();

        let slot = synth.get_voice().unwrap();
        synth.trigger_on(slot, 0, 1);

        let quantum_frames = 128;
        let quanta_needed = DecayVoice::LIFETIME.div_ceil(quantum_frames);

        for _ in 0..quanta_needed - 1 {
            quantum(&mut synth, quantum_frames);
        }
        assert_eq!(synth.active_count(), 1, "voice reclaimed too early");

        quantum(&mut synth, quantum_frames);
        assert_eq!(synth.active_count(), 0);
        assert_eq!(synth.free_count(), free_before);
    }

    #[test]
    fn reclamation_happens_after_the_quantum_not_during() {
        let mut synth: PolySynth<DecayVoice> = PolySynth::with_capacity(2);
        let slot = synth.get_voice().unwrap();
        synth.trigger_on(slot, 0, 1);

        // A quantum longer than the voice's whole lifetime: the voice
        // finishes mid-quantum but is only reclaimed at the end of it.
        quantum(&mut synth, DecayVoice::LIFETIME + 100);
        assert_eq!(synth.active_count(), 0);
        assert_eq!(synth.free_count(), 2);
    }

    #[test]
    fn start_offset_delays_the_first_samples() {
        let mut synth: PolySynth<DecayVoice> = PolySynth::with_capacity(1);
        let slot = synth.get_voice().unwrap();
        synth.trigger_on(slot, 32, 1);

        let mut buffer = vec![0.0f32; 64];
        let mut io = AudioIoData::new(&mut buffer, &[], 1, 0, 44_100.0);
        synth.render_audio(&mut io);

        assert!(buffer[..32].iter().all(|&s| s == 0.0));
        assert!(buffer[32..].iter().all(|&s| s > 0.0));
    }

    #[test]
    fn cancel_returns_a_held_voice() {
        let mut synth: PolySynth<DecayVoice> = PolySynth::with_capacity(1);
        let slot = synth.get_voice().unwrap();
        assert_eq!(synth.free_count(), 0);
        synth.cancel(slot);
        assert_eq!(synth.free_count(), 1);
        assert!(synth.get_voice().is_some());
    }
}
