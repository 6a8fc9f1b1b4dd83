//! Voice traits and lifecycle
//!
//! A voice is an active instance of a sound-generating object, allocated
//! from a [`crate::synth::PolySynth`] pool. Its lifecycle runs pooled →
//! triggered → (optionally releasing) → pooled:
//!
//! - `on_trigger_on` fires once when the voice is activated; reset
//!   envelopes and phases here.
//! - `on_trigger_off` fires once when the host releases the trigger id;
//!   begin the release stage here. One-shot voices may never receive it.
//! - `finished` is polled after every audio quantum; returning true hands
//!   the voice back to the pool. The pool never reclaims mid-quantum, so a
//!   voice that reports finished still owns its state for the remainder of
//!   the quantum that observed it.

use crate::audio::AudioIoData;
use crate::foundation::pose::Pose;
use crate::graphics::Graphics;

/// A pooled sound-generating object with optional visual presence
pub trait Voice {
    /// Activation hook; fires exactly once per trigger
    fn on_trigger_on(&mut self) {}

    /// Release hook; fires exactly once per `trigger_off` of this voice's id
    fn on_trigger_off(&mut self) {}

    /// Produce one quantum of audio. The cursor covers the full quantum;
    /// mix additively with `+=`. Must be real-time safe: no allocation, no
    /// blocking, no graphics access.
    fn on_process_audio(&mut self, io: &mut AudioIoData);

    /// Draw this voice's visual representation (main stream only)
    fn on_process_graphics(&mut self, _g: &mut Graphics) {}

    /// Non-audio-rate motion and state updates
    fn update(&mut self, _dt: f64) {}

    /// Whether the voice is done and should return to the pool. Polled
    /// after each quantum; the pool applies the transition between quanta.
    fn finished(&self) -> bool;
}

/// A voice with a position and orientation in the scene
pub trait PositionedVoice: Voice {
    /// The voice's pose
    fn pose(&self) -> Pose;

    /// Mutable access for motion
    fn pose_mut(&mut self) -> &mut Pose;
}
