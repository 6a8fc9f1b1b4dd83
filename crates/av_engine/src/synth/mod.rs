//! Voice/scene core: polyphonic voice pool and spatialized scene

pub mod poly_synth;
pub mod scene;
pub mod voice;

pub use poly_synth::{PolySynth, VoiceSlot};
pub use scene::{AttenuationSettings, DynamicScene};
pub use voice::{PositionedVoice, Voice};
