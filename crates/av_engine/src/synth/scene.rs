//! Spatialized scene over a positioned-voice pool
//!
//! `DynamicScene` wraps a [`PolySynth`] of positioned voices, a listener
//! pose, and distance attenuation. During audio rendering each active
//! voice renders into a preallocated scratch quantum; the scene derives a
//! mono signal from it, applies the distance gain and constant-power pan
//! from the listener-relative azimuth, and mixes additively into the
//! first two output channels of the listener bus.

use crate::audio::io::AudioIoData;
use crate::audio::panner::{distance_attenuation, StereoPanner, DEFAULT_ATTENUATION_COEFF};
use crate::foundation::math::constants::RAD_TO_DEG;
use crate::foundation::pose::Pose;
use crate::graphics::Graphics;
use crate::synth::poly_synth::{PolySynth, VoiceSlot};
use crate::synth::voice::PositionedVoice;

/// Distance attenuation settings
#[derive(Debug, Clone, Copy)]
pub struct AttenuationSettings {
    /// Apply distance attenuation at all
    pub enabled: bool,
    /// Full gain at or below this distance
    pub near_clip: f32,
    /// Silence at or beyond this distance
    pub far_clip: f32,
    /// Inverse-law coefficient between the clips
    pub coeff: f32,
}

impl Default for AttenuationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            near_clip: 0.1,
            far_clip: 100.0,
            coeff: DEFAULT_ATTENUATION_COEFF,
        }
    }
}

impl AttenuationSettings {
    /// Gain for a source at the given distance: 1 below the near clip, 0
    /// above the far clip, inverse law faded to zero in between.
    pub fn gain(&self, distance: f32) -> f32 {
        if !self.enabled {
            return 1.0;
        }
        if distance <= self.near_clip {
            return 1.0;
        }
        if distance >= self.far_clip {
            return 0.0;
        }
        let inv = distance_attenuation(distance - self.near_clip, self.coeff);
        let fade = (self.far_clip - distance) / (self.far_clip - self.near_clip);
        inv * fade
    }
}

/// A polyphonic pool of positioned voices under a listener pose
pub struct DynamicScene<V: PositionedVoice> {
    synth: PolySynth<V>,
    /// The pose spatial gains are computed against
    pub listener_pose: Pose,
    /// Distance attenuation configuration
    pub attenuation: AttenuationSettings,
    /// The stereo panner used for lateral placement
    pub panner: StereoPanner,
    scratch: Vec<f32>,
}

impl<V: PositionedVoice + Default> DynamicScene<V> {
    /// Create a scene with a default-constructed voice pool
    pub fn new(capacity: usize) -> Self {
        Self::from_synth(PolySynth::with_capacity(capacity))
    }
}

impl<V: PositionedVoice> DynamicScene<V> {
    /// Create a scene over an existing pool
    pub fn from_synth(synth: PolySynth<V>) -> Self {
        Self {
            synth,
            listener_pose: Pose::default(),
            attenuation: AttenuationSettings::default(),
            panner: StereoPanner::default(),
            scratch: Vec::new(),
        }
    }

    /// The underlying voice pool
    pub fn synth(&self) -> &PolySynth<V> {
        &self.synth
    }

    /// Mutable access to the underlying voice pool (trigger, configure)
    pub fn synth_mut(&mut self) -> &mut PolySynth<V> {
        &mut self.synth
    }

    /// Shorthand for [`PolySynth::get_voice`]
    pub fn get_voice(&mut self) -> Option<VoiceSlot> {
        self.synth.get_voice()
    }

    /// Preallocate the scratch quantum so the audio path never allocates.
    /// Call once after the audio configuration is known.
    pub fn prepare(&mut self, quantum_frames: usize, channels: usize) {
        self.scratch.resize(quantum_frames * channels.max(1), 0.0);
    }

    /// Render one quantum with spatialization applied per voice
    pub fn render_audio(&mut self, io: &mut AudioIoData) {
        let frames = io.frames();
        let channels = io.channels_out();
        let needed = frames * channels;
        if self.scratch.len() < needed {
            log::warn!("scene scratch buffer grown in the audio path; call prepare()");
            self.scratch.resize(needed, 0.0);
        }
        let fps = io.frames_per_second();

        for i in 0..self.synth.active.len() {
            let idx = self.synth.active[i];
            let offset = std::mem::take(&mut self.synth.start_offsets[idx]);

            let scratch = &mut self.scratch[..needed];
            scratch.fill(0.0);
            {
                let mut voice_io = AudioIoData::new(scratch, &[], channels, 0, fps);
                let mut cursor = voice_io.sub_cursor(offset);
                self.synth.voices[idx].on_process_audio(&mut cursor);
            }

            let local = self
                .listener_pose
                .to_local(self.synth.voices[idx].pose().position);
            let distance = local.norm();
            let gain = self.attenuation.gain(distance);
            if gain <= 0.0 {
                continue;
            }
            // 0 degrees straight ahead (-z), positive clockwise.
            let azimuth_deg = local.x.atan2(-local.z) * RAD_TO_DEG;
            let (gain_l, gain_r) = self.panner.gains(azimuth_deg);

            let out = io.output_mut();
            let scratch = &self.scratch[..needed];
            for f in 0..frames {
                let mut mono = 0.0;
                for c in 0..channels {
                    mono += scratch[f * channels + c];
                }
                mono /= channels as f32;
                if channels >= 2 {
                    out[f * channels] += mono * gain * gain_l;
                    out[f * channels + 1] += mono * gain * gain_r;
                } else {
                    out[f] += mono * gain;
                }
            }
        }

        self.synth.reclaim_finished();
    }

    /// Draw every active voice
    pub fn render_graphics(&mut self, g: &mut Graphics) {
        self.synth.render_graphics(g);
    }

    /// Advance every active voice's non-audio-rate motion
    pub fn update(&mut self, dt: f64) {
        self.synth.update(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::synth::voice::Voice;

    /// Emits a constant DC level on every channel while active
    #[derive(Default)]
    struct BeaconVoice {
        pose: Pose,
        live: bool,
    }

    impl Voice for BeaconVoice {
        fn on_trigger_on(&mut self) {
            self.live = true;
        }

        fn on_trigger_off(&mut self) {
            self.live = false;
        }

        fn on_process_audio(&mut self, io: &mut AudioIoData) {
            while io.advance() {
                for c in 0..io.channels_out() {
                    *io.out(c) += 0.5;
                }
            }
        }

        fn finished(&self) -> bool {
            !self.live
        }
    }

    impl PositionedVoice for BeaconVoice {
        fn pose(&self) -> Pose {
            self.pose
        }

        fn pose_mut(&mut self) -> &mut Pose {
            &mut self.pose
        }
    }

    fn scene_with_voice_at(position: Vec3) -> DynamicScene<BeaconVoice> {
        let mut scene: DynamicScene<BeaconVoice> = DynamicScene::new(4);
        scene.attenuation.near_clip = 0.5;
        scene.attenuation.far_clip = 20.0;
        scene.prepare(128, 2);

        let slot = scene.get_voice().unwrap();
        scene.synth_mut().voice_mut(&slot).pose.position = position;
        scene.synth_mut().trigger_on(slot, 0, 1);
        scene
    }

    fn channel_energy(scene: &mut DynamicScene<BeaconVoice>) -> (f32, f32) {
        let mut buffer = vec![0.0f32; 128 * 2];
        let mut io = AudioIoData::new(&mut buffer, &[], 2, 0, 44_100.0);
        scene.render_audio(&mut io);
        let left: f32 = buffer.iter().step_by(2).map(|s| s.abs()).sum();
        let right: f32 = buffer.iter().skip(1).step_by(2).map(|s| s.abs()).sum();
        (left, right)
    }

    #[test]
    fn a_voice_to_the_right_is_louder_on_the_right() {
        let mut scene = scene_with_voice_at(Vec3::new(3.0, 0.0, 0.0));
        let (left, right) = channel_energy(&mut scene);
        assert!(right > left, "right {right} should exceed left {left}");
        assert!(right > 0.0);
    }

    #[test]
    fn front_and_back_at_equal_distance_are_equally_loud() {
        let mut front = scene_with_voice_at(Vec3::new(0.0, 0.0, -5.0));
        let mut back = scene_with_voice_at(Vec3::new(0.0, 0.0, 5.0));
        let (fl, fr) = channel_energy(&mut front);
        let (bl, br) = channel_energy(&mut back);
        assert!((fl - bl).abs() < 1e-3);
        assert!((fr - br).abs() < 1e-3);
    }

    #[test]
    fn beyond_the_far_clip_is_silent() {
        let mut scene = scene_with_voice_at(Vec3::new(0.0, 0.0, -30.0));
        let (left, right) = channel_energy(&mut scene);
        assert_eq!(left, 0.0);
        assert_eq!(right, 0.0);
    }

    #[test]
    fn inside_the_near_clip_is_full_gain() {
        let mut scene = scene_with_voice_at(Vec3::new(0.0, 0.0, -0.3));
        let (left, right) = channel_energy(&mut scene);
        // 128 frames of 0.5 mono at unit gain, constant-power center pan.
        let expected = 128.0 * 0.5 * (std::f32::consts::FRAC_PI_4).cos();
        assert!((left - expected).abs() < 0.1);
        assert!((right - expected).abs() < 0.1);
    }

    #[test]
    fn nearer_voices_are_louder() {
        let mut near = scene_with_voice_at(Vec3::new(0.0, 0.0, -2.0));
        let mut far = scene_with_voice_at(Vec3::new(0.0, 0.0, -10.0));
        let (near_l, _) = channel_energy(&mut near);
        let (far_l, _) = channel_energy(&mut far);
        assert!(near_l > far_l);
    }

    #[test]
    fn attenuation_gain_curve_endpoints() {
        let att = AttenuationSettings {
            enabled: true,
            near_clip: 0.5,
            far_clip: 20.0,
            coeff: 0.5,
        };
        assert_eq!(att.gain(0.1), 1.0);
        assert_eq!(att.gain(0.5), 1.0);
        assert_eq!(att.gain(25.0), 0.0);
        let mid = att.gain(5.0);
        assert!(mid > 0.0 && mid < 1.0);

        let disabled = AttenuationSettings { enabled: false, ..att };
        assert_eq!(disabled.gain(1000.0), 1.0);
    }
}
