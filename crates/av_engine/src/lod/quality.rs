//! Adaptive quality controller
//!
//! `QualityManager` watches measured frame rate against a target and walks
//! a fixed ladder of quality mutations. Every half second of real time it
//! computes the observed FPS, pushes it into a ten-entry ring, and (in
//! Auto mode) nudges a stability counter by the average-to-target ratio.
//! Enough consecutive misses in one direction apply one ladder step and
//! reset the counter.
//!
//! The ladder is symmetric: decreasing walks the steps forward, increasing
//! undoes them in reverse. Named presets are positions on the same ladder,
//! so a preset and an adaptively reached state are indistinguishable.
//!
//! Mutations must land between frames: the engine calls `frame_tick` from
//! the main stream before the animate callback, never inside a draw or
//! sound callback.

use serde::{Deserialize, Serialize};

/// Evaluation cadence in seconds
pub const EVAL_INTERVAL: f32 = 0.5;

/// Below this average/target ratio the controller leans down
pub const RATIO_LOW: f32 = 0.85;

/// Above this average/target ratio the controller leans up
pub const RATIO_HIGH: f32 = 1.10;

/// Consecutive down-leanings before a decrease step
const STABILITY_DOWN: i32 = -3;

/// Consecutive up-leanings before an increase step
const STABILITY_UP: i32 = 5;

const RING_SIZE: usize = 10;

/// Flat record of the tunable quality switches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    /// Render resolution relative to the window (0.5 ..= 1.0)
    pub resolution_scale: f32,
    /// Extra LOD selection bias (1.0 = neutral, larger = coarser)
    pub lod_bias: f32,
    /// Maximum lights evaluated per draw
    pub max_lights: u32,
    /// Shadow map edge size in texels
    pub shadow_map_size: u32,
    /// Shadow rendering at all
    pub shadows: bool,
    /// Soft (filtered) shadow edges
    pub soft_shadows: bool,
    /// Bloom post pass
    pub bloom: bool,
    /// Ambient occlusion pass
    pub ambient_occlusion: bool,
    /// Reflection quality: 0 off, 1 low, 2 full
    pub reflection_quality: u32,
    /// Particle budget
    pub max_particles: u32,
    /// MSAA sample count
    pub anti_aliasing: u32,
}

impl QualitySettings {
    /// The top of the ladder: everything enabled
    pub fn maximum() -> Self {
        Self {
            resolution_scale: 1.0,
            lod_bias: 1.0,
            max_lights: 8,
            shadow_map_size: 4096,
            shadows: true,
            soft_shadows: true,
            bloom: true,
            ambient_occlusion: true,
            reflection_quality: 2,
            max_particles: 10_000,
            anti_aliasing: 4,
        }
    }

    /// Parse a settings document in RON
    pub fn from_ron_str(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    /// Serialize to a RON document
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

impl Default for QualitySettings {
    fn default() -> Self {
        QualityPreset::High.settings()
    }
}

/// Named quality presets; positions on the adaptive ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityPreset {
    /// Six ladder steps down from maximum
    Low,
    /// Three ladder steps down
    Medium,
    /// One ladder step down
    High,
    /// The top of the ladder
    Ultra,
    /// Starts at High and adapts from measured FPS
    Auto,
}

impl QualityPreset {
    /// How many decrease-ladder steps below maximum this preset sits
    fn rung(self) -> usize {
        match self {
            Self::Ultra => 0,
            Self::High | Self::Auto => 1,
            Self::Medium => 3,
            Self::Low => 6,
        }
    }

    /// The settings record for this preset
    pub fn settings(self) -> QualitySettings {
        let mut settings = QualitySettings::maximum();
        for step in &DECREASE_LADDER[..self.rung()] {
            step.apply_decrease(&mut settings);
        }
        settings
    }
}

/// One rung of the quality ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    DisableAmbientOcclusion,
    DisableSoftShadows,
    DisableBloom,
    LowerReflections,
    ShrinkShadowMap,
    RaiseLodBias,
    LowerResolutionScale,
    DisableShadows,
}

const DECREASE_LADDER: [Step; 8] = [
    Step::DisableAmbientOcclusion,
    Step::DisableSoftShadows,
    Step::DisableBloom,
    Step::LowerReflections,
    Step::ShrinkShadowMap,
    Step::RaiseLodBias,
    Step::LowerResolutionScale,
    Step::DisableShadows,
];

impl Step {
    fn apply_decrease(self, s: &mut QualitySettings) {
        match self {
            Self::DisableAmbientOcclusion => s.ambient_occlusion = false,
            Self::DisableSoftShadows => s.soft_shadows = false,
            Self::DisableBloom => s.bloom = false,
            Self::LowerReflections => s.reflection_quality = s.reflection_quality.saturating_sub(1),
            Self::ShrinkShadowMap => s.shadow_map_size = (s.shadow_map_size / 2).max(256),
            Self::RaiseLodBias => s.lod_bias += 0.5,
            Self::LowerResolutionScale => {
                s.resolution_scale = round_tenth((s.resolution_scale - 0.1).max(0.5));
            }
            Self::DisableShadows => s.shadows = false,
        }
    }

    fn apply_increase(self, s: &mut QualitySettings) {
        match self {
            Self::DisableAmbientOcclusion => s.ambient_occlusion = true,
            Self::DisableSoftShadows => s.soft_shadows = true,
            Self::DisableBloom => s.bloom = true,
            Self::LowerReflections => s.reflection_quality = (s.reflection_quality + 1).min(2),
            Self::ShrinkShadowMap => s.shadow_map_size = (s.shadow_map_size * 2).min(4096),
            Self::RaiseLodBias => s.lod_bias = (s.lod_bias - 0.5).max(1.0),
            Self::LowerResolutionScale => {
                s.resolution_scale = round_tenth((s.resolution_scale + 0.1).min(1.0));
            }
            Self::DisableShadows => s.shadows = true,
        }
    }
}

/// Keep the resolution scale on exact tenths so ladder round trips compare
/// equal despite f32 arithmetic.
fn round_tenth(x: f32) -> f32 {
    (x * 10.0).round() / 10.0
}

/// Callback fired after every settings mutation
pub type QualityChangeFn = Box<dyn FnMut(&QualitySettings)>;

/// FPS-driven quality controller
pub struct QualityManager {
    target_fps: f32,
    settings: QualitySettings,
    auto: bool,
    rung: usize,

    ring: [f32; RING_SIZE],
    ring_len: usize,
    ring_pos: usize,
    stability: i32,

    frames: u32,
    elapsed: f32,

    on_change: Option<QualityChangeFn>,
}

impl QualityManager {
    /// Create a controller targeting the given FPS, seeded from a preset
    pub fn new(target_fps: f32, preset: QualityPreset) -> Self {
        Self {
            target_fps,
            settings: preset.settings(),
            auto: preset == QualityPreset::Auto,
            rung: preset.rung(),
            ring: [0.0; RING_SIZE],
            ring_len: 0,
            ring_pos: 0,
            stability: 0,
            frames: 0,
            elapsed: 0.0,
            on_change: None,
        }
    }

    /// The current settings record
    pub fn settings(&self) -> &QualitySettings {
        &self.settings
    }

    /// The configured FPS target
    pub fn target_fps(&self) -> f32 {
        self.target_fps
    }

    /// Whether the controller mutates settings adaptively
    pub fn is_auto(&self) -> bool {
        self.auto
    }

    /// Replace the settings with a preset position and stop/start adapting
    pub fn set_preset(&mut self, preset: QualityPreset) {
        self.settings = preset.settings();
        self.rung = preset.rung();
        self.auto = preset == QualityPreset::Auto;
        self.stability = 0;
        self.fire_change();
    }

    /// Register the mutation callback
    pub fn on_change(&mut self, callback: QualityChangeFn) {
        self.on_change = Some(callback);
    }

    /// Average of the FPS ring, or the target when nothing is measured yet
    pub fn average_fps(&self) -> f32 {
        if self.ring_len == 0 {
            return self.target_fps;
        }
        self.ring[..self.ring_len].iter().sum::<f32>() / self.ring_len as f32
    }

    /// Account one rendered frame. Call once per frame from the main
    /// stream, between frames; evaluation happens at the fixed cadence.
    pub fn frame_tick(&mut self, dt: f32) {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < EVAL_INTERVAL {
            return;
        }

        let measured = self.frames as f32 / self.elapsed;
        self.frames = 0;
        self.elapsed = 0.0;

        self.ring[self.ring_pos] = measured;
        self.ring_pos = (self.ring_pos + 1) % RING_SIZE;
        self.ring_len = (self.ring_len + 1).min(RING_SIZE);

        if self.auto {
            self.evaluate();
        }
    }

    fn evaluate(&mut self) {
        let ratio = self.average_fps() / self.target_fps;
        if ratio < RATIO_LOW {
            self.stability -= 1;
            if self.stability < STABILITY_DOWN {
                self.step_down();
                self.stability = 0;
            }
        } else if ratio > RATIO_HIGH {
            self.stability += 1;
            if self.stability > STABILITY_UP {
                self.step_up();
                self.stability = 0;
            }
        } else {
            self.stability = 0;
        }
    }

    fn step_down(&mut self) {
        if self.rung >= DECREASE_LADDER.len() {
            return;
        }
        let step = DECREASE_LADDER[self.rung];
        step.apply_decrease(&mut self.settings);
        self.rung += 1;
        log::info!("quality step down: {step:?} (rung {})", self.rung);
        self.fire_change();
    }

    fn step_up(&mut self) {
        if self.rung == 0 {
            return;
        }
        self.rung -= 1;
        let step = DECREASE_LADDER[self.rung];
        step.apply_increase(&mut self.settings);
        log::info!("quality step up: undo {step:?} (rung {})", self.rung);
        self.fire_change();
    }

    fn fire_change(&mut self) {
        if let Some(callback) = &mut self.on_change {
            callback(&self.settings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Drive the controller as if rendering at a fixed FPS for a duration
    fn run_at_fps(manager: &mut QualityManager, fps: f32, seconds: f32) {
        let dt = 1.0 / fps;
        let frames = (seconds * fps) as usize;
        for _ in 0..frames {
            manager.frame_tick(dt);
        }
    }

    #[test]
    fn presets_sit_on_the_ladder() {
        let ultra = QualityPreset::Ultra.settings();
        assert!(ultra.ambient_occlusion && ultra.shadows);

        let high = QualityPreset::High.settings();
        assert!(!high.ambient_occlusion);
        assert!(high.soft_shadows);

        let medium = QualityPreset::Medium.settings();
        assert!(!medium.ambient_occlusion && !medium.soft_shadows && !medium.bloom);

        let low = QualityPreset::Low.settings();
        assert!(!low.bloom);
        assert!(low.shadows, "Low still renders hard shadows");
        assert!(low.lod_bias > 1.0);
        assert_eq!(low.shadow_map_size, 2048);
    }

    #[test]
    fn sustained_low_fps_steps_quality_down_within_ten_evaluations() {
        let mut manager = QualityManager::new(60.0, QualityPreset::Auto);
        let before = *manager.settings();

        // 10 evaluations = 5 seconds of wall time at the 0.5 s cadence.
        run_at_fps(&mut manager, 30.0, 5.0);

        assert_ne!(*manager.settings(), before, "no down step was applied");
        assert!(!manager.settings().soft_shadows || !manager.settings().bloom);
    }

    #[test]
    fn sustained_high_fps_steps_quality_up_within_ten_evaluations() {
        let mut manager = QualityManager::new(60.0, QualityPreset::Auto);

        // Auto starts one rung below maximum, so there is headroom to climb.
        run_at_fps(&mut manager, 80.0, 5.0);

        assert!(
            manager.settings().ambient_occlusion,
            "the one available up step should have been applied"
        );
    }

    #[test]
    fn fps_near_target_leaves_settings_alone() {
        let mut manager = QualityManager::new(60.0, QualityPreset::Auto);
        let before = *manager.settings();
        run_at_fps(&mut manager, 60.0, 10.0);
        assert_eq!(*manager.settings(), before);
    }

    #[test]
    fn non_auto_presets_never_adapt() {
        let mut manager = QualityManager::new(60.0, QualityPreset::Medium);
        let before = *manager.settings();
        run_at_fps(&mut manager, 15.0, 10.0);
        assert_eq!(*manager.settings(), before);
    }

    #[test]
    fn change_callback_fires_per_mutation() {
        let fired = Rc::new(Cell::new(0));
        let observed = fired.clone();
        let mut manager = QualityManager::new(60.0, QualityPreset::Auto);
        manager.on_change(Box::new(move |_| observed.set(observed.get() + 1)));

        run_at_fps(&mut manager, 20.0, 10.0);
        assert!(fired.get() >= 2, "expected repeated down steps, saw {}", fired.get());
    }

    #[test]
    fn ladder_round_trip_restores_settings() {
        let mut settings = QualitySettings::maximum();
        for step in DECREASE_LADDER {
            step.apply_decrease(&mut settings);
        }
        assert!(!settings.shadows);
        for step in DECREASE_LADDER.iter().rev() {
            step.apply_increase(&mut settings);
        }
        assert_eq!(settings, QualitySettings::maximum());
    }

    #[test]
    fn settings_round_trip_through_ron() {
        let settings = QualityPreset::Medium.settings();
        let text = settings.to_ron_string().unwrap();
        let parsed = QualitySettings::from_ron_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
