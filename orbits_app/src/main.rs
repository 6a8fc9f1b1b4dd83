//! Orbits demo
//!
//! A small audiovisual scene exercising the runtime end to end on the
//! native path: a polyphonic scene of decaying sine "pings" orbiting the
//! listener, each with a level-of-detail sphere as its visual body. Runs
//! headless by default; build with `--features audio` to hear the scene
//! through the default output device.

use rand::Rng;

use av_engine::graphics::backends::headless::HeadlessBackend;
use av_engine::graphics::shapes;
use av_engine::prelude::*;
use av_engine::AppError;

const ORBIT_RADIUS: f32 = 6.0;
const PING_INTERVAL: f64 = 0.35;
const RUN_SECONDS: f64 = 12.0;

/// A decaying sine tone with a spatial position and a small sphere body
struct PingVoice {
    pose: Pose,
    frequency: f32,
    phase: f32,
    envelope: f32,
    decay_per_sample: f32,
    hue: f32,
    body: Mesh,
}

impl Default for PingVoice {
    fn default() -> Self {
        Self {
            pose: Pose::default(),
            frequency: 440.0,
            phase: 0.0,
            envelope: 0.0,
            decay_per_sample: 0.9999,
            hue: 0.0,
            body: shapes::icosphere(1.0, 1),
        }
    }
}

impl Voice for PingVoice {
    fn on_trigger_on(&mut self) {
        self.phase = 0.0;
        self.envelope = 1.0;
    }

    fn on_process_audio(&mut self, io: &mut AudioIoData) {
        let step = self.frequency / io.frames_per_second() as f32;
        while io.advance() {
            let sample = (self.phase * std::f32::consts::TAU).sin() * self.envelope * 0.2;
            self.phase = (self.phase + step).fract();
            self.envelope *= self.decay_per_sample;
            for channel in 0..io.channels_out() {
                *io.out(channel) += sample;
            }
        }
    }

    fn on_process_graphics(&mut self, g: &mut Graphics) {
        let p = self.pose.position;
        let s = 0.2 + self.envelope * 0.5;
        g.with_matrix(|g| {
            g.translate(p.x, p.y, p.z);
            g.scale(s, s, s);
            g.color(Color::from_hsv(self.hue, 0.7, 0.9));
            if let Err(e) = g.draw(&self.body) {
                log::warn!("voice draw: {e}");
            }
        });
    }

    fn finished(&self) -> bool {
        self.envelope < 1.0e-4
    }
}

impl PositionedVoice for PingVoice {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn pose_mut(&mut self) -> &mut Pose {
        &mut self.pose
    }
}

struct OrbitsApp {
    scene: DynamicScene<PingVoice>,
    sphere_lod: LodMesh,
    clock: f64,
    next_ping: f64,
    next_id: u64,
}

impl OrbitsApp {
    fn new() -> Self {
        Self {
            scene: DynamicScene::new(16),
            sphere_lod: LodMesh::new(),
            clock: 0.0,
            next_ping: 0.0,
            next_id: 0,
        }
    }

    fn trigger_ping(&mut self) {
        let Some(slot) = self.scene.get_voice() else {
            return; // polyphony exhausted; skip this ping
        };
        let mut rng = rand::thread_rng();
        let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        let pitch_steps: i32 = rng.gen_range(0..5);

        let voice = self.scene.synth_mut().voice_mut(&slot);
        voice.pose_mut().position =
            Vec3::new(angle.cos() * ORBIT_RADIUS, 0.0, angle.sin() * ORBIT_RADIUS);
        // Minor pentatonic over A3.
        let semitones = [0, 3, 5, 7, 10][pitch_steps as usize];
        voice.frequency = 220.0 * (2.0f32).powf(semitones as f32 / 12.0);
        voice.hue = angle / std::f32::consts::TAU;

        let id = self.next_id;
        self.next_id += 1;
        self.scene.synth_mut().trigger_on(slot, 0, id);
    }
}

impl Application for OrbitsApp {
    fn on_create(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let sphere = shapes::icosphere(1.0, 3);
        self.sphere_lod = LodMesh::generate(sphere, 4, 0.5)
            .map_err(|e| AppError::Custom(format!("lod pyramid: {e}")))?;

        let audio = engine.audio_config();
        self.scene.attenuation.near_clip = 1.0;
        self.scene.attenuation.far_clip = 40.0;
        self.scene
            .prepare(audio.quantum_frames as usize, audio.channels_out as usize);

        engine.nav_mut().position = Vec3::new(0.0, 2.0, 10.0);
        log::info!(
            "orbits demo ready: {} LOD levels",
            self.sphere_lod.levels().len()
        );
        Ok(())
    }

    fn on_animate(&mut self, _engine: &mut Engine, dt: f64) {
        self.clock += dt;
        while self.clock >= self.next_ping {
            self.trigger_ping();
            self.next_ping += PING_INTERVAL;
        }
        self.scene.update(dt);
    }

    fn on_draw(&mut self, g: &mut Graphics) {
        g.clear(0.05, 0.05, 0.1);
        g.depth_testing(true);
        g.lighting(true);
        g.light(0, Light::directional(Vec3::new(-0.5, -1.0, -0.3), [1.0, 1.0, 0.95]));

        // A ring of spheres at increasing distance shows the LOD pyramid
        // switching levels.
        for i in 0..6 {
            g.with_matrix(|g| {
                g.translate(i as f32 * 4.0 - 10.0, 0.0, -(i as f32) * 8.0);
                if let Err(e) = g.draw_lod(&self.sphere_lod) {
                    log::warn!("draw_lod: {e}");
                }
            });
        }

        g.lighting(false);
        self.scene.render_graphics(g);
    }

    fn on_sound(&mut self, io: &mut AudioIoData) {
        self.scene.render_audio(io);
    }

    fn on_key_down(&mut self, _engine: &mut Engine, key: Key) -> bool {
        if key.code == KeyCode::Space {
            self.trigger_ping();
            return true;
        }
        false
    }
}

#[cfg(feature = "audio")]
fn run_with_audio(config: EngineConfig) -> Result<(), EngineError> {
    use av_engine::audio::backend::{rodio_backend::RodioBackend, AudioBackend};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    // The engine (and its graphics context) stays on the main thread; only
    // the application crosses to the device thread, serialized with the
    // main loop at quantum granularity through the shared lock.
    let mut engine = Engine::new(&config, Box::new(HeadlessBackend::new()));
    let app = Arc::new(Mutex::new(OrbitsApp::new()));

    engine.start(&mut *app.lock().expect("unpoisoned"))?;

    let audio_config = engine.audio_config();
    let sample_rate = f64::from(audio_config.sample_rate);
    let mut backend = RodioBackend::new();
    let audio_app = Arc::clone(&app);
    backend.initialize(
        &audio_config,
        Box::new(move |out, _frames, channels| {
            let mut io = AudioIoData::new(out, &[], channels, 0, sample_rate);
            audio_app.lock().expect("unpoisoned").on_sound(&mut io);
        }),
    )?;

    let started = Instant::now();
    while started.elapsed().as_secs_f64() < RUN_SECONDS {
        let now = started.elapsed().as_secs_f64();
        engine.tick(&mut *app.lock().expect("unpoisoned"), now)?;
        std::thread::sleep(std::time::Duration::from_millis(16));
    }

    backend.shutdown();
    engine.stop(&mut *app.lock().expect("unpoisoned"));
    Ok(())
}

#[cfg(not(feature = "audio"))]
fn run_silent(config: EngineConfig) -> Result<(), EngineError> {
    let mut engine = Engine::new(&config, Box::new(HeadlessBackend::new()));
    let mut app = OrbitsApp::new();
    engine.run(&mut app, Some(RUN_SECONDS))
}

fn main() -> Result<(), EngineError> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = EngineConfig::default();

    #[cfg(feature = "audio")]
    return run_with_audio(config);

    #[cfg(not(feature = "audio"))]
    run_silent(config)
}
