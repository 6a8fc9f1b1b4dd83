//! Core engine: subsystem owner and frame-driven state machine
//!
//! The engine owns the graphics facade, the audio configuration, the
//! navigation pose and lens, the adaptive quality controller, and input
//! state. It never owns a window or an audio device: the host hands it a
//! graphics backend, drives `tick` from its frame scheduler, and pulls
//! audio quanta through `process_audio`.
//!
//! State machine: *uncreated* → `start` → *running* → `stop` → *stopped*.
//! A failed `start` leaves the engine uncreated. Ticks outside *running*
//! are no-ops.

use serde::Deserialize;
use thiserror::Error;

use crate::application::{AppEvent, Application};
use crate::audio::{AudioConfig, AudioError, AudioIoData};
use crate::foundation::pose::{Lens, Pose, Viewpoint};
use crate::graphics::{AutoLod, Graphics, GraphicsBackend, RenderError, Viewport};
use crate::input::InputState;
use crate::lod::{QualityManager, QualityPreset, QualitySettings};

/// Lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Built but never started
    Uncreated,
    /// Ticking
    Running,
    /// Stopped after running
    Stopped,
}

/// Drawable surface configuration.
///
/// The host owns the actual window or canvas; these values size the
/// default viewport and projection until the first resize event.
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    /// Title, where the host surfaces one
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            title: "av_engine application".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Drawable surface geometry
    pub surface: SurfaceConfig,
    /// Audio configuration (may be replaced via `configure_audio` before
    /// start)
    pub audio: AudioConfigDocument,
    /// Quality preset the adaptive controller is seeded from
    pub quality: QualityPreset,
    /// Frame-rate target for the adaptive controller
    pub target_fps: f32,
}

/// Serde-friendly mirror of [`AudioConfig`]
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AudioConfigDocument {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Frames per quantum
    pub quantum_frames: u32,
    /// Output channels (0 disables audio)
    pub channels_out: u32,
    /// Input channels
    pub channels_in: u32,
}

impl Default for AudioConfigDocument {
    fn default() -> Self {
        let c = AudioConfig::default();
        Self {
            sample_rate: c.sample_rate,
            quantum_frames: c.quantum_frames,
            channels_out: c.channels_out,
            channels_in: c.channels_in,
        }
    }
}

impl From<AudioConfigDocument> for AudioConfig {
    fn from(d: AudioConfigDocument) -> Self {
        Self {
            sample_rate: d.sample_rate,
            quantum_frames: d.quantum_frames,
            channels_out: d.channels_out,
            channels_in: d.channels_in,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            audio: AudioConfigDocument::default(),
            quality: QualityPreset::Auto,
            target_fps: 60.0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document in TOML
    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization failed; the engine stays uncreated
    #[error("engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Rendering error surfaced from a frame
    #[error("rendering error: {0}")]
    Render(#[from] RenderError),

    /// Audio-path error
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    /// Application callback error
    #[error("application error: {0}")]
    Application(String),

    /// Configuration document error
    #[error("configuration error: {0}")]
    Config(String),
}

/// The engine: owner of all runtime subsystems
pub struct Engine {
    graphics: Graphics,
    audio: AudioConfig,
    nav: Pose,
    lens: Lens,
    quality: QualityManager,
    input: InputState,
    state: EngineState,
    width: u32,
    height: u32,
    target_fps: f32,
    last_tick: Option<f64>,
}

impl Engine {
    /// Build an engine over a host-provided graphics backend.
    ///
    /// Nothing fallible happens here; driver initialization is deferred to
    /// [`Engine::start`].
    pub fn new(config: &EngineConfig, backend: Box<dyn GraphicsBackend>) -> Self {
        Self {
            graphics: Graphics::new(backend),
            audio: config.audio.into(),
            nav: Pose::default(),
            lens: Lens::default(),
            quality: QualityManager::new(config.target_fps.max(1.0), config.quality),
            input: InputState::new(),
            state: EngineState::Uncreated,
            width: config.surface.width,
            height: config.surface.height,
            target_fps: config.target_fps,
            last_tick: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Replace the audio configuration. Must happen before `start`;
    /// afterwards the change is ignored with a warning.
    pub fn configure_audio(&mut self, config: AudioConfig) {
        if self.state == EngineState::Running {
            log::warn!("configure_audio ignored while running");
            return;
        }
        self.audio = config;
    }

    /// The active audio configuration
    pub fn audio_config(&self) -> AudioConfig {
        self.audio
    }

    /// Initialize subsystems and transition to running.
    ///
    /// On failure the engine is left uncreated and the error describes the
    /// subsystem that refused.
    pub fn start(&mut self, app: &mut dyn Application) -> Result<(), EngineError> {
        if self.state == EngineState::Running {
            return Ok(());
        }

        self.graphics
            .init()
            .map_err(|e| EngineError::InitializationFailed(format!("graphics: {e}")))?;

        if self.audio.enabled() {
            log::info!(
                "audio configured: {} Hz, {} out / {} in, quantum {}",
                self.audio.sample_rate,
                self.audio.channels_out,
                self.audio.channels_in,
                self.audio.quantum_frames
            );
        } else {
            log::info!("audio disabled (no output channels)");
        }

        app.on_create(self)
            .map_err(|e| EngineError::Application(format!("on_create: {e}")))?;

        self.apply_quality();
        self.state = EngineState::Running;
        self.last_tick = None;
        log::info!("engine running");
        Ok(())
    }

    /// Run one frame at the host-supplied timestamp (seconds).
    ///
    /// Computes dt, applies any pending quality mutation (always between
    /// frames), animates, draws, and verifies stack balance. A no-op
    /// outside the running state.
    pub fn tick(&mut self, app: &mut dyn Application, now_seconds: f64) -> Result<(), EngineError> {
        if self.state != EngineState::Running {
            return Ok(());
        }

        let dt = match self.last_tick {
            Some(previous) => (now_seconds - previous).max(0.0),
            None => 1.0 / f64::from(self.target_fps.max(1.0)),
        };
        self.last_tick = Some(now_seconds);

        self.quality.frame_tick(dt as f32);
        self.apply_quality();

        app.on_animate(self, dt);

        let viewpoint = Viewpoint::new(self.nav, self.lens);
        let viewport = Viewport::new(0, 0, self.width as i32, self.height as i32);
        let view = viewpoint.view_matrix();
        let projection = viewpoint.projection(viewport.aspect());
        self.graphics.begin_frame(viewport, view, projection);

        app.on_draw(&mut self.graphics);

        self.graphics.end_frame()?;
        Ok(())
    }

    /// Transition to stopped: notify the application and release graphics
    /// resources. The host drains at most one in-flight audio quantum
    /// before unregistering the audio callback.
    pub fn stop(&mut self, app: &mut dyn Application) {
        if self.state != EngineState::Running {
            return;
        }
        app.on_exit(self);
        self.graphics.release();
        self.state = EngineState::Stopped;
        log::info!("engine stopped");
    }

    /// Fill one interleaved audio quantum.
    ///
    /// The buffer is zeroed first, so the application's additive mixing
    /// starts from silence and untouched frames stay silent. Callable from
    /// any host: the wasm export, the rodio adapter, or a test.
    pub fn process_audio(
        &mut self,
        app: &mut dyn Application,
        out: &mut [f32],
        frames: usize,
        channels: usize,
    ) -> Result<(), EngineError> {
        if out.len() != frames * channels {
            return Err(EngineError::Audio(AudioError::BufferShape(format!(
                "{} samples for {frames} frames x {channels} channels",
                out.len()
            ))));
        }
        out.fill(0.0);
        if !self.audio.enabled() || self.state != EngineState::Running {
            return Ok(());
        }
        let mut io = AudioIoData::new(out, &[], channels, 0, f64::from(self.audio.sample_rate));
        app.on_sound(&mut io);
        Ok(())
    }

    /// Route a host event to the application, tracking input state and
    /// synthesizing drags. Returns the application's handled flag.
    pub fn handle_event(&mut self, app: &mut dyn Application, event: AppEvent) -> bool {
        match event {
            AppEvent::KeyDown(key) => {
                self.input.set_key(key.code, true);
                app.on_key_down(self, key)
            }
            AppEvent::KeyUp(key) => {
                self.input.set_key(key.code, false);
                app.on_key_up(self, key)
            }
            AppEvent::MouseDown(mouse) => {
                if let Some(button) = mouse.button {
                    self.input.set_button(button, true);
                }
                self.input.set_pointer(mouse.x, mouse.y);
                app.on_mouse_down(self, mouse)
            }
            AppEvent::MouseUp(mouse) => {
                if let Some(button) = mouse.button {
                    self.input.set_button(button, false);
                }
                self.input.set_pointer(mouse.x, mouse.y);
                app.on_mouse_up(self, mouse)
            }
            AppEvent::MouseMove(mouse) => {
                self.input.set_pointer(mouse.x, mouse.y);
                if self.input.dragging() {
                    app.on_mouse_drag(self, mouse)
                } else {
                    app.on_mouse_move(self, mouse)
                }
            }
            AppEvent::MouseScroll(mouse) => app.on_mouse_scroll(self, mouse),
            AppEvent::Resized { width, height } => {
                self.width = width;
                self.height = height;
                app.on_resize(self, width, height);
                true
            }
        }
    }

    /// Drive the engine from its own loop at roughly the target FPS.
    ///
    /// For native hosts that have no frame scheduler of their own (demos,
    /// headless rendering). Hosts that own a real-time loop should call
    /// [`Engine::tick`] themselves.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run(
        &mut self,
        app: &mut dyn Application,
        duration_seconds: Option<f64>,
    ) -> Result<(), EngineError> {
        use crate::foundation::time::Timer;

        self.start(app)?;
        let mut timer = Timer::new();
        let frame_budget = 1.0 / f64::from(self.target_fps.max(1.0));

        while self.state == EngineState::Running {
            timer.update();
            let now = f64::from(timer.total_time());
            self.tick(app, now)?;
            if let Some(limit) = duration_seconds {
                if now >= limit {
                    break;
                }
            }
            std::thread::sleep(std::time::Duration::from_secs_f64(frame_budget));
        }
        self.stop(app);
        Ok(())
    }

    // --- Subsystem access ---

    /// The graphics facade
    pub fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    /// Mutable graphics facade (resource creation outside `on_draw`)
    pub fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.graphics
    }

    /// The navigation pose (the camera the engine renders from)
    pub fn nav(&self) -> Pose {
        self.nav
    }

    /// Mutable navigation pose
    pub fn nav_mut(&mut self) -> &mut Pose {
        &mut self.nav
    }

    /// The lens used for the projection
    pub fn lens(&self) -> Lens {
        self.lens
    }

    /// Mutable lens
    pub fn lens_mut(&mut self) -> &mut Lens {
        &mut self.lens
    }

    /// Tracked input state
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// The adaptive quality controller
    pub fn quality(&self) -> &QualityManager {
        &self.quality
    }

    /// Mutable quality controller (presets, change callback)
    pub fn quality_mut(&mut self) -> &mut QualityManager {
        &mut self.quality
    }

    /// Current drawable size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn apply_quality(&mut self) {
        let settings: &QualitySettings = self.quality.settings();
        self.graphics.set_auto_lod(AutoLod {
            enabled: true,
            bias: settings.lod_bias,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppError;
    use crate::graphics::backends::headless::HeadlessBackend;
    use crate::input::{Key, KeyCode};

    #[derive(Default)]
    struct ProbeApp {
        created: usize,
        animated: usize,
        drawn: usize,
        exited: usize,
        sounded: usize,
        unbalanced_draw: bool,
        handle_keys: bool,
    }

    impl Application for ProbeApp {
        fn on_create(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
            self.created += 1;
            Ok(())
        }

        fn on_animate(&mut self, _engine: &mut Engine, _dt: f64) {
            self.animated += 1;
        }

        fn on_draw(&mut self, g: &mut Graphics) {
            self.drawn += 1;
            g.push_matrix();
            if !self.unbalanced_draw {
                g.pop_matrix();
            }
        }

        fn on_sound(&mut self, io: &mut AudioIoData) {
            self.sounded += 1;
            // Touch only the first half of the quantum.
            let half = io.frames() / 2;
            while io.advance() {
                if io.frame() < half {
                    *io.out(0) += 0.25;
                }
            }
        }

        fn on_exit(&mut self, _engine: &mut Engine) {
            self.exited += 1;
        }

        fn on_key_down(&mut self, _engine: &mut Engine, _key: Key) -> bool {
            self.handle_keys
        }
    }

    fn engine() -> Engine {
        Engine::new(&EngineConfig::default(), Box::new(HeadlessBackend::new()))
    }

    #[test]
    fn lifecycle_runs_create_animate_draw_exit() {
        let mut engine = engine();
        let mut app = ProbeApp::default();
        assert_eq!(engine.state(), EngineState::Uncreated);

        engine.start(&mut app).unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(app.created, 1);

        engine.tick(&mut app, 0.016).unwrap();
        engine.tick(&mut app, 0.032).unwrap();
        assert_eq!(app.animated, 2);
        assert_eq!(app.drawn, 2);

        engine.stop(&mut app);
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(app.exited, 1);
    }

    #[test]
    fn ticks_outside_running_are_no_ops() {
        let mut engine = engine();
        let mut app = ProbeApp::default();
        engine.tick(&mut app, 0.0).unwrap();
        assert_eq!(app.drawn, 0);

        engine.start(&mut app).unwrap();
        engine.stop(&mut app);
        engine.tick(&mut app, 1.0).unwrap();
        assert_eq!(app.drawn, 0);
    }

    #[test]
    fn failed_start_leaves_the_engine_uncreated() {
        let mut backend = HeadlessBackend::new();
        backend.fail_init = true;
        let mut engine = Engine::new(&EngineConfig::default(), Box::new(backend));
        let mut app = ProbeApp::default();

        let result = engine.start(&mut app);
        assert!(matches!(result, Err(EngineError::InitializationFailed(_))));
        assert_eq!(engine.state(), EngineState::Uncreated);
        assert_eq!(app.created, 0);
    }

    #[test]
    fn unbalanced_draw_surfaces_as_a_tick_error() {
        let mut engine = engine();
        let mut app = ProbeApp {
            unbalanced_draw: true,
            ..Default::default()
        };
        engine.start(&mut app).unwrap();
        let result = engine.tick(&mut app, 0.016);
        assert!(matches!(
            result,
            Err(EngineError::Render(RenderError::UnbalancedStack(_)))
        ));
    }

    #[test]
    fn audio_buffer_is_zeroed_before_the_callback() {
        let mut engine = engine();
        let mut app = ProbeApp::default();
        engine.start(&mut app).unwrap();

        // Garbage from a previous quantum.
        let mut buffer = vec![7.7f32; 128 * 2];
        engine
            .process_audio(&mut app, &mut buffer, 128, 2)
            .unwrap();
        assert_eq!(app.sounded, 1);

        // The first half of channel 0 carries the app's mix; everything
        // the app never touched is zero, not stale garbage.
        assert!(buffer[0] > 0.0);
        assert_eq!(buffer[1], 0.0);
        let second_half = &buffer[128..];
        assert!(second_half.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn audio_shape_mismatch_is_an_error() {
        let mut engine = engine();
        let mut app = ProbeApp::default();
        engine.start(&mut app).unwrap();
        let mut buffer = vec![0.0f32; 100];
        assert!(engine
            .process_audio(&mut app, &mut buffer, 128, 2)
            .is_err());
    }

    #[test]
    fn events_route_and_report_handled_flags() {
        let mut engine = engine();
        let mut app = ProbeApp {
            handle_keys: true,
            ..Default::default()
        };
        engine.start(&mut app).unwrap();

        let handled = engine.handle_event(
            &mut app,
            AppEvent::KeyDown(Key::new(KeyCode::Space)),
        );
        assert!(handled);
        assert!(engine.input().key_held(KeyCode::Space));

        app.handle_keys = false;
        let handled = engine.handle_event(&mut app, AppEvent::KeyUp(Key::new(KeyCode::Space)));
        assert!(!handled);
        assert!(!engine.input().key_held(KeyCode::Space));
    }

    #[test]
    fn resize_updates_the_surface_size() {
        let mut engine = engine();
        let mut app = ProbeApp::default();
        engine.start(&mut app).unwrap();
        engine.handle_event(
            &mut app,
            AppEvent::Resized {
                width: 800,
                height: 600,
            },
        );
        assert_eq!(engine.size(), (800, 600));
    }

    #[test]
    fn config_parses_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            target_fps = 90.0

            [surface]
            title = "demo"
            width = 640
            height = 360

            [audio]
            sample_rate = 48000
            quantum_frames = 256
            channels_out = 2
            channels_in = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.surface.width, 640);
        assert_eq!(config.audio.sample_rate, 48_000);
        assert!((config.target_fps - 90.0).abs() < f32::EPSILON);
    }
}
