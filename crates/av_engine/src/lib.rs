//! # av_engine
//!
//! A graphics and audio application runtime that drives one application
//! source, unmodified, on two stacks: native OpenGL with a pull-model
//! audio host, or browser WebGL2 with Web Audio.
//!
//! ## Features
//!
//! - **Application lifecycle**: create/animate/draw/sound/input callbacks
//!   driven by a native loop or the browser's frame scheduler
//! - **Graphics bridge**: matrix stacks, shader programs, textures,
//!   framebuffers, blend/depth state over a routed backend, with explicit
//!   handling of WebGL2's missing pieces (point size, wireframe, float
//!   render targets)
//! - **Audio bridge**: per-sample quantum cursor over host-provided
//!   interleaved buffers, zeroed before every callback
//! - **Voice pool and spatial scene**: fixed-capacity polyphony with
//!   trigger/release semantics and listener-relative panning
//! - **Level of detail**: quadric-error-metric simplification, distance
//!   pyramids, and an FPS-adaptive quality ladder
//!
//! ## Quick start
//!
//! ```no_run
//! use av_engine::prelude::*;
//! use av_engine::graphics::backends::headless::HeadlessBackend;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn on_draw(&mut self, g: &mut Graphics) {
//!         g.clear(0.1, 0.1, 0.2);
//!     }
//! }
//!
//! fn main() -> Result<(), EngineError> {
//!     av_engine::foundation::logging::init();
//!     let config = EngineConfig::default();
//!     let mut engine = Engine::new(&config, Box::new(HeadlessBackend::new()));
//!     let mut app = MyApp;
//!     engine.run(&mut app, Some(5.0))
//! }
//! ```
//!
//! On the browser path, register the application with
//! `web::set_app_factory` and let the host glue drive the exported entry
//! points instead.
//!
//! ## The two-stream contract
//!
//! Exactly two execution streams exist. The main stream runs create,
//! animate, draw, and input callbacks and owns the graphics context. The
//! audio stream runs only the sound callback, once per quantum, and must
//! never block, allocate, or touch graphics. The voice pool is the one
//! structure both streams touch: triggers publish on the main stream,
//! voices release on the audio stream, and reclamation is deferred to
//! quantum boundaries.

pub mod assets;
pub mod audio;
pub mod foundation;
pub mod graphics;
pub mod input;
pub mod lod;
pub mod osc;
pub mod synth;

mod application;
mod engine;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use application::{AppError, AppEvent, Application};
pub use engine::{Engine, EngineConfig, EngineError, EngineState, SurfaceConfig};

/// Common imports for engine users
pub mod prelude {
    pub use crate::application::{AppError, AppEvent, Application};
    pub use crate::audio::{AudioConfig, AudioIoData, StereoPanner};
    pub use crate::engine::{Engine, EngineConfig, EngineError, EngineState};
    pub use crate::foundation::{
        color::Color,
        math::{Mat4, Mat4Ext, Quat, Vec3},
        pose::{Lens, Pose, Viewpoint},
    };
    pub use crate::graphics::{
        BlendMode, Graphics, Light, Material, Mesh, Primitive, RenderError, Texture,
        TextureDescriptor,
    };
    pub use crate::input::{Key, KeyCode, Mouse, MouseButton};
    pub use crate::lod::{LodMesh, QualityManager, QualityPreset, QualitySettings};
    pub use crate::synth::{DynamicScene, PolySynth, PositionedVoice, Voice, VoiceSlot};
}
