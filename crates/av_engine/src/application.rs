//! Application trait and lifecycle callbacks
//!
//! Implement this trait to build an audiovisual application on the
//! runtime. The engine drives the callbacks from whichever loop the host
//! provides: a native main loop or the browser's frame scheduler. Audio
//! callbacks arrive on the audio stream, asynchronously with respect to
//! drawing; the crate docs describe the two-stream contract.

use thiserror::Error;

use crate::audio::AudioIoData;
use crate::engine::{Engine, EngineError};
use crate::graphics::Graphics;
use crate::input::{Key, Mouse};

/// Application lifecycle trait
///
/// Every callback has a default implementation, so an application
/// overrides only what it uses. Input callbacks return a handled flag;
/// returning false lets the host route the event elsewhere.
pub trait Application {
    /// Called once after graphics and audio are initialized.
    ///
    /// Build meshes, compile shaders, and allocate voice pools here.
    fn on_create(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
        Ok(())
    }

    /// Called every frame before drawing with the elapsed time in seconds
    fn on_animate(&mut self, _engine: &mut Engine, _dt: f64) {}

    /// Called every frame to issue draw commands.
    ///
    /// Matrix, camera, viewport, and framebuffer pushes must be matched by
    /// pops before this returns; an unbalanced frame is a fatal error.
    fn on_draw(&mut self, _g: &mut Graphics) {}

    /// Called once per audio quantum on the audio stream.
    ///
    /// The buffer arrives zeroed; mix with `+=`. Must be real-time safe:
    /// no allocation, no blocking, no graphics access.
    fn on_sound(&mut self, _io: &mut AudioIoData) {}

    /// Called once when the engine stops
    fn on_exit(&mut self, _engine: &mut Engine) {}

    /// A key was pressed
    fn on_key_down(&mut self, _engine: &mut Engine, _key: Key) -> bool {
        false
    }

    /// A key was released
    fn on_key_up(&mut self, _engine: &mut Engine, _key: Key) -> bool {
        false
    }

    /// A mouse button was pressed
    fn on_mouse_down(&mut self, _engine: &mut Engine, _mouse: Mouse) -> bool {
        false
    }

    /// A mouse button was released
    fn on_mouse_up(&mut self, _engine: &mut Engine, _mouse: Mouse) -> bool {
        false
    }

    /// The pointer moved with no button held
    fn on_mouse_move(&mut self, _engine: &mut Engine, _mouse: Mouse) -> bool {
        false
    }

    /// The pointer moved with a button held
    fn on_mouse_drag(&mut self, _engine: &mut Engine, _mouse: Mouse) -> bool {
        false
    }

    /// The scroll wheel moved
    fn on_mouse_scroll(&mut self, _engine: &mut Engine, _mouse: Mouse) -> bool {
        false
    }

    /// The drawable surface was resized
    fn on_resize(&mut self, _engine: &mut Engine, _width: u32, _height: u32) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Custom application error
    #[error("application error: {0}")]
    Custom(String),

    /// Asset loading error
    #[error("asset error: {0}")]
    Asset(String),
}

/// Host events routed through the engine's event pipeline
#[derive(Debug, Clone, Copy)]
pub enum AppEvent {
    /// Key was pressed
    KeyDown(Key),

    /// Key was released
    KeyUp(Key),

    /// Mouse button was pressed
    MouseDown(Mouse),

    /// Mouse button was released
    MouseUp(Mouse),

    /// Pointer moved; the engine turns this into a drag while a button is
    /// held
    MouseMove(Mouse),

    /// Scroll wheel moved
    MouseScroll(Mouse),

    /// Drawable surface was resized
    Resized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
}
