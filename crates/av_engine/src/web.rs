//! Browser entry points
//!
//! The host-side JavaScript owns the canvas, the audio worklet, and the
//! frame scheduler; this module is the complete boundary it talks to. The
//! application type is registered once with [`set_app_factory`] (from the
//! crate's `#[wasm_bindgen(start)]` hook or the app crate's), after which
//! the host drives the singleton through the exported entry points:
//!
//! 1. `create(canvas_id)`: build the application singleton over the
//!    canvas's WebGL2 context
//! 2. `report_capability` / `report_limit` / `report_driver_info`: once
//!    per detected feature, before any draw
//! 3. `configure_audio`: before start
//! 4. `start`, then `frame(now_ms)` per animation frame
//! 5. `process_audio_buffer(ptr, frames, channels)` once per worklet
//!    quantum (allocate the shared buffer with `alloc_audio_buffer`)
//! 6. `stop`, `destroy`

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::application::{AppEvent, Application};
use crate::audio::AudioConfig;
use crate::engine::{Engine, EngineConfig};
use crate::foundation::logging;
use crate::graphics::backends::gl::GlBackend;
use crate::input::{Key, KeyCode, Mouse, MouseButton};

type AppFactory = Box<dyn Fn() -> Box<dyn Application>>;

struct WebRuntime {
    engine: Engine,
    app: Box<dyn Application>,
    audio_buffer: Vec<f32>,
}

thread_local! {
    static FACTORY: RefCell<Option<AppFactory>> = const { RefCell::new(None) };
    static RUNTIME: RefCell<Option<WebRuntime>> = const { RefCell::new(None) };
}

/// Register the application the entry points instantiate.
///
/// Call once before the host calls `create`, typically from a
/// `#[wasm_bindgen(start)]` function in the application crate.
pub fn set_app_factory<F>(factory: F)
where
    F: Fn() -> Box<dyn Application> + 'static,
{
    FACTORY.with(|f| *f.borrow_mut() = Some(Box::new(factory)));
}

fn with_runtime<R>(f: impl FnOnce(&mut WebRuntime) -> R) -> Option<R> {
    RUNTIME.with(|r| r.borrow_mut().as_mut().map(f))
}

/// Instantiate the application singleton over a canvas's WebGL2 context
#[wasm_bindgen]
pub fn create(canvas_id: &str) -> bool {
    logging::init();

    if FACTORY.with(|f| f.borrow().is_none()) {
        log::error!("create() before set_app_factory()");
        return false;
    }

    let context = match webgl2_context(canvas_id) {
        Ok(ctx) => ctx,
        Err(message) => {
            log::error!("cannot create graphics context: {message}");
            return false;
        }
    };
    let (width, height) = (context.1, context.2);
    let gl = glow::Context::from_webgl2_context(context.0);
    let backend = GlBackend::new(gl, true);

    let mut config = EngineConfig::default();
    config.surface.width = width;
    config.surface.height = height;

    let app = FACTORY.with(|f| f.borrow().as_ref().expect("checked above")());
    let engine = Engine::new(&config, Box::new(backend));

    RUNTIME.with(|r| {
        *r.borrow_mut() = Some(WebRuntime {
            engine,
            app,
            audio_buffer: Vec::new(),
        });
    });
    true
}

fn webgl2_context(
    canvas_id: &str,
) -> Result<(web_sys::WebGl2RenderingContext, u32, u32), String> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| format!("canvas '{canvas_id}' not found"))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| "element is not a canvas".to_string())?;
    let context = canvas
        .get_context("webgl2")
        .map_err(|_| "get_context failed".to_string())?
        .ok_or("webgl2 unsupported")?
        .dyn_into::<web_sys::WebGl2RenderingContext>()
        .map_err(|_| "context is not webgl2".to_string())?;
    Ok((context, canvas.width(), canvas.height()))
}

/// Transition the singleton to running. Returns false on failure; the
/// console carries the diagnostic.
#[wasm_bindgen]
pub fn start() -> bool {
    with_runtime(|rt| match rt.engine.start(rt.app.as_mut()) {
        Ok(()) => true,
        Err(e) => {
            log::error!("start failed: {e}");
            false
        }
    })
    .unwrap_or(false)
}

/// Transition the singleton to stopped
#[wasm_bindgen]
pub fn stop() {
    with_runtime(|rt| rt.engine.stop(rt.app.as_mut()));
}

/// Release the singleton entirely
#[wasm_bindgen]
pub fn destroy() {
    RUNTIME.with(|r| {
        if let Some(mut rt) = r.borrow_mut().take() {
            rt.engine.stop(rt.app.as_mut());
        }
    });
}

/// Run one frame; the host calls this from requestAnimationFrame with the
/// callback timestamp in milliseconds
#[wasm_bindgen]
pub fn frame(now_ms: f64) {
    with_runtime(|rt| {
        if let Err(e) = rt.engine.tick(rt.app.as_mut(), now_ms / 1000.0) {
            log::error!("frame error: {e}");
        }
    });
}

/// Set the audio configuration; must precede `start`
#[wasm_bindgen]
pub fn configure_audio(sample_rate: u32, quantum_frames: u32, channels_out: u32, channels_in: u32) {
    with_runtime(|rt| {
        rt.engine.configure_audio(AudioConfig {
            sample_rate,
            quantum_frames,
            channels_out,
            channels_in,
        });
    });
}

/// Allocate (or resize) the shared interleaved audio buffer inside wasm
/// memory and return its pointer for the worklet to read from
#[wasm_bindgen]
pub fn alloc_audio_buffer(frames: u32, channels: u32) -> u32 {
    with_runtime(|rt| {
        rt.audio_buffer.resize((frames * channels) as usize, 0.0);
        rt.audio_buffer.as_mut_ptr() as u32
    })
    .unwrap_or(0)
}

/// Fill one interleaved audio quantum at the given wasm-memory pointer.
///
/// The pointer is normally the one returned by `alloc_audio_buffer`; any
/// other valid float region of the right length works too.
#[wasm_bindgen]
pub fn process_audio_buffer(out_ptr: u32, frames: u32, channels: u32) {
    with_runtime(|rt| {
        let frames = frames as usize;
        let channels = channels as usize;
        let len = frames * channels;

        let WebRuntime {
            engine,
            app,
            audio_buffer,
        } = rt;

        let result = if out_ptr == audio_buffer.as_ptr() as u32 && audio_buffer.len() >= len {
            engine.process_audio(app.as_mut(), &mut audio_buffer[..len], frames, channels)
        } else {
            // Host-owned region of wasm linear memory.
            let out = unsafe { std::slice::from_raw_parts_mut(out_ptr as *mut f32, len) };
            engine.process_audio(app.as_mut(), out, frames, channels)
        };
        if let Err(e) = result {
            log::error!("audio quantum error: {e}");
        }
    });
}

/// Report a host-detected boolean capability (before any draw)
#[wasm_bindgen]
pub fn report_capability(name: &str, supported: bool) {
    with_runtime(|rt| rt.engine.graphics_mut().report_capability(name, supported));
}

/// Report a host-detected numeric limit (before any draw)
#[wasm_bindgen]
pub fn report_limit(name: &str, value: u32) {
    with_runtime(|rt| rt.engine.graphics_mut().report_limit(name, value));
}

/// Report driver identification strings (before any draw)
#[wasm_bindgen]
pub fn report_driver_info(vendor: &str, renderer: &str) {
    with_runtime(|rt| rt.engine.graphics_mut().report_driver_info(vendor, renderer));
}

fn key_event(code: u32, shift: bool, ctrl: bool, alt: bool) -> Key {
    Key {
        code: KeyCode::from_scancode(code),
        shift,
        ctrl,
        alt,
    }
}

/// Forward a key press; returns the application's handled flag
#[wasm_bindgen]
pub fn key_down(code: u32, shift: bool, ctrl: bool, alt: bool) -> bool {
    with_runtime(|rt| {
        let event = AppEvent::KeyDown(key_event(code, shift, ctrl, alt));
        rt.engine.handle_event(rt.app.as_mut(), event)
    })
    .unwrap_or(false)
}

/// Forward a key release; returns the application's handled flag
#[wasm_bindgen]
pub fn key_up(code: u32, shift: bool, ctrl: bool, alt: bool) -> bool {
    with_runtime(|rt| {
        let event = AppEvent::KeyUp(key_event(code, shift, ctrl, alt));
        rt.engine.handle_event(rt.app.as_mut(), event)
    })
    .unwrap_or(false)
}

/// Forward a mouse button press
#[wasm_bindgen]
pub fn mouse_down(x: f64, y: f64, button: u32) -> bool {
    with_runtime(|rt| {
        let event = AppEvent::MouseDown(Mouse {
            x,
            y,
            button: Some(MouseButton::from_index(button)),
            ..Mouse::default()
        });
        rt.engine.handle_event(rt.app.as_mut(), event)
    })
    .unwrap_or(false)
}

/// Forward a mouse button release
#[wasm_bindgen]
pub fn mouse_up(x: f64, y: f64, button: u32) -> bool {
    with_runtime(|rt| {
        let event = AppEvent::MouseUp(Mouse {
            x,
            y,
            button: Some(MouseButton::from_index(button)),
            ..Mouse::default()
        });
        rt.engine.handle_event(rt.app.as_mut(), event)
    })
    .unwrap_or(false)
}

/// Forward pointer motion; becomes a drag while a button is held
#[wasm_bindgen]
pub fn mouse_move(x: f64, y: f64, dx: f64, dy: f64) -> bool {
    with_runtime(|rt| {
        let event = AppEvent::MouseMove(Mouse {
            x,
            y,
            dx,
            dy,
            ..Mouse::default()
        });
        rt.engine.handle_event(rt.app.as_mut(), event)
    })
    .unwrap_or(false)
}

/// Forward a scroll event
#[wasm_bindgen]
pub fn mouse_scroll(dx: f64, dy: f64) -> bool {
    with_runtime(|rt| {
        let event = AppEvent::MouseScroll(Mouse {
            scroll_x: dx,
            scroll_y: dy,
            ..Mouse::default()
        });
        rt.engine.handle_event(rt.app.as_mut(), event)
    })
    .unwrap_or(false)
}

/// Forward a canvas resize
#[wasm_bindgen]
pub fn resize(width: u32, height: u32) {
    with_runtime(|rt| {
        rt.engine
            .handle_event(rt.app.as_mut(), AppEvent::Resized { width, height });
    });
}
