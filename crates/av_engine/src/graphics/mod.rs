//! # Graphics bridge
//!
//! The high-level, backend-routed draw pipeline. `Graphics` owns the
//! matrix stacks, cached pipeline state, and all driver resources, and
//! forwards work to a [`backend::GraphicsBackend`]: the glow driver on
//! native GL and WebGL2, or the headless recorder where no context exists.
//!
//! Draws are immediate mode: `draw` streams the mesh under the current
//! state and top-of-stack transforms. Scoped state (matrix, camera,
//! viewport, framebuffer) offers both raw push/pop pairs and closure
//! helpers that guarantee the pop on every exit path; unbalanced stacks at
//! frame end are a detected, fatal-to-the-frame error.

pub mod backend;
pub mod backends;
pub mod bridge;
pub mod capabilities;
pub mod framebuffer;
pub mod light;
pub mod matrix_stack;
pub mod mesh;
pub mod shader;
pub mod shapes;
pub mod state;
pub mod texture;
pub mod uv;

pub use backend::{BackendResult, FramebufferId, GraphicsBackend, ShaderId, TextureId};
pub use capabilities::{CompressionFormats, GraphicsCapabilities};
pub use framebuffer::{DepthAttachment, Framebuffer, FramebufferStatus, RenderTarget};
pub use light::{Light, Material, MAX_LIGHTS};
pub use matrix_stack::MatrixStack;
pub use mesh::{Mesh, Primitive};
pub use shader::{ShaderProgram, UniformValue};
pub use state::{BlendEquation, BlendFactor, BlendMode, ColorMask, CullFace, PolygonMode, Viewport};
pub use texture::{InternalFormat, Texture, TextureDescriptor, TextureTarget};

use thiserror::Error;

use crate::foundation::color::Color;
use crate::foundation::math::{Mat3, Mat4};
use crate::graphics::shader::{ColorSource, DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};
use crate::lod::LodMesh;

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Shader compilation or linking failed; carries the driver's log
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    /// A framebuffer is not complete; carries the named status
    #[error("framebuffer incomplete: {0}")]
    FramebufferIncomplete(&'static str),

    /// Push/pop pairs did not balance across a frame
    #[error("unbalanced stack at frame end: {0}")]
    UnbalancedStack(String),

    /// A mesh violated the parallel-array invariant
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Driver-level failure
    #[error("graphics backend error: {0}")]
    Backend(String),

    /// Operation before `init` or after `release`
    #[error("graphics not initialized")]
    NotInitialized,
}

/// Automatic level-of-detail selection settings, consulted by `draw_lod`
#[derive(Debug, Clone, Copy)]
pub struct AutoLod {
    /// Whether `draw_lod` selects by distance at all
    pub enabled: bool,
    /// Extra distance multiplier stacked on top of each mesh's own bias;
    /// the adaptive quality ladder steers this
    pub bias: f32,
}

impl Default for AutoLod {
    fn default() -> Self {
        Self { enabled: true, bias: 1.0 }
    }
}

enum PendingReport {
    Flag(String, bool),
    Limit(String, u32),
    Driver(String, String),
}

/// The routed draw pipeline facade
pub struct Graphics {
    backend: Box<dyn GraphicsBackend>,
    caps: GraphicsCapabilities,
    pending_reports: Vec<PendingReport>,
    initialized: bool,

    model: MatrixStack,
    projection: MatrixStack,
    view: Vec<Mat4>,
    viewport_stack: Vec<Viewport>,
    current_viewport: Viewport,
    framebuffer_stack: Vec<Option<FramebufferId>>,
    current_framebuffer: Option<FramebufferId>,
    stack_underflow: bool,

    default_shader: Option<ShaderId>,
    current_shader: Option<ShaderId>,

    color_source: ColorSource,
    tint: Color,
    point_size: f32,
    lighting_on: bool,
    lights: Vec<Light>,
    material: Material,

    blend_mode_cache: BlendMode,
    cull_face_cache: CullFace,
    scissor_area_cache: Viewport,

    auto_lod: AutoLod,
}

impl Graphics {
    /// Wrap a backend. Call [`Graphics::init`] before issuing commands.
    pub fn new(backend: Box<dyn GraphicsBackend>) -> Self {
        Self {
            backend,
            caps: GraphicsCapabilities::default(),
            pending_reports: Vec::new(),
            initialized: false,
            model: MatrixStack::new(),
            projection: MatrixStack::new(),
            view: vec![Mat4::identity()],
            viewport_stack: Vec::new(),
            current_viewport: Viewport::new(0, 0, 0, 0),
            framebuffer_stack: Vec::new(),
            current_framebuffer: None,
            stack_underflow: false,
            default_shader: None,
            current_shader: None,
            color_source: ColorSource::Uniform,
            tint: Color::WHITE,
            point_size: 1.0,
            lighting_on: false,
            lights: Vec::new(),
            material: Material::default(),
            blend_mode_cache: BlendMode::TRANS,
            cull_face_cache: CullFace::Back,
            scissor_area_cache: Viewport::new(0, 0, 0, 0),
            auto_lod: AutoLod::default(),
        }
    }

    /// Initialize the driver: query capabilities (overlaying any host
    /// reports recorded earlier) and compile the built-in program.
    pub fn init(&mut self) -> Result<(), RenderError> {
        let mut caps = self.backend.init()?;
        for report in self.pending_reports.drain(..) {
            match report {
                PendingReport::Flag(name, v) => caps.report(&name, v),
                PendingReport::Limit(name, v) => caps.report_limit(&name, v),
                PendingReport::Driver(vendor, renderer) => {
                    caps.report_driver_info(&vendor, &renderer);
                }
            }
        }
        self.caps = caps;

        let shader = self
            .backend
            .create_shader(DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER)?;
        self.default_shader = Some(shader);
        self.initialized = true;
        Ok(())
    }

    /// Tear down driver resources created by `init`
    pub fn release(&mut self) {
        if let Some(shader) = self.default_shader.take() {
            self.backend.destroy_shader(shader);
        }
        self.current_shader = None;
        self.initialized = false;
    }

    // --- Capability reporting ---

    /// The cached capability record
    pub fn capabilities(&self) -> &GraphicsCapabilities {
        &self.caps
    }

    /// Record a host-detected boolean feature. Before `init` the report is
    /// queued and overlaid onto the driver's record during `init`.
    pub fn report_capability(&mut self, name: &str, supported: bool) {
        if self.initialized {
            self.caps.report(name, supported);
        } else {
            self.pending_reports
                .push(PendingReport::Flag(name.to_string(), supported));
        }
    }

    /// Record a host-detected numeric limit
    pub fn report_limit(&mut self, name: &str, value: u32) {
        if self.initialized {
            self.caps.report_limit(name, value);
        } else {
            self.pending_reports
                .push(PendingReport::Limit(name.to_string(), value));
        }
    }

    /// Record host-detected driver identification strings
    pub fn report_driver_info(&mut self, vendor: &str, renderer: &str) {
        if self.initialized {
            self.caps.report_driver_info(vendor, renderer);
        } else {
            self.pending_reports
                .push(PendingReport::Driver(vendor.to_string(), renderer.to_string()));
        }
    }

    // --- Frame bracketing ---

    /// Start a frame: reset all stacks, install the camera matrices, and
    /// set the window viewport.
    pub fn begin_frame(&mut self, viewport: Viewport, view: Mat4, projection: Mat4) {
        self.model.clear();
        self.projection.clear();
        self.projection.load(projection);
        self.view.clear();
        self.view.push(view);
        self.viewport_stack.clear();
        self.framebuffer_stack.clear();
        self.current_framebuffer = None;
        self.stack_underflow = false;
        self.current_viewport = viewport;
        self.backend.set_viewport(viewport);
        self.backend.bind_framebuffer(None);
    }

    /// Finish a frame, verifying every push was matched by a pop.
    ///
    /// An unbalanced frame is reported as [`RenderError::UnbalancedStack`];
    /// the stacks are reset so the next frame starts clean either way.
    pub fn end_frame(&mut self) -> Result<(), RenderError> {
        let mut leaks: Vec<&str> = Vec::new();
        if self.stack_underflow {
            leaks.push("pop without matching push");
        }
        if self.model.depth() != 1 {
            leaks.push("model matrix");
        }
        if self.projection.depth() != 1 {
            leaks.push("projection matrix");
        }
        if self.view.len() != 1 {
            leaks.push("camera");
        }
        if !self.viewport_stack.is_empty() {
            leaks.push("viewport");
        }
        if !self.framebuffer_stack.is_empty() {
            leaks.push("framebuffer");
        }

        if leaks.is_empty() {
            Ok(())
        } else {
            let detail = leaks.join(", ");
            log::error!("unbalanced graphics stacks at frame end: {detail}");
            self.model.clear();
            self.projection.clear();
            self.view.truncate(1);
            self.viewport_stack.clear();
            self.framebuffer_stack.clear();
            self.stack_underflow = false;
            Err(RenderError::UnbalancedStack(detail))
        }
    }

    // --- Pipeline state ---

    /// Clear color and depth to an opaque color
    pub fn clear(&mut self, r: f32, g: f32, b: f32) {
        self.backend.clear(Color::rgb(r, g, b));
    }

    /// Clear color and depth with explicit alpha
    pub fn clear_rgba(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.backend.clear(Color::rgba(r, g, b, a));
    }

    /// Enable/disable depth testing
    pub fn depth_testing(&mut self, enabled: bool) {
        self.backend.set_depth_testing(enabled);
    }

    /// Enable/disable depth writes
    pub fn depth_mask(&mut self, on: bool) {
        self.backend.set_depth_mask(on);
    }

    /// Enable/disable blending with the current mode
    pub fn blending(&mut self, enabled: bool) {
        let mode = self.blend_mode_cache;
        self.backend.set_blending(enabled, mode);
    }

    /// Set the blend mode (and enable blending)
    pub fn blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode_cache = mode;
        self.backend.set_blending(true, mode);
    }

    /// Standard alpha blending preset
    pub fn blend_trans(&mut self) {
        self.blend_mode(BlendMode::TRANS);
    }

    /// Additive blending preset
    pub fn blend_add(&mut self) {
        self.blend_mode(BlendMode::ADD);
    }

    /// Multiplicative blending preset
    pub fn blend_mult(&mut self) {
        self.blend_mode(BlendMode::MULT);
    }

    /// Screen blending preset
    pub fn blend_screen(&mut self) {
        self.blend_mode(BlendMode::SCREEN);
    }

    /// Enable/disable face culling (back faces by default)
    pub fn culling(&mut self, enabled: bool) {
        let face = self.cull_face_cache;
        self.backend.set_culling(enabled, face);
    }

    /// Select the culled face (and enable culling)
    pub fn cull_face(&mut self, face: CullFace) {
        self.cull_face_cache = face;
        self.backend.set_culling(true, face);
    }

    /// Enable/disable scissor testing
    pub fn scissor_test(&mut self, enabled: bool) {
        let area = self.scissor_area_cache;
        self.backend.set_scissor(enabled, area);
    }

    /// Set the scissor rectangle (and enable scissoring)
    pub fn scissor_area(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let area = Viewport::new(x, y, w, h);
        self.scissor_area_cache = area;
        self.backend.set_scissor(true, area);
    }

    /// Set the viewport rectangle
    pub fn viewport(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.current_viewport = Viewport::new(x, y, w, h);
        self.backend.set_viewport(self.current_viewport);
    }

    /// Push the current viewport and switch to a full rectangle of the
    /// given size (the shape used when rendering into an offscreen target)
    pub fn push_viewport(&mut self, w: u32, h: u32) {
        self.viewport_stack.push(self.current_viewport);
        self.viewport(0, 0, w as i32, h as i32);
    }

    /// Restore the viewport saved by the matching push
    pub fn pop_viewport(&mut self) {
        match self.viewport_stack.pop() {
            Some(vp) => {
                self.current_viewport = vp;
                self.backend.set_viewport(vp);
            }
            None => {
                log::error!("pop_viewport without matching push_viewport");
                self.stack_underflow = true;
            }
        }
    }

    /// Set the per-channel color write mask
    pub fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        self.backend.set_color_mask(ColorMask { r, g, b, a });
    }

    /// Set the rasterized line width
    pub fn line_width(&mut self, width: f32) {
        self.backend.set_line_width(width);
    }

    /// Set the point sprite size.
    ///
    /// On the web driver the value never reaches a driver call; it is kept
    /// in this facade and handed to the vertex shader as a uniform, which
    /// the built-in program assigns to the point-size output. Custom
    /// programs that draw points must do the same.
    pub fn point_size(&mut self, size: f32) {
        self.point_size = size;
        self.backend.set_point_size(size);
    }

    /// Rasterize filled polygons
    pub fn polygon_fill(&mut self) {
        self.backend.set_polygon_mode(PolygonMode::Fill);
    }

    /// Rasterize wireframe outlines. Silently unavailable on the web
    /// driver; build line meshes explicitly for portable wireframes.
    pub fn polygon_line(&mut self) {
        self.backend.set_polygon_mode(PolygonMode::Line);
    }

    /// Select the color attachment subsequent draws write to (no-op on the
    /// web driver)
    pub fn draw_buffer(&mut self, index: u32) {
        self.backend.select_draw_buffer(index);
    }

    // --- Lighting and color sourcing ---

    /// Enable/disable the built-in lighting path
    pub fn lighting(&mut self, enabled: bool) {
        self.lighting_on = enabled;
    }

    /// Install a light in a slot (slots beyond [`MAX_LIGHTS`] are ignored)
    pub fn light(&mut self, slot: usize, light: Light) {
        if slot >= MAX_LIGHTS {
            log::warn!("light slot {slot} exceeds limit of {MAX_LIGHTS}");
            return;
        }
        if self.lights.len() <= slot {
            self.lights.resize_with(slot + 1, Light::default);
        }
        self.lights[slot] = light;
    }

    /// Set the material for subsequent lit draws
    pub fn material(&mut self, material: Material) {
        self.material = material;
    }

    /// Color subsequent draws with a uniform tint
    pub fn color(&mut self, color: Color) {
        self.tint = color;
        self.color_source = ColorSource::Uniform;
    }

    /// Color subsequent draws from per-vertex mesh colors
    pub fn mesh_color(&mut self) {
        self.color_source = ColorSource::Vertex;
    }

    /// Color subsequent draws from the texture bound to unit 0
    pub fn texture(&mut self) {
        self.color_source = ColorSource::Texture;
    }

    // --- Matrix stacks ---

    /// Push (duplicate) the model matrix
    pub fn push_matrix(&mut self) {
        self.model.push();
    }

    /// Pop the model matrix; an unmatched pop is recorded and reported at
    /// frame end
    pub fn pop_matrix(&mut self) {
        if !self.model.pop() {
            log::error!("pop_matrix without matching push_matrix");
            self.stack_underflow = true;
        }
    }

    /// Run a closure inside a push/pop pair, guaranteeing the pop
    pub fn with_matrix<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_matrix();
        let result = f(self);
        self.pop_matrix();
        result
    }

    /// Translate the model matrix
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.model.translate(x, y, z);
    }

    /// Rotate the model matrix (degrees, arbitrary axis)
    pub fn rotate(&mut self, angle_deg: f32, x: f32, y: f32, z: f32) {
        self.model.rotate(angle_deg, x, y, z);
    }

    /// Scale the model matrix
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.model.scale(x, y, z);
    }

    /// The current model matrix (top of the model stack)
    pub fn model_matrix(&self) -> Mat4 {
        self.model.top()
    }

    /// Replace the projection matrix
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection.load(projection);
    }

    /// Push a camera view matrix for a nested viewpoint
    pub fn push_camera(&mut self, view: Mat4) {
        self.view.push(view);
    }

    /// Restore the camera pushed by the matching `push_camera`
    pub fn pop_camera(&mut self) {
        if self.view.len() > 1 {
            self.view.pop();
        } else {
            log::error!("pop_camera without matching push_camera");
            self.stack_underflow = true;
        }
    }

    /// Run a closure under a pushed camera, guaranteeing the pop
    pub fn with_camera<R>(&mut self, view: Mat4, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_camera(view);
        let result = f(self);
        self.pop_camera();
        result
    }

    fn view_matrix(&self) -> Mat4 {
        *self.view.last().expect("camera stack is never empty")
    }

    // --- Shaders ---

    /// Compile and link a program. On failure the error carries the
    /// driver's log and the application may continue without the program.
    pub fn create_shader(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ShaderProgram, RenderError> {
        let id = self.backend.create_shader(vertex_src, fragment_src)?;
        Ok(ShaderProgram { id })
    }

    /// Destroy a program
    pub fn destroy_shader(&mut self, program: ShaderProgram) {
        if self.current_shader == Some(program.id) {
            self.current_shader = None;
        }
        self.backend.destroy_shader(program.id);
    }

    /// Make a program current for subsequent draws
    pub fn shader(&mut self, program: &ShaderProgram) {
        self.current_shader = Some(program.id);
    }

    /// Return to the built-in program
    pub fn default_shader(&mut self) {
        self.current_shader = None;
    }

    /// Set a uniform by name; unknown names are a no-op
    pub fn set_uniform(&mut self, program: &ShaderProgram, name: &str, value: UniformValue) {
        self.backend.set_uniform(program.id, name, &value);
    }

    // --- Textures ---

    /// Realize a texture's driver handle and upload any staged data
    pub fn update_texture(&mut self, tex: &mut Texture) -> Result<(), RenderError> {
        if tex.handle.is_none() {
            tex.handle = Some(self.backend.create_texture(&tex.desc)?);
        }
        let id = tex.handle.expect("just created");
        if let Some(data) = tex.pending.take() {
            self.backend.upload_texture(id, &tex.desc, Some(&data))?;
            tex.allocated = true;
        } else if !tex.allocated {
            // Define storage without data (render targets, streamed video).
            self.backend.upload_texture(id, &tex.desc, None)?;
            tex.allocated = true;
        }
        Ok(())
    }

    /// Bind a texture to a unit, realizing it first if needed. Binding a
    /// texture that has never been given storage is a no-op.
    pub fn bind_texture(&mut self, tex: &mut Texture, unit: u32) {
        if !tex.is_complete() {
            log::debug!("ignoring bind of incomplete texture");
            return;
        }
        if tex.handle.is_none() || tex.pending.is_some() {
            if let Err(e) = self.update_texture(tex) {
                log::warn!("texture update failed during bind: {e}");
                return;
            }
        }
        if let Some(id) = tex.handle {
            self.backend.bind_texture(id, unit);
        }
    }

    /// Unbind whatever texture of this texture's target is on a unit
    pub fn unbind_texture(&mut self, tex: &Texture, unit: u32) {
        self.backend.unbind_texture(tex.desc.target, unit);
    }

    /// Destroy a texture's driver handle
    pub fn destroy_texture(&mut self, tex: &mut Texture) {
        if let Some(id) = tex.handle.take() {
            self.backend.destroy_texture(id);
        }
        tex.allocated = false;
    }

    // --- Framebuffers ---

    /// Eagerly build an offscreen render target with a color texture and a
    /// depth renderbuffer.
    ///
    /// With `prefer_float` the color format comes from the capability
    /// record's downgrade chain, so on drivers without float render
    /// targets the target still succeeds with a half-float or 8-bit
    /// format; the returned texture's descriptor reports what was
    /// actually allocated.
    pub fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        prefer_float: bool,
    ) -> Result<RenderTarget, RenderError> {
        let internal = if prefer_float {
            self.caps.recommended_internal_format(true, true)
        } else {
            InternalFormat::Rgba8
        };
        let mut desc = if internal.is_float_color() {
            TextureDescriptor::float_2d(width, height, internal)
        } else {
            TextureDescriptor::rgba8_2d(width, height)
        };
        // Float targets cannot assume linear filtering everywhere.
        if internal.is_float_color() && !self.caps.float_texture_linear {
            desc.min_filter = texture::Filter::Nearest;
            desc.mag_filter = texture::Filter::Nearest;
        }

        let mut color = Texture::new(desc);
        self.update_texture(&mut color)?;
        let color_id = color.handle.expect("realized above");

        let depth = self
            .backend
            .create_renderbuffer(width, height, InternalFormat::Depth24)?;
        let fbo = self.backend.create_framebuffer()?;
        self.backend.attach_color_texture(fbo, color_id)?;
        self.backend.attach_depth_renderbuffer(fbo, depth)?;

        let status = self.backend.framebuffer_status(fbo);
        if status != FramebufferStatus::Complete {
            self.backend.destroy_framebuffer(fbo);
            self.backend.destroy_renderbuffer(depth);
            self.destroy_texture(&mut color);
            return Err(RenderError::FramebufferIncomplete(status.as_str()));
        }

        Ok(RenderTarget {
            framebuffer: Framebuffer {
                handle: fbo,
                color: Some(color_id),
                depth: DepthAttachment::Renderbuffer(depth),
                width,
                height,
            },
            color,
            depth,
        })
    }

    /// Destroy a render target and everything it owns
    pub fn destroy_render_target(&mut self, mut target: RenderTarget) {
        self.backend.destroy_framebuffer(target.framebuffer.handle);
        self.backend.destroy_renderbuffer(target.depth);
        self.destroy_texture(&mut target.color);
    }

    /// Eagerly allocate a bare framebuffer object; attach a color texture
    /// and a depth attachment before drawing into it.
    pub fn create_framebuffer(&mut self, width: u32, height: u32) -> Result<Framebuffer, RenderError> {
        let handle = self.backend.create_framebuffer()?;
        Ok(Framebuffer {
            handle,
            color: None,
            depth: DepthAttachment::None,
            width,
            height,
        })
    }

    /// Attach a texture as the framebuffer's color attachment, realizing
    /// the texture first if needed
    pub fn attach_color(
        &mut self,
        fb: &mut Framebuffer,
        tex: &mut Texture,
    ) -> Result<(), RenderError> {
        self.update_texture(tex)?;
        let id = tex.handle.expect("realized above");
        self.backend.attach_color_texture(fb.handle, id)?;
        fb.color = Some(id);
        Ok(())
    }

    /// Attach a depth texture to the framebuffer
    pub fn attach_depth_texture(
        &mut self,
        fb: &mut Framebuffer,
        tex: &mut Texture,
    ) -> Result<(), RenderError> {
        self.update_texture(tex)?;
        let id = tex.handle.expect("realized above");
        self.backend.attach_depth_texture(fb.handle, id)?;
        fb.depth = DepthAttachment::Texture(id);
        Ok(())
    }

    /// Allocate a depth renderbuffer matching the framebuffer's size and
    /// attach it
    pub fn attach_depth_renderbuffer(&mut self, fb: &mut Framebuffer) -> Result<(), RenderError> {
        let rb = self
            .backend
            .create_renderbuffer(fb.width, fb.height, InternalFormat::Depth24)?;
        self.backend.attach_depth_renderbuffer(fb.handle, rb)?;
        fb.depth = DepthAttachment::Renderbuffer(rb);
        Ok(())
    }

    /// Destroy a framebuffer object (attachments are owned separately)
    pub fn destroy_framebuffer(&mut self, fb: Framebuffer) {
        if let DepthAttachment::Renderbuffer(rb) = fb.depth {
            self.backend.destroy_renderbuffer(rb);
        }
        self.backend.destroy_framebuffer(fb.handle);
    }

    /// Query driver completeness of a framebuffer
    pub fn framebuffer_status(&mut self, fb: &Framebuffer) -> FramebufferStatus {
        self.backend.framebuffer_status(fb.handle)
    }

    /// Bind a framebuffer for subsequent draws, saving the previous binding
    pub fn push_framebuffer(&mut self, fb: &Framebuffer) {
        self.framebuffer_stack.push(self.current_framebuffer);
        self.current_framebuffer = Some(fb.handle);
        self.backend.bind_framebuffer(Some(fb.handle));
    }

    /// Restore the framebuffer binding saved by the matching push
    pub fn pop_framebuffer(&mut self) {
        match self.framebuffer_stack.pop() {
            Some(previous) => {
                self.current_framebuffer = previous;
                self.backend.bind_framebuffer(previous);
            }
            None => {
                log::error!("pop_framebuffer without matching push_framebuffer");
                self.stack_underflow = true;
            }
        }
    }

    /// Render into a target inside a closure: binds the framebuffer and a
    /// matching viewport, and guarantees both pops.
    pub fn with_render_target<R>(
        &mut self,
        target: &RenderTarget,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.push_framebuffer(&target.framebuffer);
        self.push_viewport(target.width(), target.height());
        let result = f(self);
        self.pop_viewport();
        self.pop_framebuffer();
        result
    }

    // --- Drawing ---

    /// Draw a mesh under the current state and top-of-stack transforms
    pub fn draw(&mut self, mesh: &Mesh) -> Result<(), RenderError> {
        mesh.validate()?;
        let Some(shader) = self.current_shader.or(self.default_shader) else {
            return Err(RenderError::NotInitialized);
        };

        let mv = self.view_matrix() * self.model.top();
        let normal = normal_matrix(&mv);

        self.backend.use_shader(Some(shader));
        self.backend
            .set_uniform(shader, "u_modelview", &UniformValue::Mat4(mat4_array(&mv)));
        self.backend.set_uniform(
            shader,
            "u_projection",
            &UniformValue::Mat4(mat4_array(&self.projection.top())),
        );
        self.backend
            .set_uniform(shader, "u_normal_matrix", &UniformValue::Mat3(normal));
        self.backend
            .set_uniform(shader, "u_tint", &UniformValue::Vec4(self.tint.to_array()));
        self.backend
            .set_uniform(shader, "u_point_size", &UniformValue::Float(self.point_size));
        let source = match self.color_source {
            ColorSource::Uniform => 0,
            ColorSource::Vertex => 1,
            ColorSource::Texture => 2,
        };
        self.backend
            .set_uniform(shader, "u_color_source", &UniformValue::Int(source));
        self.backend
            .set_uniform(shader, "u_tex0", &UniformValue::Sampler(0));
        self.backend
            .set_uniform(shader, "u_lighting", &UniformValue::Int(i32::from(self.lighting_on)));

        if self.lighting_on {
            let count = self.lights.len().min(MAX_LIGHTS);
            self.backend
                .set_uniform(shader, "u_num_lights", &UniformValue::Int(count as i32));
            for (i, light) in self.lights.iter().take(MAX_LIGHTS).enumerate() {
                let p = light.position;
                self.backend.set_uniform(
                    shader,
                    &format!("u_light_pos[{i}]"),
                    &UniformValue::Vec4([p.x, p.y, p.z, p.w]),
                );
                self.backend.set_uniform(
                    shader,
                    &format!("u_light_diffuse[{i}]"),
                    &UniformValue::Vec3(light.diffuse),
                );
                self.backend.set_uniform(
                    shader,
                    &format!("u_light_ambient[{i}]"),
                    &UniformValue::Vec3(light.ambient),
                );
            }
            self.backend.set_uniform(
                shader,
                "u_material_diffuse",
                &UniformValue::Vec3(self.material.diffuse),
            );
            self.backend.set_uniform(
                shader,
                "u_material_ambient",
                &UniformValue::Vec3(self.material.ambient),
            );
            self.backend.set_uniform(
                shader,
                "u_material_specular",
                &UniformValue::Vec3(self.material.specular),
            );
            self.backend.set_uniform(
                shader,
                "u_material_shininess",
                &UniformValue::Float(self.material.shininess),
            );
        }

        self.backend.draw_mesh(mesh)
    }

    /// Draw a level-of-detail mesh.
    ///
    /// When auto selection is enabled the level comes from the view-space
    /// distance of the current model origin, scaled by the adaptive bias;
    /// otherwise the full-detail level is drawn as-is.
    pub fn draw_lod(&mut self, lod: &LodMesh) -> Result<(), RenderError> {
        let mesh = if self.auto_lod.enabled {
            let mv = self.view_matrix() * self.model.top();
            let origin = mv.column(3);
            let distance =
                (origin.x * origin.x + origin.y * origin.y + origin.z * origin.z).sqrt();
            match lod.select_by_distance(distance * self.auto_lod.bias) {
                Some(level) => &level.mesh,
                None => return Ok(()),
            }
        } else {
            match lod.full_detail() {
                Some(mesh) => mesh,
                None => return Ok(()),
            }
        };
        self.draw(mesh)
    }

    /// Current auto-LOD settings
    pub fn auto_lod(&self) -> AutoLod {
        self.auto_lod
    }

    /// Adjust auto-LOD selection; the engine steers this from the quality
    /// ladder between frames
    pub fn set_auto_lod(&mut self, settings: AutoLod) {
        self.auto_lod = settings;
    }

    /// Access the backend for host integrations and tests
    pub fn backend_mut(&mut self) -> &mut dyn GraphicsBackend {
        self.backend.as_mut()
    }

    /// Shared access to the backend, e.g. to downcast a recorder in tests
    pub fn backend(&self) -> &dyn GraphicsBackend {
        self.backend.as_ref()
    }
}

fn mat4_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0f32; 16];
    out.copy_from_slice(m.as_slice());
    out
}

fn normal_matrix(mv: &Mat4) -> [f32; 9] {
    let upper: Mat3 = mv.fixed_view::<3, 3>(0, 0).into_owned();
    let normal = upper
        .try_inverse()
        .map_or_else(Mat3::identity, |inv| inv.transpose());
    let mut out = [0.0f32; 9];
    out.copy_from_slice(normal.as_slice());
    out
}

#[cfg(test)]
mod tests {
    use super::backends::headless::{HeadlessBackend, RecordedCommand};
    use super::*;
    use crate::foundation::math::Vec3;

    fn test_graphics() -> Graphics {
        let mut g = Graphics::new(Box::new(HeadlessBackend::new()));
        g.init().expect("headless init cannot fail");
        g.begin_frame(Viewport::new(0, 0, 640, 480), Mat4::identity(), Mat4::identity());
        g
    }

    fn recorded(g: &Graphics) -> &[RecordedCommand] {
        g.backend()
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .expect("headless backend")
            .commands()
    }

    #[test]
    fn balanced_frame_passes_the_stack_check() {
        let mut g = test_graphics();
        g.push_matrix();
        g.translate(1.0, 0.0, 0.0);
        g.pop_matrix();
        assert!(g.end_frame().is_ok());
    }

    #[test]
    fn unmatched_push_is_a_frame_error() {
        let mut g = test_graphics();
        g.push_matrix();
        let err = g.end_frame().unwrap_err();
        assert!(matches!(err, RenderError::UnbalancedStack(_)));
        // The stacks recover for the next frame.
        g.begin_frame(Viewport::new(0, 0, 640, 480), Mat4::identity(), Mat4::identity());
        assert!(g.end_frame().is_ok());
    }

    #[test]
    fn unmatched_pop_is_a_frame_error() {
        let mut g = test_graphics();
        g.pop_matrix();
        assert!(g.end_frame().is_err());
    }

    #[test]
    fn with_matrix_restores_the_transform() {
        let mut g = test_graphics();
        let before = g.model_matrix();
        g.with_matrix(|g| {
            g.translate(5.0, 0.0, 0.0);
            g.scale(2.0, 2.0, 2.0);
        });
        assert_eq!(g.model_matrix(), before);
        assert!(g.end_frame().is_ok());
    }

    #[test]
    fn camera_and_viewport_scopes_balance() {
        let mut g = test_graphics();
        g.with_camera(Mat4::new_translation(&Vec3::new(0.0, 0.0, -3.0)), |g| {
            g.push_viewport(128, 128);
            g.pop_viewport();
        });
        assert!(g.end_frame().is_ok());
    }

    #[test]
    fn blend_modes_are_issued_in_draw_order() {
        let mut g = test_graphics();
        let mesh = shapes::quad(1.0, 1.0);

        g.blending(false);
        g.draw(&mesh).unwrap();
        g.blend_add();
        g.draw(&mesh).unwrap();
        g.blend_trans();
        g.draw(&mesh).unwrap();
        assert!(g.end_frame().is_ok());

        let blend_and_draws: Vec<&RecordedCommand> = recorded(&g)
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Blending { .. } | RecordedCommand::Draw { .. }))
            .collect();
        assert_eq!(blend_and_draws.len(), 6);
        assert!(matches!(
            *blend_and_draws[0],
            RecordedCommand::Blending { enabled: false, .. }
        ));
        assert!(matches!(*blend_and_draws[1], RecordedCommand::Draw { .. }));
        assert!(matches!(
            *blend_and_draws[2],
            RecordedCommand::Blending { enabled: true, mode } if mode == BlendMode::ADD
        ));
        assert!(matches!(*blend_and_draws[3], RecordedCommand::Draw { .. }));
        assert!(matches!(
            *blend_and_draws[4],
            RecordedCommand::Blending { enabled: true, mode } if mode == BlendMode::TRANS
        ));
        assert!(matches!(*blend_and_draws[5], RecordedCommand::Draw { .. }));
    }

    #[test]
    fn float_render_target_degrades_without_driver_support() {
        let mut backend = HeadlessBackend::new();
        backend.capabilities.float_texture_renderable = false;
        backend.capabilities.half_float_renderable = false;
        let mut g = Graphics::new(Box::new(backend));
        g.init().unwrap();

        let target = g.create_render_target(256, 256, true).unwrap();
        assert_eq!(target.color.desc.internal, InternalFormat::Rgba8);

        let allocated = g
            .backend()
            .as_any()
            .downcast_ref::<HeadlessBackend>()
            .unwrap()
            .texture_format(target.color.id().unwrap())
            .unwrap();
        assert_eq!(allocated, InternalFormat::Rgba8);
    }

    #[test]
    fn float_render_target_uses_half_float_when_available() {
        let mut backend = HeadlessBackend::new();
        backend.capabilities.float_texture_renderable = false;
        backend.capabilities.half_float_renderable = true;
        let mut g = Graphics::new(Box::new(backend));
        g.init().unwrap();

        let target = g.create_render_target(64, 64, true).unwrap();
        assert_eq!(target.color.desc.internal, InternalFormat::Rgba16F);
    }

    #[test]
    fn binding_an_incomplete_texture_is_a_no_op() {
        let mut g = test_graphics();
        let mut tex = Texture::new(TextureDescriptor::rgba8_2d(8, 8));
        let before = recorded(&g).len();
        g.bind_texture(&mut tex, 0);
        assert_eq!(recorded(&g).len(), before);
        assert!(tex.id().is_none());
        assert!(g.end_frame().is_ok());
    }

    #[test]
    fn draw_rejects_invalid_meshes() {
        let mut g = test_graphics();
        let mut mesh = Mesh::new(Primitive::Triangles);
        mesh.vertex(0.0, 0.0, 0.0).vertex(1.0, 0.0, 0.0).vertex(0.0, 1.0, 0.0);
        mesh.normal(0.0, 0.0, 1.0); // short normal array
        assert!(matches!(g.draw(&mesh), Err(RenderError::InvalidMesh(_))));
        assert!(g.end_frame().is_ok());
    }

    #[test]
    fn framebuffer_completeness_follows_its_attachments() {
        let mut g = test_graphics();
        let mut fb = g.create_framebuffer(64, 64).unwrap();
        assert_eq!(g.framebuffer_status(&fb), FramebufferStatus::MissingAttachment);

        let mut color = Texture::new(TextureDescriptor::rgba8_2d(64, 64));
        g.attach_color(&mut fb, &mut color).unwrap();
        assert_ne!(g.framebuffer_status(&fb), FramebufferStatus::Complete);

        g.attach_depth_renderbuffer(&mut fb).unwrap();
        assert_eq!(g.framebuffer_status(&fb), FramebufferStatus::Complete);
        assert!(matches!(fb.depth_attachment(), DepthAttachment::Renderbuffer(_)));

        g.destroy_framebuffer(fb);
        g.destroy_texture(&mut color);
        assert!(g.end_frame().is_ok());
    }

    #[test]
    fn host_reports_before_init_overlay_driver_record() {
        let mut g = Graphics::new(Box::new(HeadlessBackend::new()));
        g.report_capability("float-renderable", true);
        g.report_limit("max-texture-size", 8192);
        g.init().unwrap();
        assert!(g.capabilities().float_texture_renderable);
        assert_eq!(g.capabilities().max_texture_size, 8192);
    }
}
