//! Backend abstraction for the draw pipeline
//!
//! This trait is the routed command surface between the high-level
//! `Graphics` facade and a concrete driver. The GL implementation covers
//! both native OpenGL and browser WebGL2; the headless implementation
//! records commands for tests and CI, where no context exists.
//!
//! Driver objects are owned by the backend and addressed through slotmap
//! keys, so the facade and user-facing resources never hold raw driver
//! handles.

use slotmap::new_key_type;

use crate::foundation::color::Color;
use crate::graphics::capabilities::GraphicsCapabilities;
use crate::graphics::framebuffer::FramebufferStatus;
use crate::graphics::mesh::Mesh;
use crate::graphics::shader::UniformValue;
use crate::graphics::state::{BlendMode, ColorMask, CullFace, PolygonMode, Viewport};
use crate::graphics::texture::{InternalFormat, TextureDescriptor, TextureTarget};
use crate::graphics::RenderError;

new_key_type! {
    /// Backend key for a texture object
    pub struct TextureId;
    /// Backend key for a shader program
    pub struct ShaderId;
    /// Backend key for a framebuffer object
    pub struct FramebufferId;
    /// Backend key for a renderbuffer object
    pub struct RenderbufferId;
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// The routed draw pipeline a concrete driver implements
pub trait GraphicsBackend {
    /// One-time startup: query driver limits and build internal streaming
    /// buffers. Returns the populated capability record.
    fn init(&mut self) -> BackendResult<GraphicsCapabilities>;

    // --- Pipeline state ---

    /// Clear color and depth of the bound framebuffer
    fn clear(&mut self, color: Color);

    /// Set the viewport rectangle
    fn set_viewport(&mut self, vp: Viewport);

    /// Enable/disable scissoring and set its rectangle
    fn set_scissor(&mut self, enabled: bool, area: Viewport);

    /// Enable/disable depth testing
    fn set_depth_testing(&mut self, enabled: bool);

    /// Enable/disable depth writes
    fn set_depth_mask(&mut self, on: bool);

    /// Enable/disable blending and set the blend mode
    fn set_blending(&mut self, enabled: bool, mode: BlendMode);

    /// Enable/disable face culling and select the culled face
    fn set_culling(&mut self, enabled: bool, face: CullFace);

    /// Set the per-channel color write mask
    fn set_color_mask(&mut self, mask: ColorMask);

    /// Set rasterized line width
    fn set_line_width(&mut self, width: f32);

    /// Set point sprite size. Native drivers take this directly; the web
    /// driver has no such call, the value reaches the vertex shader through
    /// a uniform instead (the facade owns that slot).
    fn set_point_size(&mut self, size: f32);

    /// Set fill/wireframe rasterization. Unavailable on the web driver:
    /// requests for `Line` are ignored there (logged once).
    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Select the color attachment subsequent draws write to. A no-op on
    /// the web driver.
    fn select_draw_buffer(&mut self, index: u32);

    // --- Shaders ---

    /// Compile and link a program; the error is the driver's info log
    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> BackendResult<ShaderId>;

    /// Destroy a program
    fn destroy_shader(&mut self, id: ShaderId);

    /// Make a program current (`None` unbinds)
    fn use_shader(&mut self, id: Option<ShaderId>);

    /// Set a uniform by name on a program. Unknown names are a no-op.
    fn set_uniform(&mut self, id: ShaderId, name: &str, value: &UniformValue);

    // --- Textures ---

    /// Allocate a texture object (no storage yet)
    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureId>;

    /// Define storage and upload pixel data
    fn upload_texture(
        &mut self,
        id: TextureId,
        desc: &TextureDescriptor,
        data: Option<&[u8]>,
    ) -> BackendResult<()>;

    /// Generate a mipmap chain for an uploaded texture
    fn generate_mipmaps(&mut self, id: TextureId, desc: &TextureDescriptor);

    /// Bind a texture to a unit
    fn bind_texture(&mut self, id: TextureId, unit: u32);

    /// Unbind whatever texture of the given target is on a unit
    fn unbind_texture(&mut self, target: TextureTarget, unit: u32);

    /// Destroy a texture
    fn destroy_texture(&mut self, id: TextureId);

    // --- Renderbuffers and framebuffers ---

    /// Allocate a renderbuffer with storage
    fn create_renderbuffer(
        &mut self,
        width: u32,
        height: u32,
        format: InternalFormat,
    ) -> BackendResult<RenderbufferId>;

    /// Destroy a renderbuffer
    fn destroy_renderbuffer(&mut self, id: RenderbufferId);

    /// Allocate a framebuffer object
    fn create_framebuffer(&mut self) -> BackendResult<FramebufferId>;

    /// Attach a texture as the color attachment
    fn attach_color_texture(&mut self, fbo: FramebufferId, tex: TextureId) -> BackendResult<()>;

    /// Attach a texture as the depth attachment
    fn attach_depth_texture(&mut self, fbo: FramebufferId, tex: TextureId) -> BackendResult<()>;

    /// Attach a renderbuffer as the depth attachment
    fn attach_depth_renderbuffer(
        &mut self,
        fbo: FramebufferId,
        rb: RenderbufferId,
    ) -> BackendResult<()>;

    /// Query driver completeness of a framebuffer
    fn framebuffer_status(&mut self, fbo: FramebufferId) -> FramebufferStatus;

    /// Bind a framebuffer (`None` = default framebuffer)
    fn bind_framebuffer(&mut self, fbo: Option<FramebufferId>);

    /// Destroy a framebuffer
    fn destroy_framebuffer(&mut self, id: FramebufferId);

    // --- Drawing ---

    /// Stream a mesh to the driver and draw it under current state.
    /// The mesh has already been validated by the facade.
    fn draw_mesh(&mut self, mesh: &Mesh) -> BackendResult<()>;

    /// Downcast to the concrete backend type, for host integrations and
    /// tests that need to reach past the abstraction
    fn as_any(&self) -> &dyn std::any::Any;
}
