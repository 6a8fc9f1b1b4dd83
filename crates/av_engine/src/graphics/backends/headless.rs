//! Headless recording backend
//!
//! Implements the full backend surface without a driver, recording every
//! command it receives. Tests and CI use it to assert on command order and
//! to exercise capability-dependent paths (the capability record it
//! reports is configurable). It is always compiled so hosts can run the
//! engine without a context, e.g. for audio-only sessions.

use slotmap::SlotMap;

use crate::foundation::color::Color;
use crate::graphics::backend::{
    BackendResult, FramebufferId, GraphicsBackend, RenderbufferId, ShaderId, TextureId,
};
use crate::graphics::capabilities::GraphicsCapabilities;
use crate::graphics::framebuffer::FramebufferStatus;
use crate::graphics::mesh::{Mesh, Primitive};
use crate::graphics::shader::UniformValue;
use crate::graphics::state::{BlendMode, ColorMask, CullFace, PolygonMode, Viewport};
use crate::graphics::texture::{InternalFormat, TextureDescriptor, TextureTarget};

/// A recorded backend command
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// `clear` was issued
    Clear(Color),
    /// Viewport changed
    Viewport(Viewport),
    /// Blending state changed
    Blending {
        /// Enabled flag
        enabled: bool,
        /// Mode in effect
        mode: BlendMode,
    },
    /// Depth testing toggled
    DepthTesting(bool),
    /// Depth writes toggled
    DepthMask(bool),
    /// Culling changed
    Culling(bool, CullFace),
    /// Color mask changed
    ColorMask(ColorMask),
    /// Polygon mode requested
    PolygonMode(PolygonMode),
    /// A program was made current
    UseShader(Option<ShaderId>),
    /// A uniform was set
    Uniform(ShaderId, String),
    /// A texture was bound
    BindTexture(TextureId, u32),
    /// A framebuffer was bound
    BindFramebuffer(Option<FramebufferId>),
    /// A mesh was drawn
    Draw {
        /// Primitive kind drawn
        primitive: Primitive,
        /// Number of vertices submitted
        vertices: usize,
    },
}

struct RecordedTexture {
    format: InternalFormat,
}

/// Recording backend for tests and context-free hosts
pub struct HeadlessBackend {
    /// Capability record reported from `init`; override fields before the
    /// engine starts to simulate degraded drivers.
    pub capabilities: GraphicsCapabilities,
    /// When set, `init` fails, simulating a context that cannot be created
    pub fail_init: bool,
    commands: Vec<RecordedCommand>,
    shaders: SlotMap<ShaderId, ()>,
    textures: SlotMap<TextureId, RecordedTexture>,
    framebuffers: SlotMap<FramebufferId, (bool, bool)>, // (has color, has depth)
    renderbuffers: SlotMap<RenderbufferId, ()>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Create a backend reporting default (conservative) capabilities
    pub fn new() -> Self {
        Self {
            capabilities: GraphicsCapabilities::default(),
            fail_init: false,
            commands: Vec::new(),
            shaders: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            renderbuffers: SlotMap::with_key(),
        }
    }

    /// Commands recorded so far, in issue order
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Forget recorded commands
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Storage format a texture was allocated with
    pub fn texture_format(&self, id: TextureId) -> Option<InternalFormat> {
        self.textures.get(id).map(|t| t.format)
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn init(&mut self) -> BackendResult<GraphicsCapabilities> {
        if self.fail_init {
            return Err(crate::graphics::RenderError::Backend(
                "headless backend configured to fail".into(),
            ));
        }
        Ok(self.capabilities.clone())
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(RecordedCommand::Clear(color));
    }

    fn set_viewport(&mut self, vp: Viewport) {
        self.commands.push(RecordedCommand::Viewport(vp));
    }

    fn set_scissor(&mut self, _enabled: bool, _area: Viewport) {}

    fn set_depth_testing(&mut self, enabled: bool) {
        self.commands.push(RecordedCommand::DepthTesting(enabled));
    }

    fn set_depth_mask(&mut self, on: bool) {
        self.commands.push(RecordedCommand::DepthMask(on));
    }

    fn set_blending(&mut self, enabled: bool, mode: BlendMode) {
        self.commands.push(RecordedCommand::Blending { enabled, mode });
    }

    fn set_culling(&mut self, enabled: bool, face: CullFace) {
        self.commands.push(RecordedCommand::Culling(enabled, face));
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        self.commands.push(RecordedCommand::ColorMask(mask));
    }

    fn set_line_width(&mut self, _width: f32) {}

    fn set_point_size(&mut self, _size: f32) {}

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.commands.push(RecordedCommand::PolygonMode(mode));
    }

    fn select_draw_buffer(&mut self, _index: u32) {}

    fn create_shader(&mut self, _vertex_src: &str, _fragment_src: &str) -> BackendResult<ShaderId> {
        Ok(self.shaders.insert(()))
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        self.shaders.remove(id);
    }

    fn use_shader(&mut self, id: Option<ShaderId>) {
        self.commands.push(RecordedCommand::UseShader(id));
    }

    fn set_uniform(&mut self, id: ShaderId, name: &str, _value: &UniformValue) {
        self.commands.push(RecordedCommand::Uniform(id, name.to_string()));
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureId> {
        Ok(self.textures.insert(RecordedTexture { format: desc.internal }))
    }

    fn upload_texture(
        &mut self,
        _id: TextureId,
        _desc: &TextureDescriptor,
        _data: Option<&[u8]>,
    ) -> BackendResult<()> {
        Ok(())
    }

    fn generate_mipmaps(&mut self, _id: TextureId, _desc: &TextureDescriptor) {}

    fn bind_texture(&mut self, id: TextureId, unit: u32) {
        self.commands.push(RecordedCommand::BindTexture(id, unit));
    }

    fn unbind_texture(&mut self, _target: TextureTarget, _unit: u32) {}

    fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(id);
    }

    fn create_renderbuffer(
        &mut self,
        _width: u32,
        _height: u32,
        _format: InternalFormat,
    ) -> BackendResult<RenderbufferId> {
        Ok(self.renderbuffers.insert(()))
    }

    fn destroy_renderbuffer(&mut self, id: RenderbufferId) {
        self.renderbuffers.remove(id);
    }

    fn create_framebuffer(&mut self) -> BackendResult<FramebufferId> {
        Ok(self.framebuffers.insert((false, false)))
    }

    fn attach_color_texture(&mut self, fbo: FramebufferId, _tex: TextureId) -> BackendResult<()> {
        if let Some(entry) = self.framebuffers.get_mut(fbo) {
            entry.0 = true;
        }
        Ok(())
    }

    fn attach_depth_texture(&mut self, fbo: FramebufferId, _tex: TextureId) -> BackendResult<()> {
        if let Some(entry) = self.framebuffers.get_mut(fbo) {
            entry.1 = true;
        }
        Ok(())
    }

    fn attach_depth_renderbuffer(
        &mut self,
        fbo: FramebufferId,
        _rb: RenderbufferId,
    ) -> BackendResult<()> {
        if let Some(entry) = self.framebuffers.get_mut(fbo) {
            entry.1 = true;
        }
        Ok(())
    }

    fn framebuffer_status(&mut self, fbo: FramebufferId) -> FramebufferStatus {
        match self.framebuffers.get(fbo) {
            Some((true, true)) => FramebufferStatus::Complete,
            Some((false, false)) => FramebufferStatus::MissingAttachment,
            Some(_) => FramebufferStatus::IncompleteAttachment,
            None => FramebufferStatus::MissingAttachment,
        }
    }

    fn bind_framebuffer(&mut self, fbo: Option<FramebufferId>) {
        self.commands.push(RecordedCommand::BindFramebuffer(fbo));
    }

    fn destroy_framebuffer(&mut self, id: FramebufferId) {
        self.framebuffers.remove(id);
    }

    fn draw_mesh(&mut self, mesh: &Mesh) -> BackendResult<()> {
        self.commands.push(RecordedCommand::Draw {
            primitive: mesh.primitive,
            vertices: mesh.vertex_count(),
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
