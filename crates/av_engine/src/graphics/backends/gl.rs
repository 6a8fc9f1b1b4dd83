//! GL driver backend over `glow`
//!
//! One implementation covers both native OpenGL (3.3+) and browser WebGL2;
//! `glow` presents the same API surface for either context. The handful of
//! operations that do not exist on WebGL2 are handled here per the bridge
//! contract:
//!
//! - point size: WebGL2 has no driver call, the value reaches the vertex
//!   shader through a uniform owned by the facade; native additionally
//!   enables program point size so `gl_PointSize` is honored.
//! - wireframe polygon mode: ignored on the web path (warned once).
//! - draw-buffer selection: no-op on the web path.
//! - framebuffer/texture binds notify the bridge observer on the web path
//!   before touching the driver.

use std::collections::HashMap;

use glow::HasContext;
use slotmap::{Key, SlotMap};

use crate::foundation::color::Color;
use crate::graphics::backend::{
    BackendResult, FramebufferId, GraphicsBackend, RenderbufferId, ShaderId, TextureId,
};
use crate::graphics::bridge;
use crate::graphics::capabilities::{CompressionFormats, GraphicsCapabilities};
use crate::graphics::framebuffer::FramebufferStatus;
use crate::graphics::mesh::{Mesh, Primitive};
use crate::graphics::shader::{attrib, UniformValue};
use crate::graphics::state::{
    BlendEquation, BlendFactor, BlendMode, ColorMask, CullFace, PolygonMode, Viewport,
};
use crate::graphics::texture::{
    ComponentType, DataFormat, InternalFormat, TextureDescriptor, TextureTarget,
};
use crate::graphics::RenderError;

struct ShaderEntry {
    program: glow::Program,
    // Location lookups are cached per program; misses cache as None so an
    // unknown uniform name stays a cheap no-op.
    uniforms: HashMap<String, Option<glow::UniformLocation>>,
}

struct TextureEntry {
    raw: glow::Texture,
    target: u32,
}

struct StreamBuffers {
    vao: glow::VertexArray,
    positions: glow::Buffer,
    normals: glow::Buffer,
    colors: glow::Buffer,
    texcoords: glow::Buffer,
    elements: glow::Buffer,
}

/// The glow-based GL/WebGL2 backend
pub struct GlBackend {
    gl: glow::Context,
    is_web: bool,
    shaders: SlotMap<ShaderId, ShaderEntry>,
    textures: SlotMap<TextureId, TextureEntry>,
    framebuffers: SlotMap<FramebufferId, glow::Framebuffer>,
    renderbuffers: SlotMap<RenderbufferId, glow::Renderbuffer>,
    stream: Option<StreamBuffers>,
    polygon_line_warned: bool,
}

impl GlBackend {
    /// Wrap an existing GL context. `is_web` selects the WebGL2 behavior
    /// divergences described in the module docs.
    pub fn new(gl: glow::Context, is_web: bool) -> Self {
        Self {
            gl,
            is_web,
            shaders: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            renderbuffers: SlotMap::with_key(),
            stream: None,
            polygon_line_warned: false,
        }
    }

    fn gl_target(&self, target: TextureTarget) -> u32 {
        match target {
            // WebGL2 has no 1D textures; both paths store 1D data as a 2D
            // texture one texel tall so behavior matches across backends.
            TextureTarget::Tex1d | TextureTarget::Tex2d => glow::TEXTURE_2D,
            TextureTarget::Tex2dArray => glow::TEXTURE_2D_ARRAY,
            TextureTarget::Tex3d => glow::TEXTURE_3D,
            TextureTarget::Cubemap => glow::TEXTURE_CUBE_MAP,
        }
    }

    fn uniform_location(
        &mut self,
        id: ShaderId,
        name: &str,
    ) -> Option<(glow::Program, Option<glow::UniformLocation>)> {
        let entry = self.shaders.get_mut(id)?;
        let program = entry.program;
        if let Some(loc) = entry.uniforms.get(name) {
            return Some((program, loc.clone()));
        }
        let loc = unsafe { self.gl.get_uniform_location(program, name) };
        entry.uniforms.insert(name.to_string(), loc.clone());
        Some((program, loc))
    }
}

fn blend_factor(f: BlendFactor) -> u32 {
    match f {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
    }
}

fn blend_equation(eq: BlendEquation) -> u32 {
    match eq {
        BlendEquation::Add => glow::FUNC_ADD,
        BlendEquation::Subtract => glow::FUNC_SUBTRACT,
        BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendEquation::Min => glow::MIN,
        BlendEquation::Max => glow::MAX,
    }
}

fn internal_format(f: InternalFormat) -> u32 {
    match f {
        InternalFormat::Rgba8 => glow::RGBA8,
        InternalFormat::Rgb8 => glow::RGB8,
        InternalFormat::Rgba16F => glow::RGBA16F,
        InternalFormat::Rgb16F => glow::RGB16F,
        InternalFormat::Rgba32F => glow::RGBA32F,
        InternalFormat::Rgb32F => glow::RGB32F,
        InternalFormat::Depth24 => glow::DEPTH_COMPONENT24,
        InternalFormat::Depth32F => glow::DEPTH_COMPONENT32F,
    }
}

fn data_format(f: DataFormat) -> u32 {
    match f {
        DataFormat::Red => glow::RED,
        DataFormat::Rgb => glow::RGB,
        DataFormat::Rgba => glow::RGBA,
        DataFormat::DepthComponent => glow::DEPTH_COMPONENT,
    }
}

fn component_type(t: ComponentType) -> u32 {
    match t {
        ComponentType::U8 => glow::UNSIGNED_BYTE,
        ComponentType::F32 => glow::FLOAT,
    }
}

fn filter(f: crate::graphics::texture::Filter) -> i32 {
    use crate::graphics::texture::Filter as F;
    (match f {
        F::Nearest => glow::NEAREST,
        F::Linear => glow::LINEAR,
        F::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        F::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
    }) as i32
}

fn wrap(w: crate::graphics::texture::Wrap) -> i32 {
    use crate::graphics::texture::Wrap as W;
    (match w {
        W::ClampToEdge => glow::CLAMP_TO_EDGE,
        W::Repeat => glow::REPEAT,
        W::MirroredRepeat => glow::MIRRORED_REPEAT,
    }) as i32
}

fn primitive(p: Primitive) -> u32 {
    match p {
        Primitive::Points => glow::POINTS,
        Primitive::Lines => glow::LINES,
        Primitive::LineStrip => glow::LINE_STRIP,
        Primitive::LineLoop => glow::LINE_LOOP,
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
        Primitive::TriangleFan => glow::TRIANGLE_FAN,
    }
}

impl GraphicsBackend for GlBackend {
    fn init(&mut self) -> BackendResult<GraphicsCapabilities> {
        let gl = &self.gl;
        let stream = unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(|e| RenderError::Backend(format!("create_vertex_array: {e}")))?;
            let backend_err = |e: String| RenderError::Backend(format!("create_buffer: {e}"));
            StreamBuffers {
                vao,
                positions: gl.create_buffer().map_err(backend_err)?,
                normals: gl.create_buffer().map_err(backend_err)?,
                colors: gl.create_buffer().map_err(backend_err)?,
                texcoords: gl.create_buffer().map_err(backend_err)?,
                elements: gl.create_buffer().map_err(backend_err)?,
            }
        };
        self.stream = Some(stream);

        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            if !self.is_web {
                // Native GL honors gl_PointSize only with this enabled;
                // WebGL2 always honors it (and rejects the enum).
                self.gl.enable(glow::PROGRAM_POINT_SIZE);
            }
        }

        let mut caps = GraphicsCapabilities::default();
        unsafe {
            caps.max_texture_size = self.gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE) as u32;
            caps.max_cubemap_size =
                self.gl.get_parameter_i32(glow::MAX_CUBE_MAP_TEXTURE_SIZE) as u32;
            caps.max_array_layers =
                self.gl.get_parameter_i32(glow::MAX_ARRAY_TEXTURE_LAYERS) as u32;
            caps.max_3d_size = self.gl.get_parameter_i32(glow::MAX_3D_TEXTURE_SIZE) as u32;
            caps.max_color_attachments =
                self.gl.get_parameter_i32(glow::MAX_COLOR_ATTACHMENTS) as u32;
            caps.max_draw_buffers = self.gl.get_parameter_i32(glow::MAX_DRAW_BUFFERS) as u32;
            caps.vendor = self.gl.get_parameter_string(glow::VENDOR);
            caps.renderer = self.gl.get_parameter_string(glow::RENDERER);
        }

        if !self.is_web {
            // Core GL 3.3 guarantees float color attachments; the web path
            // keeps the conservative defaults until the host reports what
            // the context actually detected.
            caps.float_texture_renderable = true;
            caps.float_texture_linear = true;
            caps.half_float_renderable = true;
            caps.compression |= CompressionFormats::S3TC;
        }

        log::info!(
            "graphics driver: {} / {} (max texture {})",
            caps.vendor,
            caps.renderer,
            caps.max_texture_size
        );
        Ok(caps)
    }

    fn clear(&mut self, color: Color) {
        unsafe {
            self.gl.clear_color(color.r, color.g, color.b, color.a);
            self.gl.clear_depth_f32(1.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn set_viewport(&mut self, vp: Viewport) {
        unsafe { self.gl.viewport(vp.x, vp.y, vp.w, vp.h) }
    }

    fn set_scissor(&mut self, enabled: bool, area: Viewport) {
        unsafe {
            if enabled {
                self.gl.enable(glow::SCISSOR_TEST);
                self.gl.scissor(area.x, area.y, area.w, area.h);
            } else {
                self.gl.disable(glow::SCISSOR_TEST);
            }
        }
    }

    fn set_depth_testing(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn set_depth_mask(&mut self, on: bool) {
        unsafe { self.gl.depth_mask(on) }
    }

    fn set_blending(&mut self, enabled: bool, mode: BlendMode) {
        unsafe {
            if enabled {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func(blend_factor(mode.src), blend_factor(mode.dst));
                self.gl.blend_equation(blend_equation(mode.equation));
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
    }

    fn set_culling(&mut self, enabled: bool, face: CullFace) {
        unsafe {
            if enabled {
                self.gl.enable(glow::CULL_FACE);
                self.gl.cull_face(match face {
                    CullFace::Front => glow::FRONT,
                    CullFace::Back => glow::BACK,
                    CullFace::FrontAndBack => glow::FRONT_AND_BACK,
                });
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
        }
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        unsafe { self.gl.color_mask(mask.r, mask.g, mask.b, mask.a) }
    }

    fn set_line_width(&mut self, width: f32) {
        unsafe { self.gl.line_width(width.max(1.0)) }
    }

    fn set_point_size(&mut self, _size: f32) {
        // The value itself travels to the vertex shader as a uniform owned
        // by the facade; there is no driver-side point size on either GLES
        // or WebGL2 to set here.
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        if self.is_web {
            if mode == PolygonMode::Line && !self.polygon_line_warned {
                self.polygon_line_warned = true;
                log::warn!(
                    "wireframe polygon mode is unavailable on WebGL2; \
                     build line meshes explicitly instead"
                );
            }
            return;
        }
        unsafe {
            self.gl.polygon_mode(
                glow::FRONT_AND_BACK,
                match mode {
                    PolygonMode::Fill => glow::FILL,
                    PolygonMode::Line => glow::LINE,
                },
            );
        }
    }

    fn select_draw_buffer(&mut self, index: u32) {
        if self.is_web {
            return;
        }
        unsafe { self.gl.draw_buffers(&[glow::COLOR_ATTACHMENT0 + index]) }
    }

    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> BackendResult<ShaderId> {
        let gl = &self.gl;
        unsafe {
            let program = gl
                .create_program()
                .map_err(|e| RenderError::Backend(format!("create_program: {e}")))?;

            let mut compiled = Vec::with_capacity(2);
            for (kind, src) in [(glow::VERTEX_SHADER, vertex_src), (glow::FRAGMENT_SHADER, fragment_src)] {
                let shader = gl
                    .create_shader(kind)
                    .map_err(|e| RenderError::Backend(format!("create_shader: {e}")))?;
                gl.shader_source(shader, src);
                gl.compile_shader(shader);
                if !gl.get_shader_compile_status(shader) {
                    let log = gl.get_shader_info_log(shader);
                    gl.delete_shader(shader);
                    for &s in &compiled {
                        gl.delete_shader(s);
                    }
                    gl.delete_program(program);
                    return Err(RenderError::ShaderCompile(log));
                }
                gl.attach_shader(program, shader);
                compiled.push(shader);
            }

            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            for shader in compiled {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(RenderError::ShaderCompile(log));
            }

            Ok(self.shaders.insert(ShaderEntry {
                program,
                uniforms: HashMap::new(),
            }))
        }
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        if let Some(entry) = self.shaders.remove(id) {
            unsafe { self.gl.delete_program(entry.program) }
        }
    }

    fn use_shader(&mut self, id: Option<ShaderId>) {
        let program = id.and_then(|id| self.shaders.get(id)).map(|e| e.program);
        unsafe { self.gl.use_program(program) }
    }

    fn set_uniform(&mut self, id: ShaderId, name: &str, value: &UniformValue) {
        let Some((program, Some(loc))) = self.uniform_location(id, name) else {
            return; // unknown uniform names are a no-op
        };
        let loc = Some(&loc);
        unsafe {
            self.gl.use_program(Some(program));
            match value {
                UniformValue::Int(v) | UniformValue::Sampler(v) => self.gl.uniform_1_i32(loc, *v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(loc, *v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(loc, v[0], v[1]),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(loc, v[0], v[1], v[2]),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(loc, v[0], v[1], v[2], v[3]),
                UniformValue::Mat3(v) => self.gl.uniform_matrix_3_f32_slice(loc, false, v),
                UniformValue::Mat4(v) => self.gl.uniform_matrix_4_f32_slice(loc, false, v),
            }
        }
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureId> {
        let raw = unsafe {
            self.gl
                .create_texture()
                .map_err(|e| RenderError::Backend(format!("create_texture: {e}")))?
        };
        let target = self.gl_target(desc.target);
        unsafe {
            self.gl.bind_texture(target, Some(raw));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter(desc.min_filter));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter(desc.mag_filter));
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap(desc.wrap_s));
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap(desc.wrap_t));
            if matches!(desc.target, TextureTarget::Tex3d) {
                self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, wrap(desc.wrap_r));
            }
            self.gl.bind_texture(target, None);
        }
        Ok(self.textures.insert(TextureEntry { raw, target }))
    }

    fn upload_texture(
        &mut self,
        id: TextureId,
        desc: &TextureDescriptor,
        data: Option<&[u8]>,
    ) -> BackendResult<()> {
        let entry = self
            .textures
            .get(id)
            .ok_or_else(|| RenderError::Backend("upload to destroyed texture".into()))?;
        let internal = internal_format(desc.internal) as i32;
        let format = data_format(desc.format);
        let ty = component_type(desc.component);
        let (w, h) = (desc.width as i32, desc.height.max(1) as i32);

        unsafe {
            self.gl.bind_texture(entry.target, Some(entry.raw));
            match desc.target {
                TextureTarget::Tex1d | TextureTarget::Tex2d => {
                    self.gl
                        .tex_image_2d(entry.target, 0, internal, w, h, 0, format, ty, data);
                }
                TextureTarget::Tex2dArray | TextureTarget::Tex3d => {
                    self.gl.tex_image_3d(
                        entry.target,
                        0,
                        internal,
                        w,
                        h,
                        desc.depth.max(1) as i32,
                        0,
                        format,
                        ty,
                        data,
                    );
                }
                TextureTarget::Cubemap => {
                    for face in 0..6u32 {
                        self.gl.tex_image_2d(
                            glow::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                            0,
                            internal,
                            w,
                            h,
                            0,
                            format,
                            ty,
                            data,
                        );
                    }
                }
            }
            if desc.mipmap {
                self.gl.generate_mipmap(entry.target);
            }
            self.gl.bind_texture(entry.target, None);
        }
        Ok(())
    }

    fn generate_mipmaps(&mut self, id: TextureId, _desc: &TextureDescriptor) {
        if let Some(entry) = self.textures.get(id) {
            unsafe {
                self.gl.bind_texture(entry.target, Some(entry.raw));
                self.gl.generate_mipmap(entry.target);
                self.gl.bind_texture(entry.target, None);
            }
        }
    }

    fn bind_texture(&mut self, id: TextureId, unit: u32) {
        if let Some(entry) = self.textures.get(id) {
            if self.is_web {
                bridge::notify_texture_bind(id.data().as_ffi(), unit);
            }
            unsafe {
                self.gl.active_texture(glow::TEXTURE0 + unit);
                self.gl.bind_texture(entry.target, Some(entry.raw));
            }
        }
    }

    fn unbind_texture(&mut self, target: TextureTarget, unit: u32) {
        let target = self.gl_target(target);
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(target, None);
        }
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(entry) = self.textures.remove(id) {
            unsafe { self.gl.delete_texture(entry.raw) }
        }
    }

    fn create_renderbuffer(
        &mut self,
        width: u32,
        height: u32,
        format: InternalFormat,
    ) -> BackendResult<RenderbufferId> {
        unsafe {
            let rb = self
                .gl
                .create_renderbuffer()
                .map_err(|e| RenderError::Backend(format!("create_renderbuffer: {e}")))?;
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rb));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                internal_format(format),
                width as i32,
                height as i32,
            );
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            Ok(self.renderbuffers.insert(rb))
        }
    }

    fn destroy_renderbuffer(&mut self, id: RenderbufferId) {
        if let Some(rb) = self.renderbuffers.remove(id) {
            unsafe { self.gl.delete_renderbuffer(rb) }
        }
    }

    fn create_framebuffer(&mut self) -> BackendResult<FramebufferId> {
        let fbo = unsafe {
            self.gl
                .create_framebuffer()
                .map_err(|e| RenderError::Backend(format!("create_framebuffer: {e}")))?
        };
        Ok(self.framebuffers.insert(fbo))
    }

    fn attach_color_texture(&mut self, fbo: FramebufferId, tex: TextureId) -> BackendResult<()> {
        let (fbo_raw, tex_raw) = match (self.framebuffers.get(fbo), self.textures.get(tex)) {
            (Some(f), Some(t)) => (*f, t.raw),
            _ => return Err(RenderError::Backend("attach to destroyed object".into())),
        };
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo_raw));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(tex_raw),
                0,
            );
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
        Ok(())
    }

    fn attach_depth_texture(&mut self, fbo: FramebufferId, tex: TextureId) -> BackendResult<()> {
        let (fbo_raw, tex_raw) = match (self.framebuffers.get(fbo), self.textures.get(tex)) {
            (Some(f), Some(t)) => (*f, t.raw),
            _ => return Err(RenderError::Backend("attach to destroyed object".into())),
        };
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo_raw));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::TEXTURE_2D,
                Some(tex_raw),
                0,
            );
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
        Ok(())
    }

    fn attach_depth_renderbuffer(
        &mut self,
        fbo: FramebufferId,
        rb: RenderbufferId,
    ) -> BackendResult<()> {
        let (fbo_raw, rb_raw) = match (self.framebuffers.get(fbo), self.renderbuffers.get(rb)) {
            (Some(f), Some(r)) => (*f, *r),
            _ => return Err(RenderError::Backend("attach to destroyed object".into())),
        };
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo_raw));
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(rb_raw),
            );
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
        Ok(())
    }

    fn framebuffer_status(&mut self, fbo: FramebufferId) -> FramebufferStatus {
        let Some(raw) = self.framebuffers.get(fbo) else {
            return FramebufferStatus::MissingAttachment;
        };
        let status = unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(*raw));
            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            status
        };
        match status {
            glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
            glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => {
                FramebufferStatus::MissingAttachment
            }
            glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
            glow::FRAMEBUFFER_INCOMPLETE_DIMENSIONS => FramebufferStatus::IncompleteDimensions,
            other => FramebufferStatus::Unknown(other),
        }
    }

    fn bind_framebuffer(&mut self, fbo: Option<FramebufferId>) {
        if self.is_web {
            bridge::notify_framebuffer_bind(fbo.map(|id| id.data().as_ffi()));
        }
        let raw = fbo.and_then(|id| self.framebuffers.get(id)).copied();
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, raw) }
    }

    fn destroy_framebuffer(&mut self, id: FramebufferId) {
        if let Some(fbo) = self.framebuffers.remove(id) {
            unsafe { self.gl.delete_framebuffer(fbo) }
        }
    }

    fn draw_mesh(&mut self, mesh: &Mesh) -> BackendResult<()> {
        let Some(stream) = &self.stream else {
            return Err(RenderError::Backend("backend not initialized".into()));
        };
        if mesh.positions.is_empty() {
            return Ok(());
        }
        let gl = &self.gl;
        unsafe {
            gl.bind_vertex_array(Some(stream.vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(stream.positions));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&mesh.positions),
                glow::STREAM_DRAW,
            );
            gl.enable_vertex_attrib_array(attrib::POSITION);
            gl.vertex_attrib_pointer_f32(attrib::POSITION, 3, glow::FLOAT, false, 0, 0);

            if mesh.normals.is_empty() {
                gl.disable_vertex_attrib_array(attrib::NORMAL);
                gl.vertex_attrib_4_f32(attrib::NORMAL, 0.0, 0.0, 1.0, 0.0);
            } else {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(stream.normals));
                gl.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bytemuck::cast_slice(&mesh.normals),
                    glow::STREAM_DRAW,
                );
                gl.enable_vertex_attrib_array(attrib::NORMAL);
                gl.vertex_attrib_pointer_f32(attrib::NORMAL, 3, glow::FLOAT, false, 0, 0);
            }

            if mesh.colors.is_empty() {
                gl.disable_vertex_attrib_array(attrib::COLOR);
                gl.vertex_attrib_4_f32(attrib::COLOR, 1.0, 1.0, 1.0, 1.0);
            } else {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(stream.colors));
                gl.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bytemuck::cast_slice(&mesh.colors),
                    glow::STREAM_DRAW,
                );
                gl.enable_vertex_attrib_array(attrib::COLOR);
                gl.vertex_attrib_pointer_f32(attrib::COLOR, 4, glow::FLOAT, false, 0, 0);
            }

            if mesh.texcoords.is_empty() {
                gl.disable_vertex_attrib_array(attrib::TEXCOORD);
                gl.vertex_attrib_4_f32(attrib::TEXCOORD, 0.0, 0.0, 0.0, 0.0);
            } else {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(stream.texcoords));
                gl.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bytemuck::cast_slice(&mesh.texcoords),
                    glow::STREAM_DRAW,
                );
                gl.enable_vertex_attrib_array(attrib::TEXCOORD);
                gl.vertex_attrib_pointer_f32(attrib::TEXCOORD, 2, glow::FLOAT, false, 0, 0);
            }

            let mode = primitive(mesh.primitive);
            if mesh.indices.is_empty() {
                gl.draw_arrays(mode, 0, mesh.positions.len() as i32);
            } else {
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(stream.elements));
                gl.buffer_data_u8_slice(
                    glow::ELEMENT_ARRAY_BUFFER,
                    bytemuck::cast_slice(&mesh.indices),
                    glow::STREAM_DRAW,
                );
                gl.draw_elements(mode, mesh.indices.len() as i32, glow::UNSIGNED_INT, 0);
            }

            gl.bind_vertex_array(None);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
