//! Texture resources
//!
//! A `Texture` owns its descriptor and (lazily) a driver handle. The handle
//! is created the first time the texture is bound or updated through the
//! `Graphics` facade and destroyed with the texture. Binding a texture that
//! has never received storage is a no-op.

use crate::graphics::backend::TextureId;

/// Texture target kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    /// 1D texture. WebGL2 has no 1D targets; the web backend stores these
    /// as 2D textures one texel tall.
    Tex1d,
    /// 2D texture
    Tex2d,
    /// 2D array texture
    Tex2dArray,
    /// 3D texture
    Tex3d,
    /// Cubemap texture
    Cubemap,
}

/// Internal (GPU-side) storage formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalFormat {
    /// 8-bit normalized RGBA
    Rgba8,
    /// 8-bit normalized RGB
    Rgb8,
    /// 16-bit float RGBA
    Rgba16F,
    /// 16-bit float RGB
    Rgb16F,
    /// 32-bit float RGBA
    Rgba32F,
    /// 32-bit float RGB
    Rgb32F,
    /// 24-bit depth
    Depth24,
    /// 32-bit float depth
    Depth32F,
}

impl InternalFormat {
    /// Whether this format stores floating-point color
    pub fn is_float_color(self) -> bool {
        matches!(
            self,
            Self::Rgba16F | Self::Rgb16F | Self::Rgba32F | Self::Rgb32F
        )
    }

    /// Whether this is a depth format
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth24 | Self::Depth32F)
    }
}

/// Client-side pixel data layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Single red channel
    Red,
    /// RGB triples
    Rgb,
    /// RGBA quads
    Rgba,
    /// Depth values
    DepthComponent,
}

/// Client-side component type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    /// Unsigned bytes
    U8,
    /// 32-bit floats
    F32,
}

/// Filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Trilinear across mip levels
    LinearMipmapLinear,
    /// Nearest within a mip level, nearest level
    NearestMipmapNearest,
}

/// Wrap mode per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    /// Clamp to edge texel
    ClampToEdge,
    /// Repeat
    Repeat,
    /// Mirrored repeat
    MirroredRepeat,
}

/// Everything the driver needs to allocate and sample a texture
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    /// Target kind
    pub target: TextureTarget,
    /// Width in texels
    pub width: u32,
    /// Height in texels (1 for 1D)
    pub height: u32,
    /// Depth in texels (array layers for 2D arrays; 1 otherwise)
    pub depth: u32,
    /// GPU storage format
    pub internal: InternalFormat,
    /// Client data layout
    pub format: DataFormat,
    /// Client component type
    pub component: ComponentType,
    /// Minification filter
    pub min_filter: Filter,
    /// Magnification filter
    pub mag_filter: Filter,
    /// Wrap along s
    pub wrap_s: Wrap,
    /// Wrap along t
    pub wrap_t: Wrap,
    /// Wrap along r (3D only)
    pub wrap_r: Wrap,
    /// Generate mipmaps after upload
    pub mipmap: bool,
}

impl TextureDescriptor {
    /// A standard RGBA8 2D texture descriptor
    pub fn rgba8_2d(width: u32, height: u32) -> Self {
        Self {
            target: TextureTarget::Tex2d,
            width,
            height,
            depth: 1,
            internal: InternalFormat::Rgba8,
            format: DataFormat::Rgba,
            component: ComponentType::U8,
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            wrap_s: Wrap::ClampToEdge,
            wrap_t: Wrap::ClampToEdge,
            wrap_r: Wrap::ClampToEdge,
            mipmap: false,
        }
    }

    /// A float color 2D texture descriptor (e.g. for HDR pixel grids)
    pub fn float_2d(width: u32, height: u32, internal: InternalFormat) -> Self {
        Self {
            internal,
            format: if internal.is_float_color() && matches!(internal, InternalFormat::Rgb16F | InternalFormat::Rgb32F) {
                DataFormat::Rgb
            } else {
                DataFormat::Rgba
            },
            component: ComponentType::F32,
            ..Self::rgba8_2d(width, height)
        }
    }

    /// A depth texture descriptor
    pub fn depth_2d(width: u32, height: u32) -> Self {
        Self {
            internal: InternalFormat::Depth24,
            format: DataFormat::DepthComponent,
            component: ComponentType::F32,
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            ..Self::rgba8_2d(width, height)
        }
    }
}

/// A texture resource
///
/// The driver handle is created on first use through the `Graphics` facade
/// and must be released through it as well (`Graphics::destroy_texture`).
#[derive(Debug)]
pub struct Texture {
    /// Allocation and sampling parameters
    pub desc: TextureDescriptor,
    pub(crate) handle: Option<TextureId>,
    pub(crate) pending: Option<Vec<u8>>,
    pub(crate) allocated: bool,
}

impl Texture {
    /// Create a texture with no storage yet
    pub fn new(desc: TextureDescriptor) -> Self {
        Self {
            desc,
            handle: None,
            pending: None,
            allocated: false,
        }
    }

    /// Stage pixel data for upload on the next bind or update.
    ///
    /// The byte slice must match the descriptor's format, component type,
    /// and dimensions.
    pub fn submit(&mut self, data: &[u8]) {
        self.pending = Some(data.to_vec());
    }

    /// Stage float pixel data (convenience over [`Texture::submit`])
    pub fn submit_f32(&mut self, data: &[f32]) {
        self.pending = Some(bytemuck::cast_slice(data).to_vec());
    }

    /// Whether the texture has GPU storage and can be meaningfully bound
    pub fn is_complete(&self) -> bool {
        self.allocated || self.pending.is_some()
    }

    /// Driver-side id, if the texture has been realized
    pub fn id(&self) -> Option<TextureId> {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_texture_is_incomplete() {
        let tex = Texture::new(TextureDescriptor::rgba8_2d(4, 4));
        assert!(!tex.is_complete());
        assert!(tex.id().is_none());
    }

    #[test]
    fn submit_makes_texture_complete() {
        let mut tex = Texture::new(TextureDescriptor::rgba8_2d(2, 2));
        tex.submit(&[0u8; 16]);
        assert!(tex.is_complete());
    }

    #[test]
    fn format_classification() {
        assert!(InternalFormat::Rgba32F.is_float_color());
        assert!(InternalFormat::Rgba16F.is_float_color());
        assert!(!InternalFormat::Rgba8.is_float_color());
        assert!(InternalFormat::Depth24.is_depth());
    }
}
