//! Backend capability record
//!
//! A read-only snapshot of what the underlying driver supports, populated
//! once at startup and cached. On the native path the GL backend fills it
//! from driver queries; on the browser path the host reports detected
//! features through the capability entry points before any draw occurs,
//! and those reports overlay the conservative defaults.

use bitflags::bitflags;

use crate::graphics::texture::InternalFormat;

bitflags! {
    /// Compressed texture format families the driver accepts
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompressionFormats: u32 {
        /// DXT / BC1-3
        const S3TC = 1 << 0;
        /// ETC2 / EAC
        const ETC2 = 1 << 1;
        /// ASTC LDR
        const ASTC = 1 << 2;
        /// BC6H / BC7
        const BPTC = 1 << 3;
    }
}

/// Snapshot of driver and host capabilities
#[derive(Debug, Clone)]
pub struct GraphicsCapabilities {
    /// Float textures can be sampled
    pub float_texture_readable: bool,
    /// 32-bit float textures can be render targets
    pub float_texture_renderable: bool,
    /// Float textures can use linear filtering
    pub float_texture_linear: bool,
    /// 16-bit float textures can be render targets
    pub half_float_renderable: bool,
    /// Anisotropic filtering available
    pub anisotropic: bool,
    /// Maximum anisotropy (1.0 when unavailable)
    pub max_anisotropy: f32,
    /// Supported compressed formats
    pub compression: CompressionFormats,
    /// Maximum 2D texture dimension
    pub max_texture_size: u32,
    /// Maximum cubemap face dimension
    pub max_cubemap_size: u32,
    /// Maximum 2D-array layer count
    pub max_array_layers: u32,
    /// Maximum 3D texture dimension
    pub max_3d_size: u32,
    /// Maximum framebuffer color attachments
    pub max_color_attachments: u32,
    /// Maximum simultaneous draw buffers
    pub max_draw_buffers: u32,
    /// Driver vendor string
    pub vendor: String,
    /// Driver renderer string
    pub renderer: String,
}

impl Default for GraphicsCapabilities {
    /// Conservative baseline: what any WebGL2 context guarantees
    fn default() -> Self {
        Self {
            float_texture_readable: true,
            float_texture_renderable: false,
            float_texture_linear: false,
            half_float_renderable: false,
            anisotropic: false,
            max_anisotropy: 1.0,
            compression: CompressionFormats::empty(),
            max_texture_size: 2048,
            max_cubemap_size: 2048,
            max_array_layers: 256,
            max_3d_size: 256,
            max_color_attachments: 4,
            max_draw_buffers: 4,
            vendor: String::new(),
            renderer: String::new(),
        }
    }
}

impl GraphicsCapabilities {
    /// Record a host-reported boolean feature. Names follow the entry-point
    /// contract; unknown names are logged and ignored.
    pub fn report(&mut self, name: &str, supported: bool) {
        match name {
            "float-renderable" => self.float_texture_renderable = supported,
            "float-readable" => self.float_texture_readable = supported,
            "float-linear" => self.float_texture_linear = supported,
            "half-float-renderable" => self.half_float_renderable = supported,
            "anisotropic" => self.anisotropic = supported,
            "s3tc" => self.compression.set(CompressionFormats::S3TC, supported),
            "etc2" => self.compression.set(CompressionFormats::ETC2, supported),
            "astc" => self.compression.set(CompressionFormats::ASTC, supported),
            "bptc" => self.compression.set(CompressionFormats::BPTC, supported),
            _ => log::warn!("unknown capability report: {name}"),
        }
    }

    /// Record a host-reported numeric limit
    pub fn report_limit(&mut self, name: &str, value: u32) {
        match name {
            "max-texture-size" => self.max_texture_size = value,
            "max-cubemap-size" => self.max_cubemap_size = value,
            "max-array-layers" => self.max_array_layers = value,
            "max-3d-size" => self.max_3d_size = value,
            "max-color-attachments" => self.max_color_attachments = value,
            "max-draw-buffers" => self.max_draw_buffers = value,
            "max-anisotropy" => self.max_anisotropy = value as f32,
            _ => log::warn!("unknown capability limit: {name}"),
        }
    }

    /// Record driver identification strings
    pub fn report_driver_info(&mut self, vendor: &str, renderer: &str) {
        self.vendor = vendor.to_string();
        self.renderer = renderer.to_string();
    }

    /// Pick the best available internal format for a color texture.
    ///
    /// When `renderable` is requested the format must work as a render
    /// target: prefer 32-bit float, fall back to 16-bit float, then 8-bit
    /// normalized. Non-renderable requests only need to be sampleable.
    pub fn recommended_internal_format(&self, renderable: bool, has_alpha: bool) -> InternalFormat {
        if renderable {
            if self.float_texture_renderable {
                if has_alpha { InternalFormat::Rgba32F } else { InternalFormat::Rgb32F }
            } else if self.half_float_renderable {
                if has_alpha { InternalFormat::Rgba16F } else { InternalFormat::Rgb16F }
            } else if has_alpha {
                InternalFormat::Rgba8
            } else {
                InternalFormat::Rgb8
            }
        } else if self.float_texture_readable {
            if has_alpha { InternalFormat::Rgba32F } else { InternalFormat::Rgb32F }
        } else if has_alpha {
            InternalFormat::Rgba8
        } else {
            InternalFormat::Rgb8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downgrade_chain_without_float_render_targets() {
        let caps = GraphicsCapabilities {
            float_texture_renderable: false,
            half_float_renderable: false,
            ..Default::default()
        };
        let format = caps.recommended_internal_format(true, true);
        assert_eq!(format, InternalFormat::Rgba8);

        let caps = GraphicsCapabilities {
            float_texture_renderable: false,
            half_float_renderable: true,
            ..Default::default()
        };
        let format = caps.recommended_internal_format(true, true);
        assert_eq!(format, InternalFormat::Rgba16F);
        assert_ne!(format, InternalFormat::Rgba32F);
    }

    #[test]
    fn full_float_support_prefers_32_bit() {
        let caps = GraphicsCapabilities {
            float_texture_renderable: true,
            ..Default::default()
        };
        assert_eq!(caps.recommended_internal_format(true, true), InternalFormat::Rgba32F);
        assert_eq!(caps.recommended_internal_format(true, false), InternalFormat::Rgb32F);
    }

    #[test]
    fn host_reports_overlay_defaults() {
        let mut caps = GraphicsCapabilities::default();
        caps.report("float-renderable", true);
        caps.report("astc", true);
        caps.report_limit("max-texture-size", 16384);
        assert!(caps.float_texture_renderable);
        assert!(caps.compression.contains(CompressionFormats::ASTC));
        assert_eq!(caps.max_texture_size, 16384);
    }
}
