//! Radiance HDR image loader
//!
//! Decodes `.hdr` (RGBE) images into a flat float pixel grid, row-major
//! RGB triples. Used for HDR environment and lighting textures.

use std::path::Path;

use thiserror::Error;

use crate::graphics::texture::{InternalFormat, Texture, TextureDescriptor};

/// HDR decode errors
#[derive(Error, Debug)]
pub enum HdrError {
    /// Underlying I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The image crate rejected the data
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// A decoded float image: `width · height` RGB triples, row major
#[derive(Debug, Clone)]
pub struct PixelGrid {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGB float data, `3 · width · height` values
    pub data: Vec<f32>,
}

impl PixelGrid {
    /// Load a Radiance HDR file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HdrError> {
        let path_ref = path.as_ref();
        log::debug!("loading HDR image from {path_ref:?}");
        let image = image::open(path_ref)?;
        Ok(Self::from_dynamic(image))
    }

    /// Decode a Radiance HDR image from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HdrError> {
        let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Hdr)?;
        Ok(Self::from_dynamic(image))
    }

    fn from_dynamic(image: image::DynamicImage) -> Self {
        let rgb = image.to_rgb32f();
        let (width, height) = rgb.dimensions();
        log::info!("decoded HDR image {width}x{height}");
        Self {
            width,
            height,
            data: rgb.into_raw(),
        }
    }

    /// A solid-color grid (tests and fallbacks)
    pub fn solid(width: u32, height: u32, rgb: [f32; 3]) -> Self {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self { width, height, data }
    }

    /// RGB triple at a pixel coordinate
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        debug_assert!(x < self.width && y < self.height);
        let base = ((y * self.width + x) * 3) as usize;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }

    /// Wrap the grid in a float texture ready for upload. The internal
    /// format should come from the capability record's recommendation for
    /// the intended use.
    pub fn to_texture(&self, internal: InternalFormat) -> Texture {
        let mut tex = Texture::new(TextureDescriptor::float_2d(self.width, self.height, internal));
        tex.submit_f32(&self.data);
        tex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_grid_addresses_pixels_row_major() {
        let grid = PixelGrid::solid(4, 2, [0.25, 0.5, 2.0]);
        assert_eq!(grid.data.len(), 4 * 2 * 3);
        assert_eq!(grid.pixel(3, 1), [0.25, 0.5, 2.0]);
    }

    #[test]
    fn decodes_a_minimal_radiance_file() {
        // A 1x1 flat (non-RLE) Radiance file. RGBE (128,128,128,129)
        // decodes to (0.5 * 2^1) = 1.0 per channel.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"#?RADIANCE\n");
        bytes.extend_from_slice(b"FORMAT=32-bit_rle_rgbe\n\n");
        bytes.extend_from_slice(b"-Y 1 +X 1\n");
        bytes.extend_from_slice(&[128, 128, 128, 129]);

        let grid = PixelGrid::from_bytes(&bytes).expect("valid minimal HDR");
        assert_eq!(grid.width, 1);
        assert_eq!(grid.height, 1);
        let [r, g, b] = grid.pixel(0, 0);
        assert!((r - 1.0).abs() < 1e-3, "r = {r}");
        assert!((g - 1.0).abs() < 1e-3);
        assert!((b - 1.0).abs() < 1e-3);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            PixelGrid::from_bytes(b"not an hdr file"),
            Err(HdrError::Decode(_))
        ));
    }

    #[test]
    fn texture_wrapping_stages_the_float_data() {
        let grid = PixelGrid::solid(2, 2, [1.0, 0.5, 0.25]);
        let tex = grid.to_texture(InternalFormat::Rgb32F);
        assert!(tex.is_complete());
        assert_eq!(tex.desc.width, 2);
        assert_eq!(tex.desc.internal, InternalFormat::Rgb32F);
    }
}
