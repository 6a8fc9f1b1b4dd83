//! Image loading utilities for texture data
//!
//! PNG (and other LDR formats the `image` crate recognizes) decoded to
//! RGBA8 and staged into a texture. HDR radiance images have their own
//! loader in [`crate::assets::hdr_loader`].

use std::path::Path;

use thiserror::Error;

use crate::graphics::texture::{Texture, TextureDescriptor};

/// Image decode errors
#[derive(Error, Debug)]
pub enum ImageLoadError {
    /// Underlying I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The image crate rejected the data
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded RGBA pixel data ready for GPU upload
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ImageLoadError> {
        let path_ref = path.as_ref();
        log::debug!("loading image from {path_ref:?}");
        let rgba = image::open(path_ref)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::info!("loaded image {width}x{height} from {path_ref:?}");
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Load an image from memory (embedded resources)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageLoadError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// A solid color image (tests and fallbacks)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        Self { data, width, height }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether both dimensions are powers of two (mipmap friendly)
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    /// Stage the pixels into an RGBA8 texture
    pub fn to_texture(&self) -> Texture {
        let mut desc = TextureDescriptor::rgba8_2d(self.width, self.height);
        desc.mipmap = self.is_power_of_two();
        let mut tex = Texture::new(desc);
        tex.submit(&self.data);
        tex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_color_image_layout() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.size_bytes(), 4 * 4 * 4);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn power_of_two_detection() {
        assert!(ImageData::solid_color(256, 256, [0; 4]).is_power_of_two());
        assert!(!ImageData::solid_color(100, 100, [0; 4]).is_power_of_two());
    }

    #[test]
    fn texture_staging_marks_mipmaps_for_pot_images() {
        let tex = ImageData::solid_color(64, 64, [1, 2, 3, 4]).to_texture();
        assert!(tex.is_complete());
        assert!(tex.desc.mipmap);

        let tex = ImageData::solid_color(100, 50, [1, 2, 3, 4]).to_texture();
        assert!(!tex.desc.mipmap);
    }
}
