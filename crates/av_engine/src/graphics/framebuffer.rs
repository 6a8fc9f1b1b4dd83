//! Framebuffer and renderbuffer resources
//!
//! A framebuffer is complete once it has exactly one color texture
//! attachment and a depth attachment (texture or renderbuffer) of matching
//! dimensions. Completeness is reported as a named status; drawing into an
//! incomplete framebuffer is undefined and the facade logs it.

use crate::graphics::backend::{FramebufferId, RenderbufferId, TextureId};
use crate::graphics::texture::Texture;

/// Completeness status of a framebuffer, as named by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Ready to render into
    Complete,
    /// An attachment is unusable
    IncompleteAttachment,
    /// No attachments at all
    MissingAttachment,
    /// The combination is unsupported by the driver
    Unsupported,
    /// Attachment dimensions disagree
    IncompleteDimensions,
    /// Any other driver status code
    Unknown(u32),
}

impl FramebufferStatus {
    /// Stable name for logs and error reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::IncompleteAttachment => "incomplete-attachment",
            Self::MissingAttachment => "missing-attachment",
            Self::Unsupported => "unsupported",
            Self::IncompleteDimensions => "incomplete-dimensions",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Depth attachment variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthAttachment {
    /// No depth attachment yet
    None,
    /// Depth stored in a sampleable texture
    Texture(TextureId),
    /// Depth stored in a renderbuffer
    Renderbuffer(RenderbufferId),
}

/// A framebuffer object and its attachments
#[derive(Debug)]
pub struct Framebuffer {
    pub(crate) handle: FramebufferId,
    pub(crate) color: Option<TextureId>,
    pub(crate) depth: DepthAttachment,
    /// Width of the attachments in pixels
    pub width: u32,
    /// Height of the attachments in pixels
    pub height: u32,
}

impl Framebuffer {
    /// Driver-side id
    pub fn id(&self) -> FramebufferId {
        self.handle
    }

    /// Color attachment id, if attached
    pub fn color_attachment(&self) -> Option<TextureId> {
        self.color
    }

    /// Depth attachment
    pub fn depth_attachment(&self) -> DepthAttachment {
        self.depth
    }
}

/// An eagerly created offscreen render target: a framebuffer with a color
/// texture and a depth renderbuffer, sized together.
///
/// Built through `Graphics::create_render_target`, which consults the
/// capability record so a float request degrades to the best renderable
/// format instead of failing.
#[derive(Debug)]
pub struct RenderTarget {
    /// The framebuffer
    pub framebuffer: Framebuffer,
    /// The color attachment; its descriptor reports the format actually
    /// allocated after any capability downgrade
    pub color: Texture,
    pub(crate) depth: RenderbufferId,
}

impl RenderTarget {
    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.framebuffer.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.framebuffer.height
    }
}
