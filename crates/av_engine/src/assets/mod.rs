//! Asset loading: OBJ meshes, LDR images, and Radiance HDR pixel grids
//!
//! Both formats are consumed, never produced, and both parse once at load
//! time into plain data (`Mesh`, `PixelGrid`). Parse failures are
//! recoverable: the caller gets an error and subsequent drawing stays
//! well-defined, just without the asset.

pub mod hdr_loader;
pub mod image_loader;
pub mod obj_loader;

pub use hdr_loader::{HdrError, PixelGrid};
pub use image_loader::{ImageData, ImageLoadError};
pub use obj_loader::{ObjError, ObjLoader};
