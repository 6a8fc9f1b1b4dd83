//! Level-of-detail core: mesh simplification, detail pyramids, texture and
//! shader tiers, and the adaptive quality controller

pub mod lod_mesh;
pub mod quality;
pub mod simplify;
pub mod tiers;

pub use lod_mesh::{LodError, LodLevel, LodMesh};
pub use quality::{QualityManager, QualityPreset, QualitySettings};
pub use simplify::{simplify, SimplifyError};
pub use tiers::{ShaderFeatures, ShaderTiers, TextureTiers};
