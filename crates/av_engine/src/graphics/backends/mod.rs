//! Graphics backend implementations
//!
//! `gl` drives native OpenGL and browser WebGL2 through `glow`; `headless`
//! records commands for tests and context-free hosts.

pub mod gl;
pub mod headless;
