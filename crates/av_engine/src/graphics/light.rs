//! Lighting primitives for the built-in shading path

use crate::foundation::math::{Vec3, Vec4};

/// Maximum lights the built-in shader consumes
pub const MAX_LIGHTS: usize = 8;

/// A light source
///
/// The position's w component selects the kind: 0 for directional (xyz is
/// the direction toward the light), 1 for positional.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    /// Position or direction, disambiguated by w
    pub position: Vec4,
    /// Diffuse contribution
    pub diffuse: [f32; 3],
    /// Ambient contribution
    pub ambient: [f32; 3],
}

impl Light {
    /// Create a directional light shining along `-direction`
    pub fn directional(direction: Vec3, diffuse: [f32; 3]) -> Self {
        let d = direction.normalize();
        Self {
            position: Vec4::new(-d.x, -d.y, -d.z, 0.0),
            diffuse,
            ambient: [0.05, 0.05, 0.05],
        }
    }

    /// Create a point light at a world position
    pub fn point(position: Vec3, diffuse: [f32; 3]) -> Self {
        Self {
            position: Vec4::new(position.x, position.y, position.z, 1.0),
            diffuse,
            ambient: [0.05, 0.05, 0.05],
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::directional(Vec3::new(0.0, -1.0, -1.0), [1.0, 1.0, 1.0])
    }
}

/// Surface reflectance parameters
#[derive(Debug, Clone, Copy)]
pub struct Material {
    /// Diffuse reflectance
    pub diffuse: [f32; 3],
    /// Ambient reflectance
    pub ambient: [f32; 3],
    /// Specular reflectance
    pub specular: [f32; 3],
    /// Specular exponent
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [0.8, 0.8, 0.8],
            ambient: [1.0, 1.0, 1.0],
            specular: [0.2, 0.2, 0.2],
            shininess: 32.0,
        }
    }
}
