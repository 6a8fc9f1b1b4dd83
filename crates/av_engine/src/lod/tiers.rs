//! Texture and shader tier selection
//!
//! Parallel structures to the mesh pyramid: instead of geometry they
//! select a texture resolution or a vector of enabled shading effects
//! from a view distance or screen coverage. The same bias multiplier the
//! quality ladder drives applies here.

/// One texture tier
#[derive(Debug, Clone, Copy)]
pub struct TextureTier {
    /// Texture edge resolution at this tier
    pub resolution: u32,
    /// Selected for distances up to this value
    pub max_distance: f32,
    /// Selected for coverage down to this value
    pub screen_coverage: f32,
}

/// Distance-indexed texture resolution selector
#[derive(Debug, Clone, Default)]
pub struct TextureTiers {
    tiers: Vec<TextureTier>,
    /// Selection bias multiplier
    pub bias: f32,
}

impl TextureTiers {
    /// Build a halving pyramid: `base` at distance 10, halved resolution
    /// per doubled distance, down to a 32-texel floor.
    pub fn pyramid(base_resolution: u32, levels: usize) -> Self {
        let mut tiers = Vec::new();
        for k in 0..levels.max(1) {
            tiers.push(TextureTier {
                resolution: (base_resolution >> k).max(32),
                max_distance: 10.0 * (1u32 << k) as f32,
                screen_coverage: 0.5 / (1u32 << k) as f32,
            });
        }
        Self { tiers, bias: 1.0 }
    }

    /// All tiers
    pub fn tiers(&self) -> &[TextureTier] {
        &self.tiers
    }

    /// Resolution for a view distance
    pub fn select_by_distance(&self, distance: f32) -> Option<&TextureTier> {
        let d = distance * self.bias;
        self.tiers
            .iter()
            .find(|t| t.max_distance > d)
            .or_else(|| self.tiers.last())
    }

    /// Resolution for a screen coverage
    pub fn select_by_coverage(&self, coverage: f32) -> Option<&TextureTier> {
        let c = coverage / self.bias.max(f32::EPSILON);
        self.tiers
            .iter()
            .find(|t| t.screen_coverage <= c)
            .or_else(|| self.tiers.last())
    }
}

/// Effects enabled at a shader tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderFeatures {
    /// Tangent-space normal mapping
    pub normal_mapping: bool,
    /// Receives shadow-map lookups
    pub receive_shadows: bool,
    /// Planar/environment reflections
    pub reflections: bool,
    /// Number of lights evaluated
    pub light_count: u32,
}

impl ShaderFeatures {
    /// Everything on
    pub fn full() -> Self {
        Self {
            normal_mapping: true,
            receive_shadows: true,
            reflections: true,
            light_count: 8,
        }
    }

    /// Cheapest shading: one light, no effects
    pub fn minimal() -> Self {
        Self {
            normal_mapping: false,
            receive_shadows: false,
            reflections: false,
            light_count: 1,
        }
    }
}

/// One shader tier
#[derive(Debug, Clone, Copy)]
pub struct ShaderTier {
    /// Effects enabled at this tier
    pub features: ShaderFeatures,
    /// Selected for distances up to this value
    pub max_distance: f32,
    /// Selected for coverage down to this value
    pub screen_coverage: f32,
}

/// Distance-indexed shading-effect selector
#[derive(Debug, Clone, Default)]
pub struct ShaderTiers {
    tiers: Vec<ShaderTier>,
    /// Selection bias multiplier
    pub bias: f32,
}

impl ShaderTiers {
    /// A standard three-tier ladder: full effects close up, shadows only
    /// at mid range, minimal shading in the distance.
    pub fn standard() -> Self {
        let tiers = vec![
            ShaderTier {
                features: ShaderFeatures::full(),
                max_distance: 10.0,
                screen_coverage: 0.5,
            },
            ShaderTier {
                features: ShaderFeatures {
                    normal_mapping: false,
                    receive_shadows: true,
                    reflections: false,
                    light_count: 4,
                },
                max_distance: 40.0,
                screen_coverage: 0.1,
            },
            ShaderTier {
                features: ShaderFeatures::minimal(),
                max_distance: 160.0,
                screen_coverage: 0.01,
            },
        ];
        Self { tiers, bias: 1.0 }
    }

    /// All tiers
    pub fn tiers(&self) -> &[ShaderTier] {
        &self.tiers
    }

    /// Features for a view distance
    pub fn select_by_distance(&self, distance: f32) -> Option<&ShaderTier> {
        let d = distance * self.bias;
        self.tiers
            .iter()
            .find(|t| t.max_distance > d)
            .or_else(|| self.tiers.last())
    }

    /// Features for a screen coverage
    pub fn select_by_coverage(&self, coverage: f32) -> Option<&ShaderTier> {
        let c = coverage / self.bias.max(f32::EPSILON);
        self.tiers
            .iter()
            .find(|t| t.screen_coverage <= c)
            .or_else(|| self.tiers.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_resolution_halves_with_distance() {
        let tiers = TextureTiers::pyramid(1024, 4);
        assert_eq!(tiers.select_by_distance(5.0).unwrap().resolution, 1024);
        assert_eq!(tiers.select_by_distance(15.0).unwrap().resolution, 512);
        assert_eq!(tiers.select_by_distance(30.0).unwrap().resolution, 256);
        assert_eq!(tiers.select_by_distance(1000.0).unwrap().resolution, 128);
    }

    #[test]
    fn texture_resolution_floors_at_32() {
        let tiers = TextureTiers::pyramid(64, 5);
        assert_eq!(tiers.tiers().last().unwrap().resolution, 32);
    }

    #[test]
    fn shader_effects_fall_away_with_distance() {
        let tiers = ShaderTiers::standard();
        let near = tiers.select_by_distance(2.0).unwrap().features;
        let mid = tiers.select_by_distance(25.0).unwrap().features;
        let far = tiers.select_by_distance(500.0).unwrap().features;

        assert!(near.normal_mapping && near.reflections);
        assert!(!mid.normal_mapping && mid.receive_shadows);
        assert_eq!(far, ShaderFeatures::minimal());
        assert!(near.light_count >= mid.light_count);
        assert!(mid.light_count >= far.light_count);
    }

    #[test]
    fn bias_coarsens_shader_selection() {
        let mut tiers = ShaderTiers::standard();
        assert!(tiers.select_by_distance(8.0).unwrap().features.normal_mapping);
        tiers.bias = 4.0;
        assert!(!tiers.select_by_distance(8.0).unwrap().features.normal_mapping);
    }
}
