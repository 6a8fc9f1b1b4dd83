//! Distance-selectable mesh pyramid
//!
//! A `LodMesh` holds an ordered list of detail levels, level 0 being the
//! full-detail source. Levels are keyed by a maximum view distance and a
//! minimum screen coverage; selection walks the list in order. A global
//! bias multiplier shifts every threshold at once, which is the knob the
//! adaptive quality controller turns.

use thiserror::Error;

use crate::graphics::mesh::Mesh;
use crate::lod::simplify::{simplify, SimplifyError};

/// Default distance threshold for level k: `10 · 2^k`
fn default_max_distance(level: usize) -> f32 {
    10.0 * (1u32 << level) as f32
}

/// Default coverage threshold for level k: `0.5 · 2^-k`
fn default_coverage(level: usize) -> f32 {
    0.5 / (1u32 << level) as f32
}

/// Level-ordering errors
#[derive(Error, Debug)]
pub enum LodError {
    /// Levels must be pushed with strictly increasing max distance
    #[error("level max_distance {given} does not exceed previous {previous}")]
    UnorderedLevels {
        /// Distance of the rejected level
        given: f32,
        /// Distance of the last accepted level
        previous: f32,
    },
}

/// One entry of the pyramid
#[derive(Debug, Clone)]
pub struct LodLevel {
    /// The mesh drawn at this level
    pub mesh: Mesh,
    /// Selected for view distances up to this value
    pub max_distance: f32,
    /// Selected for screen coverage down to this value
    pub screen_coverage: f32,
    /// Cached triangle count of `mesh`
    pub triangle_count: usize,
}

/// An ordered pyramid of progressively simplified meshes
#[derive(Debug, Clone, Default)]
pub struct LodMesh {
    levels: Vec<LodLevel>,
    /// Bias multiplier applied to selection inputs; > 1 prefers coarser
    /// levels, < 1 finer ones
    pub bias: f32,
}

impl LodMesh {
    /// An empty pyramid
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            bias: 1.0,
        }
    }

    /// Build a pyramid from a source mesh.
    ///
    /// Level 0 is the source; level k ≥ 1 simplifies the source with ratio
    /// `factor^k`. Distance and coverage thresholds take the documented
    /// defaults (`10·2^k`, `0.5·2^-k`).
    pub fn generate(source: Mesh, levels: usize, factor: f32) -> Result<Self, SimplifyError> {
        let mut lod = Self::new();
        let count = levels.max(1);
        for k in 0..count {
            let mesh = if k == 0 {
                source.clone()
            } else {
                simplify(&source, factor.powi(k as i32))?
            };
            let triangle_count = mesh.triangle_count();
            lod.levels.push(LodLevel {
                mesh,
                max_distance: default_max_distance(k),
                screen_coverage: default_coverage(k),
                triangle_count,
            });
        }
        Ok(lod)
    }

    /// Append a level with explicit thresholds. The distance must strictly
    /// exceed the previous level's.
    pub fn push_level(
        &mut self,
        mesh: Mesh,
        max_distance: f32,
        screen_coverage: f32,
    ) -> Result<(), LodError> {
        if let Some(last) = self.levels.last() {
            if max_distance <= last.max_distance {
                return Err(LodError::UnorderedLevels {
                    given: max_distance,
                    previous: last.max_distance,
                });
            }
        }
        let triangle_count = mesh.triangle_count();
        self.levels.push(LodLevel {
            mesh,
            max_distance,
            screen_coverage,
            triangle_count,
        });
        Ok(())
    }

    /// All levels, coarsest last
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    /// The full-detail source mesh (level 0)
    pub fn full_detail(&self) -> Option<&Mesh> {
        self.levels.first().map(|l| &l.mesh)
    }

    /// Select by view distance: the first level whose max distance exceeds
    /// `distance · bias`, falling back to the coarsest.
    pub fn select_by_distance(&self, distance: f32) -> Option<&LodLevel> {
        let d = distance * self.bias;
        self.levels
            .iter()
            .find(|level| level.max_distance > d)
            .or_else(|| self.levels.last())
    }

    /// Select by screen coverage (0..1): the first level whose coverage
    /// threshold is at or below `coverage / bias`, falling back to the
    /// coarsest.
    pub fn select_by_coverage(&self, coverage: f32) -> Option<&LodLevel> {
        let c = coverage / self.bias.max(f32::EPSILON);
        self.levels
            .iter()
            .find(|level| level.screen_coverage <= c)
            .or_else(|| self.levels.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::shapes;

    fn pyramid() -> LodMesh {
        LodMesh::generate(shapes::icosphere(1.0, 3), 4, 0.5).unwrap()
    }

    #[test]
    fn generate_produces_descending_detail() {
        let lod = pyramid();
        assert_eq!(lod.levels().len(), 4);
        let counts: Vec<usize> = lod.levels().iter().map(|l| l.triangle_count).collect();
        assert!(counts.windows(2).all(|w| w[1] < w[0]), "{counts:?}");
    }

    #[test]
    fn selection_triangle_count_never_increases_with_distance() {
        let lod = pyramid();
        let mut previous = usize::MAX;
        for distance in [0.0, 5.0, 15.0, 30.0, 70.0, 200.0, 1000.0] {
            let level = lod.select_by_distance(distance).unwrap();
            assert!(
                level.triangle_count <= previous,
                "distance {distance} selected finer detail"
            );
            previous = level.triangle_count;
        }
    }

    #[test]
    fn distance_thresholds_follow_the_doubling_default() {
        let lod = pyramid();
        let distances: Vec<f32> = lod.levels().iter().map(|l| l.max_distance).collect();
        assert_eq!(distances, vec![10.0, 20.0, 40.0, 80.0]);
    }

    #[test]
    fn beyond_the_last_threshold_falls_back_to_the_coarsest() {
        let lod = pyramid();
        let coarsest = lod.levels().last().unwrap().triangle_count;
        assert_eq!(
            lod.select_by_distance(1.0e6).unwrap().triangle_count,
            coarsest
        );
    }

    #[test]
    fn bias_shifts_selection_coarser() {
        let mut lod = pyramid();
        let fine = lod.select_by_distance(15.0).unwrap().triangle_count;
        lod.bias = 4.0;
        let coarse = lod.select_by_distance(15.0).unwrap().triangle_count;
        assert!(coarse < fine);
    }

    #[test]
    fn coverage_selection_prefers_detail_for_large_coverage() {
        let lod = pyramid();
        let large = lod.select_by_coverage(0.9).unwrap().triangle_count;
        let small = lod.select_by_coverage(0.01).unwrap().triangle_count;
        assert!(large > small);
    }

    #[test]
    fn push_level_enforces_ordering() {
        let mut lod = LodMesh::new();
        lod.push_level(shapes::cube(1.0), 10.0, 0.5).unwrap();
        let err = lod.push_level(shapes::cube(1.0), 5.0, 0.25);
        assert!(matches!(err, Err(LodError::UnorderedLevels { .. })));
    }
}
