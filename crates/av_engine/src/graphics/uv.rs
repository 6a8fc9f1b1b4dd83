//! Automatic texture-coordinate projection
//!
//! Picks a projection from the mesh's shape statistics and writes a
//! texcoord per vertex. The classification thresholds are heuristic and
//! exposed as constants so hosts can tune them:
//!
//! - radial std-dev / mean below [`SPHERICAL_DEVIATION`] → spherical
//! - smallest extent below [`PLANAR_RATIO`] × largest → planar
//! - one axis longer than [`CYLINDRICAL_RATIO`] × both others → cylindrical
//! - anything else → box

use crate::foundation::math::constants::{PI, TAU};
use crate::graphics::mesh::Mesh;

/// Spherical classification threshold (radial std-dev over mean)
pub const SPHERICAL_DEVIATION: f32 = 0.15;

/// Planar classification threshold (min extent over max extent)
pub const PLANAR_RATIO: f32 = 0.1;

/// Cylindrical classification threshold (major axis over others)
pub const CYLINDRICAL_RATIO: f32 = 1.5;

/// Projection kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvProjection {
    /// Pick from shape statistics
    Auto,
    /// Latitude/longitude about the centroid
    Spherical,
    /// Planar along the smallest extent
    Planar,
    /// Around the major axis
    Cylindrical,
    /// Dominant-normal-axis planar per vertex
    Box,
}

/// Classify a mesh using the documented thresholds
pub fn classify(mesh: &Mesh) -> UvProjection {
    if mesh.positions.is_empty() {
        return UvProjection::Planar;
    }
    let (min, max, centroid) = bounds(mesh);
    let extent = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];

    // Radial statistics about the centroid.
    let mut mean = 0.0f32;
    for p in &mesh.positions {
        mean += dist(*p, centroid);
    }
    mean /= mesh.positions.len() as f32;
    let mut variance = 0.0f32;
    for p in &mesh.positions {
        let d = dist(*p, centroid) - mean;
        variance += d * d;
    }
    let std_dev = (variance / mesh.positions.len() as f32).sqrt();

    if mean > f32::EPSILON && std_dev / mean < SPHERICAL_DEVIATION {
        return UvProjection::Spherical;
    }

    let max_extent = extent[0].max(extent[1]).max(extent[2]);
    let min_extent = extent[0].min(extent[1]).min(extent[2]);
    if max_extent > f32::EPSILON && min_extent < PLANAR_RATIO * max_extent {
        return UvProjection::Planar;
    }

    for axis in 0..3 {
        let others = [extent[(axis + 1) % 3], extent[(axis + 2) % 3]];
        if extent[axis] > CYLINDRICAL_RATIO * others[0]
            && extent[axis] > CYLINDRICAL_RATIO * others[1]
        {
            return UvProjection::Cylindrical;
        }
    }

    UvProjection::Box
}

/// Generate texture coordinates in place using the given projection
pub fn generate_uvs(mesh: &mut Mesh, projection: UvProjection) {
    if mesh.positions.is_empty() {
        return;
    }
    let projection = if projection == UvProjection::Auto {
        classify(mesh)
    } else {
        projection
    };
    let (min, max, centroid) = bounds(mesh);
    let extent = [
        (max[0] - min[0]).max(f32::EPSILON),
        (max[1] - min[1]).max(f32::EPSILON),
        (max[2] - min[2]).max(f32::EPSILON),
    ];

    mesh.texcoords = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| match projection {
            UvProjection::Auto => unreachable!("resolved above"),
            UvProjection::Spherical => {
                let d = [p[0] - centroid[0], p[1] - centroid[1], p[2] - centroid[2]];
                let r = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt().max(f32::EPSILON);
                let u = 0.5 + d[2].atan2(d[0]) / TAU;
                let v = 0.5 + (d[1] / r).asin() / PI;
                [u, v]
            }
            UvProjection::Planar => {
                // Project along the thinnest axis.
                let thin = thinnest_axis(extent);
                let (a, b) = ((thin + 1) % 3, (thin + 2) % 3);
                [(p[a] - min[a]) / extent[a], (p[b] - min[b]) / extent[b]]
            }
            UvProjection::Cylindrical => {
                let major = major_axis(extent);
                let (a, b) = ((major + 1) % 3, (major + 2) % 3);
                let u = 0.5
                    + (p[b] - centroid[b]).atan2(p[a] - centroid[a]) / TAU;
                let v = (p[major] - min[major]) / extent[major];
                [u, v]
            }
            UvProjection::Box => {
                // Pick the face by the dominant normal axis when normals
                // exist, else by the dominant position offset.
                let n = mesh
                    .normals
                    .get(i)
                    .copied()
                    .unwrap_or([p[0] - centroid[0], p[1] - centroid[1], p[2] - centroid[2]]);
                let axis = major_axis([n[0].abs(), n[1].abs(), n[2].abs()]);
                let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);
                [(p[a] - min[a]) / extent[a], (p[b] - min[b]) / extent[b]]
            }
        })
        .collect();
}

fn bounds(mesh: &Mesh) -> ([f32; 3], [f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    let mut sum = [0.0f64; 3];
    for p in &mesh.positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
            sum[axis] += f64::from(p[axis]);
        }
    }
    let n = mesh.positions.len() as f64;
    let centroid = [
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ];
    (min, max, centroid)
}

fn dist(a: [f32; 3], b: [f32; 3]) -> f32 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

fn thinnest_axis(extent: [f32; 3]) -> usize {
    let mut axis = 0;
    for i in 1..3 {
        if extent[i] < extent[axis] {
            axis = i;
        }
    }
    axis
}

fn major_axis(extent: [f32; 3]) -> usize {
    let mut axis = 0;
    for i in 1..3 {
        if extent[i] > extent[axis] {
            axis = i;
        }
    }
    axis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::mesh::Primitive;
    use crate::graphics::shapes;

    fn point_cloud(points: &[[f32; 3]]) -> Mesh {
        let mut mesh = Mesh::new(Primitive::Triangles);
        for p in points {
            mesh.vertex(p[0], p[1], p[2]);
        }
        mesh
    }

    #[test]
    fn sphere_classifies_spherical() {
        let mesh = shapes::icosphere(1.0, 2);
        assert_eq!(classify(&mesh), UvProjection::Spherical);
    }

    #[test]
    fn flat_grid_classifies_planar() {
        let mut points = Vec::new();
        for x in -1..=1 {
            for y in -1..=1 {
                points.push([x as f32, y as f32, 0.0]);
            }
        }
        assert_eq!(classify(&point_cloud(&points)), UvProjection::Planar);
    }

    #[test]
    fn column_classifies_cylindrical() {
        let mut points = Vec::new();
        for layer in [-2.0f32, 0.0, 2.0] {
            for step in 0..8 {
                let angle = step as f32 * TAU / 8.0;
                points.push([angle.cos(), layer, angle.sin()]);
            }
        }
        assert_eq!(classify(&point_cloud(&points)), UvProjection::Cylindrical);
    }

    #[test]
    fn cube_with_face_centers_classifies_box() {
        let mut points = vec![
            [1.0, 0.0, 0.0], [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0], [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0], [0.0, 0.0, -1.0],
        ];
        for x in [-1.0f32, 1.0] {
            for y in [-1.0f32, 1.0] {
                for z in [-1.0f32, 1.0] {
                    points.push([x, y, z]);
                }
            }
        }
        assert_eq!(classify(&point_cloud(&points)), UvProjection::Box);
    }

    #[test]
    fn generated_uvs_cover_every_vertex_in_range() {
        let mut mesh = shapes::icosphere(1.0, 1);
        generate_uvs(&mut mesh, UvProjection::Auto);
        assert_eq!(mesh.texcoords.len(), mesh.vertex_count());
        for uv in &mesh.texcoords {
            assert!((-0.001..=1.001).contains(&uv[0]));
            assert!((-0.001..=1.001).contains(&uv[1]));
        }
    }
}
