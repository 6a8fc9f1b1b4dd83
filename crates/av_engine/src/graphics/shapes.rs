//! Procedural mesh primitives
//!
//! Generators for the basic shapes examples and tests lean on. All emit
//! indexed `Triangles` meshes with normals; the icosphere shares vertices
//! across faces so it stays a closed manifold at every subdivision level.

use std::collections::HashMap;

use crate::graphics::mesh::{Mesh, Primitive};

/// Axis-aligned cube with the given half extent, centered at the origin.
///
/// Uses 24 vertices (4 per face) so each face gets a flat normal.
pub fn cube(half: f32) -> Mesh {
    let mut mesh = Mesh::new(Primitive::Triangles);
    let h = half;

    // (normal, four corners counter-clockwise seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
        ([0.0, 0.0, -1.0], [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
        ([1.0, 0.0, 0.0], [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]),
        ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ([0.0, 1.0, 0.0], [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]),
        ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
    ];

    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    for (normal, corners) in faces {
        let base = mesh.vertex_count() as u32;
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            mesh.vertex(corner[0], corner[1], corner[2]);
            mesh.normal(normal[0], normal[1], normal[2]);
            mesh.texcoord(uv[0], uv[1]);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Unit quad in the xy plane, facing +z
pub fn quad(width: f32, height: f32) -> Mesh {
    let mut mesh = Mesh::new(Primitive::Triangles);
    let (hw, hh) = (width * 0.5, height * 0.5);
    let corners = [[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    for (c, uv) in corners.iter().zip(uvs.iter()) {
        mesh.vertex(c[0], c[1], 0.0);
        mesh.normal(0.0, 0.0, 1.0);
        mesh.texcoord(uv[0], uv[1]);
    }
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    mesh
}

/// Icosphere: a subdivided icosahedron projected onto a sphere.
///
/// Subdivision k multiplies the face count by 4; vertex counts run
/// 12, 42, 162, 642, 2562, ... Midpoint vertices are shared through a
/// cache so every edge borders exactly two triangles.
pub fn icosphere(radius: f32, subdivisions: u32) -> Mesh {
    // Golden-ratio icosahedron
    let t = (1.0 + 5.0f32.sqrt()) * 0.5;
    let mut positions: Vec<[f32; 3]> = [
        [-1.0, t, 0.0], [1.0, t, 0.0], [-1.0, -t, 0.0], [1.0, -t, 0.0],
        [0.0, -1.0, t], [0.0, 1.0, t], [0.0, -1.0, -t], [0.0, 1.0, -t],
        [t, 0.0, -1.0], [t, 0.0, 1.0], [-t, 0.0, -1.0], [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|p| normalize(*p))
    .collect();

    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(&mut positions, &mut midpoints, a, b);
            let bc = midpoint(&mut positions, &mut midpoints, b, c);
            let ca = midpoint(&mut positions, &mut midpoints, c, a);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        faces = next;
    }

    let mut mesh = Mesh::new(Primitive::Triangles);
    for p in &positions {
        mesh.vertex(p[0] * radius, p[1] * radius, p[2] * radius);
        // On a unit sphere the normal is the position.
        mesh.normal(p[0], p[1], p[2]);
    }
    for [a, b, c] in faces {
        mesh.indices.extend_from_slice(&[a, b, c]);
    }
    mesh
}

fn normalize(p: [f32; 3]) -> [f32; 3] {
    let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
    [p[0] / len, p[1] / len, p[2] / len]
}

fn midpoint(
    positions: &mut Vec<[f32; 3]>,
    cache: &mut HashMap<(u32, u32), u32>,
    a: u32,
    b: u32,
) -> u32 {
    let key = (a.min(b), a.max(b));
    if let Some(&idx) = cache.get(&key) {
        return idx;
    }
    let pa = positions[a as usize];
    let pb = positions[b as usize];
    let mid = normalize([
        (pa[0] + pb[0]) * 0.5,
        (pa[1] + pb[1]) * 0.5,
        (pa[2] + pb[2]) * 0.5,
    ]);
    let idx = positions.len() as u32;
    positions.push(mid);
    cache.insert(key, idx);
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Count how many triangles border each edge; a closed manifold has
    /// exactly two everywhere.
    pub(crate) fn is_closed_manifold(mesh: &Mesh) -> bool {
        let mut edge_count: HashMap<(u32, u32), u32> = HashMap::new();
        for [a, b, c] in mesh.triangles() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edge_count.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        !edge_count.is_empty() && edge_count.values().all(|&n| n == 2)
    }

    #[test]
    fn icosphere_vertex_counts_follow_subdivision() {
        assert_eq!(icosphere(1.0, 0).vertex_count(), 12);
        assert_eq!(icosphere(1.0, 1).vertex_count(), 42);
        assert_eq!(icosphere(1.0, 2).vertex_count(), 162);
        assert_eq!(icosphere(1.0, 3).vertex_count(), 642);
        assert_eq!(icosphere(1.0, 4).vertex_count(), 2562);
    }

    #[test]
    fn icosphere_is_closed() {
        for sub in 0..3 {
            assert!(is_closed_manifold(&icosphere(1.0, sub)), "subdivision {sub}");
        }
    }

    #[test]
    fn icosphere_vertices_sit_on_the_sphere() {
        let mesh = icosphere(2.0, 2);
        for p in &mesh.positions {
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((r - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn cube_face_count() {
        let mesh = cube(1.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.validate().is_ok());
    }
}
