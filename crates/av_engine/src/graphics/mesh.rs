//! Mesh representation for 3D geometry
//!
//! A mesh is a primitive kind plus parallel per-vertex attribute arrays
//! (positions, normals, colors, texture coordinates) and an optional index
//! array. Attribute arrays are either empty or exactly as long as the
//! position array; `draw` rejects anything else.
//!
//! Meshes are plain CPU-side data. The graphics backend streams them to the
//! driver at draw time, so a mesh can be rebuilt every frame or cached and
//! reused unchanged.

use crate::graphics::RenderError;

/// Primitive kind a mesh is drawn as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Isolated points
    Points,
    /// Isolated line segments
    Lines,
    /// Connected line strip
    LineStrip,
    /// Closed line loop
    LineLoop,
    /// Isolated triangles
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
}

/// 3D mesh with parallel attribute arrays
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Primitive kind
    pub primitive: Primitive,
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (empty or one per position)
    pub normals: Vec<[f32; 3]>,
    /// Vertex colors (empty or one per position)
    pub colors: Vec<[f32; 4]>,
    /// 2D texture coordinates (empty or one per position)
    pub texcoords: Vec<[f32; 2]>,
    /// Optional index array; empty means sequential vertices
    pub indices: Vec<u32>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new(Primitive::Triangles)
    }
}

impl Mesh {
    /// Create an empty mesh with the given primitive kind
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            positions: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            texcoords: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Empty all attribute and index arrays, keeping the primitive kind
    pub fn reset(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.colors.clear();
        self.texcoords.clear();
        self.indices.clear();
    }

    /// Append a vertex position
    pub fn vertex(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.positions.push([x, y, z]);
        self
    }

    /// Append a vertex normal
    pub fn normal(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.normals.push([x, y, z]);
        self
    }

    /// Append a vertex color
    pub fn color(&mut self, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        self.colors.push([r, g, b, a]);
        self
    }

    /// Append a texture coordinate
    pub fn texcoord(&mut self, u: f32, v: f32) -> &mut Self {
        self.texcoords.push([u, v]);
        self
    }

    /// Append an index
    pub fn index(&mut self, i: u32) -> &mut Self {
        self.indices.push(i);
        self
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles this mesh resolves to (Triangles primitive only)
    pub fn triangle_count(&self) -> usize {
        if self.primitive != Primitive::Triangles {
            return 0;
        }
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Iterate the triangles of a `Triangles` mesh as index triples,
    /// resolving the implicit sequential indices of non-indexed meshes.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let indexed = !self.indices.is_empty();
        let count = self.triangle_count();
        (0..count).map(move |t| {
            if indexed {
                [
                    self.indices[t * 3],
                    self.indices[t * 3 + 1],
                    self.indices[t * 3 + 2],
                ]
            } else {
                [(t * 3) as u32, (t * 3 + 1) as u32, (t * 3 + 2) as u32]
            }
        })
    }

    /// Check the parallel-array invariant: every attribute array is either
    /// empty or exactly as long as the position array, and all indices are
    /// in range.
    pub fn validate(&self) -> Result<(), RenderError> {
        let n = self.positions.len();
        for (name, len) in [
            ("normals", self.normals.len()),
            ("colors", self.colors.len()),
            ("texcoords", self.texcoords.len()),
        ] {
            if len != 0 && len != n {
                return Err(RenderError::InvalidMesh(format!(
                    "{name} array has {len} entries for {n} positions"
                )));
            }
        }
        if let Some(&max) = self.indices.iter().max() {
            if max as usize >= n {
                return Err(RenderError::InvalidMesh(format!(
                    "index {max} out of range for {n} vertices"
                )));
            }
        }
        Ok(())
    }

    /// Recompute smooth per-vertex normals by area-weighted averaging of
    /// incident triangle face normals. Only meaningful for `Triangles`.
    pub fn generate_normals(&mut self) {
        let n = self.positions.len();
        let mut accum = vec![[0.0f32; 3]; n];

        for tri in self.triangles().collect::<Vec<_>>() {
            let [a, b, c] = tri.map(|i| self.positions[i as usize]);
            let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            // Cross product length is proportional to the triangle area, so
            // summing unnormalized face normals area-weights the average.
            let face = [
                u[1] * v[2] - u[2] * v[1],
                u[2] * v[0] - u[0] * v[2],
                u[0] * v[1] - u[1] * v[0],
            ];
            for i in tri {
                let acc = &mut accum[i as usize];
                acc[0] += face[0];
                acc[1] += face[1];
                acc[2] += face[2];
            }
        }

        self.normals = accum
            .into_iter()
            .map(|v| {
                let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
                if len > f32::EPSILON {
                    [v[0] / len, v[1] / len, v[2] / len]
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_empties_all_arrays() {
        let mut mesh = Mesh::new(Primitive::Triangles);
        mesh.vertex(0.0, 0.0, 0.0).normal(0.0, 1.0, 0.0).index(0);
        mesh.reset();
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.normals.is_empty());
        assert!(mesh.indices.is_empty());
        assert_eq!(mesh.primitive, Primitive::Triangles);
    }

    #[test]
    fn validate_rejects_short_attribute_arrays() {
        let mut mesh = Mesh::new(Primitive::Triangles);
        mesh.vertex(0.0, 0.0, 0.0).vertex(1.0, 0.0, 0.0);
        mesh.normal(0.0, 1.0, 0.0);
        assert!(mesh.validate().is_err());

        mesh.normal(0.0, 1.0, 0.0);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut mesh = Mesh::new(Primitive::Triangles);
        mesh.vertex(0.0, 0.0, 0.0);
        mesh.index(3);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn triangles_resolve_sequential_and_indexed() {
        let mut flat = Mesh::new(Primitive::Triangles);
        for _ in 0..6 {
            flat.vertex(0.0, 0.0, 0.0);
        }
        let tris: Vec<_> = flat.triangles().collect();
        assert_eq!(tris, vec![[0, 1, 2], [3, 4, 5]]);

        let mut indexed = Mesh::new(Primitive::Triangles);
        for _ in 0..4 {
            indexed.vertex(0.0, 0.0, 0.0);
        }
        indexed.indices = vec![0, 1, 2, 2, 1, 3];
        let tris: Vec<_> = indexed.triangles().collect();
        assert_eq!(tris, vec![[0, 1, 2], [2, 1, 3]]);
    }

    #[test]
    fn generated_normals_face_up_for_flat_quad() {
        let mut mesh = Mesh::new(Primitive::Triangles);
        mesh.vertex(0.0, 0.0, 0.0)
            .vertex(1.0, 0.0, 0.0)
            .vertex(1.0, 0.0, -1.0)
            .vertex(0.0, 0.0, -1.0);
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh.generate_normals();
        assert_eq!(mesh.normals.len(), 4);
        for n in &mesh.normals {
            assert!((n[1] - 1.0).abs() < 1e-5);
        }
    }
}
