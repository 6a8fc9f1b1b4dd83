//! Quadric-error-metric mesh simplification
//!
//! Edge-contraction simplification driven by per-vertex error quadrics.
//! Each vertex accumulates the fundamental quadrics of its incident
//! triangle planes (ten entries of a symmetric 4x4); an edge's contraction
//! cost is the combined quadric evaluated at the midpoint candidate. A
//! min-heap pops the cheapest edge, a union-find tracks merges, and the
//! merged vertex's neighborhood is re-scored. Stale heap entries are
//! detected by per-vertex version counters and skipped.
//!
//! Determinism: equal-cost edges are ordered by (min index, max index),
//! and neighbor sets iterate in index order, so the contraction sequence
//! is reproducible for a given input.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashSet};

use thiserror::Error;

use crate::graphics::mesh::{Mesh, Primitive};

/// Simplification errors
#[derive(Error, Debug)]
pub enum SimplifyError {
    /// The input is not a triangle mesh or has no triangles
    #[error("simplification requires a non-empty triangle mesh")]
    NoTriangles,

    /// The target ratio is outside (0, 1]
    #[error("target ratio {0} outside (0, 1]")]
    BadRatio(f32),
}

/// Upper-triangular entries of a symmetric 4x4 error quadric
#[derive(Debug, Clone, Copy, Default)]
struct Quadric([f64; 10]);

impl Quadric {
    /// Fundamental quadric of the plane ax + by + cz + d = 0
    fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self([
            a * a, a * b, a * c, a * d,
            b * b, b * c, b * d,
            c * c, c * d,
            d * d,
        ])
    }

    fn add(&mut self, other: &Quadric) {
        for (lhs, rhs) in self.0.iter_mut().zip(other.0.iter()) {
            *lhs += rhs;
        }
    }

    fn combined(&self, other: &Quadric) -> Quadric {
        let mut q = *self;
        q.add(other);
        q
    }

    /// vᵀQv for v = (x, y, z, 1)
    fn eval(&self, x: f64, y: f64, z: f64) -> f64 {
        let q = &self.0;
        q[0] * x * x
            + 2.0 * q[1] * x * y
            + 2.0 * q[2] * x * z
            + 2.0 * q[3] * x
            + q[4] * y * y
            + 2.0 * q[5] * y * z
            + 2.0 * q[6] * y
            + q[7] * z * z
            + 2.0 * q[8] * z
            + q[9]
    }
}

struct Candidate {
    cost: f64,
    u: u32,
    v: u32,
    u_version: u32,
    v_version: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.u.cmp(&other.u))
            .then_with(|| self.v.cmp(&other.v))
    }
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            // Path halving keeps chains short without recursion.
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }
}

/// Simplify a triangle mesh to approximately `ratio · |V|` vertices.
///
/// The output is a packed indexed triangle mesh; degenerate and duplicate
/// triangles are discarded. Normals, colors, and texture coordinates are
/// carried through (merged vertices average their attributes, normals are
/// renormalized). The vertex floor is 3.
pub fn simplify(mesh: &Mesh, ratio: f32) -> Result<Mesh, SimplifyError> {
    if !(0.0..=1.0).contains(&ratio) || ratio <= 0.0 {
        return Err(SimplifyError::BadRatio(ratio));
    }
    if mesh.primitive != Primitive::Triangles || mesh.triangle_count() == 0 {
        return Err(SimplifyError::NoTriangles);
    }

    let vertex_count = mesh.vertex_count();
    let triangles: Vec<[u32; 3]> = mesh.triangles().collect();

    let mut positions: Vec<[f64; 3]> = mesh
        .positions
        .iter()
        .map(|p| [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])])
        .collect();
    let mut normals: Vec<[f32; 3]> = mesh.normals.clone();
    let mut colors: Vec<[f32; 4]> = mesh.colors.clone();
    let mut texcoords: Vec<[f32; 2]> = mesh.texcoords.clone();

    // Accumulate fundamental quadrics of incident triangle planes.
    let mut quadrics = vec![Quadric::default(); vertex_count];
    for tri in &triangles {
        let [a, b, c] = tri.map(|i| positions[i as usize]);
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let mut n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len <= f64::EPSILON {
            continue; // zero-area triangle contributes no plane
        }
        n = [n[0] / len, n[1] / len, n[2] / len];
        let d = -(n[0] * a[0] + n[1] * a[1] + n[2] * a[2]);
        let q = Quadric::from_plane(n[0], n[1], n[2], d);
        for i in *tri {
            quadrics[i as usize].add(&q);
        }
    }

    // Neighbor sets iterate in index order for determinism.
    let mut neighbors: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); vertex_count];
    for tri in &triangles {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            neighbors[a as usize].insert(b);
            neighbors[b as usize].insert(a);
        }
    }

    let mut versions = vec![0u32; vertex_count];
    let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
    let push_edge = |heap: &mut BinaryHeap<Reverse<Candidate>>,
                     positions: &[[f64; 3]],
                     quadrics: &[Quadric],
                     versions: &[u32],
                     a: u32,
                     b: u32| {
        let (u, v) = (a.min(b), a.max(b));
        let pu = positions[u as usize];
        let pv = positions[v as usize];
        let mid = [
            (pu[0] + pv[0]) * 0.5,
            (pu[1] + pv[1]) * 0.5,
            (pu[2] + pv[2]) * 0.5,
        ];
        let cost = quadrics[u as usize]
            .combined(&quadrics[v as usize])
            .eval(mid[0], mid[1], mid[2]);
        heap.push(Reverse(Candidate {
            cost,
            u,
            v,
            u_version: versions[u as usize],
            v_version: versions[v as usize],
        }));
    };

    for (a, set) in neighbors.iter().enumerate() {
        for &b in set.range(a as u32 + 1..) {
            push_edge(&mut heap, &positions, &quadrics, &versions, a as u32, b);
        }
    }

    let target = ((ratio * vertex_count as f32).round() as usize).max(3);
    let mut live = vertex_count;
    let mut uf = UnionFind::new(vertex_count);

    while live > target {
        let Some(Reverse(candidate)) = heap.pop() else {
            break;
        };
        let Candidate { u, v, u_version, v_version, .. } = candidate;

        // Skip entries whose endpoints were merged or re-scored since push.
        if uf.find(u) != u || uf.find(v) != v {
            continue;
        }
        if versions[u as usize] != u_version || versions[v as usize] != v_version {
            continue;
        }

        // Merge v into u at the midpoint candidate.
        let pu = positions[u as usize];
        let pv = positions[v as usize];
        positions[u as usize] = [
            (pu[0] + pv[0]) * 0.5,
            (pu[1] + pv[1]) * 0.5,
            (pu[2] + pv[2]) * 0.5,
        ];
        let qv = quadrics[v as usize];
        quadrics[u as usize].add(&qv);
        average_attribute3(&mut normals, u, v);
        average_attribute4(&mut colors, u, v);
        average_attribute2(&mut texcoords, u, v);

        uf.parent[v as usize] = u;
        versions[u as usize] += 1;
        versions[v as usize] += 1;
        live -= 1;

        // Fold v's neighborhood into u and re-score every surviving edge.
        let moved: Vec<u32> = neighbors[v as usize].iter().copied().collect();
        for w in moved {
            if w != u {
                neighbors[w as usize].remove(&v);
                neighbors[w as usize].insert(u);
                neighbors[u as usize].insert(w);
            }
        }
        neighbors[u as usize].remove(&u);
        neighbors[u as usize].remove(&v);
        neighbors[v as usize].clear();

        let adjacent: Vec<u32> = neighbors[u as usize].iter().copied().collect();
        for w in adjacent {
            if uf.find(w) == w {
                push_edge(&mut heap, &positions, &quadrics, &versions, u, w);
            }
        }
    }

    // Emit: rewrite triangles through the union-find, drop degenerates and
    // duplicates, compact to a packed vertex array.
    let mut seen = HashSet::new();
    let mut out_triangles: Vec<[u32; 3]> = Vec::new();
    for tri in &triangles {
        let mapped = tri.map(|i| uf.find(i));
        if mapped[0] == mapped[1] || mapped[1] == mapped[2] || mapped[0] == mapped[2] {
            continue;
        }
        let mut key = mapped;
        key.sort_unstable();
        if seen.insert(key) {
            out_triangles.push(mapped);
        }
    }

    let mut used: Vec<u32> = out_triangles.iter().flatten().copied().collect();
    used.sort_unstable();
    used.dedup();
    let mut remap = vec![u32::MAX; vertex_count];
    for (new_index, &root) in used.iter().enumerate() {
        remap[root as usize] = new_index as u32;
    }

    let mut out = Mesh::new(Primitive::Triangles);
    for &root in &used {
        let p = positions[root as usize];
        out.vertex(p[0] as f32, p[1] as f32, p[2] as f32);
        if let Some(n) = normals.get(root as usize) {
            if !normals.is_empty() {
                let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                if len > f32::EPSILON {
                    out.normal(n[0] / len, n[1] / len, n[2] / len);
                } else {
                    out.normal(0.0, 1.0, 0.0);
                }
            }
        }
        if let Some(c) = colors.get(root as usize) {
            if !colors.is_empty() {
                out.color(c[0], c[1], c[2], c[3]);
            }
        }
        if let Some(t) = texcoords.get(root as usize) {
            if !texcoords.is_empty() {
                out.texcoord(t[0], t[1]);
            }
        }
    }
    for tri in out_triangles {
        for i in tri {
            out.index(remap[i as usize]);
        }
    }
    Ok(out)
}

fn average_attribute2(attr: &mut [[f32; 2]], u: u32, v: u32) {
    if attr.len() > u.max(v) as usize {
        let av = attr[v as usize];
        let au = &mut attr[u as usize];
        au[0] = (au[0] + av[0]) * 0.5;
        au[1] = (au[1] + av[1]) * 0.5;
    }
}

fn average_attribute3(attr: &mut [[f32; 3]], u: u32, v: u32) {
    if attr.len() > u.max(v) as usize {
        let av = attr[v as usize];
        let au = &mut attr[u as usize];
        for i in 0..3 {
            au[i] = (au[i] + av[i]) * 0.5;
        }
    }
}

fn average_attribute4(attr: &mut [[f32; 4]], u: u32, v: u32) {
    if attr.len() > u.max(v) as usize {
        let av = attr[v as usize];
        let au = &mut attr[u as usize];
        for i in 0..4 {
            au[i] = (au[i] + av[i]) * 0.5;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::shapes;
    use std::collections::HashMap;

    fn closed_manifold(mesh: &Mesh) -> bool {
        let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
        for [a, b, c] in mesh.triangles() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edges.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        !edges.is_empty() && edges.values().all(|&n| n == 2)
    }

    #[test]
    fn ratio_one_is_identity_up_to_compaction() {
        let sphere = shapes::icosphere(1.0, 2);
        let out = simplify(&sphere, 1.0).unwrap();
        assert_eq!(out.vertex_count(), sphere.vertex_count());
        assert_eq!(out.triangle_count(), sphere.triangle_count());
    }

    #[test]
    fn vertex_counts_are_monotone_in_the_ratio() {
        let sphere = shapes::icosphere(1.0, 3);
        let mut previous = usize::MAX;
        for ratio in [1.0, 0.75, 0.5, 0.25, 0.1] {
            let out = simplify(&sphere, ratio).unwrap();
            assert!(
                out.vertex_count() <= previous,
                "ratio {ratio} grew the mesh: {} > {previous}",
                out.vertex_count()
            );
            previous = out.vertex_count();
        }
    }

    #[test]
    fn simplification_is_idempotent_at_ratio_one() {
        let sphere = shapes::icosphere(1.0, 2);
        let once = simplify(&sphere, 0.5).unwrap();
        let again = simplify(&once, 1.0).unwrap();
        assert_eq!(once.vertex_count(), again.vertex_count());
        assert_eq!(once.positions, again.positions);
        assert_eq!(once.indices, again.indices);
    }

    #[test]
    fn target_counts_are_approximately_met() {
        let sphere = shapes::icosphere(1.0, 3); // 642 vertices
        let out = simplify(&sphere, 0.25).unwrap();
        let target = (642.0f32 * 0.25).round() as usize;
        let slack = target / 5;
        assert!(
            out.vertex_count() >= target.saturating_sub(slack)
                && out.vertex_count() <= target + slack,
            "got {} for target {target}",
            out.vertex_count()
        );
    }

    #[test]
    fn icosphere_pyramid_stays_closed() {
        let sphere = shapes::icosphere(1.0, 4); // 2562 vertices
        let mut counts = Vec::new();
        for ratio in [1.0, 0.5, 0.25, 0.125] {
            let out = simplify(&sphere, ratio).unwrap();
            assert!(closed_manifold(&out), "ratio {ratio} broke the manifold");
            counts.push(out.vertex_count());
        }
        assert!(counts.windows(2).all(|w| w[1] < w[0]), "counts {counts:?}");
    }

    #[test]
    fn simplified_meshes_keep_normals_when_input_has_them() {
        let sphere = shapes::icosphere(1.0, 2);
        let out = simplify(&sphere, 0.5).unwrap();
        assert_eq!(out.normals.len(), out.vertex_count());
        for n in &out.normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn rejects_bad_inputs() {
        let empty = Mesh::new(Primitive::Triangles);
        assert!(matches!(simplify(&empty, 0.5), Err(SimplifyError::NoTriangles)));

        let sphere = shapes::icosphere(1.0, 1);
        assert!(matches!(simplify(&sphere, 0.0), Err(SimplifyError::BadRatio(_))));
        assert!(matches!(simplify(&sphere, 1.5), Err(SimplifyError::BadRatio(_))));
    }
}
