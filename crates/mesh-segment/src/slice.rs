//! Plane splitting with cap generation.
//!
//! Subdivision cuts a part with an infinite plane and keeps both halves.
//! Crossing triangles are clipped exactly at the plane (attributes
//! interpolated along the cut edges) and each half's cut opening is closed
//! with a fan cap so downstream volume checks keep working.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::types::{Mesh, Vertex};

/// Both halves of a plane split.
#[derive(Debug, Clone)]
pub struct PlaneSplit {
    /// Geometry on the negative side of the plane normal.
    pub below: Mesh,
    /// Geometry on the positive side of the plane normal.
    pub above: Mesh,
}

/// Split a mesh with the plane through `origin` with unit `normal`.
///
/// Crossing triangles are clipped; when `cap` is set, each half's planar
/// opening is closed with triangles fanned around the opening's centroid,
/// wound so the cap faces away from the kept half.
pub fn split_at_plane(
    mesh: &Mesh,
    origin: Point3<f64>,
    normal: Vector3<f64>,
    cap: bool,
) -> PlaneSplit {
    let below = clip_half(mesh, origin, normal, cap);
    let above = clip_half(mesh, origin, -normal, cap);
    debug!(
        "Plane split: {} faces -> {} below / {} above",
        mesh.face_count(),
        below.face_count(),
        above.face_count()
    );
    PlaneSplit { below, above }
}

/// Split a mesh at a horizontal plane, returning (below, above).
pub fn bisect_at_y(mesh: &Mesh, y: f64, cap: bool) -> (Mesh, Mesh) {
    let split = split_at_plane(mesh, Point3::new(0.0, y, 0.0), Vector3::y(), cap);
    (split.below, split.above)
}

/// Split a mesh at a vertical X plane, returning (left, right) in mesh
/// coordinates (negative X first).
pub fn bisect_at_x(mesh: &Mesh, x: f64, cap: bool) -> (Mesh, Mesh) {
    let split = split_at_plane(mesh, Point3::new(x, 0.0, 0.0), Vector3::x(), cap);
    (split.below, split.above)
}

/// Keep the half of the mesh on the non-positive side of the plane.
fn clip_half(mesh: &Mesh, origin: Point3<f64>, normal: Vector3<f64>, cap: bool) -> Mesh {
    const EPS: f64 = 1e-9;

    let dist = |v: &Vertex| (v.position - origin).dot(&normal);

    let mut out = Mesh::new();
    // Original vertex index -> output index
    let mut kept: HashMap<u32, u32> = HashMap::new();
    // Clipped edge (ordered original pair) -> output index of the cut point
    let mut cut_points: HashMap<(u32, u32), u32> = HashMap::new();
    // Cut edges on the plane, as ordered output index pairs
    let mut cut_edges: Vec<(u32, u32)> = Vec::new();

    let mut keep_vertex = |idx: u32, out: &mut Mesh| -> u32 {
        match kept.get(&idx) {
            Some(&i) => i,
            None => {
                let i = out.vertices.len() as u32;
                kept.insert(idx, i);
                out.vertices.push(mesh.vertices[idx as usize].clone());
                i
            }
        }
    };

    let mut cut_vertex = |a: u32, b: u32, out: &mut Mesh| -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        match cut_points.get(&key) {
            Some(&i) => i,
            None => {
                let va = &mesh.vertices[a as usize];
                let vb = &mesh.vertices[b as usize];
                let da = dist(va);
                let db = dist(vb);
                let t = da / (da - db);
                let i = out.vertices.len() as u32;
                cut_points.insert(key, i);
                out.vertices.push(Vertex::lerp(va, vb, t));
                i
            }
        }
    };

    for face in &mesh.faces {
        let d = [
            dist(&mesh.vertices[face[0] as usize]),
            dist(&mesh.vertices[face[1] as usize]),
            dist(&mesh.vertices[face[2] as usize]),
        ];

        if d.iter().all(|&x| x.abs() <= EPS) {
            // Face lies in the cut plane; both half-space tests would accept
            // it. It belongs to the one half its normal points out of.
            let p0 = mesh.vertices[face[0] as usize].position;
            let p1 = mesh.vertices[face[1] as usize].position;
            let p2 = mesh.vertices[face[2] as usize].position;
            let face_normal = (p1 - p0).cross(&(p2 - p0));
            if face_normal.dot(&normal) > 0.0 {
                let f = [
                    keep_vertex(face[0], &mut out),
                    keep_vertex(face[1], &mut out),
                    keep_vertex(face[2], &mut out),
                ];
                out.faces.push(f);
            }
            continue;
        }
        if d.iter().all(|&x| x <= EPS) {
            // Entirely kept
            let f = [
                keep_vertex(face[0], &mut out),
                keep_vertex(face[1], &mut out),
                keep_vertex(face[2], &mut out),
            ];
            out.faces.push(f);
            continue;
        }
        if d.iter().all(|&x| x >= -EPS) {
            // Entirely discarded
            continue;
        }

        // Crossing triangle. Walk the polygon edges, emitting kept vertices
        // and cut points (Sutherland-Hodgman against the half-space).
        let mut poly: Vec<u32> = Vec::with_capacity(4);
        let mut plane_verts: Vec<u32> = Vec::new();

        for i in 0..3 {
            let j = (i + 1) % 3;
            let (vi, vj) = (face[i], face[j]);
            let (di, dj) = (d[i], d[j]);

            if di <= EPS {
                let out_idx = keep_vertex(vi, &mut out);
                poly.push(out_idx);
                if di >= -EPS {
                    plane_verts.push(out_idx);
                }
            }
            if (di < -EPS && dj > EPS) || (di > EPS && dj < -EPS) {
                let cut_idx = cut_vertex(vi, vj, &mut out);
                poly.push(cut_idx);
                plane_verts.push(cut_idx);
            }
        }

        // Triangulate the 3-4 sided result as a fan
        for k in 1..poly.len().saturating_sub(1) {
            out.faces.push([poly[0], poly[k], poly[k + 1]]);
        }

        // Exactly two polygon vertices on the plane form a cap edge
        if plane_verts.len() == 2 && plane_verts[0] != plane_verts[1] {
            cut_edges.push((plane_verts[0], plane_verts[1]));
        }
    }

    if cap && !cut_edges.is_empty() {
        add_caps(&mut out, &cut_edges, normal);
    }

    out
}

/// Close the planar openings left by clipping.
///
/// Cut edges are chained into loops and each loop is fanned around its
/// centroid. Triangles are wound so the cap's normal points along the clip
/// normal (away from the kept half).
fn add_caps(mesh: &mut Mesh, cut_edges: &[(u32, u32)], normal: Vector3<f64>) {
    let loops = chain_edge_loops(mesh, cut_edges);

    for loop_verts in loops {
        if loop_verts.len() < 3 {
            continue;
        }

        let centroid: Vector3<f64> = loop_verts
            .iter()
            .map(|&v| mesh.vertices[v as usize].position.coords)
            .sum::<Vector3<f64>>()
            / loop_verts.len() as f64;
        let center = mesh.vertices.len() as u32;
        mesh.vertices.push(Vertex::new(Point3::from(centroid)));

        for i in 0..loop_verts.len() {
            let a = loop_verts[i];
            let b = loop_verts[(i + 1) % loop_verts.len()];
            let pa = mesh.vertices[a as usize].position;
            let pb = mesh.vertices[b as usize].position;
            let pc = Point3::from(centroid);

            let face_normal = (pb - pa).cross(&(pc - pa));
            if face_normal.dot(&normal) >= 0.0 {
                mesh.faces.push([a, b, center]);
            } else {
                mesh.faces.push([b, a, center]);
            }
        }
    }
}

/// Chain undirected cut edges into closed (or maximal open) vertex loops.
fn chain_edge_loops(mesh: &Mesh, cut_edges: &[(u32, u32)]) -> Vec<Vec<u32>> {
    const EPS: f64 = 1e-9;

    // Merge coincident cut vertices so loops close even when the clipper
    // produced duplicate points on the plane.
    let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();
    let mut merged: HashMap<u32, u32> = HashMap::new();

    let verts: Vec<u32> = {
        let mut v: Vec<u32> = cut_edges.iter().flat_map(|&(a, b)| [a, b]).collect();
        v.sort_unstable();
        v.dedup();
        v
    };
    for (i, &a) in verts.iter().enumerate() {
        if merged.contains_key(&a) {
            continue;
        }
        for &b in &verts[i + 1..] {
            if merged.contains_key(&b) {
                continue;
            }
            let pa = mesh.vertices[a as usize].position;
            let pb = mesh.vertices[b as usize].position;
            if (pa - pb).norm_squared() < EPS * EPS {
                merged.insert(b, a);
            }
        }
    }
    let resolve = |v: u32| -> u32 { merged.get(&v).copied().unwrap_or(v) };

    for &(a, b) in cut_edges {
        let (a, b) = (resolve(a), resolve(b));
        if a == b {
            continue;
        }
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    }

    let mut visited: HashSet<(u32, u32)> = HashSet::new();
    let mut loops = Vec::new();

    for &(start_a, start_b) in cut_edges {
        let (start_a, start_b) = (resolve(start_a), resolve(start_b));
        if start_a == start_b {
            continue;
        }
        if !visited.insert(ordered(start_a, start_b)) {
            continue;
        }

        let mut loop_verts = vec![start_a, start_b];
        loop {
            let last = loop_verts[loop_verts.len() - 1];
            let prev = loop_verts[loop_verts.len() - 2];

            let next = adjacency.get(&last).and_then(|nbrs| {
                nbrs.iter()
                    .copied()
                    .find(|&n| n != prev && !visited.contains(&ordered(last, n)))
            });

            match next {
                Some(n) => {
                    visited.insert(ordered(last, n));
                    if n == loop_verts[0] {
                        break; // closed
                    }
                    loop_verts.push(n);
                }
                None => break, // open chain, fan it anyway
            }
        }

        loops.push(loop_verts);
    }

    loops
}

#[inline]
fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

impl Mesh {
    /// Split this mesh with a plane, keeping both halves.
    pub fn split_at_plane(
        &self,
        origin: Point3<f64>,
        normal: Vector3<f64>,
        cap: bool,
    ) -> PlaneSplit {
        split_at_plane(self, origin, normal, cap)
    }
}
