//! Hole detection and filling.
//!
//! Part repair closes small openings left by classification cuts or present
//! in the source geometry. Boundary loops are traced in the winding
//! direction of their adjacent faces, so fill triangles come out wound
//! consistently with the surrounding surface.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::adjacency::MeshAdjacency;
use crate::types::{Mesh, Triangle};

/// A boundary loop representing a hole in the mesh.
#[derive(Debug, Clone)]
pub struct BoundaryLoop {
    /// Vertex indices in the winding direction of the adjacent faces.
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges (and vertices) in the loop.
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Detect all boundary loops (holes) in the mesh.
///
/// Each boundary edge belongs to exactly one face; chaining them in the
/// direction they appear in that face yields one directed loop per hole.
pub fn detect_holes(mesh: &Mesh, adjacency: &MeshAdjacency) -> Vec<BoundaryLoop> {
    let boundary: HashSet<(u32, u32)> = adjacency.boundary_edges().collect();
    if boundary.is_empty() {
        return Vec::new();
    }

    debug!("Found {} boundary edges", boundary.len());

    // Directed successor map: for a boundary edge appearing as (a -> b) in
    // its face, record b as the successor of a.
    let mut successor: HashMap<u32, Vec<u32>> = HashMap::new();
    for face in &mesh.faces {
        for (a, b) in [
            (face[0], face[1]),
            (face[1], face[2]),
            (face[2], face[0]),
        ] {
            let key = if a < b { (a, b) } else { (b, a) };
            if boundary.contains(&key) {
                successor.entry(a).or_default().push(b);
            }
        }
    }

    let mut visited: HashSet<(u32, u32)> = HashSet::new();
    let mut loops = Vec::new();

    for (&start, nexts) in &successor {
        for &second in nexts {
            if visited.contains(&(start, second)) {
                continue;
            }

            let mut loop_vertices = vec![start];
            let mut current = second;
            visited.insert((start, second));

            let mut closed = false;
            while current != start {
                loop_vertices.push(current);

                let next = successor.get(&current).and_then(|cands| {
                    cands
                        .iter()
                        .copied()
                        .find(|&n| !visited.contains(&(current, n)))
                });

                match next {
                    Some(n) => {
                        visited.insert((current, n));
                        current = n;
                    }
                    None => break,
                }
            }
            closed |= current == start;

            if !closed {
                warn!(
                    "Boundary chain starting at vertex {} is not closed ({} vertices)",
                    start,
                    loop_vertices.len()
                );
            }
            if loop_vertices.len() >= 3 {
                loops.push(BoundaryLoop {
                    vertices: loop_vertices,
                });
            }
        }
    }

    info!(
        "Detected {} hole(s), sizes: {:?}",
        loops.len(),
        loops.iter().map(|l| l.edge_count()).collect::<Vec<_>>()
    );

    loops
}

/// Triangulate a hole, returning the triangles to add.
///
/// The loop arrives in face-winding order, so the fill is built over the
/// reversed loop and comes out facing the same way as the surrounding
/// surface. Ear clipping handles concave outlines; a centroid fan is the
/// fallback when clipping gets stuck.
pub fn triangulate_hole(mesh: &Mesh, boundary: &BoundaryLoop) -> Vec<[u32; 3]> {
    let n = boundary.vertices.len();
    if n < 3 {
        return Vec::new();
    }

    // Reversed loop: fill triangles traverse each boundary edge opposite to
    // the face that owns it.
    let ring: Vec<u32> = boundary.vertices.iter().rev().copied().collect();
    let positions: Vec<Point3<f64>> = ring
        .iter()
        .map(|&idx| mesh.vertices[idx as usize].position)
        .collect();

    let plane_normal = newell_normal(&positions);

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    'clip: while remaining.len() > 3 {
        for i in 0..remaining.len() {
            let prev = remaining[(i + remaining.len() - 1) % remaining.len()];
            let curr = remaining[i];
            let next = remaining[(i + 1) % remaining.len()];

            if is_ear(&positions, &remaining, prev, curr, next, &plane_normal) {
                triangles.push([ring[prev], ring[curr], ring[next]]);
                remaining.remove(i);
                continue 'clip;
            }
        }

        warn!(
            "Ear clipping stuck with {} vertices remaining, falling back to fan",
            remaining.len()
        );
        break;
    }

    if remaining.len() == 3 {
        triangles.push([ring[remaining[0]], ring[remaining[1]], ring[remaining[2]]]);
    } else {
        let apex = remaining[0];
        for w in remaining[1..].windows(2) {
            triangles.push([ring[apex], ring[w[0]], ring[w[1]]]);
        }
    }

    debug!(
        "Filled hole with {} edges using {} triangles",
        n,
        triangles.len()
    );

    triangles
}

/// Fill every hole with at most `max_hole_edges` edges.
///
/// Holes are triangulated in parallel (each reads the mesh immutably) and
/// the results appended in one pass. Returns the number of holes filled.
pub fn fill_holes(mesh: &mut Mesh, max_hole_edges: usize) -> usize {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let holes = detect_holes(mesh, &adjacency);

    let (fillable, skipped): (Vec<_>, Vec<_>) = holes
        .into_iter()
        .partition(|hole| hole.edge_count() <= max_hole_edges);

    for hole in &skipped {
        warn!(
            "Skipping large hole with {} edges (max: {})",
            hole.edge_count(),
            max_hole_edges
        );
    }

    let new_triangles: Vec<Vec<[u32; 3]>> = fillable
        .par_iter()
        .map(|hole| triangulate_hole(mesh, hole))
        .collect();

    let filled = new_triangles.len();
    for tris in new_triangles {
        mesh.faces.extend(tris);
    }

    if filled > 0 {
        info!("Filled {} hole(s)", filled);
    }
    filled
}

/// Newell's method for the average plane normal of a (possibly non-planar)
/// polygon.
fn newell_normal(positions: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal: Vector3<f64> = Vector3::zeros();
    let n = positions.len();

    for i in 0..n {
        let p = positions[i];
        let q = positions[(i + 1) % n];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }

    let len = normal.norm();
    if len > f64::EPSILON {
        normal / len
    } else {
        Vector3::y()
    }
}

fn is_ear(
    positions: &[Point3<f64>],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    plane_normal: &Vector3<f64>,
) -> bool {
    let tri = Triangle::new(positions[prev], positions[curr], positions[next]);
    let Some(tri_normal) = tri.normal() else {
        return false;
    };

    // Convexity relative to the loop's plane
    if tri_normal.dot(plane_normal) < 0.0 {
        return false;
    }

    for &idx in remaining {
        if idx == prev || idx == curr || idx == next {
            continue;
        }
        if point_in_triangle(
            &positions[idx],
            &positions[prev],
            &positions[curr],
            &positions[next],
            plane_normal,
        ) {
            return false;
        }
    }

    true
}

/// Point-in-triangle test after projecting out the dominant normal axis.
fn point_in_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    normal: &Vector3<f64>,
) -> bool {
    let (nx, ny, nz) = (normal.x.abs(), normal.y.abs(), normal.z.abs());

    let flatten = |p: &Point3<f64>| -> (f64, f64) {
        if nz >= nx && nz >= ny {
            (p.x, p.y)
        } else if ny >= nx {
            (p.x, p.z)
        } else {
            (p.y, p.z)
        }
    };

    let (p, a, b, c) = (flatten(p), flatten(a), flatten(b), flatten(c));
    let edge = |u: (f64, f64), v: (f64, f64)| -> f64 {
        (p.0 - v.0) * (u.1 - v.1) - (u.0 - v.0) * (p.1 - v.1)
    };

    let d1 = edge(a, b);
    let d2 = edge(b, c);
    let d3 = edge(c, a);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;

    fn open_box() -> Mesh {
        // Unit box missing its top (Y = 1) face
        let mut mesh = Mesh::new();
        for (x, y, z) in [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 0.0, 1.0),
            (0.0, 0.0, 1.0),
            (0.0, 1.0, 0.0),
            (1.0, 1.0, 0.0),
            (1.0, 1.0, 1.0),
            (0.0, 1.0, 1.0),
        ] {
            mesh.vertices.push(Vertex::from_coords(x, y, z));
        }
        for face in [
            // bottom (outward -Y)
            [0, 1, 2],
            [0, 2, 3],
            // sides
            [0, 4, 5],
            [0, 5, 1],
            [1, 5, 6],
            [1, 6, 2],
            [2, 6, 7],
            [2, 7, 3],
            [3, 7, 4],
            [3, 4, 0],
        ] {
            mesh.faces.push(face);
        }
        mesh
    }

    #[test]
    fn detects_the_open_top() {
        let mesh = open_box();
        let adjacency = MeshAdjacency::build(&mesh.faces);
        let holes = detect_holes(&mesh, &adjacency);
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].edge_count(), 4);
    }

    #[test]
    fn watertight_mesh_has_no_holes() {
        let mut mesh = open_box();
        fill_holes(&mut mesh, 100);
        let adjacency = MeshAdjacency::build(&mesh.faces);
        assert!(detect_holes(&mesh, &adjacency).is_empty());
    }

    #[test]
    fn filling_closes_the_mesh() {
        let mut mesh = open_box();
        let before = mesh.face_count();

        let filled = fill_holes(&mut mesh, 100);
        assert_eq!(filled, 1);
        assert_eq!(mesh.face_count(), before + 2);

        let adjacency = MeshAdjacency::build(&mesh.faces);
        assert!(adjacency.is_watertight());
    }

    #[test]
    fn fill_preserves_outward_volume() {
        let mut mesh = open_box();
        fill_holes(&mut mesh, 100);
        // Outward-wound unit box enclosing volume 1
        assert!((mesh.signed_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_holes_are_skipped() {
        let mut mesh = open_box();
        let filled = fill_holes(&mut mesh, 3);
        assert_eq!(filled, 0);
    }
}
