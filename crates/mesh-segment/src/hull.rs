//! Incremental convex hull.
//!
//! Last-resort repair fallback: a component whose holes cannot be closed is
//! replaced by its hull, which is watertight by construction. Accuracy is
//! secondary to robustness here, so this is a plain incremental hull rather
//! than a full quickhull.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::{SegmentError, SegmentResult};
use crate::types::{Mesh, Vertex};

/// Compute the convex hull of a mesh's vertices.
///
/// Returns a watertight, outward-wound triangle mesh. Fails when the input
/// has fewer than four points or all points are (near-)coplanar. Vertex
/// normals and UVs are not carried over; the hull is new geometry.
pub fn convex_hull(mesh: &Mesh) -> SegmentResult<Mesh> {
    let points: Vec<Point3<f64>> = mesh
        .vertices
        .iter()
        .map(|v| v.position)
        .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
        .collect();
    convex_hull_of_points(&points)
}

/// Convex hull of a raw point set.
pub fn convex_hull_of_points(points: &[Point3<f64>]) -> SegmentResult<Mesh> {
    if points.len() < 4 {
        return Err(SegmentError::degenerate_geometry(format!(
            "convex hull needs at least 4 points, got {}",
            points.len()
        )));
    }

    let scale = bounding_diagonal(points);
    let eps = (scale * 1e-9).max(f64::MIN_POSITIVE);

    let [a, b, c, d] = initial_tetrahedron(points, eps)?;

    // Faces of the seed tetrahedron, wound outward away from its centroid
    let centroid = Point3::from(
        (points[a].coords + points[b].coords + points[c].coords + points[d].coords) / 4.0,
    );
    let mut faces: Vec<[usize; 3]> = Vec::new();
    for tri in [[a, b, c], [a, b, d], [a, c, d], [b, c, d]] {
        faces.push(orient_outward(points, tri, &centroid));
    }

    let seed: HashSet<usize> = [a, b, c, d].into_iter().collect();

    for (idx, point) in points.iter().enumerate() {
        if seed.contains(&idx) {
            continue;
        }

        // Faces the point can see from outside
        let visible: Vec<usize> = faces
            .iter()
            .enumerate()
            .filter(|(_, tri)| signed_distance(points, tri, point) > eps)
            .map(|(i, _)| i)
            .collect();
        if visible.is_empty() {
            continue;
        }

        // Horizon: directed edges of visible faces whose reverse belongs to
        // a hidden face
        let mut directed: HashSet<(usize, usize)> = HashSet::new();
        for &fi in &visible {
            let [p, q, r] = faces[fi];
            directed.insert((p, q));
            directed.insert((q, r));
            directed.insert((r, p));
        }
        let horizon: Vec<(usize, usize)> = directed
            .iter()
            .copied()
            .filter(|&(p, q)| !directed.contains(&(q, p)))
            .collect();

        let visible_set: HashSet<usize> = visible.into_iter().collect();
        let mut next_faces: Vec<[usize; 3]> = faces
            .iter()
            .enumerate()
            .filter(|(i, _)| !visible_set.contains(i))
            .map(|(_, &tri)| tri)
            .collect();
        // Horizon edges keep their direction, so the fan stays outward
        for (p, q) in horizon {
            next_faces.push([p, q, idx]);
        }
        faces = next_faces;
    }

    debug!(
        "Convex hull: {} input points -> {} hull faces",
        points.len(),
        faces.len()
    );

    Ok(hull_to_mesh(points, &faces))
}

/// Bounding-box diagonal, used to scale tolerances.
fn bounding_diagonal(points: &[Point3<f64>]) -> f64 {
    let mut min = points[0];
    let mut max = points[0];
    for p in points {
        min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
        max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
    }
    (max - min).norm()
}

/// Pick four non-degenerate seed points: an extreme pair, the point farthest
/// from their line, and the point farthest from the resulting plane.
fn initial_tetrahedron(points: &[Point3<f64>], eps: f64) -> SegmentResult<[usize; 4]> {
    let mut a = 0;
    let mut b = 0;
    let mut best = -1.0;
    for axis in 0..3 {
        let (lo, hi) = min_max_by_key(points, |p| p[axis]);
        let d = (points[hi] - points[lo]).norm_squared();
        if d > best {
            best = d;
            a = lo;
            b = hi;
        }
    }
    if best <= eps * eps {
        return Err(SegmentError::degenerate_geometry(
            "all points coincide".to_string(),
        ));
    }

    let ab = points[b] - points[a];
    let c = farthest_by(points, |p| ab.cross(&(p - points[a])).norm_squared());
    let normal = ab.cross(&(points[c] - points[a]));
    // |normal| / |ab| is the distance of c from the a-b line
    if normal.norm() <= eps * ab.norm() {
        return Err(SegmentError::degenerate_geometry(
            "all points are collinear".to_string(),
        ));
    }

    let d = farthest_by(points, |p| (normal.dot(&(p - points[a]))).abs());
    // |normal . ad| / |normal| is the distance of d from the a-b-c plane
    if normal.dot(&(points[d] - points[a])).abs() <= eps * normal.norm() {
        return Err(SegmentError::degenerate_geometry(
            "all points are coplanar".to_string(),
        ));
    }

    Ok([a, b, c, d])
}

fn min_max_by_key(points: &[Point3<f64>], key: impl Fn(&Point3<f64>) -> f64) -> (usize, usize) {
    let mut lo = 0;
    let mut hi = 0;
    for (i, p) in points.iter().enumerate() {
        if key(p) < key(&points[lo]) {
            lo = i;
        }
        if key(p) > key(&points[hi]) {
            hi = i;
        }
    }
    (lo, hi)
}

fn farthest_by(points: &[Point3<f64>], key: impl Fn(&Point3<f64>) -> f64) -> usize {
    let mut best = 0;
    let mut best_val = key(&points[0]);
    for (i, p) in points.iter().enumerate().skip(1) {
        let val = key(p);
        if val > best_val {
            best_val = val;
            best = i;
        }
    }
    best
}

/// Flip the triangle if its normal points toward `interior`.
fn orient_outward(
    points: &[Point3<f64>],
    tri: [usize; 3],
    interior: &Point3<f64>,
) -> [usize; 3] {
    if signed_distance(points, &tri, interior) > 0.0 {
        [tri[0], tri[2], tri[1]]
    } else {
        tri
    }
}

/// Signed distance of `point` from the face plane, positive on the normal
/// side (scaled by the normal length; only the sign matters to callers).
fn signed_distance(points: &[Point3<f64>], tri: &[usize; 3], point: &Point3<f64>) -> f64 {
    let p0 = points[tri[0]];
    let normal: Vector3<f64> = (points[tri[1]] - p0).cross(&(points[tri[2]] - p0));
    normal.dot(&(point - p0))
}

/// Reindex the surviving hull points into a compact mesh.
fn hull_to_mesh(points: &[Point3<f64>], faces: &[[usize; 3]]) -> Mesh {
    let mut mesh = Mesh::new();
    let mut old_to_new: HashMap<usize, u32> = HashMap::new();

    for tri in faces {
        let mut face = [0u32; 3];
        for (slot, &old) in face.iter_mut().zip(tri) {
            *slot = match old_to_new.get(&old) {
                Some(&new) => new,
                None => {
                    let new = mesh.vertices.len() as u32;
                    old_to_new.insert(old, new);
                    mesh.vertices.push(Vertex::new(points[old]));
                    new
                }
            };
        }
        mesh.faces.push(face);
    }

    mesh
}

impl Mesh {
    /// Convex hull of this mesh's vertices.
    pub fn convex_hull(&self) -> SegmentResult<Mesh> {
        convex_hull(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::MeshAdjacency;
    use crate::measure::tests::make_box;

    #[test]
    fn hull_of_box_is_the_box() {
        let mesh = make_box(0.0, 0.0, 0.0, 2.0, 1.0, 1.0);
        let hull = convex_hull(&mesh).unwrap();
        assert_eq!(hull.vertex_count(), 8);
        assert_eq!(hull.face_count(), 12);
        assert!((hull.volume() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn hull_is_watertight_and_outward() {
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        // Interior point must not appear on the hull
        mesh.vertices
            .push(crate::Vertex::from_coords(0.5, 0.5, 0.5));

        let hull = convex_hull(&mesh).unwrap();
        assert_eq!(hull.vertex_count(), 8);
        assert!(hull.signed_volume() > 0.0);
        let adjacency = MeshAdjacency::build(&hull.faces);
        assert!(adjacency.is_watertight());
    }

    #[test]
    fn hull_ignores_face_topology() {
        // Same points, no faces at all
        let mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let points: Vec<_> = mesh.vertices.iter().map(|v| v.position).collect();
        let hull = convex_hull_of_points(&points).unwrap();
        assert!((hull.volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn coplanar_points_are_rejected() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert!(convex_hull_of_points(&points).is_err());
    }

    #[test]
    fn too_few_points_are_rejected() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let err = convex_hull_of_points(&points).unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::DegenerateGeometry);
    }

    #[test]
    fn micro_scale_tetrahedron_is_not_degenerate() {
        // A thin tetrahedron a micron across: far from collinear or coplanar
        // relative to its own size
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1e-6, 0.0, 0.0),
            Point3::new(5e-7, 2e-10, 0.0),
            Point3::new(5e-7, 1e-10, 2e-10),
        ];
        let hull = convex_hull_of_points(&points).unwrap();
        assert_eq!(hull.face_count(), 4);
        assert!(hull.volume() > 0.0);
    }

    #[test]
    fn hull_contains_all_input_points() {
        // Octahedron plus interior jitter points
        let mut points = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        points.push(Point3::new(0.1, 0.1, 0.1));
        points.push(Point3::new(-0.2, 0.05, 0.0));

        let hull = convex_hull_of_points(&points).unwrap();
        assert_eq!(hull.vertex_count(), 6);
        assert_eq!(hull.face_count(), 8);
        // Octahedron volume = 4/3
        assert!((hull.volume() - 4.0 / 3.0).abs() < 1e-9);
    }
}
