//! Core mesh data types.

use nalgebra::{Point3, Vector3};

/// A vertex in the mesh with optional surface attributes.
///
/// The segmentation engine is Y-up: character height runs along the Y axis.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,

    /// Unit normal vector, computed from adjacent faces.
    pub normal: Option<Vector3<f64>>,

    /// Texture coordinate, carried best-effort through slicing and repair.
    pub uv: Option<[f64; 2]>,
}

impl Vertex {
    /// Create a new vertex with only position set.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
            uv: None,
        }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Linearly interpolate between two vertices.
    ///
    /// Position is always interpolated; normals and UVs only when both
    /// endpoints carry them, otherwise the attribute is dropped.
    pub fn lerp(a: &Vertex, b: &Vertex, t: f64) -> Vertex {
        let position = Point3::from(a.position.coords.lerp(&b.position.coords, t));
        let normal = match (a.normal, b.normal) {
            (Some(na), Some(nb)) => {
                let n = na.lerp(&nb, t);
                let len = n.norm();
                if len > f64::EPSILON {
                    Some(n / len)
                } else {
                    None
                }
            }
            _ => None,
        };
        let uv = match (a.uv, b.uv) {
            (Some(ua), Some(ub)) => Some([
                ua[0] + (ub[0] - ua[0]) * t,
                ua[1] + (ub[1] - ua[1]) * t,
            ]),
            _ => None,
        };
        Vertex {
            position,
            normal,
            uv,
        }
    }
}

/// A triangle mesh with indexed vertices and faces.
///
/// Faces are `[v0, v1, v2]` with counter-clockwise winding when viewed from
/// outside. The mesh may be non-manifold and may contain disconnected
/// components; the segmentation pipeline tolerates both.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh is empty (no vertices or faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if mesh is empty.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = self.vertices[0].position;
        let mut max = self.vertices[0].position;

        for vertex in &self.vertices[1..] {
            let p = &vertex.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Vertical extent (Y axis) of the mesh, or 0 for an empty mesh.
    pub fn height(&self) -> f64 {
        self.bounds().map_or(0.0, |(min, max)| max.y - min.y)
    }

    /// Horizontal extent (X axis) of the mesh, or 0 for an empty mesh.
    pub fn width(&self) -> f64 {
        self.bounds().map_or(0.0, |(min, max)| max.x - min.x)
    }

    /// Center of the axis-aligned bounding box, or the origin for an empty mesh.
    pub fn bbox_center(&self) -> Point3<f64> {
        self.bounds().map_or(Point3::origin(), |(min, max)| {
            Point3::new(
                (min.x + max.x) / 2.0,
                (min.y + max.y) / 2.0,
                (min.z + max.z) / 2.0,
            )
        })
    }

    /// Iterate over triangles, yielding Triangle structs with actual vertex data.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    /// Triangle with concrete positions for the face at `index`.
    #[inline]
    pub fn face_triangle(&self, index: usize) -> Triangle {
        let [i0, i1, i2] = self.faces[index];
        Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        }
    }

    /// Translate mesh by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Scale mesh uniformly around the origin.
    pub fn scale(&mut self, factor: f64) {
        for vertex in &mut self.vertices {
            vertex.position.coords *= factor;
        }
    }

    /// Translate the mesh so its bounding-box center sits at the origin.
    ///
    /// This is the normalization applied before classification; all the
    /// anchor-relative rules assume an origin-centered, Y-up character.
    pub fn center_at_origin(&mut self) {
        let center = self.bbox_center();
        self.translate(-center.coords);
    }

    /// Append another mesh's geometry to this one, offsetting face indices.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().cloned());
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|&[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }

    /// Compute the signed volume of the mesh via the divergence theorem.
    ///
    /// Positive for a closed mesh with outward normals, negative when
    /// inside-out, near zero for open or inconsistently wound meshes.
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;

        for &[i0, i1, i2] in &self.faces {
            let v0 = &self.vertices[i0 as usize].position;
            let v1 = &self.vertices[i1 as usize].position;
            let v2 = &self.vertices[i2 as usize].position;

            // Signed tetrahedron volume against the origin: (v0 · (v1 × v2)) / 6
            let cross = Vector3::new(
                v1.y * v2.z - v1.z * v2.y,
                v1.z * v2.x - v1.x * v2.z,
                v1.x * v2.y - v1.y * v2.x,
            );
            volume += v0.x * cross.x + v0.y * cross.y + v0.z * cross.z;
        }

        volume / 6.0
    }

    /// Absolute enclosed volume. Only meaningful for closed meshes.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Check if the mesh appears to be inside-out (negative signed volume).
    #[inline]
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume() < 0.0
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }

    /// Area-weighted average of face centroids.
    ///
    /// Stable for both open and closed geometry, which is why part metadata
    /// uses it rather than the volume centroid.
    pub fn area_centroid(&self) -> Point3<f64> {
        let mut accum = Vector3::zeros();
        let mut total_area = 0.0;

        for tri in self.triangles() {
            let area = tri.area();
            accum += tri.centroid().coords * area;
            total_area += area;
        }

        if total_area > f64::EPSILON {
            Point3::from(accum / total_area)
        } else if !self.vertices.is_empty() {
            let sum: Vector3<f64> = self.vertices.iter().map(|v| v.position.coords).sum();
            Point3::from(sum / self.vertices.len() as f64)
        } else {
            Point3::origin()
        }
    }
}

/// A triangle with concrete vertex positions.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Compute the (unnormalized) face normal via cross product.
    /// The direction follows the right-hand rule with CCW winding.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    /// Returns None for degenerate triangles (zero area).
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Compute the area of the triangle.
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Compute the centroid (center of mass).
    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::new(
            (self.v0.x + self.v1.x + self.v2.x) / 3.0,
            (self.v0.y + self.v1.y + self.v2.y) / 3.0,
            (self.v0.z + self.v1.z + self.v2.z) / 3.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    /// Unit cube with outward-facing normals (CCW from outside), corners at
    /// (0,0,0) and (1,1,1).
    pub(crate) fn make_unit_cube() -> Mesh {
        let mut mesh = Mesh::new();

        for (x, y, z) in [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 1.0),
            (1.0, 1.0, 1.0),
            (0.0, 1.0, 1.0),
        ] {
            mesh.vertices.push(Vertex::from_coords(x, y, z));
        }

        for face in [
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [3, 7, 6],
            [3, 6, 2],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ] {
            mesh.faces.push(face);
        }

        mesh
    }

    #[test]
    fn test_vertex_lerp() {
        let mut a = Vertex::from_coords(0.0, 0.0, 0.0);
        let mut b = Vertex::from_coords(2.0, 4.0, 6.0);
        a.uv = Some([0.0, 0.0]);
        b.uv = Some([1.0, 1.0]);

        let mid = Vertex::lerp(&a, &b, 0.5);
        assert_abs_diff_eq!(mid.position.x, 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(mid.position.y, 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(mid.position.z, 3.0, epsilon = 1e-10);
        let uv = mid.uv.expect("both endpoints have uvs");
        assert_abs_diff_eq!(uv[0], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_vertex_lerp_drops_missing_attributes() {
        let mut a = Vertex::from_coords(0.0, 0.0, 0.0);
        a.uv = Some([0.0, 0.0]);
        let b = Vertex::from_coords(1.0, 0.0, 0.0);

        let mid = Vertex::lerp(&a, &b, 0.5);
        assert!(mid.uv.is_none());
        assert!(mid.normal.is_none());
    }

    #[test]
    fn test_mesh_bounds_and_extents() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(-2.0, 0.0, 1.0));
        mesh.vertices.push(Vertex::from_coords(3.0, 10.0, -1.0));

        let (min, max) = mesh.bounds().expect("non-empty mesh");
        assert_abs_diff_eq!(min.x, -2.0);
        assert_abs_diff_eq!(max.y, 10.0);
        assert_abs_diff_eq!(mesh.height(), 10.0);
        assert_abs_diff_eq!(mesh.width(), 5.0);
    }

    #[test]
    fn test_empty_mesh_bounds() {
        let mesh = Mesh::new();
        assert!(mesh.bounds().is_none());
        assert_abs_diff_eq!(mesh.height(), 0.0);
    }

    #[test]
    fn test_center_at_origin() {
        let mut mesh = make_unit_cube();
        mesh.center_at_origin();
        let center = mesh.bbox_center();
        assert_abs_diff_eq!(center.x, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(center.y, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(center.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_signed_volume_unit_cube() {
        let mesh = make_unit_cube();
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-10);
        assert!(!mesh.is_inside_out());
    }

    #[test]
    fn test_signed_volume_inverted_cube() {
        let mut mesh = make_unit_cube();
        for face in &mut mesh.faces {
            face.swap(1, 2);
        }
        assert_relative_eq!(mesh.signed_volume(), -1.0, epsilon = 1e-10);
        assert!(mesh.is_inside_out());
    }

    #[test]
    fn test_volume_translation_invariant() {
        let mut mesh = make_unit_cube();
        mesh.translate(Vector3::new(15.0, -3.0, 8.0));
        assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_surface_area_unit_cube() {
        let mesh = make_unit_cube();
        assert_relative_eq!(mesh.surface_area(), 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_area_centroid_cube() {
        let mesh = make_unit_cube();
        let c = mesh.area_centroid();
        assert_abs_diff_eq!(c.x, 0.5, epsilon = 1e-10);
        assert_abs_diff_eq!(c.y, 0.5, epsilon = 1e-10);
        assert_abs_diff_eq!(c.z, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = make_unit_cube();
        let mut b = make_unit_cube();
        b.translate(Vector3::new(5.0, 0.0, 0.0));

        let verts = a.vertex_count();
        a.merge(&b);
        assert_eq!(a.vertex_count(), verts * 2);
        assert_eq!(a.face_count(), 24);
        for face in &a.faces {
            assert!(face.iter().all(|&i| (i as usize) < a.vertices.len()));
        }
    }

    #[test]
    fn test_triangle_area_and_normal() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_abs_diff_eq!(tri.area(), 0.5, epsilon = 1e-10);
        let n = tri.normal().expect("non-degenerate");
        assert_abs_diff_eq!(n.z, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_degenerate_triangle_normal() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert!(tri.normal().is_none());
    }
}
