//! Winding consistency and outward orientation.
//!
//! The repair pipeline's final geometry step: a BFS over shared edges makes
//! every face in a component agree with its neighbors, then the signed
//! volume decides whether the whole mesh needs a global flip to face
//! outward.

use hashbrown::HashSet;
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::adjacency::MeshAdjacency;
use crate::types::Mesh;

/// What the winding repair changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindingFix {
    /// Faces flipped to agree with their component.
    pub flipped_faces: usize,
    /// Shells inverted wholesale because their consistent orientation
    /// pointed inward.
    pub inverted_components: usize,
}

impl WindingFix {
    /// True when any shell was turned outward.
    pub fn globally_flipped(&self) -> bool {
        self.inverted_components > 0
    }
}

/// Make face winding consistent, then orient each shell outward.
///
/// Consistency is established per connected component by BFS: two faces
/// sharing an edge must traverse it in opposite directions. A component
/// whose consistent orientation encloses negative signed volume is then
/// flipped wholesale.
pub fn repair_winding(mesh: &mut Mesh) -> WindingFix {
    let mut fix = WindingFix::default();
    if mesh.faces.is_empty() {
        return fix;
    }

    let (flipped, components) = make_consistent(mesh);
    fix.flipped_faces = flipped;

    for component in &components {
        if component_signed_volume(mesh, component) < 0.0 {
            for &face_idx in component {
                mesh.faces[face_idx as usize].swap(1, 2);
            }
            fix.inverted_components += 1;
        }
    }
    if fix.inverted_components > 0 {
        info!(
            "Inverted {} inside-out shell(s)",
            fix.inverted_components
        );
    }

    fix
}

/// Signed volume contribution of one component's faces.
fn component_signed_volume(mesh: &Mesh, faces: &[u32]) -> f64 {
    let mut volume = 0.0;
    for &face_idx in faces {
        let [i0, i1, i2] = mesh.faces[face_idx as usize];
        let v0 = mesh.vertices[i0 as usize].position;
        let v1 = mesh.vertices[i1 as usize].position;
        let v2 = mesh.vertices[i2 as usize].position;
        volume += v0.coords.dot(&v1.coords.cross(&v2.coords));
    }
    volume / 6.0
}

/// Flood-fill winding consistency. Returns the number of faces flipped and
/// the edge-connected components found along the way.
fn make_consistent(mesh: &mut Mesh) -> (usize, Vec<Vec<u32>>) {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let face_count = mesh.faces.len();

    let mut visited: HashSet<u32> = HashSet::new();
    let mut to_flip: HashSet<u32> = HashSet::new();
    let mut components: Vec<Vec<u32>> = Vec::new();

    for start in 0..face_count as u32 {
        if visited.contains(&start) {
            continue;
        }

        let mut component = Vec::new();
        let mut queue: VecDeque<u32> = VecDeque::new();
        queue.push_back(start);
        visited.insert(start);

        while let Some(face_idx) = queue.pop_front() {
            component.push(face_idx);
            let face = mesh.faces[face_idx as usize];

            for i in 0..3 {
                let a = face[i];
                let b = face[(i + 1) % 3];

                let Some(neighbors) = adjacency.faces_for_edge(a, b) else {
                    continue;
                };
                for &neighbor in neighbors {
                    if neighbor == face_idx || visited.contains(&neighbor) {
                        continue;
                    }
                    visited.insert(neighbor);

                    // Neighbor should traverse the shared edge as b -> a.
                    // Traversing it as a -> b means its winding disagrees.
                    let same_direction = edge_direction(&mesh.faces[neighbor as usize], a, b)
                        .unwrap_or_default();
                    let disagrees = if to_flip.contains(&face_idx) {
                        !same_direction
                    } else {
                        same_direction
                    };
                    if disagrees {
                        to_flip.insert(neighbor);
                    }

                    queue.push_back(neighbor);
                }
            }
        }

        components.push(component);
    }

    for &face_idx in &to_flip {
        mesh.faces[face_idx as usize].swap(1, 2);
    }

    if to_flip.is_empty() {
        debug!("Winding already consistent");
    } else {
        info!("Flipped {} face(s) for consistent winding", to_flip.len());
    }
    (to_flip.len(), components)
}

/// Whether edge (a, b) appears in `face` as a -> b (`Some(true)`), b -> a
/// (`Some(false)`), or not at all.
fn edge_direction(face: &[u32; 3], a: u32, b: u32) -> Option<bool> {
    for i in 0..3 {
        let v0 = face[i];
        let v1 = face[(i + 1) % 3];
        if v0 == a && v1 == b {
            return Some(true);
        }
        if v0 == b && v1 == a {
            return Some(false);
        }
    }
    None
}

impl Mesh {
    /// Make winding consistent and orient this mesh outward.
    pub fn repair_winding(&mut self) -> WindingFix {
        repair_winding(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::tests::make_box;
    use crate::Vertex;

    #[test]
    fn consistent_mesh_is_untouched() {
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let fix = repair_winding(&mut mesh);
        assert_eq!(fix.flipped_faces, 0);
        assert_eq!(fix.inverted_components, 0);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn single_bad_face_is_flipped() {
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        mesh.faces[5].swap(1, 2);

        let fix = repair_winding(&mut mesh);
        assert!(fix.flipped_faces >= 1);
        assert!((mesh.signed_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn inside_out_mesh_is_inverted() {
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        for face in &mut mesh.faces {
            face.swap(1, 2);
        }
        assert!(mesh.is_inside_out());

        let fix = repair_winding(&mut mesh);
        assert_eq!(fix.inverted_components, 1);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn disconnected_components_fixed_independently() {
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let mut other = make_box(5.0, 0.0, 0.0, 6.0, 1.0, 1.0);
        for face in &mut other.faces {
            face.swap(1, 2); // Second box inside out
        }
        mesh.merge(&other);

        repair_winding(&mut mesh);
        // Combined signed volume of two outward boxes
        assert!((mesh.signed_volume() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn shared_edge_directions_disagree_after_fix() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.5, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.5, -1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([0, 1, 3]); // Same direction on edge (0,1): inconsistent

        repair_winding(&mut mesh);

        let d0 = edge_direction(&mesh.faces[0], 0, 1);
        let d1 = edge_direction(&mesh.faces[1], 0, 1);
        assert_ne!(d0, d1);
    }
}
