//! Mesh adjacency data structures.
//!
//! Edge-to-face and vertex-to-face lookups shared by the components,
//! winding, and hole-filling passes.

use hashbrown::HashMap;

/// Adjacency information for a mesh.
///
/// Edges are stored with normalized direction (smaller index first), so
/// `(a, b)` and `(b, a)` resolve to the same entry.
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    /// Maps edge (v0, v1) with v0 < v1 to the faces sharing it.
    pub edge_to_faces: HashMap<(u32, u32), Vec<u32>>,
    /// Maps vertex index to the faces touching it.
    pub vertex_to_faces: HashMap<u32, Vec<u32>>,
}

impl MeshAdjacency {
    /// Build adjacency information from a list of faces.
    #[must_use]
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        let mut vertex_to_faces: HashMap<u32, Vec<u32>> = HashMap::new();

        for (face_idx, face) in faces.iter().enumerate() {
            let face_idx = face_idx as u32;

            for &v in face {
                vertex_to_faces.entry(v).or_default().push(face_idx);
            }

            for edge in [
                normalize_edge(face[0], face[1]),
                normalize_edge(face[1], face[2]),
                normalize_edge(face[2], face[0]),
            ] {
                edge_to_faces.entry(edge).or_default().push(face_idx);
            }
        }

        Self {
            edge_to_faces,
            vertex_to_faces,
        }
    }

    /// Get faces adjacent to an edge, or `None` if the edge doesn't exist.
    #[must_use]
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[u32]> {
        self.edge_to_faces
            .get(&normalize_edge(v0, v1))
            .map(Vec::as_slice)
    }

    /// Get faces adjacent to a vertex (empty slice if none).
    #[must_use]
    pub fn faces_for_vertex(&self, v: u32) -> &[u32] {
        self.vertex_to_faces.get(&v).map_or(&[], Vec::as_slice)
    }

    /// Iterate over all boundary edges (edges with exactly one adjacent face).
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Count the number of boundary edges.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Check if the mesh is watertight (no boundary edges).
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() >= 2)
    }

    /// Check if the mesh is manifold (no edge shared by more than 2 faces).
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() <= 2)
    }
}

/// Normalize edge direction so v0 < v1.
#[inline]
fn normalize_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 { (v0, v1) } else { (v1, v0) }
}
