//! Connected component analysis.
//!
//! Two faces belong to the same component when they share a vertex. Vertex
//! connectivity (rather than edge connectivity) keeps limbs that touch the
//! torso only at a single point in one piece, which matters for assembled
//! character models.

use std::cmp::Reverse;

use hashbrown::HashMap;
use tracing::{debug, info};

use crate::adjacency::MeshAdjacency;
use crate::error::SegmentWarning;
use crate::types::Mesh;

/// Result of connected component analysis.
#[derive(Debug, Clone)]
pub struct ComponentAnalysis {
    /// Number of connected components found.
    pub component_count: usize,
    /// Face indices for each component, sorted by face count (largest first).
    pub components: Vec<Vec<u32>>,
    /// Surface area of each component, parallel to `components`.
    pub component_areas: Vec<f64>,
    /// Total surface area of the mesh.
    pub total_area: f64,
}

impl ComponentAnalysis {
    /// Check if the mesh is fully connected (single component).
    pub fn is_connected(&self) -> bool {
        self.component_count == 1
    }

    /// Get the face indices of the largest component.
    pub fn largest_component(&self) -> &[u32] {
        self.components.first().map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Surface area of a component as a fraction of the total area.
    pub fn area_fraction(&self, component: usize) -> f64 {
        if self.total_area <= 0.0 {
            return 0.0;
        }
        self.component_areas.get(component).copied().unwrap_or(0.0) / self.total_area
    }
}

impl std::fmt::Display for ComponentAnalysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Component Analysis:")?;
        writeln!(f, "  Connected components: {}", self.component_count)?;
        for (i, comp) in self.components.iter().enumerate() {
            writeln!(
                f,
                "    Component {}: {} faces ({:.1}% of area)",
                i + 1,
                comp.len(),
                self.area_fraction(i) * 100.0
            )?;
        }
        Ok(())
    }
}

/// Find all connected components in a mesh.
///
/// Uses a flood-fill over faces, where two faces are connected if they share
/// at least one vertex.
///
/// # Example
/// ```
/// use mesh_segment::{Mesh, Vertex};
/// use mesh_segment::components::find_connected_components;
///
/// let mut mesh = Mesh::new();
/// // Two disconnected triangles
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(10.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(11.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(10.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([3, 4, 5]);
///
/// let analysis = find_connected_components(&mesh);
/// assert_eq!(analysis.component_count, 2);
/// ```
pub fn find_connected_components(mesh: &Mesh) -> ComponentAnalysis {
    if mesh.faces.is_empty() {
        return ComponentAnalysis {
            component_count: 0,
            components: Vec::new(),
            component_areas: Vec::new(),
            total_area: 0.0,
        };
    }

    let adjacency = MeshAdjacency::build(&mesh.faces);
    let face_count = mesh.faces.len();

    let mut visited = vec![false; face_count];
    let mut components: Vec<Vec<u32>> = Vec::new();

    for start_face in 0..face_count {
        if visited[start_face] {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = vec![start_face as u32];
        visited[start_face] = true;

        while let Some(face_idx) = queue.pop() {
            component.push(face_idx);

            for &v in &mesh.faces[face_idx as usize] {
                for &neighbor in adjacency.faces_for_vertex(v) {
                    if !visited[neighbor as usize] {
                        visited[neighbor as usize] = true;
                        queue.push(neighbor);
                    }
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }

    components.sort_by_key(|c| Reverse(c.len()));

    let component_areas: Vec<f64> = components
        .iter()
        .map(|faces| {
            faces
                .iter()
                .map(|&f| mesh.face_triangle(f as usize).area())
                .sum()
        })
        .collect();
    let total_area: f64 = component_areas.iter().sum();

    info!(
        "Found {} connected component(s) in mesh with {} faces",
        components.len(),
        face_count
    );
    if components.len() > 1 {
        debug!(
            "Component sizes: {:?}",
            components.iter().map(|c| c.len()).collect::<Vec<_>>()
        );
    }

    ComponentAnalysis {
        component_count: components.len(),
        components,
        component_areas,
        total_area,
    }
}

/// Extract the faces listed in `face_indices` into an independent mesh.
///
/// Vertices are renumbered in first-use order, so the result is deterministic
/// for a given face list.
pub(crate) fn extract_submesh(mesh: &Mesh, face_indices: &[u32]) -> Mesh {
    let mut old_to_new: HashMap<u32, u32> = HashMap::new();
    let mut result = Mesh::with_capacity(face_indices.len() * 3, face_indices.len());

    for &face_idx in face_indices {
        let face = mesh.faces[face_idx as usize];
        let mut new_face = [0u32; 3];
        for (slot, &old_idx) in new_face.iter_mut().zip(face.iter()) {
            let new_idx = match old_to_new.get(&old_idx) {
                Some(&idx) => idx,
                None => {
                    let idx = result.vertices.len() as u32;
                    old_to_new.insert(old_idx, idx);
                    result
                        .vertices
                        .push(mesh.vertices[old_idx as usize].clone());
                    idx
                }
            };
            *slot = new_idx;
        }
        result.faces.push(new_face);
    }

    result
}

/// Split a mesh into separate meshes, one per connected component.
///
/// Results are sorted by face count (largest first) and each carries its own
/// renumbered vertex array.
pub fn split_into_components(mesh: &Mesh) -> Vec<Mesh> {
    let analysis = find_connected_components(mesh);

    if analysis.component_count <= 1 {
        return vec![mesh.clone()];
    }

    info!(
        "Splitting mesh into {} components",
        analysis.component_count
    );

    analysis
        .components
        .iter()
        .map(|faces| extract_submesh(mesh, faces))
        .collect()
}

/// Discard components whose surface area falls below `min_area_ratio` of the
/// total surface area.
///
/// Scan artifacts and floating debris typically show up as tiny shells; this
/// removes them before classification. Returns one warning per discarded
/// component. The largest component is always kept, so the mesh never comes
/// back empty.
pub fn remove_noise_components(mesh: &mut Mesh, min_area_ratio: f64) -> Vec<SegmentWarning> {
    let analysis = find_connected_components(mesh);
    if analysis.component_count <= 1 {
        return Vec::new();
    }

    let mut kept: Vec<u32> = Vec::new();
    let mut warnings = Vec::new();

    for (i, faces) in analysis.components.iter().enumerate() {
        let fraction = analysis.area_fraction(i);
        // Index 0 is the largest component
        if i == 0 || fraction >= min_area_ratio {
            kept.extend_from_slice(faces);
        } else {
            warnings.push(SegmentWarning::ComponentDiscarded {
                faces: faces.len(),
                area_fraction: fraction,
            });
        }
    }

    if warnings.is_empty() {
        return warnings;
    }

    info!(
        "Discarded {} noise component(s) below {:.2}% of surface area",
        warnings.len(),
        min_area_ratio * 100.0
    );

    kept.sort_unstable();
    *mesh = extract_submesh(mesh, &kept);
    warnings
}
