//! Mesh decimation by shortest-edge collapse.
//!
//! Part repair only needs best-effort density reduction on oversized parts,
//! so the collapse priority is plain edge length: the shortest edges carry
//! the least shape information and go first.

use hashbrown::HashSet;
use nalgebra::Point3;
use tracing::{debug, info};

use crate::adjacency::MeshAdjacency;
use crate::repair::remove_unreferenced_vertices;
use crate::types::Mesh;

/// Parameters for mesh decimation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecimateParams {
    /// Target number of triangles. If None, uses `target_ratio` instead.
    pub target_triangles: Option<usize>,
    /// Target ratio of triangles to keep (0.0 to 1.0). Default: 0.8
    pub target_ratio: f64,
    /// Whether to leave boundary vertices untouched. Default: true
    pub preserve_boundary: bool,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_triangles: None,
            target_ratio: 0.8,
            preserve_boundary: true,
        }
    }
}

impl DecimateParams {
    /// Create params targeting a specific triangle count.
    pub fn with_target_triangles(count: usize) -> Self {
        Self {
            target_triangles: Some(count),
            ..Default::default()
        }
    }

    /// Create params targeting a ratio of original triangles.
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Default::default()
        }
    }
}

/// Result of mesh decimation.
#[derive(Debug, Clone)]
pub struct DecimateResult {
    /// The decimated mesh.
    pub mesh: Mesh,
    /// Number of triangles in the original mesh.
    pub original_triangles: usize,
    /// Number of triangles in the decimated mesh.
    pub final_triangles: usize,
    /// Number of edge collapses performed.
    pub collapses_performed: usize,
    /// Number of edge collapses rejected (boundary or already-touched).
    pub collapses_rejected: usize,
}

/// Decimate a mesh by collapsing its shortest edges.
///
/// Runs greedy passes: each pass sorts the surviving edges by length and
/// collapses non-overlapping edges (both endpoints untouched this pass) to
/// their midpoints until the target face count is reached or no further
/// collapse is possible.
pub fn decimate(mesh: &Mesh, params: &DecimateParams) -> DecimateResult {
    let original_triangles = mesh.face_count();
    let target = params
        .target_triangles
        .unwrap_or(((original_triangles as f64) * params.target_ratio) as usize)
        .max(1);

    let mut work = mesh.clone();
    let mut collapses_performed = 0;
    let mut collapses_rejected = 0;

    while work.face_count() > target {
        let remaining = work.face_count() - target;
        let collapsed = collapse_pass(
            &mut work,
            remaining,
            params.preserve_boundary,
            &mut collapses_rejected,
        );
        if collapsed == 0 {
            debug!("Decimation pass made no progress, stopping");
            break;
        }
        collapses_performed += collapsed;
    }

    remove_unreferenced_vertices(&mut work);

    info!(
        "Decimated {} -> {} triangles ({} collapses, {} rejected)",
        original_triangles,
        work.face_count(),
        collapses_performed,
        collapses_rejected
    );

    DecimateResult {
        final_triangles: work.face_count(),
        mesh: work,
        original_triangles,
        collapses_performed,
        collapses_rejected,
    }
}

/// One greedy collapse pass. Returns the number of collapses applied.
fn collapse_pass(
    mesh: &mut Mesh,
    faces_to_remove: usize,
    preserve_boundary: bool,
    rejected: &mut usize,
) -> usize {
    let adjacency = MeshAdjacency::build(&mesh.faces);

    let boundary_vertices: HashSet<u32> = if preserve_boundary {
        adjacency
            .boundary_edges()
            .flat_map(|(a, b)| [a, b])
            .collect()
    } else {
        HashSet::new()
    };

    // Candidate edges sorted by length, indices as a deterministic tie-break
    let mut edges: Vec<((u32, u32), f64)> = adjacency
        .edge_to_faces
        .keys()
        .map(|&(a, b)| {
            let pa = mesh.vertices[a as usize].position;
            let pb = mesh.vertices[b as usize].position;
            ((a, b), (pb - pa).norm_squared())
        })
        .collect();
    edges.sort_by(|x, y| {
        x.1.partial_cmp(&y.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(x.0.cmp(&y.0))
    });

    let mut remap: Vec<u32> = (0..mesh.vertices.len() as u32).collect();
    let mut touched: HashSet<u32> = HashSet::new();
    let mut collapsed = 0;

    for &((a, b), _) in &edges {
        // Each collapse removes roughly two faces
        if collapsed * 2 >= faces_to_remove {
            break;
        }
        if touched.contains(&a) || touched.contains(&b) {
            *rejected += 1;
            continue;
        }
        if preserve_boundary && (boundary_vertices.contains(&a) || boundary_vertices.contains(&b)) {
            *rejected += 1;
            continue;
        }

        let midpoint = Point3::from(
            (mesh.vertices[a as usize].position.coords + mesh.vertices[b as usize].position.coords)
                / 2.0,
        );
        mesh.vertices[a as usize].position = midpoint;
        remap[b as usize] = a;
        touched.insert(a);
        touched.insert(b);
        collapsed += 1;
    }

    if collapsed == 0 {
        return 0;
    }

    // Apply the remap and drop faces that collapsed to a line or point
    mesh.faces = mesh
        .faces
        .iter()
        .map(|&[i0, i1, i2]| {
            [
                remap[i0 as usize],
                remap[i1 as usize],
                remap[i2 as usize],
            ]
        })
        .filter(|&[i0, i1, i2]| i0 != i1 && i1 != i2 && i0 != i2)
        .collect();

    collapsed
}

impl Mesh {
    /// Decimate this mesh by shortest-edge collapse.
    pub fn decimate(&self, params: &DecimateParams) -> DecimateResult {
        decimate(self, params)
    }
}
