//! Part repair: welding, scrubbing, and the per-part repair pipeline.
//!
//! Every segmented part runs through the same fixed sequence of repair
//! steps. Each step is a pure transform on the part's geometry; its outcome
//! (applied, skipped, or failed) is recorded in a [`RepairReport`] rather
//! than raised, so one bad limb never aborts a segmentation run. When a step
//! fails, the part keeps its pre-step geometry.

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::adjacency::MeshAdjacency;
use crate::components::split_into_components;
use crate::decimate::{decimate, DecimateParams};
use crate::holes::fill_holes;
use crate::hull::convex_hull;
use crate::types::{Mesh, Triangle, Vertex};
use crate::winding::repair_winding;

/// Side length of the degenerate stand-in triangle emitted for empty parts.
const PLACEHOLDER_SIZE: f64 = 1e-3;

/// Parameters for the part repair pipeline.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepairParams {
    /// Distance threshold for vertex welding.
    pub weld_epsilon: f64,
    /// Holes with more boundary edges than this are left open.
    pub max_hole_edges: usize,
    /// Triangles with area below this are scrubbed as degenerate.
    pub degenerate_area_threshold: f64,
    /// Parts with more faces than this are decimated.
    pub decimate_face_threshold: usize,
    /// Fraction of faces kept when decimating.
    pub decimate_target_ratio: f64,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-6,
            max_hole_edges: 100,
            degenerate_area_threshold: 1e-9,
            decimate_face_threshold: 5000,
            decimate_target_ratio: 0.8,
        }
    }
}

/// Identity of a repair pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStep {
    /// Replace an empty or sub-triangle part with a placeholder.
    Placeholder,
    /// Merge coincident vertices.
    WeldVertices,
    /// Remove degenerate faces and non-finite geometry.
    ScrubInvalid,
    /// Drop vertices no face references.
    RemoveUnreferenced,
    /// Close small boundary loops.
    FillHoles,
    /// Replace still-open components with their convex hulls.
    HullFallback,
    /// Reduce face density on oversized parts.
    Decimate,
    /// Make winding consistent and outward-facing.
    OrientOutward,
}

impl RepairStep {
    pub fn name(&self) -> &'static str {
        match self {
            RepairStep::Placeholder => "placeholder",
            RepairStep::WeldVertices => "weld_vertices",
            RepairStep::ScrubInvalid => "scrub_invalid",
            RepairStep::RemoveUnreferenced => "remove_unreferenced",
            RepairStep::FillHoles => "fill_holes",
            RepairStep::HullFallback => "hull_fallback",
            RepairStep::Decimate => "decimate",
            RepairStep::OrientOutward => "orient_outward",
        }
    }
}

/// What happened when a step ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The step changed the geometry.
    Applied,
    /// The step had nothing to do.
    Skipped,
    /// The step produced unusable geometry; the part kept its pre-step state.
    Failed,
}

/// Recorded outcome of one pipeline step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: RepairStep,
    pub status: StepStatus,
    /// Human-readable note (counts, failure reason).
    pub details: String,
}

/// Full record of a part's trip through the repair pipeline.
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    pub steps: Vec<StepOutcome>,
    /// True when the part was replaced by a placeholder triangle.
    pub placeholder: bool,
}

impl RepairReport {
    /// Outcome of a given step, if it ran.
    pub fn outcome(&self, step: RepairStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|o| o.step == step)
    }

    /// True when any step failed.
    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|o| o.status == StepStatus::Failed)
    }

    fn record(&mut self, step: RepairStep, status: StepStatus, details: impl Into<String>) {
        self.steps.push(StepOutcome {
            step,
            status,
            details: details.into(),
        });
    }
}

impl std::fmt::Display for RepairReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Repair Report:")?;
        for outcome in &self.steps {
            let status = match outcome.status {
                StepStatus::Applied => "applied",
                StepStatus::Skipped => "skipped",
                StepStatus::Failed => "FAILED",
            };
            writeln!(f, "  {:20} {:8} {}", outcome.step.name(), status, outcome.details)?;
        }
        Ok(())
    }
}

// ============================================================================
// Repair primitives
// ============================================================================

/// Weld vertices closer than `epsilon` using a spatial hash.
///
/// Returns the number of vertices merged. Faces that collapse to a line or
/// point after welding are removed.
pub fn weld_vertices(mesh: &mut Mesh, epsilon: f64) -> usize {
    let original_count = mesh.vertices.len();
    if original_count == 0 {
        return 0;
    }

    let cell_size = (epsilon * 2.0).max(f64::MIN_POSITIVE);
    let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        grid.entry(cell_of(&vertex.position, cell_size))
            .or_default()
            .push(idx as u32);
    }

    // Canonical representative is the smallest index in each cluster
    let mut remap: Vec<u32> = (0..original_count as u32).collect();
    let mut merged = 0;

    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let idx = idx as u32;
        if remap[idx as usize] != idx {
            continue;
        }

        let cell = cell_of(&vertex.position, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = grid.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz))
                    else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || remap[other as usize] != other {
                            continue;
                        }
                        let d = (vertex.position - mesh.vertices[other as usize].position).norm();
                        if d < epsilon {
                            remap[other as usize] = idx;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }

    if merged == 0 {
        return 0;
    }

    // Resolve transitive merges
    for i in 0..remap.len() {
        let mut target = remap[i];
        while remap[target as usize] != target {
            target = remap[target as usize];
        }
        remap[i] = target;
    }

    for face in &mut mesh.faces {
        for v in face.iter_mut() {
            *v = remap[*v as usize];
        }
    }
    mesh.faces
        .retain(|&[i0, i1, i2]| i0 != i1 && i1 != i2 && i0 != i2);

    info!(
        "Welded {} vertices (epsilon = {:.2e}): {} -> {}",
        merged,
        epsilon,
        original_count,
        original_count - merged
    );
    merged
}

/// Remove faces that are degenerate or touch non-finite vertices.
///
/// Returns the number of faces removed.
pub fn scrub_invalid_faces(mesh: &mut Mesh, area_threshold: f64) -> usize {
    let original_count = mesh.faces.len();

    mesh.faces.retain(|&[i0, i1, i2]| {
        if i0 == i1 || i1 == i2 || i0 == i2 {
            return false;
        }
        let p0 = mesh.vertices[i0 as usize].position;
        let p1 = mesh.vertices[i1 as usize].position;
        let p2 = mesh.vertices[i2 as usize].position;
        if ![p0, p1, p2]
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
        {
            return false;
        }
        Triangle::new(p0, p1, p2).area() >= area_threshold
    });

    let removed = original_count - mesh.faces.len();
    if removed > 0 {
        info!("Scrubbed {} invalid face(s)", removed);
    }
    removed
}

/// Remove unreferenced vertices and compact the vertex array.
///
/// Returns the number of vertices removed.
pub fn remove_unreferenced_vertices(mesh: &mut Mesh) -> usize {
    let original_count = mesh.vertices.len();

    let referenced: HashSet<u32> = mesh.faces.iter().flatten().copied().collect();
    if referenced.len() == original_count {
        return 0;
    }

    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut compacted = Vec::with_capacity(referenced.len());
    for (old_idx, vertex) in mesh.vertices.iter().enumerate() {
        if referenced.contains(&(old_idx as u32)) {
            remap.insert(old_idx as u32, compacted.len() as u32);
            compacted.push(vertex.clone());
        }
    }

    for face in &mut mesh.faces {
        for v in face.iter_mut() {
            *v = remap[v];
        }
    }

    let removed = original_count - compacted.len();
    mesh.vertices = compacted;

    if removed > 0 {
        info!("Removed {} unreferenced vertices", removed);
    }
    removed
}

/// Compute vertex normals as the area-weighted average of adjacent face
/// normals.
pub fn compute_vertex_normals(mesh: &mut Mesh) {
    let mut accum = vec![nalgebra::Vector3::zeros(); mesh.vertices.len()];

    for face in &mesh.faces {
        let tri = mesh_triangle(mesh, face);
        // Unnormalized normal has length 2*area, giving the area weighting
        let weighted = tri.normal_unnormalized();
        for &v in face {
            accum[v as usize] += weighted;
        }
    }

    for (vertex, n) in mesh.vertices.iter_mut().zip(accum) {
        let len_sq = n.norm_squared();
        vertex.normal = if len_sq > f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        };
    }

    debug!("Computed vertex normals for {} vertices", mesh.vertices.len());
}

/// Build the stand-in mesh for a part that received no usable geometry:
/// a single tiny triangle at `center`.
pub fn placeholder_triangle(center: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::new();
    let s = PLACEHOLDER_SIZE;
    mesh.vertices
        .push(Vertex::new(Point3::new(center.x - s, center.y, center.z)));
    mesh.vertices
        .push(Vertex::new(Point3::new(center.x + s, center.y, center.z)));
    mesh.vertices
        .push(Vertex::new(Point3::new(center.x, center.y + s, center.z)));
    mesh.faces.push([0, 1, 2]);
    mesh
}

// ============================================================================
// The part repair pipeline
// ============================================================================

/// Run the full repair pipeline on one part's geometry.
///
/// Pure: the input is not modified. Returns the repaired mesh and the
/// per-step report. A part with fewer than 4 vertices (or no faces) is
/// replaced with a placeholder triangle and skips the remaining steps.
pub fn repair_part(mesh: &Mesh, params: &RepairParams) -> (Mesh, RepairReport) {
    let mut report = RepairReport::default();

    if mesh.vertices.len() < 4 || mesh.faces.is_empty() {
        let center = mesh.area_centroid();
        report.record(
            RepairStep::Placeholder,
            StepStatus::Applied,
            format!(
                "{} vertices / {} faces, emitting placeholder",
                mesh.vertex_count(),
                mesh.face_count()
            ),
        );
        report.placeholder = true;
        warn!(
            "Part too small to repair ({} vertices), emitting placeholder",
            mesh.vertex_count()
        );
        return (placeholder_triangle(center), report);
    }
    report.record(
        RepairStep::Placeholder,
        StepStatus::Skipped,
        "part has usable geometry",
    );

    let mut work = mesh.clone();

    run_step(&mut work, &mut report, RepairStep::WeldVertices, |m| {
        let merged = weld_vertices(m, params.weld_epsilon);
        (merged > 0, format!("{} vertices merged", merged))
    });

    run_step(&mut work, &mut report, RepairStep::ScrubInvalid, |m| {
        let removed = scrub_invalid_faces(m, params.degenerate_area_threshold);
        (removed > 0, format!("{} faces scrubbed", removed))
    });

    run_step(&mut work, &mut report, RepairStep::RemoveUnreferenced, |m| {
        let removed = remove_unreferenced_vertices(m);
        (removed > 0, format!("{} vertices removed", removed))
    });

    run_step(&mut work, &mut report, RepairStep::FillHoles, |m| {
        let filled = fill_holes(m, params.max_hole_edges);
        (filled > 0, format!("{} holes filled", filled))
    });

    run_step(&mut work, &mut report, RepairStep::HullFallback, |m| {
        let hulled = hull_open_components(m);
        (hulled > 0, format!("{} component(s) hulled", hulled))
    });

    if work.face_count() > params.decimate_face_threshold {
        run_step(&mut work, &mut report, RepairStep::Decimate, |m| {
            let result = decimate(m, &DecimateParams::with_target_ratio(params.decimate_target_ratio));
            let details = format!(
                "{} -> {} faces",
                result.original_triangles, result.final_triangles
            );
            let changed = result.final_triangles < result.original_triangles;
            *m = result.mesh;
            (changed, details)
        });
    } else {
        report.record(
            RepairStep::Decimate,
            StepStatus::Skipped,
            format!(
                "{} faces under threshold {}",
                work.face_count(),
                params.decimate_face_threshold
            ),
        );
    }

    run_step(&mut work, &mut report, RepairStep::OrientOutward, |m| {
        let fix = repair_winding(m);
        (
            fix.flipped_faces > 0 || fix.globally_flipped(),
            format!(
                "{} faces flipped, {} shell(s) inverted",
                fix.flipped_faces, fix.inverted_components
            ),
        )
    });

    compute_vertex_normals(&mut work);

    (work, report)
}

/// Replace every component that still has boundary edges after hole filling
/// with its convex hull. Returns the number of components replaced.
///
/// The hull is watertight by construction, so this is the closing move for
/// loose interpenetrating geometry (teeth, buttons) whose holes cannot be
/// chained into fillable loops.
fn hull_open_components(mesh: &mut Mesh) -> usize {
    if MeshAdjacency::build(&mesh.faces).is_watertight() {
        return 0;
    }

    let mut replaced = 0;
    let mut rebuilt = Mesh::new();
    for component in split_into_components(mesh) {
        if MeshAdjacency::build(&component.faces).is_watertight() {
            rebuilt.merge(&component);
            continue;
        }
        match convex_hull(&component) {
            Ok(hull) => {
                rebuilt.merge(&hull);
                replaced += 1;
            }
            Err(err) => {
                // Keep the open component rather than lose it
                warn!("Hull fallback failed for open component: {}", err);
                rebuilt.merge(&component);
            }
        }
    }

    if replaced > 0 {
        info!("Replaced {} open component(s) with convex hulls", replaced);
        *mesh = rebuilt;
    }
    replaced
}

/// Run one step on a working copy; revert and record a failure if the step
/// leaves the mesh without faces.
fn run_step(
    work: &mut Mesh,
    report: &mut RepairReport,
    step: RepairStep,
    transform: impl FnOnce(&mut Mesh) -> (bool, String),
) {
    let before = work.clone();
    let (changed, details) = transform(work);

    if work.faces.is_empty() {
        warn!("Repair step {} emptied the part, reverting", step.name());
        *work = before;
        report.record(step, StepStatus::Failed, "step emptied the part, reverted");
        return;
    }

    let status = if changed {
        StepStatus::Applied
    } else {
        StepStatus::Skipped
    };
    report.record(step, status, details);
}

fn mesh_triangle(mesh: &Mesh, face: &[u32; 3]) -> Triangle {
    Triangle::new(
        mesh.vertices[face[0] as usize].position,
        mesh.vertices[face[1] as usize].position,
        mesh.vertices[face[2] as usize].position,
    )
}

fn cell_of(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::tests::make_box;
    use crate::Vertex;

    fn box_with_duplicate_seam() -> Mesh {
        // Two boxes sharing a face plane but with separate vertices
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        mesh.merge(&make_box(1.0, 0.0, 0.0, 2.0, 1.0, 1.0));
        mesh
    }

    #[test]
    fn weld_merges_coincident_vertices() {
        let mut mesh = box_with_duplicate_seam();
        let before = mesh.vertex_count();
        let merged = weld_vertices(&mut mesh, 1e-6);
        assert_eq!(merged, 4); // The shared seam corners
        assert_eq!(mesh.vertex_count(), before); // Compaction is a later step
        remove_unreferenced_vertices(&mut mesh);
        assert_eq!(mesh.vertex_count(), before - 4);
    }

    #[test]
    fn weld_zero_epsilon_is_noop() {
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        assert_eq!(weld_vertices(&mut mesh, 0.0), 0);
    }

    #[test]
    fn scrub_removes_nan_faces() {
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        mesh.vertices[0].position.x = f64::NAN;
        let removed = scrub_invalid_faces(&mut mesh, 1e-9);
        // Vertex 0 touches multiple faces
        assert!(removed > 0);
        for face in &mesh.faces {
            assert!(face.iter().all(|&v| {
                let p = mesh.vertices[v as usize].position;
                p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
            }));
        }
    }

    #[test]
    fn normals_point_outward_on_box() {
        let mut mesh = make_box(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0);
        compute_vertex_normals(&mut mesh);
        for vertex in &mesh.vertices {
            let n = vertex.normal.expect("all vertices have faces");
            // Corner normals of a centered box point away from the center
            assert!(n.dot(&vertex.position.coords) > 0.0);
        }
    }

    #[test]
    fn placeholder_for_empty_part() {
        let (repaired, report) = repair_part(&Mesh::new(), &RepairParams::default());
        assert!(report.placeholder);
        assert_eq!(repaired.vertex_count(), 3);
        assert_eq!(repaired.face_count(), 1);
    }

    #[test]
    fn placeholder_for_sub_triangle_part() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);

        let (repaired, report) = repair_part(&mesh, &RepairParams::default());
        assert!(report.placeholder);
        assert_eq!(repaired.face_count(), 1);
    }

    #[test]
    fn repair_reports_every_step() {
        let mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let (_, report) = repair_part(&mesh, &RepairParams::default());
        assert!(!report.placeholder);
        for step in [
            RepairStep::Placeholder,
            RepairStep::WeldVertices,
            RepairStep::ScrubInvalid,
            RepairStep::RemoveUnreferenced,
            RepairStep::FillHoles,
            RepairStep::HullFallback,
            RepairStep::Decimate,
            RepairStep::OrientOutward,
        ] {
            assert!(report.outcome(step).is_some(), "missing {:?}", step);
        }
    }

    #[test]
    fn unfillable_hole_triggers_hull_fallback() {
        // Unit box missing its top face
        let mut mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let top_y = 1.0;
        mesh.faces.retain(|&[i0, i1, i2]| {
            ![i0, i1, i2]
                .iter()
                .all(|&v| mesh.vertices[v as usize].position.y == top_y)
        });

        let params = RepairParams {
            max_hole_edges: 3, // The 4-edge opening cannot be filled
            ..RepairParams::default()
        };
        let (repaired, report) = repair_part(&mesh, &params);

        let hull_step = report.outcome(RepairStep::HullFallback).unwrap();
        assert_eq!(hull_step.status, StepStatus::Applied);
        assert!(MeshAdjacency::build(&repaired.faces).is_watertight());
        assert!((repaired.volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn repair_is_idempotent() {
        let mesh = box_with_duplicate_seam();
        let params = RepairParams::default();

        let (once, first) = repair_part(&mesh, &params);
        let (twice, second) = repair_part(&once, &params);

        assert!(!first.placeholder);
        assert!(!second.placeholder);
        assert_eq!(once.face_count(), twice.face_count());
        assert_eq!(once.vertex_count(), twice.vertex_count());
        // Second pass should find nothing to do
        for outcome in &second.steps {
            assert_ne!(outcome.status, StepStatus::Failed);
        }
    }

    #[test]
    fn repaired_closed_mesh_is_outward() {
        let mut mesh = make_box(0.0, 0.0, 0.0, 2.0, 2.0, 2.0);
        // Flip everything inside out
        for face in &mut mesh.faces {
            face.swap(1, 2);
        }
        let (repaired, _) = repair_part(&mesh, &RepairParams::default());
        assert!(repaired.signed_volume() > 0.0);
    }

    #[test]
    fn report_display_lists_steps() {
        let mesh = make_box(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let (_, report) = repair_part(&mesh, &RepairParams::default());
        let text = format!("{}", report);
        assert!(text.contains("weld_vertices"));
        assert!(text.contains("orient_outward"));
    }
}
