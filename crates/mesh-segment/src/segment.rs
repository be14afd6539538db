//! The segmentation orchestrator.
//!
//! [`Segmenter`] sequences validation, normalization, classification,
//! refinement, and per-part repair into a complete R6 or R15 result. Parts
//! are independent once classified, so repair runs in parallel.

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{info, info_span};

use crate::classify::classify_r6;
use crate::config::SegmentConfig;
use crate::error::{SegmentError, SegmentResult, SegmentWarning};
use crate::parts::{BodyPart, R15Parts, R6Parts};
use crate::refine::refine_to_r15;
use crate::repair::{repair_part, RepairParams, RepairReport};
use crate::types::Mesh;

/// One repaired, named body part with its metadata.
#[derive(Debug, Clone)]
pub struct SegmentedPart {
    /// The part's repaired geometry.
    pub mesh: Mesh,
    /// Enclosed volume of the repaired geometry.
    pub volume: f64,
    /// Area-weighted surface centroid.
    pub centroid: Point3<f64>,
    /// What the repair pipeline did to this part.
    pub repair: RepairReport,
}

/// Result of a six-part segmentation.
#[derive(Debug, Clone)]
pub struct R6Result {
    /// One entry per R6 part, always complete.
    pub parts: R6Parts<SegmentedPart>,
    /// Recoverable conditions encountered during the run.
    pub warnings: Vec<SegmentWarning>,
}

/// Result of a fifteen-part segmentation.
#[derive(Debug, Clone)]
pub struct R15Result {
    /// One entry per R15 part, always complete.
    pub parts: R15Parts<SegmentedPart>,
    /// Recoverable conditions encountered during the run.
    pub warnings: Vec<SegmentWarning>,
}

/// Humanoid mesh segmenter.
///
/// Owns a validated configuration; one instance can segment any number of
/// meshes. Each run is independent.
///
/// # Example
///
/// ```rust,ignore
/// use mesh_segment::{Segmenter, SegmentConfig};
///
/// let segmenter = Segmenter::new(SegmentConfig::default())?;
/// let result = segmenter.segment_r15(&mesh)?;
/// for (part, segment) in result.parts.iter() {
///     println!("{}: {:.3} volume", part, segment.volume);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmentConfig,
    repair_params: RepairParams,
}

impl Segmenter {
    /// Create a segmenter, validating the configuration up front.
    pub fn new(config: SegmentConfig) -> SegmentResult<Self> {
        config.validate()?;
        let repair_params = RepairParams {
            weld_epsilon: config.weld_epsilon,
            decimate_face_threshold: config.decimate_face_threshold,
            decimate_target_ratio: config.decimate_target_ratio,
            ..RepairParams::default()
        };
        Ok(Self {
            config,
            repair_params,
        })
    }

    /// The validated configuration this segmenter runs with.
    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Segment a mesh into the six R6 parts.
    pub fn segment_r6(&self, mesh: &Mesh) -> SegmentResult<R6Result> {
        let span = info_span!("segment_r6");
        let _guard = span.enter();

        let work = self.prepare(mesh)?;
        let (zones, mut warnings) = classify_r6(&work, &self.config);

        let (parts, repair_warnings) = self.repair_r6(zones);
        warnings.extend(repair_warnings);

        info!("R6 segmentation complete ({} warnings)", warnings.len());
        Ok(R6Result { parts, warnings })
    }

    /// Segment a mesh into the fifteen R15 parts.
    ///
    /// Classification and the R6 repair complete before any refinement, so
    /// the refiner always works on healed zone geometry.
    pub fn segment_r15(&self, mesh: &Mesh) -> SegmentResult<R15Result> {
        let span = info_span!("segment_r15");
        let _guard = span.enter();

        let work = self.prepare(mesh)?;
        let (zones, mut warnings) = classify_r6(&work, &self.config);

        let (r6_parts, _) = self.repair_r6(zones);
        let r6_meshes = r6_parts.map(|_, segment| segment.mesh);

        let refined = refine_to_r15(r6_meshes, &self.config);
        let (parts, repair_warnings) = self.repair_r15(refined);
        warnings.extend(repair_warnings);

        info!("R15 segmentation complete ({} warnings)", warnings.len());
        Ok(R15Result { parts, warnings })
    }

    /// Validate the input and normalize it to the origin.
    fn prepare(&self, mesh: &Mesh) -> SegmentResult<Mesh> {
        validate_input(mesh)?;
        let mut work = mesh.clone();
        work.center_at_origin();
        Ok(work)
    }

    fn repair_r6(&self, zones: R6Parts<Mesh>) -> (R6Parts<SegmentedPart>, Vec<SegmentWarning>) {
        let mut staged: Vec<(BodyPart, Mesh)> = Vec::with_capacity(6);
        zones.map(|part, mesh| staged.push((part, mesh)));

        let (mut repaired, warnings) = self.repair_all(staged);
        let parts = R6Parts::from_fn(|part| take_part(&mut repaired, part));
        (parts, warnings)
    }

    fn repair_r15(&self, parts: R15Parts<Mesh>) -> (R15Parts<SegmentedPart>, Vec<SegmentWarning>) {
        let mut staged: Vec<(BodyPart, Mesh)> = Vec::with_capacity(15);
        parts.map(|part, mesh| staged.push((part, mesh)));

        let (mut repaired, warnings) = self.repair_all(staged);
        let parts = R15Parts::from_fn(|part| take_part(&mut repaired, part));
        (parts, warnings)
    }

    /// Repair every staged part in parallel, collecting warnings for
    /// placeholders and failed steps.
    fn repair_all(
        &self,
        staged: Vec<(BodyPart, Mesh)>,
    ) -> (Vec<(BodyPart, SegmentedPart)>, Vec<SegmentWarning>) {
        let repaired: Vec<(BodyPart, SegmentedPart, Vec<SegmentWarning>)> = staged
            .into_par_iter()
            .map(|(part, mesh)| {
                let (fixed, report) = repair_part(&mesh, &self.repair_params);

                let mut part_warnings = Vec::new();
                if report.placeholder {
                    part_warnings.push(SegmentWarning::EmptyPart {
                        part_name: part.name(),
                    });
                } else if report.has_failures() {
                    part_warnings.push(SegmentWarning::DegeneratePart {
                        part_name: part.name(),
                        details: "one or more repair steps reverted".to_string(),
                    });
                }

                let segment = SegmentedPart {
                    volume: fixed.volume(),
                    centroid: fixed.area_centroid(),
                    mesh: fixed,
                    repair: report,
                };
                (part, segment, part_warnings)
            })
            .collect();

        let mut parts = Vec::with_capacity(repaired.len());
        let mut warnings = Vec::new();
        for (part, segment, part_warnings) in repaired {
            parts.push((part, segment));
            warnings.extend(part_warnings);
        }
        (parts, warnings)
    }
}

/// Pull one part out of the repaired list. Every taxonomy slot was staged,
/// so a miss can only mean taxonomy and staging disagree.
fn take_part(repaired: &mut Vec<(BodyPart, SegmentedPart)>, part: BodyPart) -> SegmentedPart {
    match repaired.iter().position(|(p, _)| *p == part) {
        Some(i) => repaired.swap_remove(i).1,
        None => unreachable!("taxonomy slot {} was never staged", part),
    }
}

/// Reject meshes that cannot be segmented: no geometry, dangling face
/// indices, or non-finite coordinates.
pub fn validate_input(mesh: &Mesh) -> SegmentResult<()> {
    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        return Err(SegmentError::empty_input(format!(
            "{} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        )));
    }

    let vertex_count = mesh.vertices.len();
    for (face_index, face) in mesh.faces.iter().enumerate() {
        for &v in face {
            if v as usize >= vertex_count {
                return Err(SegmentError::invalid_vertex_index(
                    face_index,
                    v,
                    vertex_count,
                ));
            }
        }
    }

    for (vertex_index, vertex) in mesh.vertices.iter().enumerate() {
        let p = vertex.position;
        for (coordinate, value) in [("x", p.x), ("y", p.y), ("z", p.z)] {
            if !value.is_finite() {
                return Err(SegmentError::invalid_coordinate(
                    vertex_index,
                    coordinate,
                    value,
                ));
            }
        }
    }

    Ok(())
}

/// Segment a mesh into the six R6 parts with the given configuration.
pub fn segment_r6(mesh: &Mesh, config: &SegmentConfig) -> SegmentResult<R6Result> {
    Segmenter::new(config.clone())?.segment_r6(mesh)
}

/// Segment a mesh into the fifteen R15 parts with the given configuration.
pub fn segment_r15(mesh: &Mesh, config: &SegmentConfig) -> SegmentResult<R15Result> {
    Segmenter::new(config.clone())?.segment_r15(mesh)
}
