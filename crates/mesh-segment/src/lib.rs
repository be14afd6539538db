//! Anatomical segmentation of humanoid triangle meshes.
//!
//! This crate partitions a humanoid character mesh into a fixed taxonomy of
//! rigid body parts: 6 parts (R6: Head, Torso, LeftArm, RightArm, LeftLeg,
//! RightLeg) or 15 parts (R15: the torso and each limb further subdivided),
//! so that each part can be rigged independently in a skeletal animation
//! system.
//!
//! # Pipeline
//!
//! - **Classification**: assign geometry to the six top-level regions,
//!   either by classifying connected components against head/torso anchors
//!   ([`ClassifyStrategy::ComponentAnchor`]) or by cutting a single shell
//!   with axis-aligned planes ([`ClassifyStrategy::PlaneSlice`]).
//! - **Landmark detection**: find the neck and waist as cross-sectional
//!   area minima, with proportional fallbacks for featureless silhouettes.
//! - **Refinement**: subdivide the torso and limbs into the R15 parts with
//!   capped plane cuts at configured height fractions.
//! - **Repair**: heal every output part (weld, fill holes, hull fallback,
//!   decimate, orient outward) and guarantee a non-degenerate mesh in every
//!   taxonomy slot, substituting a placeholder triangle when a part received
//!   no geometry.
//!
//! # Coordinate System
//!
//! The engine is Y-up: height runs along +Y, and left/right are resolved by
//! the X sign after the input is centered at the origin. Face winding is
//! counter-clockwise viewed from outside, normals point outward.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_segment::{Mesh, SegmentConfig, Segmenter};
//!
//! # fn load_character() -> Mesh { Mesh::new() }
//! let mesh: Mesh = load_character();
//!
//! let segmenter = Segmenter::new(SegmentConfig::default()).unwrap();
//! let result = segmenter.segment_r15(&mesh).unwrap();
//!
//! for (part, segment) in result.parts.iter() {
//!     println!(
//!         "{}: {} faces, volume {:.3}",
//!         part,
//!         segment.mesh.face_count(),
//!         segment.volume
//!     );
//! }
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! ```
//!
//! # Guarantees
//!
//! - The result always covers the full taxonomy: every R6 (or R15) name maps
//!   to exactly one mesh, even when the input is missing a limb.
//! - Every returned part has at least one face and positive area.
//! - Recoverable geometry problems become [`SegmentWarning`]s or per-part
//!   [`RepairReport`] entries; only empty input and invalid configuration
//!   abort a run.
//!
//! # Error Handling
//!
//! Fatal operations return `SegmentResult<T>`, which is
//! `Result<T, SegmentError>`; errors carry `SEG-XXXX` codes and
//! [`miette`](https://docs.rs/miette) diagnostics.
//!
//! ```
//! use mesh_segment::{Mesh, SegmentConfig, SegmentError, segment_r6};
//!
//! match segment_r6(&Mesh::new(), &SegmentConfig::default()) {
//!     Ok(_) => println!("segmented"),
//!     Err(SegmentError::EmptyInput { details }) => {
//!         println!("nothing to segment: {}", details);
//!     }
//!     Err(e) => println!("error {}: {}", e.code(), e),
//! }
//! ```

mod error;
mod types;

pub mod adjacency;
pub mod classify;
pub mod components;
pub mod config;
pub mod decimate;
pub mod holes;
pub mod hull;
pub mod landmarks;
pub mod measure;
pub mod parts;
pub mod refine;
pub mod repair;
pub mod segment;
pub mod slice;
pub mod winding;

// Re-export core types at crate root
pub use error::{ErrorCode, SegmentError, SegmentResult, SegmentWarning, WarningSeverity};
pub use types::{Mesh, Triangle, Vertex};

// Re-export adjacency at crate root for convenience
pub use adjacency::MeshAdjacency;

// The segmentation surface
pub use config::{ClassifyStrategy, LandmarkMode, SegmentConfig};
pub use parts::{BodyPart, R15Parts, R6Parts, R15_PARTS, R6_PARTS};
pub use segment::{
    segment_r15, segment_r6, R15Result, R6Result, SegmentedPart, Segmenter,
};

// Kernel operations used by callers that post-process parts
pub use classify::classify_r6;
pub use components::{
    find_connected_components, remove_noise_components, split_into_components, ComponentAnalysis,
};
pub use decimate::{decimate, DecimateParams, DecimateResult};
pub use holes::{detect_holes, fill_holes, BoundaryLoop};
pub use hull::{convex_hull, convex_hull_of_points};
pub use landmarks::{detect_landmarks, Landmarks};
pub use measure::{area_profile, cross_section_at_y, AreaProfile, AreaSample, CrossSection};
pub use refine::refine_to_r15;
pub use repair::{
    compute_vertex_normals, remove_unreferenced_vertices, repair_part, scrub_invalid_faces,
    weld_vertices, RepairParams, RepairReport, RepairStep, StepOutcome, StepStatus,
};
pub use slice::{bisect_at_x, bisect_at_y, split_at_plane, PlaneSplit};
pub use winding::{repair_winding, WindingFix};
