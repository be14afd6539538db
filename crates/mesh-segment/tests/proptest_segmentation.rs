//! Property-based tests for segmentation invariants.
//!
//! These generate randomized figures and meshes and verify the guarantees
//! that hold for all valid inputs: taxonomy completeness, non-degenerate
//! parts, repair idempotence, and volume conservation under slicing.
//!
//! Run with: cargo test -p mesh-segment -- proptest

use mesh_segment::{
    detect_landmarks, repair_part, segment_r6, Mesh, RepairParams, SegmentConfig, Vertex,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Closed axis-aligned box, wound outward.
fn make_box(x0: f64, y0: f64, z0: f64, x1: f64, y1: f64, z1: f64) -> Mesh {
    let mut mesh = Mesh::new();
    for (x, y, z) in [
        (x0, y0, z0),
        (x1, y0, z0),
        (x1, y1, z0),
        (x0, y1, z0),
        (x0, y0, z1),
        (x1, y0, z1),
        (x1, y1, z1),
        (x0, y1, z1),
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

/// A random box with positive extent on every axis.
fn arb_box() -> impl Strategy<Value = Mesh> {
    (
        prop::array::uniform3(-10.0..10.0f64),
        prop::array::uniform3(0.1..5.0f64),
    )
        .prop_map(|([x, y, z], [dx, dy, dz])| make_box(x, y, z, x + dx, y + dy, z + dz))
}

/// One to four disjoint random boxes merged into one mesh.
fn arb_box_cluster() -> impl Strategy<Value = Mesh> {
    prop::collection::vec(arb_box(), 1..=4).prop_map(|boxes| {
        let mut mesh = Mesh::new();
        for (i, b) in boxes.iter().enumerate() {
            // Spread the boxes out so they stay disjoint
            let mut shifted = b.clone();
            shifted.translate(nalgebra::Vector3::new(i as f64 * 30.0, 0.0, 0.0));
            mesh.merge(&shifted);
        }
        mesh
    })
}

/// A humanoid-ish figure with jittered shell sizes.
fn arb_figure() -> impl Strategy<Value = Mesh> {
    (
        0.5..1.5f64, // head half-width
        1.5..2.5f64, // torso half-width
        0.5..1.5f64, // arm span beyond the torso
        0.5..2.0f64, // leg width
    )
        .prop_map(|(head_w, torso_w, arm_w, leg_w)| {
            let mut mesh = make_box(-head_w, 8.5, -1.0, head_w, 10.0, 1.0);
            mesh.merge(&make_box(-torso_w, 3.0, -1.0, torso_w, 8.5, 1.0));
            mesh.merge(&make_box(
                -torso_w - 0.5 - arm_w,
                4.0,
                -0.5,
                -torso_w - 0.5,
                8.0,
                0.5,
            ));
            mesh.merge(&make_box(
                torso_w + 0.5,
                4.0,
                -0.5,
                torso_w + 0.5 + arm_w,
                8.0,
                0.5,
            ));
            mesh.merge(&make_box(-leg_w, 0.0, -1.0, -0.2, 3.0, 1.0));
            mesh.merge(&make_box(0.2, 0.0, -1.0, leg_w, 3.0, 1.0));
            mesh
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_figure_segments_into_a_complete_result(mesh in arb_figure()) {
        let config = SegmentConfig {
            torso_ratio: 0.3,
            ..Default::default()
        };
        let result = segment_r6(&mesh, &config).unwrap();

        for (part, segment) in result.parts.iter() {
            prop_assert!(segment.mesh.face_count() >= 1, "{} is empty", part);
            prop_assert!(segment.mesh.surface_area() > 0.0, "{} has no area", part);
            prop_assert!(segment.volume.is_finite());
            prop_assert!(segment.volume >= 0.0);
        }
    }

    #[test]
    fn segmentation_never_drops_figure_volume(mesh in arb_figure()) {
        let config = SegmentConfig {
            torso_ratio: 0.3,
            ..Default::default()
        };
        let result = segment_r6(&mesh, &config).unwrap();

        let total: f64 = result.parts.iter().map(|(_, s)| s.volume).sum();
        let expected = mesh.volume();
        prop_assert!(
            (total - expected).abs() < expected * 0.01,
            "parts {} vs input {}", total, expected
        );
    }

    #[test]
    fn repair_is_idempotent_on_box_clusters(mesh in arb_box_cluster()) {
        let params = RepairParams::default();
        let (once, _) = repair_part(&mesh, &params);
        let (twice, report) = repair_part(&once, &params);

        prop_assert_eq!(once.face_count(), twice.face_count());
        prop_assert_eq!(once.vertex_count(), twice.vertex_count());
        prop_assert!(!report.has_failures());
        prop_assert!(
            (once.volume() - twice.volume()).abs() <= once.volume() * 1e-9
        );
    }

    #[test]
    fn repaired_parts_face_outward(mesh in arb_box()) {
        let mut inverted = mesh.clone();
        for face in &mut inverted.faces {
            face.swap(1, 2);
        }

        let (repaired, _) = repair_part(&inverted, &RepairParams::default());
        prop_assert!(repaired.signed_volume() > 0.0);
    }

    #[test]
    fn landmarks_stay_inside_the_mesh_bounds(mesh in arb_box_cluster()) {
        let (landmarks, _) = detect_landmarks(&mesh, &SegmentConfig::default());
        let (min, max) = mesh.bounds().unwrap();

        prop_assert!(landmarks.neck_y >= min.y && landmarks.neck_y <= max.y);
        prop_assert!(landmarks.waist_y >= min.y && landmarks.waist_y <= max.y);
    }

    #[test]
    fn plane_split_conserves_volume(mesh in arb_box(), t in 0.1..0.9f64) {
        let (min, max) = mesh.bounds().unwrap();
        let y = min.y + t * (max.y - min.y);

        let (below, above) = mesh_segment::bisect_at_y(&mesh, y, true);
        let sum = below.volume() + above.volume();
        prop_assert!(
            (sum - mesh.volume()).abs() < mesh.volume() * 1e-6,
            "{} + {} != {}", below.volume(), above.volume(), mesh.volume()
        );
    }

    #[test]
    fn dangling_face_indices_are_always_rejected(
        mesh in arb_box(),
        extra in 8u32..100u32,
    ) {
        let mut broken = mesh;
        broken.faces.push([0, 1, extra]);
        prop_assert!(segment_r6(&broken, &SegmentConfig::default()).is_err());
    }
}
