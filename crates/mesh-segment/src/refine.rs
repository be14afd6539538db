//! R6 to R15 refinement by capped plane cuts.
//!
//! The torso splits once into upper and lower halves; each limb splits
//! twice into upper, lower, and end segments. Every cut is a capped
//! horizontal slice at a configured fraction of the part's own height, so
//! refinement never moves volume between parts.

use tracing::{debug, info};

use crate::config::SegmentConfig;
use crate::parts::{R15Parts, R6Parts};
use crate::slice::bisect_at_y;
use crate::types::Mesh;

/// Minimum vertex count for a part to be worth cutting.
const MIN_REFINABLE_VERTICES: usize = 4;

/// Subdivide the six R6 regions into the fifteen R15 parts.
///
/// The head passes through untouched. Parts too small to cut yield empty
/// sub-parts (the repair pipeline turns those into placeholders); this
/// never fails.
pub fn refine_to_r15(r6: R6Parts<Mesh>, config: &SegmentConfig) -> R15Parts<Mesh> {
    let R6Parts {
        head,
        torso,
        left_arm,
        right_arm,
        left_leg,
        right_leg,
    } = r6;

    let (upper_torso, lower_torso) = split_torso(&torso, config.torso_split_ratio);
    let [left_upper_arm, left_lower_arm, left_hand] = split_limb(&left_arm, config.arm_cut_ratios);
    let [right_upper_arm, right_lower_arm, right_hand] =
        split_limb(&right_arm, config.arm_cut_ratios);
    let [left_upper_leg, left_lower_leg, left_foot] = split_limb(&left_leg, config.leg_cut_ratios);
    let [right_upper_leg, right_lower_leg, right_foot] =
        split_limb(&right_leg, config.leg_cut_ratios);

    info!("Refined 6 regions into 15 parts");

    R15Parts {
        head,
        upper_torso,
        lower_torso,
        left_upper_arm,
        left_lower_arm,
        left_hand,
        right_upper_arm,
        right_lower_arm,
        right_hand,
        left_upper_leg,
        left_lower_leg,
        left_foot,
        right_upper_leg,
        right_lower_leg,
        right_foot,
    }
}

/// Split the torso at `ratio` of its own height above its bottom.
/// Returns (upper, lower).
fn split_torso(torso: &Mesh, ratio: f64) -> (Mesh, Mesh) {
    if !is_refinable(torso) {
        debug!("Torso too small to split");
        return (Mesh::new(), Mesh::new());
    }
    let Some((min, max)) = torso.bounds() else {
        return (Mesh::new(), Mesh::new());
    };

    let split_y = min.y + ratio * (max.y - min.y);
    let (lower, upper) = bisect_at_y(torso, split_y, true);
    debug!(
        "Torso split at y = {:.3}: {} / {} faces",
        split_y,
        upper.face_count(),
        lower.face_count()
    );
    (upper, lower)
}

/// Split a limb into [upper, lower, end] at the two configured fractions of
/// its own height, measured down from its top.
fn split_limb(limb: &Mesh, cuts: (f64, f64)) -> [Mesh; 3] {
    if !is_refinable(limb) {
        debug!("Limb too small to split");
        return [Mesh::new(), Mesh::new(), Mesh::new()];
    }
    let Some((min, max)) = limb.bounds() else {
        return [Mesh::new(), Mesh::new(), Mesh::new()];
    };

    let height = max.y - min.y;
    let upper_cut_y = max.y - cuts.0 * height;
    let lower_cut_y = max.y - cuts.1 * height;

    let (rest, upper) = bisect_at_y(limb, upper_cut_y, true);
    let (end, lower) = bisect_at_y(&rest, lower_cut_y, true);

    debug!(
        "Limb cut at y = {:.3} / {:.3}: {} / {} / {} faces",
        upper_cut_y,
        lower_cut_y,
        upper.face_count(),
        lower.face_count(),
        end.face_count()
    );

    [upper, lower, end]
}

fn is_refinable(mesh: &Mesh) -> bool {
    mesh.vertex_count() >= MIN_REFINABLE_VERTICES && !mesh.faces.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::tests::make_box;
    use crate::parts::R15_PARTS;

    fn limb_box() -> Mesh {
        // Unit-square column from y = 0 to 10
        make_box(0.0, 0.0, 0.0, 1.0, 10.0, 1.0)
    }

    #[test]
    fn limb_splits_at_configured_heights() {
        let [upper, lower, end] = split_limb(&limb_box(), (0.4, 0.8));

        let (upper_min, upper_max) = upper.bounds().unwrap();
        assert!((upper_max.y - 10.0).abs() < 1e-9);
        assert!((upper_min.y - 6.0).abs() < 1e-9);

        let (lower_min, lower_max) = lower.bounds().unwrap();
        assert!((lower_max.y - 6.0).abs() < 1e-9);
        assert!((lower_min.y - 2.0).abs() < 1e-9);

        let (end_min, end_max) = end.bounds().unwrap();
        assert!((end_max.y - 2.0).abs() < 1e-9);
        assert!((end_min.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn limb_split_conserves_volume() {
        let limb = limb_box();
        let segments = split_limb(&limb, (0.33, 0.66));
        let total: f64 = segments.iter().map(Mesh::volume).sum();
        assert!((total - limb.volume()).abs() < limb.volume() * 1e-6);
    }

    #[test]
    fn torso_splits_above_its_bottom() {
        let torso = make_box(-2.0, 3.0, -1.0, 2.0, 8.0, 1.0);
        let (upper, lower) = split_torso(&torso, 0.45);

        // Split plane at 3 + 0.45 * 5 = 5.25
        let (_, lower_max) = lower.bounds().unwrap();
        let (upper_min, _) = upper.bounds().unwrap();
        assert!((lower_max.y - 5.25).abs() < 1e-9);
        assert!((upper_min.y - 5.25).abs() < 1e-9);
    }

    #[test]
    fn tiny_part_yields_empty_segments() {
        let mut sliver = Mesh::new();
        sliver.vertices.push(crate::Vertex::from_coords(0.0, 0.0, 0.0));
        sliver.vertices.push(crate::Vertex::from_coords(1.0, 0.0, 0.0));
        sliver.vertices.push(crate::Vertex::from_coords(0.0, 1.0, 0.0));
        sliver.faces.push([0, 1, 2]);

        let segments = split_limb(&sliver, (0.4, 0.8));
        assert!(segments.iter().all(|m| m.is_empty()));
    }

    #[test]
    fn refine_is_total_over_the_taxonomy() {
        let r6 = R6Parts {
            head: make_box(-1.0, 8.5, -1.0, 1.0, 10.0, 1.0),
            torso: make_box(-2.0, 3.0, -1.0, 2.0, 8.5, 1.0),
            left_arm: make_box(-5.0, 4.0, -0.5, -2.5, 8.0, 0.5),
            right_arm: make_box(2.5, 4.0, -0.5, 5.0, 8.0, 0.5),
            left_leg: make_box(-2.0, 0.0, -1.0, -0.5, 3.0, 1.0),
            right_leg: Mesh::new(), // Missing limb stays representable
        };
        let head_faces = r6.head.face_count();

        let r15 = refine_to_r15(r6, &SegmentConfig::default());

        let listed: Vec<_> = r15.iter().map(|(part, _)| part).collect();
        assert_eq!(listed, R15_PARTS.to_vec());

        // Head passes through unchanged
        assert_eq!(r15.head.face_count(), head_faces);

        // The missing leg produced three empty segments
        assert!(r15.right_upper_leg.is_empty());
        assert!(r15.right_lower_leg.is_empty());
        assert!(r15.right_foot.is_empty());
    }

    #[test]
    fn refine_conserves_parent_volume() {
        let arm = make_box(2.5, 4.0, -0.5, 5.0, 8.0, 0.5);
        let arm_volume = arm.volume();
        let r6 = R6Parts {
            right_arm: arm,
            ..Default::default()
        };

        let r15 = refine_to_r15(r6, &SegmentConfig::default());
        let sum = r15.right_upper_arm.volume()
            + r15.right_lower_arm.volume()
            + r15.right_hand.volume();
        assert!((sum - arm_volume).abs() < arm_volume * 1e-6);
    }
}
