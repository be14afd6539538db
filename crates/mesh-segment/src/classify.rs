//! Top-level zone classification into the six R6 regions.
//!
//! Two strategies cover the two kinds of input we see in practice. Assembled
//! character models arrive as many disconnected shells, and the component
//! strategy classifies each shell by its position relative to the head and
//! torso anchors. Single-shell sculpts carry no component information, so
//! the plane strategy cuts the body apart with axis-aligned planes instead.

use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::components::{extract_submesh, find_connected_components, remove_noise_components};
use crate::config::{ClassifyStrategy, LandmarkMode, SegmentConfig};
use crate::error::SegmentWarning;
use crate::landmarks::detect_landmarks;
use crate::parts::{BodyPart, R6Parts};
use crate::slice::{bisect_at_x, bisect_at_y};
use crate::types::Mesh;

/// Classify a normalized mesh into the six R6 regions.
///
/// Slots that receive no geometry stay empty; the repair pipeline fills them
/// with placeholders later. Never fails: degenerate inputs degrade to
/// everything landing in the torso slot.
pub fn classify_r6(mesh: &Mesh, config: &SegmentConfig) -> (R6Parts<Mesh>, Vec<SegmentWarning>) {
    match config.strategy {
        ClassifyStrategy::ComponentAnchor => classify_by_components(mesh, config),
        ClassifyStrategy::PlaneSlice => classify_by_planes(mesh, config),
    }
}

// ============================================================================
// Component-anchor strategy
// ============================================================================

/// Per-component measurements used by the classification rules.
struct ComponentInfo {
    centroid: Point3<f64>,
    min: Point3<f64>,
    max: Point3<f64>,
    area: f64,
}

/// Spatial context shared by all rules in one classification pass.
struct ZoneContext {
    /// X of the mesh's bounding-box center.
    center_x: f64,
    /// Components whose centroid sits below this height are legs.
    leg_y: f64,
    /// Centroid X offsets at or beyond this are arms.
    arm_threshold: f64,
    /// Bottom of the head anchor, when one was found.
    head_anchor_min_y: Option<f64>,
}

/// One classification rule: a predicate that either claims the component for
/// a part or passes it to the next rule.
type ZoneRule = fn(&ComponentInfo, &ZoneContext) -> Option<BodyPart>;

/// The classification rule table, evaluated top to bottom per component.
/// The first rule that claims a component wins; order is the tie-break.
const ZONE_RULES: [(&str, ZoneRule); 4] = [
    ("head-proximity", rule_head_proximity),
    ("arm-beyond-torso", rule_arm_beyond_torso),
    ("leg-below-threshold", rule_leg_below_threshold),
    ("torso-default", rule_torso_default),
];

/// Components at or above the head anchor's bottom belong to the head
/// (hair, hats, detached facial geometry).
fn rule_head_proximity(info: &ComponentInfo, ctx: &ZoneContext) -> Option<BodyPart> {
    let anchor_min_y = ctx.head_anchor_min_y?;
    (info.centroid.y >= anchor_min_y).then_some(BodyPart::Head)
}

/// Components whose centroid sits at or beyond the torso's horizontal extent
/// are arms; `centroid.x <= center -> Left`.
fn rule_arm_beyond_torso(info: &ComponentInfo, ctx: &ZoneContext) -> Option<BodyPart> {
    let offset = info.centroid.x - ctx.center_x;
    if offset.abs() < ctx.arm_threshold {
        return None; // Inside the torso band
    }
    Some(if offset <= 0.0 {
        BodyPart::LeftArm
    } else {
        BodyPart::RightArm
    })
}

/// Components whose centroid sits below the leg threshold are legs, split by
/// X sign with the same `<= center -> Left` tie-break.
fn rule_leg_below_threshold(info: &ComponentInfo, ctx: &ZoneContext) -> Option<BodyPart> {
    if info.centroid.y >= ctx.leg_y {
        return None;
    }
    Some(if info.centroid.x <= ctx.center_x {
        BodyPart::LeftLeg
    } else {
        BodyPart::RightLeg
    })
}

/// Everything unclaimed is torso.
fn rule_torso_default(_info: &ComponentInfo, _ctx: &ZoneContext) -> Option<BodyPart> {
    Some(BodyPart::Torso)
}

fn classify_by_components(
    mesh: &Mesh,
    config: &SegmentConfig,
) -> (R6Parts<Mesh>, Vec<SegmentWarning>) {
    let mut work = mesh.clone();
    let mut warnings = remove_noise_components(&mut work, config.min_component_area_ratio);

    let analysis = find_connected_components(&work);
    let Some((min, max)) = work.bounds() else {
        return (R6Parts::default(), warnings);
    };

    if analysis.component_count <= 1 {
        // A single shell carries no component information
        warn!("Mesh is a single component; everything classified as Torso");
        warnings.push(SegmentWarning::DegeneratePart {
            part_name: "Torso",
            details: "single-component mesh, component classification degraded".to_string(),
        });
        let mut zones = R6Parts::default();
        zones.torso = work;
        return (zones, warnings);
    }

    let height = max.y - min.y;
    let width = max.x - min.x;
    let center_x = (min.x + max.x) / 2.0;
    let head_band_y = max.y - config.head_ratio * height;
    let leg_y = min.y + config.torso_ratio * height;

    let infos: Vec<ComponentInfo> = analysis
        .components
        .iter()
        .enumerate()
        .map(|(i, faces)| {
            let sub = extract_submesh(&work, faces);
            let (cmin, cmax) = sub.bounds().unwrap_or((min, max));
            ComponentInfo {
                centroid: sub.area_centroid(),
                min: cmin,
                max: cmax,
                area: analysis.component_areas[i],
            }
        })
        .collect();

    // Head anchor: the topmost component reaching into the head band,
    // ties broken by area
    let head_anchor = infos
        .iter()
        .enumerate()
        .filter(|(_, info)| info.max.y > head_band_y)
        .max_by(|(_, a), (_, b)| {
            a.max
                .y
                .partial_cmp(&b.max.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.area
                        .partial_cmp(&b.area)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        })
        .map(|(i, _)| i);

    // Torso anchor: the largest remaining component centered in both the
    // horizontal and vertical middle bands
    let central_half_width = config.arm_x_offset * width;
    let torso_anchor = infos
        .iter()
        .enumerate()
        .filter(|&(i, info)| {
            Some(i) != head_anchor
                && (info.centroid.x - center_x).abs() <= central_half_width
                && info.centroid.y >= leg_y
                && info.centroid.y <= head_band_y
        })
        .max_by(|(_, a), (_, b)| {
            a.area
                .partial_cmp(&b.area)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i);

    // Arms start where the torso anchor ends; without one, fall back to the
    // configured central band
    let arm_threshold = torso_anchor
        .map(|i| {
            let info = &infos[i];
            (info.max.x - center_x).abs().max((info.min.x - center_x).abs())
        })
        .unwrap_or(central_half_width);

    let ctx = ZoneContext {
        center_x,
        leg_y,
        arm_threshold,
        head_anchor_min_y: head_anchor.map(|i| infos[i].min.y),
    };

    debug!(
        "Anchors: head = {:?}, torso = {:?}, arm threshold = {:.3}",
        head_anchor, torso_anchor, ctx.arm_threshold
    );

    let mut zones: R6Parts<Mesh> = R6Parts::default();
    for (i, info) in infos.iter().enumerate() {
        let part = if Some(i) == head_anchor {
            BodyPart::Head
        } else if Some(i) == torso_anchor {
            BodyPart::Torso
        } else {
            apply_rules(info, &ctx)
        };

        debug!(
            "Component {} ({} faces, centroid {:.2},{:.2},{:.2}) -> {}",
            i,
            analysis.components[i].len(),
            info.centroid.x,
            info.centroid.y,
            info.centroid.z,
            part
        );

        let sub = extract_submesh(&work, &analysis.components[i]);
        match zones.get_mut(part) {
            Some(slot) => slot.merge(&sub),
            None => unreachable!("rules only emit R6 parts"),
        }
    }

    info!(
        "Component classification: {} components over 6 zones",
        analysis.component_count
    );
    (zones, warnings)
}

/// Evaluate the rule table top to bottom. The final rule is total, so a
/// part always comes out.
fn apply_rules(info: &ComponentInfo, ctx: &ZoneContext) -> BodyPart {
    for (name, rule) in ZONE_RULES {
        if let Some(part) = rule(info, ctx) {
            debug!("Rule '{}' claimed component", name);
            return part;
        }
    }
    BodyPart::Torso
}

// ============================================================================
// Plane-slice strategy
// ============================================================================

fn classify_by_planes(
    mesh: &Mesh,
    config: &SegmentConfig,
) -> (R6Parts<Mesh>, Vec<SegmentWarning>) {
    let mut warnings = Vec::new();
    let Some((min, max)) = mesh.bounds() else {
        return (R6Parts::default(), warnings);
    };

    let height = max.y - min.y;
    let width = max.x - min.x;
    let center_x = (min.x + max.x) / 2.0;
    let band = config.arm_x_offset * width;

    // Remove the central band to isolate the arms
    let (left_arm, rest) = bisect_at_x(mesh, center_x - band, true);
    let (core, right_arm) = bisect_at_x(&rest, center_x + band, true);

    // Boundary heights come from the landmark detector on the armless core,
    // or directly from the configured ratios
    let (head_y, leg_y) = match config.landmark_mode {
        LandmarkMode::Auto => {
            let (landmarks, landmark_warnings) = detect_landmarks(&core, config);
            warnings.extend(landmark_warnings);
            (landmarks.neck_y, landmarks.waist_y)
        }
        LandmarkMode::Manual => (
            max.y - config.head_ratio * height,
            min.y + (1.0 - config.head_ratio - config.torso_ratio) * height,
        ),
    };

    let (below_head, head) = bisect_at_y(&core, head_y, true);
    let (legs, torso) = bisect_at_y(&below_head, leg_y, true);
    let (left_leg, right_leg) = bisect_at_x(&legs, center_x, true);

    info!(
        "Plane classification: head_y = {:.3}, leg_y = {:.3}, arm band = ±{:.3}",
        head_y, leg_y, band
    );

    (
        R6Parts {
            head,
            torso,
            left_arm,
            right_arm,
            left_leg,
            right_leg,
        },
        warnings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::tests::make_box;

    /// The six-shell figure: head on top, torso in the middle, arms out to
    /// the sides, legs at the bottom. Bounds Y in [0, 10], X in [-5, 5].
    fn assembled_figure() -> Mesh {
        let mut mesh = make_box(-1.0, 8.5, -1.0, 1.0, 10.0, 1.0); // head
        mesh.merge(&make_box(-2.0, 3.0, -1.0, 2.0, 8.5, 1.0)); // torso
        mesh.merge(&make_box(-5.0, 4.0, -0.5, -2.5, 8.0, 0.5)); // left arm
        mesh.merge(&make_box(2.5, 4.0, -0.5, 5.0, 8.0, 0.5)); // right arm
        mesh.merge(&make_box(-2.0, 0.0, -1.0, -0.5, 3.0, 1.0)); // left leg
        mesh.merge(&make_box(0.5, 0.0, -1.0, 2.0, 3.0, 1.0)); // right leg
        mesh
    }

    fn figure_config() -> SegmentConfig {
        SegmentConfig {
            head_ratio: 0.22,
            torso_ratio: 0.3,
            ..Default::default()
        }
    }

    #[test]
    fn assembled_figure_classifies_each_shell() {
        let mesh = assembled_figure();
        let (zones, _) = classify_r6(&mesh, &figure_config());

        // Each region got exactly one 12-face box
        for (part, zone) in zones.iter() {
            assert_eq!(zone.face_count(), 12, "{} has wrong geometry", part);
        }

        let (_, head_max) = zones.head.bounds().unwrap();
        assert!((head_max.y - 10.0).abs() < 1e-9);

        let (left_min, left_max) = zones.left_arm.bounds().unwrap();
        assert!(left_max.x <= -2.0);
        assert!(left_min.x >= -5.0 - 1e-9);

        let (_, right_leg_max) = zones.right_leg.bounds().unwrap();
        assert!(right_leg_max.y <= 3.0 + 1e-9);
        assert!(right_leg_max.x > 0.0);
    }

    #[test]
    fn centroid_on_center_line_goes_left() {
        // A leg shell centered exactly on X = 0 must deterministically be
        // the left leg
        let mut mesh = make_box(-1.0, 8.5, -1.0, 1.0, 10.0, 1.0); // head
        mesh.merge(&make_box(-2.0, 3.0, -1.0, 2.0, 8.5, 1.0)); // torso
        mesh.merge(&make_box(-0.5, 0.0, -0.5, 0.5, 3.0, 0.5)); // centered leg

        let (zones, _) = classify_r6(&mesh, &figure_config());
        assert_eq!(zones.left_leg.face_count(), 12);
        assert!(zones.right_leg.is_empty());
    }

    #[test]
    fn single_component_degrades_to_torso() {
        let mesh = make_box(-1.0, 0.0, -1.0, 1.0, 10.0, 1.0);
        let (zones, warnings) = classify_r6(&mesh, &SegmentConfig::default());

        assert_eq!(zones.torso.face_count(), mesh.face_count());
        assert!(zones.head.is_empty());
        assert!(warnings
            .iter()
            .any(|w| matches!(w, SegmentWarning::DegeneratePart { .. })));
    }

    #[test]
    fn noise_shell_is_discarded_before_classification() {
        let mut mesh = assembled_figure();
        // A speck far out to the right, small enough to be noise
        mesh.merge(&make_box(20.0, 5.0, 0.0, 20.01, 5.01, 0.01));

        let (zones, warnings) = classify_r6(&mesh, &figure_config());
        assert!(warnings
            .iter()
            .any(|w| matches!(w, SegmentWarning::ComponentDiscarded { .. })));
        assert_eq!(zones.right_arm.face_count(), 12);
    }

    #[test]
    fn plane_strategy_covers_all_zones() {
        // One solid block tall enough to carve into bands
        let mesh = make_box(-5.0, 0.0, -1.0, 5.0, 10.0, 1.0);
        let config = SegmentConfig {
            strategy: ClassifyStrategy::PlaneSlice,
            landmark_mode: LandmarkMode::Manual,
            ..figure_config()
        };

        let (zones, _) = classify_r6(&mesh, &config);

        for (part, zone) in zones.iter() {
            assert!(!zone.is_empty(), "{} is empty", part);
        }

        // Head band starts at 10 - 0.22 * 10 = 7.8
        let (head_min, _) = zones.head.bounds().unwrap();
        assert!((head_min.y - 7.8).abs() < 1e-6);

        // Legs end at (1 - 0.22 - 0.3) * 10 = 4.8
        let (_, leg_max) = zones.left_leg.bounds().unwrap();
        assert!((leg_max.y - 4.8).abs() < 1e-6);

        // Arms live beyond ±0.2 * width = ±2 from center
        let (_, left_arm_max) = zones.left_arm.bounds().unwrap();
        assert!(left_arm_max.x <= -2.0 + 1e-6);
    }

    #[test]
    fn plane_strategy_conserves_volume() {
        let mesh = make_box(-5.0, 0.0, -1.0, 5.0, 10.0, 1.0);
        let config = SegmentConfig {
            strategy: ClassifyStrategy::PlaneSlice,
            landmark_mode: LandmarkMode::Manual,
            ..figure_config()
        };

        let (zones, _) = classify_r6(&mesh, &config);
        let total: f64 = zones.iter().map(|(_, zone)| zone.volume()).sum();
        assert!((total - mesh.volume()).abs() < mesh.volume() * 1e-6);
    }
}
