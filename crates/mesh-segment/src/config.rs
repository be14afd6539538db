//! Segmentation configuration.

use crate::error::{SegmentError, SegmentResult};

/// Strategy used to assign geometry to the six top-level body regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassifyStrategy {
    /// Split the mesh into connected components, anchor the head and torso,
    /// and classify the remaining components by position rules.
    ///
    /// This is the right choice for assembled character models whose limbs
    /// are separate shells. A single-component mesh degrades to everything
    /// landing in the torso.
    #[default]
    ComponentAnchor,

    /// Cut the mesh with axis-aligned planes at the head, leg, and arm
    /// boundaries. Works on single-shell sculpts where components carry no
    /// anatomical information.
    PlaneSlice,
}

/// How the head and leg boundary heights are chosen for plane slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LandmarkMode {
    /// Detect neck and waist heights from cross-sectional area minima,
    /// falling back to proportional heights when no clear minimum exists.
    #[default]
    Auto,

    /// Always use the proportional `head_ratio` / `torso_ratio` heights.
    Manual,
}

/// Configuration parameters for humanoid segmentation.
///
/// Ratios are fractions of the mesh's total height (Y extent) unless noted.
///
/// # Example
///
/// ```
/// use mesh_segment::SegmentConfig;
///
/// // Defaults suit typical humanoid proportions
/// let config = SegmentConfig::default();
///
/// // Or customize for a stylized character with a large head
/// let config = SegmentConfig {
///     head_ratio: 0.35,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "config-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentConfig {
    /// Strategy for the top-level six-region classification.
    ///
    /// Default: `ClassifyStrategy::ComponentAnchor`
    pub strategy: ClassifyStrategy,

    /// How plane-slice boundary heights are chosen.
    ///
    /// Default: `LandmarkMode::Auto`
    pub landmark_mode: LandmarkMode,

    /// Fraction of total height occupied by the head, measured down from
    /// the top of the mesh.
    ///
    /// Default: `0.22`
    pub head_ratio: f64,

    /// Torso band fraction of total height. In the plane strategy everything
    /// below `1.0 - head_ratio - torso_ratio` is leg territory; in the
    /// component strategy a component whose centroid sits in the bottom
    /// `torso_ratio` of the height is a leg.
    ///
    /// Default: `0.45`
    pub torso_ratio: f64,

    /// Horizontal offset from the mesh center, as a fraction of mesh width,
    /// beyond which geometry is treated as arm rather than torso.
    ///
    /// Default: `0.20`
    pub arm_x_offset: f64,

    /// Connected components whose surface area is below this fraction of
    /// the total surface area are discarded as noise before classification.
    ///
    /// Default: `0.005`
    pub min_component_area_ratio: f64,

    /// Fraction of the torso's own height at which it splits into upper and
    /// lower torso, measured up from the torso's bottom.
    ///
    /// Default: `0.45`
    pub torso_split_ratio: f64,

    /// Cut heights for arm subdivision, as fractions of the arm's own
    /// height measured down from its top. The first cut separates upper arm
    /// from lower arm, the second separates lower arm from hand.
    ///
    /// Default: `(0.4, 0.8)`
    pub arm_cut_ratios: (f64, f64),

    /// Cut heights for leg subdivision, as fractions of the leg's own
    /// height measured down from its top.
    ///
    /// Default: `(0.33, 0.66)`
    pub leg_cut_ratios: (f64, f64),

    /// Number of heights sampled when building the cross-sectional area
    /// profile for landmark detection.
    ///
    /// Default: `100`
    pub landmark_samples: usize,

    /// Half-window size for the local-minimum test in the area profile.
    /// A sample is a landmark candidate only if it is the smallest value
    /// within this many samples on each side.
    ///
    /// Default: `5`
    pub landmark_window: usize,

    /// Distance threshold for vertex welding during part repair.
    ///
    /// Default: `1e-6`
    pub weld_epsilon: f64,

    /// Parts with more faces than this are decimated after repair.
    ///
    /// Default: `5000`
    pub decimate_face_threshold: usize,

    /// Fraction of faces kept when a part is decimated.
    ///
    /// Default: `0.8`
    pub decimate_target_ratio: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            strategy: ClassifyStrategy::default(),
            landmark_mode: LandmarkMode::default(),
            head_ratio: 0.22,
            torso_ratio: 0.45,
            arm_x_offset: 0.20,
            min_component_area_ratio: 0.005,
            torso_split_ratio: 0.45,
            arm_cut_ratios: (0.4, 0.8),
            leg_cut_ratios: (0.33, 0.66),
            landmark_samples: 100,
            landmark_window: 5,
            weld_epsilon: 1e-6,
            decimate_face_threshold: 5000,
            decimate_target_ratio: 0.8,
        }
    }
}

impl SegmentConfig {
    /// Create a config tuned for single-shell sculpted characters.
    ///
    /// Uses plane slicing (component structure carries no information in a
    /// single shell) and more aggressive welding for dense geometry.
    pub fn for_sculpts() -> Self {
        Self {
            strategy: ClassifyStrategy::PlaneSlice,
            weld_epsilon: 1e-4,
            ..Default::default()
        }
    }

    /// Create a config tuned for low-poly game characters.
    ///
    /// Skips decimation entirely and keeps welding conservative so that
    /// intentional hard edges survive.
    pub fn for_low_poly() -> Self {
        Self {
            decimate_face_threshold: usize::MAX,
            weld_epsilon: 1e-9,
            ..Default::default()
        }
    }

    /// Validate all parameters, returning the first violation found.
    pub fn validate(&self) -> SegmentResult<()> {
        if !(self.head_ratio > 0.0 && self.head_ratio < 1.0) {
            return Err(SegmentError::invalid_config(
                "head_ratio",
                self.head_ratio,
                "must be in (0, 1)",
            ));
        }
        if !(self.torso_ratio > 0.0 && self.torso_ratio < 1.0) {
            return Err(SegmentError::invalid_config(
                "torso_ratio",
                self.torso_ratio,
                "must be in (0, 1)",
            ));
        }
        if self.head_ratio + self.torso_ratio >= 1.0 {
            return Err(SegmentError::invalid_config(
                "torso_ratio",
                self.torso_ratio,
                "head_ratio + torso_ratio must leave room for the legs (sum < 1)",
            ));
        }
        if !(self.arm_x_offset > 0.0 && self.arm_x_offset < 0.5) {
            return Err(SegmentError::invalid_config(
                "arm_x_offset",
                self.arm_x_offset,
                "must be in (0, 0.5)",
            ));
        }
        if !(0.0..1.0).contains(&self.min_component_area_ratio) {
            return Err(SegmentError::invalid_config(
                "min_component_area_ratio",
                self.min_component_area_ratio,
                "must be in [0, 1)",
            ));
        }
        if !(self.torso_split_ratio > 0.0 && self.torso_split_ratio < 1.0) {
            return Err(SegmentError::invalid_config(
                "torso_split_ratio",
                self.torso_split_ratio,
                "must be in (0, 1)",
            ));
        }
        for (name, (upper, lower)) in [
            ("arm_cut_ratios", self.arm_cut_ratios),
            ("leg_cut_ratios", self.leg_cut_ratios),
        ] {
            if !(upper > 0.0 && upper < lower && lower < 1.0) {
                return Err(SegmentError::invalid_config(
                    name,
                    upper,
                    "cuts must satisfy 0 < first < second < 1",
                ));
            }
        }
        if self.landmark_samples < 2 {
            return Err(SegmentError::invalid_config(
                "landmark_samples",
                self.landmark_samples as f64,
                "need at least 2 samples",
            ));
        }
        if self.landmark_window == 0 {
            return Err(SegmentError::invalid_config(
                "landmark_window",
                0.0,
                "window must be at least 1",
            ));
        }
        if !(self.weld_epsilon >= 0.0 && self.weld_epsilon.is_finite()) {
            return Err(SegmentError::invalid_config(
                "weld_epsilon",
                self.weld_epsilon,
                "must be finite and non-negative",
            ));
        }
        if !(self.decimate_target_ratio > 0.0 && self.decimate_target_ratio <= 1.0) {
            return Err(SegmentError::invalid_config(
                "decimate_target_ratio",
                self.decimate_target_ratio,
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SegmentConfig::default().validate().is_ok());
    }

    #[test]
    fn presets_are_valid() {
        assert!(SegmentConfig::for_sculpts().validate().is_ok());
        assert!(SegmentConfig::for_low_poly().validate().is_ok());
    }

    #[test]
    fn head_ratio_out_of_range() {
        let config = SegmentConfig {
            head_ratio: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn head_plus_torso_must_leave_leg_room() {
        let config = SegmentConfig {
            head_ratio: 0.5,
            torso_ratio: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn cut_ratios_must_be_ordered() {
        let config = SegmentConfig {
            arm_cut_ratios: (0.8, 0.4),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_epsilon_rejected() {
        let config = SegmentConfig {
            weld_epsilon: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
