//! Anatomical landmark detection from the cross-sectional area profile.
//!
//! On a humanoid, the neck and waist are the narrowest horizontal bands in
//! their respective height ranges. The detector samples the area profile,
//! looks for local minima inside those ranges, and falls back to fixed
//! proportional heights when the silhouette has no clear narrowing.

use tracing::{debug, info};

use crate::config::SegmentConfig;
use crate::error::SegmentWarning;
use crate::measure::{area_profile, AreaProfile};
use crate::types::Mesh;

/// Normalized height band searched for the neck, bottom to top.
const NECK_BAND: (f64, f64) = (0.60, 0.90);
/// Normalized height band searched for the waist.
const WAIST_BAND: (f64, f64) = (0.30, 0.60);
/// Fallback neck height, as a fraction of total height below the top.
const NECK_FALLBACK_FROM_TOP: f64 = 0.25;
/// Fallback waist height, as a fraction of total height above the bottom.
const WAIST_FALLBACK_FROM_BOTTOM: f64 = 0.45;

/// Detected (or fallback) landmark heights.
#[derive(Debug, Clone, Copy)]
pub struct Landmarks {
    /// Height of the head/torso boundary.
    pub neck_y: f64,
    /// Height of the torso/leg boundary.
    pub waist_y: f64,
    /// False when `neck_y` is the proportional fallback.
    pub neck_detected: bool,
    /// False when `waist_y` is the proportional fallback.
    pub waist_detected: bool,
}

/// Find the neck and waist heights of a humanoid mesh.
///
/// Samples `config.landmark_samples` cross-sectional areas along Y and scans
/// top-down for the first local minimum inside each landmark's height band.
/// A sample is a local minimum only if it is the smallest area within
/// `config.landmark_window` samples on each side, strictly smaller than the
/// largest. A flat profile (a cylinder) therefore has no minima and both
/// landmarks fall back, each recording a [`SegmentWarning::LandmarkFallback`].
pub fn detect_landmarks(mesh: &Mesh, config: &SegmentConfig) -> (Landmarks, Vec<SegmentWarning>) {
    let mut warnings = Vec::new();

    let Some((min, max)) = mesh.bounds() else {
        // Nothing to measure; both landmarks at zero
        warnings.push(SegmentWarning::LandmarkFallback {
            landmark: "neck",
            height: 0.0,
        });
        warnings.push(SegmentWarning::LandmarkFallback {
            landmark: "waist",
            height: 0.0,
        });
        return (
            Landmarks {
                neck_y: 0.0,
                waist_y: 0.0,
                neck_detected: false,
                waist_detected: false,
            },
            warnings,
        );
    };
    let height = max.y - min.y;

    let profile = area_profile(mesh, config.landmark_samples);
    let minima = local_minima(&profile, config.landmark_window);
    debug!("Area profile has {} local minima", minima.len());

    let neck = first_in_band_top_down(&profile, &minima, NECK_BAND);
    let waist = first_in_band_top_down(&profile, &minima, WAIST_BAND);

    let neck_y = match neck {
        Some(i) => profile.samples[i].y,
        None => {
            let fallback = max.y - NECK_FALLBACK_FROM_TOP * height;
            warnings.push(SegmentWarning::LandmarkFallback {
                landmark: "neck",
                height: fallback,
            });
            fallback
        }
    };
    let waist_y = match waist {
        Some(i) => profile.samples[i].y,
        None => {
            let fallback = min.y + WAIST_FALLBACK_FROM_BOTTOM * height;
            warnings.push(SegmentWarning::LandmarkFallback {
                landmark: "waist",
                height: fallback,
            });
            fallback
        }
    };

    info!(
        "Landmarks: neck_y = {:.3} ({}), waist_y = {:.3} ({})",
        neck_y,
        if neck.is_some() { "detected" } else { "fallback" },
        waist_y,
        if waist.is_some() { "detected" } else { "fallback" },
    );

    (
        Landmarks {
            neck_y,
            waist_y,
            neck_detected: neck.is_some(),
            waist_detected: waist.is_some(),
        },
        warnings,
    )
}

/// Indices of samples that are strict local minima of the area profile
/// within a symmetric window.
fn local_minima(profile: &AreaProfile, window: usize) -> Vec<usize> {
    let samples = &profile.samples;
    let n = samples.len();
    let mut minima = Vec::new();

    for i in 0..n {
        let lo = i.saturating_sub(window);
        let hi = (i + window).min(n - 1);

        let mut window_min = f64::INFINITY;
        let mut window_max = f64::NEG_INFINITY;
        for j in lo..=hi {
            window_min = window_min.min(samples[j].area);
            window_max = window_max.max(samples[j].area);
        }

        // Flat windows carry no landmark information
        if samples[i].area <= window_min && samples[i].area < window_max {
            minima.push(i);
        }
    }

    minima
}

/// The highest minimum whose normalized height falls inside `band`.
fn first_in_band_top_down(
    profile: &AreaProfile,
    minima: &[usize],
    band: (f64, f64),
) -> Option<usize> {
    minima
        .iter()
        .rev()
        .copied()
        .find(|&i| {
            let h = profile.normalized_height(i);
            h >= band.0 && h <= band.1
        })
}
