//! Cross-sectional measurement along the height axis.
//!
//! The landmark detector works on how the horizontal cross-sectional area of
//! a character changes with height: narrow bands at the neck and waist show
//! up as local minima. This module extracts those sections and samples the
//! area profile.

use nalgebra::Point3;
use tracing::debug;

use crate::Mesh;

/// A horizontal cross-section of the mesh at a fixed Y height.
#[derive(Debug, Clone)]
pub struct CrossSection {
    /// Height at which the section was taken.
    pub y: f64,
    /// Chained intersection contours, each an ordered point loop.
    pub contours: Vec<Vec<Point3<f64>>>,
    /// Total enclosed area, summed over contours (projected onto XZ).
    pub area: f64,
    /// Total contour length.
    pub perimeter: f64,
}

impl CrossSection {
    /// True when the plane missed the mesh entirely.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// One sample of the area profile.
#[derive(Debug, Clone, Copy)]
pub struct AreaSample {
    /// Height of the sample.
    pub y: f64,
    /// Cross-sectional area at that height.
    pub area: f64,
}

/// Cross-sectional areas sampled at evenly spaced heights.
#[derive(Debug, Clone)]
pub struct AreaProfile {
    /// Samples ordered bottom to top.
    pub samples: Vec<AreaSample>,
    /// Lowest sampled height.
    pub min_y: f64,
    /// Highest sampled height.
    pub max_y: f64,
}

impl AreaProfile {
    /// Normalized height of sample `i` in `[0, 1]`, bottom to top.
    pub fn normalized_height(&self, i: usize) -> f64 {
        let span = self.max_y - self.min_y;
        if span <= 0.0 {
            return 0.0;
        }
        (self.samples[i].y - self.min_y) / span
    }
}

/// Extract the horizontal cross-section at height `y`.
///
/// Edge-plane intersections are chained into contours; the area is the sum
/// of the absolute shoelace areas of each contour projected onto the XZ
/// plane.
pub fn cross_section_at_y(mesh: &Mesh, y: f64) -> CrossSection {
    let mut segments: Vec<(Point3<f64>, Point3<f64>)> = Vec::new();

    for face in &mesh.faces {
        let v0 = mesh.vertices[face[0] as usize].position;
        let v1 = mesh.vertices[face[1] as usize].position;
        let v2 = mesh.vertices[face[2] as usize].position;

        let mut hits = Vec::new();
        for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
            if let Some(p) = edge_plane_intersection(a, b, y) {
                hits.push(p);
            }
        }

        if hits.len() == 2 {
            segments.push((hits[0], hits[1]));
        }
    }

    if segments.is_empty() {
        return CrossSection {
            y,
            contours: Vec::new(),
            area: 0.0,
            perimeter: 0.0,
        };
    }

    let perimeter = segments.iter().map(|(a, b)| (b - a).norm()).sum();
    let contours = chain_segments(&segments);
    let area = contours.iter().map(|c| contour_area_xz(c)).sum();

    CrossSection {
        y,
        contours,
        area,
        perimeter,
    }
}

/// Sample the cross-sectional area at `count` evenly spaced heights.
///
/// The first and last samples sit slightly inside the bounds so that a plane
/// never coincides exactly with the top or bottom of the mesh.
pub fn area_profile(mesh: &Mesh, count: usize) -> AreaProfile {
    let Some((min, max)) = mesh.bounds() else {
        return AreaProfile {
            samples: Vec::new(),
            min_y: 0.0,
            max_y: 0.0,
        };
    };

    let height = max.y - min.y;
    let inset = height * 1e-4;
    let lo = min.y + inset;
    let hi = max.y - inset;

    let samples: Vec<AreaSample> = (0..count)
        .map(|i| {
            let t = if count > 1 {
                i as f64 / (count - 1) as f64
            } else {
                0.5
            };
            let y = lo + (hi - lo) * t;
            AreaSample {
                y,
                area: cross_section_at_y(mesh, y).area,
            }
        })
        .collect();

    debug!("Sampled area profile: {} heights over [{:.3}, {:.3}]", count, lo, hi);

    AreaProfile {
        samples,
        min_y: min.y,
        max_y: max.y,
    }
}

fn edge_plane_intersection(a: Point3<f64>, b: Point3<f64>, y: f64) -> Option<Point3<f64>> {
    let d_a = a.y - y;
    let d_b = b.y - y;

    if d_a * d_b > 0.0 {
        return None; // Same side of plane
    }
    if (d_a - d_b).abs() < 1e-10 {
        return None; // Edge lies in the plane
    }

    let t = d_a / (d_a - d_b);
    Some(Point3::from(a.coords + (b - a) * t))
}

fn chain_segments(segments: &[(Point3<f64>, Point3<f64>)]) -> Vec<Vec<Point3<f64>>> {
    let mut remaining: Vec<_> = segments.to_vec();
    let mut contours = Vec::new();
    let eps = 1e-6;

    while let Some(first) = remaining.pop() {
        let mut contour = vec![first.0, first.1];

        let mut changed = true;
        while changed {
            changed = false;
            let start = contour[0];
            let end = contour[contour.len() - 1];

            for i in (0..remaining.len()).rev() {
                let seg = remaining[i];
                if (seg.0 - end).norm() < eps {
                    contour.push(seg.1);
                } else if (seg.1 - end).norm() < eps {
                    contour.push(seg.0);
                } else if (seg.0 - start).norm() < eps {
                    contour.insert(0, seg.1);
                } else if (seg.1 - start).norm() < eps {
                    contour.insert(0, seg.0);
                } else {
                    continue;
                }
                remaining.remove(i);
                changed = true;
                break;
            }
        }

        contours.push(contour);
    }

    contours
}

/// Absolute shoelace area of a contour projected onto the XZ plane.
fn contour_area_xz(contour: &[Point3<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();
    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].z;
        area -= contour[j].x * contour[i].z;
    }
    (area / 2.0).abs()
}

impl Mesh {
    /// Extract the horizontal cross-section at height `y`.
    pub fn cross_section_at_y(&self, y: f64) -> CrossSection {
        cross_section_at_y(self, y)
    }

    /// Sample the cross-sectional area profile at `count` heights.
    pub fn area_profile(&self, count: usize) -> AreaProfile {
        area_profile(self, count)
    }
}
