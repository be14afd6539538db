//! Error types for segmentation with rich diagnostics.
//!
//! Fatal conditions (empty input, invalid configuration) are `SegmentError`
//! values and abort the run. Recoverable geometry conditions (degenerate
//! parts, empty regions) never surface here: they are recorded per-part in
//! the repair report and as `SegmentWarning` entries on the result.
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `SEG-XXXX`:
//! - `SEG-1xxx`: Input errors (empty or malformed mesh data)
//! - `SEG-2xxx`: Configuration errors
//!
//! # Example
//!
//! ```rust,ignore
//! use mesh_segment::{SegmentError, ErrorCode};
//!
//! let err = SegmentError::invalid_config("head_ratio", 1.5, "must be in (0, 1)");
//! println!("Error code: {}", err.code()); // SEG-2001
//! ```

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for segmentation operations.
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Machine-readable error codes for segmentation operations.
///
/// Codes follow the pattern `SEG-XXXX` where:
/// - 1xxx = Input errors
/// - 2xxx = Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// SEG-1001: Input mesh has no vertices or faces
    EmptyInput = 1001,
    /// SEG-1002: Face references invalid vertex index
    InvalidVertexIndex = 1002,
    /// SEG-1003: Vertex has NaN or Infinity coordinate
    InvalidCoordinate = 1003,
    /// SEG-1004: Geometry too degenerate to operate on
    DegenerateGeometry = 1004,

    /// SEG-2001: Configuration parameter out of range
    InvalidConfig = 2001,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `SEG-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EmptyInput => "SEG-1001",
            ErrorCode::InvalidVertexIndex => "SEG-1002",
            ErrorCode::InvalidCoordinate => "SEG-1003",
            ErrorCode::DegenerateGeometry => "SEG-1004",
            ErrorCode::InvalidConfig => "SEG-2001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that abort a segmentation run.
#[derive(Debug, Error, Diagnostic)]
pub enum SegmentError {
    /// Input mesh has no vertices or faces.
    #[error("input mesh is empty: {details}")]
    #[diagnostic(
        code(segment::input::empty),
        help("The mesh must have at least one vertex and one face before segmentation.")
    )]
    EmptyInput { details: String },

    /// Face references a vertex index that doesn't exist.
    #[error(
        "invalid vertex index: face {face_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices"
    )]
    #[diagnostic(
        code(segment::input::vertex_index),
        help("Remove faces with out-of-range vertex references before segmentation.")
    )]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Vertex has a NaN or infinite coordinate.
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    #[diagnostic(
        code(segment::input::coordinate),
        help("Check the source data for numerical issues; NaN and infinite coordinates break plane cuts and area profiles.")
    )]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// Geometry too degenerate for the requested operation.
    #[error("degenerate geometry: {details}")]
    #[diagnostic(
        code(segment::input::degenerate),
        help("The operation needs at least four non-coplanar points.")
    )]
    DegenerateGeometry { details: String },

    /// Configuration parameter out of range.
    #[error("invalid configuration: {parameter} = {value} ({details})")]
    #[diagnostic(
        code(segment::config::invalid),
        help("See SegmentConfig documentation for the valid range of each parameter.")
    )]
    InvalidConfig {
        parameter: &'static str,
        value: f64,
        details: String,
    },
}

impl SegmentError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            SegmentError::EmptyInput { .. } => ErrorCode::EmptyInput,
            SegmentError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            SegmentError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            SegmentError::DegenerateGeometry { .. } => ErrorCode::DegenerateGeometry,
            SegmentError::InvalidConfig { .. } => ErrorCode::InvalidConfig,
        }
    }

    /// Create an EmptyInput error.
    pub fn empty_input(details: impl Into<String>) -> Self {
        SegmentError::EmptyInput {
            details: details.into(),
        }
    }

    /// Create an InvalidVertexIndex error.
    pub fn invalid_vertex_index(face_index: usize, vertex_index: u32, vertex_count: usize) -> Self {
        SegmentError::InvalidVertexIndex {
            face_index,
            vertex_index,
            vertex_count,
        }
    }

    /// Create an InvalidCoordinate error.
    pub fn invalid_coordinate(vertex_index: usize, coordinate: &'static str, value: f64) -> Self {
        SegmentError::InvalidCoordinate {
            vertex_index,
            coordinate,
            value,
        }
    }

    /// Create a DegenerateGeometry error.
    pub fn degenerate_geometry(details: impl Into<String>) -> Self {
        SegmentError::DegenerateGeometry {
            details: details.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(parameter: &'static str, value: f64, details: impl Into<String>) -> Self {
        SegmentError::InvalidConfig {
            parameter,
            value,
            details: details.into(),
        }
    }
}

/// Recoverable conditions collected during a segmentation run.
///
/// Unlike `SegmentError`, these never abort the run; multiple warnings can
/// accumulate and are reported alongside the segmented parts.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentWarning {
    /// A region produced too little geometry and was replaced by a
    /// placeholder triangle.
    EmptyPart { part_name: &'static str },
    /// A region's geometry was degenerate (zero area, collapsed faces) and
    /// repair fell back to earlier state.
    DegeneratePart {
        part_name: &'static str,
        details: String,
    },
    /// No clear anatomical landmark was found; a proportional fallback
    /// height was used instead.
    LandmarkFallback { landmark: &'static str, height: f64 },
    /// A connected component below the noise threshold was discarded.
    ComponentDiscarded { faces: usize, area_fraction: f64 },
}

impl SegmentWarning {
    /// Returns a severity level for the warning.
    pub fn severity(&self) -> WarningSeverity {
        match self {
            SegmentWarning::EmptyPart { .. } => WarningSeverity::Warning,
            SegmentWarning::DegeneratePart { .. } => WarningSeverity::Warning,
            SegmentWarning::LandmarkFallback { .. } => WarningSeverity::Info,
            SegmentWarning::ComponentDiscarded { .. } => WarningSeverity::Info,
        }
    }
}

/// Severity levels for segmentation warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningSeverity {
    /// Informational, no action needed.
    Info,
    /// The output is usable but a part may need manual attention.
    Warning,
}

impl std::fmt::Display for SegmentWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentWarning::EmptyPart { part_name } => {
                write!(f, "{} received no geometry; placeholder emitted", part_name)
            }
            SegmentWarning::DegeneratePart { part_name, details } => {
                write!(f, "{} geometry is degenerate: {}", part_name, details)
            }
            SegmentWarning::LandmarkFallback { landmark, height } => {
                write!(
                    f,
                    "no clear {} landmark; using fallback height {:.3}",
                    landmark, height
                )
            }
            SegmentWarning::ComponentDiscarded {
                faces,
                area_fraction,
            } => {
                write!(
                    f,
                    "discarded component with {} faces ({:.2}% of surface area)",
                    faces,
                    area_fraction * 100.0
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SegmentError::invalid_vertex_index(5, 100, 50);
        assert_eq!(err.code(), ErrorCode::InvalidVertexIndex);
        assert_eq!(err.code().as_str(), "SEG-1002");
    }

    #[test]
    fn test_error_display() {
        let err = SegmentError::invalid_vertex_index(5, 100, 50);
        let display = format!("{}", err);
        assert!(display.contains("face 5"));
        assert!(display.contains("vertex 100"));
        assert!(display.contains("50 vertices"));
    }

    #[test]
    fn test_config_error_display() {
        let err = SegmentError::invalid_config("head_ratio", 1.5, "must be in (0, 1)");
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
        let display = format!("{}", err);
        assert!(display.contains("head_ratio"));
        assert!(display.contains("1.5"));
    }

    #[test]
    fn test_warning_severity() {
        let warn = SegmentWarning::EmptyPart {
            part_name: "LeftHand",
        };
        assert_eq!(warn.severity(), WarningSeverity::Warning);

        let warn = SegmentWarning::LandmarkFallback {
            landmark: "neck",
            height: 1.42,
        };
        assert_eq!(warn.severity(), WarningSeverity::Info);
    }

    #[test]
    fn test_warning_display() {
        let warn = SegmentWarning::ComponentDiscarded {
            faces: 12,
            area_fraction: 0.001,
        };
        let display = format!("{}", warn);
        assert!(display.contains("12 faces"));
        assert!(display.contains("0.10%"));
    }
}
