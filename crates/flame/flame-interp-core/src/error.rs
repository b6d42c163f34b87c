//! Error types for keyframe interpolation.

use serde::{Deserialize, Serialize};

/// Every failure the interpolation core can report.
///
/// Errors are synchronous and never retried internally: the caller fixes the
/// input and invokes the operation again.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum InterpError {
    /// Control points within one timeline disagree on dimensionality
    #[error("Dimension mismatch: expected {expected} components, got {actual} (point {index})")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        index: usize,
    },

    /// Control point times are not strictly increasing
    #[error("Non-monotonic time at point {index}: {time} <= previous {previous}")]
    NonMonotonicTime { index: usize, time: i64, previous: i64 },

    /// Timelines start at frame zero
    #[error("Timeline must start at time 0, first point is at {time}")]
    InvalidStartTime { time: i64 },

    /// Index outside the addressable range
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Curve or configuration parameter outside its valid domain
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter { param: String, reason: String },

    /// Curve kind name not recognised
    #[error("Unsupported curve: {name}")]
    UnsupportedCurve { name: String },

    /// Boundary segments only supply spline context
    #[error("Segment {index} is an edge segment and cannot be edited")]
    EdgeSegmentNotEditable { index: usize },

    /// Variation name not present in the registry
    #[error("Unknown variation: {name}")]
    UnknownVariation { name: String },

    /// Sub-parameter name not defined for a variation
    #[error("Unknown parameter '{param}' for variation {variation}")]
    UnknownParameter { variation: String, param: String },

    /// No timeline exists for the requested attribute
    #[error("Unknown attribute: {key}")]
    UnknownAttribute { key: String },

    /// A timeline needs more control points than it has
    #[error("Insufficient control points: need {required}, have {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    /// The segment interpolator needs a 4-point context
    #[error("Segment interpolation needs 4 control points, got {actual}")]
    InsufficientControlPoints { actual: usize },

    /// Interpolation needs at least two keyframes
    #[error("Insufficient keyframes: need at least 2, have {actual}")]
    InsufficientKeyframes { actual: usize },

    /// Keyframe or frame (de)serialization failed
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// The rendering collaborator rejected a frame
    #[error("Render error at frame {frame}: {reason}")]
    Render { frame: usize, reason: String },
}

impl InterpError {
    /// Shorthand for [`InterpError::InvalidParameter`].
    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Error category following the structural / validation / insufficient-data split.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "structural",
            Self::NonMonotonicTime { .. }
            | Self::InvalidStartTime { .. }
            | Self::IndexOutOfRange { .. }
            | Self::InvalidParameter { .. }
            | Self::UnsupportedCurve { .. }
            | Self::EdgeSegmentNotEditable { .. }
            | Self::UnknownVariation { .. }
            | Self::UnknownParameter { .. }
            | Self::UnknownAttribute { .. } => "validation",
            Self::InsufficientPoints { .. }
            | Self::InsufficientControlPoints { .. }
            | Self::InsufficientKeyframes { .. } => "insufficient_data",
            Self::Serialization { .. } => "serialization",
            Self::Render { .. } => "render",
        }
    }
}

impl From<serde_json::Error> for InterpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let structural = InterpError::DimensionMismatch {
            expected: 2,
            actual: 1,
            index: 3,
        };
        assert_eq!(structural.category(), "structural");

        let validation = InterpError::invalid_parameter("freq", "must be a positive integer");
        assert_eq!(validation.category(), "validation");

        let insufficient = InterpError::InsufficientKeyframes { actual: 1 };
        assert_eq!(insufficient.category(), "insufficient_data");
    }

    #[test]
    fn test_display_carries_context() {
        let err = InterpError::NonMonotonicTime {
            index: 2,
            time: 10,
            previous: 10,
        };
        assert!(err.to_string().contains("point 2"));
    }

    #[test]
    fn test_serialization() {
        let error = InterpError::UnsupportedCurve {
            name: "wobble".to_string(),
        };
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: InterpError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }
}
