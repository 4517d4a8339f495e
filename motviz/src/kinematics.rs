//! Seam to the external articulated-body engine.
//!
//! The conversion core never inspects the segment hierarchy itself; it only
//! asks an implementor of [`KinematicModel`] for the model's coordinate and
//! segment names and for world transforms given a full coordinate vector.

use cgmath::{Quaternion, Vector3};
use thiserror::Error;

/// World transform of one body segment at one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTransform {
    pub translation: Vector3<f64>,
    pub rotation: Quaternion<f64>,
}

impl SegmentTransform {
    pub fn identity() -> Self {
        SegmentTransform {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Opaque failure reported by the kinematics backend. The pipeline wraps it
/// with the frame index at which it occurred.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct KinematicsError(pub String);

/// One value per model coordinate, in the model's declared order, after
/// reconciliation and unit conversion. Built fresh for every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFrame {
    pub time: f64,
    pub values: Vec<f64>,
}

pub trait KinematicModel {
    /// Ordered set of coordinate (degree-of-freedom) names.
    fn coordinate_names(&self) -> &[String];

    /// Ordered set of body segment names. [`pose`](Self::pose) returns
    /// transforms in this order.
    fn segment_names(&self) -> &[String];

    /// Declared default for a coordinate absent from the motion data.
    fn default_value(&self, _coordinate: &str) -> f64 {
        0.0
    }

    /// Whether a coordinate is rotational (subject to degree→radian
    /// conversion) rather than translational.
    fn is_rotational(&self, coordinate: &str) -> bool;

    /// Compute every segment's world transform for one coordinate vector.
    /// `frame.values` is ordered as [`coordinate_names`](Self::coordinate_names).
    fn pose(&self, frame: &ResolvedFrame) -> Result<Vec<SegmentTransform>, KinematicsError>;
}
