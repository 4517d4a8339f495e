//! Output document types and JSON serialization.
//!
//! The document is a bare JSON array of frames:
//! `[{"time": 0.0, "bodies": [{"name": "pelvis", "translation": [x,y,z],
//! "rotation": [x,y,z,w]}, ...]}, ...]`
//! Rotations are unit quaternions in x-y-z-w component order, matching what
//! web renderers expect. Values pass through at full double precision.

use std::io;

use serde::Serialize;

use crate::error::Error;
use crate::kinematics::SegmentTransform;

/// One segment's world transform within an output frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyTransform {
    pub name: String,
    pub translation: [f64; 3],
    /// Unit quaternion, x-y-z-w order.
    pub rotation: [f64; 4],
}

impl BodyTransform {
    pub fn new(name: impl Into<String>, transform: &SegmentTransform) -> Self {
        BodyTransform {
            name: name.into(),
            translation: [
                transform.translation.x,
                transform.translation.y,
                transform.translation.z,
            ],
            rotation: [
                transform.rotation.v.x,
                transform.rotation.v.y,
                transform.rotation.v.z,
                transform.rotation.s,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputFrame {
    pub time: f64,
    pub bodies: Vec<BodyTransform>,
}

/// The conversion result. Serializes transparently as the frame array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutputDocument {
    pub frames: Vec<OutputFrame>,
}

impl OutputDocument {
    pub fn write<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::{Quaternion, Vector3};

    fn sample() -> OutputDocument {
        let transform = SegmentTransform {
            translation: Vector3::new(1.0, 2.0, 3.0),
            rotation: Quaternion::new(0.5, -0.5, 0.5, -0.5),
        };
        OutputDocument {
            frames: vec![OutputFrame {
                time: 0.25,
                bodies: vec![BodyTransform::new("pelvis", &transform)],
            }],
        }
    }

    #[test]
    fn document_serializes_as_frame_array() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.is_array());
        let frame = &value[0];
        assert_eq!(frame["time"], 0.25);
        assert_eq!(frame["bodies"][0]["name"], "pelvis");
        assert_eq!(frame["bodies"][0]["translation"][2], 3.0);
        // x-y-z-w order: scalar part last
        assert_eq!(frame["bodies"][0]["rotation"][0], -0.5);
        assert_eq!(frame["bodies"][0]["rotation"][3], 0.5);
    }

    #[test]
    fn write_matches_to_json_string() {
        let doc = sample();
        let mut buf = Vec::new();
        doc.write(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), doc.to_json_string().unwrap());
    }
}
