//! Config-file overrides and the descriptor-backed reference model.
//!
//! A real deployment plugs a biomechanics engine into
//! [`motviz::KinematicModel`]; the CLI ships a minimal chain model instead,
//! described by a JSON file, so the tool works end to end without one.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3};
use serde::Deserialize;

use motviz::convert::ReconcileConfig;
use motviz::kinematics::{KinematicModel, KinematicsError, ResolvedFrame, SegmentTransform};

/// Optional TOML config: reconciliation overrides layered on top of the
/// built-in tables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra alias entries, motion-column synonym → model coordinate.
    pub aliases: HashMap<String, String>,
    /// Coordinates to add to the must-resolve set.
    pub must_resolve: Vec<String>,
    /// Replace the built-in must-resolve set instead of extending it.
    pub replace_must_resolve: bool,
    pub degrees: Option<bool>,
    pub vertical_offset: Option<f64>,
}

impl Config {
    pub fn apply(self, config: &mut ReconcileConfig) {
        config.aliases.extend(self.aliases);
        if self.replace_must_resolve {
            config.must_resolve.clear();
        }
        config.must_resolve.extend(self.must_resolve);
        if self.degrees.is_some() {
            config.degrees = self.degrees;
        }
        if self.vertical_offset.is_some() {
            config.vertical_offset = self.vertical_offset;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    Rotation,
    Translation,
}

/// One coordinate-driven degree of freedom of a segment, about/along a
/// fixed axis in the parent frame.
#[derive(Debug, Deserialize)]
pub struct JointDescriptor {
    pub coordinate: String,
    pub axis: [f64; 3],
    pub kind: JointKind,
}

#[derive(Debug, Deserialize)]
pub struct SegmentDescriptor {
    pub name: String,
    /// Parent segment; must be declared earlier in the list. `None` roots
    /// the segment at the ground frame.
    pub parent: Option<String>,
    /// Fixed offset from the parent origin, in the parent frame.
    #[serde(default)]
    pub offset: [f64; 3],
    #[serde(default)]
    pub joints: Vec<JointDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct CoordinateDescriptor {
    pub name: String,
    #[serde(default)]
    pub default_value: f64,
    #[serde(default)]
    pub rotational: bool,
}

#[derive(Debug, Deserialize)]
pub struct ModelDescriptor {
    pub coordinates: Vec<CoordinateDescriptor>,
    pub segments: Vec<SegmentDescriptor>,
}

/// Chain-kinematics model built from a [`ModelDescriptor`].
pub struct ChainModel {
    coordinate_names: Vec<String>,
    segment_names: Vec<String>,
    rotational: HashSet<String>,
    defaults: HashMap<String, f64>,
    segments: Vec<SegmentNode>,
}

struct SegmentNode {
    parent: Option<usize>,
    offset: Vector3<f64>,
    joints: Vec<JointNode>,
}

struct JointNode {
    coordinate: usize,
    axis: Vector3<f64>,
    kind: JointKind,
}

impl ChainModel {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        let descriptor: ModelDescriptor =
            serde_json::from_str(&data).context("failed to parse model descriptor")?;
        Self::new(descriptor)
    }

    pub fn new(descriptor: ModelDescriptor) -> Result<Self> {
        let coordinate_names: Vec<String> = descriptor
            .coordinates
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let coord_index: HashMap<&str, usize> = coordinate_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let rotational = descriptor
            .coordinates
            .iter()
            .filter(|c| c.rotational)
            .map(|c| c.name.clone())
            .collect();
        let defaults = descriptor
            .coordinates
            .iter()
            .map(|c| (c.name.clone(), c.default_value))
            .collect();

        let mut segment_names = Vec::with_capacity(descriptor.segments.len());
        let mut segments = Vec::with_capacity(descriptor.segments.len());
        for seg in &descriptor.segments {
            let parent = match &seg.parent {
                Some(name) => {
                    let idx = segment_names
                        .iter()
                        .position(|n: &String| n == name)
                        .with_context(|| {
                            format!(
                                "segment `{}`: parent `{}` not declared before it",
                                seg.name, name
                            )
                        })?;
                    Some(idx)
                }
                None => None,
            };
            let mut joints = Vec::with_capacity(seg.joints.len());
            for joint in &seg.joints {
                let coordinate = match coord_index.get(joint.coordinate.as_str()) {
                    Some(&i) => i,
                    None => bail!(
                        "segment `{}`: unknown coordinate `{}`",
                        seg.name,
                        joint.coordinate
                    ),
                };
                let axis = Vector3::from(joint.axis);
                if axis.magnitude2() == 0.0 {
                    bail!("segment `{}`: joint axis must be non-zero", seg.name);
                }
                joints.push(JointNode {
                    coordinate,
                    axis,
                    kind: joint.kind,
                });
            }
            segment_names.push(seg.name.clone());
            segments.push(SegmentNode {
                parent,
                offset: Vector3::from(seg.offset),
                joints,
            });
        }

        Ok(ChainModel {
            coordinate_names,
            segment_names,
            rotational,
            defaults,
            segments,
        })
    }
}

impl KinematicModel for ChainModel {
    fn coordinate_names(&self) -> &[String] {
        &self.coordinate_names
    }

    fn segment_names(&self) -> &[String] {
        &self.segment_names
    }

    fn default_value(&self, coordinate: &str) -> f64 {
        self.defaults.get(coordinate).copied().unwrap_or(0.0)
    }

    fn is_rotational(&self, coordinate: &str) -> bool {
        self.rotational.contains(coordinate)
    }

    fn pose(&self, frame: &ResolvedFrame) -> Result<Vec<SegmentTransform>, KinematicsError> {
        if frame.values.len() != self.coordinate_names.len() {
            return Err(KinematicsError(format!(
                "expected {} coordinate value(s), got {}",
                self.coordinate_names.len(),
                frame.values.len()
            )));
        }
        let mut world: Vec<SegmentTransform> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let mut rotation = Quaternion::new(1.0, 0.0, 0.0, 0.0);
            let mut translation = segment.offset;
            for joint in &segment.joints {
                let value = frame.values[joint.coordinate];
                match joint.kind {
                    JointKind::Rotation => {
                        rotation = rotation
                            * Quaternion::from_axis_angle(joint.axis.normalize(), Rad(value));
                    }
                    JointKind::Translation => {
                        translation += joint.axis * value;
                    }
                }
            }
            let transform = match segment.parent {
                Some(p) => {
                    let parent = &world[p];
                    SegmentTransform {
                        translation: parent.translation + parent.rotation * translation,
                        rotation: parent.rotation * rotation,
                    }
                }
                None => SegmentTransform {
                    translation,
                    rotation,
                },
            };
            world.push(transform);
        }
        Ok(world)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use motviz::convert::Converter;
    use motviz::read::parse_mot;

    const ARM_MODEL: &str = include_str!("../assets/arm_model.json");
    const ARM_MOT: &str = include_str!("../../motviz/assets/arm.mot");

    fn arm() -> ChainModel {
        let descriptor: ModelDescriptor = serde_json::from_str(ARM_MODEL).unwrap();
        ChainModel::new(descriptor).unwrap()
    }

    #[test]
    fn two_link_chain_pose() {
        let model = arm();
        // 90° shoulder flexion about z, elbow straight
        let mut values = vec![0.0; model.coordinate_names().len()];
        values[0] = std::f64::consts::FRAC_PI_2;
        let frame = ResolvedFrame { time: 0.0, values };
        let world = model.pose(&frame).unwrap();
        // the humerus sits at the thorax offset; its 90° z-rotation carries
        // the elbow offset (0, -0.3, 0) to (0.3, 0, 0) in world space
        let humerus = &world[1];
        let forearm = &world[2];
        assert!((humerus.translation.y - 0.4).abs() < 1e-9);
        assert!((forearm.translation.x - (humerus.translation.x + 0.3)).abs() < 1e-9);
        assert!((forearm.translation.y - humerus.translation.y).abs() < 1e-9);
    }

    #[test]
    fn undeclared_parent_is_rejected() {
        let descriptor: ModelDescriptor = serde_json::from_str(
            r#"{"coordinates": [], "segments": [
                {"name": "a", "parent": "missing"}
            ]}"#,
        )
        .unwrap();
        assert!(ChainModel::new(descriptor).is_err());
    }

    #[test]
    fn unknown_joint_coordinate_is_rejected() {
        let descriptor: ModelDescriptor = serde_json::from_str(
            r#"{"coordinates": [], "segments": [
                {"name": "a", "parent": null,
                 "joints": [{"coordinate": "nope", "axis": [0,0,1], "kind": "rotation"}]}
            ]}"#,
        )
        .unwrap();
        assert!(ChainModel::new(descriptor).is_err());
    }

    #[test]
    fn arm_fixture_converts_end_to_end() {
        let model = arm();
        let table = parse_mot(ARM_MOT).unwrap();
        let converter = Converter::new(&model, ReconcileConfig::default());
        let doc = converter.convert(&table).unwrap();
        assert_eq!(doc.frames.len(), 4);
        for frame in &doc.frames {
            let names: Vec<&str> = frame.bodies.iter().map(|b| b.name.as_str()).collect();
            assert_eq!(names, ["thorax", "humerus_r", "ulna_r"]);
        }
        // rotational values were in degrees; frame 2 elbow ≈ 24.2°
        let json = doc.to_json_string().unwrap();
        assert!(json.starts_with('['));
    }

    #[test]
    fn config_overrides_layer_on_defaults() {
        let parsed: Config = toml::from_str(
            "replace_must_resolve = true\nmust_resolve = [\"elbow_flex_r\"]\n\n[aliases]\nelb_r = \"elbow_flex_r\"\n",
        )
        .unwrap();
        let mut config = ReconcileConfig::default();
        parsed.apply(&mut config);
        assert_eq!(config.must_resolve.len(), 1);
        assert!(config.must_resolve.contains("elbow_flex_r"));
        assert_eq!(config.aliases.get("elb_r").map(String::as_str), Some("elbow_flex_r"));
    }
}
