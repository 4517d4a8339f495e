//! Transform pipeline: reconciles motion-table columns against the model's
//! coordinate set, drives the kinematics backend one frame at a time, and
//! assembles the output document.

use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::const_table;
use crate::error::Error;
use crate::kinematics::{KinematicModel, KinematicsError, ResolvedFrame};
use crate::write::{BodyTransform, OutputDocument, OutputFrame};
use crate::MotionTable;

/// Reconciliation settings, explicit per conversion so callers can swap in
/// model-specific alias tables or must-resolve sets.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Motion-column synonym → canonical model coordinate. Compared
    /// case-insensitively on both sides.
    pub aliases: HashMap<String, String>,
    /// Coordinates whose absence from the motion data is fatal rather than
    /// defaultable (coupled degrees of freedom).
    pub must_resolve: HashSet<String>,
    /// Unit override for rotational values. `None` defers to the file's
    /// `inDegrees` header; files without the header are taken as degrees,
    /// which is what capture tooling emits unless told otherwise.
    pub degrees: Option<bool>,
    /// Subtracted (less one centimeter of ground clearance) from the
    /// `pelvis_ty` coordinate, to re-ground a recording captured at an
    /// elevated origin.
    pub vertical_offset: Option<f64>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            aliases: const_table::COORD_ALIASES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            must_resolve: const_table::MUST_RESOLVE
                .iter()
                .map(|s| s.to_string())
                .collect(),
            degrees: None,
            vertical_offset: None,
        }
    }
}

/// Where one model coordinate's per-frame value comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CoordinateSource {
    Column(usize),
    Default(f64),
}

/// A defaulted coordinate, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub coordinate: String,
    pub value: f64,
}

/// Result of matching a motion table's columns against the model's
/// coordinate set: one source per model coordinate, plus the substitutions
/// that were made.
#[derive(Debug, Clone)]
pub struct CoordinateBinding {
    sources: Vec<CoordinateSource>,
    pub substitutions: Vec<Substitution>,
}

pub struct Converter<'a, M: KinematicModel> {
    model: &'a M,
    config: ReconcileConfig,
}

impl<'a, M: KinematicModel> Converter<'a, M> {
    pub fn new(model: &'a M, config: ReconcileConfig) -> Self {
        Converter { model, config }
    }

    /// Reconcile the table's columns against the model's coordinates.
    ///
    /// Per coordinate: exact match, then case-insensitive, then alias table;
    /// unmatched must-resolve coordinates fail, anything else falls back to
    /// the model's declared default.
    pub fn bind(&self, table: &MotionTable) -> Result<CoordinateBinding, Error> {
        let time_index = table.time_index();
        // Candidate name per column: full state paths reduce to their
        // coordinate stem, activation and other non-coordinate columns are
        // excluded outright.
        let stems: Vec<Option<String>> = table
            .column_names
            .iter()
            .enumerate()
            .map(|(i, col)| {
                if Some(i) == time_index {
                    None
                } else {
                    column_stem(col)
                }
            })
            .collect();

        let aliases: HashMap<String, String> = self
            .config
            .aliases
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_ascii_lowercase()))
            .collect();

        let mut sources = Vec::with_capacity(self.model.coordinate_names().len());
        let mut substitutions = Vec::new();
        let mut unresolved = Vec::new();

        for coordinate in self.model.coordinate_names() {
            let lower = coordinate.to_ascii_lowercase();
            let found = find_exact(&stems, coordinate)
                .or_else(|| find_case_insensitive(&stems, coordinate))
                .or_else(|| find_alias(&stems, &aliases, &lower));

            match found {
                Some(column) => sources.push(CoordinateSource::Column(column)),
                None if self
                    .config
                    .must_resolve
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(coordinate)) =>
                {
                    unresolved.push(coordinate.clone());
                    // keep the source vector aligned; never used on failure
                    sources.push(CoordinateSource::Default(0.0));
                }
                None => {
                    let value = self.model.default_value(coordinate);
                    substitutions.push(Substitution {
                        coordinate: coordinate.clone(),
                        value,
                    });
                    sources.push(CoordinateSource::Default(value));
                }
            }
        }

        if !unresolved.is_empty() {
            return Err(Error::CoordinateMismatch(unresolved));
        }
        Ok(CoordinateBinding {
            sources,
            substitutions,
        })
    }

    /// Convert every usable row of the table into an output frame. Frames
    /// are independent; any fatal error aborts with no partial document.
    pub fn convert(&self, table: &MotionTable) -> Result<OutputDocument, Error> {
        let binding = self.bind(table)?;
        if table.dropped_rows > 0 {
            info!(
                "{} defective row(s) were dropped during parsing",
                table.dropped_rows
            );
        }
        for sub in &binding.substitutions {
            warn!(
                "coordinate `{}` missing from motion data, defaulting to {}",
                sub.coordinate, sub.value
            );
        }

        let in_degrees = self.config.degrees.or(table.in_degrees).unwrap_or(true);
        let coordinates = self.model.coordinate_names();
        let segments = self.model.segment_names();

        let mut frames = Vec::with_capacity(table.rows.len());
        for (index, row) in table.rows.iter().enumerate() {
            let mut values = Vec::with_capacity(coordinates.len());
            for (k, coordinate) in coordinates.iter().enumerate() {
                // Unit conversion and re-grounding apply to recorded values
                // only; model defaults are already in model units.
                let value = match binding.sources[k] {
                    CoordinateSource::Column(i) => {
                        let mut value = row.values[i];
                        if in_degrees && self.model.is_rotational(coordinate) {
                            value = value.to_radians();
                        }
                        if let Some(offset) = self.config.vertical_offset {
                            if coordinate.eq_ignore_ascii_case("pelvis_ty") {
                                value -= offset - 0.01;
                            }
                        }
                        value
                    }
                    CoordinateSource::Default(value) => value,
                };
                values.push(value);
            }

            let resolved = ResolvedFrame {
                time: row.time,
                values,
            };
            let transforms = self
                .model
                .pose(&resolved)
                .map_err(|source| Error::Kinematics {
                    frame: index,
                    source,
                })?;
            if transforms.len() != segments.len() {
                return Err(Error::Kinematics {
                    frame: index,
                    source: KinematicsError(format!(
                        "model returned {} transform(s) for {} segment(s)",
                        transforms.len(),
                        segments.len()
                    )),
                });
            }

            let bodies = segments
                .iter()
                .zip(transforms.iter())
                .map(|(name, transform)| BodyTransform::new(name.clone(), transform))
                .collect();
            frames.push(OutputFrame {
                time: row.time,
                bodies,
            });
        }

        Ok(OutputDocument { frames })
    }
}

/// Candidate coordinate name carried by a column, or `None` when the column
/// can never drive a coordinate. Full state paths
/// (`/jointset/<joint>/<coord>/value`) reduce to the coordinate stem;
/// muscle activation columns and non-jointset paths are excluded.
fn column_stem(column: &str) -> Option<String> {
    let column = column.trim();
    if column.contains("activation") {
        return None;
    }
    if column.starts_with('/') {
        if !column.contains("jointset") || !column.ends_with("/value") {
            return None;
        }
        let stem = &column[..column.len() - "/value".len()];
        return stem.rsplit('/').next().map(str::to_owned);
    }
    Some(column.to_owned())
}

fn find_exact(stems: &[Option<String>], coordinate: &str) -> Option<usize> {
    stems
        .iter()
        .position(|s| s.as_deref() == Some(coordinate))
}

fn find_case_insensitive(stems: &[Option<String>], coordinate: &str) -> Option<usize> {
    stems.iter().position(|s| match s {
        Some(s) => s.eq_ignore_ascii_case(coordinate),
        None => false,
    })
}

fn find_alias(
    stems: &[Option<String>],
    aliases: &HashMap<String, String>,
    coordinate_lower: &str,
) -> Option<usize> {
    stems.iter().position(|s| match s {
        Some(s) => aliases.get(&s.to_ascii_lowercase()).map(String::as_str) == Some(coordinate_lower),
        None => false,
    })
}
