pub mod convert;
pub mod error;
pub mod kinematics;
pub mod read;
pub mod write;

mod const_table;

pub use convert::{Converter, ReconcileConfig};
pub use error::Error;
pub use kinematics::{KinematicModel, ResolvedFrame, SegmentTransform};
pub use write::OutputDocument;

use std::fs;
use std::path::Path;

/// One-shot conversion for delivery wrappers: parse the motion text, then
/// convert it against `model`. Wrappers decide how to surface the result
/// (inline response, file download, output path) and map errors with
/// [`Error::is_client_fault`].
pub fn convert_motion<M: KinematicModel>(
    model: &M,
    motion_text: &str,
    config: ReconcileConfig,
) -> Result<OutputDocument, Error> {
    let table = read::parse_mot(motion_text)?;
    Converter::new(model, config).convert(&table)
}

/// A parsed motion file: the declared column names plus the numeric rows
/// that survived parsing, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionTable {
    /// Column names exactly as declared in the file header, order and case
    /// preserved (matching against model coordinates happens later, in
    /// [`convert`]).
    pub column_names: Vec<String>,
    pub rows: Vec<MotionRow>,
    /// Rows discarded for a wrong field count or an uncoercible value.
    pub dropped_rows: usize,
    /// Value of the `inDegrees` header entry, when present.
    pub in_degrees: Option<bool>,
}

/// One time sample. `values` is parallel to `column_names`; the slot of the
/// time column holds the same value as `time`.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionRow {
    pub time: f64,
    pub values: Vec<f64>,
}

impl MotionTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        read::parse_mot(&fs::read_to_string(path)?)
    }

    /// Index of the `time` column. Guaranteed to be `Some` for tables
    /// produced by [`read::parse_mot`].
    pub fn time_index(&self) -> Option<usize> {
        self.column_names
            .iter()
            .position(|c| c.eq_ignore_ascii_case("time"))
    }
}
