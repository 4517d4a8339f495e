//! Motion file (`.mot`/`.sto` family) parser.
//!
//! The format is a metadata header terminated by an `endheader` sentinel
//! line, followed by a whitespace-separated column-name row and numeric data
//! rows. Defective data rows are dropped, not fatal; defects that make frame
//! ordering unrecoverable (no sentinel, no `time` column, a non-numeric time
//! value) fail the whole parse.

use log::warn;
use nom::branch::alt;
use nom::bytes::complete::take_till1;
use nom::character::complete::{char, space0, space1};
use nom::combinator::{all_consuming, recognize, rest};
use nom::number::complete::double;
use nom::sequence::{delimited, separated_pair};
use nom::IResult;

use crate::error::Error;
use crate::{MotionRow, MotionTable};

/// Header entries used as sanity checks or unit hints. Everything else in
/// the header is ignored.
#[derive(Debug, Default, PartialEq)]
struct HeaderMeta {
    n_rows: Option<usize>,
    n_columns: Option<usize>,
    in_degrees: Option<bool>,
}

impl HeaderMeta {
    fn absorb(&mut self, line: &str) {
        let (key, value) = match metadata_entry(line) {
            Ok((_, kv)) => kv,
            Err(_) => return,
        };
        match key.to_ascii_lowercase().as_str() {
            "nrows" | "datarows" => self.n_rows = value.trim().parse().ok(),
            "ncolumns" | "datacolumns" => self.n_columns = value.trim().parse().ok(),
            "indegrees" => {
                self.in_degrees = match value.trim().to_ascii_lowercase().as_str() {
                    "yes" => Some(true),
                    "no" => Some(false),
                    _ => None,
                }
            }
            _ => {}
        }
    }
}

/// `name=value` or `name value`. Free-form header prose fails this parser
/// and is skipped by the caller.
fn metadata_entry(i: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        take_till1(|c: char| c == '=' || c.is_whitespace()),
        alt((delimited(space0, recognize(char('=')), space0), space1)),
        rest,
    )(i.trim())
}

/// Float coercion of a single whitespace-delimited field.
fn field_value(i: &str) -> Option<f64> {
    let parsed: IResult<&str, f64> = all_consuming(double)(i);
    parsed.ok().map(|(_, v)| v)
}

fn is_sentinel(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("endheader")
}

/// Parse the full text of a motion file.
pub fn parse_mot(input: &str) -> Result<MotionTable, Error> {
    let mut lines = input.lines().enumerate();

    let mut meta = HeaderMeta::default();
    let mut found_sentinel = false;
    for (_, line) in &mut lines {
        if is_sentinel(line) {
            found_sentinel = true;
            break;
        }
        meta.absorb(line);
    }
    if !found_sentinel {
        return Err(Error::MalformedMotionFile(
            "no `endheader` sentinel line".into(),
        ));
    }

    // Column-name row: the next non-blank line after the sentinel.
    let column_names: Vec<String> = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => {
                break line.split_whitespace().map(str::to_owned).collect();
            }
            None => {
                return Err(Error::MalformedMotionFile(
                    "header ends without a column-name row".into(),
                ))
            }
        }
    };

    let time_index = column_names
        .iter()
        .position(|c| c.eq_ignore_ascii_case("time"))
        .ok_or_else(|| Error::MalformedMotionFile("no `time` column declared".into()))?;

    if let Some(n) = meta.n_columns {
        if n != column_names.len() {
            warn!(
                "header declares {} column(s) but {} are named; trusting the name row",
                n,
                column_names.len()
            );
        }
    }

    let mut rows = Vec::new();
    let mut dropped_rows = 0usize;
    for (lineno, raw) in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        // Tokenize once; the count check, the time check, and float
        // coercion all see the same fields.
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != column_names.len() {
            warn!(
                "line {}: expected {} field(s), found {}; dropping row",
                lineno + 1,
                column_names.len(),
                fields.len()
            );
            dropped_rows += 1;
            continue;
        }
        // An uncoercible time makes frame ordering unrecoverable, whatever
        // the rest of the row looks like.
        if field_value(fields[time_index]).is_none() {
            return Err(Error::MalformedMotionFile(format!(
                "line {}: time value `{}` is not numeric",
                lineno + 1,
                fields[time_index]
            )));
        }
        match fields.iter().map(|f| field_value(f)).collect::<Option<Vec<f64>>>() {
            Some(values) => rows.push(MotionRow {
                time: values[time_index],
                values,
            }),
            None => {
                warn!(
                    "line {}: non-numeric field in data row; dropping",
                    lineno + 1
                );
                dropped_rows += 1;
            }
        }
    }

    if rows.is_empty() {
        return Err(Error::MalformedMotionFile(
            "no usable data rows".into(),
        ));
    }
    if let Some(n) = meta.n_rows {
        if n != rows.len() + dropped_rows {
            warn!(
                "header declares {} row(s) but {} were read ({} dropped)",
                n,
                rows.len(),
                dropped_rows
            );
        }
    }

    Ok(MotionTable {
        column_names,
        rows,
        dropped_rows,
        in_degrees: meta.in_degrees,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const ARM: &str = include_str!("../../assets/arm.mot");

    #[test]
    fn arm_fixture() {
        let table = parse_mot(ARM).unwrap();
        assert_eq!(
            table.column_names,
            ["time", "arm_flex_r", "arm_add_r", "elbow_flex_r"]
        );
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.dropped_rows, 0);
        assert_eq!(table.in_degrees, Some(true));
        assert_eq!(table.time_index(), Some(0));
        assert!((table.rows[1].time - 0.017).abs() < 1e-12);
        assert!((table.rows[3].values[3] - 36.1).abs() < 1e-12);
    }

    #[test]
    fn no_sentinel_is_fatal() {
        let err = parse_mot("just some text\n1.0 2.0\n").unwrap_err();
        assert!(matches!(err, Error::MalformedMotionFile(_)));
    }

    #[test]
    fn missing_time_column_is_fatal() {
        let err = parse_mot("endheader\nfoo bar\n0.0 1.0\n").unwrap_err();
        assert!(err.to_string().contains("time"));
    }

    #[test]
    fn short_row_is_dropped_not_fatal() {
        let src = "nRows=3\nendheader\ntime a b\n0.0 1.0 2.0\n0.1 1.0\n0.2 1.0 2.0\n";
        let table = parse_mot(src).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.dropped_rows, 1);
    }

    #[test]
    fn non_numeric_value_drops_only_that_row() {
        let src = "endheader\ntime a\n0.0 1.0\n0.1 oops\n0.2 3.0\n";
        let table = parse_mot(src).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.dropped_rows, 1);
    }

    #[test]
    fn non_numeric_time_is_fatal() {
        let src = "endheader\ntime a\n0.0 1.0\nbad 2.0\n";
        let err = parse_mot(src).unwrap_err();
        assert!(matches!(err, Error::MalformedMotionFile(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn all_rows_dropped_escalates() {
        let src = "endheader\ntime a\n0.0\n0.1\n";
        let err = parse_mot(src).unwrap_err();
        assert!(matches!(err, Error::MalformedMotionFile(_)));
    }

    #[test]
    fn blank_lines_and_tabs_tolerated() {
        let src = "inDegrees=no\nendheader\n\ntime\ta\n0.0\t1.5\n\n0.1\t2.5\n\n";
        let table = parse_mot(src).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.in_degrees, Some(false));
        assert!((table.rows[1].values[1] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn field_count_and_coercion_share_one_tokenization() {
        // fields separated by unicode whitespace tokenize the same way for
        // the count check, the time check, and coercion
        let src = "endheader\ntime a\n0.0\u{000B}1.0\n0.1\u{00A0}oops\n";
        let table = parse_mot(src).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.dropped_rows, 1);
        assert!((table.rows[0].values[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bad_time_is_fatal_even_when_an_earlier_field_is_bad() {
        let src = "endheader\na time\noops bad\n";
        let err = parse_mot(src).unwrap_err();
        assert!(matches!(err, Error::MalformedMotionFile(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn duplicate_times_kept_in_file_order() {
        let src = "endheader\ntime a\n0.1 1.0\n0.1 2.0\n";
        let table = parse_mot(src).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!((table.rows[0].values[1] - 1.0).abs() < 1e-12);
        assert!((table.rows[1].values[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn metadata_entry_forms() {
        let mut meta = HeaderMeta::default();
        meta.absorb("nRows=12");
        meta.absorb("datacolumns 7");
        meta.absorb("inDegrees = yes");
        meta.absorb("Units are S.I. units (second, meters, Newtons)");
        assert_eq!(meta.n_rows, Some(12));
        assert_eq!(meta.n_columns, Some(7));
        assert_eq!(meta.in_degrees, Some(true));
    }
}
