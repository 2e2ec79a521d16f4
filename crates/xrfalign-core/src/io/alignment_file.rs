//! Alignment files: the cumulative shift of every projection, keyed by
//! filename, so an alignment can be replayed on a freshly loaded stack.
//!
//! ```text
//! filename,x_shift,y_shift
//! proj_000.tif,0,0
//! proj_001.tif,-3,2
//! rotation_axis,63.5
//! ```

use std::fmt::Write as _;
use std::path::Path;

use crate::error::{Result, XrfAlignError};
use crate::shift::ShiftVectors;

const HEADER: &str = "filename,x_shift,y_shift";
const ROTATION_AXIS_KEYS: [&str; 2] = ["rotation_axis", "rotation axis"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignmentEntry {
    pub filename: String,
    pub x_shift: i64,
    pub y_shift: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlignmentTable {
    pub entries: Vec<AlignmentEntry>,
    pub rotation_center: Option<f64>,
}

impl AlignmentTable {
    pub fn from_shifts(
        filenames: &[String],
        shifts: &ShiftVectors,
        rotation_center: Option<f64>,
    ) -> Result<Self> {
        if filenames.len() != shifts.len() {
            return Err(XrfAlignError::DimensionMismatch {
                expected: vec![shifts.len()],
                found: vec![filenames.len()],
            });
        }
        let entries = filenames
            .iter()
            .zip(shifts.x.iter().zip(&shifts.y))
            .map(|(name, (&x, &y))| AlignmentEntry {
                filename: name.clone(),
                x_shift: x,
                y_shift: y,
            })
            .collect();
        Ok(Self {
            entries,
            rotation_center,
        })
    }

    pub fn find(&self, filename: &str) -> Option<&AlignmentEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }
}

pub fn format_alignment_table(table: &AlignmentTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADER}");
    for entry in &table.entries {
        let _ = writeln!(out, "{},{},{}", entry.filename, entry.x_shift, entry.y_shift);
    }
    if let Some(center) = table.rotation_center {
        let _ = writeln!(out, "{},{}", ROTATION_AXIS_KEYS[0], center);
    }
    out
}

pub fn save_alignment_file(table: &AlignmentTable, path: &Path) -> Result<()> {
    std::fs::write(path, format_alignment_table(table))?;
    Ok(())
}

pub fn load_alignment_file(path: &Path) -> Result<AlignmentTable> {
    let contents = std::fs::read_to_string(path)?;
    parse_alignment_table(&contents)
}

pub fn parse_alignment_table(contents: &str) -> Result<AlignmentTable> {
    let mut table = AlignmentTable::default();

    for (i, line) in contents.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case(HEADER) {
            continue;
        }

        if let Some((key, value)) = line.rsplit_once(',') {
            if ROTATION_AXIS_KEYS.contains(&key.trim()) {
                let center = value.trim().parse::<f64>().map_err(|_| {
                    XrfAlignError::InvalidAlignmentFile(format!(
                        "line {line_no}: invalid rotation axis '{}'",
                        value.trim()
                    ))
                })?;
                table.rotation_center = Some(center);
                continue;
            }
        }

        // Split from the right so filenames may contain commas.
        let mut fields = line.rsplitn(3, ',');
        let (Some(y), Some(x), Some(name)) = (fields.next(), fields.next(), fields.next()) else {
            return Err(XrfAlignError::InvalidAlignmentFile(format!(
                "line {line_no}: expected filename,x_shift,y_shift"
            )));
        };
        table.entries.push(AlignmentEntry {
            filename: name.trim().to_string(),
            x_shift: parse_shift(x, line_no)?,
            y_shift: parse_shift(y, line_no)?,
        });
    }

    Ok(table)
}

/// Shifts are whole pixels; fractional values written by other tools are
/// truncated.
fn parse_shift(field: &str, line_no: usize) -> Result<i64> {
    let value: f64 = field.trim().parse().map_err(|_| {
        XrfAlignError::InvalidAlignmentFile(format!(
            "line {line_no}: invalid shift '{}'",
            field.trim()
        ))
    })?;
    if !value.is_finite() {
        return Err(XrfAlignError::InvalidAlignmentFile(format!(
            "line {line_no}: non-finite shift"
        )));
    }
    Ok(value.trunc() as i64)
}
