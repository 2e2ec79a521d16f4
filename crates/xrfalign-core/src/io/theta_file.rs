//! Theta (rotation angle) text files.
//!
//! The first line is a header. Each following line holds either a single
//! angle in degrees or `filename,angle`; the header's column count decides
//! which.

use std::path::Path;

use crate::error::{Result, XrfAlignError};

/// Angles read from a theta file, with filenames when the file lists them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThetaTable {
    /// Empty when the file has a single angle column.
    pub filenames: Vec<String>,
    pub angles: Vec<f64>,
}

impl ThetaTable {
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn has_filenames(&self) -> bool {
        !self.filenames.is_empty()
    }

    /// Angle for each of `filenames`, in that order.
    ///
    /// A projection is matched by exact filename first, then by file stem
    /// (so `proj_001.tif` matches `proj_001.h5`). Unmatched projections fall
    /// back to their position when the table lists exactly one angle per
    /// projection.
    pub fn angles_for(&self, filenames: &[String]) -> Result<Vec<f64>> {
        let positional = self.len() == filenames.len();
        if !self.has_filenames() {
            if !positional {
                return Err(XrfAlignError::DimensionMismatch {
                    expected: vec![filenames.len()],
                    found: vec![self.len()],
                });
            }
            return Ok(self.angles.clone());
        }

        let stems: Vec<&str> = self.filenames.iter().map(|n| file_stem(n)).collect();
        filenames
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let found = self
                    .filenames
                    .iter()
                    .position(|n| n == name)
                    .or_else(|| stems.iter().position(|s| *s == file_stem(name)));
                match found {
                    Some(j) => Ok(self.angles[j]),
                    None if positional => Ok(self.angles[i]),
                    None => Err(XrfAlignError::InvalidThetaFile(format!(
                        "no angle listed for '{name}'"
                    ))),
                }
            })
            .collect()
    }
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

pub fn load_theta_file(path: &Path) -> Result<ThetaTable> {
    let contents = std::fs::read_to_string(path)?;
    parse_theta_table(&contents)
}

pub fn parse_theta_table(contents: &str) -> Result<ThetaTable> {
    let mut lines = contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| XrfAlignError::InvalidThetaFile("file is empty".into()))?;
    let columns = header.split(',').count();
    if columns > 2 {
        return Err(XrfAlignError::InvalidThetaFile(format!(
            "expected 1 or 2 columns, header has {columns}"
        )));
    }

    let mut table = ThetaTable::default();
    for (line_no, line) in lines {
        let (name, angle) = if columns == 2 {
            let (name, angle) = line.rsplit_once(',').ok_or_else(|| {
                XrfAlignError::InvalidThetaFile(format!("line {line_no}: expected filename,angle"))
            })?;
            (Some(name.trim()), angle.trim())
        } else {
            (None, line)
        };

        let angle: f64 = angle.parse().map_err(|_| {
            XrfAlignError::InvalidThetaFile(format!("line {line_no}: invalid angle '{angle}'"))
        })?;
        if let Some(name) = name {
            table.filenames.push(name.to_string());
        }
        table.angles.push(angle);
    }

    if table.is_empty() {
        return Err(XrfAlignError::InvalidThetaFile("no angles listed".into()));
    }
    Ok(table)
}
