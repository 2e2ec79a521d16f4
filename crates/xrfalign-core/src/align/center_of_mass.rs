//! Center-of-mass tracking across the tilt series.
//!
//! Each projection is reduced to a background-subtracted column profile and
//! its intensity-weighted mean column. Fitted against rotation angle, the
//! centroids trace a sine curve whose residuals drive the column correction.
//!
//! Corrections share the sign of every other pass: a residual `r` rolls the
//! projection by `round(r)` columns and lowers its cumulative `x` shift by
//! `round(r)`. An alignment file therefore holds the displacement that was
//! removed, whichever method found it.

use std::ops::Range;

use ndarray::{s, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::info;

use crate::consts::PARALLEL_PROJECTION_THRESHOLD;
use crate::error::{Result, XrfAlignError};
use crate::projection::{PixelOffset, ProjectionStack};
use crate::shift::ShiftAccumulator;

use super::template::background_level;

/// Centroid column of every projection of `channel`, using all rows.
pub fn center_of_mass(stack: &ProjectionStack, channel: usize) -> Result<Vec<f64>> {
    center_of_mass_rows(stack, channel, 0..stack.height())
}

/// Centroid column of every projection of `channel`, summing only the rows
/// in `rows` (clamped to the image height). The background level is still
/// taken from the top-left patch of the full projection.
pub fn center_of_mass_rows(
    stack: &ProjectionStack,
    channel: usize,
    rows: Range<usize>,
) -> Result<Vec<f64>> {
    stack.check_channel(channel)?;
    let height = stack.height();
    let rows = rows.start.min(height)..rows.end.min(height);
    if rows.is_empty() {
        return Err(XrfAlignError::DegenerateInput(format!(
            "empty row band {}..{} for centroid",
            rows.start, rows.end
        )));
    }

    let n = stack.projections();
    let compute = |index: usize| -> Result<f64> {
        let image = stack.projection(channel, index)?;
        projection_centroid(image, rows.clone()).map_err(|e| match e {
            XrfAlignError::DegenerateInput(msg) => {
                XrfAlignError::DegenerateInput(format!("projection {index}: {msg}"))
            }
            other => other,
        })
    };

    if n >= PARALLEL_PROJECTION_THRESHOLD {
        (0..n).into_par_iter().map(compute).collect()
    } else {
        (0..n).map(compute).collect()
    }
}

/// Intensity-weighted mean column of one background-subtracted projection.
fn projection_centroid(image: ArrayView2<f32>, rows: Range<usize>) -> Result<f64> {
    let background = background_level(image);
    let band = image.slice(s![rows, ..]);

    let mut total = 0.0f64;
    let mut weighted = 0.0f64;
    for (col, column) in band.axis_iter(Axis(1)).enumerate() {
        let mass: f64 = column.iter().map(|&v| v as f64 - background).sum();
        total += mass;
        weighted += mass * col as f64;
    }

    if total == 0.0 || !total.is_finite() {
        return Err(XrfAlignError::DegenerateInput(
            "zero background-subtracted intensity, centroid undefined".into(),
        ));
    }

    Ok(weighted / total)
}

/// Round each correction to the nearest pixel and roll every channel of the
/// matching projection so its centroid moves onto the fitted curve.
///
/// `corrections[i]` is the residual `f(θ_i) - centroid_i` for projection
/// `i`, i.e. the column roll to apply. The cumulative shift records the
/// negation: `x[i] -= round(corrections[i])`. Rounding happens per pass;
/// fractional remainders are dropped.
pub fn align_center_of_mass<F>(
    accumulator: &mut ShiftAccumulator,
    corrections: &[f64],
    on_projection_done: F,
) -> Result<()>
where
    F: FnMut(usize),
{
    let n = accumulator.projections();
    if corrections.len() != n {
        return Err(XrfAlignError::DimensionMismatch {
            expected: vec![n],
            found: vec![corrections.len()],
        });
    }
    let indices: Vec<usize> = (0..n).collect();
    align_center_of_mass_subset(accumulator, &indices, corrections, on_projection_done)
}

/// Like [`align_center_of_mass`], but only for the listed projections;
/// `corrections[j]` applies to projection `indices[j]`.
pub fn align_center_of_mass_subset<F>(
    accumulator: &mut ShiftAccumulator,
    indices: &[usize],
    corrections: &[f64],
    mut on_projection_done: F,
) -> Result<()>
where
    F: FnMut(usize),
{
    if indices.len() != corrections.len() {
        return Err(XrfAlignError::DimensionMismatch {
            expected: vec![indices.len()],
            found: vec![corrections.len()],
        });
    }
    for &index in indices {
        accumulator.stack().check_projection(index)?;
    }
    if let Some(bad) = corrections.iter().find(|c| !c.is_finite()) {
        return Err(XrfAlignError::DegenerateInput(format!(
            "non-finite centroid correction {bad}"
        )));
    }

    for (done, (&index, &correction)) in indices.iter().zip(corrections).enumerate() {
        let roll = correction.round() as i64;
        accumulator.displace(index, PixelOffset::new(0, -roll))?;
        on_projection_done(done + 1);
    }

    info!(projections = indices.len(), "Applied center-of-mass correction");
    Ok(())
}
