//! Sequential pairwise alignment along the tilt series.
//!
//! Projection `i + 1` is registered against its already-corrected
//! predecessor `i`, so each step depends on the previous one and the chain
//! runs strictly in ascending projection order.

use tracing::{debug, info};

use crate::error::Result;
use crate::pipeline::config::RegistrationMethod;
use crate::projection::PixelOffset;
use crate::shift::ShiftAccumulator;

use super::compute_displacement;

/// Register every projection against its predecessor on `channel` and apply
/// the correction to all channels before moving on.
///
/// Returns the displacement found for each projection (the first is always
/// zero). `on_projection_done` is called with the number of projections
/// processed so far.
pub fn sequential_align<F>(
    accumulator: &mut ShiftAccumulator,
    channel: usize,
    method: RegistrationMethod,
    apodize_sigma: Option<f32>,
    mut on_projection_done: F,
) -> Result<Vec<PixelOffset>>
where
    F: FnMut(usize),
{
    accumulator.stack().check_channel(channel)?;
    let n = accumulator.projections();
    let mut found = vec![PixelOffset::ZERO; n];
    on_projection_done(1);

    for i in 0..n.saturating_sub(1) {
        let offset = {
            let stack = accumulator.stack();
            compute_displacement(
                stack.projection(channel, i)?,
                stack.projection(channel, i + 1)?,
                method,
                apodize_sigma,
            )?
        };
        debug!(projection = i + 1, %offset, "Pairwise displacement");
        accumulator.displace(i + 1, offset)?;
        found[i + 1] = offset;
        on_projection_done(i + 2);
    }

    info!(method = %method, projections = n, channel, "Sequential alignment complete");
    Ok(found)
}

/// Sequential alignment by FFT cross-correlation.
pub fn cross_correlation_align<F>(
    accumulator: &mut ShiftAccumulator,
    channel: usize,
    on_projection_done: F,
) -> Result<Vec<PixelOffset>>
where
    F: FnMut(usize),
{
    sequential_align(
        accumulator,
        channel,
        RegistrationMethod::CrossCorrelation,
        None,
        on_projection_done,
    )
}

/// Sequential alignment by template matching on a padded canvas.
pub fn template_match_align<F>(
    accumulator: &mut ShiftAccumulator,
    channel: usize,
    on_projection_done: F,
) -> Result<Vec<PixelOffset>>
where
    F: FnMut(usize),
{
    sequential_align(
        accumulator,
        channel,
        RegistrationMethod::TemplateMatch,
        None,
        on_projection_done,
    )
}
