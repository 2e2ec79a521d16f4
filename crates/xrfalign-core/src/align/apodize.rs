//! Edge apodization ("edge gauss") applied before correlation.
//!
//! Multiplies bands along all four borders by `1 - exp(-t^2 / 2)` so that the
//! image decays smoothly to zero at the border. Each band narrows by one pixel
//! per step towards the center and never crosses the half-width or
//! half-height midline.

use ndarray::{Array2, ArrayView2};

use crate::consts::APODIZE_CUTOFF;

/// Number of rolloff steps for a given sigma: `max(ceil(1 + sigma * -ln(cutoff)), 2)`.
pub fn rolloff_length(sigma: f32) -> usize {
    let n_sigma = -APODIZE_CUTOFF.ln();
    ((1.0 + sigma as f64 * n_sigma).ceil() as usize).max(2)
}

/// Rolloff profile `1 - exp(-0.5 * (i / sigma)^2)` for `i` in `0..rolloff_length(sigma)`.
pub fn rolloff_profile(sigma: f32) -> Vec<f32> {
    (0..rolloff_length(sigma))
        .map(|i| {
            let t = i as f32 / sigma;
            1.0 - (-0.5 * t * t).exp()
        })
        .collect()
}

/// Return a copy of `image` with its four edge bands tapered to zero.
///
/// A non-positive or non-finite `sigma` leaves the image unchanged.
pub fn apodize(image: ArrayView2<f32>, sigma: f32) -> Array2<f32> {
    let mut result = image.to_owned();
    if !(sigma.is_finite() && sigma > 0.0) {
        return result;
    }

    let (ny, nx) = result.dim();
    if ny == 0 || nx == 0 {
        return result;
    }
    let rolloff = rolloff_profile(sigma);
    let half_w = nx / 2;
    let half_h = ny / 2;

    // Top and bottom bands span columns [xstart, xstop).
    for (i, &factor) in rolloff.iter().enumerate().take(ny) {
        let xstart = i.min(half_w.saturating_sub(1));
        let xstop = nx.saturating_sub(i).max(half_w);
        scale_row(&mut result, i, xstart, xstop, factor);
        scale_row(&mut result, ny - 1 - i, xstart, xstop, factor);
    }

    // Left and right bands start one row in from the corners.
    for (i, &factor) in rolloff.iter().enumerate().take(nx) {
        let ystart = if i == 0 {
            1
        } else {
            (1 + i).min(half_h.saturating_sub(1))
        };
        let ystop = ny.saturating_sub(1 + i).max(half_h);
        scale_col(&mut result, i, ystart, ystop, factor);
        scale_col(&mut result, nx - 1 - i, ystart, ystop, factor);
    }

    result
}

fn scale_row(data: &mut Array2<f32>, row: usize, start: usize, stop: usize, factor: f32) {
    for col in start..stop.min(data.ncols()) {
        data[[row, col]] *= factor;
    }
}

fn scale_col(data: &mut Array2<f32>, col: usize, start: usize, stop: usize, factor: f32) {
    for row in start..stop.min(data.nrows()) {
        data[[row, col]] *= factor;
    }
}
