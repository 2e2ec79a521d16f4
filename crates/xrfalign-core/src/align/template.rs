//! Template matching for adjacent-projection tracking.
//!
//! The reference projection is centered in a canvas twice its size, padded
//! with its own background level, and the next projection is slid over the
//! canvas with normalized cross-correlation. Features that translate partly
//! out of the original frame still find a match on the padded canvas.

use ndarray::{s, Array2, ArrayView2, Zip};
use num_complex::Complex;

use crate::consts::{BACKGROUND_PATCH_SIZE, NCC_VARIANCE_EPSILON};
use crate::error::{Result, XrfAlignError};
use crate::projection::PixelOffset;

use super::correlation::check_same_shape;
use super::fourier::{fft2d_forward, find_peak, ifft2d_inverse};

/// Displacement of `next` relative to `reference`, found by template
/// matching `next` against the padded reference canvas.
pub fn match_template(reference: ArrayView2<f32>, next: ArrayView2<f32>) -> Result<PixelOffset> {
    check_same_shape(&reference, &next)?;
    let (h, w) = reference.dim();

    let canvas = padded_canvas(reference);
    let scores = normalized_cross_correlation(canvas.view(), next)?;
    let (row, col, _) = find_peak(&scores);

    Ok(PixelOffset::new(
        (h / 2) as i64 - row as i64,
        (w / 2) as i64 - col as i64,
    ))
}

/// Mean of the top-left background patch (clamped to the image size).
pub fn background_level(image: ArrayView2<f32>) -> f64 {
    let rows = BACKGROUND_PATCH_SIZE.min(image.nrows());
    let cols = BACKGROUND_PATCH_SIZE.min(image.ncols());
    if rows == 0 || cols == 0 {
        return 0.0;
    }
    let patch = image.slice(s![..rows, ..cols]);
    patch.iter().map(|&v| v as f64).sum::<f64>() / (rows * cols) as f64
}

/// Canvas of shape `(2h, 2w)` filled with the reference's background level,
/// with the reference placed at offset `(h / 2, w / 2)`.
pub fn padded_canvas(reference: ArrayView2<f32>) -> Array2<f32> {
    let (h, w) = reference.dim();
    let fill = background_level(reference) as f32;
    let mut canvas = Array2::<f32>::from_elem((2 * h, 2 * w), fill);
    canvas
        .slice_mut(s![h / 2..h / 2 + h, w / 2..w / 2 + w])
        .assign(&reference);
    canvas
}

/// Zero-normalized cross-correlation of `template` at every position where
/// it fits entirely inside `image`.
///
/// The result has shape `(H - h + 1, W - w + 1)`; entry `(u, v)` scores the
/// template with its top-left corner at `(u, v)`. Positions where either the
/// template or the image window has no variance score 0.
pub fn normalized_cross_correlation(
    image: ArrayView2<f32>,
    template: ArrayView2<f32>,
) -> Result<Array2<f64>> {
    let (ih, iw) = image.dim();
    let (th, tw) = template.dim();
    if th == 0 || tw == 0 {
        return Err(XrfAlignError::DegenerateInput("empty template".into()));
    }
    if th > ih || tw > iw {
        return Err(XrfAlignError::DimensionMismatch {
            expected: vec![ih, iw],
            found: vec![th, tw],
        });
    }

    let n = (th * tw) as f64;
    let template_mean = template.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mut centered = Array2::<f32>::zeros((ih, iw));
    centered
        .slice_mut(s![..th, ..tw])
        .assign(&template.mapv(|v| (v as f64 - template_mean) as f32));
    let template_energy: f64 = template
        .iter()
        .map(|&v| {
            let d = v as f64 - template_mean;
            d * d
        })
        .sum();

    // Numerator: sum over the window of image * (template - mean). The
    // template is zero-mean, so the window mean drops out.
    let image_fft = fft2d_forward(&image);
    let template_fft = fft2d_forward(&centered.view());
    let mut cross = Array2::<Complex<f64>>::zeros((ih, iw));
    Zip::from(&mut cross)
        .and(&image_fft)
        .and(&template_fft)
        .for_each(|out, &a, &b| *out = a * b.conj());
    let numerator = ifft2d_inverse(&cross);

    let sums = SummedArea::new(image, |v| v);
    let squares = SummedArea::new(image, |v| v * v);

    let out_h = ih - th + 1;
    let out_w = iw - tw + 1;
    let mut result = Array2::<f64>::zeros((out_h, out_w));
    for u in 0..out_h {
        for v in 0..out_w {
            let window_sum = sums.rect(u, v, th, tw);
            let window_sq = squares.rect(u, v, th, tw);
            let window_var = (window_sq - window_sum * window_sum / n).max(0.0);
            let denominator = (window_var * template_energy).sqrt();
            if denominator > NCC_VARIANCE_EPSILON {
                result[[u, v]] = numerator[[u, v]].re / denominator;
            }
        }
    }

    Ok(result)
}

/// Summed-area table with a zero first row and column.
struct SummedArea {
    table: Array2<f64>,
}

impl SummedArea {
    fn new(image: ArrayView2<f32>, f: impl Fn(f64) -> f64) -> Self {
        let (h, w) = image.dim();
        let mut table = Array2::<f64>::zeros((h + 1, w + 1));
        for row in 0..h {
            let mut running = 0.0;
            for col in 0..w {
                running += f(image[[row, col]] as f64);
                table[[row + 1, col + 1]] = table[[row, col + 1]] + running;
            }
        }
        Self { table }
    }

    fn rect(&self, row: usize, col: usize, h: usize, w: usize) -> f64 {
        let t = &self.table;
        t[[row + h, col + w]] - t[[row, col + w]] - t[[row + h, col]] + t[[row, col]]
    }
}
