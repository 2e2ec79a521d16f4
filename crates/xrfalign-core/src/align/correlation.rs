//! Frequency-domain registration primitives.
//!
//! Both primitives return the integer displacement of `moving` relative to
//! `reference`: for any image `a`, `cross_correlate(a, roll(a, d)) == d`
//! whenever the pattern is not periodic with `d`.

use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex;

use crate::consts::SPECTRUM_EPSILON;
use crate::error::{Result, XrfAlignError};
use crate::projection::PixelOffset;

use super::fourier::{fft2d_forward, find_peak, ifft2d_inverse, wrap_index};

/// Integer displacement from the peak of the FFT cross-correlation surface
/// `|IFFT(F(reference) * conj(F(moving)))|`.
pub fn cross_correlate(reference: ArrayView2<f32>, moving: ArrayView2<f32>) -> Result<PixelOffset> {
    correlate(reference, moving, false)
}

/// Like [`cross_correlate`], but the cross-power spectrum is normalized by
/// `|F(reference)| * |F(moving)|` first, which sharpens the peak for pure
/// translations.
pub fn phase_correlate(reference: ArrayView2<f32>, moving: ArrayView2<f32>) -> Result<PixelOffset> {
    correlate(reference, moving, true)
}

pub(crate) fn check_same_shape(a: &ArrayView2<f32>, b: &ArrayView2<f32>) -> Result<()> {
    if a.dim() != b.dim() {
        return Err(XrfAlignError::DimensionMismatch {
            expected: vec![a.nrows(), a.ncols()],
            found: vec![b.nrows(), b.ncols()],
        });
    }
    Ok(())
}

fn correlate(
    reference: ArrayView2<f32>,
    moving: ArrayView2<f32>,
    normalize: bool,
) -> Result<PixelOffset> {
    check_same_shape(&reference, &moving)?;
    let (h, w) = reference.dim();
    if h == 0 || w == 0 {
        return Err(XrfAlignError::DegenerateInput(
            "cannot correlate an empty image".into(),
        ));
    }

    let ref_fft = fft2d_forward(&reference);
    let mov_fft = fft2d_forward(&moving);

    let mut cross = Array2::<Complex<f64>>::zeros((h, w));
    Zip::from(&mut cross)
        .and(&ref_fft)
        .and(&mov_fft)
        .for_each(|out, &a, &b| {
            let product = a * b.conj();
            *out = if normalize {
                let mag = a.norm() * b.norm();
                if mag > SPECTRUM_EPSILON {
                    product / mag
                } else {
                    Complex::new(0.0, 0.0)
                }
            } else {
                product
            };
        });

    let surface = ifft2d_inverse(&cross).mapv(|v| v.norm());
    let (peak_row, peak_col, _) = find_peak(&surface);

    // The surface peaks at the lag that maps `moving` back onto `reference`,
    // which is the negated displacement.
    Ok(PixelOffset::new(
        -wrap_index(peak_row, h),
        -wrap_index(peak_col, w),
    ))
}
