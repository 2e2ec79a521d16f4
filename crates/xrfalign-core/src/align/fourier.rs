use ndarray::{Array2, ArrayView2, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Forward 2D FFT of a real image: row-wise FFT, then column-wise FFT.
pub(crate) fn fft2d_forward(data: &ArrayView2<f32>) -> Array2<Complex<f64>> {
    let mut result = data.mapv(|v| Complex::new(v as f64, 0.0));
    let (h, w) = result.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);
    transform_rows(&mut result, fft_row.as_ref());
    transform_cols(&mut result, fft_col.as_ref());
    result
}

/// Inverse 2D FFT, normalized by `1 / (h * w)`.
pub(crate) fn ifft2d_inverse(data: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();
    transform_cols(&mut work, ifft_col.as_ref());
    transform_rows(&mut work, ifft_row.as_ref());

    let scale = 1.0 / (h * w) as f64;
    work.mapv_inplace(|v| v * scale);
    work
}

fn transform_rows(data: &mut Array2<Complex<f64>>, fft: &dyn Fft<f64>) {
    let mut buffer = vec![Complex::new(0.0, 0.0); data.ncols()];
    for mut row in data.axis_iter_mut(Axis(0)) {
        for (dst, src) in buffer.iter_mut().zip(row.iter()) {
            *dst = *src;
        }
        fft.process(&mut buffer);
        for (dst, src) in row.iter_mut().zip(buffer.iter()) {
            *dst = *src;
        }
    }
}

fn transform_cols(data: &mut Array2<Complex<f64>>, fft: &dyn Fft<f64>) {
    let mut buffer = vec![Complex::new(0.0, 0.0); data.nrows()];
    for mut col in data.axis_iter_mut(Axis(1)) {
        for (dst, src) in buffer.iter_mut().zip(col.iter()) {
            *dst = *src;
        }
        fft.process(&mut buffer);
        for (dst, src) in col.iter_mut().zip(buffer.iter()) {
            *dst = *src;
        }
    }
}

/// Location and value of the global maximum. Ties keep the first
/// occurrence in row-major order.
pub(crate) fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let mut best_row = 0;
    let mut best_col = 0;
    let mut best_val = f64::NEG_INFINITY;

    for ((row, col), &val) in data.indexed_iter() {
        if val > best_val {
            best_val = val;
            best_row = row;
            best_col = col;
        }
    }

    (best_row, best_col, best_val)
}

/// Map an unsigned FFT-domain index into a signed lag: indices past the
/// half-length wrap to negative values.
pub(crate) fn wrap_index(index: usize, len: usize) -> i64 {
    if index > len / 2 {
        index as i64 - len as i64
    } else {
        index as i64
    }
}
