#![allow(dead_code)]

use ndarray::{Array2, Array4};

use xrfalign_core::projection::{roll_array, ProjectionStack};
use xrfalign_core::session::AlignmentSession;

/// Deterministic pseudo-random texture in `[0, 1)`. Not periodic, so every
/// cyclic shift of it is distinguishable.
pub fn textured_image(height: usize, width: usize, seed: u64) -> Array2<f32> {
    const A: u64 = 6364136223846793005;
    const C: u64 = 1442695040888963407;
    let mut state = seed.wrapping_mul(A).wrapping_add(C);
    Array2::from_shape_fn((height, width), |_| {
        state = state.wrapping_mul(A).wrapping_add(C);
        (state >> 40) as f32 / (1u64 << 24) as f32
    })
}

/// Flat `background` image with a textured rectangular blob at
/// `[top..top+size, left..left+size]`.
pub fn blob_image(
    height: usize,
    width: usize,
    top: usize,
    left: usize,
    size: usize,
    background: f32,
) -> Array2<f32> {
    let texture = textured_image(size, size, 7);
    let mut image = Array2::<f32>::from_elem((height, width), background);
    for r in 0..size {
        for c in 0..size {
            image[[top + r, left + c]] = 1.0 + texture[[r, c]];
        }
    }
    image
}

/// Zero image with a single bright vertical line at `column` over `rows`.
pub fn line_image(
    height: usize,
    width: usize,
    column: usize,
    rows: std::ops::Range<usize>,
) -> Array2<f32> {
    let mut image = Array2::<f32>::zeros((height, width));
    for r in rows {
        image[[r, column]] = 1.0;
    }
    image
}

/// Single-channel stack from a list of projections.
pub fn single_channel_stack(projections: Vec<Array2<f32>>) -> ProjectionStack {
    ProjectionStack::from_projections(&[projections]).unwrap()
}

/// Stack whose projection `i` is `base` rolled by `offsets[i]`, with a second
/// channel carrying the same geometry at twice the intensity.
pub fn rolled_stack(base: &Array2<f32>, offsets: &[(i64, i64)]) -> ProjectionStack {
    let first: Vec<Array2<f32>> = offsets
        .iter()
        .map(|&(dy, dx)| roll_array(&base.view(), dy, dx))
        .collect();
    let second: Vec<Array2<f32>> = first.iter().map(|p| p * 2.0).collect();
    ProjectionStack::from_projections(&[first, second]).unwrap()
}

/// Filenames `proj_000.tif`, `proj_001.tif`, ...
pub fn filenames(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("proj_{i:03}.tif")).collect()
}

/// Session over `stack` with angles `0, step, 2*step, ...`.
pub fn session_with_step(stack: ProjectionStack, step: f64) -> AlignmentSession {
    let n = stack.projections();
    let angles = (0..n).map(|i| i as f64 * step).collect();
    AlignmentSession::new(stack, angles, filenames(n)).unwrap()
}

/// Small 2-channel stack of distinct textured projections.
pub fn small_stack(projections: usize) -> ProjectionStack {
    let mut data = Array4::<f32>::zeros((2, projections, 8, 8));
    for p in 0..projections {
        let image = textured_image(8, 8, p as u64 + 1);
        for c in 0..2 {
            data.slice_mut(ndarray::s![c, p, .., ..])
                .assign(&(&image * (c + 1) as f32));
        }
    }
    ProjectionStack::new(data).unwrap()
}
