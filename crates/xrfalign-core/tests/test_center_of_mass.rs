mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use xrfalign_core::align::{
    align_center_of_mass, align_center_of_mass_subset, center_of_mass, center_of_mass_rows,
};
use xrfalign_core::error::XrfAlignError;
use xrfalign_core::projection::roll_array;
use xrfalign_core::shift::ShiftAccumulator;

use common::{line_image, single_channel_stack};

#[test]
fn test_centroid_of_single_column() {
    let stack = single_channel_stack(vec![
        line_image(16, 32, 20, 12..16),
        line_image(16, 32, 25, 0..16),
    ]);
    let centroids = center_of_mass(&stack, 0).unwrap();
    assert_abs_diff_eq!(centroids[0], 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(centroids[1], 25.0, epsilon = 1e-9);
}

#[test]
fn test_centroid_weighted_mean() {
    let mut image = Array2::<f32>::zeros((12, 24));
    image[[11, 12]] = 1.0;
    image[[11, 18]] = 3.0;
    let stack = single_channel_stack(vec![image]);
    let centroids = center_of_mass(&stack, 0).unwrap();
    // (12 * 1 + 18 * 3) / 4
    assert_abs_diff_eq!(centroids[0], 16.5, epsilon = 1e-9);
}

#[test]
fn test_centroid_subtracts_background() {
    let mut image = Array2::<f32>::from_elem((16, 32), 0.5);
    for r in 0..16 {
        image[[r, 22]] += 2.0;
    }
    let stack = single_channel_stack(vec![image]);
    let centroids = center_of_mass(&stack, 0).unwrap();
    assert_abs_diff_eq!(centroids[0], 22.0, epsilon = 1e-6);
}

#[test]
fn test_all_zero_projection_is_degenerate() {
    let stack = single_channel_stack(vec![
        line_image(16, 16, 12, 0..16),
        Array2::<f32>::zeros((16, 16)),
    ]);
    let err = center_of_mass(&stack, 0).unwrap_err();
    match err {
        XrfAlignError::DegenerateInput(msg) => assert!(msg.contains("projection 1"), "{msg}"),
        other => panic!("expected DegenerateInput, got {other:?}"),
    }
}

#[test]
fn test_centroid_channel_out_of_range() {
    let stack = single_channel_stack(vec![line_image(16, 16, 12, 0..16)]);
    assert!(matches!(
        center_of_mass(&stack, 1),
        Err(XrfAlignError::ChannelOutOfRange { index: 1, total: 1 })
    ));
}

#[test]
fn test_band_centroid_uses_only_band_rows() {
    let mut image = Array2::<f32>::zeros((24, 32));
    for r in 12..16 {
        image[[r, 14]] = 1.0;
    }
    for r in 18..24 {
        image[[r, 28]] = 1.0;
    }
    let stack = single_channel_stack(vec![image]);
    let upper = center_of_mass_rows(&stack, 0, 10..17).unwrap();
    let lower = center_of_mass_rows(&stack, 0, 17..24).unwrap();
    assert_abs_diff_eq!(upper[0], 14.0, epsilon = 1e-9);
    assert_abs_diff_eq!(lower[0], 28.0, epsilon = 1e-9);
}

#[test]
fn test_band_centroid_empty_band() {
    let stack = single_channel_stack(vec![line_image(16, 16, 12, 0..16)]);
    assert!(matches!(
        center_of_mass_rows(&stack, 0, 20..30),
        Err(XrfAlignError::DegenerateInput(_))
    ));
}

#[test]
fn test_many_projections_parallel_path() {
    let projections: Vec<_> = (0..8).map(|i| line_image(16, 32, 12 + i, 0..16)).collect();
    let stack = single_channel_stack(projections);
    let centroids = center_of_mass(&stack, 0).unwrap();
    for (i, c) in centroids.iter().enumerate() {
        assert_abs_diff_eq!(*c, 12.0 + i as f64, epsilon = 1e-9);
    }
}

#[test]
fn test_align_rounds_and_rolls_columns() {
    let base = line_image(16, 32, 16, 0..16);
    let stack = single_channel_stack(vec![base.clone(), base.clone()]);
    let mut acc = ShiftAccumulator::new(stack);

    // Residual +2.4 rolls right by 2, -1.6 rolls left by 2.
    align_center_of_mass(&mut acc, &[2.4, -1.6], |_| {}).unwrap();

    assert_eq!(acc.shifts().x, vec![-2, 2]);
    assert_eq!(acc.shifts().y, vec![0, 0]);
    let p0 = acc.stack().projection(0, 0).unwrap().to_owned();
    let p1 = acc.stack().projection(0, 1).unwrap().to_owned();
    assert_eq!(p0, roll_array(&base.view(), 0, 2));
    assert_eq!(p1, roll_array(&base.view(), 0, -2));
}

#[test]
fn test_align_moves_centroid_onto_target() {
    let stack = single_channel_stack(vec![line_image(16, 32, 10, 0..16)]);
    let mut acc = ShiftAccumulator::new(stack);
    let centroid = center_of_mass(acc.stack(), 0).unwrap()[0];
    let target = 15.0;
    align_center_of_mass(&mut acc, &[target - centroid], |_| {}).unwrap();
    let after = center_of_mass(acc.stack(), 0).unwrap()[0];
    assert_abs_diff_eq!(after, target, epsilon = 1e-9);
}

#[test]
fn test_align_length_mismatch() {
    let stack = single_channel_stack(vec![line_image(16, 16, 12, 0..16)]);
    let mut acc = ShiftAccumulator::new(stack);
    assert!(matches!(
        align_center_of_mass(&mut acc, &[1.0, 2.0], |_| {}),
        Err(XrfAlignError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_align_subset_touches_only_listed() {
    let base = line_image(16, 32, 16, 0..16);
    let stack = single_channel_stack(vec![base.clone(), base.clone(), base.clone()]);
    let mut acc = ShiftAccumulator::new(stack);
    let mut calls = 0;
    align_center_of_mass_subset(&mut acc, &[2], &[3.0], |_| calls += 1).unwrap();
    assert_eq!(calls, 1);
    assert_eq!(acc.shifts().x, vec![0, 0, -3]);
    assert_eq!(acc.stack().projection(0, 0).unwrap(), base.view());
}

#[test]
fn test_align_rejects_non_finite_correction() {
    let stack = single_channel_stack(vec![line_image(16, 16, 12, 0..16)]);
    let mut acc = ShiftAccumulator::new(stack);
    assert!(matches!(
        align_center_of_mass(&mut acc, &[f64::NAN], |_| {}),
        Err(XrfAlignError::DegenerateInput(_))
    ));
    assert_eq!(acc.shifts().x, vec![0]);
}
