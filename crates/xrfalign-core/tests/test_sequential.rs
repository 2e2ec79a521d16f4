mod common;

use xrfalign_core::align::{cross_correlation_align, sequential_align, template_match_align};
use xrfalign_core::error::XrfAlignError;
use xrfalign_core::pipeline::config::RegistrationMethod;
use xrfalign_core::projection::PixelOffset;
use xrfalign_core::shift::ShiftAccumulator;

use common::{blob_image, rolled_stack, textured_image};

#[test]
fn test_xcorr_align_two_projection_scenario() {
    let base = textured_image(8, 8, 42);
    let stack = common::single_channel_stack(vec![
        base.clone(),
        xrfalign_core::projection::roll_array(&base.view(), 2, -3),
    ]);
    let mut acc = ShiftAccumulator::new(stack);

    let found = cross_correlation_align(&mut acc, 0, |_| {}).unwrap();

    assert_eq!(found, vec![PixelOffset::ZERO, PixelOffset::new(2, -3)]);
    assert_eq!(acc.shifts().y, vec![0, 2]);
    assert_eq!(acc.shifts().x, vec![0, -3]);
    assert_eq!(
        acc.stack().projection(0, 1).unwrap(),
        acc.stack().projection(0, 0).unwrap()
    );
}

#[test]
fn test_chain_accumulates_relative_to_corrected_predecessor() {
    let base = textured_image(16, 16, 8);
    let stack = rolled_stack(&base, &[(0, 0), (1, 2), (3, 1), (-2, -4)]);
    let mut acc = ShiftAccumulator::new(stack);

    let found = sequential_align(&mut acc, 0, RegistrationMethod::PhaseCorrelation, None, |_| {})
        .unwrap();

    // Each step is measured against the already-corrected predecessor, so
    // the found displacements are the absolute rolls.
    assert_eq!(found[1], PixelOffset::new(1, 2));
    assert_eq!(found[3], PixelOffset::new(-2, -4));
    assert_eq!(acc.shifts().y, vec![0, 1, 3, -2]);
    assert_eq!(acc.shifts().x, vec![0, 2, 1, -4]);
    for i in 1..4 {
        for c in 0..2 {
            assert_eq!(
                acc.stack().projection(c, i).unwrap(),
                acc.stack().projection(c, 0).unwrap()
            );
        }
    }
}

#[test]
fn test_reference_channel_drives_all_channels() {
    let base = textured_image(16, 16, 12);
    let stack = rolled_stack(&base, &[(0, 0), (-3, 5)]);
    let mut acc = ShiftAccumulator::new(stack);
    cross_correlation_align(&mut acc, 1, |_| {}).unwrap();
    assert_eq!(acc.shifts().get(1), Some(PixelOffset::new(-3, 5)));
    assert_eq!(
        acc.stack().projection(0, 1).unwrap(),
        acc.stack().projection(0, 0).unwrap()
    );
}

#[test]
fn test_template_match_align() {
    let base = blob_image(32, 32, 12, 12, 8, 0.1);
    let stack = rolled_stack(&base, &[(0, 0), (2, -3), (4, -1)]);
    let mut acc = ShiftAccumulator::new(stack);
    template_match_align(&mut acc, 0, |_| {}).unwrap();
    assert_eq!(acc.shifts().y, vec![0, 2, 4]);
    assert_eq!(acc.shifts().x, vec![0, -3, -1]);
}

#[test]
fn test_progress_callback_counts_projections() {
    let base = textured_image(8, 8, 1);
    let stack = rolled_stack(&base, &[(0, 0), (1, 0), (0, 1)]);
    let mut acc = ShiftAccumulator::new(stack);
    let mut seen = Vec::new();
    cross_correlation_align(&mut acc, 0, |done| seen.push(done)).unwrap();
    assert_eq!(seen, vec![1, 2, 3]);
}

#[test]
fn test_single_projection_is_noop() {
    let base = textured_image(8, 8, 1);
    let stack = rolled_stack(&base, &[(0, 0)]);
    let mut acc = ShiftAccumulator::new(stack.clone());
    let found = cross_correlation_align(&mut acc, 0, |_| {}).unwrap();
    assert_eq!(found, vec![PixelOffset::ZERO]);
    assert_eq!(acc.stack(), &stack);
}

#[test]
fn test_bad_channel() {
    let base = textured_image(8, 8, 1);
    let mut acc = ShiftAccumulator::new(rolled_stack(&base, &[(0, 0), (1, 1)]));
    assert!(matches!(
        cross_correlation_align(&mut acc, 2, |_| {}),
        Err(XrfAlignError::ChannelOutOfRange { index: 2, total: 2 })
    ));
}
