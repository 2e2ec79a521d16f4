use ndarray::ArrayView2;

use crate::error::Result;
use crate::pipeline::config::RegistrationMethod;
use crate::projection::PixelOffset;

use super::{apodize, correlation, template};

/// Displacement of `moving` relative to `reference` using the chosen
/// registration method. When `apodize_sigma` is set, both images are
/// edge-tapered before a frequency-domain method runs; template matching
/// always uses the raw images.
pub fn compute_displacement(
    reference: ArrayView2<f32>,
    moving: ArrayView2<f32>,
    method: RegistrationMethod,
    apodize_sigma: Option<f32>,
) -> Result<PixelOffset> {
    match method {
        RegistrationMethod::TemplateMatch => template::match_template(reference, moving),
        RegistrationMethod::CrossCorrelation | RegistrationMethod::PhaseCorrelation => {
            let (reference, moving) = match apodize_sigma {
                Some(sigma) => (
                    apodize::apodize(reference, sigma),
                    apodize::apodize(moving, sigma),
                ),
                None => (reference.to_owned(), moving.to_owned()),
            };
            if method == RegistrationMethod::PhaseCorrelation {
                correlation::phase_correlate(reference.view(), moving.view())
            } else {
                correlation::cross_correlate(reference.view(), moving.view())
            }
        }
    }
}
