pub mod apodize;
pub mod center_of_mass;
pub mod correlation;
mod dispatcher;
mod fourier;
pub mod sequential;
pub mod sine_fit;
pub mod template;

pub use apodize::apodize;
pub use center_of_mass::{
    align_center_of_mass, align_center_of_mass_subset, center_of_mass, center_of_mass_rows,
};
pub use correlation::{cross_correlate, phase_correlate};
pub use dispatcher::compute_displacement;
pub use sequential::{cross_correlation_align, sequential_align, template_match_align};
pub use sine_fit::{fit_center_of_mass, fit_center_of_mass_no_offset, SineFit};
pub use template::match_template;
