/// Minimum projection count to compute per-projection quantities with Rayon.
pub const PARALLEL_PROJECTION_THRESHOLD: usize = 4;

/// Minimum element count (channels * projections * rows * cols) to scrub
/// non-finite values in parallel.
pub const PARALLEL_ELEMENT_THRESHOLD: usize = 65_536;

/// Side length of the top-left patch whose mean is taken as the background
/// level for centroid tracking and template padding.
pub const BACKGROUND_PATCH_SIZE: usize = 10;

/// Maximum number of snapshots retained by the alignment history.
pub const HISTORY_CAPACITY: usize = 10;

/// Value written over NaN/Inf pixels at the data-model boundary.
pub const NON_FINITE_SENTINEL: f32 = 1e-4;

/// Default Gaussian width (in pixels) of the apodization rolloff.
pub const DEFAULT_APODIZE_SIGMA: f32 = 4.0;

/// Relative amplitude at which the apodization rolloff is considered flat.
pub const APODIZE_CUTOFF: f64 = 1e-6;

/// Starting value for every parameter of the sinusoidal centroid fit.
pub const SINE_FIT_INITIAL_GUESS: f64 = 100.0;

/// Upper bound on Levenberg-Marquardt iterations before a fit is reported
/// as non-convergent.
pub const SINE_FIT_MAX_ITERATIONS: usize = 400;

/// Relative cost reduction below which the fit is considered converged.
pub const SINE_FIT_FTOL: f64 = 1e-12;

/// Relative parameter step below which the fit is considered converged.
pub const SINE_FIT_XTOL: f64 = 1e-12;

/// Damping factor ceiling; reaching it means no descent direction remains.
pub const SINE_FIT_MAX_DAMPING: f64 = 1e16;

/// Magnitude below which a spectral bin is zeroed instead of normalized in
/// phase correlation.
pub const SPECTRUM_EPSILON: f64 = 1e-12;

/// Windowed variance below which a normalized cross-correlation score is 0.
pub const NCC_VARIANCE_EPSILON: f64 = 1e-12;
