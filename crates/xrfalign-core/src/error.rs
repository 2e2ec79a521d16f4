use thiserror::Error;

#[derive(Error, Debug)]
pub enum XrfAlignError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Curve fit did not converge after {iterations} iterations (last estimate: {params:?})")]
    FitFailure { params: Vec<f64>, iterations: usize },

    #[error("Not enough data: need at least {needed} samples, found {found}")]
    InsufficientData { needed: usize, found: usize },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Projection index {index} out of range (total: {total})")]
    ProjectionOutOfRange { index: usize, total: usize },

    #[error("Channel index {index} out of range (total: {total})")]
    ChannelOutOfRange { index: usize, total: usize },

    #[error("Empty projection stack")]
    EmptyStack,

    #[error("Invalid theta file: {0}")]
    InvalidThetaFile(String),

    #[error("Invalid alignment file: {0}")]
    InvalidAlignmentFile(String),
}

pub type Result<T> = std::result::Result<T, XrfAlignError>;
