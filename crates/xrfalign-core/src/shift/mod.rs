//! Cumulative per-projection shift bookkeeping and undo history.

mod accumulator;
mod history;

pub use accumulator::{ShiftAccumulator, ShiftVectors};
pub use history::{AlignmentHistory, Snapshot};
