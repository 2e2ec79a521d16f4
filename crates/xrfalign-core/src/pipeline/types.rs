/// Alignment stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum AlignmentStage {
    Sorting,
    Registration,
    CenterOfMass,
}

impl std::fmt::Display for AlignmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sorting => write!(f, "Sorting by angle"),
            Self::Registration => write!(f, "Registering projections"),
            Self::CenterOfMass => write!(f, "Tracking center of mass"),
        }
    }
}

/// Outcome of one configured pass.
#[derive(Clone, Debug)]
pub struct PassSummary {
    pub method: String,
    /// Largest absolute cumulative `(x, y)` shift after the pass.
    pub max_shift: (i64, i64),
    /// Rotation center from the fit, for center-of-mass passes with offset.
    pub rotation_center: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct AlignmentReport {
    pub sorted: bool,
    pub passes: Vec<PassSummary>,
}

/// Progress reporting for the alignment pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter {
    /// A new stage has started. `total_items` is the number of projections
    /// in this stage, if known.
    fn begin_stage(&self, _stage: AlignmentStage, _total_items: Option<usize>) {}

    /// `items_done` projections of the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_alignment` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
