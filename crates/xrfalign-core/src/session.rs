//! Alignment session: the single owner of the projection stack, its angles,
//! filenames, cumulative shifts and undo history.
//!
//! Every mutating operation runs through [`AlignmentSession::commit`]. On
//! success the new state is pushed onto the history; on failure the live
//! state is restored from the newest snapshot so a half-applied pass never
//! survives.

use std::ops::Range;

use tracing::{info, warn};

use crate::align::sine_fit::fit_sine_no_offset;
use crate::align::{
    align_center_of_mass, align_center_of_mass_subset, center_of_mass, center_of_mass_rows,
    fit_center_of_mass, sequential_align, SineFit,
};
use crate::consts::NON_FINITE_SENTINEL;
use crate::error::{Result, XrfAlignError};
use crate::io::alignment_file::AlignmentTable;
use crate::io::image_stack::LoadedStack;
use crate::io::theta_file::ThetaTable;
use crate::pipeline::config::{RegistrationMethod, SineModel};
use crate::projection::{PixelOffset, ProjectionStack};
use crate::shift::{AlignmentHistory, ShiftAccumulator, ShiftVectors, Snapshot};

/// Result of [`AlignmentSession::undo`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    /// State restored; `depth` snapshots remain in the history.
    Restored { depth: usize },
    NothingToUndo,
}

/// Centroids, fit and applied corrections of one center-of-mass pass.
#[derive(Clone, Debug)]
pub struct CenterOfMassOutcome {
    pub centroids: Vec<f64>,
    pub fit: SineFit,
    /// `f(θ) - centroid` per projection, before rounding.
    pub residuals: Vec<f64>,
}

#[derive(Debug)]
pub struct AlignmentSession {
    accumulator: ShiftAccumulator,
    angles: Vec<f64>,
    filenames: Vec<String>,
    history: AlignmentHistory,
    original: Snapshot,
    last_fit: Option<SineFit>,
}

impl AlignmentSession {
    /// Start a session on a freshly loaded stack. NaN and infinite pixels are
    /// replaced by the sentinel before the original snapshot is taken.
    pub fn new(mut stack: ProjectionStack, angles: Vec<f64>, filenames: Vec<String>) -> Result<Self> {
        let n = stack.projections();
        if angles.len() != n || filenames.len() != n {
            return Err(XrfAlignError::DimensionMismatch {
                expected: vec![n, n],
                found: vec![angles.len(), filenames.len()],
            });
        }

        let scrubbed = stack.scrub_non_finite(NON_FINITE_SENTINEL);
        if scrubbed > 0 {
            warn!(pixels = scrubbed, "Replaced non-finite pixels");
        }

        let accumulator = ShiftAccumulator::new(stack);
        let original = Snapshot {
            stack: accumulator.stack().clone(),
            shifts: accumulator.shifts().clone(),
            angles: angles.clone(),
            filenames: filenames.clone(),
            last_fit: None,
        };
        let mut history = AlignmentHistory::default();
        history.push(original.clone());

        info!(
            channels = original.stack.channels(),
            projections = n,
            "Alignment session started"
        );

        Ok(Self {
            accumulator,
            angles,
            filenames,
            history,
            original,
            last_fit: None,
        })
    }

    /// Start a session from a loaded image directory, taking angles from
    /// `thetas` (matched by filename where the table lists them).
    pub fn from_loaded(loaded: LoadedStack, thetas: &ThetaTable) -> Result<Self> {
        let angles = thetas.angles_for(&loaded.filenames)?;
        Self::new(loaded.stack, angles, loaded.filenames)
    }

    pub fn stack(&self) -> &ProjectionStack {
        self.accumulator.stack()
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn shifts(&self) -> &ShiftVectors {
        self.accumulator.shifts()
    }

    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Fit from the most recent center-of-mass pass, if any.
    pub fn last_fit(&self) -> Option<&SineFit> {
        self.last_fit.as_ref()
    }

    /// Rotation-axis column from the last fit that had a vertical offset.
    pub fn rotation_center(&self) -> Option<f64> {
        self.last_fit
            .filter(|fit| fit.offset != 0.0)
            .map(|fit| fit.rotation_center())
    }

    /// Current shifts as an alignment table keyed by filename.
    pub fn alignment_table(&self) -> Result<AlignmentTable> {
        AlignmentTable::from_shifts(&self.filenames, self.shifts(), self.rotation_center())
    }

    /// Register each projection against its corrected predecessor.
    pub fn align_sequential(
        &mut self,
        channel: usize,
        method: RegistrationMethod,
        apodize_sigma: Option<f32>,
    ) -> Result<Vec<PixelOffset>> {
        self.align_sequential_with_progress(channel, method, apodize_sigma, |_| {})
    }

    pub fn align_sequential_with_progress<F>(
        &mut self,
        channel: usize,
        method: RegistrationMethod,
        apodize_sigma: Option<f32>,
        on_projection_done: F,
    ) -> Result<Vec<PixelOffset>>
    where
        F: FnMut(usize),
    {
        self.commit("sequential alignment", |session| {
            sequential_align(
                &mut session.accumulator,
                channel,
                method,
                apodize_sigma,
                on_projection_done,
            )
        })
    }

    /// Track centroids on `channel`, fit them against angle and roll every
    /// projection onto the fitted curve. `rows` limits the centroid to a
    /// band of rows.
    pub fn align_center_of_mass(
        &mut self,
        channel: usize,
        model: SineModel,
        rows: Option<Range<usize>>,
    ) -> Result<CenterOfMassOutcome> {
        self.align_center_of_mass_with_progress(channel, model, rows, |_| {})
    }

    pub fn align_center_of_mass_with_progress<F>(
        &mut self,
        channel: usize,
        model: SineModel,
        rows: Option<Range<usize>>,
        on_projection_done: F,
    ) -> Result<CenterOfMassOutcome>
    where
        F: FnMut(usize),
    {
        self.commit("center-of-mass alignment", |session| {
            let stack = session.accumulator.stack();
            let centroids = match rows {
                Some(rows) => center_of_mass_rows(stack, channel, rows)?,
                None => center_of_mass(stack, channel)?,
            };
            let fit = match model {
                SineModel::WithOffset => fit_center_of_mass(&session.angles, &centroids)?,
                SineModel::NoOffset => fit_sine_no_offset(&session.angles, &centroids)?,
            };
            let residuals = fit.residuals(&session.angles, &centroids)?;
            align_center_of_mass(&mut session.accumulator, &residuals, on_projection_done)?;
            session.last_fit = Some(fit);
            Ok(CenterOfMassOutcome {
                centroids,
                fit,
                residuals,
            })
        })
    }

    /// Apply precomputed centroid corrections to a subset of projections,
    /// e.g. only those where a hotspot could be tracked.
    pub fn align_center_of_mass_subset(
        &mut self,
        indices: &[usize],
        corrections: &[f64],
    ) -> Result<()> {
        self.commit("center-of-mass subset alignment", |session| {
            align_center_of_mass_subset(&mut session.accumulator, indices, corrections, |_| {})
        })
    }

    /// Record a manual displacement of one projection.
    pub fn shift_projection(&mut self, index: usize, offset: PixelOffset) -> Result<()> {
        self.commit("manual shift", |session| {
            session.accumulator.displace(index, offset)
        })
    }

    /// Bring every listed projection to the cumulative shift stored in
    /// `table`. Projections are matched by filename; unmatched ones are left
    /// alone. Returns the number of projections updated.
    pub fn apply_alignment_table(&mut self, table: &AlignmentTable) -> Result<usize> {
        self.commit("alignment table", |session| {
            let mut applied = 0;
            for index in 0..session.filenames.len() {
                let Some(entry) = table.find(&session.filenames[index]) else {
                    warn!(filename = %session.filenames[index], "No entry in alignment table");
                    continue;
                };
                let current = session
                    .accumulator
                    .shifts()
                    .get(index)
                    .unwrap_or(PixelOffset::ZERO);
                let target = PixelOffset::new(entry.y_shift, entry.x_shift);
                session.accumulator.displace(index, target - current)?;
                applied += 1;
            }
            Ok(applied)
        })
    }

    /// Replace the angle sequence from a theta file.
    pub fn apply_theta_table(&mut self, table: &ThetaTable) -> Result<()> {
        self.commit("theta table", |session| {
            session.angles = table.angles_for(&session.filenames)?;
            Ok(())
        })
    }

    /// Stable reorder of projections, angles, filenames and shifts by
    /// ascending angle. Returns `false` without touching the history when
    /// the order is already ascending.
    pub fn sort_by_angle(&mut self) -> Result<bool> {
        let mut order: Vec<usize> = (0..self.angles.len()).collect();
        order.sort_by(|&a, &b| self.angles[a].total_cmp(&self.angles[b]));
        if order.iter().enumerate().all(|(i, &j)| i == j) {
            return Ok(false);
        }

        self.commit("sort by angle", |session| {
            session.accumulator.reorder_projections(&order)?;
            session.angles = order.iter().map(|&i| session.angles[i]).collect();
            session.filenames = order.iter().map(|&i| session.filenames[i].clone()).collect();
            Ok(())
        })?;
        Ok(true)
    }

    pub fn remove_projection(&mut self, index: usize) -> Result<()> {
        self.commit("remove projection", |session| {
            session.accumulator.remove_projection(index)?;
            session.angles.remove(index);
            session.filenames.remove(index);
            Ok(())
        })
    }

    /// Step back one operation. An empty history is reported as
    /// [`UndoOutcome::NothingToUndo`], not as an error.
    pub fn undo(&mut self) -> Result<UndoOutcome> {
        let snapshot = match self.history.undo() {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => {
                info!("Nothing to undo");
                return Ok(UndoOutcome::NothingToUndo);
            }
        };
        self.restore(snapshot)?;
        let depth = self.history.len();
        info!(depth, "Undo");
        Ok(UndoOutcome::Restored { depth })
    }

    /// Return to the stack as first loaded, with zero shifts. Recorded in
    /// the history, so it can itself be undone.
    pub fn restore_original(&mut self) -> Result<()> {
        let snapshot = self.original.clone();
        self.restore(snapshot.clone())?;
        self.history.push(snapshot);
        info!("Restored original stack");
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            stack: self.accumulator.stack().clone(),
            shifts: self.accumulator.shifts().clone(),
            angles: self.angles.clone(),
            filenames: self.filenames.clone(),
            last_fit: self.last_fit,
        }
    }

    /// Replace the live state with `snapshot`. The session is untouched if
    /// the snapshot's shifts do not match its stack.
    fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        let Snapshot {
            stack,
            shifts,
            angles,
            filenames,
            last_fit,
        } = snapshot;
        self.accumulator = ShiftAccumulator::from_parts(stack, shifts)?;
        self.angles = angles;
        self.filenames = filenames;
        self.last_fit = last_fit;
        Ok(())
    }

    fn commit<T, F>(&mut self, operation: &str, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        match op(self) {
            Ok(value) => {
                let snapshot = self.snapshot();
                self.history.push(snapshot);
                info!(operation, depth = self.history.len(), "Committed");
                Ok(value)
            }
            Err(e) => {
                warn!(operation, error = %e, "Operation failed, rolling back");
                if let Some(latest) = self.history.latest().cloned() {
                    if let Err(restore_err) = self.restore(latest) {
                        warn!(operation, error = %restore_err, "Rollback failed");
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn session(projections: usize) -> AlignmentSession {
        let stack = ProjectionStack::new(Array4::<f32>::ones((1, projections, 4, 4))).unwrap();
        let filenames = (0..projections).map(|i| format!("p{i}.tif")).collect();
        AlignmentSession::new(stack, vec![0.0; projections], filenames).unwrap()
    }

    #[test]
    fn test_restore_rejects_mismatched_snapshot() {
        let mut session = session(3);
        session.shift_projection(1, PixelOffset::new(0, 2)).unwrap();
        let mut bad = session.snapshot();
        bad.shifts = ShiftVectors::zeros(2);
        bad.angles = vec![9.0; 2];

        assert!(matches!(
            session.restore(bad),
            Err(XrfAlignError::DimensionMismatch { .. })
        ));
        assert_eq!(session.shifts().x, vec![0, 2, 0]);
        assert_eq!(session.angles(), &[0.0, 0.0, 0.0]);
    }
}
