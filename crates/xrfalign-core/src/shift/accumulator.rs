use serde::{Deserialize, Serialize};

use crate::error::{Result, XrfAlignError};
use crate::projection::{validate_permutation, PixelOffset, ProjectionStack};

/// Cumulative displacement of every projection since the stack was loaded.
///
/// Entry `i` is the total displacement that has been removed from projection
/// `i`: the live projection equals the loaded one rolled by `(-y[i], -x[i])`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftVectors {
    pub x: Vec<i64>,
    pub y: Vec<i64>,
}

impl ShiftVectors {
    pub fn zeros(projections: usize) -> Self {
        Self {
            x: vec![0; projections],
            y: vec![0; projections],
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<PixelOffset> {
        Some(PixelOffset::new(*self.y.get(index)?, *self.x.get(index)?))
    }

    /// Largest absolute `(x, y)` shift over all projections.
    pub fn max_abs(&self) -> (i64, i64) {
        let max_x = self.x.iter().map(|v| v.abs()).max().unwrap_or(0);
        let max_y = self.y.iter().map(|v| v.abs()).max().unwrap_or(0);
        (max_x, max_y)
    }

    fn add(&mut self, index: usize, offset: PixelOffset) {
        self.y[index] += offset.dy;
        self.x[index] += offset.dx;
    }

    fn remove(&mut self, index: usize) {
        self.x.remove(index);
        self.y.remove(index);
    }

    fn reorder(&mut self, order: &[usize]) {
        self.x = order.iter().map(|&i| self.x[i]).collect();
        self.y = order.iter().map(|&i| self.y[i]).collect();
    }
}

/// Exclusive owner of the projection stack and its cumulative shifts.
///
/// Every geometric correction goes through [`ShiftAccumulator::displace`],
/// which rolls all channels of a projection in lockstep and adds the
/// displacement to that projection's cumulative shift.
#[derive(Clone, Debug)]
pub struct ShiftAccumulator {
    stack: ProjectionStack,
    shifts: ShiftVectors,
}

impl ShiftAccumulator {
    /// Wrap an unshifted stack; all cumulative shifts start at zero.
    pub fn new(stack: ProjectionStack) -> Self {
        let shifts = ShiftVectors::zeros(stack.projections());
        Self { stack, shifts }
    }

    pub fn from_parts(stack: ProjectionStack, shifts: ShiftVectors) -> Result<Self> {
        let n = stack.projections();
        if shifts.x.len() != n || shifts.y.len() != n {
            return Err(XrfAlignError::DimensionMismatch {
                expected: vec![n, n],
                found: vec![shifts.x.len(), shifts.y.len()],
            });
        }
        Ok(Self { stack, shifts })
    }

    pub fn stack(&self) -> &ProjectionStack {
        &self.stack
    }

    pub fn shifts(&self) -> &ShiftVectors {
        &self.shifts
    }

    pub fn projections(&self) -> usize {
        self.stack.projections()
    }

    pub fn into_parts(self) -> (ProjectionStack, ShiftVectors) {
        (self.stack, self.shifts)
    }

    /// Record that projection `index` is displaced by `offset` and remove
    /// that displacement by rolling every channel by `-offset`.
    pub fn displace(&mut self, index: usize, offset: PixelOffset) -> Result<()> {
        self.stack.roll_projection(index, -offset.dy, -offset.dx)?;
        self.shifts.add(index, offset);
        Ok(())
    }

    pub(crate) fn remove_projection(&mut self, index: usize) -> Result<()> {
        self.stack.remove_projection(index)?;
        self.shifts.remove(index);
        Ok(())
    }

    pub(crate) fn reorder_projections(&mut self, order: &[usize]) -> Result<()> {
        validate_permutation(order, self.projections())?;
        self.stack.reorder_projections(order)?;
        self.shifts.reorder(order);
        Ok(())
    }
}
