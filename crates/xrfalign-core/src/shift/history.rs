use std::collections::VecDeque;

use tracing::debug;

use crate::align::SineFit;
use crate::consts::HISTORY_CAPACITY;
use crate::error::{Result, XrfAlignError};
use crate::projection::ProjectionStack;

use super::ShiftVectors;

/// Deep copy of the session state after one data-modifying operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub stack: ProjectionStack,
    pub shifts: ShiftVectors,
    pub angles: Vec<f64>,
    pub filenames: Vec<String>,
    /// Fit of the last center-of-mass pass that produced this state.
    pub last_fit: Option<SineFit>,
}

/// Bounded undo buffer. The newest snapshot always mirrors the live state;
/// undo drops it and exposes the one before.
#[derive(Clone, Debug)]
pub struct AlignmentHistory {
    snapshots: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for AlignmentHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl AlignmentHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// True when at least one step can be undone.
    pub fn can_undo(&self) -> bool {
        self.snapshots.len() >= 2
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    pub fn oldest(&self) -> Option<&Snapshot> {
        self.snapshots.front()
    }

    /// Append a snapshot, evicting the oldest one once over capacity.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push_back(snapshot);
        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
            debug!(capacity = self.capacity, "History full, evicted oldest snapshot");
        }
    }

    /// Drop the newest snapshot and return the one that is now current.
    pub fn undo(&mut self) -> Result<&Snapshot> {
        if !self.can_undo() {
            return Err(XrfAlignError::NothingToUndo);
        }
        self.snapshots.pop_back();
        self.snapshots.back().ok_or(XrfAlignError::NothingToUndo)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
