//! Progress reporting types for running operation trees.

use serde::{Deserialize, Serialize};

/// Leaf counts of a running operation tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionProgress {
    /// Number of leaves in the tree.
    pub total: usize,
    /// Leaves that completed successfully.
    pub completed: usize,
    /// Leaves that failed.
    pub failed: usize,
    /// Leaves that never started because a dependency failed or the
    /// handle was cancelled.
    pub skipped: usize,
    /// Label of the most recently started leaf.
    pub current: Option<String>,
}

impl ExecutionProgress {
    /// Create a new progress tracker for a tree with `total` leaves.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.finished() as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Leaves that reached an end state, including skipped ones.
    pub fn finished(&self) -> usize {
        self.completed + self.failed + self.skipped
    }

    /// Check if any leaf failed.
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.failed == 0 && self.skipped == 0 {
            format!("{} of {} operations done", self.completed, self.total)
        } else {
            format!(
                "{} of {} operations done, {} failed, {} skipped",
                self.completed, self.total, self.failed, self.skipped
            )
        }
    }

    pub(crate) fn start_leaf(&mut self, label: &str) {
        self.current = Some(label.to_string());
    }

    pub(crate) fn complete_leaf(&mut self) {
        self.completed += 1;
    }

    pub(crate) fn fail_leaf(&mut self) {
        self.failed += 1;
    }

    pub(crate) fn skip_leaves(&mut self, count: usize) {
        self.skipped += count;
    }
}
