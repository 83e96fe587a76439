//! Bankroll path construction.
//!
//! Every path carries the starting bankroll as column 0, so any
//! metric that scans a row sees the start as well as mid-path dips
//! the path later recovers from.

use crate::{distribution::StepMatrix, types::Money};

/// iterations × (steps + 1) bankroll levels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatrix {
    start:      Money,
    iterations: usize,
    width:      usize,
    levels:     Vec<f64>,
}

impl PathMatrix {
    /// start + running sum of each row of `steps`.
    pub fn simulate(start: Money, steps: &StepMatrix) -> Self {
        let width = steps.steps() + 1;
        let mut levels = Vec::with_capacity(steps.iterations() * width);
        for i in 0..steps.iterations() {
            let mut bankroll = start;
            levels.push(bankroll);
            for step in steps.row(i) {
                bankroll += step;
                levels.push(bankroll);
            }
        }
        Self {
            start,
            iterations: steps.iterations(),
            width,
            levels,
        }
    }

    pub fn start(&self) -> Money {
        self.start
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Simulated steps, not counting the start column.
    pub fn steps(&self) -> usize {
        self.width - 1
    }

    /// Full trajectory of one path, start included.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.levels[i * self.width..(i + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.levels.chunks(self.width)
    }

    /// Bankroll of every path at `step` (0 = start).
    pub fn column(&self, step: usize) -> Vec<f64> {
        self.rows().map(|row| row[step]).collect()
    }

    pub fn endings(&self) -> Vec<f64> {
        self.column(self.width - 1)
    }

    pub fn ending_pnl(&self) -> Vec<f64> {
        self.rows().map(|row| row[self.width - 1] - self.start).collect()
    }
}
