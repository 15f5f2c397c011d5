use super::super::domain::ReviewId;
use super::AxisScoreResult;
use serde::{Deserialize, Serialize};

const GRID_MIN: f64 = 1.0;
const GRID_MAX: f64 = 3.0;

/// Maps a composite axis score onto the 1..=3 grid bucket.
///
/// Midpoints round up (2.5 lands in 3). Anything outside `[1, 3]`, including the 0 of an
/// empty axis, is clamped; non-finite input falls into the lowest bucket.
pub fn grid_position(score: f64) -> u8 {
    if !score.is_finite() {
        return GRID_MIN as u8;
    }
    score.round().clamp(GRID_MIN, GRID_MAX) as u8
}

/// Position of one review on the 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// Column, from the goal axis.
    pub what: u8,
    /// Row, from the competency axis.
    pub how: u8,
}

impl GridCell {
    pub fn from_results(what: &AxisScoreResult, how: &AxisScoreResult) -> Self {
        Self {
            what: what.grid_position(),
            how: how.grid_position(),
        }
    }

    fn index(&self) -> Option<(usize, usize)> {
        let valid = 1..=3;
        if valid.contains(&self.what) && valid.contains(&self.how) {
            Some((usize::from(self.how - 1), usize::from(self.what - 1)))
        } else {
            None
        }
    }
}

/// Review placed on the team grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlacement {
    pub review_id: ReviewId,
    pub cell: GridCell,
}

/// Team-wide cell counts; `cells[how - 1][what - 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceGrid {
    pub cells: [[u32; 3]; 3],
}

impl PerformanceGrid {
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = GridCell>,
    {
        let mut grid = Self::default();
        for cell in cells {
            grid.record(cell);
        }
        grid
    }

    /// Counts one review; cells outside the matrix are ignored.
    pub fn record(&mut self, cell: GridCell) {
        if let Some((row, column)) = cell.index() {
            self.cells[row][column] = self.cells[row][column].saturating_add(1);
        }
    }

    pub fn count(&self, what: u8, how: u8) -> u32 {
        GridCell { what, how }
            .index()
            .map(|(row, column)| self.cells[row][column])
            .unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.cells.iter().flatten().sum()
    }
}
