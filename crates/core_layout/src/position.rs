//! Logical grid slots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical (column, row) slot in a grid, independent of pixel placement.
///
/// Positions are immutable; neighbor queries return new values. `up` and
/// `left` return `None` on the top row and first column respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub col: usize,
    pub row: usize,
}

impl GridPosition {
    /// Create a new grid position.
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Position of the `index`-th item in a grid with `cols_in_row` columns.
    ///
    /// Returns `None` when `cols_in_row` is zero.
    pub fn from_index(index: usize, cols_in_row: usize) -> Option<Self> {
        if cols_in_row == 0 {
            return None;
        }
        Some(Self::new(index % cols_in_row, index / cols_in_row))
    }

    /// Linear sequence index for a grid with `cols_in_row` columns.
    ///
    /// Meaningless for `cols_in_row == 0`; callers guard against a degraded grid.
    pub fn to_index(&self, cols_in_row: usize) -> usize {
        self.row * cols_in_row + self.col
    }

    /// The slot above, or `None` on the top row.
    pub fn up(&self) -> Option<Self> {
        self.row.checked_sub(1).map(|row| Self::new(self.col, row))
    }

    /// The slot below.
    pub fn down(&self) -> Self {
        Self::new(self.col, self.row + 1)
    }

    /// The slot to the left, or `None` in the first column.
    pub fn left(&self) -> Option<Self> {
        self.col.checked_sub(1).map(|col| Self::new(col, self.row))
    }

    /// The slot to the right.
    pub fn right(&self) -> Self {
        Self::new(self.col + 1, self.row)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col: {}, row: {}", self.col, self.row)
    }
}
