use core::ops::{Index, IndexMut};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Ongoing,
    Won,
    Lost,
}

impl Outcome {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::Ongoing
    }
}

/// Capability set the deduction engine plays against.
///
/// Implemented by the in-memory [`SimBoard`] and by the screen-driven board of
/// the automation driver. Coordinates are `(row, col)` and must lie inside
/// [`BoardModel::size`]; mutations reject anything else before acting.
pub trait BoardModel {
    type Error: core::error::Error;

    /// `(rows, cols)`, both at least 1.
    fn size(&self) -> Coord2;

    fn cell_at(&self, coords: Coord2) -> CellState;

    /// Puts a flag on a covered cell.
    fn set_flag(&mut self, coords: Coord2) -> core::result::Result<Outcome, Self::Error>;

    /// Opens a covered cell.
    fn reveal(&mut self, coords: Coord2) -> core::result::Result<Outcome, Self::Error>;

    fn outcome(&self) -> Outcome;

    /// Mines minus flags; negative when over-flagged.
    fn mines_left(&self) -> isize;

    /// Moves made so far. Calls the model skips do not count.
    fn step_count(&self) -> u32;

    /// Reconciles any locally cached state with the real board.
    ///
    /// Models that are always consistent keep the default, which does nothing.
    fn synchronize(&mut self) -> core::result::Result<Outcome, Self::Error> {
        Ok(self.outcome())
    }

    fn rows(&self) -> Coord {
        self.size().0
    }

    fn cols(&self) -> Coord {
        self.size().1
    }

    fn neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }

    /// Unchecked plus questioned cells.
    fn covered_cells_left(&self) -> CellCount {
        let count = RowMajor::new(self.size())
            .filter(|&coords| self.cell_at(coords).is_covered())
            .count();
        CellCount::try_from(count).unwrap_or(CellCount::MAX)
    }
}

/// Full picture of a board at one moment: cells, mine counter, move counter
/// and outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub(crate) cells: Array2<CellState>,
    pub mines_left: isize,
    pub step_count: u32,
    pub outcome: Outcome,
}

impl BoardSnapshot {
    /// A board where every cell is unchecked.
    pub fn new(size: Coord2, mines_left: isize) -> Self {
        Self {
            cells: Array2::default(size.to_nd_index()),
            mines_left,
            step_count: 0,
            outcome: Outcome::Ongoing,
        }
    }

    pub fn from_cells(
        cells: Array2<CellState>,
        mines_left: isize,
        step_count: u32,
        outcome: Outcome,
    ) -> Result<Self> {
        let (rows, cols) = cells.dim();
        if rows == 0
            || cols == 0
            || rows > usize::from(Coord::MAX)
            || cols > usize::from(Coord::MAX)
        {
            return Err(GameError::InvalidBoardShape);
        }
        Ok(Self {
            cells,
            mines_left,
            step_count,
            outcome,
        })
    }

    pub fn size(&self) -> Coord2 {
        array_size(&self.cells)
    }

    pub fn cell_at(&self, coords: Coord2) -> CellState {
        self.cells[coords.to_nd_index()]
    }

    pub fn cells(&self) -> &Array2<CellState> {
        &self.cells
    }

    pub fn count_cells(&self, pred: impl Fn(CellState) -> bool) -> CellCount {
        let count = self.cells.iter().filter(|&&cell| pred(cell)).count();
        CellCount::try_from(count).unwrap_or(CellCount::MAX)
    }
}

impl Index<Coord2> for BoardSnapshot {
    type Output = CellState;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for BoardSnapshot {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.cells[coords.to_nd_index()]
    }
}
