use alloc::collections::{BTreeSet, VecDeque};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Complete single-player game kept entirely in memory.
///
/// Behaves like the legacy desktop game it stands in for: right clicks cycle
/// flag and question marks, zero cells flood-fill, a loss uncovers every mine
/// and marks wrong flags, a win flags every remaining mine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimBoard {
    mine_layout: MineLayout,
    board: Array2<CellState>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    step_count: u32,
    outcome: Outcome,
}

impl SimBoard {
    pub fn new(mine_layout: MineLayout) -> Self {
        let size = mine_layout.size();
        Self {
            mine_layout,
            board: Array2::default(size.to_nd_index()),
            revealed_count: 0,
            flagged_count: 0,
            step_count: 0,
            outcome: Outcome::Ongoing,
        }
    }

    pub fn mine_layout(&self) -> &MineLayout {
        &self.mine_layout
    }

    pub fn total_mines(&self) -> CellCount {
        self.mine_layout.mine_count()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            cells: self.board.clone(),
            mines_left: self.mines_left(),
            step_count: self.step_count,
            outcome: self.outcome,
        }
    }

    /// Right click: Unchecked -> Flag -> Question -> Unchecked.
    pub fn toggle_mark(&mut self, coords: Coord2) -> Result<Outcome> {
        use CellState::*;

        let coords = self.validate(coords)?;
        self.check_ongoing()?;

        let next = match self.board[coords.to_nd_index()] {
            Unchecked => {
                self.flagged_count += 1;
                Flag
            }
            Flag => {
                self.flagged_count -= 1;
                Question
            }
            Question => Unchecked,
            _ => return Ok(self.outcome),
        };
        self.board[coords.to_nd_index()] = next;
        self.step_count += 1;
        Ok(self.outcome)
    }

    /// Middle click: opens every covered neighbor of a satisfied clue.
    pub fn chord(&mut self, coords: Coord2) -> Result<Outcome> {
        let coords = self.validate(coords)?;
        self.check_ongoing()?;

        let CellState::Revealed(count) = self.board[coords.to_nd_index()] else {
            return Ok(self.outcome);
        };
        if count != self.count_flagged_neighbors(coords) {
            return Ok(self.outcome);
        }

        self.step_count += 1;
        for pos in self.mine_layout.iter_neighbors(coords) {
            if self.board[pos.to_nd_index()].is_covered() {
                self.open_cell(pos);
            }
            if self.outcome.is_finished() {
                break;
            }
        }
        Ok(self.outcome)
    }

    fn open_cell(&mut self, coords: Coord2) {
        if self.mine_layout[coords] {
            self.board[coords.to_nd_index()] = CellState::ExplodedMine;
            log::debug!("Mine hit at {:?}", coords);
            self.end_round(false);
            return;
        }

        let mut visited = BTreeSet::from([coords]);
        let mut to_visit = VecDeque::from([coords]);

        while let Some(visit_coords) = to_visit.pop_front() {
            let adjacent_mines = self.mine_layout.adjacent_mine_count(visit_coords);
            self.board[visit_coords.to_nd_index()] = CellState::Revealed(adjacent_mines);
            self.revealed_count += 1;
            log::trace!("Opened {:?}, adjacent mines: {}", visit_coords, adjacent_mines);

            if adjacent_mines == 0 {
                for pos in self.mine_layout.iter_neighbors(visit_coords) {
                    if self.board[pos.to_nd_index()].is_covered() && visited.insert(pos) {
                        to_visit.push_back(pos);
                    }
                }
            }
        }

        if self.revealed_count == self.mine_layout.safe_cell_count() {
            self.end_round(true);
        }
    }

    fn end_round(&mut self, won: bool) {
        use CellState::*;

        self.outcome = if won { Outcome::Won } else { Outcome::Lost };
        log::debug!("Round ended: {:?} after {} steps", self.outcome, self.step_count);

        for coords in RowMajor::new(self.size()) {
            let cell = self.board[coords.to_nd_index()];
            let next = match (cell, self.mine_layout[coords], won) {
                (Unchecked | Question, true, true) => {
                    self.flagged_count += 1;
                    Flag
                }
                (Unchecked | Question, true, false) => Mine,
                (Flag, false, false) => MisflaggedMine,
                _ => continue,
            };
            self.board[coords.to_nd_index()] = next;
        }
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        let mut count = 0;
        for pos in self.mine_layout.iter_neighbors(coords) {
            if self.board[pos.to_nd_index()].is_flag() {
                count += 1;
            }
        }
        count
    }

    fn validate(&self, coords: Coord2) -> Result<Coord2> {
        validate_coords(coords, self.size())
    }

    fn check_ongoing(&self) -> Result<()> {
        if self.outcome.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

impl BoardModel for SimBoard {
    type Error = GameError;

    fn size(&self) -> Coord2 {
        self.mine_layout.size()
    }

    fn cell_at(&self, coords: Coord2) -> CellState {
        self.board[coords.to_nd_index()]
    }

    fn set_flag(&mut self, coords: Coord2) -> Result<Outcome> {
        let coords = self.validate(coords)?;
        self.check_ongoing()?;

        if self.board[coords.to_nd_index()].is_covered() {
            self.board[coords.to_nd_index()] = CellState::Flag;
            self.flagged_count += 1;
            self.step_count += 1;
        }
        Ok(self.outcome)
    }

    fn reveal(&mut self, coords: Coord2) -> Result<Outcome> {
        let coords = self.validate(coords)?;
        self.check_ongoing()?;

        if self.board[coords.to_nd_index()].is_covered() {
            self.step_count += 1;
            self.open_cell(coords);
        }
        Ok(self.outcome)
    }

    fn outcome(&self) -> Outcome {
        self.outcome
    }

    fn mines_left(&self) -> isize {
        self.mine_layout.mine_count() as isize - self.flagged_count as isize
    }

    fn step_count(&self) -> u32 {
        self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(size: Coord2, mines: &[Coord2]) -> MineLayout {
        MineLayout::from_mine_coords(size, mines).unwrap()
    }

    #[test]
    fn reveal_mine_loses_and_uncovers_layout() {
        let mut board = SimBoard::new(layout((2, 3), &[(0, 0), (1, 2)]));
        board.set_flag((0, 1)).unwrap();

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, Outcome::Lost);
        assert_eq!(board.cell_at((0, 0)), CellState::ExplodedMine);
        assert_eq!(board.cell_at((1, 2)), CellState::Mine);
        assert_eq!(board.cell_at((0, 1)), CellState::MisflaggedMine);
        assert_eq!(board.reveal((1, 1)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn reveal_zero_flood_fills_and_wins() {
        let mut board = SimBoard::new(layout((3, 3), &[(2, 2)]));

        let outcome = board.reveal((0, 0)).unwrap();

        assert_eq!(outcome, Outcome::Won);
        assert_eq!(board.cell_at((0, 0)), CellState::Revealed(0));
        assert_eq!(board.cell_at((1, 1)), CellState::Revealed(1));
        assert_eq!(board.cell_at((2, 2)), CellState::Flag);
        assert_eq!(board.mines_left(), 0);
        assert_eq!(board.step_count(), 1);
    }

    #[test]
    fn flood_fill_stops_at_flags() {
        let mut board = SimBoard::new(layout((1, 5), &[(0, 4)]));
        board.set_flag((0, 1)).unwrap();

        board.reveal((0, 0)).unwrap();

        assert_eq!(board.cell_at((0, 1)), CellState::Flag);
        assert_eq!(board.cell_at((0, 2)), CellState::Unchecked);
        assert_eq!(board.outcome(), Outcome::Ongoing);
    }

    #[test]
    fn toggle_mark_cycles_like_right_click() {
        let mut board = SimBoard::new(layout((2, 2), &[(1, 1)]));

        board.toggle_mark((0, 0)).unwrap();
        assert_eq!(board.cell_at((0, 0)), CellState::Flag);
        assert_eq!(board.mines_left(), 0);

        board.toggle_mark((0, 0)).unwrap();
        assert_eq!(board.cell_at((0, 0)), CellState::Question);
        assert_eq!(board.mines_left(), 1);

        board.toggle_mark((0, 0)).unwrap();
        assert_eq!(board.cell_at((0, 0)), CellState::Unchecked);
        assert_eq!(board.step_count(), 3);
    }

    #[test]
    fn over_flagging_drives_counter_negative() {
        let mut board = SimBoard::new(layout((2, 2), &[(1, 1)]));

        board.set_flag((0, 0)).unwrap();
        board.set_flag((0, 1)).unwrap();

        assert_eq!(board.mines_left(), -1);
    }

    #[test]
    fn chord_opens_neighbors_of_satisfied_clue() {
        let mut board = SimBoard::new(layout((3, 3), &[(0, 1), (2, 1)]));
        board.reveal((1, 1)).unwrap();
        board.set_flag((0, 1)).unwrap();
        board.set_flag((2, 1)).unwrap();

        let outcome = board.chord((1, 1)).unwrap();

        assert_eq!(outcome, Outcome::Won);
        assert_eq!(board.cell_at((1, 0)), CellState::Revealed(2));
        assert_eq!(board.cell_at((1, 2)), CellState::Revealed(2));
    }

    #[test]
    fn mutations_reject_out_of_range_coords() {
        let mut board = SimBoard::new(layout((2, 2), &[(1, 1)]));

        assert_eq!(board.reveal((2, 0)), Err(GameError::InvalidCoords((2, 0))));
        assert_eq!(board.set_flag((0, 7)), Err(GameError::InvalidCoords((0, 7))));
        assert_eq!(board.step_count(), 0);
    }
}
