//! Local, single-clue deduction.
//!
//! Every inference here comes from one revealed number and its eight
//! neighbors. Configurations that need two overlapping clues to resolve are
//! left alone: each pass is `O(rows * cols)` with constant work per cell.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deduction {
    Mine,
    NotMine,
    Unknown,
}

impl Deduction {
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// A covered cell together with what is certain about it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inference {
    pub coords: Coord2,
    pub deduction: Deduction,
}

/// Totals of a [`fixpoint_sweep`] run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub passes: u32,
    pub flagged: u32,
    pub revealed: u32,
    pub outcome: Outcome,
}

impl SweepReport {
    pub const fn mutations(&self) -> u32 {
        self.flagged + self.revealed
    }
}

/// What the clue at `coords` says about its covered neighbors.
///
/// Anything other than a `Revealed` cell yields `Unknown`.
pub fn local_cell_constraint<B: BoardModel + ?Sized>(board: &B, coords: Coord2) -> Deduction {
    let Some(clue) = board.cell_at(coords).clue() else {
        return Deduction::Unknown;
    };
    if clue > 8 {
        return Deduction::Unknown;
    }

    let mut flagged = 0u8;
    let mut covered = 0u8;
    for pos in board.neighbors(coords) {
        match board.cell_at(pos) {
            CellState::Unchecked | CellState::Question => covered += 1,
            CellState::Flag => flagged += 1,
            _ => {}
        }
    }

    if covered == 0 {
        Deduction::Unknown
    } else if clue == flagged {
        Deduction::NotMine
    } else if clue == flagged + covered {
        Deduction::Mine
    } else {
        Deduction::Unknown
    }
}

/// What the revealed neighbors of a covered cell force it to be.
///
/// The first neighbor, in neighbor order, that forces either answer wins. A
/// single clue can never force both.
pub fn neighbor_inference<B: BoardModel + ?Sized>(board: &B, coords: Coord2) -> Deduction {
    if !board.cell_at(coords).is_covered() {
        return Deduction::Unknown;
    }

    for pos in board.neighbors(coords) {
        if board.cell_at(pos).clue().is_none() {
            continue;
        }
        match local_cell_constraint(board, pos) {
            Deduction::Unknown => continue,
            known => return known,
        }
    }
    Deduction::Unknown
}

/// First classifiable covered cell in row-major order, if any.
pub fn full_board_scan<B: BoardModel + ?Sized>(board: &B) -> Option<Inference> {
    RowMajor::new(board.size()).find_map(|coords| {
        let deduction = neighbor_inference(board, coords);
        deduction.is_known().then_some(Inference { coords, deduction })
    })
}

/// Applies one inference: flags a mine, reveals a safe cell.
pub fn apply_inference<B: BoardModel + ?Sized>(
    board: &mut B,
    inference: Inference,
) -> core::result::Result<Outcome, B::Error> {
    match inference.deduction {
        Deduction::Mine => board.set_flag(inference.coords),
        Deduction::NotMine => board.reveal(inference.coords),
        Deduction::Unknown => Ok(board.outcome()),
    }
}

/// Flags and reveals everything single clues force, pass after pass, until a
/// pass changes nothing or the round is over.
///
/// The model is synchronized after every pass, which lets batched models
/// defer their screen reads to pass boundaries.
pub fn fixpoint_sweep<B: BoardModel + ?Sized>(
    board: &mut B,
) -> core::result::Result<SweepReport, B::Error> {
    let mut report = SweepReport {
        outcome: board.outcome(),
        ..SweepReport::default()
    };

    while !report.outcome.is_finished() {
        report.passes += 1;
        let before = report.mutations();

        for clue in RowMajor::new(board.size()) {
            let deduction = local_cell_constraint(board, clue);
            if !deduction.is_known() {
                continue;
            }

            let targets: SmallVec<[Coord2; 8]> = board
                .neighbors(clue)
                .filter(|&pos| board.cell_at(pos).is_covered())
                .collect();
            for pos in targets {
                if !board.cell_at(pos).is_covered() {
                    continue;
                }
                // Only moves that advanced the step counter count; a batched
                // board skips cells it already clicked this pass.
                let steps = board.step_count();
                report.outcome = match deduction {
                    Deduction::Mine => board.set_flag(pos)?,
                    _ => board.reveal(pos)?,
                };
                if board.step_count() != steps {
                    match deduction {
                        Deduction::Mine => report.flagged += 1,
                        _ => report.revealed += 1,
                    }
                }
                if report.outcome.is_finished() {
                    log::debug!("Sweep stopped at {:?}: {:?}", pos, report.outcome);
                    return Ok(report);
                }
            }
        }

        report.outcome = board.synchronize()?;
        log::trace!(
            "Sweep pass {} made {} moves",
            report.passes,
            report.mutations() - before
        );
        if report.mutations() == before {
            break;
        }
    }

    log::debug!(
        "Sweep finished after {} passes: {} flagged, {} revealed, {:?}",
        report.passes,
        report.flagged,
        report.revealed,
        report.outcome
    );
    Ok(report)
}
