use thiserror::Error;

use crate::Coord2;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("cell {0:?} lies outside the board")]
    InvalidCoords(Coord2),
    #[error("more mines than cells")]
    TooManyMines,
    #[error("cell grid does not match the declared board size")]
    InvalidBoardShape,
    #[error("round is over, no further moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = core::result::Result<T, GameError>;
