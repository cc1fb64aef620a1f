use serde::{Deserialize, Serialize};

/// Player-visible state of a single cell.
///
/// The last three variants only appear once a round is lost.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Unchecked,
    Question,
    Flag,
    Revealed(u8),
    Mine,
    ExplodedMine,
    MisflaggedMine,
}

impl CellState {
    /// Covered and not flagged, i.e. a candidate for deduction.
    pub const fn is_covered(self) -> bool {
        matches!(self, Self::Unchecked | Self::Question)
    }

    pub const fn is_flag(self) -> bool {
        matches!(self, Self::Flag)
    }

    /// Numeric clue of a revealed cell.
    pub const fn clue(self) -> Option<u8> {
        match self {
            Self::Revealed(count) => Some(count),
            _ => None,
        }
    }

    /// Number of right clicks that turn this state into a flag.
    pub const fn clicks_to_flag(self) -> u8 {
        match self {
            Self::Unchecked => 1,
            Self::Question => 2,
            _ => 0,
        }
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Unchecked
    }
}
