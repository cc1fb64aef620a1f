use std::path::PathBuf;

use mineagent_core::{Coord2, GameError};
use thiserror::Error;

use crate::Color;

#[derive(Error, Debug)]
pub enum DriverError {
    /// The window is gone, moved mid-sequence, resized or covered.
    #[error("minesweeper window is obstructed, moved or closed{}", artifact_note(.artifact))]
    Obstructed { artifact: Option<PathBuf> },
    /// Pixels that match none of the known renderings.
    #[error("cannot recognize cell {coords:?} (primary sample {color})")]
    UnrecognizedCell { coords: Coord2, color: Color },
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("screen capture failed: {0}")]
    Capture(String),
    #[error("pointer input failed: {0}")]
    Input(String),
    #[error("invalid theme: {0}")]
    Theme(#[from] toml::de::Error),
    #[error("theme out of range: {0}")]
    ThemeRange(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl DriverError {
    pub(crate) fn obstructed() -> Self {
        Self::Obstructed { artifact: None }
    }

    /// Both fatal kinds end the session; nothing is retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Obstructed { .. } | Self::UnrecognizedCell { .. })
    }
}

fn artifact_note(artifact: &Option<PathBuf>) -> String {
    match artifact {
        Some(path) => format!(", suspect region saved to {}", path.display()),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
