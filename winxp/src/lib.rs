//! Plays the Windows XP `winmine.exe` through screenshots and synthetic
//! mouse input.
//!
//! [`LiveBoard`] finds the game window by the pixel signature of its status
//! face, decodes cells, mine counter and face from captures, and turns
//! [`BoardModel`](mineagent_core::BoardModel) calls into clicks. The screen
//! and the pointer sit behind the [`Screen`] and [`Pointer`] traits; the real
//! desktop backends need the `live` feature.

pub use capture::*;
pub use driver::*;
pub use error::*;
pub use input::*;
pub use theme::*;

mod capture;
pub mod decode;
mod driver;
mod error;
mod input;
pub mod locate;
mod theme;

#[cfg(test)]
mod testing;
