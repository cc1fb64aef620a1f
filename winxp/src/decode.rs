//! Reading cells, the mine counter and the status face off a panel capture.
//!
//! Every reader samples a handful of fixed pixels. A combination that matches
//! no known rendering is an error; nothing here guesses.

use mineagent_core::{BoardSnapshot, CellState, Coord, Coord2, Outcome, RowMajor};

use crate::{Color, DriverError, Rect, Result, ScreenCapture, Theme};

/// Panel-relative view of a capture.
#[derive(Copy, Clone, Debug)]
pub struct Panel<'a> {
    capture: &'a ScreenCapture,
    rect: Rect,
}

impl<'a> Panel<'a> {
    pub fn new(capture: &'a ScreenCapture, rect: Rect) -> Self {
        Self { capture, rect }
    }

    /// The whole capture is the panel.
    pub fn whole(capture: &'a ScreenCapture) -> Self {
        Self::new(capture, capture.bounds())
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn at(&self, x: u32, y: u32) -> Option<Color> {
        self.capture.pixel(
            i64::from(self.rect.x) + i64::from(x),
            i64::from(self.rect.y) + i64::from(y),
        )
    }

    pub fn is(&self, (x, y): (u32, u32), color: Color) -> bool {
        self.at(x, y) == Some(color)
    }
}

/// Rows and columns of cells a panel holds, `None` if it holds none.
pub fn grid_size(theme: &Theme, width: u32, height: u32) -> Option<Coord2> {
    let (rows, cols) = theme.layout.grid_size(width, height);
    let rows = Coord::try_from(rows).ok().filter(|&rows| rows > 0)?;
    let cols = Coord::try_from(cols).ok().filter(|&cols| cols > 0)?;
    Some((rows, cols))
}

pub fn decode_cell(panel: &Panel<'_>, theme: &Theme, coords: Coord2) -> Result<CellState> {
    let palette = &theme.palette;
    let probes = &theme.layout.cell_probes;
    let (cx, cy) = theme.layout.cell_origin(coords);
    let sample = |(dx, dy): (u32, u32)| (cx.saturating_add(dx), cy.saturating_add(dy));
    let is = |probe: (u32, u32), color: Color| panel.is(sample(probe), color);

    let (px, py) = sample(probes.primary);
    let primary = panel.at(px, py).ok_or_else(DriverError::obstructed)?;

    let state = if primary == palette.cover {
        if is(probes.bevel, palette.highlight) {
            if is(probes.mark, palette.alert) {
                CellState::Flag
            } else {
                CellState::Unchecked
            }
        } else if is(probes.seven, palette.ink) {
            CellState::Revealed(7)
        } else {
            CellState::Revealed(0)
        }
    } else if primary == palette.ink {
        if is(probes.mark, palette.cover) {
            CellState::Question
        } else if is(probes.burst, palette.alert) {
            CellState::ExplodedMine
        } else {
            CellState::Mine
        }
    } else if primary == palette.alert && is(probes.cross, palette.ink) {
        CellState::MisflaggedMine
    } else {
        match numeral(theme, primary) {
            Some(clue) => CellState::Revealed(clue),
            None => return Err(DriverError::UnrecognizedCell { coords, color: primary }),
        }
    };
    Ok(state)
}

/// Clue whose numeral is drawn in `color`. Seven shares the ink color and is
/// recognized by shape instead.
fn numeral(theme: &Theme, color: Color) -> Option<u8> {
    theme
        .palette
        .numerals
        .iter()
        .zip(1u8..)
        .filter(|&(_, clue)| clue != 7)
        .find(|&(&numeral, _)| numeral == color)
        .map(|(_, clue)| clue)
}

/// Lit segments of one counter digit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Segments {
    pub top: bool,
    pub middle: bool,
    pub bottom: bool,
    pub upper_left: bool,
    pub lower_left: bool,
    pub upper_right: bool,
    pub lower_right: bool,
}

impl Segments {
    pub fn sample(panel: &Panel<'_>, theme: &Theme, (left, top): (u32, u32)) -> Self {
        let probes = &theme.layout.counter.segments;
        let lit = |(dx, dy): (u32, u32)| {
            let at = (left.saturating_add(dx), top.saturating_add(dy));
            panel.is(at, theme.palette.led_on)
        };
        Self {
            top: lit(probes.top),
            middle: lit(probes.middle),
            bottom: lit(probes.bottom),
            upper_left: lit(probes.upper_left),
            lower_left: lit(probes.lower_left),
            upper_right: lit(probes.upper_right),
            lower_right: lit(probes.lower_right),
        }
    }

    /// The minus sign the counter shows in front of a negative count.
    pub fn is_minus(&self) -> bool {
        *self
            == Self {
                middle: true,
                ..Self::default()
            }
    }

    /// Digit by elimination: each step splits off the digits that a single
    /// segment tells apart from all the remaining ones.
    pub fn digit(&self) -> u8 {
        if !self.lower_right {
            return 2;
        }
        if self.lower_left {
            return match (self.upper_right, self.middle) {
                (false, _) => 6,
                (true, true) => 8,
                (true, false) => 0,
            };
        }
        if !self.upper_right {
            return 5;
        }
        if self.bottom {
            return if self.upper_left { 9 } else { 3 };
        }
        if self.middle {
            4
        } else if self.top {
            7
        } else {
            1
        }
    }
}

/// The mine counter. A leading minus makes the two remaining digits negative.
pub fn read_counter(panel: &Panel<'_>, theme: &Theme) -> isize {
    let [hundreds, tens, ones] = theme
        .layout
        .counter
        .digits
        .map(|origin| Segments::sample(panel, theme, origin));

    let low = isize::from(tens.digit()) * 10 + isize::from(ones.digit());
    if hundreds.is_minus() {
        -low
    } else {
        isize::from(hundreds.digit()) * 100 + low
    }
}

pub fn read_outcome(panel: &Panel<'_>, theme: &Theme) -> Outcome {
    let face = &theme.layout.face;
    let middle = panel.rect().width / 2;

    if panel.is((middle, face.lost_row), theme.palette.ink) {
        Outcome::Lost
    } else if panel.is((middle, face.won_row), theme.palette.ink) {
        Outcome::Won
    } else {
        Outcome::Ongoing
    }
}

/// Every cell, the counter and the face. The step counter is left at zero for
/// the caller to fill in.
pub fn decode_board(panel: &Panel<'_>, theme: &Theme) -> Result<BoardSnapshot> {
    let rect = panel.rect();
    let size = grid_size(theme, rect.width, rect.height).ok_or_else(DriverError::obstructed)?;

    let mut snapshot = BoardSnapshot::new(size, read_counter(panel, theme));
    for coords in RowMajor::new(size) {
        snapshot[coords] = decode_cell(panel, theme, coords)?;
    }
    snapshot.outcome = read_outcome(panel, theme);

    log::trace!(
        "Decoded {:?} board: {} covered, counter {}, {:?}",
        size,
        snapshot.count_cells(CellState::is_covered),
        snapshot.mines_left,
        snapshot.outcome
    );
    Ok(snapshot)
}
