//! Colors and pixel offsets of the one supported visual theme.
//!
//! Every literal the locator and decoders sample lives here, so a different
//! display scale or skin is a data change. The built-in values describe the
//! Windows XP `winmine.exe` at 100% scale; a TOML file can override any
//! subset of them.

use std::fmt;
use std::path::Path;

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::{DriverError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        Self(pixel.0)
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb(color.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

const BLACK: Color = Color::rgb(0, 0, 0);
const WHITE: Color = Color::rgb(255, 255, 255);
const GRAY: Color = Color::rgb(128, 128, 128);
const SILVER: Color = Color::rgb(192, 192, 192);
const RED: Color = Color::rgb(255, 0, 0);
const YELLOW: Color = Color::rgb(255, 255, 0);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Status face fill.
    pub face: Color,
    /// Outlines, mines, the numeral 7.
    pub ink: Color,
    /// Sunken edges, the numeral 8.
    pub shadow: Color,
    /// Raised edges.
    pub highlight: Color,
    /// Cell background, covered or open.
    pub cover: Color,
    /// Flags, the exploded-mine background and the wrong-flag cross.
    pub alert: Color,
    /// Lit counter segment.
    pub led_on: Color,
    /// Numeral colors for clues 1 to 8.
    pub numerals: [Color; 8],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            face: YELLOW,
            ink: BLACK,
            shadow: GRAY,
            highlight: WHITE,
            cover: SILVER,
            alert: RED,
            led_on: RED,
            numerals: [
                Color::rgb(0, 0, 255),
                Color::rgb(0, 128, 0),
                RED,
                Color::rgb(0, 0, 128),
                Color::rgb(128, 0, 0),
                Color::rgb(0, 128, 128),
                BLACK,
                GRAY,
            ],
        }
    }
}

/// Which palette entry a border probe expects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Shadow,
    Highlight,
}

/// A pixel of the panel frame. Negative coordinates count from the right or
/// bottom edge, `-1` being the last column or row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeProbe {
    pub x: i32,
    pub y: i32,
    pub tone: Tone,
}

impl EdgeProbe {
    const fn new(x: i32, y: i32, tone: Tone) -> Self {
        Self { x, y, tone }
    }

    /// Absolute position inside a panel of `width` × `height`.
    pub fn resolve(self, width: u32, height: u32) -> (i64, i64) {
        let wrap = |value: i32, extent: u32| {
            if value < 0 {
                i64::from(extent) + i64::from(value)
            } else {
                i64::from(value)
            }
        };
        (wrap(self.x, width), wrap(self.y, height))
    }
}

/// Sample points inside one cell block, relative to its top-left pixel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellProbes {
    /// Picks the category: cover, numeral, ink or alert.
    pub primary: (u32, u32),
    /// Raised-bevel corner, highlight only while covered.
    pub bevel: (u32, u32),
    /// Flag cloth on a covered cell, background of the question mark.
    pub mark: (u32, u32),
    /// Top stroke of the numeral 7.
    pub seven: (u32, u32),
    /// Ink under the cross drawn over a wrong flag.
    pub cross: (u32, u32),
    /// Background next to the mine, alert when it exploded.
    pub burst: (u32, u32),
}

impl Default for CellProbes {
    fn default() -> Self {
        Self {
            primary: (7, 8),
            bevel: (0, 0),
            mark: (7, 7),
            seven: (3, 3),
            cross: (6, 8),
            burst: (1, 1),
        }
    }
}

/// The seven segment samples of one counter digit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentProbes {
    pub top: (u32, u32),
    pub middle: (u32, u32),
    pub bottom: (u32, u32),
    pub upper_left: (u32, u32),
    pub lower_left: (u32, u32),
    pub upper_right: (u32, u32),
    pub lower_right: (u32, u32),
}

impl Default for SegmentProbes {
    fn default() -> Self {
        Self {
            top: (5, 1),
            middle: (5, 10),
            bottom: (5, 19),
            upper_left: (1, 5),
            lower_left: (1, 15),
            upper_right: (9, 5),
            lower_right: (9, 15),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterLayout {
    /// Top-left corners of the hundreds, tens and ones digits.
    pub digits: [(u32, u32); 3],
    pub segments: SegmentProbes,
}

impl Default for CounterLayout {
    fn default() -> Self {
        Self {
            digits: [(9, 8), (22, 8), (35, 8)],
            segments: SegmentProbes::default(),
        }
    }
}

/// The status face, which doubles as the anchor for finding the window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceLayout {
    /// Offsets from the face center that must be ink.
    pub ring: Vec<(i32, i32)>,
    /// Offsets from the face center that must be face color.
    pub fill: Vec<(i32, i32)>,
    /// Face center row minus panel top row.
    pub center_row: u32,
    /// Rows below the face center of the shadow line walked for the panel width.
    pub edge_row: u32,
    /// Panel row, at the horizontal middle, that is ink on a lost face.
    pub lost_row: u32,
    /// Panel row, at the horizontal middle, that is ink on a won face.
    pub won_row: u32,
}

impl Default for FaceLayout {
    fn default() -> Self {
        Self {
            ring: vec![(-8, 0), (0, -8), (8, 0), (0, 8)],
            fill: vec![(-7, 1), (0, -7), (7, 1), (0, 7)],
            center_row: 19,
            edge_row: 24,
            lost_row: 21,
            won_row: 16,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Side of a square cell block in pixels.
    pub cell_size: u32,
    /// Top-left pixel of cell (0, 0) inside the panel.
    pub board_origin: (u32, u32),
    /// Frame width right of and below the cell grid.
    pub board_margin: u32,
    /// Where inside a cell block clicks land.
    pub click_offset: (u32, u32),
    pub cell_probes: CellProbes,
    pub counter: CounterLayout,
    pub face: FaceLayout,
    /// Frame signature that must hold before a cached window position is trusted.
    pub border: Vec<EdgeProbe>,
}

impl Default for Layout {
    fn default() -> Self {
        use Tone::*;

        Self {
            cell_size: 16,
            board_origin: (3, 46),
            board_margin: 3,
            click_offset: (7, 7),
            cell_probes: CellProbes::default(),
            counter: CounterLayout::default(),
            face: FaceLayout::default(),
            border: vec![
                EdgeProbe::new(0, 0, Shadow),
                EdgeProbe::new(-1, 1, Highlight),
                EdgeProbe::new(-2, 0, Shadow),
                EdgeProbe::new(-1, -1, Highlight),
                EdgeProbe::new(1, -1, Highlight),
                EdgeProbe::new(0, -2, Shadow),
            ],
        }
    }
}

impl Layout {
    /// Largest cell block side a theme may ask for.
    pub const MAX_CELL_SIZE: u32 = 256;
    /// Largest pixel offset inside the panel a theme may ask for.
    pub const MAX_OFFSET: u32 = 4096;

    /// Rows and columns of cells that fit a panel of the given pixel size.
    pub fn grid_size(&self, width: u32, height: u32) -> (u32, u32) {
        let (origin_x, origin_y) = self.board_origin;
        let span = |length: u32, origin: u32| {
            length
                .saturating_sub(origin.saturating_add(self.board_margin))
                .checked_div(self.cell_size)
                .unwrap_or(0)
        };
        (span(height, origin_y), span(width, origin_x))
    }

    /// Top-left pixel of the block of cell `(row, col)` inside the panel.
    pub fn cell_origin(&self, (row, col): (u8, u8)) -> (u32, u32) {
        let (origin_x, origin_y) = self.board_origin;
        let at = |index: u8, origin: u32| {
            u32::from(index)
                .saturating_mul(self.cell_size)
                .saturating_add(origin)
        };
        (at(col, origin_x), at(row, origin_y))
    }

    /// Rejects sizes and offsets no panel can have.
    pub fn check(&self) -> Result<()> {
        if !(1..=Self::MAX_CELL_SIZE).contains(&self.cell_size) {
            return Err(DriverError::ThemeRange(format!(
                "cell_size {} is outside 1..={}",
                self.cell_size,
                Self::MAX_CELL_SIZE
            )));
        }

        let probes = &self.cell_probes;
        let segments = &self.counter.segments;
        let face = &self.face;
        let points = [
            ("board_origin", self.board_origin),
            ("click_offset", self.click_offset),
            ("cell_probes.primary", probes.primary),
            ("cell_probes.bevel", probes.bevel),
            ("cell_probes.mark", probes.mark),
            ("cell_probes.seven", probes.seven),
            ("cell_probes.cross", probes.cross),
            ("cell_probes.burst", probes.burst),
            ("counter.digits[0]", self.counter.digits[0]),
            ("counter.digits[1]", self.counter.digits[1]),
            ("counter.digits[2]", self.counter.digits[2]),
            ("counter.segments.top", segments.top),
            ("counter.segments.middle", segments.middle),
            ("counter.segments.bottom", segments.bottom),
            ("counter.segments.upper_left", segments.upper_left),
            ("counter.segments.lower_left", segments.lower_left),
            ("counter.segments.upper_right", segments.upper_right),
            ("counter.segments.lower_right", segments.lower_right),
            ("board_margin", (self.board_margin, 0)),
            ("face rows", (face.center_row, face.edge_row)),
            ("face outcome rows", (face.lost_row, face.won_row)),
        ];
        match points
            .iter()
            .find(|(_, (x, y))| *x > Self::MAX_OFFSET || *y > Self::MAX_OFFSET)
        {
            Some((name, point)) => Err(DriverError::ThemeRange(format!(
                "{name} {point:?} is beyond {} pixels",
                Self::MAX_OFFSET
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub palette: Palette,
    pub layout: Layout,
}

impl Theme {
    pub fn winxp() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let theme: Self = toml::from_str(source)?;
        theme.layout.check()?;
        Ok(theme)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading theme from {}", path.display());
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Shadow => self.palette.shadow,
            Tone::Highlight => self.palette.highlight,
        }
    }
}
