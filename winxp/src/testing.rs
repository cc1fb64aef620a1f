//! Synthetic desktop for tests: paints the legacy panel from a board and
//! plays clicks back into a [`SimBoard`].

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use image::{Rgb, RgbImage};
use mineagent_core::*;

use crate::decode::Segments;
use crate::input::{MouseButton, Pointer};
use crate::{Color, DriverConfig, InteractionMode, LiveBoard, Rect, Screen, ScreenCapture, Theme};

pub const DESKTOP: Color = Color::rgb(58, 110, 165);
pub const OTHER_WINDOW: Color = Color::rgb(236, 233, 216);

pub fn panel_size(theme: &Theme, (rows, cols): Coord2) -> (u32, u32) {
    let layout = &theme.layout;
    (
        layout.board_origin.0 + u32::from(cols) * layout.cell_size + layout.board_margin,
        layout.board_origin.1 + u32::from(rows) * layout.cell_size + layout.board_margin,
    )
}

/// Lit segments of `digit`; 10 is the minus sign.
pub fn segments_for(digit: u8) -> Segments {
    let lit = |pattern: &str| Segments {
        top: pattern.contains('t'),
        middle: pattern.contains('m'),
        bottom: pattern.contains('b'),
        upper_left: pattern.contains('L'),
        lower_left: pattern.contains('l'),
        upper_right: pattern.contains('R'),
        lower_right: pattern.contains('r'),
    };
    match digit {
        0 => lit("tLRlrb"),
        1 => lit("Rr"),
        2 => lit("tRmlb"),
        3 => lit("tRmrb"),
        4 => lit("LRmr"),
        5 => lit("tLmrb"),
        6 => lit("tLmlrb"),
        7 => lit("tRr"),
        8 => lit("tLRmlrb"),
        9 => lit("tLRmrb"),
        _ => lit("m"),
    }
}

/// Just the panel, origin at `(0, 0)`.
pub fn paint_panel(snapshot: &BoardSnapshot, theme: &Theme) -> ScreenCapture {
    ScreenCapture::new((0, 0), render_panel(snapshot, theme))
}

pub fn blank_desktop((width, height): (u32, u32)) -> ScreenCapture {
    ScreenCapture::new((0, 0), RgbImage::from_pixel(width, height, DESKTOP.into()))
}

/// A desktop of `size` with the panel of `board` at `origin`.
pub fn paint_desktop(
    board: &SimBoard,
    theme: &Theme,
    origin: (i32, i32),
    size: (u32, u32),
) -> ScreenCapture {
    let mut image = blank_desktop(size).into_image();
    let panel = render_panel(&board.snapshot(), theme);
    blit(&mut image, &panel, origin);
    ScreenCapture::new((0, 0), image)
}

pub fn cover_area(capture: &mut ScreenCapture, rect: Rect) {
    let mut image = capture.clone().into_image();
    let cover = RgbImage::from_pixel(rect.width, rect.height, OTHER_WINDOW.into());
    blit(&mut image, &cover, (rect.x, rect.y));
    *capture = ScreenCapture::new(capture.origin(), image);
}

pub fn set_pixel(capture: &mut ScreenCapture, (x, y): (u32, u32), color: Color) {
    let mut image = capture.clone().into_image();
    image.put_pixel(x, y, color.into());
    *capture = ScreenCapture::new(capture.origin(), image);
}

fn blit(target: &mut RgbImage, source: &RgbImage, (left, top): (i32, i32)) {
    for (x, y, &pixel) in source.enumerate_pixels() {
        let (Ok(tx), Ok(ty)) = (u32::try_from(left + x as i32), u32::try_from(top + y as i32))
        else {
            continue;
        };
        if tx < target.width() && ty < target.height() {
            target.put_pixel(tx, ty, pixel);
        }
    }
}

struct Canvas<'a> {
    image: RgbImage,
    theme: &'a Theme,
}

impl Canvas<'_> {
    fn paint(&mut self, x: u32, y: u32, color: Color) {
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, Rgb::from(color));
        }
    }

    fn fill(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color) {
        for dy in 0..height {
            for dx in 0..width {
                self.paint(x + dx, y + dy, color);
            }
        }
    }
}

fn render_panel(snapshot: &BoardSnapshot, theme: &Theme) -> RgbImage {
    let palette = &theme.palette;
    let layout = &theme.layout;
    let (width, height) = panel_size(theme, snapshot.size());
    let mut canvas = Canvas {
        image: RgbImage::from_pixel(width, height, palette.cover.into()),
        theme,
    };

    // Sunken frame: shadow top and left, highlight right and bottom.
    for x in 0..width {
        for y in 0..height {
            let tone = if (x == width - 1 && y >= 1) || (y == height - 1 && x >= 1) {
                palette.highlight
            } else if x == 0 || y == 0 {
                palette.shadow
            } else {
                continue;
            };
            canvas.paint(x, y, tone);
        }
    }
    let separator = layout.face.center_row + layout.face.edge_row;
    canvas.fill(1, separator, width - 2, 1, palette.shadow);

    paint_counter(&mut canvas, snapshot.mines_left);
    paint_face(&mut canvas, width / 2, snapshot.outcome);
    for coords in RowMajor::new(snapshot.size()) {
        paint_cell(&mut canvas, coords, snapshot.cell_at(coords));
    }
    canvas.image
}

fn paint_counter(canvas: &mut Canvas<'_>, value: isize) {
    let digits = if value < 0 {
        let shown = value.unsigned_abs().min(99) as u8;
        [10, shown / 10, shown % 10]
    } else {
        let shown = value.min(999) as u16;
        [(shown / 100) as u8, (shown / 10 % 10) as u8, (shown % 10) as u8]
    };

    let theme = canvas.theme;
    let counter = &theme.layout.counter;
    let (ink, led_on) = (theme.palette.ink, theme.palette.led_on);
    for (&(left, top), digit) in counter.digits.iter().zip(digits) {
        canvas.fill(left, top, 11, 21, ink);

        let lit = segments_for(digit);
        let probes = &counter.segments;
        for (on, (dx, dy)) in [
            (lit.top, probes.top),
            (lit.middle, probes.middle),
            (lit.bottom, probes.bottom),
            (lit.upper_left, probes.upper_left),
            (lit.lower_left, probes.lower_left),
            (lit.upper_right, probes.upper_right),
            (lit.lower_right, probes.lower_right),
        ] {
            if on {
                canvas.paint(left + dx, top + dy, led_on);
            }
        }
    }
}

fn paint_face(canvas: &mut Canvas<'_>, center_x: u32, outcome: Outcome) {
    let theme = canvas.theme;
    let face = &theme.layout.face;
    let (yellow, ink) = (theme.palette.face, theme.palette.ink);
    let center_y = face.center_row;

    for dy in -9i32..=9 {
        for dx in -9i32..=9 {
            let distance = dx * dx + dy * dy;
            let color = match distance {
                0..=56 => yellow,
                57..=72 => ink,
                _ => continue,
            };
            canvas.paint(
                center_x.saturating_add_signed(dx),
                center_y.saturating_add_signed(dy),
                color,
            );
        }
    }
    match outcome {
        Outcome::Lost => canvas.paint(center_x, face.lost_row, ink),
        Outcome::Won => canvas.paint(center_x, face.won_row, ink),
        Outcome::Ongoing => {}
    }
}

fn paint_cell(canvas: &mut Canvas<'_>, coords: Coord2, cell: CellState) {
    use CellState::*;

    let theme = canvas.theme;
    let palette = &theme.palette;
    let size = theme.layout.cell_size;
    let (cx, cy) = theme.layout.cell_origin(coords);
    let dot = |canvas: &mut Canvas<'_>, x: u32, y: u32, color: Color| {
        canvas.paint(cx + x, cy + y, color)
    };

    let background = if cell == ExplodedMine {
        palette.alert
    } else {
        palette.cover
    };
    canvas.fill(cx, cy, size, size, background);

    if cell.is_covered() || cell.is_flag() {
        for i in 0..size {
            dot(canvas, i, 0, palette.highlight);
            dot(canvas, 0, i, palette.highlight);
            dot(canvas, i, size - 1, palette.shadow);
            dot(canvas, size - 1, i, palette.shadow);
        }
    } else {
        for i in 0..size {
            dot(canvas, i, 0, palette.shadow);
            dot(canvas, 0, i, palette.shadow);
        }
    }

    match cell {
        Unchecked | Revealed(0) => {}
        Flag => {
            canvas.fill(cx + 4, cy + 3, 4, 5, palette.alert);
            canvas.fill(cx + 8, cy + 3, 1, 9, palette.ink);
            canvas.fill(cx + 4, cy + 12, 8, 1, palette.ink);
        }
        Question => {
            let strokes = [(6, 3), (7, 3), (8, 3), (5, 4), (9, 4), (9, 5), (8, 6)];
            for (x, y) in strokes.into_iter().chain([(7, 8), (7, 9), (7, 11)]) {
                dot(canvas, x, y, palette.ink);
            }
        }
        Revealed(7) => {
            canvas.fill(cx + 3, cy + 3, 9, 1, palette.ink);
            let stem = [(11, 4), (10, 5), (10, 6), (9, 7), (9, 8), (8, 9), (8, 10), (8, 11)];
            for (x, y) in stem {
                dot(canvas, x, y, palette.ink);
            }
        }
        Revealed(clue) => {
            let color = palette.numerals[usize::from(clue.clamp(1, 8)) - 1];
            canvas.fill(cx + 5, cy + 3, 6, 1, color);
            canvas.fill(cx + 7, cy + 3, 2, 10, color);
            canvas.fill(cx + 5, cy + 12, 6, 1, color);
        }
        Mine | ExplodedMine | MisflaggedMine => {
            for y in 2..=14u32 {
                for x in 2..=13u32 {
                    let (dx, dy) = (x as i32 - 7, y as i32 - 8);
                    if dx * dx + dy * dy <= 12 {
                        dot(canvas, x, y, palette.ink);
                    }
                }
            }
            if cell == MisflaggedMine {
                for i in 2..=13u32 {
                    dot(canvas, i, i, palette.alert);
                    dot(canvas, i, 15 - i, palette.alert);
                }
            }
        }
    }
}

/// Everything a fake session needs: the game, where its window is, and the
/// pointer and focus state.
pub struct FakeDesktop {
    pub board: SimBoard,
    layout: MineLayout,
    theme: Theme,
    pub origin: (i32, i32),
    pub screen_size: (u32, u32),
    pub visible: bool,
    pub focused: bool,
    pub pointer: (i32, i32),
    /// Every press, honored or not.
    pub presses: Vec<((i32, i32), MouseButton)>,
    pub occlusions: Vec<Rect>,
    /// Like `occlusions`, but gone once a new round repaints the window.
    pub stale: Vec<Rect>,
}

impl FakeDesktop {
    fn panel(&self) -> Rect {
        let (width, height) = panel_size(&self.theme, self.board.size());
        Rect::new(self.origin.0, self.origin.1, width, height)
    }

    fn press(&mut self, button: MouseButton) {
        let (x, y) = self.pointer;
        self.presses.push(((x, y), button));

        let panel = self.panel();
        if !self.visible || !panel.contains(i64::from(x), i64::from(y)) {
            self.focused = false;
            return;
        }
        if !self.focused {
            self.focused = true;
            return;
        }

        let layout = &self.theme.layout;
        let px = x - panel.x;
        let py = y - panel.y;
        let face_x = (panel.width / 2) as i32;
        let face_y = layout.face.center_row as i32;
        if (px - face_x).pow(2) + (py - face_y).pow(2) <= 72 {
            if button == MouseButton::Left {
                self.board = SimBoard::new(self.layout.clone());
                self.stale.clear();
            }
            return;
        }

        let gx = px - layout.board_origin.0 as i32;
        let gy = py - layout.board_origin.1 as i32;
        if gx < 0 || gy < 0 {
            return;
        }
        let cell = layout.cell_size as i32;
        let (Ok(row), Ok(col)) = (Coord::try_from(gy / cell), Coord::try_from(gx / cell)) else {
            return;
        };
        let coords = (row, col);
        if validate_coords(coords, self.board.size()).is_err() {
            return;
        }

        // A finished game ignores the board, like the real one.
        let _ = match button {
            MouseButton::Left => self.board.reveal(coords),
            MouseButton::Right => self.board.toggle_mark(coords),
            MouseButton::Middle => self.board.chord(coords),
        };
    }

    fn render(&self) -> ScreenCapture {
        let mut capture = if self.visible {
            paint_desktop(&self.board, &self.theme, self.origin, self.screen_size)
        } else {
            blank_desktop(self.screen_size)
        };
        for &rect in self.occlusions.iter().chain(&self.stale) {
            cover_area(&mut capture, rect);
        }
        capture
    }
}

/// One desktop seen both as the screen and as the pointer device.
#[derive(Clone)]
pub struct SharedDesktop(pub Rc<RefCell<FakeDesktop>>);

impl SharedDesktop {
    /// An unfocused window at (40, 30) on a 640x480 screen.
    pub fn new(layout: MineLayout) -> Self {
        Self(Rc::new(RefCell::new(FakeDesktop {
            board: SimBoard::new(layout.clone()),
            layout,
            theme: Theme::winxp(),
            origin: (40, 30),
            screen_size: (640, 480),
            visible: true,
            focused: false,
            pointer: (600, 400),
            presses: Vec::new(),
            occlusions: Vec::new(),
            stale: Vec::new(),
        })))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeDesktop) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Panel area as it is painted right now.
    pub fn panel_capture(&self) -> ScreenCapture {
        self.with(|desktop| {
            let panel = desktop.panel();
            desktop.render().crop(panel).unwrap()
        })
    }

    pub fn attach(
        &self,
        mode: InteractionMode,
        dir: &Path,
    ) -> LiveBoard<SharedDesktop, SharedDesktop> {
        let config = test_config(mode, dir);
        LiveBoard::attach(self.clone(), self.clone(), Theme::winxp(), config).unwrap()
    }
}

impl Screen for SharedDesktop {
    fn capture(&mut self) -> crate::Result<ScreenCapture> {
        Ok(self.0.borrow().render())
    }
}

impl Pointer for SharedDesktop {
    fn location(&mut self) -> crate::Result<(i32, i32)> {
        Ok(self.0.borrow().pointer)
    }

    fn move_to(&mut self, x: i32, y: i32) -> crate::Result<()> {
        self.0.borrow_mut().pointer = (x, y);
        Ok(())
    }

    fn press_release(&mut self, button: MouseButton) -> crate::Result<()> {
        self.0.borrow_mut().press(button);
        Ok(())
    }
}

/// No settle waits, diagnostics under `dir`.
pub fn test_config(mode: InteractionMode, dir: &Path) -> DriverConfig {
    DriverConfig {
        mode,
        new_round: false,
        settle_base_ms: 0,
        settle_cells_per_ms: 0,
        new_round_ms: 0,
        diagnostic_path: dir.join("cap.png"),
    }
}
