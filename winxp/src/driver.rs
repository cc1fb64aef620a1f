use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mineagent_core::{
    BoardModel, BoardSnapshot, CellCount, CellState, Coord2, Outcome, validate_coords,
};
use serde::{Deserialize, Serialize};

use crate::decode::{Panel, decode_board, decode_cell, grid_size};
use crate::input::{MouseButton, Pointer, PointerLease};
use crate::locate::{Obstruction, border_intact, locate_panel};
use crate::{DriverError, Rect, Result, Screen, ScreenCapture, Theme};

/// Counter display limit; the local decrement of batched flags stops here.
const COUNTER_MIN: isize = -99;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Every move re-reads the whole board from the screen.
    #[default]
    Verified,
    /// Moves only update the cached cell and counters; the screen is read
    /// back on [`BoardModel::synchronize`].
    Batched,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub mode: InteractionMode,
    /// Click the status face right after attaching.
    pub new_round: bool,
    /// Fixed part of the wait between a click and the read back.
    pub settle_base_ms: u64,
    /// Board cells per extra millisecond of waiting. Zero disables the area term.
    pub settle_cells_per_ms: u64,
    /// Wait after clicking the status face.
    pub new_round_ms: u64,
    /// Where the suspect region goes when the window cannot be trusted.
    pub diagnostic_path: PathBuf,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            mode: InteractionMode::Verified,
            new_round: false,
            settle_base_ms: 6,
            settle_cells_per_ms: 160,
            new_round_ms: 14,
            diagnostic_path: PathBuf::from("cap.png"),
        }
    }
}

impl DriverConfig {
    pub fn settle_delay(&self, (rows, cols): Coord2) -> Duration {
        let cells = u64::from(rows) * u64::from(cols);
        let area = cells.checked_div(self.settle_cells_per_ms).unwrap_or(0);
        Duration::from_millis(self.settle_base_ms + area)
    }
}

/// Where the panel is on screen and how cells map onto it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WindowGeometry {
    pub panel: Rect,
    pub size: Coord2,
    cell_size: u32,
    board_origin: (u32, u32),
    click_offset: (u32, u32),
    face_row: u32,
}

impl WindowGeometry {
    /// `None` when the panel is too small to hold a single cell.
    pub fn new(panel: Rect, theme: &Theme) -> Option<Self> {
        let layout = &theme.layout;
        Some(Self {
            panel,
            size: grid_size(theme, panel.width, panel.height)?,
            cell_size: layout.cell_size,
            board_origin: layout.board_origin,
            click_offset: layout.click_offset,
            face_row: layout.face.center_row,
        })
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Screen point a click on `(row, col)` goes to.
    pub fn cell_center(&self, (row, col): Coord2) -> (i32, i32) {
        let at = |index: u8, origin: u32, offset: u32| {
            u32::from(index)
                .saturating_mul(self.cell_size)
                .saturating_add(origin)
                .saturating_add(offset)
        };
        self.offset(
            at(col, self.board_origin.0, self.click_offset.0),
            at(row, self.board_origin.1, self.click_offset.1),
        )
    }

    /// Top edge of the panel, middle column. Clicking it does nothing but
    /// activate the window.
    pub fn neutral_point(&self) -> (i32, i32) {
        self.offset(self.panel.width / 2, 0)
    }

    pub fn face_point(&self) -> (i32, i32) {
        self.offset(self.panel.width / 2, self.face_row)
    }

    fn offset(&self, x: u32, y: u32) -> (i32, i32) {
        let x = i64::from(self.panel.x) + i64::from(x);
        let y = i64::from(self.panel.y) + i64::from(y);
        (saturate(x), saturate(y))
    }
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// A running game of the desktop application, seen through `screen` and
/// played with `pointer`.
pub struct LiveBoard<S: Screen, P: Pointer> {
    screen: S,
    pointer: P,
    theme: Theme,
    config: DriverConfig,
    geometry: WindowGeometry,
    snapshot: BoardSnapshot,
    total_mines: CellCount,
    /// Set when the window may have lost focus since our last click.
    focus_pending: bool,
    /// Cells already clicked open since the last synchronization.
    dug: HashSet<Coord2>,
}

impl<S: Screen, P: Pointer> LiveBoard<S, P> {
    /// Finds the window on a full-screen capture and reads the board.
    ///
    /// With [`DriverConfig::new_round`] the board left on screen is never
    /// decoded; the face is clicked first and only the fresh round is read.
    pub fn attach(mut screen: S, pointer: P, theme: Theme, config: DriverConfig) -> Result<Self> {
        let full = screen.capture()?;
        let (geometry, panel) = locate(&full, &theme, &config.diagnostic_path)?;
        let snapshot = if config.new_round {
            BoardSnapshot::new(geometry.size, 0)
        } else {
            decode_board(&Panel::whole(&panel), &theme)?
        };

        let mut board = Self {
            screen,
            pointer,
            theme,
            config,
            geometry,
            snapshot,
            total_mines: 0,
            focus_pending: true,
            dug: HashSet::new(),
        };
        if board.config.new_round {
            board.new_round()?;
        } else {
            board.total_mines = board.count_total_mines();
        }
        log::info!(
            "Attached to {}x{} board at ({}, {}), {} mines, {:?} mode",
            board.geometry.size.0,
            board.geometry.size.1,
            board.geometry.panel.x,
            board.geometry.panel.y,
            board.total_mines,
            board.config.mode
        );
        Ok(board)
    }

    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    pub fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn mode(&self) -> InteractionMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.config.mode = mode;
    }

    /// Counter reading plus visible flags, as of the last round start.
    pub fn total_mines(&self) -> CellCount {
        self.total_mines
    }

    /// Left click, then a full read back.
    pub fn dig(&mut self, coords: Coord2) -> Result<Outcome> {
        self.verified(coords, MouseButton::Left, |_| 1)
    }

    /// Single right click: unchecked, flag, question, unchecked.
    pub fn toggle_mark(&mut self, coords: Coord2) -> Result<Outcome> {
        self.verified(coords, MouseButton::Right, |_| 1)
    }

    /// Middle click on a clue, opening its neighbors if enough are flagged.
    pub fn chord(&mut self, coords: Coord2) -> Result<Outcome> {
        self.verified(coords, MouseButton::Middle, |_| 1)
    }

    /// As many right clicks as the cell, read fresh off the screen, needs to
    /// become a flag.
    pub fn flag(&mut self, coords: Coord2) -> Result<Outcome> {
        self.verified(coords, MouseButton::Right, CellState::clicks_to_flag)
    }

    /// Left click without reading anything back.
    ///
    /// Only covered cells are clicked, each at most once between two
    /// synchronizations. The cached cell stays covered until then.
    pub fn quick_dig(&mut self, coords: Coord2) -> Result<()> {
        let coords = validate_coords(coords, self.size())?;
        if !self.snapshot[coords].is_covered() || self.dug.contains(&coords) {
            log::trace!("Skipping dig of {:?}: {:?}", coords, self.snapshot[coords]);
            return Ok(());
        }

        self.click(coords, MouseButton::Left, 1)?;
        self.dug.insert(coords);
        self.snapshot.step_count += 1;
        Ok(())
    }

    /// Right clicks until the cached cell would be a flag, then records the
    /// flag locally.
    pub fn quick_flag(&mut self, coords: Coord2) -> Result<()> {
        let coords = validate_coords(coords, self.size())?;
        let clicks = self.snapshot[coords].clicks_to_flag();
        if clicks == 0 || self.dug.contains(&coords) {
            log::trace!("Skipping flag of {:?}: {:?}", coords, self.snapshot[coords]);
            return Ok(());
        }

        self.click(coords, MouseButton::Right, clicks)?;
        self.snapshot[coords] = CellState::Flag;
        self.snapshot.mines_left = (self.snapshot.mines_left - 1).max(COUNTER_MIN);
        self.snapshot.step_count += 1;
        Ok(())
    }

    /// Clicks the status face and reads the fresh board.
    pub fn new_round(&mut self) -> Result<Outcome> {
        self.capture_panel()?;

        let neutral = self.geometry.neutral_point();
        let face = self.geometry.face_point();
        let mut lease = PointerLease::acquire(&mut self.pointer)?;
        lease.focus(neutral)?;
        log::debug!("Clicking status face at {:?}", face);
        lease.click_at(face, MouseButton::Left)?;
        lease.restore()?;
        self.focus_pending = false;

        pause(Duration::from_millis(self.config.new_round_ms));
        self.snapshot.step_count = 0;
        let outcome = self.refresh()?;
        self.total_mines = self.count_total_mines();
        log::info!("New round: {} mines", self.total_mines);
        Ok(outcome)
    }

    fn verified(
        &mut self,
        coords: Coord2,
        button: MouseButton,
        clicks_for: impl FnOnce(CellState) -> u8,
    ) -> Result<Outcome> {
        let coords = validate_coords(coords, self.size())?;
        let capture = self.capture_panel()?;
        // The window may have been swapped for a smaller board meanwhile.
        let coords = validate_coords(coords, self.geometry.size)?;
        let current = decode_cell(&Panel::whole(&capture), &self.theme, coords)?;

        self.focus_pending = true;
        self.click(coords, button, clicks_for(current))?;

        pause(self.config.settle_delay(self.geometry.size));
        self.snapshot.step_count += 1;
        self.refresh()
    }

    fn click(&mut self, coords: Coord2, button: MouseButton, times: u8) -> Result<()> {
        let target = self.geometry.cell_center(coords);
        let neutral = self.geometry.neutral_point();

        let mut lease = PointerLease::acquire(&mut self.pointer)?;
        if self.focus_pending {
            lease.focus(neutral)?;
        }
        log::debug!("{:?} x{} on {:?} at {:?}", button, times, coords, target);
        for _ in 0..times {
            lease.click_at(target, button)?;
        }
        lease.restore()?;
        self.focus_pending = false;
        Ok(())
    }

    /// The panel as it is now, relocating the window if its frame moved.
    fn capture_panel(&mut self) -> Result<ScreenCapture> {
        let panel = self.screen.capture_region(self.geometry.panel)?;
        if panel.bounds() == self.geometry.panel && border_intact(&panel, &self.theme) {
            return Ok(panel);
        }

        log::warn!("Window frame at {:?} changed, searching the screen", self.geometry.panel);
        let full = self.screen.capture()?;
        let (geometry, panel) = locate(&full, &self.theme, &self.config.diagnostic_path)?;
        if geometry.size != self.geometry.size {
            log::warn!(
                "Board size changed from {:?} to {:?}",
                self.geometry.size,
                geometry.size
            );
        }
        log::debug!("Window relocated to {:?}", geometry.panel);
        self.geometry = geometry;
        self.focus_pending = true;
        Ok(panel)
    }

    /// Replaces the cached board with a fresh read, keeping the step counter.
    fn refresh(&mut self) -> Result<Outcome> {
        let panel = self.capture_panel()?;
        let mut snapshot = decode_board(&Panel::whole(&panel), &self.theme)?;
        snapshot.step_count = self.snapshot.step_count;
        self.snapshot = snapshot;
        self.dug.clear();
        Ok(self.snapshot.outcome)
    }

    fn count_total_mines(&self) -> CellCount {
        let flags = self.snapshot.count_cells(CellState::is_flag);
        let total = self.snapshot.mines_left + isize::try_from(flags).unwrap_or(isize::MAX);
        CellCount::try_from(total.max(0)).unwrap_or(CellCount::MAX)
    }
}

impl<S: Screen, P: Pointer> BoardModel for LiveBoard<S, P> {
    type Error = DriverError;

    fn size(&self) -> Coord2 {
        self.snapshot.size()
    }

    fn cell_at(&self, coords: Coord2) -> CellState {
        self.snapshot.cell_at(coords)
    }

    fn set_flag(&mut self, coords: Coord2) -> Result<Outcome> {
        match self.config.mode {
            InteractionMode::Verified => self.flag(coords),
            InteractionMode::Batched => {
                self.quick_flag(coords)?;
                Ok(self.snapshot.outcome)
            }
        }
    }

    fn reveal(&mut self, coords: Coord2) -> Result<Outcome> {
        match self.config.mode {
            InteractionMode::Verified => self.dig(coords),
            InteractionMode::Batched => {
                self.quick_dig(coords)?;
                Ok(self.snapshot.outcome)
            }
        }
    }

    fn outcome(&self) -> Outcome {
        self.snapshot.outcome
    }

    fn mines_left(&self) -> isize {
        self.snapshot.mines_left
    }

    fn step_count(&self) -> u32 {
        self.snapshot.step_count
    }

    /// Full read back. A person may have used the mouse since the last
    /// batch, so the next click focuses the window again.
    fn synchronize(&mut self) -> Result<Outcome> {
        let outcome = self.refresh()?;
        self.focus_pending = true;
        log::debug!(
            "Synchronized: {} covered, counter {}, {:?}",
            self.snapshot.count_cells(CellState::is_covered),
            self.snapshot.mines_left,
            outcome
        );
        Ok(outcome)
    }
}

fn locate(
    full: &ScreenCapture,
    theme: &Theme,
    diagnostic_path: &Path,
) -> Result<(WindowGeometry, ScreenCapture)> {
    let rect =
        locate_panel(full, theme).map_err(|obstruction| report(obstruction, diagnostic_path))?;
    let geometry = WindowGeometry::new(rect, theme).ok_or_else(DriverError::obstructed)?;
    let panel = full.crop(rect).ok_or_else(DriverError::obstructed)?;
    Ok((geometry, panel))
}

/// Turns an obstruction into the error, saving the suspect region if there is one.
fn report(obstruction: Obstruction, path: &Path) -> DriverError {
    let Some(region) = obstruction.region else {
        return DriverError::obstructed();
    };
    match region.into_image().save(path) {
        Ok(()) => {
            log::warn!("Suspect region saved to {}", path.display());
            DriverError::Obstructed {
                artifact: Some(path.to_path_buf()),
            }
        }
        Err(err) => {
            log::warn!("Could not save suspect region to {}: {}", path.display(), err);
            DriverError::obstructed()
        }
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
