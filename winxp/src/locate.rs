//! Finding the game panel on a full-screen capture.
//!
//! No window handles are involved: the status face is found by its pixel
//! signature, then the panel frame is walked outward from it.

use crate::{Rect, ScreenCapture, Theme};

/// The panel could not be trusted; `region` is what the locator was looking
/// at when it gave up, if it got far enough to have a region.
#[derive(Clone, Debug)]
pub struct Obstruction {
    pub region: Option<ScreenCapture>,
}

impl Obstruction {
    fn nothing_found() -> Self {
        Self { region: None }
    }
}

/// Center of the first status face in column-major scan order.
pub fn find_face(capture: &ScreenCapture, theme: &Theme) -> Option<(i64, i64)> {
    let bounds = capture.bounds();
    let face = &theme.layout.face;
    let palette = &theme.palette;

    let matches = |x: i64, y: i64| {
        capture.is(x, y, palette.face)
            && face
                .ring
                .iter()
                .all(|&(dx, dy)| capture.is(x + i64::from(dx), y + i64::from(dy), palette.ink))
            && face
                .fill
                .iter()
                .all(|&(dx, dy)| capture.is(x + i64::from(dx), y + i64::from(dy), palette.face))
    };

    (i64::from(bounds.x)..bounds.right())
        .flat_map(|x| (i64::from(bounds.y)..bounds.bottom()).map(move |y| (x, y)))
        .find(|&(x, y)| matches(x, y))
}

/// Walks the panel frame from the face at `face` and returns the panel rectangle.
pub fn find_window(
    capture: &ScreenCapture,
    theme: &Theme,
    (face_x, face_y): (i64, i64),
) -> Result<Rect, Obstruction> {
    let palette = &theme.palette;
    let face = &theme.layout.face;

    let row = face_y + i64::from(face.edge_row);
    let top = face_y - i64::from(face.center_row);

    let mut left = face_x;
    while capture.is(left, row, palette.shadow) {
        left -= 1;
    }
    left += 1;

    let mut right = face_x;
    while capture.is(right, row, palette.shadow) {
        right += 1;
    }

    let mut bottom = row + 1;
    while capture.is(right, bottom, palette.highlight) {
        bottom += 1;
    }
    bottom -= 1;

    let region = rect_from_corners(left, top, right, bottom);
    let consistent = (left + right + 1) >> 1 == face_x
        && capture.is(left + 1, bottom, palette.highlight)
        && capture.is(left, bottom - 1, palette.shadow);

    match region {
        Some(rect) if consistent => {
            log::debug!("Found panel {:?} around face ({}, {})", rect, face_x, face_y);
            Ok(rect)
        }
        _ => {
            log::debug!(
                "Panel walk from face ({}, {}) is inconsistent: x {}..={}, y {}..={}",
                face_x,
                face_y,
                left,
                right,
                top,
                bottom
            );
            Err(Obstruction {
                region: region.and_then(|rect| capture.crop(rect)),
            })
        }
    }
}

/// Face search followed by the frame walk.
pub fn locate_panel(capture: &ScreenCapture, theme: &Theme) -> Result<Rect, Obstruction> {
    let face = find_face(capture, theme).ok_or_else(|| {
        log::debug!("No status face on a {:?} capture", capture.bounds());
        Obstruction::nothing_found()
    })?;
    find_window(capture, theme, face)
}

/// Whether the frame signature holds on a capture of exactly the panel.
pub fn border_intact(panel: &ScreenCapture, theme: &Theme) -> bool {
    let bounds = panel.bounds();
    theme.layout.border.iter().all(|probe| {
        let (x, y) = probe.resolve(bounds.width, bounds.height);
        panel.is(
            i64::from(bounds.x) + x,
            i64::from(bounds.y) + y,
            theme.tone(probe.tone),
        )
    })
}

fn rect_from_corners(left: i64, top: i64, right: i64, bottom: i64) -> Option<Rect> {
    if right < left || bottom < top {
        return None;
    }
    Some(Rect::new(
        i32::try_from(left).ok()?,
        i32::try_from(top).ok()?,
        u32::try_from(right - left + 1).ok()?,
        u32::try_from(bottom - top + 1).ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use mineagent_core::{MineLayout, SimBoard};

    use super::*;
    use crate::testing::*;

    #[test]
    fn locates_panel_on_desktop() {
        let theme = Theme::winxp();
        let board = SimBoard::new(MineLayout::from_mine_coords((9, 9), &[(0, 0)]).unwrap());
        let desktop = paint_desktop(&board, &theme, (37, 21), (400, 320));

        let face = find_face(&desktop, &theme).unwrap();
        let (width, height) = panel_size(&theme, (9, 9));
        assert_eq!(face, (37 + i64::from(width / 2), 21 + 19));
        assert_eq!(
            locate_panel(&desktop, &theme).unwrap(),
            Rect::new(37, 21, width, height)
        );
    }

    #[test]
    fn empty_desktop_has_no_face() {
        let theme = Theme::winxp();
        let desktop = blank_desktop((200, 200));

        let obstruction = locate_panel(&desktop, &theme).unwrap_err();
        assert!(obstruction.region.is_none());
    }

    #[test]
    fn covered_corner_is_obstruction_with_region() {
        let theme = Theme::winxp();
        let board = SimBoard::new(MineLayout::from_mine_coords((9, 9), &[(0, 0)]).unwrap());
        let mut desktop = paint_desktop(&board, &theme, (10, 10), (300, 300));
        let (_, height) = panel_size(&theme, (9, 9));
        // Another window over the bottom-left corner of the frame.
        cover_area(&mut desktop, Rect::new(0, 10 + height as i32 - 8, 30, 40));

        let obstruction = locate_panel(&desktop, &theme).unwrap_err();
        let region = obstruction.region.unwrap();
        assert_eq!(region.bounds().x, 10);
        assert_eq!(region.bounds().y, 10);
    }

    #[test]
    fn border_signature_detects_shift() {
        let theme = Theme::winxp();
        let board = SimBoard::new(MineLayout::from_mine_coords((9, 9), &[(0, 0)]).unwrap());
        let desktop = paint_desktop(&board, &theme, (50, 40), (400, 400));
        let (width, height) = panel_size(&theme, (9, 9));

        let exact = desktop.crop(Rect::new(50, 40, width, height)).unwrap();
        let shifted = desktop.crop(Rect::new(51, 40, width, height)).unwrap();
        assert!(border_intact(&exact, &theme));
        assert!(!border_intact(&shifted, &theme));
    }
}
