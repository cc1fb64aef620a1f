use image::RgbImage;

use crate::{Color, Result};

/// Axis-aligned rectangle in screen pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the last column.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// One past the last row.
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= i64::from(self.x) && x < self.right() && y >= i64::from(self.y) && y < self.bottom()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = i64::from(self.x).max(i64::from(other.x));
        let top = i64::from(self.y).max(i64::from(other.y));
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left >= right || top >= bottom {
            return None;
        }
        Some(Rect {
            x: i32::try_from(left).ok()?,
            y: i32::try_from(top).ok()?,
            width: u32::try_from(right - left).ok()?,
            height: u32::try_from(bottom - top).ok()?,
        })
    }
}

/// Immutable pixels of a screen area, addressed in screen coordinates.
#[derive(Clone, Debug)]
pub struct ScreenCapture {
    origin: (i32, i32),
    image: RgbImage,
}

impl ScreenCapture {
    pub fn new(origin: (i32, i32), image: RgbImage) -> Self {
        Self { origin, image }
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.origin.0, self.origin.1, self.image.width(), self.image.height())
    }

    /// Color at screen position `(x, y)`, `None` outside the capture.
    pub fn pixel(&self, x: i64, y: i64) -> Option<Color> {
        let col = u32::try_from(x - i64::from(self.origin.0)).ok()?;
        let row = u32::try_from(y - i64::from(self.origin.1)).ok()?;
        self.image
            .get_pixel_checked(col, row)
            .map(|&pixel| Color::from(pixel))
    }

    /// Whether `(x, y)` is inside the capture and has exactly `color`.
    pub fn is(&self, x: i64, y: i64, color: Color) -> bool {
        self.pixel(x, y) == Some(color)
    }

    /// Copy of the part of `rect` that lies inside the capture.
    pub fn crop(&self, rect: Rect) -> Option<ScreenCapture> {
        let area = self.bounds().intersection(&rect)?;
        let col = u32::try_from(area.x - self.origin.0).ok()?;
        let row = u32::try_from(area.y - self.origin.1).ok()?;
        let image = image::imageops::crop_imm(&self.image, col, row, area.width, area.height)
            .to_image();
        Some(ScreenCapture::new((area.x, area.y), image))
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Source of screenshots.
pub trait Screen {
    /// Everything the locator may search.
    fn capture(&mut self) -> Result<ScreenCapture>;

    /// Only `rect`. Parts of `rect` off screen are missing from the result.
    fn capture_region(&mut self, rect: Rect) -> Result<ScreenCapture> {
        let full = self.capture()?;
        Ok(full
            .crop(rect)
            .unwrap_or_else(|| ScreenCapture::new((rect.x, rect.y), RgbImage::new(0, 0))))
    }
}

impl<S: Screen + ?Sized> Screen for &mut S {
    fn capture(&mut self) -> Result<ScreenCapture> {
        (**self).capture()
    }

    fn capture_region(&mut self, rect: Rect) -> Result<ScreenCapture> {
        (**self).capture_region(rect)
    }
}

#[cfg(feature = "live")]
pub use self::live::XcapScreen;

#[cfg(feature = "live")]
mod live {
    use image::DynamicImage;
    use xcap::Monitor;

    use super::*;
    use crate::DriverError;

    /// The primary monitor, looked up on every capture so a display change
    /// between calls is picked up.
    #[derive(Debug, Default)]
    pub struct XcapScreen;

    impl XcapScreen {
        pub fn new() -> Self {
            Self
        }

        fn primary() -> Result<Monitor> {
            Monitor::all()
                .map_err(|err| DriverError::Capture(err.to_string()))?
                .into_iter()
                .find(|monitor| monitor.is_primary())
                .ok_or_else(|| DriverError::Capture("no primary monitor".into()))
        }
    }

    impl Screen for XcapScreen {
        fn capture(&mut self) -> Result<ScreenCapture> {
            let monitor = Self::primary()?;
            let image = monitor
                .capture_image()
                .map_err(|err| DriverError::Capture(err.to_string()))?;
            log::trace!(
                "Captured {}x{} at ({}, {})",
                image.width(),
                image.height(),
                monitor.x(),
                monitor.y()
            );
            Ok(ScreenCapture::new(
                (monitor.x(), monitor.y()),
                DynamicImage::ImageRgba8(image).into_rgb8(),
            ))
        }
    }
}
