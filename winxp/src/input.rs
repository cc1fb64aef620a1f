use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Open a cell.
    Left,
    /// Cycle flag and question mark.
    Right,
    /// Open the neighbors of a satisfied clue.
    Middle,
}

/// The single system pointer.
pub trait Pointer {
    fn location(&mut self) -> Result<(i32, i32)>;

    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    /// Press and release `button` where the pointer is.
    fn press_release(&mut self, button: MouseButton) -> Result<()>;
}

impl<P: Pointer + ?Sized> Pointer for &mut P {
    fn location(&mut self) -> Result<(i32, i32)> {
        (**self).location()
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        (**self).move_to(x, y)
    }

    fn press_release(&mut self, button: MouseButton) -> Result<()> {
        (**self).press_release(button)
    }
}

/// Exclusive use of the pointer for one sequence of clicks.
///
/// The position found when the lease starts is put back by [`restore`] or,
/// failing that, when the lease is dropped.
///
/// [`restore`]: PointerLease::restore
pub struct PointerLease<'a, P: Pointer + ?Sized> {
    pointer: &'a mut P,
    home: (i32, i32),
    focused: bool,
    restored: bool,
}

impl<'a, P: Pointer + ?Sized> PointerLease<'a, P> {
    pub fn acquire(pointer: &'a mut P) -> Result<Self> {
        let home = pointer.location()?;
        Ok(Self {
            pointer,
            home,
            focused: false,
            restored: false,
        })
    }

    pub fn home(&self) -> (i32, i32) {
        self.home
    }

    /// Left click at `point` unless this lease already did. Inactive windows
    /// swallow the first click they get, so this goes before any real input.
    pub fn focus(&mut self, point: (i32, i32)) -> Result<()> {
        if !self.focused {
            log::trace!("Focusing target at {:?}", point);
            self.click_at(point, MouseButton::Left)?;
            self.focused = true;
        }
        Ok(())
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn click_at(&mut self, (x, y): (i32, i32), button: MouseButton) -> Result<()> {
        self.pointer.move_to(x, y)?;
        self.pointer.press_release(button)
    }

    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        let (x, y) = self.home;
        self.pointer.move_to(x, y)
    }
}

impl<P: Pointer + ?Sized> Drop for PointerLease<'_, P> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        let (x, y) = self.home;
        if let Err(err) = self.pointer.move_to(x, y) {
            log::warn!("Could not put the pointer back to ({}, {}): {}", x, y, err);
        }
    }
}

#[cfg(feature = "live")]
pub use self::live::EnigoPointer;

#[cfg(feature = "live")]
mod live {
    use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};

    use super::*;
    use crate::DriverError;

    pub struct EnigoPointer {
        enigo: Enigo,
    }

    impl EnigoPointer {
        pub fn new() -> Result<Self> {
            let enigo = Enigo::new(&Settings::default()).map_err(input_error)?;
            Ok(Self { enigo })
        }
    }

    fn input_error(err: impl std::fmt::Display) -> DriverError {
        DriverError::Input(err.to_string())
    }

    impl Pointer for EnigoPointer {
        fn location(&mut self) -> Result<(i32, i32)> {
            self.enigo.location().map_err(input_error)
        }

        fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
            self.enigo
                .move_mouse(x, y, Coordinate::Abs)
                .map_err(input_error)
        }

        fn press_release(&mut self, button: MouseButton) -> Result<()> {
            let button = match button {
                MouseButton::Left => Button::Left,
                MouseButton::Right => Button::Right,
                MouseButton::Middle => Button::Middle,
            };
            self.enigo
                .button(button, Direction::Click)
                .map_err(input_error)
        }
    }
}
