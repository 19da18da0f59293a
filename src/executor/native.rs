use enigo::{Axis, Coordinate, Direction, Enigo, Key, Keyboard as _, Mouse as _, Settings};
use tracing::trace;

use super::surface::InputSurface;
use crate::error::SurfaceError;
use crate::humanize::Point;

/// Pixels per wheel notch. Enigo scrolls in notches, so smaller deltas are
/// accumulated until they add up to one.
const PIXELS_PER_NOTCH: i64 = 100;

/// Drives the real mouse and keyboard through Enigo.
pub struct NativeSurface {
    enigo: Enigo,
    pending_scroll: i64,
}

impl NativeSurface {
    pub fn new() -> Result<Self, SurfaceError> {
        trace!(target: "humanpace::replay", "Initializing Enigo");
        let enigo = Enigo::new(&Settings::default())?;
        Ok(Self {
            enigo,
            pending_scroll: 0,
        })
    }
}

impl InputSurface for NativeSurface {
    fn move_to(&mut self, to: Point) -> Result<(), SurfaceError> {
        let (x, y) = (to.x.round() as i32, to.y.round() as i32);
        trace!(target: "humanpace::replay", x, y, "move_to");
        self.enigo.move_mouse(x, y, Coordinate::Abs)?;
        Ok(())
    }

    fn type_char(&mut self, ch: char) -> Result<(), SurfaceError> {
        trace!(target: "humanpace::replay", %ch, "type_char");
        self.enigo.key(Key::Unicode(ch), Direction::Click)?;
        Ok(())
    }

    fn backspace(&mut self) -> Result<(), SurfaceError> {
        trace!(target: "humanpace::replay", "backspace");
        self.enigo.key(Key::Backspace, Direction::Click)?;
        Ok(())
    }

    fn scroll(&mut self, delta: i64) -> Result<(), SurfaceError> {
        self.pending_scroll += delta;
        let notches = self.pending_scroll / PIXELS_PER_NOTCH;
        if notches == 0 {
            return Ok(());
        }
        self.pending_scroll -= notches * PIXELS_PER_NOTCH;
        let notches = i32::try_from(notches).unwrap_or(if notches < 0 { i32::MIN } else { i32::MAX });
        trace!(target: "humanpace::replay", delta, notches, "scroll");
        self.enigo.scroll(notches, Axis::Vertical)?;
        Ok(())
    }
}
