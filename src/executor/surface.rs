use tracing::info;

use crate::error::SurfaceError;
use crate::humanize::Point;

/// Something that accepts low-level input events: a real desktop, a browser
/// driver, or a logger. Events are applied immediately; pacing is the
/// caller's job.
pub trait InputSurface {
    /// Move the pointer to absolute coordinates.
    fn move_to(&mut self, to: Point) -> Result<(), SurfaceError>;

    /// Press and release the key producing `ch`.
    fn type_char(&mut self, ch: char) -> Result<(), SurfaceError>;

    /// Erase the character before the caret.
    fn backspace(&mut self) -> Result<(), SurfaceError>;

    /// Scroll by `delta` pixels; positive moves down the page.
    fn scroll(&mut self, delta: i64) -> Result<(), SurfaceError>;
}

impl<S: InputSurface + ?Sized> InputSurface for &mut S {
    fn move_to(&mut self, to: Point) -> Result<(), SurfaceError> {
        (**self).move_to(to)
    }

    fn type_char(&mut self, ch: char) -> Result<(), SurfaceError> {
        (**self).type_char(ch)
    }

    fn backspace(&mut self) -> Result<(), SurfaceError> {
        (**self).backspace()
    }

    fn scroll(&mut self, delta: i64) -> Result<(), SurfaceError> {
        (**self).scroll(delta)
    }
}

/// Logs every event instead of performing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSurface {
    events: u64,
}

impl DryRunSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events seen so far.
    pub fn events(&self) -> u64 {
        self.events
    }
}

impl InputSurface for DryRunSurface {
    fn move_to(&mut self, to: Point) -> Result<(), SurfaceError> {
        self.events += 1;
        info!(target: "humanpace::replay", x = to.x, y = to.y, "DRY-RUN move_to");
        Ok(())
    }

    fn type_char(&mut self, ch: char) -> Result<(), SurfaceError> {
        self.events += 1;
        info!(target: "humanpace::replay", %ch, "DRY-RUN type_char");
        Ok(())
    }

    fn backspace(&mut self) -> Result<(), SurfaceError> {
        self.events += 1;
        info!(target: "humanpace::replay", "DRY-RUN backspace");
        Ok(())
    }

    fn scroll(&mut self, delta: i64) -> Result<(), SurfaceError> {
        self.events += 1;
        info!(target: "humanpace::replay", delta, "DRY-RUN scroll");
        Ok(())
    }
}
