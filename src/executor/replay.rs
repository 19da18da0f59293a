use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::surface::InputSurface;
use crate::error::Result;
use crate::humanize::{KeyStroke, Point, ScrollAction, sleep};

/// Plays generated sequences against an [`InputSurface`] in real time.
///
/// Every event waits first, then fires, and every wait goes through the
/// cancellable sleep. Cancelling the token stops replay before the next
/// event; events already applied stay applied.
pub struct Replayer<S> {
    surface: S,
    token: CancellationToken,
}

impl<S: InputSurface> Replayer<S> {
    pub fn new(surface: S, token: CancellationToken) -> Self {
        Self { surface, token }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn into_inner(self) -> S {
        self.surface
    }

    /// Move through `path`, spreading `total` evenly across its points.
    pub async fn replay_path(&mut self, path: &[Point], total: Duration) -> Result<()> {
        let per_point = split(total, path.len());
        for &point in path {
            sleep(&self.token, per_point).await?;
            self.surface.move_to(point)?;
        }
        debug!(target: "humanpace::replay", points = path.len(), ?total, "Path replayed");
        Ok(())
    }

    pub async fn replay_keystrokes(&mut self, strokes: &[KeyStroke]) -> Result<()> {
        for stroke in strokes {
            sleep(&self.token, stroke.delay).await?;
            if stroke.is_backspace {
                self.surface.backspace()?;
            } else {
                self.surface.type_char(stroke.ch)?;
            }
        }
        debug!(target: "humanpace::replay", strokes = strokes.len(), "Keystrokes replayed");
        Ok(())
    }

    /// Pauses only wait. Gestures wait `duration / steps` before each
    /// wheel sub-step.
    pub async fn replay_scroll(&mut self, actions: &[ScrollAction]) -> Result<()> {
        for action in actions {
            if action.is_pause() {
                sleep(&self.token, action.duration).await?;
                continue;
            }
            let per_step = split(action.duration, action.steps.len());
            for &step in &action.steps {
                sleep(&self.token, per_step).await?;
                self.surface.scroll(step)?;
            }
        }
        debug!(target: "humanpace::replay", actions = actions.len(), "Scroll replayed");
        Ok(())
    }
}

fn split(total: Duration, parts: usize) -> Duration {
    match u32::try_from(parts) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::ZERO,
    }
}
