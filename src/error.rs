use thiserror::Error;

/// Boxed error produced by an [`InputSurface`](crate::executor::InputSurface).
pub type SurfaceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the pacing core.
///
/// Generation is total given a valid configuration, so the only failures are
/// an interrupted wait and a surface refusing an event during replay.
#[derive(Debug, Error)]
pub enum Error {
    /// A wait was interrupted by its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// The input surface failed to apply an event.
    #[error("input surface error: {0}")]
    Surface(#[from] SurfaceError),
}

impl Error {
    /// True for [`Error::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
