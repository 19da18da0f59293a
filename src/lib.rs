#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! humanpace: human-like pacing for automated input.
//!
//! The crate generates pointer paths, keystroke streams, scroll sequences and
//! wait durations that look like organic input, and decides how much may be
//! done and when:
//! - `config`: Configuration models, loader, and schema helpers.
//! - `humanize`: Path, keystroke, scroll and delay generators.
//! - `throttle`: Per-resource quotas and the working-hours scheduler.
//! - `executor`: Replaying generated sequences onto an input surface.
//! - `utils`: Clock abstraction and serde helpers.
//!
//! Use `humanpace::prelude::*` to bring commonly used items into scope quickly.

/// Public module: configuration (models, loader, schema helpers).
pub mod config;
/// Public module: core error type.
pub mod error;
/// Public module: replay onto input surfaces.
pub mod executor;
/// Public module: input sequence generators.
pub mod humanize;
/// Public module: quotas and scheduling.
pub mod throttle;
/// Public module: utilities (clock, serde helpers).
pub mod utils;

pub use error::{Error, Result};

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a level name (trace|debug|info|warn|error).
pub fn parse_level(name: &str) -> Option<tracing::Level> {
    use tracing::Level;

    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - Honors the `RUST_LOG` environment variable if set.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| parse_level(&s))
        .unwrap_or(tracing::Level::INFO);
    init_tracing_with(level);
}

/// Initialize tracing at a fixed level. Writes to stderr so JSON output on
/// stdout stays clean.
pub fn init_tracing_with(level: tracing::Level) {
    // Ignore the error if the global subscriber was already set.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use humanpace::prelude::*;`
pub mod prelude {
    // Core errors
    pub use crate::error::{Error, Result};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Timing and cancellation
    pub use std::time::Duration;
    pub use tokio_util::sync::CancellationToken;

    // External crates (namespaced) if callers want direct access
    pub use crate as humanpace;
    pub use rand;

    // Frequently used items
    pub use crate::config::Config;
    pub use crate::executor::{DryRunSurface, InputSurface, Replayer};
    pub use crate::humanize::{
        ChanceTable, KeystrokeSequencer, PathGenerator, Point, ScrollSequencer, Timing,
    };
    pub use crate::throttle::{ActivityScheduler, QuotaBook, ResourceClass};
    pub use crate::utils::clock::{Clock, SystemClock};
    pub use crate::{config, executor, humanize, throttle, utils};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("WARNING"), Some(tracing::Level::WARN));
        assert_eq!(parse_level("debug"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level("loud"), None);
    }
}
