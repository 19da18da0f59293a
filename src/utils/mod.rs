//! Utilities for humanpace.
//!
//! Submodules:
//! - `clock`: Wall-clock abstraction (`SystemClock`, `ManualClock` for tests).
//! - `duration_ms`: Serde helper writing a `Duration` as fractional milliseconds.

pub mod clock;
pub mod duration_ms;
