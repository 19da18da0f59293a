//! Serialize a `std::time::Duration` as fractional milliseconds, which is how
//! generated sequences are rendered in JSON output.

use serde::Serializer;
use std::time::Duration;

pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}
