/*!
Throttling: how much may be done, and when.

- `quota`    -> `QuotaTracker`, `QuotaBook` (daily/hourly counters per resource class)
- `schedule` -> `ActivityScheduler`        (working-hours gate, breaks)

Both read time through a `Clock` so tests can drive them with a
`ManualClock`.
*/

pub mod quota;
pub mod schedule;

pub use quota::{QuotaBook, QuotaLimits, QuotaTracker, ResourceClass, Rollover};
pub use schedule::{ActivityScheduler, ScheduleStats};

use chrono_tz::Tz;
use tracing::warn;

/// Parse an IANA timezone name, falling back to UTC. Configuration loaded
/// through the loader has already been checked, so the fallback only
/// triggers for hand-built configs.
pub fn resolve_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(target: "humanpace::schedule", timezone = name, "Unknown timezone, using UTC");
        Tz::UTC
    })
}
