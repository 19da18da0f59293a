//! Daily and hourly action quotas.
//!
//! Counters live in fixed calendar buckets: the hourly count resets when the
//! local hour changes, both reset when the local date changes. Resetting is an
//! explicit [`QuotaTracker::tick`], so every query is a pure read. A caller can
//! exhaust a bucket just before a boundary and again just after it; the
//! quota bounds actions per calendar hour/day, not per rolling window.

use chrono::{DateTime, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RateLimitConfig;
use crate::utils::clock::Clock;

/// Kinds of action that are budgeted separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Connections,
    Messages,
    Searches,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 3] = [
        ResourceClass::Connections,
        ResourceClass::Messages,
        ResourceClass::Searches,
    ];
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceClass::Connections => "connections",
            ResourceClass::Messages => "messages",
            ResourceClass::Searches => "searches",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaLimits {
    pub daily: u32,
    pub hourly: u32,
}

impl QuotaLimits {
    /// Limits for `class`. Searches have no hourly bucket of their own, so
    /// their hourly limit equals the daily one.
    pub fn for_class(config: &RateLimitConfig, class: ResourceClass) -> Self {
        match class {
            ResourceClass::Connections => Self {
                daily: config.daily_connection_limit,
                hourly: config.hourly_connection_limit,
            },
            ResourceClass::Messages => Self {
                daily: config.daily_message_limit,
                hourly: config.hourly_message_limit,
            },
            ResourceClass::Searches => Self {
                daily: config.daily_search_limit,
                hourly: config.daily_search_limit,
            },
        }
    }
}

/// Which bucket a [`QuotaTracker::tick`] rolled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rollover {
    /// New calendar day: both counters cleared.
    Day,
    /// New hour on the same day: hourly counter cleared.
    Hour,
}

/// Counters for one resource class. Not internally synchronized; share it
/// behind a lock if several tasks record against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaTracker {
    resource: ResourceClass,
    limits: QuotaLimits,
    daily_count: u32,
    hourly_count: u32,
    /// Local wall-clock time of the last reset.
    last_reset: NaiveDateTime,
}

impl QuotaTracker {
    pub fn new(resource: ResourceClass, limits: QuotaLimits, now: NaiveDateTime) -> Self {
        Self {
            resource,
            limits,
            daily_count: 0,
            hourly_count: 0,
            last_reset: now,
        }
    }

    /// Roll the buckets forward to `now` (local wall-clock time).
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<Rollover> {
        let rollover = if now.date() != self.last_reset.date() {
            self.daily_count = 0;
            self.hourly_count = 0;
            Rollover::Day
        } else if now.hour() != self.last_reset.hour() {
            self.hourly_count = 0;
            Rollover::Hour
        } else {
            return None;
        };
        self.last_reset = now;
        debug!(
            target: "humanpace::quota",
            resource = %self.resource, ?rollover, %now,
            "Quota window rolled over"
        );
        Some(rollover)
    }

    /// Whether both buckets still have room.
    pub fn can_proceed(&self) -> bool {
        if self.daily_count >= self.limits.daily {
            warn!(
                target: "humanpace::quota",
                resource = %self.resource, count = self.daily_count, limit = self.limits.daily,
                "Daily limit reached"
            );
            return false;
        }
        if self.hourly_count >= self.limits.hourly {
            warn!(
                target: "humanpace::quota",
                resource = %self.resource, count = self.hourly_count, limit = self.limits.hourly,
                "Hourly limit reached"
            );
            return false;
        }
        true
    }

    /// Count one action against both buckets.
    pub fn record_action(&mut self) {
        self.daily_count = self.daily_count.saturating_add(1);
        self.hourly_count = self.hourly_count.saturating_add(1);
    }

    /// Actions left as `(daily, hourly)`, never negative.
    pub fn remaining(&self) -> (u32, u32) {
        (
            self.limits.daily.saturating_sub(self.daily_count),
            self.limits.hourly.saturating_sub(self.hourly_count),
        )
    }

    pub fn resource(&self) -> ResourceClass {
        self.resource
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    pub fn daily_count(&self) -> u32 {
        self.daily_count
    }

    pub fn hourly_count(&self) -> u32 {
        self.hourly_count
    }

    pub fn last_reset(&self) -> NaiveDateTime {
        self.last_reset
    }
}

/// One tracker per [`ResourceClass`], read against a clock in a fixed
/// timezone.
pub struct QuotaBook {
    clock: Arc<dyn Clock>,
    timezone: Tz,
    connections: QuotaTracker,
    messages: QuotaTracker,
    searches: QuotaTracker,
}

impl QuotaBook {
    pub fn new(limits: &RateLimitConfig, timezone: Tz, clock: Arc<dyn Clock>) -> Self {
        let now = local_now(clock.as_ref(), timezone);
        let tracker = |class| QuotaTracker::new(class, QuotaLimits::for_class(limits, class), now);
        Self {
            connections: tracker(ResourceClass::Connections),
            messages: tracker(ResourceClass::Messages),
            searches: tracker(ResourceClass::Searches),
            clock,
            timezone,
        }
    }

    /// Roll every tracker forward to the clock's current local time.
    pub fn tick(&mut self) -> Vec<(ResourceClass, Rollover)> {
        let now = local_now(self.clock.as_ref(), self.timezone);
        ResourceClass::ALL
            .into_iter()
            .filter_map(|class| self.tracker_mut(class).tick(now).map(|r| (class, r)))
            .collect()
    }

    /// Tick, then record an action for `class` if its quota allows.
    pub fn try_acquire(&mut self, class: ResourceClass) -> bool {
        self.tick();
        let tracker = self.tracker_mut(class);
        if !tracker.can_proceed() {
            return false;
        }
        tracker.record_action();
        let (daily, hourly) = tracker.remaining();
        info!(
            target: "humanpace::quota",
            resource = %class, daily_left = daily, hourly_left = hourly,
            "Action recorded"
        );
        true
    }

    pub fn can_proceed(&self, class: ResourceClass) -> bool {
        self.tracker(class).can_proceed()
    }

    pub fn record_action(&mut self, class: ResourceClass) {
        self.tracker_mut(class).record_action();
    }

    pub fn remaining(&self, class: ResourceClass) -> (u32, u32) {
        self.tracker(class).remaining()
    }

    pub fn tracker(&self, class: ResourceClass) -> &QuotaTracker {
        match class {
            ResourceClass::Connections => &self.connections,
            ResourceClass::Messages => &self.messages,
            ResourceClass::Searches => &self.searches,
        }
    }

    fn tracker_mut(&mut self, class: ResourceClass) -> &mut QuotaTracker {
        match class {
            ResourceClass::Connections => &mut self.connections,
            ResourceClass::Messages => &mut self.messages,
            ResourceClass::Searches => &mut self.searches,
        }
    }

    pub fn trackers(&self) -> [&QuotaTracker; 3] {
        [&self.connections, &self.messages, &self.searches]
    }
}

fn local_now(clock: &dyn Clock, timezone: Tz) -> NaiveDateTime {
    let now: DateTime<Tz> = clock.now().with_timezone(&timezone);
    now.naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ManualClock;
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone, Utc};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn tracker(daily: u32, hourly: u32, now: NaiveDateTime) -> QuotaTracker {
        QuotaTracker::new(ResourceClass::Connections, QuotaLimits { daily, hourly }, now)
    }

    #[test]
    fn daily_limit_blocks_until_next_day() {
        let mut t = tracker(3, 10, at(6, 9, 0));
        for _ in 0..3 {
            assert!(t.can_proceed());
            t.record_action();
        }
        assert!(!t.can_proceed());
        assert_eq!(t.remaining(), (0, 7));

        assert_eq!(t.tick(at(7, 8, 0)), Some(Rollover::Day));
        assert!(t.can_proceed());
        assert_eq!((t.daily_count(), t.hourly_count()), (0, 0));
    }

    #[test]
    fn hour_change_clears_only_hourly() {
        let mut t = tracker(10, 2, at(6, 9, 10));
        t.record_action();
        t.record_action();
        assert!(!t.can_proceed());

        assert_eq!(t.tick(at(6, 9, 59)), None);
        assert!(!t.can_proceed());

        assert_eq!(t.tick(at(6, 10, 0)), Some(Rollover::Hour));
        assert_eq!((t.daily_count(), t.hourly_count()), (2, 0));
        assert!(t.can_proceed());
        assert_eq!(t.last_reset(), at(6, 10, 0));
    }

    #[test]
    fn same_day_of_month_in_another_month_is_a_new_day() {
        let mut t = tracker(1, 1, at(5, 9, 0));
        t.record_action();
        let next_month = NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(t.tick(next_month), Some(Rollover::Day));
        assert!(t.can_proceed());
    }

    #[test]
    fn queries_do_not_mutate() {
        let mut t = tracker(5, 5, at(6, 9, 0));
        t.record_action();
        let before = t.clone();
        let _ = t.can_proceed();
        let _ = t.remaining();
        assert_eq!(t, before);
    }

    #[test]
    fn remaining_saturates_past_the_limit() {
        let mut t = tracker(1, 1, at(6, 9, 0));
        for _ in 0..5 {
            t.record_action();
        }
        assert_eq!(t.remaining(), (0, 0));
    }

    #[test]
    fn boundary_allows_back_to_back_bursts() {
        // Calendar buckets, not a sliding window: two full hours of quota can
        // be spent within two minutes.
        let mut t = tracker(100, 5, at(6, 9, 59));
        (0..5).for_each(|_| t.record_action());
        assert!(!t.can_proceed());
        t.tick(at(6, 10, 0));
        (0..5).for_each(|_| t.record_action());
        assert_eq!(t.daily_count(), 10);
    }

    #[test]
    fn search_limits_have_no_separate_hourly_bucket() {
        let limits = QuotaLimits::for_class(&RateLimitConfig::default(), ResourceClass::Searches);
        assert_eq!(limits, QuotaLimits { daily: 100, hourly: 100 });
    }

    #[test]
    fn book_rolls_over_on_local_midnight() {
        // 14:30 UTC is 23:30 in Tokyo.
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 2, 14, 30, 0).unwrap(),
        ));
        let limits = RateLimitConfig {
            daily_connection_limit: 2,
            hourly_connection_limit: 2,
            ..RateLimitConfig::default()
        };
        let mut book = QuotaBook::new(&limits, chrono_tz::Asia::Tokyo, clock.clone());

        assert!(book.try_acquire(ResourceClass::Connections));
        assert!(book.try_acquire(ResourceClass::Connections));
        assert!(!book.try_acquire(ResourceClass::Connections));
        assert_eq!(book.remaining(ResourceClass::Connections), (0, 0));
        assert_eq!(book.remaining(ResourceClass::Messages), (50, 10));

        clock.advance(ChronoDuration::hours(1));
        let rolled = book.tick();
        assert!(rolled.contains(&(ResourceClass::Connections, Rollover::Day)));
        assert!(book.can_proceed(ResourceClass::Connections));
        assert_eq!(book.tracker(ResourceClass::Connections).daily_count(), 0);
    }
}
