//! Working-hours gate and break-taking policy.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::resolve_timezone;
use crate::config::ScheduleConfig;
use crate::error::Result;
use crate::humanize::policy::{Chance, ChanceTable};
use crate::humanize::timing::{sleep, uniform_between};
use crate::utils::clock::Clock;

/// Upper bound on the day-by-day scan for the next working window.
const WINDOW_SCAN_DAYS: usize = 8;

const WARM_UP_MINUTES: i64 = 15;
const SPONTANEOUS_AFTER_MINUTES: i64 = 20;
const SPONTANEOUS_BREAK_CHANCE: f64 = 0.1;
const BREAK_INTERVAL_MIN_MINUTES: i64 = 30;
const BREAK_INTERVAL_MAX_MINUTES: i64 = 60;

/// A DST gap is crossed by probing forward in these steps, up to a day.
const GAP_PROBE_MINUTES: i64 = 15;
const GAP_PROBE_STEPS: i64 = 96;
const MAX_WEST_OFFSET_HOURS: i64 = 12;

/// Largest shift applied to either edge of the daily activity window.
const WINDOW_VARIATION_MINUTES: i64 = 30;

/// Snapshot of a scheduler session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleStats {
    #[serde(rename = "activity_duration_ms", serialize_with = "crate::utils::duration_ms::serialize")]
    pub activity_duration: Duration,
    pub breaks_taken: u32,
    pub last_break: Option<DateTime<Utc>>,
    pub is_working_hours: bool,
}

/// Decides when activity is allowed and when to pause for a break.
pub struct ActivityScheduler<R = StdRng> {
    config: ScheduleConfig,
    timezone: Tz,
    clock: Arc<dyn Clock>,
    chances: ChanceTable,
    rng: R,
    session_start: DateTime<Utc>,
    last_break: Option<DateTime<Utc>>,
    breaks_taken: u32,
}

impl ActivityScheduler<StdRng> {
    pub fn new(config: ScheduleConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(config, clock, StdRng::from_os_rng())
    }
}

impl<R: Rng> ActivityScheduler<R> {
    pub fn with_rng(config: ScheduleConfig, clock: Arc<dyn Clock>, rng: R) -> Self {
        let timezone = resolve_timezone(&config.timezone);
        let session_start = clock.now();
        Self {
            config,
            timezone,
            clock,
            chances: ChanceTable::new().with(Chance::SpontaneousBreak, SPONTANEOUS_BREAK_CHANCE),
            rng,
            session_start,
            last_break: None,
            breaks_taken: 0,
        }
    }

    #[must_use]
    pub fn with_chances(mut self, chances: ChanceTable) -> Self {
        self.chances = chances;
        self
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn breaks_taken(&self) -> u32 {
        self.breaks_taken
    }

    pub fn last_break(&self) -> Option<DateTime<Utc>> {
        self.last_break
    }

    /// True when the current local weekday is a work day and the hour lies
    /// in `[start_hour, end_hour)`. Always true when scheduling is disabled.
    pub fn is_within_working_hours(&self) -> bool {
        if !self.config.enabled {
            return true;
        }
        let now = self.local_now();
        let weekday = now.weekday().num_days_from_sunday();
        if !self.is_work_day(now) {
            debug!(target: "humanpace::schedule", weekday, "Not a work day");
            return false;
        }
        let hour = now.hour();
        let inside = hour >= self.config.start_hour && hour < self.config.end_hour;
        if !inside {
            debug!(
                target: "humanpace::schedule",
                hour, start = self.config.start_hour, end = self.config.end_hour,
                "Outside working hours"
            );
        }
        inside
    }

    /// Earliest instant at or after `from` that falls inside a working
    /// window. The scan is bounded, so with no usable work day it gives up
    /// and returns the midnight where it stopped.
    pub fn next_working_time(&self, from: DateTime<Tz>) -> DateTime<Tz> {
        let mut current = from;
        for _ in 0..WINDOW_SCAN_DAYS {
            if self.is_work_day(current) {
                let start = self.local_at(current.date_naive(), self.config.start_hour);
                if current < start {
                    return start;
                }
                if current.hour() < self.config.end_hour {
                    return current;
                }
            }
            let Some(next_day) = current.date_naive().succ_opt() else {
                break;
            };
            current = self.local_at(next_day, 0);
        }
        current
    }

    /// Return at once inside working hours, otherwise sleep until the next
    /// window opens.
    pub async fn wait_for_window(&self, token: &CancellationToken) -> Result<()> {
        if self.is_within_working_hours() {
            return Ok(());
        }
        let now = self.local_now();
        let next = self.next_working_time(now);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(
            target: "humanpace::schedule",
            resume_at = %next.to_rfc3339(), wait_secs = wait.as_secs(),
            "Waiting for working hours"
        );
        sleep(token, wait).await
    }

    /// Whether the session has run long enough without a pause to justify
    /// one now.
    pub fn should_take_break(&mut self) -> bool {
        if !self.config.random_breaks {
            return false;
        }
        let now = self.clock.now();
        if now - self.session_start < ChronoDuration::minutes(WARM_UP_MINUTES) {
            return false;
        }
        let since_last = now - self.last_break.unwrap_or(self.session_start);
        let interval = ChronoDuration::minutes(
            self.rng
                .random_range(BREAK_INTERVAL_MIN_MINUTES..BREAK_INTERVAL_MAX_MINUTES),
        );
        if since_last > interval {
            return true;
        }
        since_last > ChronoDuration::minutes(SPONTANEOUS_AFTER_MINUTES)
            && self.chances.roll(Chance::SpontaneousBreak, &mut self.rng)
    }

    /// Sleep for a break and record it. A cancelled break is not recorded.
    pub async fn take_break(&mut self, token: &CancellationToken) -> Result<Duration> {
        let duration = self.break_duration();
        info!(
            target: "humanpace::schedule",
            secs = duration.as_secs(), breaks_taken = self.breaks_taken,
            "Taking a break"
        );
        sleep(token, duration).await?;
        self.last_break = Some(self.clock.now());
        self.breaks_taken = self.breaks_taken.saturating_add(1);
        info!(target: "humanpace::schedule", "Break finished, resuming activity");
        Ok(duration)
    }

    /// Break length for the next break. Early breaks are short, later ones
    /// longer.
    pub fn break_duration(&mut self) -> Duration {
        let (min, max) = match self.breaks_taken {
            0 => (1, 5),
            1 | 2 => (2, 15),
            _ => (5, 20),
        };
        uniform_between(&mut self.rng, minutes(min), minutes(max))
    }

    /// Time left before today's window closes; zero once it has. A day when
    /// scheduling is disabled.
    pub fn time_until_end_of_day(&self) -> Duration {
        if !self.config.enabled {
            return minutes(24 * 60);
        }
        let now = self.local_now();
        let end = self.local_at(now.date_naive(), self.config.end_hour);
        (end - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Today's window with both edges pulled inwards by up to half an hour,
    /// so sessions do not start and stop on the hour.
    pub fn daily_activity_window(&mut self) -> (DateTime<Tz>, DateTime<Tz>) {
        let today = self.local_now().date_naive();
        let start_shift = self.rng.random_range(0..WINDOW_VARIATION_MINUTES);
        let end_shift = self.rng.random_range(0..WINDOW_VARIATION_MINUTES);
        let start = self.local_at(today, self.config.start_hour) + ChronoDuration::minutes(start_shift);
        let end = self.local_at(today, self.config.end_hour) - ChronoDuration::minutes(end_shift);
        (start, end)
    }

    pub fn stats(&self) -> ScheduleStats {
        ScheduleStats {
            activity_duration: (self.clock.now() - self.session_start)
                .to_std()
                .unwrap_or(Duration::ZERO),
            breaks_taken: self.breaks_taken,
            last_break: self.last_break,
            is_working_hours: self.is_within_working_hours(),
        }
    }

    fn local_now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.timezone)
    }

    fn is_work_day(&self, at: DateTime<Tz>) -> bool {
        let weekday = at.weekday().num_days_from_sunday();
        self.config.work_days.iter().any(|&d| u32::from(d) == weekday)
    }

    /// `hour:00` local time on `date`; hour 24 is the next midnight. A wall
    /// time skipped by a DST jump resolves to the first instant after the
    /// gap, so the result never moves backwards.
    fn local_at(&self, date: NaiveDate, hour: u32) -> DateTime<Tz> {
        let naive = date.and_time(NaiveTime::MIN) + ChronoDuration::hours(i64::from(hour));
        (0..=GAP_PROBE_STEPS)
            .map(|i| naive + ChronoDuration::minutes(GAP_PROBE_MINUTES * i))
            .find_map(|probe| self.timezone.from_local_datetime(&probe).earliest())
            // No zone sits more than 12h west of UTC, so this reading is
            // never earlier than the wall time asked for.
            .unwrap_or_else(|| {
                self.timezone
                    .from_utc_datetime(&(naive + ChronoDuration::hours(MAX_WEST_OFFSET_HOURS)))
            })
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::utils::clock::ManualClock;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn config(timezone: &str) -> ScheduleConfig {
        ScheduleConfig {
            timezone: timezone.to_string(),
            ..ScheduleConfig::default()
        }
    }

    fn scheduler(cfg: ScheduleConfig, now: DateTime<Utc>) -> (ActivityScheduler<StdRng>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let s = ActivityScheduler::with_rng(cfg, clock.clone(), StdRng::seed_from_u64(9));
        (s, clock)
    }

    #[test]
    fn working_hours_across_timezones() {
        // Wednesday 2025-06-04 13:30 UTC.
        let wed = utc(2025, 6, 4, 13, 30);
        let cases = [
            ("America/New_York", true), // 09:30
            ("Europe/Berlin", true),    // 15:30
            ("Asia/Tokyo", false),      // 22:30
            ("Asia/Kolkata", false),    // 19:00
            ("UTC", true),              // 13:30
        ];
        for (tz, expected) in cases {
            let (s, _) = scheduler(config(tz), wed);
            assert_eq!(s.is_within_working_hours(), expected, "{tz}");
        }
    }

    #[test]
    fn weekday_is_taken_in_the_configured_timezone() {
        // Monday 00:30 UTC: still Sunday evening in New York, Monday morning
        // in Tokyo.
        let now = utc(2025, 6, 9, 0, 30);
        let (ny, _) = scheduler(config("America/New_York"), now);
        let (tokyo, _) = scheduler(config("Asia/Tokyo"), now);
        assert!(!ny.is_within_working_hours());
        assert!(tokyo.is_within_working_hours());
    }

    #[test]
    fn end_hour_is_exclusive() {
        let (s, clock) = scheduler(config("UTC"), utc(2025, 6, 4, 17, 59));
        assert!(s.is_within_working_hours());
        clock.set(utc(2025, 6, 4, 18, 0));
        assert!(!s.is_within_working_hours());
    }

    #[test]
    fn disabled_schedule_is_always_open() {
        let mut cfg = config("UTC");
        cfg.enabled = false;
        let (s, _) = scheduler(cfg, utc(2025, 6, 7, 3, 0));
        assert!(s.is_within_working_hours());
        assert_eq!(s.time_until_end_of_day(), minutes(24 * 60));
    }

    #[test]
    fn next_working_time_skips_the_weekend() {
        let (s, _) = scheduler(config("America/New_York"), utc(2025, 6, 4, 12, 0));
        let tz = s.timezone();
        let friday_evening = tz.with_ymd_and_hms(2025, 6, 6, 19, 0, 0).unwrap();
        let monday_start = tz.with_ymd_and_hms(2025, 6, 9, 9, 0, 0).unwrap();
        assert_eq!(s.next_working_time(friday_evening), monday_start);
    }

    #[test]
    fn next_working_time_same_day() {
        let (s, _) = scheduler(config("Europe/Berlin"), utc(2025, 6, 4, 12, 0));
        let tz = s.timezone();
        let early = tz.with_ymd_and_hms(2025, 6, 4, 7, 0, 0).unwrap();
        let inside = tz.with_ymd_and_hms(2025, 6, 4, 10, 15, 0).unwrap();
        assert_eq!(
            s.next_working_time(early),
            tz.with_ymd_and_hms(2025, 6, 4, 9, 0, 0).unwrap()
        );
        assert_eq!(s.next_working_time(inside), inside);
    }

    #[test]
    fn next_working_time_terminates_without_work_days() {
        let mut cfg = config("UTC");
        cfg.work_days.clear();
        let (s, _) = scheduler(cfg, utc(2025, 6, 4, 12, 0));
        let from = s.timezone().with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();
        let stop = s.next_working_time(from);
        assert_eq!(stop, s.timezone().with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap());
    }

    #[test]
    fn next_working_time_crosses_a_midnight_dst_gap() {
        // Santiago skips 2025-09-07 00:00-01:00 local.
        let (s, _) = scheduler(config("America/Santiago"), utc(2025, 9, 7, 0, 0));
        let tz = s.timezone();
        let saturday_evening = tz.with_ymd_and_hms(2025, 9, 6, 20, 0, 0).unwrap();
        let monday_start = tz.with_ymd_and_hms(2025, 9, 8, 9, 0, 0).unwrap();
        assert_eq!(s.next_working_time(saturday_evening), monday_start);

        let skipped = NaiveDate::from_ymd_opt(2025, 9, 7).unwrap();
        let after_gap = s.local_at(skipped, 0);
        assert_eq!(after_gap, tz.with_ymd_and_hms(2025, 9, 7, 1, 0, 0).unwrap());
        assert!(after_gap > saturday_evening);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_window_sleeps_across_a_dst_gap() {
        let (s, _) = scheduler(config("America/Santiago"), utc(2025, 9, 7, 0, 0));
        assert!(!s.is_within_working_hours());
        let token = CancellationToken::new();
        let before = tokio::time::Instant::now();
        s.wait_for_window(&token).await.unwrap();
        // Saturday 20:00 -04 until Monday 09:00 -03.
        let waited = before.elapsed();
        assert!(waited >= Duration::from_secs(36 * 3600));
        assert!(waited < Duration::from_secs(36 * 3600 + 1));
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let (s, _) = scheduler(config("Mars/Olympus_Mons"), utc(2025, 6, 4, 12, 0));
        assert_eq!(s.timezone(), Tz::UTC);
    }

    #[tokio::test]
    async fn wait_for_window_inside_returns_at_once() {
        let (s, _) = scheduler(config("UTC"), utc(2025, 6, 4, 10, 0));
        let token = CancellationToken::new();
        token.cancel();
        // Inside the window the token is never consulted.
        assert!(s.wait_for_window(&token).await.is_ok());
    }

    #[tokio::test]
    async fn wait_for_window_outside_is_cancellable() {
        let (s, _) = scheduler(config("UTC"), utc(2025, 6, 7, 10, 0));
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(s.wait_for_window(&token).await, Err(Error::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_window_outside_sleeps_until_open() {
        let (s, _) = scheduler(config("UTC"), utc(2025, 6, 4, 7, 0));
        let token = CancellationToken::new();
        let before = tokio::time::Instant::now();
        s.wait_for_window(&token).await.unwrap();
        let waited = before.elapsed();
        assert!(waited >= Duration::from_secs(2 * 3600));
        assert!(waited < Duration::from_secs(2 * 3600 + 1));
    }

    #[test]
    fn no_break_during_warm_up_or_when_disabled() {
        let start = utc(2025, 6, 4, 10, 0);
        let (mut s, clock) = scheduler(config("UTC"), start);
        assert!(!s.should_take_break());
        clock.advance(ChronoDuration::minutes(14));
        assert!(!s.should_take_break());

        let mut cfg = config("UTC");
        cfg.random_breaks = false;
        let (mut s, clock) = scheduler(cfg, start);
        clock.advance(ChronoDuration::hours(3));
        assert!(!s.should_take_break());
    }

    #[test]
    fn break_due_after_base_interval() {
        let (mut s, clock) = scheduler(config("UTC"), utc(2025, 6, 4, 10, 0));
        clock.advance(ChronoDuration::minutes(16));
        // Past warm-up but short of both the interval and the spontaneous
        // threshold.
        assert!(!s.should_take_break());
        clock.advance(ChronoDuration::minutes(45));
        assert!(s.should_take_break());
    }

    #[test]
    fn spontaneous_break_follows_the_chance_table() {
        let (s, clock) = scheduler(config("UTC"), utc(2025, 6, 4, 10, 0));
        let mut s = s.with_chances(ChanceTable::new().with(Chance::SpontaneousBreak, 1.0));
        clock.advance(ChronoDuration::minutes(21));
        assert!(s.should_take_break());

        let mut s = s.with_chances(ChanceTable::new());
        assert!(!s.should_take_break());
    }

    #[test]
    fn break_duration_widens_with_breaks_taken() {
        let (mut s, _) = scheduler(config("UTC"), utc(2025, 6, 4, 10, 0));
        for (taken, min, max) in [(0, 1, 5), (1, 2, 15), (2, 2, 15), (3, 5, 20), (7, 5, 20)] {
            s.breaks_taken = taken;
            for _ in 0..50 {
                let d = s.break_duration();
                assert!(d >= minutes(min) && d < minutes(max), "taken = {taken}: {d:?}");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completed_break_is_recorded() {
        let (mut s, clock) = scheduler(config("UTC"), utc(2025, 6, 4, 10, 0));
        clock.advance(ChronoDuration::minutes(70));
        let token = CancellationToken::new();
        let took = s.take_break(&token).await.unwrap();
        assert!(took >= minutes(1) && took < minutes(5));
        assert_eq!(s.breaks_taken(), 1);
        assert_eq!(s.last_break(), Some(clock.now()));

        clock.advance(ChronoDuration::minutes(10));
        assert!(!s.should_take_break());
    }

    #[tokio::test]
    async fn cancelled_break_is_not_recorded() {
        let (mut s, _) = scheduler(config("UTC"), utc(2025, 6, 4, 10, 0));
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(s.take_break(&token).await, Err(Error::Cancelled)));
        assert_eq!(s.breaks_taken(), 0);
        assert_eq!(s.last_break(), None);
    }

    #[test]
    fn end_of_day_and_activity_window() {
        let (mut s, clock) = scheduler(config("UTC"), utc(2025, 6, 4, 16, 30));
        assert_eq!(s.time_until_end_of_day(), minutes(90));
        clock.set(utc(2025, 6, 4, 19, 0));
        assert_eq!(s.time_until_end_of_day(), Duration::ZERO);

        let tz = s.timezone();
        let open = tz.with_ymd_and_hms(2025, 6, 4, 9, 0, 0).unwrap();
        let close = tz.with_ymd_and_hms(2025, 6, 4, 18, 0, 0).unwrap();
        for _ in 0..20 {
            let (start, end) = s.daily_activity_window();
            assert!(start >= open && start < open + ChronoDuration::minutes(30));
            assert!(end <= close && end > close - ChronoDuration::minutes(30));
        }
    }

    #[test]
    fn stats_reflect_session() {
        let (s, clock) = scheduler(config("UTC"), utc(2025, 6, 4, 10, 0));
        clock.advance(ChronoDuration::minutes(5));
        let stats = s.stats();
        assert_eq!(stats.activity_duration, minutes(5));
        assert_eq!(stats.breaks_taken, 0);
        assert!(stats.is_working_hours);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["activity_duration_ms"], 300_000.0);
    }
}
