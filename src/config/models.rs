use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::time::Duration;

/// Root configuration for humanpace.
///
/// Deserialized from a JSON file. Every section has defaults, so `{}` is a
/// valid configuration:
/// - `mouse`: pointer path shape and speed
/// - `typing`: keystroke cadence and typo injection
/// - `scrolling`: scroll chunking, scroll-back and pauses
/// - `timing`: generic action/think/page-load delays
/// - `rate_limits`: daily and hourly quotas per resource class
/// - `schedule`: working-hours gate and breaks
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[validate]
    pub mouse: MouseConfig,
    #[validate]
    pub typing: TypingConfig,
    #[validate]
    pub scrolling: ScrollConfig,
    #[validate]
    pub timing: TimingConfig,
    #[validate]
    pub rate_limits: RateLimitConfig,
    #[validate]
    pub schedule: ScheduleConfig,
}

/// Pointer movement settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(default)]
pub struct MouseConfig {
    /// When false, paths are a straight jump `[start, end]`.
    pub enabled: bool,
    /// Lower bound of the speed multiplier (1.0 = 500 px/s).
    #[validate(exclusive_minimum = 0.0)]
    pub min_speed: f64,
    /// Upper bound of the speed multiplier.
    #[validate(exclusive_minimum = 0.0)]
    pub max_speed: f64,
    /// Occasionally travel past the target and correct back.
    pub overshoot_enabled: bool,
    /// Sub-pixel jitter and tremor points along the path.
    pub micro_movements: bool,
    /// Number of interior Bezier control points (values below 2 act as 2).
    #[validate(maximum = 16)]
    pub bezier_complexity: u32,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_speed: 0.5,
            max_speed: 2.0,
            overshoot_enabled: true,
            micro_movements: true,
            bezier_complexity: 3,
        }
    }
}

/// Keystroke cadence settings. Delays are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(default)]
pub struct TypingConfig {
    /// When false, every character is emitted with zero delay.
    pub enabled: bool,
    pub min_key_delay_ms: u64,
    pub max_key_delay_ms: u64,
    /// Probability of a corrected typo per non-whitespace key.
    #[validate(minimum = 0.0)]
    #[validate(maximum = 1.0)]
    pub typo_chance: f64,
    /// Delay before the backspace that corrects a typo.
    pub correction_delay_ms: u64,
    /// Probability of a think pause at a word boundary.
    #[validate(minimum = 0.0)]
    #[validate(maximum = 1.0)]
    pub think_pause_chance: f64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_key_delay_ms: 50,
            max_key_delay_ms: 150,
            typo_chance: 0.02,
            correction_delay_ms: 300,
            think_pause_chance: 0.05,
        }
    }
}

impl TypingConfig {
    pub fn min_key_delay(&self) -> Duration {
        Duration::from_millis(self.min_key_delay_ms)
    }

    pub fn max_key_delay(&self) -> Duration {
        Duration::from_millis(self.max_key_delay_ms)
    }

    pub fn correction_delay(&self) -> Duration {
        Duration::from_millis(self.correction_delay_ms)
    }
}

/// Scroll sequencing settings. Speeds are pixels per chunk.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(default)]
pub struct ScrollConfig {
    /// When false, a scroll is a single action carrying the full delta.
    pub enabled: bool,
    #[validate(minimum = 1)]
    pub min_speed: u32,
    #[validate(minimum = 1)]
    pub max_speed: u32,
    /// Probability of scrolling back a little before continuing.
    #[validate(minimum = 0.0)]
    #[validate(maximum = 1.0)]
    pub scroll_back_chance: f64,
    /// Probability of a reading pause after each chunk.
    #[validate(minimum = 0.0)]
    #[validate(maximum = 1.0)]
    pub pause_chance: f64,
    /// Split each chunk into eased sub-steps.
    pub smooth_scrolling: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_speed: 50,
            max_speed: 200,
            scroll_back_chance: 0.1,
            pause_chance: 0.15,
            smooth_scrolling: true,
        }
    }
}

/// Generic delay ranges. Durations are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub min_action_delay_ms: u64,
    pub max_action_delay_ms: u64,
    pub min_think_time_ms: u64,
    pub max_think_time_ms: u64,
    pub page_load_wait_ms: u64,
    /// Symmetric jitter fraction applied to random delays (0.3 = ±30%).
    #[validate(minimum = 0.0)]
    #[validate(maximum = 1.0)]
    pub human_variation: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_action_delay_ms: 500,
            max_action_delay_ms: 2000,
            min_think_time_ms: 1000,
            max_think_time_ms: 5000,
            page_load_wait_ms: 3000,
            human_variation: 0.3,
        }
    }
}

impl TimingConfig {
    pub fn min_action_delay(&self) -> Duration {
        Duration::from_millis(self.min_action_delay_ms)
    }

    pub fn max_action_delay(&self) -> Duration {
        Duration::from_millis(self.max_action_delay_ms)
    }

    pub fn min_think_time(&self) -> Duration {
        Duration::from_millis(self.min_think_time_ms)
    }

    pub fn max_think_time(&self) -> Duration {
        Duration::from_millis(self.max_think_time_ms)
    }

    pub fn page_load_wait(&self) -> Duration {
        Duration::from_millis(self.page_load_wait_ms)
    }
}

/// Daily and hourly action quotas. A zero daily limit would block a resource
/// for good, so daily limits start at 1.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    #[validate(minimum = 1)]
    pub daily_connection_limit: u32,
    pub hourly_connection_limit: u32,
    #[validate(minimum = 1)]
    pub daily_message_limit: u32,
    pub hourly_message_limit: u32,
    /// Searches only have a daily bucket.
    #[validate(minimum = 1)]
    pub daily_search_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            daily_connection_limit: 25,
            hourly_connection_limit: 5,
            daily_message_limit: 50,
            hourly_message_limit: 10,
            daily_search_limit: 100,
        }
    }
}

/// Working-hours window.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// When false, every instant counts as working hours.
    pub enabled: bool,
    /// First allowed hour (inclusive), 0-23.
    #[validate(maximum = 23)]
    pub start_hour: u32,
    /// First disallowed hour (exclusive), 1-24.
    #[validate(maximum = 24)]
    pub end_hour: u32,
    /// IANA timezone name, e.g. "America/New_York".
    pub timezone: String,
    /// Allowed weekdays, numbered from Sunday = 0 to Saturday = 6.
    #[validate(unique_items)]
    pub work_days: Vec<u8>,
    /// Allow the scheduler to suggest breaks.
    pub random_breaks: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_hour: 9,
            end_hour: 18,
            timezone: "America/New_York".to_string(),
            work_days: vec![1, 2, 3, 4, 5],
            random_breaks: true,
        }
    }
}
