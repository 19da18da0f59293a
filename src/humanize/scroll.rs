//! Scroll sequences: a distance broken into uneven chunks, with occasional
//! scroll-backs and reading pauses, each chunk optionally eased into
//! sub-steps.
//!
//! Deltas are signed pixels (positive scrolls down). `Forward` and `Reverse`
//! are relative to the requested travel, so for a negative distance the
//! forward deltas are negative. The deltas of a sequence always add up to the
//! requested distance exactly, and the `steps` of each action add up to its
//! delta.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::policy::{Chance, ChanceTable};
use super::timing::{jitter, millis_between};
use crate::config::ScrollConfig;

const MIN_CHUNK: u64 = 10;
const CHUNK_JITTER: f64 = 0.2;

const PAUSE_MIN_MS: u64 = 500;
const PAUSE_MAX_MS: u64 = 2500;

const SMOOTH_PIXELS_PER_STEP: u64 = 20;
const SMOOTH_MIN_STEPS: u64 = 5;
const SMOOTH_MAX_STEPS: u64 = 50;
const STEP_JITTER: f64 = 0.1;
const SMOOTH_DURATION_JITTER: f64 = 0.3;

const VIEWPORT_SCROLL_MIN: i64 = 100;
const VIEWPORT_SCROLL_MAX: i64 = 400;
const VIEWPORT_SCROLL_UP_CHANCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Forward,
    Reverse,
    Pause,
}

/// One scroll gesture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollAction {
    /// Signed pixels; zero for pauses.
    pub delta: i64,
    /// Time the gesture (or pause) takes.
    #[serde(rename = "duration_ms", serialize_with = "crate::utils::duration_ms::serialize")]
    pub duration: Duration,
    pub direction: ScrollDirection,
    /// Wheel sub-steps, in order; they sum to `delta`. Empty for pauses.
    pub steps: Vec<i64>,
}

impl ScrollAction {
    fn pause(duration: Duration) -> Self {
        Self {
            delta: 0,
            duration,
            direction: ScrollDirection::Pause,
            steps: Vec::new(),
        }
    }

    pub fn is_pause(&self) -> bool {
        self.direction == ScrollDirection::Pause
    }
}

/// Net pixels travelled by a sequence.
pub fn net_distance(actions: &[ScrollAction]) -> i64 {
    actions.iter().map(|a| a.delta).sum()
}

/// Turns scroll distances into gesture sequences.
#[derive(Debug, Clone)]
pub struct ScrollSequencer<R = StdRng> {
    config: ScrollConfig,
    chances: ChanceTable,
    rng: R,
}

impl ScrollSequencer<StdRng> {
    pub fn new(config: ScrollConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> ScrollSequencer<R> {
    pub fn with_rng(config: ScrollConfig, rng: R) -> Self {
        let chances = ChanceTable::new()
            .with(Chance::ScrollBack, config.scroll_back_chance)
            .with(Chance::ScrollPause, config.pause_chance);
        Self {
            config,
            chances,
            rng,
        }
    }

    #[must_use]
    pub fn with_chances(mut self, chances: ChanceTable) -> Self {
        self.chances = chances;
        self
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn chances(&self) -> &ChanceTable {
        &self.chances
    }

    /// Gestures that travel exactly `distance` pixels.
    pub fn generate_scroll_sequence(&mut self, distance: i64) -> Vec<ScrollAction> {
        if !self.config.enabled {
            return vec![ScrollAction {
                delta: distance,
                duration: Duration::ZERO,
                direction: ScrollDirection::Forward,
                steps: vec![distance],
            }];
        }

        let sign = distance.signum();
        let mut remaining = distance.unsigned_abs();
        let mut actions = Vec::new();

        while remaining > 0 {
            let speed = self.draw_speed();
            let chunk = self.chunk_size(remaining, speed);
            let mut forward = chunk;

            if remaining > chunk * 2 && self.chances.roll(Chance::ScrollBack, &mut self.rng) {
                let back = chunk / 3;
                if back > 0 {
                    actions.push(self.motion(-sign * back as i64, ScrollDirection::Reverse));
                    // Make up the ground lost to the scroll-back.
                    forward += back;
                }
            }

            actions.push(self.motion(sign * forward as i64, ScrollDirection::Forward));
            remaining -= chunk;

            if self.chances.roll(Chance::ScrollPause, &mut self.rng) {
                let pause = millis_between(&mut self.rng, PAUSE_MIN_MS, PAUSE_MAX_MS);
                actions.push(ScrollAction::pause(pause));
            }
        }

        debug!(
            target: "humanpace::scroll",
            distance, actions = actions.len(),
            "Generated scroll sequence"
        );
        actions
    }

    /// Split `delta` into eased wheel steps (cubic ease-out with ±10%
    /// jitter). The last step takes whatever is left, so the steps sum to
    /// `delta` exactly. Without smooth scrolling this is `[delta]`.
    pub fn smooth_steps(&mut self, delta: i64) -> Vec<i64> {
        if !self.config.smooth_scrolling {
            return vec![delta];
        }

        let sign = delta.signum();
        let magnitude = delta.unsigned_abs();
        let count = (magnitude / SMOOTH_PIXELS_PER_STEP).clamp(SMOOTH_MIN_STEPS, SMOOTH_MAX_STEPS) as usize;

        let total = magnitude as f64;
        let mut left = magnitude;
        let mut steps = Vec::with_capacity(count);
        for i in 0..count {
            if i == count - 1 {
                steps.push(signed(sign, left));
                break;
            }
            let t = i as f64 / (count - 1) as f64;
            let eased = 1.0 - (1.0 - t).powi(3);
            let consumed = (magnitude - left) as f64;
            let target = total * eased - consumed;
            let wobble = 1.0 + STEP_JITTER * (self.rng.random::<f64>() * 2.0 - 1.0);
            let step = ((target * wobble).round().max(0.0) as u64).min(left);
            steps.push(signed(sign, step));
            left -= step;
        }
        steps
    }

    /// A single idle scroll of 100-400 px, upward 30% of the time.
    pub fn random_viewport_scroll(&mut self) -> ScrollAction {
        let magnitude = self.rng.random_range(VIEWPORT_SCROLL_MIN..VIEWPORT_SCROLL_MAX);
        let up = self.rng.random::<f64>() < VIEWPORT_SCROLL_UP_CHANCE;
        let delta = if up { -magnitude } else { magnitude };
        self.motion(delta, ScrollDirection::Forward)
    }

    /// Scroll so that `target_y` ends up about a third of the way down the
    /// viewport. Targets already close enough need no scrolling.
    pub fn scroll_to_element(
        &mut self,
        current_y: i64,
        target_y: i64,
        viewport_height: i64,
    ) -> Vec<ScrollAction> {
        let distance = target_y - current_y - viewport_height / 3;
        if distance > 0 || distance < -viewport_height / 2 {
            self.generate_scroll_sequence(distance)
        } else {
            Vec::new()
        }
    }

    fn draw_speed(&mut self) -> u64 {
        let (a, b) = (self.config.min_speed, self.config.max_speed);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        u64::from(self.rng.random_range(lo..=hi))
    }

    /// `speed` plus up to half again, ±20%, at least [`MIN_CHUNK`] and at
    /// most `remaining`.
    fn chunk_size(&mut self, remaining: u64, speed: u64) -> u64 {
        let extra = if speed / 2 > 0 {
            self.rng.random_range(0..speed / 2)
        } else {
            0
        };
        let base = (speed + extra) as f64;
        let varied = base * (1.0 + CHUNK_JITTER * (self.rng.random::<f64>() * 2.0 - 1.0));
        (varied as u64).max(MIN_CHUNK).min(remaining)
    }

    fn motion(&mut self, delta: i64, direction: ScrollDirection) -> ScrollAction {
        let duration = self.scroll_duration(delta.unsigned_abs());
        let steps = self.smooth_steps(delta);
        ScrollAction {
            delta,
            duration,
            direction,
            steps,
        }
    }

    fn scroll_duration(&mut self, distance: u64) -> Duration {
        if self.config.smooth_scrolling {
            let base = Duration::from_secs_f64(distance as f64 / 2.0 / 1000.0);
            jitter(&mut self.rng, base, SMOOTH_DURATION_JITTER)
        } else {
            millis_between(&mut self.rng, 50, 150)
        }
    }
}

/// `sign × magnitude`, where the magnitude is a share of an `i64`'s
/// absolute value and so always fits once signed.
fn signed(sign: i64, magnitude: u64) -> i64 {
    i64::try_from(i128::from(sign) * i128::from(magnitude))
        .unwrap_or(if sign < 0 { i64::MIN } else { i64::MAX })
}
