//! Random delay primitives and the cancellable sleep every wait goes through.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::TimingConfig;
use crate::error::{Error, Result};

/// Upper bound of the positive jitter added to a backoff delay.
const BACKOFF_JITTER: f64 = 0.3;

/// Symmetric jitter used by [`Timing::sleep_with_jitter`].
const SLEEP_JITTER: f64 = 0.2;

/// Suspend for `duration`, returning early with [`Error::Cancelled`] if
/// `token` fires first. A token that is already cancelled returns at once.
pub async fn sleep(token: &CancellationToken, duration: Duration) -> Result<()> {
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!(target: "humanpace::timing", ?duration, "sleep cancelled");
            Err(Error::Cancelled)
        }
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Uniform draw in `[min, max)`; collapses to `min` for an empty range.
pub(crate) fn uniform_between<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if min >= max {
        return min;
    }
    let span = (max - min).as_secs_f64();
    min + Duration::from_secs_f64(span * rng.random::<f64>())
}

/// `value × (1 ± fraction)`, uniformly. Never negative.
pub(crate) fn jitter<R: Rng + ?Sized>(rng: &mut R, value: Duration, fraction: f64) -> Duration {
    let factor = 1.0 + fraction * (rng.random::<f64>() * 2.0 - 1.0);
    scale(value, factor)
}

pub(crate) fn scale(value: Duration, factor: f64) -> Duration {
    Duration::from_secs_f64((value.as_secs_f64() * factor).max(0.0))
}

pub(crate) fn millis_between<R: Rng + ?Sized>(rng: &mut R, min_ms: u64, max_ms: u64) -> Duration {
    uniform_between(rng, Duration::from_millis(min_ms), Duration::from_millis(max_ms))
}

/// `min(base × 2^attempt, cap)`, saturating at `cap` on overflow. This is
/// the jitter-free floor of [`Timing::exponential_backoff`] and is
/// non-decreasing in `attempt`.
pub fn backoff_ceiling(attempt: u32, base: Duration, cap: Duration) -> Duration {
    1u32.checked_shl(attempt)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(cap, |delay| delay.min(cap))
}

/// Delay model: configured delay presets plus free-form distributions,
/// drawing from one owned random source.
#[derive(Debug, Clone)]
pub struct Timing<R = StdRng> {
    config: TimingConfig,
    rng: R,
}

impl Timing<StdRng> {
    /// Create a delay model seeded from the operating system.
    pub fn new(config: TimingConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> Timing<R> {
    /// Create a delay model over an explicit random source (e.g. a seeded
    /// `StdRng` in tests).
    pub fn with_rng(config: TimingConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Uniform in `[min, max)`, then `± human_variation` jitter, never below
    /// `min`. An empty range yields `min`.
    pub fn random_delay(&mut self, min: Duration, max: Duration) -> Duration {
        if min >= max {
            return min;
        }
        let base = uniform_between(&mut self.rng, min, max);
        let delay = jitter(&mut self.rng, base, self.config.human_variation).max(min);
        trace!(target: "humanpace::timing", ?min, ?max, ?delay, "random_delay");
        delay
    }

    /// Pause between two ordinary actions.
    pub fn action_delay(&mut self) -> Duration {
        self.random_delay(self.config.min_action_delay(), self.config.max_action_delay())
    }

    /// Longer pause, as if reading or deciding.
    pub fn think_delay(&mut self) -> Duration {
        self.random_delay(self.config.min_think_time(), self.config.max_think_time())
    }

    /// Page-load wait plus a positive-only jitter of up to `human_variation`.
    pub fn page_load_delay(&mut self) -> Duration {
        let base = self.config.page_load_wait();
        let extra = self.config.human_variation * self.rng.random::<f64>();
        base + scale(base, extra)
    }

    /// Normal draw around `mean`, clamped to `[mean/4, mean×4]`.
    pub fn gaussian_delay(&mut self, mean: Duration, stddev: Duration) -> Duration {
        let z: f64 = self.rng.sample(StandardNormal);
        let mean_s = mean.as_secs_f64();
        let raw = mean_s + z * stddev.as_secs_f64();
        Duration::from_secs_f64(raw.clamp(mean_s / 4.0, mean_s * 4.0))
    }

    /// [`backoff_ceiling`] plus up to 30% positive jitter, so the result
    /// never exceeds `cap × 1.3`.
    pub fn exponential_backoff(&mut self, attempt: u32, base: Duration, cap: Duration) -> Duration {
        let delay = backoff_ceiling(attempt, base, cap);
        let delay = delay + scale(delay, BACKOFF_JITTER * self.rng.random::<f64>());
        debug!(target: "humanpace::timing", attempt, ?delay, "exponential_backoff");
        delay
    }

    pub async fn sleep_action(&mut self, token: &CancellationToken) -> Result<()> {
        let delay = self.action_delay();
        sleep(token, delay).await
    }

    pub async fn sleep_think(&mut self, token: &CancellationToken) -> Result<()> {
        let delay = self.think_delay();
        sleep(token, delay).await
    }

    pub async fn sleep_page_load(&mut self, token: &CancellationToken) -> Result<()> {
        let delay = self.page_load_delay();
        sleep(token, delay).await
    }

    /// Sleep for `base ± 20%`.
    pub async fn sleep_with_jitter(&mut self, token: &CancellationToken, base: Duration) -> Result<()> {
        let delay = jitter(&mut self.rng, base, SLEEP_JITTER);
        sleep(token, delay).await
    }
}

/// Enforces a minimum gap between consecutive actions.
///
/// The first call passes immediately. Later calls that arrive before
/// `min_gap` has elapsed wait out the shortfall plus a random top-up of up
/// to half of it.
#[derive(Debug, Clone)]
pub struct ActionTimer {
    min_gap: Duration,
    last_action: Option<Instant>,
}

impl ActionTimer {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_action: None,
        }
    }

    pub async fn wait_for_next<R: Rng>(
        &mut self,
        timing: &mut Timing<R>,
        token: &CancellationToken,
    ) -> Result<()> {
        if let Some(last) = self.last_action {
            let elapsed = last.elapsed();
            if elapsed < self.min_gap {
                let shortfall = self.min_gap - elapsed;
                let wait = shortfall + timing.random_delay(Duration::ZERO, shortfall / 2);
                trace!(target: "humanpace::timing", ?wait, "action timer holding");
                sleep(token, wait).await?;
            }
        }
        self.last_action = Some(Instant::now());
        Ok(())
    }

    /// Mark an action as having happened now without waiting.
    pub fn record(&mut self) {
        self.last_action = Some(Instant::now());
    }
}
