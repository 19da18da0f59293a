//! Pointer trajectories.
//!
//! Paths are sampled from a Bezier curve whose interior control points are
//! pushed sideways off the straight line, with smoothstep easing so samples
//! bunch up at both ends (slow start, slow arrival). Optional overshoot and
//! micro-movements add the imprecision of a real hand.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::time::Duration;
use tracing::{debug, trace};

use super::policy::{Chance, ChanceTable};
use crate::config::MouseConfig;

/// Sample count bounds for a primary path (endpoints included).
const MIN_SAMPLES: usize = 30;
const MAX_SAMPLES: usize = 200;
/// One sample per this many pixels of straight-line distance.
const PIXELS_PER_SAMPLE: f64 = 3.0;

/// Maximum sideways control-point displacement, as a fraction of distance.
const MAX_DEVIATION: f64 = 0.3;

const OVERSHOOT_CHANCE: f64 = 0.3;
const OVERSHOOT_MIN: f64 = 0.05;
const OVERSHOOT_SPREAD: f64 = 0.15;
const CORRECTION_STEPS: usize = 20;

const TREMOR_CHANCE: f64 = 0.1;
const JITTER_PX: f64 = 1.0;
const TREMOR_PX: f64 = 0.25;

/// Screen pixels per second at speed multiplier 1.0.
const PIXELS_PER_SECOND: f64 = 500.0;
const DURATION_JITTER: f64 = 0.15;

const HOVER_RADIUS: f64 = 5.0;
const HOVER_POINTS_PER_SECOND: f64 = 10.0;

/// A screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Generates human-like pointer paths.
#[derive(Debug, Clone)]
pub struct PathGenerator<R = StdRng> {
    config: MouseConfig,
    chances: ChanceTable,
    rng: R,
}

impl PathGenerator<StdRng> {
    pub fn new(config: MouseConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> PathGenerator<R> {
    pub fn with_rng(config: MouseConfig, rng: R) -> Self {
        let chances = chances_for(&config);
        Self {
            config,
            chances,
            rng,
        }
    }

    /// Replace the decision table (e.g. to force or suppress overshoot).
    #[must_use]
    pub fn with_chances(mut self, chances: ChanceTable) -> Self {
        self.chances = chances;
        self
    }

    pub fn config(&self) -> &MouseConfig {
        &self.config
    }

    pub fn chances(&self) -> &ChanceTable {
        &self.chances
    }

    /// Path from `start` to `end`.
    ///
    /// The last point is always exactly `end`. The first point is `start`,
    /// moved by at most one pixel per axis when micro-movements are on.
    /// Disabled movement and zero-length moves yield exactly `[start, end]`.
    pub fn generate_path(&mut self, start: Point, end: Point) -> Vec<Point> {
        if !self.config.enabled {
            return vec![start, end];
        }

        let distance = start.distance(end);
        // Also rejects NaN.
        if !(distance > 0.0) {
            return vec![start, end];
        }

        let samples = ((distance / PIXELS_PER_SAMPLE) as usize).clamp(MIN_SAMPLES, MAX_SAMPLES);
        let mut path = self.bezier_path(start, end, samples - 1);

        let overshoot = self.chances.roll(Chance::Overshoot, &mut self.rng);
        if overshoot {
            self.add_overshoot(&mut path, start, end);
        }

        if self.config.micro_movements {
            path = self.add_micro_movements(path);
        }

        debug!(
            target: "humanpace::mouse",
            distance, points = path.len(), overshoot,
            "Generated pointer path"
        );
        path
    }

    /// How long replaying `path` should take: its length over a speed drawn
    /// from `[min_speed, max_speed]`, then ±15%.
    pub fn movement_duration(&mut self, path: &[Point]) -> Duration {
        if path.len() < 2 {
            return Duration::ZERO;
        }

        let length: f64 = path.windows(2).map(|w| w[0].distance(w[1])).sum();
        let (min, max) = (self.config.min_speed, self.config.max_speed);
        let speed = min + self.rng.random::<f64>() * (max - min).max(0.0);
        if !(speed > 0.0) {
            // Non-positive speeds are rejected by config validation.
            return Duration::ZERO;
        }

        let base = length / (speed * PIXELS_PER_SECOND);
        let variation = 1.0 + (self.rng.random::<f64>() - 0.5) * 2.0 * DURATION_JITTER;
        let seconds = (base * variation).max(0.0);
        trace!(target: "humanpace::mouse", length, speed, seconds, "movement_duration");
        Duration::from_secs_f64(seconds)
    }

    /// Small jittered loop around `around`, about ten points per second of
    /// `duration` (at least three).
    pub fn hover_path(&mut self, around: Point, duration: Duration) -> Vec<Point> {
        let count = ((duration.as_secs_f64() * HOVER_POINTS_PER_SECOND) as usize).max(3);
        (0..count)
            .map(|i| {
                let angle = i as f64 * TAU / count as f64;
                let radius = HOVER_RADIUS * (0.5 + self.rng.random::<f64>() * 0.5);
                let jx = (self.rng.random::<f64>() - 0.5) * 2.0 * JITTER_PX;
                let jy = (self.rng.random::<f64>() - 0.5) * 2.0 * JITTER_PX;
                around.offset(radius * angle.cos() + jx, radius * angle.sin() + jy)
            })
            .collect()
    }

    fn bezier_path(&mut self, start: Point, end: Point, steps: usize) -> Vec<Point> {
        let controls = self.control_points(start, end);
        (0..=steps)
            .map(|i| bezier_point(&controls, smoothstep(i as f64 / steps as f64)))
            .collect()
    }

    fn control_points(&mut self, start: Point, end: Point) -> Vec<Point> {
        let (dx, dy) = (end.x - start.x, end.y - start.y);
        let distance = dx.hypot(dy);
        if distance == 0.0 {
            return vec![start, end];
        }

        let count = self.config.bezier_complexity.max(2) as usize + 2;
        let mut points = Vec::with_capacity(count);
        points.push(start);
        for i in 1..count - 1 {
            let progress = i as f64 / (count - 1) as f64;
            let deviation = distance * MAX_DEVIATION * (self.rng.random::<f64>() - 0.5);
            points.push(start.offset(
                dx * progress - dy / distance * deviation,
                dy * progress + dx / distance * deviation,
            ));
        }
        points.push(end);
        points
    }

    /// Travel 5-20% of the move past `end`, then curve back onto it.
    fn add_overshoot(&mut self, path: &mut Vec<Point>, start: Point, end: Point) {
        let fraction = OVERSHOOT_MIN + self.rng.random::<f64>() * OVERSHOOT_SPREAD;
        let past = end.offset((end.x - start.x) * fraction, (end.y - start.y) * fraction);
        path.push(past);
        let correction = self.bezier_path(past, end, CORRECTION_STEPS);
        path.extend_from_slice(&correction[1..]);
    }

    fn add_micro_movements(&mut self, path: Vec<Point>) -> Vec<Point> {
        let last = path.len() - 1;
        let mut out = Vec::with_capacity(path.len() + path.len() / 8);
        for (i, p) in path.into_iter().enumerate() {
            if i == last {
                out.push(p);
                break;
            }
            let (jx, jy) = self.jitter(JITTER_PX);
            out.push(p.offset(jx, jy));

            if i > 0 && self.chances.roll(Chance::Tremor, &mut self.rng) {
                let (tx, ty) = self.jitter(TREMOR_PX);
                out.push(p.offset(tx, ty));
            }
        }
        out
    }

    fn jitter(&mut self, magnitude: f64) -> (f64, f64) {
        (
            (self.rng.random::<f64>() - 0.5) * 2.0 * magnitude,
            (self.rng.random::<f64>() - 0.5) * 2.0 * magnitude,
        )
    }
}

fn chances_for(config: &MouseConfig) -> ChanceTable {
    let mut table = ChanceTable::new();
    if config.overshoot_enabled {
        table.set(Chance::Overshoot, OVERSHOOT_CHANCE);
    }
    if config.micro_movements {
        table.set(Chance::Tremor, TREMOR_CHANCE);
    }
    table
}

/// Slow-in/slow-out easing: `3t² − 2t³`.
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn bezier_point(controls: &[Point], t: f64) -> Point {
    let n = controls.len() - 1;
    controls
        .iter()
        .enumerate()
        .fold(Point::default(), |acc, (k, p)| {
            let b = bernstein(n, k, t);
            acc.offset(p.x * b, p.y * b)
        })
}

fn bernstein(n: usize, k: usize, t: f64) -> f64 {
    binomial(n, k) * t.powi(k as i32) * (1.0 - t).powi((n - k) as i32)
}

fn binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(overshoot: bool, micro: bool) -> MouseConfig {
        MouseConfig {
            enabled: true,
            min_speed: 0.5,
            max_speed: 2.0,
            overshoot_enabled: overshoot,
            micro_movements: micro,
            bezier_complexity: 3,
        }
    }

    fn generator(cfg: MouseConfig, seed: u64) -> PathGenerator<StdRng> {
        PathGenerator::with_rng(cfg, StdRng::seed_from_u64(seed))
    }

    fn assert_finite(path: &[Point]) {
        assert!(path.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn plain_path_hits_both_endpoints_exactly() {
        let mut g = generator(config(false, false), 1);
        let start = Point::new(0.0, 0.0);
        let end = Point::new(1000.0, 800.0);
        let path = g.generate_path(start, end);

        assert!((30..=200).contains(&path.len()), "len = {}", path.len());
        assert_eq!(path[0], start);
        assert_eq!(*path.last().unwrap(), end);
        assert_finite(&path);
    }

    #[test]
    fn short_moves_use_minimum_density() {
        let mut g = generator(config(false, false), 2);
        let path = g.generate_path(Point::new(5.0, 5.0), Point::new(15.0, 5.0));
        assert_eq!(path.len(), MIN_SAMPLES);
    }

    #[test]
    fn zero_distance_is_exact_pair() {
        let mut g = generator(config(true, true), 3);
        let p = Point::new(42.5, -7.0);
        assert_eq!(g.generate_path(p, p), vec![p, p]);
    }

    #[test]
    fn disabled_is_straight_jump() {
        let mut cfg = config(true, true);
        cfg.enabled = false;
        let mut g = generator(cfg, 4);
        let (a, b) = (Point::new(1.0, 2.0), Point::new(300.0, 400.0));
        assert_eq!(g.generate_path(a, b), vec![a, b]);
    }

    #[test]
    fn full_featured_paths_stay_anchored() {
        let cases = [
            (Point::new(0.0, 0.0), Point::new(100.0, 100.0)),
            (Point::new(0.0, 0.0), Point::new(1000.0, 800.0)),
            (Point::new(0.0, 0.0), Point::new(500.0, 0.0)),
            (Point::new(0.0, 0.0), Point::new(0.0, 500.0)),
            (Point::new(640.0, 360.0), Point::new(12.0, 700.0)),
        ];
        for seed in 0..40 {
            let mut g = generator(config(true, true), seed);
            for (start, end) in cases {
                let path = g.generate_path(start, end);
                assert_finite(&path);
                assert!(path[0].distance(start) <= JITTER_PX * 2f64.sqrt() + 1e-9);
                assert_eq!(*path.last().unwrap(), end);
            }
        }
    }

    #[test]
    fn forced_overshoot_passes_target_then_corrects() {
        let table = ChanceTable::new().with(Chance::Overshoot, 1.0);
        let mut g = generator(config(true, false), 5).with_chances(table);
        let start = Point::new(0.0, 0.0);
        let end = Point::new(600.0, 0.0);
        let path = g.generate_path(start, end);

        let primary = (600.0 / PIXELS_PER_SAMPLE) as usize;
        assert_eq!(path.len(), primary + 1 + CORRECTION_STEPS);
        let furthest = path.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert!(furthest >= 600.0 * (1.0 + OVERSHOOT_MIN) - 1e-9);
        assert!(furthest <= 600.0 * (1.0 + OVERSHOOT_MIN + OVERSHOOT_SPREAD) + 1e-9);
        assert_eq!(*path.last().unwrap(), end);
    }

    #[test]
    fn same_seed_same_path() {
        let mut a = generator(config(true, true), 99);
        let mut b = generator(config(true, true), 99);
        let (s, e) = (Point::new(10.0, 20.0), Point::new(900.0, 450.0));
        assert_eq!(a.generate_path(s, e), b.generate_path(s, e));
    }

    #[test]
    fn movement_duration_scales_with_length() {
        let mut cfg = config(false, false);
        cfg.min_speed = 1.0;
        cfg.max_speed = 1.0;
        let mut g = generator(cfg, 6);
        let path = [Point::new(0.0, 0.0), Point::new(500.0, 0.0)];
        for _ in 0..100 {
            let secs = g.movement_duration(&path).as_secs_f64();
            assert!((0.85..=1.15).contains(&secs), "secs = {secs}");
        }
        assert_eq!(g.movement_duration(&path[..1]), Duration::ZERO);
    }

    #[test]
    fn hover_path_circles_the_point() {
        let mut g = generator(config(false, false), 7);
        let center = Point::new(200.0, 200.0);
        let hover = g.hover_path(center, Duration::from_secs(2));
        assert_eq!(hover.len(), 20);
        assert!(hover.iter().all(|p| p.distance(center) <= HOVER_RADIUS + 2f64.sqrt()));
        assert_eq!(g.hover_path(center, Duration::ZERO).len(), 3);
    }

    #[test]
    fn binomial_matches_pascal() {
        assert_eq!(binomial(4, 0), 1.0);
        assert_eq!(binomial(4, 2), 6.0);
        assert_eq!(binomial(5, 3), 10.0);
    }
}
