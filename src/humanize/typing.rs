//! Keystroke sequences with human cadence and self-corrected typos.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::keyboard::{is_awkward_symbol, same_row_neighbours, typo_candidates};
use super::policy::{Chance, ChanceTable};
use super::timing::{jitter, millis_between, scale, uniform_between};
use crate::config::TypingConfig;

/// Character carried by backspace events.
pub const BACKSPACE: char = '\u{8}';

const WHITESPACE_FACTOR: f64 = 0.7;
const UPPERCASE_FACTOR: f64 = 1.3;
const SYMBOL_FACTOR: f64 = 1.5;
const ROLLOVER_FACTOR: f64 = 0.85;
const KEY_JITTER: f64 = 0.2;

const THINK_PAUSE_MIN_MS: u64 = 500;
const THINK_PAUSE_MAX_MS: u64 = 2000;

/// One key event: wait `delay`, then press `ch` (or backspace).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyStroke {
    pub ch: char,
    #[serde(rename = "delay_ms", serialize_with = "crate::utils::duration_ms::serialize")]
    pub delay: Duration,
    pub is_typo: bool,
    pub is_backspace: bool,
}

impl KeyStroke {
    fn key(ch: char, delay: Duration) -> Self {
        Self {
            ch,
            delay,
            is_typo: false,
            is_backspace: false,
        }
    }

    fn typo(ch: char, delay: Duration) -> Self {
        Self {
            is_typo: true,
            ..Self::key(ch, delay)
        }
    }

    fn backspace(delay: Duration) -> Self {
        Self {
            is_backspace: true,
            ..Self::key(BACKSPACE, delay)
        }
    }
}

/// The text a sequence leaves behind: characters are appended, each
/// backspace removes the last one.
pub fn replay_text(strokes: &[KeyStroke]) -> String {
    let mut text = String::new();
    for stroke in strokes {
        if stroke.is_backspace {
            text.pop();
        } else {
            text.push(stroke.ch);
        }
    }
    text
}

/// Turns text into a timed keystroke stream.
#[derive(Debug, Clone)]
pub struct KeystrokeSequencer<R = StdRng> {
    config: TypingConfig,
    chances: ChanceTable,
    rng: R,
}

impl KeystrokeSequencer<StdRng> {
    pub fn new(config: TypingConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> KeystrokeSequencer<R> {
    pub fn with_rng(config: TypingConfig, rng: R) -> Self {
        let chances = ChanceTable::new()
            .with(Chance::Typo, config.typo_chance)
            .with(Chance::ThinkPause, config.think_pause_chance);
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

    pub fn config(&self) -> &TypingConfig {
        &self.config
    }

    pub fn chances(&self) -> &ChanceTable {
        &self.chances
    }

    /// Keystrokes that type `text`. Whatever the configuration,
    /// [`replay_text`] of the result equals `text`.
    pub fn generate_keystrokes(&mut self, text: &str) -> Vec<KeyStroke> {
        if !self.config.enabled {
            return text.chars().map(|c| KeyStroke::key(c, Duration::ZERO)).collect();
        }

        let chars: Vec<char> = text.chars().collect();
        let mut strokes = Vec::with_capacity(chars.len() * 2);
        let mut typos = 0usize;

        for (i, &c) in chars.iter().enumerate() {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let mut delay = self.key_delay(c, prev);

            if ends_word(prev, c) && self.chances.roll(Chance::ThinkPause, &mut self.rng) {
                delay += millis_between(&mut self.rng, THINK_PAUSE_MIN_MS, THINK_PAUSE_MAX_MS);
            }

            let candidates = typo_candidates(c);
            if !c.is_whitespace()
                && !candidates.is_empty()
                && self.chances.roll(Chance::Typo, &mut self.rng)
            {
                let wrong = candidates.choose(&mut self.rng).copied().unwrap_or(c);
                let wrong = if c.is_uppercase() {
                    wrong.to_ascii_uppercase()
                } else {
                    wrong
                };
                strokes.push(KeyStroke::typo(wrong, delay));
                strokes.push(KeyStroke::backspace(self.config.correction_delay()));
                let retype = self.key_delay(c, prev);
                strokes.push(KeyStroke::key(c, retype));
                typos += 1;
            } else {
                strokes.push(KeyStroke::key(c, delay));
            }
        }

        debug!(
            target: "humanpace::typing",
            chars = chars.len(), strokes = strokes.len(), typos,
            "Generated keystrokes"
        );
        strokes
    }

    /// Total delay of a freshly generated sequence for `text`.
    pub fn typing_duration(&mut self, text: &str) -> Duration {
        self.generate_keystrokes(text).iter().map(|s| s.delay).sum()
    }

    fn key_delay(&mut self, c: char, prev: Option<char>) -> Duration {
        let mut factor = 1.0;
        if c.is_whitespace() {
            factor *= WHITESPACE_FACTOR;
        }
        if c.is_uppercase() {
            factor *= UPPERCASE_FACTOR;
        }
        if is_awkward_symbol(c) {
            factor *= SYMBOL_FACTOR;
        }
        if prev.is_some_and(|p| same_row_neighbours(p, c)) {
            factor *= ROLLOVER_FACTOR;
        }

        let base = uniform_between(
            &mut self.rng,
            self.config.min_key_delay(),
            self.config.max_key_delay(),
        );
        jitter(&mut self.rng, scale(base, factor), KEY_JITTER)
    }
}

/// A space that follows a non-space closes a word.
fn ends_word(prev: Option<char>, c: char) -> bool {
    c.is_whitespace() && prev.is_some_and(|p| !p.is_whitespace())
}
