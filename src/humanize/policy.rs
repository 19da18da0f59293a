//! Named probabilistic branches.
//!
//! Every random yes/no decision in the generators goes through a
//! [`ChanceTable`] keyed by a [`Chance`] tag, so the full decision surface of a
//! controller can be listed, inspected and pinned in tests.

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// A probabilistic branch and the effect it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Chance {
    /// Pointer travels past its target and corrects back.
    Overshoot,
    /// An extra near-duplicate point is inserted along the path.
    Tremor,
    /// Extra delay before the space that ends a word.
    ThinkPause,
    /// A neighbouring key is typed, then erased.
    Typo,
    /// A short reverse scroll before the next forward chunk.
    ScrollBack,
    /// A zero-distance reading pause after a scroll chunk.
    ScrollPause,
    /// A break taken before the base break interval elapsed.
    SpontaneousBreak,
}

/// Probability per [`Chance`]. Missing entries never fire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChanceTable {
    entries: BTreeMap<Chance, f64>,
}

impl ChanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Probabilities are clamped into `[0, 1]`; NaN is
    /// treated as 0.
    #[must_use]
    pub fn with(mut self, chance: Chance, probability: f64) -> Self {
        self.set(chance, probability);
        self
    }

    pub fn set(&mut self, chance: Chance, probability: f64) {
        let p = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self.entries.insert(chance, p);
    }

    pub fn probability(&self, chance: Chance) -> f64 {
        self.entries.get(&chance).copied().unwrap_or(0.0)
    }

    /// Decide whether `chance` fires. Certain outcomes (0 or 1) do not draw
    /// from the random source.
    pub fn roll<R: Rng + ?Sized>(&self, chance: Chance, rng: &mut R) -> bool {
        let p = self.probability(chance);
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            rng.random::<f64>() < p
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Chance, f64)> + '_ {
        self.entries.iter().map(|(c, p)| (*c, *p))
    }
}
