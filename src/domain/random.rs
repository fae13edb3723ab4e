//! Random sources used by the gacha draw.
//!
//! The engine never reaches for a global generator; a [`RandomSource`] is
//! injected so tests can replay exact rolls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Uniform integer source for rarity rolls and pool picks.
pub trait RandomSource: Send + Sync {
    /// Returns a value uniformly distributed in `1..=sides`.
    fn roll(&self, sides: u32) -> u32;

    /// Returns an index uniformly distributed in `0..len`. `len` is non-zero.
    fn pick(&self, len: usize) -> usize;
}

/// Production source backed by the thread-local CSPRNG.
///
/// `rand::rng()` is a ChaCha-based generator periodically reseeded from the
/// operating system, so rolls cannot be predicted from earlier outputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureRandom;

impl RandomSource for SecureRandom {
    fn roll(&self, sides: u32) -> u32 {
        rand::rng().random_range(1..=sides)
    }

    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Deterministic source for reproducible simulations.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn roll(&self, sides: u32) -> u32 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(1..=sides)
    }

    fn pick(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(0..len)
    }
}

/// Replays queued rolls and picks in order.
///
/// Once a queue runs dry, rolls return `sides` (the most common outcome of
/// any table) and picks return `0`. Out-of-range queued values are clamped.
#[derive(Default)]
pub struct ScriptedRandom {
    rolls: Mutex<VecDeque<u32>>,
    picks: Mutex<VecDeque<usize>>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rolls(self, rolls: impl IntoIterator<Item = u32>) -> Self {
        self.rolls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(rolls);
        self
    }

    pub fn with_picks(self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(picks);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn roll(&self, sides: u32) -> u32 {
        self.rolls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .map_or(sides, |roll| roll.clamp(1, sides))
    }

    fn pick(&self, len: usize) -> usize {
        self.picks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .map_or(0, |index| index.min(len.saturating_sub(1)))
    }
}
