//! The single source of randomness for an encounter.
//!
//! Dice, initiative, and tactical decisions all draw from a [`RandomSource`].
//! A seeded [`StdRng`] gives reproducible encounters; [`ScriptedRandom`]
//! replays exact values, which is how tests force specific rolls.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of dice faces, probabilities, and uniform choices.
pub trait RandomSource {
    /// Roll one die, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Draw a probability in `[0.0, 1.0)`.
    fn chance(&mut self) -> f64;

    /// Pick a uniform index in `0..len`. Returns 0 when `len` is 0.
    fn pick(&mut self, len: usize) -> usize;
}

impl RandomSource for StdRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.random_range(1..=sides.max(1))
    }

    fn chance(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.random_range(0..len)
    }
}

/// A random source that replays queued values before falling back to a
/// seeded generator.
///
/// Die faces are clamped into `1..=sides`, probabilities into `[0.0, 1.0]`,
/// and picks into `0..len`, so a scripted value can never produce an
/// impossible result.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    rolls: VecDeque<u32>,
    chances: VecDeque<f64>,
    picks: VecDeque<usize>,
    fallback: StdRng,
}

impl ScriptedRandom {
    /// Create an empty script whose fallback generator uses `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rolls: VecDeque::new(),
            chances: VecDeque::new(),
            picks: VecDeque::new(),
            fallback: StdRng::seed_from_u64(seed),
        }
    }

    /// Queue die faces, consumed in order by [`RandomSource::roll_die`].
    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = u32>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    /// Queue probabilities, consumed in order by [`RandomSource::chance`].
    pub fn with_chances(mut self, chances: impl IntoIterator<Item = f64>) -> Self {
        self.chances.extend(chances);
        self
    }

    /// Queue choices, consumed in order by [`RandomSource::pick`].
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }

    /// Number of queued values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rolls.len() + self.chances.len() + self.picks.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn roll_die(&mut self, sides: u32) -> u32 {
        match self.rolls.pop_front() {
            Some(value) => value.clamp(1, sides.max(1)),
            None => self.fallback.roll_die(sides),
        }
    }

    fn chance(&mut self) -> f64 {
        match self.chances.pop_front() {
            Some(value) => value.clamp(0.0, 1.0),
            None => self.fallback.chance(),
        }
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        match self.picks.pop_front() {
            Some(index) => index.min(len - 1),
            None => self.fallback.pick(len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_rng_rolls_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let v = rng.roll_die(6);
            assert!((1..=6).contains(&v));
        }
    }

    #[test]
    fn std_rng_is_deterministic() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(a.roll_die(20), b.roll_die(20));
            assert_eq!(a.pick(5), b.pick(5));
        }
    }

    #[test]
    fn scripted_values_come_first() {
        let mut rng = ScriptedRandom::new(1)
            .with_rolls([15, 4])
            .with_chances([0.1])
            .with_picks([2]);
        assert_eq!(rng.remaining(), 4);
        assert_eq!(rng.roll_die(20), 15);
        assert_eq!(rng.roll_die(4), 4);
        assert!((rng.chance() - 0.1).abs() < f64::EPSILON);
        assert_eq!(rng.pick(3), 2);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn scripted_values_are_clamped() {
        let mut rng = ScriptedRandom::new(1)
            .with_rolls([30, 0])
            .with_chances([1.5])
            .with_picks([9]);
        assert_eq!(rng.roll_die(20), 20);
        assert_eq!(rng.roll_die(6), 1);
        assert!((rng.chance() - 1.0).abs() < f64::EPSILON);
        assert_eq!(rng.pick(3), 2);
    }

    #[test]
    fn scripted_falls_back_when_exhausted() {
        let mut rng = ScriptedRandom::new(3);
        let v = rng.roll_die(8);
        assert!((1..=8).contains(&v));
        assert_eq!(rng.pick(0), 0);
    }
}
