//! Injectable randomness for simulated outcomes.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::SimError;

/// Source of uniform draws in `[0, 1)`.
pub trait Dice: Send + Sync {
    fn roll(&self) -> f64;

    /// Weighted success draw: `true` when the roll falls below `probability`.
    fn succeeds(&self, probability: f64) -> Result<bool, SimError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SimError::InvalidProbability(probability));
        }
        let draw = self.roll();
        if !(0.0..1.0).contains(&draw) {
            return Err(SimError::InvalidDraw(draw));
        }
        Ok(draw < probability)
    }
}

/// Thread-local OS-seeded randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDice;

impl Dice for RandomDice {
    fn roll(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible randomness from a fixed seed.
#[derive(Debug)]
pub struct SeededDice {
    rng: Mutex<StdRng>,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen::<f64>(),
            Err(poisoned) => poisoned.into_inner().gen::<f64>(),
        }
    }
}

/// Replays a fixed list of draws, then repeats `fallback`.
#[derive(Debug)]
pub struct ScriptedDice {
    draws: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedDice {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            fallback,
        }
    }

    /// Every draw is `value`.
    pub fn constant(value: f64) -> Self {
        Self::new([], value)
    }

    /// Draws that make any probability above zero succeed.
    pub fn always_succeed() -> Self {
        Self::constant(0.0)
    }

    /// Draws that make any probability below one fail.
    pub fn always_fail() -> Self {
        Self::constant(0.999_999)
    }
}

impl Dice for ScriptedDice {
    fn roll(&self) -> f64 {
        let next = match self.draws.lock() {
            Ok(mut draws) => draws.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        next.unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_replays_then_falls_back() {
        let dice = ScriptedDice::new([0.1, 0.9], 0.5);
        assert_eq!(dice.roll(), 0.1);
        assert_eq!(dice.roll(), 0.9);
        assert_eq!(dice.roll(), 0.5);
        assert_eq!(dice.roll(), 0.5);
    }

    #[test]
    fn succeeds_compares_against_probability() {
        let dice = ScriptedDice::new([0.89, 0.9], 0.0);
        assert!(dice.succeeds(0.9).unwrap());
        assert!(!dice.succeeds(0.9).unwrap());
    }

    #[test]
    fn succeeds_rejects_out_of_range_draw() {
        let dice = ScriptedDice::constant(1.5);
        assert_eq!(dice.succeeds(0.9), Err(SimError::InvalidDraw(1.5)));
    }

    #[test]
    fn succeeds_rejects_bad_probability() {
        let dice = ScriptedDice::always_succeed();
        assert_eq!(
            dice.succeeds(1.2),
            Err(SimError::InvalidProbability(1.2))
        );
    }

    #[test]
    fn always_fail_fails_high_probabilities() {
        let dice = ScriptedDice::always_fail();
        assert!(!dice.succeeds(0.95).unwrap());
    }

    #[test]
    fn random_dice_stays_in_range() {
        let dice = RandomDice;
        for _ in 0..1000 {
            let d = dice.roll();
            assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    fn seeded_dice_is_reproducible() {
        let a = SeededDice::new(42);
        let b = SeededDice::new(42);
        let xs: Vec<f64> = (0..5).map(|_| a.roll()).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.roll()).collect();
        assert_eq!(xs, ys);
    }
}
