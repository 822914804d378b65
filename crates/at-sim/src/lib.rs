//! at-sim: Simulation primitives for AsyncTerm.
//!
//! Scripted timers that fulfill or reject after a fixed delay, race and
//! all-settled combinators over them, progress streams for simulated
//! operations, and the injectable randomness used to decide outcomes.

pub mod dice;
pub mod progress;
pub mod timer;

use thiserror::Error;

pub use dice::{Dice, RandomDice, ScriptedDice, SeededDice};
pub use progress::{operation_progress, OperationSpec, ProgressEvent};
pub use timer::{all_settled, race, ScriptedTimer, Settlement, TimeScale};

#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("random draw {0} is outside [0, 1)")]
    InvalidDraw(f64),
    #[error("success probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
    #[error("race needs at least one timer")]
    EmptyRace,
}
