//! Dice roll results.

use serde::{Deserialize, Serialize};

use super::Die;

/// The result of rolling a single die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    /// The type of die that was rolled.
    pub die: Die,
    /// The value rolled (1 to die.sides()).
    pub value: u32,
}

/// The result of rolling a [`DiceExpr`](super::DiceExpr).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// Individual die results, in the order rolled.
    pub dice: Vec<DieResult>,
    /// Flat modifier added to the sum.
    pub modifier: i32,
}

impl RollResult {
    /// Sum of all die values, without the modifier.
    pub fn dice_sum(&self) -> i64 {
        self.dice.iter().map(|d| i64::from(d.value)).sum()
    }

    /// Sum of all die values plus the modifier.
    pub fn total(&self) -> i64 {
        self.dice_sum() + i64::from(self.modifier)
    }

    /// The face of the first die, or 0 if nothing was rolled. For a single
    /// d20 this is the natural roll.
    pub fn natural(&self) -> u32 {
        self.dice.first().map_or(0, |d| d.value)
    }

    /// Number of dice in the result.
    pub fn count(&self) -> usize {
        self.dice.len()
    }
}

impl std::fmt::Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.dice.iter().map(|d| d.value.to_string()).collect();
        write!(f, "[{}]", values.join(", "))?;
        match self.modifier {
            0 => {}
            m if m > 0 => write!(f, " + {m}")?,
            m => write!(f, " - {}", m.unsigned_abs())?,
        }
        write!(f, " = {}", self.total())
    }
}
