//! Initiative order and turn progression.
//!
//! Initiative is rolled once per encounter. The order never changes
//! afterwards; combatants who flee or fall are skipped rather than removed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dice::DiceExpr;
use crate::random::RandomSource;

use super::registry::Registry;

/// One combatant's initiative roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeEntry {
    /// Combatant name.
    pub name: String,
    /// The natural d20.
    pub natural: u32,
    /// The combatant's initiative bonus.
    pub bonus: i32,
    /// Natural roll plus bonus.
    pub total: i64,
}

impl std::fmt::Display for InitiativeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({}{:+})", self.name, self.total, self.natural, self.bonus)
    }
}

/// The fixed turn order of an encounter and the position within it.
#[derive(Debug, Clone, Default)]
pub struct Initiative {
    order: Vec<InitiativeEntry>,
    cursor: Option<usize>,
    round: u32,
}

impl Initiative {
    /// Roll `1d20 + initiative_bonus` for every combatant, in insertion order,
    /// honoring each combatant's initiative roll mode, and sort descending by total, then by bonus. Remaining ties keep
    /// insertion order.
    pub fn roll<R: RandomSource + ?Sized>(registry: &Registry, rng: &mut R) -> Self {
        let mut order: Vec<InitiativeEntry> = registry
            .iter()
            .map(|c| {
                let roll = DiceExpr::d20(c.initiative_bonus).roll_with(c.initiative_mode, rng);
                let entry = InitiativeEntry {
                    name: c.name.clone(),
                    natural: roll.natural(),
                    bonus: c.initiative_bonus,
                    total: roll.total(),
                };
                debug!(combatant = %entry.name, natural = entry.natural, total = entry.total, "initiative rolled");
                entry
            })
            .collect();
        // sort_by is stable, so equal keys stay in insertion order
        order.sort_by(|a, b| b.total.cmp(&a.total).then(b.bonus.cmp(&a.bonus)));
        Self {
            order,
            cursor: None,
            round: 0,
        }
    }

    /// The full order, first to act first.
    pub fn order(&self) -> &[InitiativeEntry] {
        &self.order
    }

    /// Current round; 0 before the first turn.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Name of the combatant whose turn it is.
    pub fn current(&self) -> Option<&str> {
        self.cursor
            .and_then(|i| self.order.get(i))
            .map(|e| e.name.as_str())
    }

    /// Advance to the next active combatant, skipping defeated and fled ones.
    ///
    /// The round counter increments each time the order wraps, and goes from
    /// 0 to 1 on the first call. Returns `None` without advancing when no
    /// combatant in the order is active.
    pub fn next(&mut self, registry: &Registry) -> Option<&str> {
        let is_active = |entry: &InitiativeEntry| {
            registry.get(&entry.name).is_ok_and(|c| c.is_active())
        };
        if !self.order.iter().any(is_active) {
            return None;
        }

        let mut index = match self.cursor {
            None => {
                self.round = 1;
                0
            }
            Some(i) => i + 1,
        };
        loop {
            if index >= self.order.len() {
                index = 0;
                self.round += 1;
            }
            if is_active(&self.order[index]) {
                break;
            }
            index += 1;
        }
        self.cursor = Some(index);
        self.current()
    }
}
