//! Per-encounter combatant storage.

use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};

use super::{Combatant, Faction, Side, Status};

/// What a call to [`Registry::apply_damage`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    /// Hit points before the damage.
    pub before: u32,
    /// Hit points after the damage.
    pub after: u32,
    /// Whether this call moved the combatant to [`Status::Defeated`].
    pub newly_defeated: bool,
}

/// Combatants of one encounter, keyed by name and kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    combatants: Vec<Combatant>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a combatant. Names must be unique.
    pub fn insert(&mut self, combatant: Combatant) -> MechResult<()> {
        if self.contains(&combatant.name) {
            return Err(MechError::DuplicateCombatant(combatant.name));
        }
        self.combatants.push(combatant);
        Ok(())
    }

    /// Whether a combatant with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Insertion index of a combatant.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.combatants.iter().position(|c| c.name == name)
    }

    /// Look up a combatant by name.
    pub fn get(&self, name: &str) -> MechResult<&Combatant> {
        self.combatants
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| MechError::UnknownCombatant(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> MechResult<&mut Combatant> {
        self.combatants
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| MechError::UnknownCombatant(name.to_string()))
    }

    /// Number of registered combatants.
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// All combatants in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    /// Reduce hit points, flooring at 0. Reaching 0 defeats the combatant.
    ///
    /// Damage to an already defeated combatant changes nothing.
    pub fn apply_damage(&mut self, name: &str, amount: u32) -> MechResult<DamageReport> {
        let combatant = self.get_mut(name)?;
        let before = combatant.hp;
        if combatant.status == Status::Defeated {
            return Ok(DamageReport {
                before,
                after: before,
                newly_defeated: false,
            });
        }
        combatant.hp = before.saturating_sub(amount);
        let newly_defeated = combatant.hp == 0;
        if newly_defeated {
            combatant.status = Status::Defeated;
        }
        Ok(DamageReport {
            before,
            after: combatant.hp,
            newly_defeated,
        })
    }

    /// Restore hit points up to the maximum. Defeated combatants stay
    /// defeated. Returns the amount actually healed.
    pub fn heal(&mut self, name: &str, amount: u32) -> MechResult<u32> {
        let combatant = self.get_mut(name)?;
        if combatant.status == Status::Defeated {
            return Ok(0);
        }
        let before = combatant.hp;
        combatant.hp = before.saturating_add(amount).min(combatant.max_hp);
        Ok(combatant.hp - before)
    }

    /// Mark a combatant as fled. Returns whether the status changed; fled
    /// and defeated combatants are left as they are.
    pub fn mark_fled(&mut self, name: &str) -> MechResult<bool> {
        let combatant = self.get_mut(name)?;
        if combatant.status != Status::Active {
            return Ok(false);
        }
        combatant.status = Status::Fled;
        Ok(true)
    }

    /// Combatants on one side, optionally restricted to one status.
    pub fn list_by_side(&self, side: Side, status: Option<Status>) -> Vec<&Combatant> {
        self.combatants
            .iter()
            .filter(|c| c.side == side && status.is_none_or(|s| c.status == s))
            .collect()
    }

    /// Combatants in one faction, optionally restricted to one status.
    pub fn list_by_faction(&self, faction: Faction, status: Option<Status>) -> Vec<&Combatant> {
        self.combatants
            .iter()
            .filter(|c| c.faction() == faction && status.is_none_or(|s| c.status == s))
            .collect()
    }

    /// Factions with at least one active member, party first.
    pub fn active_factions(&self) -> Vec<Faction> {
        [Faction::Party, Faction::Hostile]
            .into_iter()
            .filter(|&f| self.combatants.iter().any(|c| c.faction() == f && c.is_active()))
            .collect()
    }
}
