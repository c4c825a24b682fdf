//! Action selection for agent-controlled combatants.
//!
//! The policy is evaluated in strict priority order:
//!
//! 1. No valid enemies: idle.
//! 2. Badly hurt (hit point ratio below the flee threshold): flee on a
//!    weighted coin flip.
//! 3. Has healing dice and someone on its side (itself included) is below
//!    the heal threshold: heal the most wounded of them. No randomness.
//! 4. Has spells: cast a random spell at a random enemy on a weighted coin
//!    flip.
//! 5. Otherwise attack a random enemy with the innate attack profile.

use tracing::debug;

use crate::config::TacticsConfig;
use crate::random::RandomSource;

use super::{CombatAction, Combatant};

/// Whether `candidate` is something `actor` may target: a named, active
/// combatant of the opposing faction other than the actor itself.
pub fn is_valid_target(actor: &Combatant, candidate: &Combatant) -> bool {
    !candidate.name.trim().is_empty()
        && candidate.name != actor.name
        && candidate.is_active()
        && candidate.faction() != actor.faction()
}

/// The most wounded of `actor` and its active allies, if any is below
/// `threshold`. Ties go to the actor, then to the earlier ally.
fn most_wounded<'a>(
    actor: &'a Combatant,
    allies: &[&'a Combatant],
    threshold: f64,
) -> Option<&'a Combatant> {
    std::iter::once(actor)
        .chain(allies.iter().copied().filter(|c| {
            c.name != actor.name && c.is_active() && c.faction() == actor.faction()
        }))
        .filter_map(|c| c.hp_ratio().map(|ratio| (c, ratio)))
        .filter(|(_, ratio)| *ratio < threshold)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}

/// Choose an action for `actor`.
///
/// `enemies` may contain stale or malformed entries; anything that is not a
/// valid target is filtered out before choosing. `allies` only matter to a
/// healer; `environment` is context only and never changes the outcome.
pub fn decide<R: RandomSource + ?Sized>(
    actor: &Combatant,
    allies: &[&Combatant],
    enemies: &[&Combatant],
    environment: Option<&str>,
    config: &TacticsConfig,
    rng: &mut R,
) -> CombatAction {
    let targets: Vec<&Combatant> = enemies
        .iter()
        .copied()
        .filter(|c| is_valid_target(actor, c))
        .collect();

    debug!(
        actor = %actor.name,
        allies = allies.len(),
        targets = targets.len(),
        environment = environment.unwrap_or(""),
        "choosing action"
    );

    if targets.is_empty() {
        return CombatAction::idle(&actor.name);
    }

    let badly_hurt = actor
        .hp_ratio()
        .is_some_and(|ratio| ratio < config.flee_threshold);
    if badly_hurt && rng.chance() < config.flee_chance {
        return CombatAction::flee(&actor.name);
    }

    let patient = most_wounded(actor, allies, config.heal_threshold);
    if let Some(heal) = patient.and_then(|p| CombatAction::heal(actor, &p.name)) {
        return heal;
    }

    if !actor.spells.is_empty() && rng.chance() < config.spell_chance {
        let target = targets[rng.pick(targets.len())];
        let spell = &actor.spells[rng.pick(actor.spells.len())];
        return CombatAction::spell(actor, &target.name, spell);
    }

    let target = targets[rng.pick(targets.len())];
    CombatAction::attack(actor, &target.name)
}
