//! The append-only record of resolved actions.

use serde::{Deserialize, Serialize};

use crate::dice::{RollMode, RollResult};

use super::{ActionKind, NarrationRequest};

/// What happened when an action was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum EventOutcome {
    /// The attack or spell connected.
    Hit {
        /// d20 plus attack bonus.
        attack_total: i64,
        /// The natural d20.
        natural: u32,
        /// Natural 20.
        critical: bool,
        /// Damage applied.
        damage: u32,
        /// The damage dice as rolled.
        damage_roll: RollResult,
        /// Damage type.
        damage_type: String,
        /// Target hit points afterwards.
        target_hp: u32,
        /// This hit defeated the target.
        defeated: bool,
        /// How the attack d20 was rolled.
        #[serde(default, skip_serializing_if = "RollMode::is_normal")]
        mode: RollMode,
    },
    /// The attack or spell missed.
    Miss {
        /// d20 plus attack bonus.
        attack_total: i64,
        /// The natural d20.
        natural: u32,
        /// How the attack d20 was rolled.
        #[serde(default, skip_serializing_if = "RollMode::is_normal")]
        mode: RollMode,
    },
    /// The target regained hit points.
    Healed {
        /// Hit points actually restored, after capping at maximum.
        amount: u32,
        /// The healing dice as rolled.
        healing_roll: RollResult,
        /// Target hit points afterwards.
        target_hp: u32,
    },
    /// A spell without damage dice took effect. No state changed.
    Effect,
    /// The actor fled.
    Fled,
    /// The actor did nothing.
    Idle,
}

/// One resolved action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Round the action happened in.
    pub round: u32,
    /// Acting combatant.
    pub actor: String,
    /// Kind of action.
    pub kind: ActionKind,
    /// Targeted combatant, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Spell name, for spells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell: Option<String>,
    /// The result.
    pub outcome: EventOutcome,
}

impl CombatEvent {
    /// Damage dealt by this action.
    pub fn damage(&self) -> u32 {
        match &self.outcome {
            EventOutcome::Hit { damage, .. } => *damage,
            _ => 0,
        }
    }

    /// Hit points restored by this action.
    pub fn healed(&self) -> u32 {
        match &self.outcome {
            EventOutcome::Healed { amount, .. } => *amount,
            _ => 0,
        }
    }

    /// Whether the action connected.
    pub fn is_hit(&self) -> bool {
        matches!(self.outcome, EventOutcome::Hit { .. })
    }

    /// Whether the attack roll was a natural 20.
    pub fn is_critical(&self) -> bool {
        matches!(self.outcome, EventOutcome::Hit { critical: true, .. })
    }

    /// Whether the target was defeated by this action.
    pub fn defeated_target(&self) -> bool {
        matches!(self.outcome, EventOutcome::Hit { defeated: true, .. })
    }

    /// Build the request handed to a [`Narrator`](super::Narrator).
    pub fn narration_request(&self, environment: Option<&str>) -> NarrationRequest {
        let (hit, damage_type) = match &self.outcome {
            EventOutcome::Hit { damage_type, .. } => (Some(true), Some(damage_type.clone())),
            EventOutcome::Miss { .. } => (Some(false), None),
            EventOutcome::Healed { .. }
            | EventOutcome::Effect
            | EventOutcome::Fled
            | EventOutcome::Idle => (None, None),
        };
        NarrationRequest {
            actor: self.actor.clone(),
            kind: self.kind,
            target: self.target.clone(),
            spell: self.spell.clone(),
            hit,
            damage: self.damage(),
            damage_type,
            healed: self.healed(),
            critical: self.is_critical(),
            defeated: self.defeated_target(),
            environment: environment.map(str::to_string),
        }
    }

    fn what(&self) -> String {
        match &self.spell {
            Some(spell) => spell.clone(),
            None => "an attack".to_string(),
        }
    }
}

impl std::fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = self.target.as_deref().unwrap_or("nobody");
        match &self.outcome {
            EventOutcome::Hit {
                attack_total,
                critical,
                damage,
                damage_type,
                target_hp,
                defeated,
                mode,
                ..
            } => {
                write!(
                    f,
                    "{} hits {target} with {} for {damage} {damage_type} damage (roll {attack_total}",
                    self.actor,
                    self.what()
                )?;
                if !mode.is_normal() {
                    write!(f, " with {mode}")?;
                }
                if *critical {
                    write!(f, ", critical")?;
                }
                write!(f, "), {target} at {target_hp} HP")?;
                if *defeated {
                    write!(f, ", defeated")?;
                }
                Ok(())
            }
            EventOutcome::Miss {
                attack_total, mode, ..
            } => {
                write!(
                    f,
                    "{} misses {target} with {} (roll {attack_total}",
                    self.actor,
                    self.what()
                )?;
                if !mode.is_normal() {
                    write!(f, " with {mode}")?;
                }
                write!(f, ")")
            }
            EventOutcome::Effect => write!(
                f,
                "{} casts {} on {target}",
                self.actor,
                self.spell.as_deref().unwrap_or("a spell")
            ),
            EventOutcome::Healed {
                amount, target_hp, ..
            } => write!(
                f,
                "{} heals {target} for {amount} HP, {target} at {target_hp} HP",
                self.actor
            ),
            EventOutcome::Fled => write!(f, "{} flees the fight", self.actor),
            EventOutcome::Idle => write!(f, "{} waits", self.actor),
        }
    }
}

/// The ordered log of an encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatLog {
    events: Vec<CombatEvent>,
}

impl CombatLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    /// All events in order.
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Export the log as markdown, one section per round.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Combat Log\n\n");
        let mut round = 0;
        for event in &self.events {
            if event.round != round {
                if round != 0 {
                    out.push('\n');
                }
                round = event.round;
                out.push_str(&format!("## Round {round}\n\n"));
            }
            match &event.outcome {
                EventOutcome::Hit {
                    critical,
                    damage_roll,
                    ..
                } => {
                    let crit = if *critical { " **Critical!**" } else { "" };
                    out.push_str(&format!("- **{}**: {event}{crit}\n", event.kind));
                    out.push_str(&format!("  - Damage roll: {damage_roll}\n"));
                }
                EventOutcome::Miss { natural, .. } => {
                    out.push_str(&format!("- **{}**: {event} (natural {natural})\n", event.kind));
                }
                EventOutcome::Healed { healing_roll, .. } => {
                    out.push_str(&format!("- **{}**: {event}\n", event.kind));
                    out.push_str(&format!("  - Healing roll: {healing_roll}\n"));
                }
                EventOutcome::Effect | EventOutcome::Fled | EventOutcome::Idle => {
                    out.push_str(&format!("- **{}**: {event}\n", event.kind));
                }
            }
        }
        out
    }

    /// Export the log as plain text.
    pub fn export_text(&self) -> String {
        let mut out = String::from("Combat Log\n==========\n");
        let mut round = 0;
        for event in &self.events {
            if event.round != round {
                round = event.round;
                out.push_str(&format!("\n--- Round {round} ---\n"));
            }
            out.push_str(&format!("{event}\n"));
        }
        out
    }
}
