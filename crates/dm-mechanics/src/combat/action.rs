//! Actions a combatant can take on its turn.

use serde::{Deserialize, Serialize};

use crate::dice::RollMode;

use super::Combatant;

/// The kind of an action, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// A weapon attack.
    Attack,
    /// A spell from the repertoire.
    Spell,
    /// Restoring hit points.
    Heal,
    /// Leaving the fight.
    Flee,
    /// Doing nothing.
    Idle,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attack => write!(f, "attack"),
            Self::Spell => write!(f, "spell"),
            Self::Heal => write!(f, "heal"),
            Self::Flee => write!(f, "flee"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// An action to resolve. Dice are carried as notation and parsed at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CombatAction {
    /// Attack a target.
    Attack {
        /// Attacking combatant.
        attacker: String,
        /// Target combatant.
        target: String,
        /// Added to the attack d20.
        attack_bonus: i32,
        /// Damage dice notation.
        damage: String,
        /// Flat bonus added to damage.
        damage_bonus: i32,
        /// Damage type, for narration.
        damage_type: String,
        /// How the attack d20 is rolled.
        #[serde(default, skip_serializing_if = "RollMode::is_normal")]
        mode: RollMode,
    },
    /// Cast a spell at a target.
    Spell {
        /// Casting combatant.
        caster: String,
        /// Target combatant.
        target: String,
        /// Spell name.
        spell: String,
        /// Damage dice notation; `None` for a spell that deals no damage.
        dice: Option<String>,
        /// How the spell attack d20 is rolled.
        #[serde(default, skip_serializing_if = "RollMode::is_normal")]
        mode: RollMode,
    },
    /// Restore hit points to a combatant of the same faction.
    Heal {
        /// Healing combatant.
        healer: String,
        /// Healed combatant; may be the healer.
        target: String,
        /// Healing dice notation.
        dice: String,
    },
    /// Leave the fight.
    Flee {
        /// Fleeing combatant.
        actor: String,
    },
    /// Pass the turn.
    Idle {
        /// Idle combatant.
        actor: String,
    },
}

impl CombatAction {
    /// An attack using the attacker's own attack profile.
    pub fn attack(attacker: &Combatant, target: impl Into<String>) -> Self {
        Self::Attack {
            attacker: attacker.name.clone(),
            target: target.into(),
            attack_bonus: attacker.attack_bonus,
            damage: attacker.damage.to_string(),
            damage_bonus: attacker.damage_bonus,
            damage_type: attacker.damage_type.clone(),
            mode: RollMode::Normal,
        }
    }

    /// A spell carrying the caster's spell damage dice, if any.
    pub fn spell(caster: &Combatant, target: impl Into<String>, spell: impl Into<String>) -> Self {
        Self::Spell {
            caster: caster.name.clone(),
            target: target.into(),
            spell: spell.into(),
            dice: caster.spell_damage.map(|d| d.to_string()),
            mode: RollMode::Normal,
        }
    }

    /// A heal with the healer's healing dice, or `None` if it has none.
    pub fn heal(healer: &Combatant, target: impl Into<String>) -> Option<Self> {
        healer.healing.map(|dice| Self::Heal {
            healer: healer.name.clone(),
            target: target.into(),
            dice: dice.to_string(),
        })
    }

    /// Roll the attack d20 of an attack or spell with `mode`. Other actions
    /// are returned unchanged.
    pub fn with_mode(mut self, new_mode: RollMode) -> Self {
        if let Self::Attack { mode, .. } | Self::Spell { mode, .. } = &mut self {
            *mode = new_mode;
        }
        self
    }

    /// How the attack d20 is rolled; always normal for actions without one.
    pub fn mode(&self) -> RollMode {
        match self {
            Self::Attack { mode, .. } | Self::Spell { mode, .. } => *mode,
            _ => RollMode::Normal,
        }
    }

    /// Flee the fight.
    pub fn flee(actor: impl Into<String>) -> Self {
        Self::Flee {
            actor: actor.into(),
        }
    }

    /// Pass the turn.
    pub fn idle(actor: impl Into<String>) -> Self {
        Self::Idle {
            actor: actor.into(),
        }
    }

    /// The combatant taking the action.
    pub fn actor(&self) -> &str {
        match self {
            Self::Attack { attacker, .. } => attacker,
            Self::Spell { caster, .. } => caster,
            Self::Heal { healer, .. } => healer,
            Self::Flee { actor } | Self::Idle { actor } => actor,
        }
    }

    /// The targeted combatant, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Attack { target, .. }
            | Self::Spell { target, .. }
            | Self::Heal { target, .. } => Some(target),
            Self::Flee { .. } | Self::Idle { .. } => None,
        }
    }

    /// The kind of action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Attack { .. } => ActionKind::Attack,
            Self::Spell { .. } => ActionKind::Spell,
            Self::Heal { .. } => ActionKind::Heal,
            Self::Flee { .. } => ActionKind::Flee,
            Self::Idle { .. } => ActionKind::Idle,
        }
    }
}

impl std::fmt::Display for CombatAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attack {
                attacker,
                target,
                damage,
                damage_bonus,
                mode,
                ..
            } => {
                write!(f, "{attacker} attacks {target} ({damage}")?;
                if *damage_bonus != 0 {
                    write!(f, " {damage_bonus:+}")?;
                }
                write!(f, ")")?;
                if !mode.is_normal() {
                    write!(f, " with {mode}")?;
                }
                Ok(())
            }
            Self::Spell {
                caster,
                target,
                spell,
                mode,
                ..
            } => {
                write!(f, "{caster} casts {spell} on {target}")?;
                if !mode.is_normal() {
                    write!(f, " with {mode}")?;
                }
                Ok(())
            }
            Self::Heal { healer, target, .. } if healer == target => {
                write!(f, "{healer} heals themselves")
            }
            Self::Heal { healer, target, .. } => write!(f, "{healer} heals {target}"),
            Self::Flee { actor } => write!(f, "{actor} flees"),
            Self::Idle { actor } => write!(f, "{actor} waits"),
        }
    }
}
