//! Combatants, turn order, tactics, and the encounter state machine.
//!
//! An [`Encounter`] owns a [`Registry`] of combatants, a fixed
//! [`Initiative`] order, and an append-only [`CombatLog`]. Player actions
//! arrive as structured [`CombatAction`] values; agent-controlled combatants
//! get theirs from [`tactics::decide`].

pub mod action;
pub mod command;
pub mod encounter;
pub mod initiative;
pub mod log;
pub mod narration;
pub mod registry;
pub mod setup;
pub mod tactics;

pub use action::{ActionKind, CombatAction};
pub use command::{Command, help_lines, parse_command};
pub use encounter::{Encounter, EncounterState, EncounterSummary};
pub use initiative::{Initiative, InitiativeEntry};
pub use log::{CombatEvent, CombatLog, EventOutcome};
pub use narration::{NarrationRequest, Narrator, RulesLookup};
pub use registry::{DamageReport, Registry};
pub use setup::EncounterSetup;

use serde::{Deserialize, Serialize};

use crate::dice::{DiceExpr, Die, RollMode, parse_dice};
use crate::error::{MechError, MechResult};

/// Which side of the fight a combatant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Controlled by a player at the table.
    Player,
    /// Hostile, agent-controlled.
    Enemy,
    /// Friendly to the players, agent-controlled.
    Ally,
}

impl Side {
    /// The faction this side fights for.
    pub fn faction(self) -> Faction {
        match self {
            Self::Player | Self::Ally => Faction::Party,
            Self::Enemy => Faction::Hostile,
        }
    }

    /// Whether combatants on this side choose actions through tactics.
    pub fn is_agent_controlled(self) -> bool {
        !matches!(self, Self::Player)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Enemy => write!(f, "enemy"),
            Self::Ally => write!(f, "ally"),
        }
    }
}

/// The two opposing groups: players with their allies, against enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    /// Players and allies.
    Party,
    /// Enemies.
    Hostile,
}

impl Faction {
    /// The faction on the other side of the fight.
    pub fn opposing(self) -> Self {
        match self {
            Self::Party => Self::Hostile,
            Self::Hostile => Self::Party,
        }
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Party => write!(f, "party"),
            Self::Hostile => write!(f, "hostile"),
        }
    }
}

/// Whether a combatant still takes part in the fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Still fighting.
    Active,
    /// Left the fight.
    Fled,
    /// Reduced to 0 hit points.
    Defeated,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Fled => write!(f, "fled"),
            Self::Defeated => write!(f, "defeated"),
        }
    }
}

/// A participant in an encounter and its combat state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Display name, unique within an encounter.
    pub name: String,
    /// Which side the combatant is on.
    pub side: Side,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Armor class an attack total must meet.
    pub armor_class: i32,
    /// Added to the initiative d20.
    pub initiative_bonus: i32,
    /// Whether initiative is rolled with advantage or disadvantage.
    #[serde(default)]
    pub initiative_mode: RollMode,
    /// Added to attack d20s, including spell attacks.
    pub attack_bonus: i32,
    /// Damage dice of the combatant's basic attack.
    pub damage: DiceExpr,
    /// Flat bonus added to damage.
    pub damage_bonus: i32,
    /// Damage type, used for narration.
    pub damage_type: String,
    /// Spell repertoire, in order.
    pub spells: Vec<String>,
    /// Damage dice for offensive spells, if the combatant has any.
    pub spell_damage: Option<DiceExpr>,
    /// Hit points restored by the combatant's heal action, if it has one.
    #[serde(default)]
    pub healing: Option<DiceExpr>,
    /// Current status.
    pub status: Status,
    /// Free-form position or environment tag.
    pub position: Option<String>,
}

impl Combatant {
    /// Create a combatant at full health with an unarmed 1d4 attack.
    pub fn new(name: impl Into<String>, side: Side, hp: u32, armor_class: i32) -> Self {
        Self {
            name: name.into(),
            side,
            hp,
            max_hp: hp,
            armor_class,
            initiative_bonus: 0,
            initiative_mode: RollMode::Normal,
            attack_bonus: 0,
            damage: DiceExpr {
                count: 1,
                die: Die::D4,
                modifier: 0,
            },
            damage_bonus: 0,
            damage_type: "bludgeoning".to_string(),
            spells: Vec::new(),
            spell_damage: None,
            healing: None,
            status: if hp == 0 {
                Status::Defeated
            } else {
                Status::Active
            },
            position: None,
        }
    }

    /// Set current hit points below the maximum.
    pub fn with_current_hp(mut self, hp: u32) -> Self {
        self.hp = hp.min(self.max_hp);
        if self.hp == 0 {
            self.status = Status::Defeated;
        }
        self
    }

    /// Set the initiative bonus.
    pub fn with_initiative_bonus(mut self, bonus: i32) -> Self {
        self.initiative_bonus = bonus;
        self
    }

    /// Roll initiative with advantage or disadvantage.
    pub fn with_initiative_mode(mut self, mode: RollMode) -> Self {
        self.initiative_mode = mode;
        self
    }

    /// Set the basic attack profile.
    pub fn with_attack(mut self, attack_bonus: i32, damage: DiceExpr, damage_bonus: i32) -> Self {
        self.attack_bonus = attack_bonus;
        self.damage = damage;
        self.damage_bonus = damage_bonus;
        self
    }

    /// Set the damage type.
    pub fn with_damage_type(mut self, damage_type: impl Into<String>) -> Self {
        self.damage_type = damage_type.into();
        self
    }

    /// Set the spell repertoire and the dice offensive spells deal.
    pub fn with_spells(mut self, spells: Vec<String>, spell_damage: Option<DiceExpr>) -> Self {
        self.spells = spells;
        self.spell_damage = spell_damage;
        self
    }

    /// Give the combatant a heal action restoring `healing` hit points.
    pub fn with_healing(mut self, healing: DiceExpr) -> Self {
        self.healing = Some(healing);
        self
    }

    /// Set the position tag.
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Build a combatant from a stat block, validating its values.
    pub fn from_stat_block(block: &StatBlock) -> MechResult<Self> {
        let name = block.name.trim();
        if name.is_empty() {
            return Err(MechError::InvalidStatBlock {
                name: block.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        let max_hp = block.max_hp.unwrap_or(block.hp);
        if block.hp > max_hp {
            return Err(MechError::InvalidStatBlock {
                name: name.to_string(),
                reason: format!("hp {} exceeds max_hp {max_hp}", block.hp),
            });
        }
        let damage = parse_dice(&block.damage)?;
        let spell_damage = block.spell_damage.as_deref().map(parse_dice).transpose()?;
        let healing = block.healing.as_deref().map(parse_dice).transpose()?;

        let mut combatant = Self::new(name, block.side, max_hp, block.armor_class)
            .with_current_hp(block.hp)
            .with_initiative_bonus(block.initiative_bonus)
            .with_initiative_mode(block.initiative_mode)
            .with_attack(block.attack_bonus, damage, block.damage_bonus)
            .with_damage_type(&block.damage_type)
            .with_spells(block.spells.clone(), spell_damage);
        combatant.healing = healing;
        combatant.position = block.position.clone();
        Ok(combatant)
    }

    /// Whether the combatant is still fighting.
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// The faction the combatant fights for.
    pub fn faction(&self) -> Faction {
        self.side.faction()
    }

    /// Current over maximum hit points, or `None` when the maximum is 0.
    pub fn hp_ratio(&self) -> Option<f64> {
        (self.max_hp > 0).then(|| f64::from(self.hp) / f64::from(self.max_hp))
    }
}

impl std::fmt::Display for Combatant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) HP {}/{} AC {} [{}]",
            self.name, self.side, self.hp, self.max_hp, self.armor_class, self.status
        )
    }
}

fn default_damage() -> String {
    "1d4".to_string()
}

fn default_damage_type() -> String {
    "bludgeoning".to_string()
}

/// A combatant as written in an encounter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Display name.
    pub name: String,
    /// Which side the combatant is on.
    pub side: Side,
    /// Starting hit points.
    pub hp: u32,
    /// Maximum hit points; defaults to `hp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<u32>,
    /// Armor class.
    #[serde(alias = "ac")]
    pub armor_class: i32,
    /// Initiative bonus.
    #[serde(default)]
    pub initiative_bonus: i32,
    /// `advantage` or `disadvantage` on initiative.
    #[serde(default, skip_serializing_if = "RollMode::is_normal")]
    pub initiative_mode: RollMode,
    /// Attack bonus.
    #[serde(default)]
    pub attack_bonus: i32,
    /// Damage dice notation.
    #[serde(default = "default_damage")]
    pub damage: String,
    /// Flat damage bonus.
    #[serde(default)]
    pub damage_bonus: i32,
    /// Damage type.
    #[serde(default = "default_damage_type")]
    pub damage_type: String,
    /// Spell names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spells: Vec<String>,
    /// Dice notation for offensive spells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_damage: Option<String>,
    /// Dice notation for the heal action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healing: Option<String>,
    /// Position or environment tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}
