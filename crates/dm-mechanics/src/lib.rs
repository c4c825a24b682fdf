//! Turn-based combat engine for Dungeonmind.
//!
//! Provides dice notation parsing and rolling, a combatant registry, a fixed
//! initiative order, a tactical decision procedure for agent-controlled
//! combatants, and an encounter state machine that resolves one action at a
//! time. All randomness flows through a single injectable [`RandomSource`].

pub mod combat;
pub mod config;
pub mod dice;
pub mod error;
pub mod random;

pub use combat::{
    ActionKind, CombatAction, CombatEvent, CombatLog, Combatant, Command, DamageReport, Encounter,
    EncounterSetup, EncounterState, EncounterSummary, EventOutcome, Faction, Initiative,
    InitiativeEntry, NarrationRequest, Narrator, Registry, RulesLookup, Side, StatBlock, Status,
    help_lines, parse_command,
};
pub use config::{EncounterConfig, TacticsConfig};
pub use dice::{DiceExpr, Die, DieResult, RollMode, RollResult, parse_dice, roll_notation};
pub use error::{MechError, MechResult};
pub use random::{RandomSource, ScriptedRandom};
