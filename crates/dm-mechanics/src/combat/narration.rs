//! Interfaces to the narration and rules-lookup collaborators.
//!
//! The engine never calls either while resolving an action. Callers build a
//! [`NarrationRequest`] from a logged [`CombatEvent`](super::CombatEvent)
//! after the state has advanced and hand it to whatever [`Narrator`] they use.

use serde::{Deserialize, Serialize};

use super::ActionKind;

/// A structured summary of one resolved action, for narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationRequest {
    /// Acting combatant.
    pub actor: String,
    /// What the actor did.
    pub kind: ActionKind,
    /// Targeted combatant, if any.
    pub target: Option<String>,
    /// Spell name, for spells.
    pub spell: Option<String>,
    /// Whether the attack or spell connected; `None` when nothing was rolled.
    pub hit: Option<bool>,
    /// Damage dealt.
    pub damage: u32,
    /// Damage type, when damage was dealt.
    pub damage_type: Option<String>,
    /// Hit points restored.
    #[serde(default)]
    pub healed: u32,
    /// Natural 20 on the attack roll.
    pub critical: bool,
    /// The target dropped to 0 hit points.
    pub defeated: bool,
    /// Free-form environment tag.
    pub environment: Option<String>,
}

/// Produces descriptive text for a resolved action.
pub trait Narrator {
    /// Describe `request`. `creativity` ranges from 0.0 (plain) to 1.0
    /// (florid); implementations clamp values outside that range.
    fn narrate(&self, request: &NarrationRequest, creativity: f32) -> String;
}

/// Answers free-text rules questions. Advisory only.
pub trait RulesLookup {
    /// Reference text for `query`, if anything matches.
    fn lookup(&self, query: &str) -> Option<String>;
}
