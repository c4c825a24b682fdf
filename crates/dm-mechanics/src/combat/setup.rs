//! Encounter files.
//!
//! ```json
//! {
//!   "environment": "a rain-soaked crossroads",
//!   "combatants": [
//!     { "name": "Aria", "side": "player", "hp": 12, "armor_class": 15 }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EncounterConfig;
use crate::dice::RollMode;
use crate::error::{MechError, MechResult};
use crate::random::RandomSource;

use super::encounter::Encounter;
use super::{Combatant, Side, StatBlock};

/// The contents of an encounter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSetup {
    /// Free-form environment description, used for narration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// The combatants, in insertion order.
    pub combatants: Vec<StatBlock>,
}

impl EncounterSetup {
    /// Parse an encounter file.
    pub fn from_json(json: &str) -> MechResult<Self> {
        serde_json::from_str(json).map_err(|e| MechError::InvalidSetup(e.to_string()))
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> MechResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MechError::InvalidSetup(e.to_string()))
    }

    /// Validate every stat block and build the combatants.
    pub fn combatants(&self) -> MechResult<Vec<Combatant>> {
        self.combatants.iter().map(Combatant::from_stat_block).collect()
    }

    /// Build an encounter seeded from `config`.
    pub fn build(&self, config: EncounterConfig) -> MechResult<Encounter> {
        self.populate(Encounter::new(config))
    }

    /// Build an encounter drawing randomness from `rng`.
    pub fn build_with_rng<R: RandomSource>(
        &self,
        config: EncounterConfig,
        rng: R,
    ) -> MechResult<Encounter<R>> {
        self.populate(Encounter::with_rng(config, rng))
    }

    fn populate<R: RandomSource>(&self, mut encounter: Encounter<R>) -> MechResult<Encounter<R>> {
        if let Some(environment) = &self.environment {
            encounter = encounter.with_environment(environment);
        }
        for combatant in self.combatants()? {
            encounter.add_combatant(combatant)?;
        }
        Ok(encounter)
    }

    /// A small ready-to-run encounter.
    pub fn sample() -> Self {
        let block = |name: &str, side: Side, hp: u32, armor_class: i32| StatBlock {
            name: name.to_string(),
            side,
            hp,
            max_hp: None,
            armor_class,
            initiative_bonus: 0,
            initiative_mode: RollMode::Normal,
            attack_bonus: 0,
            damage: "1d4".to_string(),
            damage_bonus: 0,
            damage_type: "bludgeoning".to_string(),
            spells: Vec::new(),
            spell_damage: None,
            healing: None,
            position: None,
        };
        Self {
            environment: Some("a torchlit crypt with a collapsed far wall".to_string()),
            combatants: vec![
                StatBlock {
                    initiative_bonus: 2,
                    attack_bonus: 5,
                    damage: "1d8".to_string(),
                    damage_bonus: 3,
                    damage_type: "slashing".to_string(),
                    ..block("Aria", Side::Player, 14, 16)
                },
                StatBlock {
                    initiative_bonus: 1,
                    attack_bonus: 4,
                    damage: "1d6".to_string(),
                    damage_bonus: 2,
                    damage_type: "piercing".to_string(),
                    spells: vec!["Fire Bolt".to_string(), "Ray of Frost".to_string()],
                    spell_damage: Some("1d10".to_string()),
                    healing: Some("1d8+2".to_string()),
                    position: Some("behind a fallen pillar".to_string()),
                    ..block("Mira", Side::Ally, 9, 12)
                },
                StatBlock {
                    initiative_bonus: 2,
                    initiative_mode: RollMode::Disadvantage,
                    attack_bonus: 4,
                    damage: "1d6".to_string(),
                    damage_bonus: 2,
                    damage_type: "slashing".to_string(),
                    ..block("Skeleton", Side::Enemy, 13, 13)
                },
                StatBlock {
                    attack_bonus: 3,
                    damage: "1d6".to_string(),
                    damage_bonus: 1,
                    spells: vec!["Chill Touch".to_string()],
                    spell_damage: Some("1d8".to_string()),
                    damage_type: "necrotic".to_string(),
                    ..block("Cultist", Side::Enemy, 9, 12)
                },
            ],
        }
    }
}
