//! Configuration for encounters and the tactical decision procedure.

/// Probabilities and thresholds used when choosing actions for
/// agent-controlled combatants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TacticsConfig {
    /// Hit point ratio below which a combatant considers fleeing.
    pub flee_threshold: f64,
    /// Probability of fleeing once below the threshold.
    pub flee_chance: f64,
    /// Probability of casting a spell when the repertoire is non-empty.
    pub spell_chance: f64,
    /// Hit point ratio below which a healer tends to itself or an ally.
    pub heal_threshold: f64,
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            flee_threshold: 0.25,
            flee_chance: 0.5,
            spell_chance: 0.3,
            heal_threshold: 0.5,
        }
    }
}

impl TacticsConfig {
    /// Set the hit point ratio below which fleeing is considered.
    pub fn with_flee_threshold(mut self, threshold: f64) -> Self {
        self.flee_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the probability of fleeing (clamped to 0.0-1.0).
    pub fn with_flee_chance(mut self, chance: f64) -> Self {
        self.flee_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the probability of casting a spell (clamped to 0.0-1.0).
    pub fn with_spell_chance(mut self, chance: f64) -> Self {
        self.spell_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the hit point ratio below which healers heal (clamped to 0.0-1.0).
    pub fn with_heal_threshold(mut self, threshold: f64) -> Self {
        self.heal_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

/// Configuration for a combat encounter.
#[derive(Debug, Clone)]
pub struct EncounterConfig {
    /// RNG seed for reproducible encounters.
    pub seed: u64,
    /// Round limit for the encounter, whether turns are driven by
    /// [`resolve`](crate::Encounter::resolve) or
    /// [`play_out`](crate::Encounter::play_out). Advancing past it concludes
    /// the encounter with no winner.
    pub max_rounds: u32,
    /// Double the damage dice on a natural 20.
    pub critical_doubles_dice: bool,
    /// A natural 1 misses regardless of the attack total.
    pub natural_one_misses: bool,
    /// Tactical decision parameters.
    pub tactics: TacticsConfig,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_rounds: 100,
            critical_doubles_dice: false,
            natural_one_misses: false,
            tactics: TacticsConfig::default(),
        }
    }
}

impl EncounterConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the round limit (at least 1).
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    /// Enable or disable doubled damage dice on a natural 20.
    pub fn with_critical_doubles_dice(mut self, enabled: bool) -> Self {
        self.critical_doubles_dice = enabled;
        self
    }

    /// Enable or disable automatic misses on a natural 1.
    pub fn with_natural_one_misses(mut self, enabled: bool) -> Self {
        self.natural_one_misses = enabled;
        self
    }

    /// Set the tactical decision parameters.
    pub fn with_tactics(mut self, tactics: TacticsConfig) -> Self {
        self.tactics = tactics;
        self
    }
}
