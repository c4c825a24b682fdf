//! A read-only rules reference.
//!
//! Lookups try an exact key or title match, then a substring match, then the
//! closest fuzzy match above [`FUZZY_THRESHOLD`].

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use dm_mechanics::RulesLookup;

use crate::error::{NarrativeError, NarrativeResult};

/// Minimum similarity score for fuzzy matching (0.0-1.0).
pub const FUZZY_THRESHOLD: f64 = 0.8;

/// One rule or reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Lookup key, lower-case with underscores (e.g. `opportunity_attack`).
    pub key: String,
    /// Display title.
    pub title: String,
    /// Grouping such as `combat` or `condition`.
    #[serde(default)]
    pub category: String,
    /// The rule text.
    pub text: String,
}

impl RuleEntry {
    fn new(key: &str, title: &str, category: &str, text: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            text: text.to_string(),
        }
    }
}

impl std::fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})\n{}", self.title, self.category, self.text)
    }
}

/// Built-in entries: `(key, title, category, text)`.
const BUILTIN_RULES: &[(&str, &str, &str, &str)] = &[
    (
        "initiative",
        "Initiative",
        "combat",
        "At the start of combat every participant rolls a d20 and adds its initiative bonus. \
         Turns go from highest to lowest and the order stays fixed for the whole fight.",
    ),
    (
        "attack",
        "Attack",
        "combat",
        "Roll a d20 and add your attack bonus. If the total equals or exceeds the target's \
         armor class, the attack hits and you roll damage.",
    ),
    (
        "armor_class",
        "Armor Class",
        "combat",
        "Armor class is the number an attack roll must meet or beat to hit a creature.",
    ),
    (
        "critical_hit",
        "Critical Hit",
        "combat",
        "A natural 20 on an attack roll hits regardless of armor class. Some tables roll the \
         damage dice twice on a critical hit.",
    ),
    (
        "advantage",
        "Advantage and Disadvantage",
        "combat",
        "With advantage, roll two d20s and use the higher; with disadvantage, use the lower. \
         Having both cancels out and you roll a single d20.",
    ),
    (
        "healing",
        "Healing",
        "combat",
        "A healer rolls its healing dice and restores that many hit points to itself or an \
         ally, up to the maximum. Healing cannot bring back a defeated creature.",
    ),
    (
        "damage",
        "Damage",
        "combat",
        "Roll the damage dice of the attack or spell and add any damage bonus. Damage reduces \
         hit points; a creature at 0 hit points is defeated.",
    ),
    (
        "hit_points",
        "Hit Points",
        "combat",
        "Hit points measure how much punishment a creature can take. They never drop below 0 \
         and healing never raises them above the maximum.",
    ),
    (
        "cast_spell",
        "Cast a Spell",
        "combat",
        "Casting a spell with a casting time of one action uses your action. Offensive spells \
         use a spell attack roll against the target's armor class.",
    ),
    (
        "dash",
        "Dash",
        "combat",
        "Gain extra movement equal to your speed for the current turn.",
    ),
    (
        "disengage",
        "Disengage",
        "combat",
        "Your movement does not provoke opportunity attacks for the rest of the turn.",
    ),
    (
        "dodge",
        "Dodge",
        "combat",
        "Until the start of your next turn, attack rolls against you have disadvantage.",
    ),
    (
        "flee",
        "Fleeing",
        "combat",
        "A creature that flees leaves the encounter and takes no further turns.",
    ),
    (
        "opportunity_attack",
        "Opportunity Attack",
        "combat",
        "When a hostile creature you can see moves out of your reach, you can use your \
         reaction to make one melee attack against it.",
    ),
    (
        "concentration",
        "Concentration",
        "spellcasting",
        "Some spells last only while you concentrate. Taking damage forces a Constitution \
         saving throw to keep concentrating.",
    ),
    (
        "spell_slots",
        "Spell Slots",
        "spellcasting",
        "Casting a spell expends a slot of the spell's level or higher.",
    ),
    (
        "blinded",
        "Blinded",
        "condition",
        "A blinded creature cannot see. Attack rolls against it have advantage and its own \
         attack rolls have disadvantage.",
    ),
    (
        "frightened",
        "Frightened",
        "condition",
        "A frightened creature has disadvantage on ability checks and attack rolls while the \
         source of its fear is in sight, and cannot willingly move closer to it.",
    ),
    (
        "grappled",
        "Grappled",
        "condition",
        "A grappled creature's speed becomes 0.",
    ),
    (
        "poisoned",
        "Poisoned",
        "condition",
        "A poisoned creature has disadvantage on attack rolls and ability checks.",
    ),
    (
        "prone",
        "Prone",
        "condition",
        "A prone creature can only crawl and has disadvantage on attack rolls. Melee attacks \
         against it have advantage; ranged attacks have disadvantage.",
    ),
    (
        "stunned",
        "Stunned",
        "condition",
        "A stunned creature cannot act or move and automatically fails Strength and Dexterity \
         saving throws. Attack rolls against it have advantage.",
    ),
    (
        "unconscious",
        "Unconscious",
        "condition",
        "An unconscious creature drops what it holds and falls prone. Attacks against it have \
         advantage, and melee hits from within 5 feet are critical hits.",
    ),
    (
        "saving_throw",
        "Saving Throw",
        "core",
        "Roll a d20 and add the relevant ability modifier to resist a spell, trap, or other \
         threat.",
    ),
    (
        "ability_check",
        "Ability Check",
        "core",
        "Roll a d20 and add the relevant ability modifier, plus proficiency if it applies. \
         Typical difficulty classes range from 5 (very easy) to 30 (nearly impossible).",
    ),
    (
        "short_rest",
        "Short Rest",
        "core",
        "At least one hour of light activity. Hit dice may be spent to recover hit points.",
    ),
    (
        "long_rest",
        "Long Rest",
        "core",
        "At least eight hours, mostly sleep. Restores all lost hit points.",
    ),
    (
        "goblin",
        "Goblin",
        "monster",
        "Small humanoid. AC 15, 7 HP (2d6). Scimitar +4 to hit, 1d6+2 slashing.",
    ),
    (
        "owlbear",
        "Owlbear",
        "monster",
        "Large monstrosity. AC 13, 59 HP (7d10+21). Beak +7 to hit, 1d10+5 piercing; \
         claws +7 to hit, 2d8+5 slashing.",
    ),
    (
        "skeleton",
        "Skeleton",
        "monster",
        "Medium undead. AC 13, 13 HP (2d8+4). Shortsword +4 to hit, 1d6+2 piercing.",
    ),
];

/// A rules database, passed explicitly to whoever needs it.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    entries: Vec<RuleEntry>,
}

impl RuleBook {
    /// An empty rulebook.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in reference entries.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_RULES
                .iter()
                .map(|(key, title, category, text)| RuleEntry::new(key, title, category, text))
                .collect(),
        }
    }

    /// Load entries from a JSON array of [`RuleEntry`]. Keys are normalized
    /// the same way queries are, so `"Cover Rules"` becomes `cover_rules`.
    pub fn from_json(json: &str) -> NarrativeResult<Self> {
        let mut entries: Vec<RuleEntry> =
            serde_json::from_str(json).map_err(|e| NarrativeError::InvalidRulebook(e.to_string()))?;
        for entry in &mut entries {
            entry.key = normalize(&entry.key);
        }
        if let Some(index) = entries.iter().position(|e| e.key.is_empty()) {
            return Err(NarrativeError::EmptyKey { index });
        }
        Ok(Self { entries })
    }

    /// Add entries, replacing any with the same key.
    pub fn extend(&mut self, other: RuleBook) {
        for entry in other.entries {
            match self.entries.iter_mut().find(|e| e.key == entry.key) {
                Some(existing) => *existing = entry,
                None => self.entries.push(entry),
            }
        }
    }

    /// All entries.
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the rulebook is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry best matching `query`.
    pub fn find(&self, query: &str) -> Option<&RuleEntry> {
        let query = normalize(query);
        if query.is_empty() {
            return None;
        }

        // exact
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.key == query || normalize(&e.title) == query)
        {
            return Some(entry);
        }

        // substring, shortest key first so "attack" prefers "attack"
        // over "opportunity_attack"
        let mut partial: Vec<&RuleEntry> = self
            .entries
            .iter()
            .filter(|e| e.key.contains(&query) || query.contains(&e.key))
            .collect();
        partial.sort_by_key(|e| e.key.len());
        if let Some(entry) = partial.first() {
            return Some(*entry);
        }

        // fuzzy
        self.entries
            .iter()
            .map(|e| (e, jaro_winkler(&query, &e.key)))
            .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(e, _)| e)
    }

    /// Keys of all entries in a category.
    pub fn keys_in(&self, category: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.category.eq_ignore_ascii_case(category))
            .map(|e| e.key.as_str())
            .collect()
    }
}

impl RulesLookup for RuleBook {
    fn lookup(&self, query: &str) -> Option<String> {
        self.find(query).map(|e| e.to_string())
    }
}

/// Lower-case with spaces and hyphens turned into underscores.
fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
