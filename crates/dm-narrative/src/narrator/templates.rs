//! Phrase tables for combat narration.

use super::config::{NarratorConfig, NarratorTone};

/// How elaborate the phrasing is, derived from the creativity parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Intensity {
    /// Plain wording.
    Plain,
    /// Some color.
    Vivid,
    /// Full flourish.
    Epic,
}

impl Intensity {
    /// Map creativity (clamped to 0.0-1.0, NaN treated as 0.0) onto an
    /// intensity band.
    pub fn from_creativity(creativity: f32) -> Self {
        let c = if creativity.is_nan() {
            0.0
        } else {
            creativity.clamp(0.0, 1.0)
        };
        if c < 1.0 / 3.0 {
            Self::Plain
        } else if c < 2.0 / 3.0 {
            Self::Vivid
        } else {
            Self::Epic
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Plain => 0,
            Self::Vivid => 1,
            Self::Epic => 2,
        }
    }
}

const HIT_VERBS: [[&str; 3]; 4] = [
    ["hits", "strikes", "lands a telling blow on"],
    ["hits", "clocks", "absolutely wallops"],
    ["strikes", "smites", "brings ruin upon"],
    ["bonks", "thwacks", "gives a free lesson in pain to"],
];

const MISS_VERBS: [[&str; 3]; 4] = [
    ["misses", "fails to strike", "is turned aside by"],
    ["misses", "whiffs against", "totally whiffs on"],
    ["falls short against", "is denied by", "crashes uselessly against the guard of"],
    ["misses", "swings wildly past", "achieves nothing against"],
];

const FLEE_PHRASES: [[&str; 3]; 4] = [
    ["flees", "withdraws from the fight", "retreats in haste"],
    ["bails", "takes off", "nopes out of there"],
    ["flees the field", "breaks and runs", "flees into the dark, courage spent"],
    ["runs away", "makes a tactical sprint", "remembers urgent business elsewhere"],
];

const IDLE_PHRASES: [[&str; 3]; 4] = [
    ["waits", "holds position", "watches and waits"],
    ["hangs back", "takes a breather", "kicks back for a moment"],
    ["stands ready", "steels for what comes", "stands unmoving as the storm gathers"],
    ["waits", "checks the time", "contemplates the meaning of combat"],
];

const HEAL_VERBS: [[&str; 3]; 4] = [
    ["tends to", "mends the wounds of", "restores vigor to"],
    ["tends to", "patches up", "props up"],
    ["tends to", "lays healing hands on", "calls the light down upon"],
    ["tends to", "slaps a bandage on", "applies the miracle of modern medicine to"],
];

const CAST_VERBS: [&str; 3] = ["casts", "weaves", "unleashes"];

/// Tone-aware phrase selection.
#[derive(Debug, Clone, Copy)]
pub struct Templates {
    config: NarratorConfig,
}

impl Templates {
    /// Create phrase tables for the given config.
    pub fn new(config: NarratorConfig) -> Self {
        Self { config }
    }

    /// The narrator configuration.
    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }

    fn tone_index(&self) -> usize {
        match self.config.tone {
            NarratorTone::Formal => 0,
            NarratorTone::Casual => 1,
            NarratorTone::Dramatic => 2,
            NarratorTone::Humorous => 3,
        }
    }

    /// Verb for a connecting attack.
    pub fn hit_verb(&self, intensity: Intensity) -> &'static str {
        HIT_VERBS[self.tone_index()][intensity.index()]
    }

    /// Verb for a missed attack.
    pub fn miss_verb(&self, intensity: Intensity) -> &'static str {
        MISS_VERBS[self.tone_index()][intensity.index()]
    }

    /// Phrase for fleeing.
    pub fn flee_phrase(&self, intensity: Intensity) -> &'static str {
        FLEE_PHRASES[self.tone_index()][intensity.index()]
    }

    /// Phrase for passing a turn.
    pub fn idle_phrase(&self, intensity: Intensity) -> &'static str {
        IDLE_PHRASES[self.tone_index()][intensity.index()]
    }

    /// Verb for healing a combatant.
    pub fn heal_verb(&self, intensity: Intensity) -> &'static str {
        HEAL_VERBS[self.tone_index()][intensity.index()]
    }

    /// Verb for casting a spell.
    pub fn cast_verb(&self, intensity: Intensity) -> &'static str {
        CAST_VERBS[intensity.index()]
    }

    /// Remark appended on a natural 20.
    pub fn critical_remark(&self) -> &'static str {
        match self.config.tone {
            NarratorTone::Formal => "A critical hit!",
            NarratorTone::Casual => "Natural 20!",
            NarratorTone::Dramatic => "Fate itself guides the blow!",
            NarratorTone::Humorous => "The dice gods smile.",
        }
    }

    /// Remark appended when the target drops.
    pub fn defeat_remark(&self, target: &str) -> String {
        match self.config.tone {
            NarratorTone::Formal => format!("{target} is defeated."),
            NarratorTone::Casual => format!("{target} is down."),
            NarratorTone::Dramatic => format!("{target} falls, never to rise."),
            NarratorTone::Humorous => format!("{target} takes a very long nap."),
        }
    }
}
