//! Narrator configuration.

use std::str::FromStr;

use crate::error::NarrativeError;

/// Narrator tone - affects the word choice of descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarratorTone {
    /// Measured, traditional style.
    #[default]
    Formal,
    /// Casual, conversational style.
    Casual,
    /// Dramatic, epic style.
    Dramatic,
    /// Humorous, lighthearted style.
    Humorous,
}

/// How much surrounding detail each line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Just the outcome.
    Terse,
    /// The outcome with critical and defeat remarks.
    #[default]
    Normal,
    /// Everything, including the environment.
    Verbose,
}

impl FromStr for NarratorTone {
    type Err = NarrativeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Self::Formal),
            "casual" => Ok(Self::Casual),
            "dramatic" => Ok(Self::Dramatic),
            "humorous" | "funny" => Ok(Self::Humorous),
            _ => Err(NarrativeError::UnknownSetting {
                setting: "tone",
                value: s.to_string(),
                expected: "formal, casual, dramatic, humorous",
            }),
        }
    }
}

impl FromStr for Verbosity {
    type Err = NarrativeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terse" => Ok(Self::Terse),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(NarrativeError::UnknownSetting {
                setting: "verbosity",
                value: s.to_string(),
                expected: "terse, normal, verbose",
            }),
        }
    }
}

/// Configuration for the narrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarratorConfig {
    /// The tone of narration.
    pub tone: NarratorTone,
    /// The verbosity level.
    pub verbosity: Verbosity,
}

impl NarratorConfig {
    /// Create a new narrator config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tone.
    pub fn with_tone(mut self, tone: NarratorTone) -> Self {
        self.tone = tone;
        self
    }

    /// Set the verbosity.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}
