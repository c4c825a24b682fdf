//! Narration and rules reference for Dungeonmind encounters.
//!
//! [`TemplateNarrator`] turns resolved combat events into prose;
//! [`RuleBook`] answers rules questions with fuzzy lookup.

pub mod error;
pub mod narrator;
pub mod rulebook;

pub use error::{NarrativeError, NarrativeResult};
pub use narrator::{NarratorConfig, NarratorTone, TemplateNarrator, Verbosity};
pub use rulebook::{RuleBook, RuleEntry};
