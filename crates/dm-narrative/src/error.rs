//! Error types for narration and rules lookup.

use thiserror::Error;

/// Result type for narrative operations.
pub type NarrativeResult<T> = Result<T, NarrativeError>;

/// Errors that can occur while loading narrative data.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// A rulebook file could not be parsed.
    #[error("invalid rulebook: {0}")]
    InvalidRulebook(String),

    /// A rulebook entry has an empty key.
    #[error("rulebook entry {index} has an empty key")]
    EmptyKey {
        /// Position of the entry in the file.
        index: usize,
    },

    /// A narrator setting was given a value it does not accept.
    #[error("unknown {setting} '{value}', expected one of: {expected}")]
    UnknownSetting {
        /// The setting name.
        setting: &'static str,
        /// The rejected value.
        value: String,
        /// The accepted values.
        expected: &'static str,
    },
}
