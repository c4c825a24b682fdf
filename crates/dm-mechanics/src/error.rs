//! Error types for the combat engine.

/// Errors that can occur during mechanics operations.
///
/// Every error raised while resolving a single action leaves the encounter
/// untouched, so the caller can correct the input and try again.
#[derive(Debug, thiserror::Error)]
pub enum MechError {
    /// Dice notation could not be parsed.
    #[error("invalid dice notation '{notation}': {reason}")]
    Parse {
        /// The notation as given.
        notation: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A combatant name is not registered in the encounter.
    #[error("unknown combatant: {0}")]
    UnknownCombatant(String),

    /// The action is not legal in the current encounter state.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// A combatant with this name is already registered.
    #[error("combatant '{0}' is already registered")]
    DuplicateCombatant(String),

    /// A stat block has inconsistent values.
    #[error("invalid stat block for '{name}': {reason}")]
    InvalidStatBlock {
        /// The combatant the stat block describes.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The encounter file could not be read as an encounter.
    #[error("invalid encounter setup: {0}")]
    InvalidSetup(String),

    /// The encounter has not been started yet.
    #[error("encounter has not started")]
    NotStarted,

    /// The encounter was already started.
    #[error("encounter has already started")]
    AlreadyStarted,

    /// The encounter is over and accepts no more actions.
    #[error("encounter has concluded")]
    Concluded,

    /// The encounter has no combatants to order.
    #[error("encounter has no combatants")]
    NoCombatants,
}

impl MechError {
    /// Build a parse error for the given notation.
    pub fn parse(notation: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            notation: notation.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
