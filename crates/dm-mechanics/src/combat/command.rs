//! Structured player commands.
//!
//! A fixed verb-object grammar: `attack <target>`, `cast <spell> on <target>`,
//! `heal [target]`, `flee`, `wait`, plus the table commands `status` and
//! `help`. Attacks and spells take a trailing `with advantage` or
//! `with disadvantage`. Parsing is
//! purely syntactic; [`Command::into_action`] resolves names against the
//! encounter and produces a [`CombatAction`].

use crate::dice::RollMode;
use crate::error::{MechError, MechResult};

use super::registry::Registry;
use super::{CombatAction, Combatant};

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Attack a named target.
    Attack {
        /// The target name as typed.
        target: String,
        /// How the attack d20 is rolled.
        mode: RollMode,
    },
    /// Cast a named spell at a named target.
    Cast {
        /// The spell name as typed.
        spell: String,
        /// The target name as typed.
        target: String,
        /// How the spell attack d20 is rolled.
        mode: RollMode,
    },
    /// Heal a named combatant, or oneself.
    Heal {
        /// The target name as typed; `None` heals the actor.
        target: Option<String>,
    },
    /// Leave the fight.
    Flee,
    /// Pass the turn.
    Wait,
    /// Show the combatants.
    Status,
    /// Show the command list.
    Help,
    /// Input that matches no command.
    Unknown {
        /// The original input, or a hint about what was missing.
        input: String,
    },
}

/// Verb synonyms for command parsing.
const ATTACK_VERBS: &[&str] = &["attack", "hit", "strike", "a"];
const CAST_VERBS: &[&str] = &["cast", "c"];
const HEAL_VERBS: &[&str] = &["heal", "cure"];
const FLEE_VERBS: &[&str] = &["flee", "run", "retreat"];
const WAIT_VERBS: &[&str] = &["wait", "idle", "pass", "w"];
const STATUS_VERBS: &[&str] = &["status", "s", "look"];
const HELP_VERBS: &[&str] = &["help", "h", "?"];

/// Parse one line of player input.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let words: Vec<&str> = input.split_whitespace().collect();
    let Some(first) = words.first() else {
        return Command::Help;
    };
    let verb = first.to_lowercase();
    let rest = &words[1..];

    if ATTACK_VERBS.contains(&verb.as_str()) {
        return parse_attack(rest);
    }
    if CAST_VERBS.contains(&verb.as_str()) {
        return parse_cast(rest);
    }
    if HEAL_VERBS.contains(&verb.as_str()) {
        let target = (!rest.is_empty()).then(|| rest.join(" "));
        return Command::Heal { target };
    }
    if FLEE_VERBS.contains(&verb.as_str()) {
        return Command::Flee;
    }
    if WAIT_VERBS.contains(&verb.as_str()) {
        return Command::Wait;
    }
    if STATUS_VERBS.contains(&verb.as_str()) {
        return Command::Status;
    }
    if HELP_VERBS.contains(&verb.as_str()) {
        return Command::Help;
    }

    Command::Unknown {
        input: input.to_string(),
    }
}

/// Strip a trailing `with advantage` / `with disadvantage`.
fn split_mode<'a, 'b>(words: &'a [&'b str]) -> (&'a [&'b str], RollMode) {
    if let [head @ .., with, mode] = words {
        if with.eq_ignore_ascii_case("with") {
            if mode.eq_ignore_ascii_case("advantage") {
                return (head, RollMode::Advantage);
            }
            if mode.eq_ignore_ascii_case("disadvantage") {
                return (head, RollMode::Disadvantage);
            }
        }
    }
    (words, RollMode::Normal)
}

fn parse_attack(rest: &[&str]) -> Command {
    let (rest, mode) = split_mode(rest);
    let target_words = match rest.first() {
        Some(word) if word.eq_ignore_ascii_case("the") => &rest[1..],
        _ => rest,
    };
    if target_words.is_empty() {
        return Command::Unknown {
            input: "attack whom?".to_string(),
        };
    }
    Command::Attack {
        target: target_words.join(" "),
        mode,
    }
}

fn parse_cast(rest: &[&str]) -> Command {
    let (rest, mode) = split_mode(rest);
    let Some(split) = rest
        .iter()
        .position(|w| w.eq_ignore_ascii_case("on") || w.eq_ignore_ascii_case("at"))
    else {
        return Command::Unknown {
            input: "cast what on whom?".to_string(),
        };
    };
    let spell = rest[..split].join(" ");
    let target = rest[split + 1..].join(" ");
    if spell.is_empty() || target.is_empty() {
        return Command::Unknown {
            input: "cast what on whom?".to_string(),
        };
    }
    Command::Cast {
        spell,
        target,
        mode,
    }
}

impl Command {
    /// Turn the command into an action for `actor`, matching target and
    /// spell names case-insensitively.
    pub fn into_action(self, actor: &Combatant, registry: &Registry) -> MechResult<CombatAction> {
        match self {
            Self::Attack { target, mode } => {
                let target = resolve_name(&target, registry)?;
                Ok(CombatAction::attack(actor, target).with_mode(mode))
            }
            Self::Cast {
                spell,
                target,
                mode,
            } => {
                let known = actor
                    .spells
                    .iter()
                    .find(|s| s.eq_ignore_ascii_case(&spell))
                    .ok_or_else(|| {
                        MechError::InvalidAction(format!(
                            "{} does not know the spell '{spell}'",
                            actor.name
                        ))
                    })?;
                let target = resolve_name(&target, registry)?;
                Ok(CombatAction::spell(actor, target, known).with_mode(mode))
            }
            Self::Heal { target } => {
                let target = match target {
                    Some(typed) => resolve_name(&typed, registry)?,
                    None => actor.name.clone(),
                };
                CombatAction::heal(actor, target).ok_or_else(|| {
                    MechError::InvalidAction(format!("{} cannot heal", actor.name))
                })
            }
            Self::Flee => Ok(CombatAction::flee(&actor.name)),
            Self::Wait => Ok(CombatAction::idle(&actor.name)),
            Self::Status | Self::Help => Err(MechError::InvalidAction(
                "not a combat action".to_string(),
            )),
            Self::Unknown { input } => Err(MechError::InvalidAction(format!(
                "unrecognized command: {input}"
            ))),
        }
    }
}

/// The registered spelling of a combatant name.
fn resolve_name(typed: &str, registry: &Registry) -> MechResult<String> {
    registry
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(typed))
        .map(|c| c.name.clone())
        .ok_or_else(|| MechError::UnknownCombatant(typed.to_string()))
}

/// One-line summaries of the accepted commands.
pub fn help_lines() -> &'static [&'static str] {
    &[
        "attack <target>          make a weapon attack",
        "cast <spell> on <target> cast a spell you know",
        "heal [target]            restore hit points to yourself or an ally",
        "... with advantage       roll the attack d20 twice, keep the higher",
        "... with disadvantage    roll the attack d20 twice, keep the lower",
        "flee                     leave the fight",
        "wait                     pass your turn",
        "status                   show all combatants",
        "help                     show this list",
    ]
}
