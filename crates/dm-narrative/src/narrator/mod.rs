//! Template-based combat narration.

mod config;
mod templates;

pub use config::{NarratorConfig, NarratorTone, Verbosity};
pub use templates::{Intensity, Templates};

use dm_mechanics::{ActionKind, NarrationRequest, Narrator};

/// A deterministic narrator that assembles text from phrase tables.
///
/// The same request, config, and creativity always produce the same text.
#[derive(Debug, Clone, Copy)]
pub struct TemplateNarrator {
    templates: Templates,
}

impl TemplateNarrator {
    /// Create a narrator with the given configuration.
    pub fn new(config: NarratorConfig) -> Self {
        Self {
            templates: Templates::new(config),
        }
    }

    /// The narrator configuration.
    pub fn config(&self) -> &NarratorConfig {
        self.templates.config()
    }

    fn outcome_sentence(&self, request: &NarrationRequest, intensity: Intensity) -> String {
        let t = &self.templates;
        let actor = &request.actor;
        let target = request.target.as_deref().unwrap_or("the air");
        let terse = self.config().verbosity == Verbosity::Terse;

        match (request.kind, request.hit) {
            (ActionKind::Flee, _) => format!("{actor} {}.", t.flee_phrase(intensity)),
            (ActionKind::Idle, _) => format!("{actor} {}.", t.idle_phrase(intensity)),
            (ActionKind::Heal, _) => {
                let whom = if request.target.as_deref() == Some(actor.as_str()) {
                    "themselves"
                } else {
                    target
                };
                if terse {
                    format!("{actor} {} {whom} (+{}).", t.heal_verb(intensity), request.healed)
                } else {
                    format!(
                        "{actor} {} {whom}, restoring {} hit points.",
                        t.heal_verb(intensity),
                        request.healed
                    )
                }
            }
            (ActionKind::Spell, None) => format!(
                "{actor} {} {} on {target}.",
                t.cast_verb(intensity),
                request.spell.as_deref().unwrap_or("a spell")
            ),
            (_, Some(false)) => {
                let with = with_clause(request);
                format!("{actor} {} {target}{with}.", t.miss_verb(intensity))
            }
            (_, hit) => {
                let with = with_clause(request);
                let verb = if hit == Some(true) {
                    t.hit_verb(intensity)
                } else {
                    "acts against"
                };
                if terse {
                    format!("{actor} {verb} {target}{with} ({}).", request.damage)
                } else {
                    let damage_type = request.damage_type.as_deref().unwrap_or("untyped");
                    format!(
                        "{actor} {verb} {target}{with} for {} {damage_type} damage.",
                        request.damage
                    )
                }
            }
        }
    }
}

impl Default for TemplateNarrator {
    fn default() -> Self {
        Self::new(NarratorConfig::default())
    }
}

fn with_clause(request: &NarrationRequest) -> String {
    match &request.spell {
        Some(spell) => format!(" with {spell}"),
        None => String::new(),
    }
}

impl Narrator for TemplateNarrator {
    fn narrate(&self, request: &NarrationRequest, creativity: f32) -> String {
        let intensity = Intensity::from_creativity(creativity);
        let verbosity = self.config().verbosity;
        let mut text = self.outcome_sentence(request, intensity);

        if verbosity == Verbosity::Terse {
            return text;
        }

        if request.critical {
            text.push(' ');
            text.push_str(self.templates.critical_remark());
        }
        if request.defeated {
            if let Some(target) = &request.target {
                text.push(' ');
                text.push_str(&self.templates.defeat_remark(target));
            }
        }

        if verbosity == Verbosity::Verbose {
            if let Some(environment) = &request.environment {
                text = format!("Amid {environment}, {text}");
            }
        }
        text
    }
}
