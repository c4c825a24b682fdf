use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use dm_mechanics::{
    CombatEvent, Combatant, Command, Encounter, EncounterConfig, EncounterSetup, EncounterState,
    EncounterSummary, Narrator, help_lines, parse_command,
};
use dm_narrative::{NarratorConfig, NarratorTone, TemplateNarrator, Verbosity};

/// Flags for `dm fight`.
pub struct FightOptions {
    pub seed: Option<u64>,
    pub auto: bool,
    pub narrate: bool,
    pub creativity: f32,
    pub tone: String,
    pub verbosity: String,
    pub max_rounds: Option<u32>,
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Markdown,
    Json,
}

impl Format {
    fn parse(format: &str) -> Result<Self, String> {
        match format {
            "text" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "unsupported format: \"{format}\". Use: text, markdown, json"
            )),
        }
    }
}

pub fn run(file: &Path, options: &FightOptions) -> Result<(), String> {
    let format = Format::parse(&options.format)?;
    let tone: NarratorTone = options.tone.parse::<NarratorTone>().map_err(|e| e.to_string())?;
    let verbosity: Verbosity = options.verbosity.parse::<Verbosity>().map_err(|e| e.to_string())?;
    let json = super::read_file(file)?;
    let setup = EncounterSetup::from_json(&json).map_err(|e| e.to_string())?;

    let seed = options.seed.unwrap_or_else(rand::random);
    let mut config = EncounterConfig::default().with_seed(seed);
    if let Some(rounds) = options.max_rounds {
        config = config.with_max_rounds(rounds);
    }

    let mut encounter = setup.build(config).map_err(|e| e.to_string())?;
    let narrator_config = NarratorConfig::new()
        .with_tone(tone)
        .with_verbosity(verbosity);
    let narrator = options
        .narrate
        .then(|| TemplateNarrator::new(narrator_config));
    let creativity = options.creativity;
    // an unattended, unnarrated run prints the log in one piece at the end
    let batch_log = options.auto && narrator.is_none();

    encounter.start().map_err(|e| e.to_string())?;
    if format == Format::Text {
        print_header(&encounter, file, seed);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock().lines();
    let mut input_open = !options.auto;

    while encounter.state() == EncounterState::InProgress {
        let player_turn = encounter
            .current_actor()
            .is_some_and(|actor| !actor.side.is_agent_controlled());

        let event = if player_turn && input_open {
            match read_player_turn(&mut encounter, &mut input)? {
                Some(event) => event,
                None => {
                    input_open = false;
                    eprintln!("  {}", "(input closed, tactics take over)".dimmed());
                    continue;
                }
            }
        } else if player_turn {
            let action = encounter.suggest_action().map_err(|e| e.to_string())?;
            encounter.resolve(action).map_err(|e| e.to_string())?
        } else {
            encounter.take_agent_turn().map_err(|e| e.to_string())?
        };

        if format == Format::Text && !batch_log {
            let line = describe(&event, narrator.as_ref(), creativity, encounter.environment());
            println!("  {} {line}", format!("[{}]", event.round).dimmed());
        }
    }

    let summary = encounter.summary().map_err(|e| e.to_string())?;
    match format {
        Format::Text => {
            if batch_log {
                print!("{}", summary.log.export_text());
            }
            print_summary(&summary);
        }
        Format::Markdown => {
            println!("{}", summary.log.export_markdown());
            if let Some(narrator) = &narrator {
                println!("## Narration");
                println!();
                for event in summary.log.events() {
                    let request = event.narration_request(encounter.environment());
                    println!("- {}", narrator.narrate(&request, creativity));
                }
                println!();
            }
            println!("## Result");
            println!();
            println!("{}", outcome_line(&summary));
        }
        Format::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| format!("cannot serialize summary: {e}"))?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Prompt the current player until a command resolves. `None` means the
/// input ran out.
fn read_player_turn<B: BufRead>(
    encounter: &mut Encounter,
    input: &mut io::Lines<B>,
) -> Result<Option<CombatEvent>, String> {
    let actor = encounter
        .current_actor()
        .cloned()
        .ok_or("no current actor")?;
    let choices: Vec<String> = encounter
        .available_actions()
        .iter()
        .map(ToString::to_string)
        .collect();
    eprintln!(
        "  {}",
        format!("{}: {} ({}/{} HP)", actor.name, choices.join(", "), actor.hp, actor.max_hp).dimmed()
    );

    loop {
        eprint!("{}> ", actor.name.bold());
        io::stderr().flush().map_err(|e| e.to_string())?;

        let Some(line) = input.next() else {
            return Ok(None);
        };
        let line = line.map_err(|e| format!("cannot read input: {e}"))?;

        match parse_command(&line) {
            Command::Help => {
                for help in help_lines() {
                    eprintln!("  {help}");
                }
            }
            Command::Status => eprintln!("{}", status_table(encounter.registry().iter())),
            command => {
                let resolved = command
                    .into_action(&actor, encounter.registry())
                    .and_then(|action| encounter.resolve(action));
                match resolved {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => eprintln!("  {}", e.to_string().red()),
                }
            }
        }
    }
}

fn describe(
    event: &CombatEvent,
    narrator: Option<&TemplateNarrator>,
    creativity: f32,
    environment: Option<&str>,
) -> String {
    let line = match narrator {
        Some(narrator) => narrator.narrate(&event.narration_request(environment), creativity),
        None => event.to_string(),
    };
    if event.defeated_target() {
        line.red().to_string()
    } else if event.is_critical() {
        line.yellow().to_string()
    } else {
        line
    }
}

fn print_header(encounter: &Encounter, file: &Path, seed: u64) {
    println!(
        "  {} '{}' {}",
        "Encounter".bold(),
        file.display(),
        format!("(seed={seed})").dimmed()
    );
    if let Some(environment) = encounter.environment() {
        println!("  {}", environment.italic());
    }
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Combatant", "Initiative"]);
    for (i, entry) in encounter.initiative().iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            entry.name.clone(),
            format!("{} ({}{:+})", entry.total, entry.natural, entry.bonus),
        ]);
    }
    println!("{table}");
    println!();
}

fn status_table<'a>(combatants: impl Iterator<Item = &'a Combatant>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Side", "HP", "AC", "Status"]);
    for c in combatants {
        table.add_row(vec![
            c.name.clone(),
            c.side.to_string(),
            format!("{}/{}", c.hp, c.max_hp),
            c.armor_class.to_string(),
            c.status.to_string(),
        ]);
    }
    table
}

fn outcome_line(summary: &EncounterSummary) -> String {
    let rounds = format!(
        "{} round{}",
        summary.rounds,
        if summary.rounds == 1 { "" } else { "s" }
    );
    match summary.winner {
        Some(side) => format!("Winner: {side} side after {rounds}"),
        None if summary.round_limit_reached => {
            format!("No winner: round limit reached after {rounds}")
        }
        None => format!("No winner after {rounds}"),
    }
}

fn print_summary(summary: &EncounterSummary) {
    println!();
    println!("  {}", outcome_line(summary).bold());
    println!("{}", status_table(summary.combatants.iter()));
    println!(
        "  {}",
        format!(
            "{} actions, {} survivors",
            summary.log.len(),
            summary.survivors().count()
        )
        .dimmed()
    );
}
