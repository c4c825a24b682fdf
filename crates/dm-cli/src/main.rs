//! CLI frontend for the Dungeonmind combat engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "dm",
    about = "Dungeonmind: a turn-based combat assistant for tabletop games",
    version,
    propagate_version = true
)]
struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll dice notation such as 2d6+3
    Roll {
        /// Dice notation (NdS, NdS+M, NdS-M)
        notation: String,

        /// RNG seed for a reproducible roll
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of times to roll
        #[arg(short, long, default_value = "1")]
        times: u32,

        /// Roll twice and keep the higher total
        #[arg(long)]
        advantage: bool,

        /// Roll twice and keep the lower total
        #[arg(long)]
        disadvantage: bool,
    },

    /// Run an encounter from a JSON file
    Fight {
        /// Encounter file
        file: PathBuf,

        /// RNG seed for a reproducible encounter (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Let tactics drive player combatants too
        #[arg(short, long)]
        auto: bool,

        /// Narrate each action instead of printing the raw result
        #[arg(short, long)]
        narrate: bool,

        /// Narration creativity, 0.0 (plain) to 1.0 (dramatic)
        #[arg(short, long, default_value = "0.5")]
        creativity: f32,

        /// Narration tone: formal, casual, dramatic, humorous
        #[arg(long, default_value = "formal")]
        tone: String,

        /// Narration detail: terse, normal, verbose
        #[arg(long, default_value = "normal")]
        verbosity: String,

        /// Stop after this many rounds with no winner
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Output format: text, markdown, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Look up a rule, condition, or monster
    Rules {
        /// What to look up (typos are tolerated)
        query: Option<String>,

        /// List the entries of a category (combat, condition, monster, ...)
        #[arg(long)]
        category: Option<String>,

        /// Extra rulebook JSON file; its entries override built-in ones
        #[arg(short, long)]
        rulebook: Option<PathBuf>,
    },

    /// Write a sample encounter file
    Init {
        /// Path of the file to create
        #[arg(default_value = "encounter.json")]
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "dm_mechanics=debug,dm_cli=debug,warn"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Roll {
            notation,
            seed,
            times,
            advantage,
            disadvantage,
        } => commands::roll::run(
            &notation,
            seed,
            times,
            dm_mechanics::RollMode::from_flags(advantage, disadvantage),
        ),
        Commands::Fight {
            file,
            seed,
            auto,
            narrate,
            creativity,
            tone,
            verbosity,
            max_rounds,
            format,
        } => commands::fight::run(
            &file,
            &commands::fight::FightOptions {
                seed,
                auto,
                narrate,
                creativity,
                tone,
                verbosity,
                max_rounds,
                format,
            },
        ),
        Commands::Rules {
            query,
            category,
            rulebook,
        } => commands::rules::run(query.as_deref(), category.as_deref(), rulebook.as_deref()),
        Commands::Init { path } => commands::init::run(&path),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
