use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;

use dm_mechanics::{RollMode, parse_dice};

pub fn run(notation: &str, seed: Option<u64>, times: u32, mode: RollMode) -> Result<(), String> {
    let expr = parse_dice(notation).map_err(|e| e.to_string())?;
    if times == 0 {
        return Err("--times must be at least 1".into());
    }

    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    tracing::debug!(%expr, seed, times, %mode, "rolling");

    let label = if mode.is_normal() {
        expr.to_string()
    } else {
        format!("{expr} with {mode}")
    };
    for _ in 0..times {
        let roll = expr.roll_with(mode, &mut rng);
        println!("  {}: {}", label.bold(), roll);
    }

    if times > 1 {
        println!();
        println!(
            "  {}",
            format!(
                "range {}..{}, average {:.1}",
                expr.min(),
                expr.max(),
                expr.average()
            )
            .dimmed()
        );
    }

    Ok(())
}
