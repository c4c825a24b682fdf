use std::fs;
use std::path::Path;

use dm_mechanics::EncounterSetup;

pub fn run(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Err(format!("'{}' already exists", path.display()));
    }

    let json = EncounterSetup::sample()
        .to_json()
        .map_err(|e| e.to_string())?;
    fs::write(path, format!("{json}\n"))
        .map_err(|e| format!("cannot write {}: {e}", path.display()))?;

    println!("Created encounter '{}'", path.display());
    println!();
    println!("Get started:");
    println!("  # Edit the file to set up your combatants");
    println!("  dm fight {}          # Play it out", path.display());
    println!("  dm fight {} --auto   # Watch it play itself", path.display());

    Ok(())
}
