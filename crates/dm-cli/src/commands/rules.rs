use std::path::Path;

use colored::Colorize;

use dm_narrative::RuleBook;

pub fn run(
    query: Option<&str>,
    category: Option<&str>,
    rulebook: Option<&Path>,
) -> Result<(), String> {
    let mut book = RuleBook::builtin();
    if let Some(path) = rulebook {
        let json = super::read_file(path)?;
        let custom = RuleBook::from_json(&json)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        book.extend(custom);
    }

    match (query, category) {
        (Some(query), _) => show_entry(&book, query),
        (None, Some(category)) => list_category(&book, category),
        (None, None) => Err("give a query or --category to list".to_string()),
    }
}

fn show_entry(book: &RuleBook, query: &str) -> Result<(), String> {
    let Some(entry) = book.find(query) else {
        return Err(format!("no rule found for '{query}'"));
    };

    println!(
        "  {} {}",
        entry.title.bold(),
        format!("({})", entry.category).dimmed()
    );
    println!();
    println!("  {}", entry.text);

    Ok(())
}

fn list_category(book: &RuleBook, category: &str) -> Result<(), String> {
    let keys = book.keys_in(category);
    if keys.is_empty() {
        return Err(format!("no rules in category '{category}'"));
    }

    println!("  {}", category.bold());
    for key in keys {
        let title = book.find(key).map(|e| e.title.as_str()).unwrap_or(key);
        println!("  {key:<20} {}", title.dimmed());
    }
    Ok(())
}
