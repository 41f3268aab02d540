//! The `quizforge parse` command: dry-run the item parser over a file of
//! raw generator output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizforge_core::parser::parse_raw_output;

pub fn execute(input: PathBuf, topic: String) -> Result<()> {
    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let outcome = parse_raw_output(&raw, &topic, chrono::Utc::now().timestamp_millis());
    println!(
        "Accepted: {}, dropped: {}",
        outcome.items.len(),
        outcome.dropped
    );

    if outcome.items.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Type", "Difficulty", "Bloom", "Question"]);
    for item in &outcome.items {
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(item.item_type),
            Cell::new(item.difficulty),
            Cell::new(item.bloom_level),
            Cell::new(truncate(&item.question, 60)),
        ]);
    }
    println!("{table}");

    Ok(())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
