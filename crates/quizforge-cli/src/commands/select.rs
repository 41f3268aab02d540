//! The `quizforge select` command: show what a session would contain.

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizforge_core::traits::ItemStore;

use super::{Engine, SelectionArgs};
use crate::commands::parse::truncate;
use crate::EngineArgs;

pub async fn execute(selection: SelectionArgs, args: EngineArgs) -> Result<()> {
    let ctx = selection.context()?;
    let engine = Engine::open(&args).await?;
    let limit = selection.limit.unwrap_or(engine.config.engine.default_limit);

    let chosen = engine
        .selector
        .select_items(&selection.learner, &ctx, limit)
        .await?;
    engine.persist().await?;

    let meta = &chosen.metadata;
    println!(
        "Selected {} of {limit} item(s) ({} mode, buckets {:?})",
        chosen.item_ids.len(),
        meta.mode,
        meta.difficulty_buckets
    );
    for (step, count) in &meta.contributions {
        println!("  {step}: {count}");
    }

    if chosen.item_ids.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Topic", "Difficulty", "Origin", "Question"]);
    for (i, id) in chosen.item_ids.iter().enumerate() {
        let Some(item) = ItemStore::find_by_id(&*engine.store, *id).await? else {
            continue;
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(item.primary_topic().unwrap_or("-")),
            Cell::new(item.difficulty),
            Cell::new(format!("{:?}", item.origin).to_lowercase()),
            Cell::new(truncate(&item.question, 60)),
        ]);
    }
    println!("{table}");

    Ok(())
}
