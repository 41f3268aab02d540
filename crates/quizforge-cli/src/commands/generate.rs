//! The `quizforge generate` command: resolve one request through the
//! generation cache.

use anyhow::Result;

use quizforge_core::model::LevelCounts;

use super::Engine;
use crate::EngineArgs;

pub async fn execute(
    topic: String,
    easy: u32,
    medium: u32,
    hard: u32,
    save: bool,
    args: EngineArgs,
) -> Result<()> {
    let engine = Engine::open(&args).await?;
    let levels = LevelCounts::new(easy, medium, hard);

    let resolution = engine.cache.resolve(&topic, levels, save).await?;
    engine.persist().await?;

    println!("Batch: {}", resolution.batch_id);
    println!(
        "Cache: {}",
        if resolution.cache_hit { "hit" } else { "miss" }
    );
    if resolution.published_now {
        println!("Published: yes");
    }
    println!("Linked items: {}", resolution.linked_item_ids.len());

    Ok(())
}
