//! The `quizforge import` command: load item banks into the data directory.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::bank::{load_banks, validate_item_bank};
use quizforge_core::traits::ItemStore;

use super::Engine;
use crate::EngineArgs;

pub async fn execute(bank_path: PathBuf, args: EngineArgs) -> Result<()> {
    let banks = load_banks(&bank_path)?;
    let engine = Engine::open(&args).await?;

    let mut known: HashSet<String> = engine
        .store
        .snapshot()
        .await
        .items
        .into_iter()
        .filter_map(|item| item.seed_id)
        .collect();

    let mut imported = 0;
    let mut skipped = 0;
    for bank in &banks {
        let warnings = validate_item_bank(bank);
        if !warnings.is_empty() {
            tracing::warn!(bank = %bank.id, count = warnings.len(), "bank has validation warnings");
        }

        let fresh: Vec<_> = bank
            .to_items()
            .into_iter()
            .filter(|item| match &item.seed_id {
                Some(seed) => known.insert(seed.clone()),
                None => true,
            })
            .collect();
        skipped += bank.items.len() - fresh.len();

        let inserted = engine.store.insert(fresh).await?;
        println!("Item bank: {} ({} new items)", bank.name, inserted.len());
        imported += inserted.len();
    }

    engine.persist().await?;
    println!("Imported {imported} item(s), skipped {skipped} already present.");

    Ok(())
}
