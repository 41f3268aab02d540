//! The `quizforge quiz` command: run a session, one answer per stdin line.

use std::time::Instant;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use quizforge_core::model::Item;
use quizforge_core::traits::ItemStore;

use super::{Engine, SelectionArgs};
use crate::EngineArgs;

pub async fn execute(selection: SelectionArgs, args: EngineArgs) -> Result<()> {
    let ctx = selection.context()?;
    let engine = Engine::open(&args).await?;
    let limit = selection.limit.unwrap_or(engine.config.engine.default_limit);
    let learner = selection.learner.as_str();

    let chosen = engine.selector.select_items(learner, &ctx, limit).await?;
    if chosen.item_ids.is_empty() {
        engine.persist().await?;
        println!("No items available for this selection.");
        return Ok(());
    }

    let session = engine.quiz.start_session(learner, chosen).await?;
    println!(
        "Session {} ({} items, {} mode)\n",
        session.id,
        session.item_ids.len(),
        session.mode
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    for (i, id) in session.item_ids.iter().enumerate() {
        let Some(item) = ItemStore::find_by_id(&*engine.store, *id).await? else {
            tracing::warn!(item_id = %id, "selected item vanished");
            break;
        };
        print_question(i + 1, &item);

        let started = Instant::now();
        let Some(answer) = lines.next_line().await? else {
            println!("\nNo more answers, finishing early.");
            break;
        };
        let elapsed = started.elapsed().as_millis() as u64;

        let outcome = engine
            .quiz
            .submit_answer(learner, session.id, &answer, elapsed)
            .await?;
        if outcome.is_correct {
            println!("Correct!");
        } else {
            println!("Incorrect. The answer is: {}", outcome.correct_answer);
        }
        if !outcome.explanation.is_empty() {
            println!("{}", outcome.explanation);
        }
        println!();
    }

    let finished = engine.quiz.complete(learner, session.id).await?;
    engine.persist().await?;

    println!("Score: {:.1}%", finished.score);
    if let Some(record) = engine.mastery.snapshot(learner).await? {
        for (topic, state) in &record.topics {
            println!("  {topic}: mastery {:.2}", state.mastery);
        }
    }

    Ok(())
}

fn print_question(number: usize, item: &Item) {
    println!("Q{number}. {}", item.question);
    for (letter, choice) in ('A'..='Z').zip(&item.choices) {
        println!("  {letter}) {choice}");
    }
    if !item.hints.is_empty() {
        println!("  (hint: {})", item.hints[0]);
    }
}
