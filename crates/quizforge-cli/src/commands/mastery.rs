//! The `quizforge mastery` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::Engine;
use crate::EngineArgs;

pub async fn execute(learner_id: String, args: EngineArgs) -> Result<()> {
    let engine = Engine::open(&args).await?;

    let Some(learner) = engine.mastery.snapshot(&learner_id).await? else {
        println!("No mastery recorded for learner '{learner_id}'.");
        return Ok(());
    };

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Mastery", "Attempts", "Streak", "Time on task"]);
    for (topic, state) in &learner.topics {
        table.add_row(vec![
            Cell::new(topic),
            Cell::new(format!("{:.2}", state.mastery)),
            Cell::new(state.attempts),
            Cell::new(state.streak),
            Cell::new(format!("{:.1}s", state.time_on_task_ms as f64 / 1000.0)),
        ]);
    }
    println!("Learner: {}", learner.id);
    println!("{table}");

    if let Some(mark) = &learner.last_remediation {
        println!(
            "Needs review: {} (since {})",
            mark.topic,
            mark.at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
