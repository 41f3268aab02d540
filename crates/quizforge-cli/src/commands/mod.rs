//! Subcommand implementations and the engine wiring they share.

pub mod generate;
pub mod import;
pub mod init;
pub mod list_models;
pub mod mastery;
pub mod parse;
pub mod quiz;
pub mod select;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use quizforge_core::cache::GenerationCache;
use quizforge_core::mastery::MasteryTracker;
use quizforge_core::memory::InMemoryStore;
use quizforge_core::model::QuizMode;
use quizforge_core::selector::{ItemSelector, SessionContext};
use quizforge_core::session::QuizService;
use quizforge_providers::config::{create_generator, load_config_from, resolve_provider};
use quizforge_providers::QuizforgeConfig;

use crate::EngineArgs;

/// Options describing which items a session should cover.
#[derive(Args, Clone, Debug)]
pub struct SelectionArgs {
    #[arg(long)]
    pub learner: String,

    /// Comma-separated topics
    #[arg(long)]
    pub topics: Option<String>,

    /// diagnostic, formative, or summative
    #[arg(long, default_value = "formative")]
    pub mode: String,

    /// Comma-separated difficulty buckets (1-5), overriding the mode default
    #[arg(long)]
    pub difficulty: Option<String>,

    /// Number of items (defaults to the configured session length)
    #[arg(long)]
    pub limit: Option<usize>,
}

impl SelectionArgs {
    pub fn context(&self) -> Result<SessionContext> {
        let mode: QuizMode = self.mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        let requested_topics = self
            .topics
            .as_deref()
            .map(split_list)
            .unwrap_or_default();
        let difficulty = self
            .difficulty
            .as_deref()
            .map(|d| {
                split_list(d)
                    .into_iter()
                    .map(|v| {
                        v.parse::<u8>()
                            .map_err(|_| anyhow::anyhow!("invalid difficulty: '{v}'"))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        Ok(SessionContext {
            requested_topics,
            mode,
            difficulty,
        })
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The engine services over a snapshot-backed store.
pub struct Engine {
    pub config: QuizforgeConfig,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<GenerationCache>,
    pub selector: ItemSelector,
    pub mastery: Arc<MasteryTracker>,
    pub quiz: QuizService,
    state_path: PathBuf,
}

impl Engine {
    /// Load config and the state snapshot, and wire up the services.
    pub async fn open(args: &EngineArgs) -> Result<Self> {
        let mut config = load_config_from(args.config.as_deref())?;
        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        let state_path = config.state_path();

        let store = Arc::new(
            InMemoryStore::load_snapshot(&state_path)
                .await
                .with_context(|| format!("failed to load state: {}", state_path.display()))?,
        );

        let provider = resolve_provider(&config, args.provider.as_deref())?;
        tracing::debug!(?provider, "using generator");
        let generator = create_generator(&provider);

        let cache = Arc::new(GenerationCache::new(
            generator,
            store.clone(),
            store.clone(),
            config.cache_config(args.model.as_deref())?,
        ));
        let selector = ItemSelector::new(
            store.clone(),
            store.clone(),
            Arc::clone(&cache),
            config.selector_config(),
        );
        let mastery = Arc::new(MasteryTracker::new(store.clone()));
        let quiz = QuizService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::clone(&mastery),
        );

        Ok(Self {
            config,
            store,
            cache,
            selector,
            mastery,
            quiz,
            state_path,
        })
    }

    /// Write the state snapshot back to the data directory.
    pub async fn persist(&self) -> Result<()> {
        self.store
            .save_snapshot(&self.state_path)
            .await
            .with_context(|| format!("failed to save state: {}", self.state_path.display()))
    }
}
