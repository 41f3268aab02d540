//! Item selection for quiz sessions.
//!
//! A selection runs an ordered chain of strategies. Each one sees how many
//! ids are still needed and contributes a possibly empty list; the results
//! are concatenated in order. The default chain queries the bank directly,
//! then borrows from the newest published batch for the first topic, then
//! generates on demand through the [`GenerationCache`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cache::GenerationCache;
use crate::error::{QuizError, QuizResult};
use crate::model::{
    BatchStatus, ItemId, LevelCounts, QuizMode, SelectionMetadata, MAX_DIFFICULTY, MIN_DIFFICULTY,
};
use crate::traits::{BatchFilter, BatchStore, ItemFilter, ItemStore};

/// Reason recorded on every selection produced by the default chain.
pub const SELECTION_REASON: &str = "rules_selection_with_ai_fallback";

/// What the caller wants a session to cover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub requested_topics: Vec<String>,
    #[serde(default)]
    pub mode: QuizMode,
    /// Explicit difficulty buckets; overrides the mode default.
    #[serde(default)]
    pub difficulty: Option<Vec<u8>>,
}

impl SessionContext {
    pub fn new(topics: &[&str], mode: QuizMode) -> Self {
        Self {
            requested_topics: topics.iter().map(|t| t.to_string()).collect(),
            mode,
            difficulty: None,
        }
    }

    /// Difficulty buckets the selection draws from.
    pub fn resolve_buckets(&self) -> Vec<u8> {
        match &self.difficulty {
            Some(explicit) if !explicit.is_empty() => explicit.clone(),
            _ => match self.mode {
                QuizMode::Diagnostic => vec![1, 2, 3],
                QuizMode::Summative => vec![3, 4, 5],
                QuizMode::Formative => vec![2, 3],
            },
        }
    }

    /// Requested topics with blanks removed.
    fn topics(&self) -> Vec<String> {
        self.requested_topics
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Whether an id may appear more than once in a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Allow,
    DropRepeats,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Allow => write!(f, "allow"),
            DuplicatePolicy::DropRepeats => write!(f, "drop_repeats"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "allow" => Ok(DuplicatePolicy::Allow),
            "drop_repeats" => Ok(DuplicatePolicy::DropRepeats),
            other => Err(format!("unknown duplicate policy: {other}")),
        }
    }
}

/// Default upper bound on a single selection.
pub const DEFAULT_MAX_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub duplicate_policy: DuplicatePolicy,
    /// Largest `limit` accepted by [`ItemSelector::select_items`].
    pub max_limit: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Allow,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

/// Ids chosen for a session and how they were found.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub item_ids: Vec<ItemId>,
    pub metadata: SelectionMetadata,
}

/// Input handed to each strategy in the chain.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRequest<'a> {
    pub learner_id: &'a str,
    pub topics: &'a [String],
    pub buckets: &'a [u8],
    /// Ids still missing to reach the limit. Always at least one.
    pub needed: usize,
}

/// One step of the selection chain.
#[async_trait]
pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to `request.needed` ids. Returning more is allowed; the selector
    /// truncates.
    async fn contribute(&self, request: &SelectionRequest<'_>) -> QuizResult<Vec<ItemId>>;
}

/// Bank items tagged with any requested topic (any topic when none were
/// requested) whose difficulty is in the buckets.
pub struct DirectQuery {
    items: Arc<dyn ItemStore>,
}

impl DirectQuery {
    pub fn new(items: Arc<dyn ItemStore>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl SelectionStrategy for DirectQuery {
    fn name(&self) -> &'static str {
        "direct_query"
    }

    async fn contribute(&self, request: &SelectionRequest<'_>) -> QuizResult<Vec<ItemId>> {
        let filter = ItemFilter {
            topics: (!request.topics.is_empty()).then(|| request.topics.to_vec()),
            difficulty_in: request.buckets.to_vec(),
            ids: None,
            limit: Some(request.needed),
        };
        let found = self.items.find(&filter).await?;
        Ok(found.into_iter().map(|item| item.id).collect())
    }
}

/// Linked items of the newest published batch for the first topic, kept to
/// the difficulty buckets.
pub struct BankAugment {
    items: Arc<dyn ItemStore>,
    batches: Arc<dyn BatchStore>,
}

impl BankAugment {
    pub fn new(items: Arc<dyn ItemStore>, batches: Arc<dyn BatchStore>) -> Self {
        Self { items, batches }
    }
}

#[async_trait]
impl SelectionStrategy for BankAugment {
    fn name(&self) -> &'static str {
        "bank_augment"
    }

    async fn contribute(&self, request: &SelectionRequest<'_>) -> QuizResult<Vec<ItemId>> {
        let Some(topic) = request.topics.first() else {
            return Ok(Vec::new());
        };
        let filter = BatchFilter {
            status_in: vec![BatchStatus::Published],
            require_linked: true,
            ..BatchFilter::for_topic(topic)
        };
        let Some(batch) = self.batches.find_one(&filter).await? else {
            return Ok(Vec::new());
        };

        let found = self
            .items
            .find(&ItemFilter {
                topics: None,
                difficulty_in: request.buckets.to_vec(),
                ids: Some(batch.linked_item_ids),
                limit: Some(request.needed),
            })
            .await?;
        Ok(found.into_iter().map(|item| item.id).collect())
    }
}

/// Generate the shortfall for the first topic through the cache and append
/// the published items. The request is capped at the cache's per-request
/// maximum. Never fails: errors are logged and yield nothing.
pub struct OnDemandGenerate {
    items: Arc<dyn ItemStore>,
    cache: Arc<GenerationCache>,
}

impl OnDemandGenerate {
    pub fn new(items: Arc<dyn ItemStore>, cache: Arc<GenerationCache>) -> Self {
        Self { items, cache }
    }
}

#[async_trait]
impl SelectionStrategy for OnDemandGenerate {
    fn name(&self) -> &'static str {
        "on_demand_generate"
    }

    async fn contribute(&self, request: &SelectionRequest<'_>) -> QuizResult<Vec<ItemId>> {
        let Some(topic) = request.topics.first() else {
            return Ok(Vec::new());
        };
        let wanted = request
            .needed
            .min(self.cache.config().max_items_per_request as usize);
        let levels = LevelCounts::from_buckets(request.buckets, wanted);

        let resolution = match self.cache.resolve(topic, levels, true).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!(topic = %topic, %levels, "on-demand generation failed: {e}");
                return Ok(Vec::new());
            }
        };

        // Linked order is preserved; ids missing from the bank are skipped
        let lookups = resolution
            .linked_item_ids
            .iter()
            .map(|id| self.items.find_by_id(*id));
        let mut ids = Vec::new();
        for found in join_all(lookups).await {
            match found {
                Ok(Some(item)) => ids.push(item.id),
                Ok(None) => {}
                Err(e) => tracing::warn!("failed to load generated item: {e}"),
            }
            if ids.len() == wanted {
                break;
            }
        }
        Ok(ids)
    }
}

/// Chooses the item list for a new session.
pub struct ItemSelector {
    strategies: Vec<Box<dyn SelectionStrategy>>,
    config: SelectorConfig,
}

impl ItemSelector {
    /// The default chain: direct query, bank augmentation, on-demand
    /// generation.
    pub fn new(
        items: Arc<dyn ItemStore>,
        batches: Arc<dyn BatchStore>,
        cache: Arc<GenerationCache>,
        config: SelectorConfig,
    ) -> Self {
        let strategies: Vec<Box<dyn SelectionStrategy>> = vec![
            Box::new(DirectQuery::new(Arc::clone(&items))),
            Box::new(BankAugment::new(Arc::clone(&items), batches)),
            Box::new(OnDemandGenerate::new(items, cache)),
        ];
        Self::with_strategies(strategies, config)
    }

    pub fn with_strategies(strategies: Vec<Box<dyn SelectionStrategy>>, config: SelectorConfig) -> Self {
        Self { strategies, config }
    }

    /// Select up to `limit` item ids for `learner_id`.
    ///
    /// A shortfall is not an error: the result may hold fewer ids than
    /// requested, or none.
    #[instrument(skip(self, ctx), fields(mode = %ctx.mode))]
    pub async fn select_items(
        &self,
        learner_id: &str,
        ctx: &SessionContext,
        limit: usize,
    ) -> QuizResult<Selection> {
        if limit == 0 {
            return Err(QuizError::InvalidInput("limit must be at least 1".into()));
        }
        if limit > self.config.max_limit {
            return Err(QuizError::InvalidInput(format!(
                "limit {limit} exceeds the maximum of {}",
                self.config.max_limit
            )));
        }
        let buckets = ctx.resolve_buckets();
        if let Some(bad) = buckets
            .iter()
            .find(|d| !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(*d))
        {
            return Err(QuizError::InvalidInput(format!(
                "difficulty {bad} outside {MIN_DIFFICULTY}..={MAX_DIFFICULTY}"
            )));
        }
        let topics = ctx.topics();

        let mut item_ids: Vec<ItemId> = Vec::new();
        let mut contributions = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let needed = limit - item_ids.len();
            if needed == 0 {
                break;
            }
            let request = SelectionRequest {
                learner_id,
                topics: &topics,
                buckets: &buckets,
                needed,
            };
            let mut found = strategy.contribute(&request).await?;

            if self.config.duplicate_policy == DuplicatePolicy::DropRepeats {
                let mut kept: Vec<ItemId> = Vec::with_capacity(found.len());
                for id in found {
                    if !item_ids.contains(&id) && !kept.contains(&id) {
                        kept.push(id);
                    }
                }
                found = kept;
            }
            found.truncate(needed);

            tracing::debug!(strategy = strategy.name(), added = found.len(), "selection step");
            contributions.push((strategy.name().to_string(), found.len()));
            item_ids.extend(found);
        }

        tracing::info!(
            learner_id,
            selected = item_ids.len(),
            limit,
            "selected items"
        );

        Ok(Selection {
            item_ids,
            metadata: SelectionMetadata {
                reason: SELECTION_REASON.to_string(),
                mode: ctx.mode,
                topics,
                difficulty_buckets: buckets,
                contributions,
            },
        })
    }
}
