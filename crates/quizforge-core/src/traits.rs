//! Collaborator trait definitions: the content generator and the stores.
//!
//! Generators are implemented in `quizforge-providers`; stores are
//! implemented by [`crate::memory::InMemoryStore`] or by the host
//! application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{
    Attempt, BatchId, BatchStatus, GeneratedBatch, Item, ItemId, Learner, LevelCounts,
    QuizSession, SessionId,
};

// ---------------------------------------------------------------------------
// Content generator trait
// ---------------------------------------------------------------------------

/// Trait for text-generation backends that produce candidate questions.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Human-readable generator name (e.g. "ollama").
    fn name(&self) -> &str;

    /// Generate raw candidate questions for a topic.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;

    /// List models known to this generator.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request for one batch of generated questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "llama3.1:8b").
    pub model: String,
    /// Topic the questions are about.
    pub topic: String,
    /// Requested number of questions per level.
    pub levels: LevelCounts,
    /// The fully rendered, level-annotated prompt.
    pub prompt: String,
    /// Optional system prompt override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Generator name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Query over the item bank.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Match items tagged with any of these topics. `None` matches all topics.
    pub topics: Option<Vec<String>>,
    /// Allowed difficulties. Empty allows any difficulty.
    pub difficulty_in: Vec<u8>,
    /// Restrict to these ids.
    pub ids: Option<Vec<ItemId>>,
    pub limit: Option<usize>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(topics) = &self.topics {
            if !item.has_any_topic(topics) {
                return false;
            }
        }
        if !self.difficulty_in.is_empty() && !self.difficulty_in.contains(&item.difficulty) {
            return false;
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&item.id) {
                return false;
            }
        }
        true
    }
}

/// How a batch's recorded level distribution is compared with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelMatch {
    /// Ignore level distributions.
    Any,
    /// Require equal counts; batches without a recorded distribution match
    /// only when `allow_unrecorded` is set.
    Exact {
        levels: LevelCounts,
        allow_unrecorded: bool,
    },
}

/// Query over generated batches.
#[derive(Debug, Clone)]
pub struct BatchFilter {
    pub topic: String,
    /// Allowed statuses. Empty allows any status.
    pub status_in: Vec<BatchStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub levels: LevelMatch,
    /// Only batches with at least one linked item.
    pub require_linked: bool,
}

impl BatchFilter {
    pub fn for_topic(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            status_in: Vec::new(),
            created_after: None,
            levels: LevelMatch::Any,
            require_linked: false,
        }
    }

    pub fn matches(&self, batch: &GeneratedBatch) -> bool {
        if batch.topic != self.topic {
            return false;
        }
        if !self.status_in.is_empty() && !self.status_in.contains(&batch.status) {
            return false;
        }
        if let Some(after) = self.created_after {
            if batch.created_at < after {
                return false;
            }
        }
        if self.require_linked && batch.linked_item_ids.is_empty() {
            return false;
        }
        match self.levels {
            LevelMatch::Any => true,
            LevelMatch::Exact {
                levels,
                allow_unrecorded,
            } => match batch.requested_levels {
                Some(recorded) => recorded == levels,
                None => allow_unrecorded,
            },
        }
    }
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Items matching the filter, in insertion order.
    async fn find(&self, filter: &ItemFilter) -> StoreResult<Vec<Item>>;

    /// Persist new items and return them as stored.
    async fn insert(&self, items: Vec<Item>) -> StoreResult<Vec<Item>>;

    async fn find_by_id(&self, id: ItemId) -> StoreResult<Option<Item>>;
}

#[async_trait]
pub trait BatchStore: Send + Sync {
    /// The most recently created batch matching the filter.
    async fn find_one(&self, filter: &BatchFilter) -> StoreResult<Option<GeneratedBatch>>;

    async fn find_by_id(&self, id: BatchId) -> StoreResult<Option<GeneratedBatch>>;

    async fn create(&self, batch: GeneratedBatch) -> StoreResult<GeneratedBatch>;

    /// Replace a previously created batch.
    async fn save(&self, batch: &GeneratedBatch) -> StoreResult<()>;
}

#[async_trait]
pub trait LearnerStore: Send + Sync {
    async fn get(&self, learner_id: &str) -> StoreResult<Option<Learner>>;

    /// Replace the whole learner record.
    async fn save(&self, learner: &Learner) -> StoreResult<()>;
}

/// Append-only attempt log.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn create(&self, attempt: &Attempt) -> StoreResult<()>;

    async fn list_for_session(&self, session_id: SessionId) -> StoreResult<Vec<Attempt>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_by_id(&self, id: SessionId) -> StoreResult<Option<QuizSession>>;

    async fn save(&self, session: &QuizSession) -> StoreResult<()>;
}

// ---------------------------------------------------------------------------
// Default system prompt
// ---------------------------------------------------------------------------

/// Default system prompt for question generators.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert assessment author. Respond ONLY with JSON. Do not include explanations, prose, or markdown formatting around the JSON.";

// ---------------------------------------------------------------------------
// Markdown JSON extraction
// ---------------------------------------------------------------------------

/// Extract a JSON payload from a possibly markdown-formatted response.
///
/// Handles:
/// - ```json``` blocks (the first one wins)
/// - Generic ``` blocks (if no json-specific block found)
/// - Raw JSON with no markdown blocks (returned trimmed)
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_block: Option<String> = None;
    let mut generic_block: Option<String> = None;
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json" || lang == "jsonc";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block && json_block.is_none() {
                json_block = Some(current_block.clone());
            } else if is_generic_block && generic_block.is_none() {
                generic_block = Some(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    // Truncated (unclosed) block: keep what was accumulated
    if in_block && !current_block.is_empty() {
        if is_json_block && json_block.is_none() {
            json_block = Some(current_block);
        } else if is_generic_block && generic_block.is_none() {
            generic_block = Some(current_block);
        }
    }

    json_block
        .or(generic_block)
        .unwrap_or_else(|| response.trim().to_string())
}
