//! In-memory store with JSON snapshot persistence.
//!
//! Implements every store trait over a single state value guarded by an
//! async read/write lock. The CLI loads a snapshot at startup and writes it
//! back when a command finishes.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{
    Attempt, BatchId, GeneratedBatch, Item, ItemId, Learner, QuizSession, SessionId,
};
use crate::traits::{
    AttemptStore, BatchFilter, BatchStore, ItemFilter, ItemStore, LearnerStore, SessionStore,
    StoreResult,
};

/// Everything the store holds. Serialized as-is into snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub batches: Vec<GeneratedBatch>,
    #[serde(default)]
    pub learners: BTreeMap<String, Learner>,
    #[serde(default)]
    pub sessions: Vec<QuizSession>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

/// Store backend that keeps all records in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Load a snapshot written by [`InMemoryStore::save_snapshot`]. A missing
    /// file yields an empty store.
    pub async fn load_snapshot(path: &Path) -> StoreResult<Self> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let state: StoreState = serde_json::from_str(&content)?;
                tracing::debug!(
                    items = state.items.len(),
                    batches = state.batches.len(),
                    "loaded snapshot from {}",
                    path.display()
                );
                Ok(Self::from_state(state))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the full state as pretty JSON, replacing the file atomically.
    pub async fn save_snapshot(&self, path: &Path) -> StoreResult<()> {
        let json = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }

    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn batch_count(&self) -> usize {
        self.state.read().await.batches.len()
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn find(&self, filter: &ItemFilter) -> StoreResult<Vec<Item>> {
        let state = self.state.read().await;
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(state
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert(&self, items: Vec<Item>) -> StoreResult<Vec<Item>> {
        let mut state = self.state.write().await;
        state.items.extend(items.iter().cloned());
        Ok(items)
    }

    async fn find_by_id(&self, id: ItemId) -> StoreResult<Option<Item>> {
        let state = self.state.read().await;
        Ok(state.items.iter().find(|item| item.id == id).cloned())
    }
}

#[async_trait]
impl BatchStore for InMemoryStore {
    async fn find_one(&self, filter: &BatchFilter) -> StoreResult<Option<GeneratedBatch>> {
        let state = self.state.read().await;
        Ok(state
            .batches
            .iter()
            .filter(|batch| filter.matches(batch))
            .max_by_key(|batch| batch.created_at)
            .cloned())
    }

    async fn find_by_id(&self, id: BatchId) -> StoreResult<Option<GeneratedBatch>> {
        let state = self.state.read().await;
        Ok(state.batches.iter().find(|batch| batch.id == id).cloned())
    }

    async fn create(&self, batch: GeneratedBatch) -> StoreResult<GeneratedBatch> {
        let mut state = self.state.write().await;
        state.batches.push(batch.clone());
        Ok(batch)
    }

    async fn save(&self, batch: &GeneratedBatch) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let slot = state
            .batches
            .iter_mut()
            .find(|existing| existing.id == batch.id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {}", batch.id)))?;
        *slot = batch.clone();
        Ok(())
    }
}

#[async_trait]
impl LearnerStore for InMemoryStore {
    async fn get(&self, learner_id: &str) -> StoreResult<Option<Learner>> {
        Ok(self.state.read().await.learners.get(learner_id).cloned())
    }

    async fn save(&self, learner: &Learner) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.learners.insert(learner.id.clone(), learner.clone());
        Ok(())
    }
}

#[async_trait]
impl AttemptStore for InMemoryStore {
    async fn create(&self, attempt: &Attempt) -> StoreResult<()> {
        self.state.write().await.attempts.push(attempt.clone());
        Ok(())
    }

    async fn list_for_session(&self, session_id: SessionId) -> StoreResult<Vec<Attempt>> {
        let state = self.state.read().await;
        Ok(state
            .attempts
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn find_by_id(&self, id: SessionId) -> StoreResult<Option<QuizSession>> {
        let state = self.state.read().await;
        Ok(state.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn save(&self, session: &QuizSession) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(slot) => *slot = session.clone(),
            None => state.sessions.push(session.clone()),
        }
        Ok(())
    }
}
