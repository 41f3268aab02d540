//! Generation cache.
//!
//! Decides whether an earlier generated batch can be reused for a
//! `(topic, levels)` request, calls the content generator on a miss, and
//! runs the publish step that turns a batch's candidates into bank items.
//! Generator failures never escape this module: they degrade to an empty
//! candidate list, and publishing falls back to placeholder items.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::instrument;

use crate::error::{GeneratorError, QuizError, QuizResult};
use crate::lock::KeyedLocks;
use crate::model::{
    BatchId, BatchStatus, BloomLevel, GeneratedBatch, ItemCandidate, ItemId, ItemType,
    LevelCounts, Origin,
};
use crate::parser::{parse_raw_output, seed_slug};
use crate::prompt::render_generation_prompt;
use crate::traits::{
    BatchFilter, BatchStore, ContentGenerator, GenerateRequest, GenerateResponse, ItemStore,
    LevelMatch,
};

/// Configuration for the generation cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Batches older than this are never reused.
    pub freshness: chrono::Duration,
    /// Treat batches without a recorded level distribution as matching any
    /// requested distribution.
    pub wildcard_unrecorded_levels: bool,
    /// Placeholder count when the requested distribution is empty.
    pub placeholder_count: usize,
    /// Largest accepted level distribution total.
    pub max_items_per_request: u32,
    /// Model passed to the generator.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Retries on transient generator errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub retry_delay: Duration,
    pub system_prompt_override: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness: chrono::Duration::days(30),
            wildcard_unrecorded_levels: true,
            placeholder_count: 3,
            max_items_per_request: 30,
            model: "llama3.1:8b".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            system_prompt_override: None,
        }
    }
}

/// Outcome of [`GenerationCache::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub batch_id: BatchId,
    /// Bank items linked to the batch; empty for unpublished drafts.
    pub linked_item_ids: Vec<ItemId>,
    /// An existing batch was reused.
    pub cache_hit: bool,
    /// The publish step ran during this call.
    pub published_now: bool,
}

/// Reconciles generated batches with the item bank.
pub struct GenerationCache {
    generator: Arc<dyn ContentGenerator>,
    items: Arc<dyn ItemStore>,
    batches: Arc<dyn BatchStore>,
    config: CacheConfig,
    locks: KeyedLocks<(String, LevelCounts)>,
}

impl GenerationCache {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        items: Arc<dyn ItemStore>,
        batches: Arc<dyn BatchStore>,
        config: CacheConfig,
    ) -> Self {
        Self {
            generator,
            items,
            batches,
            config,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Resolve a `(topic, levels)` request to a batch, reusing a fresh one
    /// when possible. With `save_to_bank`, the batch is published so its
    /// items are in the bank when this returns.
    ///
    /// Concurrent calls for the same key are serialized, so one process
    /// never generates the same batch twice.
    #[instrument(skip(self), fields(generator = self.generator.name()))]
    pub async fn resolve(
        &self,
        topic: &str,
        levels: LevelCounts,
        save_to_bank: bool,
    ) -> QuizResult<Resolution> {
        self.validate(topic, levels)?;
        let _guard = self.locks.lock((topic.to_string(), levels)).await;

        if let Some(mut batch) = self.batches.find_one(&self.hit_filter(topic, levels)).await? {
            let unlinked = batch.is_published() && batch.linked_item_ids.is_empty();
            let wants_publish = !batch.is_published() && save_to_bank;
            let published_now = unlinked || wants_publish;
            if published_now {
                self.publish_batch(&mut batch, levels).await?;
            }
            tracing::info!(batch_id = %batch.id, published_now, "generation cache hit");
            return Ok(Resolution {
                batch_id: batch.id,
                linked_item_ids: batch.linked_item_ids,
                cache_hit: true,
                published_now,
            });
        }

        tracing::info!("generation cache miss");
        let mut batch = self.generate_batch(topic, levels).await?;
        if save_to_bank {
            self.publish_batch(&mut batch, levels).await?;
        }
        Ok(Resolution {
            batch_id: batch.id,
            linked_item_ids: batch.linked_item_ids,
            cache_hit: false,
            published_now: save_to_bank,
        })
    }

    /// Publish an existing batch by id. Already-linked batches are returned
    /// unchanged.
    pub async fn publish(&self, batch_id: BatchId) -> QuizResult<Resolution> {
        let mut batch = self
            .batches
            .find_by_id(batch_id)
            .await?
            .ok_or_else(|| QuizError::InvalidInput(format!("unknown batch: {batch_id}")))?;
        let levels = batch.requested_levels.unwrap_or_default();
        let _guard = self.locks.lock((batch.topic.clone(), levels)).await;

        let published_now = !(batch.is_published() && !batch.linked_item_ids.is_empty());
        self.publish_batch(&mut batch, levels).await?;
        Ok(Resolution {
            batch_id: batch.id,
            linked_item_ids: batch.linked_item_ids,
            cache_hit: true,
            published_now,
        })
    }

    /// Call the generator, parse its output, and record a draft batch. The
    /// batch is recorded even when generation fails.
    pub async fn generate_batch(
        &self,
        topic: &str,
        levels: LevelCounts,
    ) -> QuizResult<GeneratedBatch> {
        let prompt = render_generation_prompt(topic, levels);
        let mut batch = GeneratedBatch::draft(topic, levels, prompt.clone());

        let request = GenerateRequest {
            model: self.config.model.clone(),
            topic: topic.to_string(),
            levels,
            prompt,
            system_prompt: self.config.system_prompt_override.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        match self.call_generator(&request).await {
            Ok(response) => {
                let outcome = parse_raw_output(&response.content, topic, batch.seed_stamp());
                tracing::info!(
                    accepted = outcome.items.len(),
                    dropped = outcome.dropped,
                    latency_ms = response.latency_ms,
                    "parsed generator output"
                );
                batch.source_model = Some(response.model);
                batch.raw_output = Some(response.content);
                batch.parsed_items = outcome.items;
            }
            Err(e) => {
                tracing::warn!("content generation failed, continuing without candidates: {e:#}");
            }
        }

        Ok(self.batches.create(batch).await?)
    }

    /// The publish step. No-op for batches that are already published and
    /// linked.
    async fn publish_batch(&self, batch: &mut GeneratedBatch, levels: LevelCounts) -> QuizResult<()> {
        if batch.is_published() && !batch.linked_item_ids.is_empty() {
            return Ok(());
        }

        let mut candidates = batch.parsed_items.clone();
        if candidates.is_empty() {
            if let Some(raw) = &batch.raw_output {
                candidates = parse_raw_output(raw, &batch.topic, batch.seed_stamp()).items;
            }
        }
        if candidates.is_empty() {
            tracing::warn!(batch_id = %batch.id, "no usable candidates, publishing placeholders");
            candidates = placeholder_candidates(&batch.topic, levels, self.config.placeholder_count);
        }

        let items = candidates
            .into_iter()
            .map(|c| c.into_item(&batch.topic, Origin::Generated))
            .collect();
        let inserted = self.items.insert(items).await?;

        batch.linked_item_ids = inserted.iter().map(|item| item.id).collect();
        batch.status = BatchStatus::Published;
        batch.published_at = Some(Utc::now());
        if batch.requested_levels.is_none() {
            batch.requested_levels = Some(levels);
        }
        self.batches.save(batch).await?;

        tracing::info!(
            batch_id = %batch.id,
            linked = batch.linked_item_ids.len(),
            "published generated batch"
        );
        Ok(())
    }

    async fn call_generator(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
            }
            match self.generator.generate(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if let Some(gen_err) = e.downcast_ref::<GeneratorError>() {
                        if gen_err.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = gen_err.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms);
                        }
                    }
                    tracing::debug!(attempt = retry + 1, "generator call failed: {e:#}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("generator returned no result")))
    }

    fn hit_filter(&self, topic: &str, levels: LevelCounts) -> BatchFilter {
        BatchFilter {
            topic: topic.to_string(),
            status_in: vec![BatchStatus::Draft, BatchStatus::Published],
            created_after: Some(Utc::now() - self.config.freshness),
            levels: LevelMatch::Exact {
                levels,
                allow_unrecorded: self.config.wildcard_unrecorded_levels,
            },
            require_linked: false,
        }
    }

    fn validate(&self, topic: &str, levels: LevelCounts) -> QuizResult<()> {
        if topic.trim().is_empty() {
            return Err(QuizError::InvalidInput("topic must not be empty".into()));
        }
        if levels.total() > u64::from(self.config.max_items_per_request) {
            return Err(QuizError::InvalidInput(format!(
                "requested {} questions, at most {} allowed",
                levels.total(),
                self.config.max_items_per_request
            )));
        }
        Ok(())
    }
}

/// Deterministic stand-in questions used when a batch has nothing to
/// publish.
///
/// One MCQ per requested question, difficulty taken from its level; an
/// empty distribution yields `default_count` easy questions.
pub fn placeholder_candidates(
    topic: &str,
    levels: LevelCounts,
    default_count: usize,
) -> Vec<ItemCandidate> {
    let mut difficulties = levels.difficulties();
    if difficulties.is_empty() {
        difficulties = vec![2; default_count.max(1)];
    }
    let slug = seed_slug(topic);

    difficulties
        .into_iter()
        .enumerate()
        .map(|(i, difficulty)| ItemCandidate {
            id: format!("placeholder_{slug}_{i}"),
            item_type: ItemType::Mcq,
            question: format!("Placeholder question {} on {topic}?", i + 1),
            choices: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: "A".into(),
            difficulty,
            bloom_level: BloomLevel::Apply,
            topics: vec![topic.to_string()],
            skills: vec![],
            hints: vec!["Think about basics".into()],
            explanation: "Correct answer is A.".into(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::testing::{candidates_json, ScriptedGenerator};

    fn test_config() -> CacheConfig {
        CacheConfig {
            retry_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn cache_with(generator: Arc<ScriptedGenerator>) -> (Arc<InMemoryStore>, GenerationCache) {
        let store = Arc::new(InMemoryStore::new());
        let cache = GenerationCache::new(generator, store.clone(), store.clone(), test_config());
        (store, cache)
    }

    #[tokio::test]
    async fn miss_without_save_records_draft() {
        let generator = Arc::new(ScriptedGenerator::always(&candidates_json("Algebra", 2)));
        let (store, cache) = cache_with(generator.clone());

        let res = cache.resolve("Algebra", LevelCounts::new(2, 0, 0), false).await.unwrap();
        assert!(!res.cache_hit);
        assert!(res.linked_item_ids.is_empty());
        assert_eq!(generator.calls(), 1);
        assert_eq!(store.item_count().await, 0);

        let batch = BatchStore::find_by_id(&*store, res.batch_id).await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Draft);
        assert_eq!(batch.parsed_items.len(), 2);
        assert!(batch.raw_output.is_some());
    }

    #[tokio::test]
    async fn miss_with_save_publishes_parsed_items() {
        let generator = Arc::new(ScriptedGenerator::always(&candidates_json("Algebra", 2)));
        let (store, cache) = cache_with(generator);

        let res = cache.resolve("Algebra", LevelCounts::new(2, 0, 0), true).await.unwrap();
        assert_eq!(res.linked_item_ids.len(), 2);
        assert!(res.published_now);

        let batch = BatchStore::find_by_id(&*store, res.batch_id).await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Published);
        assert!(batch.published_at.is_some());
        assert_eq!(batch.linked_item_ids, res.linked_item_ids);
    }

    #[tokio::test]
    async fn generator_failure_degrades_to_placeholders() {
        let generator = Arc::new(ScriptedGenerator::failing());
        let (store, cache) = cache_with(generator.clone());

        let res = cache.resolve("Fractions", LevelCounts::new(1, 1, 0), true).await.unwrap();
        assert_eq!(res.linked_item_ids.len(), 2);
        // initial call plus two retries
        assert_eq!(generator.calls(), 3);

        let first = ItemStore::find_by_id(&*store, res.linked_item_ids[0]).await.unwrap().unwrap();
        assert_eq!(first.question, "Placeholder question 1 on Fractions?");
        assert_eq!(first.answer, "A");
        assert_eq!(first.difficulty, 2);
        assert_eq!(first.origin, Origin::Generated);
        let second = ItemStore::find_by_id(&*store, res.linked_item_ids[1]).await.unwrap().unwrap();
        assert_eq!(second.difficulty, 3);
    }

    #[tokio::test]
    async fn failure_without_save_still_records_batch() {
        let generator = Arc::new(ScriptedGenerator::failing());
        let (store, cache) = cache_with(generator);

        let res = cache.resolve("Fractions", LevelCounts::new(1, 0, 0), false).await.unwrap();
        assert!(res.linked_item_ids.is_empty());
        assert_eq!(store.batch_count().await, 1);
        let batch = BatchStore::find_by_id(&*store, res.batch_id).await.unwrap().unwrap();
        assert!(batch.parsed_items.is_empty());
        assert!(batch.raw_output.is_none());
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let generator = Arc::new(ScriptedGenerator::new(
            vec![Err(GeneratorError::AuthenticationFailed("bad key".into()))],
            Ok(candidates_json("Algebra", 1)),
        ));
        let (_store, cache) = cache_with(generator.clone());

        cache.resolve("Algebra", LevelCounts::new(1, 0, 0), false).await.unwrap();
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn transient_error_then_success() {
        let generator = Arc::new(ScriptedGenerator::new(
            vec![Err(GeneratorError::Timeout(30))],
            Ok(candidates_json("Algebra", 1)),
        ));
        let (_store, cache) = cache_with(generator.clone());

        let res = cache.resolve("Algebra", LevelCounts::new(1, 0, 0), true).await.unwrap();
        assert_eq!(generator.calls(), 2);
        assert_eq!(res.linked_item_ids.len(), 1);
    }

    #[tokio::test]
    async fn draft_hit_publishes_when_saving() {
        let generator = Arc::new(ScriptedGenerator::always(&candidates_json("Algebra", 2)));
        let (_store, cache) = cache_with(generator.clone());
        let levels = LevelCounts::new(2, 0, 0);

        let draft = cache.resolve("Algebra", levels, false).await.unwrap();
        let hit = cache.resolve("Algebra", levels, true).await.unwrap();
        assert!(hit.cache_hit);
        assert!(hit.published_now);
        assert_eq!(hit.batch_id, draft.batch_id);
        assert_eq!(hit.linked_item_ids.len(), 2);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn draft_hit_without_save_stays_draft() {
        let generator = Arc::new(ScriptedGenerator::always(&candidates_json("Algebra", 1)));
        let (_store, cache) = cache_with(generator.clone());
        let levels = LevelCounts::new(1, 0, 0);

        cache.resolve("Algebra", levels, false).await.unwrap();
        let hit = cache.resolve("Algebra", levels, false).await.unwrap();
        assert!(hit.cache_hit);
        assert!(!hit.published_now);
        assert!(hit.linked_item_ids.is_empty());
    }

    #[tokio::test]
    async fn republishing_is_idempotent() {
        let generator = Arc::new(ScriptedGenerator::always(&candidates_json("Algebra", 2)));
        let (store, cache) = cache_with(generator.clone());
        let levels = LevelCounts::new(2, 0, 0);

        let first = cache.resolve("Algebra", levels, true).await.unwrap();
        let items_after_first = store.item_count().await;

        let again = cache.resolve("Algebra", levels, true).await.unwrap();
        let explicit = cache.publish(first.batch_id).await.unwrap();

        assert_eq!(again.linked_item_ids, first.linked_item_ids);
        assert_eq!(explicit.linked_item_ids, first.linked_item_ids);
        assert!(!again.published_now);
        assert!(!explicit.published_now);
        assert_eq!(store.item_count().await, items_after_first);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn published_but_unlinked_batch_is_relinked() {
        let generator = Arc::new(ScriptedGenerator::failing());
        let (store, cache) = cache_with(generator.clone());
        let levels = LevelCounts::new(0, 1, 0);

        let mut batch = GeneratedBatch::draft("Algebra", levels, "p".into());
        batch.status = BatchStatus::Published;
        batch.raw_output = Some(candidates_json("Algebra", 1));
        let batch = BatchStore::create(&*store, batch).await.unwrap();

        let res = cache.resolve("Algebra", levels, false).await.unwrap();
        assert_eq!(res.batch_id, batch.id);
        assert!(res.published_now);
        assert_eq!(res.linked_item_ids.len(), 1);
        // re-derived from the raw output, not placeholders
        let item = ItemStore::find_by_id(&*store, res.linked_item_ids[0]).await.unwrap().unwrap();
        assert_eq!(item.question, "Generated Algebra question 0");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn different_levels_miss_unless_unrecorded() {
        let generator = Arc::new(ScriptedGenerator::always(&candidates_json("Algebra", 1)));
        let (store, cache) = cache_with(generator.clone());

        cache.resolve("Algebra", LevelCounts::new(1, 0, 0), false).await.unwrap();
        let other = cache.resolve("Algebra", LevelCounts::new(0, 0, 1), false).await.unwrap();
        assert!(!other.cache_hit);
        assert_eq!(generator.calls(), 2);

        let mut legacy = GeneratedBatch::draft("Geometry", LevelCounts::default(), "p".into());
        legacy.requested_levels = None;
        let legacy = BatchStore::create(&*store, legacy).await.unwrap();
        let wildcard = cache.resolve("Geometry", LevelCounts::new(3, 0, 0), false).await.unwrap();
        assert!(wildcard.cache_hit);
        assert_eq!(wildcard.batch_id, legacy.id);
    }

    #[tokio::test]
    async fn stale_batches_are_ignored() {
        let generator = Arc::new(ScriptedGenerator::always(&candidates_json("Algebra", 1)));
        let (store, cache) = cache_with(generator.clone());
        let levels = LevelCounts::new(1, 0, 0);

        let mut old = GeneratedBatch::draft("Algebra", levels, "p".into());
        old.created_at = Utc::now() - chrono::Duration::days(31);
        BatchStore::create(&*store, old).await.unwrap();

        let res = cache.resolve("Algebra", levels, false).await.unwrap();
        assert!(!res.cache_hit);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_resolves_generate_once() {
        let generator = Arc::new(ScriptedGenerator::always(&candidates_json("Algebra", 2)));
        let (store, cache) = cache_with(generator.clone());
        let cache = Arc::new(cache);
        let levels = LevelCounts::new(2, 0, 0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.resolve("Algebra", levels, true).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(generator.calls(), 1);
        assert_eq!(store.batch_count().await, 1);
        assert_eq!(store.item_count().await, 2);
    }

    #[tokio::test]
    async fn rejects_invalid_requests_without_side_effects() {
        let generator = Arc::new(ScriptedGenerator::always("[]"));
        let (store, cache) = cache_with(generator.clone());

        let err = cache.resolve("  ", LevelCounts::new(1, 0, 0), true).await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));
        let err = cache.resolve("Algebra", LevelCounts::new(40, 0, 0), true).await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));

        assert_eq!(generator.calls(), 0);
        assert_eq!(store.batch_count().await, 0);
    }

    #[tokio::test]
    async fn overflowing_distribution_is_rejected() {
        let generator = Arc::new(ScriptedGenerator::always("[]"));
        let (store, cache) = cache_with(generator.clone());

        let err = cache
            .resolve("Algebra", LevelCounts::new(u32::MAX, 1, 0), true)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));
        assert_eq!(generator.calls(), 0);
        assert_eq!(store.batch_count().await, 0);
    }

    #[tokio::test]
    async fn published_items_keep_candidate_fields() {
        let raw = serde_json::json!([
            {"id": "q1", "type": "mcq", "question": "Pick 4", "choices": ["3", "4"],
             "answer": "4", "difficulty": 1, "bloom": "remember", "topics": ["Algebra", "Arithmetic"]},
            {"id": "q2", "type": "short", "question": "Solve 2x = 8", "answer": "4",
             "difficulty": "hard", "bloom": "Analysis", "topics": ["Algebra"]},
            {"id": "q3", "type": "short", "question": "Name a prime", "answer": "2",
             "difficulty": 5, "bloom": "evaluate"}
        ])
        .to_string();
        let generator = Arc::new(ScriptedGenerator::always(&raw));
        let (store, cache) = cache_with(generator);

        let res = cache.resolve("Algebra", LevelCounts::new(1, 0, 2), true).await.unwrap();
        let batch = BatchStore::find_by_id(&*store, res.batch_id).await.unwrap().unwrap();
        assert_eq!(batch.parsed_items.len(), 3);
        assert_eq!(res.linked_item_ids.len(), 3);

        for id in &res.linked_item_ids {
            let item = ItemStore::find_by_id(&*store, *id).await.unwrap().unwrap();
            let seed = item.seed_id.clone().unwrap();
            let candidate = batch.parsed_items.iter().find(|c| c.id == seed).unwrap();
            assert_eq!(item.difficulty, candidate.difficulty);
            assert_eq!(item.bloom_level, candidate.bloom_level);
            assert_eq!(item.item_type, candidate.item_type);
            assert_eq!(item.question, candidate.question);
            assert_eq!(item.choices, candidate.choices);
            assert_eq!(item.answer, candidate.answer);
            if candidate.topics.is_empty() {
                assert_eq!(item.topics, vec!["Algebra".to_string()]);
            } else {
                assert_eq!(item.topics, candidate.topics);
            }
        }

        let q2 = batch.parsed_items.iter().find(|c| c.id == "q2").unwrap();
        assert_eq!(q2.difficulty, 4);
        assert_eq!(q2.bloom_level, BloomLevel::Analyze);
    }

    #[test]
    fn placeholders_are_deterministic() {
        let a = placeholder_candidates("Linear Algebra", LevelCounts::new(1, 0, 1), 3);
        let b = placeholder_candidates("Linear Algebra", LevelCounts::new(1, 0, 1), 3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].id, "placeholder_Linear_Algebra_0");
        assert_eq!(a[1].difficulty, 4);

        let default = placeholder_candidates("Sets", LevelCounts::default(), 3);
        assert_eq!(default.len(), 3);
        assert!(default.iter().all(|c| c.difficulty == 2));
    }
}
