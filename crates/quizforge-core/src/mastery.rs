//! Per-learner, per-topic mastery tracking.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::error::{QuizError, QuizResult};
use crate::lock::KeyedLocks;
use crate::model::{Learner, LearnerTopicState, RemediationMark};
use crate::traits::LearnerStore;

/// Weight of the latest outcome in the mastery moving average.
pub const MASTERY_ALPHA: f64 = 0.2;

/// Fold one outcome into `state`. Returns `true` when the attempt should
/// flag the topic for remediation: a miss after at least one earlier
/// attempt.
pub fn apply_outcome(state: &mut LearnerTopicState, is_correct: bool, time_taken_ms: u64) -> bool {
    let prior_attempts = state.attempts;
    let score = if is_correct { 1.0 } else { 0.0 };

    state.mastery = (MASTERY_ALPHA * score + (1.0 - MASTERY_ALPHA) * state.mastery).clamp(0.0, 1.0);
    state.attempts += 1;
    if is_correct {
        state.streak += 1;
    } else {
        state.streak = 0;
    }
    state.time_on_task_ms = state.time_on_task_ms.saturating_add(time_taken_ms);

    !is_correct && prior_attempts >= 1 && state.streak == 0
}

/// Applies attempt outcomes to learner records.
pub struct MasteryTracker {
    learners: Arc<dyn LearnerStore>,
    locks: KeyedLocks<String>,
}

impl MasteryTracker {
    pub fn new(learners: Arc<dyn LearnerStore>) -> Self {
        Self {
            learners,
            locks: KeyedLocks::new(),
        }
    }

    /// Record one attempt on `topic` and return the topic's new state.
    ///
    /// The learner record is created on first use and rewritten whole.
    /// Updates for the same learner are serialized.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        learner_id: &str,
        topic: &str,
        is_correct: bool,
        time_taken_ms: u64,
    ) -> QuizResult<LearnerTopicState> {
        if learner_id.trim().is_empty() {
            return Err(QuizError::InvalidInput("learner id must not be empty".into()));
        }
        if topic.trim().is_empty() {
            return Err(QuizError::InvalidInput("topic must not be empty".into()));
        }

        let _guard = self.locks.lock(learner_id.to_string()).await;
        let mut learner = self
            .learners
            .get(learner_id)
            .await?
            .unwrap_or_else(|| Learner::new(learner_id));

        let state = learner.topics.entry(topic.to_string()).or_default();
        let remediate = apply_outcome(state, is_correct, time_taken_ms);
        let updated = *state;

        if remediate {
            tracing::info!(learner_id, topic, "topic flagged for remediation");
            learner.last_remediation = Some(RemediationMark {
                topic: topic.to_string(),
                at: Utc::now(),
            });
        }

        self.learners.save(&learner).await?;
        tracing::debug!(mastery = updated.mastery, attempts = updated.attempts, "mastery updated");
        Ok(updated)
    }

    /// Current state for every topic the learner has attempted.
    pub async fn snapshot(&self, learner_id: &str) -> QuizResult<Option<Learner>> {
        Ok(self.learners.get(learner_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    #[test]
    fn correct_answer_moves_toward_one() {
        let mut state = LearnerTopicState {
            mastery: 0.4,
            attempts: 3,
            streak: 2,
            time_on_task_ms: 1_000,
        };
        let remediate = apply_outcome(&mut state, true, 500);
        assert!((state.mastery - 0.52).abs() < 1e-9);
        assert_eq!(state.attempts, 4);
        assert_eq!(state.streak, 3);
        assert_eq!(state.time_on_task_ms, 1_500);
        assert!(!remediate);
    }

    #[test]
    fn first_miss_does_not_remediate() {
        let mut state = LearnerTopicState::default();
        assert!(!apply_outcome(&mut state, false, 0));
        assert_eq!(state.mastery, 0.0);
        assert!(apply_outcome(&mut state, false, 0));
    }

    #[test]
    fn mastery_stays_bounded_and_converges() {
        let mut state = LearnerTopicState::default();
        for _ in 0..200 {
            apply_outcome(&mut state, true, 10);
            assert!((0.0..=1.0).contains(&state.mastery));
        }
        assert!(state.mastery > 0.999);

        for _ in 0..200 {
            apply_outcome(&mut state, false, 10);
            assert!((0.0..=1.0).contains(&state.mastery));
        }
        assert!(state.mastery < 0.001);
        assert_eq!(state.streak, 0);
        assert_eq!(state.attempts, 400);
    }

    #[tokio::test]
    async fn update_creates_learner_lazily() {
        let store = Arc::new(InMemoryStore::new());
        let tracker = MasteryTracker::new(store.clone());

        let state = tracker.update("ada", "Algebra", true, 1_200).await.unwrap();
        assert!((state.mastery - 0.2).abs() < 1e-9);

        let learner = store.get("ada").await.unwrap().unwrap();
        assert_eq!(learner.topic_state("Algebra"), state);
        assert!(learner.last_remediation.is_none());
    }

    #[tokio::test]
    async fn repeated_miss_records_remediation() {
        let store = Arc::new(InMemoryStore::new());
        let tracker = MasteryTracker::new(store.clone());

        tracker.update("ada", "Fractions", true, 0).await.unwrap();
        tracker.update("ada", "Fractions", false, 0).await.unwrap();

        let learner = store.get("ada").await.unwrap().unwrap();
        let mark = learner.last_remediation.unwrap();
        assert_eq!(mark.topic, "Fractions");
    }

    #[tokio::test]
    async fn topics_are_tracked_independently() {
        let store = Arc::new(InMemoryStore::new());
        let tracker = MasteryTracker::new(store.clone());

        tracker.update("ada", "Algebra", true, 0).await.unwrap();
        tracker.update("ada", "Geometry", false, 0).await.unwrap();

        let learner = tracker.snapshot("ada").await.unwrap().unwrap();
        assert_eq!(learner.topics.len(), 2);
        assert_eq!(learner.topic_state("Algebra").streak, 1);
        assert_eq!(learner.topic_state("Geometry").attempts, 1);
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let store = Arc::new(InMemoryStore::new());
        let tracker = Arc::new(MasteryTracker::new(store.clone()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                tokio::spawn(async move { tracker.update("ada", "Algebra", true, 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let learner = store.get("ada").await.unwrap().unwrap();
        assert_eq!(learner.topic_state("Algebra").attempts, 10);
        assert_eq!(learner.topic_state("Algebra").time_on_task_ms, 10);
    }

    #[tokio::test]
    async fn empty_topic_is_rejected() {
        let tracker = MasteryTracker::new(Arc::new(InMemoryStore::new()));
        let err = tracker.update("ada", " ", true, 0).await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));
    }
}
