//! Quiz session lifecycle.
//!
//! Sessions start `active` at index 0 and end in exactly one of two terminal
//! states, `completed` or `cancelled`. Answering the last item does not
//! complete a session; completion is an explicit call that computes the
//! score.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{QuizError, QuizResult};
use crate::lock::KeyedLocks;
use crate::mastery::MasteryTracker;
use crate::model::{Attempt, ItemId, QuizMode, QuizSession, SessionId, SessionStatus};
use crate::selector::Selection;
use crate::traits::{AttemptStore, ItemStore, SessionStore};

/// Result of one submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    /// Session index after the submission.
    pub next_index: usize,
    /// Items still unanswered.
    pub remaining: usize,
}

/// Answers match when equal after trimming surrounding whitespace. Case
/// matters.
pub fn is_correct_answer(given: &str, expected: &str) -> bool {
    given.trim() == expected.trim()
}

/// Percentage of correct attempts, 0 when there are none.
pub fn score_attempts(attempts: &[Attempt]) -> f64 {
    if attempts.is_empty() {
        return 0.0;
    }
    let correct = attempts.iter().filter(|a| a.is_correct).count();
    correct as f64 / attempts.len() as f64 * 100.0
}

/// Drives sessions through their lifecycle.
pub struct QuizService {
    items: Arc<dyn ItemStore>,
    sessions: Arc<dyn SessionStore>,
    attempts: Arc<dyn AttemptStore>,
    mastery: Arc<MasteryTracker>,
    locks: KeyedLocks<SessionId>,
}

impl QuizService {
    pub fn new(
        items: Arc<dyn ItemStore>,
        sessions: Arc<dyn SessionStore>,
        attempts: Arc<dyn AttemptStore>,
        mastery: Arc<MasteryTracker>,
    ) -> Self {
        Self {
            items,
            sessions,
            attempts,
            mastery,
            locks: KeyedLocks::new(),
        }
    }

    /// Start a session over the ids of a selection.
    pub async fn start_session(&self, learner_id: &str, selection: Selection) -> QuizResult<QuizSession> {
        let mut session = self
            .start_with_items(learner_id, selection.metadata.mode, selection.item_ids)
            .await?;
        session.selection = Some(selection.metadata);
        self.sessions.save(&session).await?;
        Ok(session)
    }

    /// Start a session over an explicit item list.
    pub async fn start_with_items(
        &self,
        learner_id: &str,
        mode: QuizMode,
        item_ids: Vec<ItemId>,
    ) -> QuizResult<QuizSession> {
        if learner_id.trim().is_empty() {
            return Err(QuizError::InvalidInput("learner id must not be empty".into()));
        }
        let session = QuizSession::new(learner_id, mode, item_ids);
        self.sessions.save(&session).await?;
        tracing::info!(session_id = %session.id, items = session.item_ids.len(), "session started");
        Ok(session)
    }

    /// The session, if it exists and belongs to `learner_id`.
    pub async fn get_session(&self, learner_id: &str, session_id: SessionId) -> QuizResult<QuizSession> {
        match self.sessions.find_by_id(session_id).await? {
            Some(session) if session.learner_id == learner_id => Ok(session),
            _ => Err(QuizError::SessionNotFound(session_id)),
        }
    }

    /// Answer the session's current item.
    ///
    /// The attempt log and mastery update are best-effort: their failures
    /// are logged and do not fail the submission.
    #[instrument(skip(self, answer))]
    pub async fn submit_answer(
        &self,
        learner_id: &str,
        session_id: SessionId,
        answer: &str,
        time_taken_ms: u64,
    ) -> QuizResult<AnswerOutcome> {
        let _guard = self.locks.lock(session_id).await;

        let mut session = self.get_session(learner_id, session_id).await?;
        if !session.is_active() {
            return Err(QuizError::SessionNotActive(session_id));
        }
        let item_id = session
            .current_item()
            .ok_or(QuizError::SessionExhausted(session_id))?;
        let item = self
            .items
            .find_by_id(item_id)
            .await?
            .ok_or(QuizError::ItemNotFound(item_id))?;

        let is_correct = is_correct_answer(answer, &item.answer);

        let attempt = Attempt {
            id: Uuid::new_v4(),
            learner_id: learner_id.to_string(),
            item_id,
            session_id,
            is_correct,
            user_answer: answer.to_string(),
            time_taken_ms,
            created_at: Utc::now(),
        };
        if let Err(e) = self.attempts.create(&attempt).await {
            tracing::warn!(%session_id, %item_id, "failed to record attempt: {e}");
        }

        match item.primary_topic() {
            Some(topic) => {
                if let Err(e) = self
                    .mastery
                    .update(learner_id, topic, is_correct, time_taken_ms)
                    .await
                {
                    tracing::warn!(learner_id, topic, "failed to update mastery: {e}");
                }
            }
            None => tracing::debug!(%item_id, "item has no topic, mastery unchanged"),
        }

        session.current_index = (session.current_index + 1).min(session.item_ids.len());
        self.sessions.save(&session).await?;

        Ok(AnswerOutcome {
            is_correct,
            correct_answer: item.answer,
            explanation: item.explanation,
            next_index: session.current_index,
            remaining: session.remaining(),
        })
    }

    /// Complete an active session and score it from its attempts.
    #[instrument(skip(self))]
    pub async fn complete(&self, learner_id: &str, session_id: SessionId) -> QuizResult<QuizSession> {
        let _guard = self.locks.lock(session_id).await;

        let mut session = self.get_session(learner_id, session_id).await?;
        if !session.is_active() {
            return Err(QuizError::SessionNotActive(session_id));
        }
        let attempts = self.attempts.list_for_session(session_id).await?;

        session.score = score_attempts(&attempts);
        session.status = SessionStatus::Completed;
        session.completed_at = Some(Utc::now());
        self.sessions.save(&session).await?;

        tracing::info!(%session_id, score = session.score, attempts = attempts.len(), "session completed");
        Ok(session)
    }

    /// Cancel an active session. Its attempts and mastery effects stay.
    pub async fn cancel(&self, learner_id: &str, session_id: SessionId) -> QuizResult<QuizSession> {
        let _guard = self.locks.lock(session_id).await;

        let mut session = self.get_session(learner_id, session_id).await?;
        if !session.is_active() {
            return Err(QuizError::SessionNotActive(session_id));
        }
        session.status = SessionStatus::Cancelled;
        session.completed_at = Some(Utc::now());
        self.sessions.save(&session).await?;
        Ok(session)
    }
}
