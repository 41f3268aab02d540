//! Shared test fixtures.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{GeneratorError, StoreError};
use crate::model::{Attempt, BloomLevel, Item, ItemType, Origin, SessionId};
use crate::traits::{
    AttemptStore, ContentGenerator, GenerateRequest, GenerateResponse, ModelInfo, StoreResult,
    TokenUsage,
};

pub fn sample_item(topic: &str, difficulty: u8) -> Item {
    Item {
        id: Uuid::new_v4(),
        item_type: ItemType::Mcq,
        question: format!("{topic} question at level {difficulty}"),
        choices: vec!["A".into(), "B".into()],
        answer: "A".into(),
        difficulty,
        bloom_level: BloomLevel::Apply,
        topics: vec![topic.to_string()],
        skills: vec![],
        hints: vec![],
        explanation: String::new(),
        origin: Origin::Human,
        seed_id: None,
        created_at: Utc::now(),
    }
}

/// JSON array of `n` valid candidates for `topic`.
pub fn candidates_json(topic: &str, n: usize) -> String {
    let items: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "id": format!("gen_{i}"),
                "type": "short",
                "question": format!("Generated {topic} question {i}"),
                "answer": format!("answer {i}"),
                "difficulty": 2,
                "bloom": "understand",
                "topics": [topic],
            })
        })
        .collect();
    serde_json::to_string(&items).unwrap()
}

/// Generator that replays scripted outcomes, then repeats the last one.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GeneratorError>>>,
    fallback: Result<String, String>,
    calls: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl ScriptedGenerator {
    pub fn always(content: &str) -> Self {
        Self::new(vec![], Ok(content.to_string()))
    }

    pub fn failing() -> Self {
        Self::new(vec![], Err("connection refused".to_string()))
    }

    pub fn new(
        script: Vec<Result<String, GeneratorError>>,
        fallback: Result<String, String>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        let content = match next {
            Some(Ok(content)) => content,
            Some(Err(e)) => return Err(e.into()),
            None => match &self.fallback {
                Ok(content) => content.clone(),
                Err(message) => return Err(GeneratorError::NetworkError(message.clone()).into()),
            },
        };
        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage::default(),
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![]
    }
}

/// Attempt log whose writes always fail.
pub struct BrokenAttemptLog;

#[async_trait]
impl AttemptStore for BrokenAttemptLog {
    async fn create(&self, _attempt: &Attempt) -> StoreResult<()> {
        Err(StoreError::Other("attempt log offline".into()))
    }

    async fn list_for_session(&self, _session_id: SessionId) -> StoreResult<Vec<Attempt>> {
        Ok(vec![])
    }
}
