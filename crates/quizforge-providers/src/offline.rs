//! Generator for running without any model backend.
//!
//! Every call fails with a network-style error, so the generation cache
//! falls back to placeholder items.

use async_trait::async_trait;

use quizforge_core::error::GeneratorError;
use quizforge_core::traits::{ContentGenerator, GenerateRequest, GenerateResponse, ModelInfo};

#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

#[async_trait]
impl ContentGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        tracing::debug!(topic = %request.topic, "offline generator refusing request");
        Err(GeneratorError::NetworkError("no generator configured (offline mode)".into()).into())
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_core::model::LevelCounts;

    #[tokio::test]
    async fn always_fails_transiently() {
        let request = GenerateRequest {
            model: "none".into(),
            topic: "Algebra".into(),
            levels: LevelCounts::new(1, 0, 0),
            prompt: "anything".into(),
            system_prompt: None,
            max_tokens: 16,
            temperature: 0.0,
        };
        let err = OfflineGenerator.generate(&request).await.unwrap_err();
        let gen_err = err.downcast_ref::<GeneratorError>().unwrap();
        assert!(!gen_err.is_permanent());
        assert!(err.to_string().contains("offline"));
    }
}
