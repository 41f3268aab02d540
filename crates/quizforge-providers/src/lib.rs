//! quizforge-providers: content generator backends.
//!
//! Implements the `ContentGenerator` trait for Ollama, OpenAI-compatible
//! APIs, and an offline mode, plus the TOML configuration that selects
//! between them.

pub mod config;
pub mod mock;
pub mod offline;
pub mod ollama;
pub mod openai;

pub use config::{
    create_generator, load_config, load_config_from, resolve_provider, EngineSettings,
    ProviderConfig, QuizforgeConfig,
};
pub use quizforge_core::error::GeneratorError;
