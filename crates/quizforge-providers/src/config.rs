//! Configuration and generator factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizforge_core::cache::CacheConfig;
use quizforge_core::selector::{DuplicatePolicy, SelectorConfig, DEFAULT_MAX_LIMIT};
use quizforge_core::traits::ContentGenerator;

use crate::offline::OfflineGenerator;
use crate::ollama::{OllamaGenerator, DEFAULT_BASE_URL};
use crate::openai::OpenAiGenerator;

/// Configuration for a single generator backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    Offline,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Offline => f.write_str("Offline"),
        }
    }
}

fn default_ollama_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Engine tuning, the `[engine]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Generated batches older than this are not reused.
    pub freshness_days: i64,
    /// Session length when none is requested.
    pub default_limit: usize,
    /// Largest session length a caller may request.
    pub max_limit: usize,
    /// Largest level distribution a single generation may request.
    pub max_items_per_request: u32,
    /// Placeholder count for empty distributions.
    pub placeholder_count: usize,
    pub wildcard_unrecorded_levels: bool,
    pub duplicate_policy: DuplicatePolicy,
    pub max_tokens: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            freshness_days: 30,
            default_limit: 6,
            max_limit: DEFAULT_MAX_LIMIT,
            max_items_per_request: 30,
            placeholder_count: 3,
            wildcard_unrecorded_levels: true,
            duplicate_policy: DuplicatePolicy::Allow,
            max_tokens: 4096,
        }
    }
}

/// Top-level quizforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizforgeConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Retries on transient generator errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Where the CLI keeps its state snapshot.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub engine: EngineSettings,
}

fn default_provider() -> String {
    "ollama".to_string()
}
fn default_model() -> String {
    "llama3.1:8b".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./quizforge-data")
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            data_dir: default_data_dir(),
            engine: EngineSettings::default(),
        }
    }
}

impl QuizforgeConfig {
    /// Generation cache settings for `model`, or the default model.
    ///
    /// Fails when `freshness_days` is negative or out of range.
    pub fn cache_config(&self, model: Option<&str>) -> Result<CacheConfig> {
        let days = self.engine.freshness_days;
        let freshness = chrono::TimeDelta::try_days(days)
            .filter(|_| days >= 0)
            .ok_or_else(|| anyhow::anyhow!("engine.freshness_days out of range: {days}"))?;
        Ok(CacheConfig {
            freshness,
            wildcard_unrecorded_levels: self.engine.wildcard_unrecorded_levels,
            placeholder_count: self.engine.placeholder_count,
            max_items_per_request: self.engine.max_items_per_request,
            model: model.unwrap_or(&self.default_model).to_string(),
            temperature: self.default_temperature,
            max_tokens: self.engine.max_tokens,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            system_prompt_override: None,
        })
    }

    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            duplicate_policy: self.engine.duplicate_policy,
            max_limit: self.engine.max_limit,
        }
    }

    /// Snapshot file inside the data directory.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
            org_id: org_id.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
        ProviderConfig::Offline => ProviderConfig::Offline,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// Environment variable overrides: `QUIZFORGE_OPENAI_KEY`, `QUIZFORGE_OLLAMA_URL`.
pub fn load_config() -> Result<QuizforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("quizforge.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizforgeConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a config file body and resolve `${VAR}` references.
pub fn parse_config_str(content: &str) -> Result<QuizforgeConfig> {
    let mut config: QuizforgeConfig = toml::from_str(content)?;
    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    Ok(config)
}

fn apply_env_overrides(config: &mut QuizforgeConfig) {
    if let Ok(key) = std::env::var("QUIZFORGE_OPENAI_KEY") {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(url) = std::env::var("QUIZFORGE_OLLAMA_URL") {
        let entry = config
            .providers
            .entry("ollama".into())
            .or_insert(ProviderConfig::Ollama {
                base_url: String::new(),
            });
        if let ProviderConfig::Ollama { base_url } = entry {
            *base_url = url;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizforge"))
}

/// Create a generator instance from its configuration.
pub fn create_generator(config: &ProviderConfig) -> Arc<dyn ContentGenerator> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Arc::new(OpenAiGenerator::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        )),
        ProviderConfig::Ollama { base_url } => Arc::new(OllamaGenerator::new(base_url)),
        ProviderConfig::Offline => Arc::new(OfflineGenerator),
    }
}

/// Look up a provider by name, or the default provider. `ollama` and
/// `offline` work without an explicit table.
pub fn resolve_provider(config: &QuizforgeConfig, name: Option<&str>) -> Result<ProviderConfig> {
    let name = name.unwrap_or(&config.default_provider);
    if let Some(provider) = config.providers.get(name) {
        return Ok(provider.clone());
    }
    match name {
        "ollama" => Ok(ProviderConfig::Ollama {
            base_url: default_ollama_url(),
        }),
        "offline" => Ok(ProviderConfig::Offline),
        other => anyhow::bail!(
            "provider '{other}' is not configured. Add a [providers.{other}] table to quizforge.toml"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZFORGE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZFORGE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZFORGE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_QUIZFORGE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = QuizforgeConfig::default();
        assert_eq!(config.default_provider, "ollama");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.engine.freshness_days, 30);
        assert_eq!(config.engine.default_limit, 6);
        assert_eq!(config.state_path(), PathBuf::from("./quizforge-data/state.json"));
    }

    #[test]
    fn parse_provider_and_engine_tables() {
        let toml_str = r#"
default_provider = "openai"
default_model = "gpt-4.1-mini"
retry_delay_ms = 250

[providers.openai]
type = "openai"
api_key = "sk-openai"

[providers.local]
type = "ollama"

[providers.none]
type = "offline"

[engine]
freshness_days = 7
duplicate_policy = "drop_repeats"
"#;
        let config = parse_config_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert!(matches!(
            config.providers.get("local"),
            Some(ProviderConfig::Ollama { base_url }) if base_url == DEFAULT_BASE_URL
        ));
        assert!(matches!(config.providers.get("none"), Some(ProviderConfig::Offline)));
        assert_eq!(config.engine.placeholder_count, 3);

        let cache = config.cache_config(None).unwrap();
        assert_eq!(cache.model, "gpt-4.1-mini");
        assert_eq!(cache.freshness, chrono::Duration::days(7));
        assert_eq!(cache.retry_delay, Duration::from_millis(250));
        assert_eq!(
            config.selector_config().duplicate_policy,
            DuplicatePolicy::DropRepeats
        );
    }

    #[test]
    fn freshness_out_of_range_is_an_error() {
        let config = parse_config_str("[engine]\nfreshness_days = 9223372036854775807\n").unwrap();
        let err = config.cache_config(None).unwrap_err();
        assert!(err.to_string().contains("freshness_days"));

        let config = parse_config_str("[engine]\nfreshness_days = -1\n").unwrap();
        assert!(config.cache_config(None).is_err());
    }

    #[test]
    fn selector_limit_comes_from_engine_table() {
        let config = parse_config_str("[engine]\nmax_limit = 12\n").unwrap();
        assert_eq!(config.selector_config().max_limit, 12);
        assert_eq!(
            QuizforgeConfig::default().selector_config().max_limit,
            DEFAULT_MAX_LIMIT
        );
    }

    #[test]
    fn debug_masks_api_key() {
        let provider = ProviderConfig::OpenAI {
            api_key: "sk-secret".into(),
            base_url: None,
            org_id: None,
        };
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn resolve_provider_falls_back_for_builtin_names() {
        let config = QuizforgeConfig::default();
        assert!(matches!(
            resolve_provider(&config, None).unwrap(),
            ProviderConfig::Ollama { .. }
        ));
        assert!(matches!(
            resolve_provider(&config, Some("offline")).unwrap(),
            ProviderConfig::Offline
        ));
        assert!(resolve_provider(&config, Some("openai")).is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config_from(Some(&missing)).is_err());

        let present = dir.path().join("quizforge.toml");
        std::fs::write(&present, "default_provider = \"offline\"\n").unwrap();
        let config = load_config_from(Some(&present)).unwrap();
        assert_eq!(config.default_provider, "offline");
    }
}
