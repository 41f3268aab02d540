//! The `quizforge list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::traits::ModelInfo;
use quizforge_providers::config::{create_generator, load_config_from};
use quizforge_providers::ollama::OllamaGenerator;
use quizforge_providers::ProviderConfig;

pub async fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut names: Vec<_> = config.providers.keys().cloned().collect();
    names.sort();

    let mut found_any = false;

    for name in &names {
        if provider_filter.as_ref().is_some_and(|filter| filter != name) {
            continue;
        }

        let provider_config = &config.providers[name];
        let models: Vec<ModelInfo> = match provider_config {
            ProviderConfig::Ollama { base_url } => {
                match OllamaGenerator::new(base_url).list_models_async().await {
                    Ok(models) => models,
                    Err(e) => {
                        println!("Provider: {name} (unavailable: {e})\n");
                        continue;
                    }
                }
            }
            other => create_generator(other).available_models(),
        };

        if !models.is_empty() {
            found_any = true;
            println!("Provider: {name}");
            for model in &models {
                if model.max_context > 0 {
                    println!(
                        "  {} - {} ({}K context)",
                        model.id,
                        model.name,
                        model.max_context / 1000
                    );
                } else {
                    println!("  {} - {}", model.id, model.name);
                }
            }
            println!();
        }
    }

    if !found_any {
        println!("No models found. Run `quizforge init` to create a config file.");
    }

    Ok(())
}
