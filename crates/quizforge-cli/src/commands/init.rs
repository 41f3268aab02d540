//! The `quizforge init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("quizforge.toml").exists() {
        println!("quizforge.toml already exists, skipping.");
    } else {
        std::fs::write("quizforge.toml", SAMPLE_CONFIG)?;
        println!("Created quizforge.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizforge.toml to point at your generator");
    println!("  2. Run: quizforge validate --bank banks/example.toml");
    println!("  3. Run: quizforge import --bank banks/example.toml");
    println!("  4. Run: quizforge quiz --learner you --topics Arithmetic");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

default_provider = "ollama"
default_model = "llama3.1:8b"
default_temperature = 0.7
max_retries = 2
retry_delay_ms = 1000
data_dir = "./quizforge-data"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.offline]
type = "offline"

[engine]
freshness_days = 30
default_limit = 6
max_limit = 100
max_items_per_request = 30
placeholder_count = 3
wildcard_unrecorded_levels = true
duplicate_policy = "allow"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A few arithmetic items to get started"
default_topic = "Arithmetic"

[[items]]
id = "add_small"
type = "mcq"
question = "What is 2 + 3?"
choices = ["4", "5", "6", "7"]
answer = "5"
difficulty = 1
bloom_level = "remember"
hints = ["Count up from 2"]
explanation = "2 + 3 = 5."

[[items]]
id = "multiply_table"
type = "short"
question = "What is 7 x 8?"
answer = "56"
difficulty = 2
bloom_level = "remember"
explanation = "7 x 8 = 56."

[[items]]
id = "order_of_operations"
type = "mcq"
question = "What is 2 + 3 x 4?"
choices = ["20", "14", "24", "9"]
answer = "14"
difficulty = 3
bloom_level = "apply"
skills = ["order-of-operations"]
hints = ["Multiplication binds tighter than addition"]
explanation = "3 x 4 = 12, then 2 + 12 = 14."
"#;
