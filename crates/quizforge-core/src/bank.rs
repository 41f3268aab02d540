//! TOML item-bank loader.
//!
//! Loads hand-written item banks from TOML files and directories, runs each
//! item through the same normalization as generator output, and validates
//! the result.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Item, ItemCandidate, ItemType, Origin};
use crate::parser::parse_candidate;

/// Intermediate TOML structure for bank files. Items stay loosely typed so
/// they can be normalized like generator output.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    #[serde(default)]
    bank: TomlBankHeader,
    #[serde(default)]
    items: Vec<toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlBankHeader {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    default_topic: Option<String>,
}

/// A parsed item bank.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBank {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Topic given to items that declare none.
    pub default_topic: Option<String>,
    pub items: Vec<ItemCandidate>,
    /// Entries that failed normalization, with their position and reason.
    pub rejected: Vec<(usize, String)>,
    pub source: PathBuf,
}

impl ItemBank {
    /// Materialize the bank's candidates as human-authored items.
    pub fn to_items(&self) -> Vec<Item> {
        let fallback = self.default_topic.as_deref().unwrap_or_default();
        self.items
            .iter()
            .cloned()
            .map(|c| c.into_item(fallback, Origin::Human))
            .collect()
    }
}

/// Parse a single bank file.
pub fn parse_item_bank(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank: {}", path.display()))?;

    parse_item_bank_str(&content, path)
}

/// Parse bank TOML from a string.
pub fn parse_item_bank_str(content: &str, source_path: &Path) -> Result<ItemBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut items = Vec::with_capacity(parsed.items.len());
    let mut rejected = Vec::new();
    for (index, raw) in parsed.items.into_iter().enumerate() {
        let value = serde_json::to_value(raw)
            .with_context(|| format!("item {index} in {} is not representable", source_path.display()))?;
        match parse_candidate(&value) {
            Ok(candidate) => items.push(candidate),
            Err(reason) => rejected.push((index, reason.to_string())),
        }
    }

    let id = if parsed.bank.id.is_empty() {
        source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        parsed.bank.id
    };

    Ok(ItemBank {
        name: if parsed.bank.name.is_empty() {
            id.clone()
        } else {
            parsed.bank.name
        },
        id,
        description: parsed.bank.description,
        default_topic: parsed.bank.default_topic.filter(|t| !t.trim().is_empty()),
        items,
        rejected,
        source: source_path.to_path_buf(),
    })
}

/// Recursively load all `.toml` bank files from a directory. Files that fail
/// to parse are skipped with a warning.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<ItemBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_item_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank file, or every bank under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<ItemBank>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_item_bank(path)?])
    }
}

/// A warning from bank validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The item's seed id (if applicable).
    pub item_id: Option<String>,
    pub message: String,
}

/// Validate a bank for common authoring mistakes.
pub fn validate_item_bank(bank: &ItemBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for (index, reason) in &bank.rejected {
        warnings.push(ValidationWarning {
            item_id: None,
            message: format!("item #{} skipped: {reason}", index + 1),
        });
    }

    let mut seen_ids = HashSet::new();
    for item in &bank.items {
        if !seen_ids.insert(&item.id) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("duplicate item ID: {}", item.id),
            });
        }
    }

    for item in &bank.items {
        let mut warn = |message: String| {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message,
            })
        };

        if item.item_type == ItemType::Mcq {
            if item.choices.is_empty() {
                warn("mcq item has no choices".into());
            } else if !item.choices.iter().any(|c| c.trim() == item.answer.trim()) {
                warn(format!("answer {:?} is not one of the choices", item.answer));
            }
        }
        if item.hints.len() > 2 {
            warn(format!("{} hints given, at most 2 are recommended", item.hints.len()));
        }
        if item.topics.is_empty() && bank.default_topic.is_none() {
            warn("item has no topics and the bank sets no default_topic".into());
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOML: &str = r#"
[bank]
id = "algebra-basics"
name = "Algebra basics"
default_topic = "Algebra"

[[items]]
id = "alg-001"
type = "mcq"
question = "What is x if 2x = 6?"
choices = ["2", "3", "6"]
answer = "3"
difficulty = 1
bloom = "apply"
hints = ["Divide both sides by 2"]

[[items]]
id = "alg-002"
type = "short"
question = "Simplify 3x + 2x."
answer = "5x"
difficulty = "medium"
bloom = "Understanding"
topics = ["Algebra", "Expressions"]
"#;

    #[test]
    fn parse_valid_bank() {
        let bank = parse_item_bank_str(VALID_TOML, &PathBuf::from("algebra.toml")).unwrap();
        assert_eq!(bank.id, "algebra-basics");
        assert_eq!(bank.items.len(), 2);
        assert!(bank.rejected.is_empty());
        assert_eq!(bank.items[0].answer, "3");
        assert_eq!(bank.items[1].difficulty, 3);
        assert_eq!(bank.items[1].bloom_level, crate::model::BloomLevel::Understand);
        assert!(validate_item_bank(&bank).is_empty());
    }

    #[test]
    fn default_topic_fills_untagged_items() {
        let bank = parse_item_bank_str(VALID_TOML, &PathBuf::from("algebra.toml")).unwrap();
        let items = bank.to_items();
        assert_eq!(items[0].topics, vec!["Algebra"]);
        assert_eq!(items[0].origin, Origin::Human);
        assert_eq!(items[0].seed_id.as_deref(), Some("alg-001"));
        assert_eq!(items[1].topics, vec!["Algebra", "Expressions"]);
    }

    #[test]
    fn header_is_optional() {
        let toml = r#"
[[items]]
id = "q1"
question = "Name a prime number."
answer = "2"
"#;
        let bank = parse_item_bank_str(toml, &PathBuf::from("primes.toml")).unwrap();
        assert_eq!(bank.id, "primes");
        assert_eq!(bank.name, "primes");
        assert_eq!(bank.items[0].item_type, ItemType::Short);
        assert_eq!(bank.items[0].difficulty, 3);
    }

    #[test]
    fn invalid_items_are_rejected_and_reported() {
        let toml = r#"
[[items]]
id = "ok"
question = "Fine?"
answer = "yes"
topics = ["General"]

[[items]]
id = "no-answer"
question = "Where is the answer?"
topics = ["General"]
"#;
        let bank = parse_item_bank_str(toml, &PathBuf::from("mixed.toml")).unwrap();
        assert_eq!(bank.items.len(), 1);
        assert_eq!(bank.rejected, vec![(1, "missing answer".to_string())]);

        let warnings = validate_item_bank(&bank);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("item #2 skipped"));
    }

    #[test]
    fn validate_flags_authoring_mistakes() {
        let toml = r#"
[[items]]
id = "dup"
type = "mcq"
question = "Pick one"
choices = ["a", "b"]
answer = "c"
hints = ["one", "two", "three"]

[[items]]
id = "dup"
type = "mcq"
question = "Pick again"
answer = "a"
topics = ["Letters"]
"#;
        let bank = parse_item_bank_str(toml, &PathBuf::from("letters.toml")).unwrap();
        let warnings = validate_item_bank(&bank);
        let has = |needle: &str| warnings.iter().any(|w| w.message.contains(needle));

        assert!(has("duplicate item ID"));
        assert!(has("not one of the choices"));
        assert!(has("at most 2"));
        assert!(has("no choices"));
        assert!(has("no topics"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_item_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("algebra.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[[items]\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("more.toml"), VALID_TOML.replace("algebra-basics", "more")).unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        let ids: Vec<_> = banks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["algebra-basics", "more"]);
    }

    #[test]
    fn load_banks_accepts_file_or_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("algebra.toml");
        std::fs::write(&file, VALID_TOML).unwrap();

        assert_eq!(load_banks(&file).unwrap().len(), 1);
        assert_eq!(load_banks(dir.path()).unwrap().len(), 1);
        assert!(load_bank_directory(&file).is_err());
    }
}
