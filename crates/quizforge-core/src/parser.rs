//! Generator output parser.
//!
//! Normalizes loosely structured candidate questions (as produced by an LLM)
//! into [`ItemCandidate`]s and drops the ones that fail validation. Malformed
//! input never raises: it degrades to an empty result.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::model::{BloomLevel, ItemCandidate, ItemType, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::traits::extract_json_from_markdown;

/// Result of parsing a batch of raw candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// Candidates that passed validation, in input order.
    pub items: Vec<ItemCandidate>,
    /// Number of candidates that were dropped.
    pub dropped: usize,
}

impl ParseOutcome {
    pub fn total(&self) -> usize {
        self.items.len() + self.dropped
    }
}

/// Parse already-decoded generator output.
///
/// Accepts a bare array of candidate objects or an object with an `items`
/// array. Anything else yields an empty outcome.
pub fn parse_items(raw: &Value) -> ParseOutcome {
    let Some(candidates) = candidate_array(raw) else {
        tracing::debug!("generator output is neither a list nor an items wrapper");
        return ParseOutcome::default();
    };

    let mut outcome = ParseOutcome::default();
    for (index, raw_candidate) in candidates.iter().enumerate() {
        match parse_candidate(raw_candidate) {
            Ok(candidate) => outcome.items.push(candidate),
            Err(reason) => {
                tracing::debug!(index, reason, "dropping candidate");
                outcome.dropped += 1;
            }
        }
    }
    outcome
}

/// Parse raw generator text: strip markdown fences, decode JSON, fill in
/// missing seed ids, then run [`parse_items`].
pub fn parse_raw_output(text: &str, topic: &str, stamp: i64) -> ParseOutcome {
    let payload = extract_json_from_markdown(text);
    let mut value: Value = match serde_json::from_str(&payload) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("generator output is not valid JSON: {e}");
            return ParseOutcome::default();
        }
    };
    assign_seed_ids(&mut value, topic, stamp);
    parse_items(&value)
}

/// Topic rendered for use inside seed ids: whitespace runs become `_`.
pub fn seed_slug(topic: &str) -> String {
    topic.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Give every candidate object without an id the seed id
/// `seed_<topic>_<stamp>_<index>`.
pub fn assign_seed_ids(raw: &mut Value, topic: &str, stamp: i64) {
    let slug = seed_slug(topic);
    let candidates = match raw {
        Value::Array(arr) => arr,
        Value::Object(obj) => match obj.get_mut("items") {
            Some(Value::Array(arr)) => arr,
            _ => return,
        },
        _ => return,
    };
    for (i, candidate) in candidates.iter_mut().enumerate() {
        if let Value::Object(obj) = candidate {
            let has_id = string_field(obj, &["id"]).is_some_and(|s| !s.trim().is_empty());
            if !has_id {
                obj.insert(
                    "id".to_string(),
                    Value::String(format!("seed_{slug}_{stamp}_{i}")),
                );
            }
        }
    }
}

fn candidate_array(raw: &Value) -> Option<&Vec<Value>> {
    match raw {
        Value::Array(arr) => Some(arr),
        Value::Object(obj) => obj.get("items").and_then(Value::as_array),
        _ => None,
    }
}

/// Normalize and validate a single candidate object.
pub fn parse_candidate(raw: &Value) -> Result<ItemCandidate, &'static str> {
    let obj = raw.as_object().ok_or("candidate is not an object")?;

    let choices = string_list(obj, &["choices", "options"]);
    let type_str = string_field(obj, &["type", "questionType"]).unwrap_or_else(|| {
        if obj.contains_key("options") {
            "mcq".to_string()
        } else {
            "short".to_string()
        }
    });
    let item_type: ItemType = type_str.parse().map_err(|_| "unknown item type")?;

    let answer = match string_field(obj, &["answer"]) {
        Some(answer) => answer,
        None => obj
            .get("correctIndex")
            .and_then(Value::as_u64)
            .and_then(|i| choices.get(i as usize).cloned())
            .unwrap_or_default(),
    };

    let id = string_field(obj, &["id"]).unwrap_or_default();
    let question = string_field(obj, &["question"]).unwrap_or_default();

    if id.trim().is_empty() {
        return Err("missing id");
    }
    if question.trim().is_empty() {
        return Err("missing question");
    }
    if answer.trim().is_empty() {
        return Err("missing answer");
    }

    let difficulty = normalize_difficulty(obj.get("difficulty")).ok_or("difficulty out of range")?;
    let bloom_raw = string_field(obj, &["cognitiveLevel", "bloom", "bloomLevel", "bloom_level"]);
    let bloom_level = normalize_bloom(bloom_raw.as_deref());

    let mut topics = string_list(obj, &["topics"]);
    if topics.is_empty() {
        if let Some(topic) = string_field(obj, &["topic"]) {
            topics.push(topic);
        }
    }
    let mut seen = HashSet::new();
    topics.retain(|t| seen.insert(t.clone()));

    let hints = match obj.get("hints") {
        Some(Value::String(h)) if !h.is_empty() => vec![h.clone()],
        _ => string_list(obj, &["hints"]),
    };

    Ok(ItemCandidate {
        id,
        item_type,
        question,
        choices,
        answer,
        difficulty,
        bloom_level,
        topics,
        skills: string_list(obj, &["skills"]),
        hints,
        explanation: string_field(obj, &["explanation"]).unwrap_or_default(),
    })
}

/// Map a raw difficulty onto `1..=5`.
///
/// Numbers are clamped; `easy`/`medium`/`hard` map to 2/3/4; anything else
/// defaults to 3. Returns `None` for non-integral numbers.
pub fn normalize_difficulty(raw: Option<&Value>) -> Option<u8> {
    match raw {
        Some(Value::Number(n)) => {
            let clamped = n
                .as_f64()?
                .clamp(f64::from(MIN_DIFFICULTY), f64::from(MAX_DIFFICULTY));
            if clamped.fract() != 0.0 {
                return None;
            }
            Some(clamped as u8)
        }
        Some(Value::String(s)) => Some(match s.trim().to_lowercase().as_str() {
            "easy" => 2,
            "medium" => 3,
            "hard" => 4,
            _ => 3,
        }),
        _ => Some(3),
    }
}

/// Map a raw cognitive level onto one of the six Bloom tokens.
pub fn normalize_bloom(raw: Option<&str>) -> BloomLevel {
    let lowered = raw.unwrap_or("apply").trim().to_lowercase();
    if let Ok(level) = lowered.parse::<BloomLevel>() {
        return level;
    }
    const FRAGMENTS: [(&str, BloomLevel); 5] = [
        ("analy", BloomLevel::Analyze),
        ("eval", BloomLevel::Evaluate),
        ("creat", BloomLevel::Create),
        ("under", BloomLevel::Understand),
        ("remem", BloomLevel::Remember),
    ];
    FRAGMENTS
        .iter()
        .find(|(fragment, _)| lowered.contains(fragment))
        .map(|(_, level)| *level)
        .unwrap_or(BloomLevel::Apply)
}

/// First of `keys` holding a string or number, rendered as a string.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// First of `keys` holding an array; scalar elements are stringified.
fn string_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
        .map(|arr| {
            arr.iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
