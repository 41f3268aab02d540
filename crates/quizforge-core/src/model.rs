//! Core data model types for quizforge.
//!
//! Items, generated batches, learner mastery state, quiz sessions and
//! attempts: the records every other module reads and writes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ItemId = Uuid;
pub type BatchId = Uuid;
pub type SessionId = Uuid;

/// Lowest allowed item difficulty.
pub const MIN_DIFFICULTY: u8 = 1;
/// Highest allowed item difficulty.
pub const MAX_DIFFICULTY: u8 = 5;

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Kind of question an item asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Mcq,
    Short,
    Code,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Mcq => write!(f, "mcq"),
            ItemType::Short => write!(f, "short"),
            ItemType::Code => write!(f, "code"),
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" | "multiple_choice" | "multiple-choice" => Ok(ItemType::Mcq),
            "short" | "short_answer" | "short-answer" => Ok(ItemType::Short),
            "code" | "coding" => Ok(ItemType::Code),
            other => Err(format!("unknown item type: {other}")),
        }
    }
}

/// Bloom's taxonomy level of cognitive demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloomLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomLevel {
    pub const ALL: [BloomLevel; 6] = [
        BloomLevel::Remember,
        BloomLevel::Understand,
        BloomLevel::Apply,
        BloomLevel::Analyze,
        BloomLevel::Evaluate,
        BloomLevel::Create,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloomLevel::Remember => "remember",
            BloomLevel::Understand => "understand",
            BloomLevel::Apply => "apply",
            BloomLevel::Analyze => "analyze",
            BloomLevel::Evaluate => "evaluate",
            BloomLevel::Create => "create",
        }
    }
}

impl fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloomLevel {
    type Err = String;

    /// Accepts only the six canonical tokens. Fuzzy matching lives in the parser.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        BloomLevel::ALL
            .into_iter()
            .find(|b| b.as_str() == lowered)
            .ok_or_else(|| format!("unknown bloom level: {lowered}"))
    }
}

/// Where an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Human,
    Generated,
}

/// A single question record in the item bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned identifier.
    pub id: ItemId,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub question: String,
    /// Ordered answer choices; empty unless the item is an MCQ.
    #[serde(default)]
    pub choices: Vec<String>,
    /// Canonical answer used for grading.
    pub answer: String,
    /// Difficulty in `1..=5`.
    pub difficulty: u8,
    pub bloom_level: BloomLevel,
    /// Topic tags. The first entry is the item's primary topic.
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    pub origin: Origin,
    /// Generator- or bank-assigned seed identifier.
    #[serde(default)]
    pub seed_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Topic used for mastery bookkeeping.
    pub fn primary_topic(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }

    pub fn has_any_topic(&self, topics: &[String]) -> bool {
        self.topics.iter().any(|t| topics.contains(t))
    }
}

/// A normalized, validated item that has not been assigned a store id yet.
///
/// Produced by the item parser and by the item-bank loader; stored verbatim
/// on a [`GeneratedBatch`] until the batch is published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCandidate {
    /// Seed id supplied by the generator or bank file.
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub question: String,
    #[serde(default)]
    pub choices: Vec<String>,
    pub answer: String,
    pub difficulty: u8,
    pub bloom_level: BloomLevel,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

impl ItemCandidate {
    /// Materialize the candidate as an item. Candidates without topics are
    /// tagged with `fallback_topic`.
    pub fn into_item(self, fallback_topic: &str, origin: Origin) -> Item {
        let topics = if self.topics.is_empty() && !fallback_topic.is_empty() {
            vec![fallback_topic.to_string()]
        } else {
            self.topics
        };
        Item {
            id: Uuid::new_v4(),
            item_type: self.item_type,
            question: self.question,
            choices: self.choices,
            answer: self.answer,
            difficulty: self.difficulty,
            bloom_level: self.bloom_level,
            topics,
            skills: self.skills,
            hints: self.hints,
            explanation: self.explanation,
            origin,
            seed_id: Some(self.id),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Difficulty levels
// ---------------------------------------------------------------------------

/// Coarse difficulty level used when talking to the content generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Easy,
    Medium,
    Hard,
}

impl Level {
    /// Classify an integer difficulty: `<= 2` easy, `<= 3` medium, else hard.
    pub fn for_difficulty(difficulty: u8) -> Self {
        if difficulty <= 2 {
            Level::Easy
        } else if difficulty <= 3 {
            Level::Medium
        } else {
            Level::Hard
        }
    }

    /// Representative integer difficulty of this level.
    pub fn difficulty(&self) -> u8 {
        match self {
            Level::Easy => 2,
            Level::Medium => 3,
            Level::Hard => 4,
        }
    }
}

/// Requested number of questions per difficulty level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelCounts {
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub hard: u32,
}

impl LevelCounts {
    pub fn new(easy: u32, medium: u32, hard: u32) -> Self {
        Self { easy, medium, hard }
    }

    /// Sum of all counts. Widened so oversized distributions cannot wrap.
    pub fn total(&self) -> u64 {
        u64::from(self.easy) + u64::from(self.medium) + u64::from(self.hard)
    }

    pub fn add(&mut self, level: Level) {
        match level {
            Level::Easy => self.easy += 1,
            Level::Medium => self.medium += 1,
            Level::Hard => self.hard += 1,
        }
    }

    /// Spread `count` questions over the difficulty buckets round-robin and
    /// classify each slot into a level.
    pub fn from_buckets(buckets: &[u8], count: usize) -> Self {
        let mut levels = LevelCounts::default();
        if buckets.is_empty() {
            return levels;
        }
        for slot in 0..count {
            levels.add(Level::for_difficulty(buckets[slot % buckets.len()]));
        }
        levels
    }

    /// Expand the counts into one representative difficulty per question,
    /// easy first.
    pub fn difficulties(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total() as usize);
        for (level, n) in [
            (Level::Easy, self.easy),
            (Level::Medium, self.medium),
            (Level::Hard, self.hard),
        ] {
            out.extend(std::iter::repeat(level.difficulty()).take(n as usize));
        }
        out
    }
}

impl fmt::Display for LevelCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "easy={} medium={} hard={}",
            self.easy, self.medium, self.hard
        )
    }
}

// ---------------------------------------------------------------------------
// Generated batches
// ---------------------------------------------------------------------------

/// Lifecycle of a generated batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Draft,
    Published,
}

/// One generation request/response cycle and the items derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedBatch {
    pub id: BatchId,
    pub topic: String,
    /// Level distribution the batch was generated for. `None` for batches
    /// recorded without one.
    #[serde(default)]
    pub requested_levels: Option<LevelCounts>,
    pub prompt_used: String,
    /// Generator that produced the raw output, if any call succeeded.
    #[serde(default)]
    pub source_model: Option<String>,
    /// Raw generator text, kept so candidates can be re-derived later.
    #[serde(default)]
    pub raw_output: Option<String>,
    #[serde(default)]
    pub parsed_items: Vec<ItemCandidate>,
    pub status: BatchStatus,
    #[serde(default)]
    pub linked_item_ids: Vec<ItemId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl GeneratedBatch {
    /// A fresh draft batch for `topic`.
    pub fn draft(topic: &str, levels: LevelCounts, prompt: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            requested_levels: Some(levels),
            prompt_used: prompt,
            source_model: None,
            raw_output: None,
            parsed_items: Vec::new(),
            status: BatchStatus::Draft,
            linked_item_ids: Vec::new(),
            created_at: Utc::now(),
            published_at: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == BatchStatus::Published
    }

    /// Seed-id stamp derived from the creation time.
    pub fn seed_stamp(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

// ---------------------------------------------------------------------------
// Learners
// ---------------------------------------------------------------------------

/// Per-topic proficiency record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnerTopicState {
    /// Exponential moving average of correctness, in `[0, 1]`.
    pub mastery: f64,
    pub attempts: u32,
    /// Consecutive correct answers.
    pub streak: u32,
    pub time_on_task_ms: u64,
}

/// Most recent topic the learner struggled with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationMark {
    pub topic: String,
    pub at: DateTime<Utc>,
}

/// A learner record as far as this engine cares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learner {
    pub id: String,
    #[serde(default)]
    pub topics: BTreeMap<String, LearnerTopicState>,
    #[serde(default)]
    pub last_remediation: Option<RemediationMark>,
}

impl Learner {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            topics: BTreeMap::new(),
            last_remediation: None,
        }
    }

    pub fn topic_state(&self, topic: &str) -> LearnerTopicState {
        self.topics.get(topic).copied().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Sessions and attempts
// ---------------------------------------------------------------------------

/// Purpose of a quiz session; drives the default difficulty buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Diagnostic,
    #[default]
    Formative,
    Summative,
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::Diagnostic => write!(f, "diagnostic"),
            QuizMode::Formative => write!(f, "formative"),
            QuizMode::Summative => write!(f, "summative"),
        }
    }
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diagnostic" => Ok(QuizMode::Diagnostic),
            "formative" => Ok(QuizMode::Formative),
            "summative" => Ok(QuizMode::Summative),
            other => Err(format!("unknown quiz mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

/// How a session's item list was assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionMetadata {
    pub reason: String,
    pub mode: QuizMode,
    pub topics: Vec<String>,
    pub difficulty_buckets: Vec<u8>,
    /// Number of ids contributed by each selection step, in order.
    #[serde(default)]
    pub contributions: Vec<(String, usize)>,
}

/// A learner's pass through an ordered list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSession {
    pub id: SessionId,
    pub learner_id: String,
    pub mode: QuizMode,
    pub item_ids: Vec<ItemId>,
    /// Position of the next item to answer, in `0..=item_ids.len()`.
    pub current_index: usize,
    pub status: SessionStatus,
    /// Percentage of correct attempts, set on completion.
    pub score: f64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub selection: Option<SelectionMetadata>,
}

impl QuizSession {
    pub fn new(learner_id: &str, mode: QuizMode, item_ids: Vec<ItemId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            learner_id: learner_id.to_string(),
            mode,
            item_ids,
            current_index: 0,
            status: SessionStatus::Active,
            score: 0.0,
            started_at: Utc::now(),
            completed_at: None,
            selection: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Item the learner is currently on, if any remain.
    pub fn current_item(&self) -> Option<ItemId> {
        self.item_ids.get(self.current_index).copied()
    }

    pub fn remaining(&self) -> usize {
        self.item_ids.len() - self.current_index.min(self.item_ids.len())
    }
}

/// Immutable record of one submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub learner_id: String,
    pub item_id: ItemId,
    pub session_id: SessionId,
    pub is_correct: bool,
    pub user_answer: String,
    pub time_taken_ms: u64,
    pub created_at: DateTime<Utc>,
}
