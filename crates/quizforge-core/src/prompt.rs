//! Prompt rendering for question generation.

use crate::model::LevelCounts;

/// Level-annotated question generation template.
///
/// Placeholders: `{topic}`, `{total}`, `{easy}`, `{medium}`, `{hard}`.
pub const QUESTION_TEMPLATE: &str = r#"Generate {total} assessment questions about the topic "{topic}".
Difficulty mix: {easy} EASY, {medium} MEDIUM, {hard} HARD.
EASY questions use difficulty 1-2, MEDIUM use 2-3, HARD use 4-5.

Return a JSON array. Each element must be an object with the fields:
- id: a unique seed identifier
- type: one of "mcq", "short", "code"
- question: the question text
- choices: answer options for mcq, an empty array otherwise
- answer: the canonical answer (for mcq, the exact text of the correct choice)
- explanation: one or two sentences
- difficulty: integer 1..5
- bloom: one of remember, understand, apply, analyze, evaluate, create
- topics: array of topic strings
- skills: array of skill strings
- hints: array with at most 2 hints

Output the JSON array only."#;

/// Render the generation prompt for `topic` and `levels`.
///
/// An all-zero distribution asks for the default mix of two questions per
/// level.
pub fn render_generation_prompt(topic: &str, levels: LevelCounts) -> String {
    let levels = if levels.total() == 0 {
        LevelCounts::new(2, 2, 2)
    } else {
        levels
    };
    QUESTION_TEMPLATE
        .replace("{topic}", topic)
        .replace("{total}", &levels.total().to_string())
        .replace("{easy}", &levels.easy.to_string())
        .replace("{medium}", &levels.medium.to_string())
        .replace("{hard}", &levels.hard.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_mentions_topic_and_levels() {
        let prompt = render_generation_prompt("Fractions", LevelCounts::new(2, 1, 0));
        assert!(prompt.contains("\"Fractions\""));
        assert!(prompt.contains("Generate 3 assessment questions"));
        assert!(prompt.contains("2 EASY, 1 MEDIUM, 0 HARD"));
        assert!(!prompt.contains("{topic}"));
    }

    #[test]
    fn empty_levels_use_default_mix() {
        let prompt = render_generation_prompt("Fractions", LevelCounts::default());
        assert!(prompt.contains("2 EASY, 2 MEDIUM, 2 HARD"));
    }
}
