//! Prompt templates for the intent-analysis reasoning step
//!
//! Two variants of one instruction block: a contextual prompt fed the
//! session's recent signals, and a cold-start prompt that states explicitly
//! that no history exists. Both demand the same JSON response shape.

use serde_json::json;

use crate::config::ReasoningConfig;
use crate::models::Signal;

/// Generate the intent-analysis prompt for a session with behavioral
/// history. Callers pass the already-truncated recent window; each signal
/// is serialized as one structured line.
pub fn contextual_analysis_prompt(
    query: &str,
    recent_signals: &[Signal],
    config: &ReasoningConfig,
) -> String {
    let history = recent_signals
        .iter()
        .map(|signal| {
            json!({
                "type": signal.signal_type,
                "timestamp": signal.timestamp,
                "data": signal.data,
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are the personalization engine of a {domain} content site.
Infer what the visitor is looking for from their recent behavior and query.

Recent behavioral signals (most recent last, one JSON object per line):
{history}

Visitor query: "{query}"

Constraints to look for: {constraints_label}.
{custom_instructions}
{response_format}"#,
        domain = config.domain,
        constraints_label = config.constraints_label,
        custom_instructions = custom_instructions_block(config),
        response_format = response_format_block(),
    )
}

/// Generate the intent-analysis prompt for a session with zero history.
pub fn cold_start_analysis_prompt(query: &str, config: &ReasoningConfig) -> String {
    format!(
        r#"You are the personalization engine of a {domain} content site.
This visitor has no behavioral history yet. Infer intent from the query
text alone.

Visitor query: "{query}"

Constraints to look for: {constraints_label}.
{custom_instructions}
{response_format}"#,
        domain = config.domain,
        constraints_label = config.constraints_label,
        custom_instructions = custom_instructions_block(config),
        response_format = response_format_block(),
    )
}

fn custom_instructions_block(config: &ReasoningConfig) -> String {
    match config.custom_instructions.as_deref() {
        Some(instructions) if !instructions.trim().is_empty() => {
            format!("Additional domain rules:\n{instructions}\n")
        }
        _ => String::new(),
    }
}

fn response_format_block() -> &'static str {
    r#"Respond with valid JSON only, matching this shape:
{
  "intent": "short natural-language summary of what the visitor wants",
  "keywords": ["ordered", "search", "keywords"],
  "lifestyleVibe": "single-label abstraction of the visitor's style, or null",
  "constraints": ["inferred limiting factors"],
  "reasoning": "why you inferred this",
  "searchQuery": "the text to embed for similarity search",
  "confidence": 0.0
}
Confidence is a score from 0.0 to 1.0."#
}
