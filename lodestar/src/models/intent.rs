use serde::{Deserialize, Serialize};

use crate::models::Signal;

/// Which prompt the reasoning layer builds for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Zero prior signals for the session: inference must come from the
    /// query text alone.
    ColdStart,
    /// Session history is present and biases the inference.
    Contextual,
}

impl AnalysisMode {
    pub fn for_signals(signals: &[Signal]) -> Self {
        if signals.is_empty() {
            Self::ColdStart
        } else {
            Self::Contextual
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColdStart => write!(f, "cold_start"),
            Self::Contextual => write!(f, "contextual"),
        }
    }
}

/// The reasoning layer's structured output.
///
/// Wire shape (what the completion model produces and what serializes back
/// out to hosts) is camelCase, matching the site's JS consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentAnalysis {
    /// Short natural-language summary of inferred intent.
    pub intent: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Single-label abstraction of user style, when one can be inferred.
    #[serde(default)]
    pub lifestyle_vibe: Option<String>,
    /// Inferred limiting factors (budget, party size, pace, ...).
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Human-readable justification. Always populated, even in fallback.
    pub reasoning: String,
    /// The text actually embedded, when the model proposed one.
    #[serde(default)]
    pub search_query: Option<String>,
    pub confidence: f32,
    #[serde(default)]
    pub search_vector: Vec<f32>,
}

/// `IntentAnalysis` as the completion model emits it: everything except the
/// vector, which the embedding step attaches afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIntentAnalysis {
    pub intent: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub lifestyle_vibe: Option<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub reasoning: String,
    #[serde(default)]
    pub search_query: Option<String>,
    pub confidence: f32,
}

impl RawIntentAnalysis {
    /// Semantic checks on top of serde's shape validation. A failure here
    /// is treated as a reasoning failure, not accepted output.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.intent.trim().is_empty() {
            return Err("model produced an empty intent".to_string());
        }
        if self.reasoning.trim().is_empty() {
            return Err("model produced an empty reasoning field".to_string());
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} outside [0,1]", self.confidence));
        }
        Ok(())
    }

    /// The text the embedding step uses: the explicit search query when the
    /// model produced one, otherwise intent + keywords.
    pub fn embeddable_text(&self) -> String {
        match self.search_query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => query.to_string(),
            _ => {
                let mut text = self.intent.clone();
                for keyword in &self.keywords {
                    text.push(' ');
                    text.push_str(keyword);
                }
                text
            }
        }
    }

    pub fn into_analysis(self, search_vector: Vec<f32>) -> IntentAnalysis {
        IntentAnalysis {
            intent: self.intent,
            keywords: self.keywords,
            lifestyle_vibe: self.lifestyle_vibe,
            constraints: self.constraints,
            reasoning: self.reasoning,
            search_query: self.search_query,
            confidence: self.confidence,
            search_vector,
        }
    }
}
