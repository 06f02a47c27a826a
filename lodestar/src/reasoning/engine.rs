use crate::config::ReasoningConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::models::{AnalysisMode, IntentAnalysis, RawIntentAnalysis, Signal};

/// Embedded when a fallback is triggered by an empty query.
const FALLBACK_SEED_QUERY: &str = "travel";

/// Turns (query, signal history) into an `IntentAnalysis`, and never fails
/// the caller: any model or embedding failure degrades to a low-confidence
/// fallback built from the raw query.
pub struct ReasoningEngine {
    llm: LlmProvider,
    embeddings: EmbeddingProvider,
    config: ReasoningConfig,
}

impl ReasoningEngine {
    pub fn new(llm: LlmProvider, embeddings: EmbeddingProvider, config: ReasoningConfig) -> Self {
        Self {
            llm,
            embeddings,
            config,
        }
    }

    pub async fn analyze(&self, query: &str, signals: &[Signal]) -> IntentAnalysis {
        match self.try_analyze(query, signals).await {
            Ok(analysis) => analysis,
            Err(error) => {
                tracing::warn!(error = %error, "Intent analysis failed, using fallback");
                self.fallback(query).await
            }
        }
    }

    async fn try_analyze(&self, query: &str, signals: &[Signal]) -> Result<IntentAnalysis> {
        let mode = AnalysisMode::for_signals(signals);

        let prompt = match mode {
            AnalysisMode::ColdStart => prompts::cold_start_analysis_prompt(query, &self.config),
            AnalysisMode::Contextual => {
                // Only the most recent window: bounds prompt size and biases
                // toward current intent.
                let start = signals.len().saturating_sub(self.config.history_window);
                prompts::contextual_analysis_prompt(query, &signals[start..], &self.config)
            }
        };

        tracing::debug!(%mode, signal_count = signals.len(), "Running intent analysis");

        let options = CompletionOptions {
            temperature: Some(0.2),
            max_tokens: None,
        };
        let raw: RawIntentAnalysis = self.llm.complete_structured(&prompt, Some(&options)).await?;
        raw.validate().map_err(Error::Llm)?;

        let vector = self.embeddings.embed_query(&raw.embeddable_text()).await?;
        Ok(raw.into_analysis(vector))
    }

    /// Best-effort analysis from the raw query alone. When even the
    /// fallback embed fails, the vector stays empty and downstream search
    /// is skipped.
    async fn fallback(&self, query: &str) -> IntentAnalysis {
        let seed = if query.trim().is_empty() {
            FALLBACK_SEED_QUERY
        } else {
            query
        };

        let search_vector = match self.embeddings.embed_query(seed).await {
            Ok(vector) => vector,
            Err(error) => {
                tracing::warn!(error = %error, "Fallback embedding failed, returning empty vector");
                Vec::new()
            }
        };

        IntentAnalysis {
            intent: "Fallback Search".to_string(),
            keywords: vec![query.to_string()],
            lifestyle_vibe: None,
            constraints: Vec::new(),
            reasoning: "The reasoning engine was unavailable, so results come from a raw-text \
                        search on the original query."
                .to_string(),
            search_query: Some(seed.to_string()),
            confidence: 0.1,
            search_vector,
        }
    }
}
