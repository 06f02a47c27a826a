use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::memory::MemoryAdapter;
use crate::models::{Metadata, RecommendationResult, ScoredContent, Signal};
use crate::reasoning::ReasoningEngine;
use crate::signals::SignalLog;

/// The SDK facade: one instance per hosting context, holding the session's
/// signal log and references to the reasoning layer and the injected
/// memory adapter. Exposes exactly two operations, `track` and
/// `get_recommendations`.
pub struct RecommendationClient {
    signals: SignalLog,
    reasoning: ReasoningEngine,
    adapter: Arc<dyn MemoryAdapter>,
    search_limit: u32,
}

impl RecommendationClient {
    /// Construct the facade. Malformed configuration (a missing API key)
    /// is the only failure this subsystem surfaces as an error; everything
    /// at runtime degrades instead.
    pub fn new(config: ClientConfig, adapter: Arc<dyn MemoryAdapter>) -> Result<Self> {
        config.validate()?;

        let llm = LlmProvider::new(&config.llm, &config.api_key)?;
        let embeddings = EmbeddingProvider::new(&config.embeddings, &config.api_key)?;
        let reasoning = ReasoningEngine::new(llm, embeddings, config.reasoning.clone());
        let signals = SignalLog::new(Arc::clone(&adapter));

        if config.debug {
            tracing::info!(
                session_id = signals.session_id(),
                domain = %config.reasoning.domain,
                "Lodestar personalization client initialized"
            );
        }

        Ok(Self {
            signals,
            reasoning,
            adapter,
            search_limit: config.retrieval.limit,
        })
    }

    /// Record one behavioral event. Appends to the session buffer
    /// synchronously and persists in the background; a lost write is
    /// logged and accepted, never surfaced.
    pub fn track(&self, event_type: &str, metadata: Metadata) -> Signal {
        self.signals.track(event_type, metadata)
    }

    /// Infer intent from the session history plus an optional free-text
    /// query, run a vector search over the content store, and fuse the
    /// hits with their similarity scores. Always returns a full result:
    /// degraded quality shows up as low confidence or empty content, never
    /// as an error.
    pub async fn get_recommendations(&self, query: Option<&str>) -> RecommendationResult {
        let query = query.unwrap_or_default();
        let signals = self.signals.session_signals();

        let analysis = self.reasoning.analyze(query, &signals).await;

        // Empty vector means even the fallback embed failed; skip search.
        if analysis.search_vector.is_empty() {
            return RecommendationResult {
                analysis,
                content: Vec::new(),
            };
        }

        let matches = self
            .adapter
            .search_vectors(&analysis.search_vector, self.search_limit)
            .await;
        if matches.is_empty() {
            return RecommendationResult {
                analysis,
                content: Vec::new(),
            };
        }

        let ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();
        let items = self.adapter.get_content_by_ids(&ids).await;

        let scores: HashMap<&str, f32> = matches
            .iter()
            .map(|m| (m.id.as_str(), m.similarity))
            .collect();

        let mut content: Vec<ScoredContent> = items
            .into_iter()
            .map(|item| {
                let match_score = scores.get(item.id.as_str()).copied().unwrap_or(0.0);
                ScoredContent { item, match_score }
            })
            .collect();
        content.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        RecommendationResult { analysis, content }
    }

    pub fn session_id(&self) -> &str {
        self.signals.session_id()
    }
}
