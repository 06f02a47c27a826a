use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{IntentAnalysis, Metadata};

/// One similarity hit from the store's vector search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    pub similarity: f32,
}

/// One content row as the store returns it. The embedding column is never
/// hydrated back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// A content row annotated with the similarity score it matched at.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredContent {
    #[serde(flatten)]
    pub item: ContentItem,
    pub match_score: f32,
}

/// What `get_recommendations` returns: the full intent analysis plus the
/// fused content list, sorted descending by match score.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResult {
    #[serde(flatten)]
    pub analysis: IntentAnalysis,
    pub content: Vec<ScoredContent>,
}
