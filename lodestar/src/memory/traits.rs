use async_trait::async_trait;

use crate::models::{ContentItem, Signal, VectorMatch};

/// The pluggable storage capability boundary: persist behavioral signals,
/// run a similarity search over embeddings, fetch content rows by id.
///
/// Contract: none of these operations fails past the adapter boundary.
/// Every failure degrades to a no-op or an empty result, so the layers
/// above apply uniform fallback logic without adapter-specific error
/// handling. Implementations log their own failures.
///
/// Adapters hold no per-session state (each signal carries its session id),
/// so one instance may be shared across many client facades.
#[async_trait]
pub trait MemoryAdapter: Send + Sync {
    /// Persist one signal. Best-effort: a lost write is logged, never
    /// surfaced.
    async fn save_signal(&self, signal: &Signal);

    /// Persist a batch of signals in one insert. Same best-effort policy.
    async fn save_signals(&self, signals: &[Signal]);

    /// Top-`limit` content ids by similarity to `vector`, descending.
    /// Empty on failure.
    async fn search_vectors(&self, vector: &[f32], limit: u32) -> Vec<VectorMatch>;

    /// Hydrate content rows for the given ids. Empty input is a no-op;
    /// empty on failure.
    async fn get_content_by_ids(&self, ids: &[String]) -> Vec<ContentItem>;
}
