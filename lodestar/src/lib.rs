//! Embeddable personalization SDK: tracks behavioral signals per session,
//! infers intent with an LLM, embeds the inferred query, and fuses vector
//! search hits over a host-provided content store into scored
//! recommendations.
//!
//! The host wires in a [`memory::MemoryAdapter`] (the bundled
//! [`memory::LibSqlMemoryAdapter`] or its own) and drives everything through
//! [`RecommendationClient`].

pub mod client;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod memory;
pub mod models;
pub mod reasoning;
pub mod signals;

pub use client::RecommendationClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use memory::{Database, LibSqlMemoryAdapter, MemoryAdapter};
pub use models::{
    AnalysisMode, ContentItem, IntentAnalysis, Metadata, RecommendationResult, ScoredContent,
    Signal, VectorMatch,
};
