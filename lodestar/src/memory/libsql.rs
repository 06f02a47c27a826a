use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params_from_iter;
use nanoid::nanoid;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::memory::connection::Database;
use crate::memory::traits::MemoryAdapter;
use crate::models::{ContentItem, Metadata, Signal, TARGET_ID_KEYS, VectorMatch};

/// Rows per INSERT statement when persisting a signal batch.
const INSERT_CHUNK_SIZE: usize = 50;

/// Reference `MemoryAdapter` over a libsql content store.
///
/// Maps the SDK's signal shape onto the store's row shape
/// (`session_id`, `signal_type`, `metadata`, with any `targetId`/`postId`
/// lifted out of the payload into the `target_id` column) and implements
/// similarity search with libsql's `vector_distance_cos`. The similarity
/// cutoff is adapter-owned deployment configuration
/// (`RetrievalConfig::threshold`); the facade only passes the limit.
pub struct LibSqlMemoryAdapter {
    db: Database,
    threshold: f32,
}

impl LibSqlMemoryAdapter {
    /// Threshold comes from `RetrievalConfig::default()`, so
    /// `LODESTAR_SEARCH_THRESHOLD` is honored without extra wiring.
    pub fn new(db: Database) -> Self {
        Self::with_config(db, &RetrievalConfig::default())
    }

    pub fn with_config(db: Database, retrieval: &RetrievalConfig) -> Self {
        Self::with_threshold(db, retrieval.threshold)
    }

    pub fn with_threshold(db: Database, threshold: f32) -> Self {
        Self { db, threshold }
    }

    /// Insert or replace one content row with its pre-computed embedding.
    /// Used by editorial ingestion and test seeding; not part of the
    /// `MemoryAdapter` contract.
    pub async fn save_content(&self, item: &ContentItem, embedding: &[f32]) -> Result<()> {
        let conn = self.db.connect()?;
        let embedding_json = serde_json::to_string(embedding)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO content (
                id, title, excerpt, category, tags, metadata, embedding, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, vector32(?7), ?8, ?9)
            "#,
            libsql::params![
                item.id.clone(),
                item.title.clone(),
                item.excerpt.clone(),
                item.category.clone(),
                serde_json::to_string(&item.tags)?,
                serde_json::to_string(&item.metadata)?,
                embedding_json,
                item.created_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn try_save_signals(&self, signals: &[Signal]) -> Result<()> {
        let conn = self.db.connect()?;

        for chunk in signals.chunks(INSERT_CHUNK_SIZE) {
            let mut placeholders = Vec::with_capacity(chunk.len());
            let mut values: Vec<libsql::Value> = Vec::with_capacity(chunk.len() * 6);

            for (row, signal) in chunk.iter().enumerate() {
                let base = row * 6;
                placeholders.push(format!(
                    "(?{}, ?{}, ?{}, ?{}, ?{}, ?{})",
                    base + 1,
                    base + 2,
                    base + 3,
                    base + 4,
                    base + 5,
                    base + 6
                ));

                let (target_id, metadata) = split_target_id(signal);
                values.push(libsql::Value::from(nanoid!()));
                values.push(libsql::Value::from(signal.session_id.clone()));
                values.push(libsql::Value::from(signal.signal_type.clone()));
                values.push(match target_id {
                    Some(id) => libsql::Value::from(id),
                    None => libsql::Value::Null,
                });
                values.push(libsql::Value::from(serde_json::to_string(&metadata)?));
                values.push(libsql::Value::from(signal.timestamp.to_rfc3339()));
            }

            let sql = format!(
                "INSERT INTO signals (id, session_id, signal_type, target_id, metadata, created_at) VALUES {}",
                placeholders.join(", ")
            );
            conn.execute(&sql, params_from_iter(values)).await?;
        }

        Ok(())
    }

    async fn try_search_vectors(&self, vector: &[f32], limit: u32) -> Result<Vec<VectorMatch>> {
        let conn = self.db.connect()?;
        let vector_json = serde_json::to_string(vector)?;

        let mut rows = conn
            .query(
                r#"
                SELECT
                    id,
                    1 - vector_distance_cos(embedding, vector32(?1)) AS similarity
                FROM content
                WHERE embedding IS NOT NULL
                  AND (1 - vector_distance_cos(embedding, vector32(?1))) >= ?2
                ORDER BY similarity DESC
                LIMIT ?3
                "#,
                libsql::params![vector_json, self.threshold as f64, limit],
            )
            .await?;

        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            matches.push(VectorMatch {
                id: row.get(0)?,
                similarity: row.get::<f64>(1)? as f32,
            });
        }

        Ok(matches)
    }

    async fn try_get_content_by_ids(&self, ids: &[String]) -> Result<Vec<ContentItem>> {
        let conn = self.db.connect()?;

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT id, title, excerpt, category, tags, metadata, created_at \
             FROM content WHERE id IN ({placeholders})"
        );

        let params = ids.iter().cloned().map(libsql::Value::from);
        let mut rows = conn.query(&sql, params_from_iter(params)).await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            let created_at_raw: String = row.get(6)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
                .map_err(|e| Error::Validation(format!("Bad content timestamp: {e}")))?
                .with_timezone(&Utc);

            items.push(ContentItem {
                id: row.get(0)?,
                title: row.get(1)?,
                excerpt: row.get(2)?,
                category: row.get(3)?,
                tags: serde_json::from_str(&row.get::<String>(4)?).unwrap_or_default(),
                metadata: serde_json::from_str(&row.get::<String>(5)?).unwrap_or_default(),
                created_at,
            });
        }

        Ok(items)
    }
}

#[async_trait]
impl MemoryAdapter for LibSqlMemoryAdapter {
    async fn save_signal(&self, signal: &Signal) {
        self.save_signals(std::slice::from_ref(signal)).await;
    }

    async fn save_signals(&self, signals: &[Signal]) {
        if signals.is_empty() {
            return;
        }
        if let Err(error) = self.try_save_signals(signals).await {
            tracing::warn!(count = signals.len(), error = %error, "Dropping signal batch: persistence failed");
        }
    }

    async fn search_vectors(&self, vector: &[f32], limit: u32) -> Vec<VectorMatch> {
        match self.try_search_vectors(vector, limit).await {
            Ok(matches) => matches,
            Err(error) => {
                tracing::error!(error = %error, "Vector search failed, returning no matches");
                Vec::new()
            }
        }
    }

    async fn get_content_by_ids(&self, ids: &[String]) -> Vec<ContentItem> {
        if ids.is_empty() {
            return Vec::new();
        }
        match self.try_get_content_by_ids(ids).await {
            Ok(items) => items,
            Err(error) => {
                tracing::error!(error = %error, "Content hydration failed, returning no rows");
                Vec::new()
            }
        }
    }
}

/// Lift the attributed content id (per `Signal::target_id`) out of the
/// payload, leaving the rest as the stored metadata.
fn split_target_id(signal: &Signal) -> (Option<String>, Metadata) {
    let target = signal.target_id().map(String::from);
    let mut metadata = signal.data.clone();

    if target.is_some() {
        for key in TARGET_ID_KEYS {
            if metadata.get(key).and_then(|v| v.as_str()).is_some() {
                metadata.remove(key);
                break;
            }
        }
    }

    (target, metadata)
}
