use libsql::Connection;

use crate::error::Result;

/// Idempotent schema init. The embedding column width comes from the
/// configured embedding dimensionality; all content rows are pre-embedded
/// at that width.
pub async fn init_schema(conn: &Connection, dimensions: usize) -> Result<()> {
    conn.execute_batch(&format!(
        r#"
        -- Behavioral signals, one row per tracked event
        CREATE TABLE IF NOT EXISTS signals (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            signal_type TEXT NOT NULL,
            target_id TEXT,
            metadata TEXT DEFAULT '{{}}',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_signals_session_id ON signals(session_id);
        CREATE INDEX IF NOT EXISTS idx_signals_target_id ON signals(target_id);

        -- Published content with pre-computed embeddings
        CREATE TABLE IF NOT EXISTS content (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            excerpt TEXT,
            category TEXT,
            tags TEXT DEFAULT '[]',
            metadata TEXT DEFAULT '{{}}',
            embedding F32_BLOB({dimensions}),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_content_category ON content(category);
        "#
    ))
    .await?;

    Ok(())
}
