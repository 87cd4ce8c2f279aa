//! SQL DDL for the Reverie content store.
//!
//! Defines the `memories`, `collections`, `collection_members`, `memory_log`,
//! and `schema_meta` tables. All DDL uses `IF NOT EXISTS` for idempotent
//! initialization. This is the v1 layout; later columns arrive via
//! [`super::migrations`].

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Captured memories. metadata is the AiMetadata JSON, embedding is packed little-endian f32.
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL CHECK(type IN ('link','note','image','pdf')),
    content TEXT NOT NULL,
    media_payload TEXT,
    metadata TEXT NOT NULL,
    embedding BLOB NOT NULL DEFAULT x'',
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at);

-- Derived collections. Membership is a union and is never compacted.
CREATE TABLE IF NOT EXISTS collections (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS collection_members (
    collection_id TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    memory_id TEXT NOT NULL,
    added_at INTEGER NOT NULL,
    PRIMARY KEY (collection_id, memory_id)
);

-- Audit log
CREATE TABLE IF NOT EXISTS memory_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN ('create','update','link','resurface','delete')),
    memory_id TEXT NOT NULL,
    details TEXT,
    created_at INTEGER NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
