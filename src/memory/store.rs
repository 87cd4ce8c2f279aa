//! Content store: durable storage of memory records and collections.
//!
//! [`MemoryStore`] is the seam the engine writes through; [`SqliteStore`] is
//! the implementation backed by the database in [`crate::db`]. A `put`
//! upserts the record and unions its id into the collection named by its
//! metadata, inside one transaction, and writes an audit log entry.

use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::memory::types::{AiMetadata, Collection, MemoryKind, MemoryRecord};

/// Errors raised by a [`MemoryStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("memory not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt metadata for memory {id}: {source}")]
    CorruptMetadata {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Why a record is being written; decides the audit log operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    /// Logged as `create` or `update` depending on whether the id existed.
    Upsert,
    /// A back-link was appended to `related_memory_ids`.
    Link,
    /// Resurfacing bookkeeping was stamped.
    Resurface,
}

/// Durable storage for memories and their derived collections.
pub trait MemoryStore: Send {
    /// Every record, newest first.
    fn get_all(&self) -> Result<Vec<MemoryRecord>, StoreError>;

    /// A single record by id.
    fn get(&self, id: &str) -> Result<Option<MemoryRecord>, StoreError>;

    /// Insert or replace a record, add it to its collection, and log `op`.
    fn write(&self, record: &MemoryRecord, op: WriteOp) -> Result<(), StoreError>;

    /// [`MemoryStore::write`] logged as a plain create or update.
    fn put(&self, record: &MemoryRecord) -> Result<(), StoreError> {
        self.write(record, WriteOp::Upsert)
    }

    /// Remove a record. Returns `false` if it did not exist.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Records that are members of the named collection, newest first.
    fn get_by_collection_name(&self, name: &str) -> Result<Vec<MemoryRecord>, StoreError>;

    /// All collections, oldest first.
    fn collections(&self) -> Result<Vec<Collection>, StoreError>;
}

/// SQLite-backed [`MemoryStore`].
pub struct SqliteStore {
    conn: Connection,
}

const SELECT_COLUMNS: &str = "m.id, m.type, m.content, m.media_payload, m.metadata, m.embedding, \
     m.created_at, m.last_resurfaced, m.resurface_count";

impl SqliteStore {
    /// Wrap a connection that already has the schema and migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open the database at `path` (see [`crate::db::open_database`]).
    pub fn open(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_database(path)?))
    }

    /// Fresh in-memory store, used by tests and dry runs.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_memory_database()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRecord::into_record).collect()
    }
}

impl MemoryStore for SqliteStore {
    fn get_all(&self) -> Result<Vec<MemoryRecord>, StoreError> {
        self.query_records(
            &format!("SELECT {SELECT_COLUMNS} FROM memories m ORDER BY m.created_at DESC, m.id DESC"),
            [],
        )
    }

    fn get(&self, id: &str) -> Result<Option<MemoryRecord>, StoreError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM memories m WHERE m.id = ?1"),
                params![id],
                read_row,
            )
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    fn write(&self, record: &MemoryRecord, op: WriteOp) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(&record.metadata).map_err(|source| {
            StoreError::CorruptMetadata {
                id: record.id.clone(),
                source,
            }
        })?;
        let now = crate::memory::types::now_ms();

        let tx = self.conn.unchecked_transaction()?;

        let existed: bool = tx.query_row(
            "SELECT COUNT(*) > 0 FROM memories WHERE id = ?1",
            params![record.id],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO memories (id, type, content, media_payload, metadata, embedding, created_at, \
             last_resurfaced, resurface_count) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(id) DO UPDATE SET type = excluded.type, content = excluded.content, \
             media_payload = excluded.media_payload, metadata = excluded.metadata, \
             embedding = excluded.embedding, created_at = excluded.created_at, \
             last_resurfaced = excluded.last_resurfaced, resurface_count = excluded.resurface_count",
            params![
                record.id,
                record.kind.as_str(),
                record.content,
                record.media_payload,
                metadata,
                embedding_to_bytes(&record.embedding),
                record.created_at,
                record.last_resurfaced,
                record.resurface_count,
            ],
        )?;

        let collection = record.metadata.collection_name();
        tx.execute(
            "INSERT OR IGNORE INTO collections (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![uuid::Uuid::now_v7().to_string(), collection, now],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO collection_members (collection_id, memory_id, added_at) \
             SELECT id, ?2, ?3 FROM collections WHERE name = ?1",
            params![collection, record.id, now],
        )?;

        write_audit_log(
            &tx,
            match op {
                WriteOp::Upsert if existed => "update",
                WriteOp::Upsert => "create",
                WriteOp::Link => "link",
                WriteOp::Resurface => "resurface",
            },
            &record.id,
            Some(&serde_json::json!({ "collection": collection })),
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM memories WHERE id = ?1", params![id])?;
        if removed > 0 {
            write_audit_log(&tx, "delete", id, None)?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    fn get_by_collection_name(&self, name: &str) -> Result<Vec<MemoryRecord>, StoreError> {
        self.query_records(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM memories m \
                 JOIN collection_members cm ON cm.memory_id = m.id \
                 JOIN collections c ON c.id = cm.collection_id \
                 WHERE c.name = ?1 ORDER BY m.created_at DESC, m.id DESC"
            ),
            params![name],
        )
    }

    fn collections(&self) -> Result<Vec<Collection>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM collections ORDER BY created_at, name")?;
        let heads = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut members = self.conn.prepare(
            "SELECT memory_id FROM collection_members WHERE collection_id = ?1 \
             ORDER BY added_at, memory_id",
        )?;

        heads
            .into_iter()
            .map(|(id, name, created_at)| -> Result<Collection, StoreError> {
                let memory_ids = members
                    .query_map(params![id], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Collection {
                    id,
                    name,
                    memory_ids,
                    created_at,
                })
            })
            .collect()
    }
}

/// Row as read from SQLite, before metadata JSON and embedding bytes are decoded.
struct RawRecord {
    id: String,
    kind: String,
    content: String,
    media_payload: Option<String>,
    metadata: String,
    embedding: Vec<u8>,
    created_at: i64,
    last_resurfaced: Option<i64>,
    resurface_count: u32,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get(0)?,
        kind: row.get(1)?,
        content: row.get(2)?,
        media_payload: row.get(3)?,
        metadata: row.get(4)?,
        embedding: row.get(5)?,
        created_at: row.get(6)?,
        last_resurfaced: row.get(7)?,
        resurface_count: row.get(8)?,
    })
}

impl RawRecord {
    fn into_record(self) -> Result<MemoryRecord, StoreError> {
        let kind: MemoryKind = self.kind.parse().map_err(StoreError::Other)?;
        let metadata: AiMetadata =
            serde_json::from_str(&self.metadata).map_err(|source| StoreError::CorruptMetadata {
                id: self.id.clone(),
                source,
            })?;
        Ok(MemoryRecord {
            id: self.id,
            kind,
            content: self.content,
            media_payload: self.media_payload,
            metadata,
            embedding: embedding_from_bytes(&self.embedding),
            created_at: self.created_at,
            last_resurfaced: self.last_resurfaced,
            resurface_count: self.resurface_count,
        })
    }
}

/// Pack an embedding as little-endian f32 bytes.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Inverse of [`embedding_to_bytes`]. Trailing partial chunks are dropped.
pub fn embedding_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Write an entry to the memory_log audit table.
pub(crate) fn write_audit_log(
    conn: &Connection,
    operation: &str,
    memory_id: &str,
    details: Option<&serde_json::Value>,
) -> rusqlite::Result<()> {
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO memory_log (operation, memory_id, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            operation,
            memory_id,
            details_json,
            crate::memory::types::now_ms()
        ],
    )?;
    Ok(())
}
