use anyhow::anyhow;
use domain::models::Embedding;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use shared::types::Result;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// What a document's chunks were built from: its extracted text and the
/// embedding model that vectorised them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStamp {
    pub content_hash: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
}

/// SQLite-backed chunk store living in the engine's working directory.
pub struct EmbeddingStorage {
    conn: Mutex<Connection>,
}

impl EmbeddingStorage {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::setup_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn setup_db(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                doc_id TEXT NOT NULL,
                text TEXT NOT NULL,
                vector BLOB NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chunks_doc ON chunks(doc_id);
            CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL,
                hash TEXT NOT NULL,
                chunk_count INTEGER NOT NULL,
                embedding_model TEXT NOT NULL DEFAULT '',
                embedding_dim INTEGER NOT NULL DEFAULT 0
            );
        ",
        )?;
        Self::migrate(conn)
    }

    /// Stores created before documents carried their embedding model get the
    /// columns added; their rows never match a stamp and are re-indexed.
    fn migrate(conn: &Connection) -> SqlResult<()> {
        let mut stmt = conn.prepare("PRAGMA table_info(documents)")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<SqlResult<Vec<_>>>()?;
        if !columns.iter().any(|c| c == "embedding_model") {
            conn.execute_batch(
                "ALTER TABLE documents ADD COLUMN embedding_model TEXT NOT NULL DEFAULT '';
                 ALTER TABLE documents ADD COLUMN embedding_dim INTEGER NOT NULL DEFAULT 0;",
            )?;
        }
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("embedding store lock poisoned"))
    }

    /// Replace a document's chunks and record its stamp in one transaction.
    pub fn replace_document(
        &self,
        doc_id: &str,
        file_path: &str,
        stamp: &IndexStamp,
        embeddings: &[Embedding],
    ) -> Result<()> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM chunks WHERE doc_id = ?1", params![doc_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO chunks (id, doc_id, text, vector) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for embedding in embeddings {
                let vector_bytes = serde_json::to_vec(&embedding.vector)?;
                stmt.execute(params![
                    embedding.id,
                    embedding.doc_id,
                    embedding.text,
                    vector_bytes
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO documents
                (doc_id, file_path, hash, chunk_count, embedding_model, embedding_dim)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                doc_id,
                file_path,
                stamp.content_hash,
                embeddings.len() as i64,
                stamp.embedding_model,
                stamp.embedding_dim as i64
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_all_embeddings(&self) -> Result<Vec<Embedding>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, doc_id, text, vector FROM chunks ORDER BY rowid")?;
        let mut rows = stmt.query([])?;
        let mut embeddings = Vec::new();
        while let Some(row) = rows.next()? {
            let vector_bytes: Vec<u8> = row.get(3)?;
            embeddings.push(Embedding {
                id: row.get(0)?,
                doc_id: row.get(1)?,
                text: row.get(2)?,
                vector: serde_json::from_slice(&vector_bytes)?,
            });
        }
        Ok(embeddings)
    }

    pub fn get_index_stamp(&self, doc_id: &str) -> Result<Option<IndexStamp>> {
        let conn = self.conn()?;
        let stamp = conn
            .query_row(
                "SELECT hash, embedding_model, embedding_dim FROM documents WHERE doc_id = ?1",
                params![doc_id],
                |row| {
                    Ok(IndexStamp {
                        content_hash: row.get(0)?,
                        embedding_model: row.get(1)?,
                        embedding_dim: row.get::<_, i64>(2)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(stamp)
    }

    /// Documents indexed with a model or dimension other than the given one.
    pub fn foreign_document_count(&self, embedding_model: &str, embedding_dim: usize) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE embedding_model != ?1 OR embedding_dim != ?2",
            params![embedding_model, embedding_dim as i64],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn chunk_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
