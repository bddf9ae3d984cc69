//! SQLite persistence over `tokio-rusqlite`.
//!
//! Layout matches the downstream consumers' expectations:
//!
//! ```sql
//! docs(id INTEGER PRIMARY KEY, value TEXT, embeddings BLOB)
//! subdocs(id INTEGER PRIMARY KEY, doc_id INTEGER, value TEXT,
//!         embeddings BLOB, chunk_idx INTEGER)
//! ```
//!
//! Embedding columns hold JSON float arrays (see the codec in
//! [`crate::stores`]). The connection is owned by a single logical writer;
//! cloning the store shares the same background connection thread.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use super::{DocStore, StoredChunk, StoredDocument, decode_embedding, encode_embedding};
use crate::types::WikivecError;

/// SQLite-backed [`DocStore`].
#[derive(Clone)]
pub struct SqliteDocStore {
    conn: Connection,
}

impl SqliteDocStore {
    /// Opens (or creates) a database file and ensures the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, WikivecError> {
        let conn = Connection::open(path.as_ref().to_path_buf())
            .await
            .map_err(|err| WikivecError::Storage(err.to_string()))?;
        let store = Self { conn };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Opens an in-memory database, mainly for tests.
    pub async fn open_in_memory() -> Result<Self, WikivecError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| WikivecError::Storage(err.to_string()))?;
        let store = Self { conn };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), WikivecError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS docs (
                         id INTEGER PRIMARY KEY,
                         value TEXT,
                         embeddings BLOB
                     );
                     CREATE TABLE IF NOT EXISTS subdocs (
                         id INTEGER PRIMARY KEY,
                         doc_id INTEGER,
                         value TEXT,
                         embeddings BLOB,
                         chunk_idx INTEGER
                     );",
                )
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| WikivecError::Storage(err.to_string()))
    }

    /// All document rows in id order.
    pub async fn fetch_documents(&self) -> Result<Vec<StoredDocument>, WikivecError> {
        let rows: Vec<(i64, String, Option<String>)> = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id, value, embeddings FROM docs ORDER BY id")?;
                let mapped = stmt.query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get::<_, Option<String>>(2)?))
                })?;
                let mut out = Vec::new();
                for row in mapped {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| WikivecError::Storage(err.to_string()))?;

        let mut documents = Vec::with_capacity(rows.len());
        for (id, title, raw) in rows {
            let embedding = raw.as_deref().map(decode_embedding).transpose()?;
            documents.push(StoredDocument {
                id,
                title,
                embedding,
            });
        }
        Ok(documents)
    }

    /// Chunk rows of one document, in chunk-index order.
    pub async fn fetch_chunks(&self, doc_id: i64) -> Result<Vec<StoredChunk>, WikivecError> {
        let rows: Vec<(i64, i64, String, String, i64)> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, doc_id, value, embeddings, chunk_idx
                     FROM subdocs WHERE doc_id = ?1 ORDER BY chunk_idx",
                )?;
                let mapped = stmt.query_map([doc_id], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })?;
                let mut out = Vec::new();
                for row in mapped {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| WikivecError::Storage(err.to_string()))?;

        let mut chunks = Vec::with_capacity(rows.len());
        for (id, doc_id, text, raw, chunk_idx) in rows {
            chunks.push(StoredChunk {
                id,
                doc_id,
                text,
                embedding: decode_embedding(&raw)?,
                chunk_index: chunk_idx as usize,
            });
        }
        Ok(chunks)
    }

    pub async fn count_documents(&self) -> Result<usize, WikivecError> {
        self.count("SELECT COUNT(*) FROM docs").await
    }

    pub async fn count_chunks(&self) -> Result<usize, WikivecError> {
        self.count("SELECT COUNT(*) FROM subdocs").await
    }

    async fn count(&self, sql: &'static str) -> Result<usize, WikivecError> {
        self.conn
            .call(move |conn| {
                let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| WikivecError::Storage(err.to_string()))
    }
}

#[async_trait]
impl DocStore for SqliteDocStore {
    async fn create_document(&self, title: &str) -> Result<i64, WikivecError> {
        let title = title.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("INSERT INTO docs (value) VALUES (?1)", [&title])?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| WikivecError::Storage(err.to_string()))
    }

    async fn append_chunk(
        &self,
        doc_id: i64,
        text: &str,
        embedding: &[f32],
        chunk_index: usize,
    ) -> Result<(), WikivecError> {
        let text = text.to_string();
        let encoded = encode_embedding(embedding)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO subdocs (doc_id, value, embeddings, chunk_idx)
                     VALUES (?1, ?2, ?3, ?4)",
                    (doc_id, text, encoded, chunk_index as i64),
                )?;
                Ok(())
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| WikivecError::Storage(err.to_string()))
    }

    async fn set_document_embedding(
        &self,
        doc_id: i64,
        embedding: &[f32],
    ) -> Result<(), WikivecError> {
        let encoded = encode_embedding(embedding)?;
        let updated = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE docs SET embeddings = ?1 WHERE id = ?2",
                    (encoded, doc_id),
                )
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| WikivecError::Storage(err.to_string()))?;
        if updated == 0 {
            return Err(WikivecError::Storage(format!(
                "document {doc_id} does not exist"
            )));
        }
        Ok(())
    }

    /// One transaction per document: a failure anywhere rolls back the
    /// document row, every chunk, and the embedding write-back together.
    async fn persist_document(
        &self,
        title: &str,
        chunks: &[(String, Vec<f32>)],
        mean_embedding: Option<&[f32]>,
    ) -> Result<i64, WikivecError> {
        let title = title.to_string();
        let mut encoded_chunks = Vec::with_capacity(chunks.len());
        for (text, embedding) in chunks {
            encoded_chunks.push((text.clone(), encode_embedding(embedding)?));
        }
        let encoded_mean = mean_embedding.map(encode_embedding).transpose()?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("INSERT INTO docs (value) VALUES (?1)", [&title])?;
                let doc_id = tx.last_insert_rowid();
                for (index, (text, encoded)) in encoded_chunks.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO subdocs (doc_id, value, embeddings, chunk_idx)
                         VALUES (?1, ?2, ?3, ?4)",
                        (doc_id, text, encoded, index as i64),
                    )?;
                }
                if let Some(encoded) = &encoded_mean {
                    tx.execute(
                        "UPDATE docs SET embeddings = ?1 WHERE id = ?2",
                        (encoded, doc_id),
                    )?;
                }
                tx.commit()?;
                Ok(doc_id)
            })
            .await
            .map_err(|err: tokio_rusqlite::Error| WikivecError::Storage(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn document_lifecycle_round_trips() {
        let store = SqliteDocStore::open_in_memory().await.unwrap();

        let doc_id = store.create_document("Cat").await.unwrap();
        store
            .append_chunk(doc_id, "Cats are mammals.", &[0.1, 0.2], 0)
            .await
            .unwrap();
        store
            .append_chunk(doc_id, "Cats purr.", &[0.3, 0.4], 1)
            .await
            .unwrap();
        store
            .set_document_embedding(doc_id, &[0.2, 0.3])
            .await
            .unwrap();

        let docs = store.fetch_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Cat");
        let mean = docs[0].embedding.as_ref().unwrap();
        assert!((mean[0] - 0.2).abs() < 1e-6);

        let chunks = store.fetch_chunks(doc_id).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[0].text, "Cats are mammals.");
    }

    #[tokio::test]
    async fn document_without_embedding_reads_back_as_none() {
        let store = SqliteDocStore::open_in_memory().await.unwrap();
        store.create_document("Empty").await.unwrap();

        let docs = store.fetch_documents().await.unwrap();
        assert_eq!(docs[0].embedding, None);
    }

    #[tokio::test]
    async fn persist_document_writes_everything_at_once() {
        let store = SqliteDocStore::open_in_memory().await.unwrap();
        let chunks = vec![
            ("First chunk.".to_string(), vec![1.0f32, 0.0]),
            ("Second chunk.".to_string(), vec![0.0f32, 1.0]),
        ];

        let doc_id = store
            .persist_document("Dog", &chunks, Some(&[0.5, 0.5]))
            .await
            .unwrap();

        assert_eq!(store.count_documents().await.unwrap(), 1);
        assert_eq!(store.count_chunks().await.unwrap(), 2);

        let stored = store.fetch_chunks(doc_id).await.unwrap();
        assert_eq!(stored[0].text, "First chunk.");
        assert_eq!(stored[1].embedding, vec![0.0, 1.0]);

        let docs = store.fetch_documents().await.unwrap();
        assert_eq!(docs[0].embedding, Some(vec![0.5, 0.5]));
    }

    #[tokio::test]
    async fn embedding_writeback_to_missing_document_fails() {
        let store = SqliteDocStore::open_in_memory().await.unwrap();
        let err = store
            .set_document_embedding(9999, &[0.1])
            .await
            .unwrap_err();
        assert!(matches!(err, WikivecError::Storage(_)));
    }
}
