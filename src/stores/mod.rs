//! Storage backends for documents and their chunks.
//!
//! The [`DocStore`] trait is the pipeline's persistence seam. Embeddings are
//! serialized as JSON float arrays so the stored form stays readable by any
//! downstream consumer regardless of language.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::WikivecError;

pub use sqlite::SqliteDocStore;

/// A persisted document row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: i64,
    pub title: String,
    /// Mean-pooled document vector; `None` until (and unless) the aggregate
    /// write-back happened.
    pub embedding: Option<Vec<f32>>,
}

/// A persisted chunk row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: i64,
    pub doc_id: i64,
    pub text: String,
    pub embedding: Vec<f32>,
    pub chunk_index: usize,
}

/// Serializes an embedding to its stored JSON form.
pub fn encode_embedding(vector: &[f32]) -> Result<String, WikivecError> {
    Ok(serde_json::to_string(vector)?)
}

/// Parses an embedding back from its stored JSON form.
pub fn decode_embedding(raw: &str) -> Result<Vec<f32>, WikivecError> {
    Ok(serde_json::from_str(raw)?)
}

/// Persistence operations invoked once per accepted page.
///
/// `create_document`, `append_chunk` and `set_document_embedding` are the
/// row-level primitives; [`persist_document`](DocStore::persist_document)
/// writes a whole document in one go and is atomic where the backend
/// supports transactions.
#[async_trait]
pub trait DocStore: Send + Sync {
    /// Appends a document row with no embedding yet, returning its id.
    async fn create_document(&self, title: &str) -> Result<i64, WikivecError>;

    /// Appends one chunk row for the given document.
    async fn append_chunk(
        &self,
        doc_id: i64,
        text: &str,
        embedding: &[f32],
        chunk_index: usize,
    ) -> Result<(), WikivecError>;

    /// Writes the aggregate vector onto an existing document row.
    async fn set_document_embedding(
        &self,
        doc_id: i64,
        embedding: &[f32],
    ) -> Result<(), WikivecError>;

    /// Writes a document, its chunks, and the aggregate embedding together.
    ///
    /// The default implementation issues the row-level primitives
    /// sequentially and stops at the first failure, leaving whatever was
    /// already written in place. Backends with transactions override this
    /// with an all-or-nothing version.
    async fn persist_document(
        &self,
        title: &str,
        chunks: &[(String, Vec<f32>)],
        mean_embedding: Option<&[f32]>,
    ) -> Result<i64, WikivecError> {
        let doc_id = self.create_document(title).await?;
        for (index, (text, embedding)) in chunks.iter().enumerate() {
            self.append_chunk(doc_id, text, embedding, index).await?;
        }
        if let Some(mean) = mean_embedding {
            self.set_document_embedding(doc_id, mean).await?;
        }
        Ok(doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_codec_round_trips_within_tolerance() {
        let original = vec![0.1f32, -2.5, 3.25e-7, 1234.5678, 0.0];
        let encoded = encode_embedding(&original).unwrap();
        let decoded = decode_embedding(&encoded).unwrap();

        assert_eq!(original.len(), decoded.len());
        for (a, b) in original.iter().zip(&decoded) {
            assert!((a - b).abs() < 1e-6, "{a} != {b}");
        }
    }

    #[test]
    fn decode_rejects_malformed_payloads() {
        assert!(decode_embedding("not json").is_err());
        assert!(decode_embedding("{\"a\": 1}").is_err());
    }
}
