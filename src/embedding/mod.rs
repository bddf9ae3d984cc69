//! Embedding provider boundary and vector aggregation.
//!
//! The model itself is an external collaborator: the pipeline only relies on
//! "batch of strings in, batch of fixed-length vectors out, same order".
//! Callers construct a provider once and inject it; nothing here is a
//! process-wide singleton.

use async_trait::async_trait;

use crate::types::WikivecError;

/// Maps a batch of texts to one fixed-dimension vector per text.
///
/// Implementations must preserve input order and keep dimensionality stable
/// across every call within a run. Batching and latency policy belong to the
/// implementation, not to callers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, WikivecError>;
}

/// Deterministic hash-derived embeddings for tests and offline demos.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dims: usize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self { dims: 8 }
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dims(dims: usize) -> Self {
        Self { dims }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    fn hash_to_vec(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dims)
            .map(|i| {
                let bits = seed.rotate_left((i as u32 % 64) * 8) ^ ((i as u64) << 24);
                (bits as f64 / u64::MAX as f64) as f32
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, WikivecError> {
        Ok(inputs.iter().map(|text| self.hash_to_vec(text)).collect())
    }
}

/// Element-wise arithmetic mean across chunk vectors.
///
/// Returns `None` for an empty input: a document with zero chunks never
/// receives an aggregate embedding.
pub fn mean_pool(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let mut acc = vec![0f64; first.len()];
    for vector in vectors {
        for (slot, value) in acc.iter_mut().zip(vector) {
            *slot += f64::from(*value);
        }
    }
    let n = vectors.len() as f64;
    Some(acc.into_iter().map(|sum| (sum / n) as f32).collect())
}
