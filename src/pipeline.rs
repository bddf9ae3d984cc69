//! Orchestration: dump traversal, filtering, chunking, embedding, persistence.
//!
//! The pipeline is a plain sequential loop. Pages are processed one at a
//! time in dump order; the only suspension points are the embedding call and
//! the storage writes. There is no parallelism to reason about, so a
//! document's chunks are always embedded and persisted in chunk-index order
//! and documents land in acceptance order.

use tracing::{debug, error, info};

use crate::chunking::{ChunkingConfig, split_into_chunks};
use crate::dump::{Page, extract_plain_text};
use crate::embedding::{EmbeddingProvider, mean_pool};
use crate::filter::ArticleFilter;
use crate::stores::DocStore;
use crate::types::WikivecError;

/// How a document's rows are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitPolicy {
    /// One transaction per document; a failure rolls the whole document back
    /// and the run moves on to the next page.
    #[default]
    AtomicDocument,
    /// Row-level failures are logged and skipped, so a document may end up
    /// with fewer chunks than it was given, or without its aggregate
    /// embedding. Each row is committed on its own, not as one transaction
    /// per document, so a run killed mid-document can leave a partial
    /// document behind.
    TolerateRowFailures,
}

/// Pipeline tuning: chunking budget and commit behavior.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub chunking: ChunkingConfig,
    pub commit: CommitPolicy,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Pages pulled off the dump, including skipped ones.
    pub pages_seen: usize,
    /// Pages skipped for absent text or filter rejection.
    pub pages_skipped: usize,
    /// Documents fully (or, under row tolerance, partially) persisted.
    pub documents_written: usize,
    /// Documents whose atomic write failed and rolled back.
    pub documents_failed: usize,
    /// Chunk rows written.
    pub chunks_written: usize,
    /// Row-level failures tolerated under
    /// [`CommitPolicy::TolerateRowFailures`].
    pub row_failures: usize,
}

/// Drives pages from a dump through chunking, embedding, and storage.
///
/// The embedding provider and store are injected once at construction; the
/// pipeline holds no ambient state of its own.
pub struct Pipeline<E, S> {
    embedder: E,
    store: S,
    config: PipelineConfig,
}

impl<E, S> Pipeline<E, S>
where
    E: EmbeddingProvider,
    S: DocStore,
{
    pub fn new(embedder: E, store: S) -> Self {
        Self {
            embedder,
            store,
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the pipeline over a page sequence until it is exhausted or every
    /// configured target article has been processed.
    ///
    /// Fatal errors (malformed dump, embedding failure) abort the run;
    /// persistence failures are contained per page and reported in the
    /// returned counters.
    pub async fn run<I>(
        &self,
        pages: I,
        filter: &mut ArticleFilter,
    ) -> Result<PipelineReport, WikivecError>
    where
        I: IntoIterator<Item = Result<Page, WikivecError>>,
    {
        let mut report = PipelineReport::default();

        for page in pages {
            let mut page = page?;
            report.pages_seen += 1;

            if !filter.accepts(page.id) {
                report.pages_skipped += 1;
                continue;
            }
            let Some(raw_text) = page.text.take() else {
                debug!(page_id = page.id, title = %page.title, "page has no revision text");
                report.pages_skipped += 1;
                continue;
            };

            let plain = extract_plain_text(&raw_text);
            let chunk_texts = split_into_chunks(&plain, &self.config.chunking);

            let embeddings = if chunk_texts.is_empty() {
                Vec::new()
            } else {
                let vectors = self.embedder.embed_batch(&chunk_texts).await?;
                if vectors.len() != chunk_texts.len() {
                    return Err(WikivecError::Embedding(format!(
                        "provider returned {} vectors for {} chunks",
                        vectors.len(),
                        chunk_texts.len()
                    )));
                }
                vectors
            };
            let mean = mean_pool(&embeddings);

            let chunks: Vec<(String, Vec<f32>)> =
                chunk_texts.into_iter().zip(embeddings).collect();

            match self.config.commit {
                CommitPolicy::AtomicDocument => {
                    self.persist_atomic(&page, &chunks, mean.as_deref(), &mut report)
                        .await;
                }
                CommitPolicy::TolerateRowFailures => {
                    self.persist_tolerant(&page, &chunks, mean.as_deref(), &mut report)
                        .await;
                }
            }

            filter.record_accepted(page.id);
            if filter.is_exhausted() {
                info!(
                    pages_seen = report.pages_seen,
                    "all target articles processed, stopping before dump end"
                );
                break;
            }
        }

        info!(
            documents = report.documents_written,
            chunks = report.chunks_written,
            skipped = report.pages_skipped,
            failed = report.documents_failed,
            "ingestion finished"
        );
        Ok(report)
    }

    async fn persist_atomic(
        &self,
        page: &Page,
        chunks: &[(String, Vec<f32>)],
        mean: Option<&[f32]>,
        report: &mut PipelineReport,
    ) {
        match self
            .store
            .persist_document(&page.title, chunks, mean)
            .await
        {
            Ok(doc_id) => {
                report.documents_written += 1;
                report.chunks_written += chunks.len();
                info!(doc_id, title = %page.title, chunks = chunks.len(), "stored document");
            }
            Err(err) => {
                report.documents_failed += 1;
                error!(page_id = page.id, title = %page.title, %err, "document rolled back");
            }
        }
    }

    /// Every row is attempted and committed individually; failures are
    /// logged and skipped, and the aggregate write-back still uses the
    /// embeddings the document was given, not just the rows that survived.
    async fn persist_tolerant(
        &self,
        page: &Page,
        chunks: &[(String, Vec<f32>)],
        mean: Option<&[f32]>,
        report: &mut PipelineReport,
    ) {
        let doc_id = match self.store.create_document(&page.title).await {
            Ok(doc_id) => doc_id,
            Err(err) => {
                report.documents_failed += 1;
                error!(page_id = page.id, title = %page.title, %err, "document row not created");
                return;
            }
        };

        let mut written = 0usize;
        for (index, (text, embedding)) in chunks.iter().enumerate() {
            match self
                .store
                .append_chunk(doc_id, text, embedding, index)
                .await
            {
                Ok(()) => written += 1,
                Err(err) => {
                    report.row_failures += 1;
                    error!(doc_id, chunk_index = index, %err, "chunk insert failed");
                }
            }
        }

        if let Some(mean) = mean {
            if let Err(err) = self.store.set_document_embedding(doc_id, mean).await {
                report.row_failures += 1;
                error!(doc_id, %err, "embedding write-back failed");
            }
        }

        report.documents_written += 1;
        report.chunks_written += written;
        info!(doc_id, title = %page.title, chunks = written, "stored document");
    }
}
