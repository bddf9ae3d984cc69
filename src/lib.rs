//! # wikivec
//!
//! Streaming ingestion of MediaWiki exports into an embedded-document store:
//! pages are read one at a time from a multi-gigabyte compressed dump,
//! filtered to a target article set, stripped of wikitext markup, split into
//! sentence-aligned chunks under a word budget, embedded through an injected
//! provider, mean-pooled into a document vector, and persisted to SQLite.
//!
//! ```text
//! Dump archive ──► dump::DumpReader ──► filter::ArticleFilter
//!                                              │ accepted pages
//!                                              ▼
//!                       dump::extract_plain_text ──► chunking::split_into_chunks
//!                                                             │
//!                                  embedding::EmbeddingProvider (injected)
//!                                                             │
//!                                  embedding::mean_pool ──► stores::DocStore
//!                                                             │
//! Stored vectors ──► external projection ──► export::write_map_json
//! ```
//!
//! The [`pipeline::Pipeline`] orchestrates the flow sequentially: one page at
//! a time, early termination once every target article has been seen, and
//! per-page error containment controlled by [`pipeline::CommitPolicy`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use wikivec::dump::DumpReader;
//! use wikivec::embedding::MockEmbeddingProvider;
//! use wikivec::filter::ArticleFilter;
//! use wikivec::pipeline::Pipeline;
//! use wikivec::stores::SqliteDocStore;
//!
//! # async fn run() -> Result<(), wikivec::types::WikivecError> {
//! let reader = DumpReader::open("enwiki-latest-pages-articles.xml.bz2")?;
//! let mut filter = ArticleFilter::from_csv_path("vital_articles.csv", 0)?;
//! let store = SqliteDocStore::open("wiki_docs.db").await?;
//!
//! let pipeline = Pipeline::new(MockEmbeddingProvider::new(), store);
//! let report = pipeline.run(reader, &mut filter).await?;
//! println!("stored {} documents", report.documents_written);
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod dump;
pub mod embedding;
pub mod export;
pub mod filter;
pub mod pipeline;
pub mod stores;
pub mod types;

pub use chunking::{ChunkingConfig, MAX_WORD_COUNT, split_into_chunks};
pub use dump::{DumpReader, Page, extract_plain_text};
pub use embedding::{EmbeddingProvider, MockEmbeddingProvider, mean_pool};
pub use export::{MapPoint, map_points, write_map_json};
pub use filter::ArticleFilter;
pub use pipeline::{CommitPolicy, Pipeline, PipelineConfig, PipelineReport};
pub use stores::{DocStore, SqliteDocStore, StoredChunk, StoredDocument};
pub use types::WikivecError;
