//! Target-article filtering and early-termination tracking.
//!
//! The filter is loaded once by the orchestrator and threaded in explicitly;
//! there is no ambient global set. An unconfigured filter accepts every page.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::types::WikivecError;

/// Membership predicate over the configured target article ids.
///
/// Besides acceptance, the filter tracks the running set of accepted ids so
/// the pipeline can stop as soon as every configured target has been seen.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    targets: Option<HashSet<i64>>,
    accepted: HashSet<i64>,
}

impl ArticleFilter {
    /// A filter that accepts every page id.
    pub fn process_all() -> Self {
        Self::default()
    }

    /// Builds a filter from an explicit id set. An empty set means
    /// "process everything".
    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        let targets: HashSet<i64> = ids.into_iter().collect();
        if targets.is_empty() {
            Self::process_all()
        } else {
            Self {
                targets: Some(targets),
                accepted: HashSet::new(),
            }
        }
    }

    /// Loads target ids from a tabular file with a header row, taking the
    /// 0-based `id_column` of every subsequent row as an article id.
    ///
    /// A missing file is not an error: the pipeline falls back to processing
    /// every article, matching the unconfigured case.
    pub fn from_csv_path(path: impl AsRef<Path>, id_column: usize) -> Result<Self, WikivecError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "target article file not found, processing all articles");
            return Ok(Self::process_all());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut targets = HashSet::new();
        for record in reader.records() {
            let record = record?;
            let field = record.get(id_column).ok_or_else(|| {
                WikivecError::Filter(format!(
                    "row {:?} has no column {id_column}",
                    record.position().map(|p| p.line())
                ))
            })?;
            let id: i64 = field.trim().parse().map_err(|err| {
                WikivecError::Filter(format!("invalid article id '{field}': {err}"))
            })?;
            targets.insert(id);
        }

        info!(path = %path.display(), count = targets.len(), "loaded target article set");
        Ok(Self::from_ids(targets))
    }

    /// True when a target set is configured.
    pub fn is_filtered(&self) -> bool {
        self.targets.is_some()
    }

    /// Number of configured targets, if any.
    pub fn target_count(&self) -> Option<usize> {
        self.targets.as_ref().map(HashSet::len)
    }

    /// O(1) membership test; always true without a configured set.
    pub fn accepts(&self, id: i64) -> bool {
        match &self.targets {
            Some(targets) => targets.contains(&id),
            None => true,
        }
    }

    /// Records that an accepted page id has been processed.
    pub fn record_accepted(&mut self, id: i64) {
        if self.accepts(id) {
            self.accepted.insert(id);
        }
    }

    /// True once every configured target id has been accepted at least once.
    ///
    /// Never true for an unconfigured filter: an unfiltered run only ends
    /// when the dump is exhausted.
    pub fn is_exhausted(&self) -> bool {
        match &self.targets {
            Some(targets) => self.accepted == *targets,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_filter_accepts_everything() {
        let filter = ArticleFilter::process_all();
        assert!(filter.accepts(1));
        assert!(filter.accepts(i64::MAX));
        assert!(!filter.is_filtered());
        assert!(!filter.is_exhausted());
    }

    #[test]
    fn empty_id_set_means_no_filtering() {
        let filter = ArticleFilter::from_ids([]);
        assert!(!filter.is_filtered());
        assert!(filter.accepts(42));
    }

    #[test]
    fn configured_filter_rejects_outside_ids() {
        let filter = ArticleFilter::from_ids([5, 9]);
        assert!(filter.accepts(5));
        assert!(filter.accepts(9));
        assert!(!filter.accepts(7));
    }

    #[test]
    fn exhausted_only_after_every_target_accepted() {
        let mut filter = ArticleFilter::from_ids([5, 9]);
        assert!(!filter.is_exhausted());

        filter.record_accepted(5);
        assert!(!filter.is_exhausted());

        // Rejected ids never count toward exhaustion.
        filter.record_accepted(7);
        assert!(!filter.is_exhausted());

        filter.record_accepted(9);
        assert!(filter.is_exhausted());
    }

    #[test]
    fn loads_ids_from_csv_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vital.csv");
        std::fs::write(&path, "rank,title,page_id\n1,Cat,5\n2,Dog,9\n").unwrap();

        let filter = ArticleFilter::from_csv_path(&path, 2).unwrap();
        assert_eq!(filter.target_count(), Some(2));
        assert!(filter.accepts(5));
        assert!(filter.accepts(9));
        assert!(!filter.accepts(1));
    }

    #[test]
    fn missing_file_falls_back_to_process_all() {
        let filter = ArticleFilter::from_csv_path("/nonexistent/vital.csv", 0).unwrap();
        assert!(!filter.is_filtered());
        assert!(filter.accepts(123));
    }

    #[test]
    fn non_numeric_id_is_a_filter_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vital.csv");
        std::fs::write(&path, "page_id\nnot-a-number\n").unwrap();

        let err = ArticleFilter::from_csv_path(&path, 0).unwrap_err();
        assert!(matches!(err, WikivecError::Filter(_)));
    }
}
