//! Multi-document aggregation.
//!
//! Each document is parsed and categorized independently, then tagged with
//! the label the caller gave it (typically the office the claims are pending
//! at) and concatenated in input order.

use std::str::FromStr;
use std::sync::Arc;

use epf_pendency_models::{AggregatedTable, CategorizedRecord};
use rayon::prelude::*;

use crate::PendencyError;
use crate::categorize::Categorizer;
use crate::parser::DocumentParser;
use crate::progress::{ProgressCallback, null_progress};

/// A document to aggregate and the label its records are tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentSpec {
    /// Identifier understood by the line source (usually a file path).
    pub document: String,
    /// Label stored in the `pending_at` column.
    pub label: String,
}

impl DocumentSpec {
    /// Pairs a document with its label.
    #[must_use]
    pub fn new(document: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            label: label.into(),
        }
    }
}

impl FromStr for DocumentSpec {
    type Err = String;

    /// Parses `DOCUMENT=LABEL`, splitting at the last `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('=') {
            Some((document, label)) if !document.is_empty() && !label.is_empty() => {
                Ok(Self::new(document, label))
            }
            _ => Err(format!("expected DOCUMENT=LABEL, got '{s}'")),
        }
    }
}

/// Parses, categorizes and concatenates several documents.
pub struct Aggregator<'a> {
    parser: DocumentParser<'a>,
    categorizer: Categorizer,
    parallel: bool,
}

impl<'a> Aggregator<'a> {
    /// Creates an aggregator. Documents are processed in parallel unless
    /// disabled with [`Aggregator::with_parallel`].
    #[must_use]
    pub const fn new(parser: DocumentParser<'a>, categorizer: Categorizer) -> Self {
        Self {
            parser,
            categorizer,
            parallel: true,
        }
    }

    /// Enables or disables parallel document processing.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Aggregates `documents` in the given order.
    ///
    /// # Errors
    ///
    /// Returns the first document-level [`PendencyError`] in input order;
    /// no partial table is produced.
    pub fn aggregate(&self, documents: &[DocumentSpec]) -> Result<AggregatedTable, PendencyError> {
        self.aggregate_with_progress(documents, &null_progress())
    }

    /// Like [`Aggregator::aggregate`], advancing `progress` once per document.
    ///
    /// # Errors
    ///
    /// Same as [`Aggregator::aggregate`].
    pub fn aggregate_with_progress(
        &self,
        documents: &[DocumentSpec],
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<AggregatedTable, PendencyError> {
        progress.set_total(documents.len() as u64);

        let process = |spec: &DocumentSpec| -> Result<Vec<CategorizedRecord>, PendencyError> {
            progress.set_message(format!("Parsing {}", spec.document));
            let result = self
                .parser
                .parse(&spec.document)
                .map(|records| self.categorizer.categorize(records));
            progress.inc(1);
            result
        };

        let per_document: Vec<Vec<CategorizedRecord>> = if self.parallel {
            documents.par_iter().map(process).collect::<Result<_, _>>()?
        } else {
            documents.iter().map(process).collect::<Result<_, _>>()?
        };

        let mut table = AggregatedTable::new();
        for (spec, records) in documents.iter().zip(per_document) {
            log::info!("{}: {} claims pending at {}", spec.document, records.len(), spec.label);
            table.extend_labeled(&spec.label, records);
        }

        progress.finish(format!(
            "Aggregated {} claims from {} documents",
            table.len(),
            documents.len()
        ));
        log::info!(
            "Aggregated {} claims from {} documents",
            table.len(),
            documents.len()
        );

        Ok(table)
    }
}
