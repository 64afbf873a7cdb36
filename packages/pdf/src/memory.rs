//! In-memory line source.

use std::collections::BTreeMap;

use crate::{LineSource, LineSourceError, SourceDocument};

/// A page held in memory: its lines, or an extraction failure message.
pub type MemoryPage = Result<Vec<String>, String>;

/// Serves documents whose pages are already split into lines.
///
/// Pages registered as `Err` are reported as per-page extraction failures,
/// which lets callers exercise page-fault handling without a real PDF.
#[derive(Debug, Clone, Default)]
pub struct MemoryLineSource {
    documents: BTreeMap<String, Vec<MemoryPage>>,
}

impl MemoryLineSource {
    /// Creates an empty source.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            documents: BTreeMap::new(),
        }
    }

    /// Registers a document whose pages all extracted cleanly.
    #[must_use]
    pub fn with_document(mut self, id: &str, pages: Vec<Vec<String>>) -> Self {
        self.documents
            .insert(id.to_owned(), pages.into_iter().map(Ok).collect());
        self
    }

    /// Registers a document page by page, including failed pages.
    #[must_use]
    pub fn with_pages(mut self, id: &str, pages: Vec<MemoryPage>) -> Self {
        self.documents.insert(id.to_owned(), pages);
        self
    }
}

impl LineSource for MemoryLineSource {
    fn open(&self, document: &str) -> Result<SourceDocument, LineSourceError> {
        let pages = self
            .documents
            .get(document)
            .ok_or_else(|| LineSourceError::NotFound {
                document: document.to_owned(),
            })?;

        Ok(SourceDocument {
            id: document.to_owned(),
            pages: pages
                .iter()
                .map(|page| page.clone().map_err(LineSourceError::Extraction))
                .collect(),
        })
    }
}
