#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Line sources for pendency report documents.
//!
//! The extraction engine never looks at PDF structure. It only sees each
//! page as an ordered sequence of trimmed, non-empty text lines. This crate
//! defines the [`LineSource`] trait that turns a document identifier into
//! such pages, plus three implementations:
//!
//! - [`PdfLineSource`] extracts text with [`pdf_extract`], one entry per page
//! - [`TextLineSource`] reads plain-text dumps with form-feed page breaks
//! - [`MemoryLineSource`] serves pages held in memory (fixtures, embedding)

pub mod memory;
pub mod pdf;
pub mod text;

pub use memory::MemoryLineSource;
pub use pdf::PdfLineSource;
pub use text::TextLineSource;

/// Errors produced while resolving a document into pages.
#[derive(Debug, thiserror::Error)]
pub enum LineSourceError {
    /// The document identifier does not resolve to anything.
    #[error("Document not found: {document}")]
    NotFound {
        /// The identifier that failed to resolve.
        document: String,
    },

    /// Text extraction failed for a document or a single page.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The lines of one page, or the reason the page could not be produced.
pub type PageLines = Result<Vec<String>, LineSourceError>;

/// A resolved document: its identifier and its pages in order.
#[derive(Debug)]
pub struct SourceDocument {
    /// Identifier the document was opened with.
    pub id: String,
    /// Pages in document order.
    pub pages: Vec<PageLines>,
}

impl SourceDocument {
    /// Number of pages, including pages that failed to extract.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Resolves document identifiers into per-page line sequences.
///
/// Implementations must be `Send + Sync` so several documents can be
/// opened from worker threads.
pub trait LineSource: Send + Sync {
    /// Opens `document` and returns its pages.
    ///
    /// # Errors
    ///
    /// Returns [`LineSourceError::NotFound`] if the identifier cannot be
    /// resolved, or another variant if the document as a whole cannot be
    /// read. Failures confined to one page are reported inside
    /// [`SourceDocument::pages`] instead.
    fn open(&self, document: &str) -> Result<SourceDocument, LineSourceError>;
}

/// Splits extracted page text into trimmed, non-empty lines.
#[must_use]
pub fn lines_from_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Maps an I/O error from opening `document` to the matching source error.
pub(crate) fn open_error(document: &str, error: std::io::Error) -> LineSourceError {
    if error.kind() == std::io::ErrorKind::NotFound {
        LineSourceError::NotFound {
            document: document.to_owned(),
        }
    } else {
        LineSourceError::Io(error)
    }
}
