//! Plain-text line source.
//!
//! Reads text dumps where pages are separated by form-feed characters
//! (`\x0c`), the convention used by `pdftotext` and similar tools. Handy for
//! fixtures and for reports that were already converted to text upstream.

use std::path::Path;

use crate::{LineSource, LineSourceError, SourceDocument, lines_from_text, open_error};

/// Page separator in text dumps.
pub const PAGE_BREAK: char = '\u{c}';

/// Reads pendency reports from form-feed separated text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLineSource;

impl TextLineSource {
    /// Creates a new `TextLineSource`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Splits a text dump into per-page lines.
    ///
    /// A trailing blank chunk after the final page break is not a page.
    #[must_use]
    pub fn pages_from_text(text: &str) -> Vec<Vec<String>> {
        let mut chunks: Vec<&str> = text.split(PAGE_BREAK).collect();
        if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
            chunks.pop();
        }
        chunks.into_iter().map(lines_from_text).collect()
    }
}

impl LineSource for TextLineSource {
    fn open(&self, document: &str) -> Result<SourceDocument, LineSourceError> {
        let text =
            std::fs::read_to_string(Path::new(document)).map_err(|e| open_error(document, e))?;
        let pages = Self::pages_from_text(&text);

        log::debug!("Split {document} into {} page(s)", pages.len());

        Ok(SourceDocument {
            id: document.to_owned(),
            pages: pages.into_iter().map(Ok).collect(),
        })
    }
}
