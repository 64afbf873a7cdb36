//! Whole-document claim extraction.
//!
//! Runs header lookup and record scanning over every page of a document.
//! Pages are independent, so they may be processed on the `rayon` pool;
//! results are always merged in page order, giving records in "page order,
//! then within-page scan order" whatever the scheduling.

use epf_pdf::{LineSource, PageLines};
use epf_pendency_models::ClaimRecord;
use rayon::prelude::*;

use crate::PendencyError;
use crate::config::HeaderProfile;
use crate::header::locate_header;
use crate::scanner::{PageScan, scan_page};

/// Counts describing what happened to a document's pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Pages in the document.
    pub pages: usize,
    /// Pages skipped because no ownership header was found.
    pub pages_without_header: usize,
    /// Pages whose text could not be produced.
    pub faulted_pages: usize,
    /// Claim records recovered.
    pub records: usize,
    /// Claim id candidates that did not match the row shape.
    pub discarded_candidates: usize,
}

/// What became of a single page.
enum PageOutcome {
    NoHeader,
    Faulted,
    Scanned(PageScan),
}

/// Extracts claim records from documents served by a [`LineSource`].
#[derive(Clone, Copy)]
pub struct DocumentParser<'a> {
    source: &'a dyn LineSource,
    profile: HeaderProfile,
    parallel: bool,
}

impl<'a> DocumentParser<'a> {
    /// Creates a parser reading headers at the positions in `profile`.
    ///
    /// Pages are processed in parallel unless disabled with
    /// [`DocumentParser::with_parallel`].
    #[must_use]
    pub fn new(source: &'a dyn LineSource, profile: HeaderProfile) -> Self {
        Self {
            source,
            profile,
            parallel: true,
        }
    }

    /// Enables or disables parallel page processing.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parses `document` into a flat table of claim records.
    ///
    /// # Errors
    ///
    /// Returns [`PendencyError::Source`] if the document cannot be opened,
    /// or [`PendencyError::EmptyDocument`] if no page yields a record.
    pub fn parse(&self, document: &str) -> Result<Vec<ClaimRecord>, PendencyError> {
        self.parse_with_stats(document).map(|(records, _)| records)
    }

    /// Like [`DocumentParser::parse`], also returning per-page counts.
    ///
    /// # Errors
    ///
    /// Same as [`DocumentParser::parse`].
    pub fn parse_with_stats(
        &self,
        document: &str,
    ) -> Result<(Vec<ClaimRecord>, ParseStats), PendencyError> {
        let source_document = self.source.open(document)?;
        let pages = &source_document.pages;

        let outcomes: Vec<PageOutcome> = if self.parallel {
            pages
                .par_iter()
                .enumerate()
                .map(|(idx, page)| self.process_page(document, idx, page))
                .collect()
        } else {
            pages
                .iter()
                .enumerate()
                .map(|(idx, page)| self.process_page(document, idx, page))
                .collect()
        };

        let mut stats = ParseStats {
            pages: pages.len(),
            ..ParseStats::default()
        };
        let mut records = Vec::new();

        for outcome in outcomes {
            match outcome {
                PageOutcome::NoHeader => stats.pages_without_header += 1,
                PageOutcome::Faulted => stats.faulted_pages += 1,
                PageOutcome::Scanned(scan) => {
                    stats.discarded_candidates += scan.discarded;
                    records.extend(scan.records);
                }
            }
        }
        stats.records = records.len();

        log::info!(
            "Extracted {} claims from {document} ({} pages, {} without header, {} failed, \
             {} malformed entries skipped)",
            stats.records,
            stats.pages,
            stats.pages_without_header,
            stats.faulted_pages,
            stats.discarded_candidates
        );

        if records.is_empty() {
            return Err(PendencyError::EmptyDocument {
                document: document.to_owned(),
            });
        }

        Ok((records, stats))
    }

    fn process_page(&self, document: &str, idx: usize, page: &PageLines) -> PageOutcome {
        let lines = match page {
            Ok(lines) => lines,
            Err(e) => {
                log::warn!("Failed to parse page {} of {document}: {e}", idx + 1);
                return PageOutcome::Faulted;
            }
        };

        let Some(header) = locate_header(lines, &self.profile) else {
            log::debug!("Page {} of {document} has no header, skipping", idx + 1);
            return PageOutcome::NoHeader;
        };

        PageOutcome::Scanned(scan_page(&header, lines))
    }
}
