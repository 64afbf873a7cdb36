#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Claim extraction and aggregation for EPF pendency reports.
//!
//! A pendency report lists pending claims page by page, each page headed by
//! the group, task and officer it belongs to. This crate recovers those
//! claims as structured records ([`parser`]), classifies them by pending
//! days and handling officer ([`categorize`]), merges several reports under
//! caller-supplied labels ([`aggregate`]), and cross-tabulates the result
//! ([`summary`]). Extracted values can be checked against EPFO formats
//! without dropping rows ([`validate`]), and tables can be written out as
//! CSV ([`export`]).
//!
//! Page text comes from an [`epf_pdf::LineSource`], so the pipeline runs
//! the same over real PDFs, plain-text dumps, or in-memory fixtures.

pub mod aggregate;
pub mod categorize;
pub mod config;
pub mod export;
pub mod header;
pub mod parser;
pub mod progress;
pub mod scanner;
pub mod summary;
pub mod validate;

pub use aggregate::{Aggregator, DocumentSpec};
pub use categorize::Categorizer;
pub use config::{ConfigError, DayBuckets, HeaderProfile, OfficerMap, PendencyConfig};
pub use parser::{DocumentParser, ParseStats};
pub use summary::{
    CompositeKey, FieldSelector, Margin, SummaryTable, build_summary, pending_at, summarize_fields,
};
pub use validate::{ValidationReport, validate_records};

use epf_pdf::LineSourceError;

/// Errors that can occur while processing pendency reports.
#[derive(Debug, thiserror::Error)]
pub enum PendencyError {
    /// The document could not be opened.
    #[error(transparent)]
    Source(#[from] LineSourceError),

    /// No page of the document produced a claim record.
    #[error("No claims found in document: {document}")]
    EmptyDocument {
        /// Identifier of the document.
        document: String,
    },

    /// Settings failed to load or validate.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
