//! Claim row recovery from a page's flattened lines.
//!
//! A claim row is printed as a run of cells: pending days, claim id, date,
//! member id, an optional member name, form type and serial number. Once
//! flattened, nothing marks where a row starts except the 12-digit claim
//! id, and the optional name cell shifts the tail of the row by one line.
//!
//! The scanner is a small state machine. It is [`ScanState::Seeking`] a
//! line holding a claim id, moves to [`ScanState::Candidate`] when it finds
//! one, and resolves that candidate to either a confirmed record or a
//! discard before seeking again. Discards never abort the page.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use epf_pendency_models::{ClaimRecord, PageHeader};
use regex::Regex;

/// Prefix that identifies the form-type cell.
pub const FORM_PREFIX: &str = "Form-";

/// Offsets from the claim id line searched for the form-type cell.
pub const FORM_OFFSETS: RangeInclusive<usize> = 3..=5;

/// Form-type offset at which the row has no member-name cell.
const NAMELESS_FORM_OFFSET: usize = 3;

/// Member name recorded for rows without a name cell.
pub const BLANK_MEMBER_NAME: &str = " ";

const CLAIM_ID_DIGITS: usize = 12;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").unwrap_or_else(|_| unreachable!()));

/// Whether `line` contains a run of exactly twelve consecutive digits.
///
/// Longer runs (e.g. the digits inside a member id) do not count.
#[must_use]
pub fn contains_claim_id(line: &str) -> bool {
    DIGIT_RUN
        .find_iter(line)
        .any(|m| m.as_str().len() == CLAIM_ID_DIGITS)
}

/// Why a claim id candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// The claim id is on the first line, so no pending-days cell precedes it.
    AtPageStart,
    /// The page ends before the row's cells do.
    MissingCells,
    /// No form-type cell at any searched offset.
    NoFormCell,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtPageStart => write!(f, "claim id on first line"),
            Self::MissingCells => write!(f, "page ends mid-row"),
            Self::NoFormCell => write!(f, "no form-type cell"),
        }
    }
}

/// How a candidate resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// The row shape matched and produced a record.
    Confirmed(ClaimRecord),
    /// The row shape did not match.
    Discarded(DiscardReason),
}

/// Scanner position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for a claim id at or after this line.
    Seeking(usize),
    /// A claim id was found on this line and awaits resolution.
    Candidate(usize),
    /// Every line has been examined.
    Finished,
}

/// One resolved candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    /// Line index of the claim id.
    pub index: usize,
    /// What became of it.
    pub outcome: CandidateOutcome,
}

/// Resolves the candidate at `index` against the expected row shape.
///
/// Offsets are tried in order and the first form-type cell wins.
#[must_use]
pub fn resolve_candidate(header: &PageHeader, lines: &[String], index: usize) -> CandidateOutcome {
    let Some(pending_index) = index.checked_sub(1) else {
        return CandidateOutcome::Discarded(DiscardReason::AtPageStart);
    };
    let (Some(pending_days), Some(claim_id), Some(date), Some(member_id)) = (
        lines.get(pending_index),
        lines.get(index),
        lines.get(index + 1),
        lines.get(index + 2),
    ) else {
        return CandidateOutcome::Discarded(DiscardReason::MissingCells);
    };

    for offset in FORM_OFFSETS {
        let Some(cell) = lines.get(index + offset) else {
            return CandidateOutcome::Discarded(DiscardReason::MissingCells);
        };
        if !cell.starts_with(FORM_PREFIX) {
            continue;
        }

        let Some(serial) = lines.get(index + offset + 1) else {
            return CandidateOutcome::Discarded(DiscardReason::MissingCells);
        };
        let member_name = if offset == NAMELESS_FORM_OFFSET {
            BLANK_MEMBER_NAME
        } else {
            lines[index + NAMELESS_FORM_OFFSET].as_str()
        };

        return CandidateOutcome::Confirmed(ClaimRecord {
            group: header.group.clone(),
            task: header.task.clone(),
            officer_name: header.officer_name.clone(),
            serial: serial.clone(),
            claim_id: claim_id.clone(),
            date: date.clone(),
            member_id: member_id.clone(),
            member_name: member_name.to_owned(),
            form_type: cell.clone(),
            pending_days_raw: pending_days.clone(),
        });
    }

    CandidateOutcome::Discarded(DiscardReason::NoFormCell)
}

/// Walks a page's lines, yielding one [`ScanEvent`] per claim id candidate.
#[derive(Debug)]
pub struct RecordScanner<'a> {
    header: &'a PageHeader,
    lines: &'a [String],
    state: ScanState,
}

impl<'a> RecordScanner<'a> {
    /// Creates a scanner positioned at the first line.
    #[must_use]
    pub const fn new(header: &'a PageHeader, lines: &'a [String]) -> Self {
        Self {
            header,
            lines,
            state: ScanState::Seeking(0),
        }
    }

    /// Current position.
    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }
}

impl Iterator for RecordScanner<'_> {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                ScanState::Seeking(index) => {
                    self.state = match self.lines.get(index) {
                        None => ScanState::Finished,
                        Some(line) if contains_claim_id(line) => ScanState::Candidate(index),
                        Some(_) => ScanState::Seeking(index + 1),
                    };
                }
                ScanState::Candidate(index) => {
                    self.state = ScanState::Seeking(index + 1);
                    return Some(ScanEvent {
                        index,
                        outcome: resolve_candidate(self.header, self.lines, index),
                    });
                }
                ScanState::Finished => return None,
            }
        }
    }
}

/// Records recovered from one page plus the number of discarded candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageScan {
    /// Confirmed records in line order.
    pub records: Vec<ClaimRecord>,
    /// Candidates that did not match the row shape.
    pub discarded: usize,
}

/// Scans every line of a page.
#[must_use]
pub fn scan_page(header: &PageHeader, lines: &[String]) -> PageScan {
    let mut scan = PageScan::default();

    for event in RecordScanner::new(header, lines) {
        match event.outcome {
            CandidateOutcome::Confirmed(record) => scan.records.push(record),
            CandidateOutcome::Discarded(reason) => {
                log::debug!(
                    "Skipped malformed claim entry at line {}: {reason}",
                    event.index
                );
                scan.discarded += 1;
            }
        }
    }

    scan
}
