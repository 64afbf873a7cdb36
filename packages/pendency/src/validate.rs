//! Field-level checks on extracted claims.
//!
//! Validation only reports. Every record the scanner produced stays in the
//! table; a [`ValidationReport`] counts how many carry a value that does
//! not look like an EPFO identifier, date or day count so a bad extraction
//! can be spotted without hiding rows.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use epf_pendency_models::{ClaimRecord, Field};
use regex::Regex;

/// Form families a claim's form type must start with.
pub const KNOWN_FORM_TYPES: [&str; 8] = [
    "Form-19", "Form-31", "Form-10C", "Form-10D", "Form-13", "Form-14", "Form-20", "Form-5IF",
];

/// Receipt date layout.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Largest pending-day count accepted as plausible.
pub const MAX_PENDING_DAYS: i64 = 10_000;

/// Columns checked, in report order.
pub const VALIDATED_FIELDS: [Field; 7] = [
    Field::Id,
    Field::Memid,
    Field::Form,
    Field::Group,
    Field::Task,
    Field::Date,
    Field::Days,
];

static CLAIM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^(PYKRP)?[0-9]{12}$").unwrap_or_else(|_| unreachable!()));

static MEMBER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^PYKRP[0-9]{17}$").unwrap_or_else(|_| unreachable!()));

static GROUP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[0-9]{3}$").unwrap_or_else(|_| unreachable!()));

static TASK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[0-9]{5}$").unwrap_or_else(|_| unreachable!()));

/// A 12-digit claim id, optionally carrying the `PYKRP` office prefix.
#[must_use]
pub fn is_valid_claim_id(value: &str) -> bool {
    CLAIM_ID.is_match(value)
}

/// `PYKRP` followed by a 7-digit establishment code, 3-digit extension and
/// 7-digit employee number.
#[must_use]
pub fn is_valid_member_id(value: &str) -> bool {
    MEMBER_ID.is_match(value)
}

/// Whether `value` belongs to one of [`KNOWN_FORM_TYPES`]. Variants such as
/// `Form-31 [ COVID ]` count as their family.
#[must_use]
pub fn is_valid_form_type(value: &str) -> bool {
    KNOWN_FORM_TYPES
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

/// A 3-digit group code.
#[must_use]
pub fn is_valid_group_id(value: &str) -> bool {
    GROUP_ID.is_match(value)
}

/// A 5-digit task code.
#[must_use]
pub fn is_valid_task_id(value: &str) -> bool {
    TASK_ID.is_match(value)
}

/// A real calendar date in [`DATE_FORMAT`].
#[must_use]
pub fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}

/// An integer between 0 and [`MAX_PENDING_DAYS`].
#[must_use]
pub fn is_valid_pending_days(value: &str) -> bool {
    value
        .trim()
        .parse::<i64>()
        .is_ok_and(|days| (0..=MAX_PENDING_DAYS).contains(&days))
}

/// Checks one column of `record`. Columns outside [`VALIDATED_FIELDS`]
/// always pass.
#[must_use]
pub fn is_valid_field(record: &ClaimRecord, field: Field) -> bool {
    match field {
        Field::Id => is_valid_claim_id(&record.claim_id),
        Field::Memid => is_valid_member_id(&record.member_id),
        Field::Form => is_valid_form_type(&record.form_type),
        Field::Group => is_valid_group_id(&record.group),
        Field::Task => is_valid_task_id(&record.task),
        Field::Date => is_valid_date(&record.date),
        Field::Days => is_valid_pending_days(&record.pending_days_raw),
        _ => true,
    }
}

/// Per-column counts of records failing validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    records: usize,
    invalid: BTreeMap<Field, usize>,
}

impl ValidationReport {
    /// Number of records checked.
    #[must_use]
    pub const fn records(&self) -> usize {
        self.records
    }

    /// Records whose `field` failed validation.
    #[must_use]
    pub fn invalid_count(&self, field: Field) -> usize {
        self.invalid.get(&field).copied().unwrap_or(0)
    }

    /// Whether every checked value passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }

    fn record(&mut self, record: &ClaimRecord) {
        self.records += 1;
        for field in VALIDATED_FIELDS {
            if !is_valid_field(record, field) {
                log::debug!("Claim {} has an invalid {field} value", record.claim_id);
                *self.invalid.entry(field).or_default() += 1;
            }
        }
    }
}

/// Validates `records` extracted from `document` and logs the per-column
/// counts. The records themselves are left untouched.
#[must_use]
pub fn validate_records(document: &str, records: &[ClaimRecord]) -> ValidationReport {
    let mut report = ValidationReport::default();
    for record in records {
        report.record(record);
    }

    if report.is_clean() {
        log::info!("{document}: all {} claims passed validation", report.records);
    } else {
        let counts: Vec<String> = report
            .invalid
            .iter()
            .map(|(field, count)| format!("{count} {field}"))
            .collect();
        log::info!(
            "{document}: {} claims checked, invalid values: {}",
            report.records,
            counts.join(", ")
        );
    }

    report
}
