//! Day-bucket and officer classification of parsed claims.

use epf_pendency_models::{CategorizedRecord, ClaimRecord};

use crate::config::{DayBuckets, OfficerMap, PendencyConfig};

/// Adds coerced numbers, day bucket and officer to claim records.
///
/// Holds its own bucket and officer tables, so differently configured
/// categorizers can be used side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categorizer {
    days: DayBuckets,
    officers: OfficerMap,
}

impl Categorizer {
    /// Creates a categorizer from validated tables.
    #[must_use]
    pub const fn new(days: DayBuckets, officers: OfficerMap) -> Self {
        Self { days, officers }
    }

    /// Creates a categorizer using the tables of `config`.
    #[must_use]
    pub fn from_config(config: &PendencyConfig) -> Self {
        Self::new(config.days.clone(), config.officers.clone())
    }

    /// Categorizes every record, preserving order.
    #[must_use]
    pub fn categorize(&self, records: Vec<ClaimRecord>) -> Vec<CategorizedRecord> {
        let categorized: Vec<CategorizedRecord> = records
            .into_iter()
            .map(|claim| self.categorize_record(claim))
            .collect();

        let uncoerced = categorized
            .iter()
            .filter(|r| r.pending_days.is_none())
            .count();
        if uncoerced > 0 {
            log::debug!("{uncoerced} records have non-numeric pending days");
        }

        categorized
    }

    /// Categorizes one record.
    ///
    /// Fields that fail integer coercion become `None`, as do the
    /// classifications derived from them.
    #[must_use]
    pub fn categorize_record(&self, claim: ClaimRecord) -> CategorizedRecord {
        let pending_days = coerce_int(&claim.pending_days_raw);
        let group_numeric = coerce_int(&claim.group);

        CategorizedRecord {
            days_category: pending_days.and_then(|days| self.days.category(days)),
            officer: group_numeric.and_then(|group| self.officers.officer_for(group)),
            pending_days,
            group_numeric,
            claim,
        }
    }
}

/// Parses a cell as an integer.
///
/// Surrounding whitespace is ignored. Decimal renderings of whole numbers
/// (`"15.0"`) are accepted; anything else yields `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn coerce_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite()
        && value.fract() == 0.0
        && value >= i64::MIN as f64
        && value < i64::MAX as f64
    {
        Some(value as i64)
    } else {
        None
    }
}
