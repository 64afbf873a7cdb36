#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Claim record types recovered from EPF pendency reports.
//!
//! Records move through three shapes as they flow down the pipeline:
//! [`ClaimRecord`] (raw strings straight off the page), [`CategorizedRecord`]
//! (coerced numbers plus day bucket and officer), and [`AggregatedRecord`]
//! (tagged with the label of the document it came from). The column names
//! each shape is exported under are fixed by [`RAW_COLUMNS`],
//! [`CATEGORIZED_COLUMNS`] and [`AGGREGATED_COLUMNS`]; downstream report
//! generators depend on them.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Columns of a parsed (uncategorized) claim table, in output order.
pub const RAW_COLUMNS: [&str; 10] = [
    "group", "task", "name", "sr", "id", "date", "memid", "memname", "form", "days",
];

/// Columns of a categorized claim table, in output order.
pub const CATEGORIZED_COLUMNS: [&str; 12] = [
    "group", "task", "name", "sr", "id", "date", "memid", "memname", "form", "days", "days_cat",
    "officer",
];

/// Columns of an aggregated multi-document table, in output order.
pub const AGGREGATED_COLUMNS: [&str; 13] = [
    "group",
    "task",
    "name",
    "sr",
    "id",
    "date",
    "memid",
    "memname",
    "form",
    "days",
    "days_cat",
    "officer",
    "pending_at",
];

/// Literal key used for the total row and column of a summary.
pub const MARGIN_KEY: &str = "All";

/// Ownership header of a single report page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageHeader {
    /// Administrative group code (e.g. `"101"`).
    pub group: String,
    /// Work-queue (task) code within the group (e.g. `"10101"`).
    pub task: String,
    /// Name of the officer the page is assigned to.
    pub officer_name: String,
}

/// A claim row recovered from a page, with every field as extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Group code from the page header.
    #[serde(rename = "group")]
    pub group: String,
    /// Task code from the page header.
    #[serde(rename = "task")]
    pub task: String,
    /// Officer name from the page header.
    #[serde(rename = "name")]
    pub officer_name: String,
    /// Serial number cell following the form type.
    #[serde(rename = "sr")]
    pub serial: String,
    /// The line holding the 12-digit claim identifier.
    #[serde(rename = "id")]
    pub claim_id: String,
    /// Receipt date cell, as printed.
    #[serde(rename = "date")]
    pub date: String,
    /// Member (UAN/account) identifier cell.
    #[serde(rename = "memid")]
    pub member_id: String,
    /// Member name, or a single space when the row has no name cell.
    #[serde(rename = "memname")]
    pub member_name: String,
    /// Form type cell (always starts with `Form-`).
    #[serde(rename = "form")]
    pub form_type: String,
    /// Pending-days cell preceding the claim id, not yet coerced.
    #[serde(rename = "days")]
    pub pending_days_raw: String,
}

/// Coarse handling-officer bucket a group code belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Officer {
    /// First officer bucket.
    OfficerA,
    /// Second officer bucket.
    OfficerB,
    /// Third officer bucket.
    OfficerC,
    /// Fourth officer bucket.
    OfficerD,
}

impl Officer {
    /// All officer buckets, in display order.
    pub const ALL: [Self; 4] = [Self::OfficerA, Self::OfficerB, Self::OfficerC, Self::OfficerD];

    /// Position of this bucket within [`Officer::ALL`].
    #[must_use]
    pub const fn rank(self) -> usize {
        self as usize
    }
}

/// A pending-days bucket label together with its position in the bucket
/// sequence, so that categories sort in bucket order rather than by label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DaysCategory {
    /// Zero-based index of the bucket.
    pub rank: usize,
    /// Human-readable label (e.g. `"11-15 Days"`).
    pub label: String,
}

impl std::fmt::Display for DaysCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// A [`ClaimRecord`] with coerced numbers and derived classifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategorizedRecord {
    /// The record as extracted.
    pub claim: ClaimRecord,
    /// `pending_days_raw` as an integer, if it parsed.
    pub pending_days: Option<i64>,
    /// `group` as an integer, if it parsed.
    pub group_numeric: Option<i64>,
    /// Day bucket, if `pending_days` fell inside a configured bucket.
    pub days_category: Option<DaysCategory>,
    /// Officer bucket, if the group code is mapped.
    pub officer: Option<Officer>,
}

/// A categorized record tagged with the label of its source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// The categorized record.
    pub record: CategorizedRecord,
    /// Caller-supplied label of the originating document (e.g. `"DA"`).
    pub source_label: String,
}

/// Records from several documents, concatenated in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedTable {
    records: Vec<AggregatedRecord>,
}

impl AggregatedTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends every record of one document under `source_label`.
    pub fn extend_labeled(
        &mut self,
        source_label: &str,
        records: impl IntoIterator<Item = CategorizedRecord>,
    ) {
        self.records
            .extend(records.into_iter().map(|record| AggregatedRecord {
                record,
                source_label: source_label.to_owned(),
            }));
    }

    /// Number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, AggregatedRecord> {
        self.records.iter()
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[AggregatedRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a AggregatedTable {
    type Item = &'a AggregatedRecord;
    type IntoIter = std::slice::Iter<'a, AggregatedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// An output column usable as a summary key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// Group code (numeric after categorization).
    Group,
    /// Task code.
    Task,
    /// Officer name.
    Name,
    /// Serial number.
    Sr,
    /// Claim identifier.
    Id,
    /// Receipt date.
    Date,
    /// Member identifier.
    Memid,
    /// Member name.
    Memname,
    /// Form type.
    Form,
    /// Pending days (numeric after categorization).
    Days,
    /// Pending-days bucket.
    DaysCat,
    /// Officer bucket.
    Officer,
    /// Source document label.
    PendingAt,
}

/// A single summary key value with a natural sort order.
///
/// Variants never mix within one column, so ordering across variants only
/// needs to be total, not meaningful.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyValue {
    /// Integer column, sorted numerically.
    Number(i64),
    /// Bucketed column, sorted by bucket position.
    Ordinal {
        /// Position of the bucket.
        rank: usize,
        /// Display label.
        label: String,
    },
    /// Free-text column, sorted lexicographically.
    Text(String),
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Ordinal { label, .. } => f.write_str(label),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Field {
    /// Reads this column from `row`, or `None` when the value is null.
    #[must_use]
    pub fn value(self, row: &AggregatedRecord) -> Option<KeyValue> {
        let record = &row.record;
        let claim = &record.claim;
        let text = |s: &str| Some(KeyValue::Text(s.to_owned()));

        match self {
            Self::Group => record.group_numeric.map(KeyValue::Number),
            Self::Task => text(&claim.task),
            Self::Name => text(&claim.officer_name),
            Self::Sr => text(&claim.serial),
            Self::Id => text(&claim.claim_id),
            Self::Date => text(&claim.date),
            Self::Memid => text(&claim.member_id),
            Self::Memname => text(&claim.member_name),
            Self::Form => text(&claim.form_type),
            Self::Days => record.pending_days.map(KeyValue::Number),
            Self::DaysCat => record
                .days_category
                .as_ref()
                .map(|category| KeyValue::Ordinal {
                    rank: category.rank,
                    label: category.label.clone(),
                }),
            Self::Officer => record.officer.map(|officer| KeyValue::Ordinal {
                rank: officer.rank(),
                label: officer.to_string(),
            }),
            Self::PendingAt => text(&row.source_label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    fn sample_row() -> AggregatedRecord {
        AggregatedRecord {
            record: CategorizedRecord {
                claim: ClaimRecord {
                    group: "101".to_owned(),
                    task: "10101".to_owned(),
                    officer_name: "John Doe".to_owned(),
                    serial: "7".to_owned(),
                    claim_id: "123456789012".to_owned(),
                    date: "01/02/2023".to_owned(),
                    member_id: "PYKRP00534130000030651".to_owned(),
                    member_name: " ".to_owned(),
                    form_type: "Form-19".to_owned(),
                    pending_days_raw: "15".to_owned(),
                },
                pending_days: Some(15),
                group_numeric: Some(101),
                days_category: Some(DaysCategory {
                    rank: 1,
                    label: "11-15 Days".to_owned(),
                }),
                officer: Some(Officer::OfficerD),
            },
            source_label: "DA".to_owned(),
        }
    }

    #[test]
    fn officer_names_use_screaming_snake_case() {
        assert_eq!(Officer::OfficerA.to_string(), "OFFICER_A");
        assert_eq!(Officer::from_str("OFFICER_D").unwrap(), Officer::OfficerD);
    }

    #[test]
    fn officer_rank_matches_all_order() {
        for (idx, officer) in Officer::ALL.iter().enumerate() {
            assert_eq!(officer.rank(), idx);
        }
    }

    #[test]
    fn fields_parse_from_column_names() {
        for column in AGGREGATED_COLUMNS {
            let field = Field::from_str(column).unwrap();
            assert_eq!(field.as_ref(), column);
        }
    }

    #[test]
    fn column_schemas_extend_each_other() {
        assert_eq!(CATEGORIZED_COLUMNS[..RAW_COLUMNS.len()], RAW_COLUMNS);
        assert_eq!(
            AGGREGATED_COLUMNS[..CATEGORIZED_COLUMNS.len()],
            CATEGORIZED_COLUMNS
        );
    }

    #[test]
    fn field_values_read_typed_columns() {
        let row = sample_row();
        assert_eq!(Field::Group.value(&row), Some(KeyValue::Number(101)));
        assert_eq!(Field::Days.value(&row), Some(KeyValue::Number(15)));
        assert_eq!(
            Field::PendingAt.value(&row),
            Some(KeyValue::Text("DA".to_owned()))
        );
        assert_eq!(
            Field::Officer.value(&row).unwrap().to_string(),
            "OFFICER_D"
        );
        assert_eq!(Field::DaysCat.value(&row).unwrap().to_string(), "11-15 Days");
    }

    #[test]
    fn null_numeric_fields_have_no_value() {
        let mut row = sample_row();
        row.record.group_numeric = None;
        row.record.days_category = None;
        assert_eq!(Field::Group.value(&row), None);
        assert_eq!(Field::DaysCat.value(&row), None);
    }

    #[test]
    fn ordinal_keys_sort_by_rank_not_label() {
        let late = KeyValue::Ordinal {
            rank: 3,
            label: ">=20 Days".to_owned(),
        };
        let early = KeyValue::Ordinal {
            rank: 0,
            label: "0-10 Days".to_owned(),
        };
        let middle = KeyValue::Ordinal {
            rank: 1,
            label: "11-15 Days".to_owned(),
        };
        let mut keys = vec![late.clone(), middle.clone(), early.clone()];
        keys.sort();
        assert_eq!(keys, vec![early, middle, late]);
    }

    #[test]
    fn aggregated_table_tags_records_in_order() {
        let row = sample_row();
        let mut table = AggregatedTable::new();
        table.extend_labeled("DA", vec![row.record.clone()]);
        table.extend_labeled("SS", vec![row.record.clone(), row.record]);
        let labels: Vec<&str> = table.iter().map(|r| r.source_label.as_str()).collect();
        assert_eq!(labels, vec!["DA", "SS", "SS"]);
        assert_eq!(table.len(), 3);
    }
}
