//! Count cross-tabulations over aggregated claims.
//!
//! A summary counts records per (row key, column key) pair and carries
//! [`Margin::All`] totals on both axes. Keys are extracted by caller
//! functions, usually a [`FieldSelector`] naming one or more output
//! columns. Records whose row or column key is null are left out of every
//! cell and total.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use epf_pendency_models::{AggregatedRecord, AggregatedTable, Field, KeyValue, MARGIN_KEY};

/// A summary axis position: a real key or the total.
///
/// Orders every key before [`Margin::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Margin<K> {
    /// A key observed in the data.
    Key(K),
    /// The total over all keys.
    All,
}

impl<K: fmt::Display> fmt::Display for Margin<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => fmt::Display::fmt(key, f),
            Self::All => f.write_str(MARGIN_KEY),
        }
    }
}

/// Record counts keyed by row and column, with margins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTable<R, C> {
    counts: BTreeMap<R, BTreeMap<C, u64>>,
    row_totals: BTreeMap<R, u64>,
    column_totals: BTreeMap<C, u64>,
    total: u64,
}

impl<R: Ord, C: Ord> SummaryTable<R, C> {
    const fn empty() -> Self {
        Self {
            counts: BTreeMap::new(),
            row_totals: BTreeMap::new(),
            column_totals: BTreeMap::new(),
            total: 0,
        }
    }

    /// Row keys in natural order, without the margin.
    pub fn row_keys(&self) -> impl Iterator<Item = &R> {
        self.row_totals.keys()
    }

    /// Column keys in natural order, without the margin.
    pub fn column_keys(&self) -> impl Iterator<Item = &C> {
        self.column_totals.keys()
    }

    /// Row axis including the trailing [`Margin::All`].
    #[must_use]
    pub fn rows(&self) -> Vec<Margin<&R>> {
        self.row_keys()
            .map(Margin::Key)
            .chain(std::iter::once(Margin::All))
            .collect()
    }

    /// Column axis including the trailing [`Margin::All`].
    #[must_use]
    pub fn columns(&self) -> Vec<Margin<&C>> {
        self.column_keys()
            .map(Margin::Key)
            .chain(std::iter::once(Margin::All))
            .collect()
    }

    /// Count at (`row`, `column`); zero for unseen combinations.
    #[must_use]
    pub fn cell(&self, row: Margin<&R>, column: Margin<&C>) -> u64 {
        match (row, column) {
            (Margin::Key(r), Margin::Key(c)) => self
                .counts
                .get(r)
                .and_then(|columns| columns.get(c))
                .copied()
                .unwrap_or(0),
            (Margin::Key(r), Margin::All) => self.row_totals.get(r).copied().unwrap_or(0),
            (Margin::All, Margin::Key(c)) => self.column_totals.get(c).copied().unwrap_or(0),
            (Margin::All, Margin::All) => self.total,
        }
    }

    /// The (All, All) count.
    #[must_use]
    pub const fn grand_total(&self) -> u64 {
        self.total
    }

    /// Whether no record was counted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Counts `table` by the keys `row_key` and `column_key` return.
///
/// Records rejected by `filter` are dropped first. Records for which either
/// key function returns `None` are not counted.
#[must_use]
pub fn build_summary<R, C>(
    table: &AggregatedTable,
    row_key: impl Fn(&AggregatedRecord) -> Option<R>,
    column_key: impl Fn(&AggregatedRecord) -> Option<C>,
    filter: Option<&dyn Fn(&AggregatedRecord) -> bool>,
) -> SummaryTable<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
{
    let mut summary = SummaryTable::empty();
    let mut skipped = 0_usize;

    for record in table {
        if filter.is_some_and(|keep| !keep(record)) {
            continue;
        }
        let (Some(row), Some(column)) = (row_key(record), column_key(record)) else {
            skipped += 1;
            continue;
        };

        *summary.row_totals.entry(row.clone()).or_default() += 1;
        *summary.column_totals.entry(column.clone()).or_default() += 1;
        *summary
            .counts
            .entry(row)
            .or_default()
            .entry(column)
            .or_default() += 1;
        summary.total += 1;
    }

    if skipped > 0 {
        log::debug!("{skipped} records with a null summary key were not counted");
    }

    summary
}

/// Builds a predicate keeping records whose `pending_at` label is `label`.
pub fn pending_at(label: &str) -> impl Fn(&AggregatedRecord) -> bool + '_ {
    move |record: &AggregatedRecord| record.source_label == label
}

/// A key made of one or more column values, displayed joined by `" / "`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(pub Vec<KeyValue>);

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" / ")?;
            }
            fmt::Display::fmt(value, f)?;
        }
        Ok(())
    }
}

/// One or more output columns whose values together form a summary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSelector(Vec<Field>);

impl FieldSelector {
    /// Selects `fields`, in order.
    #[must_use]
    pub const fn new(fields: Vec<Field>) -> Self {
        Self(fields)
    }

    /// Reads the key from `record`, or `None` if any component is null.
    #[must_use]
    pub fn key(&self, record: &AggregatedRecord) -> Option<CompositeKey> {
        self.0
            .iter()
            .map(|field| field.value(record))
            .collect::<Option<Vec<_>>>()
            .map(CompositeKey)
    }
}

impl From<Field> for FieldSelector {
    fn from(field: Field) -> Self {
        Self(vec![field])
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, field) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            f.write_str(field.as_ref())?;
        }
        Ok(())
    }
}

impl FromStr for FieldSelector {
    type Err = String;

    /// Parses a comma-separated list of column names, e.g. `group,task`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split(',')
            .map(str::trim)
            .map(|name| Field::from_str(name).map_err(|_| format!("unknown column '{name}'")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(fields))
    }
}

/// Counts `table` by two column selections, optionally restricted to one
/// `pending_at` label.
#[must_use]
pub fn summarize_fields(
    table: &AggregatedTable,
    rows: &FieldSelector,
    columns: &FieldSelector,
    pending_at_label: Option<&str>,
) -> SummaryTable<CompositeKey, CompositeKey> {
    let label_filter = pending_at_label.map(pending_at);
    build_summary(
        table,
        |record| rows.key(record),
        |record| columns.key(record),
        label_filter
            .as_ref()
            .map(|keep| keep as &dyn Fn(&AggregatedRecord) -> bool),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use epf_pendency_models::{CategorizedRecord, ClaimRecord, DaysCategory, Officer};

    fn row(
        group: Option<i64>,
        task: &str,
        days_cat: Option<(usize, &str)>,
        officer: Option<Officer>,
    ) -> CategorizedRecord {
        CategorizedRecord {
            claim: ClaimRecord {
                group: group.map_or_else(|| "GRP".to_owned(), |g| g.to_string()),
                task: task.to_owned(),
                officer_name: "John Doe".to_owned(),
                serial: "1".to_owned(),
                claim_id: "123456789012".to_owned(),
                date: "01/02/2023".to_owned(),
                member_id: "PYKRP00534130000030651".to_owned(),
                member_name: " ".to_owned(),
                form_type: "Form-19".to_owned(),
                pending_days_raw: "5".to_owned(),
            },
            pending_days: Some(5),
            group_numeric: group,
            days_category: days_cat.map(|(rank, label)| DaysCategory {
                rank,
                label: label.to_owned(),
            }),
            officer,
        }
    }

    fn table() -> AggregatedTable {
        let mut table = AggregatedTable::new();
        table.extend_labeled(
            "DA",
            vec![
                row(Some(101), "10101", Some((0, "0-10 Days")), Some(Officer::OfficerD)),
                row(Some(101), "10102", Some((3, ">=20 Days")), Some(Officer::OfficerD)),
                row(Some(104), "10401", Some((1, "11-15 Days")), Some(Officer::OfficerC)),
                row(None, "99999", None, None),
            ],
        );
        table.extend_labeled(
            "SS",
            vec![
                row(Some(110), "11001", Some((3, ">=20 Days")), Some(Officer::OfficerA)),
                row(Some(101), "10101", Some((1, "11-15 Days")), Some(Officer::OfficerD)),
            ],
        );
        table
    }

    fn selector(s: &str) -> FieldSelector {
        s.parse().unwrap()
    }

    #[test]
    fn margins_are_consistent() {
        let table = table();
        let summary = summarize_fields(&table, &selector("officer"), &selector("days_cat"), None);

        let mut inner_sum = 0;
        for r in summary.row_keys() {
            let row_sum: u64 = summary
                .column_keys()
                .map(|c| summary.cell(Margin::Key(r), Margin::Key(c)))
                .sum();
            assert_eq!(row_sum, summary.cell(Margin::Key(r), Margin::All));
            inner_sum += row_sum;
        }
        for c in summary.column_keys() {
            let column_sum: u64 = summary
                .row_keys()
                .map(|r| summary.cell(Margin::Key(r), Margin::Key(c)))
                .sum();
            assert_eq!(column_sum, summary.cell(Margin::All, Margin::Key(c)));
        }
        assert_eq!(inner_sum, summary.grand_total());
        assert_eq!(summary.grand_total(), 5);
    }

    #[test]
    fn keys_sort_naturally_with_margin_last() {
        let table = table();
        let summary = summarize_fields(&table, &selector("officer"), &selector("days_cat"), None);

        let rows: Vec<String> = summary.rows().iter().map(ToString::to_string).collect();
        assert_eq!(rows, vec!["OFFICER_A", "OFFICER_C", "OFFICER_D", "All"]);

        let columns: Vec<String> = summary.columns().iter().map(ToString::to_string).collect();
        assert_eq!(columns, vec!["0-10 Days", "11-15 Days", ">=20 Days", "All"]);
    }

    #[test]
    fn numeric_keys_sort_numerically() {
        let mut table = AggregatedTable::new();
        table.extend_labeled(
            "DA",
            vec![
                row(Some(1000), "1", None, None),
                row(Some(99), "1", None, None),
                row(Some(101), "1", None, None),
            ],
        );
        let summary = summarize_fields(&table, &selector("group"), &selector("pending_at"), None);
        let rows: Vec<String> = summary.rows().iter().map(ToString::to_string).collect();
        assert_eq!(rows, vec!["99", "101", "1000", "All"]);
    }

    #[test]
    fn null_keys_do_not_contribute() {
        let table = table();
        let summary = summarize_fields(&table, &selector("group"), &selector("pending_at"), None);
        let da = CompositeKey(vec![KeyValue::Text("DA".to_owned())]);
        assert_eq!(summary.grand_total(), 5);
        assert_eq!(
            summary.cell(Margin::All, Margin::Key(&da)),
            3
        );
    }

    #[test]
    fn pending_at_filter_applies_first() {
        let table = table();
        let summary =
            summarize_fields(&table, &selector("group"), &selector("days_cat"), Some("SS"));
        assert_eq!(summary.grand_total(), 2);
        let rows: Vec<String> = summary.rows().iter().map(ToString::to_string).collect();
        assert_eq!(rows, vec!["101", "110", "All"]);
    }

    #[test]
    fn composite_keys_join_components() {
        let table = table();
        let summary =
            summarize_fields(&table, &selector("group,task"), &selector("pending_at"), None);
        let rows: Vec<String> = summary.rows().iter().map(ToString::to_string).collect();
        assert_eq!(
            rows,
            vec!["101 / 10101", "101 / 10102", "104 / 10401", "110 / 11001", "All"]
        );
        let key = CompositeKey(vec![KeyValue::Number(101), KeyValue::Text("10101".to_owned())]);
        assert_eq!(summary.cell(Margin::Key(&key), Margin::All), 2);
    }

    #[test]
    fn empty_result_has_only_grand_total() {
        let table = table();
        let summary =
            summarize_fields(&table, &selector("group"), &selector("days_cat"), Some("RO"));
        assert!(summary.is_empty());
        assert_eq!(summary.rows(), vec![Margin::All]);
        assert_eq!(summary.columns(), vec![Margin::All]);
        assert_eq!(summary.cell(Margin::All, Margin::All), 0);

        let empty = AggregatedTable::new();
        let summary = summarize_fields(&empty, &selector("group"), &selector("days_cat"), None);
        assert!(summary.is_empty());
    }

    #[test]
    fn custom_key_functions() {
        let table = table();
        let summary = build_summary(
            &table,
            |r| r.record.officer,
            |r| Some(r.source_label.clone()),
            None,
        );
        assert_eq!(
            summary.cell(Margin::Key(&Officer::OfficerD), Margin::Key(&"DA".to_owned())),
            2
        );
        assert_eq!(summary.cell(Margin::Key(&Officer::OfficerB), Margin::All), 0);
    }

    #[test]
    fn rejects_unknown_columns() {
        assert!("group,nope".parse::<FieldSelector>().is_err());
        assert_eq!(selector("group, task").to_string(), "group,task");
    }
}
