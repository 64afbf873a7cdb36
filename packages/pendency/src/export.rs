//! CSV output of claim tables and summaries.
//!
//! Headers are written explicitly from the column schemas so that an empty
//! table still produces its header line. Categorized and aggregated tables
//! carry the coerced `group` and `days` values, empty when null.

use std::fmt::Display;
use std::io::Write;

use epf_pendency_models::{
    AGGREGATED_COLUMNS, AggregatedRecord, AggregatedTable, CATEGORIZED_COLUMNS, CategorizedRecord,
    ClaimRecord, Officer, RAW_COLUMNS,
};
use serde::Serialize;

use crate::PendencyError;
use crate::summary::SummaryTable;
use crate::validate::{VALIDATED_FIELDS, ValidationReport};

#[derive(Serialize)]
struct CategorizedRow<'a> {
    group: Option<i64>,
    task: &'a str,
    name: &'a str,
    sr: &'a str,
    id: &'a str,
    date: &'a str,
    memid: &'a str,
    memname: &'a str,
    form: &'a str,
    days: Option<i64>,
    days_cat: Option<&'a str>,
    officer: Option<Officer>,
}

impl<'a> From<&'a CategorizedRecord> for CategorizedRow<'a> {
    fn from(record: &'a CategorizedRecord) -> Self {
        let claim = &record.claim;
        Self {
            group: record.group_numeric,
            task: &claim.task,
            name: &claim.officer_name,
            sr: &claim.serial,
            id: &claim.claim_id,
            date: &claim.date,
            memid: &claim.member_id,
            memname: &claim.member_name,
            form: &claim.form_type,
            days: record.pending_days,
            days_cat: record.days_category.as_ref().map(|c| c.label.as_str()),
            officer: record.officer,
        }
    }
}

#[derive(Serialize)]
struct AggregatedRow<'a> {
    group: Option<i64>,
    task: &'a str,
    name: &'a str,
    sr: &'a str,
    id: &'a str,
    date: &'a str,
    memid: &'a str,
    memname: &'a str,
    form: &'a str,
    days: Option<i64>,
    days_cat: Option<&'a str>,
    officer: Option<Officer>,
    pending_at: &'a str,
}

impl<'a> From<&'a AggregatedRecord> for AggregatedRow<'a> {
    fn from(row: &'a AggregatedRecord) -> Self {
        let CategorizedRow {
            group,
            task,
            name,
            sr,
            id,
            date,
            memid,
            memname,
            form,
            days,
            days_cat,
            officer,
        } = CategorizedRow::from(&row.record);
        Self {
            group,
            task,
            name,
            sr,
            id,
            date,
            memid,
            memname,
            form,
            days,
            days_cat,
            officer,
            pending_at: &row.source_label,
        }
    }
}

fn csv_writer<W: Write>(sink: W, header: &[&str]) -> Result<csv::Writer<W>, PendencyError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);
    writer.write_record(header)?;
    Ok(writer)
}

/// Writes parsed claims under [`RAW_COLUMNS`].
///
/// # Errors
///
/// Returns [`PendencyError`] if serialization or the underlying write fails.
pub fn write_claims<W: Write>(sink: W, records: &[ClaimRecord]) -> Result<(), PendencyError> {
    let mut writer = csv_writer(sink, &RAW_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes categorized claims under [`CATEGORIZED_COLUMNS`].
///
/// # Errors
///
/// Returns [`PendencyError`] if serialization or the underlying write fails.
pub fn write_categorized<W: Write>(
    sink: W,
    records: &[CategorizedRecord],
) -> Result<(), PendencyError> {
    let mut writer = csv_writer(sink, &CATEGORIZED_COLUMNS)?;
    for record in records {
        writer.serialize(CategorizedRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes an aggregated table under [`AGGREGATED_COLUMNS`].
///
/// # Errors
///
/// Returns [`PendencyError`] if serialization or the underlying write fails.
pub fn write_aggregated<W: Write>(sink: W, table: &AggregatedTable) -> Result<(), PendencyError> {
    let mut writer = csv_writer(sink, &AGGREGATED_COLUMNS)?;
    for row in table {
        writer.serialize(AggregatedRow::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a summary as a matrix with `corner` in the top-left cell, the
/// column keys across and the row keys down, each axis ending in `All`.
///
/// # Errors
///
/// Returns [`PendencyError`] if the underlying write fails.
pub fn write_summary<W, R, C>(
    sink: W,
    summary: &SummaryTable<R, C>,
    corner: &str,
) -> Result<(), PendencyError>
where
    W: Write,
    R: Ord + Display,
    C: Ord + Display,
{
    let columns = summary.columns();
    let mut header = vec![corner.to_owned()];
    header.extend(columns.iter().map(ToString::to_string));
    let header: Vec<&str> = header.iter().map(String::as_str).collect();

    let mut writer = csv_writer(sink, &header)?;
    for row in summary.rows() {
        let mut record = vec![row.to_string()];
        record.extend(
            columns
                .iter()
                .map(|&column| summary.cell(row, column).to_string()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one row per document: its id, the number of claims checked and
/// the invalid count for each validated column.
///
/// # Errors
///
/// Returns [`PendencyError`] if the underlying write fails.
pub fn write_validation<W, D>(
    sink: W,
    reports: &[(D, ValidationReport)],
) -> Result<(), PendencyError>
where
    W: Write,
    D: AsRef<str>,
{
    let fields = VALIDATED_FIELDS;
    let mut header = vec!["document", "records"];
    header.extend(fields.iter().map(AsRef::<str>::as_ref));

    let mut writer = csv_writer(sink, &header)?;
    for (document, report) in reports {
        let mut record = vec![document.as_ref().to_owned(), report.records().to_string()];
        record.extend(
            fields
                .iter()
                .map(|&field| report.invalid_count(field).to_string()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::Categorizer;
    use crate::config::HeaderProfile;
    use crate::parser::DocumentParser;
    use crate::summary::{FieldSelector, summarize_fields};
    use crate::test_fixtures::{claim_page, cover_page};
    use epf_pdf::MemoryLineSource;

    fn source() -> MemoryLineSource {
        MemoryLineSource::new()
            .with_document(
                "da",
                vec![
                    cover_page(),
                    claim_page(
                        "101",
                        "10101",
                        "John Doe",
                        &[("15", "100000000001"), ("x", "100000000002")],
                    ),
                    claim_page("GRP", "10401", "A. Kumar", &[("25", "100000000003")]),
                ],
            )
            .with_document(
                "ss",
                vec![claim_page("110", "11001", "R. Singh", &[("3", "200000000001")])],
            )
    }

    fn to_string(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn writes_raw_claims() {
        let source = source();
        let records = DocumentParser::new(&source, HeaderProfile::default())
            .parse("da")
            .unwrap();
        let mut out = Vec::new();
        write_claims(&mut out, &records).unwrap();
        let text = to_string(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "group,task,name,sr,id,date,memid,memname,form,days");
        assert_eq!(
            lines[1],
            "101,10101,John Doe,1,100000000001,01/02/2023,PYKRP00534130000030651, ,Form-19,15"
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_tables_still_have_headers() {
        let mut out = Vec::new();
        write_claims(&mut out, &[]).unwrap();
        assert_eq!(to_string(out), format!("{}\n", RAW_COLUMNS.join(",")));

        let mut out = Vec::new();
        write_aggregated(&mut out, &AggregatedTable::new()).unwrap();
        assert_eq!(to_string(out), format!("{}\n", AGGREGATED_COLUMNS.join(",")));
    }

    #[test]
    fn categorized_rows_carry_coerced_values() {
        let source = source();
        let records = DocumentParser::new(&source, HeaderProfile::default())
            .parse("da")
            .unwrap();
        let categorized = Categorizer::default().categorize(records);
        let mut out = Vec::new();
        write_categorized(&mut out, &categorized).unwrap();
        let text = to_string(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CATEGORIZED_COLUMNS.join(","));
        assert!(lines[1].starts_with("101,10101,"));
        assert!(lines[1].ends_with(",15,11-15 Days,OFFICER_D"));
        assert!(lines[2].ends_with(",Form-19,,,OFFICER_D"));
        assert!(lines[3].starts_with(",10401,"));
        assert!(lines[3].ends_with(",25,>=20 Days,"));
    }

    #[test]
    fn aggregated_rows_end_with_label() {
        let source = source();
        let parser = DocumentParser::new(&source, HeaderProfile::default());
        let table = crate::Aggregator::new(parser, Categorizer::default())
            .aggregate(&[
                crate::DocumentSpec::new("da", "DA"),
                crate::DocumentSpec::new("ss", "SS"),
            ])
            .unwrap();
        let mut out = Vec::new();
        write_aggregated(&mut out, &table).unwrap();
        let text = to_string(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].ends_with(",15,11-15 Days,OFFICER_D,DA"));
        assert!(lines[4].ends_with(",3,0-10 Days,OFFICER_A,SS"));
    }

    #[test]
    fn writes_summary_matrix() {
        let source = source();
        let parser = DocumentParser::new(&source, HeaderProfile::default());
        let table = crate::Aggregator::new(parser, Categorizer::default())
            .aggregate(&[
                crate::DocumentSpec::new("da", "DA"),
                crate::DocumentSpec::new("ss", "SS"),
            ])
            .unwrap();
        let rows: FieldSelector = "officer".parse().unwrap();
        let columns: FieldSelector = "pending_at".parse().unwrap();
        let summary = summarize_fields(&table, &rows, &columns, None);

        let mut out = Vec::new();
        write_summary(&mut out, &summary, "officer").unwrap();
        assert_eq!(
            to_string(out),
            "officer,DA,SS,All\nOFFICER_A,0,1,1\nOFFICER_D,2,0,2\nAll,2,1,3\n"
        );
    }

    #[test]
    fn writes_validation_counts() {
        let source = source();
        let records = DocumentParser::new(&source, HeaderProfile::default())
            .parse("da")
            .unwrap();
        let report = crate::validate_records("da", &records);

        let mut out = Vec::new();
        write_validation(&mut out, &[("da", report)]).unwrap();
        assert_eq!(
            to_string(out),
            "document,records,id,memid,form,group,task,date,days\nda,3,0,0,0,1,0,0,1\n"
        );
    }

    #[test]
    fn output_is_byte_identical_across_runs() {
        let source = source();
        let parser = DocumentParser::new(&source, HeaderProfile::default());
        let run = || {
            let mut out = Vec::new();
            write_claims(&mut out, &parser.parse("da").unwrap()).unwrap();
            out
        };
        assert_eq!(run(), run());
    }
}
