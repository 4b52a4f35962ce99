//! Derived views over the record store: daily totals, monthly aggregates and the CSV export.
//!
//! Everything here is a pure function of its inputs.

use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, DailyRecord, DateKey};
use crate::store::RecordStore;
use crate::Result;
use anyhow::Context;
use serde::Serialize;

/// The total for a single day, using the record schema's formula.
pub fn daily_total<R: DailyRecord>(record: &R) -> Amount {
    record.total()
}

/// Totals over every stored day that shares a calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyAggregate {
    /// `YYYY-MM`
    pub month: String,
    /// Number of stored days in the month.
    pub days: usize,
    pub total: Amount,
    /// `total / days`, or zero when there are no days.
    pub average: Amount,
}

/// Sums the daily totals of every stored day in the month of `date` and averages them over the
/// number of stored days. A month with no stored days yields zero for both.
pub fn monthly_aggregate<R: DailyRecord>(store: &RecordStore<R>, date: &DateKey) -> MonthlyAggregate {
    let (days, total) = store
        .iter()
        .filter(|(key, _)| key.same_month(date))
        .fold((0usize, Amount::ZERO), |(days, total), (_, record)| {
            (days + 1, total + daily_total(record))
        });
    MonthlyAggregate {
        month: date.month_prefix(),
        days,
        total,
        average: total.average_over(days),
    }
}

/// One exported day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub date: DateKey,
    /// The schema's raw fields, including its computed total where it has one.
    pub fields: Vec<String>,
    /// The notebook text, unescaped.
    pub notebook: String,
}

impl ExportRow {
    /// The CSV cells of the row, with the notebook quoted.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.fields.len() + 2);
        cells.push(self.date.to_string());
        cells.extend(self.fields.iter().cloned());
        cells.push(quote_field(&self.notebook));
        cells
    }
}

/// One row per stored day, in ascending date order.
pub fn export_rows<R: DailyRecord>(store: &RecordStore<R>) -> Vec<ExportRow> {
    let mut rows: Vec<ExportRow> = store
        .iter()
        .map(|(date, record)| ExportRow {
            date: *date,
            fields: record.csv_fields(),
            notebook: record.notebook().to_string(),
        })
        .collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date));
    rows
}

/// The header row for schema `R`: `Date`, the schema's columns, then `Notebook`.
pub fn csv_header<R: DailyRecord>() -> Vec<&'static str> {
    let mut header = Vec::with_capacity(R::CSV_COLUMNS.len() + 2);
    header.push("Date");
    header.extend_from_slice(R::CSV_COLUMNS);
    header.push("Notebook");
    header
}

/// Wraps `text` in double quotes, doubling any embedded double quote.
pub fn quote_field(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Renders the header and every export row as CSV with CRLF line endings.
///
/// Only the notebook column is quoted. The other columns are dates and numbers and never need
/// it.
pub fn render_csv<R: DailyRecord>(store: &RecordStore<R>) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer
        .write_record(csv_header::<R>())
        .context("Unable to write the CSV header")?;
    for row in export_rows(store) {
        writer
            .write_record(row.cells())
            .with_context(|| format!("Unable to write the CSV row for {}", row.date))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish the CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("The CSV output is not valid UTF-8")
}

/// Writes the CSV export of `store` to `path`.
///
/// # Errors
/// - A `Validation` error if the store is empty, there is nothing to export.
/// - An `Io` error if the file cannot be written.
pub async fn export<R: DailyRecord>(store: &RecordStore<R>, path: &std::path::Path) -> Result<usize> {
    if store.is_empty() {
        return Err(crate::error::validation("There is no data to export"));
    }
    let csv = render_csv(store)?;
    crate::utils::write(path, csv)
        .await
        .pub_result(ErrorType::Io)?;
    Ok(store.len())
}
