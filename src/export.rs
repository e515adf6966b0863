// src/export.rs
//! CSV export of daily records and range summaries.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::collaborators::{EmployeeDirectory, EmployeeId};
use crate::compliance::{DailyComplianceRecord, RangeSummary, SummaryStatus, VerdictKind};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    employee_id: EmployeeId,
    employee: &'a str,
    date: NaiveDate,
    day_of_week: &'static str,
    attended: bool,
    first_entry: Option<&'a str>,
    last_exit: Option<&'a str>,
    total_records: u32,
    official_entry_time: &'a str,
    late_minutes: u32,
    early_exit_minutes: u32,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    employee_id: EmployeeId,
    employee: &'a str,
    date_from: NaiveDate,
    date_to: NaiveDate,
    total_days: u32,
    attended_days: u32,
    absences: u32,
    total_late_minutes: u32,
    total_early_minutes: u32,
    avg_late_minutes: String,
    avg_early_minutes: String,
    verdict: VerdictKind,
    verdict_text: &'a str,
    status: SummaryStatus,
}

fn employee_name<'a, D: EmployeeDirectory + ?Sized>(directory: &'a D, id: EmployeeId) -> &'a str {
    directory.get(id).map(|e| e.name.as_str()).unwrap_or("")
}

pub fn write_records<'a, W, D, I>(
    writer: W,
    directory: &D,
    records: I,
) -> Result<usize, ExportError>
where
    W: Write,
    D: EmployeeDirectory + ?Sized,
    I: IntoIterator<Item = &'a DailyComplianceRecord>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for record in records {
        csv_writer.serialize(RecordRow {
            employee_id: record.employee,
            employee: employee_name(directory, record.employee),
            date: record.date,
            day_of_week: record.day_of_week(),
            attended: record.attended(),
            first_entry: record.first_entry(),
            last_exit: record.last_exit.as_deref(),
            total_records: record.total_event_count,
            official_entry_time: record.official_entry_time(),
            late_minutes: record.late_minutes(),
            early_exit_minutes: record.early_exit_minutes,
            status: record.status().label(),
        })?;
        written += 1;
    }
    csv_writer.flush()?;
    Ok(written)
}

pub fn write_summaries<'a, W, D, I>(
    writer: W,
    directory: &D,
    summaries: I,
) -> Result<usize, ExportError>
where
    W: Write,
    D: EmployeeDirectory + ?Sized,
    I: IntoIterator<Item = &'a RangeSummary>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for summary in summaries {
        csv_writer.serialize(SummaryRow {
            employee_id: summary.employee,
            employee: employee_name(directory, summary.employee),
            date_from: summary.date_from,
            date_to: summary.date_to,
            total_days: summary.totals.total_days,
            attended_days: summary.totals.attended_days,
            absences: summary.totals.absences,
            total_late_minutes: summary.totals.total_late_minutes,
            total_early_minutes: summary.totals.total_early_minutes,
            avg_late_minutes: format!("{:.2}", summary.totals.avg_late_minutes),
            avg_early_minutes: format!("{:.2}", summary.totals.avg_early_minutes),
            verdict: summary.verdict,
            verdict_text: &summary.verdict_text,
            status: summary.status,
        })?;
        written += 1;
    }
    csv_writer.flush()?;
    Ok(written)
}

/// Writes `records.csv` and `summaries.csv` into `dir`.
pub fn export_to_dir<'a, D, R, S>(
    dir: &Path,
    directory: &D,
    records: R,
    summaries: S,
) -> Result<(), ExportError>
where
    D: EmployeeDirectory + ?Sized,
    R: IntoIterator<Item = &'a DailyComplianceRecord>,
    S: IntoIterator<Item = &'a RangeSummary>,
{
    std::fs::create_dir_all(dir)?;
    let records_path = dir.join("records.csv");
    let summaries_path = dir.join("summaries.csv");
    let record_count = write_records(File::create(&records_path)?, directory, records)?;
    let summary_count = write_summaries(File::create(&summaries_path)?, directory, summaries)?;
    info!(
        "Exported {} records to {} and {} summaries to {}",
        record_count,
        records_path.display(),
        summary_count,
        summaries_path.display()
    );
    Ok(())
}
