// src/import.rs
//! One import call: bytes in, daily records and range summaries out.
//!
//! Everything that can abort (decoding, spreadsheet access, an empty result) happens
//! before the first write. After that, problems are per row and only drop that row.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::collaborators::{
    resolve_employee, AttendanceStore, EmployeeDirectory, EmployeeId, Resolution,
    ResolutionPolicy,
};
use crate::compliance::{DailyComplianceRecord, RangeSummary};
use crate::error::{ImportError, StoreError};
use crate::format::FormatDetector;
use crate::schedule::ScheduleStore;

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub records_created: usize,
    /// Rows whose (employee, date) already had a record
    pub duplicates_skipped: usize,
    /// Rows dropped because the employee could not be resolved
    pub unresolved_rows: usize,
    /// Rows dropped because their date could not be parsed
    pub rejected_rows: usize,
    pub employees_created: Vec<EmployeeId>,
    pub summaries: Vec<RangeSummary>,
}

pub struct Importer<D, S, P> {
    directory: D,
    schedules: S,
    store: P,
    policy: ResolutionPolicy,
}

impl<D, S, P> Importer<D, S, P>
where
    D: EmployeeDirectory,
    S: ScheduleStore,
    P: AttendanceStore,
{
    pub fn new(directory: D, schedules: S, store: P) -> Self {
        Self {
            directory,
            schedules,
            store,
            policy: ResolutionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn into_parts(self) -> (D, S, P) {
        (self.directory, self.schedules, self.store)
    }

    /// Imports one uploaded file. `today` anchors the default period of events reports
    /// that do not declare one.
    pub fn import(
        &mut self,
        bytes: &[u8],
        filename: Option<&str>,
        today: NaiveDate,
    ) -> Result<ImportOutcome, ImportError> {
        let detected = FormatDetector::new(today).read(bytes, filename)?;
        if detected.rows.is_empty() {
            return Err(ImportError::NoValidRows);
        }
        info!(
            "Importing {} rows from {} ({} rejected while parsing)",
            detected.rows.len(),
            filename.unwrap_or("<unnamed>"),
            detected.rejected.len()
        );

        let mut outcome = ImportOutcome {
            records_created: 0,
            duplicates_skipped: 0,
            unresolved_rows: 0,
            rejected_rows: detected.rejected.len(),
            employees_created: Vec::new(),
            summaries: Vec::new(),
        };
        let mut windows: BTreeMap<EmployeeId, (NaiveDate, NaiveDate)> = BTreeMap::new();

        for row in &detected.rows {
            let resolution = resolve_employee(&mut self.directory, row, self.policy);
            let Some(employee_id) = resolution.employee() else {
                debug!(
                    "Dropping row for unresolved employee '{}' on {}",
                    row.employee_name, row.date
                );
                outcome.unresolved_rows += 1;
                continue;
            };
            if let Resolution::Created(id) = resolution {
                outcome.employees_created.push(id);
            }
            let Some(employee) = self.directory.get(employee_id) else {
                warn!("Directory resolved {} but cannot return it", employee_id);
                outcome.unresolved_rows += 1;
                continue;
            };

            let official = self.schedules.official_entry(employee, row.date);
            let record = DailyComplianceRecord::new(employee_id, row, &official.time);
            if let Some(fallback) = record.lateness().fallback {
                debug!(
                    "Lateness for employee {} on {} defaulted to 0: {:?}",
                    employee_id, row.date, fallback
                );
            }

            match self.store.create_daily_record(record) {
                Ok(()) => outcome.records_created += 1,
                Err(StoreError::DuplicateRecord { employee, date }) => {
                    warn!(
                        "Skipping duplicate record for employee {} on {}",
                        employee, date
                    );
                    outcome.duplicates_skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }

            windows
                .entry(employee_id)
                .and_modify(|(from, to)| {
                    *from = (*from).min(row.date);
                    *to = (*to).max(row.date);
                })
                .or_insert((row.date, row.date));
        }

        for (employee, (date_from, date_to)) in windows {
            let summary = RangeSummary::build(
                employee,
                date_from,
                date_to,
                self.store.records_in_range(employee, date_from, date_to),
            );
            let upsert = self.store.upsert_summary(summary.clone())?;
            info!(
                "Summary for employee {} {}..{}: {} ({:?}, {:?})",
                employee, date_from, date_to, summary.verdict_text, summary.status, upsert
            );
            outcome.summaries.push(summary);
        }

        info!(
            "Import finished: {} created, {} duplicates, {} unresolved, {} rejected",
            outcome.records_created,
            outcome.duplicates_skipped,
            outcome.unresolved_rows,
            outcome.rejected_rows
        );
        Ok(outcome)
    }
}
