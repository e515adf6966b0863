// src/collaborators.rs
//! Employee directory and attendance persistence used by the importer.
//!
//! The traits are what the import pipeline needs; the in-memory implementations back
//! the CLI and the tests.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compliance::{DailyComplianceRecord, RangeSummary};
use crate::error::StoreError;
use crate::record::NormalizedDailyRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    /// Identification number as printed in timeclock exports
    pub external_id: Option<String>,
    pub department: Option<String>,
}

// --- Employee resolution ---

pub trait EmployeeDirectory {
    fn get(&self, id: EmployeeId) -> Option<&Employee>;
    fn find_by_external_id(&self, external_id: &str) -> Option<EmployeeId>;
    fn find_by_name(&self, name: &str) -> Option<EmployeeId>;
    fn create_stub(&mut self, name: &str, department: Option<&str>) -> EmployeeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// Rows naming an unknown employee create a minimal employee by name.
    #[default]
    CreateMissing,
    /// Rows naming an unknown employee are dropped.
    DropMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    ByExternalId(EmployeeId),
    ByName(EmployeeId),
    Created(EmployeeId),
    Unresolved,
}

impl Resolution {
    pub fn employee(&self) -> Option<EmployeeId> {
        match self {
            Resolution::ByExternalId(id) | Resolution::ByName(id) | Resolution::Created(id) => {
                Some(*id)
            }
            Resolution::Unresolved => None,
        }
    }
}

/// Exact external id first, then exact name, then (policy permitting) a new stub.
pub fn resolve_employee<D: EmployeeDirectory + ?Sized>(
    directory: &mut D,
    row: &NormalizedDailyRow,
    policy: ResolutionPolicy,
) -> Resolution {
    if let Some(id) = row
        .employee_external_id
        .as_deref()
        .and_then(|ext| directory.find_by_external_id(ext))
    {
        return Resolution::ByExternalId(id);
    }
    let name = row.employee_name.trim();
    if name.is_empty() {
        return Resolution::Unresolved;
    }
    if let Some(id) = directory.find_by_name(name) {
        return Resolution::ByName(id);
    }
    match policy {
        ResolutionPolicy::CreateMissing => {
            Resolution::Created(directory.create_stub(name, row.department.as_deref()))
        }
        ResolutionPolicy::DropMissing => Resolution::Unresolved,
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    employees: BTreeMap<EmployeeId, Employee>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee.
    pub fn insert(&mut self, employee: Employee) {
        self.employees.insert(employee.id, employee);
    }

    pub fn employees(&self) -> impl Iterator<Item = &Employee> {
        self.employees.values()
    }

    fn next_id(&self) -> EmployeeId {
        EmployeeId(self.employees.keys().next_back().map(|id| id.0 + 1).unwrap_or(1))
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn get(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.get(&id)
    }

    fn find_by_external_id(&self, external_id: &str) -> Option<EmployeeId> {
        let wanted = external_id.trim();
        self.employees
            .values()
            .find(|e| e.external_id.as_deref().map(str::trim) == Some(wanted))
            .map(|e| e.id)
    }

    // Names are compared trimmed and case-insensitively.
    fn find_by_name(&self, name: &str) -> Option<EmployeeId> {
        let wanted = name.trim().to_lowercase();
        self.employees
            .values()
            .find(|e| e.name.trim().to_lowercase() == wanted)
            .map(|e| e.id)
    }

    fn create_stub(&mut self, name: &str, department: Option<&str>) -> EmployeeId {
        let id = self.next_id();
        info!("Creating employee {} for unknown name '{}'", id, name);
        self.insert(Employee {
            id,
            name: name.trim().to_string(),
            external_id: None,
            department: department.map(str::to_string),
        });
        id
    }
}

// --- Persistence ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

pub trait AttendanceStore {
    /// Stores a record; a second record for the same (employee, date) is rejected.
    fn create_daily_record(&mut self, record: DailyComplianceRecord) -> Result<(), StoreError>;

    /// Records of `employee` dated within `[date_from, date_to]`, oldest first.
    fn records_in_range(
        &self,
        employee: EmployeeId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Vec<&DailyComplianceRecord>;

    /// Creates the summary for (employee, date_from, date_to) or overwrites it in place.
    fn upsert_summary(&mut self, summary: RangeSummary) -> Result<UpsertOutcome, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAttendanceStore {
    records: BTreeMap<(EmployeeId, NaiveDate), DailyComplianceRecord>,
    summaries: HashMap<(EmployeeId, NaiveDate, NaiveDate), RangeSummary>,
}

impl InMemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> impl Iterator<Item = &DailyComplianceRecord> {
        self.records.values()
    }

    pub fn record(&self, employee: EmployeeId, date: NaiveDate) -> Option<&DailyComplianceRecord> {
        self.records.get(&(employee, date))
    }

    /// Summaries ordered by employee, then range.
    pub fn summaries(&self) -> Vec<&RangeSummary> {
        let mut summaries: Vec<&RangeSummary> = self.summaries.values().collect();
        summaries.sort_by_key(|s| (s.employee, s.date_from, s.date_to));
        summaries
    }

    pub fn summary(
        &self,
        employee: EmployeeId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Option<&RangeSummary> {
        self.summaries.get(&(employee, date_from, date_to))
    }
}

impl AttendanceStore for InMemoryAttendanceStore {
    fn create_daily_record(&mut self, record: DailyComplianceRecord) -> Result<(), StoreError> {
        let key = (record.employee, record.date);
        if self.records.contains_key(&key) {
            return Err(StoreError::DuplicateRecord {
                employee: record.employee,
                date: record.date,
            });
        }
        debug!(
            "Stored record employee={} date={} status={:?}",
            record.employee,
            record.date,
            record.status()
        );
        self.records.insert(key, record);
        Ok(())
    }

    fn records_in_range(
        &self,
        employee: EmployeeId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Vec<&DailyComplianceRecord> {
        if date_from > date_to {
            return Vec::new();
        }
        self.records
            .range((employee, date_from)..=(employee, date_to))
            .map(|(_, record)| record)
            .collect()
    }

    fn upsert_summary(&mut self, summary: RangeSummary) -> Result<UpsertOutcome, StoreError> {
        if summary.date_from > summary.date_to {
            return Err(StoreError::InvalidRange {
                date_from: summary.date_from,
                date_to: summary.date_to,
            });
        }
        let key = (summary.employee, summary.date_from, summary.date_to);
        match self.summaries.insert(key, summary) {
            Some(_) => Ok(UpsertOutcome::Updated),
            None => Ok(UpsertOutcome::Created),
        }
    }
}
