// src/roster.rs
//! Loads employees and schedule rules from CSV files.
//!
//! `employees.csv`: `id,name,external_id,department`
//! `schedules.csv`: `employee_id,day_of_week,official_entry_time,day_off`

use std::io::Read;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::collaborators::{Employee, EmployeeId, InMemoryDirectory};
use crate::schedule::{ScheduleBook, ScheduleError, ScheduleRule};

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("schedule rule on line {line}: {source}")]
    Schedule {
        line: usize,
        #[source]
        source: ScheduleError,
    },
}

#[derive(Debug, Deserialize)]
struct EmployeeRow {
    id: u64,
    name: String,
    #[serde(default)]
    external_id: Option<String>,
    #[serde(default)]
    department: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn load_employees<R: Read>(reader: R) -> Result<InMemoryDirectory, RosterError> {
    let mut directory = InMemoryDirectory::new();
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    for row in csv_reader.deserialize() {
        let row: EmployeeRow = row?;
        directory.insert(Employee {
            id: EmployeeId(row.id),
            name: row.name,
            external_id: blank_to_none(row.external_id),
            department: blank_to_none(row.department),
        });
    }
    info!("Loaded {} employees", directory.employees().count());
    Ok(directory)
}

pub fn load_schedules<R: Read>(reader: R) -> Result<ScheduleBook, RosterError> {
    let mut book = ScheduleBook::new();
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    for (idx, row) in csv_reader.deserialize().enumerate() {
        let rule: ScheduleRule = row?;
        book.add_rule(rule)
            .map_err(|source| RosterError::Schedule { line: idx + 2, source })?;
    }
    info!("Loaded {} schedule rules", book.len());
    Ok(book)
}
