// src/error.rs
use chrono::NaiveDate;
use thiserror::Error;

use crate::collaborators::EmployeeId;

// --- Import errors (structural, abort the whole import) ---

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("the file contains no lines")]
    EmptyInput,
    #[error("spreadsheet support is not available ({remediation})")]
    DependencyMissing { remediation: &'static str },
    #[error("the spreadsheet could not be read: {0}")]
    MalformedFile(String),
    #[error("the file contains no valid attendance rows")]
    NoValidRows,
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Message shown to the person who uploaded the file, with the cause appended.
    pub fn user_message(&self) -> String {
        format!("Error al procesar el archivo: {}", self)
    }
}

// --- Persistence errors ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("a daily record already exists for employee {employee} on {date}")]
    DuplicateRecord { employee: EmployeeId, date: NaiveDate },
    #[error("invalid summary range: {date_from} is after {date_to}")]
    InvalidRange {
        date_from: NaiveDate,
        date_to: NaiveDate,
    },
}
