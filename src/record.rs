// src/record.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One employee-day as read from an export, before schedules are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedDailyRow {
    pub employee_name: String,
    pub employee_external_id: Option<String>,
    pub department: Option<String>,
    pub date: NaiveDate,
    pub attended: bool,
    /// `HH:MM` as found in the file
    pub first_entry: Option<String>,
    pub last_exit: Option<String>,
    /// Known for the events report layout, `None` for generic tabular exports.
    pub total_event_count: Option<u32>,
    pub early_exit_minutes: u32,
}
