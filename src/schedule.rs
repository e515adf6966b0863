// src/schedule.rs
//! Official entry times: per-employee weekday rules with department and global defaults.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::collaborators::{Employee, EmployeeId};

pub const GLOBAL_DEFAULT_ENTRY: &str = "9:00 AM";

// Keyword matched against the lower-cased department name, first hit wins.
const DEPARTMENT_DEFAULTS: [(&str, &str); 3] = [
    ("producc", "9:45 AM"),
    ("ventas", "9:00 AM"),
    ("administr", "8:00 AM"),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("day_of_week must be 0 (Monday) to 6 (Sunday), got {0}")]
    InvalidWeekday(u8),
    #[error("employee {employee} already has a rule for weekday {day_of_week}")]
    DuplicateRule { employee: EmployeeId, day_of_week: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub employee_id: EmployeeId,
    /// 0 = Monday ... 6 = Sunday
    pub day_of_week: u8,
    /// e.g. "8:30 AM"
    pub official_entry_time: String,
    #[serde(default)]
    pub day_off: bool,
}

/// Where an official entry time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    EmployeeRule,
    DepartmentDefault(&'static str),
    GlobalDefault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficialEntry {
    pub time: String,
    pub source: EntrySource,
}

pub trait ScheduleStore {
    fn official_entry(&self, employee: &Employee, date: NaiveDate) -> OfficialEntry;

    fn get_official_entry(&self, employee: &Employee, date: NaiveDate) -> String {
        self.official_entry(employee, date).time
    }
}

/// Default entry time for a department name, if one of the known keywords matches.
pub fn department_default(department: &str) -> Option<(&'static str, &'static str)> {
    let name = department.to_lowercase();
    DEPARTMENT_DEFAULTS
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .copied()
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleBook {
    rules: HashMap<(EmployeeId, u8), ScheduleRule>,
}

impl ScheduleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: ScheduleRule) -> Result<(), ScheduleError> {
        if rule.day_of_week > 6 {
            return Err(ScheduleError::InvalidWeekday(rule.day_of_week));
        }
        let key = (rule.employee_id, rule.day_of_week);
        if self.rules.contains_key(&key) {
            return Err(ScheduleError::DuplicateRule {
                employee: rule.employee_id,
                day_of_week: rule.day_of_week,
            });
        }
        self.rules.insert(key, rule);
        Ok(())
    }

    pub fn rule(&self, employee: EmployeeId, day_of_week: u8) -> Option<&ScheduleRule> {
        self.rules.get(&(employee, day_of_week))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl ScheduleStore for ScheduleBook {
    fn official_entry(&self, employee: &Employee, date: NaiveDate) -> OfficialEntry {
        let weekday = date.weekday().num_days_from_monday() as u8;
        if let Some(rule) = self.rule(employee.id, weekday) {
            return OfficialEntry {
                time: rule.official_entry_time.clone(),
                source: EntrySource::EmployeeRule,
            };
        }
        if let Some((keyword, time)) = employee.department.as_deref().and_then(department_default) {
            debug!(
                "No rule for employee {} on weekday {}, using '{}' department default",
                employee.id, weekday, keyword
            );
            return OfficialEntry {
                time: time.to_string(),
                source: EntrySource::DepartmentDefault(keyword),
            };
        }
        OfficialEntry {
            time: GLOBAL_DEFAULT_ENTRY.to_string(),
            source: EntrySource::GlobalDefault,
        }
    }
}
