// src/lib.rs
//! Timeclock export import and attendance compliance.

pub mod collaborators;
pub mod columns;
pub mod compliance;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod export;
pub mod format;
pub mod import;
pub mod record;
pub mod report_layout;
pub mod roster;
pub mod schedule;
pub mod server;
pub mod tabular;
pub mod time_parser;

#[cfg(test)]
mod import_tests;

pub use collaborators::{
    AttendanceStore, Employee, EmployeeDirectory, EmployeeId, InMemoryAttendanceStore,
    InMemoryDirectory, ResolutionPolicy,
};
pub use compliance::{DailyComplianceRecord, DailyStatus, RangeSummary, SummaryStatus, VerdictKind};
pub use config::AppConfig;
pub use error::{ImportError, StoreError};
pub use format::FormatDetector;
pub use import::{ImportOutcome, Importer};
pub use record::NormalizedDailyRow;
pub use schedule::{ScheduleBook, ScheduleStore};
