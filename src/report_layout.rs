// src/report_layout.rs
//! Parser for the device "Reporte de Eventos de Asistencia" export.
//!
//! The layout is positional:
//!
//! ```text
//! Reporte de Eventos de Asistencia
//! Periodo:,2024-01-01 ~ 2024-01-03
//! ID:,,17,Nombre:,,Ana Pérez,Departamento:,,Ventas
//! 08:0212:0117:58,08:10,
//! ```
//!
//! A block-start line carries the identity (id at segment 2, name and department two
//! segments after their labels). The line right after it holds one comma-separated cell
//! per day of the declared period, in order. Cells past the period are ignored and days
//! past the last cell are not emitted.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::record::NormalizedDailyRow;
use crate::time_parser::extract_timestamps;

/// Marker phrase on the first line of an events report.
pub const REPORT_MARKER: &str = "Reporte de Eventos de Asistencia";

const PERIOD_LABEL: &str = "Periodo:";
const ID_LABEL: &str = "ID:";
const NAME_LABEL: &str = "Nombre:";
const DEPARTMENT_LABEL: &str = "Departamento:";
const DEFAULT_NAME: &str = "Sin Nombre";
const DEFAULT_DEPARTMENT: &str = "N/A";
const DEFAULT_PERIOD_DAYS: i64 = 14;

static PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})\s*~\s*(\d{4}-\d{2}-\d{2})").expect("valid period regex")
});

/// Inclusive date range declared by the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// `true` when no `Periodo:` line was usable and the default window was applied.
    pub defaulted: bool,
}

impl ReportPeriod {
    /// The last fourteen days up to and including `today`.
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(DEFAULT_PERIOD_DAYS),
            end: today,
            defaulted: true,
        }
    }

    /// Every day from start to end, inclusive. Empty when start is after end.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .collect()
    }
}

/// Identity fields of an employee block-start line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeBlock {
    pub external_id: Option<String>,
    pub name: String,
    pub department: String,
}

pub struct ReportLayoutParser {
    today: NaiveDate,
}

impl ReportLayoutParser {
    /// `today` anchors the default period when the report declares none.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn parse(&self, lines: &[String]) -> Vec<NormalizedDailyRow> {
        let period = self.extract_period(lines);
        if period.defaulted {
            warn!(
                "No usable '{}' line in report, defaulting to {} ~ {}",
                PERIOD_LABEL, period.start, period.end
            );
        }
        let axis = period.days();
        info!(
            "Parsing events report for {} ~ {} ({} days)",
            period.start,
            period.end,
            axis.len()
        );

        let mut rows = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            if is_block_start(&lines[i]) {
                if let Some(slots) = lines.get(i + 1) {
                    let block = parse_block_header(&lines[i]);
                    debug!(
                        "Employee block '{}' (id {:?}) at line {}",
                        block.name,
                        block.external_id,
                        i + 1
                    );
                    rows.extend(rows_for_block(&block, slots, &axis));
                    i += 1;
                }
            }
            i += 1;
        }
        rows
    }

    /// Reads the declared period from the first `Periodo:` line that carries two ISO dates.
    pub fn extract_period(&self, lines: &[String]) -> ReportPeriod {
        lines
            .iter()
            .filter(|line| line.contains(PERIOD_LABEL))
            .find_map(|line| {
                let caps = PERIOD_RE.captures(line)?;
                let start = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
                let end = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d").ok()?;
                Some(ReportPeriod {
                    start,
                    end,
                    defaulted: false,
                })
            })
            .unwrap_or_else(|| ReportPeriod::default_for(self.today))
    }
}

fn is_block_start(line: &str) -> bool {
    line.contains(ID_LABEL) && line.contains(NAME_LABEL)
}

/// Splits a block-start line into the employee identity.
pub fn parse_block_header(line: &str) -> EmployeeBlock {
    let parts: Vec<&str> = line.split(',').collect();

    let external_id = parts
        .get(2)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let value_after = |label: &str| -> Option<String> {
        let idx = parts.iter().position(|p| p.contains(label))?;
        parts.get(idx + 2).map(|p| p.trim().to_string())
    };

    EmployeeBlock {
        external_id,
        name: value_after(NAME_LABEL).unwrap_or_else(|| DEFAULT_NAME.to_string()),
        department: value_after(DEPARTMENT_LABEL)
            .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
    }
}

fn rows_for_block(
    block: &EmployeeBlock,
    slots_line: &str,
    axis: &[NaiveDate],
) -> Vec<NormalizedDailyRow> {
    // zip stops at the shorter side: extra cells and uncovered days both drop out.
    slots_line
        .split(',')
        .zip(axis.iter())
        .map(|(cell, date)| {
            let stamps = extract_timestamps(cell.trim());
            NormalizedDailyRow {
                employee_name: block.name.clone(),
                employee_external_id: block.external_id.clone(),
                department: Some(block.department.clone()),
                date: *date,
                attended: !stamps.is_empty(),
                first_entry: stamps.first().map(|s| s.to_string()),
                last_exit: stamps.last().map(|s| s.to_string()),
                total_event_count: Some(stamps.len() as u32),
                early_exit_minutes: 0,
            }
        })
        .collect()
}
