// src/compliance.rs
//! Lateness arithmetic, daily status, and range verdicts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::collaborators::EmployeeId;
use crate::record::NormalizedDailyRow;
use crate::time_parser::parse_minute_of_day;

// --- Daily status ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyStatus {
    OnTime,
    Late,
    Absent,
}

impl DailyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DailyStatus::OnTime => "A Tiempo",
            DailyStatus::Late => "Retrasado",
            DailyStatus::Absent => "Ausente",
        }
    }
}

/// Why lateness fell back to zero for an attended day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatenessFallback {
    MissingFirstEntry,
    MissingOfficialEntry,
    UnparseableFirstEntry,
    UnparseableOfficialEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lateness {
    pub minutes: u32,
    pub fallback: Option<LatenessFallback>,
}

impl Lateness {
    fn zero(fallback: Option<LatenessFallback>) -> Self {
        Self {
            minutes: 0,
            fallback,
        }
    }
}

/// Minutes between the official entry time and the first check-in, floored at zero.
///
/// Days not attended are never late. Missing or unreadable times also give zero, with
/// `fallback` naming which input was at fault.
pub fn lateness(
    attended: bool,
    first_entry: Option<&str>,
    official_entry_time: Option<&str>,
) -> Lateness {
    if !attended {
        return Lateness::zero(None);
    }
    let Some(first_entry) = first_entry.filter(|t| !t.trim().is_empty()) else {
        return Lateness::zero(Some(LatenessFallback::MissingFirstEntry));
    };
    let Some(official) = official_entry_time.filter(|t| !t.trim().is_empty()) else {
        return Lateness::zero(Some(LatenessFallback::MissingOfficialEntry));
    };
    let Ok(actual) = parse_minute_of_day(first_entry) else {
        return Lateness::zero(Some(LatenessFallback::UnparseableFirstEntry));
    };
    let Ok(official) = parse_minute_of_day(official) else {
        return Lateness::zero(Some(LatenessFallback::UnparseableOfficialEntry));
    };
    Lateness {
        minutes: actual.saturating_sub(official),
        fallback: None,
    }
}

pub fn classify(attended: bool, late_minutes: u32) -> DailyStatus {
    if !attended {
        DailyStatus::Absent
    } else if late_minutes > 0 {
        DailyStatus::Late
    } else {
        DailyStatus::OnTime
    }
}

const WEEKDAY_LABELS: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

// --- Daily record ---

/// One (employee, date) compliance record. `late_minutes` and `status` are derived and
/// only change through the setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyComplianceRecord {
    pub employee: EmployeeId,
    pub date: NaiveDate,
    attended: bool,
    first_entry: Option<String>,
    pub last_exit: Option<String>,
    pub total_event_count: u32,
    official_entry_time: String,
    pub early_exit_minutes: u32,
    late_minutes: u32,
    status: DailyStatus,
}

impl DailyComplianceRecord {
    pub fn new(employee: EmployeeId, row: &NormalizedDailyRow, official_entry_time: &str) -> Self {
        let mut record = Self {
            employee,
            date: row.date,
            attended: row.attended,
            first_entry: row.first_entry.clone(),
            last_exit: row.last_exit.clone(),
            total_event_count: row.total_event_count.unwrap_or(0),
            official_entry_time: official_entry_time.to_string(),
            early_exit_minutes: row.early_exit_minutes,
            late_minutes: 0,
            status: DailyStatus::Absent,
        };
        record.recompute();
        record
    }

    fn recompute(&mut self) {
        self.late_minutes = self.lateness().minutes;
        self.status = classify(self.attended, self.late_minutes);
    }

    /// Lateness diagnostic for the current inputs.
    pub fn lateness(&self) -> Lateness {
        lateness(
            self.attended,
            self.first_entry.as_deref(),
            Some(self.official_entry_time.as_str()),
        )
    }

    pub fn set_attended(&mut self, attended: bool) {
        self.attended = attended;
        self.recompute();
    }

    pub fn set_first_entry(&mut self, first_entry: Option<String>) {
        self.first_entry = first_entry;
        self.recompute();
    }

    pub fn set_official_entry_time(&mut self, official_entry_time: &str) {
        self.official_entry_time = official_entry_time.to_string();
        self.recompute();
    }

    pub fn attended(&self) -> bool {
        self.attended
    }

    pub fn first_entry(&self) -> Option<&str> {
        self.first_entry.as_deref()
    }

    pub fn official_entry_time(&self) -> &str {
        &self.official_entry_time
    }

    pub fn late_minutes(&self) -> u32 {
        self.late_minutes
    }

    pub fn status(&self) -> DailyStatus {
        self.status
    }

    pub fn day_of_week(&self) -> &'static str {
        WEEKDAY_LABELS[self.date.weekday().num_days_from_monday() as usize]
    }
}

// --- Range aggregation ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceTotals {
    pub total_days: u32,
    pub attended_days: u32,
    pub absences: u32,
    pub total_late_minutes: u32,
    pub total_early_minutes: u32,
    pub avg_late_minutes: f64,
    pub avg_early_minutes: f64,
}

pub fn summarize<'a, I>(records: I) -> ComplianceTotals
where
    I: IntoIterator<Item = &'a DailyComplianceRecord>,
{
    let mut total_days = 0;
    let mut attended_days = 0;
    let mut total_late_minutes = 0;
    let mut total_early_minutes = 0;
    for record in records {
        total_days += 1;
        if record.attended() {
            attended_days += 1;
        }
        total_late_minutes += record.late_minutes();
        total_early_minutes += record.early_exit_minutes;
    }
    let average = |total: u32| {
        if attended_days > 0 {
            f64::from(total) / f64::from(attended_days)
        } else {
            0.0
        }
    };
    ComplianceTotals {
        total_days,
        attended_days,
        absences: total_days - attended_days,
        total_late_minutes,
        total_early_minutes,
        avg_late_minutes: average(total_late_minutes),
        avg_early_minutes: average(total_early_minutes),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Ok,
    Moderate,
    Partial,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub kind: VerdictKind,
    pub text: &'static str,
}

pub fn verdict(totals: &ComplianceTotals) -> Verdict {
    if totals.total_days == 0 {
        return Verdict {
            kind: VerdictKind::Ok,
            text: "Sin Datos",
        };
    }
    let absence_rate = f64::from(totals.absences) / f64::from(totals.total_days);
    let avg_late = totals.avg_late_minutes;
    let avg_early = totals.avg_early_minutes;

    if absence_rate > 0.5 || avg_late > 60.0 || avg_early > 120.0 {
        Verdict {
            kind: VerdictKind::Severe,
            text: "Incumplimiento Severo",
        }
    } else if absence_rate > 0.2 || avg_late > 30.0 || avg_early > 60.0 {
        Verdict {
            kind: VerdictKind::Partial,
            text: "Incumplimiento Parcial",
        }
    } else if avg_late < 10.0 && avg_early < 30.0 && absence_rate < 0.15 {
        Verdict {
            kind: VerdictKind::Ok,
            text: "Cumple Horario",
        }
    } else {
        Verdict {
            kind: VerdictKind::Moderate,
            text: "Cumplimiento Moderado",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Ok,
    Warning,
    Critical,
}

pub fn status_from_verdict(kind: VerdictKind, absences: u32, total_days: u32) -> SummaryStatus {
    // Absence ratio is checked before the verdict.
    if total_days > 0 && f64::from(absences) > f64::from(total_days) * 0.5 {
        return SummaryStatus::Critical;
    }
    match kind {
        VerdictKind::Severe => SummaryStatus::Critical,
        VerdictKind::Partial | VerdictKind::Moderate => SummaryStatus::Warning,
        VerdictKind::Ok => SummaryStatus::Ok,
    }
}

/// Aggregate over one employee's records in `[date_from, date_to]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub employee: EmployeeId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(flatten)]
    pub totals: ComplianceTotals,
    pub verdict: VerdictKind,
    pub verdict_text: String,
    pub status: SummaryStatus,
}

impl RangeSummary {
    pub fn build<'a, I>(
        employee: EmployeeId,
        date_from: NaiveDate,
        date_to: NaiveDate,
        records: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a DailyComplianceRecord>,
    {
        let totals = summarize(records);
        let verdict = verdict(&totals);
        Self {
            employee,
            date_from,
            date_to,
            totals,
            verdict: verdict.kind,
            verdict_text: verdict.text.to_string(),
            status: status_from_verdict(verdict.kind, totals.absences, totals.total_days),
        }
    }
}
