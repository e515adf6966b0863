// src/tabular.rs
//! Generic delimited exports: one header line, one row per employee and day.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::columns::{infer_delimiter, CanonicalField};
use crate::record::NormalizedDailyRow;

const ATTENDED_MARKERS: [&str; 4] = ["si", "sí", "true", "1"];

/// A data row after header canonicalization. Values are trimmed, nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularRow {
    pub nombre: Option<String>,
    pub id: Option<String>,
    pub departamento: Option<String>,
    pub fecha: Option<String>,
    pub asistio: Option<String>,
    pub hora_entrada: Option<String>,
    pub minutos_retraso: Option<String>,
    pub minutos_salida_temprana: Option<String>,
    pub primera_entrada: Option<String>,
    pub ultima_salida: Option<String>,
}

/// Why a tabular row did not become a [`NormalizedDailyRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    UnparseableDate(String),
}

impl TabularRow {
    fn set(&mut self, field: CanonicalField, value: String) {
        let slot = match field {
            CanonicalField::Nombre => &mut self.nombre,
            CanonicalField::Id => &mut self.id,
            CanonicalField::Departamento => &mut self.departamento,
            CanonicalField::Fecha => &mut self.fecha,
            CanonicalField::Asistio => &mut self.asistio,
            CanonicalField::HoraEntrada => &mut self.hora_entrada,
            CanonicalField::MinutosRetraso => &mut self.minutos_retraso,
            CanonicalField::MinutosSalidaTemprana => &mut self.minutos_salida_temprana,
            CanonicalField::PrimeraEntrada => &mut self.primera_entrada,
            CanonicalField::UltimaSalida => &mut self.ultima_salida,
        };
        *slot = Some(value);
    }

    fn is_admissible(&self) -> bool {
        non_empty(&self.nombre).is_some() && non_empty(&self.fecha).is_some()
    }

    /// Coerces the row into the pipeline's typed daily row.
    ///
    /// Dates must be `YYYY-MM-DD`. Times stay as text; they are parsed when lateness is
    /// computed. A day that was not attended carries no entry time.
    pub fn into_daily_row(self) -> Result<NormalizedDailyRow, RowRejection> {
        let raw_date = non_empty(&self.fecha).unwrap_or_default().to_string();
        let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
            .map_err(|_| RowRejection::UnparseableDate(raw_date.clone()))?;

        let attended = non_empty(&self.asistio)
            .map(|v| ATTENDED_MARKERS.contains(&v.to_lowercase().as_str()))
            .unwrap_or(false);

        let first_entry = if attended {
            non_empty(&self.primera_entrada)
                .or_else(|| non_empty(&self.hora_entrada))
                .map(str::to_string)
        } else {
            None
        };

        Ok(NormalizedDailyRow {
            employee_name: non_empty(&self.nombre).unwrap_or_default().to_string(),
            employee_external_id: non_empty(&self.id).map(str::to_string),
            department: non_empty(&self.departamento).map(str::to_string),
            date,
            attended,
            first_entry,
            // Exit columns never reach their own fields: "salida" headers classify as id.
            last_exit: None,
            total_event_count: None,
            early_exit_minutes: 0,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parses the lines of a delimited export. The first line is the header.
///
/// Rows without both a name and a date are skipped, as are lines the CSV reader
/// cannot make sense of.
pub fn parse_tabular(lines: &[String]) -> Vec<TabularRow> {
    if lines.len() < 2 {
        return Vec::new();
    }
    let delimiter = infer_delimiter(&lines[0]);
    let joined = lines.join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(joined.as_bytes());

    let columns: Vec<Option<CanonicalField>> = match reader.headers() {
        Ok(headers) => headers.iter().map(CanonicalField::classify).collect(),
        Err(e) => {
            warn!("Could not read tabular header: {}", e);
            return Vec::new();
        }
    };
    debug!(
        "Tabular header mapped to [{}] (delimiter '{}')",
        columns
            .iter()
            .map(|c| c.map(|f| f.as_str()).unwrap_or("-"))
            .collect::<Vec<_>>()
            .join(", "),
        delimiter as char
    );

    let mut rows = Vec::new();
    for (line_no, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable tabular line {}: {}", line_no + 2, e);
                continue;
            }
        };
        let mut row = TabularRow::default();
        for (field, value) in columns.iter().zip(record.iter()) {
            if let Some(field) = field {
                row.set(*field, value.trim().to_string());
            }
        }
        if row.is_admissible() {
            rows.push(row);
        } else {
            debug!("Skipping tabular line {} without name or date", line_no + 2);
        }
    }
    rows
}
