// src/format.rs
//! Turns an uploaded byte buffer into normalized daily rows: text decoding, spreadsheet
//! flattening and layout routing.

use std::borrow::Cow;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::ImportError;
use crate::record::NormalizedDailyRow;
use crate::report_layout::{ReportLayoutParser, REPORT_MARKER};
use crate::tabular::{parse_tabular, RowRejection};

const SPREADSHEET_EXTENSIONS: [&str; 4] = [".xlsx", ".xls", ".xlsm", ".ods"];

// --- Text decoding ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, with a leading byte-order mark stripped when present
    Utf8,
    Latin1,
    Windows1252,
}

/// Candidates tried in order by [`decode_bytes`].
pub const DEFAULT_ENCODINGS: [TextEncoding; 3] = [
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Windows1252,
];

impl TextEncoding {
    fn decode_strict<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8 => encoding_rs::UTF_8
                .decode_without_bom_handling_and_without_replacement(strip_utf8_bom(bytes)),
            TextEncoding::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes)),
            TextEncoding::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes),
        }
    }

    fn decode_lossy<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            TextEncoding::Utf8 => {
                encoding_rs::UTF_8
                    .decode_without_bom_handling(strip_utf8_bom(bytes))
                    .0
            }
            TextEncoding::Latin1 => encoding_rs::mem::decode_latin1(bytes),
            TextEncoding::Windows1252 => {
                encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0
            }
        }
    }
}

fn strip_utf8_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
    /// Set when no candidate decoded cleanly and invalid sequences were replaced.
    pub lossy: bool,
}

/// Decodes with the first candidate that accepts the bytes as-is. When none does, the
/// last candidate decodes with replacement characters.
pub fn decode_bytes(bytes: &[u8], candidates: &[TextEncoding]) -> DecodedText {
    for encoding in candidates {
        if let Some(text) = encoding.decode_strict(bytes) {
            return DecodedText {
                text: text.into_owned(),
                encoding: *encoding,
                lossy: false,
            };
        }
        debug!("Input is not valid {:?}, trying next encoding", encoding);
    }
    let last = candidates.last().copied().unwrap_or(TextEncoding::Utf8);
    warn!(
        "No encoding decoded the input cleanly, falling back to lossy {:?}",
        last
    );
    DecodedText {
        text: last.decode_lossy(bytes).into_owned(),
        encoding: last,
        lossy: true,
    }
}

// --- Shape and layout selection ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileShape {
    Text,
    Spreadsheet,
}

impl FileShape {
    pub fn from_filename(filename: Option<&str>) -> Self {
        let is_spreadsheet = filename
            .map(|name| name.to_lowercase())
            .map(|name| SPREADSHEET_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
            .unwrap_or(false);
        if is_spreadsheet {
            FileShape::Spreadsheet
        } else {
            FileShape::Text
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    EventsReport,
    Tabular,
}

impl Layout {
    pub fn detect(lines: &[String]) -> Self {
        match lines.first() {
            Some(first) if first.contains(REPORT_MARKER) => Layout::EventsReport,
            _ => Layout::Tabular,
        }
    }
}

/// Rows read from one file plus what was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedRows {
    pub rows: Vec<NormalizedDailyRow>,
    pub rejected: Vec<RowRejection>,
}

pub struct FormatDetector {
    encodings: Vec<TextEncoding>,
    report_parser: ReportLayoutParser,
}

impl FormatDetector {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            encodings: DEFAULT_ENCODINGS.to_vec(),
            report_parser: ReportLayoutParser::new(today),
        }
    }

    pub fn with_encodings(mut self, encodings: Vec<TextEncoding>) -> Self {
        self.encodings = encodings;
        self
    }

    /// Reads `bytes` into daily rows. Structural problems abort with an error; rows that
    /// cannot be coerced are reported in [`DetectedRows::rejected`].
    pub fn read(&self, bytes: &[u8], filename: Option<&str>) -> Result<DetectedRows, ImportError> {
        match FileShape::from_filename(filename) {
            FileShape::Spreadsheet => {
                let sheets = spreadsheet::read_sheets(bytes)?;
                if sheets.iter().all(|lines| lines.is_empty()) {
                    return Err(ImportError::EmptyInput);
                }
                let mut detected = DetectedRows::default();
                for lines in sheets.iter().filter(|lines| !lines.is_empty()) {
                    self.route(lines, &mut detected);
                }
                Ok(detected)
            }
            FileShape::Text => {
                let decoded = decode_bytes(bytes, &self.encodings);
                info!(
                    "Decoded {} bytes as {:?}{}",
                    bytes.len(),
                    decoded.encoding,
                    if decoded.lossy { " (lossy)" } else { "" }
                );
                let lines: Vec<String> = decoded.text.lines().map(str::to_string).collect();
                if lines.is_empty() {
                    return Err(ImportError::EmptyInput);
                }
                let mut detected = DetectedRows::default();
                self.route(&lines, &mut detected);
                Ok(detected)
            }
        }
    }

    fn route(&self, lines: &[String], detected: &mut DetectedRows) {
        let layout = Layout::detect(lines);
        debug!("Routing {} lines to {:?} parser", lines.len(), layout);
        match layout {
            Layout::EventsReport => detected.rows.extend(self.report_parser.parse(lines)),
            Layout::Tabular => {
                for row in parse_tabular(lines) {
                    match row.into_daily_row() {
                        Ok(daily) => detected.rows.push(daily),
                        Err(rejection) => {
                            warn!("Dropping tabular row: {:?}", rejection);
                            detected.rejected.push(rejection);
                        }
                    }
                }
            }
        }
    }
}

// --- Spreadsheets ---

#[cfg(feature = "xlsx")]
mod spreadsheet {
    use std::io::Cursor;

    use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
    use tracing::debug;

    use crate::error::ImportError;

    /// One entry per sheet, each row flattened to a comma-joined line.
    pub fn read_sheets(bytes: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ImportError::MalformedFile(e.to_string()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ImportError::MalformedFile(format!("sheet '{}': {}", name, e)))?;
            let lines: Vec<String> = range
                .rows()
                .map(|row| row.iter().map(render_cell).collect::<Vec<_>>().join(","))
                .collect();
            debug!("Sheet '{}' has {} rows", name, lines.len());
            sheets.push(lines);
        }
        Ok(sheets)
    }

    const SECONDS_PER_DAY: f64 = 86_400.0;

    pub fn render_cell(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            // Serials below one day carry no date: an `hh:mm` formatted time cell.
            Data::DateTime(dt) if dt.as_f64() < 1.0 => {
                let seconds = (dt.as_f64() * SECONDS_PER_DAY).round() as u32;
                chrono::NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| cell.to_string())
            }
            Data::DateTime(_) => match cell.as_datetime() {
                Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
                    dt.format("%Y-%m-%d").to_string()
                }
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => cell.to_string(),
            },
            other => other.to_string(),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        #[test]
        fn renders_cells_like_text_exports() {
            assert_eq!(render_cell(&Data::Empty), "");
            assert_eq!(render_cell(&Data::Float(101.0)), "101");
            assert_eq!(render_cell(&Data::Float(7.5)), "7.5");
            assert_eq!(render_cell(&Data::Int(3)), "3");
            assert_eq!(render_cell(&Data::String("Ana".into())), "Ana");
            assert_eq!(render_cell(&Data::Bool(true)), "true");
        }

        fn excel_datetime(serial: f64) -> Data {
            Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, false))
        }

        #[test]
        fn renders_date_and_time_cells() {
            // 45355 is 2024-03-04 in the 1900 date system
            assert_eq!(render_cell(&excel_datetime(45355.0)), "2024-03-04");
            assert_eq!(render_cell(&excel_datetime(45355.5)), "2024-03-04 12:00:00");
            assert_eq!(render_cell(&excel_datetime(560.0 / 1440.0)), "09:20:00");
            assert_eq!(render_cell(&excel_datetime(0.0)), "00:00:00");
        }

        #[test]
        fn time_cell_feeds_lateness() {
            let rendered = render_cell(&excel_datetime(560.0 / 1440.0));
            assert_eq!(crate::time_parser::parse_minute_of_day(&rendered), Ok(560));
        }

        #[test]
        fn garbage_is_malformed() {
            let err = read_sheets(b"definitely not a workbook").unwrap_err();
            assert!(matches!(err, ImportError::MalformedFile(_)));
        }
    }
}

#[cfg(not(feature = "xlsx"))]
mod spreadsheet {
    use crate::error::ImportError;

    pub fn read_sheets(_bytes: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
        Err(ImportError::DependencyMissing {
            remediation: "rebuild with `--features xlsx` to import spreadsheets",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> FormatDetector {
        FormatDetector::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
    }

    #[test]
    fn utf8_wins_and_bom_is_stripped() {
        let decoded = decode_bytes("\u{feff}Nombre,Fecha".as_bytes(), &DEFAULT_ENCODINGS);
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
        assert_eq!(decoded.text, "Nombre,Fecha");
        assert!(!decoded.lossy);
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // "Asistió" with a Latin-1 encoded ó
        let bytes = b"Asisti\xf3";
        let decoded = decode_bytes(bytes, &DEFAULT_ENCODINGS);
        assert_eq!(decoded.encoding, TextEncoding::Latin1);
        assert_eq!(decoded.text, "Asistió");
        assert!(!decoded.lossy);
    }

    #[test]
    fn exhausted_chain_replaces_invalid_sequences() {
        let decoded = decode_bytes(b"ok\xff", &[TextEncoding::Utf8]);
        assert!(decoded.lossy);
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
        assert_eq!(decoded.text, "ok\u{fffd}");
    }

    #[test]
    fn shape_follows_extension() {
        assert_eq!(
            FileShape::from_filename(Some("marcas.XLSX")),
            FileShape::Spreadsheet
        );
        assert_eq!(
            FileShape::from_filename(Some("marcas.xls")),
            FileShape::Spreadsheet
        );
        assert_eq!(FileShape::from_filename(Some("marcas.csv")), FileShape::Text);
        assert_eq!(FileShape::from_filename(None), FileShape::Text);
    }

    #[test]
    fn layout_follows_first_line_marker() {
        let report = vec!["Reporte de Eventos de Asistencia,,".to_string()];
        let tabular = vec!["Nombre,Fecha".to_string()];
        assert_eq!(Layout::detect(&report), Layout::EventsReport);
        assert_eq!(Layout::detect(&tabular), Layout::Tabular);
    }

    #[test]
    fn empty_text_is_rejected() {
        let err = detector().read(b"", Some("vacio.csv")).unwrap_err();
        assert!(matches!(err, ImportError::EmptyInput));
    }

    #[test]
    fn reads_latin1_tabular_file() {
        let bytes = b"Nombre;Fecha;Asisti\xf3;Hora Entrada\nJos\xe9;2024-03-04;S\xed;09:05\n";
        let detected = detector().read(bytes, Some("marcas.csv")).unwrap();
        assert_eq!(detected.rows.len(), 1);
        assert_eq!(detected.rows[0].employee_name, "José");
        assert!(detected.rows[0].attended);
    }

    #[test]
    fn collects_rejected_rows() {
        let bytes = b"Nombre,Fecha,Asistio\nAna,2024-03-04,Si\nBeto,04/03/2024,Si\n";
        let detected = detector().read(bytes, None).unwrap();
        assert_eq!(detected.rows.len(), 1);
        assert_eq!(
            detected.rejected,
            vec![RowRejection::UnparseableDate("04/03/2024".into())]
        );
    }

    #[test]
    fn routes_report_layout() {
        let bytes = "Reporte de Eventos de Asistencia\n\
                     Periodo:,2024-01-01~2024-01-02\n\
                     ID:,,9,Nombre:,,Ana\n\
                     08:00,\n"
            .as_bytes();
        let detected = detector().read(bytes, Some("reporte.csv")).unwrap();
        assert_eq!(detected.rows.len(), 2);
        assert_eq!(detected.rows[0].employee_external_id.as_deref(), Some("9"));
    }

    #[cfg(not(feature = "xlsx"))]
    #[test]
    fn spreadsheet_without_feature_is_dependency_missing() {
        let err = detector().read(b"PK", Some("marcas.xlsx")).unwrap_err();
        assert!(matches!(err, ImportError::DependencyMissing { .. }));
    }
}
