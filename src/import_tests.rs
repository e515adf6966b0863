// src/import_tests.rs

#[cfg(test)]
mod tests {
    use crate::collaborators::*;
    use crate::compliance::*;
    use crate::error::ImportError;
    use crate::import::*;
    use crate::schedule::{ScheduleBook, ScheduleRule};
    use chrono::NaiveDate;

    type MemoryImporter = Importer<InMemoryDirectory, ScheduleBook, InMemoryAttendanceStore>;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        d("2024-03-20")
    }

    // Helper to build a directory with the given (id, name, external_id, department)
    fn create_directory(
        employees: &[(u64, &str, Option<&str>, Option<&str>)],
    ) -> InMemoryDirectory {
        let mut directory = InMemoryDirectory::new();
        for (id, name, external_id, department) in employees {
            directory.insert(Employee {
                id: EmployeeId(*id),
                name: name.to_string(),
                external_id: external_id.map(str::to_string),
                department: department.map(str::to_string),
            });
        }
        directory
    }

    fn create_importer(directory: InMemoryDirectory, schedules: ScheduleBook) -> MemoryImporter {
        Importer::new(directory, schedules, InMemoryAttendanceStore::new())
    }

    const TABULAR_CSV: &str = "Nombre;Cedula;Departamento;Fecha;Asistio;Hora Entrada\n\
        Ana Pérez;101;Ventas;2024-03-04;Si;09:15\n\
        Ana Pérez;101;Ventas;2024-03-05;No;\n\
        Luis Gómez;;Producción;2024-03-04;si;09:50\n\
        Luis Gómez;;Producción;04/03/2024;si;09:00\n";

    const EVENTS_REPORT: &str = "Reporte de Eventos de Asistencia\n\
        Periodo:,2024-03-04 ~ 2024-03-06\n\
        ID:,,17,Nombre:,,Marta Ruiz,Departamento:,,Producción\n\
        09:5012:0018:00,,09:40\n";

    // --- Tabular exports ---

    #[test]
    fn test_tabular_import_creates_records_and_summaries() {
        let directory = create_directory(&[(1, "Ana Pérez", Some("101"), Some("Ventas"))]);
        let mut importer = create_importer(directory, ScheduleBook::new());

        let outcome = importer
            .import(TABULAR_CSV.as_bytes(), Some("asistencia.csv"), today())
            .unwrap();

        assert_eq!(outcome.records_created, 3);
        assert_eq!(outcome.rejected_rows, 1);
        assert_eq!(outcome.duplicates_skipped, 0);
        assert_eq!(outcome.unresolved_rows, 0);
        assert_eq!(outcome.employees_created, vec![EmployeeId(2)]);
        assert_eq!(outcome.summaries.len(), 2);

        let store = importer.store();
        let monday = store.record(EmployeeId(1), d("2024-03-04")).unwrap();
        assert_eq!(monday.official_entry_time(), "9:00 AM");
        assert_eq!(monday.late_minutes(), 15);
        assert_eq!(monday.status(), DailyStatus::Late);
        assert_eq!(monday.total_event_count, 0);

        let tuesday = store.record(EmployeeId(1), d("2024-03-05")).unwrap();
        assert_eq!(tuesday.status(), DailyStatus::Absent);
        assert_eq!(tuesday.first_entry(), None);

        // Luis was created with the row's department and gets its default entry time
        let luis = store.record(EmployeeId(2), d("2024-03-04")).unwrap();
        assert_eq!(luis.official_entry_time(), "9:45 AM");
        assert_eq!(luis.late_minutes(), 5);
        let created = importer.directory().get(EmployeeId(2)).unwrap();
        assert_eq!(created.name, "Luis Gómez");
        assert_eq!(created.department.as_deref(), Some("Producción"));

        let ana = store
            .summary(EmployeeId(1), d("2024-03-04"), d("2024-03-05"))
            .unwrap();
        assert_eq!(ana.totals.total_days, 2);
        assert_eq!(ana.totals.absences, 1);
        assert_eq!(ana.verdict, VerdictKind::Partial);
        assert_eq!(ana.status, SummaryStatus::Warning);

        let luis = store
            .summary(EmployeeId(2), d("2024-03-04"), d("2024-03-04"))
            .unwrap();
        assert_eq!(luis.verdict, VerdictKind::Ok);
        assert_eq!(luis.verdict_text, "Cumple Horario");
        assert_eq!(luis.status, SummaryStatus::Ok);
    }

    #[test]
    fn test_drop_missing_policy_skips_unknown_employees() {
        let directory = create_directory(&[(1, "Ana Pérez", Some("101"), Some("Ventas"))]);
        let mut importer = create_importer(directory, ScheduleBook::new())
            .with_policy(ResolutionPolicy::DropMissing);

        let outcome = importer
            .import(TABULAR_CSV.as_bytes(), Some("asistencia.csv"), today())
            .unwrap();

        assert_eq!(outcome.records_created, 2);
        assert_eq!(outcome.unresolved_rows, 1);
        assert!(outcome.employees_created.is_empty());
        assert_eq!(importer.directory().employees().count(), 1);
        assert_eq!(outcome.summaries.len(), 1);
        assert_eq!(outcome.summaries[0].employee, EmployeeId(1));
    }

    #[test]
    fn test_latin1_file_is_decoded() {
        // "José" with é as a single Latin-1 byte
        let mut bytes = b"Nombre,Fecha,Asistio,Hora Entrada\nJos".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b",2024-03-04,si,09:00\n");

        let mut importer = create_importer(InMemoryDirectory::new(), ScheduleBook::new());
        let outcome = importer.import(&bytes, Some("latin1.csv"), today()).unwrap();

        assert_eq!(outcome.records_created, 1);
        let created = importer.directory().get(outcome.employees_created[0]).unwrap();
        assert_eq!(created.name, "José");
    }

    // --- Events reports ---

    #[test]
    fn test_events_report_uses_rules_and_department_defaults() {
        let directory = create_directory(&[(1, "M. Ruiz", Some("17"), Some("Producción"))]);
        let mut schedules = ScheduleBook::new();
        // 2024-03-06 is a Wednesday
        schedules
            .add_rule(ScheduleRule {
                employee_id: EmployeeId(1),
                day_of_week: 2,
                official_entry_time: "9:30 AM".into(),
                day_off: false,
            })
            .unwrap();
        let mut importer = create_importer(directory, schedules);

        let outcome = importer
            .import(EVENTS_REPORT.as_bytes(), Some("reporte.csv"), today())
            .unwrap();

        assert_eq!(outcome.records_created, 3);
        assert!(outcome.employees_created.is_empty());

        let store = importer.store();
        let monday = store.record(EmployeeId(1), d("2024-03-04")).unwrap();
        assert_eq!(monday.first_entry(), Some("09:50"));
        assert_eq!(monday.last_exit.as_deref(), Some("18:00"));
        assert_eq!(monday.total_event_count, 3);
        assert_eq!(monday.official_entry_time(), "9:45 AM");
        assert_eq!(monday.late_minutes(), 5);

        let tuesday = store.record(EmployeeId(1), d("2024-03-05")).unwrap();
        assert_eq!(tuesday.status(), DailyStatus::Absent);
        assert_eq!(tuesday.total_event_count, 0);

        let wednesday = store.record(EmployeeId(1), d("2024-03-06")).unwrap();
        assert_eq!(wednesday.official_entry_time(), "9:30 AM");
        assert_eq!(wednesday.late_minutes(), 10);

        let summary = &outcome.summaries[0];
        assert_eq!(summary.date_from, d("2024-03-04"));
        assert_eq!(summary.date_to, d("2024-03-06"));
        assert_eq!(summary.totals.attended_days, 2);
        assert_eq!(summary.totals.avg_late_minutes, 7.5);
        assert_eq!(summary.verdict, VerdictKind::Partial);
        assert_eq!(summary.status, SummaryStatus::Warning);
    }

    #[test]
    fn test_reimport_skips_duplicates_and_overwrites_summary() {
        let directory = create_directory(&[(1, "Marta Ruiz", Some("17"), Some("Producción"))]);
        let mut importer = create_importer(directory, ScheduleBook::new());

        let first = importer
            .import(EVENTS_REPORT.as_bytes(), Some("reporte.csv"), today())
            .unwrap();
        let second = importer
            .import(EVENTS_REPORT.as_bytes(), Some("reporte.csv"), today())
            .unwrap();

        assert_eq!(first.records_created, 3);
        assert_eq!(second.records_created, 0);
        assert_eq!(second.duplicates_skipped, 3);
        assert_eq!(first.summaries, second.summaries);
        assert_eq!(importer.store().records().count(), 3);
        assert_eq!(importer.store().summaries().len(), 1);
    }

    // --- Structural failures ---

    #[test]
    fn test_empty_file_is_rejected() {
        let mut importer = create_importer(InMemoryDirectory::new(), ScheduleBook::new());
        let err = importer.import(b"", Some("vacio.csv"), today()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyInput));
        assert!(err
            .user_message()
            .starts_with("Error al procesar el archivo: "));
    }

    #[test]
    fn test_header_only_file_has_no_valid_rows() {
        let mut importer = create_importer(InMemoryDirectory::new(), ScheduleBook::new());
        let err = importer
            .import(b"Nombre,Fecha,Asistio\n", Some("cabecera.csv"), today())
            .unwrap_err();
        assert!(matches!(err, ImportError::NoValidRows));
    }

    #[test]
    fn test_no_writes_when_every_row_is_rejected() {
        let csv = "Nombre,Fecha,Asistio\nAna,04/03/2024,si\nLuis,ayer,si\n";
        let mut importer = create_importer(InMemoryDirectory::new(), ScheduleBook::new());

        let err = importer.import(csv.as_bytes(), Some("fechas.csv"), today()).unwrap_err();

        assert!(matches!(err, ImportError::NoValidRows));
        assert_eq!(importer.directory().employees().count(), 0);
        assert_eq!(importer.store().records().count(), 0);
        assert!(importer.store().summaries().is_empty());
    }

    // --- Spreadsheets ---

    // A tabular sheet with typed date, number and time cells, then an events-report sheet.
    #[cfg(feature = "xlsx")]
    fn create_two_sheet_workbook() -> Vec<u8> {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let time_format = Format::new().set_num_format("hh:mm");

        let marcas = workbook.add_worksheet();
        marcas.set_name("Marcas").unwrap();
        let headers = ["Nombre", "Cedula", "Departamento", "Fecha", "Asistio", "Hora Entrada"];
        for (col, header) in headers.iter().enumerate() {
            marcas.write_string(0, col as u16, *header).unwrap();
        }
        marcas.write_string(1, 0, "Ana Pérez").unwrap();
        marcas.write_number(1, 1, 101).unwrap();
        marcas.write_string(1, 2, "Ventas").unwrap();
        let fecha = ExcelDateTime::from_ymd(2024, 3, 4).unwrap();
        marcas.write_datetime_with_format(1, 3, &fecha, &date_format).unwrap();
        marcas.write_string(1, 4, "Si").unwrap();
        let entrada = ExcelDateTime::from_hms(9, 20, 0).unwrap();
        marcas.write_datetime_with_format(1, 5, &entrada, &time_format).unwrap();

        let reporte = workbook.add_worksheet();
        reporte.set_name("Reporte").unwrap();
        reporte.write_string(0, 0, "Reporte de Eventos de Asistencia").unwrap();
        reporte.write_string(1, 0, "Periodo:").unwrap();
        reporte.write_string(1, 1, "2024-03-04 ~ 2024-03-05").unwrap();
        reporte.write_string(2, 0, "ID:").unwrap();
        reporte.write_string(2, 2, "17").unwrap();
        reporte.write_string(2, 3, "Nombre:").unwrap();
        reporte.write_string(2, 5, "Marta Ruiz").unwrap();
        reporte.write_string(2, 6, "Departamento:").unwrap();
        reporte.write_string(2, 8, "Producción").unwrap();
        reporte.write_string(3, 0, "09:5018:00").unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_workbook_sheets_are_routed_separately() {
        let directory = create_directory(&[(1, "Ana Pérez", Some("101"), Some("Ventas"))]);
        let mut importer = create_importer(directory, ScheduleBook::new());

        let outcome = importer
            .import(&create_two_sheet_workbook(), Some("marcas.xlsx"), today())
            .unwrap();

        assert_eq!(outcome.records_created, 3);
        assert_eq!(outcome.rejected_rows, 0);
        assert_eq!(outcome.summaries.len(), 2);
        assert_eq!(outcome.employees_created, vec![EmployeeId(2)]);

        // Date, whole-number and time cells come through as text the parsers accept
        let store = importer.store();
        let ana = store.record(EmployeeId(1), d("2024-03-04")).unwrap();
        assert_eq!(ana.first_entry(), Some("09:20:00"));
        assert_eq!(ana.late_minutes(), 20);
        assert_eq!(ana.status(), DailyStatus::Late);

        let marta = store.record(EmployeeId(2), d("2024-03-04")).unwrap();
        assert_eq!(marta.official_entry_time(), "9:45 AM");
        assert_eq!(marta.late_minutes(), 5);
        assert_eq!(marta.total_event_count, 2);
        let absent = store.record(EmployeeId(2), d("2024-03-05")).unwrap();
        assert_eq!(absent.status(), DailyStatus::Absent);
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_unreadable_spreadsheet_is_malformed() {
        let mut importer = create_importer(InMemoryDirectory::new(), ScheduleBook::new());
        let err = importer
            .import(b"not a workbook", Some("asistencia.xlsx"), today())
            .unwrap_err();
        assert!(matches!(err, ImportError::MalformedFile(_)));
        assert_eq!(importer.store().records().count(), 0);
    }

    #[cfg(not(feature = "xlsx"))]
    #[test]
    fn test_spreadsheet_without_support_names_remediation() {
        let mut importer = create_importer(InMemoryDirectory::new(), ScheduleBook::new());
        let err = importer
            .import(b"PK", Some("asistencia.xlsx"), today())
            .unwrap_err();
        assert!(matches!(err, ImportError::DependencyMissing { .. }));
    }
}
