//! Spreadsheet ingest.
//!
//! CSV files go through the `csv` crate; workbooks (xlsx, xlsm, xlsb, xls, ods)
//! through `calamine`, first sheet only. Either way the first row is the header
//! and every cell is resolved to a [`CellValue`] here, once.

use crate::error::DashboardError;
use crate::model::{CellValue, Table};
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use chrono::Datelike;
use std::io::Read;
use std::path::Path;
use time::macros::format_description;
use time::{Date, Month};
use tracing::{debug, info, warn};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "xla", "ods"];

/// Serial of 31.12.9999 in the 1900 date system; nothing later fits a `Date`.
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

/// Load the first sheet of `path` into a table.
pub fn load_table(path: &Path) -> Result<Table, DashboardError> {
    std::fs::metadata(path).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = if is_workbook(path) {
        debug!(path = %path.display(), "reading workbook");
        read_workbook(path)?
    } else {
        debug!(path = %path.display(), "reading csv");
        let file = std::fs::File::open(path).map_err(|source| DashboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        read_csv(file, path)?
    };

    info!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded table"
    );
    Ok(table)
}

/// Index of the column named `name`, compared after trimming.
pub fn locate_column(table: &Table, name: &str) -> Result<usize, DashboardError> {
    let wanted = name.trim();
    table
        .headers
        .iter()
        .position(|h| h == wanted)
        .ok_or_else(|| DashboardError::missing_column(wanted, &table.headers))
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|w| w.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Parse CSV from any reader. `path` is only used for error messages.
pub(crate) fn read_csv<R: Read>(reader: R, path: &Path) -> Result<Table, DashboardError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers = rdr
        .headers()
        .map_err(|e| DashboardError::unparseable(path, e))?
        .clone();
    if raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DashboardError::unparseable(path, "no header row"));
    }
    let headers = normalize_headers(raw_headers.iter());
    let width = headers.len();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| DashboardError::unparseable(path, e))?;
        if record.iter().skip(width).any(|c| !c.is_empty()) {
            // Header row is line 1.
            return Err(DashboardError::unparseable(
                path,
                format!(
                    "line {}: expected {} fields, found {}",
                    idx + 2,
                    width,
                    record.len()
                ),
            ));
        }
        let mut row: Vec<CellValue> = record.iter().take(width).map(CellValue::from).collect();
        row.resize(width, CellValue::Empty);
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

fn read_workbook(path: &Path) -> Result<Table, DashboardError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| DashboardError::unparseable(path, e))?;

    let sheets = workbook.sheet_names();
    if sheets.len() > 1 {
        warn!(
            sheets = sheets.len(),
            first = %sheets[0],
            "workbook has several sheets; only the first is read"
        );
    }

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DashboardError::unparseable(path, "workbook has no sheets"))?
        .map_err(|e| DashboardError::unparseable(path, e))?;

    let mut rows_iter = range.rows();
    let header_cells = rows_iter
        .next()
        .ok_or_else(|| DashboardError::unparseable(path, "first sheet is empty"))?;
    let header_text: Vec<String> = header_cells
        .iter()
        .map(|c| cell_from_workbook(c).display())
        .collect();
    if header_text.iter().all(|h| h.trim().is_empty()) {
        return Err(DashboardError::unparseable(path, "no header row"));
    }
    let headers = normalize_headers(header_text.iter().map(String::as_str));

    let rows = rows_iter
        .map(|row| row.iter().map(cell_from_workbook).collect())
        .collect();

    Ok(Table { headers, rows })
}

/// Trim header names and give blank ones a positional placeholder.
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    raw.enumerate()
        .map(|(idx, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                h.to_string()
            }
        })
        .collect()
}

fn cell_from_workbook(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Int(i) => CellValue::Text(i.to_string()),
        Data::Float(f) => CellValue::Text(f.to_string()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return CellValue::Text(dt.as_f64().to_string());
            }
            workbook_date(dt)
                .map(CellValue::Date)
                .unwrap_or_else(|| CellValue::Text(dt.as_f64().to_string()))
        }
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| Date::parse(d, format_description!("[year]-[month]-[day]")).ok())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::from(s.as_str())),
        Data::DurationIso(s) => CellValue::from(s.as_str()),
    }
}

/// Calendar date of a date-typed workbook cell, dropping the time of day.
///
/// calamine applies the workbook's 1900 or 1904 date system. Serials outside
/// the representable range stay `None` and the cell falls back to text.
fn workbook_date(dt: &ExcelDateTime) -> Option<Date> {
    let serial = dt.as_f64();
    if !serial.is_finite() || !(0.0..=MAX_DATE_SERIAL).contains(&serial) {
        return None;
    }
    let day = dt.as_datetime()?.date();
    let month = Month::try_from(u8::try_from(day.month()).ok()?).ok()?;
    Date::from_calendar_date(day.year(), month, u8::try_from(day.day()).ok()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::model::Status;
    use calamine::ExcelDateTimeType;
    use rust_xlsxwriter::{Format, Workbook};
    use std::io::Write;
    use std::path::PathBuf;
    use time::macros::date;

    fn csv_table(content: &[u8]) -> Result<Table, DashboardError> {
        read_csv(content, &PathBuf::from("test.csv"))
    }

    #[test]
    fn reads_headers_and_rows() {
        let t = csv_table(b"Task,Last Date\nreport,15.03.2024\nreview,Open\n").unwrap();
        assert_eq!(t.headers, vec!["Task", "Last Date"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[1][1], CellValue::Text("Open".into()));
    }

    #[test]
    fn empty_fields_become_empty_cells_and_short_rows_are_padded() {
        let t = csv_table(b"Task,Last Date,Owner\nreport,,ann\nlonely\n").unwrap();
        assert_eq!(t.rows[0][1], CellValue::Empty);
        assert_eq!(
            t.rows[1],
            vec![
                CellValue::Text("lonely".into()),
                CellValue::Empty,
                CellValue::Empty
            ]
        );
    }

    #[test]
    fn headers_are_trimmed_and_blank_ones_named() {
        let t = csv_table(b" Task , Last Date ,\na,b,c\n").unwrap();
        assert_eq!(t.headers, vec!["Task", "Last Date", "Unnamed: 2"]);
    }

    #[test]
    fn trailing_empty_fields_are_tolerated() {
        let t = csv_table(b"Task,Last Date\na,Open,,\n").unwrap();
        assert_eq!(t.rows[0].len(), 2);
    }

    #[test]
    fn extra_populated_fields_are_rejected() {
        let err = csv_table(b"Task,Last Date\na,Open,surprise\n").unwrap_err();
        assert!(matches!(err, DashboardError::UnparseableFile { .. }));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = csv_table(b"").unwrap_err();
        assert!(matches!(err, DashboardError::UnparseableFile { .. }));
    }

    #[test]
    fn invalid_utf8_is_unparseable() {
        let err = csv_table(b"Task,Last Date\n\xff\xfe,Open\n").unwrap_err();
        assert!(matches!(err, DashboardError::UnparseableFile { .. }));
    }

    #[test]
    fn locate_column_reports_missing_header() {
        let t = csv_table(b"Task,Deadline\na,Open\n").unwrap();
        let err = locate_column(&t, "Last Date").unwrap_err();
        match err {
            DashboardError::MissingRequiredColumn { column, .. } => assert_eq!(column, "Last Date"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(locate_column(&t, " Deadline ").unwrap(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DashboardError::Io { .. }));
    }

    #[test]
    fn load_table_reads_csv_from_disk() {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(b"Task,Last Date\nreport,01.01.2024\n").unwrap();
        let t = load_table(f.path()).unwrap();
        assert_eq!(t.rows.len(), 1);
    }

    #[test]
    fn garbage_workbook_is_unparseable() {
        let mut f = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        f.write_all(b"this is not a zip archive").unwrap();
        let err = load_table(f.path()).unwrap_err();
        assert!(matches!(err, DashboardError::UnparseableFile { .. }));
    }

    #[test]
    fn workbook_extensions_are_case_insensitive() {
        assert!(is_workbook(Path::new("deadlines.XLSX")));
        assert!(is_workbook(Path::new("deadlines.ods")));
        assert!(!is_workbook(Path::new("deadlines.csv")));
        assert!(!is_workbook(Path::new("deadlines")));
    }

    fn date_cell(serial: f64, is_1904: bool) -> Data {
        Data::DateTime(ExcelDateTime::new(
            serial,
            ExcelDateTimeType::DateTime,
            is_1904,
        ))
    }

    #[test]
    fn date_serials_map_to_calendar_dates() {
        let cases = [
            (1.0, date!(1900 - 01 - 01)),
            (61.0, date!(1900 - 03 - 01)),
            (45292.0, date!(2024 - 01 - 01)),
            // Time of day is dropped.
            (45366.75, date!(2024 - 03 - 15)),
            (MAX_DATE_SERIAL, date!(9999 - 12 - 31)),
        ];
        for (serial, expected) in cases {
            assert_eq!(
                cell_from_workbook(&date_cell(serial, false)),
                CellValue::Date(expected),
                "{serial}"
            );
        }
    }

    #[test]
    fn date_serials_follow_the_1904_system() {
        assert_eq!(
            cell_from_workbook(&date_cell(43830.0, true)),
            CellValue::Date(date!(2024 - 01 - 01))
        );
        assert_eq!(
            cell_from_workbook(&date_cell(0.0, true)),
            CellValue::Date(date!(1904 - 01 - 01))
        );
    }

    #[test]
    fn out_of_range_serials_fall_back_to_text() {
        for serial in [1.0e20, -3.0, f64::NAN, f64::INFINITY, MAX_DATE_SERIAL + 1.0] {
            assert!(
                matches!(cell_from_workbook(&date_cell(serial, false)), CellValue::Text(_)),
                "{serial}"
            );
        }
        // Past 31.12.9999 once shifted into the 1904 system.
        assert!(matches!(
            cell_from_workbook(&date_cell(MAX_DATE_SERIAL, true)),
            CellValue::Text(_)
        ));
    }

    #[test]
    fn duration_cells_stay_text() {
        let cell = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_from_workbook(&cell), CellValue::Text("1.5".into()));
    }

    #[test]
    fn load_table_reads_xlsx_with_text_and_typed_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deadlines.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("dd.mm.yyyy");
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Task").unwrap();
        sheet.write_string(0, 1, "Last Date").unwrap();
        sheet.write_string(1, 0, "report").unwrap();
        sheet.write_string(1, 1, "15.03.2024").unwrap();
        sheet.write_string(2, 0, "review").unwrap();
        sheet
            .write_number_with_format(2, 1, 45366.0, &date_format)
            .unwrap();
        sheet.write_string(3, 0, "backlog").unwrap();
        sheet.write_string(4, 0, "planning").unwrap();
        sheet.write_string(4, 1, "Open").unwrap();
        workbook.save(&path).unwrap();

        let t = load_table(&path).unwrap();
        assert_eq!(t.headers, vec!["Task", "Last Date"]);
        assert_eq!(t.rows.len(), 4);

        let deadline = locate_column(&t, "Last Date").unwrap();
        let cells: Vec<&CellValue> = t.rows.iter().map(|r| &r[deadline]).collect();
        assert_eq!(cells[0], &CellValue::Text("15.03.2024".into()));
        assert_eq!(cells[1], &CellValue::Date(date!(2024 - 03 - 15)));
        assert_eq!(cells[2], &CellValue::Empty);
        assert_eq!(cells[3], &CellValue::Text("Open".into()));

        let statuses: Vec<Status> = cells
            .into_iter()
            .map(|c| classify(c, date!(2024 - 03 - 10), 7))
            .collect();
        assert_eq!(
            statuses,
            vec![Status::Urgent, Status::Urgent, Status::Unknown, Status::Open]
        );
    }

    #[test]
    fn workbook_cells_resolve_to_typed_values() {
        assert_eq!(cell_from_workbook(&Data::Empty), CellValue::Empty);
        assert_eq!(cell_from_workbook(&Data::String(String::new())), CellValue::Empty);
        assert_eq!(cell_from_workbook(&Data::Float(3.0)), CellValue::Text("3".into()));
        assert_eq!(cell_from_workbook(&Data::Int(42)), CellValue::Text("42".into()));
        assert_eq!(
            cell_from_workbook(&Data::DateTimeIso("2024-03-15T00:00:00".into())),
            CellValue::Date(date!(2024 - 03 - 15))
        );
    }
}
