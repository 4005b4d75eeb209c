//! Attendance document readers
//!
//! Decodes uploaded exports into a [`Grid`]. CSV is read without a header
//! row and with flexible widths: the summary block and the participant
//! table have different column counts. The csv reader skips blank lines, so
//! a CSV grid never contains an all-empty row. Workbooks are read from their
//! first worksheet, blank rows kept. JSON grids come from front ends that
//! already parsed a workbook.

use calamine::{Data, Reader, Xlsx};
use serde::Deserialize;
use std::io::Cursor;
use thiserror::Error;

use crate::reconcile::{CellValue, Grid};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,

    #[error("CSV decode failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbook decode failed: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("unsupported document type: {0}")]
    UnsupportedType(String),
}

/// Document formats accepted by the import endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Csv,
    Json,
    Xlsx,
}

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

impl DocumentFormat {
    /// Pick a format from a `Content-Type` value; missing means CSV
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self, DocumentError> {
        let Some(value) = content_type else {
            return Ok(DocumentFormat::Csv);
        };
        let mime = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "" | "text/csv" | "text/plain" | "application/csv" | "application/octet-stream" => {
                Ok(DocumentFormat::Csv)
            }
            "application/json" => Ok(DocumentFormat::Json),
            XLSX_MIME => Ok(DocumentFormat::Xlsx),
            other => Err(DocumentError::UnsupportedType(other.to_string())),
        }
    }
}

/// Decode `bytes` in the given format
pub fn read_grid(format: DocumentFormat, bytes: &[u8]) -> Result<Grid, DocumentError> {
    match format {
        DocumentFormat::Csv => read_csv_grid(bytes),
        DocumentFormat::Json => read_json_grid(bytes),
        DocumentFormat::Xlsx => read_xlsx_grid(bytes),
    }
}

/// Headerless, flexible-width CSV
pub fn read_csv_grid(bytes: &[u8]) -> Result<Grid, DocumentError> {
    // Spreadsheet programs prefix UTF-8 exports with a BOM
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DocumentError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::from_raw).collect());
    }

    Ok(Grid::new(rows))
}

/// First worksheet of an `.xlsx` workbook
///
/// The grid keeps sheet coordinates: rows and columns before the first used
/// cell are padded with empty cells.
pub fn read_xlsx_grid(bytes: &[u8]) -> Result<Grid, DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }

    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(DocumentError::Empty)??;
    let Some((first_row, first_col)) = range.start() else {
        return Err(DocumentError::Empty);
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); first_row as usize];
    for sheet_row in range.rows() {
        let mut row = vec![CellValue::Empty; first_col as usize];
        row.extend(sheet_row.iter().map(workbook_cell));
        rows.push(row);
    }

    Ok(Grid::new(rows))
}

/// Dates stay spreadsheet serials; text goes through the same number
/// recognition as CSV cells
fn workbook_cell(data: &Data) -> CellValue {
    match data {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from_raw(s),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Wrapped { rows: Grid },
    Bare(Grid),
}

/// `{"rows": [[...], ...]}` or a bare `[[...], ...]`
pub fn read_json_grid(bytes: &[u8]) -> Result<Grid, DocumentError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DocumentError::Empty);
    }

    let grid = match serde_json::from_slice(bytes)? {
        JsonDocument::Wrapped { rows } => rows,
        JsonDocument::Bare(grid) => grid,
    };
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_with_uneven_rows() {
        let csv = "1. Summary\nMeeting title,Weekly Sync\n\nName,Duration,Email\n\"Nayak, Aditi\",75,aditi@example.com\n";
        let grid = read_csv_grid(csv.as_bytes()).unwrap();

        // Blank line dropped
        assert_eq!(grid.len(), 4);
        assert!(grid.rows().iter().all(|row| row.iter().any(|c| !c.is_empty())));
        assert_eq!(grid.row(2).unwrap()[0], CellValue::Text("Name".to_string()));
        assert_eq!(grid.row(0).unwrap().len(), 1);
        assert_eq!(grid.row(1).unwrap()[1], CellValue::Text("Weekly Sync".to_string()));
        let last = grid.rows().last().unwrap();
        assert_eq!(last[0], CellValue::Text("Nayak, Aditi".to_string()));
        assert_eq!(last[1], CellValue::Number(75.0));
    }

    #[test]
    fn test_csv_strips_bom() {
        let grid = read_csv_grid(b"\xEF\xBB\xBFName,Email\n").unwrap();
        assert_eq!(grid.row(0).unwrap()[0], CellValue::Text("Name".to_string()));
    }

    #[test]
    fn test_empty_documents_are_rejected() {
        assert!(matches!(read_csv_grid(b"  \n"), Err(DocumentError::Empty)));
        assert!(matches!(read_json_grid(b""), Err(DocumentError::Empty)));
    }

    #[test]
    fn test_json_wrapped_and_bare() {
        let wrapped = read_json_grid(br#"{"rows": [["Name", "Duration"], ["A", 12]]}"#).unwrap();
        let bare = read_json_grid(br#"[["Name", "Duration"], ["A", 12]]"#).unwrap();

        assert_eq!(wrapped, bare);
        assert_eq!(bare.row(1).unwrap()[1], CellValue::Number(12.0));
    }

    #[test]
    fn test_json_malformed() {
        assert!(matches!(read_json_grid(b"{\"rows\": 3}"), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(DocumentFormat::from_content_type(None).unwrap(), DocumentFormat::Csv);
        assert_eq!(
            DocumentFormat::from_content_type(Some("application/json; charset=utf-8")).unwrap(),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_content_type(Some("text/csv")).unwrap(),
            DocumentFormat::Csv
        );
        assert_eq!(
            DocumentFormat::from_content_type(Some(XLSX_MIME)).unwrap(),
            DocumentFormat::Xlsx
        );
        assert!(DocumentFormat::from_content_type(Some("image/png")).is_err());
    }

    fn workbook(build: impl FnOnce(&mut rust_xlsxwriter::Worksheet)) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        build(workbook.add_worksheet());
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_xlsx_first_sheet_to_grid() {
        let bytes = workbook(|sheet| {
            sheet.write_string(0, 0, "1. Summary").unwrap();
            sheet.write_string(1, 0, "Meeting title").unwrap();
            sheet.write_string(1, 1, "Weekly Sync").unwrap();
            sheet.write_string(3, 0, "Name").unwrap();
            sheet.write_string(3, 1, "First Join").unwrap();
            sheet.write_string(3, 2, "In-Meeting Duration").unwrap();
            sheet.write_string(4, 0, "Aditi Nayak").unwrap();
            sheet.write_number(4, 1, 46068.75).unwrap();
            sheet.write_string(4, 2, "1h 28m").unwrap();
        });

        let grid = read_xlsx_grid(&bytes).unwrap();

        assert_eq!(grid.len(), 5);
        assert_eq!(grid.row(1).unwrap()[1], CellValue::Text("Weekly Sync".to_string()));
        // Blank sheet rows survive as empty rows
        assert!(grid.row(2).unwrap().iter().all(CellValue::is_empty));
        assert_eq!(grid.row(4).unwrap()[1], CellValue::Number(46068.75));
        assert_eq!(grid.row(4).unwrap()[2], CellValue::Text("1h 28m".to_string()));
        assert_eq!(grid.row(0).unwrap()[1], CellValue::Empty);
    }

    #[test]
    fn test_xlsx_keeps_sheet_offset() {
        let bytes = workbook(|sheet| {
            sheet.write_string(2, 1, "Name").unwrap();
        });

        let grid = read_xlsx_grid(&bytes).unwrap();

        assert_eq!(grid.len(), 3);
        assert_eq!(grid.row(2).unwrap()[1], CellValue::Text("Name".to_string()));
        assert_eq!(grid.row(2).unwrap()[0], CellValue::Empty);
    }

    #[test]
    fn test_xlsx_rejects_non_workbooks() {
        assert!(matches!(read_xlsx_grid(b""), Err(DocumentError::Empty)));
        assert!(matches!(
            read_xlsx_grid(b"Name,Email\n"),
            Err(DocumentError::Xlsx(_))
        ));
        assert!(matches!(workbook_cell(&Data::Int(12)), CellValue::Number(n) if n == 12.0));
        assert_eq!(workbook_cell(&Data::Bool(true)), CellValue::Text("true".to_string()));
    }
}
