//! Participant table extraction
//!
//! Turns the rows below the located header into [`ReportRow`]s. Columns are
//! found by case-insensitive substring on the header titles, so
//! `"In-Meeting Duration"` and `"Duration"` both land in the duration slot.

use chrono::NaiveDateTime;
use cohort_common::time::{from_spreadsheet_serial, parse_report_timestamp};

use super::cell::{normalized_cells, CellValue, Grid};
use super::duration::parse_duration;
use super::types::ReportRow;

/// Name used when a row has no name cell
pub const UNKNOWN_NAME: &str = "Unknown";

/// Cell content that marks the section after the participant table
const NEXT_SECTION: &str = "activities";

/// Column positions detected on the header row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub email: Option<usize>,
    pub name: Option<usize>,
    pub join: Option<usize>,
    pub leave: Option<usize>,
    pub duration: Option<usize>,
}

impl ColumnMap {
    /// First header cell containing each fragment wins
    pub fn detect(header: &[CellValue]) -> Self {
        let titles: Vec<String> = header.iter().map(CellValue::normalized).collect();
        let find = |fragment: &str| titles.iter().position(|title| title.contains(fragment));

        Self {
            email: find("email"),
            name: find("name"),
            join: find("join"),
            leave: find("leave"),
            duration: find("duration"),
        }
    }
}

/// Read participant rows following `header_row_index`
///
/// Stops at the first blank row or at a lone cell mentioning the next
/// ("activities") section.
pub fn extract_rows(grid: &Grid, header_row_index: usize) -> Vec<ReportRow> {
    let Some(header) = grid.row(header_row_index) else {
        return Vec::new();
    };
    let columns = ColumnMap::detect(header);

    let mut rows = Vec::new();
    for row in grid.rows().iter().skip(header_row_index + 1) {
        let cells = normalized_cells(row);
        if cells.is_empty() || (cells.len() == 1 && cells[0].contains(NEXT_SECTION)) {
            break;
        }
        rows.push(read_row(row, &columns));
    }

    tracing::debug!(
        header_row_index,
        rows = rows.len(),
        ?columns,
        "Extracted participant rows"
    );

    rows
}

fn read_row(row: &[CellValue], columns: &ColumnMap) -> ReportRow {
    let cell = |index: Option<usize>| index.and_then(|i| row.get(i)).filter(|c| !c.is_empty());

    let name = cell(columns.name)
        .map(CellValue::as_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let email = cell(columns.email)
        .map(CellValue::as_text)
        .filter(|email| !email.is_empty());

    ReportRow {
        name,
        email,
        join_time: cell(columns.join).and_then(parse_timestamp_cell),
        leave_time: cell(columns.leave).and_then(parse_timestamp_cell),
        duration_minutes: cell(columns.duration).map(parse_duration).unwrap_or(0.0),
    }
}

/// Join/leave cells are text timestamps or spreadsheet serial dates
pub fn parse_timestamp_cell(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::Text(text) => parse_report_timestamp(text),
        CellValue::Number(serial) => from_spreadsheet_serial(*serial),
        CellValue::Empty => None,
    }
}
