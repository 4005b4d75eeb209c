//! Document scanner
//!
//! Attendance exports open with a summary block (meeting title, start and
//! end time, overall duration), followed by a numbered "Participants"
//! section whose first row of column titles is the participant table header.
//! Both searches run over bounded row windows and report what they found
//! explicitly instead of advancing a shared cursor.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use super::cell::{normalized_cells, CellValue, Grid};
use super::duration::parse_duration;

/// Summary labels and the metadata keys they populate, tested in this order
pub const METADATA_LABELS: &[(&str, &str)] = &[
    ("meeting title", "title"),
    ("start time", "start_time"),
    ("end time", "end_time"),
    ("overall meeting duration", "duration"),
];

/// Substring marking the participants section
pub const SECTION_MARKER: &str = "2. participants";

/// Lone-cell form of the participants section marker
pub const SECTION_MARKER_CELL: &str = "participants";

/// Column-title fragments that identify the participant header row
pub const HEADER_KEYWORDS: &[&str] = &[
    "name",
    "first join",
    "last leave",
    "duration",
    "email",
    "in-meeting duration",
];

/// Extracted summary values keyed by `title`, `start_time`, `end_time`,
/// `duration` and `duration_minutes`
pub type Metadata = BTreeMap<String, String>;

/// Row windows and match thresholds for scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanLimits {
    /// Rows searched for summary labels
    pub metadata_window: usize,
    /// Rows searched for the section marker and header
    pub header_window: usize,
    /// Cells that must contain a header keyword
    pub min_header_keywords: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            metadata_window: 15,
            header_window: 60,
            min_header_keywords: 3,
        }
    }
}

/// Result of the header search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSearch {
    /// Index of the header row within the searched window
    Found(usize),
    /// No participants section marker inside the window
    MarkerNotFound,
    /// Marker present, but no later row looked like a header
    HeaderNotFound,
}

/// Non-fatal layout problem; the scan falls back to row 0 as header
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructureWarning {
    #[error("participants section not found in first {scanned_rows} rows; using row 0 as header")]
    SectionMarkerMissing { scanned_rows: usize },

    #[error("participant header row not found in first {scanned_rows} rows; using row 0 as header")]
    HeaderRowMissing { scanned_rows: usize },
}

/// Everything the scanner learned about a document
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub metadata: Metadata,
    pub header_row_index: usize,
    pub warning: Option<StructureWarning>,
}

/// Read summary labels from the first `window` rows
///
/// A row matches the first label (in [`METADATA_LABELS`] order) contained in
/// its joined text; the value is the first non-empty cell that is not the
/// label. Later rows overwrite earlier ones.
pub fn extract_metadata(grid: &Grid, window: usize) -> Metadata {
    let mut metadata = Metadata::new();

    for row in grid.rows().iter().take(window) {
        let joined = normalized_cells(row).join(" ");
        if joined.is_empty() {
            continue;
        }

        let Some((label, key)) = METADATA_LABELS
            .iter()
            .find(|(label, _)| joined.contains(label))
        else {
            continue;
        };

        let Some(value) = row
            .iter()
            .find(|cell| !cell.is_empty() && !cell.normalized().contains(label))
        else {
            continue;
        };

        metadata.insert(key.to_string(), value.as_text());
        if *key == "duration" {
            metadata.insert(
                "duration_minutes".to_string(),
                parse_duration(value).to_string(),
            );
        }
    }

    metadata
}

/// Locate the participant header row inside an explicit row window
///
/// Phase 1 looks for the section marker; the marker row itself is never a
/// header. Phase 2 takes the first later row with at least `min_keywords`
/// cells containing a header keyword.
pub fn find_header_row(window: &[Vec<CellValue>], min_keywords: usize) -> HeaderSearch {
    let Some(marker_index) = window.iter().position(|row| is_section_marker(row)) else {
        return HeaderSearch::MarkerNotFound;
    };

    window
        .iter()
        .enumerate()
        .skip(marker_index + 1)
        .find(|(_, row)| keyword_cells(row) >= min_keywords)
        .map(|(index, _)| HeaderSearch::Found(index))
        .unwrap_or(HeaderSearch::HeaderNotFound)
}

fn is_section_marker(row: &[CellValue]) -> bool {
    let cells = normalized_cells(row);
    cells.join(" ").contains(SECTION_MARKER)
        || (cells.len() == 1 && cells[0] == SECTION_MARKER_CELL)
}

fn keyword_cells(row: &[CellValue]) -> usize {
    normalized_cells(row)
        .iter()
        .filter(|cell| HEADER_KEYWORDS.iter().any(|keyword| cell.contains(keyword)))
        .count()
}

/// Scan a whole document: summary metadata plus header location
pub fn scan_document(grid: &Grid, limits: &ScanLimits) -> ScanOutcome {
    let metadata = extract_metadata(grid, limits.metadata_window);

    let rows = grid.rows();
    let window = &rows[..rows.len().min(limits.header_window)];

    let (header_row_index, warning) = match find_header_row(window, limits.min_header_keywords) {
        HeaderSearch::Found(index) => (index, None),
        HeaderSearch::MarkerNotFound => (
            0,
            Some(StructureWarning::SectionMarkerMissing {
                scanned_rows: window.len(),
            }),
        ),
        HeaderSearch::HeaderNotFound => (
            0,
            Some(StructureWarning::HeaderRowMissing {
                scanned_rows: window.len(),
            }),
        ),
    };

    if let Some(warning) = &warning {
        warn!("Document structure: {}", warning);
    } else {
        debug!(
            header_row_index,
            metadata_fields = metadata.len(),
            "Located participant header"
        );
    }

    ScanOutcome {
        metadata,
        header_row_index,
        warning,
    }
}
