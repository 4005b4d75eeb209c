//! Tagged cell values
//!
//! Exports arrive as loosely typed grids (CSV text, JSON arrays produced by a
//! spreadsheet front end). Every cell is normalized into [`CellValue`] when
//! the grid is built, so nothing downstream handles untyped data.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One cell of an attendance export
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Empty,
}

impl CellValue {
    /// Build a cell from raw text, recognizing plain numbers
    ///
    /// Whitespace-only input is `Empty`. Text such as `"NaN"` or `"inf"`
    /// stays text so participant names are never swallowed as numbers.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() && trimmed.bytes().any(|b| b.is_ascii_digit()) => {
                CellValue::Number(n)
            }
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Cell rendered as trimmed text; integral numbers lose the `.0`
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Lowercased, trimmed text used for label and keyword tests
    pub fn normalized(&self) -> String {
        self.as_text().to_lowercase()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<RawCell>::deserialize(deserializer)? {
            None => CellValue::Empty,
            Some(RawCell::Bool(b)) => CellValue::Text(b.to_string()),
            Some(RawCell::Number(n)) => CellValue::Number(n),
            Some(RawCell::Text(s)) => CellValue::from(s.as_str()),
        })
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Empty => serializer.serialize_none(),
        }
    }
}

/// Row-major grid of cells; rows may have different widths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid(Vec<Vec<CellValue>>);

impl Grid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.0
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.0.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no rows or every cell is empty
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|row| row.iter().all(CellValue::is_empty))
    }
}

impl From<Vec<Vec<CellValue>>> for Grid {
    fn from(rows: Vec<Vec<CellValue>>) -> Self {
        Self(rows)
    }
}

/// Non-empty cells of a row, lowercased and trimmed
pub(crate) fn normalized_cells(row: &[CellValue]) -> Vec<String> {
    row.iter()
        .filter(|cell| !cell.is_empty())
        .map(CellValue::normalized)
        .filter(|text| !text.is_empty())
        .collect()
}
