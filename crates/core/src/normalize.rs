//! Cell cleanup for the material and season key columns.

use lifecycle_sheet::CellValue;

/// Clean a material identifier.
///
/// Strings lose one leading apostrophe (the spreadsheet "store as text"
/// marker) and surrounding whitespace; text that is entirely a number becomes
/// that number, leading zeros dropped. Other kinds pass through.
#[must_use]
pub fn normalize_material(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::String(s) => {
            let text = s.strip_prefix('\'').unwrap_or(s).trim();
            parse_number(text).unwrap_or_else(|| CellValue::String(text.to_string()))
        }
        CellValue::Null => CellValue::Null,
        CellValue::Bool(b) => CellValue::Bool(*b),
        CellValue::Int(i) => CellValue::Int(*i),
        CellValue::Float(f) => CellValue::Float(*f),
        CellValue::Date(d) => CellValue::Date(*d),
    }
}

/// Clean a season code: trim, and upper-case when `uppercase` is set.
#[must_use]
pub fn normalize_season(cell: &CellValue, uppercase: bool) -> CellValue {
    match cell {
        CellValue::String(s) if uppercase => CellValue::String(s.trim().to_uppercase()),
        CellValue::String(s) => CellValue::String(s.trim().to_string()),
        CellValue::Null => CellValue::Null,
        CellValue::Bool(b) => CellValue::Bool(*b),
        CellValue::Int(i) => CellValue::Int(*i),
        CellValue::Float(f) => CellValue::Float(*f),
        CellValue::Date(d) => CellValue::Date(*d),
    }
}

/// Case- and padding-insensitive string form of a key cell.
#[must_use]
pub fn normalize_key(cell: &CellValue) -> String {
    cell.as_str().trim().to_lowercase()
}

/// Whole-text numeric parse. Empty text is not a number.
fn parse_number(text: &str) -> Option<CellValue> {
    if text.is_empty() {
        return None;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(CellValue::Int(i));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(CellValue::Float)
}
