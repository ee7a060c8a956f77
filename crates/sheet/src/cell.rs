use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell of a sheet.
///
/// Closed over the kinds a spreadsheet host hands out; every consumer matches
/// all six variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(DateTime<Utc>),
}

impl CellValue {
    /// Null, or a string holding only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            CellValue::Bool(_) | CellValue::Int(_) | CellValue::Float(_) | CellValue::Date(_) => {
                false
            }
        }
    }

    /// Numeric view of `Int` and `Float` cells. Text is never coerced.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Null | CellValue::Bool(_) | CellValue::String(_) | CellValue::Date(_) => {
                None
            }
        }
    }

    /// Text form used for CSV output and key comparison.
    ///
    /// Dates render as RFC 3339 instants so they survive a CSV round trip.
    #[must_use]
    pub fn as_str(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Infer a cell from a CSV field: blank, bool, integer, finite float,
    /// otherwise the untouched text.
    ///
    /// Dates stay text; the pipeline parses them itself.
    #[must_use]
    pub fn parse(s: &str) -> CellValue {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Null;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            CellValue::Bool(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            CellValue::Bool(false)
        } else if let Ok(i) = trimmed.parse::<i64>() {
            CellValue::Int(i)
        } else if let Some(f) = trimmed.parse::<f64>().ok().filter(|f| f.is_finite()) {
            CellValue::Float(f)
        } else {
            // Padding and apostrophes are left for the normalizer
            CellValue::String(s.to_string())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(d: DateTime<Utc>) -> Self {
        CellValue::Date(d)
    }
}
