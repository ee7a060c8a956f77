//! Change detection between the current and the resolved date columns.

use crate::dates::{parse_date_text, DateZone};
use crate::join::INACTIVE;
use lifecycle_sheet::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker written when a date changed.
pub const CHANGED: &str = "Y";

/// How non-blank text that does not parse as a date compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsablePolicy {
    /// Unparsable text is indistinguishable from a blank cell, so `"TBD"`
    /// against an empty resolution raises no flag. Legacy behaviour.
    #[default]
    AsBlank,
    /// Unparsable text compares by its trimmed literal value: it never equals
    /// a blank or a date, only the same text.
    Distinct,
}

impl fmt::Display for UnparsablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnparsablePolicy::AsBlank => write!(f, "as_blank"),
            UnparsablePolicy::Distinct => write!(f, "distinct"),
        }
    }
}

impl FromStr for UnparsablePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "as_blank" | "as-blank" | "blank" => Ok(UnparsablePolicy::AsBlank),
            "distinct" => Ok(UnparsablePolicy::Distinct),
            other => Err(format!(
                "invalid unparsable policy '{other}': expected blank or distinct"
            )),
        }
    }
}

/// A cell reduced to the form the flagger compares.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparable {
    Blank,
    /// Epoch milliseconds for dates, the raw value for numeric cells.
    Numeric(f64),
    /// The literal INACTIVE sentinel.
    Inactive,
    /// Unparsable text under [`UnparsablePolicy::Distinct`].
    Text(String),
}

/// Reduce a cell for comparison.
///
/// Numeric cells are compared as-is and never calendar-converted, so a serial
/// only equals the same serial.
#[must_use]
pub fn to_comparable(cell: &CellValue, zone: DateZone, policy: UnparsablePolicy) -> Comparable {
    match cell {
        CellValue::Null => Comparable::Blank,
        CellValue::Date(d) => Comparable::Numeric(d.timestamp_millis() as f64),
        CellValue::Int(i) => Comparable::Numeric(*i as f64),
        CellValue::Float(f) => Comparable::Numeric(*f),
        CellValue::Bool(b) => unparsable(&b.to_string(), policy),
        CellValue::String(s) => {
            let text = s.trim();
            if text.is_empty() {
                Comparable::Blank
            } else if text == INACTIVE {
                Comparable::Inactive
            } else {
                match parse_date_text(text, zone) {
                    Some(d) => Comparable::Numeric(d.timestamp_millis() as f64),
                    None => unparsable(text, policy),
                }
            }
        }
    }
}

fn unparsable(text: &str, policy: UnparsablePolicy) -> Comparable {
    match policy {
        UnparsablePolicy::AsBlank => Comparable::Blank,
        UnparsablePolicy::Distinct => Comparable::Text(text.to_string()),
    }
}

/// `"Y"` when `old` and `new` differ as dates, `""` otherwise.
///
/// An INACTIVE resolution carries no date, so it never raises a flag.
#[must_use]
pub fn flag(
    old: &CellValue,
    new: &CellValue,
    zone: DateZone,
    policy: UnparsablePolicy,
) -> &'static str {
    let after = to_comparable(new, zone, policy);
    if after == Comparable::Inactive {
        return "";
    }
    if to_comparable(old, zone, policy) == after {
        ""
    } else {
        CHANGED
    }
}
