//! Material/season join against the reference table.

use crate::dates::{format_date, parse_date, DateZone};
use crate::layout::{
    MATERIAL, REF_DISCONTINUE, REF_FIRST_AVAILABLE, REF_MATERIAL, REF_SEASON, REF_STATUS, SEASON,
};
use crate::normalize::normalize_key;
use lifecycle_sheet::CellValue;
use std::collections::HashMap;

/// Written to both resolved columns when the reference row is not active.
pub const INACTIVE: &str = "INACTIVE";

/// The only status that yields resolved dates.
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// One reference row, as stored in the lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub first_available: CellValue,
    pub discontinue: CellValue,
    /// Trimmed, upper-cased status text.
    pub status: String,
}

impl ReferenceEntry {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

/// Reference entries keyed by [`join_key`]. Built per run.
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    entries: HashMap<String, ReferenceEntry>,
    overwritten: usize,
    skipped: usize,
}

impl Lookup {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ReferenceEntry> {
        self.entries.get(key)
    }

    /// Entry for a material/season pair, matched case- and padding-insensitively.
    #[must_use]
    pub fn find(&self, material: &CellValue, season: &CellValue) -> Option<&ReferenceEntry> {
        self.get(&join_key(material, season))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows that replaced an earlier row with the same key.
    #[must_use]
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }

    /// Rows ignored for lacking a material or season.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// `material|season`, each part trimmed and lower-cased.
#[must_use]
pub fn join_key(material: &CellValue, season: &CellValue) -> String {
    format!("{}|{}", normalize_key(material), normalize_key(season))
}

fn cell_at(row: &[CellValue], col: usize) -> &CellValue {
    const NULL: &CellValue = &CellValue::Null;
    row.get(col).unwrap_or(NULL)
}

/// Index the reference rows below the first `header_rows` rows.
///
/// Rows with a blank material or season are skipped. When two rows share a
/// key the later one wins.
#[must_use]
pub fn build_lookup(rows: &[Vec<CellValue>], header_rows: usize) -> Lookup {
    let mut lookup = Lookup::default();

    for (index, row) in rows.iter().enumerate().skip(header_rows) {
        let material = cell_at(row, REF_MATERIAL);
        let season = cell_at(row, REF_SEASON);
        if material.is_blank() || season.is_blank() {
            lookup.skipped += 1;
            continue;
        }

        let key = join_key(material, season);
        let entry = ReferenceEntry {
            first_available: cell_at(row, REF_FIRST_AVAILABLE).clone(),
            discontinue: cell_at(row, REF_DISCONTINUE).clone(),
            status: cell_at(row, REF_STATUS).as_str().trim().to_uppercase(),
        };
        if lookup.entries.insert(key.clone(), entry).is_some() {
            tracing::debug!("Reference key {} repeated at row {}, later row wins", key, index);
            lookup.overwritten += 1;
        }
    }

    lookup
}

/// How a primary row fared in the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Unmatched,
    Inactive,
    Active,
}

/// Values for the two resolved date columns of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub kind: MatchKind,
    pub first_available: String,
    pub discontinue: String,
}

impl Resolution {
    fn unmatched() -> Self {
        Resolution {
            kind: MatchKind::Unmatched,
            first_available: String::new(),
            discontinue: String::new(),
        }
    }

    /// The pair as plain strings, `("", "")` when unmatched.
    #[must_use]
    pub fn pair(&self) -> (&str, &str) {
        (&self.first_available, &self.discontinue)
    }
}

/// Resolve a primary row's dates from the lookup.
///
/// Inactive entries resolve to the INACTIVE sentinel in both columns. For
/// active entries each date is parsed and formatted on its own, so one may
/// resolve while the other stays blank.
#[must_use]
pub fn resolve(row: &[CellValue], lookup: &Lookup, zone: DateZone) -> Resolution {
    let Some(entry) = lookup.find(cell_at(row, MATERIAL), cell_at(row, SEASON)) else {
        return Resolution::unmatched();
    };

    if !entry.is_active() {
        return Resolution {
            kind: MatchKind::Inactive,
            first_available: INACTIVE.to_string(),
            discontinue: INACTIVE.to_string(),
        };
    }

    let render = |cell: &CellValue| {
        parse_date(cell, zone)
            .map(|d| format_date(d, zone))
            .unwrap_or_default()
    };
    Resolution {
        kind: MatchKind::Active,
        first_available: render(&entry.first_available),
        discontinue: render(&entry.discontinue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn s(text: &str) -> CellValue {
        CellValue::from(text)
    }

    fn date(y: i32, m: u32, d: u32) -> CellValue {
        CellValue::Date(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    fn header() -> Vec<CellValue> {
        vec![s("Material"), s("Season"), s("FA"), s("Disco"), s("Status")]
    }

    #[test]
    fn test_last_row_wins_on_duplicate_key() {
        let rows = vec![
            header(),
            vec![s("M1"), s("S1"), date(2024, 1, 1), date(2024, 6, 1), s("ACTIVE")],
            vec![s("M1"), s("S1"), date(2024, 2, 1), date(2024, 7, 1), s("INACTIVE")],
        ];
        let lookup = build_lookup(&rows, 1);

        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.overwritten(), 1);
        let entry = lookup.get("m1|s1").unwrap();
        assert_eq!(entry.status, "INACTIVE");
        assert_eq!(entry.first_available, date(2024, 2, 1));
    }

    #[test]
    fn test_header_row_is_always_skipped() {
        let rows = vec![vec![s("M1"), s("S1"), s(""), s(""), s("ACTIVE")]];
        assert!(build_lookup(&rows, 1).is_empty());
        assert_eq!(build_lookup(&rows, 0).len(), 1);
    }

    #[test]
    fn test_blank_keys_are_skipped() {
        let rows = vec![
            header(),
            vec![s(""), s("S1"), s(""), s(""), s("ACTIVE")],
            vec![s("M2"), CellValue::Null, s(""), s(""), s("ACTIVE")],
            vec![s("M3")],
        ];
        let lookup = build_lookup(&rows, 1);
        assert!(lookup.is_empty());
        assert_eq!(lookup.skipped(), 3);
    }

    #[test]
    fn test_key_ignores_case_padding_and_type() {
        let rows = vec![
            header(),
            vec![CellValue::Int(123), s(" fw24 "), s(""), s(""), s(" active ")],
        ];
        let lookup = build_lookup(&rows, 1);

        let entry = lookup.find(&CellValue::Float(123.0), &s("FW24")).unwrap();
        assert!(entry.is_active());
        assert!(lookup.find(&s("'123"), &s("FW24")).is_none());
    }

    #[test]
    fn test_missing_status_is_not_active() {
        let rows = vec![header(), vec![s("M1"), s("S1"), date(2024, 1, 1)]];
        let lookup = build_lookup(&rows, 1);
        let resolution = resolve(&[s("M1"), s("S1")], &lookup, DateZone::Utc);
        assert_eq!(resolution.pair(), (INACTIVE, INACTIVE));
        assert_eq!(resolution.kind, MatchKind::Inactive);
    }

    #[test]
    fn test_resolve_absent_key() {
        let lookup = build_lookup(&[header()], 1);
        let resolution = resolve(&[s("M9"), s("S9")], &lookup, DateZone::Utc);
        assert_eq!(resolution.pair(), ("", ""));
        assert_eq!(resolution.kind, MatchKind::Unmatched);
    }

    #[test]
    fn test_resolve_active_formats_dates() {
        let rows = vec![
            header(),
            vec![s("M1"), s("S1"), CellValue::Int(45356), s("2024-12-31"), s("ACTIVE")],
        ];
        let lookup = build_lookup(&rows, 1);
        let resolution = resolve(&[s("m1"), s("s1")], &lookup, DateZone::Utc);
        assert_eq!(resolution.pair(), ("03/05/2024", "12/31/2024"));
        assert_eq!(resolution.kind, MatchKind::Active);
    }

    #[test]
    fn test_resolve_active_fields_are_independent() {
        let rows = vec![
            header(),
            vec![s("M1"), s("S1"), s("TBD"), date(2025, 1, 15), s("ACTIVE")],
            vec![s("M2"), s("S1"), s("TBD"), CellValue::Null, s("ACTIVE")],
        ];
        let lookup = build_lookup(&rows, 1);

        let one = resolve(&[s("M1"), s("S1")], &lookup, DateZone::Utc);
        assert_eq!(one.pair(), ("", "01/15/2025"));

        let both = resolve(&[s("M2"), s("S1")], &lookup, DateZone::Utc);
        assert_eq!(both.pair(), ("", ""));
        assert_eq!(both.kind, MatchKind::Active);
    }
}
