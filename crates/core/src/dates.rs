//! Date parsing and formatting for lifecycle cells.
//!
//! Dates travel through the pipeline as UTC instants. A [`DateZone`] decides
//! which wall clock is used when text without an offset is read and when an
//! instant is rendered as `MM/DD/YYYY`.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use lifecycle_sheet::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// 1899-12-31T00:00:00Z, day zero of the legacy serial system.
const SERIAL_ANCHOR_MILLIS: i64 = -2_209_075_200_000;

/// Serials above this day carry the fictitious 1900-02-29.
const LEAP_BUG_SERIAL: f64 = 60.0;

/// Offset-less date-time layouts beginning with an ISO date.
const ISO_LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Month-name layouts, all read as local midnight.
const NAMED_MONTH_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%a %b %d %Y",
    "%a, %b %d, %Y",
];

/// The wall clock used to read and render dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateZone {
    /// The machine's local time zone.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl DateZone {
    /// Calendar fields of `instant` as seen on this zone's wall clock.
    #[must_use]
    pub fn to_wall_clock(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            DateZone::Local => instant.with_timezone(&Local).naive_local(),
            DateZone::Utc => instant.naive_utc(),
            DateZone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
        }
    }

    /// The instant at which this zone's wall clock shows `naive`.
    ///
    /// Ambiguous local times resolve to the earlier instant; times skipped by
    /// a DST jump do not exist and yield `None`.
    #[must_use]
    pub fn from_wall_clock(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            DateZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            DateZone::Utc => Some(Utc.from_utc_datetime(&naive)),
            DateZone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Midnight of `date` on this zone's wall clock.
    #[must_use]
    pub fn midnight(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.from_wall_clock(date.and_time(NaiveTime::MIN))
    }
}

impl fmt::Display for DateZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateZone::Local => write!(f, "local"),
            DateZone::Utc => write!(f, "utc"),
            DateZone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for DateZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(DateZone::Local),
            "utc" | "z" => return Ok(DateZone::Utc),
            _ => {}
        }
        parse_offset(trimmed)
            .map(DateZone::Fixed)
            .ok_or_else(|| format!("invalid date zone '{s}': expected local, utc or ±HH:MM"))
    }
}

impl TryFrom<String> for DateZone {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateZone> for String {
    fn from(zone: DateZone) -> Self {
        zone.to_string()
    }
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Convert a legacy spreadsheet serial to an instant.
///
/// Serials above 60 are shifted back one day to undo the phantom
/// 1900-02-29; 60 itself is left alone.
#[must_use]
pub fn serial_to_date(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let adjusted = if serial > LEAP_BUG_SERIAL {
        serial - 1.0
    } else {
        serial
    };
    let offset = (adjusted * MILLIS_PER_DAY).trunc();
    if offset.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    DateTime::from_timestamp_millis(SERIAL_ANCHOR_MILLIS.checked_add(offset as i64)?)
}

/// Read a cell as a date.
///
/// `None` means "could not parse", never an error: blanks, booleans and
/// unrecognised text all land here.
#[must_use]
pub fn parse_date(cell: &CellValue, zone: DateZone) -> Option<DateTime<Utc>> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Int(i) => serial_to_date(*i as f64),
        CellValue::Float(f) => serial_to_date(*f),
        CellValue::String(s) => parse_date_text(s, zone),
        CellValue::Null | CellValue::Bool(_) => None,
    }
}

/// General date parse over the textual forms spreadsheets commonly hold.
///
/// ISO date-only text is UTC midnight; every other form without an explicit
/// offset is read on `zone`'s wall clock.
#[must_use]
pub fn parse_date_text(text: &str, zone: DateZone) -> Option<DateTime<Utc>> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    for format in ISO_LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return zone.from_wall_clock(naive);
        }
    }
    if let Some(naive) = parse_numeric_date(s) {
        return zone.from_wall_clock(naive);
    }
    for format in NAMED_MONTH_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return zone.midnight(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    None
}

/// `M/D/YYYY`, `M/D/YY`, `M-D-YYYY` or `YYYY/M/D`, with an optional
/// `H:MM[:SS]` after a space.
fn parse_numeric_date(s: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = match s.split_once(char::is_whitespace) {
        Some((date, time)) => (date, Some(time.trim())),
        None => (s, None),
    };

    let separator = if date_part.contains('/') { '/' } else { '-' };
    let parts: Vec<&str> = date_part.split(separator).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    if ![a, b, c]
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|ch| ch.is_ascii_digit()))
    {
        return None;
    }

    let (year, month, day) = if a.len() == 4 {
        (a.parse().ok()?, b.parse().ok()?, c.parse().ok()?)
    } else {
        (expand_year(c)?, a.parse().ok()?, b.parse().ok()?)
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match time_part {
        None => NaiveTime::MIN,
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
            .ok()?,
    };
    Some(date.and_time(time))
}

/// Two-digit years: 00-49 are 20xx, 50-99 are 19xx.
fn expand_year(text: &str) -> Option<i32> {
    let year: i32 = text.parse().ok()?;
    match text.len() {
        1 | 2 if year < 50 => Some(2000 + year),
        1 | 2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

/// Render `date` as `MM/DD/YYYY` using the calendar fields of `zone`.
#[must_use]
pub fn format_date(date: DateTime<Utc>, zone: DateZone) -> String {
    zone.to_wall_clock(date).format("%m/%d/%Y").to_string()
}
