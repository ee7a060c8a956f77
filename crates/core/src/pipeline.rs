//! The four-stage reconcile run.
//!
//! The primary block is read once into memory. Stages then run in a fixed
//! order over that one table, each rewriting only its own column pair and
//! writing it back with a single block write:
//!
//! 1. normalize material and season (cols 0-1)
//! 2. reformat the current dates as `MM/DD/YYYY` (cols 2-3)
//! 3. resolve dates from the reference table (cols 4-5)
//! 4. flag changed dates (cols 6-7)
//!
//! Later stages see the earlier stages' output without re-reading the store.

use crate::config::PipelineConfig;
use crate::dates::{format_date, parse_date, DateZone};
use crate::error::Result;
use crate::flag::{flag, UnparsablePolicy};
use crate::join::{build_lookup, resolve, Lookup, MatchKind};
use crate::layout::{
    DISCONTINUE, DISCONTINUE_CHANGED, FIRST_AVAILABLE, FIRST_AVAILABLE_CHANGED, MATERIAL,
    PRIMARY_WIDTH, REF_STATUS, RESOLVED_DISCONTINUE, RESOLVED_FIRST_AVAILABLE, SEASON,
};
use crate::normalize::{normalize_material, normalize_season};
use crate::store::{require_table, TableStore};
use lifecycle_sheet::CellValue;
use serde::Serialize;

type Table = Vec<Vec<CellValue>>;

/// Counts gathered during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Primary rows processed.
    pub rows: usize,
    /// Rows matched to an active reference entry.
    pub matched: usize,
    /// Rows matched to an entry that is not active.
    pub inactive: usize,
    /// Rows with no reference entry.
    pub unmatched: usize,
    pub first_available_changed: usize,
    pub discontinue_changed: usize,
    /// Non-blank current dates that did not parse and were cleared.
    pub dates_blanked: usize,
    /// Distinct keys in the reference lookup.
    pub reference_entries: usize,
    /// Reference rows that replaced an earlier row with the same key.
    pub duplicate_keys: usize,
}

/// Runs the reconcile stages against a [`TableStore`].
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over the primary table.
    ///
    /// Both tables are checked before anything is written, so a missing table
    /// leaves the store untouched. An empty primary range is a successful
    /// no-op. Each run recomputes from the current contents, so running twice
    /// gives the same result as running once.
    pub fn run<S: TableStore + ?Sized>(&self, store: &mut S) -> Result<RunReport> {
        let config = &self.config;
        config.validate()?;
        require_table(store, &config.primary_table)?;
        require_table(store, &config.reference_table)?;

        let reference = store.read_used(&config.reference_table, REF_STATUS + 1)?;
        let lookup = build_lookup(&reference, config.reference_header_rows);

        let used = store.used_row_count(&config.primary_table)?;
        let rows = used.saturating_sub(config.start_row);
        let mut report = RunReport {
            rows,
            reference_entries: lookup.len(),
            duplicate_keys: lookup.overwritten(),
            ..RunReport::default()
        };
        if rows == 0 {
            tracing::info!(
                "No data rows in '{}' from row {}, nothing to do",
                config.primary_table,
                config.start_row
            );
            return Ok(report);
        }

        let mut table =
            store.read_block(&config.primary_table, config.start_row, 0, rows, PRIMARY_WIDTH)?;

        normalize_keys(&mut table, config.uppercase_season);
        self.write_columns(store, &table, MATERIAL)?;
        tracing::info!("Normalized material and season on {} rows", rows);

        report.dates_blanked = format_current_dates(&mut table, config.date_zone);
        self.write_columns(store, &table, FIRST_AVAILABLE)?;
        if report.dates_blanked > 0 {
            tracing::warn!(
                "Cleared {} unparsable dates in '{}'",
                report.dates_blanked,
                config.primary_table
            );
        }
        tracing::info!("Formatted current dates on {} rows", rows);

        let kinds = resolve_dates(&mut table, &lookup, config.date_zone);
        for kind in &kinds {
            match kind {
                MatchKind::Active => report.matched += 1,
                MatchKind::Inactive => report.inactive += 1,
                MatchKind::Unmatched => report.unmatched += 1,
            }
        }
        self.write_columns(store, &table, RESOLVED_FIRST_AVAILABLE)?;
        tracing::info!(
            "Resolved dates from '{}': {} active, {} inactive, {} unmatched",
            config.reference_table,
            report.matched,
            report.inactive,
            report.unmatched
        );

        let (fa, disco) = flag_changes(&mut table, &kinds, config.date_zone, config.unparsable);
        report.first_available_changed = fa;
        report.discontinue_changed = disco;
        self.write_columns(store, &table, FIRST_AVAILABLE_CHANGED)?;
        tracing::info!("Flagged {} first-available and {} discontinue changes", fa, disco);

        Ok(report)
    }

    /// Write back the column pair starting at `start_col`.
    fn write_columns<S: TableStore + ?Sized>(
        &self,
        store: &mut S,
        table: &Table,
        start_col: usize,
    ) -> Result<()> {
        let block: Table = table
            .iter()
            .map(|row| row.iter().skip(start_col).take(2).cloned().collect())
            .collect();
        store.write_block(&self.config.primary_table, self.config.start_row, start_col, &block)
    }
}

fn normalize_keys(table: &mut Table, uppercase_season: bool) {
    for row in table.iter_mut() {
        row[MATERIAL] = normalize_material(&row[MATERIAL]);
        row[SEASON] = normalize_season(&row[SEASON], uppercase_season);
    }
}

/// Rewrite the current dates as text. Returns how many non-blank cells could
/// not be parsed and were cleared.
fn format_current_dates(table: &mut Table, zone: DateZone) -> usize {
    let mut blanked = 0;
    for (index, row) in table.iter_mut().enumerate() {
        for col in [FIRST_AVAILABLE, DISCONTINUE] {
            let cell = &row[col];
            let formatted = match parse_date(cell, zone) {
                Some(date) => CellValue::String(format_date(date, zone)),
                None => {
                    if !cell.is_blank() {
                        tracing::debug!("Row {} col {}: '{}' is not a date", index, col, cell);
                        blanked += 1;
                    }
                    CellValue::Null
                }
            };
            row[col] = formatted;
        }
    }
    blanked
}

fn text_or_null(text: String) -> CellValue {
    if text.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(text)
    }
}

fn resolve_dates(table: &mut Table, lookup: &Lookup, zone: DateZone) -> Vec<MatchKind> {
    table
        .iter_mut()
        .enumerate()
        .map(|(index, row)| {
            let resolution = resolve(row, lookup, zone);
            if resolution.kind == MatchKind::Unmatched {
                tracing::debug!(
                    "Row {}: no reference entry for '{}' / '{}'",
                    index,
                    row[MATERIAL],
                    row[SEASON]
                );
            }
            row[RESOLVED_FIRST_AVAILABLE] = text_or_null(resolution.first_available);
            row[RESOLVED_DISCONTINUE] = text_or_null(resolution.discontinue);
            resolution.kind
        })
        .collect()
}

/// Flag rows whose dates were resolved from an active entry. Rows without
/// resolved dates get empty flags.
fn flag_changes(
    table: &mut Table,
    kinds: &[MatchKind],
    zone: DateZone,
    policy: UnparsablePolicy,
) -> (usize, usize) {
    let mut counts = (0, 0);
    for (row, kind) in table.iter_mut().zip(kinds) {
        let (fa, disco) = if *kind == MatchKind::Active {
            (
                flag(&row[FIRST_AVAILABLE], &row[RESOLVED_FIRST_AVAILABLE], zone, policy),
                flag(&row[DISCONTINUE], &row[RESOLVED_DISCONTINUE], zone, policy),
            )
        } else {
            ("", "")
        };
        counts.0 += usize::from(!fa.is_empty());
        counts.1 += usize::from(!disco.is_empty());
        row[FIRST_AVAILABLE_CHANGED] = text_or_null(fa.to_string());
        row[DISCONTINUE_CHANGED] = text_or_null(disco.to_string());
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle_sheet::{Book, Sheet};

    fn book(main: Vec<Vec<&str>>, gfe: Vec<Vec<&str>>) -> Book {
        let mut book = Book::new();
        book.add_sheet("Main", Sheet::from_data(main)).unwrap();
        book.add_sheet("GFE", Sheet::from_data(gfe)).unwrap();
        book
    }

    fn utc() -> Pipeline {
        Pipeline::new(PipelineConfig::default().with_date_zone(DateZone::Utc))
    }

    #[test]
    fn test_missing_reference_fails_before_writing() {
        let mut book = Book::new();
        book.add_sheet("Main", Sheet::from_data(vec![vec!["h"], vec!["h"], vec![" 'x "]]))
            .unwrap();
        let err = utc().run(&mut book).unwrap_err();
        assert!(err.to_string().contains("GFE"));
        assert_eq!(
            book.get_sheet("Main").unwrap().get(2, 0).unwrap(),
            &CellValue::from(" 'x ")
        );
    }

    #[test]
    fn test_header_only_is_a_no_op() {
        let mut book = book(vec![vec!["Material"], vec!["sub"]], vec![vec!["Material"]]);
        let report = utc().run(&mut book).unwrap();
        assert_eq!(report.rows, 0);
        assert_eq!(book.get_sheet("Main").unwrap().col_count(), 1);
    }

    #[test]
    fn test_unparsable_current_dates_are_cleared() {
        let mut book = book(
            vec![
                vec!["h"],
                vec!["h"],
                vec!["M1", "s1", "TBD", "2024-03-05"],
            ],
            vec![vec!["h"]],
        );
        let report = utc().run(&mut book).unwrap();
        assert_eq!(report.dates_blanked, 1);
        assert_eq!(report.unmatched, 1);

        let main = book.get_sheet("Main").unwrap();
        assert_eq!(main.get(2, 1).unwrap(), &CellValue::from("S1"));
        assert_eq!(main.get(2, 2).unwrap(), &CellValue::Null);
        assert_eq!(main.get(2, 3).unwrap(), &CellValue::from("03/05/2024"));
        assert_eq!(main.col_count(), PRIMARY_WIDTH);
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = RunReport {
            rows: 3,
            matched: 1,
            ..RunReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"], 3);
        assert_eq!(json["matched"], 1);
        assert_eq!(json["dates_blanked"], 0);
    }

    #[test]
    fn test_flags_written_as_y_or_null() {
        let mut book = book(
            vec![
                vec!["h"],
                vec!["h"],
                vec!["M1", "S1", "01/01/2024", ""],
            ],
            vec![
                vec!["Material", "Season", "FA", "Disco", "Status"],
                vec!["M1", "S1", "2024-02-01", "", "Active"],
            ],
        );
        let report = utc().run(&mut book).unwrap();
        assert_eq!(report.first_available_changed, 1);
        assert_eq!(report.discontinue_changed, 0);

        let main = book.get_sheet("Main").unwrap();
        assert_eq!(main.get(2, 4).unwrap(), &CellValue::from("02/01/2024"));
        assert_eq!(main.get(2, 5).unwrap(), &CellValue::Null);
        assert_eq!(main.get(2, 6).unwrap(), &CellValue::from("Y"));
        assert_eq!(main.get(2, 7).unwrap(), &CellValue::Null);
    }
}
