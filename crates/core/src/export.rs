//! Mirror tables derived from the inputs.

use crate::config::PipelineConfig;
use crate::dates::{parse_date, DateZone};
use crate::error::Result;
use crate::layout::{DISCONTINUE, FIRST_AVAILABLE, MATERIAL, MIRROR_WIDTH, SEASON};
use crate::normalize::{normalize_material, normalize_season};
use crate::store::{require_table, TableStore};
use lifecycle_sheet::CellValue;
use serde::Serialize;

/// What a mirror export wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Target table name.
    pub table: String,
    /// Whether the target table had to be created.
    pub created: bool,
    /// Rows written.
    pub rows: usize,
    /// Non-blank dates that did not parse and were cleared.
    pub dates_blanked: usize,
}

/// Copy the primary table's first four columns into the clean table.
///
/// Rows land at the same start row they were read from. Materials are
/// normalized, seasons trimmed but left in their original case, and dates
/// become real date cells (or blanks when they do not parse). Other columns
/// of the clean table are left alone.
pub fn export_clean<S: TableStore + ?Sized>(
    store: &mut S,
    config: &PipelineConfig,
) -> Result<ExportReport> {
    config.validate()?;
    require_table(store, &config.primary_table)?;

    let used = store.used_row_count(&config.primary_table)?;
    let rows = used.saturating_sub(config.start_row);
    let mut report = ExportReport {
        table: config.clean_table.clone(),
        rows,
        ..ExportReport::default()
    };
    if rows == 0 {
        tracing::info!("No data rows in '{}', clean export skipped", config.primary_table);
        return Ok(report);
    }

    let mut block =
        store.read_block(&config.primary_table, config.start_row, 0, rows, MIRROR_WIDTH)?;
    for row in &mut block {
        row[MATERIAL] = normalize_material(&row[MATERIAL]);
        row[SEASON] = normalize_season(&row[SEASON], false);
        for col in [FIRST_AVAILABLE, DISCONTINUE] {
            let (cell, blanked) = to_date_cell(&row[col], config.date_zone);
            report.dates_blanked += usize::from(blanked);
            row[col] = cell;
        }
    }

    report.created = store.ensure_table(&config.clean_table)?;
    store.write_block(&config.clean_table, config.start_row, 0, &block)?;
    tracing::info!(
        "Exported {} rows from '{}' to '{}'",
        rows,
        config.primary_table,
        config.clean_table
    );
    Ok(report)
}

/// A date cell for anything that parses, `Null` for blanks and failures.
/// The flag is set when a non-blank value was dropped.
fn to_date_cell(cell: &CellValue, zone: DateZone) -> (CellValue, bool) {
    match cell {
        CellValue::Bool(_) => (cell.clone(), false),
        _ => match parse_date(cell, zone) {
            Some(date) => (CellValue::Date(date), false),
            None => (CellValue::Null, !cell.is_blank()),
        },
    }
}

/// Copy the reference table's first four columns, header rows included, into
/// the reference mirror table.
///
/// The mirror's previous contents in those columns are cleared first so rows
/// removed from the reference do not linger.
pub fn mirror_reference<S: TableStore + ?Sized>(
    store: &mut S,
    config: &PipelineConfig,
) -> Result<ExportReport> {
    config.validate()?;
    require_table(store, &config.reference_table)?;

    let block = store.read_used(&config.reference_table, MIRROR_WIDTH)?;
    let target = &config.reference_mirror_table;
    let created = store.ensure_table(target)?;
    if !created {
        let stale = store.used_row_count(target)?;
        store.clear_block(target, 0, 0, stale, MIRROR_WIDTH)?;
    }
    store.write_block(target, 0, 0, &block)?;

    tracing::info!(
        "Mirrored {} rows from '{}' to '{}'",
        block.len(),
        config.reference_table,
        target
    );
    Ok(ExportReport {
        table: target.clone(),
        created,
        rows: block.len(),
        dates_blanked: 0,
    })
}
