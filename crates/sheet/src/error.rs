//! Errors raised by the sheet store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SheetError>;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    CellOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("A sheet named '{name}' already exists")]
    DuplicateSheet { name: String },

    /// Two files in a CSV directory map to the same sheet name.
    #[error("Sheet '{name}' is stored in both {first} and {second}")]
    ConflictingSheetFiles {
        name: String,
        first: String,
        second: String,
    },

    /// Rows of a block, or an appended row, disagree on width.
    #[error("Ragged rows: expected {expected} cells, found {actual}")]
    RaggedRows { expected: usize, actual: usize },

    /// Failure inside the xlsx reader or writer.
    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
