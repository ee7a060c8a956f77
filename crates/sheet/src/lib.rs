//! Sheet/Book store for the lifecycle pipeline
//!
//! A small in-memory stand-in for a spreadsheet host: named sheets holding
//! rectangular grids of typed cells, with bulk block reads and writes and
//! loaders/savers for `.xlsx` workbooks and directories of CSV files.
//!
//! # Examples
//!
//! ## Reading and writing blocks
//!
//! ```
//! use lifecycle_sheet::{CellValue, Sheet};
//!
//! let mut sheet = Sheet::from_data(vec![
//!     vec!["Material", "Season"],
//!     vec!["M1", "FW24"],
//! ]);
//!
//! sheet
//!     .write_block(1, 2, &[vec![CellValue::from("Y")]])
//!     .unwrap();
//!
//! assert_eq!(sheet.col_count(), 3);
//! assert_eq!(sheet.read_block(1, 0, 1, 3)[0][2], CellValue::from("Y"));
//! ```
//!
//! ## Working with books
//!
//! ```
//! use lifecycle_sheet::{Book, Sheet};
//!
//! let mut book = Book::new();
//! book.add_sheet("Main", Sheet::new()).unwrap();
//! book.add_sheet("GFE", Sheet::new()).unwrap();
//!
//! assert_eq!(book.sheet_count(), 2);
//! ```
//!
//! ## Loading from CSV
//!
//! ```no_run
//! use lifecycle_sheet::Book;
//!
//! let book = Book::from_csv_dir("workbook/").unwrap();
//! ```

mod book;
mod cell;
mod csv;
mod error;
mod sheet;
mod xlsx;

/// Re-export book type.
pub use book::Book;
/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export CSV options.
pub use csv::CsvOptions;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet type.
pub use sheet::Sheet;
/// Re-export the Excel serial conversion used when saving dates.
pub use xlsx::datetime_to_excel_serial;
