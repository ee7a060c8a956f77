//! # lifecycle-core
//!
//! Reconciles a product-lifecycle table against an authoritative reference
//! table.
//!
//! This crate provides:
//! - Cell normalization and date parsing/formatting
//! - The material/season join and change flagger
//! - The [`Pipeline`] orchestrator over any [`TableStore`]
//! - Clean and reference mirror exports
//!
//! ```
//! use lifecycle_core::{DateZone, Pipeline, PipelineConfig};
//! use lifecycle_sheet::{Book, CellValue, Sheet};
//!
//! let mut book = Book::new();
//! book.add_sheet("Main", Sheet::from_data(vec![
//!     vec!["Material", "Season", "FA", "Disco"],
//!     vec!["", "", "", ""],
//!     vec!["'123", "fw24", "2024-01-01", "2024-06-01"],
//! ])).unwrap();
//! book.add_sheet("GFE", Sheet::from_data(vec![
//!     vec!["Material", "Season", "FA", "Disco", "Status"],
//!     vec!["123", "FW24", "2024-02-01", "2024-06-01", "ACTIVE"],
//! ])).unwrap();
//!
//! let pipeline = Pipeline::new(PipelineConfig::default().with_date_zone(DateZone::Utc));
//! let report = pipeline.run(&mut book).unwrap();
//!
//! assert_eq!(report.first_available_changed, 1);
//! let main = book.get_sheet("Main").unwrap();
//! assert_eq!(main.get(2, 4).unwrap(), &CellValue::from("02/01/2024"));
//! ```

/// Pipeline configuration.
pub mod config;
/// Date parsing and formatting.
pub mod dates;
/// Error types and result aliases.
pub mod error;
/// Clean and reference mirror exports.
pub mod export;
/// Change flagger.
pub mod flag;
/// Reference lookup and row resolution.
pub mod join;
/// Column positions.
pub mod layout;
/// Key cell cleanup.
pub mod normalize;
/// Stage orchestration.
pub mod pipeline;
/// Table store port.
pub mod store;

pub use config::PipelineConfig;
pub use dates::{format_date, parse_date, DateZone};
pub use error::{PipelineError, Result};
pub use export::{export_clean, mirror_reference, ExportReport};
pub use flag::{flag, UnparsablePolicy};
pub use join::{build_lookup, resolve, Lookup, MatchKind, Resolution};
pub use normalize::{normalize_material, normalize_season};
pub use pipeline::{Pipeline, RunReport};
pub use store::TableStore;
