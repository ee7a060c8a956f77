//! # lifecycle-cli
//!
//! Command-line interface for the lifecycle reconcile pipeline.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use lifecycle_core::{
    export_clean, mirror_reference, DateZone, ExportReport, Pipeline, PipelineConfig, RunReport,
    UnparsablePolicy,
};
use lifecycle_sheet::Book;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// lifecycle - reconcile product-lifecycle dates against a reference table
#[derive(Parser)]
#[command(name = "lifecycle")]
#[command(author, version, about = "Reconcile product-lifecycle dates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize keys, reformat dates, resolve from the reference and flag changes
    Run(WorkbookArgs),
    /// Copy the primary table's key and date columns into the clean table
    Clean(WorkbookArgs),
    /// Copy the reference table into its mirror table
    Mirror(WorkbookArgs),
}

#[derive(Args)]
struct WorkbookArgs {
    /// Workbook: an .xlsx file or a directory of .csv/.tsv files
    #[arg(value_name = "WORKBOOK")]
    workbook: PathBuf,

    /// Where to save the result (defaults to overwriting WORKBOOK)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// YAML pipeline configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Primary table name
    #[arg(long)]
    primary: Option<String>,

    /// Reference table name
    #[arg(long)]
    reference: Option<String>,

    /// First data row of the primary table (0-based)
    #[arg(long)]
    start_row: Option<usize>,

    /// Date zone: local, utc or a fixed offset such as +02:00
    #[arg(long, allow_hyphen_values = true)]
    zone: Option<DateZone>,

    /// Unparsable date handling in the flagger (blank, distinct)
    #[arg(long)]
    unparsable: Option<UnparsablePolicy>,

    /// Report format
    #[arg(short = 'f', long = "format", default_value = "text")]
    format: OutputFormat,
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable summary (default)
    #[default]
    Text,
    /// JSON report
    Json,
}

/// On-disk workbook layout, chosen from the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WorkbookKind {
    Xlsx,
    CsvDir,
}

impl WorkbookKind {
    fn detect(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(WorkbookKind::CsvDir);
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm") => {
                Ok(WorkbookKind::Xlsx)
            }
            // A path that does not exist yet and has no extension becomes a CSV directory
            None if !path.exists() => Ok(WorkbookKind::CsvDir),
            _ => bail!(
                "Unsupported workbook '{}': expected an .xlsx file or a CSV directory",
                path.display()
            ),
        }
    }
}

fn load_book(path: &Path) -> Result<Book> {
    let book = match WorkbookKind::detect(path)? {
        WorkbookKind::Xlsx => Book::from_xlsx(path),
        WorkbookKind::CsvDir => Book::from_csv_dir(path),
    };
    book.with_context(|| format!("Failed to read workbook: {}", path.display()))
}

fn save_book(book: &Book, path: &Path) -> Result<()> {
    let saved = match WorkbookKind::detect(path)? {
        WorkbookKind::Xlsx => book.save_as_xlsx(path),
        WorkbookKind::CsvDir => book.save_as_csv_dir(path),
    };
    saved.with_context(|| format!("Failed to write workbook: {}", path.display()))
}

/// File configuration with command-line overrides applied on top.
fn build_config(args: &WorkbookArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(primary) = &args.primary {
        config.primary_table.clone_from(primary);
    }
    if let Some(reference) = &args.reference {
        config.reference_table.clone_from(reference);
    }
    if let Some(start_row) = args.start_row {
        config.start_row = start_row;
    }
    if let Some(zone) = args.zone {
        config.date_zone = zone;
    }
    if let Some(policy) = args.unparsable {
        config.unparsable = policy;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = execute(&cli.command) {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
    Ok(())
}

fn execute(command: &Command) -> Result<()> {
    let (Command::Run(args) | Command::Clean(args) | Command::Mirror(args)) = command;
    let config = build_config(args)?;
    let mut book = load_book(&args.workbook)?;

    match command {
        Command::Run(_) => {
            let report = Pipeline::new(config).run(&mut book)?;
            print_report(&report, args.format, print_run_text)?;
        }
        Command::Clean(_) => {
            let report = export_clean(&mut book, &config)?;
            print_report(&report, args.format, print_export_text)?;
        }
        Command::Mirror(_) => {
            let report = mirror_reference(&mut book, &config)?;
            print_report(&report, args.format, print_export_text)?;
        }
    }

    let output = args.output.as_deref().unwrap_or(&args.workbook);
    save_book(&book, output)?;
    tracing::info!("Saved workbook to {}", output.display());
    Ok(())
}

fn print_report<T: Serialize>(report: &T, format: OutputFormat, text: fn(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => text(report),
    }
    Ok(())
}

fn print_run_text(report: &RunReport) {
    println!("{} {} rows", "Processed".green().bold(), report.rows);
    println!(
        "  {} active, {} inactive, {} unmatched",
        report.matched, report.inactive, report.unmatched
    );
    println!(
        "  {} first-available changes, {} discontinue changes",
        report.first_available_changed.to_string().cyan(),
        report.discontinue_changed.to_string().cyan()
    );
    if report.dates_blanked > 0 {
        println!(
            "  {}",
            format!("{} unparsable dates cleared", report.dates_blanked).yellow()
        );
    }
    if report.duplicate_keys > 0 {
        println!(
            "  {}",
            format!("{} duplicate reference keys (last row wins)", report.duplicate_keys)
                .yellow()
        );
    }
}

fn print_export_text(report: &ExportReport) {
    let verb = if report.created { "Created" } else { "Updated" };
    println!(
        "{} '{}' with {} rows",
        verb.green().bold(),
        report.table,
        report.rows
    );
    if report.dates_blanked > 0 {
        println!(
            "  {}",
            format!("{} unparsable dates cleared", report.dates_blanked).yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle_sheet::{CellValue, Sheet};
    use std::fs;
    use tempfile::tempdir;

    fn args(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv).unwrap()
    }

    fn workbook_args(cli: &Cli) -> &WorkbookArgs {
        let (Command::Run(args) | Command::Clean(args) | Command::Mirror(args)) = &cli.command;
        args
    }

    #[test]
    fn test_overrides_apply_over_defaults() {
        let cli = args(&[
            "lifecycle",
            "run",
            "book.xlsx",
            "--primary",
            "Lifecycle",
            "--start-row",
            "1",
            "--zone",
            "-05:00",
            "--unparsable",
            "distinct",
            "-f",
            "json",
        ]);
        let wa = workbook_args(&cli);
        assert_eq!(wa.format, OutputFormat::Json);

        let config = build_config(wa).unwrap();
        assert_eq!(config.primary_table, "Lifecycle");
        assert_eq!(config.reference_table, "GFE");
        assert_eq!(config.start_row, 1);
        assert_eq!(config.date_zone, "-05:00".parse::<DateZone>().unwrap());
        assert_eq!(config.unparsable, UnparsablePolicy::Distinct);
    }

    #[test]
    fn test_overrides_apply_over_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        fs::write(&path, "reference_table: Master\nstart_row: 5\n").unwrap();

        let cli = args(&[
            "lifecycle",
            "clean",
            "book.xlsx",
            "--config",
            path.to_str().unwrap(),
            "--start-row",
            "3",
        ]);
        let config = build_config(workbook_args(&cli)).unwrap();
        assert_eq!(config.reference_table, "Master");
        assert_eq!(config.start_row, 3);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = args(&["lifecycle", "run", "book.xlsx", "--primary", "GFE"]);
        assert!(build_config(workbook_args(&cli)).is_err());
        assert!(Cli::try_parse_from(["lifecycle", "run", "b.xlsx", "--zone", "mars"]).is_err());
    }

    #[test]
    fn test_workbook_kind_detection() {
        let dir = tempdir().unwrap();
        assert_eq!(WorkbookKind::detect(dir.path()).unwrap(), WorkbookKind::CsvDir);
        assert_eq!(
            WorkbookKind::detect(&dir.path().join("out.XLSX")).unwrap(),
            WorkbookKind::Xlsx
        );
        assert_eq!(
            WorkbookKind::detect(&dir.path().join("fresh")).unwrap(),
            WorkbookKind::CsvDir
        );
        assert!(WorkbookKind::detect(&dir.path().join("book.ods")).is_err());
    }

    #[test]
    fn test_run_on_csv_directory_to_xlsx() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir(&input).unwrap();
        fs::write(
            input.join("Main.csv"),
            "Material,Season,FA,Disco\n,,,\n'7,fw24,1/1/2024,\n",
        )
        .unwrap();
        fs::write(
            input.join("GFE.csv"),
            "Material,Season,FA,Disco,Status\n7,FW24,2024-02-01,,ACTIVE\n",
        )
        .unwrap();
        let output = dir.path().join("out.xlsx");

        let cli = args(&[
            "lifecycle",
            "run",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--zone",
            "utc",
        ]);
        execute(&cli.command).unwrap();

        let book = Book::from_xlsx(&output).unwrap();
        let main = book.get_sheet("Main").unwrap();
        assert_eq!(main.get(2, 0).unwrap(), &CellValue::Float(7.0));
        assert_eq!(main.get(2, 4).unwrap(), &CellValue::from("02/01/2024"));
        assert_eq!(main.get(2, 6).unwrap(), &CellValue::from("Y"));
        // The input directory is left alone when an output is given
        let original = Sheet::from_csv(input.join("Main.csv")).unwrap();
        assert_eq!(original.get(2, 0).unwrap(), &CellValue::from("'7"));
    }

    #[test]
    fn test_missing_table_fails_without_saving() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Main.csv"), "a,b\n").unwrap();
        let output = dir.path().join("out");

        let cli = args(&[
            "lifecycle",
            "mirror",
            dir.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        let err = execute(&cli.command).unwrap_err();
        assert!(err.to_string().contains("GFE"));
        assert!(!output.exists());
    }
}
