//! CSV workbooks: a directory with one `.csv` or `.tsv` file per sheet.

use crate::book::Book;
use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// How delimited text maps to cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Infer bools and numbers with [`CellValue::parse`]. When off, every
    /// non-empty field stays text.
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            infer_types: true,
        }
    }
}

impl CsvOptions {
    /// Tab-separated values
    #[must_use]
    pub fn tsv() -> Self {
        CsvOptions {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_type_inference(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }

    /// Options for a sheet's delimiter, falling back to comma-separated.
    #[must_use]
    pub fn for_sheet(sheet: &Sheet) -> Self {
        match sheet.delimiter() {
            Some(delimiter) => CsvOptions {
                delimiter,
                ..Default::default()
            },
            None => Self::default(),
        }
    }

    /// File extension matching the delimiter.
    #[must_use]
    pub fn extension(self) -> &'static str {
        if self.delimiter == b'\t' {
            "tsv"
        } else {
            "csv"
        }
    }

    /// Options matching a file's extension (`.tsv` is tab-separated).
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => Self::tsv(),
            _ => Self::default(),
        }
    }

    fn cell(self, field: &str) -> CellValue {
        if self.infer_types {
            CellValue::parse(field)
        } else if field.is_empty() {
            CellValue::Null
        } else {
            CellValue::String(field.to_string())
        }
    }
}

impl Sheet {
    /// Load a sheet from a `.csv` or `.tsv` file, remembering its delimiter.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let options = CsvOptions::for_path(path);
        let reader = BufReader::new(File::open(path)?);
        let mut sheet = Self::from_csv_reader(reader, options)?;
        sheet.set_delimiter(Some(options.delimiter));
        Ok(sheet)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes(), CsvOptions::default())
    }

    /// Read every record, header rows included, as plain data.
    ///
    /// Records may differ in length; the sheet is padded to a rectangle.
    pub fn from_csv_reader<R: Read>(reader: R, options: CsvOptions) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut sheet = Sheet::new();
        for record in csv_reader.records() {
            let record = record?;
            sheet
                .data_mut()
                .push(record.iter().map(|field| options.cell(field)).collect());
        }
        sheet.pad_to_rectangle();
        Ok(sheet)
    }

    /// Write the sheet as CSV. `Null` becomes an empty field.
    pub fn write_csv<W: Write>(&self, writer: W, options: CsvOptions) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_writer(writer);
        for row in self.rows() {
            csv_writer.write_record(row.iter().map(CellValue::as_str))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn save_as_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        self.write_csv(writer, CsvOptions::for_path(path))
    }
}

impl Book {
    /// Load every `.csv`/`.tsv` file in a directory as a sheet named after
    /// the file stem. Files are taken in name order; other files are ignored.
    ///
    /// A stem present under both extensions is an error, since either file
    /// could be the sheet.
    pub fn from_csv_dir<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        files.sort();

        let mut book = Book::new();
        let mut sources: Vec<(&str, &Path)> = Vec::new();
        for file in files.iter().filter(|f| is_delimited(f)) {
            let Some(name) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some((_, first)) = sources.iter().find(|(seen, _)| *seen == name) {
                return Err(SheetError::ConflictingSheetFiles {
                    name: name.to_string(),
                    first: first.display().to_string(),
                    second: file.display().to_string(),
                });
            }
            book.add_sheet(name, Sheet::from_csv(file)?)?;
            sources.push((name, file.as_path()));
        }
        Ok(book)
    }

    /// Write each sheet to `<dir>/<sheet name>.<ext>`, creating the
    /// directory. Sheets loaded from a `.tsv` file go back to `.tsv`; all
    /// others are written as `.csv`.
    pub fn save_as_csv_dir<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let dir = path.as_ref();
        std::fs::create_dir_all(dir)?;
        for (name, sheet) in self.sheets() {
            let options = CsvOptions::for_sheet(sheet);
            let file = dir.join(format!("{name}.{}", options.extension()));
            let writer = BufWriter::new(File::create(file)?);
            sheet.write_csv(writer, options)?;
        }
        Ok(())
    }
}

fn is_delimited(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|ext| {
            ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv")
        })
}
