use crate::book::Book;
use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Days between the Excel epoch (1899-12-30, leap bug included) and 1970-01-01
const EXCEL_UNIX_EPOCH_DAYS: f64 = 25569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Number format applied to `Date` cells written to a workbook
const DATE_NUM_FORMAT: &str = "mm/dd/yyyy";

/// Convert a date to the serial number Excel stores for it
#[must_use]
pub fn datetime_to_excel_serial(dt: DateTime<Utc>) -> f64 {
    dt.timestamp_millis() as f64 / MILLIS_PER_DAY + EXCEL_UNIX_EPOCH_DAYS
}

fn workbook_err(e: impl std::fmt::Display) -> SheetError {
    SheetError::Workbook(e.to_string())
}

/// Convert calamine Data to CellValue
///
/// Date-formatted cells come back as their serial number, the same shape a
/// spreadsheet host hands to scripts.
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

fn open_xlsx(path: &Path) -> Result<Xlsx<BufReader<File>>> {
    open_workbook(path).map_err(|e: XlsxError| workbook_err(e))
}

fn read_sheet(workbook: &mut Xlsx<BufReader<File>>, sheet_name: &str) -> Result<Sheet> {
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e: XlsxError| workbook_err(e))?;

    // calamine ranges start at the first used cell; keep absolute positions
    let (start_row, start_col) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));

    let block: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(data_to_cell_value).collect())
        .collect();

    let mut sheet = Sheet::with_name(sheet_name);
    sheet.write_block(start_row, start_col, &block)?;
    Ok(sheet)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
) -> Result<()> {
    match cell {
        CellValue::Null => {} // Leave empty
        CellValue::Bool(b) => {
            worksheet
                .write_boolean(row, col, *b)
                .map_err(workbook_err)?;
        }
        CellValue::Int(i) => {
            // Note: Excel stores all numbers as f64, so integers > 2^53
            // (9,007,199,254,740,992) may lose precision
            worksheet
                .write_number(row, col, *i as f64)
                .map_err(workbook_err)?;
        }
        CellValue::Float(f) => {
            worksheet.write_number(row, col, *f).map_err(workbook_err)?;
        }
        CellValue::String(s) => {
            worksheet.write_string(row, col, s).map_err(workbook_err)?;
        }
        CellValue::Date(d) => {
            worksheet
                .write_number_with_format(row, col, datetime_to_excel_serial(*d), date_format)
                .map_err(workbook_err)?;
        }
    }
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, name: &str, sheet: &Sheet) -> Result<()> {
    worksheet.set_name(name).map_err(workbook_err)?;
    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);

    for (row_idx, row) in sheet.data().iter().enumerate() {
        let row_num = u32::try_from(row_idx).map_err(|_| workbook_err("Row index overflow"))?;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num =
                u16::try_from(col_idx).map_err(|_| workbook_err("Column index overflow"))?;
            write_cell(worksheet, row_num, col_num, cell, &date_format)?;
        }
    }

    Ok(())
}

impl Sheet {
    /// Load the first sheet of an Excel file
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook = open_xlsx(path.as_ref())?;
        let Some(first) = workbook.sheet_names().first().cloned() else {
            return Ok(Sheet::new());
        };
        read_sheet(&mut workbook, &first)
    }

    /// Load a specific sheet from an Excel file by name
    pub fn from_xlsx_sheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Self> {
        let mut workbook = open_xlsx(path.as_ref())?;
        read_sheet(&mut workbook, sheet_name)
    }

    /// Save the sheet to an Excel file
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut workbook = Workbook::new();
        write_sheet(workbook.add_worksheet(), self.name(), self)?;
        workbook.save(path.as_ref()).map_err(workbook_err)?;
        Ok(())
    }
}

impl Book {
    /// Load a book from an Excel file (all sheets)
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook = open_xlsx(path.as_ref())?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let mut book = Book::new();

        for sheet_name in sheet_names {
            let sheet = read_sheet(&mut workbook, &sheet_name)?;
            book.add_sheet(&sheet_name, sheet)?;
        }

        Ok(book)
    }

    /// Save the book to an Excel file
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut workbook = Workbook::new();

        for (name, sheet) in self.sheets() {
            write_sheet(workbook.add_worksheet(), name, sheet)?;
        }

        workbook.save(path.as_ref()).map_err(workbook_err)?;
        Ok(())
    }

    /// Get sheet names from an Excel file without loading data
    pub fn xlsx_sheet_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let workbook = open_xlsx(path.as_ref())?;
        Ok(workbook.sheet_names().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_excel_serial_of_known_dates() {
        let jan_2022 = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        assert!((datetime_to_excel_serial(jan_2022) - 44562.0).abs() < f64::EPSILON);

        let noon = Utc.with_ymd_and_hms(2022, 1, 1, 12, 0, 0).unwrap();
        assert!((datetime_to_excel_serial(noon) - 44562.5).abs() < 1e-9);
    }

    #[test]
    fn test_xlsx_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("types.xlsx");

        let mut sheet = Sheet::with_name("Types");
        *sheet.data_mut() = vec![vec![
            CellValue::String("text".to_string()),
            CellValue::Int(42),
            CellValue::Float(3.5),
            CellValue::Bool(true),
            CellValue::Null,
        ]];

        sheet.save_as_xlsx(&path).unwrap();

        let loaded = Sheet::from_xlsx(&path).unwrap();

        assert_eq!(loaded.name(), "Types");
        assert_eq!(loaded.row_count(), 1);
        // Note: trailing empty cells are not preserved in Excel files
        assert_eq!(loaded.col_count(), 4);
        assert!(matches!(loaded.get(0, 0).unwrap(), CellValue::String(s) if s == "text"));
        assert!(matches!(loaded.get(0, 1).unwrap(), CellValue::Float(f) if (*f - 42.0).abs() < 0.01));
        assert!(matches!(loaded.get(0, 3).unwrap(), CellValue::Bool(true)));
    }

    #[test]
    fn test_date_cells_read_back_as_serials() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");

        let date = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let mut book = Book::new();
        book.add_sheet("Clean", Sheet::from_data(vec![vec![CellValue::Date(date)]]))
            .unwrap();
        book.save_as_xlsx(&path).unwrap();

        let loaded = Sheet::from_xlsx_sheet(&path, "Clean").unwrap();
        let serial = loaded.get(0, 0).unwrap().as_float().unwrap();
        assert!((serial - 45356.0).abs() < 1e-9);
    }

    #[test]
    fn test_leading_blank_rows_keep_positions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut sheet = Sheet::with_name("Main");
        sheet
            .write_block(2, 0, &[vec![CellValue::from("M1"), CellValue::from("S1")]])
            .unwrap();
        sheet.save_as_xlsx(&path).unwrap();

        let loaded = Sheet::from_xlsx(&path).unwrap();
        assert_eq!(loaded.row_count(), 3);
        assert_eq!(loaded.get(2, 1).unwrap(), &CellValue::from("S1"));
        assert_eq!(loaded.get(0, 0).unwrap(), &CellValue::Null);
    }

    #[test]
    fn test_book_xlsx_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut book = Book::new();
        book.add_sheet("Main", Sheet::from_data(vec![vec![1, 2, 3]]))
            .unwrap();
        book.add_sheet("GFE", Sheet::from_data(vec![vec!["a", "b", "c"]]))
            .unwrap();
        book.save_as_xlsx(&path).unwrap();

        let names = Book::xlsx_sheet_names(&path).unwrap();
        assert_eq!(names, vec!["Main".to_string(), "GFE".to_string()]);

        let loaded = Book::from_xlsx(&path).unwrap();
        assert_eq!(loaded.sheet_count(), 2);
        assert_eq!(
            loaded.get_sheet("GFE").unwrap().get(0, 2).unwrap(),
            &CellValue::from("c")
        );
    }
}
