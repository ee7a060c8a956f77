use crate::cell::CellValue;
use crate::error::{Result, SheetError};

/// A named, row-major grid of cells.
///
/// Rows are kept rectangular: every write that widens one row widens all of
/// them with `Null` padding.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
    /// Field delimiter of the delimited file this sheet was loaded from.
    delimiter: Option<u8>,
}

impl Sheet {
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
            delimiter: None,
        }
    }

    /// Build a sheet from rows of values, padding short rows.
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let mut sheet = Sheet::new();
        sheet.data = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        sheet.pad_to_rectangle();
        sheet
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Delimiter of the CSV or TSV file the sheet came from, if any.
    #[must_use]
    pub fn delimiter(&self) -> Option<u8> {
        self.delimiter
    }

    pub fn set_delimiter(&mut self, delimiter: Option<u8>) {
        self.delimiter = delimiter;
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// Rows up to and including the last row with a non-blank cell.
    ///
    /// This is the spreadsheet "used range" height: trailing blank rows do
    /// not count.
    #[must_use]
    pub fn used_row_count(&self) -> usize {
        self.data
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_blank()))
            .map_or(0, |last| last + 1)
    }

    /// Cell at a 0-based position
    pub fn get(&self, row: usize, col: usize) -> Result<&CellValue> {
        self.data
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or(SheetError::CellOutOfRange {
                row,
                col,
                rows: self.row_count(),
                cols: self.col_count(),
            })
    }

    /// Append one row; it must match the current width unless the sheet is
    /// empty.
    pub fn row_append<T: Into<CellValue>>(&mut self, values: Vec<T>) -> Result<()> {
        let row: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        let width = self.col_count();
        if !self.data.is_empty() && row.len() != width {
            return Err(SheetError::RaggedRows {
                expected: width,
                actual: row.len(),
            });
        }
        self.data.push(row);
        Ok(())
    }

    // ===== Block Access =====

    /// Copy a `rows` x `cols` block starting at (`start_row`, `start_col`).
    ///
    /// Cells outside the stored grid read as `Null`, so the result is always
    /// exactly the requested shape.
    #[must_use]
    pub fn read_block(
        &self,
        start_row: usize,
        start_col: usize,
        rows: usize,
        cols: usize,
    ) -> Vec<Vec<CellValue>> {
        (start_row..start_row + rows)
            .map(|r| {
                (start_col..start_col + cols)
                    .map(|c| {
                        self.data
                            .get(r)
                            .and_then(|row| row.get(c))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    /// Overwrite a rectangular block starting at (`start_row`, `start_col`),
    /// growing the sheet as needed.
    ///
    /// Every row of `block` must have the same length.
    pub fn write_block(
        &mut self,
        start_row: usize,
        start_col: usize,
        block: &[Vec<CellValue>],
    ) -> Result<()> {
        let Some(width) = block.first().map(Vec::len) else {
            return Ok(());
        };
        if let Some(bad) = block.iter().find(|row| row.len() != width) {
            return Err(SheetError::RaggedRows {
                expected: width,
                actual: bad.len(),
            });
        }

        let needed_rows = start_row + block.len();
        let needed_cols = (start_col + width).max(self.col_count());
        if self.data.len() < needed_rows {
            self.data.resize_with(needed_rows, Vec::new);
        }
        for row in &mut self.data {
            if row.len() < needed_cols {
                row.resize(needed_cols, CellValue::Null);
            }
        }

        for (offset, values) in block.iter().enumerate() {
            let row = &mut self.data[start_row + offset];
            row[start_col..start_col + width].clone_from_slice(values);
        }

        Ok(())
    }

    /// Reset the cells of a block to `Null`, ignoring the part that lies
    /// outside the stored grid.
    pub fn clear_block(&mut self, start_row: usize, start_col: usize, rows: usize, cols: usize) {
        for row in self.data.iter_mut().skip(start_row).take(rows) {
            for cell in row.iter_mut().skip(start_col).take(cols) {
                *cell = CellValue::Null;
            }
        }
    }

    /// Widen short rows with `Null` so every row has `col_count` cells.
    pub fn pad_to_rectangle(&mut self) {
        let width = self.data.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut self.data {
            row.resize(width, CellValue::Null);
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &Vec<CellValue>> {
        self.data.iter()
    }

    #[must_use]
    pub fn data(&self) -> &Vec<Vec<CellValue>> {
        &self.data
    }

    /// Raw rows. Callers that change row lengths should finish with
    /// [`Sheet::pad_to_rectangle`].
    pub fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}
