//! Table loader/writer port.
//!
//! The pipeline only ever sees rectangular blocks of cells addressed by table
//! name and 0-based row/column offsets. [`Book`] is the in-process store; any
//! other backing (a live workbook, a database) only has to provide these
//! calls.

use crate::error::{PipelineError, Result};
use lifecycle_sheet::{Book, CellValue, Sheet};

/// Named tables readable and writable as rectangular blocks.
pub trait TableStore {
    /// Whether a table with this name exists.
    fn has_table(&self, name: &str) -> bool;

    /// Rows up to and including the last row holding a non-blank cell.
    fn used_row_count(&self, name: &str) -> Result<usize>;

    /// Read `rows` x `cols` cells; cells past the table's edge read as `Null`.
    fn read_block(
        &self,
        name: &str,
        start_row: usize,
        start_col: usize,
        rows: usize,
        cols: usize,
    ) -> Result<Vec<Vec<CellValue>>>;

    /// Write a rectangular block with its top-left corner at the offset.
    fn write_block(
        &mut self,
        name: &str,
        start_row: usize,
        start_col: usize,
        block: &[Vec<CellValue>],
    ) -> Result<()>;

    /// Reset a block of existing cells to `Null`.
    fn clear_block(
        &mut self,
        name: &str,
        start_row: usize,
        start_col: usize,
        rows: usize,
        cols: usize,
    ) -> Result<()>;

    /// Create an empty table unless one exists. Returns `true` when created.
    fn ensure_table(&mut self, name: &str) -> Result<bool>;

    /// The used rows of a table, `cols` columns wide.
    fn read_used(&self, name: &str, cols: usize) -> Result<Vec<Vec<CellValue>>> {
        let rows = self.used_row_count(name)?;
        self.read_block(name, 0, 0, rows, cols)
    }
}

/// Fail with [`PipelineError::MissingTable`] unless `name` exists.
pub fn require_table<S: TableStore + ?Sized>(store: &S, name: &str) -> Result<()> {
    if store.has_table(name) {
        Ok(())
    } else {
        Err(PipelineError::MissingTable {
            name: name.to_string(),
        })
    }
}

fn sheet<'a>(book: &'a Book, name: &str) -> Result<&'a Sheet> {
    book.get_sheet(name).map_err(|_| PipelineError::MissingTable {
        name: name.to_string(),
    })
}

fn sheet_mut<'a>(book: &'a mut Book, name: &str) -> Result<&'a mut Sheet> {
    book.get_sheet_mut(name)
        .map_err(|_| PipelineError::MissingTable {
            name: name.to_string(),
        })
}

impl TableStore for Book {
    fn has_table(&self, name: &str) -> bool {
        self.has_sheet(name)
    }

    fn used_row_count(&self, name: &str) -> Result<usize> {
        Ok(sheet(self, name)?.used_row_count())
    }

    fn read_block(
        &self,
        name: &str,
        start_row: usize,
        start_col: usize,
        rows: usize,
        cols: usize,
    ) -> Result<Vec<Vec<CellValue>>> {
        Ok(sheet(self, name)?.read_block(start_row, start_col, rows, cols))
    }

    fn write_block(
        &mut self,
        name: &str,
        start_row: usize,
        start_col: usize,
        block: &[Vec<CellValue>],
    ) -> Result<()> {
        sheet_mut(self, name)?.write_block(start_row, start_col, block)?;
        Ok(())
    }

    fn clear_block(
        &mut self,
        name: &str,
        start_row: usize,
        start_col: usize,
        rows: usize,
        cols: usize,
    ) -> Result<()> {
        sheet_mut(self, name)?.clear_block(start_row, start_col, rows, cols);
        Ok(())
    }

    fn ensure_table(&mut self, name: &str) -> Result<bool> {
        if self.has_sheet(name) {
            return Ok(false);
        }
        self.get_or_add_sheet(name);
        Ok(true)
    }
}
