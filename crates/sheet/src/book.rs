use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use indexmap::IndexMap;

/// Named sheets in workbook order.
///
/// A sheet's name always equals its key in the book; adding or creating a
/// sheet renames it to match.
#[derive(Debug, Clone, Default)]
pub struct Book {
    sheets: IndexMap<String, Sheet>,
}

fn not_found(name: &str) -> SheetError {
    SheetError::SheetNotFound {
        name: name.to_string(),
    }
}

impl Book {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Sheet names in workbook order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets.get(name).ok_or_else(|| not_found(name))
    }

    pub fn get_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets.get_mut(name).ok_or_else(|| not_found(name))
    }

    /// Append `sheet` under `name`. Existing sheets are never replaced.
    pub fn add_sheet(&mut self, name: &str, mut sheet: Sheet) -> Result<()> {
        if self.has_sheet(name) {
            return Err(SheetError::DuplicateSheet {
                name: name.to_string(),
            });
        }
        sheet.set_name(name);
        self.sheets.insert(name.to_string(), sheet);
        Ok(())
    }

    /// The sheet called `name`, appending an empty one first if needed.
    pub fn get_or_add_sheet(&mut self, name: &str) -> &mut Sheet {
        self.sheets
            .entry(name.to_string())
            .or_insert_with(|| Sheet::with_name(name))
    }

    /// Remove a sheet, keeping the order of the rest.
    pub fn remove_sheet(&mut self, name: &str) -> Result<Sheet> {
        self.sheets.shift_remove(name).ok_or_else(|| not_found(name))
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.sheets.iter().map(|(name, sheet)| (name.as_str(), sheet))
    }
}
