// Excel import (xlsx, xls, xlsb, ods) as a grid of raw cell strings

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use runclub_recon::config::parse_cell_ref;
use runclub_recon::ReconError;

/// Maximum dimensions for a sheet
const MAX_ROWS: usize = 65536;
const MAX_COLS: usize = 256;

/// The first worksheet of a workbook, every cell decoded to text.
///
/// Strings are kept as-is and numbers are stringified (integral floats
/// without decimals). Booleans, errors and empty cells read as "".
/// Coordinates are absolute and 0-based, so `(0, 0)` is A1 even when the
/// used range starts further down.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    name: String,
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    /// Open the first sheet of `path`. A file that does not exist is a
    /// [`ReconError::MissingFile`].
    pub fn open(path: &Path) -> Result<Self, ReconError> {
        let name = path.display().to_string();
        if !path.exists() {
            return Err(ReconError::MissingFile(name));
        }

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| ReconError::input(&name, 0, format!("not a readable workbook: {e}")))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ReconError::input(&name, 0, "workbook contains no sheets"))?
            .map_err(|e| ReconError::input(&name, 0, format!("cannot read first sheet: {e}")))?;

        Ok(Self::from_range(name, &range))
    }

    pub fn from_range(name: impl Into<String>, range: &Range<Data>) -> Self {
        let (start_row, start_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row.min(MAX_ROWS)];
        for row in range.rows().take(MAX_ROWS.saturating_sub(start_row)) {
            let mut cells = vec![String::new(); start_col.min(MAX_COLS)];
            let room = MAX_COLS.saturating_sub(cells.len());
            cells.extend(row.iter().take(room).map(cell_to_string));
            rows.push(cells);
        }

        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build a grid from already-decoded rows.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Source name, for error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell text at 0-based `(row, col)`; "" outside the used range.
    pub fn value(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Cell text by reference such as "B3". `None` only for a malformed reference.
    pub fn cell(&self, reference: &str) -> Option<&str> {
        let (row, col) = parse_cell_ref(reference)?;
        Some(self.value(row, col))
    }

    /// The first `count` cells of a row, padded with "".
    pub fn row_values(&self, row: usize, count: usize) -> Vec<&str> {
        (0..count).map(|col| self.value(row, col)).collect()
    }

    /// True when every cell of the row is blank.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map_or(true, |r| r.iter().all(|c| c.trim().is_empty()))
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        // Dates and times are numeric serials in the workbook model
        Data::DateTime(dt) => format_number(dt.as_f64()),
        _ => String::new(),
    }
}

/// Format nicely: integers without decimals
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
