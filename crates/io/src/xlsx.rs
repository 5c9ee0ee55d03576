// Excel import (xlsx, xlsm, xls, xlsb, ods via calamine)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use sheetrecon_recon::{Dataset, Value, Workbook};

use crate::table::rows_from_grid;
use crate::IoError;

/// Import every sheet of a workbook, in workbook order. Empty sheets are
/// kept as datasets without rows so sheet lists match the file.
pub fn import(path: &Path) -> Result<Workbook, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| IoError::Sheet {
            sheet: sheet_name.clone(),
            message: e.to_string(),
        })?;

        let (height, width) = range.get_size();
        log::debug!("sheet '{}': {}x{} cells", sheet_name, height, width);

        let grid = range.rows().map(|row| row.iter().map(cell_value).collect::<Vec<_>>());
        sheets.push(Dataset::new(sheet_name.clone(), rows_from_grid(grid)));
    }

    Ok(Workbook::new(crate::display_name(path), sheets))
}

/// Map a calamine cell to a value. Dates become their serial number.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) if s.is_empty() => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(e) => Value::Text(e.to_string()),
        // 1900 date system assumed
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
    }
}
