// File loading: spreadsheet and delimited files in, workbooks of rows out.

pub mod csv;
pub mod error;
pub mod json;
pub mod table;
pub mod xlsx;

use std::path::Path;
use std::time::Instant;

use sheetrecon_recon::Workbook;

pub use error::IoError;

/// Source file formats we can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// xlsx, xlsm, xls, xlsb, ods (anything calamine opens)
    Excel,
    Csv,
    Tsv,
    Json,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods") => Ok(Self::Excel),
            Some("csv") => Ok(Self::Csv),
            Some("tsv" | "tab") => Ok(Self::Tsv),
            Some("json") => Ok(Self::Json),
            other => Err(IoError::UnsupportedFormat(other.unwrap_or("(none)").to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Delimiter for csv input. Sniffed from the first lines when `None`.
    pub delimiter: Option<u8>,
    /// Type `true`/`false` and plain numbers in delimited files.
    pub infer_types: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            infer_types: true,
        }
    }
}

/// Load a file, picking the decoder from its extension.
pub fn load_workbook(path: &Path) -> Result<Workbook, IoError> {
    load_workbook_as(path, SourceFormat::from_path(path)?, &LoadOptions::default())
}

pub fn load_workbook_as(path: &Path, format: SourceFormat, options: &LoadOptions) -> Result<Workbook, IoError> {
    let start = Instant::now();
    let workbook = match format {
        SourceFormat::Excel => xlsx::import(path)?,
        SourceFormat::Csv => csv::import(path, options.delimiter, options.infer_types)?,
        SourceFormat::Tsv => csv::import(path, Some(b'\t'), options.infer_types)?,
        SourceFormat::Json => json::import(path)?,
    };

    if workbook.sheets.is_empty() {
        return Err(IoError::NoSheets(path.display().to_string()));
    }

    log::info!(
        "loaded {} ({}): {} sheet(s), {} row(s) in {}ms",
        workbook.file_name,
        format.as_str(),
        workbook.sheets.len(),
        workbook.sheets.iter().map(|s| s.len()).sum::<usize>(),
        start.elapsed().as_millis(),
    );
    Ok(workbook)
}

/// File name without directories, used as the workbook's display name.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// File stem, used as the dataset name for single-table sources.
pub(crate) fn stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string())
}
