// JSON import

use std::path::Path;

use serde::Deserialize;
use sheetrecon_recon::{Dataset, Row, Workbook};

use crate::IoError;

/// Accepted layouts: a bare array of row objects, one named dataset, or a
/// workbook of named datasets.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonSource {
    Rows(Vec<Row>),
    Dataset(Dataset),
    Workbook { sheets: Vec<Dataset> },
}

pub fn import(path: &Path) -> Result<Workbook, IoError> {
    let content = crate::csv::read_file_as_utf8(path)?;
    let source: JsonSource = serde_json::from_str(&content)?;

    let sheets = match source {
        JsonSource::Rows(rows) => vec![Dataset::new(crate::stem_name(path), rows)],
        JsonSource::Dataset(dataset) => vec![dataset],
        JsonSource::Workbook { sheets } => sheets,
    };
    Ok(Workbook::new(crate::display_name(path), sheets))
}
