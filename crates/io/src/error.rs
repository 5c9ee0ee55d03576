use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} contains no sheets")]
    NoSheets(String),
}
