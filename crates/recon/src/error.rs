use thiserror::Error;

use crate::model::{DuplicateKey, Side};

#[derive(Debug, Error)]
pub enum ReconError {
    /// No key column was chosen.
    #[error("no key column selected")]
    NoKeyColumn,
    /// The compare list is empty.
    #[error("no columns selected for comparison")]
    NoCompareColumns,
    /// Key or compare column missing from a non-empty dataset.
    #[error("{side} dataset: unknown column '{column}'")]
    UnknownColumn { side: Side, column: String },
    /// A row has no value in the key column (`on_missing_key = "error"`).
    #[error("{side} dataset, data row {}: empty key column '{column}'", .row + 1)]
    MissingKey { side: Side, row: usize, column: String },
    /// Duplicate keys under `on_duplicate = "error"`.
    #[error("duplicate keys found:{}", format_duplicates(.0))]
    DuplicateKeys(Vec<DuplicateKey>),
}

fn format_duplicates(dups: &[DuplicateKey]) -> String {
    dups.iter()
        .map(|d| format!("\n  {} key {:?} appears {} times", d.side, d.key, d.count))
        .collect()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Semantic check failed (missing key, empty compare entry, ...).
    #[error("config validation error: {0}")]
    Validation(String),
}
