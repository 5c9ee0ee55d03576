//! `sheetrecon-recon`: key-based reconciliation of two tabular datasets.
//!
//! Pure engine crate: receives decoded rows, returns classified results.
//! No CLI or IO dependencies.

pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod session;
pub mod value;
pub mod view;

pub use columns::{find_common_columns, find_common_columns_all_rows};
pub use config::{DuplicatePolicy, MissingKeyPolicy, OutputConfig, OutputFormat, ReconConfig, ReconOptions, SourceConfig};
pub use engine::{reconcile, reconcile_data, ReconRequest};
pub use error::{ConfigError, ReconError};
pub use model::{
    Candidate, Dataset, DetailStatus, DuplicateKey, ReconDetail, ReconResult, ReconSummary, Side, SkippedRow, Workbook,
};
pub use session::{SessionError, SessionState};
pub use value::{Row, Value};
pub use view::ResultView;
