//! Selection state for one reconciliation session.
//!
//! Every update takes `&self` and returns a new [`SessionState`]; loaded
//! workbooks and results are shared through `Arc`, so updates stay cheap.

use std::sync::Arc;

use thiserror::Error;

use crate::columns::find_common_columns;
use crate::config::ReconOptions;
use crate::engine::{reconcile, ReconRequest};
use crate::error::ReconError;
use crate::model::{Dataset, ReconResult, Side, Workbook};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no {0} source loaded")]
    NoSource(Side),
    #[error("{side} source has no sheet named '{name}'")]
    UnknownSheet { side: Side, name: String },
    #[error("'{0}' is not a column common to both datasets")]
    UnknownColumn(String),
    #[error("select sheets, key column, and at least one column to compare")]
    NotReady,
    #[error(transparent)]
    Recon(#[from] ReconError),
}

#[derive(Debug, Clone)]
struct SourceSlot {
    workbook: Arc<Workbook>,
    selected: Option<usize>,
}

impl SourceSlot {
    fn dataset(&self) -> Option<&Dataset> {
        self.selected.and_then(|i| self.workbook.sheets.get(i))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    first: Option<SourceSlot>,
    second: Option<SourceSlot>,
    common_columns: Vec<String>,
    key_column: Option<String>,
    compare_columns: Vec<String>,
    result: Option<Arc<ReconResult>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- accessors ----------------------------------------------------------

    pub fn workbook(&self, side: Side) -> Option<&Workbook> {
        self.slot(side).map(|s| s.workbook.as_ref())
    }

    pub fn selected_dataset(&self, side: Side) -> Option<&Dataset> {
        self.slot(side).and_then(SourceSlot::dataset)
    }

    pub fn common_columns(&self) -> &[String] {
        &self.common_columns
    }

    pub fn key_column(&self) -> Option<&str> {
        self.key_column.as_deref()
    }

    pub fn compare_columns(&self) -> &[String] {
        &self.compare_columns
    }

    pub fn result(&self) -> Option<&ReconResult> {
        self.result.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.selected_dataset(Side::First).is_some()
            && self.selected_dataset(Side::Second).is_some()
            && self.key_column.is_some()
            && !self.compare_columns.is_empty()
    }

    // -- updates ------------------------------------------------------------

    /// Replace one side's source. Selects its first sheet and resets the
    /// key, compare and result selections. When both sides are loaded the
    /// first common column becomes the key.
    pub fn load_source(&self, side: Side, workbook: Workbook) -> SessionState {
        let selected = if workbook.sheets.is_empty() { None } else { Some(0) };
        let slot = SourceSlot { workbook: Arc::new(workbook), selected };

        let mut next = self.clone();
        *next.slot_mut(side) = Some(slot);
        next.result = None;
        next.compare_columns = Vec::new();
        next.common_columns = next.compute_common_columns();
        next.key_column = next.common_columns.first().cloned();
        next
    }

    /// Select a sheet by name. Recomputes the common columns, makes the
    /// first one the key and selects all of them for comparison.
    pub fn select_sheet(&self, side: Side, name: &str) -> Result<SessionState, SessionError> {
        let slot = self.slot(side).ok_or(SessionError::NoSource(side))?;
        let index = slot.workbook.sheet_index(name).ok_or_else(|| SessionError::UnknownSheet {
            side,
            name: name.to_string(),
        })?;

        let mut next = self.clone();
        if let Some(slot) = next.slot_mut(side) {
            slot.selected = Some(index);
        }
        next.result = None;
        next.common_columns = next.compute_common_columns();
        next.key_column = next.common_columns.first().cloned();
        next.compare_columns = next.common_columns.clone();
        Ok(next)
    }

    pub fn set_key_column(&self, column: &str) -> Result<SessionState, SessionError> {
        self.check_common(column)?;
        let mut next = self.clone();
        next.key_column = Some(column.to_string());
        Ok(next)
    }

    /// Check or uncheck one compare column. Checked columns are appended.
    pub fn toggle_compare_column(&self, column: &str, checked: bool) -> Result<SessionState, SessionError> {
        self.check_common(column)?;
        let mut next = self.clone();
        if checked {
            if !next.compare_columns.iter().any(|c| c == column) {
                next.compare_columns.push(column.to_string());
            }
        } else {
            next.compare_columns.retain(|c| c != column);
        }
        Ok(next)
    }

    pub fn set_compare_columns(&self, columns: &[String]) -> Result<SessionState, SessionError> {
        for column in columns {
            self.check_common(column)?;
        }
        let mut next = self.clone();
        next.compare_columns = Vec::with_capacity(columns.len());
        for column in columns {
            if !next.compare_columns.contains(column) {
                next.compare_columns.push(column.clone());
            }
        }
        Ok(next)
    }

    /// Run the reconciler over the selected sheets and store its result.
    pub fn reconcile(&self, options: ReconOptions) -> Result<SessionState, SessionError> {
        let (Some(first), Some(second), Some(key)) = (
            self.selected_dataset(Side::First),
            self.selected_dataset(Side::Second),
            self.key_column.as_deref(),
        ) else {
            return Err(SessionError::NotReady);
        };
        if self.compare_columns.is_empty() {
            return Err(SessionError::NotReady);
        }

        let request = ReconRequest::new(key, self.compare_columns.clone()).with_options(options);
        let result = reconcile(&first.rows, &second.rows, &request)?;

        let mut next = self.clone();
        next.result = Some(Arc::new(result));
        Ok(next)
    }

    // -- helpers ------------------------------------------------------------

    fn slot(&self, side: Side) -> Option<&SourceSlot> {
        match side {
            Side::First => self.first.as_ref(),
            Side::Second => self.second.as_ref(),
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<SourceSlot> {
        match side {
            Side::First => &mut self.first,
            Side::Second => &mut self.second,
        }
    }

    fn compute_common_columns(&self) -> Vec<String> {
        match (self.selected_dataset(Side::First), self.selected_dataset(Side::Second)) {
            (Some(a), Some(b)) => find_common_columns(&a.rows, &b.rows),
            _ => Vec::new(),
        }
    }

    fn check_common(&self, column: &str) -> Result<(), SessionError> {
        if self.common_columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(SessionError::UnknownColumn(column.to_string()))
        }
    }
}
