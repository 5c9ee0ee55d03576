use serde::{Deserialize, Serialize};

use crate::value::Row;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One sheet or table of rows from a loaded source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self { name: name.into(), rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns of the first row, in declaration order.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.columns().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Union of every row's columns, in order of first appearance.
    pub fn all_columns(&self) -> Vec<String> {
        crate::columns::union_columns(&self.rows)
    }

    pub fn preview(&self, max_rows: usize) -> &[Row] {
        &self.rows[..self.rows.len().min(max_rows)]
    }
}

/// A loaded source file and its datasets, one per sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub file_name: String,
    pub sheets: Vec<Dataset>,
}

impl Workbook {
    pub fn new(file_name: impl Into<String>, sheets: Vec<Dataset>) -> Self {
        Self { file_name: file_name.into(), sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Dataset> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::First => "first",
            Side::Second => "second",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailStatus {
    Match,
    Mismatch,
    OnlyInFirst,
    OnlyInSecond,
    Ambiguous,
}

impl DetailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailStatus::Match => "match",
            DetailStatus::Mismatch => "mismatch",
            DetailStatus::OnlyInFirst => "only_in_first",
            DetailStatus::OnlyInSecond => "only_in_second",
            DetailStatus::Ambiguous => "ambiguous",
        }
    }

    /// Label shown in rendered tables.
    pub fn label(&self) -> &'static str {
        match self {
            DetailStatus::Match => "Match",
            DetailStatus::Mismatch => "Mismatch",
            DetailStatus::OnlyInFirst => "Only in First",
            DetailStatus::OnlyInSecond => "Only in Second",
            DetailStatus::Ambiguous => "Ambiguous",
        }
    }
}

impl std::fmt::Display for DetailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row that shares an ambiguous key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub side: Side,
    pub row_index: usize,
    pub row: Row,
}

/// Reconciliation outcome for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconDetail {
    pub key: String,
    pub status: DetailStatus,
    pub in_first_file: bool,
    pub in_second_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_value: Option<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value: Option<Row>,
    pub is_match: bool,
    /// Compare columns whose values differ, in compare order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub differing_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<Candidate>,
}

impl ReconDetail {
    pub fn only_in_first(key: String, row: Row) -> Self {
        Self {
            key,
            status: DetailStatus::OnlyInFirst,
            in_first_file: true,
            in_second_file: false,
            first_value: Some(row),
            second_value: None,
            is_match: false,
            differing_columns: Vec::new(),
            candidates: Vec::new(),
        }
    }

    pub fn only_in_second(key: String, row: Row) -> Self {
        Self {
            key,
            status: DetailStatus::OnlyInSecond,
            in_first_file: false,
            in_second_file: true,
            first_value: None,
            second_value: Some(row),
            is_match: false,
            differing_columns: Vec::new(),
            candidates: Vec::new(),
        }
    }

    /// A key present on both sides. Empty `differing_columns` means match.
    pub fn paired(key: String, first: Row, second: Row, differing_columns: Vec<String>) -> Self {
        let is_match = differing_columns.is_empty();
        Self {
            key,
            status: if is_match { DetailStatus::Match } else { DetailStatus::Mismatch },
            in_first_file: true,
            in_second_file: true,
            first_value: Some(first),
            second_value: Some(second),
            is_match,
            differing_columns,
            candidates: Vec::new(),
        }
    }

    pub fn ambiguous(key: String, candidates: Vec<Candidate>) -> Self {
        let in_first_file = candidates.iter().any(|c| c.side == Side::First);
        let in_second_file = candidates.iter().any(|c| c.side == Side::Second);
        Self {
            key,
            status: DetailStatus::Ambiguous,
            in_first_file,
            in_second_file,
            first_value: None,
            second_value: None,
            is_match: false,
            differing_columns: Vec::new(),
            candidates,
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A key seen more than once within one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub side: Side,
    pub key: String,
    pub count: usize,
}

/// A row dropped because its key cell was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub side: Side,
    pub row_index: usize,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconSummary {
    pub matches: usize,
    pub mismatches: usize,
    pub only_in_first: usize,
    pub only_in_second: usize,
    pub ambiguous: usize,
    pub first_rows: usize,
    pub second_rows: usize,
}

impl ReconSummary {
    /// Number of detail records; every key is counted exactly once.
    pub fn total(&self) -> usize {
        self.matches + self.mismatches + self.only_in_first + self.only_in_second + self.ambiguous
    }

    /// Share of matched keys, rounded to a whole percent. 0 when nothing was compared.
    pub fn match_percentage(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        (self.matches as f64 / total as f64 * 100.0).round() as u32
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches == 0 && self.only_in_first == 0 && self.only_in_second == 0 && self.ambiguous == 0
    }

    pub(crate) fn record(&mut self, status: DetailStatus) {
        match status {
            DetailStatus::Match => self.matches += 1,
            DetailStatus::Mismatch => self.mismatches += 1,
            DetailStatus::OnlyInFirst => self.only_in_first += 1,
            DetailStatus::OnlyInSecond => self.only_in_second += 1,
            DetailStatus::Ambiguous => self.ambiguous += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconResult {
    pub summary: ReconSummary,
    pub details: Vec<ReconDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_keys: Vec<DuplicateKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_rows: Vec<SkippedRow>,
}

impl ReconResult {
    pub(crate) fn push(&mut self, detail: ReconDetail) {
        self.summary.record(detail.status);
        self.details.push(detail);
    }

    pub fn detail(&self, key: &str) -> Option<&ReconDetail> {
        self.details.iter().find(|d| d.key == key)
    }
}
