use std::collections::{HashMap, HashSet};

use crate::columns::union_columns;
use crate::config::{DuplicatePolicy, MissingKeyPolicy, ReconOptions};
use crate::error::ReconError;
use crate::model::{Candidate, DuplicateKey, ReconDetail, ReconResult, Side, SkippedRow};
use crate::value::{Row, Value};

/// Key column, compare columns and policies for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconRequest {
    pub key_column: String,
    pub columns_to_compare: Vec<String>,
    pub options: ReconOptions,
}

impl ReconRequest {
    pub fn new(key_column: impl Into<String>, columns_to_compare: Vec<String>) -> Self {
        Self {
            key_column: key_column.into(),
            columns_to_compare,
            options: ReconOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconOptions) -> Self {
        self.options = options;
        self
    }
}

/// Reconcile with the default policies (last row wins for duplicate keys,
/// rows without a key are an error).
pub fn reconcile_data(
    data1: &[Row],
    data2: &[Row],
    key_column: &str,
    columns_to_compare: &[String],
) -> Result<ReconResult, ReconError> {
    reconcile(data1, data2, &ReconRequest::new(key_column, columns_to_compare.to_vec()))
}

/// Match rows of both datasets by key and classify every key.
///
/// Details list the first dataset's keys in order of first occurrence, then
/// the keys found only in the second dataset, in the same order.
pub fn reconcile(data1: &[Row], data2: &[Row], request: &ReconRequest) -> Result<ReconResult, ReconError> {
    check_columns(data1, Side::First, request)?;
    check_columns(data2, Side::Second, request)?;

    let options = request.options;
    let key_column = request.key_column.as_str();
    let compare = request.columns_to_compare.as_slice();

    log::debug!(
        "reconcile: {} vs {} rows, key '{}', {} compare column(s), duplicates {}",
        data1.len(),
        data2.len(),
        key_column,
        compare.len(),
        options.on_duplicate,
    );

    let mut result = ReconResult::default();
    result.summary.first_rows = data1.len();
    result.summary.second_rows = data2.len();

    let first = KeyIndex::build(data1, Side::First, key_column, options.on_missing_key, &mut result.skipped_rows)?;
    let second = KeyIndex::build(data2, Side::Second, key_column, options.on_missing_key, &mut result.skipped_rows)?;

    let mut duplicates = first.duplicates(Side::First);
    duplicates.extend(second.duplicates(Side::Second));
    if !duplicates.is_empty() {
        if options.on_duplicate == DuplicatePolicy::Error {
            return Err(ReconError::DuplicateKeys(duplicates));
        }
        for dup in &duplicates {
            log::warn!(
                "{} dataset: key {:?} appears {} times ({})",
                dup.side,
                dup.key,
                dup.count,
                options.on_duplicate,
            );
        }
        result.duplicate_keys = duplicates;
    }

    let report = options.on_duplicate == DuplicatePolicy::Report;

    for group in &first.groups {
        let other = second.get(&group.key);

        if report && (group.is_duplicated() || other.is_some_and(KeyGroup::is_duplicated)) {
            let mut candidates = group.candidates(Side::First);
            if let Some(other) = other {
                candidates.extend(other.candidates(Side::Second));
            }
            result.push(ReconDetail::ambiguous(group.key.clone(), candidates));
            continue;
        }

        let row1 = group.pick(options.on_duplicate);
        let detail = match other {
            Some(other) => {
                let row2 = other.pick(options.on_duplicate);
                let differing = differing_columns(row1, row2, compare);
                ReconDetail::paired(group.key.clone(), row1.clone(), row2.clone(), differing)
            }
            None => ReconDetail::only_in_first(group.key.clone(), row1.clone()),
        };
        result.push(detail);
    }

    for group in &second.groups {
        if first.contains(&group.key) {
            continue;
        }
        if report && group.is_duplicated() {
            result.push(ReconDetail::ambiguous(group.key.clone(), group.candidates(Side::Second)));
            continue;
        }
        let row2 = group.pick(options.on_duplicate);
        result.push(ReconDetail::only_in_second(group.key.clone(), row2.clone()));
    }

    let s = &result.summary;
    log::debug!(
        "reconcile: {} keys, {} matched, {} mismatched, {} only in first, {} only in second, {} ambiguous",
        result.details.len(),
        s.matches,
        s.mismatches,
        s.only_in_first,
        s.only_in_second,
        s.ambiguous,
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_columns(rows: &[Row], side: Side, request: &ReconRequest) -> Result<(), ReconError> {
    if request.key_column.is_empty() {
        return Err(ReconError::NoKeyColumn);
    }
    if request.columns_to_compare.is_empty() {
        return Err(ReconError::NoCompareColumns);
    }
    // An empty dataset has no schema to check against.
    if rows.is_empty() {
        return Ok(());
    }

    let known: HashSet<String> = union_columns(rows).into_iter().collect();
    let wanted = std::iter::once(&request.key_column).chain(request.columns_to_compare.iter());
    for column in wanted {
        if !known.contains(column) {
            return Err(ReconError::UnknownColumn { side, column: column.clone() });
        }
    }
    Ok(())
}

fn is_blank_key(value: &Value) -> bool {
    match value {
        Value::Empty => true,
        Value::Text(s) => s.is_empty(),
        _ => false,
    }
}

fn differing_columns(left: &Row, right: &Row, compare: &[String]) -> Vec<String> {
    compare
        .iter()
        .filter(|col| left.value(col) != right.value(col))
        .cloned()
        .collect()
}

/// All rows sharing one canonical key, in input order.
struct KeyGroup<'a> {
    key: String,
    rows: Vec<(usize, &'a Row)>,
}

impl<'a> KeyGroup<'a> {
    fn is_duplicated(&self) -> bool {
        self.rows.len() > 1
    }

    fn pick(&self, policy: DuplicatePolicy) -> &'a Row {
        let (_, row) = match policy {
            DuplicatePolicy::FirstWins => self.rows[0],
            _ => self.rows[self.rows.len() - 1],
        };
        row
    }

    fn candidates(&self, side: Side) -> Vec<Candidate> {
        self.rows
            .iter()
            .map(|(row_index, row)| Candidate {
                side,
                row_index: *row_index,
                row: (*row).clone(),
            })
            .collect()
    }
}

/// Key lookup for one dataset, ordered by first occurrence of each key.
struct KeyIndex<'a> {
    groups: Vec<KeyGroup<'a>>,
    positions: HashMap<String, usize>,
}

impl<'a> KeyIndex<'a> {
    fn build(
        rows: &'a [Row],
        side: Side,
        key_column: &str,
        on_missing: MissingKeyPolicy,
        skipped: &mut Vec<SkippedRow>,
    ) -> Result<Self, ReconError> {
        let mut index = KeyIndex {
            groups: Vec::new(),
            positions: HashMap::with_capacity(rows.len()),
        };

        for (row_index, row) in rows.iter().enumerate() {
            let raw = row.value(key_column);
            if is_blank_key(raw) {
                match on_missing {
                    MissingKeyPolicy::Error => {
                        return Err(ReconError::MissingKey {
                            side,
                            row: row_index,
                            column: key_column.to_string(),
                        });
                    }
                    MissingKeyPolicy::Skip => {
                        log::warn!("{side} dataset: skipping data row {} with empty key", row_index + 1);
                        skipped.push(SkippedRow { side, row_index });
                        continue;
                    }
                }
            }

            let key = raw.to_key_string();
            match index.positions.get(&key) {
                Some(&pos) => index.groups[pos].rows.push((row_index, row)),
                None => {
                    index.positions.insert(key.clone(), index.groups.len());
                    index.groups.push(KeyGroup { key, rows: vec![(row_index, row)] });
                }
            }
        }

        Ok(index)
    }

    fn get(&self, key: &str) -> Option<&KeyGroup<'a>> {
        self.positions.get(key).map(|&pos| &self.groups[pos])
    }

    fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    fn duplicates(&self, side: Side) -> Vec<DuplicateKey> {
        self.groups
            .iter()
            .filter(|g| g.is_duplicated())
            .map(|g| DuplicateKey {
                side,
                key: g.key.clone(),
                count: g.rows.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DetailStatus;

    fn row(id: impl Into<Value>, name: &str, val: i64) -> Row {
        [("id", id.into()), ("name", Value::from(name)), ("val", Value::from(val))]
            .into_iter()
            .collect()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn opts(on_duplicate: DuplicatePolicy, on_missing_key: MissingKeyPolicy) -> ReconOptions {
        ReconOptions { on_duplicate, on_missing_key }
    }

    #[test]
    fn numeric_and_text_keys_share_identity() {
        let left = vec![row(1, "A", 10)];
        let right = vec![row("1", "A", 10)];
        let result = reconcile_data(&left, &right, "id", &cols(&["name", "val"])).unwrap();
        assert_eq!(result.summary.matches, 1);
        assert_eq!(result.details.len(), 1);
        assert_eq!(result.details[0].key, "1");
    }

    #[test]
    fn strict_value_comparison() {
        let left = vec![row(1, "A", 10)];
        let mut r = row(1, "A", 10);
        r.insert("val", "10");
        let result = reconcile_data(&left, &[r], "id", &cols(&["val"])).unwrap();
        assert_eq!(result.summary.mismatches, 1);
        assert_eq!(result.details[0].differing_columns, vec!["val"]);
    }

    #[test]
    fn absent_and_empty_cells_compare_equal() {
        let left: Row = [("id", Value::from(1)), ("note", Value::Empty)].into_iter().collect();
        let right: Row = [("id", Value::from(1))].into_iter().collect();
        let right_with_note: Row = [("id", Value::from(2)), ("note", Value::from("x"))].into_iter().collect();
        let result = reconcile_data(&[left], &[right, right_with_note], "id", &cols(&["note"])).unwrap();
        assert_eq!(result.details[0].status, DetailStatus::Match);
    }

    #[test]
    fn last_wins_keeps_first_position() {
        let left = vec![row(1, "old", 1), row(2, "B", 2), row(1, "new", 1)];
        let right = vec![row(2, "B", 2), row(1, "new", 1)];
        let result = reconcile_data(&left, &right, "id", &cols(&["name"])).unwrap();
        let keys: Vec<_> = result.details.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(result.summary.matches, 2);
        assert_eq!(
            result.duplicate_keys,
            vec![DuplicateKey { side: Side::First, key: "1".into(), count: 2 }]
        );
    }

    #[test]
    fn first_wins_keeps_earliest_row() {
        let left = vec![row(1, "old", 1), row(1, "new", 1)];
        let right = vec![row(1, "new", 1)];
        let request = ReconRequest::new("id", cols(&["name"]))
            .with_options(opts(DuplicatePolicy::FirstWins, MissingKeyPolicy::Error));
        let result = reconcile(&left, &right, &request).unwrap();
        assert_eq!(result.summary.mismatches, 1);
        assert_eq!(result.details[0].first_value.as_ref().unwrap().value("name"), &Value::from("old"));
    }

    #[test]
    fn duplicate_error_lists_both_sides() {
        let left = vec![row(1, "A", 1), row(1, "A", 1)];
        let right = vec![row(2, "B", 2), row(2, "B", 2), row(2, "B", 2)];
        let request = ReconRequest::new("id", cols(&["name"]))
            .with_options(opts(DuplicatePolicy::Error, MissingKeyPolicy::Error));
        match reconcile(&left, &right, &request) {
            Err(ReconError::DuplicateKeys(dups)) => {
                assert_eq!(dups.len(), 2);
                assert_eq!(dups[0].side, Side::First);
                assert_eq!(dups[1].count, 3);
            }
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn report_marks_ambiguous_keys() {
        let left = vec![row(1, "A", 1), row(2, "B", 2)];
        let right = vec![row(1, "A", 1), row(1, "A", 9), row(3, "C", 3), row(3, "C", 3)];
        let request = ReconRequest::new("id", cols(&["val"]))
            .with_options(opts(DuplicatePolicy::Report, MissingKeyPolicy::Error));
        let result = reconcile(&left, &right, &request).unwrap();

        assert_eq!(result.summary.ambiguous, 2);
        assert_eq!(result.summary.only_in_first, 1);
        assert_eq!(result.summary.total(), result.details.len());

        let one = result.detail("1").unwrap();
        assert_eq!(one.status, DetailStatus::Ambiguous);
        assert!(one.in_first_file && one.in_second_file);
        assert_eq!(one.candidates.len(), 3);
        assert!(one.first_value.is_none());

        let three = result.detail("3").unwrap();
        assert!(!three.in_first_file);
        assert_eq!(three.candidates.iter().map(|c| c.row_index).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn missing_key_fails_by_default() {
        let left = vec![row(1, "A", 1), [("name", "B")].into_iter().collect()];
        let err = reconcile_data(&left, &[], "id", &cols(&["name"])).unwrap_err();
        match err {
            ReconError::MissingKey { side, row, .. } => {
                assert_eq!(side, Side::First);
                assert_eq!(row, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_key_skip_records_rows() {
        let left = vec![row(1, "A", 1), [("id", ""), ("name", "B")].into_iter().collect()];
        let right = vec![[("name", "C")].into_iter().collect(), row(1, "A", 1)];
        let request = ReconRequest::new("id", cols(&["name"]))
            .with_options(opts(DuplicatePolicy::LastWins, MissingKeyPolicy::Skip));
        let result = reconcile(&left, &right, &request).unwrap();
        assert_eq!(result.summary.matches, 1);
        assert_eq!(result.details.len(), 1);
        assert_eq!(
            result.skipped_rows,
            vec![
                SkippedRow { side: Side::First, row_index: 1 },
                SkippedRow { side: Side::Second, row_index: 0 },
            ]
        );
    }

    #[test]
    fn unknown_columns_rejected() {
        let left = vec![row(1, "A", 1)];
        let err = reconcile_data(&left, &left, "code", &cols(&["name"])).unwrap_err();
        assert!(matches!(err, ReconError::UnknownColumn { side: Side::First, ref column } if column == "code"));

        let err = reconcile_data(&left, &left, "id", &cols(&["name", "amount"])).unwrap_err();
        assert_eq!(err.to_string(), "first dataset: unknown column 'amount'");
    }

    #[test]
    fn empty_selection_rejected() {
        let left = vec![row(1, "A", 1)];
        assert!(matches!(reconcile_data(&left, &left, "", &cols(&["name"])), Err(ReconError::NoKeyColumn)));
        assert!(matches!(reconcile_data(&left, &left, "id", &[]), Err(ReconError::NoCompareColumns)));
    }

    #[test]
    fn empty_datasets_reconcile_to_nothing() {
        let result = reconcile_data(&[], &[], "id", &cols(&["name"])).unwrap();
        assert!(result.details.is_empty());
        assert_eq!(result.summary.match_percentage(), 0);
    }
}
