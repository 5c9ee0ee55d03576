use std::collections::HashSet;

use crate::value::Row;

/// Columns present in both datasets, in the first dataset's order.
///
/// Only the first row of each side is inspected. A column that appears only
/// in later rows is not reported; use [`find_common_columns_all_rows`] when
/// rows are not uniform.
pub fn find_common_columns(data1: &[Row], data2: &[Row]) -> Vec<String> {
    let (Some(first1), Some(first2)) = (data1.first(), data2.first()) else {
        return Vec::new();
    };

    let right: HashSet<&str> = first2.columns().collect();
    first1
        .columns()
        .filter(|col| right.contains(col))
        .map(str::to_string)
        .collect()
}

/// Same as [`find_common_columns`] but over every row's columns.
pub fn find_common_columns_all_rows(data1: &[Row], data2: &[Row]) -> Vec<String> {
    let right: HashSet<String> = union_columns(data2).into_iter().collect();
    union_columns(data1)
        .into_iter()
        .filter(|col| right.contains(col))
        .collect()
}

/// Every column seen in any row, in order of first appearance.
pub fn union_columns(rows: &[Row]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        for col in row.columns() {
            if seen.insert(col) {
                out.push(col.to_string());
            }
        }
    }
    out
}
