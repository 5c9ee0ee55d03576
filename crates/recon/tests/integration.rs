use sheetrecon_recon::config::{DuplicatePolicy, MissingKeyPolicy, ReconOptions};
use sheetrecon_recon::engine::{reconcile, reconcile_data, ReconRequest};
use sheetrecon_recon::model::{DetailStatus, Side};
use sheetrecon_recon::{find_common_columns, ReconError, ResultView, Row, Value};

fn rec(id: i64, name: &str, val: i64) -> Row {
    [("id", Value::from(id)), ("name", Value::from(name)), ("val", Value::from(val))]
        .into_iter()
        .collect()
}

fn compare() -> Vec<String> {
    vec!["name".to_string(), "val".to_string()]
}

// -------------------------------------------------------------------------
// Reconciler scenarios
// -------------------------------------------------------------------------

#[test]
fn one_match_one_only_each_side() {
    let data1 = vec![rec(1, "A", 10), rec(2, "B", 20)];
    let data2 = vec![rec(1, "A", 10), rec(3, "C", 30)];

    let result = reconcile_data(&data1, &data2, "id", &compare()).unwrap();

    assert_eq!(result.summary.matches, 1);
    assert_eq!(result.summary.mismatches, 0);
    assert_eq!(result.summary.only_in_first, 1);
    assert_eq!(result.summary.only_in_second, 1);
    assert_eq!(result.details.len(), 3);
    assert_eq!(result.summary.match_percentage(), 33);

    let keys: Vec<_> = result.details.iter().map(|d| (d.key.as_str(), d.status)).collect();
    assert_eq!(
        keys,
        vec![
            ("1", DetailStatus::Match),
            ("2", DetailStatus::OnlyInFirst),
            ("3", DetailStatus::OnlyInSecond),
        ]
    );

    let only_first = result.detail("2").unwrap();
    assert!(only_first.in_first_file && !only_first.in_second_file);
    assert!(only_first.second_value.is_none());
    let only_second = result.detail("3").unwrap();
    assert!(!only_second.in_first_file && only_second.in_second_file);
    assert!(only_second.first_value.is_none());
}

#[test]
fn changed_value_is_mismatch() {
    let data1 = vec![rec(1, "A", 10), rec(2, "B", 20)];
    let data2 = vec![rec(1, "A", 99), rec(3, "C", 30)];

    let result = reconcile_data(&data1, &data2, "id", &compare()).unwrap();

    assert_eq!(result.summary.matches, 0);
    assert_eq!(result.summary.mismatches, 1);

    let detail = result.detail("1").unwrap();
    assert!(!detail.is_match);
    assert_eq!(detail.status, DetailStatus::Mismatch);
    assert_eq!(detail.first_value.as_ref().unwrap().value("val"), &Value::from(10));
    assert_eq!(detail.second_value.as_ref().unwrap().value("val"), &Value::from(99));
    assert_eq!(detail.differing_columns, vec!["val"]);

    let mismatches: Vec<_> = result.view(ResultView::Mismatches).map(|d| d.key.as_str()).collect();
    assert_eq!(mismatches, vec!["1"]);
}

#[test]
fn duplicate_key_last_row_wins() {
    let data1 = vec![rec(1, "first", 10), rec(1, "second", 11)];
    let data2 = vec![rec(1, "second", 11)];

    let result = reconcile_data(&data1, &data2, "id", &compare()).unwrap();

    assert_eq!(result.details.len(), 1);
    assert_eq!(result.summary.matches, 1);
    let first = result.details[0].first_value.as_ref().unwrap();
    assert_eq!(first.value("name"), &Value::from("second"));
    assert_eq!(result.duplicate_keys.len(), 1);
    assert_eq!(result.duplicate_keys[0].side, Side::First);
}

#[test]
fn only_compare_columns_matter() {
    let data1 = vec![rec(1, "A", 10)];
    let data2 = vec![rec(1, "Z", 10)];

    let result = reconcile_data(&data1, &data2, "id", &["val".to_string()]).unwrap();
    assert_eq!(result.summary.matches, 1);
}

#[test]
fn text_keys_are_exact() {
    let row = |id: &str| -> Row { [("id", id), ("v", "x")].into_iter().collect() };
    let data1 = vec![row("INV-1"), row("inv-1")];
    let data2 = vec![row("INV-1"), row(" INV-1")];

    let result = reconcile_data(&data1, &data2, "id", &["v".to_string()]).unwrap();
    assert_eq!(result.summary.matches, 1);
    assert_eq!(result.summary.only_in_first, 1);
    assert_eq!(result.summary.only_in_second, 1);
}

#[test]
fn report_policy_keeps_counter_invariant() {
    let data1 = vec![rec(1, "A", 1), rec(1, "A", 1), rec(2, "B", 2)];
    let data2 = vec![rec(2, "B", 3), rec(4, "D", 4)];
    let request = ReconRequest::new("id", compare()).with_options(ReconOptions {
        on_duplicate: DuplicatePolicy::Report,
        on_missing_key: MissingKeyPolicy::Error,
    });

    let result = reconcile(&data1, &data2, &request).unwrap();
    let s = &result.summary;
    assert_eq!((s.ambiguous, s.mismatches, s.only_in_second), (1, 1, 1));
    assert_eq!(s.total(), result.details.len());
    assert_eq!(result.view(ResultView::Ambiguous).count(), 1);
    assert_eq!(result.view(ResultView::Mismatches).count(), 1);
}

#[test]
fn undefined_key_bucket_is_rejected() {
    let data1 = vec![rec(1, "A", 1), [("name", "B"), ("val", "2")].into_iter().collect()];
    let data2 = vec![[("name", "C"), ("val", "3")].into_iter().collect()];

    let err = reconcile_data(&data1, &data2, "id", &compare()).unwrap_err();
    assert!(matches!(err, ReconError::MissingKey { side: Side::First, row: 1, .. }), "{err}");
}

#[test]
fn result_serializes_with_detail_fields() {
    let data1 = vec![rec(1, "A", 10)];
    let data2 = vec![rec(1, "A", 11)];
    let result = reconcile_data(&data1, &data2, "id", &compare()).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    let detail = &json["details"][0];
    assert_eq!(detail["key"], "1");
    assert_eq!(detail["status"], "mismatch");
    assert_eq!(detail["in_first_file"], true);
    assert_eq!(detail["first_value"]["val"], 10);
    assert_eq!(detail["second_value"]["val"], 11);
    assert_eq!(detail["is_match"], false);
    assert!(json.get("duplicate_keys").is_none());
}

// -------------------------------------------------------------------------
// Column intersector
// -------------------------------------------------------------------------

#[test]
fn common_columns_identical_schema_different_lengths() {
    let data1 = vec![rec(1, "A", 10), rec(2, "B", 20), rec(3, "C", 30)];
    let data2 = vec![rec(9, "Z", 0)];
    assert_eq!(find_common_columns(&data1, &data2), vec!["id", "name", "val"]);
}

#[test]
fn common_columns_then_reconcile_pipeline() {
    let data1: Vec<Row> = vec![[("code", "a"), ("qty", "1"), ("site", "N")].into_iter().collect()];
    let data2: Vec<Row> = vec![[("site", "N"), ("code", "a"), ("price", "2")].into_iter().collect()];

    let common = find_common_columns(&data1, &data2);
    assert_eq!(common, vec!["code", "site"]);

    let key = common[0].clone();
    let rest: Vec<String> = common.iter().filter(|c| **c != key).cloned().collect();
    let result = reconcile_data(&data1, &data2, &key, &rest).unwrap();
    assert!(result.summary.is_clean());
}
