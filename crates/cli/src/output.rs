//! Rendering of reconciliation results: JSON envelope, text tables, CSV.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sheetrecon_recon::{
    DetailStatus, DuplicateKey, ReconDetail, ReconOptions, ReconResult, ReconSummary, ResultView, Side, SkippedRow,
};

use crate::util::format_table;
use crate::CliError;

/// One input as it was reconciled.
#[derive(Debug, Serialize)]
pub struct SourceMeta {
    pub file: String,
    pub sheet: String,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct RunMeta {
    pub engine_version: &'static str,
    pub run_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    pub left: SourceMeta,
    pub right: SourceMeta,
    pub key_column: String,
    pub compare_columns: Vec<String>,
    pub policies: ReconOptions,
    pub view: ResultView,
}

impl RunMeta {
    pub fn new(
        job: Option<String>,
        left: SourceMeta,
        right: SourceMeta,
        key_column: String,
        compare_columns: Vec<String>,
        policies: ReconOptions,
        view: ResultView,
    ) -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION"),
            run_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            job,
            left,
            right,
            key_column,
            compare_columns,
            policies,
            view,
        }
    }
}

#[derive(Serialize)]
struct SummaryOut<'a> {
    #[serde(flatten)]
    counts: &'a ReconSummary,
    match_percentage: u32,
}

#[derive(Serialize)]
struct Report<'a> {
    meta: &'a RunMeta,
    summary: SummaryOut<'a>,
    details: Vec<&'a ReconDetail>,
    duplicate_keys: &'a [DuplicateKey],
    skipped_rows: &'a [SkippedRow],
}

pub fn render_json(meta: &RunMeta, result: &ReconResult) -> Result<String, CliError> {
    let report = Report {
        meta,
        summary: SummaryOut {
            counts: &result.summary,
            match_percentage: result.summary.match_percentage(),
        },
        details: result.view(meta.view).collect(),
        duplicate_keys: &result.duplicate_keys,
        skipped_rows: &result.skipped_rows,
    };
    let mut json = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    json.push('\n');
    Ok(json)
}

pub fn render_text(meta: &RunMeta, result: &ReconResult) -> String {
    let s = &result.summary;
    let mut out = String::new();
    out.push_str(&format!(
        "{} [{}] vs {} [{}]\n",
        meta.left.file, meta.left.sheet, meta.right.file, meta.right.sheet
    ));
    out.push_str(&format!("key: {}   compare: {}\n", meta.key_column, meta.compare_columns.join(", ")));
    out.push_str(&format!(
        "matches: {}  mismatches: {}  only in first: {}  only in second: {}",
        s.matches, s.mismatches, s.only_in_first, s.only_in_second
    ));
    if s.ambiguous > 0 {
        out.push_str(&format!("  ambiguous: {}", s.ambiguous));
    }
    out.push_str(&format!("  ({}% match)\n", s.match_percentage()));

    for dup in &result.duplicate_keys {
        out.push_str(&format!("duplicate: {} key '{}' x{}\n", dup.side, dup.key, dup.count));
    }
    if !result.skipped_rows.is_empty() {
        out.push_str(&format!("skipped rows without key: {}\n", result.skipped_rows.len()));
    }

    let rows = detail_rows(meta, result, |d| d.status.label().to_string());
    if rows.is_empty() {
        out.push_str(&format!("\nno {} records\n", meta.view));
    } else {
        out.push('\n');
        out.push_str(&format_table(&detail_headers(meta), &rows));
    }
    out
}

pub fn render_csv(meta: &RunMeta, result: &ReconResult) -> Result<String, CliError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| CliError::io(format!("CSV write error: {e}"));

    writer.write_record(detail_headers(meta)).map_err(csv_err)?;
    for row in detail_rows(meta, result, |d| d.status.as_str().to_string()) {
        writer.write_record(&row).map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CliError::io(format!("CSV write error: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CliError::io(format!("CSV write error: {e}")))
}

/// Stderr one-liner after a run.
pub fn summary_line(meta: &RunMeta, summary: &ReconSummary) -> String {
    let mut line = format!(
        "{}: {} matched, {} mismatched, {} only in first, {} only in second",
        meta.job.as_deref().unwrap_or("recon"),
        summary.matches,
        summary.mismatches,
        summary.only_in_first,
        summary.only_in_second,
    );
    if summary.ambiguous > 0 {
        line.push_str(&format!(", {} ambiguous", summary.ambiguous));
    }
    line.push_str(&format!(" ({}% match)", summary.match_percentage()));
    line
}

fn detail_headers(meta: &RunMeta) -> Vec<String> {
    let mut headers = vec!["key".to_string(), "status".to_string(), "differing".to_string()];
    for column in &meta.compare_columns {
        headers.push(format!("first.{column}"));
        headers.push(format!("second.{column}"));
    }
    headers
}

fn detail_rows(meta: &RunMeta, result: &ReconResult, status: impl Fn(&ReconDetail) -> String) -> Vec<Vec<String>> {
    result
        .view(meta.view)
        .map(|detail| {
            let differing = if detail.status == DetailStatus::Ambiguous {
                format!("{} candidates", detail.candidates.len())
            } else {
                detail.differing_columns.join(";")
            };
            let mut row = vec![detail.key.clone(), status(detail), differing];
            for column in &meta.compare_columns {
                row.push(side_value(detail, Side::First, column));
                row.push(side_value(detail, Side::Second, column));
            }
            row
        })
        .collect()
}

fn side_value(detail: &ReconDetail, side: Side, column: &str) -> String {
    let row = match side {
        Side::First => detail.first_value.as_ref(),
        Side::Second => detail.second_value.as_ref(),
    };
    row.map(|r| r.value(column).to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetrecon_recon::{reconcile_data, Row, Value};

    fn row(id: i64, name: &str, val: i64) -> Row {
        [("id", Value::from(id)), ("name", Value::from(name)), ("val", Value::from(val))]
            .into_iter()
            .collect()
    }

    fn fixture(view: ResultView) -> (RunMeta, ReconResult) {
        let first = vec![row(1, "A", 10), row(2, "B", 20)];
        let second = vec![row(1, "A", 99), row(3, "C", 30)];
        let compare = vec!["name".to_string(), "val".to_string()];
        let result = reconcile_data(&first, &second, "id", &compare).unwrap();
        let meta = RunMeta::new(
            Some("march".to_string()),
            SourceMeta { file: "a.csv".into(), sheet: "a".into(), rows: 2 },
            SourceMeta { file: "b.csv".into(), sheet: "b".into(), rows: 2 },
            "id".to_string(),
            compare,
            ReconOptions::default(),
            view,
        );
        (meta, result)
    }

    #[test]
    fn json_envelope_shape() {
        let (meta, result) = fixture(ResultView::All);
        let json: serde_json::Value = serde_json::from_str(&render_json(&meta, &result).unwrap()).unwrap();

        assert_eq!(json["meta"]["key_column"], "id");
        assert_eq!(json["meta"]["policies"]["on_duplicate"], "last_wins");
        assert_eq!(json["meta"]["view"], "all");
        assert_eq!(json["summary"]["mismatches"], 1);
        assert_eq!(json["summary"]["match_percentage"], 0);
        assert_eq!(json["details"].as_array().unwrap().len(), 3);
        assert_eq!(json["details"][0]["first_value"]["val"], 10);
        assert_eq!(json["details"][0]["second_value"]["val"], 99);
        assert!(json["duplicate_keys"].as_array().unwrap().is_empty());
    }

    #[test]
    fn json_details_follow_view() {
        let (meta, result) = fixture(ResultView::OnlySecond);
        let json: serde_json::Value = serde_json::from_str(&render_json(&meta, &result).unwrap()).unwrap();
        let details = json["details"].as_array().unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["key"], "3");
        // Summary always covers every key
        assert_eq!(json["summary"]["only_in_first"], 1);
    }

    #[test]
    fn csv_has_side_columns() {
        let (meta, result) = fixture(ResultView::All);
        let csv = render_csv(&meta, &result).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "key,status,differing,first.name,second.name,first.val,second.val");
        assert_eq!(lines[1], "1,mismatch,val,A,A,10,99");
        assert_eq!(lines[2], "2,only_in_first,,B,,20,");
        assert_eq!(lines[3], "3,only_in_second,,,C,,30");
    }

    #[test]
    fn text_report_lists_counts() {
        let (meta, result) = fixture(ResultView::Mismatches);
        let text = render_text(&meta, &result);
        assert!(text.contains("matches: 0  mismatches: 1  only in first: 1  only in second: 1  (0% match)"));
        assert!(text.contains("Mismatch"));
        assert!(!text.contains("Only in First"));
    }

    #[test]
    fn summary_line_mentions_job() {
        let (meta, result) = fixture(ResultView::All);
        assert_eq!(
            summary_line(&meta, &result.summary),
            "march: 0 matched, 1 mismatched, 1 only in first, 1 only in second (0% match)"
        );
    }
}
