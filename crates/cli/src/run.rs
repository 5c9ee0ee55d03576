//! `sheetrecon run` and `sheetrecon validate`: flag- or job-driven reconciliation.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use sheetrecon_recon::{
    DuplicatePolicy, MissingKeyPolicy, OutputFormat, ReconConfig, ReconOptions, ResultView, SessionState, Side,
};

use crate::exit_codes::EXIT_RECON_DIFFS;
use crate::output::{self, RunMeta, SourceMeta};
use crate::{load, pick_sheet, CliError};

#[derive(Args)]
pub struct RunArgs {
    /// First file (xlsx, xls, xlsb, ods, csv, tsv, json)
    #[arg(required_unless_present = "config")]
    left: Option<PathBuf>,

    /// Second file
    #[arg(required_unless_present = "config")]
    right: Option<PathBuf>,

    /// Key column identifying a record; must appear in the first row of both sheets
    #[arg(long, short = 'k', required_unless_present = "config")]
    key: Option<String>,

    /// Columns to compare, comma-separated (default: every common column except the key)
    #[arg(long, value_delimiter = ',')]
    compare: Vec<String>,

    /// Sheet of the first file (defaults to its first sheet)
    #[arg(long)]
    left_sheet: Option<String>,

    /// Sheet of the second file (defaults to its first sheet)
    #[arg(long)]
    right_sheet: Option<String>,

    /// What to do when a key repeats within one sheet
    #[arg(long, value_enum)]
    on_duplicate: Option<DuplicateArg>,

    /// What to do with rows whose key cell is empty
    #[arg(long, value_enum)]
    on_missing_key: Option<MissingKeyArg>,

    /// Which detail records to output
    #[arg(long, value_enum)]
    view: Option<ViewArg>,

    /// Output format
    #[arg(long, short = 'f', value_enum)]
    format: Option<FormatArg>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Write output to file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Suppress the stderr summary
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Keep every csv field as text
    #[arg(long)]
    no_infer_types: bool,

    /// Job TOML file; --view, --format, --output and policy flags override it
    #[arg(long, short = 'c', conflicts_with_all = ["left", "right", "key", "compare", "left_sheet", "right_sheet"])]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DuplicateArg {
    #[value(name = "error")]
    Error,
    #[value(name = "first_wins")]
    FirstWins,
    #[value(name = "last_wins")]
    LastWins,
    #[value(name = "report")]
    Report,
}

impl From<DuplicateArg> for DuplicatePolicy {
    fn from(arg: DuplicateArg) -> Self {
        match arg {
            DuplicateArg::Error => DuplicatePolicy::Error,
            DuplicateArg::FirstWins => DuplicatePolicy::FirstWins,
            DuplicateArg::LastWins => DuplicatePolicy::LastWins,
            DuplicateArg::Report => DuplicatePolicy::Report,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MissingKeyArg {
    Error,
    Skip,
}

impl From<MissingKeyArg> for MissingKeyPolicy {
    fn from(arg: MissingKeyArg) -> Self {
        match arg {
            MissingKeyArg::Error => MissingKeyPolicy::Error,
            MissingKeyArg::Skip => MissingKeyPolicy::Skip,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    All,
    Mismatches,
    #[value(name = "only_first")]
    OnlyFirst,
    #[value(name = "only_second")]
    OnlySecond,
    Ambiguous,
}

impl From<ViewArg> for ResultView {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::All => ResultView::All,
            ViewArg::Mismatches => ResultView::Mismatches,
            ViewArg::OnlyFirst => ResultView::OnlyFirst,
            ViewArg::OnlySecond => ResultView::OnlySecond,
            ViewArg::Ambiguous => ResultView::Ambiguous,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Text,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

/// A fully resolved run: job file values with flag overrides applied.
#[derive(Debug)]
struct Job {
    name: Option<String>,
    left: PathBuf,
    right: PathBuf,
    left_sheet: Option<String>,
    right_sheet: Option<String>,
    key: String,
    compare: Option<Vec<String>>,
    options: ReconOptions,
    view: ResultView,
    format: OutputFormat,
    output: Option<PathBuf>,
}

fn read_job(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::job(format!("cannot read job file {}: {e}", path.display())))?;
    ReconConfig::from_toml(&text).map_err(|e| CliError::job(e.to_string()))
}

/// Directory that relative paths in a job file resolve against.
fn job_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn resolve_job(args: &RunArgs) -> Result<Job, CliError> {
    let mut job = match &args.config {
        Some(path) => {
            let config = read_job(path)?;
            let base = job_dir(path);
            log::info!("job '{}' from {}", config.name, path.display());
            Job {
                name: Some(config.name.clone()),
                left: base.join(&config.left.file),
                right: base.join(&config.right.file),
                left_sheet: config.left.sheet.clone(),
                right_sheet: config.right.sheet.clone(),
                key: config.key.clone(),
                compare: config.compare.clone(),
                options: config.options(),
                view: config.output.view,
                format: config.output.format,
                output: config.output.file.as_ref().map(|f| base.join(f)),
            }
        }
        None => {
            let (Some(left), Some(right), Some(key)) = (&args.left, &args.right, &args.key) else {
                return Err(CliError::args("run needs <LEFT> <RIGHT> and --key, or --config <JOB>"));
            };
            Job {
                name: None,
                left: left.clone(),
                right: right.clone(),
                left_sheet: args.left_sheet.clone(),
                right_sheet: args.right_sheet.clone(),
                key: key.clone(),
                compare: if args.compare.is_empty() { None } else { Some(args.compare.clone()) },
                options: ReconOptions::default(),
                view: ResultView::default(),
                format: OutputFormat::default(),
                output: None,
            }
        }
    };

    if let Some(policy) = args.on_duplicate {
        job.options.on_duplicate = policy.into();
    }
    if let Some(policy) = args.on_missing_key {
        job.options.on_missing_key = policy.into();
    }
    if let Some(view) = args.view {
        job.view = view.into();
    }
    if args.json {
        job.format = OutputFormat::Json;
    } else if let Some(format) = args.format {
        job.format = format.into();
    }
    if let Some(output) = &args.output {
        job.output = Some(output.clone());
    }
    Ok(job)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let job = resolve_job(&args)?;
    log::debug!("resolved run: {:?}", job);

    let infer_types = !args.no_infer_types;
    let left_wb = load(&job.left, infer_types)?;
    let right_wb = load(&job.right, infer_types)?;
    let left_sheet = pick_sheet(&left_wb, job.left_sheet.as_deref())?.name.clone();
    let right_sheet = pick_sheet(&right_wb, job.right_sheet.as_deref())?.name.clone();

    let state = SessionState::new()
        .load_source(Side::First, left_wb)
        .load_source(Side::Second, right_wb)
        .select_sheet(Side::First, &left_sheet)
        .and_then(|s| s.select_sheet(Side::Second, &right_sheet))
        .map_err(|e| CliError::session(e, &[]))?;

    let common = state.common_columns().to_vec();
    let compare = match &job.compare {
        Some(columns) => columns.clone(),
        None => common.iter().filter(|c| **c != job.key).cloned().collect(),
    };

    let state = state
        .set_key_column(&job.key)
        .and_then(|s| s.set_compare_columns(&compare))
        .and_then(|s| s.reconcile(job.options))
        .map_err(|e| CliError::session(e, &common))?;
    let result = state
        .result()
        .ok_or_else(|| CliError::io("reconciliation produced no result"))?;

    let meta = RunMeta::new(
        job.name.clone(),
        source_meta(&state, Side::First),
        source_meta(&state, Side::Second),
        job.key.clone(),
        state.compare_columns().to_vec(),
        job.options,
        job.view,
    );

    let rendered = match job.format {
        OutputFormat::Json => output::render_json(&meta, result)?,
        OutputFormat::Text => output::render_text(&meta, result),
        OutputFormat::Csv => output::render_csv(&meta, result)?,
    };

    match &job.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            if !args.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        None => print!("{}", rendered),
    }

    if !args.quiet {
        eprintln!("{}", output::summary_line(&meta, &result.summary));
    }

    if result.summary.is_clean() {
        Ok(())
    } else {
        Err(CliError::silent(EXIT_RECON_DIFFS))
    }
}

fn source_meta(state: &SessionState, side: Side) -> SourceMeta {
    let file = state.workbook(side).map(|w| w.file_name.clone()).unwrap_or_default();
    let (sheet, rows) = state
        .selected_dataset(side)
        .map(|d| (d.name.clone(), d.len()))
        .unwrap_or_default();
    SourceMeta { file, sheet, rows }
}

pub fn cmd_validate(path: PathBuf) -> Result<(), CliError> {
    let config = read_job(&path)?;
    let base = job_dir(&path);

    for (side, source) in [("left", &config.left), ("right", &config.right)] {
        let file = base.join(&source.file);
        if !file.exists() {
            return Err(CliError::job(format!("{side}.file not found: {}", file.display()))
                .with_hint("paths are relative to the job file's directory"));
        }
    }

    println!(
        "ok: '{}' key '{}' ({} vs {}), on_duplicate={}, on_missing_key={}",
        config.name,
        config.key,
        config.left.file,
        config.right.file,
        config.on_duplicate,
        config.on_missing_key,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        Harness::try_parse_from(std::iter::once("run").chain(args.iter().copied()))
            .unwrap()
            .run
    }

    #[test]
    fn flags_resolve_with_defaults() {
        let job = resolve_job(&parse(&["a.csv", "b.csv", "--key", "id", "--compare", "name,val"])).unwrap();
        assert_eq!(job.key, "id");
        assert_eq!(job.compare, Some(vec!["name".to_string(), "val".to_string()]));
        assert_eq!(job.options, ReconOptions::default());
        assert_eq!(job.view, ResultView::All);
        assert_eq!(job.format, OutputFormat::Json);
    }

    #[test]
    fn policy_and_view_values_use_snake_case() {
        let job = resolve_job(&parse(&[
            "a.csv",
            "b.csv",
            "-k",
            "id",
            "--on-duplicate",
            "first_wins",
            "--on-missing-key",
            "skip",
            "--view",
            "only_second",
            "--format",
            "csv",
        ]))
        .unwrap();
        assert_eq!(job.options.on_duplicate, DuplicatePolicy::FirstWins);
        assert_eq!(job.options.on_missing_key, MissingKeyPolicy::Skip);
        assert_eq!(job.view, ResultView::OnlySecond);
        assert_eq!(job.format, OutputFormat::Csv);
        assert_eq!(job.compare, None);
    }

    #[test]
    fn job_paths_resolve_against_job_dir_and_flags_override() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = dir.path().join("march.toml");
        std::fs::write(
            &job_path,
            r#"
name = "march"
key = "id"
on_duplicate = "report"

[left]
file = "ledger.csv"
sheet = "ledger"

[right]
file = "data/bank.csv"

[output]
view = "mismatches"
format = "text"
file = "out.txt"
"#,
        )
        .unwrap();

        let job_arg = job_path.to_str().unwrap();
        let job = resolve_job(&parse(&["--config", job_arg, "--format", "csv"])).unwrap();
        assert_eq!(job.name.as_deref(), Some("march"));
        assert_eq!(job.left, dir.path().join("ledger.csv"));
        assert_eq!(job.right, dir.path().join("data/bank.csv"));
        assert_eq!(job.left_sheet.as_deref(), Some("ledger"));
        assert_eq!(job.options.on_duplicate, DuplicatePolicy::Report);
        assert_eq!(job.view, ResultView::Mismatches);
        assert_eq!(job.format, OutputFormat::Csv);
        assert_eq!(job.output, Some(dir.path().join("out.txt")));
    }

    #[test]
    fn config_conflicts_with_positional_files() {
        let parsed = Harness::try_parse_from(["run", "a.csv", "b.csv", "--key", "id", "--config", "job.toml"]);
        assert!(parsed.is_err());
    }
}
