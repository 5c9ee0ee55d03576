// sheetrecon CLI - reconcile two spreadsheets by a key column

mod exit_codes;
mod logging;
mod output;
mod run;
mod util;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use sheetrecon_io::{IoError, LoadOptions, SourceFormat};
use sheetrecon_recon::{find_common_columns, find_common_columns_all_rows, Dataset, Row, SessionError, Workbook};

use exit_codes::{session_exit_code, EXIT_ERROR, EXIT_INVALID_JOB, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "sheetrecon")]
#[command(about = "Reconcile two spreadsheets by a key column")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a file with row and column counts
    #[command(after_help = "\
Examples:
  sheetrecon sheets ledger.xlsx
  sheetrecon sheets ledger.xlsx --json")]
    Sheets {
        /// Input file (xlsx, xls, xlsb, ods, csv, tsv, json)
        file: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Show the first rows of a sheet
    #[command(after_help = "\
Examples:
  sheetrecon preview ledger.xlsx
  sheetrecon preview ledger.xlsx --sheet March --rows 25
  sheetrecon preview bank.csv --json")]
    Preview {
        file: PathBuf,

        /// Sheet name (defaults to the first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Number of rows to show
        #[arg(long, short = 'n', default_value_t = 10)]
        rows: usize,

        /// Keep every csv field as text
        #[arg(long)]
        no_infer_types: bool,

        #[arg(long)]
        json: bool,
    },

    /// List the columns two sheets have in common
    #[command(after_help = "\
Examples:
  sheetrecon columns ledger.xlsx bank.csv
  sheetrecon columns ledger.xlsx bank.csv --left-sheet March --all-rows-schema")]
    Columns {
        left: PathBuf,
        right: PathBuf,

        #[arg(long)]
        left_sheet: Option<String>,

        #[arg(long)]
        right_sheet: Option<String>,

        /// Use every row's columns instead of only the first row's
        #[arg(long)]
        all_rows_schema: bool,

        #[arg(long)]
        no_infer_types: bool,

        #[arg(long)]
        json: bool,
    },

    /// Reconcile two sheets by key
    #[command(after_help = "\
Examples:
  sheetrecon run ledger.xlsx bank.csv --key id
  sheetrecon run ledger.xlsx bank.csv --key id --compare name,amount --view mismatches
  sheetrecon run ledger.xlsx bank.csv --key id --format csv --output diff.csv
  sheetrecon run --config march.toml
  sheetrecon run --config march.toml --view only_first --format text

Columns:
  --key and --compare must name columns present in the first data row of
  both sheets. A blank cell in that row hides its column; compare the
  output of `sheetrecon columns` with and without --all-rows-schema.

Exit codes:
  0  every key matched
  2  unknown sheet or column
  3  differences found
  4  duplicate keys (--on-duplicate error)
  5  row without a key (--on-missing-key error)")]
    Run(run::RunArgs),

    /// Check a job file without running it
    #[command(after_help = "\
Examples:
  sheetrecon validate march.toml")]
    Validate {
        /// Path to the job TOML file
        job: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sheets { file, json } => cmd_sheets(file, json),
        Commands::Preview {
            file,
            sheet,
            rows,
            no_infer_types,
            json,
        } => cmd_preview(file, sheet, rows, no_infer_types, json),
        Commands::Columns {
            left,
            right,
            left_sheet,
            right_sheet,
            all_rows_schema,
            no_infer_types,
            json,
        } => cmd_columns(left, right, left_sheet, right_sheet, all_rows_schema, no_infer_types, json),
        Commands::Run(args) => run::cmd_run(args),
        Commands::Validate { job } => run::cmd_validate(job),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn job(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_JOB, message: msg.into(), hint: None }
    }

    /// Exit with `code` without printing anything.
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    /// Create error from a load failure.
    pub fn load(err: IoError) -> Self {
        match err {
            IoError::UnsupportedFormat(_) => Self::args(err.to_string())
                .with_hint("supported: xlsx, xlsm, xls, xlsb, ods, csv, tsv, json"),
            other => Self::parse(other.to_string()),
        }
    }

    /// Create error from session error with proper exit code.
    pub fn session(err: SessionError, common_columns: &[String]) -> Self {
        let code = session_exit_code(&err);
        let hint = match &err {
            SessionError::UnknownColumn(_) if common_columns.is_empty() => {
                Some("the two sheets share no columns; check --left-sheet/--right-sheet".to_string())
            }
            SessionError::UnknownColumn(_) => Some(format!("common columns: {}", common_columns.join(", "))),
            SessionError::NotReady => Some("pass --compare with at least one column besides the key".to_string()),
            SessionError::Recon(sheetrecon_recon::ReconError::DuplicateKeys(_)) => {
                Some("use --on-duplicate first_wins|last_wins|report to continue".to_string())
            }
            SessionError::Recon(sheetrecon_recon::ReconError::MissingKey { .. }) => {
                Some("use --on-missing-key skip to drop rows without a key".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// shared loading
// ============================================================================

pub(crate) fn load(path: &Path, infer_types: bool) -> Result<Workbook, CliError> {
    let format = SourceFormat::from_path(path).map_err(CliError::load)?;
    let options = LoadOptions {
        infer_types,
        ..LoadOptions::default()
    };
    sheetrecon_io::load_workbook_as(path, format, &options).map_err(CliError::load)
}

/// The named sheet, or the first one.
pub(crate) fn pick_sheet<'a>(workbook: &'a Workbook, sheet: Option<&str>) -> Result<&'a Dataset, CliError> {
    match sheet {
        Some(name) => workbook.sheet(name).ok_or_else(|| {
            CliError::args(format!("{} has no sheet named '{}'", workbook.file_name, name))
                .with_hint(format!("sheets: {}", workbook.sheet_names().collect::<Vec<_>>().join(", ")))
        }),
        None => workbook
            .sheets
            .first()
            .ok_or_else(|| CliError::parse(format!("{} contains no sheets", workbook.file_name))),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    println!("{}", json);
    Ok(())
}

// ============================================================================
// sheets
// ============================================================================

#[derive(Serialize)]
struct SheetInfo<'a> {
    name: &'a str,
    rows: usize,
    columns: Vec<String>,
}

fn cmd_sheets(file: PathBuf, json: bool) -> Result<(), CliError> {
    let workbook = load(&file, true)?;
    let sheets: Vec<SheetInfo> = workbook
        .sheets
        .iter()
        .map(|s| SheetInfo { name: &s.name, rows: s.len(), columns: s.all_columns() })
        .collect();

    if json {
        return print_json(&serde_json::json!({
            "file": workbook.file_name,
            "sheets": sheets,
        }));
    }

    let headers = vec!["sheet".to_string(), "rows".to_string(), "columns".to_string()];
    let rows: Vec<Vec<String>> = sheets
        .iter()
        .map(|s| vec![s.name.to_string(), s.rows.to_string(), s.columns.len().to_string()])
        .collect();
    print!("{}", util::format_table(&headers, &rows));
    Ok(())
}

// ============================================================================
// preview
// ============================================================================

fn cmd_preview(
    file: PathBuf,
    sheet: Option<String>,
    rows: usize,
    no_infer_types: bool,
    json: bool,
) -> Result<(), CliError> {
    let workbook = load(&file, !no_infer_types)?;
    let dataset = pick_sheet(&workbook, sheet.as_deref())?;
    let preview: &[Row] = dataset.preview(rows);
    let columns = dataset.all_columns();

    if json {
        return print_json(&serde_json::json!({
            "file": workbook.file_name,
            "sheet": dataset.name,
            "total_rows": dataset.len(),
            "columns": columns,
            "rows": preview,
        }));
    }

    let table_rows: Vec<Vec<String>> = preview
        .iter()
        .map(|row| columns.iter().map(|c| row.value(c).to_string()).collect())
        .collect();
    print!("{}", util::format_table(&columns, &table_rows));
    if dataset.len() > preview.len() {
        eprintln!("({} of {} rows)", preview.len(), dataset.len());
    }
    Ok(())
}

// ============================================================================
// columns
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_columns(
    left: PathBuf,
    right: PathBuf,
    left_sheet: Option<String>,
    right_sheet: Option<String>,
    all_rows_schema: bool,
    no_infer_types: bool,
    json: bool,
) -> Result<(), CliError> {
    let left_wb = load(&left, !no_infer_types)?;
    let right_wb = load(&right, !no_infer_types)?;
    let first = pick_sheet(&left_wb, left_sheet.as_deref())?;
    let second = pick_sheet(&right_wb, right_sheet.as_deref())?;

    let (common, left_cols, right_cols) = if all_rows_schema {
        (find_common_columns_all_rows(&first.rows, &second.rows), first.all_columns(), second.all_columns())
    } else {
        (find_common_columns(&first.rows, &second.rows), first.columns(), second.columns())
    };

    if json {
        return print_json(&serde_json::json!({
            "schema": if all_rows_schema { "all_rows" } else { "first_row" },
            "left": { "file": left_wb.file_name, "sheet": first.name, "columns": left_cols },
            "right": { "file": right_wb.file_name, "sheet": second.name, "columns": right_cols },
            "common": common,
        }));
    }

    if common.is_empty() {
        eprintln!("no common columns");
    }
    for column in &common {
        println!("{}", column);
    }
    Ok(())
}
