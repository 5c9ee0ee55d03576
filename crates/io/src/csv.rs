// CSV/TSV import

use std::io::Read;
use std::path::Path;

use sheetrecon_recon::{Dataset, Value, Workbook};

use crate::table::{infer_value, rows_from_grid};
use crate::IoError;

/// Import a delimited file as a single-sheet workbook named after the file stem.
///
/// With `delimiter = None` the delimiter is sniffed from the first lines.
pub fn import(path: &Path, delimiter: Option<u8>, infer_types: bool) -> Result<Workbook, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    log::debug!("{}: delimiter {:?}", path.display(), delimiter as char);

    let dataset = import_from_string(&content, delimiter, infer_types, crate::stem_name(path))?;
    Ok(Workbook::new(crate::display_name(path), vec![dataset]))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Header line must split
        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read {
        path: path.display().to_string(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            // Excel-exported CSVs are often Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::debug!("{}: not UTF-8, decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(content: &str, delimiter: u8, infer_types: bool, name: String) -> Result<Dataset, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        // Only data cells get typed; the header stays text.
        let typed = infer_types && !grid.is_empty();
        let cells: Vec<Value> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Value::Empty
                } else if typed {
                    infer_value(field)
                } else {
                    Value::Text(field.to_string())
                }
            })
            .collect();
        if grid.is_empty() && cells.iter().all(Value::is_empty) {
            log::trace!("skipping blank line {} before header", line + 1);
            continue;
        }
        grid.push(cells);
    }

    Ok(Dataset::new(name, rows_from_grid(grid)))
}
