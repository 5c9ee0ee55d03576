// Grid → rows: the first non-empty line is the header, every later line
// becomes one Row keyed by header name.

use std::collections::HashSet;

use sheetrecon_recon::{Row, Value};

/// Header names for blank header cells: `__EMPTY`, `__EMPTY_1`, ...
const BLANK_HEADER: &str = "__EMPTY";

/// Turn header cells into unique column names.
///
/// Blank cells get `__EMPTY`-style names; a repeated name gets `_1`, `_2`, ...
pub fn header_names(cells: &[Value]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut blanks = 0usize;
    let mut names = Vec::with_capacity(cells.len());

    for cell in cells {
        let text = cell.to_string();
        let base = if text.trim().is_empty() {
            let name = if blanks == 0 {
                BLANK_HEADER.to_string()
            } else {
                format!("{BLANK_HEADER}_{blanks}")
            };
            blanks += 1;
            name
        } else {
            text
        };

        let mut name = base.clone();
        let mut n = 1;
        while used.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        used.insert(name.clone());
        names.push(name);
    }

    names
}

/// Convert a grid of cells into rows. Empty cells are left out of each row
/// and lines without any value are skipped.
pub fn rows_from_grid<I>(lines: I) -> Vec<Row>
where
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut lines = lines.into_iter().filter(|line| line.iter().any(|v| !v.is_empty()));

    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let mut columns = header_names(&header);

    let mut rows = Vec::new();
    for line in lines {
        // Cells past the header width still need a name.
        if line.len() > columns.len() {
            let mut widened = header.clone();
            widened.resize(line.len(), Value::Empty);
            columns = header_names(&widened);
        }

        let row: Row = line
            .into_iter()
            .zip(columns.iter())
            .filter(|(value, _)| !value.is_empty())
            .map(|(value, name)| (name.clone(), value))
            .collect();
        rows.push(row);
    }

    rows
}

/// Type a delimited-text field: `true`/`false` and plain decimal numbers.
pub fn infer_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Empty;
    }
    match field {
        "true" | "TRUE" | "True" => return Value::Bool(true),
        "false" | "FALSE" | "False" => return Value::Bool(false),
        _ => {}
    }
    if looks_numeric(field) {
        // Overflowing numerals stay text
        if let Ok(n) = field.trim().parse::<f64>() {
            if n.is_finite() {
                return Value::Number(n);
            }
        }
    }
    Value::Text(field.to_string())
}

fn looks_numeric(field: &str) -> bool {
    let s = field.trim();
    let digits = s.bytes().filter(u8::is_ascii_digit).count();
    digits > 0
        && s.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && !s.starts_with(['e', 'E'])
}
