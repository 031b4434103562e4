use calamine::Data;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

// Leading float in a string, e.g. "1645.2 USDT" or "-3e2x"
static LEADING_FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][-+]?[0-9]+)?").expect("valid float pattern")
});

/// Soft-failure counters collected while parsing one workbook.
///
/// Nothing recorded here aborts a parse; callers that want stricter handling
/// can inspect the counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseDiagnostics {
    pub rows_read: usize,
    /// Numeric cells whose content could not be read as a number and became 0
    pub numeric_coercions: usize,
    /// Numeric cells that were blank and became 0
    pub empty_numeric_cells: usize,
    /// Date cells passed through as raw text
    pub unparsable_dates: usize,
    pub missing_columns: Vec<String>,
    pub missing_sheets: Vec<String>,
}

impl ParseDiagnostics {
    pub fn has_issues(&self) -> bool {
        self.numeric_coercions > 0
            || self.unparsable_dates > 0
            || !self.missing_columns.is_empty()
            || !self.missing_sheets.is_empty()
    }

    pub fn merge(&mut self, other: ParseDiagnostics) {
        self.rows_read += other.rows_read;
        self.numeric_coercions += other.numeric_coercions;
        self.empty_numeric_cells += other.empty_numeric_cells;
        self.unparsable_dates += other.unparsable_dates;
        self.missing_columns.extend(other.missing_columns);
        self.missing_sheets.extend(other.missing_sheets);
    }

    pub fn note_missing_column(&mut self, sheet: &str, column: &str) {
        self.missing_columns.push(format!("{}.{}", sheet, column));
    }
}

/// Extract a string from a calamine Data cell
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Numeric cells pass through, anything else goes through a lenient float
/// parse of its text, and whatever still fails becomes 0.
pub fn coerce_f64(cell: Option<&Data>, diagnostics: &mut ParseDiagnostics) -> f64 {
    let value = match cell {
        None | Some(Data::Empty) => {
            diagnostics.empty_numeric_cells += 1;
            return 0.0;
        }
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::DateTime(dt)) => Some(dt.as_f64()),
        Some(other) => parse_float_prefix(&cell_text(other)),
    };

    match value {
        Some(v) if v.is_finite() => v,
        _ => {
            diagnostics.numeric_coercions += 1;
            0.0
        }
    }
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(v) = text.parse::<f64>() {
        return Some(v);
    }
    LEADING_FLOAT_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Column positions resolved from a header row, matched case-insensitively
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_row(row: &[Data]) -> Self {
        let mut columns = HashMap::new();
        for (idx, cell) in row.iter().enumerate() {
            let name = normalize_header(&cell_text(cell));
            if !name.is_empty() {
                // First occurrence wins on duplicate headers
                columns.entry(name).or_insert(idx);
            }
        }
        Self { columns }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.get(&normalize_header(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn cell<'a>(&self, row: &'a [Data], name: &str) -> Option<&'a Data> {
        self.position(name).and_then(|idx| row.get(idx))
    }

    /// Record every expected column absent from this header row
    pub fn report_missing(&self, sheet: &str, expected: &[&str], diagnostics: &mut ParseDiagnostics) {
        for column in expected {
            if !self.contains(column) {
                diagnostics.note_missing_column(sheet, column);
            }
        }
    }
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}
