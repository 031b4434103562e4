use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::cells::ParseDiagnostics;
use super::{leverage, simple};
use crate::api::PipelineError;
use crate::models::{LeverageTradeRecord, TradeEvent};

/// One worksheet as plain rows; the first row is the header
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Data>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Data>>) -> Self {
        Self { name: name.into(), rows }
    }

    pub fn header(&self) -> Option<&[Data]> {
        self.rows.first().map(|row| row.as_slice())
    }

    /// Rows after the header, skipping rows where every cell is blank
    pub fn data_rows(&self) -> impl Iterator<Item = &[Data]> {
        self.rows
            .iter()
            .skip(1)
            .map(|row| row.as_slice())
            .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
    }
}

/// Which worksheets to materialise from a workbook
#[derive(Debug, Clone, Copy)]
pub enum SheetFilter<'a> {
    First,
    /// Matched case-insensitively; absent names are simply not returned
    Named(&'a [&'a str]),
}

/// Read the requested worksheets out of raw xlsx bytes. A workbook that
/// cannot be opened at all is a hard failure attributed to `key`.
pub fn read_sheets(key: &str, bytes: &[u8], filter: SheetFilter<'_>) -> Result<Vec<Sheet>, PipelineError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| {
        PipelineError::WorkbookError {
            key: key.to_string(),
            message: format!("Failed to open xlsx: {}", e),
        }
    })?;

    let names = workbook.sheet_names();
    let wanted: Vec<String> = match filter {
        SheetFilter::First => names.into_iter().take(1).collect(),
        SheetFilter::Named(targets) => names
            .into_iter()
            .filter(|name| targets.iter().any(|t| t.eq_ignore_ascii_case(name.trim())))
            .collect(),
    };

    let mut sheets = Vec::with_capacity(wanted.len());
    for name in wanted {
        let range = workbook.worksheet_range(&name).map_err(|e| PipelineError::WorkbookError {
            key: key.to_string(),
            message: format!("Failed to read sheet '{}': {}", name, e),
        })?;
        let rows = range.rows().map(|row| row.to_vec()).collect();
        sheets.push(Sheet::new(name, rows));
    }

    Ok(sheets)
}

/// Find a sheet by name, ignoring case
pub fn find_sheet<'a>(sheets: &'a [Sheet], name: &str) -> Option<&'a Sheet> {
    sheets.iter().find(|s| s.name.trim().eq_ignore_ascii_case(name))
}

/// Parsed rows together with the soft failures met on the way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome<T> {
    pub rows: Vec<T>,
    pub diagnostics: ParseDiagnostics,
}

/// Spreadsheet schema, chosen by the caller from context rather than sniffed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestKind {
    Simple,
    Leverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedBacktest {
    Simple(ParseOutcome<TradeEvent>),
    Leverage(ParseOutcome<LeverageTradeRecord>),
}

impl ParsedBacktest {
    pub fn kind(&self) -> BacktestKind {
        match self {
            ParsedBacktest::Simple(_) => BacktestKind::Simple,
            ParsedBacktest::Leverage(_) => BacktestKind::Leverage,
        }
    }

    pub fn diagnostics(&self) -> &ParseDiagnostics {
        match self {
            ParsedBacktest::Simple(outcome) => &outcome.diagnostics,
            ParsedBacktest::Leverage(outcome) => &outcome.diagnostics,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ParsedBacktest::Simple(outcome) => outcome.rows.len(),
            ParsedBacktest::Leverage(outcome) => outcome.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_simple(self) -> Option<ParseOutcome<TradeEvent>> {
        match self {
            ParsedBacktest::Simple(outcome) => Some(outcome),
            ParsedBacktest::Leverage(_) => None,
        }
    }

    pub fn into_leverage(self) -> Option<ParseOutcome<LeverageTradeRecord>> {
        match self {
            ParsedBacktest::Leverage(outcome) => Some(outcome),
            ParsedBacktest::Simple(_) => None,
        }
    }
}

/// Parse workbook bytes with the schema named by `kind`.
/// `initial_capital` seeds the leverage equity ledger and is ignored otherwise.
pub fn parse_workbook(
    kind: BacktestKind,
    key: &str,
    bytes: &[u8],
    initial_capital: Option<f64>,
) -> Result<ParsedBacktest, PipelineError> {
    let parsed = match kind {
        BacktestKind::Simple => ParsedBacktest::Simple(simple::parse_simple_workbook(key, bytes)?),
        BacktestKind::Leverage => ParsedBacktest::Leverage(leverage::parse_leverage_workbook(
            key,
            bytes,
            initial_capital,
        )?),
    };

    let diagnostics = parsed.diagnostics();
    if diagnostics.has_issues() {
        log::warn!(
            "{}: {} numeric cell(s) coerced to 0, {} unparsable date(s), missing columns {:?}, missing sheets {:?}",
            key,
            diagnostics.numeric_coercions,
            diagnostics.unparsable_dates,
            diagnostics.missing_columns,
            diagnostics.missing_sheets
        );
    }

    Ok(parsed)
}
