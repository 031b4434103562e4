use super::cells::{cell_text, coerce_f64, HeaderIndex, ParseDiagnostics};
use super::dates::normalize_date_cell;
use super::workbook::{read_sheets, ParseOutcome, Sheet, SheetFilter};
use crate::api::PipelineError;
use crate::models::TradeEvent;

const DATE: &str = "Date";
const CASH_BALANCE: &str = "cash_balance";
const TOTAL_EQUITY: &str = "total_equity";
const ENTRY_PRICE: &str = "entry_price";
const POSITION_TYPE: &str = "position_type";

const EXPECTED_COLUMNS: [&str; 5] = [DATE, CASH_BALANCE, TOTAL_EQUITY, ENTRY_PRICE, POSITION_TYPE];
const UNKNOWN_POSITION: &str = "Unknown";

/// Parse the first worksheet of a simple equity backtest
pub fn parse_simple_workbook(key: &str, bytes: &[u8]) -> Result<ParseOutcome<TradeEvent>, PipelineError> {
    let sheets = read_sheets(key, bytes, SheetFilter::First)?;
    match sheets.first() {
        Some(sheet) => Ok(parse_simple_sheet(sheet)),
        None => {
            let mut diagnostics = ParseDiagnostics::default();
            diagnostics.missing_sheets.push("<first>".to_string());
            Ok(ParseOutcome { rows: Vec::new(), diagnostics })
        }
    }
}

/// One event per data row, in row order. Missing columns read as 0 or
/// "Unknown"; `capital_change` is the equity delta from the previous row.
pub fn parse_simple_sheet(sheet: &Sheet) -> ParseOutcome<TradeEvent> {
    let mut diagnostics = ParseDiagnostics::default();
    let Some(header) = sheet.header() else {
        return ParseOutcome { rows: Vec::new(), diagnostics };
    };
    let columns = HeaderIndex::from_row(header);
    columns.report_missing(&sheet.name, &EXPECTED_COLUMNS, &mut diagnostics);

    let mut events = Vec::new();
    let mut previous_equity: Option<f64> = None;

    for row in sheet.data_rows() {
        diagnostics.rows_read += 1;

        let date = normalize_date_cell(columns.cell(row, DATE), &mut diagnostics);
        let cash_balance = coerce_f64(columns.cell(row, CASH_BALANCE), &mut diagnostics);
        let total_equity = coerce_f64(columns.cell(row, TOTAL_EQUITY), &mut diagnostics);
        let entry_price = coerce_f64(columns.cell(row, ENTRY_PRICE), &mut diagnostics);
        let position_type = columns
            .cell(row, POSITION_TYPE)
            .map(cell_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| UNKNOWN_POSITION.to_string());

        let capital_change = previous_equity.map(|previous| total_equity - previous);
        previous_equity = Some(total_equity);

        events.push(TradeEvent {
            date: date.text,
            cash_balance,
            total_equity,
            entry_price,
            position_type,
            capital_change,
        });
    }

    ParseOutcome { rows: events, diagnostics }
}
