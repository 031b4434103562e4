use calamine::Data;
use chrono::{DateTime, Utc};

use super::cells::{cell_text, coerce_f64, HeaderIndex, ParseDiagnostics};
use super::dates::normalize_date_cell;
use super::workbook::{find_sheet, read_sheets, ParseOutcome, Sheet, SheetFilter};
use crate::api::PipelineError;
use crate::models::{FilteredSignal, LeverageTradeRecord, DEFAULT_INITIAL_CAPITAL};

pub const TRADES_SHEET: &str = "trades";
pub const FILTERED_SIGNALS_SHEET: &str = "filtered_signals";

const TRADE_COLUMNS: [&str; 17] = [
    "entry_date",
    "exit_date",
    "entry_price",
    "exit_price",
    "entry_fee",
    "exit_fee",
    "exit_type",
    "position_size",
    "leverage",
    "initial_margin",
    "liquidation_price",
    "funding_fees_total",
    "funding_intervals",
    "total_fees",
    "pnl_usdt",
    "pnl_pct",
    "margin_return_pct",
];

const SIGNAL_COLUMNS: [&str; 4] = ["Date", "signal", "p_bad", "pred_remaining"];

/// Parse the `Trades` and `Filtered_Signals` sheets of a leverage backtest.
/// Either sheet may be absent; that half then contributes nothing.
pub fn parse_leverage_workbook(
    key: &str,
    bytes: &[u8],
    initial_capital: Option<f64>,
) -> Result<ParseOutcome<LeverageTradeRecord>, PipelineError> {
    let sheets = read_sheets(
        key,
        bytes,
        SheetFilter::Named(&[TRADES_SHEET, FILTERED_SIGNALS_SHEET]),
    )?;
    Ok(parse_leverage_sheets(
        find_sheet(&sheets, TRADES_SHEET),
        find_sheet(&sheets, FILTERED_SIGNALS_SHEET),
        initial_capital.unwrap_or(DEFAULT_INITIAL_CAPITAL),
    ))
}

/// Trades get a running equity ledger in sheet order, filtered signals become
/// zeroed records, and the combined list is stably sorted by entry date.
/// Rows whose entry date cannot be parsed sort after all dated rows.
pub fn parse_leverage_sheets(
    trades: Option<&Sheet>,
    filtered_signals: Option<&Sheet>,
    initial_capital: f64,
) -> ParseOutcome<LeverageTradeRecord> {
    let mut diagnostics = ParseDiagnostics::default();

    let mut dated: Vec<(Option<DateTime<Utc>>, LeverageTradeRecord)> = match trades {
        Some(sheet) => parse_trade_rows(sheet, initial_capital, &mut diagnostics),
        None => {
            diagnostics.missing_sheets.push(TRADES_SHEET.to_string());
            Vec::new()
        }
    };

    match filtered_signals {
        Some(sheet) => dated.extend(parse_signal_rows(sheet, &mut diagnostics)),
        None => diagnostics.missing_sheets.push(FILTERED_SIGNALS_SHEET.to_string()),
    }

    dated.sort_by_key(|(instant, _)| (instant.is_none(), *instant));

    ParseOutcome {
        rows: dated.into_iter().map(|(_, record)| record).collect(),
        diagnostics,
    }
}

/// `(equity_before, equity_after)` for each P&L increment, starting from
/// `initial_capital` and following the given order
pub fn equity_ledger(initial_capital: f64, pnls: &[f64]) -> Vec<(f64, f64)> {
    pnls.iter()
        .scan(initial_capital, |equity, pnl| {
            let before = *equity;
            *equity = before + pnl;
            Some((before, *equity))
        })
        .collect()
}

fn parse_trade_rows(
    sheet: &Sheet,
    initial_capital: f64,
    diagnostics: &mut ParseDiagnostics,
) -> Vec<(Option<DateTime<Utc>>, LeverageTradeRecord)> {
    let Some(header) = sheet.header() else {
        return Vec::new();
    };
    let columns = HeaderIndex::from_row(header);
    columns.report_missing(&sheet.name, &TRADE_COLUMNS, diagnostics);

    let mut dated = Vec::new();
    for row in sheet.data_rows() {
        diagnostics.rows_read += 1;
        dated.push(map_trade_row(&columns, row, diagnostics));
    }

    let pnls: Vec<f64> = dated.iter().map(|(_, record)| record.pnl_usdt).collect();
    for ((_, record), (before, after)) in dated.iter_mut().zip(equity_ledger(initial_capital, &pnls)) {
        record.equity_before = before;
        record.equity_after = after;
    }

    dated
}

fn map_trade_row(
    columns: &HeaderIndex,
    row: &[Data],
    diagnostics: &mut ParseDiagnostics,
) -> (Option<DateTime<Utc>>, LeverageTradeRecord) {
    let entry_date = normalize_date_cell(columns.cell(row, "entry_date"), diagnostics);
    let exit_date = normalize_date_cell(columns.cell(row, "exit_date"), diagnostics);
    let exit_type = columns.cell(row, "exit_type").map(cell_text).unwrap_or_default();
    let mut number = |name: &str| coerce_f64(columns.cell(row, name), diagnostics);

    let record = LeverageTradeRecord {
        entry_date: entry_date.text,
        exit_date: exit_date.text,
        entry_price: number("entry_price"),
        exit_price: number("exit_price"),
        entry_fee: number("entry_fee"),
        exit_fee: number("exit_fee"),
        exit_type,
        position_size: number("position_size"),
        leverage: number("leverage"),
        initial_margin: number("initial_margin"),
        liquidation_price: number("liquidation_price"),
        funding_fees_total: number("funding_fees_total"),
        funding_intervals: number("funding_intervals"),
        total_fees: number("total_fees"),
        pnl_usdt: number("pnl_usdt"),
        pnl_pct: number("pnl_pct"),
        margin_return_pct: number("margin_return_pct"),
        equity_before: 0.0,
        equity_after: 0.0,
        is_filtered: false,
        signal: None,
    };

    (entry_date.instant, record)
}

fn parse_signal_rows(
    sheet: &Sheet,
    diagnostics: &mut ParseDiagnostics,
) -> Vec<(Option<DateTime<Utc>>, LeverageTradeRecord)> {
    let Some(header) = sheet.header() else {
        return Vec::new();
    };
    let columns = HeaderIndex::from_row(header);
    columns.report_missing(&sheet.name, &SIGNAL_COLUMNS, diagnostics);

    let mut dated = Vec::new();
    for row in sheet.data_rows() {
        diagnostics.rows_read += 1;
        let date = normalize_date_cell(columns.cell(row, "Date"), diagnostics);
        let signal = FilteredSignal {
            signal: columns.cell(row, "signal").map(cell_text).unwrap_or_default(),
            p_bad: coerce_f64(columns.cell(row, "p_bad"), diagnostics),
            pred_remaining: coerce_f64(columns.cell(row, "pred_remaining"), diagnostics),
        };
        dated.push((date.instant, LeverageTradeRecord::filtered(date.text, signal)));
    }
    dated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::workbook::test_support::{xlsx_bytes, Cell};

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn trades_sheet(rows: &[(&str, f64)]) -> Sheet {
        let mut all = vec![vec![
            text("entry_date"),
            text("exit_date"),
            text("exit_type"),
            text("leverage"),
            text("total_fees"),
            text("pnl_usdt"),
        ]];
        for (date, pnl) in rows {
            all.push(vec![
                text(date),
                text(date),
                text("tp"),
                Data::Float(5.0),
                Data::Float(1.5),
                Data::Float(*pnl),
            ]);
        }
        Sheet::new("Trades", all)
    }

    #[test]
    fn test_equity_ledger_threads_running_total() {
        assert_eq!(
            equity_ledger(1_000.0, &[50.0, -20.0, 30.0]),
            vec![(1_000.0, 1_050.0), (1_050.0, 1_030.0), (1_030.0, 1_060.0)]
        );
        assert!(equity_ledger(1_000.0, &[]).is_empty());
    }

    #[test]
    fn test_running_equity_from_initial_capital() {
        let sheet = trades_sheet(&[
            ("2024-01-01 00:00:00", 50.0),
            ("2024-01-02 00:00:00", -20.0),
            ("2024-01-03 00:00:00", 30.0),
        ]);
        let outcome = parse_leverage_sheets(Some(&sheet), None, 1_000.0);
        let after: Vec<f64> = outcome.rows.iter().map(|r| r.equity_after).collect();
        assert_eq!(after, vec![1_050.0, 1_030.0, 1_060.0]);
        assert_eq!(outcome.rows.first().unwrap().equity_before, 1_000.0);
        assert_eq!(outcome.rows.last().unwrap().equity_after, 1_060.0);
        assert_eq!(outcome.rows[0].exit_type, "tp");
        assert_eq!(outcome.rows[0].leverage, 5.0);
        assert_eq!(outcome.diagnostics.missing_sheets, vec!["filtered_signals"]);
    }

    #[test]
    fn test_ledger_follows_sheet_order_not_date_order() {
        let sheet = trades_sheet(&[
            ("2024-01-05 00:00:00", 50.0),
            ("2024-01-01 00:00:00", -20.0),
        ]);
        let outcome = parse_leverage_sheets(Some(&sheet), None, 1_000.0);
        // Sorted by date for output, but the ledger was built in row order
        assert_eq!(outcome.rows[0].entry_date, "2024-01-01T00:00:00.000Z");
        assert_eq!(outcome.rows[0].equity_before, 1_050.0);
        assert_eq!(outcome.rows[0].equity_after, 1_030.0);
        assert_eq!(outcome.rows[1].equity_before, 1_000.0);
    }

    #[test]
    fn test_filtered_signals_are_merged_by_date() {
        let trades = trades_sheet(&[
            ("2024-01-01 00:00:00", 10.0),
            ("2024-01-03 00:00:00", 10.0),
        ]);
        let signals = Sheet::new(
            "Filtered_Signals",
            vec![
                vec![text("Date"), text("signal"), text("p_bad"), text("pred_remaining")],
                vec![text("2024-01-02 00:00:00"), text("LONG"), Data::Float(0.91), Data::Float(3.0)],
            ],
        );
        let outcome = parse_leverage_sheets(Some(&trades), Some(&signals), 100_000.0);
        let flags: Vec<bool> = outcome.rows.iter().map(|r| r.is_filtered).collect();
        assert_eq!(flags, vec![false, true, false]);

        let filtered = &outcome.rows[1];
        assert_eq!(filtered.exit_type, "filtered");
        assert_eq!(filtered.exit_date, "");
        assert_eq!(filtered.pnl_usdt, 0.0);
        let signal = filtered.signal.as_ref().unwrap();
        assert_eq!(signal.signal, "LONG");
        assert_eq!(signal.p_bad, 0.91);
    }

    #[test]
    fn test_equal_dates_keep_input_order() {
        let trades = trades_sheet(&[("2024-01-01 00:00:00", 10.0)]);
        let signals = Sheet::new(
            "Filtered_Signals",
            vec![
                vec![text("Date"), text("signal"), text("p_bad"), text("pred_remaining")],
                vec![text("2024-01-01 00:00:00"), text("SHORT"), Data::Float(0.5), Data::Float(1.0)],
            ],
        );
        let outcome = parse_leverage_sheets(Some(&trades), Some(&signals), 1_000.0);
        assert!(!outcome.rows[0].is_filtered);
        assert!(outcome.rows[1].is_filtered);
    }

    #[test]
    fn test_undated_rows_sort_last() {
        let sheet = trades_sheet(&[("garbage", 5.0), ("2024-01-01 00:00:00", 10.0)]);
        let outcome = parse_leverage_sheets(Some(&sheet), None, 1_000.0);
        assert_eq!(outcome.rows[0].entry_date, "2024-01-01T00:00:00.000Z");
        assert_eq!(outcome.rows[1].entry_date, "garbage");
        assert_eq!(outcome.diagnostics.unparsable_dates, 2);
    }

    #[test]
    fn test_missing_sheets_yield_empty_result() {
        let outcome = parse_leverage_sheets(None, None, 1_000.0);
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.diagnostics.missing_sheets, vec!["trades", "filtered_signals"]);
    }

    #[test]
    fn test_default_initial_capital() {
        let bytes = xlsx_bytes(&[(
            "Trades",
            vec![
                vec![Cell::Text("entry_date"), Cell::Text("pnl_usdt"), Cell::Text("total_fees")],
                vec![Cell::Text("2024-02-01 00:00:00"), Cell::Number(250.0), Cell::Text("N/A")],
            ],
        )]);
        let outcome = parse_leverage_workbook("BTC-USD_5x_2024feb.xlsx", &bytes, None).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].equity_before, 100_000.0);
        assert_eq!(outcome.rows[0].equity_after, 100_250.0);
        assert_eq!(outcome.rows[0].total_fees, 0.0);
        assert_eq!(outcome.diagnostics.numeric_coercions, 1);
    }
}
