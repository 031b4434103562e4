use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use super::backtests::{LeverageBacktest, SimpleBacktest};
use crate::api::{PipelineError, QuoteCache, QuoteSource};
use crate::models::PerformanceStats;

/// One line of the instrument comparison table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    pub symbol: String,
    pub leverage: Option<u32>,
    pub key: String,
    pub stats: PerformanceStats,
    /// Spot price at render time, if quotes were requested and available
    pub last_price: Option<f64>,
}

/// A backtest that can be shown as a comparison row
pub trait ComparisonSource {
    fn comparison_row(&self, label: &str) -> ComparisonRow;
}

impl ComparisonSource for SimpleBacktest {
    fn comparison_row(&self, label: &str) -> ComparisonRow {
        ComparisonRow {
            label: label.to_string(),
            symbol: self.symbol.clone(),
            leverage: None,
            key: self.key.clone(),
            stats: self.stats.clone(),
            last_price: None,
        }
    }
}

impl ComparisonSource for LeverageBacktest {
    fn comparison_row(&self, label: &str) -> ComparisonRow {
        ComparisonRow {
            label: label.to_string(),
            symbol: self.symbol.clone(),
            leverage: Some(self.leverage),
            key: self.key.clone(),
            stats: self.stats.clone(),
            last_price: None,
        }
    }
}

/// Flatten a report into rows ordered by label. With a quote cache, each row
/// gets the current spot price of its symbol; a failed quote leaves the
/// price empty and is logged.
pub async fn build_comparison_table<B, S>(
    report: &BTreeMap<String, B>,
    quotes: Option<&QuoteCache<S>>,
) -> Vec<ComparisonRow>
where
    B: ComparisonSource,
    S: QuoteSource,
{
    let mut rows: Vec<ComparisonRow> = report
        .iter()
        .map(|(label, backtest)| backtest.comparison_row(label))
        .collect();

    let Some(cache) = quotes else {
        return rows;
    };

    let mut symbols: Vec<&str> = rows.iter().map(|row| row.symbol.as_str()).collect();
    symbols.sort_unstable();
    symbols.dedup();

    let results = join_all(symbols.iter().map(|symbol| cache.get(symbol))).await;
    let prices: HashMap<String, f64> = symbols
        .iter()
        .zip(results)
        .filter_map(|(symbol, result)| match result {
            Ok(quote) => Some((symbol.to_string(), quote.price)),
            Err(e) => {
                log::warn!("No quote for {}: {}", symbol, e);
                None
            }
        })
        .collect();

    for row in &mut rows {
        row.last_price = prices.get(&row.symbol).copied();
    }
    rows
}

const CSV_HEADER: [&str; 16] = [
    "label",
    "symbol",
    "leverage",
    "key",
    "num_trades",
    "win_trades_count",
    "loss_trades_count",
    "neutral_trades_count",
    "win_trades_pct",
    "loss_trades_pct",
    "profitable_trades_pct",
    "capital_change_pct",
    "capital_change_pct_raw",
    "total_gain",
    "total_fees",
    "avg_leverage",
];

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write rows as CSV with a header line. `last_price` is appended as the
/// final column.
pub fn write_comparison_csv<W: Write>(rows: &[ComparisonRow], writer: W) -> Result<(), PipelineError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = CSV_HEADER.to_vec();
    header.push("last_price");
    csv_writer.write_record(&header)?;

    for row in rows {
        let stats = &row.stats;
        csv_writer.write_record([
            row.label.clone(),
            row.symbol.clone(),
            optional(row.leverage),
            row.key.clone(),
            stats.num_trades.to_string(),
            stats.win_trades_count.to_string(),
            stats.loss_trades_count.to_string(),
            stats.neutral_trades_count.to_string(),
            stats.win_trades_pct.to_string(),
            stats.loss_trades_pct.to_string(),
            stats.profitable_trades_pct.to_string(),
            stats.capital_change_pct.to_string(),
            stats.capital_change_pct_raw.to_string(),
            stats.total_gain.to_string(),
            stats.total_fees.to_string(),
            stats.avg_leverage.to_string(),
            optional(row.last_price),
        ])?;
    }

    csv_writer
        .flush()
        .map_err(|e| PipelineError::ExportError(format!("Failed to flush CSV: {}", e)))?;
    Ok(())
}
