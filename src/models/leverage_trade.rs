use serde::{Deserialize, Serialize};

pub const FILTERED_EXIT_TYPE: &str = "filtered";

/// Model outputs kept from a `Filtered_Signals` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredSignal {
    pub signal: String,
    pub p_bad: f64,
    pub pred_remaining: f64,
}

/// One executed trade or one filtered signal from a leverage backtest workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageTradeRecord {
    pub entry_date: String,
    pub exit_date: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_fee: f64,
    pub exit_fee: f64,
    pub exit_type: String,
    pub position_size: f64,
    pub leverage: f64,
    pub initial_margin: f64,
    pub liquidation_price: f64,
    pub funding_fees_total: f64,
    pub funding_intervals: f64,
    pub total_fees: f64,
    pub pnl_usdt: f64,
    pub pnl_pct: f64,
    pub margin_return_pct: f64,
    pub equity_before: f64,
    pub equity_after: f64,
    pub is_filtered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<FilteredSignal>,
}

impl LeverageTradeRecord {
    /// Zero-valued record standing in for a signal the strategy chose not to take
    pub fn filtered(entry_date: String, signal: FilteredSignal) -> Self {
        Self {
            entry_date,
            exit_date: String::new(),
            entry_price: 0.0,
            exit_price: 0.0,
            entry_fee: 0.0,
            exit_fee: 0.0,
            exit_type: FILTERED_EXIT_TYPE.to_string(),
            position_size: 0.0,
            leverage: 0.0,
            initial_margin: 0.0,
            liquidation_price: 0.0,
            funding_fees_total: 0.0,
            funding_intervals: 0.0,
            total_fees: 0.0,
            pnl_usdt: 0.0,
            pnl_pct: 0.0,
            margin_return_pct: 0.0,
            equity_before: 0.0,
            equity_after: 0.0,
            is_filtered: true,
            signal: Some(signal),
        }
    }
}
