use serde::{Deserialize, Serialize};

/// Aggregate performance over a pair sequence or a leverage trade sequence.
///
/// Percentages are on a 0-100 scale. `total_fees` and `avg_leverage` are only
/// populated for leverage backtests and stay at 0 for pair-based stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub num_trades: usize,
    pub win_trades_count: usize,
    pub loss_trades_count: usize,
    pub neutral_trades_count: usize,
    pub win_trades_pct: f64,
    pub loss_trades_pct: f64,
    pub profitable_trades_pct: f64,
    /// Display value; clamped to 0..=100 for pair-based stats
    pub capital_change_pct: f64,
    pub capital_change_pct_raw: f64,
    pub total_gain: f64,
    pub total_fees: f64,
    pub avg_leverage: f64,
}

impl PerformanceStats {
    /// Result for an input with no usable rows
    pub fn empty() -> Self {
        Self {
            num_trades: 0,
            win_trades_count: 0,
            loss_trades_count: 0,
            neutral_trades_count: 0,
            win_trades_pct: 0.0,
            loss_trades_pct: 0.0,
            profitable_trades_pct: 0.0,
            capital_change_pct: 0.0,
            capital_change_pct_raw: 0.0,
            total_gain: 0.0,
            total_fees: 0.0,
            avg_leverage: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_trades == 0
    }
}

impl Default for PerformanceStats {
    fn default() -> Self {
        Self::empty()
    }
}
