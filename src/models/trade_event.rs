use serde::{Deserialize, Serialize};

/// One row of a simple equity backtest sheet, in sheet row order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// UTC ISO-8601 timestamp, or the raw cell text when it could not be parsed
    pub date: String,
    pub cash_balance: f64,
    pub total_equity: f64,
    pub entry_price: f64,
    pub position_type: String,
    /// `total_equity` delta from the previous event; `None` for the first event
    pub capital_change: Option<f64>,
}

impl TradeEvent {
    /// Events usable for pairing: a non-empty date and a finite equity value
    pub fn is_valid(&self) -> bool {
        !self.date.is_empty() && self.total_equity.is_finite()
    }
}

/// Two consecutive valid events treated as one open/close round trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePair {
    pub first_trade: TradeEvent,
    pub second_trade: TradeEvent,
    pub total_change: f64,
}

impl TradePair {
    pub fn new(first_trade: TradeEvent, second_trade: TradeEvent) -> Self {
        let total_change = second_trade.total_equity - first_trade.total_equity;
        Self {
            first_trade,
            second_trade,
            total_change,
        }
    }
}
