use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Backtest period embedded in a filename.
///
/// Monthly keys (`2025dec`) carry only year and month. Legacy keys
/// (`20240315-120000`) also carry day and time, packed into `detail` as
/// `DDHHMMSS` so that two legacy keys from the same month still order by
/// their full timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
    pub detail: u64,
    pub legacy: bool,
}

impl Period {
    pub fn monthly(year: i32, month: u32) -> Self {
        Self { year, month, detail: 0, legacy: false }
    }

    pub fn legacy(year: i32, month: u32, detail: u64) -> Self {
        Self { year, month, detail, legacy: true }
    }

    fn ordering_key(&self) -> (i32, u32, u64) {
        (self.year, self.month, self.detail)
    }
}

impl PartialEq for Period {
    fn eq(&self, other: &Self) -> bool {
        self.ordering_key() == other.ordering_key()
    }
}

impl Eq for Period {}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_key().cmp(&other.ordering_key())
    }
}

/// A storage key decomposed into the parts that drive canonical selection.
/// Derived from the key text only; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObjectKey {
    pub key: String,
    pub filename: String,
    pub symbol: String,
    pub leverage: Option<u32>,
    pub period: Period,
}

/// Grouping key used by the selector: per symbol, or per symbol and leverage
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstrumentKey {
    pub symbol: String,
    pub leverage: Option<u32>,
}

impl InstrumentKey {
    pub fn of(key: &StorageObjectKey, by_leverage: bool) -> Self {
        Self {
            symbol: key.symbol.clone(),
            leverage: if by_leverage { key.leverage } else { None },
        }
    }
}

impl std::fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.leverage {
            Some(leverage) => write!(f, "{}-{}x", self.symbol, leverage),
            None => write!(f, "{}", self.symbol),
        }
    }
}
