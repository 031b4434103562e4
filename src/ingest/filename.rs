use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Period, StorageObjectKey};

static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{3})-USD").expect("valid symbol pattern"));
static LEVERAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([0-9]+)x_").expect("valid leverage pattern"));
static MONTH_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]{4})(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)")
        .expect("valid period pattern")
});
static LEGACY_PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{8})-([0-9]{6})").expect("valid legacy period pattern"));

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Why a key cannot take part in canonical selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRejection {
    MissingSymbol,
    MissingLeverage,
    MissingPeriod,
}

impl std::fmt::Display for KeyRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            KeyRejection::MissingSymbol => "no <SYM>-USD prefix",
            KeyRejection::MissingLeverage => "no _<n>x_ leverage marker",
            KeyRejection::MissingPeriod => "no recognizable period",
        };
        f.write_str(reason)
    }
}

/// Last path segment of a storage key
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// "BTC-USD_4h_2024jan.xlsx" → "BTC". The symbol must be uppercase.
pub fn parse_symbol(filename: &str) -> Option<String> {
    SYMBOL_RE
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// "BTC-USD_5x_2024jan.xlsx" → 5. Zero leverage is not a valid multiplier.
pub fn parse_leverage(filename: &str) -> Option<u32> {
    LEVERAGE_RE
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|leverage| *leverage > 0)
}

/// Monthly pattern first (`2025dec`), then the legacy `YYYYMMDD-HHMMSS` stamp
pub fn parse_period(filename: &str) -> Option<Period> {
    parse_monthly_period(filename).or_else(|| parse_legacy_period(filename))
}

fn parse_monthly_period(filename: &str) -> Option<Period> {
    let caps = MONTH_PERIOD_RE.captures(filename)?;
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month_name = caps.get(2)?.as_str().to_lowercase();
    let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
    Some(Period::monthly(year, month))
}

fn parse_legacy_period(filename: &str) -> Option<Period> {
    let caps = LEGACY_PERIOD_RE.captures(filename)?;
    let date = caps.get(1)?.as_str();
    let time = caps.get(2)?.as_str();
    let year = date.get(0..4)?.parse::<i32>().ok()?;
    let month = date.get(4..6)?.parse::<u32>().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    let day = date.get(6..8)?.parse::<u64>().ok()?;
    let hms = time.parse::<u64>().ok()?;
    Some(Period::legacy(year, month, day * 1_000_000 + hms))
}

/// Decompose a storage key. `require_leverage` is set for the leverage
/// pipeline, where a key without a multiplier cannot be grouped.
pub fn parse_storage_key(
    key: &str,
    require_leverage: bool,
) -> Result<StorageObjectKey, KeyRejection> {
    let filename = basename(key);
    let symbol = parse_symbol(filename).ok_or(KeyRejection::MissingSymbol)?;
    let leverage = parse_leverage(filename);
    if require_leverage && leverage.is_none() {
        return Err(KeyRejection::MissingLeverage);
    }
    let period = parse_period(filename).ok_or(KeyRejection::MissingPeriod)?;

    Ok(StorageObjectKey {
        key: key.to_string(),
        filename: filename.to_string(),
        symbol,
        leverage,
        period,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_monthly_key() {
        let parsed = parse_storage_key("backtests/BTC-USD_4h_2024jan.xlsx", false).unwrap();
        assert_eq!(parsed.symbol, "BTC");
        assert_eq!(parsed.filename, "BTC-USD_4h_2024jan.xlsx");
        assert_eq!(parsed.leverage, None);
        assert_eq!((parsed.period.year, parsed.period.month), (2024, 1));
        assert!(!parsed.period.legacy);
    }

    #[test]
    fn test_month_is_case_insensitive() {
        let period = parse_period("ETH-USD_1d_2025DEC.xlsx").unwrap();
        assert_eq!((period.year, period.month), (2025, 12));
        let period = parse_period("ETH-USD_1d_2023Sep.xlsx").unwrap();
        assert_eq!((period.year, period.month), (2023, 9));
    }

    #[test]
    fn test_parse_legacy_key() {
        let period = parse_period("SOL-USD_20240315-123000.xlsx").unwrap();
        assert!(period.legacy);
        assert_eq!((period.year, period.month), (2024, 3));
        assert_eq!(period.detail, 15_123000);
    }

    #[test]
    fn test_monthly_pattern_wins_over_legacy() {
        let period = parse_period("BTC-USD_2024feb_20230101-000000.xlsx").unwrap();
        assert!(!period.legacy);
        assert_eq!((period.year, period.month), (2024, 2));
    }

    #[test]
    fn test_parse_leverage() {
        assert_eq!(parse_leverage("BTC-USD_5x_2024jan.xlsx"), Some(5));
        assert_eq!(parse_leverage("BTC-USD_125x_2024jan.xlsx"), Some(125));
        assert_eq!(parse_leverage("BTC-USD_0x_2024jan.xlsx"), None);
        assert_eq!(parse_leverage("BTC-USD_4h_2024jan.xlsx"), None);
    }

    #[test]
    fn test_lowercase_symbol_is_unselectable() {
        assert_eq!(
            parse_storage_key("btc-USD_2024jan.xlsx", false),
            Err(KeyRejection::MissingSymbol)
        );
    }

    #[test]
    fn test_missing_leverage_only_matters_when_required() {
        assert!(parse_storage_key("BTC-USD_2024jan.xlsx", false).is_ok());
        assert_eq!(
            parse_storage_key("BTC-USD_2024jan.xlsx", true),
            Err(KeyRejection::MissingLeverage)
        );
    }

    #[test]
    fn test_missing_period_is_unselectable() {
        assert_eq!(
            parse_storage_key("BTC-USD_latest.xlsx", false),
            Err(KeyRejection::MissingPeriod)
        );
        assert_eq!(parse_period("BTC-USD_20241315-000000.xlsx"), None);
    }

    #[test]
    fn test_non_ascii_digits_are_unselectable() {
        assert_eq!(parse_period("BTC-USD_1\u{662}\u{662}\u{662}\u{662}\u{662}\u{662}\u{662}-123000.xlsx"), None);
        assert_eq!(parse_leverage("BTC-USD_\u{665}x_2024jan.xlsx"), None);

        let selected = crate::ingest::select(
            &[
                "BTC-USD_2024jan.xlsx".to_string(),
                "BTC-USD_1\u{662}\u{662}\u{662}\u{662}\u{662}\u{662}\u{662}-123000.xlsx".to_string(),
            ],
            crate::ingest::GroupBy::Symbol,
        );
        assert_eq!(selected, vec!["BTC-USD_2024jan.xlsx"]);
    }

    #[test]
    fn test_malformed_month_token_falls_back_to_legacy_stamp() {
        let period = parse_period("BTC-USD_\u{662}\u{660}\u{662}\u{664}jan_20240315-120000.xlsx").unwrap();
        assert!(period.legacy);
        assert_eq!((period.year, period.month), (2024, 3));
        assert_eq!(period.detail, 15_120000);

        let newer = "BTC-USD_\u{662}\u{660}\u{662}\u{664}jan_20240315-120000.xlsx".to_string();
        let selected = crate::ingest::select(
            &["BTC-USD_20231201-090000.xlsx".to_string(), newer.clone()],
            crate::ingest::GroupBy::Symbol,
        );
        assert_eq!(selected, vec![newer]);
    }

    #[test]
    fn test_symbol_is_matched_on_basename() {
        let parsed = parse_storage_key("ETH-USD/backtests/XRP-USD_2024mar.xlsx", false).unwrap();
        assert_eq!(parsed.symbol, "XRP");
    }
}
