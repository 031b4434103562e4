use futures::future::try_join_all;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::analytics::{display_label, pair_stats, pair_trades, record_stats};
use crate::api::{ObjectStore, PipelineError};
use crate::ingest::{
    filter_candidate_keys, parse_workbook, select_canonical, BacktestKind, GroupBy, ParseDiagnostics,
};
use crate::models::{
    InstrumentKey, LeverageTradeRecord, PerformanceStats, PipelineSettings, StorageObjectKey, TradeEvent,
    TradePair,
};

/// One instrument's simple equity backtest
#[derive(Debug, Clone, Serialize)]
pub struct SimpleBacktest {
    pub symbol: String,
    pub key: String,
    /// SHA-256 of the source workbook bytes
    pub fingerprint: String,
    pub events: Vec<TradeEvent>,
    pub pairs: Vec<TradePair>,
    pub stats: PerformanceStats,
    pub diagnostics: ParseDiagnostics,
}

/// One instrument and leverage multiplier's backtest
#[derive(Debug, Clone, Serialize)]
pub struct LeverageBacktest {
    pub symbol: String,
    pub leverage: u32,
    pub key: String,
    pub fingerprint: String,
    pub trades: Vec<LeverageTradeRecord>,
    pub stats: PerformanceStats,
    pub diagnostics: ParseDiagnostics,
}

/// Backtests keyed by display label ("Bitcoin", "Bitcoin 5x")
pub type SimpleReport = BTreeMap<String, SimpleBacktest>;
pub type LeverageReport = BTreeMap<String, LeverageBacktest>;

pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// List, pre-filter and select canonical keys, then fetch all of them
/// concurrently. Any single fetch failure fails the whole batch.
async fn fetch_canonical(
    store: &dyn ObjectStore,
    prefix: &str,
    extension: &str,
    group_by: GroupBy,
) -> Result<Vec<(StorageObjectKey, Vec<u8>)>, PipelineError> {
    let listed = store.list(prefix).await.inspect_err(|e| {
        log::error!("Listing {} on {} failed: {}", prefix, store.store_name(), e);
    })?;
    let candidates = filter_candidate_keys(&listed, extension);
    log::info!(
        "{} key(s) under '{}' on {}, {} candidate spreadsheet(s)",
        listed.len(),
        prefix,
        store.store_name(),
        candidates.len()
    );

    let selected = select_canonical(&candidates, group_by);
    let by_leverage = group_by == GroupBy::SymbolAndLeverage;
    for key in &selected {
        log::info!("Selected {} for {}", key.key, InstrumentKey::of(key, by_leverage));
    }

    let payloads = try_join_all(selected.iter().map(|key| store.fetch(&key.key)))
        .await
        .inspect_err(|e| log::error!("Backtest batch aborted: {}", e))?;

    Ok(selected.into_iter().zip(payloads).collect())
}

fn schema_mismatch(key: &str, expected: BacktestKind) -> PipelineError {
    PipelineError::WorkbookError {
        key: key.to_string(),
        message: format!("parser returned a result for a schema other than {:?}", expected),
    }
}

pub async fn load_simple_backtests(
    store: &dyn ObjectStore,
    settings: &PipelineSettings,
) -> Result<SimpleReport, PipelineError> {
    let files = fetch_canonical(
        store,
        &settings.simple_prefix,
        &settings.spreadsheet_extension,
        GroupBy::Symbol,
    )
    .await?;

    let mut report = SimpleReport::new();
    for (key, bytes) in files {
        let outcome = parse_workbook(BacktestKind::Simple, &key.key, &bytes, None)?
            .into_simple()
            .ok_or_else(|| schema_mismatch(&key.key, BacktestKind::Simple))?;

        let pairs = pair_trades(&outcome.rows);
        let stats = pair_stats(&pairs);
        report.insert(
            display_label(&key.symbol, None),
            SimpleBacktest {
                symbol: key.symbol,
                fingerprint: fingerprint(&bytes),
                key: key.key,
                events: outcome.rows,
                pairs,
                stats,
                diagnostics: outcome.diagnostics,
            },
        );
    }

    Ok(report)
}

pub async fn load_leverage_backtests(
    store: &dyn ObjectStore,
    settings: &PipelineSettings,
) -> Result<LeverageReport, PipelineError> {
    let files = fetch_canonical(
        store,
        &settings.leverage_prefix,
        &settings.spreadsheet_extension,
        GroupBy::SymbolAndLeverage,
    )
    .await?;

    let mut report = LeverageReport::new();
    for (key, bytes) in files {
        // The selector drops keys without a leverage group
        let Some(leverage) = key.leverage else {
            continue;
        };
        let outcome = parse_workbook(
            BacktestKind::Leverage,
            &key.key,
            &bytes,
            Some(settings.initial_capital),
        )?
        .into_leverage()
        .ok_or_else(|| schema_mismatch(&key.key, BacktestKind::Leverage))?;

        let stats = record_stats(&outcome.rows);
        report.insert(
            display_label(&key.symbol, Some(leverage)),
            LeverageBacktest {
                symbol: key.symbol,
                leverage,
                fingerprint: fingerprint(&bytes),
                key: key.key,
                trades: outcome.rows,
                stats,
                diagnostics: outcome.diagnostics,
            },
        );
    }

    Ok(report)
}
