use crate::models::{LeverageTradeRecord, PerformanceStats, TradePair};

#[derive(Debug, Default)]
struct OutcomeTally {
    wins: usize,
    losses: usize,
    neutral: usize,
}

impl OutcomeTally {
    fn from_changes(changes: impl Iterator<Item = f64>) -> Self {
        let mut tally = Self::default();
        for change in changes {
            if change > 0.0 {
                tally.wins += 1;
            } else if change < 0.0 {
                tally.losses += 1;
            } else {
                tally.neutral += 1;
            }
        }
        tally
    }

    fn total(&self) -> usize {
        self.wins + self.losses + self.neutral
    }
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Percentage growth from `start` to `end`; 0 when undefined
fn growth_pct(start: f64, end: f64) -> f64 {
    if start == 0.0 {
        return 0.0;
    }
    let growth = (end - start) / start * 100.0;
    if growth.is_finite() { growth } else { 0.0 }
}

fn base_stats(tally: &OutcomeTally) -> PerformanceStats {
    let num_trades = tally.total();
    PerformanceStats {
        num_trades,
        win_trades_count: tally.wins,
        loss_trades_count: tally.losses,
        neutral_trades_count: tally.neutral,
        win_trades_pct: pct(tally.wins, num_trades),
        loss_trades_pct: pct(tally.losses, num_trades),
        // Neutral trades count toward neither side
        profitable_trades_pct: pct(tally.wins, tally.wins + tally.losses),
        ..PerformanceStats::empty()
    }
}

/// Stats over simple-schema pairs, classified by the sign of `total_change`.
/// The display capital change is clamped to 0..=100; the raw value is kept
/// alongside it.
pub fn pair_stats(pairs: &[TradePair]) -> PerformanceStats {
    let (Some(first), Some(last)) = (pairs.first(), pairs.last()) else {
        return PerformanceStats::empty();
    };

    let tally = OutcomeTally::from_changes(pairs.iter().map(|p| p.total_change));
    let raw = growth_pct(first.first_trade.total_equity, last.second_trade.total_equity);

    PerformanceStats {
        capital_change_pct: raw.clamp(0.0, 100.0),
        capital_change_pct_raw: raw,
        total_gain: pairs.iter().map(|p| p.total_change).sum(),
        ..base_stats(&tally)
    }
}

/// Stats over leverage records, classified by the sign of `pnl_usdt`.
///
/// Filtered signals count as neutral trades and contribute 0 to fees and to
/// the leverage average. Capital change runs from the first executed trade's
/// `equity_before` to the last executed trade's `equity_after`, unclamped.
pub fn record_stats(records: &[LeverageTradeRecord]) -> PerformanceStats {
    if records.is_empty() {
        return PerformanceStats::empty();
    }

    let tally = OutcomeTally::from_changes(records.iter().map(|r| r.pnl_usdt));
    let mut executed = records.iter().filter(|r| !r.is_filtered);
    let first = executed.next();
    let last = executed.last().or(first);
    let capital_change = match (first, last) {
        (Some(first), Some(last)) => growth_pct(first.equity_before, last.equity_after),
        _ => 0.0,
    };

    let leverage_sum: f64 = records.iter().map(|r| r.leverage).sum();

    PerformanceStats {
        capital_change_pct: capital_change,
        capital_change_pct_raw: capital_change,
        total_gain: records.iter().map(|r| r.pnl_usdt).sum(),
        total_fees: records.iter().map(|r| r.total_fees).sum(),
        avg_leverage: leverage_sum / records.len() as f64,
        ..base_stats(&tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::pair_trades;
    use crate::ingest::equity_ledger;
    use crate::models::{FilteredSignal, TradeEvent};

    fn event(date: &str, total_equity: f64) -> TradeEvent {
        TradeEvent {
            date: date.to_string(),
            cash_balance: 0.0,
            total_equity,
            entry_price: 0.0,
            position_type: "LONG".to_string(),
            capital_change: None,
        }
    }

    fn trades(initial: f64, pnls: &[f64], leverage: f64, fee: f64) -> Vec<LeverageTradeRecord> {
        equity_ledger(initial, pnls)
            .into_iter()
            .zip(pnls)
            .enumerate()
            .map(|(i, ((before, after), pnl))| {
                let mut record = LeverageTradeRecord::filtered(
                    format!("2024-01-{:02}T00:00:00.000Z", i + 1),
                    FilteredSignal {
                        signal: String::new(),
                        p_bad: 0.0,
                        pred_remaining: 0.0,
                    },
                );
                record.is_filtered = false;
                record.signal = None;
                record.exit_type = "tp".to_string();
                record.pnl_usdt = *pnl;
                record.leverage = leverage;
                record.total_fees = fee;
                record.equity_before = before;
                record.equity_after = after;
                record
            })
            .collect()
    }

    #[test]
    fn test_pair_stats_win_loss_split() {
        let events = vec![
            event("2024-01-01", 100.0),
            event("2024-01-02", 120.0),
            event("2024-01-03", 120.0),
            event("2024-01-04", 90.0),
        ];
        let stats = pair_stats(&pair_trades(&events));
        assert_eq!(stats.num_trades, 2);
        assert_eq!(stats.win_trades_count, 1);
        assert_eq!(stats.loss_trades_count, 1);
        assert_eq!(stats.profitable_trades_pct, 50.0);
        assert_eq!(stats.win_trades_pct, 50.0);
        assert_eq!(stats.total_gain, -10.0);
        // 100 → 90 is -10%, shown as 0
        assert_eq!(stats.capital_change_pct_raw, -10.0);
        assert_eq!(stats.capital_change_pct, 0.0);
    }

    #[test]
    fn test_pair_stats_display_clamps_above_hundred() {
        let events = vec![event("a", 100.0), event("b", 250.0)];
        let stats = pair_stats(&pair_trades(&events));
        assert_eq!(stats.capital_change_pct_raw, 150.0);
        assert_eq!(stats.capital_change_pct, 100.0);
    }

    #[test]
    fn test_neutral_pairs_do_not_affect_profitable_pct() {
        let events = vec![
            event("a", 100.0),
            event("b", 100.0),
            event("c", 100.0),
            event("d", 110.0),
        ];
        let stats = pair_stats(&pair_trades(&events));
        assert_eq!(stats.neutral_trades_count, 1);
        assert_eq!(stats.profitable_trades_pct, 100.0);
        assert_eq!(stats.win_trades_pct, 50.0);
    }

    #[test]
    fn test_only_neutral_pairs_guard_division() {
        let events = vec![event("a", 100.0), event("b", 100.0)];
        let stats = pair_stats(&pair_trades(&events));
        assert_eq!(stats.profitable_trades_pct, 0.0);
        assert!(!stats.profitable_trades_pct.is_nan());
    }

    #[test]
    fn test_zero_starting_equity_is_guarded() {
        let events = vec![event("a", 0.0), event("b", 50.0)];
        let stats = pair_stats(&pair_trades(&events));
        assert_eq!(stats.capital_change_pct, 0.0);
        assert_eq!(stats.capital_change_pct_raw, 0.0);
    }

    #[test]
    fn test_empty_inputs_return_sentinel() {
        let stats = pair_stats(&[]);
        assert_eq!(stats, PerformanceStats::empty());
        assert!(stats.is_empty());

        let stats = record_stats(&[]);
        assert_eq!(stats, PerformanceStats::empty());
        for value in [
            stats.win_trades_pct,
            stats.loss_trades_pct,
            stats.profitable_trades_pct,
            stats.capital_change_pct,
            stats.total_gain,
            stats.total_fees,
            stats.avg_leverage,
        ] {
            assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn test_record_stats_over_trades() {
        let records = trades(1_000.0, &[50.0, -20.0, 30.0], 5.0, 2.0);
        let stats = record_stats(&records);
        assert_eq!(stats.num_trades, 3);
        assert_eq!(stats.win_trades_count, 2);
        assert_eq!(stats.loss_trades_count, 1);
        assert!((stats.capital_change_pct - 6.0).abs() < 1e-9);
        assert_eq!(stats.total_gain, 60.0);
        assert_eq!(stats.total_fees, 6.0);
        assert_eq!(stats.avg_leverage, 5.0);
    }

    #[test]
    fn test_record_stats_capital_change_is_unclamped() {
        let records = trades(1_000.0, &[-400.0], 10.0, 0.0);
        let stats = record_stats(&records);
        assert_eq!(stats.capital_change_pct, -40.0);
    }

    #[test]
    fn test_filtered_records_dilute_leverage_average() {
        let mut records = trades(1_000.0, &[100.0], 10.0, 4.0);
        records.insert(
            0,
            LeverageTradeRecord::filtered(
                "2023-12-31T00:00:00.000Z".to_string(),
                FilteredSignal {
                    signal: "LONG".to_string(),
                    p_bad: 0.9,
                    pred_remaining: 1.0,
                },
            ),
        );
        let stats = record_stats(&records);
        assert_eq!(stats.num_trades, 2);
        assert_eq!(stats.neutral_trades_count, 1);
        assert_eq!(stats.avg_leverage, 5.0);
        assert_eq!(stats.total_fees, 4.0);
        // Filtered rows carry zero equity and are skipped for capital change
        assert!((stats.capital_change_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_capital_change_spans_executed_records_only() {
        let filtered = |date: &str| {
            LeverageTradeRecord::filtered(
                date.to_string(),
                FilteredSignal {
                    signal: "LONG".to_string(),
                    p_bad: 0.8,
                    pred_remaining: 1.0,
                },
            )
        };
        let mut records = trades(1_000.0, &[200.0, -50.0], 3.0, 0.0);
        records.insert(0, filtered("2023-12-30T00:00:00.000Z"));
        records.push(filtered("2024-02-01T00:00:00.000Z"));

        let stats = record_stats(&records);
        // 1000 → 1150 across the executed trades; the bracketing filtered rows hold zero equity
        assert!((stats.capital_change_pct - 15.0).abs() < 1e-9);
        assert!((stats.capital_change_pct_raw - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_filtered_records() {
        let records = vec![LeverageTradeRecord::filtered(
            "2024-01-01T00:00:00.000Z".to_string(),
            FilteredSignal {
                signal: "SHORT".to_string(),
                p_bad: 0.7,
                pred_remaining: 2.0,
            },
        )];
        let stats = record_stats(&records);
        assert_eq!(stats.num_trades, 1);
        assert_eq!(stats.capital_change_pct, 0.0);
        assert_eq!(stats.profitable_trades_pct, 0.0);
    }
}
