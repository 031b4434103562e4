use crate::models::{TradeEvent, TradePair};

/// Group valid events two at a time, in the order given, into open/close
/// pairs. Events with an empty date or non-finite equity are skipped before
/// grouping; a trailing unpaired event is dropped.
pub fn pair_trades(events: &[TradeEvent]) -> Vec<TradePair> {
    let valid: Vec<&TradeEvent> = events.iter().filter(|e| e.is_valid()).collect();

    valid
        .chunks_exact(2)
        .map(|pair| TradePair::new(pair[0].clone(), pair[1].clone()))
        .collect()
}
