/// Display name for a 3-letter instrument symbol; unknown symbols pass through
pub fn instrument_label(symbol: &str) -> String {
    let label = match symbol {
        "BTC" => "Bitcoin",
        "ETH" => "Ethereum",
        "SOL" => "Solana",
        "XRP" => "Ripple",
        "ADA" => "Cardano",
        "BNB" => "Binance Coin",
        "LTC" => "Litecoin",
        "DOT" => "Polkadot",
        "TRX" => "Tron",
        "XLM" => "Stellar",
        "BCH" => "Bitcoin Cash",
        "ETC" => "Ethereum Classic",
        "AVX" => "Avalanche",
        "LNK" => "Chainlink",
        other => other,
    };
    label.to_string()
}

/// "Bitcoin" or "Bitcoin 5x"
pub fn display_label(symbol: &str, leverage: Option<u32>) -> String {
    match leverage {
        Some(leverage) => format!("{} {}x", instrument_label(symbol), leverage),
        None => instrument_label(symbol),
    }
}
