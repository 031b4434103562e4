pub mod labels;
pub mod pairing;
pub mod stats;

pub use labels::{display_label, instrument_label};
pub use pairing::pair_trades;
pub use stats::{pair_stats, record_stats};
