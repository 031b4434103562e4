pub mod leverage_trade;
pub mod settings;
pub mod stats;
pub mod storage_key;
pub mod trade_event;

pub use leverage_trade::*;
pub use settings::*;
pub use stats::*;
pub use storage_key::*;
pub use trade_event::*;
