pub mod backtests;
pub mod comparison;

pub use backtests::*;
pub use comparison::*;
