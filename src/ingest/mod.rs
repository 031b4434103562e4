pub mod cells;
pub mod dates;
pub mod filename;
pub mod leverage;
pub mod selector;
pub mod simple;
pub mod workbook;

pub use cells::ParseDiagnostics;
pub use filename::{parse_storage_key, KeyRejection};
pub use leverage::{equity_ledger, parse_leverage_sheets, parse_leverage_workbook};
pub use selector::{filter_candidate_keys, select, select_canonical, GroupBy};
pub use simple::{parse_simple_sheet, parse_simple_workbook};
pub use workbook::{parse_workbook, read_sheets, BacktestKind, ParseOutcome, ParsedBacktest, Sheet, SheetFilter};
