//! Data models for trades, symbols, and balance snapshots.

mod snapshot;
mod symbol;
mod trade;

pub use snapshot::{BalanceSnapshot, BALANCE_SCALE, DUST_THRESHOLD};
pub use symbol::{default_quote_assets, is_quoted_in, split_symbol, DEFAULT_QUOTE_ASSETS};
pub use trade::{TradeRecord, TradeSide};
