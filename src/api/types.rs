//! API response types and errors for the Binance spot REST API.

#![allow(dead_code)] // responses map the full payloads; not every field is read

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Failure reported by the exchange, carrying Binance's numeric error code.
///
/// Transport and decode failures stay as plain `anyhow` errors; this type
/// exists so per-symbol fetch policy can match on specific codes.
#[derive(Debug, Clone, Error)]
#[error("binance api error {code}: {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

impl ApiError {
    /// Unknown or delisted trading-pair symbol.
    pub const INVALID_SYMBOL: i64 = -1121;

    /// True for failures that mean "this symbol has nothing for you",
    /// expected across a universe that includes historically inactive pairs.
    pub fn is_expected_absence(&self) -> bool {
        self.code == Self::INVALID_SYMBOL
    }
}

/// Error body returned by Binance on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub code: i64,
    pub msg: String,
}

/// Entry from /api/v3/ticker/price.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

/// Trading-pair metadata from /api/v3/exchangeInfo.
#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub base_asset: String,
    #[serde(default)]
    pub quote_asset: String,
}

impl SymbolInfo {
    /// Whether the pair is currently open for trading.
    pub fn is_trading(&self) -> bool {
        self.status == "TRADING"
    }
}

/// Account trade from /api/v3/myTrades.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTrade {
    pub symbol: String,
    pub id: i64,
    #[serde(default)]
    pub order_id: i64,
    pub price: Decimal,
    pub qty: Decimal,
    pub quote_qty: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
    /// Trade time in epoch milliseconds
    pub time: i64,
    pub is_buyer: bool,
    #[serde(default)]
    pub is_maker: bool,
}

/// Account state from /api/v3/account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub balances: Vec<AccountBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl AccountBalance {
    /// Free plus locked holdings.
    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

/// Candle from /api/v3/klines; Binance encodes candles as positional arrays.
#[derive(Debug, Clone, Deserialize)]
pub struct Kline(
    pub i64,     // open time (ms)
    pub Decimal, // open
    pub Decimal, // high
    pub Decimal, // low
    pub Decimal, // close
    pub Decimal, // volume
    pub i64,     // close time (ms)
    pub Decimal, // quote asset volume
    pub i64,     // number of trades
    pub Decimal, // taker buy base volume
    pub Decimal, // taker buy quote volume
    pub String,  // unused by the API
);

impl Kline {
    pub fn close(&self) -> Decimal {
        self.4
    }
}
