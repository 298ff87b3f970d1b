//! Binance REST API client and response types.

mod client;
mod types;

pub use client::BinanceClient;
pub use types::*;
