//! Trade records as fetched from the exchange and persisted in the ledger.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// One completed trade on a spot trading pair.
///
/// Uniquely identified by `(symbol, trade_id)` and immutable once recorded;
/// a re-fetch of the same identity replaces the stored row wholesale.
///
/// Field order matches the ledger file's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Trade time, naive UTC at second precision
    #[serde(rename = "datetime", with = "ledger_datetime")]
    pub timestamp: NaiveDateTime,

    /// Trading-pair symbol (e.g. "BTCUSDT")
    pub symbol: String,

    /// Trade direction
    pub side: TradeSide,

    /// Execution price in the quote asset
    pub price: Decimal,

    /// Quantity in base asset units
    pub quantity: Decimal,

    /// Quantity in quote asset units
    #[serde(rename = "quoteQty")]
    pub quote_qty: Decimal,

    /// Fee amount, denominated in `fee_asset`
    pub fee: Decimal,

    /// Asset the fee was charged in (may be neither base nor quote)
    #[serde(rename = "feeAsset")]
    pub fee_asset: String,

    /// Exchange-assigned trade identifier
    #[serde(rename = "tradeId")]
    pub trade_id: String,
}

impl TradeRecord {
    /// Composite identity used for ledger deduplication.
    pub fn key(&self) -> (String, String) {
        (self.symbol.clone(), self.trade_id.clone())
    }
}

/// Fixed-width ledger datetime encoding, `YYYY-MM-DD HH:MM:SS`.
pub mod ledger_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample() -> TradeRecord {
        TradeRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 5)
                .unwrap(),
            symbol: "BTCUSDT".to_string(),
            side: TradeSide::Buy,
            price: dec!(65000.5),
            quantity: dec!(0.01),
            quote_qty: dec!(650.005),
            fee: dec!(0.00001),
            fee_asset: "BTC".to_string(),
            trade_id: "12345".to_string(),
        }
    }

    #[test]
    fn key_is_symbol_and_trade_id() {
        let trade = sample();
        assert_eq!(trade.key(), ("BTCUSDT".to_string(), "12345".to_string()));
    }

    #[test]
    fn datetime_encoding_is_fixed_width() {
        let trade = sample();
        let encoded = trade.timestamp.format(ledger_datetime::FORMAT).to_string();
        assert_eq!(encoded, "2024-03-01 09:30:05");
    }

    #[test]
    fn side_round_trips_as_uppercase() {
        assert_eq!(TradeSide::Buy.as_str(), "BUY");
        assert_eq!(TradeSide::Sell.as_str(), "SELL");

        let side: TradeSide = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(side, TradeSide::Sell);
    }
}
