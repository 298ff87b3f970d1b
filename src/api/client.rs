//! Binance spot REST API client (read-only operations).

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::debug;

use crate::config::Credentials;
use crate::models::{TradeRecord, TradeSide};

use super::types::*;

const REST_BASE: &str = "https://api.binance.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const RECV_WINDOW: u64 = 5000;

type HmacSha256 = Hmac<Sha256>;

/// Client for the Binance spot REST API.
///
/// Public endpoints work without credentials; signed endpoints require an
/// API key/secret pair and fail with context when none was configured.
pub struct BinanceClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

impl BinanceClient {
    /// Create a new client with default settings.
    pub fn new(credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: REST_BASE.to_string(),
            credentials,
        })
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(base_url: String, credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// All current ticker prices.
    pub async fn ticker_prices(&self) -> Result<Vec<TickerPrice>> {
        self.public_get("/api/v3/ticker/price", &[]).await
    }

    /// Trading-pair metadata with listing status.
    pub async fn exchange_info(&self) -> Result<ExchangeInfo> {
        self.public_get("/api/v3/exchangeInfo", &[]).await
    }

    /// Spot account balances (signed).
    pub async fn account(&self) -> Result<AccountInfo> {
        self.signed_get("/api/v3/account", &[]).await
    }

    /// Account trades for one symbol with time >= `start_time` (signed).
    pub async fn my_trades(
        &self,
        symbol: &str,
        start_time: NaiveDateTime,
    ) -> Result<Vec<TradeRecord>> {
        let start_ms = start_time.and_utc().timestamp_millis().to_string();
        let items: Vec<AccountTrade> = self
            .signed_get(
                "/api/v3/myTrades",
                &[("symbol", symbol.to_string()), ("startTime", start_ms)],
            )
            .await?;

        Ok(items.into_iter().filter_map(to_trade_record).collect())
    }

    /// Candles for one symbol over `[start, end)` (public).
    pub async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Kline>> {
        self.public_get(
            "/api/v3/klines",
            &[
                ("symbol", symbol.to_string()),
                ("interval", interval.to_string()),
                ("startTime", start.and_utc().timestamp_millis().to_string()),
                ("endTime", end.and_utc().timestamp_millis().to_string()),
            ],
        )
        .await
    }

    async fn public_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let query = build_query(params);
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query)
        };

        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", endpoint))?;

        handle_response(response).await
    }

    async fn signed_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let credentials = self
            .credentials
            .as_ref()
            .context("API credentials are required for this operation")?;

        let mut all_params = params.to_vec();
        all_params.push(("timestamp", timestamp_ms().to_string()));
        all_params.push(("recvWindow", RECV_WINDOW.to_string()));

        let query = build_query(&all_params);
        let signature = sign(&credentials.api_secret, &query);
        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, endpoint, query, signature
        );

        debug!(endpoint = endpoint, "GET (signed)");

        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", endpoint))?;

        handle_response(response).await
    }
}

/// HMAC-SHA256 signature over the query string, hex-encoded.
fn sign(secret: &str, query: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn build_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_millis() as u64
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    if status.is_success() {
        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse response ({})", status))
    } else if let Ok(error) = serde_json::from_str::<ErrorResponse>(&body) {
        Err(ApiError {
            code: error.code,
            message: error.msg,
        }
        .into())
    } else {
        Err(ApiError {
            code: status.as_u16() as i64,
            message: body,
        }
        .into())
    }
}

/// Map an exchange trade onto the ledger record shape. Trades with an
/// unrepresentable timestamp are dropped.
fn to_trade_record(trade: AccountTrade) -> Option<TradeRecord> {
    let timestamp = DateTime::from_timestamp_millis(trade.time)?.naive_utc();
    let side = if trade.is_buyer {
        TradeSide::Buy
    } else {
        TradeSide::Sell
    };

    Some(TradeRecord {
        timestamp,
        symbol: trade.symbol,
        side,
        price: trade.price,
        quantity: trade.qty,
        quote_qty: trade.quote_qty,
        fee: trade.commission,
        fee_asset: trade.commission_asset,
        trade_id: trade.id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn signature_matches_binance_documented_vector() {
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";

        assert_eq!(
            sign(secret, query),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn account_trade_maps_to_ledger_record() {
        let raw = r#"{
            "symbol": "BNBUSDT",
            "id": 28457,
            "orderId": 100234,
            "price": "4.00000100",
            "qty": "12.00000000",
            "quoteQty": "48.000012",
            "commission": "10.10000000",
            "commissionAsset": "BNB",
            "time": 1499865549590,
            "isBuyer": true,
            "isMaker": false,
            "isBestMatch": true
        }"#;

        let trade: AccountTrade = serde_json::from_str(raw).unwrap();
        let record = to_trade_record(trade).unwrap();

        assert_eq!(record.symbol, "BNBUSDT");
        assert_eq!(record.trade_id, "28457");
        assert_eq!(record.side, TradeSide::Buy);
        assert_eq!(record.price, dec!(4.00000100));
        assert_eq!(record.quantity, dec!(12));
        assert_eq!(record.quote_qty, dec!(48.000012));
        assert_eq!(record.fee, dec!(10.1));
        assert_eq!(record.fee_asset, "BNB");
        // Millisecond precision truncates to whole seconds.
        assert_eq!(
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2017-07-12 13:19:09"
        );
    }

    #[test]
    fn seller_side_maps_to_sell() {
        let trade = AccountTrade {
            symbol: "BTCUSDT".to_string(),
            id: 1,
            order_id: 1,
            price: dec!(100),
            qty: dec!(1),
            quote_qty: dec!(100),
            commission: Decimal::ZERO,
            commission_asset: "USDT".to_string(),
            time: 1_700_000_000_000,
            is_buyer: false,
            is_maker: true,
        };

        assert_eq!(to_trade_record(trade).unwrap().side, TradeSide::Sell);
    }
}
