//! Bulk account-trade retrieval across a symbol universe.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::api::{ApiError, BinanceClient};
use crate::models::TradeRecord;

/// Fetch account trades for every symbol with time >= `start_time`.
///
/// Failures are isolated per symbol: pairs the exchange does not recognize
/// are skipped quietly, anything else is logged with context and skipped.
/// One symbol's failure never prevents the rest of the batch from
/// completing. The combined output carries no ordering guarantee across
/// symbols; the ledger merge sorts it.
pub async fn fetch_all(
    client: &BinanceClient,
    symbols: &[String],
    start_time: NaiveDateTime,
) -> Vec<TradeRecord> {
    let mut all = Vec::new();

    for symbol in symbols {
        match client.my_trades(symbol, start_time).await {
            Ok(trades) => {
                if !trades.is_empty() {
                    debug!(symbol = %symbol, count = trades.len(), "Fetched trades");
                }
                all.extend(trades);
            }
            Err(e) => match e.downcast_ref::<ApiError>() {
                Some(api) if api.is_expected_absence() => {
                    debug!(symbol = %symbol, code = api.code, "Symbol not available, skipping");
                }
                _ => {
                    warn!(symbol = %symbol, error = %e, "Trade fetch failed, skipping symbol");
                }
            },
        }
    }

    info!(
        trades = all.len(),
        symbols = symbols.len(),
        "Trade fetch complete"
    );
    all
}
