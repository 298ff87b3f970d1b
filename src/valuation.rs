//! USD valuation of balance snapshots against daily close prices.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::api::{AccountBalance, BinanceClient};
use crate::models::BalanceSnapshot;

/// Kline interval used when sampling a day's closing price.
const PRICE_INTERVAL: &str = "1h";

/// Daily close prices per asset, with explicit no-price markers.
#[derive(Debug, Default)]
pub struct PriceTable {
    prices: HashMap<String, BTreeMap<NaiveDate, Option<Decimal>>>,
}

impl PriceTable {
    /// Record a price, or a no-price marker, for one (asset, day) pair.
    pub fn insert(&mut self, asset: &str, date: NaiveDate, price: Option<Decimal>) {
        self.prices
            .entry(asset.to_string())
            .or_default()
            .insert(date, price);
    }

    /// Most recent known price at or before `date` (forward-fill).
    ///
    /// No-price markers are skipped over; `None` means the asset has never
    /// been priced by then.
    pub fn price_at(&self, asset: &str, date: NaiveDate) -> Option<Decimal> {
        self.prices
            .get(asset)?
            .range(..=date)
            .rev()
            .find_map(|(_, price)| *price)
    }
}

/// One row of the USD value series.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePoint {
    pub timestamp: NaiveDateTime,

    /// Per-asset value in the quote currency; unpriced assets carry zero
    pub values: BTreeMap<String, Decimal>,

    pub total: Decimal,
}

/// Live holding priced by the spot view.
#[derive(Debug, Clone)]
pub struct SpotHolding {
    pub asset: String,
    pub amount: Decimal,
    pub value: Decimal,
}

/// Build the daily close-price table for every asset and day the snapshot
/// series touches, one candle query per (asset, day).
///
/// The quote currency itself is priced at identity without a query; the
/// exchange lists no self-pair. A failed or empty query records a no-price
/// marker for that (asset, day) and the batch continues.
pub async fn fetch_price_table(
    client: &BinanceClient,
    snapshots: &[BalanceSnapshot],
    quote_currency: &str,
) -> PriceTable {
    let mut assets: BTreeSet<String> = BTreeSet::new();
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    for snapshot in snapshots {
        dates.insert(snapshot.timestamp.date());
        assets.extend(snapshot.assets().map(str::to_string));
    }

    let mut table = PriceTable::default();
    for asset in &assets {
        if asset == quote_currency {
            for &date in &dates {
                table.insert(asset, date, Some(Decimal::ONE));
            }
            continue;
        }

        let symbol = format!("{}{}", asset, quote_currency);
        for &date in &dates {
            let start = date.and_time(NaiveTime::MIN);
            let end = start + Duration::days(1);

            match client.klines(&symbol, PRICE_INTERVAL, start, end).await {
                Ok(klines) => match klines.last() {
                    Some(kline) => table.insert(asset, date, Some(kline.close())),
                    None => {
                        debug!(symbol = %symbol, date = %date, "No candle data for day");
                        table.insert(asset, date, None);
                    }
                },
                Err(e) => {
                    warn!(symbol = %symbol, date = %date, error = %e, "Price fetch failed");
                    table.insert(asset, date, None);
                }
            }
        }
    }

    table
}

/// Combine balance snapshots with the price table into a value series.
///
/// Per row, each asset is valued at its forward-filled price; an asset with
/// no price yet contributes zero rather than failing the row.
pub fn valuate(snapshots: &[BalanceSnapshot], prices: &PriceTable) -> Vec<ValuePoint> {
    snapshots
        .iter()
        .map(|snapshot| {
            let date = snapshot.timestamp.date();
            let mut values = BTreeMap::new();
            let mut total = Decimal::ZERO;

            for (asset, balance) in &snapshot.balances {
                let value = prices
                    .price_at(asset, date)
                    .map(|price| *balance * price)
                    .unwrap_or(Decimal::ZERO);
                total += value;
                values.insert(asset.clone(), value);
            }

            ValuePoint {
                timestamp: snapshot.timestamp,
                values,
                total,
            }
        })
        .collect()
}

/// Value current account balances at live ticker prices.
///
/// Keeps only non-zero holdings the exchange can price: the quote currency
/// at identity, everything else through its `asset+quote` pair. Assets with
/// no listed pair are skipped. Returns the priced holdings and their total.
pub fn spot_value(
    balances: &[AccountBalance],
    prices: &HashMap<String, Decimal>,
    quote_currency: &str,
) -> (Vec<SpotHolding>, Decimal) {
    let mut holdings = Vec::new();
    let mut total = Decimal::ZERO;

    for balance in balances {
        let amount = balance.total();
        if amount <= Decimal::ZERO {
            continue;
        }

        let price = if balance.asset == quote_currency {
            Decimal::ONE
        } else {
            let symbol = format!("{}{}", balance.asset, quote_currency);
            match prices.get(&symbol) {
                Some(price) => *price,
                None => continue,
            }
        };

        let value = amount * price;
        total += value;
        holdings.push(SpotHolding {
            asset: balance.asset.clone(),
            amount,
            value,
        });
    }

    (holdings, total)
}
