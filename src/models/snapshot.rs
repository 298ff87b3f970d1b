//! Point-in-time balance snapshots produced by ledger replay.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal places kept in snapshot balances.
pub const BALANCE_SCALE: u32 = 8;

/// Running balances at or below this magnitude are dropped from snapshots.
pub const DUST_THRESHOLD: Decimal = dec!(0.0000000001);

/// Full mapping of asset to balance captured immediately after one trade.
///
/// Snapshots are cumulative: each carries the complete running state, not a
/// delta from the previous snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSnapshot {
    /// Timestamp of the trade that produced this snapshot
    pub timestamp: NaiveDateTime,

    /// Asset symbol mapped to its signed balance, rounded to [`BALANCE_SCALE`] decimals
    pub balances: BTreeMap<String, Decimal>,
}

impl BalanceSnapshot {
    /// Balance for one asset, zero when absent.
    pub fn balance(&self, asset: &str) -> Decimal {
        self.balances.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Assets held in this snapshot, in sorted order.
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.balances.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn missing_asset_reads_as_zero() {
        let snapshot = BalanceSnapshot {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            balances: BTreeMap::from([("BTC".to_string(), dec!(0.5))]),
        };

        assert_eq!(snapshot.balance("BTC"), dec!(0.5));
        assert_eq!(snapshot.balance("ETH"), Decimal::ZERO);
    }

    #[test]
    fn dust_threshold_is_below_balance_scale() {
        // One unit at the smallest representable snapshot scale must survive
        // the dust filter.
        assert!(dec!(0.00000001) > DUST_THRESHOLD);
    }
}
