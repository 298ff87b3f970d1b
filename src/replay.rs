//! Balance reconstruction: replaying the ordered trade ledger.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{
    split_symbol, BalanceSnapshot, TradeRecord, TradeSide, BALANCE_SCALE, DUST_THRESHOLD,
};

/// Replay `trades` in the given order into one balance snapshot per trade.
///
/// A pure fold over the trade sequence: the same input always produces the
/// same snapshot sequence, with no dependence on when the replay runs.
///
/// Per trade: the symbol is decomposed against `quote_assets` (trades on
/// undecomposable pairs are skipped without emitting a snapshot or touching
/// the running balances); a BUY adds the base quantity and subtracts the
/// quote quantity, a SELL does the reverse; the fee is then deducted from
/// the fee asset's balance regardless of side. The emitted snapshot is a
/// copy of the running state, rounded to eight decimals and filtered to
/// balances above the dust threshold.
pub fn replay(trades: &[TradeRecord], quote_assets: &[String]) -> Vec<BalanceSnapshot> {
    let mut running: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut snapshots = Vec::with_capacity(trades.len());

    for trade in trades {
        let Some((base, quote)) = split_symbol(&trade.symbol, quote_assets) else {
            continue;
        };

        match trade.side {
            TradeSide::Buy => {
                *running.entry(base).or_default() += trade.quantity;
                *running.entry(quote).or_default() -= trade.quote_qty;
            }
            TradeSide::Sell => {
                *running.entry(base).or_default() -= trade.quantity;
                *running.entry(quote).or_default() += trade.quote_qty;
            }
        }

        *running.entry(trade.fee_asset.clone()).or_default() -= trade.fee;

        let balances = running
            .iter()
            .filter(|(_, amount)| amount.abs() > DUST_THRESHOLD)
            .map(|(asset, amount)| (asset.clone(), amount.round_dp(BALANCE_SCALE)))
            .collect();

        snapshots.push(BalanceSnapshot {
            timestamp: trade.timestamp,
            balances,
        });
    }

    snapshots
}
