//! Persisted trade ledger: a fixed-column CSV file merged across runs.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::models::TradeRecord;

/// Column order of the ledger file. `save` writes this header even when the
/// record set is empty.
const HEADER: [&str; 9] = [
    "datetime", "symbol", "side", "price", "quantity", "quoteQty", "fee", "feeAsset", "tradeId",
];

/// Trade ledger backed by a whole-file-rewrite CSV store.
///
/// Concurrent writers are not supported; callers serialize access.
pub struct TradeLedger {
    path: PathBuf,
}

impl TradeLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all stored trades.
    ///
    /// A missing file is an empty ledger. A row that fails to parse is
    /// skipped with a warning; an unreadable file is an error.
    pub fn load(&self) -> Result<Vec<TradeRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open trade ledger {}", self.path.display()))?;
        let mut reader = csv::Reader::from_reader(file);

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<TradeRecord>().enumerate() {
            match row {
                Ok(record) => records.push(record),
                // Header is line 1, so data row N sits on line N + 1.
                Err(e) => warn!(line = index + 2, error = %e, "Skipping unreadable ledger row"),
            }
        }

        Ok(records)
    }

    /// Rewrite the whole ledger file.
    pub fn save(&self, records: &[TradeRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create ledger directory {}", parent.display())
                })?;
            }
        }

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to write trade ledger {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer
            .write_record(HEADER)
            .context("Failed to write ledger header")?;
        for record in records {
            writer
                .serialize(record)
                .context("Failed to write ledger row")?;
        }
        writer.flush().context("Failed to flush trade ledger")?;

        Ok(())
    }
}

/// Merge freshly fetched trades into the stored set and return the result
/// sorted by timestamp ascending.
///
/// Records are keyed by `(symbol, tradeId)`; an incoming record replaces a
/// stored one with the same identity, so a corrected re-fetch wins. The sort
/// is stable over insertion order, which fixes the relative order of
/// equal-timestamp records.
pub fn merge(existing: Vec<TradeRecord>, incoming: Vec<TradeRecord>) -> Vec<TradeRecord> {
    let mut merged: Vec<TradeRecord> = Vec::with_capacity(existing.len() + incoming.len());
    let mut index_by_key: HashMap<(String, String), usize> = HashMap::new();

    for record in existing.into_iter().chain(incoming) {
        match index_by_key.entry(record.key()) {
            Entry::Occupied(slot) => merged[*slot.get()] = record,
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(record);
            }
        }
    }

    merged.sort_by_key(|record| record.timestamp);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeSide;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn trade(symbol: &str, trade_id: &str, day: u32, price: Decimal) -> TradeRecord {
        TradeRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            symbol: symbol.to_string(),
            side: TradeSide::Buy,
            price,
            quantity: dec!(1),
            quote_qty: price,
            fee: Decimal::ZERO,
            fee_asset: "USDT".to_string(),
            trade_id: trade_id.to_string(),
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let trades = vec![
            trade("BTCUSDT", "1", 2, dec!(100)),
            trade("ETHUSDT", "1", 1, dec!(50)),
            trade("BTCUSDT", "2", 3, dec!(110)),
        ];

        let once = merge(trades.clone(), trades.clone());
        let twice = merge(once.clone(), trades.clone());

        assert_eq!(once.len(), 3);
        assert_eq!(once, twice);
        // Sorted by timestamp ascending.
        assert_eq!(once[0].symbol, "ETHUSDT");
    }

    #[test]
    fn incoming_wins_on_identity_collision() {
        let existing = vec![trade("BTCUSDT", "5", 1, dec!(100))];
        let incoming = vec![trade("BTCUSDT", "5", 1, dec!(101))];

        let merged = merge(existing, incoming);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].price, dec!(101));
    }

    #[test]
    fn same_trade_id_on_different_symbols_is_not_a_collision() {
        let existing = vec![trade("BTCUSDT", "5", 1, dec!(100))];
        let incoming = vec![trade("ETHUSDT", "5", 2, dec!(50))];

        assert_eq!(merge(existing, incoming).len(), 2);
    }

    #[test]
    fn timestamp_ties_keep_insertion_order() {
        let first = trade("BTCUSDT", "1", 1, dec!(100));
        let second = trade("ETHUSDT", "9", 1, dec!(50));

        let merged = merge(vec![first, second], Vec::new());

        assert_eq!(merged[0].trade_id, "1");
        assert_eq!(merged[1].trade_id, "9");
    }

    #[test]
    fn empty_ledger_round_trips_as_header_only_file() {
        let dir = TempDir::new().unwrap();
        let ledger = TradeLedger::new(dir.path().join("trades.csv"));

        ledger.save(&[]).unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(
            content.trim_end(),
            "datetime,symbol,side,price,quantity,quoteQty,fee,feeAsset,tradeId"
        );
        assert!(ledger.load().unwrap().is_empty());
    }

    #[test]
    fn records_round_trip_through_the_file() {
        let dir = TempDir::new().unwrap();
        let ledger = TradeLedger::new(dir.path().join("trades.csv"));
        let records = vec![
            trade("BTCUSDT", "1", 1, dec!(100.5)),
            trade("ETHUSDT", "2", 2, dec!(50.25)),
        ];

        ledger.save(&records).unwrap();
        let loaded = ledger.load().unwrap();

        assert_eq!(loaded, records);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = TradeLedger::new(dir.path().join("nonexistent.csv"));

        assert!(ledger.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_row_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        fs::write(
            &path,
            "datetime,symbol,side,price,quantity,quoteQty,fee,feeAsset,tradeId\n\
             2024-01-01 12:00:00,BTCUSDT,BUY,100,1,100,0,USDT,1\n\
             not-a-date,BTCUSDT,BUY,bogus,1,100,0,USDT,2\n\
             2024-01-02 12:00:00,ETHUSDT,SELL,50,2,100,0.1,BNB,3\n",
        )
        .unwrap();

        let loaded = TradeLedger::new(path).load().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].trade_id, "1");
        assert_eq!(loaded[1].trade_id, "3");
    }
}
