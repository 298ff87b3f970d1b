//! Binance Portfolio Tracker
//!
//! Reconstructs a spot account's historical asset balances and USD value
//! from its trade history and renders both as time series.

mod api;
mod config;
mod fetcher;
mod ledger;
mod models;
mod replay;
mod universe;
mod valuation;

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::BinanceClient;
use crate::config::Credentials;
use crate::ledger::TradeLedger;
use crate::models::{default_quote_assets, BalanceSnapshot};
use crate::universe::UniverseResolver;
use crate::valuation::ValuePoint;

/// Binance portfolio tracker CLI.
#[derive(Parser)]
#[command(name = "binfolio")]
#[command(about = "Reconstruct a Binance spot portfolio's balance and value history", long_about = None)]
struct Cli {
    /// Directory holding the trade ledger and symbol cache
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Config file with API credentials
    #[arg(long, default_value = "config/config.json")]
    config: PathBuf,

    /// Quote asset recognized when decomposing pair symbols (repeatable;
    /// defaults to USDT, USDC and BUSD)
    #[arg(long = "quote", value_name = "ASSET")]
    quote_assets: Vec<String>,

    /// Quote currency used for valuation
    #[arg(long, default_value = "USDT")]
    quote_currency: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the resolved trading-pair universe
    Symbols {
        /// Use the cached symbol list instead of querying the exchange
        #[arg(long)]
        cached: bool,
    },

    /// Fetch account trades and merge them into the ledger
    Sync {
        /// Fetch trades from this date onward (YYYY-MM-DD)
        #[arg(short, long)]
        start: NaiveDate,

        /// Resolve symbols from the cache instead of exchange metadata
        #[arg(long)]
        cached_symbols: bool,
    },

    /// Show reconstructed asset balances over time
    Balances {
        #[command(flatten)]
        filter: SeriesFilter,
    },

    /// Show portfolio value over time at historical prices
    Value {
        #[command(flatten)]
        filter: SeriesFilter,
    },

    /// Show the live spot account value at current prices
    Spot,
}

/// Asset and date filters shared by the series commands.
#[derive(Args)]
struct SeriesFilter {
    /// Restrict output to these assets (repeatable)
    #[arg(short, long = "asset", value_name = "ASSET")]
    assets: Vec<String>,

    /// Drop snapshots before this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Drop snapshots after this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Print the full series instead of the latest state
    #[arg(long)]
    table: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let credentials = Credentials::load(&cli.config)?;
    let client = BinanceClient::new(credentials)?;
    let ledger = TradeLedger::new(cli.data_dir.join("trade_history.csv"));
    let cache_path = cli.data_dir.join("symbols.json");
    let quote_assets = if cli.quote_assets.is_empty() {
        default_quote_assets()
    } else {
        cli.quote_assets.clone()
    };

    match cli.command {
        Commands::Symbols { cached } => {
            let resolver = UniverseResolver::new(&client, cache_path, quote_assets);
            let universe = resolver.resolve(cached).await?;

            println!(
                "{} symbols ({})",
                universe.symbols.len(),
                if universe.from_cache {
                    "cached"
                } else {
                    "from exchange"
                }
            );
            for symbol in &universe.symbols {
                println!("{}", symbol);
            }
        }

        Commands::Sync {
            start,
            cached_symbols,
        } => {
            let resolver = UniverseResolver::new(&client, cache_path, quote_assets);
            let universe = resolver.resolve(cached_symbols).await?;

            if universe.symbols.is_empty() {
                println!("No symbols to fetch. Re-run without --cached-symbols to refresh the universe.");
                return Ok(());
            }

            info!(
                symbols = universe.symbols.len(),
                start = %start,
                "Starting trade sync"
            );

            let start_time = start.and_time(NaiveTime::MIN);
            let incoming = fetcher::fetch_all(&client, &universe.symbols, start_time).await;
            let fetched = incoming.len();

            let existing = ledger.load()?;
            let stored_before = existing.len();
            let merged = ledger::merge(existing, incoming);
            ledger.save(&merged)?;

            println!(
                "Fetched {} trades across {} symbols",
                fetched,
                universe.symbols.len()
            );
            println!(
                "Ledger: {} -> {} records ({})",
                stored_before,
                merged.len(),
                ledger.path().display()
            );
        }

        Commands::Balances { filter } => {
            let trades = ledger.load()?;
            if trades.is_empty() {
                println!("Trade ledger is empty. Run 'binfolio sync' first.");
                return Ok(());
            }

            let snapshots = apply_filter(replay::replay(&trades, &quote_assets), &filter);
            if snapshots.is_empty() {
                println!("No snapshots match the given filters.");
                return Ok(());
            }

            if filter.table {
                print_balance_series(&snapshots);
            } else if let Some(latest) = snapshots.last() {
                print_holdings(latest);
            }
        }

        Commands::Value { filter } => {
            let trades = ledger.load()?;
            if trades.is_empty() {
                println!("Trade ledger is empty. Run 'binfolio sync' first.");
                return Ok(());
            }

            let snapshots = apply_filter(replay::replay(&trades, &quote_assets), &filter);
            if snapshots.is_empty() {
                println!("No snapshots match the given filters.");
                return Ok(());
            }

            println!("Fetching historical prices from Binance...");
            let prices =
                valuation::fetch_price_table(&client, &snapshots, &cli.quote_currency).await;
            let series = valuation::valuate(&snapshots, &prices);

            if filter.table {
                print_value_series(&series, &cli.quote_currency);
            } else {
                print_value_totals(&series, &cli.quote_currency);
            }
        }

        Commands::Spot => {
            let prices: HashMap<String, Decimal> = client
                .ticker_prices()
                .await?
                .into_iter()
                .map(|ticker| (ticker.symbol, ticker.price))
                .collect();
            let account = client.account().await?;

            let (holdings, total) =
                valuation::spot_value(&account.balances, &prices, &cli.quote_currency);

            println!("\n=== SPOT BALANCES ===");
            for holding in &holdings {
                println!(
                    "{:<8} {:>18} = {} {}",
                    holding.asset,
                    holding.amount.round_dp(6).to_string(),
                    holding.value.round_dp(2),
                    cli.quote_currency
                );
            }
            println!(
                "\nTotal spot account value: {} {}",
                total.round_dp(2),
                cli.quote_currency
            );
        }
    }

    Ok(())
}

/// Keep only the snapshots and assets selected by the filter.
fn apply_filter(snapshots: Vec<BalanceSnapshot>, filter: &SeriesFilter) -> Vec<BalanceSnapshot> {
    snapshots
        .into_iter()
        .filter(|snapshot| {
            let date = snapshot.timestamp.date();
            filter.from.map_or(true, |from| date >= from)
                && filter.to.map_or(true, |to| date <= to)
        })
        .map(|mut snapshot| {
            if !filter.assets.is_empty() {
                snapshot
                    .balances
                    .retain(|asset, _| filter.assets.iter().any(|a| a == asset));
            }
            snapshot
        })
        .collect()
}

fn print_holdings(snapshot: &BalanceSnapshot) {
    println!("\n=== Holdings as of {} ===", snapshot.timestamp);
    println!("{:<8} {:>20}", "ASSET", "BALANCE");
    println!("{}", "-".repeat(29));
    for (asset, balance) in &snapshot.balances {
        println!("{:<8} {:>20}", asset, balance.to_string());
    }
}

fn print_balance_series(snapshots: &[BalanceSnapshot]) {
    let assets: BTreeSet<&str> = snapshots.iter().flat_map(|s| s.assets()).collect();

    print!("{:<20}", "DATETIME");
    for asset in &assets {
        print!(" {:>14}", asset);
    }
    println!();

    for snapshot in snapshots {
        print!("{:<20}", snapshot.timestamp.to_string());
        for asset in &assets {
            print!(" {:>14}", snapshot.balance(asset).to_string());
        }
        println!();
    }
}

fn print_value_totals(series: &[ValuePoint], quote_currency: &str) {
    println!("\n=== Portfolio value over time ({}) ===", quote_currency);
    println!("{:<20} {:>16}", "DATETIME", "TOTAL");
    println!("{}", "-".repeat(37));
    for point in series {
        println!(
            "{:<20} {:>16}",
            point.timestamp.to_string(),
            point.total.round_dp(2).to_string()
        );
    }
}

fn print_value_series(series: &[ValuePoint], quote_currency: &str) {
    let assets: BTreeSet<&str> = series
        .iter()
        .flat_map(|point| point.values.keys().map(String::as_str))
        .collect();

    println!("\nPer-asset value in {}", quote_currency);
    print!("{:<20}", "DATETIME");
    for asset in &assets {
        print!(" {:>14}", asset);
    }
    println!(" {:>16}", "TOTAL");

    for point in series {
        print!("{:<20}", point.timestamp.to_string());
        for asset in &assets {
            let value = point
                .values
                .get(*asset)
                .copied()
                .unwrap_or(Decimal::ZERO);
            print!(" {:>14}", value.round_dp(2).to_string());
        }
        println!(" {:>16}", point.total.round_dp(2).to_string());
    }
}
