//! Symbol universe resolution with a cached symbol list.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::BinanceClient;
use crate::models::is_quoted_in;

/// Resolved trading-pair universe, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct SymbolUniverse {
    pub symbols: Vec<String>,
    pub from_cache: bool,
}

/// Determines which trading pairs are relevant: actively trading on the
/// exchange and quoted in one of the configured quote assets.
pub struct UniverseResolver<'a> {
    client: &'a BinanceClient,
    cache_path: PathBuf,
    quote_assets: Vec<String>,
}

impl<'a> UniverseResolver<'a> {
    pub fn new(client: &'a BinanceClient, cache_path: PathBuf, quote_assets: Vec<String>) -> Self {
        Self {
            client,
            cache_path,
            quote_assets,
        }
    }

    /// Resolve the symbol universe.
    ///
    /// With `use_cached`, a present cache file is authoritative: valid
    /// non-empty data is returned as-is, while an empty or corrupt file
    /// degrades to an empty universe with a warning rather than an error.
    /// The fetch path rewrites the cache; the cache-hit path never writes.
    pub async fn resolve(&self, use_cached: bool) -> Result<SymbolUniverse> {
        if use_cached && self.cache_path.exists() {
            return Ok(SymbolUniverse {
                symbols: self.read_cache(),
                from_cache: true,
            });
        }

        let info = self
            .client
            .exchange_info()
            .await
            .context("Failed to fetch exchange metadata")?;

        let symbols: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.is_trading() && is_quoted_in(&s.symbol, &self.quote_assets))
            .map(|s| s.symbol)
            .collect();

        info!(count = symbols.len(), "Resolved symbol universe from exchange metadata");
        self.write_cache(&symbols)?;

        Ok(SymbolUniverse {
            symbols,
            from_cache: false,
        })
    }

    fn read_cache(&self) -> Vec<String> {
        let raw = match fs::read_to_string(&self.cache_path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(cache = %self.cache_path.display(), error = %e, "Failed to read symbol cache");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(symbols) => {
                if symbols.is_empty() {
                    warn!(cache = %self.cache_path.display(), "Symbol cache is empty");
                }
                symbols
            }
            Err(e) => {
                warn!(cache = %self.cache_path.display(), error = %e, "Failed to decode symbol cache");
                Vec::new()
            }
        }
    }

    fn write_cache(&self, symbols: &[String]) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create cache directory {}", parent.display())
                })?;
            }
        }

        let encoded =
            serde_json::to_string_pretty(symbols).context("Failed to encode symbol cache")?;
        fs::write(&self.cache_path, encoded)
            .with_context(|| format!("Failed to write symbol cache {}", self.cache_path.display()))
    }
}
