//! Trading-pair symbol decomposition.

/// Quote assets recognized by reconstruction when none are configured.
pub const DEFAULT_QUOTE_ASSETS: [&str; 3] = ["USDT", "USDC", "BUSD"];

/// The configured default quote-asset set as owned strings.
pub fn default_quote_assets() -> Vec<String> {
    DEFAULT_QUOTE_ASSETS.iter().map(|s| s.to_string()).collect()
}

/// Split a pair symbol into `(base, quote)` by quote-asset suffix.
///
/// The longest matching suffix wins, and the base must be non-empty, so a
/// symbol that is itself a quote asset does not decompose. Returns `None`
/// for symbols quoted in an unconfigured asset; callers skip those pairs.
pub fn split_symbol(symbol: &str, quote_assets: &[String]) -> Option<(String, String)> {
    quote_assets
        .iter()
        .filter_map(|quote| {
            symbol
                .strip_suffix(quote.as_str())
                .filter(|base| !base.is_empty())
                .map(|base| (base, quote.as_str()))
        })
        .max_by_key(|(_, quote)| quote.len())
        .map(|(base, quote)| (base.to_string(), quote.to_string()))
}

/// True when the symbol ends in one of the configured quote assets.
pub fn is_quoted_in(symbol: &str, quote_assets: &[String]) -> bool {
    quote_assets.iter().any(|quote| symbol.ends_with(quote.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_configured_quote() {
        let quotes = default_quote_assets();
        assert_eq!(
            split_symbol("BTCUSDT", &quotes),
            Some(("BTC".to_string(), "USDT".to_string()))
        );
        assert_eq!(
            split_symbol("ETHBUSD", &quotes),
            Some(("ETH".to_string(), "BUSD".to_string()))
        );
    }

    #[test]
    fn longest_suffix_wins() {
        // Both "T" and "USDT" would match; the longer quote must win.
        let quotes = vec!["T".to_string(), "USDT".to_string()];
        assert_eq!(
            split_symbol("BTCUSDT", &quotes),
            Some(("BTC".to_string(), "USDT".to_string()))
        );
    }

    #[test]
    fn unconfigured_quote_does_not_split() {
        let quotes = default_quote_assets();
        assert_eq!(split_symbol("ETHBTC", &quotes), None);
    }

    #[test]
    fn bare_quote_asset_does_not_split() {
        let quotes = default_quote_assets();
        assert_eq!(split_symbol("USDT", &quotes), None);
    }

    #[test]
    fn quoted_in_checks_suffix_only() {
        let quotes = default_quote_assets();
        assert!(is_quoted_in("SOLUSDC", &quotes));
        assert!(!is_quoted_in("SOLBTC", &quotes));
    }
}
