use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DOWN_GLYPH, FETCH_TIMEOUT_SECS, POLL_INTERVAL_SECS, QUOTE_URL_TEMPLATE, SYMBOL_PLACEHOLDER,
    UP_GLYPH,
};
use crate::error::WatchError;
use crate::store::Symbol;

#[derive(Clone, Debug)]
pub struct FetcherConfig {
    pub endpoint_template: String,
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint_template: QUOTE_URL_TEMPLATE.to_string(),
            timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
        }
    }
}

impl FetcherConfig {
    pub fn url_for(&self, symbol: &str) -> String {
        self.endpoint_template.replace(SYMBOL_PLACEHOLDER, symbol)
    }
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub up_glyph: String,
    pub down_glyph: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            up_glyph: UP_GLYPH.to_string(),
            down_glyph: DOWN_GLYPH.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WatcherConfig {
    pub symbols: Vec<Symbol>,
    pub interval: Duration,
    pub max_cycles: Option<u64>,
    pub fetcher: FetcherConfig,
    pub display: DisplayConfig,
    pub log_file: Option<PathBuf>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_cycles: None,
            fetcher: FetcherConfig::default(),
            display: DisplayConfig::default(),
            log_file: None,
        }
    }
}

impl WatcherConfig {
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.symbols.is_empty() {
            return Err(WatchError::Configuration(
                "at least one symbol is required".into(),
            ));
        }
        if self.interval.is_zero() {
            return Err(WatchError::Configuration(
                "poll interval must be positive".into(),
            ));
        }
        if self.fetcher.timeout.is_zero() {
            return Err(WatchError::Configuration(
                "fetch timeout must be positive".into(),
            ));
        }
        if !self.fetcher.endpoint_template.contains(SYMBOL_PLACEHOLDER) {
            return Err(WatchError::Configuration(format!(
                "endpoint template must contain {SYMBOL_PLACEHOLDER}"
            )));
        }
        Ok(())
    }
}

/// Split a comma separated symbol list. Items are trimmed, blanks dropped and
/// duplicates collapsed; case is preserved.
pub fn parse_symbols(raw: &str) -> Result<Vec<Symbol>, WatchError> {
    let mut symbols: Vec<Symbol> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !symbols.iter().any(|known| known == item) {
            symbols.push(item.to_string());
        }
    }
    if symbols.is_empty() {
        return Err(WatchError::Configuration(format!(
            "no symbols found in {raw:?}"
        )));
    }
    Ok(symbols)
}
