use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{parse_symbols, DisplayConfig, FetcherConfig, WatcherConfig};
use crate::constants::{FETCH_TIMEOUT_SECS, POLL_INTERVAL_SECS, QUOTE_URL_TEMPLATE};
use crate::error::WatchError;

#[derive(Debug, Parser)]
#[command(author, version, about = "Terminal stock ticker polling live quotes")]
pub struct Cli {
    /// Symbols to watch, comma separated without spaces (e.g. AAPL,MSFT)
    #[arg(short, long, value_name = "LIST")]
    pub symbols: String,

    /// Seconds between refreshes
    #[arg(
        short,
        long,
        default_value_t = POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Seconds a single quote lookup may take
    #[arg(
        short,
        long,
        default_value_t = FETCH_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Quote endpoint; `{symbol}` is replaced by each symbol
    #[arg(long, default_value = QUOTE_URL_TEMPLATE)]
    pub endpoint: String,

    /// Exit after this many refreshes
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_cycles: Option<u64>,

    /// Append JSON log lines to this file while the table is on screen
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> Result<WatcherConfig, WatchError> {
        let config = WatcherConfig {
            symbols: parse_symbols(&self.symbols)?,
            interval: Duration::from_secs(self.interval),
            max_cycles: self.max_cycles,
            fetcher: FetcherConfig {
                endpoint_template: self.endpoint,
                timeout: Duration::from_secs(self.timeout),
            },
            display: DisplayConfig::default(),
            log_file: self.log_file,
        };
        config.validate()?;
        Ok(config)
    }
}
