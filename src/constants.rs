pub const QUOTE_URL_TEMPLATE: &str =
    "http://finance.yahoo.com/webservice/v1/symbols/{symbol}/quote?format=json";
pub const SYMBOL_PLACEHOLDER: &str = "{symbol}";
pub const FETCH_TIMEOUT_SECS: u64 = 10;
pub const POLL_INTERVAL_SECS: u64 = 1;
pub const UP_GLYPH: &str = "↑";
pub const DOWN_GLYPH: &str = "↓";
