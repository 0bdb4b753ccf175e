use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::FetchError;

static PRICE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d{2}").expect("price pattern is a valid regex"));

/// Top level of a quote response: `{"list": {"resources": [{"resource": {"fields": {..}}}]}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteEnvelope {
    pub list: QuoteList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteList {
    #[serde(default)]
    pub resources: Vec<QuoteResources>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteResources {
    pub resource: QuoteResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteResource {
    pub fields: QuoteFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteFields {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub utctime: Option<String>,
}

/// The two fields the watcher consumes from a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: Option<String>,
    pub price: f64,
}

impl TryFrom<QuoteEnvelope> for Quote {
    type Error = FetchError;

    fn try_from(envelope: QuoteEnvelope) -> Result<Self, Self::Error> {
        let fields = envelope
            .list
            .resources
            .into_iter()
            .next()
            .ok_or(FetchError::EmptyPayload)?
            .resource
            .fields;
        let raw = fields.price.ok_or(FetchError::MissingPrice)?;
        Ok(Quote {
            symbol: fields.symbol,
            price: extract_price(&raw)?,
        })
    }
}

/// Keep only the leading `digits.dd` portion of a raw price string.
///
/// `"123.4567 USD"` yields `123.45`; anything without that prefix is rejected.
pub fn extract_price(raw: &str) -> Result<f64, FetchError> {
    let trimmed = raw.trim();
    let matched = PRICE_PATTERN
        .find(trimmed)
        .ok_or_else(|| FetchError::MalformedPrice(raw.to_string()))?;
    matched
        .as_str()
        .parse::<f64>()
        .map_err(|_| FetchError::MalformedPrice(raw.to_string()))
}
