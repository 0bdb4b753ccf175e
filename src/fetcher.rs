use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::quote::{Quote, QuoteEnvelope};

/// One bounded lookup of the latest quote for a symbol.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError>;

    /// Upper bound a single lookup may take before it is abandoned.
    fn time_budget(&self) -> Duration;
}

/// Quote source backed by an HTTP JSON endpoint.
#[derive(Clone, Debug)]
pub struct HttpQuoteFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpQuoteFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteFetcher {
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError> {
        let url = self.config.url_for(symbol);
        let timeout = self.config.timeout;
        let on_error = |err: reqwest::Error| {
            if err.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::from(err)
            }
        };

        let envelope = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(on_error)?
            .json::<QuoteEnvelope>()
            .await
            .map_err(on_error)?;

        Quote::try_from(envelope)
    }

    fn time_budget(&self) -> Duration {
        self.config.timeout
    }
}
