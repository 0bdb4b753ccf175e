use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::store::Symbol;

/// Failure of a single quote lookup. Always recovered inside a poll cycle.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("quote lookup exceeded {0:?}")]
    Timeout(Duration),
    #[error("quote source answered with HTTP {0}")]
    Status(u16),
    #[error("undecodable quote payload: {0}")]
    Decode(String),
    #[error("quote payload carried no resources")]
    EmptyPayload,
    #[error("quote payload carried no price field")]
    MissingPrice,
    #[error("price field {0:?} does not start with a two-decimal figure")]
    MalformedPrice(String),
    #[error("fetch worker aborted: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Misuse of the price store. Indicates a construction bug, not a runtime condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("update issued for unregistered symbol {0:?}")]
    UnregisteredSymbol(Symbol),
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("startup failed: {0}")]
    Startup(String),
    #[error("display surface unavailable: {0}")]
    DisplaySurface(#[source] io::Error),
    #[error("failed to draw snapshot: {0}")]
    Render(#[source] io::Error),
    #[error(transparent)]
    Invariant(#[from] StoreError),
}

