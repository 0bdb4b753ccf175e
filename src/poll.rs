use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time;

use crate::error::{FetchError, StoreError};
use crate::fetcher::QuoteSource;
use crate::logging;
use crate::store::{PriceStore, Symbol};

/// Price recorded for a symbol whose lookup failed this cycle.
pub const NO_DATA: f64 = 0.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub succeeded: usize,
    pub failed: Vec<(Symbol, FetchError)>,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

/// Fetch every registered symbol concurrently and merge the results.
///
/// Returns only once every worker has resolved, either with a price or with a
/// failure (including its own time budget expiring). Failed symbols are
/// recorded as [`NO_DATA`].
pub async fn run_cycle(
    cycle: u64,
    source: Arc<dyn QuoteSource>,
    store: Arc<PriceStore>,
) -> Result<CycleReport, StoreError> {
    let started = Instant::now();
    let budget = source.time_budget();

    let workers: Vec<(Symbol, JoinHandle<Result<Result<f64, FetchError>, StoreError>>)> = store
        .symbols()
        .into_iter()
        .map(|symbol| {
            let source = Arc::clone(&source);
            let store = Arc::clone(&store);
            let task_symbol = symbol.clone();
            let handle =
                tokio::spawn(async move { fetch_and_merge(&task_symbol, source, budget, store).await });
            (symbol, handle)
        })
        .collect();

    let mut report = CycleReport {
        cycle,
        ..CycleReport::default()
    };

    for (symbol, handle) in workers {
        let outcome = match handle.await {
            Ok(merged) => merged?,
            Err(join_err) => {
                // The worker died before merging, so the sentinel is written here.
                store.update(&symbol, NO_DATA)?;
                Err(FetchError::Aborted(join_err.to_string()))
            }
        };
        match outcome {
            Ok(_) => report.succeeded += 1,
            Err(err) => {
                logging::warn(
                    "poll.fetch_failed",
                    "Quote lookup failed, recording no data",
                    json!({ "cycle": cycle, "symbol": symbol, "error": err.to_string() }),
                );
                report.failed.push((symbol, err));
            }
        }
    }

    report.elapsed = started.elapsed();
    logging::info(
        "poll.cycle",
        "Poll cycle completed",
        json!({
            "cycle": cycle,
            "succeeded": report.succeeded,
            "failed": report.failed.len(),
            "elapsed_ms": report.elapsed.as_millis(),
        }),
    );
    Ok(report)
}

async fn fetch_and_merge(
    symbol: &str,
    source: Arc<dyn QuoteSource>,
    budget: Duration,
    store: Arc<PriceStore>,
) -> Result<Result<f64, FetchError>, StoreError> {
    let fetched = match time::timeout(budget, source.fetch(symbol)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(budget)),
    };

    match fetched {
        Ok(quote) => {
            if let Some(echo) = quote.symbol.as_deref().filter(|echo| *echo != symbol) {
                logging::warn(
                    "poll.symbol_mismatch",
                    "Quote source echoed a different symbol",
                    json!({ "requested": symbol, "echoed": echo }),
                );
            }
            store.update(symbol, quote.price)?;
            Ok(Ok(quote.price))
        }
        Err(err) => {
            store.update(symbol, NO_DATA)?;
            Ok(Err(err))
        }
    }
}
