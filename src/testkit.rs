//! Deterministic collaborators for tests and benches.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::display::{DisplaySurface, Tone};
use crate::error::FetchError;
use crate::fetcher::QuoteSource;
use crate::quote::Quote;

#[derive(Debug, Clone)]
enum Script {
    Price(f64),
    Failure(FetchError),
}

/// Quote source answering from a fixed script. Unscripted symbols fail with HTTP 404.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    budget: Duration,
    scripts: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    echoes: HashMap<String, String>,
    started: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            scripts: HashMap::new(),
            delays: HashMap::new(),
            echoes: HashMap::new(),
            started: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.scripts.insert(symbol.to_string(), Script::Price(price));
        self
    }

    pub fn with_failure(mut self, symbol: &str, err: FetchError) -> Self {
        self.scripts.insert(symbol.to_string(), Script::Failure(err));
        self
    }

    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    /// Answer lookups for `symbol` with a different echoed symbol.
    pub fn with_echo(mut self, symbol: &str, echo: &str) -> Self {
        self.echoes.insert(symbol.to_string(), echo.to_string());
        self
    }

    /// Number of lookups that have begun.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of lookups that ran to completion (not abandoned).
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    async fn fetch(&self, symbol: &str) -> Result<Quote, FetchError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
        let outcome = match self.scripts.get(symbol) {
            Some(Script::Price(price)) => Ok(Quote {
                symbol: Some(
                    self.echoes
                        .get(symbol)
                        .cloned()
                        .unwrap_or_else(|| symbol.to_string()),
                ),
                price: *price,
            }),
            Some(Script::Failure(err)) => Err(err.clone()),
            None => Err(FetchError::Status(404)),
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    fn time_budget(&self) -> Duration {
        self.budget
    }
}

/// Display surface that records writes in memory.
#[derive(Debug, Default)]
pub struct MemorySurface {
    cells: BTreeMap<(u16, u16), (String, Tone)>,
    flushes: usize,
    fail_draws: bool,
}

impl MemorySurface {
    /// A surface whose every write fails, as a detached terminal would.
    pub fn broken() -> Self {
        Self {
            fail_draws: true,
            ..Self::default()
        }
    }

    /// Current screen contents as `(row, text, tone)`, top to bottom.
    pub fn lines(&self) -> Vec<(u16, String, Tone)> {
        self.cells
            .iter()
            .map(|((y, _), (text, tone))| (*y, text.clone(), *tone))
            .collect()
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl DisplaySurface for MemorySurface {
    fn clear(&mut self) -> io::Result<()> {
        self.cells.clear();
        Ok(())
    }

    fn put_str(&mut self, x: u16, y: u16, text: &str, tone: Tone) -> io::Result<()> {
        if self.fail_draws {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "surface closed"));
        }
        self.cells.insert((y, x), (text.to_string(), tone));
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
