use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tokio::time::{self, Instant};

use crate::config::WatcherConfig;
use crate::display::{DisplaySurface, Renderer, TerminalSurface};
use crate::error::WatchError;
use crate::fetcher::{HttpQuoteFetcher, QuoteSource};
use crate::logging;
use crate::poll::{self, CycleReport};
use crate::shutdown::{self, ShutdownSignal};
use crate::store::PriceStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub cycles: u64,
    pub last_report: Option<CycleReport>,
}

/// Drives poll cycles at a fixed interval until asked to stop.
pub struct Watcher {
    interval: Duration,
    max_cycles: Option<u64>,
    store: Arc<PriceStore>,
    source: Arc<dyn QuoteSource>,
    renderer: Renderer,
    state: LoopState,
}

impl Watcher {
    pub fn new(config: &WatcherConfig, source: Arc<dyn QuoteSource>) -> Self {
        Self {
            interval: config.interval,
            max_cycles: config.max_cycles,
            store: Arc::new(PriceStore::with_symbols(config.symbols.iter().cloned())),
            source,
            renderer: Renderer::new(config.display.clone()),
            state: LoopState::Running,
        }
    }

    pub fn store(&self) -> Arc<PriceStore> {
        Arc::clone(&self.store)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until a stop is requested (or `max_cycles` is reached).
    ///
    /// A stop request is only honoured between cycles: an in-flight cycle always
    /// finishes its fan-in and is drawn before the loop exits.
    pub async fn run<S>(
        &mut self,
        surface: &mut S,
        mut shutdown_rx: watch::Receiver<ShutdownSignal>,
    ) -> Result<RunSummary, WatchError>
    where
        S: DisplaySurface + ?Sized,
    {
        self.state = LoopState::Running;
        logging::info(
            "watcher.start",
            "Stock watcher started",
            json!({
                "symbols": self.store.symbols(),
                "interval_ms": self.interval.as_millis(),
            }),
        );

        let mut summary = RunSummary::default();
        let outcome = self.drive(surface, &mut shutdown_rx, &mut summary).await;
        self.state = LoopState::Stopped;

        logging::info(
            "watcher.stop",
            "Stock watcher stopped",
            json!({ "cycles": summary.cycles, "clean": outcome.is_ok() }),
        );
        outcome.map(|()| summary)
    }

    async fn drive<S>(
        &mut self,
        surface: &mut S,
        shutdown_rx: &mut watch::Receiver<ShutdownSignal>,
        summary: &mut RunSummary,
    ) -> Result<(), WatchError>
    where
        S: DisplaySurface + ?Sized,
    {
        while self.state == LoopState::Running {
            let cycle = summary.cycles + 1;
            let report =
                poll::run_cycle(cycle, Arc::clone(&self.source), Arc::clone(&self.store)).await?;
            summary.cycles = cycle;
            summary.last_report = Some(report);

            self.renderer
                .draw(&self.store.snapshot(), cycle, surface)
                .map_err(WatchError::Render)?;

            if *shutdown_rx.borrow_and_update() == ShutdownSignal::Requested {
                self.state = LoopState::Stopping;
                break;
            }
            if self.max_cycles.is_some_and(|max| cycle >= max) {
                logging::info(
                    "watcher.limit",
                    "Watcher reached its cycle budget",
                    json!({ "max_cycles": cycle }),
                );
                self.state = LoopState::Stopping;
                break;
            }

            self.state = wait_for_tick(self.interval, shutdown_rx).await;
        }
        Ok(())
    }
}

/// Race the next tick against a stop request.
async fn wait_for_tick(
    interval: Duration,
    shutdown_rx: &mut watch::Receiver<ShutdownSignal>,
) -> LoopState {
    let deadline = Instant::now() + interval;
    loop {
        tokio::select! {
            _ = time::sleep_until(deadline) => return LoopState::Running,
            changed = shutdown_rx.changed() => {
                match changed {
                    Ok(()) if *shutdown_rx.borrow_and_update() == ShutdownSignal::None => continue,
                    // Requested, or every sender is gone and no stop can arrive any more.
                    _ => return LoopState::Stopping,
                }
            }
        }
    }
}

/// Run the watcher against the real terminal and HTTP quote source.
pub async fn run(config: WatcherConfig) -> Result<RunSummary, WatchError> {
    config.validate()?;

    match &config.log_file {
        Some(path) => logging::set_log_file(path).map_err(|err| {
            WatchError::Startup(format!("cannot open log file {}: {err}", path.display()))
        })?,
        None => logging::set_silent(true),
    }

    let fetcher = HttpQuoteFetcher::new(config.fetcher.clone())
        .map_err(|err| WatchError::Startup(err.to_string()))?;
    let mut watcher = Watcher::new(&config, Arc::new(fetcher));

    let mut surface = TerminalSurface::open().map_err(WatchError::DisplaySurface)?;
    logging::info_simple("display.open", "Terminal surface initialised");

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let signals_task = shutdown::spawn_signal_listener(shutdown_tx.clone());
    let keyboard_task = shutdown::spawn_keyboard_listener(shutdown_tx);

    let result = watcher.run(&mut surface, shutdown_rx).await;

    signals_task.abort();
    keyboard_task.abort();
    let _ = signals_task.await;
    let _ = keyboard_task.await;
    drop(surface);

    if let Err(err) = &result {
        logging::error(
            "watcher.error",
            "Stock watcher aborted",
            json!({ "error": err.to_string() }),
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{MemorySurface, ScriptedSource};

    fn config(symbols: &[&str], interval: Duration) -> WatcherConfig {
        WatcherConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            interval,
            ..WatcherConfig::default()
        }
    }

    #[tokio::test]
    async fn max_cycles_bounds_the_loop() {
        logging::set_silent(true);
        let mut config = config(&["AAPL"], Duration::from_millis(5));
        config.max_cycles = Some(3);
        let source = ScriptedSource::new(Duration::from_secs(1)).with_price("AAPL", 10.0);

        let mut watcher = Watcher::new(&config, Arc::new(source.clone()));
        let (_tx, rx) = shutdown::channel();
        let mut surface = MemorySurface::default();

        let summary = watcher.run(&mut surface, rx).await.expect("run");
        assert_eq!(summary.cycles, 3);
        assert_eq!(source.started(), 3);
        assert_eq!(surface.flushes(), 3);
        assert_eq!(watcher.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn render_failure_stops_the_loop() {
        logging::set_silent(true);
        let config = config(&["AAPL"], Duration::from_millis(5));
        let source = ScriptedSource::new(Duration::from_secs(1)).with_price("AAPL", 10.0);

        let mut watcher = Watcher::new(&config, Arc::new(source));
        let (_tx, rx) = shutdown::channel();
        let mut surface = MemorySurface::broken();

        let err = watcher.run(&mut surface, rx).await.unwrap_err();
        assert!(matches!(err, WatchError::Render(_)));
        assert_eq!(watcher.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn dropped_sender_stops_after_current_cycle() {
        logging::set_silent(true);
        let config = config(&["AAPL"], Duration::from_secs(60));
        let source = ScriptedSource::new(Duration::from_secs(1)).with_price("AAPL", 10.0);

        let mut watcher = Watcher::new(&config, Arc::new(source));
        let (tx, rx) = shutdown::channel();
        drop(tx);
        let mut surface = MemorySurface::default();

        let summary = time::timeout(Duration::from_secs(5), watcher.run(&mut surface, rx))
            .await
            .expect("watcher should not wait out the interval")
            .expect("run");
        assert_eq!(summary.cycles, 1);
    }
}
