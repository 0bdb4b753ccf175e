use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures_util::StreamExt;
use serde_json::json;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::logging;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownSignal {
    None,
    Requested,
}

pub fn channel() -> (watch::Sender<ShutdownSignal>, watch::Receiver<ShutdownSignal>) {
    watch::channel(ShutdownSignal::None)
}

/// Ask the watcher to stop. Returns `false` when a stop was already requested.
pub fn request(shutdown_tx: &watch::Sender<ShutdownSignal>) -> bool {
    shutdown_tx.send_if_modified(|current| {
        if *current == ShutdownSignal::Requested {
            return false;
        }
        *current = ShutdownSignal::Requested;
        true
    })
}

pub fn spawn_signal_listener(shutdown_tx: watch::Sender<ShutdownSignal>) -> JoinHandle<Result<()>> {
    tokio::spawn(handle_signals(shutdown_tx))
}

/// Any key press stops the watcher. Other terminal events are ignored.
pub fn spawn_keyboard_listener(shutdown_tx: watch::Sender<ShutdownSignal>) -> JoinHandle<Result<()>> {
    tokio::spawn(handle_keys(shutdown_tx))
}

async fn handle_signals(shutdown_tx: watch::Sender<ShutdownSignal>) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("failed to register SIGINT handler")?;

    loop {
        let name = tokio::select! {
            received = sigterm.recv() => match received {
                Some(()) => "SIGTERM",
                None => break,
            },
            received = sigint.recv() => match received {
                Some(()) => "SIGINT",
                None => break,
            },
        };
        logging::info(
            "signal.received",
            "Signal received, stopping after the current cycle",
            json!({ "signal": name }),
        );
        request(&shutdown_tx);
    }

    Ok(())
}

async fn handle_keys(shutdown_tx: watch::Sender<ShutdownSignal>) -> Result<()> {
    let mut events = EventStream::new();
    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                logging::info(
                    "input.key",
                    "Key pressed, stopping after the current cycle",
                    json!({ "key": format!("{:?}", key.code) }),
                );
                request(&shutdown_tx);
            }
            Ok(_) => {}
            Err(err) => {
                logging::warn(
                    "input.error",
                    "Terminal event stream failed",
                    json!({ "error": err.to_string() }),
                );
                break;
            }
        }
    }
    Ok(())
}
