use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

/// Where log lines go. The terminal table owns stdout while it is on screen,
/// so the watcher switches to a file or to silence before drawing.
enum Sink {
    Console,
    File(File),
    Silent,
}

static SINK: Lazy<Mutex<Sink>> = Lazy::new(|| Mutex::new(Sink::Console));

#[derive(Serialize)]
struct LogEvent<'a> {
    level: &'a str,
    event: &'a str,
    message: &'a str,
    timestamp_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

pub fn set_silent(silent: bool) {
    let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
    *sink = if silent { Sink::Silent } else { Sink::Console };
}

pub fn set_log_file(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
    *sink = Sink::File(file);
    Ok(())
}

fn emit(level: &str, event: &str, message: &str, metadata: Option<Value>) {
    let entry = LogEvent {
        level,
        event,
        message,
        timestamp_ms: current_timestamp_ms(),
        metadata,
    };

    let payload = match serde_json::to_string(&entry) {
        Ok(payload) => payload,
        Err(err) => format!(
            "{{\"level\":\"error\",\"event\":\"logging_failure\",\"message\":\"failed to serialise log\",\"error\":\"{err}\"}}"
        ),
    };

    let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
    match &mut *sink {
        Sink::Console => {
            if level == "error" {
                eprintln!("{payload}");
            } else {
                println!("{payload}");
            }
        }
        Sink::File(file) => {
            let _ = writeln!(file, "{payload}");
        }
        Sink::Silent => {}
    }
}

pub fn info(event: &str, message: &str, metadata: Value) {
    emit("info", event, message, Some(metadata));
}

pub fn warn(event: &str, message: &str, metadata: Value) {
    emit("warn", event, message, Some(metadata));
}

pub fn error(event: &str, message: &str, metadata: Value) {
    emit("error", event, message, Some(metadata));
}

pub fn info_simple(event: &str, message: &str) {
    emit("info", event, message, None);
}

fn current_timestamp_ms() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
