use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// Keys stamped on every line. Payload entries with these names are dropped.
pub const RESERVED_KEYS: [&str; 3] = ["type", "seq", "ts"];

/// Diagnostic trace of one process, appended to `events.jsonl`.
///
/// Each line is a compact JSON object carrying `type`, a `seq` that starts at 1
/// and grows by one per line written through this writer (or any clone), and
/// `ts`. Session-scoped events add their own `session_id` in the payload.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<TraceFile>,
}

#[derive(Debug)]
struct TraceFile {
    path: PathBuf,
    last_seq: Mutex<u64>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(TraceFile {
                path: path.into(),
                last_seq: Mutex::new(0),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut last_seq = self
            .inner
            .last_seq
            .lock()
            .map_err(|_| anyhow::anyhow!("event trace lock poisoned"))?;
        let seq = *last_seq + 1;

        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(event_type.to_string()));
        event.insert("seq".to_string(), Value::from(seq));
        event.insert(
            "ts".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        event.extend(
            payload
                .into_iter()
                .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str())),
        );

        if let Some(parent) = self.inner.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?
            .write_all(line.as_bytes())?;

        *last_seq = seq;
        Ok(Value::Object(event))
    }
}
