//! Append-only audit and error logs, newline-delimited JSON.
//!
//! Writes are fire-and-forget: a failed append is reported through tracing
//! and never interrupts the turn that produced it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::warn;

pub trait AuditLog: Send + Sync {
    /// Records one structured agent event, timestamped at write time.
    fn agent_event(&self, event: Value);

    /// Records an unexpected failure to the separate error channel.
    fn error(&self, message: &str, extra: Value);
}

pub struct FileAuditLog {
    audit_path: PathBuf,
    error_path: PathBuf,
}

impl FileAuditLog {
    pub fn new(audit_path: PathBuf, error_path: PathBuf) -> Self {
        Self {
            audit_path,
            error_path,
        }
    }

    pub fn audit_path(&self) -> &Path {
        &self.audit_path
    }

    fn append_line(path: &Path, payload: &Value) {
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{payload}")
        })();
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "audit append failed");
        }
    }
}

fn with_timestamp(event: Value) -> Value {
    let mut map = Map::new();
    map.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
    if let Value::Object(fields) = event {
        map.extend(fields);
    }
    Value::Object(map)
}

impl AuditLog for FileAuditLog {
    fn agent_event(&self, event: Value) {
        Self::append_line(&self.audit_path, &with_timestamp(event));
    }

    fn error(&self, message: &str, extra: Value) {
        let payload = with_timestamp(json!({
            "level": "ERROR",
            "message": message,
            "extra": extra,
        }));
        Self::append_line(&self.error_path, &payload);
    }
}

/// Discards everything; convenient for tests and tooling.
pub struct NullAuditLog;

impl AuditLog for NullAuditLog {
    fn agent_event(&self, _event: Value) {}
    fn error(&self, _message: &str, _extra: Value) {}
}
