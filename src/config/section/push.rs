//! `[push]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [push]
//! background = true           # Drain push requests on a worker thread (default)
//! worker_name = "vmsync-push" # Worker thread name
//! ```
//!
//! With `background = false`, autonomous push requests are only drained by
//! the next request/update or an explicit `process_push_requests()` call.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Push cycle scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub background: bool,
    pub worker_name: String,
}

impl PushConfig {
    pub const WORKER_NAME: FieldPath = FieldPath::new("push.worker_name");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.background && self.worker_name.trim().is_empty() {
            diag.error_with_hint(
                Self::WORKER_NAME,
                "worker name must not be empty when background push is enabled",
                "set `worker_name` or disable `background`",
            );
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            background: true,
            worker_name: "vmsync-push".to_string(),
        }
    }
}
