//! `[payload]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [payload]
//! pretty = true   # Pretty-print outbound JSON
//! ```

use serde::{Deserialize, Serialize};

/// Outbound payload encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    pub pretty: bool,
}
