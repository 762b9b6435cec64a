//! `[log]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [log]
//! verbose = true      # Print debug! output
//! ```

use serde::{Deserialize, Serialize};

/// Terminal logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Enable `debug!` output.
    pub verbose: bool,
}
