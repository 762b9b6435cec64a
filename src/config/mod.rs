//! Engine configuration from `vmsync.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── log        # [log]
//! │   ├── payload    # [payload]
//! │   └── push       # [push]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # HubConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section     | Purpose                                   |
//! |-------------|-------------------------------------------|
//! | `[log]`     | Verbose output                            |
//! | `[push]`    | Background push worker                    |
//! | `[payload]` | Outbound JSON encoding                    |
//!
//! Every section is optional; a missing file section means defaults.

pub mod section;
pub mod types;
mod util;

pub use section::{LogConfig, PayloadConfig, PushConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};
pub use util::find_config_file;

use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "vmsync.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `vmsync.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Absolute path to the config file (empty when not loaded from disk)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub payload: PayloadConfig,
}

impl HubConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_path(path)?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Search upward from `start` for `vmsync.toml` and load it.
    ///
    /// No file found means the default configuration.
    pub fn discover(start: &Path) -> Result<Self> {
        match find_config_file(start, Path::new(CONFIG_FILE)) {
            Some(path) => Self::load(&path),
            None => {
                crate::debug!("config"; "no {} above {}, using defaults", CONFIG_FILE, start.display());
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply process-wide settings (verbose logging).
    pub fn apply(&self) {
        crate::logger::set_verbose(self.log.verbose);
    }

    /// Read a file and report, but tolerate, unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("config"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section, collecting all errors at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.push.validate(&mut diag);
        if !self.push.background && self.push.worker_name != PushConfig::default().worker_name {
            diag.warn(
                PushConfig::WORKER_NAME,
                "has no effect unless `push.background` is enabled",
            );
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text. Panics on unknown fields (catches typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> HubConfig {
    let (parsed, ignored) = HubConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
