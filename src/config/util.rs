//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find a config file by searching upward from `start`.
///
/// An absolute `config_name` that exists is returned as is.
///
/// # Example
/// ```text
/// /srv/app/handlers/chat/   ← start
/// /srv/app/vmsync.toml      ← found
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}
