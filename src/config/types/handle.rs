//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads and atomic replacement. Controllers
//! built without an explicit config read it here.

use crate::config::HubConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<HubConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(HubConfig::default()));

#[inline]
pub fn cfg() -> Arc<HubConfig> {
    CONFIG.load_full()
}

/// Install `config` globally and apply its process-wide settings.
#[inline]
pub fn init_config(config: HubConfig) -> Arc<HubConfig> {
    config.apply();
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
