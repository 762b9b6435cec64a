//! Process-wide type catalog.
//!
//! Uses `arc-swap` for lock-free reads. Written at startup, read by every
//! controller that was not given its own catalog.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use super::TypeCatalog;

/// Global catalog storage.
static CATALOG: LazyLock<ArcSwap<TypeCatalog>> =
    LazyLock::new(|| ArcSwap::from_pointee(TypeCatalog::default()));

#[inline]
pub fn catalog() -> Arc<TypeCatalog> {
    CATALOG.load_full()
}

/// Install a fully built catalog.
#[inline]
pub fn init_catalog(catalog: TypeCatalog) -> Arc<TypeCatalog> {
    let arc = Arc::new(catalog);
    CATALOG.store(Arc::clone(&arc));
    arc
}

/// Add registrations on top of the current catalog.
pub fn register_types(f: impl FnOnce(&mut TypeCatalog)) -> Arc<TypeCatalog> {
    let mut next = (*catalog()).clone();
    f(&mut next);
    init_catalog(next)
}

/// Empty the global catalog (test isolation, teardown).
pub fn reset_catalog() {
    CATALOG.store(Arc::new(TypeCatalog::default()));
}
