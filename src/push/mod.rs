//! Change propagation.
//!
//! ```text
//! ViewModel ──request()──> PushRequest ──> channel ──> push cycle
//!                                                       │
//!          registry snapshot ─┬─ lock cell ─ accept ─ dispatch(conn, id, diff)
//!                             └─ ...every entry
//! ```
//!
//! A cycle always scans the whole registry: one instance's mutation may
//! cascade into another's change set.
//!
//! # Modules
//!
//! - `payload` - Payload encoding and ignored-property filtering
//! - `worker` - Background thread draining push requests

pub mod payload;
mod worker;

use std::fmt;
use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender};

use crate::registry::InstanceRegistry;

pub use worker::PushWorker;

/// Outbound sink: `(connection_id, vm_id, payload)`. Fire and forget.
pub type DispatchFn = Arc<dyn Fn(&str, &str, &str) + Send + Sync>;

/// An instance changed on its own and wants a push cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub vm_id: String,
}

/// Handle a view model uses to ask for a push cycle.
#[derive(Clone)]
pub struct PushRequester {
    vm_id: String,
    tx: Sender<PushRequest>,
}

impl PushRequester {
    pub fn new(vm_id: impl Into<String>, tx: Sender<PushRequest>) -> Self {
        Self {
            vm_id: vm_id.into(),
            tx,
        }
    }

    pub fn vm_id(&self) -> &str {
        &self.vm_id
    }

    /// Signal that this instance has changes to push.
    ///
    /// Never blocks. A request after the engine is gone is dropped.
    pub fn request(&self) {
        let request = PushRequest {
            vm_id: self.vm_id.clone(),
        };
        if self.tx.send(request).is_err() {
            crate::debug!("push"; "request from {} after shutdown", self.vm_id);
        }
    }
}

impl fmt::Debug for PushRequester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushRequester")
            .field("vm_id", &self.vm_id)
            .finish()
    }
}

/// Drain every queued request without blocking. Returns how many there were.
pub fn drain_requests(rx: &Receiver<PushRequest>) -> usize {
    rx.try_iter()
        .inspect(|request| crate::debug!("push"; "request from {}", request.vm_id))
        .count()
}

/// Run one push cycle over the whole registry.
///
/// For every entry with a connection and pending changes: under the
/// instance's lock, take the change set, strip ignored properties, dispatch
/// the diff. Entries without a connection keep their changes pending.
/// Returns the number of diffs dispatched.
pub fn push_all(registry: &InstanceRegistry, dispatch: &DispatchFn, pretty: bool) -> usize {
    let mut dispatched = 0;

    for entry in registry.snapshot() {
        let mut vm = entry.cell.lock();
        if vm.changes().is_empty() {
            continue;
        }
        // Re-read under the lock: the entry may have moved or been disposed.
        let Some(connection) = registry.connection_of(&entry.vm_id) else {
            crate::debug!("push"; "{} has no connection, keeping changes", entry.vm_id);
            continue;
        };

        let mut diff = vm.accept_changes();
        payload::strip_ignored(&mut diff, vm.ignored_properties());
        if diff.is_empty() {
            continue;
        }
        match payload::encode(diff, pretty) {
            Ok(text) => {
                dispatch(&connection, &entry.vm_id, &text);
                dispatched += 1;
            }
            Err(e) => crate::log!("error"; "cannot encode diff for {}: {}", entry.vm_id, e),
        }
    }

    if dispatched > 0 {
        crate::debug!("push"; "dispatched {} diff(s)", dispatched);
    }
    dispatched
}
