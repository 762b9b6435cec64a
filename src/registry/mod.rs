//! Live view model instances keyed by composite id.
//!
//! # Locking
//!
//! ```text
//! entries   DashMap       insert / lookup / remove are individually atomic
//! creation  ReentrantMutex  "check absent then create" for master ids
//! cell      Mutex (per instance)  updates vs push snapshots
//! ```
//!
//! The creation lock is reentrant because resolving a master may resolve
//! its own master on the same thread. Never hold a map reference while
//! locking a cell: lookups clone the `Arc` out first.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use crate::vm::ViewModel;

/// Exclusive cell guarding one instance and its change set.
pub type VmCell = Mutex<Box<dyn ViewModel>>;

/// Registry entry: the instance and the connection it last came from.
pub struct VmEntry {
    cell: Arc<VmCell>,
    connection: Option<String>,
}

impl VmEntry {
    pub fn new(cell: Arc<VmCell>, connection: Option<String>) -> Self {
        Self { cell, connection }
    }

    pub fn cell(&self) -> &Arc<VmCell> {
        &self.cell
    }

    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }
}

/// Point-in-time view of one entry, detached from the map.
pub struct EntrySnapshot {
    pub vm_id: String,
    pub cell: Arc<VmCell>,
    pub connection: Option<String>,
}

/// Concurrent map from composite id to live instance.
#[derive(Default)]
pub struct InstanceRegistry {
    entries: DashMap<String, VmEntry>,
    creation: ReentrantMutex<()>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an instance in its exclusive cell.
    pub fn cell(vm: Box<dyn ViewModel>) -> Arc<VmCell> {
        Arc::new(Mutex::new(vm))
    }

    /// Serialize "check absent then create" across threads.
    pub fn creation_guard(&self) -> ReentrantMutexGuard<'_, ()> {
        self.creation.lock()
    }

    pub fn get(&self, vm_id: &str) -> Option<Arc<VmCell>> {
        self.entries.get(vm_id).map(|e| Arc::clone(&e.cell))
    }

    pub fn contains(&self, vm_id: &str) -> bool {
        self.entries.contains_key(vm_id)
    }

    pub fn connection_of(&self, vm_id: &str) -> Option<String> {
        self.entries
            .get(vm_id)
            .and_then(|e| e.connection.clone())
    }

    /// Insert unless the id is taken. Returns the cell that ends up registered
    /// and whether it is the one passed in.
    pub fn insert_if_absent(
        &self,
        vm_id: &str,
        cell: Arc<VmCell>,
        connection: Option<String>,
    ) -> (Arc<VmCell>, bool) {
        match self.entries.entry(vm_id.to_string()) {
            Entry::Occupied(occupied) => (Arc::clone(&occupied.get().cell), false),
            Entry::Vacant(vacant) => {
                vacant.insert(VmEntry::new(Arc::clone(&cell), connection));
                crate::debug!("registry"; "registered {}", vm_id);
                (cell, true)
            }
        }
    }

    /// Point an existing entry at a new connection. Returns false if absent.
    pub fn refresh_connection(&self, vm_id: &str, connection: &str) -> bool {
        match self.entries.get_mut(vm_id) {
            Some(mut entry) => {
                if entry.connection.as_deref() != Some(connection) {
                    crate::debug!("registry"; "{} now on connection {}", vm_id, connection);
                    entry.connection = Some(connection.to_string());
                }
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, vm_id: &str) -> Option<VmEntry> {
        self.entries.remove(vm_id).map(|(_, entry)| entry)
    }

    /// Detached copies of every entry, for a full push scan.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.entries
            .iter()
            .map(|e| EntrySnapshot {
                vm_id: e.key().clone(),
                cell: Arc::clone(&e.cell),
                connection: e.connection.clone(),
            })
            .collect()
    }

    /// Remove and return every entry.
    pub fn drain(&self) -> Vec<(String, VmEntry)> {
        let ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .collect()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
