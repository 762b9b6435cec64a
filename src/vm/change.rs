//! Pending property changes of a view model.
//!
//! A [`ChangeSet`] is a cheap handle: clones share the same log, so a view
//! model can hand one to shared state that mutates it from elsewhere (a
//! sibling instance, a master). Every operation takes the log's own lock for
//! a short, non-nested critical section.
//!
//! # Collection conventions
//!
//! | Key               | Meaning                                 |
//! |-------------------|-----------------------------------------|
//! | `<prop>_add`      | item(s) appended to the collection      |
//! | `<prop>_update`   | item(s) replaced in the collection      |
//! | `<prop>_remove`   | key(s) of removed items                 |
//! | `<prop>_itemKey`  | name of the item property used as key   |

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::convert::{to_value, value_text};

pub const ADD_SUFFIX: &str = "_add";
pub const UPDATE_SUFFIX: &str = "_update";
pub const REMOVE_SUFFIX: &str = "_remove";
pub const ITEM_KEY_SUFFIX: &str = "_itemKey";

#[derive(Debug, Default)]
struct ChangeLog {
    /// Changes not yet pushed, keyed by property path.
    pending: Map<String, Value>,
    /// Last value acknowledged per property path. Collection deltas never
    /// enter it.
    accepted: Map<String, Value>,
    /// Collection keys whose pending value is an accumulated array.
    batched: FxHashSet<String>,
    /// Pending keys written through the collection conventions.
    deltas: FxHashSet<String>,
}

/// Shared, lock-guarded mapping from property path to pending value.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    log: Arc<Mutex<ChangeLog>>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a changed property. Later records for the same path win.
    pub fn record<V: Serialize + ?Sized>(&self, path: impl Into<String>, value: &V) {
        self.record_value(path, to_value(value));
    }

    pub fn record_value(&self, path: impl Into<String>, value: Value) {
        let path = path.into();
        let mut log = self.log.lock();
        log.batched.remove(&path);
        log.deltas.remove(&path);
        log.pending.insert(path, value);
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.log.lock().pending.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.log.lock().pending.contains_key(path)
    }

    pub fn remove(&self, path: &str) -> Option<Value> {
        let mut log = self.log.lock();
        log.batched.remove(path);
        log.deltas.remove(path);
        log.pending.remove(path)
    }

    /// Drop the pending entry for `path` if its text form equals `raw`.
    ///
    /// Returns true when an entry was removed.
    pub fn remove_if_text_eq(&self, path: &str, raw: &str) -> bool {
        let mut log = self.log.lock();
        let matches = log
            .pending
            .get(path)
            .is_some_and(|stored| value_text(stored) == raw);
        if matches {
            log.pending.remove(path);
        }
        matches
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.log.lock().pending.len()
    }

    /// Copy of the pending entries.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.log.lock().pending.clone()
    }

    /// Atomically take every pending entry.
    ///
    /// The returned map is exactly what was cleared: nothing recorded
    /// concurrently can fall between the snapshot and the clear. Property
    /// values are remembered in the accepted ledger; collection deltas are
    /// one-shot and are not.
    pub fn accept(&self) -> Map<String, Value> {
        let mut log = self.log.lock();
        let ChangeLog {
            pending,
            accepted,
            batched,
            deltas,
        } = &mut *log;
        let taken = std::mem::take(pending);
        for (path, value) in taken.iter().filter(|(path, _)| !deltas.contains(*path)) {
            accepted.insert(path.clone(), value.clone());
        }
        batched.clear();
        deltas.clear();
        taken
    }

    /// Record a value as already acknowledged without making it pending.
    ///
    /// The ledger is bookkeeping: pushes never read it. The controller
    /// consults it when an update recreates an expired instance.
    pub fn mark_accepted(&self, path: impl Into<String>, value: Value) {
        self.log.lock().accepted.insert(path.into(), value);
    }

    /// Last acknowledged value for a path.
    pub fn accepted(&self, path: &str) -> Option<Value> {
        self.log.lock().accepted.get(path).cloned()
    }

    // =========================================================================
    // Collection conventions
    // =========================================================================

    /// Record an item appended to collection `property`.
    pub fn add_item<V: Serialize + ?Sized>(&self, property: &str, item: &V) {
        self.accumulate(format!("{property}{ADD_SUFFIX}"), to_value(item));
    }

    /// Record an item replaced in collection `property`.
    pub fn update_item<V: Serialize + ?Sized>(&self, property: &str, item: &V) {
        self.accumulate(format!("{property}{UPDATE_SUFFIX}"), to_value(item));
    }

    /// Record the key of an item removed from collection `property`.
    pub fn remove_item<K: Serialize + ?Sized>(&self, property: &str, key: &K) {
        self.accumulate(format!("{property}{REMOVE_SUFFIX}"), to_value(key));
    }

    /// Declare which item property identifies elements of `property`.
    pub fn item_key(&self, property: &str, key_name: &str) {
        let key = format!("{property}{ITEM_KEY_SUFFIX}");
        let mut log = self.log.lock();
        log.batched.remove(&key);
        log.deltas.insert(key.clone());
        log.pending
            .insert(key, Value::String(key_name.to_string()));
    }

    /// A second entry under the same key turns the value into an array,
    /// so no item is lost before the next push.
    fn accumulate(&self, key: String, value: Value) {
        let mut log = self.log.lock();
        let ChangeLog {
            pending,
            batched,
            deltas,
            ..
        } = &mut *log;
        deltas.insert(key.clone());
        match pending.get_mut(&key) {
            Some(Value::Array(items)) if batched.contains(&key) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
                batched.insert(key);
            }
            None => {
                pending.insert(key, value);
            }
        }
    }
}
