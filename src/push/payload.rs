//! Outbound payload encoding.

use serde_json::{Map, Value};

use crate::schema::Node;
use crate::vm::ViewModel;

/// Whether `key` is excluded by an ignored property name.
///
/// A name excludes the property itself and every path nested under it.
pub fn is_ignored(key: &str, ignored: &[&str]) -> bool {
    ignored.iter().any(|name| {
        key.strip_prefix(name)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    })
}

/// Remove ignored properties from a payload map in place.
pub fn strip_ignored(map: &mut Map<String, Value>, ignored: &[&str]) {
    if ignored.is_empty() {
        return;
    }
    map.retain(|key, _| !is_ignored(key, ignored));
}

pub fn encode(map: Map<String, Value>, pretty: bool) -> serde_json::Result<String> {
    let value = Value::Object(map);
    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
}

/// Complete current state of an instance, ignored properties excluded.
pub fn full_state(vm: &dyn ViewModel, pretty: bool) -> serde_json::Result<String> {
    let mut state = vm.snapshot();
    strip_ignored(&mut state, vm.ignored_properties());
    encode(state, pretty)
}
