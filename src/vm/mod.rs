//! View model contract.
//!
//! The engine never looks inside a view model beyond this trait and its
//! [`Node`] schema: a change set, a way to accept it, a sub-instance
//! accessor for master/sub composition, and a few lifecycle hooks.
//!
//! # Modules
//!
//! - `change` - [`ChangeSet`], the per-instance pending change log

pub mod change;

use serde_json::{Map, Value};

pub use change::ChangeSet;

use crate::push::PushRequester;
use crate::schema::Node;

/// Server-side object whose properties are mirrored to a client.
pub trait ViewModel: Node {
    /// Pending changes of this instance.
    fn changes(&self) -> &ChangeSet;

    /// Clear the change set, returning exactly the entries that were cleared.
    fn accept_changes(&mut self) -> Map<String, Value> {
        self.changes().accept()
    }

    /// Properties excluded from every serialized payload.
    fn ignored_properties(&self) -> &[&'static str] {
        &[]
    }

    /// Authorization policy name, if the type declares one.
    fn policy(&self) -> Option<&str> {
        None
    }

    /// Called when an inbound path could not be resolved against this instance.
    fn on_unresolved_update(&mut self, _path: &str, _raw: &str) {}

    /// Sub-instance lookup used when this instance is a master.
    fn sub_vm(&mut self, _type_name: &str, _instance_key: Option<&str>) -> Option<Box<dyn ViewModel>> {
        None
    }

    /// A sub-instance of this master was created under `vm_id`.
    fn on_sub_created(&mut self, _vm_id: &str, _sub: &mut dyn ViewModel) {}

    /// A registered sub-instance of this master is being disposed.
    fn on_sub_disposing(&mut self, _vm_id: &str, _sub: &mut dyn ViewModel) {}

    /// Hand the instance its push-request handle. Raised outside inbound
    /// updates to ask the engine for a push cycle.
    fn attach_push_requester(&mut self, _requester: PushRequester) {}

    /// Withdraw the push-request handle.
    fn detach_push_requester(&mut self) {}

    /// Release resources. Called once, after removal from the registry.
    fn dispose(&mut self) {}
}
