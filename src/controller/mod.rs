//! Request/update/dispose orchestration.
//!
//! Per composite id:
//!
//! ```text
//! absent ──request──> active[C1] ──request/update from C2──> active[C2]
//!    ^                    │
//!    └──────dispose───────┘      update while absent: recreate, then apply
//! ```
//!
//! Every request and update ends with a push cycle over the whole registry.
//!
//! # Modules
//!
//! - `builder` - [`ControllerBuilder`]

mod builder;

use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender};
use parking_lot::Mutex;
use serde_json::Value;

use crate::catalog::TypeCatalog;
use crate::config::HubConfig;
use crate::error::{HubError, Result};
use crate::message::{HubMessage, text_pairs};
use crate::push::{self, DispatchFn, PushRequest, PushWorker, payload};
use crate::registry::{InstanceRegistry, VmCell};
use crate::resolve::{CompositeId, InstanceFactory};
use crate::schema::Node;
use crate::update::apply_updates;
use crate::vm::ViewModel;

pub use builder::ControllerBuilder;

/// Authorization verdict for one instance.
pub type AuthorizeFn = Arc<dyn Fn(&dyn ViewModel) -> bool + Send + Sync>;

/// Entry point of the engine.
///
/// Safe to share across connection handlers; every operation takes `&self`.
pub struct Controller {
    shared: Arc<Shared>,
    worker: Mutex<Option<PushWorker>>,
}

/// State reachable from both the controller and the push worker.
struct Shared {
    registry: InstanceRegistry,
    catalog: Arc<TypeCatalog>,
    dispatch: DispatchFn,
    authorize: Option<AuthorizeFn>,
    config: Arc<HubConfig>,
    requests_tx: Sender<PushRequest>,
    requests_rx: Receiver<PushRequest>,
}

impl Controller {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    /// Resolve (or fetch) `vm_id` for `connection` and send it its full state.
    ///
    /// `init_args` are applied only when the instance is created by this call.
    pub fn request_vm(
        &self,
        connection: &str,
        vm_id: &str,
        init_args: Option<&[(String, String)]>,
    ) -> Result<()> {
        self.shared.request(connection, vm_id, init_args)?;
        self.shared.drain_and_push();
        Ok(())
    }

    /// Apply `updates` (path to text) to `vm_id`, recreating it if absent.
    pub fn update_vm(
        &self,
        connection: &str,
        vm_id: &str,
        updates: &[(String, String)],
    ) -> Result<()> {
        self.shared.update(connection, vm_id, updates)?;
        self.shared.drain_and_push();
        Ok(())
    }

    /// Remove and release `vm_id`. Returns false if it was not registered.
    pub fn dispose_vm(&self, connection: &str, vm_id: &str) -> bool {
        self.shared.dispose(connection, vm_id)
    }

    /// Parse one inbound protocol message and route it.
    pub fn handle_message(&self, connection: &str, text: &str) -> Result<()> {
        match HubMessage::from_json(text)? {
            HubMessage::Request { vm_id, vm_arg } => {
                let args = vm_arg.as_ref().map(text_pairs);
                self.request_vm(connection, &vm_id, args.as_deref())
            }
            HubMessage::Update { vm_id, data } => {
                self.update_vm(connection, &vm_id, &text_pairs(&data))
            }
            HubMessage::Dispose { vm_id } => {
                self.dispose_vm(connection, &vm_id);
                Ok(())
            }
        }
    }

    /// Drain autonomous push requests and, if there were any, run one cycle.
    ///
    /// Returns the number of diffs dispatched.
    pub fn process_push_requests(&self) -> usize {
        if push::drain_requests(&self.shared.requests_rx) == 0 {
            return 0;
        }
        self.shared.push_cycle()
    }

    /// Run a push cycle now, regardless of pending requests.
    pub fn push_changes(&self) -> usize {
        self.shared.push_cycle()
    }

    /// Stop the worker and dispose every registered instance.
    ///
    /// Idempotent; also run on drop.
    pub fn shutdown(&self) {
        if let Some(mut worker) = self.worker.lock().take() {
            worker.stop();
        }
        let drained = self.shared.registry.drain();
        if drained.is_empty() {
            return;
        }
        for (vm_id, entry) in &drained {
            let mut vm = entry.cell().lock();
            vm.detach_push_requester();
            vm.dispose();
            crate::debug!("dispose"; "{} (shutdown)", vm_id);
        }
        crate::debug!("dispose"; "released {} instance(s)", drained.len());
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Registered ids, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        self.shared.registry.ids()
    }

    pub fn connection_of(&self, vm_id: &str) -> Option<String> {
        self.shared.registry.connection_of(vm_id)
    }

    pub fn contains(&self, vm_id: &str) -> bool {
        self.shared.registry.contains(vm_id)
    }

    pub fn len(&self) -> usize {
        self.shared.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.registry.is_empty()
    }

    pub fn config(&self) -> &HubConfig {
        &self.shared.config
    }

    /// Run `f` against a registered instance under its lock.
    pub fn with_vm<R>(&self, vm_id: &str, f: impl FnOnce(&mut dyn ViewModel) -> R) -> Option<R> {
        let cell = self.shared.registry.get(vm_id)?;
        let mut vm = cell.lock();
        Some(f(&mut **vm))
    }

    pub fn is_background_push(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(PushWorker::is_running)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Operations
// =============================================================================

impl Shared {
    fn factory(&self) -> InstanceFactory<'_> {
        InstanceFactory::new(&self.registry, &self.catalog, &self.requests_tx)
    }

    fn pretty(&self) -> bool {
        self.config.payload.pretty
    }

    /// Gate: instances declaring a policy need a positive verdict.
    fn authorize(&self, vm: &dyn ViewModel, vm_id: &str) -> Result<()> {
        let Some(policy) = vm.policy() else {
            return Ok(());
        };
        let granted = self.authorize.as_ref().is_some_and(|verdict| verdict(vm));
        if granted {
            Ok(())
        } else {
            crate::log!("denied"; "{} (policy `{}`)", vm_id, policy);
            Err(HubError::AccessDenied(vm_id.to_string()))
        }
    }

    /// Registered cell for `vm_id`, created under the creation lock if absent.
    ///
    /// A new instance is authorized before it is registered, and registered
    /// without a connection so no push reaches anyone before its full state.
    fn obtain(
        &self,
        vm_id: &str,
        init_args: Option<&[(String, String)]>,
    ) -> Result<(Arc<VmCell>, bool)> {
        let _creation = self.registry.creation_guard();
        if let Some(cell) = self.registry.get(vm_id) {
            return Ok((cell, false));
        }

        let mut vm = self.factory().create(vm_id, init_args)?;
        if let Err(e) = self.authorize(&*vm, vm_id) {
            vm.detach_push_requester();
            self.notify_master_disposing(vm_id, &mut *vm);
            vm.dispose();
            return Err(e);
        }
        let (cell, _) = self
            .registry
            .insert_if_absent(vm_id, InstanceRegistry::cell(vm), None);
        Ok((cell, true))
    }

    fn request(
        &self,
        connection: &str,
        vm_id: &str,
        init_args: Option<&[(String, String)]>,
    ) -> Result<Arc<VmCell>> {
        let (cell, created) = self.obtain(vm_id, init_args)?;
        {
            let mut vm = cell.lock();
            if !created {
                self.authorize(&**vm, vm_id)?;
            }
            let state = payload::full_state(&**vm, self.pretty())
                .map_err(|e| HubError::Payload(vm_id.to_string(), e))?;
            (self.dispatch)(connection, vm_id, &state);
            vm.accept_changes();
        }
        self.registry.refresh_connection(vm_id, connection);

        if created {
            crate::debug!("request"; "{} created for {}", vm_id, connection);
        } else {
            crate::debug!("request"; "{} re-sent to {}", vm_id, connection);
        }
        Ok(cell)
    }

    fn update(&self, connection: &str, vm_id: &str, updates: &[(String, String)]) -> Result<()> {
        let (cell, recreated) = match self.registry.get(vm_id) {
            Some(cell) => (cell, false),
            None => {
                crate::log!("update"; "{} is not active, recreating", vm_id);
                (self.request(connection, vm_id, None)?, true)
            }
        };

        let mut vm = cell.lock();
        if recreated {
            // The client already holds these values.
            let changes = vm.changes().clone();
            for (path, raw) in updates {
                if !changes.contains(path) && changes.accepted(path).is_none() {
                    changes.mark_accepted(path.as_str(), Value::String(raw.clone()));
                }
            }
        } else {
            self.authorize(&**vm, vm_id)?;
        }

        let outcomes = apply_updates(
            &mut **vm,
            updates.iter().map(|(path, raw)| (path.as_str(), raw.as_str())),
        );
        drop(vm);

        let applied = outcomes.iter().filter(|o| o.is_applied()).count();
        crate::debug!(
            "update";
            "{}: {}/{} applied from {}",
            vm_id,
            applied,
            outcomes.len(),
            connection
        );
        self.registry.refresh_connection(vm_id, connection);
        Ok(())
    }

    fn dispose(&self, connection: &str, vm_id: &str) -> bool {
        let Some(entry) = self.registry.remove(vm_id) else {
            crate::debug!("dispose"; "{} not active", vm_id);
            return false;
        };

        // Lock order: sub before master.
        let mut vm = entry.cell().lock();
        vm.detach_push_requester();
        self.notify_master_disposing(vm_id, &mut **vm);
        vm.dispose();

        crate::debug!("dispose"; "{} ({}) by {}", vm_id, vm.type_name(), connection);
        true
    }

    /// Tell the registered master of `vm_id`, if any, that its sub is going away.
    fn notify_master_disposing(&self, vm_id: &str, sub: &mut dyn ViewModel) {
        if let Ok(id) = CompositeId::parse(vm_id)
            && let Some(master_id) = id.master()
            && let Some(master) = self.registry.get(master_id)
        {
            master.lock().on_sub_disposing(vm_id, sub);
        }
    }

    fn drain_and_push(&self) {
        push::drain_requests(&self.requests_rx);
        self.push_cycle();
    }

    fn push_cycle(&self) -> usize {
        push::push_all(&self.registry, &self.dispatch, self.pretty())
    }
}
