//! Obtain-or-create instances for composite ids.

use std::sync::Arc;

use crossbeam::channel::Sender;

use crate::catalog::TypeCatalog;
use crate::error::{HubError, Result};
use crate::push::{PushRequest, PushRequester};
use crate::registry::{InstanceRegistry, VmCell};
use crate::schema::Node;
use crate::update::apply_updates;
use crate::vm::ViewModel;

use super::CompositeId;

/// Builds instances for composite ids, creating and registering any
/// missing masters on the way.
pub struct InstanceFactory<'a> {
    registry: &'a InstanceRegistry,
    catalog: &'a TypeCatalog,
    requests: &'a Sender<PushRequest>,
}

impl<'a> InstanceFactory<'a> {
    pub fn new(
        registry: &'a InstanceRegistry,
        catalog: &'a TypeCatalog,
        requests: &'a Sender<PushRequest>,
    ) -> Self {
        Self {
            registry,
            catalog,
            requests,
        }
    }

    /// Create a fresh, unregistered instance for `vm_id`.
    ///
    /// Masters in the id are resolved and registered (without a connection)
    /// if they do not exist yet. `init_args` are applied as path updates
    /// before the instance is returned.
    pub fn create(
        &self,
        vm_id: &str,
        init_args: Option<&[(String, String)]>,
    ) -> Result<Box<dyn ViewModel>> {
        let id = CompositeId::parse(vm_id)?;

        let from_master = match id.master() {
            Some(master_id) => self.sub_from_master(master_id, &id)?,
            None => None,
        };
        let mut vm = match from_master {
            Some(vm) => vm,
            None => self.construct(&id)?,
        };

        vm.attach_push_requester(PushRequester::new(vm_id, self.requests.clone()));
        crate::debug!("resolve"; "created {} ({})", vm_id, vm.type_name());

        if let Some(args) = init_args {
            apply_updates(
                &mut *vm,
                args.iter().map(|(path, raw)| (path.as_str(), raw.as_str())),
            );
        }
        Ok(vm)
    }

    /// Registered master for `master_id`, created on first use.
    ///
    /// Check-then-create runs under the registry's creation lock, so racing
    /// resolutions of the same master produce one instance.
    pub fn resolve_master(&self, master_id: &str) -> Result<Arc<VmCell>> {
        let _creation = self.registry.creation_guard();
        if let Some(cell) = self.registry.get(master_id) {
            return Ok(cell);
        }

        let master = self.create(master_id, None)?;
        let (cell, _) =
            self.registry
                .insert_if_absent(master_id, InstanceRegistry::cell(master), None);
        crate::debug!("resolve"; "registered master {}", master_id);
        Ok(cell)
    }

    fn sub_from_master(
        &self,
        master_id: &str,
        id: &CompositeId<'_>,
    ) -> Result<Option<Box<dyn ViewModel>>> {
        let cell = self.resolve_master(master_id)?;
        let mut master = cell.lock();
        let Some(mut sub) = master.sub_vm(id.type_name(), id.instance_key()) else {
            return Ok(None);
        };
        master.on_sub_created(id.full(), &mut *sub);
        Ok(Some(sub))
    }

    fn construct(&self, id: &CompositeId<'_>) -> Result<Box<dyn ViewModel>> {
        let Some(descriptor) = self.catalog.get(id.type_name()) else {
            crate::log!("resolve"; "unknown view model type `{}`", id.type_name());
            return Err(HubError::UnknownViewModelType(id.type_name().to_string()));
        };
        descriptor.construct(id.instance_key()).ok_or_else(|| {
            crate::log!("resolve"; "cannot construct `{}`", id.type_name());
            HubError::ConstructionFailure {
                type_name: id.type_name().to_string(),
                instance_key: id.instance_key().map(str::to_string),
            }
        })
    }
}
