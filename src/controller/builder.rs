//! Controller construction.

use std::sync::Arc;

use crossbeam::channel;
use parking_lot::Mutex;

use crate::catalog::{self, TypeCatalog};
use crate::config::{self, HubConfig};
use crate::error::{HubError, Result};
use crate::push::{DispatchFn, PushWorker};
use crate::registry::InstanceRegistry;
use crate::vm::ViewModel;

use super::{AuthorizeFn, Controller, Shared};

/// Builder for [`Controller`].
///
/// Only the dispatch function is required. Catalog and config default to
/// the process-wide handles.
#[derive(Default)]
pub struct ControllerBuilder {
    dispatch: Option<DispatchFn>,
    authorize: Option<AuthorizeFn>,
    catalog: Option<Arc<TypeCatalog>>,
    config: Option<Arc<HubConfig>>,
}

impl ControllerBuilder {
    /// Outbound sink receiving `(connection_id, vm_id, payload)`.
    pub fn dispatch<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str, &str) + Send + Sync + 'static,
    {
        self.dispatch = Some(Arc::new(f));
        self
    }

    /// Authorization verdict for instances that declare a policy.
    ///
    /// Without one, every instance with a policy is denied.
    pub fn authorize<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn ViewModel) -> bool + Send + Sync + 'static,
    {
        self.authorize = Some(Arc::new(f));
        self
    }

    pub fn catalog(mut self, catalog: impl Into<Arc<TypeCatalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn config(mut self, config: impl Into<Arc<HubConfig>>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn build(self) -> Result<Controller> {
        let dispatch = self.dispatch.ok_or(HubError::MissingDispatchSink)?;
        let config = self.config.unwrap_or_else(config::cfg);
        let catalog = self.catalog.unwrap_or_else(catalog::catalog);
        let (requests_tx, requests_rx) = channel::unbounded();

        let shared = Arc::new(Shared {
            registry: InstanceRegistry::new(),
            catalog,
            dispatch,
            authorize: self.authorize,
            config: Arc::clone(&config),
            requests_tx,
            requests_rx,
        });

        let worker = if config.push.background {
            let weak = Arc::downgrade(&shared);
            let worker = PushWorker::spawn(
                &config.push.worker_name,
                shared.requests_rx.clone(),
                move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.push_cycle();
                    }
                },
            )
            .map_err(HubError::Worker)?;
            Some(worker)
        } else {
            None
        };

        crate::debug!(
            "config";
            "controller ready ({} types, background push: {})",
            shared.catalog.len(),
            config.push.background
        );
        Ok(Controller {
            shared,
            worker: Mutex::new(worker),
        })
    }
}
