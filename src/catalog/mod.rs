//! Type catalog: view model type names to constructible descriptors.
//!
//! Populated once at startup, read-only afterwards. A process-wide
//! instance lives in [`handle`]; controllers can also be given their own.

pub mod handle;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::vm::ViewModel;

pub use handle::{catalog, init_catalog, register_types, reset_catalog};

type Constructor = Arc<dyn Fn() -> Box<dyn ViewModel> + Send + Sync>;
type KeyedConstructor = Arc<dyn Fn(&str) -> Box<dyn ViewModel> + Send + Sync>;

/// How to build instances of one view model type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    constructor: Option<Constructor>,
    keyed_constructor: Option<KeyedConstructor>,
}

impl TypeDescriptor {
    /// Descriptor with no constructors yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            keyed_constructor: None,
        }
    }

    /// Descriptor constructing `T::default()`.
    pub fn of<T: ViewModel + Default + 'static>(name: impl Into<String>) -> Self {
        Self::new(name).constructor(|| Box::new(T::default()))
    }

    /// Parameterless constructor.
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Box<dyn ViewModel> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(f));
        self
    }

    /// Constructor taking the instance key of `Type$Key`.
    pub fn keyed_constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Box<dyn ViewModel> + Send + Sync + 'static,
    {
        self.keyed_constructor = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build an instance, preferring the keyed constructor when a key is given.
    ///
    /// Falls back to the parameterless constructor; `None` if neither applies.
    pub fn construct(&self, instance_key: Option<&str>) -> Option<Box<dyn ViewModel>> {
        if let Some(key) = instance_key
            && let Some(keyed) = &self.keyed_constructor
        {
            return Some(keyed(key));
        }
        self.constructor.as_ref().map(|f| f())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("constructor", &self.constructor.is_some())
            .field("keyed_constructor", &self.keyed_constructor.is_some())
            .finish()
    }
}

/// Registry of view model types by name.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: FxHashMap<String, TypeDescriptor>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. A later registration under the same name replaces it.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        crate::debug!("catalog"; "registered {}", descriptor.name());
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
