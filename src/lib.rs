//! vmsync - server-side engine for live view-model synchronization.
//!
//! Clients address view model instances by composite id (`Master.Sub$Key`),
//! send property updates as path/value pairs, and receive the properties that
//! changed as a result. The engine keeps one instance per id, resolves
//! updates through each type's [`Schema`], and pushes diffs to whichever
//! connection last talked to the instance.
//!
//! # Modules
//!
//! | Module       | Purpose                                         |
//! |--------------|-------------------------------------------------|
//! | `catalog`    | Type name to constructor lookup                 |
//! | `config`     | `vmsync.toml` loading and validation            |
//! | `controller` | Request/update/dispose orchestration            |
//! | `message`    | Inbound/outbound wire messages                  |
//! | `push`       | Push cycle, requesters, background worker       |
//! | `registry`   | Active instances by composite id                |
//! | `resolve`    | Composite id parsing and instance creation      |
//! | `schema`     | Per-type property/command tables                |
//! | `update`     | Path update engine                              |
//! | `vm`         | View model contract and change sets             |
//!
//! # Example
//!
//! ```ignore
//! let controller = Controller::builder()
//!     .dispatch(|connection, vm_id, payload| send(connection, vm_id, payload))
//!     .catalog(TypeCatalog::new().with(TypeDescriptor::of::<Hello>("Hello")))
//!     .build()?;
//!
//! controller.handle_message("conn-1", r#"{"type":"request","vmId":"Hello"}"#)?;
//! ```

pub mod logger;

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod message;
pub mod push;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod update;
pub mod vm;

#[cfg(test)]
mod testing;

pub use catalog::{TypeCatalog, TypeDescriptor};
pub use config::HubConfig;
pub use controller::{Controller, ControllerBuilder};
pub use error::{HubError, Result};
pub use message::{HubMessage, ResponseVm};
pub use push::PushRequester;
pub use schema::{Bindable, Node, PathError, Schema};
pub use vm::{ChangeSet, ViewModel};
