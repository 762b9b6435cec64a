//! Engine error types.

use thiserror::Error;

/// Errors surfaced to callers of the controller.
///
/// Path resolution failures are not here: they are recovered inside the
/// update engine (see [`crate::schema::PathError`]).
#[derive(Debug, Error)]
pub enum HubError {
    #[error("unknown view model type `{0}`")]
    UnknownViewModelType(String),

    #[error("no usable constructor for `{type_name}` (instance key: {instance_key:?})")]
    ConstructionFailure {
        type_name: String,
        instance_key: Option<String>,
    },

    #[error("access denied to `{0}`")]
    AccessDenied(String),

    #[error("controller built without a dispatch function")]
    MissingDispatchSink,

    #[error("malformed message")]
    Message(#[from] serde_json::Error),

    #[error("cannot encode payload for `{0}`")]
    Payload(String, #[source] serde_json::Error),

    #[error("cannot start push worker")]
    Worker(#[source] std::io::Error),
}

pub type Result<T, E = HubError> = std::result::Result<T, E>;
