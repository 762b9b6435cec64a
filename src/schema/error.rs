//! Path resolution errors.

use thiserror::Error;

/// Why a property path could not be applied.
///
/// Never leaves the update engine: every variant is recovered by
/// forwarding the path to the view model's unresolved-update hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("`{type_name}` has no property `{name}`")]
    UnknownProperty {
        type_name: &'static str,
        name: String,
    },

    #[error("`{type_name}` declares no keyed accessor `{accessor}`")]
    MissingAccessor {
        type_name: &'static str,
        accessor: String,
    },

    #[error("`{name}` on `{type_name}` holds no object")]
    AbsentValue {
        type_name: &'static str,
        name: String,
    },

    #[error("`{name}` on `{type_name}` is not an object property")]
    NotAnObject {
        type_name: &'static str,
        name: String,
    },

    #[error("`{name}` on `{type_name}` is read-only")]
    ReadOnly {
        type_name: &'static str,
        name: String,
    },

    #[error("cannot convert `{raw}` for `{name}`: {reason}")]
    Conversion {
        name: String,
        raw: String,
        reason: String,
    },

    #[error("path `{0}` is empty or ends at a keyed lookup")]
    Incomplete(String),
}
