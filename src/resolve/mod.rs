//! Composite id resolution.
//!
//! A composite id encodes a master/sub hierarchy:
//!
//! ```text
//! Shell.Orders.Order$42
//! └──────┬─────┘ └─┬─┘└┬┘
//!    master id   type  instance key
//! ```
//!
//! The master id is resolved (and created if needed) first; the leaf is then
//! asked of that master before falling back to the type catalog.
//!
//! # Modules
//!
//! - `factory` - [`InstanceFactory`], obtain-or-create

mod factory;

use crate::error::{HubError, Result};

pub use factory::InstanceFactory;

/// Separator between hierarchy segments.
pub const SEGMENT_SEPARATOR: char = '.';

/// Separator between a leaf's type name and its instance key.
pub const INSTANCE_SEPARATOR: char = '$';

/// Parsed composite view model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeId<'a> {
    full: &'a str,
    master: Option<&'a str>,
    leaf: &'a str,
    type_name: &'a str,
    instance_key: Option<&'a str>,
}

impl<'a> CompositeId<'a> {
    /// Parse `Master.Sub.Type$Key`.
    ///
    /// Everything before the last `.` is the master id. The leaf splits on
    /// its first `$`.
    pub fn parse(full: &'a str) -> Result<Self> {
        let (master, leaf) = match full.rsplit_once(SEGMENT_SEPARATOR) {
            Some((master, leaf)) => (Some(master), leaf),
            None => (None, full),
        };
        let (type_name, instance_key) = match leaf.split_once(INSTANCE_SEPARATOR) {
            Some((name, key)) => (name, Some(key)),
            None => (leaf, None),
        };

        if type_name.is_empty() || master.is_some_and(str::is_empty) {
            return Err(HubError::UnknownViewModelType(full.to_string()));
        }

        Ok(Self {
            full,
            master,
            leaf,
            type_name,
            instance_key,
        })
    }

    /// The id as originally requested; the registry key.
    pub fn full(&self) -> &'a str {
        self.full
    }

    pub fn master(&self) -> Option<&'a str> {
        self.master
    }

    pub fn leaf(&self) -> &'a str {
        self.leaf
    }

    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    pub fn instance_key(&self) -> Option<&'a str> {
        self.instance_key
    }
}
