//! View model message protocol.
//!
//! JSON envelopes exchanged with clients. The engine itself only needs
//! `(connection, vm_id, payload)`; these types give transports a shared
//! framing.
//!
//! # Message Types
//!
//! - `request`: Ask for a view model's full state (optional init args)
//! - `update`: Apply property path updates
//! - `dispose`: Release a view model
//!
//! Outbound, [`ResponseVm`] carries either a full state or a diff.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::convert::value_text;

/// Inbound client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HubMessage {
    Request {
        #[serde(rename = "vmId")]
        vm_id: String,
        /// Initialization arguments, property path to value
        #[serde(rename = "vmArg", default, skip_serializing_if = "Option::is_none")]
        vm_arg: Option<Map<String, Value>>,
    },

    Update {
        #[serde(rename = "vmId")]
        vm_id: String,
        /// Property path to new value
        #[serde(default)]
        data: Map<String, Value>,
    },

    Dispose {
        #[serde(rename = "vmId")]
        vm_id: String,
    },
}

impl HubMessage {
    pub fn request(vm_id: impl Into<String>) -> Self {
        Self::Request {
            vm_id: vm_id.into(),
            vm_arg: None,
        }
    }

    pub fn update(vm_id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self::Update {
            vm_id: vm_id.into(),
            data,
        }
    }

    pub fn dispose(vm_id: impl Into<String>) -> Self {
        Self::Dispose {
            vm_id: vm_id.into(),
        }
    }

    pub fn vm_id(&self) -> &str {
        match self {
            Self::Request { vm_id, .. } | Self::Update { vm_id, .. } | Self::Dispose { vm_id } => {
                vm_id
            }
        }
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Outbound state or diff for one view model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseVm {
    #[serde(rename = "vmId")]
    pub vm_id: String,
    /// Serialized payload
    pub data: String,
}

impl ResponseVm {
    pub fn new(vm_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            vm_id: vm_id.into(),
            data: data.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Flatten a JSON object into `(path, text)` pairs.
///
/// Strings pass through verbatim; any other value is rendered as JSON text,
/// which is what the path update engine converts from.
pub fn text_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(path, value)| (path.clone(), Cow::into_owned(value_text(value))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request() {
        let msg = HubMessage::from_json(r#"{"type":"request","vmId":"Shell.Person$1"}"#).unwrap();
        assert_eq!(msg, HubMessage::request("Shell.Person$1"));

        let msg = HubMessage::from_json(
            r#"{"type":"request","vmId":"Person","vmArg":{"Age":3,"Name":"Ann"}}"#,
        )
        .unwrap();
        let HubMessage::Request { vm_arg: Some(args), .. } = msg else {
            panic!("expected request with args");
        };
        assert_eq!(args["Age"], json!(3));
    }

    #[test]
    fn test_parse_update_and_dispose() {
        let msg =
            HubMessage::from_json(r#"{"type":"update","vmId":"P","data":{"Name":"Bo"}}"#).unwrap();
        assert_eq!(msg.vm_id(), "P");
        assert!(matches!(msg, HubMessage::Update { ref data, .. } if data.len() == 1));

        let msg = HubMessage::from_json(r#"{"type":"dispose","vmId":"P"}"#).unwrap();
        assert_eq!(msg, HubMessage::dispose("P"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(HubMessage::from_json(r#"{"type":"nope","vmId":"P"}"#).is_err());
        assert!(HubMessage::from_json(r#"{"type":"update"}"#).is_err());
    }

    #[test]
    fn test_request_serialization_omits_missing_args() {
        let json = HubMessage::request("P").to_json().unwrap();
        assert_eq!(json, r#"{"type":"request","vmId":"P"}"#);
    }

    #[test]
    fn test_response_envelope() {
        let json = ResponseVm::new("P", r#"{"Name":"Bo"}"#).to_json().unwrap();
        assert!(json.contains(r#""vmId":"P""#));
        assert!(json.contains(r#""data":"{\"Name\":\"Bo\"}""#));
    }

    #[test]
    fn test_text_pairs() {
        let map = json!({ "Name": "Bo", "Age": 4, "Tags": ["a"], "Address.City": null });
        let pairs = text_pairs(map.as_object().unwrap());
        assert_eq!(
            pairs,
            vec![
                ("Name".to_string(), "Bo".to_string()),
                ("Age".to_string(), "4".to_string()),
                ("Tags".to_string(), r#"["a"]"#.to_string()),
                ("Address.City".to_string(), "null".to_string()),
            ]
        );
    }
}
