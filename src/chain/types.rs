use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid {kind}: {raw:?}")]
pub struct IdError {
    kind: &'static str,
    raw: String,
}

/// First 6 and last 4 characters, e.g. `0x1a2b...9f0e`.
pub fn shorten(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 10 {
        return s.to_owned();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Accepts short (`0x6`) and mixed-case forms, stores `0x` + 64 lowercase hex digits.
            pub fn parse(raw: &str) -> Result<Self, IdError> {
                let err = || IdError { kind: $kind, raw: raw.to_owned() };
                let trimmed = raw.trim();
                let digits = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .unwrap_or(trimmed);
                if digits.is_empty() || digits.len() > 64 {
                    return Err(err());
                }
                let padded = format!("{digits:0>64}").to_ascii_lowercase();
                hex::decode(&padded).map_err(|_| err())?;
                Ok(Self(format!("0x{padded}")))
            }

            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(format!("0x{}", hex::encode(bytes)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn short(&self) -> String {
                shorten(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

hex_id!(
    /// Handle to a piece of on-chain state.
    ObjectId,
    "object id"
);
hex_id!(
    /// Account address.
    Address,
    "address"
);

/// Shared clock object every timestamped entry point takes.
pub fn clock() -> ObjectId {
    ObjectId::from_bytes({
        let mut bytes = [0u8; 32];
        bytes[31] = 6;
        bytes
    })
}

/// A Move object with its decoded `fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveObject {
    pub id: ObjectId,
    pub object_type: String,
    pub fields: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectResponse {
    pub(crate) data: Option<ObjectData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectData {
    pub(crate) object_id: ObjectId,
    pub(crate) previous_transaction: Option<String>,
    pub(crate) content: Option<ObjectContent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectContent {
    pub(crate) data_type: String,
    #[serde(rename = "type")]
    pub(crate) object_type: Option<String>,
    #[serde(default)]
    pub(crate) fields: Value,
}

impl ObjectResponse {
    pub(crate) fn into_move_object(self) -> Option<MoveObject> {
        let data = self.data?;
        let content = data.content?;
        if content.data_type != "moveObject" {
            return None;
        }
        Some(MoveObject {
            id: data.object_id,
            object_type: content.object_type.unwrap_or_default(),
            fields: content.fields,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub parsed_json: Value,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub timestamp_ms: Option<String>,
}

#[derive(Debug, Clone)]
pub enum CallArg {
    Object(ObjectId),
    Pure(String),
}

impl CallArg {
    pub(crate) fn to_json(&self) -> Value {
        match self {
            CallArg::Object(id) => Value::String(id.to_string()),
            CallArg::Pure(s) => Value::String(s.clone()),
        }
    }
}

/// `<package>::<module>::<function>(arguments)`.
#[derive(Debug, Clone)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: &'static str,
    pub function: &'static str,
    pub arguments: Vec<CallArg>,
}

impl MoveCall {
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlock {
    pub digest: String,
    #[serde(default)]
    pub effects: Option<Effects>,
    #[serde(default)]
    pub object_changes: Vec<ObjectChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub created: Vec<OwnedObjectRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnedObjectRef {
    pub reference: ObjectRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub object_id: ObjectId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectChange {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub object_id: Option<ObjectId>,
    #[serde(default)]
    pub object_type: Option<String>,
}

impl TransactionBlock {
    pub fn failure(&self) -> Option<String> {
        let status = &self.effects.as_ref()?.status;
        (status.status != "success")
            .then(|| status.error.clone().unwrap_or_else(|| status.status.clone()))
    }

    /// Id of the first object created with the given Move struct name,
    /// falling back to the first created object of any type.
    pub fn created(&self, struct_name: &str) -> Option<ObjectId> {
        let suffix = format!("::{struct_name}");
        self.object_changes
            .iter()
            .filter(|change| change.kind == "created")
            .find(|change| {
                change
                    .object_type
                    .as_deref()
                    .is_some_and(|t| t.ends_with(&suffix))
            })
            .and_then(|change| change.object_id.clone())
            .or_else(|| {
                self.effects
                    .as_ref()?
                    .created
                    .first()
                    .map(|created| created.reference.object_id.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_normalize_to_full_width() {
        let short = ObjectId::parse("0x6").unwrap();
        assert_eq!(short, clock());
        assert_eq!(short.as_str().len(), 66);

        let upper = Address::parse("0xABCDEF").unwrap();
        let lower = Address::parse("abcdef").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn ids_reject_garbage() {
        assert!(ObjectId::parse("0xTODO").is_err());
        assert!(ObjectId::parse("").is_err());
        assert!(ObjectId::parse(&format!("0x{}", "1".repeat(65))).is_err());
    }

    #[test]
    fn shorten_keeps_head_and_tail() {
        assert_eq!(shorten("0x1234567890abcdef"), "0x1234...cdef");
        assert_eq!(shorten("0x12"), "0x12");
    }

    #[test]
    fn created_prefers_matching_type() {
        let tx: TransactionBlock = serde_json::from_value(json!({
            "digest": "D1",
            "effects": {
                "status": { "status": "success" },
                "created": [ { "owner": "Immutable", "reference": { "objectId": "0x1" } } ]
            },
            "objectChanges": [
                { "type": "mutated", "objectId": "0x9", "objectType": "0x2::chat::RoomRegistry" },
                { "type": "created", "objectId": "0x1", "objectType": "0x2::chat::RoomMember" },
                { "type": "created", "objectId": "0x2", "objectType": "0x2::chat::Room" }
            ]
        }))
        .unwrap();

        assert_eq!(tx.failure(), None);
        assert_eq!(tx.created("Room"), Some(ObjectId::parse("0x2").unwrap()));
        assert_eq!(tx.created("UserProfile"), Some(ObjectId::parse("0x1").unwrap()));
    }

    #[test]
    fn failure_carries_chain_error() {
        let tx: TransactionBlock = serde_json::from_value(json!({
            "digest": "D2",
            "effects": { "status": { "status": "failure", "error": "MoveAbort(..., 3)" } }
        }))
        .unwrap();
        assert_eq!(tx.failure().as_deref(), Some("MoveAbort(..., 3)"));
    }
}
