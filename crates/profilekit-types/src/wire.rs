//! Wire DTOs — the JSON shapes exchanged with the remote profile store.
//!
//! Every field that a caller may omit in a raw config object is an
//! `Option` here: deserialization always succeeds on shape, and the domain
//! model fills defaults and enforces validity before admitting an entity
//! (coerce-then-validate). Serialization skips `None` fields so partial
//! (changed-only) payloads stay minimal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire shape of a full or partial profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    /// Attribute blocks, one per `(collectApp, section)` scope.
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
    #[serde(default)]
    pub sessions: Vec<SessionData>,
    /// Ids of profiles previously merged into this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_profiles: Vec<String>,
}

/// Wire shape of one attribute scope: all `{name: value}` facts sharing a
/// `(collectApp, section)` pair travel in a single block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collect_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Wire shape of a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collect_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    /// Unix milliseconds; absent until the session is first modified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<u64>,
    /// Free-form session data. `None` in changed-only payloads when the
    /// session's own fields are untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    /// `None` only in changed-only payloads with no dirty events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventData>>,
}

/// Wire shape of an event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

// ============================================================================
// Tests
// ============================================================================
