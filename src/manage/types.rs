//! Management API response types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Keboola project, as listed for an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One entry of a project's user list, kept close to the wire shape
///
/// `reason`, `invitor` and `approver` are left as raw JSON; the access
/// table decides what to extract from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUserRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Empty when the API sends `null`
    #[serde(default, deserialize_with = "string_or_null")]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub reason: Option<Value>,
    #[serde(default)]
    pub invitor: Option<Value>,
    #[serde(default)]
    pub approver: Option<Value>,
}

/// Result of `GET /manage/tokens/verify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenVerification {
    pub valid: bool,
    pub owner_name: Option<String>,
    /// `None` when the request never got a response
    pub status_code: Option<u16>,
    pub raw_body: String,
}

impl TokenVerification {
    /// Owner name for display, "Unknown" when the body had none
    pub fn owner_display(&self) -> &str {
        self.owner_name.as_deref().unwrap_or("Unknown")
    }
}

/// Result of deleting a user from a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub ok: bool,
    /// `None` when the request never got a response
    pub status_code: Option<u16>,
    pub body: String,
}

/// Accept ids as JSON numbers or strings
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(i64),
        Str(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
