//! Canonical identity and the normalizer that produces it.
//!
//! DESIGN
//! ======
//! Backends and identity providers disagree on field names and nesting.
//! The normalizer unwraps at most one wrapper object, then resolves each
//! canonical field from a fixed, ordered candidate list. The order is part of
//! the contract: when several candidates are present the first non-empty one
//! wins. Unmodeled fields are carried in `raw_extra`.

#[cfg(test)]
#[path = "normalize_test.rs"]
mod normalize_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wrapper keys tried in order before falling back to the payload itself.
pub const WRAPPER_KEYS: [&str; 3] = ["user", "usuario", "profile"];

/// User-id candidates, highest priority first: explicit id, subject claim,
/// generic id, then provider-specific ids.
pub const USER_ID_FIELDS: [&str; 6] = ["userId", "user_id", "sub", "id", "_id", "uid"];
pub const DISPLAY_NAME_FIELDS: [&str; 5] = ["displayName", "display_name", "name", "nombre", "username"];
pub const EMAIL_FIELDS: [&str; 3] = ["email", "correo", "mail"];
pub const AVATAR_FIELDS: [&str; 6] = ["avatarUrl", "avatar_url", "avatar", "picture", "photoURL", "foto"];
pub const ROLE_FIELDS: [&str; 2] = ["role", "rol"];

/// Key under which a serialized identity stores its passthrough fields.
const RAW_EXTRA_KEY: &str = "rawExtra";

/// The normalized shape of "who is signed in".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalIdentity {
    /// Empty when no candidate field produced a value.
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Provider-specific fields not otherwise modeled.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub raw_extra: Map<String, Value>,
}

impl CanonicalIdentity {
    /// Identity with only a user id, used when just the id is known.
    #[must_use]
    pub fn with_user_id(user_id: &str) -> Self {
        Self { user_id: user_id.to_owned(), ..Self::default() }
    }

    pub fn is_identified(&self) -> bool {
        !self.user_id.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Pure payload normalizer bound to the API origin used for avatar paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityNormalizer {
    api_origin: String,
}

impl IdentityNormalizer {
    pub fn new(api_origin: &str) -> Self {
        Self { api_origin: api_origin.trim_end_matches('/').to_owned() }
    }

    /// Turn an arbitrary payload into a canonical identity. Never fails:
    /// unusable input yields an identity whose `user_id` is empty.
    pub fn normalize(&self, raw: &Value) -> CanonicalIdentity {
        let Some(fields) = unwrap_payload(raw) else {
            return CanonicalIdentity::default();
        };

        let user_id = first_field(fields, &USER_ID_FIELDS).unwrap_or_default();
        let display_name = first_field(fields, &DISPLAY_NAME_FIELDS);
        let email = first_field(fields, &EMAIL_FIELDS);
        let avatar_url = first_field(fields, &AVATAR_FIELDS).map(|path| absolutize_avatar(&self.api_origin, &path));
        let role = first_field(fields, &ROLE_FIELDS);

        CanonicalIdentity { user_id, display_name, email, avatar_url, role, raw_extra: extra_fields(fields) }
    }
}

fn unwrap_payload(raw: &Value) -> Option<&Map<String, Value>> {
    let outer = raw.as_object()?;
    let inner = WRAPPER_KEYS.iter().find_map(|key| outer.get(*key).and_then(Value::as_object));
    Some(inner.unwrap_or(outer))
}

fn first_field(fields: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|key| fields.get(*key).and_then(scalar_to_string))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_modeled(key: &str) -> bool {
    USER_ID_FIELDS
        .iter()
        .chain(DISPLAY_NAME_FIELDS.iter())
        .chain(EMAIL_FIELDS.iter())
        .chain(AVATAR_FIELDS.iter())
        .chain(ROLE_FIELDS.iter())
        .any(|candidate| *candidate == key)
}

fn extra_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    let mut extra = Map::new();
    // A previously serialized identity nests its extras; flatten them back.
    if let Some(Value::Object(nested)) = fields.get(RAW_EXTRA_KEY) {
        extra.extend(nested.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    for (key, value) in fields {
        if key != RAW_EXTRA_KEY && !is_modeled(key) {
            extra.insert(key.clone(), value.clone());
        }
    }
    extra
}

/// Absolute URLs pass through; relative storage paths get the API origin.
pub fn absolutize_avatar(api_origin: &str, raw: &str) -> String {
    let raw = raw.trim();
    if is_absolute_url(raw) {
        return raw.to_owned();
    }
    let path = raw.replace('\\', "/");
    let path = path.trim_start_matches("./");
    let origin = api_origin.trim_end_matches('/');
    if path.starts_with('/') { format!("{origin}{path}") } else { format!("{origin}/{path}") }
}

fn is_absolute_url(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    ["http://", "https://", "data:", "blob:", "//"].iter().any(|scheme| lower.starts_with(scheme))
}
