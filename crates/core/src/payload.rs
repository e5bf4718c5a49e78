//! Payload Parser
//!
//! Decodes the JSON object inside a lead-capture marker. Field names come from
//! the active protocol variant's aliases; anything missing or not a string is
//! reported as the `UNKNOWN` sentinel instead of failing the whole payload.

use crate::protocol::FieldAliases;
use serde_json::{Map, Value};

/// Sentinel used for lead fields the model did not provide.
pub const UNKNOWN: &str = "Unknown";

/// Lead fields decoded from a marker payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadPayload {
    pub name: String,
    pub email: String,
    pub business_niche: String,
}

impl LeadPayload {
    /// Whether a field holds a real value rather than the sentinel.
    pub fn is_known(value: &str) -> bool {
        !value.trim().is_empty() && value != UNKNOWN
    }

    /// The business niche, unless it is missing.
    pub fn known_business_niche(&self) -> Option<&str> {
        Self::is_known(&self.business_niche).then_some(self.business_niche.as_str())
    }
}

/// Why a payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is empty")]
    Empty,
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("payload is JSON but not an object")]
    NotAnObject,
}

/// Decodes `payload_text` into lead fields using `aliases`.
pub fn parse_payload(payload_text: &str, aliases: &FieldAliases) -> Result<LeadPayload, PayloadError> {
    let text = payload_text.trim();
    if text.is_empty() {
        return Err(PayloadError::Empty);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(PayloadError::NotAnObject);
    };

    Ok(LeadPayload {
        name: lookup(&object, &aliases.name),
        email: lookup(&object, &aliases.email),
        business_niche: lookup(&object, &aliases.business_niche),
    })
}

/// First alias holding a non-blank string, trimmed.
fn lookup(object: &Map<String, Value>, keys: &[String]) -> String {
    keys.iter()
        .filter_map(|key| object.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}
