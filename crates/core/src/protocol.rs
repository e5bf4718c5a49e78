//! Marker Protocol Variants
//!
//! Every deployment of the router instructs the model to embed exactly one kind
//! of out-of-band marker in its replies. A `ProtocolVariant` describes that
//! marker: the token pair that delimits it, what it means, and which JSON keys
//! carry the lead fields inside its payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a marker asks the service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    /// The payload carries a prospect's contact details.
    LeadCapture,
    /// The marker's presence alone asks for a checkout link.
    PaymentTrigger,
}

/// The JSON keys accepted for each lead field, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliases {
    pub name: Vec<String>,
    pub email: Vec<String>,
    pub business_niche: Vec<String>,
}

impl FieldAliases {
    /// Builds an alias set from string slices.
    pub fn new(name: &[&str], email: &[&str], business_niche: &[&str]) -> Self {
        let owned = |keys: &[&str]| keys.iter().map(|k| k.to_string()).collect();
        Self {
            name: owned(name),
            email: owned(email),
            business_niche: owned(business_niche),
        }
    }

    /// Accepts both the abbreviated single-letter keys and the long forms.
    pub fn abbreviated() -> Self {
        Self::new(
            &["n", "name"],
            &["e", "email"],
            &["b", "niche", "business_niche"],
        )
    }

    /// Accepts only the long-form keys.
    pub fn long_form() -> Self {
        Self::new(&["name"], &["email"], &["business_niche", "niche"])
    }
}

/// Describes the single marker convention active in a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolVariant {
    pub start_token: String,
    pub end_token: String,
    pub field_aliases: FieldAliases,
    pub tag_kind: TagKind,
}

impl ProtocolVariant {
    /// `[[CAPTURE]] {"n": .., "e": ..} [[END]]`
    pub fn capture_end() -> Self {
        Self {
            start_token: "[[CAPTURE]]".to_string(),
            end_token: "[[END]]".to_string(),
            field_aliases: FieldAliases::abbreviated(),
            tag_kind: TagKind::LeadCapture,
        }
    }

    /// `[[LEAD_CAPTURE]] {"name": .., "email": ..} [[/LEAD_CAPTURE]]`
    pub fn capture_closing_tag() -> Self {
        Self {
            start_token: "[[LEAD_CAPTURE]]".to_string(),
            end_token: "[[/LEAD_CAPTURE]]".to_string(),
            field_aliases: FieldAliases::long_form(),
            tag_kind: TagKind::LeadCapture,
        }
    }

    /// `[[PAYMENT_LINK]]`, optionally followed by a payload and `[[END]]`.
    ///
    /// A bare start token is enough to request payment, so the end token only
    /// bounds the span that gets stripped from the spoken text.
    pub fn payment_link() -> Self {
        Self {
            start_token: "[[PAYMENT_LINK]]".to_string(),
            end_token: "[[END]]".to_string(),
            field_aliases: FieldAliases::long_form(),
            tag_kind: TagKind::PaymentTrigger,
        }
    }
}

impl Default for ProtocolVariant {
    fn default() -> Self {
        Self::capture_end()
    }
}

/// Returned when a configured protocol name matches no preset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown marker protocol '{0}' (expected capture-end, capture-closing or payment-link)")]
pub struct UnknownProtocol(pub String);

impl FromStr for ProtocolVariant {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "capture-end" | "capture" => Ok(Self::capture_end()),
            "capture-closing" | "lead-capture" => Ok(Self::capture_closing_tag()),
            "payment-link" | "payment" => Ok(Self::payment_link()),
            other => Err(UnknownProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start_token, self.end_token)
    }
}
