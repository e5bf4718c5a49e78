//! API Models
//!
//! Request and response bodies for the HTTP surface, with `utoipa` schemas for
//! the generated OpenAPI document.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_session_id() -> String {
    "default".to_string()
}

#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct VoiceRequest {
    /// What the user said, as transcribed text.
    #[schema(example = "Hi, I run a roofing company and need more leads.")]
    pub transcript: String,
    #[serde(default = "default_session_id")]
    #[schema(example = "visitor-42")]
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Replaces the deployment's system prompt for this turn only.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct VoiceResponse {
    /// The agent's reply with all markers removed.
    pub reply: String,
    pub session_id: String,
    /// Id of the interaction log record, when it was persisted.
    pub pb_record_id: Option<String>,
    /// Id of the lead record, when a lead was captured and persisted.
    pub lead_record_id: Option<String>,
    pub lead_captured: bool,
    /// Hosted checkout link, when the agent asked for payment.
    pub payment_url: Option<String>,
    /// Where the synthesized reply can be fetched, when synthesis succeeded.
    pub audio_url: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "Voice AI Router")]
    pub service: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
