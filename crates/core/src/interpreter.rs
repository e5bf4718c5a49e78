//! Response Interpreter
//!
//! Turns one raw model completion into the text that gets spoken, an optional
//! lead record, and a payment-request flag. The interpreter is a pure
//! function of its inputs: it holds only the deployment's protocol variant
//! and business context, performs no I/O, and never fails. Anything the model
//! got wrong is recorded as a [`Degradation`] on the result and logged.

use crate::{
    marker::{self, ScanOutcome},
    payload::{self, LeadPayload, PayloadError},
    protocol::{ProtocolVariant, TagKind},
    sanitize,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle status stored with a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    ProposalGenerated,
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadStatus::New => write!(f, "new"),
            LeadStatus::ProposalGenerated => write!(f, "proposal_generated"),
        }
    }
}

/// A prospect's contact details captured from a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_niche: Option<String>,
    pub session_id: String,
    pub status: LeadStatus,
}

/// Why the interpreter extracted less than the model apparently intended.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Degradation {
    #[error("marker opened at byte {start} was never closed")]
    MalformedMarker { start: usize },
    #[error("marker payload could not be decoded: {0}")]
    MalformedPayload(PayloadError),
    #[error("marker payload is missing a usable {0}")]
    MissingRequiredField(&'static str),
}

impl Degradation {
    /// Stable identifier used as the `reason` field in log events.
    pub fn reason(&self) -> &'static str {
        match self {
            Degradation::MalformedMarker { .. } => "malformed_marker",
            Degradation::MalformedPayload(_) => "malformed_payload",
            Degradation::MissingRequiredField(_) => "missing_required_field",
        }
    }
}

/// Per-deployment facts about the business the agent sells for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessContext {
    /// Used when the captured payload carries no niche of its own.
    pub business_niche: Option<String>,
    /// The prompt has the agent pitch a proposal in the same turn it captures
    /// the lead, so new leads start as `proposal_generated`.
    pub proposal_on_capture: bool,
}

/// The sole output of interpreting one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionResult {
    /// Marker-free text, safe to send to speech synthesis.
    pub spoken_text: String,
    pub lead: Option<LeadRecord>,
    pub payment_requested: bool,
    pub degradations: Vec<Degradation>,
}

impl InteractionResult {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Interprets completions for one protocol variant.
#[derive(Debug, Clone)]
pub struct ResponseInterpreter {
    variant: ProtocolVariant,
    context: BusinessContext,
}

impl ResponseInterpreter {
    pub fn new(variant: ProtocolVariant, context: BusinessContext) -> Self {
        Self { variant, context }
    }

    /// Interprets `raw` for the conversation identified by `session_id`.
    pub fn interpret(&self, raw: &str, session_id: &str) -> InteractionResult {
        let outcome = marker::scan(raw, &self.variant.start_token, &self.variant.end_token);
        let mut degradations = Vec::new();
        let mut lead = None;
        let mut payment_requested = false;

        let span = match &outcome {
            ScanOutcome::Found(m) => Some(m.span.clone()),
            _ => None,
        };

        match (self.variant.tag_kind, outcome) {
            (_, ScanOutcome::Absent) => {}
            (TagKind::LeadCapture, ScanOutcome::Unclosed { start }) => {
                degradations.push(Degradation::MalformedMarker { start });
            }
            (TagKind::LeadCapture, ScanOutcome::Found(m)) => {
                match self.build_lead(m.payload, session_id) {
                    Ok(record) => lead = Some(record),
                    Err(degradation) => degradations.push(degradation),
                }
            }
            (TagKind::PaymentTrigger, _) => payment_requested = true,
        }

        let spoken_text = sanitize::sanitize(raw, span);

        for degradation in &degradations {
            warn!(
                session_id,
                reason = degradation.reason(),
                protocol = %self.variant,
                "Lead capture degraded: {}",
                degradation
            );
        }
        debug!(
            session_id,
            lead_captured = lead.is_some(),
            payment_requested,
            "Completion interpreted"
        );

        InteractionResult {
            spoken_text,
            lead,
            payment_requested,
            degradations,
        }
    }

    fn build_lead(&self, payload_text: &str, session_id: &str) -> Result<LeadRecord, Degradation> {
        let fields = payload::parse_payload(payload_text, &self.variant.field_aliases)
            .map_err(Degradation::MalformedPayload)?;

        if !LeadPayload::is_known(&fields.name) {
            return Err(Degradation::MissingRequiredField("name"));
        }
        if !LeadPayload::is_known(&fields.email) {
            return Err(Degradation::MissingRequiredField("email"));
        }

        let business_niche = fields
            .known_business_niche()
            .map(str::to_string)
            .or_else(|| self.context.business_niche.clone());
        let status = if self.context.proposal_on_capture {
            LeadStatus::ProposalGenerated
        } else {
            LeadStatus::New
        };

        Ok(LeadRecord {
            name: fields.name,
            email: fields.email,
            business_niche,
            session_id: session_id.to_string(),
            status,
        })
    }
}

impl Default for ResponseInterpreter {
    fn default() -> Self {
        Self::new(ProtocolVariant::default(), BusinessContext::default())
    }
}
