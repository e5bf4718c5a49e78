//! Voice Turn Pipeline
//!
//! Runs one `/process-voice` request end to end:
//! 1.  Asks the agent for a reply and interprets it.
//! 2.  Voices the spoken text and stores the audio for the session.
//! 3.  Logs the interaction and any captured lead.
//! 4.  Opens a checkout session if the agent asked for payment.
//!
//! Only step 1 can fail the request. Everything after it is best effort and
//! degrades to a missing field in the response.

use crate::{
    audio_store,
    handlers::ApiError,
    models::{VoiceRequest, VoiceResponse},
    state::AppState,
};
use tracing::{error, info, instrument, warn};
use voice_router_core::{
    InteractionResult,
    lead_store::InteractionLog,
    payment::CheckoutRequest,
};

/// Handles a single voice turn.
#[instrument(name = "voice_turn", skip_all, fields(session_id = %request.session_id))]
pub async fn handle_voice_turn(
    state: &AppState,
    request: VoiceRequest,
) -> Result<VoiceResponse, ApiError> {
    if request.transcript.trim().is_empty() {
        return Err(ApiError::BadRequest("Transcript cannot be empty".to_string()));
    }

    let prompt_override = request
        .system_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty());
    let reply = state
        .agent
        .respond(&request.session_id, &request.transcript, prompt_override)
        .await
        .map_err(|e| {
            error!(error = ?e, "Completion failed");
            ApiError::BadGateway(format!("LLM error: {:#}", e))
        })?;
    let result = reply.result;

    let audio_url = synthesize_reply(state, &request.session_id, &result.spoken_text).await;
    let pb_record_id = log_interaction(state, &request, &result).await;

    let lead_record_id = match &result.lead {
        Some(lead) => match state.lead_store.save_lead(lead).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, email = %lead.email, "Lead could not be persisted");
                None
            }
        },
        None => None,
    };

    let payment_url = if result.payment_requested {
        create_checkout(state, &request.session_id, &result).await
    } else {
        None
    };

    Ok(VoiceResponse {
        reply: result.spoken_text,
        session_id: request.session_id,
        pb_record_id,
        lead_record_id,
        lead_captured: result.lead.is_some(),
        payment_url,
        audio_url,
    })
}

/// Voices `text` and stores it, returning the audio URL on success.
///
/// Sessions whose id cannot name an audio file still get a reply, just no audio.
async fn synthesize_reply(state: &AppState, session_id: &str, text: &str) -> Option<String> {
    if !state.speech.is_enabled() {
        warn!("Speech synthesis not configured. Skipping audio.");
        return None;
    }
    if let Err(e) = audio_store::validate_session_id(session_id) {
        warn!(error = %e, "Session id cannot be stored as audio. Skipping audio.");
        return None;
    }
    if text.is_empty() {
        warn!("Reply is empty after sanitizing. Skipping audio.");
        return None;
    }

    let audio = match state.speech.synthesize(text).await {
        Ok(audio) => audio,
        Err(e) => {
            warn!(error = %e, "Speech synthesis failed");
            return None;
        }
    };

    match state.audio.save(session_id, &audio).await {
        Ok(path) => {
            info!(path = %path.display(), "Audio reply stored");
            Some(format!("/audio/{}", session_id))
        }
        Err(e) => {
            warn!(error = %e, "Audio reply could not be stored");
            None
        }
    }
}

async fn log_interaction(
    state: &AppState,
    request: &VoiceRequest,
    result: &InteractionResult,
) -> Option<String> {
    let log = InteractionLog {
        session_id: request.session_id.clone(),
        user_id: request.user_id.clone().unwrap_or_default(),
        transcript: request.transcript.clone(),
        reply: result.spoken_text.clone(),
        lead_captured: result.lead.is_some(),
        payment_requested: result.payment_requested,
        degradation: result
            .degradations
            .iter()
            .map(|d| d.reason())
            .collect::<Vec<_>>()
            .join(","),
    };

    match state.lead_store.log_interaction(&log).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Interaction logging skipped");
            None
        }
    }
}

async fn create_checkout(
    state: &AppState,
    session_id: &str,
    result: &InteractionResult,
) -> Option<String> {
    let Some(payments) = &state.payments else {
        warn!("Payment requested but no checkout provider is configured");
        return None;
    };

    let request = CheckoutRequest {
        session_id: session_id.to_string(),
        customer_email: result.lead.as_ref().map(|lead| lead.email.clone()),
    };
    match payments.create_checkout(&request).await {
        Ok(session) => Some(session.url),
        Err(e) => {
            warn!(error = %e, "Checkout session could not be created");
            None
        }
    }
}
