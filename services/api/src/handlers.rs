//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::{
    audio_store::AudioStoreError,
    models::{ErrorResponse, HealthResponse, VoiceRequest, VoiceResponse},
    pipeline,
    state::AppState,
};

/// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "Voice AI Router";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::BadGateway(message) => {
                (StatusCode::BAD_GATEWAY, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Report that the service is up.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// Send one user transcript to the agent and get its reply.
#[utoipa::path(
    post,
    path = "/process-voice",
    request_body = VoiceRequest,
    responses(
        (status = 200, description = "Agent replied", body = VoiceResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "Language model call failed", body = ErrorResponse)
    )
)]
pub async fn process_voice(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VoiceRequest>,
) -> Result<Json<VoiceResponse>, ApiError> {
    let response = pipeline::handle_voice_turn(&state, payload).await?;
    Ok(Json(response))
}

/// Download the most recent synthesized reply for a session.
#[utoipa::path(
    get,
    path = "/audio/{session_id}",
    responses(
        (status = 200, description = "MP3 audio", body = Vec<u8>, content_type = "audio/mpeg"),
        (status = 400, description = "Invalid session id", body = ErrorResponse),
        (status = 404, description = "No audio for this session", body = ErrorResponse)
    ),
    params(
        ("session_id" = String, Path, description = "Session ID")
    )
)]
pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let audio = state.audio.load(&session_id).await.map_err(|e| match e {
        invalid @ AudioStoreError::InvalidSessionId(_) => ApiError::BadRequest(invalid.to_string()),
        AudioStoreError::Io(io) => ApiError::InternalServerError(io.into()),
    })?;

    match audio {
        Some(bytes) => Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response()),
        None => Err(ApiError::NotFound(
            "Audio file not found or not yet synthesized".to_string(),
        )),
    }
}
