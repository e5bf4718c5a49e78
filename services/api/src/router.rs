//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, HealthResponse, VoiceRequest, VoiceResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::process_voice,
        handlers::get_audio,
    ),
    components(
        schemas(VoiceRequest, VoiceResponse, HealthResponse, ErrorResponse)
    ),
    tags(
        (name = "Voice AI Router", description = "Voice sales agent with lead capture and checkout")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/process-voice", post(handlers::process_voice))
        .route("/audio/{session_id}", get(handlers::get_audio))
        .with_state(app_state);

    // Stateless routes are merged in alongside.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health))
        .merge(api_router)
}
