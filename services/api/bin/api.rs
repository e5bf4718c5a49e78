//! Main Entrypoint for the Voice Router Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Initializing shared services (LLM, speech, lead store, checkout).
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use std::{collections::HashMap, fs, net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use voice_router_api::{
    audio_store::AudioStore, config::Config, router::create_router, state::AppState,
};
use voice_router_core::{
    BusinessContext, ResponseInterpreter,
    agent::{DEFAULT_SYSTEM_PROMPT, SalesAgent},
    lead_store::{LeadStore, PocketBaseCredentials, PocketBaseStore},
    llm_client::{CompletionSettings, OpenAICompatibleClient},
    payment::{PaymentGateway, StripeCheckout, StripeSettings},
    speech::{DeepgramSynthesizer, DisabledSynthesizer, SpeechSynthesizer},
};

/// Timeout applied to every outbound call except the LLM's own.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Speech synthesis of a long reply can take a while.
const SPEECH_TIMEOUT: Duration = Duration::from_secs(30);

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// A helper function to load prompts from a directory. A missing directory
/// yields no prompts.
fn load_prompts(prompts_path: &std::path::Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    if !prompts_path.is_dir() {
        return Ok(prompts);
    }
    for entry in std::fs::read_dir(prompts_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let prompts = load_prompts(&config.prompts_path)?;
    let system_prompt = match prompts.get("system_prompt") {
        Some(prompt) => prompt.trim().to_string(),
        None => {
            info!(path = %config.prompts_path.display(), "No system_prompt.md found. Using built-in persona.");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    };

    let openai_config = OpenAIConfig::new()
        .with_api_key(&config.llm_api_key)
        .with_api_base(&config.llm_base_url);
    let llm_client = Arc::new(OpenAICompatibleClient::new(
        openai_config,
        CompletionSettings {
            model: config.chat_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        },
    ));

    let interpreter = ResponseInterpreter::new(
        config.protocol.clone(),
        BusinessContext {
            business_niche: config.business_niche.clone(),
            proposal_on_capture: config.proposal_on_capture,
        },
    );
    let agent = SalesAgent::new(llm_client, interpreter, system_prompt);

    let speech: Arc<dyn SpeechSynthesizer> = match &config.deepgram_api_key {
        Some(api_key) => Arc::new(
            DeepgramSynthesizer::new(api_key, &config.deepgram_model, SPEECH_TIMEOUT)
                .context("Failed to build speech client")?,
        ),
        None => {
            warn!("DEEPGRAM_API_KEY not set. Replies will not be voiced.");
            Arc::new(DisabledSynthesizer)
        }
    };

    let lead_store: Arc<dyn LeadStore> = Arc::new(
        PocketBaseStore::new(
            PocketBaseCredentials {
                base_url: config.pocketbase_url.clone(),
                email: config.pocketbase_email.clone(),
                password: config.pocketbase_password.clone(),
            },
            HTTP_TIMEOUT,
        )
        .context("Failed to build PocketBase client")?,
    );

    let payments: Option<Arc<dyn PaymentGateway>> = match &config.stripe {
        Some(stripe) => Some(Arc::new(
            StripeCheckout::new(
                StripeSettings {
                    secret_key: stripe.secret_key.clone(),
                    price_id: stripe.price_id.clone(),
                    success_url: stripe.success_url.clone(),
                    cancel_url: stripe.cancel_url.clone(),
                },
                HTTP_TIMEOUT,
            )
            .context("Failed to build Stripe client")?,
        )),
        None => None,
    };

    let app_state = Arc::new(AppState {
        agent,
        speech,
        lead_store,
        payments,
        audio: AudioStore::new(&config.audio_dir),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        model = %config.chat_model,
        protocol = %config.protocol,
        voice = config.deepgram_api_key.is_some(),
        checkout = config.stripe.is_some(),
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
