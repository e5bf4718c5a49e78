use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;
use voice_router_core::{
    ProtocolVariant, llm_client::GROQ_API_BASE, llm_client::DEFAULT_CHAT_MODEL,
    speech::DEFAULT_VOICE_MODEL,
};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for the Stripe checkout integration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StripeConfig {
    pub secret_key: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub deepgram_api_key: Option<String>,
    pub deepgram_model: String,
    pub pocketbase_url: String,
    pub pocketbase_email: String,
    pub pocketbase_password: String,
    pub stripe: Option<StripeConfig>,
    pub protocol: ProtocolVariant,
    pub business_niche: Option<String>,
    pub proposal_on_capture: bool,
    pub audio_dir: PathBuf,
    pub prompts_path: PathBuf,
    pub log_level: Level,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let llm_api_key = var("LLM_API_KEY")
            .or_else(|| var("GROQ_API_KEY"))
            .ok_or_else(|| {
                ConfigError::MissingVar("LLM_API_KEY or GROQ_API_KEY must be set".to_string())
            })?;
        let llm_base_url = var("LLM_BASE_URL").unwrap_or_else(|| GROQ_API_BASE.to_string());
        let chat_model = var("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let temperature: f32 = parse_var("LLM_TEMPERATURE", 0.7)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue(
                "LLM_TEMPERATURE".to_string(),
                format!("{} is outside 0.0..=2.0", temperature),
            ));
        }
        let max_tokens: u32 = parse_var("LLM_MAX_TOKENS", 256)?;

        let deepgram_api_key = var("DEEPGRAM_API_KEY");
        let deepgram_model =
            var("DEEPGRAM_MODEL").unwrap_or_else(|| DEFAULT_VOICE_MODEL.to_string());

        let pocketbase_url =
            var("POCKETBASE_URL").unwrap_or_else(|| "http://127.0.0.1:8090".to_string());
        let pocketbase_email =
            var("POCKETBASE_EMAIL").unwrap_or_else(|| "admin@example.com".to_string());
        let pocketbase_password =
            var("POCKETBASE_PASSWORD").unwrap_or_else(|| "changeme".to_string());

        let stripe = match (var("STRIPE_SECRET_KEY"), var("STRIPE_PRICE_ID")) {
            (Some(secret_key), Some(price_id)) => Some(StripeConfig {
                secret_key,
                price_id,
                success_url: var("CHECKOUT_SUCCESS_URL")
                    .unwrap_or_else(|| "https://example.com/success".to_string()),
                cancel_url: var("CHECKOUT_CANCEL_URL")
                    .unwrap_or_else(|| "https://example.com/cancel".to_string()),
            }),
            (Some(_), None) => {
                return Err(ConfigError::MissingVar(
                    "STRIPE_PRICE_ID must be set when STRIPE_SECRET_KEY is".to_string(),
                ));
            }
            _ => None,
        };

        let protocol: ProtocolVariant = parse_var("MARKER_PROTOCOL", ProtocolVariant::default())?;
        let business_niche = var("BUSINESS_NICHE");
        let proposal_on_capture: bool = parse_var("PROPOSAL_ON_CAPTURE", false)?;

        let audio_dir = var("AUDIO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let prompts_path = var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./prompts"));

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            llm_api_key,
            llm_base_url,
            chat_model,
            temperature,
            max_tokens,
            deepgram_api_key,
            deepgram_model,
            pocketbase_url,
            pocketbase_email,
            pocketbase_password,
            stripe,
            protocol,
            business_niche,
            proposal_on_capture,
            audio_dir,
            prompts_path,
            log_level,
        })
    }
}
