//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the agent and the hosted-service clients.

use crate::audio_store::AudioStore;
use std::sync::Arc;
use voice_router_core::{
    agent::SalesAgent, lead_store::LeadStore, payment::PaymentGateway, speech::SpeechSynthesizer,
};

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub agent: SalesAgent,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub lead_store: Arc<dyn LeadStore>,
    /// `None` when no checkout provider is configured.
    pub payments: Option<Arc<dyn PaymentGateway>>,
    pub audio: AudioStore,
}
