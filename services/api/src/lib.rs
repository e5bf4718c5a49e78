//! Voice Router API Library Crate
//!
//! This library contains all the logic for the voice router web service,
//! including configuration, application state, the voice-turn pipeline, API
//! handlers and routing. The `api` binary is a thin wrapper around this library.

pub mod audio_store;
pub mod config;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod router;
pub mod state;
