//! Voice Router Core
//!
//! The response interpreter that turns raw model output into spoken text and
//! structured intents, plus the interfaces to the hosted services around it.

pub mod agent;
pub mod interpreter;
pub mod lead_store;
pub mod llm_client;
pub mod marker;
pub mod payload;
pub mod payment;
pub mod protocol;
pub mod sanitize;
pub mod speech;

#[cfg(test)]
mod test_support;

pub use interpreter::{
    BusinessContext, Degradation, InteractionResult, LeadRecord, LeadStatus, ResponseInterpreter,
};
pub use protocol::{FieldAliases, ProtocolVariant, TagKind};
