//! Sales Agent Turn
//!
//! Couples the completion provider with the response interpreter: one user
//! message in, one interpreted reply out. This is the only place where the
//! network-facing brain and the pure interpreter meet.

use crate::{
    interpreter::{InteractionResult, ResponseInterpreter},
    llm_client::CompletionProvider,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, instrument};

/// The default persona used when a deployment ships no prompt of its own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Zara Vane, the elite Executive AI Director. \
Speak with absolute certainty and a rugged, professional edge. \
Keep your response to 2 short sentences.";

/// One agent reply: the model's raw text and what the interpreter made of it.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub raw_completion: String,
    pub result: InteractionResult,
}

/// Drives a single conversational turn for a deployment.
#[derive(Clone)]
pub struct SalesAgent {
    provider: Arc<dyn CompletionProvider>,
    interpreter: ResponseInterpreter,
    system_prompt: Arc<String>,
}

impl SalesAgent {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        interpreter: ResponseInterpreter,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            interpreter,
            system_prompt: Arc::new(system_prompt.into()),
        }
    }

    /// Asks the model for a reply and interprets it.
    ///
    /// `prompt_override` replaces the deployment's system prompt for this turn
    /// only. Provider failures are returned to the caller; interpretation
    /// itself cannot fail.
    #[instrument(name = "agent_turn", skip(self, user_text, prompt_override))]
    pub async fn respond(
        &self,
        session_id: &str,
        user_text: &str,
        prompt_override: Option<&str>,
    ) -> Result<AgentReply> {
        let system_prompt = prompt_override.unwrap_or(self.system_prompt.as_str());
        let raw_completion = self
            .provider
            .complete(system_prompt, user_text)
            .await
            .context("Completion provider call failed")?;

        let result = self.interpreter.interpret(&raw_completion, session_id);
        info!(
            lead_captured = result.lead.is_some(),
            payment_requested = result.payment_requested,
            degraded = result.is_degraded(),
            "Agent reply ready"
        );

        Ok(AgentReply {
            raw_completion,
            result,
        })
    }
}
