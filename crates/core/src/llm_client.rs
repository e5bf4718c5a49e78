use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;

/// Base URL of Groq's OpenAI-compatible endpoint.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default chat model served by Groq.
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

/// Sampling settings for a single completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 256,
        }
    }
}

/// Anything that can turn a system prompt and one user message into a reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Makes a single, non-streaming completion call and returns the raw text.
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String>;
}

/// An implementation of `CompletionProvider` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    settings: CompletionSettings,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `settings` - Model identifier and sampling parameters used for every call.
    pub fn new(config: OpenAIConfig, settings: CompletionSettings) -> Self {
        Self {
            client: Client::with_config(config),
            settings,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompatibleClient {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_text)
                    .build()?
                    .into(),
            ])
            .temperature(self.settings.temperature)
            .max_completion_tokens(self.settings.max_tokens)
            .build()?;

        let response: CreateChatCompletionResponse = self.client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .as_ref()
            .context("No content in LLM response")?;

        Ok(answer.trim().to_string())
    }
}
