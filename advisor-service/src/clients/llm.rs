use async_trait::async_trait;
use plan_advisor::{AdvisorError, NarrativeGenerator, Result};
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::Prompt,
    providers::openrouter,
};
use tracing::debug;

const PREAMBLE: &str = "You are an insurance advisor who explains health plans to customers \
in plain, friendly language. Be accurate and concise.";

/// Narrative generator backed by an OpenRouter-hosted chat model
pub struct OpenRouterNarrator {
    agent: Agent<openrouter::CompletionModel>,
    model: String,
}

impl OpenRouterNarrator {
    pub fn new(api_key: &str, model: &str) -> Self {
        let client = openrouter::Client::new(api_key);
        let agent = client.agent(model).preamble(PREAMBLE).build();
        Self {
            agent,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl NarrativeGenerator for OpenRouterNarrator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Calling LLM");
        let response = self
            .agent
            .prompt(prompt)
            .await
            .map_err(|e| AdvisorError::Narrative(e.to_string()))?;
        debug!(model = %self.model, response_len = response.len(), "LLM responded");
        Ok(response)
    }
}
