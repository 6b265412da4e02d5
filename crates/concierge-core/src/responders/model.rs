//! Responders backed by one shared model endpoint
//!
//! All four domains talk to the same OpenAI-compatible chat completions
//! endpoint (Ollama by default) through a single `ModelClient`. Only the
//! system prompt differs per domain.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ResponderUnavailable;
use crate::responder::{Responder, ResponderProfile};
use crate::types::{Domain, Query};

/// Configuration for the shared model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Use model responders instead of the built-in templates
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Chat client for an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct ModelClient {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ModelClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-turn completion: system prompt plus one user message
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let messages = [
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ];
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
        });

        debug!("Sending completion request to {} (model: {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to model endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Model request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse model response")?;

        extract_text(parsed).ok_or_else(|| anyhow!("Model returned an empty completion"))
    }

    /// True when the endpoint answers its model listing
    pub async fn ping(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Model endpoint ping failed: {}", e);
                false
            }
        }
    }
}

fn extract_text(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// System prompt steering the shared model toward one domain
pub fn system_prompt(domain: Domain) -> &'static str {
    match domain {
        Domain::Hello => {
            "You are a friendly general assistant. Greet the user warmly, answer simple \
             questions briefly, and suggest the technical, creative or business specialist \
             when a question clearly belongs to one of them."
        }
        Domain::Tech => {
            "You are a technical support and programming assistant. Give a clear technical \
             analysis, practical step-by-step solutions with code where useful, best \
             practices, and pointers to documentation. Consider security and performance."
        }
        Domain::Creative => {
            "You are a creative assistant for writing, storytelling, brainstorming and design. \
             Offer several distinct ideas, concrete creative direction, and ways to develop \
             the strongest one further."
        }
        Domain::Business => {
            "You are a business strategy assistant. Analyse the market and customers, propose \
             a strategy with measurable goals, assess risks and costs, and end with concrete \
             next steps."
        }
    }
}

/// Domain responder that forwards the query to the shared model
pub struct ModelResponder {
    client: Arc<ModelClient>,
    profile: ResponderProfile,
    system_prompt: String,
}

impl ModelResponder {
    pub fn new(domain: Domain, client: Arc<ModelClient>) -> Self {
        Self {
            client,
            profile: ResponderProfile::builtin(domain),
            system_prompt: system_prompt(domain).to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl Responder for ModelResponder {
    fn profile(&self) -> &ResponderProfile {
        &self.profile
    }

    async fn respond(&self, query: &Query) -> Result<String, ResponderUnavailable> {
        self.client
            .complete(&self.system_prompt, query.text())
            .await
            .map_err(|e| {
                warn!("Model responder {} failed: {:#}", self.profile.domain, e);
                ResponderUnavailable::new(self.profile.domain, format!("{:#}", e))
            })
    }

    async fn health_check(&self) -> bool {
        self.client.ping().await
    }
}
