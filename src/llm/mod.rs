mod canvas;
mod gemini;
mod openrouter;

pub use canvas::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Shown instead of a reply whose JSON does not have the expected shape.
pub const UNPARSABLE_REPLY: &str = "Could not parse the response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Provider {
    #[default]
    #[serde(rename = "Google Gemini")]
    Gemini,
    #[serde(rename = "OpenRouter")]
    OpenRouter,
}

impl Provider {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Google Gemini",
            Self::OpenRouter => "OpenRouter",
        }
    }

    pub fn all() -> &'static [Provider] {
        &[Provider::Gemini, Provider::OpenRouter]
    }

    /// Accepts display names as well as short lowercase aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "google gemini" | "gemini" => Some(Self::Gemini),
            "openrouter" | "open_router" | "open-router" => Some(Self::OpenRouter),
            _ => None,
        }
    }

    /// Model actually sent to the vendor for a configured model name.
    pub fn resolve_model<'a>(&self, configured: &'a str) -> &'a str {
        match self {
            Self::Gemini => gemini::resolve_model(configured),
            Self::OpenRouter => openrouter::resolve_model(configured),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyPrompt,
    #[error("The assistant is still working on the previous message")]
    Busy,
    #[error("No API key configured for {0}; add one in the settings")]
    MissingKey(Provider),
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {body}")]
    Api { status: u16, body: String },
    #[error("Reply was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("The assistant worker is not running")]
    WorkerStopped,
}

/// Vendor endpoints, overridable for proxies and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub gemini_base: String,
    pub openrouter_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini_base: gemini::DEFAULT_BASE.into(),
            openrouter_url: openrouter::DEFAULT_URL.into(),
        }
    }
}

#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl ChatClient {
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Send the whole conversation and return the assistant's text reply.
    pub async fn complete(
        &self,
        provider: Provider,
        api_key: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ChatError> {
        let model = provider.resolve_model(model);
        tracing::info!(
            "Sending {} message(s) to {} ({})",
            messages.len(),
            provider,
            model
        );

        match provider {
            Provider::Gemini => {
                gemini::complete(
                    &self.client,
                    &self.endpoints.gemini_base,
                    api_key,
                    model,
                    messages,
                )
                .await
            }
            Provider::OpenRouter => {
                openrouter::complete(
                    &self.client,
                    &self.endpoints.openrouter_url,
                    api_key,
                    model,
                    messages,
                )
                .await
            }
        }
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn an HTTP response into reply text using a vendor-specific extractor.
async fn read_reply(
    response: reqwest::Response,
    extract: fn(&serde_json::Value) -> Option<String>,
) -> Result<String, ChatError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ChatError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    let value: serde_json::Value = serde_json::from_str(&body)?;
    let reply = extract(&value);

    Ok(reply.unwrap_or_else(|| {
        tracing::warn!("Unexpected reply shape: {}", body);
        UNPARSABLE_REPLY.to_string()
    }))
}

/// One assistant request, produced by an editor session.
#[derive(Clone)]
pub struct ChatJob {
    pub id: Uuid,
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl fmt::Debug for ChatJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatJob")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("messages", &self.messages.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ChatOutcome {
    pub id: Uuid,
    pub result: Result<String, ChatError>,
}

pub struct ChatWorker {
    client: ChatClient,
    job_rx: mpsc::UnboundedReceiver<ChatJob>,
    outcome_tx: mpsc::UnboundedSender<ChatOutcome>,
}

impl ChatWorker {
    pub fn new(
        client: ChatClient,
        job_rx: mpsc::UnboundedReceiver<ChatJob>,
        outcome_tx: mpsc::UnboundedSender<ChatOutcome>,
    ) -> Self {
        Self {
            client,
            job_rx,
            outcome_tx,
        }
    }

    pub async fn run(mut self) {
        while let Some(job) = self.job_rx.recv().await {
            let result = self
                .client
                .complete(job.provider, &job.api_key, &job.model, &job.messages)
                .await;
            if let Err(e) = &result {
                tracing::error!("Assistant request {} failed: {}", job.id, e);
            }
            let _ = self.outcome_tx.send(ChatOutcome { id: job.id, result });
        }
    }
}

pub fn spawn_chat_worker() -> (
    mpsc::UnboundedSender<ChatJob>,
    mpsc::UnboundedReceiver<ChatOutcome>,
) {
    let (job_tx, job_rx) = mpsc::unbounded_channel();
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(ChatWorker::new(ChatClient::new(), job_rx, outcome_tx).run()),
        Err(e) => tracing::error!("Could not start assistant worker: {}", e),
    });

    (job_tx, outcome_rx)
}
