use serde::Serialize;

use super::{read_reply, ChatError, ChatMessage};

pub(super) const DEFAULT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub(super) const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

#[derive(Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

pub(super) fn resolve_model(configured: &str) -> &str {
    let configured = configured.trim();
    if configured.is_empty() {
        DEFAULT_MODEL
    } else {
        configured
    }
}

fn extract_reply(value: &serde_json::Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

pub(super) async fn complete(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
) -> Result<String, ChatError> {
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&OpenRouterRequest { model, messages })
        .send()
        .await?;

    read_reply(response, extract_reply).await
}
