use serde::Serialize;

use super::{read_reply, ChatError, ChatMessage, Role};

pub(super) const DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(super) const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// OpenRouter-style ids (`vendor/model`) are not valid here.
pub(super) fn resolve_model(configured: &str) -> &str {
    let configured = configured.trim();
    if configured.is_empty() || configured.contains('/') {
        DEFAULT_MODEL
    } else {
        configured
    }
}

fn request_body(messages: &[ChatMessage]) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: messages
            .iter()
            .map(|m| Content {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                },
                parts: vec![Part { text: &m.content }],
            })
            .collect(),
    }
}

fn extract_reply(value: &serde_json::Value) -> Option<String> {
    value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// `{base}/models/{model}:generateContent?key=KEY`, with the model escaped
/// as a single path segment.
fn endpoint_url(base: &str, model: &str, api_key: &str) -> Result<reqwest::Url, ChatError> {
    let mut url = reqwest::Url::parse(base).map_err(|e| ChatError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ChatError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .push("models")
        .push(&format!("{}:generateContent", model));
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

pub(super) async fn complete(
    client: &reqwest::Client,
    base: &str,
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
) -> Result<String, ChatError> {
    let url = endpoint_url(base, model, api_key)?;

    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(&request_body(messages))
        .send()
        .await?;

    read_reply(response, extract_reply).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_escapes_model() {
        let url = endpoint_url("https://example.test/v1beta/", "odd?model#1", "k").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1beta/models/odd%3Fmodel%231:generateContent?key=k"
        );

        let url = endpoint_url("http://127.0.0.1:9", "gemini-pro", "a b").unwrap();
        assert_eq!(url.path(), "/models/gemini-pro:generateContent");
        assert_eq!(url.query(), Some("key=a+b"));
    }

    #[test]
    fn test_endpoint_url_rejects_bad_base() {
        assert!(matches!(
            endpoint_url("not a url", "gemini-pro", "k"),
            Err(ChatError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_assistant_role_maps_to_model() {
        let messages = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let body = serde_json::to_value(request_body(&messages)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello"}]}
                ]
            })
        );
    }

    #[test]
    fn test_extract_reply() {
        let value = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Answer"}], "role": "model"}}]
        });
        assert_eq!(extract_reply(&value), Some("Answer".to_string()));
    }

    #[test]
    fn test_extract_reply_shape_mismatch() {
        assert_eq!(extract_reply(&serde_json::json!({"candidates": []})), None);
        assert_eq!(extract_reply(&serde_json::json!({"promptFeedback": {}})), None);
        assert_eq!(
            extract_reply(&serde_json::json!({"candidates": [{"content": {"parts": [{"text": 3}]}}]})),
            None
        );
    }

    #[test]
    fn test_resolve_model() {
        assert_eq!(resolve_model(""), DEFAULT_MODEL);
        assert_eq!(resolve_model("google/gemini-2.0-flash-exp:free"), DEFAULT_MODEL);
        assert_eq!(resolve_model("gemini-1.5-pro"), "gemini-1.5-pro");
    }
}
