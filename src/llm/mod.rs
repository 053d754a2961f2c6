use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::core::config::AiConfig;
use crate::core::error::ApiError;

pub mod analyze;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request to AI provider failed: {0}")]
    Transport(reqwest::Error),
    #[error("AI provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Transport errors are kept without their request URL.
impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url())
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.model.clone(),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = response.json().await?;
        let text = extract_text(&result);
        debug!("AI provider returned {} chars", text.len());
        Ok(text)
    }
}

/// `candidates[0].content.parts[0].text`, or empty when any step is missing.
pub fn extract_text(response: &Value) -> String {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_extract_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Study the basics first." }] } }]
        });
        assert_eq!(extract_text(&body), "Study the basics first.");
    }

    #[test]
    fn test_extract_text_tolerates_odd_shapes() {
        assert_eq!(extract_text(&json!({})), "");
        assert_eq!(extract_text(&json!({ "candidates": [] })), "");
        assert_eq!(extract_text(&json!({ "candidates": "nope" })), "");
        assert_eq!(
            extract_text(&json!({
                "candidates": [{ "content": { "parts": [{ "text": 42 }] } }]
            })),
            ""
        );
    }

    #[tokio::test]
    async fn test_generate_posts_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::Json(json!({
                "contents": [{ "parts": [{ "text": "Explain recursion" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{ "content": { "parts": [{ "text": "A function calling itself." }] } }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new(
            "test-key".into(),
            format!("{}/", server.url()),
            "gemini-1.5-flash".into(),
        );
        let text = client.generate("Explain recursion").await.expect("generate");

        assert_eq!(text, "A function calling itself.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_maps_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let client = GeminiClient::new("bad".into(), server.url(), "gemini-1.5-flash".into());
        let err = client.generate("hello").await.unwrap_err();

        assert!(matches!(err, LlmError::Status { status: 403, .. }));
        assert_eq!(
            ApiError::from(err).status_code(),
            axum::http::StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_unexpected_success_body_yields_empty_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new("k".into(), server.url(), "gemini-1.5-flash".into());
        assert_eq!(client.generate("hello").await.expect("generate"), "");
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_expose_api_key() {
        let client = GeminiClient::new(
            "SUPERSECRETKEY123".into(),
            "http://127.0.0.1:1".into(),
            "gemini-1.5-flash".into(),
        );
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));

        let detail = err.to_string();
        assert!(!detail.contains("SUPERSECRETKEY123"));
        assert!(!detail.contains("127.0.0.1:1"));

        match ApiError::from(err) {
            ApiError::Upstream(detail) => assert!(!detail.contains("SUPERSECRETKEY123")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_key_is_not_sent_in_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Missing)
            .match_header("x-goog-api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let client = GeminiClient::new("secret".into(), server.url(), "gemini-1.5-flash".into());
        assert_eq!(client.generate("hello").await.expect("generate"), "");
        mock.assert_async().await;
    }
}
