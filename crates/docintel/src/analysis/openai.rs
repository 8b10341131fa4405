use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{parse_analysis, AnalysisError, AnalysisResult, Analyzer};
use crate::config::AnalysisConfig;

/// Longest prefix of the document text sent to the model, in characters.
pub const MAX_INPUT_CHARS: usize = 20_000;

const TEMPERATURE: f64 = 0.2;

const SYSTEM_PROMPT: &str = r#"You are a document analysis engine.
Return ONLY valid JSON with this schema:

{
  "summary": "3-5 sentences",
  "key_topics": ["topic1", "topic2", "..."],
  "sentiment": "positive|negative|neutral|mixed",
  "actionable_items": ["item1", "item2", "..."]
}

Rules:
- If no actionable items, return an empty list.
- key_topics must be a list of short phrases.
- sentiment must be one of the allowed strings.
- Do not include markdown. Do not include extra keys."#;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client.
pub struct OpenAiAnalyzer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

impl OpenAiAnalyzer {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key,
        })
    }

    /// Builds the client from configuration.
    ///
    /// A key that cannot be resolved is logged and left unset, so each
    /// document fails with [`AnalysisError::MissingApiKey`] instead of the
    /// service refusing to start.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let api_key = match config.key.resolve() {
            Ok(Some(key)) => Some(key),
            Ok(None) => {
                log::warn!("No analysis API key configured; documents will fail analysis");
                None
            }
            Err(e) => {
                log::warn!("Failed to resolve analysis API key: {}", e);
                None
            }
        };

        Self::new(
            &config.base_url,
            &config.resolved_model(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let api_key = self.api_key.as_ref().ok_or(AnalysisError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: format!(
                        "Document text:\n\n{}",
                        truncate_chars(text, MAX_INPUT_CHARS)
                    ),
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AnalysisError::InvalidResponse("empty completion".to_string()))?;

        parse_analysis(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Sentiment;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Serves a canned completion and records the last request body.
    async fn mock_endpoint(reply: &'static str, status: u16) -> (String, Arc<Mutex<Option<Value>>>) {
        let seen = Arc::new(Mutex::new(None));
        let seen_in_handler = seen.clone();

        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let seen = seen_in_handler.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    let code = axum::http::StatusCode::from_u16(status).unwrap();
                    (
                        code,
                        Json(json!({
                            "choices": [{ "message": { "role": "assistant", "content": reply } }]
                        })),
                    )
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1", addr), seen)
    }

    fn key() -> Option<SecretString> {
        Some(SecretString::from("sk-test".to_string()))
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let analyzer =
            OpenAiAnalyzer::new("http://127.0.0.1:9", "gpt-4.1", None, Duration::from_secs(1))
                .unwrap();
        let err = analyzer.analyze("hello").await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let reply = r#"{"summary":"Short.","key_topics":["a"],"sentiment":"negative","actionable_items":["call"]}"#;
        let (base_url, seen) = mock_endpoint(reply, 200).await;
        let analyzer =
            OpenAiAnalyzer::new(&base_url, "test-model", key(), Duration::from_secs(5)).unwrap();

        let result = analyzer.analyze("some document").await.unwrap();
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.actionable_items, vec!["call"]);

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .ends_with("some document"));
    }

    #[tokio::test]
    async fn test_invalid_reply_is_rejected() {
        let (base_url, _) = mock_endpoint("I cannot help with that.", 200).await;
        let analyzer =
            OpenAiAnalyzer::new(&base_url, "test-model", key(), Duration::from_secs(5)).unwrap();

        let err = analyzer.analyze("text").await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base_url, _) = mock_endpoint("{}", 503).await;
        let analyzer =
            OpenAiAnalyzer::new(&base_url, "test-model", key(), Duration::from_secs(5)).unwrap();

        let err = analyzer.analyze("text").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Status { status: 503, .. }));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
