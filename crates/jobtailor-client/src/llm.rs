use std::time::Duration;

use jobtailor_core::error::AppError;
use jobtailor_core::generate::{Completion, ExtractionRequest, ResponseFormat};
use jobtailor_core::traits::Completer;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::backoff;

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible chat-completion client.
///
/// Works with any OpenAI-compatible API, including:
/// - DeepSeek (`https://api.deepseek.com`, the default)
/// - OpenAI directly (`https://api.openai.com/v1`)
///
/// Throttling responses (429) are retried with the bounded backoff policy
/// in [`crate::backoff`]; both the in-flight request and the backoff wait
/// abort promptly when the attached cancellation token fires.
#[derive(Clone)]
pub struct ChatCompleter {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    cancel: CancellationToken,
}

impl ChatCompleter {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, AppError> {
        Self::build(api_key, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        // Rebuilds the inner client; the attached cancellation token must
        // survive the rebuild.
        let mut rebuilt = Self::build(&self.api_key, &self.base_url, timeout)?;
        rebuilt.cancel = self.cancel;
        Ok(rebuilt)
    }

    /// Attach a caller-supplied cancellation token. The default token
    /// never fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn build(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs: timeout.as_secs(),
            cancel: CancellationToken::new(),
        })
    }
}

// ---- chat API wire types ----

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    total_tokens: i64,
}

fn wire_request(request: &ExtractionRequest) -> ChatRequest {
    ChatRequest {
        model: request.model.clone(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: request.system_prompt.clone(),
            },
            Message {
                role: "user".to_string(),
                content: request.user_payload.clone(),
            },
        ],
        stream: false,
        response_format: request.response_format.map(|f| WireResponseFormat {
            format_type: match f {
                ResponseFormat::JsonObject => "json_object".to_string(),
            },
        }),
    }
}

impl Completer for ChatCompleter {
    async fn complete(&self, request: &ExtractionRequest) -> Result<Completion, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = wire_request(request);

        let mut backoff_ms = 0u64;
        loop {
            if backoff_ms != 0 {
                backoff::wait(&self.cancel, backoff_ms).await?;
            }

            let send = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send();

            let response = tokio::select! {
                _ = self.cancel.cancelled() => return Err(AppError::Cancelled),
                r = send => r.map_err(|e| {
                    if e.is_timeout() {
                        AppError::Timeout(self.timeout_secs)
                    } else if e.is_connect() {
                        AppError::Network(format!("Connection failed: {e}"))
                    } else {
                        AppError::Transport(e.to_string())
                    }
                })?,
            };

            let status = response.status();
            if status.as_u16() == 429 {
                match backoff::next_backoff(backoff_ms) {
                    Some(ms) => {
                        tracing::warn!(backoff_ms = ms, "Throttled by chat API, retrying");
                        backoff_ms = ms;
                        continue;
                    }
                    None => return Err(AppError::RateLimited),
                }
            }
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AppError::Auth(status.as_u16()));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Transport(format!(
                    "chat API returned HTTP {}: {}",
                    status.as_u16(),
                    body
                )));
            }

            let chat: ChatResponse = response
                .json()
                .await
                .map_err(|e| AppError::Transport(format!("failed to parse chat response: {e}")))?;

            let content = chat
                .choices
                .first()
                .and_then(|c| c.message.content.clone())
                .ok_or_else(|| {
                    AppError::Transport("chat API returned no choices".to_string())
                })?;

            return Ok(Completion {
                content,
                total_tokens: chat.usage.total_tokens,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(response_format: Option<ResponseFormat>) -> ExtractionRequest {
        ExtractionRequest {
            model: "deepseek-chat".to_string(),
            system_prompt: "system".to_string(),
            user_payload: "payload".to_string(),
            response_format,
        }
    }

    #[test]
    fn test_wire_request_shape() {
        let wire = wire_request(&request(None));
        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "payload");
        // No response_format key unless requested.
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_wire_request_json_mode() {
        let wire = wire_request(&request(Some(ResponseFormat::JsonObject)));
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_envelope_parsing() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "<company>X</company>"}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
        }"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            resp.choices[0].message.content.as_deref(),
            Some("<company>X</company>")
        );
        assert_eq!(resp.usage.total_tokens, 150);
    }

    #[test]
    fn test_envelope_missing_usage_defaults() {
        let raw = r#"{"choices": [{"message": {"content": "x"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.usage.total_tokens, 0);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let c = ChatCompleter::with_base_url("key", "https://api.example.com/v1/").unwrap();
        assert_eq!(c.base_url, "https://api.example.com/v1");
    }

    #[test]
    fn test_with_timeout_keeps_cancellation_token() {
        let cancel = CancellationToken::new();
        let c = ChatCompleter::new("key")
            .unwrap()
            .with_cancellation(cancel.clone())
            .with_timeout(Duration::from_secs(5))
            .unwrap();
        cancel.cancel();
        assert!(c.cancel.is_cancelled());
    }

    // ---- wire-level tests against a local stub server ----

    use crate::testsupport as stub_server;

    #[tokio::test]
    async fn test_happy_path_against_stub() {
        let (base_url, hits) = stub_server::serve(
            "200 OK",
            r#"{"choices":[{"message":{"content":"<company>X</company>"}}],"usage":{"total_tokens":42}}"#,
        )
        .await;

        let completer = ChatCompleter::with_base_url("key", &base_url).unwrap();
        let completion = completer.complete(&request(None)).await.unwrap();

        assert_eq!(completion.content, "<company>X</company>");
        assert_eq!(completion.total_tokens, 42);
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_rejection_is_terminal() {
        let (base_url, hits) = stub_server::serve("401 Unauthorized", "{}").await;

        let completer = ChatCompleter::with_base_url("bad-key", &base_url).unwrap();
        let err = completer.complete(&request(None)).await.unwrap_err();

        assert!(matches!(err, AppError::Auth(401)));
        // No retry on auth failures.
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_terminal_transport() {
        let (base_url, hits) = stub_server::serve("500 Internal Server Error", "boom").await;

        let completer = ChatCompleter::with_base_url("key", &base_url).unwrap();
        let err = completer.complete(&request(None)).await.unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_throttling_exhausts_retry_budget() {
        let (base_url, hits) = stub_server::serve("429 Too Many Requests", "{}").await;

        let completer = ChatCompleter::with_base_url("key", &base_url).unwrap();
        let started = std::time::Instant::now();
        let err = completer.complete(&request(None)).await.unwrap_err();

        assert!(matches!(err, AppError::RateLimited));
        // Initial attempt plus the 500 ms and 2500 ms retries; the third
        // escalation (12 500 ms) exceeds the cap and aborts instead.
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= std::time::Duration::from_millis(3000), "waited {elapsed:?}");
        assert!(elapsed < std::time::Duration::from_millis(10_000), "waited {elapsed:?}");
    }

    #[tokio::test]
    async fn test_cancellation_during_backoff() {
        let (base_url, _hits) = stub_server::serve("429 Too Many Requests", "{}").await;

        let cancel = tokio_util::sync::CancellationToken::new();
        let completer = ChatCompleter::with_base_url("key", &base_url)
            .unwrap()
            .with_cancellation(cancel.clone());

        let handle = tokio::spawn(async move { completer.complete(&request(None)).await });
        // Let the first attempt land and the backoff wait begin.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        cancel.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
    }
}
