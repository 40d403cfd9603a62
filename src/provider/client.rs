//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! Requests are sent with `stream: true`; the body comes back as server-sent
//! events, one `chat.completion.chunk` per event, terminated by `[DONE]`.

use anyhow::{anyhow, Context, Result};
use eventsource_stream::Eventsource;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::kind::ProviderKind;
use super::resolve::ModelSelection;
use super::{ChatModel, ChatRequest, DeltaStream};
use crate::config::Config;
use crate::constants::CONNECT_TIMEOUT_SECS;
use crate::stream::Delta;

/// A chat-completions endpoint plus the credentials to call it.
pub struct OpenAiCompatible {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatible {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Creates a client from config using the resolved provider.
    ///
    /// Resolves the API key (env var → config file → substitution) and the
    /// base URL (config override → provider default).
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is found for a hosted provider or if
    /// client construction fails.
    pub fn from_config(config: &Config, selection: &ModelSelection) -> Result<Self> {
        let provider = selection.provider;
        let configured_url = config
            .provider_entry(provider.as_str())
            .and_then(|e| e.base_url.as_deref())
            .filter(|url| !url.is_empty());

        match provider {
            ProviderKind::OpenAI | ProviderKind::OpenRouter => {
                let api_key = config.resolve_api_key(provider.as_str()).with_context(|| {
                    format!(
                        "No API key found for {}. Set {}_API_KEY or configure it in config.toml",
                        provider.as_str(),
                        provider.as_str().to_uppercase()
                    )
                })?;
                let base_url = configured_url.unwrap_or(provider.default_base_url());
                Self::new(base_url, api_key)
            }
            ProviderKind::Ollama => {
                let root = configured_url.unwrap_or(provider.default_base_url());
                let api_key = config
                    .resolve_api_key(provider.as_str())
                    .unwrap_or_else(|| "ollama".to_string());
                Self::new(format!("{}/v1", root.trim_end_matches('/')), api_key)
            }
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct StreamingRequest<'a> {
    #[serde(flatten)]
    request: &'a ChatRequest<'a>,
    stream: bool,
}

#[async_trait::async_trait]
impl ChatModel for OpenAiCompatible {
    async fn stream_chat(&self, request: ChatRequest<'_>) -> Result<DeltaStream> {
        debug!(
            model = request.model,
            messages = request.messages.len(),
            functions = request.functions.len(),
            "sending chat completion request"
        );
        let body = StreamingRequest {
            request: &request,
            stream: true,
        };
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint()))?;

        let status = response.status();
        debug!(%status, "chat completion response");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed ({}): {}", status, text);
        }

        let deltas = response
            .bytes_stream()
            .eventsource()
            .map(|event| match event {
                Ok(event) => parse_event(&event.data),
                Err(e) => Err(anyhow!("SSE stream error: {}", e)),
            })
            .take_while(|item| futures::future::ready(!matches!(item, Ok(SseEvent::Done))))
            .flat_map(|item| {
                let items: Vec<Result<Delta>> = match item {
                    Ok(SseEvent::Deltas(deltas)) => deltas.into_iter().map(Ok).collect(),
                    Ok(SseEvent::Done) => Vec::new(),
                    Err(e) => vec![Err(e)],
                };
                stream::iter(items)
            });
        Ok(deltas.boxed())
    }
}

/// What one SSE `data:` payload means for the reply.
#[derive(Debug, PartialEq)]
enum SseEvent {
    Deltas(Vec<Delta>),
    Done,
}

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
    function_call: Option<ChunkFunctionCall>,
}

#[derive(Deserialize)]
struct ChunkFunctionCall {
    name: Option<String>,
    arguments: Option<String>,
}

/// Decodes one event payload. Keepalive chunks without choices and empty
/// fragments produce no deltas.
fn parse_event(data: &str) -> Result<SseEvent> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let json: serde_json::Value = serde_json::from_str(data)
        .with_context(|| format!("SSE parsing error, data: {}", data))?;
    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| error.as_str())
            .unwrap_or("An error occurred during streaming");
        anyhow::bail!("API error: {}", message);
    }

    let chunk: Chunk = serde_json::from_value(json)
        .with_context(|| format!("Unexpected chunk shape, data: {}", data))?;
    let Some(choice) = chunk.choices.into_iter().next() else {
        debug!("ignoring chunk without choices");
        return Ok(SseEvent::Deltas(Vec::new()));
    };

    let mut deltas = Vec::new();
    if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
        deltas.push(Delta::Content(content));
    }
    if let Some(call) = choice.delta.function_call {
        let name = call.name.filter(|n| !n.is_empty());
        let arguments = call.arguments.filter(|a| !a.is_empty());
        if name.is_some() || arguments.is_some() {
            deltas.push(Delta::FunctionCall { name, arguments });
        }
    }
    Ok(SseEvent::Deltas(deltas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionSpec;
    use crate::message::Message;
    use serde_json::json;

    #[test]
    fn test_parse_content_chunk() {
        let event = parse_event(
            r#"{"object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(event, SseEvent::Deltas(vec![Delta::content("Hello")]));
    }

    #[test]
    fn test_parse_function_call_chunks() {
        let first = parse_event(
            r#"{"choices":[{"delta":{"role":"assistant","content":null,"function_call":{"name":"f","arguments":""}}}]}"#,
        )
        .unwrap();
        assert_eq!(first, SseEvent::Deltas(vec![Delta::call_name("f")]));

        let next = parse_event(r#"{"choices":[{"delta":{"function_call":{"arguments":"{\"a\":"}}}]}"#)
            .unwrap();
        assert_eq!(next, SseEvent::Deltas(vec![Delta::call_arguments("{\"a\":")]));
    }

    #[test]
    fn test_parse_skips_empty_fragments() {
        let role_only = parse_event(r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#)
            .unwrap();
        assert_eq!(role_only, SseEvent::Deltas(vec![]));

        let finish = parse_event(r#"{"choices":[{"delta":{},"finish_reason":"function_call"}]}"#)
            .unwrap();
        assert_eq!(finish, SseEvent::Deltas(vec![]));

        let keepalive = parse_event(r#"{"choices":[]}"#).unwrap();
        assert_eq!(keepalive, SseEvent::Deltas(vec![]));
    }

    #[test]
    fn test_parse_done() {
        assert_eq!(parse_event("[DONE]").unwrap(), SseEvent::Done);
        assert_eq!(parse_event(" [DONE] ").unwrap(), SseEvent::Done);
    }

    #[test]
    fn test_parse_error_payloads() {
        let err = parse_event(r#"{"error":{"message":"Rate limit reached"}}"#).unwrap_err();
        assert_eq!(err.to_string(), "API error: Rate limit reached");

        let err = parse_event(r#"{"error":"overloaded"}"#).unwrap_err();
        assert_eq!(err.to_string(), "API error: overloaded");

        assert!(parse_event("not json").is_err());
    }

    #[test]
    fn test_streaming_request_shape() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let functions = vec![ActionSpec {
            name: "f".into(),
            description: "d".into(),
            parameters: json!({"type": "object"}),
        }];
        let request = ChatRequest {
            model: "gpt-4",
            messages: &messages,
            functions: &functions,
            temperature: 0.25,
        };
        let body = serde_json::to_value(StreamingRequest {
            request: &request,
            stream: true,
        })
        .unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["stream"], true);
        assert_eq!(body["temperature"], 0.25);
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "hi"}));
        assert_eq!(body["functions"][0]["name"], "f");

        let bare = ChatRequest {
            functions: &[],
            ..request
        };
        let body = serde_json::to_value(&bare).unwrap();
        assert!(body.get("functions").is_none());
    }

    #[test]
    fn test_ollama_base_url_gets_v1() {
        let mut config = Config::default();
        config.provider.ollama = Some(crate::config::ProviderEntry {
            base_url: Some("http://gpu-box:11434/".into()),
            ..Default::default()
        });
        let selection = ModelSelection {
            provider: ProviderKind::Ollama,
            model: "llama3".into(),
        };
        let client = OpenAiCompatible::from_config(&config, &selection).unwrap();
        assert_eq!(client.endpoint(), "http://gpu-box:11434/v1/chat/completions");
    }
}
