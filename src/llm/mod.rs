//! Reqwest-based client for OpenAI-compatible Chat Completions streaming
//! (Mistral by default).

use std::pin::Pin;

use anyhow::{Context, Result};
use async_stream::try_stream;
use futures_core::Stream;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            model: cfg.get("CHAT_MODEL").unwrap_or_else(|| "mistral-medium".into()),
            temperature: cfg.get("CHAT_TEMPERATURE").and_then(|v| v.trim().parse().ok()),
            max_tokens: cfg.get_u64("CHAT_MAX_TOKENS").and_then(|n| u32::try_from(n).ok()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_key = cfg.get("MISTRAL_API_KEY").filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("MISTRAL_API_KEY is not set; chat requests will likely be rejected");
        }
        Self::new(&cfg.chat_api_base_url(), api_key, cfg.request_timeout())
    }

    pub fn new(base_url: &str, api_key: Option<String>, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), api_key })
    }

    /// Stream the assistant reply for `messages` as content chunks.
    pub fn chat_stream(
        &self,
        messages: Vec<ChatMessage>,
        opts: ChatOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>> {
        let http = self.http.clone();
        let base_url = self.base_url.clone();
        let api_key = self.api_key.clone();

        Box::pin(try_stream! {
            let url = format!("{}/chat/completions", base_url);

            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("text/event-stream"));
            if let Some(key) = api_key.clone() {
                let hv = HeaderValue::from_str(&format!("Bearer {}", key))?;
                headers.insert(AUTHORIZATION, hv);
            }

            let body = request_body(&messages, &opts);

            let resp = http
                .post(url)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .context("failed to send chat request")?;

            if !resp.status().is_success() {
                let status = resp.status();
                Err(anyhow::anyhow!("LLM error: {}", status))?;
            }

            let mut buf: Vec<u8> = Vec::new();
            let mut stream = resp.bytes_stream();
            use futures_util::StreamExt as _;

            while let Some(chunk) = stream.next().await {
                let bytes = chunk.context("stream error")?;
                buf.extend_from_slice(&bytes);
                while let Some(line) = take_line(&mut buf) {
                    match parse_sse_line(&line) {
                        Some(StreamEvent::Done) => { yield StreamEvent::Done; return; }
                        Some(ev) => yield ev,
                        None => {}
                    }
                }
            }
            yield StreamEvent::Done;
        })
    }

    /// Collect a whole reply.
    pub async fn chat(&self, messages: Vec<ChatMessage>, opts: ChatOptions) -> Result<String> {
        use futures_util::StreamExt as _;
        let mut stream = self.chat_stream(messages, opts);
        let mut text = String::new();
        while let Some(ev) = stream.next().await {
            match ev? {
                StreamEvent::Content(t) => text.push_str(&t),
                StreamEvent::Done => break,
            }
        }
        Ok(text)
    }
}

fn request_body(messages: &[ChatMessage], opts: &ChatOptions) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": opts.model,
        "messages": messages,
        "stream": true,
    });
    if let Some(t) = opts.temperature {
        body["temperature"] = serde_json::json!(t);
    }
    if let Some(n) = opts.max_tokens {
        body["max_tokens"] = serde_json::json!(n);
    }
    body
}

/// Pop the next complete line off `buf`. Bytes are only decoded once the
/// newline arrives, so a character split across chunks stays intact.
fn take_line(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buf.drain(..=pos).collect();
    Some(String::from_utf8_lossy(&line).trim().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Content(String),
    Done,
}

/// Decode one SSE line. Comments, blank lines, malformed payloads and
/// empty deltas yield `None`.
pub fn parse_sse_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload == "[DONE]" {
        return Some(StreamEvent::Done);
    }
    let chunk: Chunk = serde_json::from_str(payload).ok()?;
    let content: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.and_then(|d| d.content))
        .collect();
    if content.is_empty() {
        None
    } else {
        Some(StreamEvent::Content(content))
    }
}

// Minimal chunk structures for OpenAI-like streaming
#[derive(Debug, Deserialize)]
struct Chunk {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_lines() {
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line(""), None);
        assert_eq!(parse_sse_line("data: [DONE]"), Some(StreamEvent::Done));
        assert_eq!(
            parse_sse_line(r#"data: {"id":"x","choices":[{"index":0,"delta":{"role":"assistant","content":"Hi"}}]}"#),
            Some(StreamEvent::Content("Hi".into()))
        );
        assert_eq!(parse_sse_line(r#"data: {"choices":[{"delta":{"content":""},"finish_reason":"stop"}]}"#), None);
        assert_eq!(parse_sse_line("data: {not json"), None);
    }

    #[test]
    fn lines_wait_for_split_characters() {
        let mut buf = b"data: {\"x\":\"\xC3".to_vec();
        assert_eq!(take_line(&mut buf), None);
        buf.extend_from_slice(b"\xA9\"}\r\nda");
        assert_eq!(take_line(&mut buf).as_deref(), Some("data: {\"x\":\"\u{e9}\"}"));
        assert_eq!(buf, b"da");
    }

    #[test]
    fn options_from_config() {
        let defaults = ChatOptions::from_config(&Config::from_pairs(Vec::<(String, String)>::new()));
        assert_eq!(defaults.model, "mistral-medium");
        let body = request_body(&[], &defaults);
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());

        let cfg = Config::from_pairs([("CHAT_TEMPERATURE", "0.2"), ("CHAT_MAX_TOKENS", "512")]);
        let opts = ChatOptions::from_config(&cfg);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(512));
        let body = request_body(&[ChatMessage::new(Role::User, "hi")], &opts);
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn message_serialization() {
        let m = ChatMessage::new(Role::System, "be brief");
        assert_eq!(serde_json::to_value(&m).unwrap(), serde_json::json!({"role": "system", "content": "be brief"}));
    }
}
