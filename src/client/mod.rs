//! Reqwest client for the remote debug service (`/debug` and `/autocorrect`).

use std::fmt;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Body of `POST /debug`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRequest {
    pub code: String,
    pub language: String,
    pub user_input: String,
}

/// One line-level step of the backend's execution trace. Line numbers are
/// zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    pub line_number: usize,
    pub step_description: String,
}

/// Response of `POST /debug`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_steps: Option<Vec<ExecutionStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<String>>,
}

impl RunResult {
    pub fn output(output: impl Into<String>) -> Self {
        Self { output: Some(output.into()), ..Self::default() }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self { error: Some(error.into()), ..Self::default() }
    }

    /// The backend reports a program failure through a non-empty `error`
    /// unless the program also produced output.
    pub fn is_success(&self) -> bool {
        let has = |f: &Option<String>| f.as_deref().is_some_and(|s| !s.is_empty());
        has(&self.output) || !has(&self.error)
    }

    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }

    pub fn output_text(&self) -> &str {
        self.output.as_deref().unwrap_or_default()
    }

    pub fn steps(&self) -> &[ExecutionStep] {
        self.execution_steps.as_deref().unwrap_or_default()
    }

    /// Generated questions with blank lines dropped.
    pub fn question_list(&self) -> Vec<&str> {
        self.questions
            .iter()
            .flatten()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .collect()
    }
}

/// Body of `POST /autocorrect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectRequest {
    pub code: String,
}

/// Response of `POST /autocorrect`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Transport-level failure: the request never produced a usable JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    Status(u16),
    Transport(String),
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Status(code) => write!(f, "HTTP error! status: {code}"),
            ClientError::Transport(e) => write!(f, "request failed: {e}"),
            ClientError::Decode(e) => write!(f, "invalid response body: {e}"),
        }
    }
}

impl std::error::Error for ClientError {}

#[derive(Debug, Clone)]
pub struct DebugClient {
    http: reqwest::Client,
    base_url: String,
}

impl DebugClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.debug_api_url(), cfg.request_timeout())
    }

    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn run(&self, req: &RunRequest) -> Result<RunResult, ClientError> {
        tracing::debug!(language = %req.language, bytes = req.code.len(), "POST /debug");
        self.post_json("debug", req).await
    }

    pub async fn correct(&self, req: &CorrectRequest) -> Result<CorrectResult, ClientError> {
        tracing::debug!(bytes = req.code.len(), "POST /autocorrect");
        self.post_json("autocorrect", req).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::error!(%url, status = status.as_u16(), "backend returned an error status");
            return Err(ClientError::Status(status.as_u16()));
        }
        resp.json::<T>().await.map_err(|e| ClientError::Decode(e.to_string()))
    }
}
