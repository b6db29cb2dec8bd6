//! HTTP client for a remote tokenizer/sampling service.
//!
//! Expects three JSON endpoints under `base_url`:
//!
//! ```text
//! POST /encode  {"text": "..."}                       -> {"tokens": [..]}
//! POST /decode  {"tokens": [..]}                      -> {"text": "..."}
//! POST /sample  {"prompt": [..], "max_tokens": n,
//!                "temperature": t, "stop_token_ids": [..]} -> {"sequences": [{"tokens": [..]}]}
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{LlmError, Result};
use crate::model::LanguageModel;
use crate::types::{SamplingParams, TokenId};

#[derive(Deserialize)]
struct TokensBody {
    tokens: Vec<TokenId>,
}

#[derive(Deserialize)]
struct TextBody {
    text: String,
}

#[derive(Deserialize)]
struct SampleBody {
    #[serde(default)]
    sequences: Vec<TokensBody>,
}

#[derive(Serialize)]
struct SampleRequest<'a> {
    prompt: &'a [TokenId],
    max_tokens: u32,
    temperature: f32,
    stop_token_ids: &'a [TokenId],
}

/// Sampling service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpModel {
    base_url: String,
    http: Client,
    timeout_ms: u64,
}

impl HttpModel {
    /// Create a client. `timeout_ms` bounds each HTTP request.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
            timeout_ms,
        }
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        let start = Instant::now();
        let resp = self
            .http
            .post(&url)
            .json(body)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_ms)
                } else {
                    LlmError::from(e)
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!(%url, %status, "Sampling service returned error");
            return Err(LlmError::RequestFailed(format!("HTTP {status}: {text}")));
        }

        let parsed = resp
            .json::<T>()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        debug!(%url, latency_ms = start.elapsed().as_millis(), "Sampling service call");
        Ok(parsed)
    }
}

#[async_trait]
impl LanguageModel for HttpModel {
    async fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        let body: TokensBody = self.post("encode", &json!({ "text": text })).await?;
        Ok(body.tokens)
    }

    async fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        let body: TextBody = self.post("decode", &json!({ "tokens": tokens })).await?;
        Ok(body.text)
    }

    async fn sample(&self, prompt: &[TokenId], params: &SamplingParams) -> Result<Vec<TokenId>> {
        let req = SampleRequest {
            prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stop_token_ids: &params.stop_token_ids,
        };
        let body = serde_json::to_value(&req).map_err(|e| LlmError::ParseError(e.to_string()))?;
        let resp: SampleBody = self.post("sample", &body).await?;
        Ok(resp
            .sequences
            .into_iter()
            .next()
            .map(|s| s.tokens)
            .unwrap_or_default())
    }
}
