//! A scripted, in-process language model.
//!
//! Tokenizes one token per Unicode scalar value, so token counts equal
//! character counts and `encode("\n")[0] == 10`. Replies are served from a
//! queue; when it runs dry the default reply is used. Failures and delays
//! can be injected to exercise timeout and error paths.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{LlmError, Result};
use crate::model::LanguageModel;
use crate::types::{SamplingParams, TokenId};

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<String>,
    prompts: Vec<String>,
    params: Vec<SamplingParams>,
}

/// Character-level model with scripted replies.
#[derive(Debug)]
pub struct ScriptedModel {
    script: Mutex<Script>,
    default_reply: String,
    fail: bool,
    delay: Option<Duration>,
}

impl ScriptedModel {
    /// Always answer `reply` unless more replies are queued.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(Script::default()),
            default_reply: reply.into(),
            fail: false,
            delay: None,
        }
    }

    /// A model whose `sample` always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    /// Sleep this long inside `sample`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply ahead of the default.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script.lock().replies.push_back(reply.into());
    }

    /// Number of `sample` calls so far.
    #[must_use]
    pub fn sample_calls(&self) -> usize {
        self.script.lock().prompts.len()
    }

    /// Decoded prompts passed to `sample`, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.script.lock().prompts.clone()
    }

    /// Sampling parameters passed to `sample`, in call order.
    #[must_use]
    pub fn params(&self) -> Vec<SamplingParams> {
        self.script.lock().params.clone()
    }

    fn to_text(tokens: &[TokenId]) -> String {
        tokens.iter().filter_map(|t| char::from_u32(*t)).collect()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(text.chars().map(u32::from).collect())
    }

    async fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        Ok(Self::to_text(tokens))
    }

    async fn sample(&self, prompt: &[TokenId], params: &SamplingParams) -> Result<Vec<TokenId>> {
        let reply = {
            let mut script = self.script.lock();
            script.prompts.push(Self::to_text(prompt));
            script.params.push(params.clone());
            script
                .replies
                .pop_front()
                .unwrap_or_else(|| self.default_reply.clone())
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(LlmError::Unavailable("scripted failure".into()));
        }
        let max = usize::try_from(params.max_tokens).unwrap_or(usize::MAX);
        let mut out = Vec::new();
        for c in reply.chars().take(max) {
            let t = u32::from(c);
            if params.stop_token_ids.contains(&t) {
                break;
            }
            out.push(t);
        }
        Ok(out)
    }
}
