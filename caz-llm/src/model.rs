//! The encode → sample → decode contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{SamplingParams, TokenId};

/// A remote (possibly slow, possibly failing) language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Tokenize text.
    async fn encode(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Detokenize.
    async fn decode(&self, tokens: &[TokenId]) -> Result<String>;

    /// Sample a continuation of `prompt`.
    async fn sample(&self, prompt: &[TokenId], params: &SamplingParams) -> Result<Vec<TokenId>>;
}

#[async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    async fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        (**self).encode(text).await
    }

    async fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        (**self).decode(tokens).await
    }

    async fn sample(&self, prompt: &[TokenId], params: &SamplingParams) -> Result<Vec<TokenId>> {
        (**self).sample(prompt, params).await
    }
}

/// First token of `stop_sequence`, used as the turn-boundary stop token.
///
/// # Errors
/// Propagates tokenizer failures.
pub async fn stop_tokens(model: &dyn LanguageModel, stop_sequence: &str) -> Result<Vec<TokenId>> {
    let tokens = model.encode(stop_sequence).await?;
    Ok(tokens.into_iter().take(1).collect())
}

/// Remove every echoed `label:` and surrounding whitespace.
#[must_use]
pub fn strip_agent_label(text: &str, agent_name: &str) -> String {
    text.replace(&format!("{agent_name}:"), "").trim().to_string()
}

/// Sample and decode a reply for an already-encoded prompt.
///
/// # Errors
/// Propagates sampling and decoding failures.
pub async fn generate(
    model: &dyn LanguageModel,
    prompt: &[TokenId],
    params: &SamplingParams,
    agent_name: &str,
) -> Result<String> {
    let out = model.sample(prompt, params).await?;
    let text = model.decode(&out).await?;
    Ok(strip_agent_label(&text, agent_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_echoed_label() {
        assert_eq!(strip_agent_label(" Caz: hi there ", "Caz"), "hi there");
        assert_eq!(strip_agent_label("hello", "Caz"), "hello");
    }
}
