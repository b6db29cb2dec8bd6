//! Prompt assembly under a token budget.
//!
//! A prompt is an optional preamble followed by the conversation history and
//! the new message:
//!
//! ```text
//! <preamble>
//! User (Ana): hi
//! Caz: hello
//! User (Ana): how are you?
//! Caz:
//! ```
//!
//! When the encoded prompt does not fit, the oldest history turn is dropped
//! and the prompt is re-encoded. The preamble and the new message are never
//! dropped. The loop makes at most `history.len() + 1` attempts.

use std::fmt::Write as _;

use tracing::debug;

use crate::error::{LlmError, Result};
use crate::model::LanguageModel;
use crate::types::{PromptTurn, TokenId};

/// Label for the speaking user: `User (<name>)`.
#[must_use]
pub fn user_label(display_name: Option<&str>, stranger_label: &str) -> String {
    let name = display_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(stranger_label);
    format!("User ({name})")
}

/// Tokens left for the prompt once the reply has been reserved.
#[must_use]
pub fn prompt_budget(context_window: usize, max_tokens: u32) -> usize {
    context_window.saturating_sub(usize::try_from(max_tokens).unwrap_or(usize::MAX))
}

/// Renders prompts for one speaker pair.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    agent_name: String,
    user_label: String,
    preamble: Option<String>,
}

impl PromptBuilder {
    /// Builder for a conversation between `user_label` and `agent_name`.
    #[must_use]
    pub fn new(agent_name: impl Into<String>, user_label: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            user_label: user_label.into(),
            preamble: None,
        }
    }

    /// Text placed before the conversation. Empty preambles are ignored.
    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        let preamble = preamble.into();
        self.preamble = (!preamble.trim().is_empty()).then_some(preamble);
        self
    }

    /// The agent's speaker label.
    #[must_use]
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Render the prompt for `history` (oldest first) and `message`.
    #[must_use]
    pub fn render(&self, history: &[PromptTurn], message: &str) -> String {
        let mut out = String::new();
        if let Some(p) = &self.preamble {
            out.push_str(p.trim_end());
            out.push('\n');
        }
        for turn in history {
            let _ = writeln!(out, "{}: {}", self.user_label, turn.user);
            let _ = writeln!(out, "{}: {}", self.agent_name, turn.agent);
        }
        let _ = write!(out, "{}: {}\n{}:", self.user_label, message, self.agent_name);
        out
    }
}

/// An encoded prompt that fits the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedPrompt {
    /// Encoded prompt.
    pub tokens: Vec<TokenId>,
    /// Rendered prompt text.
    pub text: String,
    /// History turns kept (the newest ones).
    pub turns_used: usize,
    /// Encode attempts made.
    pub attempts: usize,
}

/// Encode the prompt, dropping the oldest history turns until it fits within
/// `budget` tokens.
///
/// # Errors
/// [`LlmError::PromptOverflow`] when even the bare message (with preamble)
/// does not fit; tokenizer errors are propagated.
pub async fn fit_prompt(
    model: &dyn LanguageModel,
    builder: &PromptBuilder,
    history: &[PromptTurn],
    message: &str,
    budget: usize,
) -> Result<FittedPrompt> {
    let mut last_len = 0;
    for start in 0..=history.len() {
        let kept = &history[start..];
        let text = builder.render(kept, message);
        let tokens = model.encode(&text).await?;
        let attempts = start + 1;
        if tokens.len() <= budget {
            if start > 0 {
                debug!(dropped = start, kept = kept.len(), tokens = tokens.len(), budget, "History truncated");
            }
            return Ok(FittedPrompt {
                tokens,
                text,
                turns_used: kept.len(),
                attempts,
            });
        }
        last_len = tokens.len();
    }
    Err(LlmError::PromptOverflow {
        tokens: last_len,
        budget,
    })
}
