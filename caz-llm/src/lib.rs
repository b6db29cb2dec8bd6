//! # caz-llm: tokenizer and generation contract for CAZ
//!
//! The organism treats text generation as an opaque remote call:
//!
//! ```text
//! encode(text) -> tokens
//! sample(tokens, max_tokens, temperature, stop_token_ids) -> tokens
//! decode(tokens) -> text
//! ```
//!
//! This crate provides:
//!   - [`LanguageModel`], the async contract
//!   - [`HttpModel`], a JSON-over-HTTP client for a sampling service
//!   - [`ScriptedModel`], a deterministic character-level model for tests
//!   - [`prompt`], prompt rendering and history truncation under a token budget

pub mod client;
pub mod error;
pub mod mock;
pub mod model;
pub mod prompt;
pub mod types;

pub use client::HttpModel;
pub use error::LlmError;
pub use mock::ScriptedModel;
pub use model::LanguageModel;
pub use prompt::{FittedPrompt, PromptBuilder};
pub use types::{PromptTurn, SamplingParams, TokenId};
