//! # caz-agent: the CAZ organism and its dialogue loop
//!
//! Ties the affect and memory pieces of `caz-core` and the generation contract
//! of `caz-llm` into a single conversational organism.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │                caz-agent                 │
//! │  ┌──────────┐  ┌──────────┐  ┌────────┐  │
//! │  │ Dialogue │─▶│ Organism │  │  Auth  │  │
//! │  └────┬─────┘  └────┬─────┘  └────────┘  │
//! │       │             │                    │
//! │       ▼             ▼                    │
//! │  ┌─────────┐   ┌──────────┐              │
//! │  │ caz-llm │   │ caz-core │              │
//! │  └─────────┘   └──────────┘              │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `api`: chat request/response types
//! - `auth`: in-band name and secret commands
//! - `dialogue`: the per-message orchestrator
//! - `organism`: the shared, mutex-guarded in-process state
//! - `telemetry`: tracing subscriber setup

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod dialogue;
pub mod error;
pub mod organism;
pub mod telemetry;

pub use api::{ChatRequest, ChatResponse, Mood};
pub use dialogue::{Dialogue, Status};
pub use error::AgentError;
pub use organism::Organism;
