//! # CAZ Core Library
//!
//! The emotional gating and memory engine of a single conversational
//! organism serving many users:
//!
//! - **Sentiment**: raw text → stress / reward / social / novelty signals
//! - **Neurochemistry**: a four-scalar affect state (dopamine, serotonin,
//!   cortisol, oxytocin) driven by those signals, with mood-swing triggers
//!   and self-tuning sensitivity
//! - **Plasticity**: a slowly drifting personality baseline that survives
//!   restarts
//! - **Self-concept**: five personality traits nudged by strong affect
//! - **Memory**: affect-tagged episodic entries ranked by salience, pruned
//!   by periodic consolidation
//! - **Gate**: the fatigue counter and per-user affinity ledger that decide
//!   whether a message is processed at all
//!
//! Durable state lives behind [`persistence::StateStore`] and
//! [`snapshot::SnapshotStore`]; everything else is plain in-process data.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod flashback;
pub mod gate;
pub mod memory;
pub mod neuro;
pub mod persistence;
pub mod plasticity;
pub mod self_concept;
pub mod sentiment;
pub mod snapshot;
pub mod types;

pub use config::CazConfig;
pub use error::CoreError;
pub use memory::{MemoryEntry, MemoryStore};
pub use types::*;
