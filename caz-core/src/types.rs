//! Core type definitions shared across the organism.
//!
//! All types are serializable so they can be checkpointed through the
//! snapshot interface or embedded in chat-log JSON.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    /// Create a new random memory ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Affect Model: four neurochemical scalars
// ---------------------------------------------------------------------------

/// One of the four simulated neurochemicals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hormone {
    /// Reward and novelty seeking.
    Dopamine,
    /// Stability and contentment.
    Serotonin,
    /// Stress response.
    Cortisol,
    /// Social bonding.
    Oxytocin,
}

impl Hormone {
    /// All four hormones in canonical order.
    pub const ALL: [Self; 4] = [
        Self::Dopamine,
        Self::Serotonin,
        Self::Cortisol,
        Self::Oxytocin,
    ];

    /// Lowercase name, as used in seed files and JSON snapshots.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Dopamine => "dopamine",
            Self::Serotonin => "serotonin",
            Self::Cortisol => "cortisol",
            Self::Oxytocin => "oxytocin",
        }
    }
}

impl fmt::Display for Hormone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Momentary mood of the organism. Every scalar lives in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffectState {
    /// Reward / novelty drive.
    pub dopamine: f32,
    /// Stability; rests at 0.5.
    pub serotonin: f32,
    /// Stress; rests at 0.
    pub cortisol: f32,
    /// Social bonding; rests near 0.3.
    pub oxytocin: f32,
}

impl AffectState {
    /// Resting state of a freshly started organism with no personality file.
    pub const NEUTRAL: Self = Self {
        dopamine: 0.5,
        serotonin: 0.5,
        cortisol: 0.3,
        oxytocin: 0.4,
    };

    /// Create a new affect state, clamping every scalar to `[0, 1]`.
    #[must_use]
    pub fn new(dopamine: f32, serotonin: f32, cortisol: f32, oxytocin: f32) -> Self {
        Self {
            dopamine,
            serotonin,
            cortisol,
            oxytocin,
        }
        .clamped()
    }

    /// Copy with every scalar clamped to `[0, 1]`. NaN collapses to 0.
    #[must_use]
    pub fn clamped(self) -> Self {
        fn unit(x: f32) -> f32 {
            if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
        }
        Self {
            dopamine: unit(self.dopamine),
            serotonin: unit(self.serotonin),
            cortisol: unit(self.cortisol),
            oxytocin: unit(self.oxytocin),
        }
    }

    /// Read one scalar.
    #[must_use]
    pub fn get(&self, hormone: Hormone) -> f32 {
        match hormone {
            Hormone::Dopamine => self.dopamine,
            Hormone::Serotonin => self.serotonin,
            Hormone::Cortisol => self.cortisol,
            Hormone::Oxytocin => self.oxytocin,
        }
    }

    /// Mutable access to one scalar. Callers must re-clamp afterwards.
    pub fn get_mut(&mut self, hormone: Hormone) -> &mut f32 {
        match hormone {
            Hormone::Dopamine => &mut self.dopamine,
            Hormone::Serotonin => &mut self.serotonin,
            Hormone::Cortisol => &mut self.cortisol,
            Hormone::Oxytocin => &mut self.oxytocin,
        }
    }

    /// The scalars in canonical order.
    #[must_use]
    pub fn as_array(&self) -> [f32; 4] {
        [self.dopamine, self.serotonin, self.cortisol, self.oxytocin]
    }

    /// Emotional intensity: mean distance from 0.5, scaled to `[0, 1]`.
    #[must_use]
    pub fn intensity(&self) -> f32 {
        let sum: f32 = self.as_array().iter().map(|v| (v - 0.5).abs()).sum();
        (sum / 4.0) * 2.0
    }

    /// Similarity in `[0, 1]`: `1 - mean(|a - b|)`, floored at 0.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f32 {
        let a = self.as_array();
        let b = other.as_array();
        let diff: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum::<f32>() / 4.0;
        (1.0 - diff).max(0.0)
    }

    /// Conditioning-token rendering, e.g. `<DA=0.50><SE=0.50><CR=0.30><OX=0.40>`.
    #[must_use]
    pub fn conditioning_tokens(&self) -> String {
        format!(
            "<DA={:.2}><SE={:.2}><CR={:.2}><OX={:.2}>",
            self.dopamine, self.serotonin, self.cortisol, self.oxytocin
        )
    }
}

impl Default for AffectState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

// ---------------------------------------------------------------------------
// Durable records
// ---------------------------------------------------------------------------

/// The organism's global fatigue (adenosine analogue) and sleep flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiologicalState {
    /// Accumulated fatigue in `[0, 1]`.
    pub fatigue: f64,
    /// Set by the fatigue threshold or an external rest event.
    pub sleeping: bool,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl BiologicalState {
    /// Whether the gate must refuse normal processing.
    #[must_use]
    pub fn is_asleep(&self, sleep_threshold: f64) -> bool {
        self.sleeping || self.fatigue > sleep_threshold
    }
}

/// Per-user relationship ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Caller-supplied user identifier.
    pub user_id: String,
    /// Unbounded affinity score; very negative means hostile.
    pub affinity: f64,
    /// Messages received from this user (including refused-as-hostile ones).
    pub interaction_count: u64,
    /// Time of the most recent message.
    pub last_interaction_at: DateTime<Utc>,
    /// Name set through `my name is …`.
    pub display_name: Option<String>,
    /// Phrase set through `set secret …`.
    pub secret_phrase: Option<String>,
}

impl Relationship {
    /// A fresh ledger row with the given starting affinity.
    #[must_use]
    pub fn new(user_id: impl Into<String>, affinity: f64) -> Self {
        Self {
            user_id: user_id.into(),
            affinity,
            interaction_count: 0,
            last_interaction_at: Utc::now(),
            display_name: None,
            secret_phrase: None,
        }
    }
}

/// One append-only chat log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    /// Row id assigned by the store (0 before insertion).
    pub id: i64,
    /// Who sent the message.
    pub user_id: String,
    /// What they said.
    pub message: String,
    /// What the organism answered.
    pub response: String,
    /// JSON snapshot of biological + affect state at reply time.
    pub affect_snapshot_json: String,
    /// Insertion time.
    pub timestamp: DateTime<Utc>,
}

/// A past exchange used as prompt history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    /// The user's message.
    pub message: String,
    /// The organism's reply.
    pub response: String,
}

// ---------------------------------------------------------------------------
// Retrieval Score
// ---------------------------------------------------------------------------

/// Composite score used to rank memories during retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetrievalScore(pub OrderedFloat<f64>);

impl RetrievalScore {
    /// Create a retrieval score from a raw f64.
    #[must_use]
    pub fn new(score: f64) -> Self {
        Self(OrderedFloat(score))
    }

    /// Get the raw score value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_out_of_range() {
        let s = AffectState::new(1.7, -0.2, 0.5, f32::NAN);
        assert_eq!(s.dopamine, 1.0);
        assert_eq!(s.serotonin, 0.0);
        assert_eq!(s.oxytocin, 0.0);
    }

    #[test]
    fn intensity_of_midpoint_is_zero() {
        let s = AffectState::new(0.5, 0.5, 0.5, 0.5);
        assert!(s.intensity().abs() < f32::EPSILON);
    }

    #[test]
    fn intensity_of_extremes_is_one() {
        let s = AffectState::new(1.0, 0.0, 1.0, 0.0);
        assert!((s.intensity() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn similarity_is_one_for_identical_states() {
        let s = AffectState::NEUTRAL;
        assert!((s.similarity(&s) - 1.0).abs() < 1e-6);
        let far = AffectState::new(0.0, 0.0, 0.0, 0.0);
        let near = AffectState::new(1.0, 1.0, 1.0, 1.0);
        assert!(far.similarity(&near).abs() < 1e-6);
    }

    #[test]
    fn conditioning_tokens_format() {
        assert_eq!(
            AffectState::NEUTRAL.conditioning_tokens(),
            "<DA=0.50><SE=0.50><CR=0.30><OX=0.40>"
        );
    }
}
