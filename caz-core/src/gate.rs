//! Biological / relationship gate.
//!
//! Decides whether a message is processed at all:
//!
//! ```text
//! asleep (sleeping || fatigue > threshold)  ──▶ Refuse(Asleep), no side effects
//! otherwise: upsert relationship (+delta, +1 interaction)
//!     affinity < hostility threshold        ──▶ Refuse(Hostile), upsert stays
//!     else                                  ──▶ Proceed(relationship)
//! ```
//!
//! After a reply is produced the orchestrator calls [`Gate::record_reply`]
//! to add fatigue. Waking is external ([`Gate::wake`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::GateConfig;
use crate::error::Result;
use crate::persistence::StateStore;
use crate::types::{BiologicalState, Relationship};

/// Why a message was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefusalReason {
    /// The organism is sleeping or too fatigued.
    Asleep,
    /// The user's affinity is below the hostility threshold.
    Hostile,
}

/// Gate outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Continue with this (already updated) relationship.
    Proceed(Relationship),
    /// Stop; reply with the canned text for the reason.
    Refuse(RefusalReason),
}

/// The gate over a shared [`StateStore`].
#[derive(Clone)]
pub struct Gate {
    store: Arc<dyn StateStore>,
    config: GateConfig,
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Gate {
    /// Create a gate.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, config: GateConfig) -> Self {
        Self { store, config }
    }

    /// Gate configuration.
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Admit or refuse a message from `user_id`.
    ///
    /// # Errors
    /// Persistence failures are fatal for the request.
    pub fn admit(&self, user_id: &str) -> Result<Admission> {
        let bio = self.store.biological_state()?;
        if bio.is_asleep(self.config.sleep_threshold) {
            info!(user = user_id, fatigue = bio.fatigue, sleeping = bio.sleeping, "Refused: asleep");
            return Ok(Admission::Refuse(RefusalReason::Asleep));
        }

        let rel = self
            .store
            .touch_relationship(user_id, self.config.affinity_delta)?;
        if rel.affinity < self.config.hostility_threshold {
            info!(user = user_id, affinity = rel.affinity, "Refused: hostile");
            return Ok(Admission::Refuse(RefusalReason::Hostile));
        }
        Ok(Admission::Proceed(rel))
    }

    /// Add one reply's worth of fatigue.
    ///
    /// # Errors
    /// Persistence failures are fatal for the request.
    pub fn record_reply(&self) -> Result<BiologicalState> {
        let state = self
            .store
            .increment_fatigue(self.config.fatigue_step, self.config.sleep_threshold)?;
        if state.sleeping {
            info!(fatigue = state.fatigue, "Organism fell asleep");
        }
        Ok(state)
    }

    /// External wake event.
    ///
    /// # Errors
    /// Persistence failures.
    pub fn wake(&self) -> Result<BiologicalState> {
        let state = self.store.wake()?;
        info!("Organism woke up");
        Ok(state)
    }

    /// External rest event.
    ///
    /// # Errors
    /// Persistence failures.
    pub fn rest(&self) -> Result<BiologicalState> {
        let state = self.store.rest()?;
        info!(fatigue = state.fatigue, "Organism put to rest");
        Ok(state)
    }

    /// Current biological state.
    ///
    /// # Errors
    /// Persistence failures.
    pub fn biological_state(&self) -> Result<BiologicalState> {
        self.store.biological_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::SqliteStateStore;

    fn setup() -> (Gate, Arc<SqliteStateStore>) {
        let store = Arc::new(SqliteStateStore::open_in_memory().unwrap());
        (Gate::new(store.clone(), GateConfig::default()), store)
    }

    #[test]
    fn fresh_user_proceeds() {
        let (gate, _) = setup();
        match gate.admit("alice").unwrap() {
            Admission::Proceed(rel) => {
                assert_eq!(rel.interaction_count, 1);
                assert!((rel.affinity - 0.1).abs() < 1e-9);
            }
            other => panic!("expected proceed, got {other:?}"),
        }
    }

    #[test]
    fn asleep_refuses_without_touching_relationship() {
        let (gate, store) = setup();
        store.set_biological_state(0.95, false).unwrap();
        assert_eq!(
            gate.admit("alice").unwrap(),
            Admission::Refuse(RefusalReason::Asleep)
        );
        assert!(store.relationship("alice").unwrap().is_none());
    }

    #[test]
    fn sleeping_flag_refuses_even_when_rested() {
        let (gate, store) = setup();
        store.set_biological_state(0.0, true).unwrap();
        assert_eq!(
            gate.admit("alice").unwrap(),
            Admission::Refuse(RefusalReason::Asleep)
        );
    }

    #[test]
    fn hostile_user_is_refused_but_counted() {
        let (gate, store) = setup();
        store
            .put_relationship(&Relationship::new("mallory", -10.0))
            .unwrap();
        assert_eq!(
            gate.admit("mallory").unwrap(),
            Admission::Refuse(RefusalReason::Hostile)
        );
        let rel = store.relationship("mallory").unwrap().unwrap();
        assert_eq!(rel.interaction_count, 1);
        assert!((rel.affinity + 9.9).abs() < 1e-9);
    }

    #[test]
    fn affinity_is_linear_in_interactions() {
        let (gate, store) = setup();
        for _ in 0..7 {
            gate.admit("dave").unwrap();
        }
        let rel = store.relationship("dave").unwrap().unwrap();
        assert!((rel.affinity - 0.7).abs() < 1e-9);
        assert_eq!(rel.interaction_count, 7);
    }

    #[test]
    fn replies_tire_the_organism_until_it_sleeps() {
        let (gate, _) = setup();
        let mut replies = 0;
        while !gate.biological_state().unwrap().is_asleep(0.9) {
            gate.record_reply().unwrap();
            replies += 1;
            assert!(replies < 100);
        }
        assert_eq!(replies, 19);
        assert_eq!(
            gate.admit("alice").unwrap(),
            Admission::Refuse(RefusalReason::Asleep)
        );
        gate.wake().unwrap();
        assert!(matches!(gate.admit("alice").unwrap(), Admission::Proceed(_)));
    }
}
