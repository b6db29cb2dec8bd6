//! Personality drift (neuroplasticity).
//!
//! The baseline is a slow exponential moving average of experienced affect.
//! Its learning rate shrinks with age:
//!
//! `plasticity = max(min, max_plasticity * exp(-age / maturation_age))`
//!
//! The baseline is saved through a [`SnapshotStore`] after every
//! [`Personality::grow`] and seeds the affect state on the next start.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PlasticityConfig;
use crate::snapshot::{self, PERSONALITY_KEY, SnapshotStore};
use crate::types::AffectState;

/// Persisted personality baseline. Field names match the on-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityBaseline {
    /// Long-term dopamine set point.
    pub dopamine_base: f32,
    /// Long-term serotonin set point.
    pub serotonin_base: f32,
    /// Long-term cortisol set point.
    pub cortisol_base: f32,
    /// Long-term oxytocin set point.
    pub oxytocin_base: f32,
    /// Current learning rate.
    pub plasticity: f32,
    /// Interactions experienced.
    pub age: u64,
}

impl PersonalityBaseline {
    /// A newborn personality.
    #[must_use]
    pub fn newborn(config: &PlasticityConfig) -> Self {
        let [d, s, c, o] = config.initial_baseline;
        Self {
            dopamine_base: d,
            serotonin_base: s,
            cortisol_base: c,
            oxytocin_base: o,
            plasticity: config.max_plasticity,
            age: 0,
        }
    }

    /// The baseline as an affect state.
    #[must_use]
    pub fn as_affect(&self) -> AffectState {
        AffectState::new(
            self.dopamine_base,
            self.serotonin_base,
            self.cortisol_base,
            self.oxytocin_base,
        )
    }

    fn sanitized(mut self, config: &PlasticityConfig) -> Self {
        let a = self.as_affect();
        self.dopamine_base = a.dopamine;
        self.serotonin_base = a.serotonin;
        self.cortisol_base = a.cortisol;
        self.oxytocin_base = a.oxytocin;
        if !self.plasticity.is_finite() {
            self.plasticity = config.max_plasticity;
        }
        self.plasticity = self
            .plasticity
            .clamp(config.min_plasticity, config.max_plasticity);
        self
    }
}

/// The drifting personality plus where it is saved.
pub struct Personality {
    baseline: PersonalityBaseline,
    config: PlasticityConfig,
    store: Arc<dyn SnapshotStore>,
}

impl std::fmt::Debug for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Personality")
            .field("baseline", &self.baseline)
            .finish_non_exhaustive()
    }
}

impl Personality {
    /// Load the saved baseline, or start newborn when it is missing or malformed.
    #[must_use]
    pub fn load(config: &PlasticityConfig, store: Arc<dyn SnapshotStore>) -> Self {
        let baseline = snapshot::load_json::<PersonalityBaseline>(store.as_ref(), PERSONALITY_KEY)
            .map_or_else(
                || PersonalityBaseline::newborn(config),
                |b| b.sanitized(config),
            );
        debug!(age = baseline.age, plasticity = baseline.plasticity, "Personality loaded");
        Self {
            baseline,
            config: config.clone(),
            store,
        }
    }

    /// The affect state a fresh process should start at.
    #[must_use]
    pub fn baseline_state(&self) -> AffectState {
        self.baseline.as_affect()
    }

    /// Current persisted record.
    #[must_use]
    pub fn baseline(&self) -> PersonalityBaseline {
        self.baseline
    }

    /// Drift one step toward `current` and save. Save failures are logged,
    /// not propagated.
    #[allow(clippy::cast_precision_loss)]
    pub fn grow(&mut self, current: &AffectState) {
        let b = &mut self.baseline;
        b.age += 1;
        b.plasticity = (self.config.max_plasticity
            * (-(b.age as f32) / self.config.maturation_age).exp())
        .max(self.config.min_plasticity);

        let p = b.plasticity;
        b.dopamine_base += (current.dopamine - b.dopamine_base) * p;
        b.serotonin_base += (current.serotonin - b.serotonin_base) * p;
        b.cortisol_base += (current.cortisol - b.cortisol_base) * p;
        b.oxytocin_base += (current.oxytocin - b.oxytocin_base) * p;

        if let Err(e) = snapshot::save_json(self.store.as_ref(), PERSONALITY_KEY, &self.baseline) {
            warn!(error = %e, age = self.baseline.age, "Failed to save personality baseline");
        }
    }
}
