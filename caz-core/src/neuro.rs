//! Neurochemistry simulator.
//!
//! Integrates a [`SignalVector`] into the four-scalar [`AffectState`]:
//!
//! `x += dt * sensitivity_x * (drive_x(signals) - decay_x * (x - rest_x))`
//!
//! followed by a clamp to `[0, 1]`. Before each step a stochastic trigger
//! layer may fire mood swings. Every `feedback_interval` interactions the
//! simulator looks at its own recent volatility and retunes sensitivity and
//! decay.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DriveGains, NeuroConfig, TriggerConfig};
use crate::sentiment::SignalVector;
use crate::types::{AffectState, Hormone};

/// Sensitivity bounds.
pub const SENSITIVITY_RANGE: (f32, f32) = (0.5, 2.0);
/// Decay-rate bounds.
pub const DECAY_RANGE: (f32, f32) = (0.01, 0.3);

/// Minimum recorded interactions before feedback adapts anything. Also the
/// floor for the feedback window.
const MIN_FEEDBACK_RECORDS: usize = 10;

/// Curiosity below this never voices a thought.
const CURIOSITY_VOICE_THRESHOLD: f32 = 0.6;

const CURIOSITY_PROMPTS: [&str; 6] = [
    "I wonder what would happen if...",
    "Something about this feels unexplored...",
    "There's a pattern here I can't quite grasp...",
    "What if we tried something completely different?",
    "I'm curious about the edges of this idea...",
    "This reminds me of something, but I can't place it...",
];

/// What the organism currently wants, derived from its affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Desire {
    /// High dopamine.
    BuildOrLearn,
    /// High oxytocin.
    Connect,
    /// High cortisol.
    Escape,
    /// Low serotonin.
    Withdraw,
    /// Nothing pressing.
    Waiting,
}

impl Desire {
    /// Derive the current desire. First matching rule wins.
    #[must_use]
    pub fn from_affect(affect: &AffectState) -> Self {
        if affect.dopamine > 0.8 {
            Self::BuildOrLearn
        } else if affect.oxytocin > 0.8 {
            Self::Connect
        } else if affect.cortisol > 0.7 {
            Self::Escape
        } else if affect.serotonin < 0.3 {
            Self::Withdraw
        } else {
            Self::Waiting
        }
    }

    /// First-person rendering used in the prompt preamble.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::BuildOrLearn => "I want to build something or learn something new immediately.",
            Self::Connect => "I want to connect with the user and make them feel safe.",
            Self::Escape => "I want to escape this situation or fix the danger.",
            Self::Withdraw => "I want to withdraw and protect myself from failure.",
            Self::Waiting => "I am waiting for input.",
        }
    }
}

/// A trigger row plus its cooldown bookkeeping.
#[derive(Debug, Clone)]
struct Trigger {
    config: TriggerConfig,
    last_fired: Option<u64>,
}

impl Trigger {
    fn ready(&self, interaction: u64) -> bool {
        self.last_fired
            .is_none_or(|last| interaction.saturating_sub(last) >= self.config.cooldown)
    }
}

/// The self-tuning parameters, reported in status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveParams {
    /// Per-hormone sensitivity, canonical order.
    pub sensitivity: [f32; 4],
    /// Per-hormone decay rate, canonical order.
    pub decay: [f32; 4],
}

/// Serializable simulator checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuroCheckpoint {
    /// Current affect.
    pub state: AffectState,
    /// Tuned parameters.
    pub params: AdaptiveParams,
    /// Curiosity level.
    pub curiosity: f32,
    /// Interactions processed.
    pub interactions: u64,
}

/// The neurochemical simulator.
#[derive(Debug)]
pub struct NeuroSimulator {
    state: AffectState,
    rest: AffectState,
    gains: DriveGains,
    dt: f32,
    params: AdaptiveParams,
    triggers: Vec<Trigger>,
    triggers_enabled: bool,
    history: VecDeque<AffectState>,
    feedback_window: usize,
    analysis_span: usize,
    feedback_interval: u64,
    learning_rate: f32,
    high_volatility: f32,
    low_volatility: f32,
    curiosity: f32,
    interactions: u64,
    rng: StdRng,
}

impl NeuroSimulator {
    /// Create a simulator starting at `initial` (usually the personality baseline).
    #[must_use]
    pub fn new(config: &NeuroConfig, initial: AffectState) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: initial.clamped(),
            rest: config.rest_points,
            gains: config.gains,
            dt: config.dt,
            params: AdaptiveParams {
                sensitivity: [1.0; 4],
                decay: config.initial_decay_rates,
            },
            triggers: config
                .triggers
                .iter()
                .cloned()
                .map(|config| Trigger {
                    config,
                    last_fired: None,
                })
                .collect(),
            triggers_enabled: config.triggers_enabled,
            history: VecDeque::with_capacity(config.feedback_window.max(MIN_FEEDBACK_RECORDS)),
            feedback_window: config.feedback_window.max(MIN_FEEDBACK_RECORDS),
            analysis_span: config.feedback_analysis_span.max(1),
            feedback_interval: config.feedback_interval.max(1),
            learning_rate: config.learning_rate,
            high_volatility: config.high_volatility,
            low_volatility: config.low_volatility,
            curiosity: config.initial_curiosity.clamp(0.0, 1.0),
            interactions: 0,
            rng,
        }
    }

    /// Current affect.
    #[must_use]
    pub fn state(&self) -> AffectState {
        self.state
    }

    /// Current curiosity level in `[0, 1]`.
    #[must_use]
    pub fn curiosity(&self) -> f32 {
        self.curiosity
    }

    /// Interactions processed so far.
    #[must_use]
    pub fn interactions(&self) -> u64 {
        self.interactions
    }

    /// Current tuned parameters.
    #[must_use]
    pub fn params(&self) -> AdaptiveParams {
        self.params
    }

    /// Current desire.
    #[must_use]
    pub fn desire(&self) -> Desire {
        Desire::from_affect(&self.state)
    }

    /// Emotional intensity of the current state.
    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.state.intensity()
    }

    /// Draw a uniform index in `0..n` from the simulator's RNG.
    pub fn pick(&mut self, n: usize) -> usize {
        if n == 0 { 0 } else { self.rng.gen_range(0..n) }
    }

    /// A curious thought to voice, if any.
    ///
    /// Nothing below a curiosity of 0.6; above it a thought is voiced with
    /// probability equal to the curiosity.
    pub fn curiosity_prompt(&mut self) -> Option<&'static str> {
        let c = self.curiosity;
        if c < CURIOSITY_VOICE_THRESHOLD || !self.rng.gen_bool(f64::from(c)) {
            return None;
        }
        Some(CURIOSITY_PROMPTS[self.pick(CURIOSITY_PROMPTS.len())])
    }

    /// Advance one interaction.
    pub fn update(&mut self, signals: &SignalVector) -> AffectState {
        self.interactions += 1;

        if self.triggers_enabled {
            self.fire_triggers();
        }

        let dt = self.dt;
        let g = self.gains;
        let sens = self.params.sensitivity;
        let decay = self.params.decay;
        let rest = self.rest;
        let mut s = self.state;

        let step = |x: f32, drive: f32, i: usize, rest_x: f32| -> f32 {
            (x + dt * sens[i] * (drive - decay[i] * (x - rest_x))).clamp(0.0, 1.0)
        };

        s.dopamine = step(
            s.dopamine,
            g.dopamine_reward * signals.reward + g.dopamine_novelty * signals.novelty,
            0,
            rest.dopamine,
        );
        s.serotonin = step(
            s.serotonin,
            g.serotonin_social * signals.social - g.serotonin_stress * signals.stress,
            1,
            rest.serotonin,
        );
        // damping uses the serotonin just computed
        s.cortisol = step(
            s.cortisol,
            g.cortisol_stress * signals.stress - g.cortisol_serotonin_damping * s.serotonin,
            2,
            rest.cortisol,
        );
        s.oxytocin = step(s.oxytocin, g.oxytocin_social * signals.social, 3, rest.oxytocin);

        self.state = s.clamped();

        self.curiosity =
            (self.curiosity + 0.1 * signals.novelty - 0.05 * signals.reward).clamp(0.0, 1.0);

        if self.history.len() == self.feedback_window {
            self.history.pop_front();
        }
        self.history.push_back(self.state);

        if self.interactions % self.feedback_interval == 0 {
            self.adapt();
        }

        self.state
    }

    fn fire_triggers(&mut self) {
        let now = self.interactions;
        for trigger in &mut self.triggers {
            if !trigger.ready(now) {
                continue;
            }
            let p = trigger.config.probability.clamp(0.0, 1.0);
            if !self.rng.gen_bool(p) {
                continue;
            }
            for &(hormone, delta) in &trigger.config.effects {
                *self.state.get_mut(hormone) += delta;
            }
            self.state = self.state.clamped();
            trigger.last_fired = Some(now);
            debug!(trigger = %trigger.config.name, interaction = now, "Mood trigger fired");
        }
    }

    /// Volatility-driven retuning of sensitivity and decay.
    #[allow(clippy::cast_precision_loss)]
    fn adapt(&mut self) {
        if self.history.len() < MIN_FEEDBACK_RECORDS {
            return;
        }
        let span = self.analysis_span.min(self.history.len());
        let recent: Vec<AffectState> = self.history.iter().skip(self.history.len() - span).copied().collect();
        let count = recent.len() as f32;
        let lr = self.learning_rate;

        for (i, hormone) in Hormone::ALL.iter().enumerate() {
            let values: Vec<f32> = recent.iter().map(|s| s.get(*hormone)).collect();
            let mean = values.iter().sum::<f32>() / count;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / count;
            let std_dev = variance.sqrt();

            let sensitivity = &mut self.params.sensitivity[i];
            if std_dev > self.high_volatility {
                *sensitivity *= 1.0 - lr;
            } else if std_dev < self.low_volatility {
                *sensitivity *= 1.0 + lr;
            }
            *sensitivity = sensitivity.clamp(SENSITIVITY_RANGE.0, SENSITIVITY_RANGE.1);
        }

        let mean_intensity = recent.iter().map(AffectState::intensity).sum::<f32>() / count;
        let factor = if mean_intensity > 0.7 {
            0.95
        } else if mean_intensity < 0.3 {
            1.05
        } else {
            1.0
        };
        for d in &mut self.params.decay {
            *d = (*d * factor).clamp(DECAY_RANGE.0, DECAY_RANGE.1);
        }

        debug!(
            interaction = self.interactions,
            mean_intensity,
            sensitivity = ?self.params.sensitivity,
            decay = ?self.params.decay,
            "Feedback adjusted parameters"
        );
    }

    /// Snapshot the simulator.
    #[must_use]
    pub fn checkpoint(&self) -> NeuroCheckpoint {
        NeuroCheckpoint {
            state: self.state,
            params: self.params,
            curiosity: self.curiosity,
            interactions: self.interactions,
        }
    }

    /// Restore from a snapshot, clamping everything back into bounds.
    pub fn restore(&mut self, checkpoint: &NeuroCheckpoint) {
        self.state = checkpoint.state.clamped();
        for (s, c) in self.params.sensitivity.iter_mut().zip(checkpoint.params.sensitivity) {
            *s = c.clamp(SENSITIVITY_RANGE.0, SENSITIVITY_RANGE.1);
        }
        for (d, c) in self.params.decay.iter_mut().zip(checkpoint.params.decay) {
            *d = c.clamp(DECAY_RANGE.0, DECAY_RANGE.1);
        }
        self.curiosity = checkpoint.curiosity.clamp(0.0, 1.0);
        self.interactions = checkpoint.interactions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::SentimentLabel;

    fn quiet_config() -> NeuroConfig {
        NeuroConfig {
            triggers_enabled: false,
            rng_seed: Some(1),
            ..NeuroConfig::default()
        }
    }

    fn signals(stress: f32, reward: f32, social: f32, novelty: f32) -> SignalVector {
        SignalVector {
            stress,
            reward,
            social,
            novelty,
            label: SentimentLabel::Neutral,
        }
    }

    #[test]
    fn anger_raises_cortisol_by_more_than_point_three() {
        let mut sim = NeuroSimulator::new(&quiet_config(), AffectState::new(0.5, 0.5, 0.5, 0.5));
        let before = sim.state().cortisol;
        let after = sim.update(&signals(0.7, 0.0, -0.2, 0.0)).cortisol;
        assert!(after - before > 0.3, "cortisol rose only {}", after - before);
        assert!(sim.state().serotonin < 0.5);
    }

    #[test]
    fn zero_signals_relax_toward_rest() {
        let mut sim = NeuroSimulator::new(&quiet_config(), AffectState::new(0.9, 0.5, 0.9, 0.9));
        let before = sim.state();
        let after = sim.update(&SignalVector::default());
        assert!(after.dopamine < before.dopamine);
        assert!(after.oxytocin < before.oxytocin);
        // cortisol falls from decay plus serotonin damping
        assert!(after.cortisol < before.cortisol);
    }

    #[test]
    fn extreme_signals_stay_in_bounds() {
        let mut sim = NeuroSimulator::new(&NeuroConfig::default(), AffectState::NEUTRAL);
        for _ in 0..200 {
            let s = sim.update(&signals(1.0, 1.0, 1.0, 1.0));
            assert!(s.as_array().iter().all(|v| (0.0..=1.0).contains(v)));
        }
        for _ in 0..200 {
            let s = sim.update(&signals(-1.0, 0.0, -1.0, 0.0));
            assert!(s.as_array().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn certain_trigger_fires_then_cools_down() {
        let mut cfg = quiet_config();
        cfg.triggers_enabled = true;
        cfg.triggers = vec![TriggerConfig {
            name: "always".into(),
            probability: 1.0,
            effects: vec![(Hormone::Oxytocin, 0.3)],
            cooldown: 5,
        }];
        cfg.gains.oxytocin_social = 0.0;
        let mut sim = NeuroSimulator::new(&cfg, AffectState::new(0.5, 0.5, 0.0, 0.3));
        let first = sim.update(&SignalVector::default()).oxytocin;
        assert!(first > 0.55, "trigger should have fired: {first}");
        let second = sim.update(&SignalVector::default()).oxytocin;
        assert!(second < first, "cooldown should block a second firing");
        assert_eq!(sim.triggers[0].last_fired, Some(1));
    }

    #[test]
    fn calm_history_raises_sensitivity_and_decay() {
        let mut sim = NeuroSimulator::new(&quiet_config(), AffectState::new(0.5, 0.5, 0.5, 0.5));
        for _ in 0..10 {
            sim.update(&SignalVector::default());
        }
        let p = sim.params();
        assert!(p.sensitivity.iter().all(|s| *s > 1.0));
        assert!((p.decay[0] - 0.105).abs() < 1e-5);
    }

    #[test]
    fn feedback_respects_bounds() {
        let mut sim = NeuroSimulator::new(&quiet_config(), AffectState::new(0.5, 0.5, 0.5, 0.5));
        for _ in 0..2000 {
            sim.update(&SignalVector::default());
        }
        let p = sim.params();
        assert!(p.sensitivity.iter().all(|s| *s <= SENSITIVITY_RANGE.1));
        assert!(p.decay.iter().all(|d| *d <= DECAY_RANGE.1));
    }

    #[test]
    fn sensitivity_steps_are_multiplicative() {
        let mut sim = NeuroSimulator::new(&quiet_config(), AffectState::new(0.5, 0.5, 0.5, 0.5));
        for _ in 0..10 {
            sim.update(&SignalVector::default());
        }
        let lr = quiet_config().learning_rate;
        let p = sim.params();
        assert!(p.sensitivity.iter().all(|s| (s - (1.0 + lr)).abs() < 1e-6));

        for _ in 0..10 {
            sim.update(&SignalVector::default());
        }
        let expected = (1.0 + lr) * (1.0 + lr);
        assert!(sim.params().sensitivity.iter().all(|s| (s - expected).abs() < 1e-5));
    }

    #[test]
    fn small_window_still_adapts() {
        let config = NeuroConfig {
            feedback_window: 5,
            feedback_interval: 5,
            ..quiet_config()
        };
        let mut sim = NeuroSimulator::new(&config, AffectState::new(0.5, 0.5, 0.5, 0.5));
        for _ in 0..10 {
            sim.update(&SignalVector::default());
        }
        assert!(sim.params().sensitivity.iter().all(|s| *s > 1.0));
    }

    #[test]
    fn low_curiosity_voices_nothing() {
        let config = NeuroConfig {
            initial_curiosity: 0.59,
            ..quiet_config()
        };
        let mut sim = NeuroSimulator::new(&config, AffectState::NEUTRAL);
        assert!((0..200).all(|_| sim.curiosity_prompt().is_none()));
    }

    #[test]
    fn full_curiosity_always_voices_a_known_thought() {
        let config = NeuroConfig {
            initial_curiosity: 1.0,
            ..quiet_config()
        };
        let mut sim = NeuroSimulator::new(&config, AffectState::NEUTRAL);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let thought = sim.curiosity_prompt().unwrap();
            assert!(CURIOSITY_PROMPTS.contains(&thought));
            seen.insert(thought);
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn curiosity_tracks_novelty_and_reward() {
        let mut sim = NeuroSimulator::new(&quiet_config(), AffectState::NEUTRAL);
        sim.update(&signals(0.0, 0.0, 0.0, 1.0));
        assert!((sim.curiosity() - 0.6).abs() < 1e-6);
        sim.update(&signals(0.0, 1.0, 0.0, 0.0));
        assert!((sim.curiosity() - 0.55).abs() < 1e-6);
    }

    #[test]
    fn desire_rules_in_priority_order() {
        assert_eq!(
            Desire::from_affect(&AffectState::new(0.9, 0.5, 0.9, 0.9)),
            Desire::BuildOrLearn
        );
        assert_eq!(
            Desire::from_affect(&AffectState::new(0.5, 0.5, 0.9, 0.9)),
            Desire::Connect
        );
        assert_eq!(
            Desire::from_affect(&AffectState::new(0.5, 0.2, 0.8, 0.5)),
            Desire::Escape
        );
        assert_eq!(
            Desire::from_affect(&AffectState::new(0.5, 0.2, 0.3, 0.5)),
            Desire::Withdraw
        );
        assert_eq!(Desire::from_affect(&AffectState::NEUTRAL), Desire::Waiting);
    }

    #[test]
    fn checkpoint_restores_state() {
        let mut sim = NeuroSimulator::new(&quiet_config(), AffectState::NEUTRAL);
        sim.update(&signals(0.5, 0.0, 0.0, 0.0));
        let cp = sim.checkpoint();
        let mut other = NeuroSimulator::new(&quiet_config(), AffectState::NEUTRAL);
        other.restore(&cp);
        assert_eq!(other.state(), sim.state());
        assert_eq!(other.interactions(), 1);
    }
}
