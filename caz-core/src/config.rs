//! Configuration for the CAZ organism.
//!
//! Maps directly to `caz.toml`. Every field has a default so an empty file
//! (or no file at all) yields a working organism.

use serde::{Deserialize, Serialize};

use crate::types::{AffectState, Hormone};

/// Top-level CAZ configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CazConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Fatigue and affinity gate.
    #[serde(default)]
    pub gate: GateConfig,
    /// Neurochemistry simulator, triggers and feedback adaptation.
    #[serde(default)]
    pub neuro: NeuroConfig,
    /// Salience-ranked memory store.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Personality drift.
    #[serde(default)]
    pub plasticity: PlasticityConfig,
    /// Database, snapshots and seed files.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Tokenizer/generation service and prompt budget.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl CazConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::CoreError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error. `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json_logs: bool,
    /// The label the organism speaks under in prompts.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            agent_name: default_agent_name(),
        }
    }
}

/// Biological / relationship gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Added to affinity on every admitted-or-hostile message.
    #[serde(default = "default_affinity_delta")]
    pub affinity_delta: f64,
    /// Affinity strictly below this is hostile.
    #[serde(default = "default_hostility_threshold")]
    pub hostility_threshold: f64,
    /// Fatigue added after every produced reply.
    #[serde(default = "default_fatigue_step")]
    pub fatigue_step: f64,
    /// Fatigue strictly above this puts the organism to sleep.
    #[serde(default = "default_sleep_threshold")]
    pub sleep_threshold: f64,
    /// Reply returned while asleep.
    #[serde(default = "default_asleep_text")]
    pub asleep_text: String,
    /// Reply returned to hostile users.
    #[serde(default = "default_hostile_text")]
    pub hostile_text: String,
    /// Reply returned after `set secret …`.
    #[serde(default = "default_secret_ack_text")]
    pub secret_ack_text: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            affinity_delta: default_affinity_delta(),
            hostility_threshold: default_hostility_threshold(),
            fatigue_step: default_fatigue_step(),
            sleep_threshold: default_sleep_threshold(),
            asleep_text: default_asleep_text(),
            hostile_text: default_hostile_text(),
            secret_ack_text: default_secret_ack_text(),
        }
    }
}

/// Drive gains: how strongly each signal pushes each scalar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriveGains {
    /// Dopamine per unit reward.
    #[serde(default = "default_gain_reward")]
    pub dopamine_reward: f32,
    /// Dopamine per unit novelty.
    #[serde(default = "default_gain_novelty")]
    pub dopamine_novelty: f32,
    /// Serotonin per unit social.
    #[serde(default = "default_gain_one")]
    pub serotonin_social: f32,
    /// Serotonin lost per unit stress.
    #[serde(default = "default_gain_two")]
    pub serotonin_stress: f32,
    /// Cortisol per unit stress.
    #[serde(default = "default_gain_cortisol_stress")]
    pub cortisol_stress: f32,
    /// Cortisol damping per unit serotonin.
    #[serde(default = "default_gain_cortisol_damping")]
    pub cortisol_serotonin_damping: f32,
    /// Oxytocin per unit social.
    #[serde(default = "default_gain_oxytocin_social")]
    pub oxytocin_social: f32,
}

impl Default for DriveGains {
    fn default() -> Self {
        Self {
            dopamine_reward: default_gain_reward(),
            dopamine_novelty: default_gain_novelty(),
            serotonin_social: default_gain_one(),
            serotonin_stress: default_gain_two(),
            cortisol_stress: default_gain_cortisol_stress(),
            cortisol_serotonin_damping: default_gain_cortisol_damping(),
            oxytocin_social: default_gain_oxytocin_social(),
        }
    }
}

/// One row of the mood-swing trigger table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Name used in logs.
    pub name: String,
    /// Per-interaction firing probability.
    pub probability: f64,
    /// Additive effect per hormone.
    pub effects: Vec<(Hormone, f32)>,
    /// Interactions that must pass before the trigger may fire again.
    pub cooldown: u64,
}

/// Neurochemistry simulator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuroConfig {
    /// Integration step.
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Signal-to-drive gains.
    #[serde(default)]
    pub gains: DriveGains,
    /// Rest points the decay term pulls toward.
    #[serde(default = "default_rest_points")]
    pub rest_points: AffectState,
    /// Starting decay rates (adapted by feedback).
    #[serde(default = "default_decay_rates")]
    pub initial_decay_rates: [f32; 4],
    /// Rolling window of affect snapshots kept for feedback. Values below
    /// ten are raised to ten, the fewest snapshots feedback will read.
    #[serde(default = "default_50")]
    pub feedback_window: usize,
    /// Most recent snapshots analysed per adaptation.
    #[serde(default = "default_20")]
    pub feedback_analysis_span: usize,
    /// Adapt every this many interactions.
    #[serde(default = "default_10")]
    pub feedback_interval: u64,
    /// Step size of each sensitivity / decay adjustment.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Standard deviation above which sensitivity is lowered.
    #[serde(default = "default_high_volatility")]
    pub high_volatility: f32,
    /// Standard deviation below which sensitivity is raised.
    #[serde(default = "default_low_volatility")]
    pub low_volatility: f32,
    /// Whether the stochastic trigger layer runs.
    #[serde(default = "default_true")]
    pub triggers_enabled: bool,
    /// Trigger table.
    #[serde(default = "default_triggers")]
    pub triggers: Vec<TriggerConfig>,
    /// Fixed RNG seed; entropy-seeded when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    /// Curiosity at startup.
    #[serde(default = "default_half")]
    pub initial_curiosity: f32,
}

impl Default for NeuroConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            gains: DriveGains::default(),
            rest_points: default_rest_points(),
            initial_decay_rates: default_decay_rates(),
            feedback_window: default_50(),
            feedback_analysis_span: default_20(),
            feedback_interval: default_10(),
            learning_rate: default_learning_rate(),
            high_volatility: default_high_volatility(),
            low_volatility: default_low_volatility(),
            triggers_enabled: true,
            triggers: default_triggers(),
            rng_seed: None,
            initial_curiosity: default_half(),
        }
    }
}

/// Memory store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Exponential salience decay per hour of age.
    #[serde(default = "default_decay_per_hour")]
    pub decay_rate_per_hour: f64,
    /// Non-exempt entries below this salience are dropped on consolidation.
    #[serde(default = "default_retention_threshold")]
    pub retention_threshold: f64,
    /// Maximum non-exempt entries kept after consolidation.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,
    /// Consolidate every this many additions.
    #[serde(default = "default_consolidation_interval")]
    pub consolidation_interval: u64,
    /// Entries younger than this are never evicted.
    #[serde(default = "default_recent_exemption")]
    pub recent_exemption_secs: i64,
    /// Memories recalled per turn.
    #[serde(default = "default_recall_top_k")]
    pub recall_top_k: usize,
    /// Affect intensity above which a message is remembered regardless of signals.
    #[serde(default = "default_write_intensity")]
    pub write_intensity_threshold: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            decay_rate_per_hour: default_decay_per_hour(),
            retention_threshold: default_retention_threshold(),
            max_capacity: default_max_capacity(),
            consolidation_interval: default_consolidation_interval(),
            recent_exemption_secs: default_recent_exemption(),
            recall_top_k: default_recall_top_k(),
            write_intensity_threshold: default_write_intensity(),
        }
    }
}

/// Personality drift settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlasticityConfig {
    /// Baseline used when no personality snapshot exists.
    #[serde(default = "default_initial_baseline")]
    pub initial_baseline: [f32; 4],
    /// Plasticity at age 0.
    #[serde(default = "default_max_plasticity")]
    pub max_plasticity: f32,
    /// Plasticity floor.
    #[serde(default = "default_min_plasticity")]
    pub min_plasticity: f32,
    /// Age constant of the exponential maturation curve.
    #[serde(default = "default_maturation")]
    pub maturation_age: f32,
}

impl Default for PlasticityConfig {
    fn default() -> Self {
        Self {
            initial_baseline: default_initial_baseline(),
            max_plasticity: default_max_plasticity(),
            min_plasticity: default_min_plasticity(),
            maturation_age: default_maturation(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub database_path: String,
    /// Enable WAL mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Directory for JSON snapshots (personality baseline, memory checkpoint).
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
    /// Baseline memory seed file.
    #[serde(default)]
    pub memory_seed_path: Option<String>,
    /// Flashback seed file.
    #[serde(default)]
    pub flashback_seed_path: Option<String>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            wal_mode: true,
            snapshot_dir: default_snapshot_dir(),
            memory_seed_path: None,
            flashback_seed_path: None,
        }
    }
}

/// Tokenizer / generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the sampling service.
    #[serde(default = "default_llm_url")]
    pub base_url: String,
    /// Generation timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Tokens sampled per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Model context window in tokens.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    /// Past exchanges considered for the prompt.
    #[serde(default = "default_10_usize")]
    pub history_turns: usize,
    /// Text whose first token ends a turn.
    #[serde(default = "default_stop_sequence")]
    pub stop_sequence: String,
    /// Label used for users with no display name.
    #[serde(default = "default_stranger")]
    pub stranger_label: String,
    /// Reply used when generation fails or times out.
    #[serde(default = "default_placeholder")]
    pub failure_placeholder: String,
    /// Prepend conditioning tokens, desire, reaction, recalled memories and flashback.
    #[serde(default = "default_true")]
    pub include_preamble: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            context_window: default_context_window(),
            history_turns: default_10_usize(),
            stop_sequence: default_stop_sequence(),
            stranger_label: default_stranger(),
            failure_placeholder: default_placeholder(),
            include_preamble: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_agent_name() -> String {
    "Caz".to_string()
}
fn default_affinity_delta() -> f64 {
    0.1
}
fn default_hostility_threshold() -> f64 {
    -5.0
}
fn default_fatigue_step() -> f64 {
    0.05
}
fn default_sleep_threshold() -> f64 {
    0.9
}
fn default_asleep_text() -> String {
    "Zzz... (The organism is sleeping)".to_string()
}
fn default_hostile_text() -> String {
    "I don't want to talk to you.".to_string()
}
fn default_secret_ack_text() -> String {
    "Secret set. I'll remember that.".to_string()
}
fn default_gain_reward() -> f32 {
    3.0
}
fn default_gain_novelty() -> f32 {
    2.0
}
fn default_gain_one() -> f32 {
    1.0
}
fn default_gain_two() -> f32 {
    2.0
}
fn default_gain_cortisol_stress() -> f32 {
    5.0
}
fn default_gain_cortisol_damping() -> f32 {
    0.4
}
fn default_gain_oxytocin_social() -> f32 {
    3.0
}
fn default_dt() -> f32 {
    0.1
}
fn default_rest_points() -> AffectState {
    AffectState {
        dopamine: 0.0,
        serotonin: 0.5,
        cortisol: 0.0,
        oxytocin: 0.3,
    }
}
fn default_decay_rates() -> [f32; 4] {
    [0.1, 0.05, 0.08, 0.06]
}
fn default_50() -> usize {
    50
}
fn default_20() -> usize {
    20
}
fn default_10() -> u64 {
    10
}
fn default_10_usize() -> usize {
    10
}
fn default_learning_rate() -> f32 {
    0.01
}
fn default_high_volatility() -> f32 {
    0.3
}
fn default_low_volatility() -> f32 {
    0.1
}
fn default_half() -> f32 {
    0.5
}
fn default_triggers() -> Vec<TriggerConfig> {
    use Hormone::{Cortisol, Dopamine, Oxytocin, Serotonin};
    let row = |name: &str, probability, effects: &[(Hormone, f32)], cooldown| TriggerConfig {
        name: name.to_string(),
        probability,
        effects: effects.to_vec(),
        cooldown,
    };
    vec![
        row("sudden_excitement", 0.05, &[(Dopamine, 0.3), (Serotonin, 0.1)], 10),
        row("random_melancholy", 0.03, &[(Serotonin, -0.2), (Cortisol, 0.1)], 15),
        row("spontaneous_anxiety", 0.04, &[(Cortisol, 0.25), (Serotonin, -0.1)], 12),
        row("burst_of_warmth", 0.06, &[(Oxytocin, 0.3), (Serotonin, 0.15)], 8),
        row("creative_spark", 0.07, &[(Dopamine, 0.4), (Cortisol, -0.1)], 10),
    ]
}
fn default_decay_per_hour() -> f64 {
    0.1
}
fn default_retention_threshold() -> f64 {
    0.3
}
fn default_max_capacity() -> usize {
    1000
}
fn default_consolidation_interval() -> u64 {
    100
}
fn default_recent_exemption() -> i64 {
    3600
}
fn default_recall_top_k() -> usize {
    3
}
fn default_write_intensity() -> f32 {
    0.4
}
fn default_initial_baseline() -> [f32; 4] {
    [0.5; 4]
}
fn default_max_plasticity() -> f32 {
    0.1
}
fn default_min_plasticity() -> f32 {
    0.005
}
fn default_maturation() -> f32 {
    500.0
}
fn default_db_path() -> String {
    "caz_state.db".to_string()
}
fn default_snapshot_dir() -> String {
    "caz_snapshots".to_string()
}
fn default_llm_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_max_tokens() -> u32 {
    150
}
fn default_temperature() -> f32 {
    0.8
}
fn default_context_window() -> usize {
    2048
}
fn default_stop_sequence() -> String {
    "\n".to_string()
}
fn default_stranger() -> String {
    "Stranger".to_string()
}
fn default_placeholder() -> String {
    "[Brain Error]".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = CazConfig::from_toml("").unwrap();
        assert!((cfg.gate.affinity_delta - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.neuro.triggers.len(), 5);
        assert_eq!(cfg.memory.max_capacity, 1000);
        assert_eq!(cfg.llm.context_window, 2048);
    }

    #[test]
    fn partial_sections_override() {
        let cfg = CazConfig::from_toml(
            r#"
            [gate]
            fatigue_step = 0.2

            [neuro]
            triggers_enabled = false
            rng_seed = 7
            "#,
        )
        .unwrap();
        assert!((cfg.gate.fatigue_step - 0.2).abs() < f64::EPSILON);
        assert!((cfg.gate.sleep_threshold - 0.9).abs() < f64::EPSILON);
        assert!(!cfg.neuro.triggers_enabled);
        assert_eq!(cfg.neuro.rng_seed, Some(7));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = CazConfig::from_toml("[gate\nfoo=").unwrap_err();
        assert!(matches!(err, crate::CoreError::Config(_)));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caz.toml");
        std::fs::write(&path, "[general]\nagent_name = \"Wren\"\n").unwrap();
        let cfg = CazConfig::from_file(&path).unwrap();
        assert_eq!(cfg.general.agent_name, "Wren");
    }
}
