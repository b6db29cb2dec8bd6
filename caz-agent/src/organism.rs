//! The single shared organism.
//!
//! Everything that must change together when a message is felt lives here:
//! the sentiment tables, the neurochemical simulator, the memory store, the
//! flashback set, the drifting personality and the self-concept. The dialogue orchestrator
//! keeps one `Organism` behind one mutex.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use caz_core::config::CazConfig;
use caz_core::error::Result;
use caz_core::flashback::FlashbackRecall;
use caz_core::memory::seed;
use caz_core::memory::{MemorySummary, MemoryStore};
use caz_core::neuro::{AdaptiveParams, Desire, NeuroCheckpoint, NeuroSimulator};
use caz_core::plasticity::{Personality, PersonalityBaseline};
use caz_core::self_concept::SelfConcept;
use caz_core::sentiment::{SentimentAnalyzer, SignalVector};
use caz_core::snapshot::{self, NEURO_KEY, SELF_CONCEPT_KEY, SnapshotStore};
use caz_core::types::{AffectState, MemoryId};

/// What feeling one message produced.
#[derive(Debug, Clone)]
pub struct Perception {
    /// Extracted signals.
    pub signals: SignalVector,
    /// Affect after the update.
    pub affect: AffectState,
    /// Memory formed from the message, if it passed the write gate.
    pub remembered: Option<MemoryId>,
    /// Prompt preamble, when enabled.
    pub preamble: Option<String>,
}

/// Status report.
#[derive(Debug, Clone, Serialize)]
pub struct OrganismStatus {
    /// Current affect.
    pub affect: AffectState,
    /// Affect as conditioning tokens.
    pub conditioning: String,
    /// Current want.
    pub desire: Desire,
    /// Curiosity level.
    pub curiosity: f32,
    /// Messages felt since bootstrap.
    pub interactions: u64,
    /// Self-tuned sensitivity and decay.
    pub params: AdaptiveParams,
    /// Memory statistics.
    pub memory: MemorySummary,
    /// Personality baseline.
    pub personality: PersonalityBaseline,
    /// Trait levels.
    pub self_concept: SelfConcept,
}

/// The organism.
pub struct Organism {
    analyzer: SentimentAnalyzer,
    neuro: NeuroSimulator,
    memory: MemoryStore,
    flashbacks: FlashbackRecall,
    personality: Personality,
    self_concept: SelfConcept,
    snapshots: Arc<dyn SnapshotStore>,
    recall_top_k: usize,
    write_threshold: f32,
}

impl std::fmt::Debug for Organism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Organism")
            .field("affect", &self.neuro.state())
            .field("memories", &self.memory.len())
            .field("flashbacks", &self.flashbacks.len())
            .finish_non_exhaustive()
    }
}

impl Organism {
    /// Build the organism from configuration.
    ///
    /// Personality, simulator, self-concept and memory are restored from
    /// `snapshots`. A
    /// fresh simulator starts at the personality baseline. When no memory
    /// checkpoint exists the baseline seed file is implanted. Missing or
    /// malformed seed files mean no seeds.
    ///
    /// # Errors
    /// Only if the sentiment tables fail to compile.
    pub fn bootstrap(config: &CazConfig, snapshots: Arc<dyn SnapshotStore>) -> Result<Self> {
        let now = Utc::now();
        let analyzer = SentimentAnalyzer::new()?;
        let personality = Personality::load(&config.plasticity, snapshots.clone());
        let mut neuro = NeuroSimulator::new(&config.neuro, personality.baseline_state());
        if let Some(cp) = snapshot::load_json::<NeuroCheckpoint>(snapshots.as_ref(), NEURO_KEY) {
            neuro.restore(&cp);
        }

        let self_concept =
            snapshot::load_json::<SelfConcept>(snapshots.as_ref(), SELF_CONCEPT_KEY).unwrap_or_default();

        let mut memory = MemoryStore::new(config.memory.clone());
        if !memory.load(snapshots.as_ref()) {
            if let Some(path) = &config.persistence.memory_seed_path {
                memory.implant(seed::load_seed_file(Path::new(path)), now);
            }
        }

        let flashbacks = config
            .persistence
            .flashback_seed_path
            .as_deref()
            .map_or_else(FlashbackRecall::default, |p| FlashbackRecall::from_file(Path::new(p)));

        info!(
            memories = memory.len(),
            flashbacks = flashbacks.len(),
            age = personality.baseline().age,
            "Organism awake"
        );
        Ok(Self {
            analyzer,
            neuro,
            memory,
            flashbacks,
            personality,
            self_concept,
            snapshots,
            recall_top_k: config.memory.recall_top_k,
            write_threshold: config.memory.write_intensity_threshold,
        })
    }

    /// Feel a message: update affect, maybe remember it, recall related
    /// memories, drift the personality and self-concept and render the
    /// preamble.
    pub fn perceive(&mut self, text: &str, with_preamble: bool, now: DateTime<Utc>) -> Perception {
        let signals = self.analyzer.analyze(text);
        let affect = self.neuro.update(&signals);

        let remembered = (SentimentAnalyzer::should_remember(&signals)
            || affect.intensity() > self.write_threshold)
            .then(|| {
                let (id, _) = self.memory.add(
                    SentimentAnalyzer::describe(text, signals.label),
                    affect,
                    SentimentAnalyzer::tags(text, signals.label),
                    now,
                );
                id
            });

        let recalled = self.memory.retrieve(text, &affect, self.recall_top_k, now);
        let flashback = {
            let neuro = &mut self.neuro;
            self.flashbacks
                .recall(text, &affect, |n| neuro.pick(n))
                .map(|f| f.render())
        };

        self.personality.grow(&affect);
        self.self_concept.update(&affect);

        let preamble = with_preamble.then(|| {
            let reaction = SentimentAnalyzer::reaction_line(signals.label, self.neuro.pick(4));
            let mut p = format!(
                "{}\n[{}]\n[Desire]: {}\n[Internal reaction]: {reaction}\n",
                affect.conditioning_tokens(),
                self.self_concept.describe(),
                self.neuro.desire().describe(),
            );
            if let Some(thought) = self.neuro.curiosity_prompt() {
                let _ = writeln!(p, "[Curiosity]: {thought}");
            }
            if !recalled.is_empty() {
                p.push_str("[Memories]:\n");
                for r in &recalled {
                    let _ = writeln!(p, "- {}", r.entry.content);
                }
            }
            if let Some(f) = &flashback {
                let _ = writeln!(p, "{f}");
            }
            p
        });

        debug!(
            label = %signals.label,
            intensity = affect.intensity(),
            remembered = remembered.is_some(),
            recalled = recalled.len(),
            flashback = flashback.is_some(),
            "Message perceived"
        );
        Perception {
            signals,
            affect,
            remembered,
            preamble,
        }
    }

    /// The memory store.
    #[must_use]
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Save the simulator, self-concept and memory store through the
    /// snapshot store.
    ///
    /// # Errors
    /// Encoding or storage failures.
    pub fn checkpoint(&self) -> Result<()> {
        snapshot::save_json(self.snapshots.as_ref(), NEURO_KEY, &self.neuro.checkpoint())?;
        snapshot::save_json(self.snapshots.as_ref(), SELF_CONCEPT_KEY, &self.self_concept)?;
        self.memory.save(self.snapshots.as_ref())?;
        debug!(
            memories = self.memory.len(),
            interactions = self.neuro.interactions(),
            "Organism checkpoint saved"
        );
        Ok(())
    }

    /// Status report at `now`.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> OrganismStatus {
        let affect = self.neuro.state();
        OrganismStatus {
            affect,
            conditioning: affect.conditioning_tokens(),
            desire: self.neuro.desire(),
            curiosity: self.neuro.curiosity(),
            interactions: self.neuro.interactions(),
            params: self.neuro.params(),
            memory: self.memory.summary(now),
            personality: self.personality.baseline(),
            self_concept: self.self_concept,
        }
    }
}
