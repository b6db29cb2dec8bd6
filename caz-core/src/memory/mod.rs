//! Affect-tagged episodic memory with salience-ranked recall.
//!
//! A [`MemoryStore`] holds every [`MemoryEntry`] the organism has formed
//! plus the implanted baseline. Entries are only ever destroyed by
//! [`MemoryStore::consolidate`], which runs automatically every
//! `consolidation_interval` additions.

pub mod consolidation;
pub mod scoring;
pub mod seed;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use consolidation::ConsolidationReport;
pub use seed::BaselineSeed;

use crate::config::MemoryConfig;
use crate::error::Result;
use crate::snapshot::{self, MEMORY_KEY, SnapshotStore};
use crate::types::{AffectState, MemoryId, RetrievalScore};

/// A single remembered exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique ID.
    pub id: MemoryId,
    /// First-person description.
    pub content: String,
    /// When the memory formed.
    pub created_at: DateTime<Utc>,
    /// Affect at formation.
    pub affect_snapshot: AffectState,
    /// Fixed at creation, `[0, 1]`.
    pub intensity: f32,
    /// Times recalled.
    pub access_count: u32,
    /// Last recall (creation time until first recall).
    pub last_accessed_at: DateTime<Utc>,
    /// Topic tags.
    pub tags: BTreeSet<String>,
    /// Implanted baseline; never evicted.
    pub is_baseline: bool,
}

impl MemoryEntry {
    /// A new acquired memory with intensity derived from `affect`.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        affect: AffectState,
        tags: impl IntoIterator<Item = String>,
        now: DateTime<Utc>,
    ) -> Self {
        let affect = affect.clamped();
        Self {
            id: MemoryId::new(),
            content: content.into(),
            created_at: now,
            affect_snapshot: affect,
            intensity: scoring::write_intensity(&affect),
            access_count: 0,
            last_accessed_at: now,
            tags: tags.into_iter().collect(),
            is_baseline: false,
        }
    }

    /// Salience at `now`.
    #[must_use]
    pub fn salience(&self, now: DateTime<Utc>, decay_per_hour: f64) -> f64 {
        scoring::salience(self, now, decay_per_hour)
    }
}

/// A recalled entry and the score it was ranked by.
#[derive(Debug, Clone, PartialEq)]
pub struct Recall {
    /// The entry, with its access bookkeeping already updated.
    pub entry: MemoryEntry,
    /// Ranking score.
    pub score: RetrievalScore,
}

/// Aggregate statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MemorySummary {
    /// All entries.
    pub total: usize,
    /// Implanted entries.
    pub baseline: usize,
    /// Entries formed from interactions.
    pub acquired: usize,
    /// Mean salience now (0 when empty).
    pub avg_salience: f64,
    /// Entries with salience above 0.7.
    pub high_salience_count: usize,
    /// Sum of access counts.
    pub total_accesses: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemoryCheckpoint {
    entries: Vec<MemoryEntry>,
    additions: u64,
}

/// The memory store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Vec<MemoryEntry>,
    additions: u64,
    config: MemoryConfig,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            additions: 0,
            config,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// All entries, in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Implant baseline seeds. Seeds with unrepresentable dates are skipped.
    /// Returns how many were added.
    pub fn implant(&mut self, seeds: Vec<BaselineSeed>, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.extend(seeds.into_iter().filter_map(|s| s.into_entry(now)));
        let n = self.entries.len() - before;
        info!(count = n, "Implanted baseline memories");
        n
    }

    /// Form a memory. Every `consolidation_interval`-th addition triggers
    /// consolidation, whose report is returned.
    pub fn add(
        &mut self,
        content: impl Into<String>,
        affect: AffectState,
        tags: impl IntoIterator<Item = String>,
        now: DateTime<Utc>,
    ) -> (MemoryId, Option<ConsolidationReport>) {
        let entry = MemoryEntry::new(content, affect, tags, now);
        let id = entry.id;
        debug!(memory = %id, intensity = entry.intensity, "Memory formed");
        self.entries.push(entry);
        self.additions += 1;

        let interval = self.config.consolidation_interval.max(1);
        let report = (self.additions % interval == 0).then(|| self.consolidate(now));
        (id, report)
    }

    /// Rank every entry against `query` and `affect`, return the top `k`
    /// and bump their access bookkeeping.
    pub fn retrieve(
        &mut self,
        query: &str,
        affect: &AffectState,
        k: usize,
        now: DateTime<Utc>,
    ) -> Vec<Recall> {
        if k == 0 || self.entries.is_empty() {
            return Vec::new();
        }
        let query = scoring::tokens(query);
        let decay = self.config.decay_rate_per_hour;

        let mut ranked: Vec<(usize, RetrievalScore)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                (
                    i,
                    RetrievalScore::new(scoring::retrieval_score(e, &query, affect, now, decay)),
                )
            })
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);

        ranked
            .into_iter()
            .map(|(i, score)| {
                let entry = &mut self.entries[i];
                entry.access_count = entry.access_count.saturating_add(1);
                entry.last_accessed_at = now;
                Recall {
                    entry: entry.clone(),
                    score,
                }
            })
            .collect()
    }

    /// Prune the store.
    pub fn consolidate(&mut self, now: DateTime<Utc>) -> ConsolidationReport {
        let report = consolidation::consolidate(&mut self.entries, now, &self.config);
        info!(
            before = report.before,
            after = report.after,
            below_threshold = report.below_threshold,
            over_capacity = report.over_capacity,
            "Memory consolidated"
        );
        report
    }

    /// Aggregate statistics at `now`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn summary(&self, now: DateTime<Utc>) -> MemorySummary {
        if self.entries.is_empty() {
            return MemorySummary::default();
        }
        let decay = self.config.decay_rate_per_hour;
        let saliences: Vec<f64> = self.entries.iter().map(|e| e.salience(now, decay)).collect();
        let baseline = self.entries.iter().filter(|e| e.is_baseline).count();
        MemorySummary {
            total: self.entries.len(),
            baseline,
            acquired: self.entries.len() - baseline,
            avg_salience: saliences.iter().sum::<f64>() / saliences.len() as f64,
            high_salience_count: saliences.iter().filter(|s| **s > 0.7).count(),
            total_accesses: self.entries.iter().map(|e| u64::from(e.access_count)).sum(),
        }
    }

    /// Save all entries through a snapshot store.
    ///
    /// # Errors
    /// Returns an error if encoding or the store fails.
    pub fn save(&self, store: &dyn SnapshotStore) -> Result<()> {
        let cp = MemoryCheckpoint {
            entries: self.entries.clone(),
            additions: self.additions,
        };
        snapshot::save_json(store, MEMORY_KEY, &cp)
    }

    /// Replace the contents with a saved checkpoint. Returns whether one was found.
    pub fn load(&mut self, store: &dyn SnapshotStore) -> bool {
        match snapshot::load_json::<MemoryCheckpoint>(store, MEMORY_KEY) {
            Some(cp) => {
                self.entries = cp.entries;
                self.additions = cp.additions;
                debug!(count = self.entries.len(), "Memory checkpoint restored");
                true
            }
            None => false,
        }
    }
}
