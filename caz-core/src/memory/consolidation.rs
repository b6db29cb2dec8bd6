//! Consolidation: salience-threshold pruning under a capacity cap.
//!
//! Baseline entries and entries younger than the exemption window always
//! survive. The rest must clear `retention_threshold`; if more than
//! `max_capacity` of them do, only the most salient `max_capacity` stay.

use chrono::{DateTime, Duration, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::MemoryConfig;
use crate::memory::MemoryEntry;
use crate::memory::scoring::salience;

/// What a consolidation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsolidationReport {
    /// Entries before the pass.
    pub before: usize,
    /// Entries kept unconditionally.
    pub exempt: usize,
    /// Entries dropped below the retention threshold.
    pub below_threshold: usize,
    /// Entries dropped by the capacity cap.
    pub over_capacity: usize,
    /// Entries after the pass.
    pub after: usize,
}

/// Whether `entry` is protected from eviction at `now`.
#[must_use]
pub fn is_exempt(entry: &MemoryEntry, now: DateTime<Utc>, config: &MemoryConfig) -> bool {
    entry.is_baseline || now - entry.created_at < Duration::seconds(config.recent_exemption_secs)
}

/// Prune `entries` in place. Surviving entries keep their relative order.
pub fn consolidate(
    entries: &mut Vec<MemoryEntry>,
    now: DateTime<Utc>,
    config: &MemoryConfig,
) -> ConsolidationReport {
    let before = entries.len();

    let mut keep = vec![false; before];
    let mut candidates: Vec<(usize, OrderedFloat<f64>)> = Vec::new();
    let mut exempt = 0;
    let mut below_threshold = 0;

    for (i, entry) in entries.iter().enumerate() {
        if is_exempt(entry, now, config) {
            keep[i] = true;
            exempt += 1;
            continue;
        }
        let s = salience(entry, now, config.decay_rate_per_hour);
        if s >= config.retention_threshold {
            candidates.push((i, OrderedFloat(s)));
        } else {
            below_threshold += 1;
        }
    }

    let mut over_capacity = 0;
    if candidates.len() > config.max_capacity {
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        over_capacity = candidates.len() - config.max_capacity;
        candidates.truncate(config.max_capacity);
    }
    for (i, _) in candidates {
        keep[i] = true;
    }

    let mut idx = 0;
    entries.retain(|_| {
        let k = keep[idx];
        idx += 1;
        k
    });

    ConsolidationReport {
        before,
        exempt,
        below_threshold,
        over_capacity,
        after: entries.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AffectState;

    fn cfg(max_capacity: usize) -> MemoryConfig {
        MemoryConfig {
            max_capacity,
            ..MemoryConfig::default()
        }
    }

    fn aged(hours: i64, affect: AffectState, now: DateTime<Utc>) -> MemoryEntry {
        MemoryEntry::new("m", affect, Vec::<String>::new(), now - Duration::hours(hours))
    }

    #[test]
    fn weak_old_entries_are_dropped() {
        let now = Utc::now();
        let mut entries = vec![
            aged(2, AffectState::new(0.5, 0.5, 0.5, 0.5), now),
            aged(2, AffectState::new(1.0, 0.0, 1.0, 0.0), now),
        ];
        let report = consolidate(&mut entries, now, &cfg(1000));
        assert_eq!(report.below_threshold, 1);
        assert_eq!(entries.len(), 1);
        assert!((entries[0].intensity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn recent_and_baseline_entries_survive() {
        let now = Utc::now();
        let flat = AffectState::new(0.5, 0.5, 0.5, 0.5);
        let mut baseline = aged(24 * 365, flat, now);
        baseline.is_baseline = true;
        let mut entries = vec![baseline, MemoryEntry::new("fresh", flat, Vec::<String>::new(), now)];
        let report = consolidate(&mut entries, now, &cfg(0));
        assert_eq!(report.exempt, 2);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn capacity_keeps_most_salient() {
        let now = Utc::now();
        let mut entries: Vec<MemoryEntry> = (0..5)
            .map(|h| aged(2 + h, AffectState::new(1.0, 0.0, 1.0, 0.0), now))
            .collect();
        let report = consolidate(&mut entries, now, &cfg(2));
        assert_eq!(report.over_capacity, 3);
        assert_eq!(entries.len(), 2);
        // youngest two are most salient
        let ages: Vec<i64> = entries.iter().map(|e| (now - e.created_at).num_hours()).collect();
        assert_eq!(ages, vec![2, 3]);
    }
}
