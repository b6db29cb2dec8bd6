//! Per-factor scoring for memory retention and recall.
//!
//! ```text
//! intensity(a)   = mean(|a_x - 0.5|) * 2, x1.3 if cortisol > 0.7, x1.2 if dopamine > 0.7, <= 1
//! salience(m, t) = intensity * exp(-λ * hours(t - created)) * (1 + 0.1 * accesses)
//! score(m, q, a) = salience * (1 + similarity(a, m.affect)) * (1 + 0.2 * overlap(q, m))
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::memory::MemoryEntry;
use crate::types::AffectState;

const SECS_PER_HOUR: f64 = 3600.0;

/// Write-time intensity of a memory formed in affect `a`.
#[must_use]
pub fn write_intensity(a: &AffectState) -> f32 {
    let mut intensity = a.intensity();
    if a.cortisol > 0.7 {
        intensity *= 1.3;
    }
    if a.dopamine > 0.7 {
        intensity *= 1.2;
    }
    intensity.min(1.0)
}

/// Age in fractional hours. Entries from the future count as brand new.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn age_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created_at).num_milliseconds().max(0);
    millis as f64 / 1000.0 / SECS_PER_HOUR
}

/// Decayed, rehearsal-boosted salience at `now`.
#[must_use]
pub fn salience(entry: &MemoryEntry, now: DateTime<Utc>, decay_per_hour: f64) -> f64 {
    let recency = (-decay_per_hour * age_hours(entry.created_at, now)).exp();
    let rehearsal = 1.0 + 0.1 * f64::from(entry.access_count);
    f64::from(entry.intensity) * recency * rehearsal
}

/// Lowercased alphanumeric tokens.
#[must_use]
pub fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Distinct query tokens that occur in the entry's content or tags.
#[must_use]
pub fn keyword_overlap(query: &BTreeSet<String>, entry: &MemoryEntry) -> usize {
    let mut words = tokens(&entry.content);
    words.extend(entry.tags.iter().map(|t| t.to_lowercase()));
    query.intersection(&words).count()
}

/// Full retrieval score.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn retrieval_score(
    entry: &MemoryEntry,
    query: &BTreeSet<String>,
    affect: &AffectState,
    now: DateTime<Utc>,
    decay_per_hour: f64,
) -> f64 {
    let similarity = f64::from(affect.similarity(&entry.affect_snapshot));
    let overlap = keyword_overlap(query, entry) as f64;
    salience(entry, now, decay_per_hour) * (1.0 + similarity) * (1.0 + 0.2 * overlap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry_at(created_at: DateTime<Utc>, access_count: u32) -> MemoryEntry {
        let mut e = MemoryEntry::new(
            "User yelled at me",
            AffectState::new(0.5, 0.2, 0.9, 0.3),
            ["angry".to_string()],
            created_at,
        );
        e.access_count = access_count;
        e
    }

    #[test]
    fn stress_and_reward_boost_intensity() {
        let calm = AffectState::new(0.6, 0.5, 0.5, 0.5);
        assert!((write_intensity(&calm) - 0.05).abs() < 1e-6);
        let stressed = AffectState::new(0.5, 0.5, 0.9, 0.5);
        assert!((write_intensity(&stressed) - 0.2 * 1.3).abs() < 1e-6);
        let extreme = AffectState::new(1.0, 0.0, 1.0, 0.0);
        assert!((write_intensity(&extreme) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn salience_decays_with_age() {
        let now = Utc::now();
        let young = entry_at(now - Duration::hours(1), 0);
        let old = entry_at(now - Duration::hours(10), 0);
        assert!(salience(&young, now, 0.1) > salience(&old, now, 0.1));
    }

    #[test]
    fn salience_grows_with_access() {
        let now = Utc::now();
        let a = entry_at(now, 0);
        let b = entry_at(now, 3);
        assert!((salience(&b, now, 0.1) / salience(&a, now, 0.1) - 1.3).abs() < 1e-9);
    }

    #[test]
    fn overlap_counts_content_and_tags() {
        let e = entry_at(Utc::now(), 0);
        assert_eq!(keyword_overlap(&tokens("Who YELLED? so angry"), &e), 2);
        assert_eq!(keyword_overlap(&tokens("weather"), &e), 0);
    }
}
