//! Baseline memory seeds.
//!
//! A seed file is a JSON array of implanted experiences:
//!
//! ```json
//! [{"content": "...", "age_days": 30, "emotional_state": {"dopamine": 0.2, ...},
//!   "intensity": 0.8, "tags": ["family"]}]
//! ```
//!
//! Seeds become non-evictable baseline entries dated `age_days` in the past.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::memory::MemoryEntry;
use crate::types::{AffectState, MemoryId};

/// One implanted experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSeed {
    /// What happened.
    pub content: String,
    /// How long ago, in days.
    #[serde(default, alias = "ageInDays")]
    pub age_days: f64,
    /// Affect at the time.
    #[serde(alias = "affect_snapshot", alias = "affectSnapshot")]
    pub emotional_state: AffectState,
    /// Fixed intensity.
    pub intensity: f32,
    /// Topic tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BaselineSeed {
    /// Turn the seed into a baseline entry relative to `now`.
    ///
    /// `None` when the age cannot be represented as a date before `now`.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn into_entry(self, now: DateTime<Utc>) -> Option<MemoryEntry> {
        // saturating cast; NaN and negative ages become 0
        let age_secs = (self.age_days.max(0.0) * 86_400.0) as i64;
        let Some(created_at) =
            Duration::try_seconds(age_secs).and_then(|age| now.checked_sub_signed(age))
        else {
            warn!(content = %self.content, age_days = self.age_days, "Seed age out of range, skipped");
            return None;
        };
        let intensity = if self.intensity.is_finite() {
            self.intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(MemoryEntry {
            id: MemoryId::new(),
            content: self.content,
            created_at,
            affect_snapshot: self.emotional_state.clamped(),
            intensity,
            access_count: 0,
            last_accessed_at: created_at,
            tags: self.tags.into_iter().collect(),
            is_baseline: true,
        })
    }
}

/// Parse a seed document. Malformed input yields no seeds.
#[must_use]
pub fn parse_seeds(json: &str) -> Vec<BaselineSeed> {
    match serde_json::from_str(json) {
        Ok(seeds) => seeds,
        Err(e) => {
            warn!(error = %e, "Malformed memory seed data, implanting nothing");
            Vec::new()
        }
    }
}

/// Read a seed file. A missing or unreadable file yields no seeds.
#[must_use]
pub fn load_seed_file(path: &Path) -> Vec<BaselineSeed> {
    match std::fs::read_to_string(path) {
        Ok(json) => {
            let seeds = parse_seeds(&json);
            info!(path = %path.display(), count = seeds.len(), "Loaded memory seeds");
            seeds
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Memory seed file unavailable");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_field_spellings() {
        let seeds = parse_seeds(
            r#"[
                {"content": "a", "age_days": 2, "emotional_state":
                    {"dopamine": 0.1, "serotonin": 0.2, "cortisol": 0.9, "oxytocin": 0.1},
                 "intensity": 0.9, "tags": ["family"]},
                {"content": "b", "ageInDays": 1, "affectSnapshot":
                    {"dopamine": 0.5, "serotonin": 0.5, "cortisol": 0.5, "oxytocin": 0.5},
                 "intensity": 0.4}
            ]"#,
        );
        assert_eq!(seeds.len(), 2);
        assert!((seeds[1].age_days - 1.0).abs() < f64::EPSILON);
        assert!(seeds[1].tags.is_empty());
    }

    #[test]
    fn malformed_seed_data_is_empty() {
        assert!(parse_seeds("{\"not\": \"a list\"}").is_empty());
        assert!(load_seed_file(Path::new("/definitely/not/here.json")).is_empty());
    }

    #[test]
    fn entry_is_backdated_baseline() {
        let now = Utc::now();
        let seed = BaselineSeed {
            content: "first day".into(),
            age_days: 3.0,
            emotional_state: AffectState::NEUTRAL,
            intensity: 1.4,
            tags: vec!["work".into()],
        };
        let e = seed.into_entry(now).unwrap();
        assert!(e.is_baseline);
        assert_eq!((now - e.created_at).num_days(), 3);
        assert!((e.intensity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unrepresentable_age_is_skipped() {
        let seeds = parse_seeds(
            r#"[{"content": "ancient", "age_days": 1e12, "emotional_state":
                    {"dopamine": 0.5, "serotonin": 0.5, "cortisol": 0.5, "oxytocin": 0.5},
                 "intensity": 0.5},
                {"content": "recent", "age_days": 1, "emotional_state":
                    {"dopamine": 0.5, "serotonin": 0.5, "cortisol": 0.5, "oxytocin": 0.5},
                 "intensity": 0.5}]"#,
        );
        assert_eq!(seeds.len(), 2);
        let now = Utc::now();
        assert!(seeds[0].clone().into_entry(now).is_none());
        assert!(seeds[1].clone().into_entry(now).is_some());
    }
}
