//! Flashback recall.
//!
//! Flashbacks are a fixed set of vivid memories, loaded once from a seed
//! file, that surface either when the user mentions one of their trigger
//! keywords or when the organism's current affect resembles the flashback's
//! hormonal signature.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{AffectState, Hormone};

/// A hormone within this distance of the flashback's impact counts as a match.
const STATE_MATCH_WINDOW: f32 = 0.2;

/// One flashback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashback {
    /// Case-insensitive substrings that surface this flashback.
    #[serde(default, alias = "triggerKeywords")]
    pub trigger_keywords: Vec<String>,
    /// Hormonal signature.
    #[serde(default, alias = "hormonalImpact")]
    pub hormonal_impact: BTreeMap<Hormone, f32>,
    /// What is re-lived.
    pub content: String,
    /// Feeling label, e.g. "fear".
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Flashback {
    fn triggered_by(&self, lower_text: &str) -> bool {
        self.trigger_keywords
            .iter()
            .any(|k| !k.is_empty() && lower_text.contains(&k.to_lowercase()))
    }

    fn resonates_with(&self, affect: &AffectState) -> bool {
        self.hormonal_impact
            .iter()
            .any(|(h, level)| (affect.get(*h) - level).abs() < STATE_MATCH_WINDOW)
    }

    /// Prompt rendering.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "[INTERNAL FLASHBACK]: {}\n(This flashback makes you feel: {})",
            self.content, self.kind
        )
    }
}

/// The loaded flashback set.
#[derive(Debug, Clone, Default)]
pub struct FlashbackRecall {
    flashbacks: Vec<Flashback>,
}

impl FlashbackRecall {
    /// Wrap an explicit set.
    #[must_use]
    pub fn new(flashbacks: Vec<Flashback>) -> Self {
        Self { flashbacks }
    }

    /// Parse a JSON array. Malformed input yields an empty set.
    #[must_use]
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(flashbacks) => Self { flashbacks },
            Err(e) => {
                warn!(error = %e, "Malformed flashback data, none loaded");
                Self::default()
            }
        }
    }

    /// Read a seed file. Missing or unreadable files yield an empty set.
    #[must_use]
    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Flashback file unavailable");
                Self::default()
            }
        }
    }

    /// Number of flashbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flashbacks.len()
    }

    /// Whether nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flashbacks.is_empty()
    }

    /// Keyword trigger first (first match in file order); otherwise one of
    /// the affect-resonant flashbacks, chosen by `pick(count)`.
    pub fn recall(
        &self,
        text: &str,
        affect: &AffectState,
        pick: impl FnOnce(usize) -> usize,
    ) -> Option<&Flashback> {
        let lower = text.to_lowercase();
        if let Some(f) = self.flashbacks.iter().find(|f| f.triggered_by(&lower)) {
            return Some(f);
        }
        let resonant: Vec<&Flashback> = self
            .flashbacks
            .iter()
            .filter(|f| f.resonates_with(affect))
            .collect();
        if resonant.is_empty() {
            return None;
        }
        let i = pick(resonant.len()) % resonant.len();
        Some(resonant[i])
    }
}
