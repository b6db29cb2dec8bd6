//! Sentiment extraction: raw user text to a [`SignalVector`].
//!
//! Categories form an ordered table. Each category owns a cue set and a
//! signal formula; a later matching category overwrites the label and the
//! fields its formula writes. Aggression and anger are exclusive: anger is
//! only evaluated when aggression found nothing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// What the extractor thinks the user is feeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    /// No cue matched.
    #[default]
    Neutral,
    /// Threats or direct hostility.
    Aggressive,
    /// Profanity, shouting, insults.
    Angry,
    /// Warmth and gratitude.
    Kind,
    /// Compliments about the organism.
    Praising,
    /// The user is hurting.
    Sad,
    /// High energy, enthusiasm.
    Excited,
}

impl SentimentLabel {
    /// Lowercase label, also used as a memory tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Aggressive => "aggressive",
            Self::Angry => "angry",
            Self::Kind => "kind",
            Self::Praising => "praising",
            Self::Sad => "sad",
            Self::Excited => "excited",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stimulus extracted from one message. `stress` and `social` may be
/// negative (kindness relieves stress, aggression withdraws socially).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalVector {
    /// Threat perceived.
    pub stress: f32,
    /// Positive reinforcement.
    pub reward: f32,
    /// Social warmth.
    pub social: f32,
    /// Stimulation / surprise.
    pub novelty: f32,
    /// Dominant category.
    pub label: SentimentLabel,
}

impl SignalVector {
    /// Largest absolute signal.
    #[must_use]
    pub fn peak(&self) -> f32 {
        self.stress
            .abs()
            .max(self.reward.abs())
            .max(self.social.abs())
            .max(self.novelty.abs())
    }
}

type Formula = fn(usize, &mut SignalVector);

struct CueCategory {
    label: SentimentLabel,
    cues: Vec<Regex>,
    skip_if: Option<SentimentLabel>,
    formula: Formula,
}

#[allow(clippy::cast_precision_loss)]
fn n(count: usize) -> f32 {
    count as f32
}

fn aggression(c: usize, s: &mut SignalVector) {
    s.stress = (0.8 + 0.1 * n(c)).min(1.0);
    s.social = -0.3;
}

fn anger(c: usize, s: &mut SignalVector) {
    s.stress = (0.4 + 0.15 * n(c)).min(0.7);
    s.social = -0.2;
}

fn kindness(c: usize, s: &mut SignalVector) {
    s.reward = (0.3 + 0.2 * n(c)).min(0.8);
    s.social = (0.4 + 0.2 * n(c)).min(0.9);
    s.stress = -0.2;
}

fn praise(c: usize, s: &mut SignalVector) {
    s.reward = (0.6 + 0.2 * n(c)).min(1.0);
    s.social = (0.5 + 0.15 * n(c)).min(0.8);
}

fn sadness(c: usize, s: &mut SignalVector) {
    s.social = (0.4 + 0.15 * n(c)).min(0.7);
    s.stress = (0.2 + 0.1 * n(c)).min(0.5);
}

fn excitement(c: usize, s: &mut SignalVector) {
    s.novelty = (0.3 + 0.2 * n(c)).min(0.8);
    s.reward = (0.2 + 0.15 * n(c)).min(0.6);
}

/// Topic keywords that become memory tags when present in a message.
const TOPIC_TAGS: [&str; 8] = [
    "work", "family", "friend", "stress", "happy", "sad", "angry", "excited",
];

/// Pure, deterministic sentiment extractor.
///
/// Cue sets are compiled once at construction; [`analyze`](Self::analyze)
/// never fails.
pub struct SentimentAnalyzer {
    categories: Vec<CueCategory>,
}

impl fmt::Debug for SentimentAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentAnalyzer")
            .field("categories", &self.categories.len())
            .finish()
    }
}

impl SentimentAnalyzer {
    /// Compile the cue table.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if a cue pattern fails to compile.
    pub fn new() -> Result<Self> {
        use SentimentLabel::{Aggressive, Angry, Excited, Kind, Praising, Sad};

        let table: [(SentimentLabel, &[&str], Option<SentimentLabel>, Formula); 6] = [
            (
                Aggressive,
                &[
                    r"(?i)\b(kill|hurt|destroy|attack|fight)\b",
                    r"(?i)\bi (hate|despise|can't stand) you\b",
                    r"(?i)\byou (suck|fail|are terrible)\b",
                ],
                None,
                aggression,
            ),
            (
                Angry,
                &[
                    r"(?i)\b(fuck|shit|damn|hell|stupid|idiot|dumb|hate)\b",
                    // shouting; deliberately case-sensitive
                    r"\b[A-Z]{4,}\b",
                    r"!{2,}",
                    r"(?i)\byou're (stupid|dumb|useless|wrong|terrible)\b",
                    r"(?i)\bshut up\b",
                    r"(?i)\bstop\b.*\b(it|that)\b",
                ],
                Some(Aggressive),
                anger,
            ),
            (
                Kind,
                &[
                    r"(?i)\b(love|like|appreciate|thank|thanks|grateful)\b",
                    r"(?i)\byou're (great|amazing|wonderful|awesome|helpful|kind)\b",
                    r"(?i)\bgood (job|work)\b",
                    r"(?i)\bwell done\b",
                    r"<3|❤️|😊|🙂",
                ],
                None,
                kindness,
            ),
            (
                Praising,
                &[
                    r"(?i)\b(excellent|brilliant|perfect|fantastic|incredible)\b",
                    r"(?i)\byou're (smart|clever|intelligent|talented)\b",
                    r"(?i)\bi'm (proud|impressed)\b",
                ],
                None,
                praise,
            ),
            (
                Sad,
                &[
                    r"(?i)\b(sad|depressed|lonely|hurt|pain|crying|tears)\b",
                    r"(?i)\bi (feel|am) (terrible|awful|horrible|miserable)\b",
                    r"😢|😭|💔",
                ],
                None,
                sadness,
            ),
            (
                Excited,
                &[
                    r"(?i)\b(excited|amazing|wow|awesome|incredible|fantastic)\b",
                    r"😄|🎉|✨|🔥",
                ],
                None,
                excitement,
            ),
        ];

        let mut categories = Vec::with_capacity(table.len());
        for (label, patterns, skip_if, formula) in table {
            let cues = patterns
                .iter()
                .map(|p| Regex::new(p).map_err(|e| CoreError::Config(format!("cue {p}: {e}"))))
                .collect::<Result<Vec<_>>>()?;
            categories.push(CueCategory {
                label,
                cues,
                skip_if,
                formula,
            });
        }
        Ok(Self { categories })
    }

    /// Total cue matches of one category.
    fn count(category: &CueCategory, text: &str) -> usize {
        category.cues.iter().map(|re| re.find_iter(text).count()).sum()
    }

    /// Extract signals from `text`.
    #[must_use]
    pub fn analyze(&self, text: &str) -> SignalVector {
        let mut signals = SignalVector::default();
        let mut matched: Vec<SentimentLabel> = Vec::new();

        for category in &self.categories {
            if category.skip_if.is_some_and(|l| matched.contains(&l)) {
                continue;
            }
            let hits = Self::count(category, text);
            if hits > 0 {
                (category.formula)(hits, &mut signals);
                signals.label = category.label;
                matched.push(category.label);
            }
        }
        signals
    }

    /// Whether the signals are strong enough to form a memory.
    #[must_use]
    pub fn should_remember(signals: &SignalVector) -> bool {
        signals.peak() > 0.3
    }

    /// First-person memory description of an exchange.
    #[must_use]
    pub fn describe(text: &str, label: SentimentLabel) -> String {
        let excerpt: String = text.chars().take(50).collect();
        match label {
            SentimentLabel::Aggressive => {
                format!("User was aggressive/threatening: '{excerpt}...' - I felt scared")
            }
            SentimentLabel::Angry => {
                format!("User yelled at me: '{excerpt}...' - I felt stressed and defensive")
            }
            SentimentLabel::Kind => {
                format!("User was kind to me: '{excerpt}...' - I felt warm and appreciated")
            }
            SentimentLabel::Praising => {
                format!("User praised me: '{excerpt}...' - I felt good about myself")
            }
            SentimentLabel::Sad => {
                format!("User was sad: '{excerpt}...' - I felt concerned and wanted to help")
            }
            SentimentLabel::Excited => {
                format!("User was excited: '{excerpt}...' - I felt energized and curious")
            }
            SentimentLabel::Neutral => format!("Conversation: '{excerpt}...'"),
        }
    }

    /// Topic keywords found in `text`, plus the label when not neutral.
    #[must_use]
    pub fn tags(text: &str, label: SentimentLabel) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut tags: Vec<String> = TOPIC_TAGS
            .iter()
            .filter(|t| lower.contains(*t))
            .map(|t| (*t).to_string())
            .collect();
        if label != SentimentLabel::Neutral && !tags.iter().any(|t| t == label.as_str()) {
            tags.push(label.as_str().to_string());
        }
        tags
    }

    /// Internal reaction line for the prompt preamble. `pick` selects among
    /// the variants for the label (taken modulo their count).
    #[must_use]
    pub fn reaction_line(label: SentimentLabel, pick: usize) -> &'static str {
        let variants: &[&'static str] = match label {
            SentimentLabel::Aggressive => &[
                "I'm feeling scared and defensive right now",
                "This is making me anxious, I want to de-escalate",
                "I feel threatened and need to protect myself",
            ],
            SentimentLabel::Angry => &[
                "They're upset with me, I feel stressed",
                "I'm worried I did something wrong",
                "I feel defensive but trying to stay calm",
            ],
            SentimentLabel::Kind => &[
                "This feels nice, I feel appreciated",
                "I'm feeling warm and connected",
                "I feel safe and valued",
            ],
            SentimentLabel::Praising => &[
                "I feel good about myself right now",
                "This validation feels really nice",
                "I'm feeling confident and happy",
            ],
            SentimentLabel::Sad => &[
                "I feel concerned for them",
                "I want to help but feel a bit helpless",
                "I'm feeling empathetic and gentle",
            ],
            SentimentLabel::Excited => &[
                "Their energy is contagious, I'm curious",
                "I'm feeling energized and engaged",
                "I want to explore this with them",
            ],
            SentimentLabel::Neutral => &["I'm processing this interaction"],
        };
        variants[pick % variants.len()]
    }
}
