//! Self-concept: five Big-Five-style traits nudged by strong affect.
//!
//! Each felt message may bump a trait by `0.01` when one hormone runs high.
//! The two traits furthest from the midpoint are rendered as a one-line
//! self-description for the prompt preamble.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::AffectState;

const STEP: f32 = 0.01;
const HIGH: f32 = 0.7;
const LOW: f32 = 0.3;

/// A personality trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trait {
    /// Openness to experience.
    Openness,
    /// Conscientiousness.
    Conscientiousness,
    /// Extraversion.
    Extraversion,
    /// Agreeableness.
    Agreeableness,
    /// Neuroticism.
    Neuroticism,
}

impl Trait {
    /// All traits, in description tie-break order.
    pub const ALL: [Trait; 5] = [
        Trait::Openness,
        Trait::Conscientiousness,
        Trait::Extraversion,
        Trait::Agreeableness,
        Trait::Neuroticism,
    ];

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Trait::Openness => "openness",
            Trait::Conscientiousness => "conscientiousness",
            Trait::Extraversion => "extraversion",
            Trait::Agreeableness => "agreeableness",
            Trait::Neuroticism => "neuroticism",
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait levels in `[0, 1]`, all starting at 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfConcept {
    /// Openness.
    pub openness: f32,
    /// Conscientiousness.
    pub conscientiousness: f32,
    /// Extraversion.
    pub extraversion: f32,
    /// Agreeableness.
    pub agreeableness: f32,
    /// Neuroticism.
    pub neuroticism: f32,
}

impl Default for SelfConcept {
    fn default() -> Self {
        Self {
            openness: 0.5,
            conscientiousness: 0.5,
            extraversion: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
        }
    }
}

impl SelfConcept {
    /// Level of one trait.
    #[must_use]
    pub fn get(&self, t: Trait) -> f32 {
        match t {
            Trait::Openness => self.openness,
            Trait::Conscientiousness => self.conscientiousness,
            Trait::Extraversion => self.extraversion,
            Trait::Agreeableness => self.agreeableness,
            Trait::Neuroticism => self.neuroticism,
        }
    }

    /// Nudge traits from one affect state.
    pub fn update(&mut self, affect: &AffectState) {
        if affect.dopamine > HIGH && affect.cortisol < LOW {
            self.openness += STEP;
        }
        if affect.serotonin > HIGH {
            self.agreeableness += STEP;
        }
        if affect.cortisol > HIGH {
            self.neuroticism += STEP;
        }
        if affect.oxytocin > HIGH {
            self.extraversion += STEP;
        }
        for v in [
            &mut self.openness,
            &mut self.conscientiousness,
            &mut self.extraversion,
            &mut self.agreeableness,
            &mut self.neuroticism,
        ] {
            *v = v.clamp(0.0, 1.0);
        }
    }

    /// `Self-concept: high openness, low neuroticism`, or `balanced` when no
    /// trait has left `[0.4, 0.6]`.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut ranked = Trait::ALL;
        // stable sort keeps declaration order among ties
        ranked.sort_by(|a, b| {
            let da = (self.get(*a) - 0.5).abs();
            let db = (self.get(*b) - 0.5).abs();
            db.total_cmp(&da)
        });
        let notable: Vec<String> = ranked[..2]
            .iter()
            .filter_map(|t| {
                let v = self.get(*t);
                if v > 0.6 {
                    Some(format!("high {t}"))
                } else if v < 0.4 {
                    Some(format!("low {t}"))
                } else {
                    None
                }
            })
            .collect();
        if notable.is_empty() {
            "Self-concept: balanced".to_string()
        } else {
            format!("Self-concept: {}", notable.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newborn_is_balanced() {
        assert_eq!(SelfConcept::default().describe(), "Self-concept: balanced");
    }

    #[test]
    fn each_rule_moves_its_trait() {
        let mut sc = SelfConcept::default();
        sc.update(&AffectState::new(0.9, 0.9, 0.1, 0.9));
        assert!((sc.openness - 0.51).abs() < 1e-6);
        assert!((sc.agreeableness - 0.51).abs() < 1e-6);
        assert!((sc.extraversion - 0.51).abs() < 1e-6);
        assert!((sc.neuroticism - 0.5).abs() < 1e-6);

        let mut sc = SelfConcept::default();
        sc.update(&AffectState::new(0.9, 0.5, 0.9, 0.5));
        assert!((sc.neuroticism - 0.51).abs() < 1e-6);
        assert!((sc.openness - 0.5).abs() < 1e-6);
    }

    #[test]
    fn traits_stay_in_unit_range() {
        let mut sc = SelfConcept {
            neuroticism: 0.995,
            ..SelfConcept::default()
        };
        for _ in 0..10 {
            sc.update(&AffectState::new(0.5, 0.5, 0.9, 0.5));
        }
        assert!((sc.neuroticism - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn describes_two_most_extreme_traits() {
        let sc = SelfConcept {
            openness: 0.65,
            neuroticism: 0.2,
            extraversion: 0.62,
            ..SelfConcept::default()
        };
        assert_eq!(sc.describe(), "Self-concept: low neuroticism, high openness");
    }

    #[test]
    fn mild_second_trait_is_left_out() {
        let sc = SelfConcept {
            agreeableness: 0.8,
            openness: 0.55,
            ..SelfConcept::default()
        };
        assert_eq!(sc.describe(), "Self-concept: high agreeableness");
    }
}
