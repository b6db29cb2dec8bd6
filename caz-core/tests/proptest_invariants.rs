//! Property-based tests for the numeric invariants of the organism.
//!
//! - every affect scalar stays in `[0, 1]` whatever the signals
//! - fatigue stays in `[0, 1]`
//! - salience falls with age and rises with rehearsal
//! - consolidation never drops exempt entries and respects the cap

use chrono::{Duration, Utc};
use proptest::prelude::*;

use caz_core::config::{MemoryConfig, NeuroConfig};
use caz_core::memory::consolidation;
use caz_core::memory::MemoryEntry;
use caz_core::neuro::NeuroSimulator;
use caz_core::persistence::{SqliteStateStore, StateStore};
use caz_core::sentiment::{SentimentLabel, SignalVector};
use caz_core::types::AffectState;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_affect() -> impl Strategy<Value = AffectState> {
    (0.0..=1.0f32, 0.0..=1.0f32, 0.0..=1.0f32, 0.0..=1.0f32)
        .prop_map(|(d, s, c, o)| AffectState::new(d, s, c, o))
}

fn arb_signals() -> impl Strategy<Value = SignalVector> {
    (-1.0..=1.0f32, -1.0..=1.0f32, -1.0..=1.0f32, -1.0..=1.0f32).prop_map(
        |(stress, reward, social, novelty)| SignalVector {
            stress,
            reward,
            social,
            novelty,
            label: SentimentLabel::Neutral,
        },
    )
}

// ---------------------------------------------------------------------------
// Affect bounds
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn affect_stays_in_unit_interval(
        start in arb_affect(),
        seed in any::<u64>(),
        steps in prop::collection::vec(arb_signals(), 1..60),
    ) {
        let cfg = NeuroConfig { rng_seed: Some(seed), ..NeuroConfig::default() };
        let mut sim = NeuroSimulator::new(&cfg, start);
        for s in &steps {
            let a = sim.update(s);
            for v in a.as_array() {
                prop_assert!((0.0..=1.0).contains(&v), "scalar out of range: {v}");
            }
            prop_assert!((0.0..=1.0).contains(&sim.curiosity()));
        }
    }

    #[test]
    fn intensity_is_unit_bounded(a in arb_affect()) {
        let i = a.intensity();
        prop_assert!((0.0..=1.0 + 1e-6).contains(&i));
    }
}

// ---------------------------------------------------------------------------
// Fatigue bounds
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn fatigue_stays_clamped(steps in prop::collection::vec(-0.5..0.5f64, 1..40)) {
        let store = SqliteStateStore::open_in_memory().unwrap();
        for step in steps {
            let bio = store.increment_fatigue(step, 0.9).unwrap();
            prop_assert!((0.0..=1.0).contains(&bio.fatigue));
        }
    }
}

// ---------------------------------------------------------------------------
// Salience monotonicity
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn salience_decreases_with_age(
        affect in arb_affect(),
        younger in 0i64..10_000,
        gap in 1i64..10_000,
    ) {
        let now = Utc::now();
        let e = MemoryEntry::new("x", affect, Vec::<String>::new(), now);
        prop_assume!(e.intensity > 0.0);
        let t1 = now + Duration::minutes(younger);
        let t2 = t1 + Duration::minutes(gap);
        prop_assert!(e.salience(t2, 0.1) < e.salience(t1, 0.1));
    }

    #[test]
    fn salience_increases_with_access(affect in arb_affect(), accesses in 0u32..1000) {
        let now = Utc::now();
        let mut e = MemoryEntry::new("x", affect, Vec::<String>::new(), now);
        prop_assume!(e.intensity > 0.0);
        e.access_count = accesses;
        let before = e.salience(now, 0.1);
        e.access_count += 1;
        prop_assert!(e.salience(now, 0.1) > before);
    }
}

// ---------------------------------------------------------------------------
// Consolidation guarantees
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn consolidation_respects_exemptions_and_cap(
        specs in prop::collection::vec((arb_affect(), 0i64..2_000, any::<bool>()), 0..80),
        cap in 0usize..20,
    ) {
        let now = Utc::now();
        let cfg = MemoryConfig { max_capacity: cap, ..MemoryConfig::default() };
        let mut entries: Vec<MemoryEntry> = specs
            .iter()
            .map(|(a, age_min, baseline)| {
                let mut e = MemoryEntry::new("m", *a, Vec::<String>::new(), now - Duration::minutes(*age_min));
                e.is_baseline = *baseline;
                e
            })
            .collect();
        let exempt_ids: Vec<_> = entries
            .iter()
            .filter(|e| consolidation::is_exempt(e, now, &cfg))
            .map(|e| e.id)
            .collect();

        consolidation::consolidate(&mut entries, now, &cfg);

        for id in &exempt_ids {
            prop_assert!(entries.iter().any(|e| e.id == *id));
        }
        let non_exempt = entries.iter().filter(|e| !consolidation::is_exempt(e, now, &cfg)).count();
        prop_assert!(non_exempt <= cap);
    }
}
