//! CAZ Benchmark Suite
//!
//! Per-message hot paths, all run while the organism lock is held:
//!   sentiment_analyze_insult ........... regex cue scan
//!   neuro_update_single ................ one integration step + feedback
//!   memory_retrieve_top3_from_1000 ..... rank a full store
//!   memory_consolidate_1000 ............ prune a full store

use chrono::{Duration, Utc};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use caz_core::config::{MemoryConfig, NeuroConfig};
use caz_core::memory::MemoryStore;
use caz_core::neuro::NeuroSimulator;
use caz_core::sentiment::SentimentAnalyzer;
use caz_core::types::AffectState;

const TOPICS: [&str; 6] = ["work", "family", "friend", "rain", "music", "code"];

#[allow(clippy::cast_precision_loss)]
fn full_store(n: usize) -> MemoryStore {
    let now = Utc::now();
    let mut store = MemoryStore::new(MemoryConfig {
        consolidation_interval: u64::MAX,
        max_capacity: n / 2,
        ..MemoryConfig::default()
    });
    for i in 0..n {
        let x = (i % 100) as f32 / 100.0;
        let topic = TOPICS[i % TOPICS.len()];
        store.add(
            format!("User talked about {topic} on day {i}"),
            AffectState::new(x, 1.0 - x, x * 0.8, 0.5),
            vec![topic.to_string()],
            now - Duration::hours(i64::try_from(i).unwrap_or(0) + 2),
        );
    }
    store
}

fn bench_sentiment(c: &mut Criterion) {
    let analyzer = SentimentAnalyzer::new().unwrap();
    c.bench_function("sentiment_analyze_insult", |b| {
        b.iter(|| analyzer.analyze(black_box("FUCK YOU! You're so dumb, I hate this stupid thing")));
    });
}

fn bench_neuro_update(c: &mut Criterion) {
    let analyzer = SentimentAnalyzer::new().unwrap();
    let signals = analyzer.analyze("thank you, that was amazing!!");
    let cfg = NeuroConfig {
        rng_seed: Some(1),
        ..NeuroConfig::default()
    };
    let mut sim = NeuroSimulator::new(&cfg, AffectState::NEUTRAL);
    c.bench_function("neuro_update_single", |b| {
        b.iter(|| sim.update(black_box(&signals)));
    });
}

fn bench_retrieve(c: &mut Criterion) {
    let store = full_store(1000);
    let now = Utc::now();
    let affect = AffectState::new(0.4, 0.3, 0.8, 0.3);
    c.bench_function("memory_retrieve_top3_from_1000", |b| {
        b.iter_batched(
            || store.clone(),
            |mut s| s.retrieve(black_box("what did we say about work and family"), &affect, 3, now),
            BatchSize::LargeInput,
        );
    });
}

fn bench_consolidate(c: &mut Criterion) {
    let store = full_store(1000);
    let now = Utc::now();
    c.bench_function("memory_consolidate_1000", |b| {
        b.iter_batched(
            || store.clone(),
            |mut s| s.consolidate(black_box(now)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_sentiment,
    bench_neuro_update,
    bench_retrieve,
    bench_consolidate
);
criterion_main!(benches);
