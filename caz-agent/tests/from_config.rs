//! Assembling a dialogue from configuration alone, against real files.

use caz_agent::{ChatRequest, Dialogue, Mood};
use caz_core::config::CazConfig;
use caz_core::persistence::{SqliteStateStore, StateStore};
use tempfile::TempDir;

fn file_config(dir: &TempDir) -> CazConfig {
    let mut config = CazConfig::default();
    config.neuro.triggers_enabled = false;
    config.neuro.rng_seed = Some(3);
    config.persistence.database_path = dir.path().join("caz.db").display().to_string();
    config.persistence.snapshot_dir = dir.path().join("snapshots").display().to_string();
    config.persistence.memory_seed_path = None;
    config.persistence.flashback_seed_path = None;
    // nothing listens on the discard port
    config.llm.base_url = "http://127.0.0.1:9".to_string();
    config.llm.timeout_ms = 2_000;
    config
}

#[tokio::test]
async fn unreachable_model_still_persists_the_exchange() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    let placeholder = config.llm.failure_placeholder.clone();

    {
        let d = Dialogue::from_config(config.clone()).unwrap();
        let r = d.process(&ChatRequest::new("u1", "Hello")).await.unwrap();
        assert_eq!(r.mood, Mood::Awake);
        assert_eq!(r.text, placeholder);
        d.checkpoint().await.unwrap();
    }

    assert!(dir.path().join("snapshots").is_dir());
    let store = SqliteStateStore::open(&config.persistence.database_path, &config.persistence).unwrap();
    let logs = store.chat_logs("u1").unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].response, placeholder);
    assert!((store.biological_state().unwrap().fatigue - 0.05).abs() < 1e-9);
    drop(store);

    let d = Dialogue::from_config(config).unwrap();
    let status = d.status().await.unwrap();
    assert_eq!(status.organism.personality.age, 1);
    assert_eq!(status.organism.interactions, 1);
    assert!((status.biological.fatigue - 0.05).abs() < 1e-9);
}

#[test]
fn unopenable_database_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut config = file_config(&dir);
    config.persistence.database_path = dir.path().join("missing").join("caz.db").display().to_string();
    assert!(Dialogue::from_config(config).is_err());
}
