//! Generic load/save snapshot interface.
//!
//! The personality baseline and the memory checkpoint are opaque JSON
//! documents keyed by name. Where they live is a deployment decision:
//!
//! - [`DirectorySnapshotStore`]: one `<key>.json` file per snapshot
//! - [`InMemorySnapshotStore`]: process-local map, for tests
//! - [`crate::persistence::SqliteStateStore`]: the `snapshots` table
//!
//! Missing or malformed documents are "no data" to callers; see
//! [`load_json`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::Result;

/// Snapshot key of the personality baseline.
pub const PERSONALITY_KEY: &str = "personality";
/// Snapshot key of the memory checkpoint.
pub const MEMORY_KEY: &str = "memory";
/// Snapshot key of the neurochemical simulator checkpoint.
pub const NEURO_KEY: &str = "neuro";
/// Snapshot key of the self-concept traits.
pub const SELF_CONCEPT_KEY: &str = "self_concept";

/// Keyed storage of JSON documents.
pub trait SnapshotStore: Send + Sync {
    /// Read a document; `Ok(None)` when absent.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Write (replace) a document.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn save(&self, key: &str, json: &str) -> Result<()>;
}

/// Load and decode a snapshot. I/O errors and malformed JSON are logged and
/// reported as `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn SnapshotStore, key: &str) -> Option<T> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Snapshot unreadable, using defaults");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Malformed snapshot, using defaults");
            None
        }
    }
}

/// Encode and save a snapshot.
///
/// # Errors
/// Returns an error if encoding or the store fails.
pub fn save_json<T: Serialize>(store: &dyn SnapshotStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    store.save(key, &json)
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotStore {
    dir: PathBuf,
}

impl DirectorySnapshotStore {
    /// Use (and create if needed) `dir`.
    ///
    /// # Errors
    /// Returns `CoreError::Io` if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for DirectorySnapshotStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        debug!(key, path = %path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local snapshot map.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    docs: Mutex<HashMap<String, String>>,
}

impl InMemorySnapshotStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.docs.lock().get(key).cloned())
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        self.docs.lock().insert(key.to_string(), json.to_string());
        Ok(())
    }
}
