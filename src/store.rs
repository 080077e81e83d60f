//! Resumability snapshot storage.
//!
//! The snapshot is the only cross-invocation shared state: a JSON-encoded
//! [`WorkflowState`] written wholesale after every successful transition
//! and owned by the single active workflow instance for its key. The
//! storage itself (browser local storage, a session service, ...) is
//! abstracted behind [`SnapshotStore`] so tests substitute
//! [`MemorySnapshotStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::error::Result;
use crate::state::WorkflowState;

/// Key/value storage for workflow snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Absent keys are not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory snapshot store backed by a mutex-guarded map.
///
/// Clones share the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().expect("snapshot map poisoned").contains_key(key)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .expect("snapshot map poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("snapshot map poisoned")
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().expect("snapshot map poisoned").remove(key);
        Ok(())
    }
}

/// Serialize and store a snapshot under `key`.
pub(crate) fn save_snapshot<S: SnapshotStore>(
    store: &S,
    key: &str,
    state: &WorkflowState,
) -> Result<()> {
    let payload = serde_json::to_string(state)?;
    store.set(key, &payload)
}

/// Load and decode the snapshot stored under `key`.
///
/// A snapshot that no longer decodes (a stale format from an old session)
/// is logged and treated as absent; resumability is best-effort and must
/// not prevent the workflow from mounting fresh.
pub(crate) fn load_snapshot<S: SnapshotStore>(store: &S, key: &str) -> Result<Option<WorkflowState>> {
    let Some(payload) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&payload) {
        Ok(state) => Ok(Some(state)),
        Err(error) => {
            warn!(key, %error, "stored snapshot did not decode; starting fresh");
            Ok(None)
        }
    }
}
