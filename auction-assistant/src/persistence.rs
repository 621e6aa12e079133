// Saved auction state: the key-value store seam and the snapshot codec.
//
// The whole auction is stored as one JSON document under a single key and is
// overwritten after every change. Reading it back never fails hard: missing
// or unreadable data means "start fresh".

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::draft::ledger::Ledger;
use crate::draft::roster::Participant;

/// A string key-value store.
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store. Used by tests and when the database cannot be opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Everything about an auction that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub ledger: Ledger,
    #[serde(default)]
    pub sold_players: Vec<String>,
    #[serde(default)]
    pub favorite_players: Vec<String>,
    #[serde(default)]
    pub active_participant_id: Option<String>,
    #[serde(default)]
    pub next_participant_seq: u64,
}

/// Serialize `snapshot` and overwrite the value under `key`.
pub fn save_snapshot(store: &dyn KeyValueStore, key: &str, snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_string(snapshot).context("failed to serialize auction state")?;
    store
        .set(key, &json)
        .with_context(|| format!("failed to save auction state under '{key}'"))
}

/// Read the snapshot under `key`.
///
/// Returns `None` when nothing is saved or the saved value cannot be read or
/// parsed; the reason is logged.
pub fn load_snapshot(store: &dyn KeyValueStore, key: &str) -> Option<Snapshot> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("No saved auction state under '{}'", key);
            return None;
        }
        Err(e) => {
            warn!("Could not read saved auction state: {:#}", e);
            return None;
        }
    };

    match serde_json::from_str::<Snapshot>(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Ignoring unparsable saved auction state: {}", e);
            None
        }
    }
}
