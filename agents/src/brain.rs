//! The experience store: accumulated learning score per position.

use crate::key::PositionKey;
use crate::storage::{BlobStore, StoreError};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Storage key the snapshot lives under.
pub const STORAGE_KEY: &str = "chess_brain";

/// Maps positions to the sum of every reward or penalty ever applied to them.
///
/// Entries are only ever added or adjusted, never removed. Unseen positions score `0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Brain {
    scores: HashMap<PositionKey, f64>,
    dirty: bool,
}

impl Brain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the persisted snapshot. A missing, unreadable or corrupt
    /// snapshot yields an empty brain rather than an error.
    pub fn load<S: BlobStore + ?Sized>(store: &S) -> Self {
        let raw = match store.read_blob(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no saved brain found, starting empty");
                return Self::new();
            }
            Err(e) => {
                warn!(error = %e, "could not read saved brain, starting empty");
                return Self::new();
            }
        };

        match Self::from_json(&raw) {
            Ok(brain) => {
                info!(positions = brain.len(), "loaded brain");
                brain
            }
            Err(e) => {
                warn!(error = %e, "saved brain is corrupt, starting empty");
                Self::new()
            }
        }
    }

    /// Writes the whole mapping, replacing any previous snapshot.
    pub fn persist<S: BlobStore + ?Sized>(&mut self, store: &mut S) -> Result<(), StoreError> {
        let json = self.to_json()?;
        store.write_blob(STORAGE_KEY, &json)?;
        self.dirty = false;
        debug!(positions = self.len(), bytes = json.len(), "persisted brain");
        Ok(())
    }

    /// Parses a snapshot: a JSON object of key string to number.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let scores: HashMap<PositionKey, f64> = serde_json::from_str(json)?;
        Ok(Self {
            scores,
            dirty: false,
        })
    }

    /// Serializes with keys sorted so snapshots diff cleanly.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let sorted: BTreeMap<&PositionKey, f64> =
            self.scores.iter().map(|(k, &v)| (k, v)).collect();
        serde_json::to_string(&sorted)
    }

    /// Learned score for `key`; `0` when never seen.
    pub fn get(&self, key: &PositionKey) -> f64 {
        self.scores.get(key).copied().unwrap_or(0.0)
    }

    /// Adds `delta` to the score for `key`, creating the entry if needed.
    pub fn apply_delta(&mut self, key: PositionKey, delta: f64) {
        *self.scores.entry(key).or_insert(0.0) += delta;
        self.dirty = true;
    }

    /// True when there are changes not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PositionKey, f64)> {
        self.scores.iter().map(|(k, &v)| (k, v))
    }

    /// Up to `n` entries with the highest scores, best first.
    pub fn strongest(&self, n: usize) -> Vec<(&PositionKey, f64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }

    /// Up to `n` entries with the lowest scores, worst first.
    pub fn weakest(&self, n: usize) -> Vec<(&PositionKey, f64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }
}
