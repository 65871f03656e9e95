// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Offline Payments Lab ("PayLab") - Run records and bounded history

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scenario::Scenario;
use crate::simulation::SimulationResult;
use crate::stats::Metrics;

/// Key under which the history blob is stored.
pub const HISTORY_KEY: &str = "paylab.runs.v1";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("stored run history is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// ─── RunRecord ───────────────────────────────────────────────────────────────

/// The engine's output contract: everything renderers and exporters read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub scenario: Scenario,
    pub metrics: Metrics,
    pub samples_ms: Vec<f64>,
}

impl RunRecord {
    pub fn assemble(scenario: Scenario, result: SimulationResult, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at,
            scenario,
            metrics: result.metrics,
            samples_ms: result.samples,
        }
    }
}

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Opaque key-value store (browser localStorage, a file, memory).
pub trait RunStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: String);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl RunStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

// ─── RunHistory ──────────────────────────────────────────────────────────────

/// Most-recent-first list of runs, trimmed to `capacity` on every append.
#[derive(Debug, Clone)]
pub struct RunHistory {
    capacity: usize,
    runs: VecDeque<RunRecord>,
}

impl RunHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn push(&mut self, run: RunRecord) {
        self.runs.push_front(run);
        self.runs.truncate(self.capacity);
    }

    /// Newest first.
    pub fn runs(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs.iter()
    }

    pub fn latest(&self) -> Option<&RunRecord> {
        self.runs.front()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    pub fn to_json(&self) -> String {
        // Vec<RunRecord> of plain data cannot fail to serialize.
        serde_json::to_string(&self.runs).unwrap_or_else(|_| "[]".to_string())
    }

    /// Replace contents from a JSON array (newest first), keeping at most
    /// `capacity` entries.
    pub fn load_json(&mut self, input: &str) -> Result<(), HistoryError> {
        let mut runs: VecDeque<RunRecord> = serde_json::from_str(input)?;
        runs.truncate(self.capacity);
        self.runs = runs;
        Ok(())
    }

    pub fn persist<S: RunStore>(&self, store: &mut S) {
        store.save(HISTORY_KEY, self.to_json());
    }

    /// Restore from `store`. A missing key yields an empty history.
    pub fn restore<S: RunStore>(store: &S, capacity: usize) -> Result<Self, HistoryError> {
        let mut history = Self::new(capacity);
        if let Some(blob) = store.load(HISTORY_KEY) {
            history.load_json(&blob)?;
        }
        Ok(history)
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::RawScenario;
    use crate::simulation::simulate;

    fn record(seed: f64) -> RunRecord {
        let scenario = Scenario::normalize(&RawScenario { n: Some(10.0), seed: Some(seed), ..Default::default() });
        let result = simulate(&scenario);
        RunRecord::assemble(scenario, result, Utc::now())
    }

    #[test]
    fn test_trims_to_capacity_newest_first() {
        let mut history = RunHistory::default();
        for seed in 1..=25 {
            history.push(record(seed as f64));
        }
        assert_eq!(history.len(), 20);
        assert_eq!(history.latest().unwrap().scenario.seed, 25);
        assert_eq!(history.runs().last().unwrap().scenario.seed, 6);
    }

    #[test]
    fn test_persist_and_restore() {
        let mut history = RunHistory::new(5);
        history.push(record(1.0));
        history.push(record(2.0));
        let mut store = MemoryStore::default();
        history.persist(&mut store);

        let restored = RunHistory::restore(&store, 5).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.latest(), history.latest());
    }

    #[test]
    fn test_restore_missing_key_is_empty() {
        let restored = RunHistory::restore(&MemoryStore::default(), 20).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_restore_corrupt_blob_fails() {
        let mut store = MemoryStore::default();
        store.save(HISTORY_KEY, "{not a list".to_string());
        assert!(matches!(RunHistory::restore(&store, 20), Err(HistoryError::Corrupt(_))));
    }

    #[test]
    fn test_load_json_respects_capacity() {
        let mut big = RunHistory::new(10);
        for seed in 1..=10 {
            big.push(record(seed as f64));
        }
        let mut small = RunHistory::new(3);
        small.load_json(&big.to_json()).unwrap();
        assert_eq!(small.len(), 3);
        assert_eq!(small.latest().unwrap().scenario.seed, 10);
    }

    #[test]
    fn test_run_ids_are_unique() {
        let a = record(1.0);
        let b = record(1.0);
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.samples_ms, b.samples_ms);
    }
}
