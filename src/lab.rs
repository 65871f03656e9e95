// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Offline Payments Lab ("PayLab") - Lab facade

use chrono::Utc;
use wasm_bindgen::prelude::*;

use crate::config::{ConfigError, LabConfig, PoolPolicy};
use crate::history::{RunHistory, RunRecord};
use crate::risk::{PoolSnapshot, RiskEngine};
use crate::scenario::{RawScenario, Scenario};
use crate::simulation;

// ─── PaymentLab struct ───────────────────────────────────────────────────────

/// Process-wide state behind the UI: one risk engine whose pools outlive
/// individual runs, and the bounded run history.
#[wasm_bindgen]
pub struct PaymentLab {
    pub(crate) config: LabConfig,
    pub(crate) risk: RiskEngine,
    pub(crate) history: RunHistory,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl PaymentLab {
    /// Validate `config` and build a lab on it.
    pub fn from_config(config: LabConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config))
    }

    fn assemble(config: LabConfig) -> Self {
        Self {
            risk: RiskEngine::new(config.risk.clone()),
            history: RunHistory::new(config.history_capacity),
            config,
        }
    }

    /// Normalize, simulate, assemble the record and append it to history.
    pub fn run_core(&mut self, raw: &RawScenario) -> RunRecord {
        let scenario = Scenario::normalize(raw);
        if self.config.pool_policy == PoolPolicy::FreshPerRun {
            self.risk.remove(&scenario.id);
        }

        let started_at = Utc::now();
        let result = simulation::run(&scenario, &mut self.risk);
        let record = RunRecord::assemble(scenario, result, started_at);
        self.history.push(record.clone());
        record
    }

    pub fn pool_snapshot(&self, scenario_id: &str) -> Option<PoolSnapshot> {
        self.risk.snapshot(scenario_id)
    }

    pub fn history_ref(&self) -> &RunHistory {
        &self.history
    }

    pub fn config_ref(&self) -> &LabConfig {
        &self.config
    }
}

impl Default for PaymentLab {
    fn default() -> Self {
        Self::assemble(LabConfig::default())
    }
}
