// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Offline Payments Lab ("PayLab")

pub mod prng;
pub mod scenario;
pub mod config;
pub mod risk;
pub mod simulation;
pub mod stats;
pub mod history;
pub mod lab;

pub use config::{ConfigError, LabConfig, PoolPolicy, RiskConfig};
pub use history::{HistoryError, MemoryStore, RunHistory, RunRecord, RunStore};
pub use lab::PaymentLab;
pub use prng::Mulberry32;
pub use risk::{Clock, ManualClock, RiskEngine, RiskRejection, SystemClock, Token, TokenPool};
pub use scenario::{normalize, NetType, RawScenario, Scenario, TxMix};
pub use simulation::{run, simulate, NetworkModel, SimulationResult, TransactionSimulator, TrialOutcome};
pub use stats::{mean, percentile, Metrics, SummaryStats};

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

fn parse_raw(raw: JsValue) -> Result<RawScenario, JsError> {
    serde_wasm_bindgen::from_value(raw).map_err(|e| JsError::new(&e.to_string()))
}

#[wasm_bindgen]
impl PaymentLab {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        PaymentLab::default()
    }

    /// Build a lab from a JSON config; missing keys take defaults.
    pub fn with_config(config_json: &str) -> Result<PaymentLab, JsError> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = LabConfig::from_json(config_json)?;
        Ok(PaymentLab::from_config(config)?)
    }

    /// Clamp raw UI input into a scenario (with its id) without running it.
    pub fn normalize(&self, raw: JsValue) -> Result<JsValue, JsError> {
        let scenario = Scenario::normalize(&parse_raw(raw)?);
        Ok(serde_wasm_bindgen::to_value(&scenario).unwrap_or(JsValue::NULL))
    }

    /// Run a scenario to completion and return its run record.
    pub fn run(&mut self, raw: JsValue) -> Result<JsValue, JsError> {
        let record = self.run_core(&parse_raw(raw)?);
        Ok(serde_wasm_bindgen::to_value(&record).unwrap_or(JsValue::NULL))
    }

    /// Recent runs, newest first.
    pub fn history(&self) -> JsValue {
        let runs: Vec<&RunRecord> = self.history.runs().collect();
        serde_wasm_bindgen::to_value(&runs).unwrap_or(JsValue::NULL)
    }

    pub fn export_history(&self) -> String {
        self.history.to_json()
    }

    pub fn import_history(&mut self, json: &str) -> Result<(), JsError> {
        self.history.load_json(json)?;
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Drop every offline token pool.
    pub fn reset_pools(&mut self) {
        self.risk.clear();
    }

    pub fn pool_status(&self, scenario_id: &str) -> JsValue {
        match self.pool_snapshot(scenario_id) {
            Some(snapshot) => serde_wasm_bindgen::to_value(&snapshot).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    pub fn config(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.config).unwrap_or(JsValue::NULL)
    }
}
