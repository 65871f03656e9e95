// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Offline Payments Lab ("PayLab") - Simulation Core

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::prng::Mulberry32;
use crate::risk::{Clock, RiskEngine, RiskRejection};
use crate::scenario::{Scenario, TxMix};
use crate::stats::Metrics;

// ─── Network model constants ─────────────────────────────────────────────────

const BASE_MS_TAP_TO_PAY: f64 = 85.0;
const BASE_MS_PROVISIONING: f64 = 160.0;
const BASE_MS_OTHER: f64 = 120.0;

const PAYLOAD_KBITS_PROVISIONING: f64 = 48.0;
const PAYLOAD_KBITS_DEFAULT: f64 = 12.0;
const BANDWIDTH_DELAY_SCALE: f64 = 8_000.0;

const RETRY_FAILURE_PROB: f64 = 0.12;
const RETRY_OVERHEAD_MS: f64 = 40.0;
const BASELINE_FAULT_PROB: f64 = 0.008;

const STRESS_LOSS_DIVISOR: f64 = 30.0;
const STRESS_LATENCY_DIVISOR: f64 = 800.0;
const STRESS_JITTER_DIVISOR: f64 = 400.0;
const STRESS_SPIKE_WEIGHT: f64 = 0.35;
const SPIKE_BASE_MS: f64 = 35.0;
const SPIKE_SPREAD_MS: f64 = 90.0;

// ─── NetworkModel ────────────────────────────────────────────────────────────

/// Per-scenario constants of the latency model, computed once per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkModel {
    pub latency_ms: f64,
    pub jitter_ms: f64,
    pub drop_probability: f64,
    pub base_processing_ms: f64,
    pub bandwidth_delay_ms: f64,
    /// Congestion score in `[0, 1]`.
    pub stress: f64,
}

impl NetworkModel {
    pub fn for_scenario(scenario: &Scenario) -> Self {
        let base_processing_ms = match scenario.mix {
            TxMix::TapToPay => BASE_MS_TAP_TO_PAY,
            TxMix::Provisioning => BASE_MS_PROVISIONING,
            TxMix::Other => BASE_MS_OTHER,
        };
        let payload_kbits = match scenario.mix {
            TxMix::Provisioning => PAYLOAD_KBITS_PROVISIONING,
            _ => PAYLOAD_KBITS_DEFAULT,
        };
        let stress = (scenario.loss_pct / STRESS_LOSS_DIVISOR
            + scenario.latency_ms / STRESS_LATENCY_DIVISOR
            + scenario.jitter_ms / STRESS_JITTER_DIVISOR)
            .clamp(0.0, 1.0);

        Self {
            latency_ms: scenario.latency_ms,
            jitter_ms: scenario.jitter_ms,
            drop_probability: scenario.loss_pct / 100.0,
            base_processing_ms,
            bandwidth_delay_ms: (payload_kbits / scenario.bandwidth_kbps) * BANDWIDTH_DELAY_SCALE,
            stress,
        }
    }

    pub fn spike_probability(&self) -> f64 {
        self.stress * STRESS_SPIKE_WEIGHT
    }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrialOutcome {
    /// Refused by the risk engine; recorded as a zero-latency error.
    Rejected(RiskRejection),
    Completed {
        latency_ms: f64,
        retried: bool,
        failed: bool,
    },
}

impl TrialOutcome {
    pub fn sample_ms(&self) -> f64 {
        match self {
            Self::Rejected(_) => 0.0,
            Self::Completed { latency_ms, .. } => *latency_ms,
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            Self::Rejected(_) => true,
            Self::Completed { failed, .. } => *failed,
        }
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Completed { retried: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub samples: Vec<f64>,
    pub error_count: u32,
    pub retry_count: u32,
    pub metrics: Metrics,
}

// ─── TransactionSimulator ────────────────────────────────────────────────────

/// Drives the trials of one run. Holds the run's only PRNG; trial order is
/// draw order, so trials must be evaluated strictly in sequence.
pub struct TransactionSimulator<'a, C: Clock> {
    scenario: &'a Scenario,
    model: NetworkModel,
    rng: Mulberry32,
    risk: &'a mut RiskEngine<C>,
    amount: Decimal,
}

impl<'a, C: Clock> TransactionSimulator<'a, C> {
    pub fn new(scenario: &'a Scenario, risk: &'a mut RiskEngine<C>) -> Self {
        let amount = risk.config().trial_amount;
        Self {
            scenario,
            model: NetworkModel::for_scenario(scenario),
            rng: Mulberry32::new(scenario.seed),
            risk,
            amount,
        }
    }

    pub fn model(&self) -> &NetworkModel {
        &self.model
    }

    /// Evaluate one trial. A rejected trial consumes no draws.
    pub fn next_trial(&mut self) -> TrialOutcome {
        if let Err(rejection) = self.risk.authorize(&self.scenario.id, self.amount) {
            return TrialOutcome::Rejected(rejection);
        }

        let m = self.model;
        let dropped = self.rng.draw() < m.drop_probability;
        let jitter_offset = (self.rng.draw() * 2.0 - 1.0) * m.jitter_ms;
        let mut t = m.base_processing_ms + m.latency_ms + jitter_offset + m.bandwidth_delay_ms;

        let failed = if dropped {
            let second_attempt_failed = self.rng.draw() < RETRY_FAILURE_PROB;
            t += m.latency_ms + (self.rng.draw() * 2.0 - 1.0).abs() * m.jitter_ms + RETRY_OVERHEAD_MS;
            second_attempt_failed
        } else {
            self.rng.draw() < BASELINE_FAULT_PROB
        };

        if self.rng.draw() < m.spike_probability() {
            t += SPIKE_BASE_MS + self.rng.draw() * SPIKE_SPREAD_MS;
        }

        TrialOutcome::Completed {
            latency_ms: t.max(0.0),
            retried: dropped,
            failed,
        }
    }

    pub fn run(self) -> SimulationResult {
        self.run_observed(|_| {})
    }

    /// Like [`run`](Self::run), handing every outcome to `observe` in trial order.
    pub fn run_observed<F>(mut self, mut observe: F) -> SimulationResult
    where
        F: FnMut(&TrialOutcome),
    {
        let n = self.scenario.n as usize;
        let mut samples = Vec::with_capacity(n);
        let mut error_count = 0u32;
        let mut retry_count = 0u32;

        for _ in 0..n {
            let outcome = self.next_trial();
            if outcome.is_retry() {
                retry_count += 1;
            }
            if outcome.is_error() {
                error_count += 1;
            }
            samples.push(outcome.sample_ms());
            observe(&outcome);
        }

        let metrics = Metrics::from_samples(&samples, error_count, retry_count);
        SimulationResult { samples, error_count, retry_count, metrics }
    }
}

/// Run `scenario` against `risk`, drawing on (and depleting) the scenario's
/// token pool in that engine.
#[tracing::instrument(skip_all, fields(scenario = %scenario.id, n = scenario.n))]
pub fn run<C: Clock>(scenario: &Scenario, risk: &mut RiskEngine<C>) -> SimulationResult {
    let result = TransactionSimulator::new(scenario, risk).run();
    tracing::info!(
        avg_ms = result.metrics.avg_ms,
        p95_ms = result.metrics.p95_ms,
        errors = result.error_count,
        retries = result.retry_count,
        "simulation finished"
    );
    result
}

/// Run `scenario` against a fresh default risk engine.
pub fn simulate(scenario: &Scenario) -> SimulationResult {
    run(scenario, &mut RiskEngine::default())
}
