// Bench Report Types
// Structured JSON output for offline analysis of seed sweeps

use paylab_engine::{LabConfig, Metrics, SummaryStats};
use rust_decimal::Decimal;
use serde::Serialize;

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SweepRun {
    pub preset: String,
    pub scenario_id: String,
    pub seed: u32,
    pub repeat: u32,
    pub n: u32,
    pub metrics: Metrics,
    pub error_count: u32,
    pub retry_count: u32,
    pub tokens_used: usize,
    pub cumulative: Decimal,
    pub limit: Decimal,
    /// Pool ledger stayed within its limit and matched its token usage.
    pub budget_ok: bool,
    pub elapsed_ms: u128,
}

// ─── Sweep Report (per-preset aggregation) ──────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub preset: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub budget_ok_rate: f64,
    pub avg_ms: SummaryStats,
    pub p50_ms: SummaryStats,
    pub p95_ms: SummaryStats,
    pub p99_ms: SummaryStats,
    pub error_rate: SummaryStats,
    pub retry_rate: SummaryStats,
    pub elapsed_ms: SummaryStats,
    pub individual_runs: Vec<SweepRun>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub seeds_per_preset: u32,
    pub repeats_per_seed: u32,
    pub config: LabConfig,
    pub summary: Summary,
    pub presets: Vec<SweepReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub budget_ok: usize,
    pub budget_violations: usize,
}
