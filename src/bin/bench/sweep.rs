// Seed Sweep Infrastructure — N seeds per preset with statistical aggregation
// Each preset runs with seeds base..base+N, computing mean ± 95% CI per metric

use paylab_engine::*;

use crate::presets::Preset;
use crate::report::*;
use crate::samples;

use std::path::Path;
use std::time::Instant;

/// Result vectors never preallocate beyond this many runs.
const MAX_PREALLOC_RUNS: usize = 4096;

/// Runs a sweep will produce, for preallocation.
fn planned_runs(n_seeds: u32, repeats: u32) -> usize {
    (n_seeds as usize)
        .saturating_mul(repeats as usize)
        .min(MAX_PREALLOC_RUNS)
}

/// Run every repeat of one seed against a single risk engine, so repeats
/// draw down the same offline budget unless the config asks for fresh pools.
pub fn run_seed(
    preset: &Preset,
    seed: u32,
    repeats: u32,
    config: &LabConfig,
    samples_dir: Option<&Path>,
) -> Vec<SweepRun> {
    let raw = RawScenario { seed: Some(f64::from(seed)), ..preset.raw.clone() };
    let scenario = Scenario::normalize(&raw);
    let mut risk = RiskEngine::new(config.risk.clone());
    let mut runs = Vec::with_capacity(planned_runs(1, repeats));

    for repeat in 0..repeats {
        if config.pool_policy == PoolPolicy::FreshPerRun {
            risk.remove(&scenario.id);
        }

        let start = Instant::now();
        let mut outcomes = Vec::new();
        let result = {
            let sim = TransactionSimulator::new(&scenario, &mut risk);
            if samples_dir.is_some() {
                sim.run_observed(|o| outcomes.push(o.clone()))
            } else {
                sim.run()
            }
        };
        let elapsed_ms = start.elapsed().as_millis();

        if let Some(dir) = samples_dir {
            let path = dir
                .join(preset.name.to_lowercase())
                .join(format!("seed-{}-r{}.jsonl", seed, repeat));
            if let Err(e) = samples::write_jsonl(&path, &outcomes) {
                tracing::warn!(path = %path.display(), error = %e, "failed to write trial samples");
            }
        }

        let pool = risk.pool(&scenario.id);
        let tokens_used = pool.map(|p| p.used_count()).unwrap_or(0);
        let cumulative = pool.map(|p| p.cumulative()).unwrap_or_default();
        let limit = pool.map(|p| p.limit()).unwrap_or(config.risk.cumulative_limit);
        let accepted = pool.map(|p| p.stats().accepted).unwrap_or(0);
        let budget_ok = cumulative <= limit && accepted as usize == tokens_used;

        runs.push(SweepRun {
            preset: preset.name.to_string(),
            scenario_id: scenario.id.clone(),
            seed: scenario.seed,
            repeat,
            n: scenario.n,
            metrics: result.metrics,
            error_count: result.error_count,
            retry_count: result.retry_count,
            tokens_used,
            cumulative,
            limit,
            budget_ok,
            elapsed_ms,
        });
    }

    runs
}

/// Run a preset across `n_seeds` seeds and aggregate.
pub fn run_sweep(
    preset: &Preset,
    n_seeds: u32,
    base_seed: u32,
    repeats: u32,
    config: &LabConfig,
    samples_dir: Option<&Path>,
) -> SweepReport {
    let mut results = Vec::with_capacity(planned_runs(n_seeds, repeats));
    for i in 0..n_seeds {
        let seed = base_seed.saturating_add(i);
        results.extend(run_seed(preset, seed, repeats, config, samples_dir));
    }

    aggregate(preset, results)
}

/// Aggregate individual runs into a SweepReport.
fn aggregate(preset: &Preset, results: Vec<SweepRun>) -> SweepReport {
    let n = results.len();
    let ok = results.iter().filter(|r| r.budget_ok).count();
    let budget_ok_rate = if n > 0 { ok as f64 / n as f64 } else { 0.0 };

    let stat = |f: fn(&SweepRun) -> f64| {
        SummaryStats::from_samples(&results.iter().map(f).collect::<Vec<_>>())
    };

    SweepReport {
        preset: preset.name.to_string(),
        label: preset.label.to_string(),
        category: preset.category.to_string(),
        n_runs: n,
        budget_ok_rate,
        avg_ms: stat(|r| r.metrics.avg_ms),
        p50_ms: stat(|r| r.metrics.p50_ms),
        p95_ms: stat(|r| r.metrics.p95_ms),
        p99_ms: stat(|r| r.metrics.p99_ms),
        error_rate: stat(|r| r.metrics.error_rate),
        retry_rate: stat(|r| r.metrics.retry_rate),
        elapsed_ms: stat(|r| r.elapsed_ms as f64),
        individual_runs: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::presets;

    #[test]
    fn test_planned_runs_saturates() {
        assert_eq!(planned_runs(5, 3), 15);
        assert_eq!(planned_runs(u32::MAX, u32::MAX), MAX_PREALLOC_RUNS);
        assert_eq!(planned_runs(0, u32::MAX), 0);
    }

    #[test]
    fn test_repeats_share_one_pool() {
        let base = &presets()[0];
        let preset = Preset {
            name: base.name,
            label: base.label,
            category: base.category,
            raw: RawScenario { n: Some(60.0), ..base.raw.clone() },
        };

        let shared = run_seed(&preset, 1, 2, &LabConfig::default(), None);
        assert_eq!(shared[0].tokens_used, 60);
        assert_eq!(shared[1].tokens_used, 100);
        assert!(shared.iter().all(|r| r.budget_ok));

        let fresh = LabConfig { pool_policy: PoolPolicy::FreshPerRun, ..LabConfig::default() };
        let runs = run_seed(&preset, 1, 2, &fresh, None);
        assert_eq!(runs[0].tokens_used, 60);
        assert_eq!(runs[1].tokens_used, 60);
        assert_eq!(runs[0].metrics, runs[1].metrics);
    }
}
