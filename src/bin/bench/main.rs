// PayLab Bench Runner — seed sweeps over preset network conditions
// Mulberry32 PRNG, per-preset aggregation, JSON report
//
// Usage:
//   cargo run --release --bin bench                          # All presets, 5 seeds each
//   cargo run --release --bin bench -- --seeds 30            # Wider sweep
//   cargo run --release --bin bench -- PROVISIONING          # Filter by name
//   cargo run --release --bin bench -- --repeats 3           # Re-run each seed on one pool
//   cargo run --release --bin bench -- --repeats 3 --fresh-pools
//   cargo run --release --bin bench -- --samples             # Per-trial JSONL output
//   cargo run --release --bin bench -- --scenario '{"latency":300,"mix":"provisioning"}'

mod presets;
mod report;
mod samples;
mod sweep;

use anyhow::Context;
use clap::Parser;
use paylab_engine::{LabConfig, PoolPolicy, RawScenario};
use presets::*;
use report::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "bench", version, about = "Seed sweeps over offline payment scenarios")]
struct Args {
    /// Only run presets whose name, label or category contains this text
    filter: Option<String>,

    /// Seeds per preset
    #[arg(long, default_value_t = 5)]
    seeds: u32,

    /// First seed of the sweep
    #[arg(long, default_value_t = 1)]
    seed: u32,

    /// Runs per seed against the same token pool
    #[arg(long, default_value_t = 1)]
    repeats: u32,

    /// JSON lab config (pool size, limit, pool policy)
    #[arg(long, env = "PAYLAB_CONFIG")]
    config: Option<PathBuf>,

    /// Repeats draw on one token pool (overrides the config's pool policy)
    #[arg(long, conflicts_with = "fresh_pools")]
    shared_pools: bool,

    /// Mint a fresh token pool before every run (overrides the config's pool policy)
    #[arg(long)]
    fresh_pools: bool,

    /// Run a custom raw scenario (JSON) instead of the presets
    #[arg(long)]
    scenario: Option<String>,

    /// Write per-trial JSONL samples under <out>/samples
    #[arg(long)]
    samples: bool,

    /// Output directory
    #[arg(long, default_value = "benchmark-results")]
    out: PathBuf,
}

impl Args {
    fn pool_policy(&self) -> Option<PoolPolicy> {
        match (self.shared_pools, self.fresh_pools) {
            (true, _) => Some(PoolPolicy::Shared),
            (_, true) => Some(PoolPolicy::FreshPerRun),
            _ => None,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LabConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            LabConfig::from_json(&text).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(LabConfig::default()),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_ref())?;
    if let Some(policy) = args.pool_policy() {
        config.pool_policy = policy;
    }

    let to_run: Vec<Preset> = match &args.scenario {
        Some(json) => {
            let raw = RawScenario::from_json(json).context("parsing --scenario")?;
            vec![Preset { name: "CUSTOM", label: "Custom scenario", category: "custom", raw }]
        }
        None => {
            let all = presets();
            match &args.filter {
                Some(f) => {
                    let f_lower = f.to_lowercase();
                    all.into_iter()
                        .filter(|p| p.name.to_lowercase().contains(&f_lower)
                                 || p.label.to_lowercase().contains(&f_lower)
                                 || p.category.to_lowercase().contains(&f_lower))
                        .collect()
                }
                None => all,
            }
        }
    };

    if to_run.is_empty() {
        anyhow::bail!("no presets match filter: {:?}", args.filter);
    }

    let samples_dir = args.samples.then(|| args.out.join("samples"));

    println!("\n  PayLab Bench Runner v{}", env!("CARGO_PKG_VERSION"));
    println!("  PRNG: Mulberry32 | Seeds/preset: {} | Repeats/seed: {} | Base seed: {} | Pools: {:?}",
        args.seeds, args.repeats, args.seed, config.pool_policy);
    println!("  Running {} preset(s)...\n", to_run.len());
    println!("  {:<26} {:>6} {:>9} {:>9} {:>9} {:>8} {:>8} {:>7}",
        "Preset", "Runs", "Avg ms", "P95 ms", "P99 ms", "Err%", "Retry%", "Budget");
    println!("  {}", "-".repeat(90));

    let suite_start = Instant::now();
    let mut reports = Vec::with_capacity(to_run.len());

    for preset in &to_run {
        let report = sweep::run_sweep(
            preset,
            args.seeds,
            args.seed,
            args.repeats,
            &config,
            samples_dir.as_deref(),
        );

        let status = if report.budget_ok_rate >= 1.0 { "OK" } else { "BREACH" };
        println!("  {:<26} {:>6} {:>9.1} {:>9.1} {:>9.1} {:>7.2}% {:>7.2}% {:>7}",
            report.preset,
            report.n_runs,
            report.avg_ms.mean,
            report.p95_ms.mean,
            report.p99_ms.mean,
            report.error_rate.mean * 100.0,
            report.retry_rate.mean * 100.0,
            status,
        );

        reports.push(report);
    }

    let total: usize = reports.iter().map(|r| r.n_runs).sum();
    let budget_ok: usize = reports.iter()
        .map(|r| r.individual_runs.iter().filter(|run| run.budget_ok).count())
        .sum();
    let budget_violations = total - budget_ok;

    println!("  {}", "-".repeat(90));
    println!("  Runs: {}  Budget OK: {}  Violations: {}  Suite time: {:.1}s\n",
        total, budget_ok, budget_violations, suite_start.elapsed().as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let timestamp = chrono::Utc::now().timestamp_millis().to_string();
    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "Mulberry32",
        seeds_per_preset: args.seeds,
        repeats_per_seed: args.repeats,
        config,
        summary: Summary { total, budget_ok, budget_violations },
        presets: reports,
    };

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let path = args.out.join(format!("bench-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("  Results saved to: {}\n", path.display());

    if budget_violations > 0 {
        std::process::exit(1);
    }
    Ok(())
}
