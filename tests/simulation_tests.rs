#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use paylab_engine::*;
    use rust_decimal_macros::dec;

    fn example_raw() -> RawScenario {
        RawScenario {
            net_type: Some("public_internet".into()),
            latency_ms: Some(150.0),
            jitter_ms: Some(30.0),
            loss_pct: Some(5.0),
            bandwidth_kbps: Some(512.0),
            mix: Some("tap_to_pay".into()),
            n: Some(1000.0),
            seed: Some(42.0),
        }
    }

    fn manual_engine() -> RiskEngine<ManualClock> {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        RiskEngine::with_clock(RiskConfig::default(), clock)
    }

    // ========== Reference Scenario ==========

    #[test]
    fn test_example_scenario_normalizes_to_itself() {
        let s = normalize(&example_raw());
        assert_eq!(s.net_type, NetType::PublicInternet);
        assert_eq!(s.latency_ms, 150.0);
        assert_eq!(s.jitter_ms, 30.0);
        assert_eq!(s.loss_pct, 5.0);
        assert_eq!(s.bandwidth_kbps, 512.0);
        assert_eq!(s.mix, TxMix::TapToPay);
        assert_eq!(s.n, 1000);
        assert_eq!(s.seed, 42);
        assert_eq!(s.id, "SCN-f517bb2e");
    }

    #[test]
    fn test_example_scenario_reference_baseline() {
        let s = normalize(&example_raw());
        let result = run(&s, &mut manual_engine());

        println!("Metrics: {:?}", result.metrics);
        // 900 trials past the 100-unit budget are rejected, plus one fault.
        assert_eq!(result.error_count, 901);
        assert_eq!(result.retry_count, 5);
        assert!((result.metrics.avg_ms - 44.54957564897137).abs() < 1e-9,
            "avg_ms drifted: {}", result.metrics.avg_ms);
        assert_eq!(result.metrics.p50_ms, 0.0);
        assert_eq!(result.metrics.p95_ms, 432.0932165766135);
        assert_eq!(result.metrics.p99_ms, 514.1208983561955);
        assert_eq!(result.metrics.error_rate, 0.901);
        assert_eq!(result.metrics.retry_rate, 0.005);
    }

    #[test]
    fn test_one_budget_reference_baseline() {
        let s = normalize(&RawScenario { n: Some(100.0), ..example_raw() });
        let result = simulate(&s);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.retry_count, 5);
        assert!((result.metrics.avg_ms - 445.4957564897137).abs() < 1e-9);
        assert_eq!(result.metrics.p50_ms, 432.0932165766135);
        assert_eq!(result.metrics.p95_ms, 556.6412219800986);
        assert_eq!(result.metrics.p99_ms, 637.3435803782195);
    }

    #[test]
    fn test_congested_provisioning_reference_baseline() {
        let s = normalize(&RawScenario {
            latency_ms: Some(600.0),
            jitter_ms: Some(200.0),
            loss_pct: Some(12.0),
            bandwidth_kbps: Some(128.0),
            mix: Some("provisioning".into()),
            n: Some(100.0),
            seed: Some(7.0),
            ..Default::default()
        });
        let result = simulate(&s);
        assert_eq!(result.error_count, 2);
        assert_eq!(result.retry_count, 9);
        assert!((result.metrics.avg_ms - 3861.5061298102605).abs() < 1e-9);
        assert_eq!(result.metrics.p99_ms, 4662.502740062773);
    }

    // ========== Determinism ==========

    #[test]
    fn test_run_is_deterministic() {
        let s = normalize(&example_raw());
        let a = simulate(&s);
        let b = simulate(&s);
        assert_eq!(a.samples.len(), b.samples.len());
        for (x, y) in a.samples.iter().zip(&b.samples) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.metrics.avg_ms.to_bits(), b.metrics.avg_ms.to_bits());
    }

    #[test]
    fn test_deterministic_across_clock_sources() {
        // Tokens live at least three days, so wall time never changes a run.
        let s = normalize(&example_raw());
        let a = run(&s, &mut manual_engine());
        let b = run(&s, &mut RiskEngine::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = simulate(&normalize(&RawScenario { n: Some(100.0), ..example_raw() }));
        let b = simulate(&normalize(&RawScenario { n: Some(100.0), seed: Some(43.0), ..example_raw() }));
        assert_ne!(a.samples, b.samples);
    }

    // ========== Invariants ==========

    #[test]
    fn test_sample_count_and_rate_bounds() {
        let grid = [
            (0.0, 0.0, 0.0, 64.0, "other", 10.0),
            (5_000.0, 2_000.0, 30.0, 64.0, "provisioning", 500.0),
            (40.0, 5.0, 0.1, 1_000_000.0, "tap_to_pay", 2_000.0),
            (250.0, 120.0, 25.0, 256.0, "other", 77.0),
        ];
        for (latency, jitter, loss, bw, mix, n) in grid {
            let s = normalize(&RawScenario {
                latency_ms: Some(latency),
                jitter_ms: Some(jitter),
                loss_pct: Some(loss),
                bandwidth_kbps: Some(bw),
                mix: Some(mix.into()),
                n: Some(n),
                ..Default::default()
            });
            let result = simulate(&s);
            assert_eq!(result.samples.len(), s.n as usize);
            assert!(result.samples.iter().all(|&x| x >= 0.0 && x.is_finite()));
            let m = result.metrics;
            assert!((0.0..=1.0).contains(&m.error_rate), "error_rate {}", m.error_rate);
            assert!((0.0..=1.0).contains(&m.retry_rate), "retry_rate {}", m.retry_rate);
            assert!(m.p50_ms <= m.p95_ms && m.p95_ms <= m.p99_ms);
        }
    }

    #[test]
    fn test_metrics_match_samples() {
        let result = simulate(&normalize(&example_raw()));
        let recomputed = Metrics::from_samples(&result.samples, result.error_count, result.retry_count);
        assert_eq!(result.metrics, recomputed);
        assert_eq!(result.metrics.p95_ms, percentile(&result.samples, 95.0));
        assert_eq!(result.metrics.avg_ms, mean(&result.samples));
    }

    // ========== Offline Budget ==========

    #[test]
    fn test_shared_pool_depletes_on_repeat() {
        let s = normalize(&RawScenario { n: Some(100.0), ..example_raw() });
        let mut risk = manual_engine();
        let first = run(&s, &mut risk);
        let second = run(&s, &mut risk);

        assert!(first.samples.iter().all(|&x| x > 0.0));
        assert!(second.samples.iter().all(|&x| x == 0.0), "pool should be spent");
        assert_eq!(second.error_count, 100);
        assert_eq!(second.metrics.error_rate, 1.0);

        let pool = risk.pool(&s.id).unwrap();
        assert_eq!(pool.cumulative(), dec!(100));
        assert_eq!(pool.used_count(), 100);
        assert_eq!(pool.stats().exhausted, 100);
    }

    #[test]
    fn test_clearing_pools_restores_budget() {
        let s = normalize(&RawScenario { n: Some(100.0), ..example_raw() });
        let mut risk = manual_engine();
        let first = run(&s, &mut risk);
        risk.clear();
        let again = run(&s, &mut risk);
        assert_eq!(first, again);
    }

    #[test]
    fn test_expired_pool_rejects_everything() {
        let s = normalize(&RawScenario { n: Some(20.0), ..example_raw() });
        let mut risk = manual_engine();
        risk.authorize(&s.id, dec!(0)).unwrap();
        risk.clock().advance(chrono::Duration::days(5));
        let result = run(&s, &mut risk);
        assert_eq!(result.error_count, 20);
        assert_eq!(result.retry_count, 0);
    }

    #[test]
    fn test_hundred_and_first_check_rejected_first_match() {
        let s = normalize(&example_raw());
        let mut risk = manual_engine();
        for _ in 0..100 {
            assert!(risk.check(&s, dec!(1)));
        }
        assert!(!risk.check(&s, dec!(1)));
        assert_eq!(risk.authorize(&s.id, dec!(1)), Err(RiskRejection::TokensExhausted));
        assert_eq!(risk.pool(&s.id).unwrap().cumulative(), dec!(100));
    }

    #[test]
    fn test_larger_trial_amount_spends_budget_faster() {
        let config = RiskConfig { trial_amount: dec!(4), ..RiskConfig::default() };
        let mut risk = RiskEngine::new(config);
        let s = normalize(&RawScenario { n: Some(40.0), ..example_raw() });
        let result = run(&s, &mut risk);
        // 25 trials x 4 units fill the 100-unit limit.
        assert_eq!(result.samples.iter().filter(|&&x| x > 0.0).count(), 25);
        assert_eq!(risk.pool(&s.id).unwrap().used_count(), 25);
    }

    // ========== Lab / History ==========

    #[test]
    fn test_lab_history_bounded_to_twenty() {
        let mut lab = PaymentLab::default();
        for seed in 1..=23 {
            lab.run_core(&RawScenario { n: Some(10.0), seed: Some(seed as f64), ..example_raw() });
        }
        let history = lab.history_ref();
        assert_eq!(history.len(), 20);
        assert_eq!(history.latest().unwrap().scenario.seed, 23);
    }

    #[test]
    fn test_history_survives_store_round_trip() {
        let mut lab = PaymentLab::default();
        lab.run_core(&RawScenario { n: Some(50.0), ..example_raw() });
        let mut store = MemoryStore::default();
        lab.history_ref().persist(&mut store);

        let restored = RunHistory::restore(&store, 20).unwrap();
        let original = lab.history_ref().latest().unwrap();
        let copy = restored.latest().unwrap();
        assert_eq!(copy.run_id, original.run_id);
        assert_eq!(copy.scenario, original.scenario);
        assert_eq!(copy.samples_ms, original.samples_ms);
        assert_eq!(copy.metrics, original.metrics);
    }

    #[test]
    fn test_run_record_wire_shape() {
        let mut lab = PaymentLab::default();
        let record = lab.run_core(&RawScenario { n: Some(10.0), ..example_raw() });
        let v = serde_json::to_value(&record).unwrap();
        for key in ["run_id", "started_at", "scenario", "metrics", "samples_ms"] {
            assert!(v.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(v["samples_ms"].as_array().unwrap().len(), 10);
        assert!(v["metrics"].get("p99_ms").is_some());
    }
}
