// Preset Definitions — named network conditions for the bench runner
// Each preset is raw UI-style input; the engine normalizes it like any other.

use paylab_engine::RawScenario;

// ─── Preset Configuration ───────────────────────────────────────────────────

pub struct Preset {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub raw: RawScenario,
}

fn raw(
    net_type: &str,
    latency_ms: f64,
    jitter_ms: f64,
    loss_pct: f64,
    bandwidth_kbps: f64,
    mix: &str,
    n: f64,
) -> RawScenario {
    RawScenario {
        net_type: Some(net_type.to_string()),
        latency_ms: Some(latency_ms),
        jitter_ms: Some(jitter_ms),
        loss_pct: Some(loss_pct),
        bandwidth_kbps: Some(bandwidth_kbps),
        mix: Some(mix.to_string()),
        n: Some(n),
        seed: None,
    }
}

// ─── Preset List ────────────────────────────────────────────────────────────

pub fn presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "TAP_APN_BASELINE",
            label: "Tap-to-pay over private APN",
            category: "baseline",
            raw: raw("private_apn", 40.0, 5.0, 0.1, 2_048.0, "tap_to_pay", 1_000.0),
        },
        Preset {
            name: "TAP_PUBLIC_TYPICAL",
            label: "Tap-to-pay over public internet",
            category: "baseline",
            raw: raw("public_internet", 150.0, 30.0, 5.0, 512.0, "tap_to_pay", 1_000.0),
        },
        // Exactly one offline budget worth of trials.
        Preset {
            name: "TAP_OFFLINE_BUDGET",
            label: "Tap-to-pay, one full offline budget",
            category: "budget",
            raw: raw("public_internet", 150.0, 30.0, 5.0, 512.0, "tap_to_pay", 100.0),
        },
        Preset {
            name: "PROVISIONING_CONGESTED",
            label: "Card provisioning on a congested link",
            category: "stress",
            raw: raw("public_internet", 600.0, 200.0, 12.0, 128.0, "provisioning", 5_000.0),
        },
        Preset {
            name: "OTHER_LOSSY_EDGE",
            label: "Mixed traffic at a lossy edge",
            category: "stress",
            raw: raw("public_internet", 250.0, 120.0, 25.0, 256.0, "other", 2_000.0),
        },
        // Every field at its worst bound.
        Preset {
            name: "WORST_CASE_BOUNDS",
            label: "All parameters at worst bound",
            category: "bounds",
            raw: raw("public_internet", 5_000.0, 2_000.0, 30.0, 64.0, "provisioning", 20_000.0),
        },
    ]
}
