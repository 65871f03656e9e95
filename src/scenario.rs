// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Offline Payments Lab ("PayLab") - Scenario Model

//! Scenario normalization and identity.
//!
//! Input from the UI is untrusted and loosely typed: numbers may arrive as
//! strings, fields may be missing, values may be out of range. `normalize`
//! never rejects such input. Missing or non-numeric fields take a fixed
//! fallback, every field is clamped to its range, and only then is the id
//! derived, so the id always describes a valid scenario.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::prng::fnv1a_32;

// ─── Ranges and fallbacks ────────────────────────────────────────────────────

pub const LATENCY_RANGE_MS: (f64, f64) = (0.0, 5_000.0);
pub const JITTER_RANGE_MS: (f64, f64) = (0.0, 2_000.0);
pub const LOSS_RANGE_PCT: (f64, f64) = (0.0, 30.0);
pub const BANDWIDTH_RANGE_KBPS: (f64, f64) = (64.0, 1_000_000.0);
pub const TRIALS_RANGE: (u32, u32) = (10, 200_000);
pub const SEED_RANGE: (u32, u32) = (1, 2_147_483_647);

const FALLBACK_LATENCY_MS: f64 = 120.0;
const FALLBACK_JITTER_MS: f64 = 25.0;
const FALLBACK_LOSS_PCT: f64 = 1.0;
const FALLBACK_BANDWIDTH_KBPS: f64 = 512.0;
const FALLBACK_TRIALS: f64 = 1_000.0;
const FALLBACK_SEED: f64 = 42.0;

const ID_PREFIX: &str = "SCN-";

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetType {
    PrivateApn,
    #[default]
    PublicInternet,
}

impl NetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrivateApn => "private_apn",
            Self::PublicInternet => "public_internet",
        }
    }

    /// Unknown strings fall back to the default.
    pub fn parse_lenient(raw: &str) -> Self {
        match wire_token(raw).as_str() {
            "private_apn" | "apn" => Self::PrivateApn,
            _ => Self::PublicInternet,
        }
    }
}

/// Transaction mix; selects the processing time and payload size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TxMix {
    TapToPay,
    Provisioning,
    #[default]
    Other,
}

impl TxMix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TapToPay => "tap_to_pay",
            Self::Provisioning => "provisioning",
            Self::Other => "other",
        }
    }

    pub fn parse_lenient(raw: &str) -> Self {
        match wire_token(raw).as_str() {
            "tap_to_pay" | "tap" => Self::TapToPay,
            "provisioning" => Self::Provisioning,
            _ => Self::Other,
        }
    }
}

fn wire_token(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

// ─── Raw input ───────────────────────────────────────────────────────────────

/// Scenario parameters as supplied by a UI, CLI or config file.
///
/// Every field is optional and deserialization is lenient: numeric strings
/// parse, anything unparseable becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScenario {
    #[serde(default, rename = "netType", alias = "net_type", deserialize_with = "lenient_text",
            skip_serializing_if = "Option::is_none")]
    pub net_type: Option<String>,
    #[serde(default, alias = "latency", deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(default, alias = "jitter", deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none")]
    pub jitter_ms: Option<f64>,
    #[serde(default, alias = "loss", deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none")]
    pub loss_pct: Option<f64>,
    #[serde(default, alias = "bw", deserialize_with = "lenient_number",
            skip_serializing_if = "Option::is_none")]
    pub bandwidth_kbps: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub mix: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub n: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub seed: Option<f64>,
}

impl RawScenario {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

impl From<&Scenario> for RawScenario {
    fn from(s: &Scenario) -> Self {
        Self {
            net_type: Some(s.net_type.as_str().to_string()),
            latency_ms: Some(s.latency_ms),
            jitter_ms: Some(s.jitter_ms),
            loss_pct: Some(s.loss_pct),
            bandwidth_kbps: Some(s.bandwidth_kbps),
            mix: Some(s.mix.as_str().to_string()),
            n: Some(f64::from(s.n)),
            seed: Some(f64::from(s.seed)),
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

// ─── Scenario ────────────────────────────────────────────────────────────────

/// A normalized simulation configuration. Build one with [`Scenario::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(rename = "netType")]
    pub net_type: NetType,
    pub latency_ms: f64,
    pub jitter_ms: f64,
    pub loss_pct: f64,
    pub bandwidth_kbps: f64,
    pub mix: TxMix,
    pub n: u32,
    pub seed: u32,
    pub id: String,
}

impl Scenario {
    pub fn normalize(raw: &RawScenario) -> Self {
        let mut scenario = Self {
            net_type: raw.net_type.as_deref().map(NetType::parse_lenient).unwrap_or_default(),
            latency_ms: clamp_field(raw.latency_ms, FALLBACK_LATENCY_MS, LATENCY_RANGE_MS),
            jitter_ms: clamp_field(raw.jitter_ms, FALLBACK_JITTER_MS, JITTER_RANGE_MS),
            loss_pct: clamp_field(raw.loss_pct, FALLBACK_LOSS_PCT, LOSS_RANGE_PCT),
            bandwidth_kbps: clamp_field(raw.bandwidth_kbps, FALLBACK_BANDWIDTH_KBPS, BANDWIDTH_RANGE_KBPS),
            mix: raw.mix.as_deref().map(TxMix::parse_lenient).unwrap_or_default(),
            n: clamp_integer(raw.n, FALLBACK_TRIALS, TRIALS_RANGE),
            seed: clamp_integer(raw.seed, FALLBACK_SEED, SEED_RANGE),
            id: String::new(),
        };
        scenario.id = scenario.derive_id();
        scenario
    }

    /// Keys sorted, no whitespace, integral numbers without a fraction.
    /// The `id` field itself is excluded.
    pub fn canonical_json(&self) -> String {
        let canonical = json!({
            "bandwidth_kbps": canonical_number(self.bandwidth_kbps),
            "jitter_ms": canonical_number(self.jitter_ms),
            "latency_ms": canonical_number(self.latency_ms),
            "loss_pct": canonical_number(self.loss_pct),
            "mix": self.mix.as_str(),
            "n": self.n,
            "netType": self.net_type.as_str(),
            "seed": self.seed,
        });
        canonical.to_string()
    }

    pub fn derive_id(&self) -> String {
        format!("{}{:08x}", ID_PREFIX, fnv1a_32(&self.canonical_json()))
    }
}

/// Convenience over [`Scenario::normalize`].
pub fn normalize(raw: &RawScenario) -> Scenario {
    Scenario::normalize(raw)
}

fn clamp_field(value: Option<f64>, fallback: f64, (lo, hi): (f64, f64)) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback).clamp(lo, hi)
}

fn clamp_integer(value: Option<f64>, fallback: f64, (lo, hi): (u32, u32)) -> u32 {
    let v = value.filter(|v| v.is_finite()).unwrap_or(fallback).round();
    v.clamp(f64::from(lo), f64::from(hi)) as u32
}

fn canonical_number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}
